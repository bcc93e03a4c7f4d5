use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::WellnessApi;
use crate::bus::SessionEvent;
use crate::chat::{ChatMessage, Role};
use crate::config::Config;
use crate::pages::contact::ContactMessage;
use crate::pages::coping::MOOD_PRESETS;
use crate::pages::image::SUGGESTED_PROMPTS;
use crate::pages::{ContactForm, CopingPage, EmotionPage, ImagePage, LoggedDelivery};
use crate::session::{ChatSession, SendOutcome};

const HELP: &str = "Commands: /1../6 quick reply, /clear, /hide, /show, /help, /quit";
const NOT_SENT: &str = "(still waiting for a reply, message not sent)";

/// A line typed into the chat prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Message(String),
    QuickReply(usize),
    Clear,
    Hide,
    Show,
    Help,
    Quit,
    Empty,
}

impl ChatInput {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return ChatInput::Empty;
        }
        let Some(command) = trimmed.strip_prefix('/') else {
            return ChatInput::Message(trimmed.to_string());
        };

        match command.to_lowercase().as_str() {
            "clear" => ChatInput::Clear,
            "hide" => ChatInput::Hide,
            "show" => ChatInput::Show,
            "help" | "?" => ChatInput::Help,
            "quit" | "exit" | "q" => ChatInput::Quit,
            other => match other.parse::<usize>() {
                Ok(n) if n >= 1 => ChatInput::QuickReply(n),
                // Not a known command; treat as ordinary text
                _ => ChatInput::Message(trimmed.to_string()),
            },
        }
    }
}

pub struct TerminalInterface {
    api: Arc<dyn WellnessApi>,
    contact_delay: Duration,
}

impl TerminalInterface {
    pub fn new(api: Arc<dyn WellnessApi>, config: &Config) -> Self {
        Self {
            api,
            contact_delay: config.contact_delay,
        }
    }

    /// Interactive chat. Returns when stdin closes or the user quits.
    pub async fn run_chat(&self) -> Result<()> {
        let session = ChatSession::new(self.api.clone());
        info!(session = %session.id(), "chat session started");

        let renderer = spawn_renderer(session.clone());
        session.set_visible(true);
        println!("{}", render_log(&session.messages()));
        print_quick_replies(&session);
        println!("{HELP}");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .context("Failed to read from stdin")?
        {
            match ChatInput::parse(&line) {
                ChatInput::Empty => {}
                ChatInput::Quit => break,
                ChatInput::Help => println!("{HELP}"),
                ChatInput::Clear => session.clear(),
                ChatInput::Hide => {
                    session.set_visible(false);
                    println!("(chat hidden, /show to reopen)");
                }
                ChatInput::Show => {
                    session.set_visible(true);
                    println!("{}", render_log(&session.messages()));
                    if session.is_pending() {
                        println!("{}", render_typing());
                    }
                }
                ChatInput::QuickReply(n) => match session.quick_replies().get(n - 1) {
                    Some(text) => {
                        dispatch_send(&session, text);
                    }
                    None => println!("(no quick reply #{n} right now)"),
                },
                ChatInput::Message(text) => {
                    dispatch_send(&session, &text);
                }
            }
        }

        renderer.abort();
        info!(session = %session.id(), "chat session ended");
        Ok(())
    }

    pub async fn run_emotion(&self, text: String) -> Result<()> {
        let mut page = EmotionPage::new(self.api.clone());
        page.set_text(text);
        page.submit().await;
        println!("{}", render_emotion(&page));
        Ok(())
    }

    pub async fn run_coping(&self, mood: Option<String>, text: String) -> Result<()> {
        let mut page = CopingPage::new(self.api.clone());
        match mood {
            Some(mood) if !page.select_mood(&mood) => {
                let labels: Vec<&str> = MOOD_PRESETS.iter().map(|p| p.label).collect();
                println!("Unknown mood {:?}. Choose one of: {}", mood, labels.join(", "));
                return Ok(());
            }
            Some(_) => {}
            None => page.set_text(text),
        }
        page.submit().await;
        println!("{}", render_coping(&page));
        Ok(())
    }

    pub async fn run_image(
        &self,
        suggestion: Option<usize>,
        prompt: String,
        save: Option<PathBuf>,
    ) -> Result<()> {
        let mut page = ImagePage::new(self.api.clone());
        match suggestion {
            Some(n) => {
                if !n.checked_sub(1).is_some_and(|i| page.select_suggestion(i)) {
                    println!("Pick a suggestion between 1 and {}:", SUGGESTED_PROMPTS.len());
                    for (i, prompt) in SUGGESTED_PROMPTS.iter().enumerate() {
                        println!("  {}. {}", i + 1, prompt);
                    }
                    return Ok(());
                }
            }
            None => page.set_prompt(prompt),
        }
        page.submit().await;
        println!("{}", render_image(&page));

        if let Some(path) = save {
            if page.download(&path).await {
                println!("Saved to {}", path.display());
            } else if let Some(error) = page.state().error() {
                println!("! {error}");
            }
        }
        Ok(())
    }

    pub async fn run_contact(&self, message: ContactMessage) -> Result<()> {
        let mut form = ContactForm::new(Arc::new(LoggedDelivery::new(self.contact_delay)));
        form.fill(message);
        if form.submit().await {
            println!("Thank you! Your message has been sent. We'll get back to you soon.");
        } else if let Some(error) = form.error() {
            println!("! {error}");
        }
        Ok(())
    }
}

/// Appends the user's turn right away and leaves the round-trip to a
/// spawned task. Returns `None`, after telling the user, when the session
/// refused the turn.
fn dispatch_send(session: &ChatSession, text: &str) -> Option<JoinHandle<SendOutcome>> {
    let Some(exchange) = session.begin_send(text) else {
        println!("{NOT_SENT}");
        return None;
    };
    let id = session.id().to_string();
    Some(tokio::spawn(async move {
        let outcome = exchange.complete().await;
        debug!(session = %id, ?outcome, "exchange finished");
        outcome
    }))
}

/// Reacts to session events: prints replies as they land while the view is
/// shown, and a notice when one lands while it is hidden.
fn spawn_renderer(session: ChatSession) -> JoinHandle<()> {
    let mut rx = session.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(SessionEvent::MessageAppended(message)) => {
                    // The user's own line is already on screen
                    if message.role == Role::Assistant && session.is_visible() {
                        println!("{}", render_message(&message));
                        print_quick_replies(&session);
                    }
                }
                Ok(SessionEvent::PendingChanged(true)) => {
                    if session.is_visible() {
                        println!("{}", render_typing());
                    }
                }
                Ok(SessionEvent::PendingChanged(false)) => {}
                Ok(SessionEvent::Cleared(greeting)) => {
                    if session.is_visible() {
                        println!("\n{}", render_message(&greeting));
                        print_quick_replies(&session);
                    }
                }
                Ok(SessionEvent::UnseenReply) => {
                    println!("(1 new message, /show to read it)");
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("renderer lagged behind by {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

fn print_quick_replies(session: &ChatSession) {
    if let Some(line) = render_quick_replies(session.quick_replies()) {
        println!("{line}");
    }
}

pub fn render_message(message: &ChatMessage) -> String {
    let body = message.text.replace('\n', "\n    ");
    format!("[{}] {}:\n    {}", message.time_label(), message.role, body)
}

pub fn render_log(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(render_message)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_typing() -> String {
    format!("{}: ...", Role::Assistant)
}

pub fn render_quick_replies(replies: &[&str]) -> Option<String> {
    if replies.is_empty() {
        return None;
    }
    let items: Vec<String> = replies
        .iter()
        .enumerate()
        .map(|(i, reply)| format!("/{} {}", i + 1, reply))
        .collect();
    Some(format!("Quick replies: {}", items.join(" | ")))
}

pub fn render_emotion(page: &EmotionPage) -> String {
    if let Some(error) = page.state().error() {
        return format!("! {error}");
    }
    let (Some(prediction), Some(insight)) = (page.state().result(), page.insight()) else {
        return String::new();
    };

    let mut out = match prediction.confidence {
        Some(confidence) => format!(
            "Emotion: {} ({:.0}% confidence)",
            insight.label,
            confidence * 100.0
        ),
        None => format!("Emotion: {}", insight.label),
    };
    out.push_str(&format!("\n{}", insight.message));
    out.push_str(&format!("\nTry: {}", insight.actions.join(" / ")));
    out
}

pub fn render_coping(page: &CopingPage) -> String {
    if let Some(error) = page.state().error() {
        return format!("! {error}");
    }
    if page.strategies().is_empty() {
        return "No strategies were returned. Please try again.".to_string();
    }

    let mut out = String::from("Coping strategies for you:");
    for (i, strategy) in page.strategies().iter().enumerate() {
        out.push_str(&format!("\n  {}. {}", i + 1, strategy));
    }
    out
}

pub fn render_image(page: &ImagePage) -> String {
    if let Some(error) = page.state().error() {
        return format!("! {error}");
    }
    match page.image_url() {
        Some(url) => format!("Your calming image is ready:\n  {url}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CopingStrategies, EmotionPrediction, GeneratedImage};
    use crate::pages::testing::StubApi;

    #[test]
    fn parses_commands_and_messages() {
        assert_eq!(ChatInput::parse("   "), ChatInput::Empty);
        assert_eq!(ChatInput::parse("/QUIT"), ChatInput::Quit);
        assert_eq!(ChatInput::parse(" /clear "), ChatInput::Clear);
        assert_eq!(ChatInput::parse("/3"), ChatInput::QuickReply(3));
        assert_eq!(ChatInput::parse("/0"), ChatInput::Message("/0".into()));
        assert_eq!(
            ChatInput::parse("  I feel low "),
            ChatInput::Message("I feel low".into())
        );
        assert_eq!(
            ChatInput::parse("/shrug"),
            ChatInput::Message("/shrug".into())
        );
    }

    #[test]
    fn multiline_messages_are_indented() {
        let rendered = render_message(&ChatMessage::assistant("one\ntwo"));
        assert!(rendered.contains("MindEmotion:"));
        assert!(rendered.ends_with("    one\n    two"));
    }

    #[test]
    fn quick_replies_render_numbered() {
        assert_eq!(render_quick_replies(&[]), None);
        assert_eq!(
            render_quick_replies(&["a", "b"]).unwrap(),
            "Quick replies: /1 a | /2 b"
        );
    }

    #[tokio::test]
    async fn emotion_result_shows_label_confidence_and_actions() {
        let api = Arc::new(StubApi {
            emotion: Some(EmotionPrediction {
                emotion: "joy".into(),
                confidence: Some(0.876),
                all_probabilities: None,
            }),
            ..StubApi::default()
        });
        let mut page = EmotionPage::new(api);
        page.set_text("great day");
        page.submit().await;

        let out = render_emotion(&page);
        assert!(out.starts_with("Emotion: Joy (88% confidence)"));
        assert!(out.contains("Try: Celebrate / Capture Moment / Spread Positivity"));
    }

    #[tokio::test]
    async fn page_errors_render_inline() {
        let mut page = ImagePage::new(Arc::new(StubApi::default()));
        page.set_prompt("sea");
        page.submit().await;
        assert_eq!(
            render_image(&page),
            "! Unable to generate image. Please try again."
        );
    }

    #[tokio::test]
    async fn coping_and_image_results_render() {
        let api = Arc::new(StubApi {
            coping: Some(CopingStrategies {
                strategies: vec!["Breathe".into(), "Walk".into()],
            }),
            image: Some(GeneratedImage {
                image_url: "https://image.test/x".into(),
            }),
            ..StubApi::default()
        });

        let mut coping = CopingPage::new(api.clone());
        coping.set_text("tense");
        coping.submit().await;
        assert_eq!(
            render_coping(&coping),
            "Coping strategies for you:\n  1. Breathe\n  2. Walk"
        );

        let mut image = ImagePage::new(api);
        image.set_prompt("forest");
        image.submit().await;
        assert!(render_image(&image).ends_with("https://image.test/x"));
    }

    #[tokio::test]
    async fn second_line_while_pending_is_refused_before_reaching_the_backend() {
        let api = Arc::new(StubApi::default());
        let session = ChatSession::new(api.clone());

        let first = dispatch_send(&session, "first");
        let second = dispatch_send(&session, "second");

        assert!(first.is_some());
        assert!(second.is_none());
        let log: Vec<String> = session.messages().into_iter().map(|m| m.text).collect();
        assert_eq!(log[1..], ["first"]);

        assert_eq!(first.unwrap().await.unwrap(), SendOutcome::Apologized);
        assert_eq!(api.calls(), vec!["chat:first"]);
        assert_eq!(session.len(), 3);
    }

    #[tokio::test]
    async fn image_command_saves_to_the_requested_path() {
        let api = Arc::new(StubApi {
            image: Some(GeneratedImage {
                image_url: "https://image.test/meadow".into(),
            }),
            image_bytes: Some(vec![1, 2, 3]),
            ..StubApi::default()
        });
        let terminal = TerminalInterface::new(api.clone(), &Config::default());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meadow.png");

        terminal
            .run_image(Some(5), String::new(), Some(path.clone()))
            .await
            .unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), [1, 2, 3]);
        assert_eq!(
            api.calls(),
            vec![
                "image:Starry night sky over meadow",
                "fetch:https://image.test/meadow"
            ]
        );
    }
}
