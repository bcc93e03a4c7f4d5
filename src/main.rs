use std::sync::Arc;

use clap::Parser;
use tracing::{debug, info};

use mindemotion::api::{ApiClient, WellnessApi};
use mindemotion::cli::{Cli, Command};
use mindemotion::config::Config;
use mindemotion::interface::terminal::TerminalInterface;
use mindemotion::pages::contact::ContactMessage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before parsing so it can feed the env fallbacks of the flags
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    // Logs go to stderr so they stay out of the chat transcript
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.as_str().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = dotenv {
        // Not fatal if .env doesn't exist
        debug!("No .env file found or failed to load: {}", e);
    }

    let config = Config::from_cli(&cli)?;
    info!("Using MindEmotion API at {}", config.api_url);

    let api: Arc<dyn WellnessApi> = Arc::new(ApiClient::new(&config)?);
    let terminal = TerminalInterface::new(api, &config);

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => terminal.run_chat().await?,
        Command::Emotion { text } => terminal.run_emotion(text.join(" ")).await?,
        Command::Coping { mood, text } => terminal.run_coping(mood, text.join(" ")).await?,
        Command::Image {
            suggestion,
            save,
            prompt,
        } => {
            terminal
                .run_image(suggestion, prompt.join(" "), save)
                .await?
        }
        Command::Contact {
            name,
            email,
            subject,
            message,
        } => {
            terminal
                .run_contact(ContactMessage {
                    name,
                    email,
                    subject,
                    message,
                })
                .await?
        }
    }

    Ok(())
}
