use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::WellnessApi;
use crate::bus::{EventBus, SessionEvent};
use crate::chat::ChatMessage;

pub const GREETING: &str = "Hello! I'm your mental wellness companion. I'm here to listen and support you.\n\nHow are you feeling today?";
pub const CLEARED_GREETING: &str =
    "Chat cleared! Let's start fresh.\n\nHow can I support you today?";
pub const DEFAULT_REPLY: &str =
    "I hear you. Would you like to tell me more about how you're feeling?";
pub const APOLOGY: &str =
    "I'm sorry, I'm having trouble connecting right now. Please try again in a moment.";

pub const QUICK_REPLIES: [&str; 6] = [
    "I'm feeling anxious",
    "I'm feeling sad",
    "I'm stressed out",
    "I need motivation",
    "Help me relax",
    "I can't sleep",
];

/// Quick replies are offered until the conversation has moved past the
/// first exchange.
const QUICK_REPLY_MAX_LOG_LEN: usize = 2;

/// What a call to [`ChatSession::send`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input, or another exchange was still in flight
    Ignored,
    /// The backend answered
    Replied,
    /// The exchange failed and an apology was appended instead
    Apologized,
}

#[derive(Debug, Default)]
struct SessionState {
    messages: Vec<ChatMessage>,
    pending: bool,
    unseen_reply: bool,
    visible: bool,
}

#[derive(Clone)]
pub struct ChatSession {
    id: String,
    api: Arc<dyn WellnessApi>,
    state: Arc<Mutex<SessionState>>,
    event_bus: Arc<EventBus>,
}

/// An exchange whose user turn is already in the log. The session stays
/// pending until [`PendingExchange::complete`] has run.
#[must_use = "the session stays pending until the exchange completes"]
pub struct PendingExchange {
    session: ChatSession,
    text: String,
}

impl PendingExchange {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Calls the chat endpoint and appends the assistant's turn.
    pub async fn complete(self) -> SendOutcome {
        self.session.finish_send(&self.text).await
    }
}

impl ChatSession {
    /// Creates a session holding the initial greeting. The view starts hidden.
    pub fn new(api: Arc<dyn WellnessApi>) -> Self {
        let session = Self {
            id: format!("chat_{}", Uuid::new_v4().simple()),
            api,
            state: Arc::new(Mutex::new(SessionState::default())),
            event_bus: Arc::new(EventBus::new()),
        };
        session.initialize();
        session
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_bus.subscribe()
    }

    /// Seeds an empty log with the greeting. No-op otherwise.
    pub fn initialize(&self) {
        let mut state = self.lock_state();
        if !state.messages.is_empty() {
            return;
        }
        let greeting = ChatMessage::assistant(GREETING);
        state.messages.push(greeting.clone());
        self.event_bus.publish(SessionEvent::MessageAppended(greeting));
    }

    /// Sends one user turn and waits for the assistant's turn.
    ///
    /// Blank input and calls made while a previous exchange is still pending
    /// are dropped without touching the log.
    pub async fn send(&self, user_text: &str) -> SendOutcome {
        match self.begin_send(user_text) {
            Some(exchange) => exchange.complete().await,
            None => SendOutcome::Ignored,
        }
    }

    /// Appends the user's turn and marks the session pending, without
    /// waiting. Returns `None` when the input is blank or an exchange is
    /// already in flight.
    pub fn begin_send(&self, user_text: &str) -> Option<PendingExchange> {
        let text = user_text.trim();
        if text.is_empty() {
            return None;
        }

        let mut state = self.lock_state();
        if state.pending {
            debug!(session = %self.id, "dropping send while a reply is pending");
            return None;
        }
        let message = ChatMessage::user(text);
        state.messages.push(message.clone());
        state.pending = true;
        // Published under the lock so observers see events in log order
        self.event_bus.publish(SessionEvent::MessageAppended(message));
        self.event_bus.publish(SessionEvent::PendingChanged(true));
        drop(state);

        Some(PendingExchange {
            session: self.clone(),
            text: text.to_string(),
        })
    }

    async fn finish_send(&self, text: &str) -> SendOutcome {
        let (reply, outcome) = match self.api.send_chat_message(text).await {
            Ok(reply) => (
                ChatMessage::assistant(reply.text_or(DEFAULT_REPLY)),
                SendOutcome::Replied,
            ),
            Err(e) => {
                warn!(session = %self.id, "chat exchange failed: {}", e);
                (ChatMessage::assistant(APOLOGY), SendOutcome::Apologized)
            }
        };

        let mut state = self.lock_state();
        state.messages.push(reply.clone());
        state.pending = false;
        self.event_bus.publish(SessionEvent::MessageAppended(reply));
        self.event_bus.publish(SessionEvent::PendingChanged(false));
        if outcome == SendOutcome::Replied && !state.visible {
            state.unseen_reply = true;
            self.event_bus.publish(SessionEvent::UnseenReply);
        }

        outcome
    }

    /// Replaces the whole log with a fresh greeting. An exchange that is
    /// still in flight keeps running and lands after the greeting.
    pub fn clear(&self) {
        let greeting = ChatMessage::assistant(CLEARED_GREETING);
        {
            let mut state = self.lock_state();
            state.messages = vec![greeting.clone()];
            self.event_bus.publish(SessionEvent::Cleared(greeting));
        }
        info!(session = %self.id, "chat cleared");
    }

    pub fn mark_seen(&self) {
        self.lock_state().unseen_reply = false;
    }

    pub fn set_visible(&self, visible: bool) {
        self.lock_state().visible = visible;
        if visible {
            self.mark_seen();
        }
    }

    pub fn is_visible(&self) -> bool {
        self.lock_state().visible
    }

    pub fn is_pending(&self) -> bool {
        self.lock_state().pending
    }

    pub fn has_unseen_reply(&self) -> bool {
        self.lock_state().unseen_reply
    }

    pub fn len(&self) -> usize {
        self.lock_state().messages.len()
    }

    /// Snapshot of the log in display order.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock_state().messages.clone()
    }

    pub fn quick_replies(&self) -> &'static [&'static str] {
        let state = self.lock_state();
        if state.messages.len() <= QUICK_REPLY_MAX_LOG_LEN && !state.pending {
            &QUICK_REPLIES
        } else {
            &[]
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        // Every critical section is a plain field update, so a poisoned
        // lock still holds consistent state
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
