use crate::chat::ChatMessage;
use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum SessionEvent {
    /// A message was appended to the log
    MessageAppended(ChatMessage),

    /// A request to the chat endpoint started (true) or finished (false)
    PendingChanged(bool),

    /// The log was replaced by a fresh greeting
    Cleared(ChatMessage),

    /// A reply landed while the chat view was hidden
    UnseenReply,
}

pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(100);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: SessionEvent) {
        // No subscribers is fine: the session works without a view attached
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
