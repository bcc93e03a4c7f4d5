use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

const REQUIRED_FIELDS: &str = "Please fill in all required fields";
const INVALID_EMAIL: &str = "Please enter a valid email address";
const DELIVERY_FAILED: &str = "Failed to send message. Please try again.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[async_trait]
pub trait ContactDelivery: Send + Sync {
    async fn deliver(&self, message: &ContactMessage) -> Result<()>;
}

/// The backend has no contact endpoint. Messages are written to the log
/// after a simulated round-trip.
pub struct LoggedDelivery {
    delay: Duration,
}

impl LoggedDelivery {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl ContactDelivery for LoggedDelivery {
    async fn deliver(&self, message: &ContactMessage) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        info!(
            name = %message.name,
            email = %message.email,
            subject = %message.subject,
            "contact message: {}",
            message.message
        );
        Ok(())
    }
}

pub struct ContactForm {
    delivery: Arc<dyn ContactDelivery>,
    form: ContactMessage,
    loading: bool,
    success: bool,
    error: Option<String>,
}

impl ContactForm {
    pub fn new(delivery: Arc<dyn ContactDelivery>) -> Self {
        Self {
            delivery,
            form: ContactMessage::default(),
            loading: false,
            success: false,
            error: None,
        }
    }

    pub fn form(&self) -> &ContactMessage {
        &self.form
    }

    /// Replaces the form contents. Dismisses a displayed error or success
    /// notice.
    pub fn fill(&mut self, form: ContactMessage) {
        self.form = form;
        self.error = None;
        self.success = false;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn succeeded(&self) -> bool {
        self.success
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn submit(&mut self) -> bool {
        let form = &self.form;
        if [&form.name, &form.email, &form.message]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            self.error = Some(REQUIRED_FIELDS.to_string());
            return false;
        }
        if !looks_like_email(&form.email) {
            self.error = Some(INVALID_EMAIL.to_string());
            return false;
        }

        self.loading = true;
        self.error = None;

        let delivered = match self.delivery.deliver(&self.form).await {
            Ok(()) => {
                self.success = true;
                self.form = ContactMessage::default();
                true
            }
            Err(e) => {
                warn!("contact delivery failed: {:#}", e);
                self.error = Some(DELIVERY_FAILED.to_string());
                false
            }
        };

        self.loading = false;
        delivered
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.trim().split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.ends_with('.'),
        None => false,
    }
}
