pub mod contact;
pub mod coping;
pub mod emotion;
pub mod image;

use std::future::Future;

use tracing::warn;

use crate::api::ApiError;

pub use contact::{ContactForm, LoggedDelivery};
pub use coping::CopingPage;
pub use emotion::EmotionPage;
pub use image::ImagePage;

/// Inline strings a page shows for its two failure modes.
#[derive(Debug, Clone, Copy)]
pub struct PageMessages {
    pub empty_input: &'static str,
    pub failure: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageState<T> {
    input: String,
    result: Option<T>,
    loading: bool,
    error: Option<String>,
}

impl<T> Default for PageState<T> {
    fn default() -> Self {
        Self {
            input: String::new(),
            result: None,
            loading: false,
            error: None,
        }
    }
}

impl<T> PageState<T> {
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Editing the input dismisses a displayed error.
    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
        self.error = None;
    }

    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub(crate) fn set_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }

    pub fn reset(&mut self) {
        self.input.clear();
        self.result = None;
        self.error = None;
    }

    /// Validates the input and runs `call` with it once.
    ///
    /// Returns whether a result was stored.
    pub async fn submit_with<F, Fut>(&mut self, messages: PageMessages, call: F) -> bool
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let text = self.input.trim().to_string();
        if text.is_empty() {
            self.error = Some(messages.empty_input.to_string());
            return false;
        }

        self.loading = true;
        self.error = None;
        self.result = None;

        let stored = match call(text).await {
            Ok(result) => {
                self.result = Some(result);
                true
            }
            Err(e) => {
                warn!("page request failed: {}", e);
                self.error = Some(messages.failure.to_string());
                false
            }
        };

        self.loading = false;
        stored
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::api::{
        ApiError, ChatReply, CopingStrategies, EmotionPrediction, GeneratedImage, WellnessApi,
    };

    /// Answers every call with the configured payload, or fails when none
    /// is set. Records what it was asked.
    #[derive(Default)]
    pub struct StubApi {
        pub emotion: Option<EmotionPrediction>,
        pub coping: Option<CopingStrategies>,
        pub image: Option<GeneratedImage>,
        pub image_bytes: Option<Vec<u8>>,
        pub calls: Mutex<Vec<String>>,
    }

    impl StubApi {
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    fn failed() -> ApiError {
        ApiError::Status {
            status: 503,
            message: "unavailable".into(),
        }
    }

    #[async_trait]
    impl WellnessApi for StubApi {
        async fn predict_emotion(&self, text: &str) -> Result<EmotionPrediction, ApiError> {
            self.record(format!("predict:{text}"));
            self.emotion.clone().ok_or_else(failed)
        }

        async fn generate_coping_strategies(
            &self,
            text: &str,
        ) -> Result<CopingStrategies, ApiError> {
            self.record(format!("coping:{text}"));
            self.coping.clone().ok_or_else(failed)
        }

        async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, ApiError> {
            self.record(format!("image:{prompt}"));
            self.image.clone().ok_or_else(failed)
        }

        async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, ApiError> {
            self.record(format!("fetch:{url}"));
            self.image_bytes.clone().ok_or_else(failed)
        }

        async fn send_chat_message(&self, message: &str) -> Result<ChatReply, ApiError> {
            self.record(format!("chat:{message}"));
            Err(failed())
        }
    }
}
