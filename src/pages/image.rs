use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::api::{GeneratedImage, WellnessApi};
use crate::pages::{PageMessages, PageState};

const MESSAGES: PageMessages = PageMessages {
    empty_input: "Please enter a prompt or select a suggestion",
    failure: "Unable to generate image. Please try again.",
};

const DOWNLOAD_FAILED: &str = "Unable to download image. Please try again.";

/// File name used when the user saves without choosing one.
pub const DEFAULT_DOWNLOAD_NAME: &str = "calming-image.png";

pub const SUGGESTED_PROMPTS: [&str; 6] = [
    "Peaceful sunset over calm ocean",
    "Cherry blossoms in spring garden",
    "Serene mountain lake at dawn",
    "Quiet forest path with sunlight",
    "Starry night sky over meadow",
    "Gentle waves on sandy beach",
];

pub struct ImagePage {
    api: Arc<dyn WellnessApi>,
    state: PageState<GeneratedImage>,
}

impl ImagePage {
    pub fn new(api: Arc<dyn WellnessApi>) -> Self {
        Self {
            api,
            state: PageState::default(),
        }
    }

    pub fn state(&self) -> &PageState<GeneratedImage> {
        &self.state
    }

    pub fn image_url(&self) -> Option<&str> {
        self.state.result().map(|image| image.image_url.as_str())
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.state.set_input(prompt);
    }

    /// `index` is zero-based. Returns false when out of range.
    pub fn select_suggestion(&mut self, index: usize) -> bool {
        match SUGGESTED_PROMPTS.get(index) {
            Some(prompt) => {
                self.state.set_input(*prompt);
                true
            }
            None => false,
        }
    }

    pub fn reset(&mut self) {
        self.state.reset();
    }

    pub async fn submit(&mut self) -> bool {
        let api = self.api.clone();
        self.state
            .submit_with(MESSAGES, move |prompt| async move {
                api.generate_image(&prompt).await
            })
            .await
    }

    /// Saves the generated image to `path`. Does nothing without an image.
    pub async fn download(&mut self, path: &Path) -> bool {
        let Some(url) = self.image_url().map(str::to_string) else {
            return false;
        };

        let bytes = match self.api.fetch_image(&url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("image download failed: {}", e);
                self.state.set_error(DOWNLOAD_FAILED);
                return false;
            }
        };
        if let Err(e) = tokio::fs::write(path, &bytes).await {
            warn!("failed to write {}: {}", path.display(), e);
            self.state.set_error(DOWNLOAD_FAILED);
            return false;
        }

        info!(path = %path.display(), bytes = bytes.len(), "image saved");
        true
    }
}
