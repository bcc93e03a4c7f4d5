pub mod client;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use client::ApiClient;
pub use types::{ChatReply, CopingStrategies, EmotionPrediction, GeneratedImage};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server responded with {status}: {message}")]
    Status { status: u16, message: String },

    #[error("response body could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
}

#[async_trait]
pub trait WellnessApi: Send + Sync {
    async fn predict_emotion(&self, text: &str) -> Result<EmotionPrediction, ApiError>;

    async fn generate_coping_strategies(&self, text: &str) -> Result<CopingStrategies, ApiError>;

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, ApiError>;

    /// Downloads the bytes behind an `image_url` returned by `generate_image`.
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, ApiError>;

    async fn send_chat_message(&self, message: &str) -> Result<ChatReply, ApiError>;
}
