use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{DEFAULT_API_URL, DEFAULT_CHAT_PATH, DEFAULT_CONTACT_DELAY_MS};
use crate::pages::image::DEFAULT_DOWNLOAD_NAME;

/// Terminal client for the MindEmotion wellness backend
#[derive(Parser, Debug)]
#[command(name = "mindemotion", version, about)]
pub struct Cli {
    /// Base origin of the backend API
    #[arg(long, global = true, env = "MINDEMOTION_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Path of the chat endpoint, relative to the API origin
    #[arg(long, global = true, env = "MINDEMOTION_CHAT_PATH", default_value = DEFAULT_CHAT_PATH)]
    pub chat_path: String,

    /// Simulated delivery latency for the contact form, in milliseconds
    #[arg(long, global = true, env = "MINDEMOTION_CONTACT_DELAY_MS", default_value_t = DEFAULT_CONTACT_DELAY_MS)]
    pub contact_delay_ms: u64,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Talk with the wellness companion (default)
    Chat,

    /// Detect the emotion expressed in a piece of text
    Emotion {
        /// Text to analyze
        text: Vec<String>,
    },

    /// Get coping strategies for how you feel
    Coping {
        /// Use a mood preset instead of free text (anxious, sad, stressed, lonely, angry, tired)
        #[arg(long)]
        mood: Option<String>,

        /// Describe how you are feeling
        text: Vec<String>,
    },

    /// Generate a calming image
    Image {
        /// Use one of the suggested prompts (1-6)
        #[arg(long)]
        suggestion: Option<usize>,

        /// Save the image to a file (--save=PATH)
        #[arg(
            long,
            num_args = 0..=1,
            require_equals = true,
            default_missing_value = DEFAULT_DOWNLOAD_NAME
        )]
        save: Option<PathBuf>,

        /// Describe the image
        prompt: Vec<String>,
    },

    /// Send a message to the team
    Contact {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long, default_value = "")]
        subject: String,

        #[arg(long)]
        message: String,
    },
}
