use std::sync::Arc;

use crate::api::{EmotionPrediction, WellnessApi};
use crate::pages::{PageMessages, PageState};

const MESSAGES: PageMessages = PageMessages {
    empty_input: "Please enter some text to analyze",
    failure: "Unable to analyze. Please try again.",
};

/// How the page presents a detected emotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmotionInsight {
    pub label: String,
    pub message: &'static str,
    pub actions: [&'static str; 3],
}

impl EmotionInsight {
    /// Unknown labels keep their raw text and get the generic message.
    pub fn for_label(raw: &str) -> Self {
        let known = |label: &str, message: &'static str, actions: [&'static str; 3]| Self {
            label: label.to_string(),
            message,
            actions,
        };

        // The classifier emits "sadness" and "anger"; treat them like the
        // shorter forms.
        match raw.trim().to_lowercase().as_str() {
            "happy" => known(
                "Happy",
                "That's wonderful! Keep spreading those positive vibes!",
                ["Celebrate", "Journal", "Share Joy"],
            ),
            "sad" | "sadness" => known(
                "Sad",
                "It's okay to feel this way. Remember, you're not alone.",
                ["Meditate", "Talk to Someone", "Listen to Music"],
            ),
            "angry" | "anger" => known(
                "Angry",
                "Take a deep breath. Your feelings are valid.",
                ["Deep Breathing", "Take a Walk", "Write it Out"],
            ),
            "fear" => known(
                "Fear",
                "Courage isn't the absence of fear. You're stronger than you think.",
                ["Seek Support", "Positive Affirmations", "Grounding Exercise"],
            ),
            "surprise" => known(
                "Surprise",
                "Life is full of unexpected moments! Embrace them.",
                ["Reflect", "Adapt", "Process"],
            ),
            "love" => known(
                "Love",
                "Love is a beautiful emotion. Cherish these feelings.",
                ["Express It", "Gratitude", "Cherish"],
            ),
            "neutral" => known(
                "Neutral",
                "A balanced state of mind. Perfect for reflection.",
                ["Mindfulness", "Self-Reflection", "Set Goals"],
            ),
            "anxiety" => known(
                "Anxiety",
                "Try some deep breathing. This moment will pass.",
                ["Breathe", "Stay Present", "Self-Care"],
            ),
            "joy" => known(
                "Joy",
                "Your joy is contagious! Keep shining bright!",
                ["Celebrate", "Capture Moment", "Spread Positivity"],
            ),
            _ => known(
                raw.trim(),
                "Thank you for sharing your feelings with us.",
                ["Reflect", "Self-Care", "Be Kind to Yourself"],
            ),
        }
    }
}

pub struct EmotionPage {
    api: Arc<dyn WellnessApi>,
    state: PageState<EmotionPrediction>,
}

impl EmotionPage {
    pub fn new(api: Arc<dyn WellnessApi>) -> Self {
        Self {
            api,
            state: PageState::default(),
        }
    }

    pub fn state(&self) -> &PageState<EmotionPrediction> {
        &self.state
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.state.set_input(text);
    }

    pub fn reset(&mut self) {
        self.state.reset();
    }

    pub async fn submit(&mut self) -> bool {
        let api = self.api.clone();
        self.state
            .submit_with(MESSAGES, move |text| async move {
                api.predict_emotion(&text).await
            })
            .await
    }

    pub fn insight(&self) -> Option<EmotionInsight> {
        self.state
            .result()
            .map(|prediction| EmotionInsight::for_label(&prediction.emotion))
    }
}
