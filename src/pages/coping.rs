use std::sync::Arc;

use tracing::debug;

use crate::api::WellnessApi;
use crate::pages::{PageMessages, PageState};

const MESSAGES: PageMessages = PageMessages {
    empty_input: "Please describe how you're feeling",
    failure: "Unable to generate strategies. Please try again.",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoodPreset {
    pub label: &'static str,
    pub prompt: &'static str,
}

pub const MOOD_PRESETS: [MoodPreset; 6] = [
    MoodPreset {
        label: "Anxious",
        prompt: "I'm feeling anxious and overwhelmed",
    },
    MoodPreset {
        label: "Sad",
        prompt: "I'm feeling sad and down",
    },
    MoodPreset {
        label: "Stressed",
        prompt: "I'm feeling stressed and burnt out",
    },
    MoodPreset {
        label: "Lonely",
        prompt: "I'm feeling lonely and isolated",
    },
    MoodPreset {
        label: "Angry",
        prompt: "I'm feeling angry and frustrated",
    },
    MoodPreset {
        label: "Tired",
        prompt: "I'm feeling exhausted and drained",
    },
];

pub struct CopingPage {
    api: Arc<dyn WellnessApi>,
    state: PageState<Vec<String>>,
    selected_mood: Option<&'static str>,
    saved: Vec<String>,
}

impl CopingPage {
    pub fn new(api: Arc<dyn WellnessApi>) -> Self {
        Self {
            api,
            state: PageState::default(),
            selected_mood: None,
            saved: Vec::new(),
        }
    }

    pub fn state(&self) -> &PageState<Vec<String>> {
        &self.state
    }

    pub fn strategies(&self) -> &[String] {
        self.state.result().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn selected_mood(&self) -> Option<&'static str> {
        self.selected_mood
    }

    pub fn saved(&self) -> &[String] {
        &self.saved
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.state.set_input(text);
    }

    /// Fills the input from a preset, matched case-insensitively on its
    /// label. Returns false for an unknown label.
    pub fn select_mood(&mut self, label: &str) -> bool {
        let Some(preset) = MOOD_PRESETS
            .iter()
            .find(|preset| preset.label.eq_ignore_ascii_case(label.trim()))
        else {
            return false;
        };

        self.selected_mood = Some(preset.label);
        self.state.set_input(preset.prompt);
        true
    }

    /// Saves a strategy, or unsaves it if it was already saved. Returns
    /// whether it is saved afterwards.
    pub fn toggle_saved(&mut self, strategy: &str) -> bool {
        if let Some(pos) = self.saved.iter().position(|s| s == strategy) {
            self.saved.remove(pos);
            false
        } else {
            self.saved.push(strategy.to_string());
            true
        }
    }

    /// Clears input, result, error and the selected mood. Saved strategies
    /// survive.
    pub fn reset(&mut self) {
        self.state.reset();
        self.selected_mood = None;
    }

    pub async fn submit(&mut self) -> bool {
        let api = self.api.clone();
        let stored = self
            .state
            .submit_with(MESSAGES, move |text| async move {
                api.generate_coping_strategies(&text)
                    .await
                    .map(|coping| coping.strategies)
            })
            .await;
        if stored {
            debug!("received {} coping strategies", self.strategies().len());
        }
        stored
    }
}
