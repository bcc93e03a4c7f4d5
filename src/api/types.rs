use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

// Request bodies

#[derive(Debug, Serialize)]
pub struct TextRequest<'a> {
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
pub struct PromptRequest<'a> {
    pub prompt: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
}

// Response bodies

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmotionPrediction {
    pub emotion: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub all_probabilities: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CopingStrategies {
    #[serde(default, deserialize_with = "strategies_field")]
    pub strategies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneratedImage {
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub reply: Option<String>,
}

impl ChatReply {
    /// The reply text, or `fallback` when the backend sent nothing usable.
    pub fn text_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self.reply.as_deref() {
            Some(reply) if !reply.trim().is_empty() => reply,
            _ => fallback,
        }
    }
}

/// Body the backend sends alongside a 4xx.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StrategiesField {
    List(Vec<String>),
    Text(String),
}

// The coping backend falls back to returning the raw model output as one
// string when it fails to parse it as JSON.
fn strategies_field<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let field = Option::<StrategiesField>::deserialize(deserializer)?;
    Ok(match field {
        Some(StrategiesField::List(list)) => list,
        Some(StrategiesField::Text(text)) => text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    })
}
