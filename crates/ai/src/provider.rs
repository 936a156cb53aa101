use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AiError;

/// Job fields handed to a provider, plus an optional caller prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub employment_type: Option<String>,
    pub requirements: Option<String>,
    pub prompt: Option<String>,
}

impl GenerationRequest {
    pub fn validate(&self) -> Result<(), AiError> {
        if self.title.trim().is_empty() {
            return Err(AiError::InvalidInput("title must not be empty".to_string()));
        }
        Ok(())
    }

    /// Plain-text summary of the job fields used by prompt-based providers.
    pub fn brief(&self) -> String {
        let mut lines = vec![format!("Title: {}", self.title)];
        if !self.description.is_empty() {
            lines.push(format!("Description: {}", self.description));
        }
        let optional = [
            ("Location", &self.location),
            ("Salary", &self.salary),
            ("Employment type", &self.employment_type),
            ("Requirements", &self.requirements),
        ];
        for (label, value) in optional {
            if let Some(v) = value {
                lines.push(format!("{label}: {v}"));
            }
        }
        lines.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedText {
    pub content: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub image_url: String,
    pub model: String,
}

#[async_trait]
pub trait TextGenerator: Send + Sync + 'static {
    async fn generate_text(&self, request: &GenerationRequest) -> Result<GeneratedText, AiError>;
}

#[async_trait]
pub trait ImageGenerator: Send + Sync + 'static {
    async fn generate_image(&self, request: &GenerationRequest) -> Result<GeneratedImage, AiError>;
}
