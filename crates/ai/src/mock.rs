//! Deterministic template providers.
//!
//! Used when no provider credentials are configured and as the fallback when a
//! real provider call fails, so generation always yields a version.

use async_trait::async_trait;

use crate::provider::{GeneratedImage, GeneratedText, GenerationRequest, ImageGenerator, TextGenerator};
use crate::result::AiError;

pub const MOCK_TEXT_MODEL: &str = "mock-template";
pub const MOCK_IMAGE_MODEL: &str = "mock-placeholder";

#[derive(Debug, Default, Clone, Copy)]
pub struct MockTextGenerator;

impl MockTextGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Render the posting template. Infallible, pure function of the request.
    pub fn render(&self, request: &GenerationRequest) -> GeneratedText {
        let mut out = format!("# {}\n", request.title);
        if let Some(location) = &request.location {
            out.push_str(&format!("\nLocation: {location}\n"));
        }

        out.push_str("\n## About the role\n");
        if request.description.is_empty() {
            out.push_str(&format!(
                "We are looking for a {} to join our team.\n",
                request.title
            ));
        } else {
            out.push_str(&request.description);
            out.push('\n');
        }

        if let Some(requirements) = &request.requirements {
            out.push_str("\n## Requirements\n");
            out.push_str(requirements);
            out.push('\n');
        }

        let offer: Vec<&str> = [request.employment_type.as_deref(), request.salary.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if !offer.is_empty() {
            out.push_str("\n## What we offer\n");
            out.push_str(&offer.join(" | "));
            out.push('\n');
        }

        if let Some(prompt) = &request.prompt {
            out.push_str(&format!("\n<!-- prompt: {prompt} -->\n"));
        }

        GeneratedText {
            content: out,
            model: MOCK_TEXT_MODEL.to_string(),
        }
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate_text(&self, request: &GenerationRequest) -> Result<GeneratedText, AiError> {
        Ok(self.render(request))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MockImageGenerator;

impl MockImageGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, request: &GenerationRequest) -> GeneratedImage {
        let label: String = request
            .title
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '+' })
            .collect();
        GeneratedImage {
            image_url: format!("https://placehold.co/1024x1024/png?text={label}"),
            model: MOCK_IMAGE_MODEL.to_string(),
        }
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    async fn generate_image(&self, request: &GenerationRequest) -> Result<GeneratedImage, AiError> {
        Ok(self.render(request))
    }
}
