//! OpenAI-compatible HTTP providers (chat completions + image generations).

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::provider::{GeneratedImage, GeneratedText, GenerationRequest, ImageGenerator, TextGenerator};
use crate::result::AiError;

const SYSTEM_PROMPT: &str = "You write concise, inclusive job postings for recruitment agencies. \
Answer with the posting text only.";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub timeout: Duration,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            text_model: "gpt-4o-mini".to_string(),
            image_model: "dall-e-3".to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .unwrap_or_default()
    }
}

async fn post_json(
    client: &reqwest::Client,
    config: &OpenAiConfig,
    path: &str,
    body: Value,
) -> Result<Value, AiError> {
    let url = format!("{}{}", config.base_url, path);
    debug!(url = %url, "calling generation provider");

    let res = client
        .post(&url)
        .bearer_auth(&config.api_key)
        .json(&body)
        .send()
        .await?;

    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(AiError::Provider {
            status: status.as_u16(),
            body,
        });
    }

    Ok(res.json::<Value>().await?)
}

fn user_prompt(request: &GenerationRequest, task: &str) -> String {
    match &request.prompt {
        Some(extra) => format!("{task}\n\n{}\n\nAdditional instructions: {extra}", request.brief()),
        None => format!("{task}\n\n{}", request.brief()),
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiTextGenerator {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiTextGenerator {
    pub fn new(config: OpenAiConfig) -> Self {
        let client = config.client();
        Self { config, client }
    }
}

#[async_trait]
impl TextGenerator for OpenAiTextGenerator {
    async fn generate_text(&self, request: &GenerationRequest) -> Result<GeneratedText, AiError> {
        request.validate()?;

        let body = json!({
            "model": self.config.text_model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_prompt(request, "Write a job posting for:") },
            ],
        });

        let res = post_json(&self.client, &self.config, "/chat/completions", body).await?;
        let content = res
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| AiError::InvalidResponse("missing choices[0].message.content".to_string()))?;

        Ok(GeneratedText {
            content: content.to_string(),
            model: self.config.text_model.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiImageGenerator {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiImageGenerator {
    pub fn new(config: OpenAiConfig) -> Self {
        let client = config.client();
        Self { config, client }
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageGenerator {
    async fn generate_image(&self, request: &GenerationRequest) -> Result<GeneratedImage, AiError> {
        request.validate()?;

        let body = json!({
            "model": self.config.image_model,
            "prompt": user_prompt(request, "A professional, text-free header image for this job posting:"),
            "n": 1,
            "size": "1024x1024",
        });

        let res = post_json(&self.client, &self.config, "/images/generations", body).await?;
        let url = res
            .pointer("/data/0/url")
            .and_then(Value::as_str)
            .ok_or_else(|| AiError::InvalidResponse("missing data[0].url".to_string()))?;

        Ok(GeneratedImage {
            image_url: url.to_string(),
            model: self.config.image_model.clone(),
        })
    }
}
