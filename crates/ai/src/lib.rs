//! `talentflow-ai`
//!
//! **Responsibility:** content generation boundary for job postings.
//!
//! - Providers receive a snapshot of job fields, never entities or stores.
//! - Providers do not persist anything; the calling task handler does.
//! - A deterministic template provider stands in whenever no credentials are
//!   configured or a real provider call fails.

pub mod mock;
pub mod openai;
pub mod provider;
pub mod result;

pub use mock::{MockImageGenerator, MockTextGenerator};
pub use openai::{OpenAiConfig, OpenAiImageGenerator, OpenAiTextGenerator};
pub use provider::{GeneratedImage, GeneratedText, GenerationRequest, ImageGenerator, TextGenerator};
pub use result::AiError;
