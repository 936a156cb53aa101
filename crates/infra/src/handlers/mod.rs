//! Task handlers, one per queue.

mod email;
mod generation;
mod publication;

pub use email::EmailHandler;
pub use generation::{ImageGenerationHandler, TextGenerationHandler};
pub use publication::PublicationHandler;

use std::collections::HashMap;
use std::sync::Arc;

use talentflow_ai::{ImageGenerator, TextGenerator};
use talentflow_connectors::ConnectorRegistry;

use crate::notifications::EmailSender;
use crate::store::RecruitingStore;
use crate::tasks::{QueueName, TaskHandler};

/// Collaborators shared by the four handlers.
#[derive(Clone)]
pub struct HandlerDeps {
    pub store: Arc<dyn RecruitingStore>,
    pub connectors: Arc<ConnectorRegistry>,
    pub text: Arc<dyn TextGenerator>,
    pub image: Arc<dyn ImageGenerator>,
    pub email: Arc<dyn EmailSender>,
    pub email_from: String,
}

impl HandlerDeps {
    /// One handler per queue, ready for `QueueRegistry::start`.
    pub fn into_handlers(self) -> HashMap<QueueName, Arc<dyn TaskHandler>> {
        let mut handlers: HashMap<QueueName, Arc<dyn TaskHandler>> = HashMap::new();
        handlers.insert(
            QueueName::TextGeneration,
            Arc::new(TextGenerationHandler::new(self.store.clone(), self.text)),
        );
        handlers.insert(
            QueueName::ImageGeneration,
            Arc::new(ImageGenerationHandler::new(self.store.clone(), self.image)),
        );
        handlers.insert(
            QueueName::Publication,
            Arc::new(PublicationHandler::new(self.store, self.connectors)),
        );
        handlers.insert(
            QueueName::Email,
            Arc::new(EmailHandler::new(self.email, self.email_from)),
        );
        handlers
    }
}
