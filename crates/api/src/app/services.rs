use std::sync::Arc;

use tracing::{info, warn};

use talentflow_ai::{
    ImageGenerator, MockImageGenerator, MockTextGenerator, OpenAiImageGenerator,
    OpenAiTextGenerator, TextGenerator,
};
use talentflow_connectors::ConnectorRegistry;
use talentflow_infra::{
    config::AppConfig,
    handlers::HandlerDeps,
    notifications::{EmailSender, LogEmailSender, Notifier, SmtpEmailSender, WebhookDispatcher},
    services::{
        ApprovalService, ConnectorService, EnqueueService, InboundEventService, PublicationService,
    },
    store::{InMemoryRecruitingStore, RecruitingStore},
    tasks::{QueueRegistry, RunningWorkers},
};

/// Everything the routes talk to, built once per process.
pub struct AppServices {
    pub store: Arc<dyn RecruitingStore>,
    pub queues: Arc<QueueRegistry>,
    pub enqueue: EnqueueService,
    pub approvals: ApprovalService,
    pub publications: PublicationService,
    pub connectors: ConnectorService,
    pub events: InboundEventService,
    handlers: HandlerDeps,
}

impl AppServices {
    /// Start one worker pool per queue. Call once; the caller owns shutdown.
    pub fn start_workers(&self) -> RunningWorkers {
        self.queues.start(self.handlers.clone().into_handlers())
    }
}

/// In-memory wiring: store, queues, providers and connector registry.
pub fn build_services(config: &AppConfig) -> AppServices {
    let store: Arc<dyn RecruitingStore> = InMemoryRecruitingStore::arc();
    let queues = Arc::new(QueueRegistry::new(|name| config.queue(name)));
    let registry = Arc::new(ConnectorRegistry::with_builtin());

    let (text, image): (Arc<dyn TextGenerator>, Arc<dyn ImageGenerator>) = match &config.openai {
        Some(openai) => {
            info!(text_model = %openai.text_model, image_model = %openai.image_model, "using OpenAI providers");
            (
                Arc::new(OpenAiTextGenerator::new(openai.clone())),
                Arc::new(OpenAiImageGenerator::new(openai.clone())),
            )
        }
        None => {
            info!("OPENAI_API_KEY not set; using template providers");
            (Arc::new(MockTextGenerator::new()), Arc::new(MockImageGenerator::new()))
        }
    };

    let email: Arc<dyn EmailSender> = match &config.smtp {
        Some(smtp) => match SmtpEmailSender::new(smtp) {
            Ok(sender) => {
                info!(host = %smtp.host, "using SMTP email transport");
                Arc::new(sender)
            }
            Err(e) => {
                warn!(host = %smtp.host, error = %e, "SMTP transport unavailable; emails will only be logged");
                Arc::new(LogEmailSender)
            }
        },
        None => {
            info!("SMTP_HOST not set; emails will only be logged");
            Arc::new(LogEmailSender)
        }
    };

    let notifier = Notifier::new(
        queues.clone(),
        store.clone(),
        WebhookDispatcher::new(config.webhook_timeout),
    );

    AppServices {
        enqueue: EnqueueService::new(store.clone(), queues.clone()),
        approvals: ApprovalService::new(store.clone(), notifier.clone()),
        events: InboundEventService::new(store.clone(), notifier),
        publications: PublicationService::new(store.clone()),
        connectors: ConnectorService::new(store.clone(), registry.clone()),
        handlers: HandlerDeps {
            store: store.clone(),
            connectors: registry,
            text,
            image,
            email,
            email_from: config.email_from.clone(),
        },
        store,
        queues,
    }
}
