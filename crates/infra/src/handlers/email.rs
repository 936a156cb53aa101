use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::notifications::{EmailError, EmailMessage, EmailSender};
use crate::tasks::{EmailPayload, TaskContext, TaskError, TaskHandler};

/// `email` handler. Delivery errors are retried; malformed payloads are not.
pub struct EmailHandler {
    sender: Arc<dyn EmailSender>,
    from: String,
}

impl EmailHandler {
    pub fn new(sender: Arc<dyn EmailSender>, from: impl Into<String>) -> Self {
        Self {
            sender,
            from: from.into(),
        }
    }
}

/// Replace `{{key}}` with the string form of `data[key]`. Unknown keys stay.
/// Substituted text is never scanned again.
fn render(template: &str, data: Option<&Value>) -> String {
    let Some(Value::Object(fields)) = data else {
        return template.to_string();
    };

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            out.push_str(&rest[open..]);
            return out;
        };
        let key = &after[..close];
        match fields.get(key) {
            Some(Value::String(s)) => out.push_str(s),
            Some(Value::Null) => {}
            Some(other) => out.push_str(&other.to_string()),
            None => out.push_str(&rest[open..open + 2 + close + 2]),
        }
        rest = &after[close + 2..];
    }
    out.push_str(rest);
    out
}

#[async_trait]
impl TaskHandler for EmailHandler {
    async fn handle(&self, ctx: &TaskContext) -> Result<Value, TaskError> {
        let payload: EmailPayload = ctx.payload()?;
        payload.validate().map_err(TaskError::InvalidPayload)?;

        let (subject, body) = match &payload.template {
            Some(template) => {
                debug!(template = %template, to = %payload.to, "rendering email template");
                (
                    render(&payload.subject, payload.data.as_ref()),
                    render(&payload.body, payload.data.as_ref()),
                )
            }
            None => (payload.subject.clone(), payload.body.clone()),
        };

        let message = EmailMessage {
            from: self.from.clone(),
            to: payload.to.clone(),
            subject,
            body,
        };
        self.sender.send(&message).await.map_err(|e| match e {
            EmailError::Message(msg) => TaskError::InvalidPayload(msg),
            EmailError::Transport(msg) => TaskError::Transient(msg),
        })?;
        ctx.progress(100);

        Ok(json!({ "to": message.to, "subject": message.subject }))
    }
}
