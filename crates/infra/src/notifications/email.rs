//! Outbound email transport used by the `email` queue handler.

use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    /// The message itself cannot be built; resending will not help.
    #[error("invalid email: {0}")]
    Message(String),

    #[error("email delivery failed: {0}")]
    Transport(String),
}

#[async_trait]
pub trait EmailSender: Send + Sync + 'static {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;
}

/// Writes messages to the log instead of delivering them. Default for dev.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        info!(to = %message.to, subject = %message.subject, "email sent (log transport)");
        Ok(())
    }
}

/// How the SMTP session is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmtpSecurity {
    /// Plain connection upgraded with STARTTLS (port 587).
    #[default]
    StartTls,
    /// TLS from the first byte (port 465).
    Tls,
    /// No encryption. Local relays and test servers only.
    None,
}

impl std::str::FromStr for SmtpSecurity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "starttls" => Ok(Self::StartTls),
            "tls" | "ssl" => Ok(Self::Tls),
            "none" | "plain" => Ok(Self::None),
            other => Err(format!("unknown SMTP security mode `{other}`")),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    /// `None` keeps the mode's standard port.
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub security: SmtpSecurity,
    pub timeout: Duration,
}

impl SmtpConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            username: None,
            password: None,
            security: SmtpSecurity::default(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("security", &self.security)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Delivers through an SMTP relay. The blocking transport runs on the
/// blocking pool so a slow relay never stalls a runtime thread.
#[derive(Clone)]
pub struct SmtpEmailSender {
    transport: SmtpTransport,
}

impl SmtpEmailSender {
    pub fn new(config: &SmtpConfig) -> Result<Self, EmailError> {
        let builder = match config.security {
            SmtpSecurity::StartTls => SmtpTransport::starttls_relay(&config.host),
            SmtpSecurity::Tls => SmtpTransport::relay(&config.host),
            SmtpSecurity::None => Ok(SmtpTransport::builder_dangerous(&config.host)),
        }
        .map_err(|e| EmailError::Transport(e.to_string()))?;

        let mut builder = builder.timeout(Some(config.timeout));
        if let Some(port) = config.port {
            builder = builder.port(port);
        }
        if let Some(username) = &config.username {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                config.password.clone().unwrap_or_default(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }

    fn build_message(message: &EmailMessage) -> Result<Message, EmailError> {
        let from: Mailbox = message
            .from
            .parse()
            .map_err(|e| EmailError::Message(format!("from `{}`: {e}", message.from)))?;
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| EmailError::Message(format!("to `{}`: {e}", message.to)))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| EmailError::Message(e.to_string()))
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let email = Self::build_message(message)?;
        let transport = self.transport.clone();

        let response = tokio::task::spawn_blocking(move || transport.send(&email))
            .await
            .map_err(|e| EmailError::Transport(format!("send task aborted: {e}")))?
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        debug!(to = %message.to, code = %response.code(), "email accepted by relay");
        Ok(())
    }
}

/// Captures messages for tests.
#[derive(Debug, Default)]
pub struct InMemoryEmailSender {
    sent: Mutex<Vec<EmailMessage>>,
}

impl InMemoryEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl EmailSender for InMemoryEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    fn message(to: &str) -> EmailMessage {
        EmailMessage {
            from: "noreply@talentflow.test".into(),
            to: to.into(),
            subject: "Backend Engineer approved".into(),
            body: "The posting is live.".into(),
        }
    }

    /// Minimal SMTP relay: accepts one message and hands back its DATA section.
    async fn fake_relay() -> (u16, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let (read, mut write) = socket.into_split();
            let mut lines = BufReader::new(read).lines();
            write.write_all(b"220 relay.test ESMTP\r\n").await.unwrap();

            let mut tx = Some(tx);
            let mut data: Option<String> = None;
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(buf) = data.as_mut() {
                    if line == "." {
                        if let Some(tx) = tx.take() {
                            let _ = tx.send(std::mem::take(buf));
                        }
                        data = None;
                        write.write_all(b"250 queued\r\n").await.unwrap();
                    } else {
                        buf.push_str(&line);
                        buf.push('\n');
                    }
                    continue;
                }
                let verb = line.split_whitespace().next().unwrap_or("").to_ascii_uppercase();
                let reply: &[u8] = match verb.as_str() {
                    "DATA" => {
                        data = Some(String::new());
                        b"354 go ahead\r\n"
                    }
                    "QUIT" => {
                        write.write_all(b"221 bye\r\n").await.unwrap();
                        break;
                    }
                    _ => b"250 ok\r\n",
                };
                write.write_all(reply).await.unwrap();
            }
        });

        (port, rx)
    }

    fn plain(port: u16) -> SmtpConfig {
        SmtpConfig {
            port: Some(port),
            security: SmtpSecurity::None,
            timeout: Duration::from_secs(2),
            ..SmtpConfig::new("127.0.0.1")
        }
    }

    #[tokio::test]
    async fn smtp_sender_delivers_to_relay() {
        let (port, received) = fake_relay().await;
        let sender = SmtpEmailSender::new(&plain(port)).unwrap();

        sender.send(&message("hr@acme.test")).await.unwrap();

        let data = received.await.unwrap();
        assert!(data.contains("Subject: Backend Engineer approved"));
        assert!(data.contains("hr@acme.test"));
        assert!(data.contains("The posting is live."));
    }

    #[tokio::test]
    async fn unreachable_relay_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let sender = SmtpEmailSender::new(&plain(port)).unwrap();
        let err = sender.send(&message("hr@acme.test")).await.unwrap_err();
        assert!(matches!(err, EmailError::Transport(_)));
    }

    #[tokio::test]
    async fn unparsable_address_is_a_message_error() {
        let sender = SmtpEmailSender::new(&plain(9)).unwrap();
        let err = sender.send(&message("not an address")).await.unwrap_err();
        assert!(matches!(err, EmailError::Message(_)));
    }

    #[test]
    fn security_mode_parses_and_password_is_redacted() {
        assert_eq!("STARTTLS".parse::<SmtpSecurity>(), Ok(SmtpSecurity::StartTls));
        assert_eq!("ssl".parse::<SmtpSecurity>(), Ok(SmtpSecurity::Tls));
        assert_eq!("none".parse::<SmtpSecurity>(), Ok(SmtpSecurity::None));
        assert!("carrier-pigeon".parse::<SmtpSecurity>().is_err());

        let cfg = SmtpConfig {
            password: Some("hunter2".into()),
            ..SmtpConfig::new("smtp.example.test")
        };
        assert!(!format!("{cfg:?}").contains("hunter2"));
    }
}
