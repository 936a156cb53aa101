//! Process configuration read from environment variables.
//!
//! Every value has a default; unparsable values are logged and replaced by
//! the default rather than aborting startup.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use talentflow_ai::OpenAiConfig;

use crate::notifications::SmtpConfig;
use crate::tasks::{QueueConfig, QueueName, RetryPolicy};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";
pub const DEFAULT_EMAIL_FROM: &str = "noreply@talentflow.local";

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub jwt_secret: String,
    /// `None` selects the template providers.
    pub openai: Option<OpenAiConfig>,
    pub webhook_timeout: Duration,
    pub email_from: String,
    /// `None` selects the log-only email transport.
    pub smtp: Option<SmtpConfig>,
    queues: Vec<(QueueName, QueueConfig)>,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"<redacted>")
            .field("openai", &self.openai.as_ref().map(|_| "<configured>"))
            .field("webhook_timeout", &self.webhook_timeout)
            .field("email_from", &self.email_from)
            .field("smtp", &self.smtp)
            .field("queues", &self.queues)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set; using insecure development secret");
            DEV_JWT_SECRET.to_string()
        });

        let openai = get("OPENAI_API_KEY").map(|key| {
            let mut cfg = OpenAiConfig::new(key);
            if let Some(url) = get("OPENAI_BASE_URL") {
                cfg = cfg.with_base_url(url);
            }
            if let Some(model) = get("OPENAI_TEXT_MODEL") {
                cfg.text_model = model;
            }
            if let Some(model) = get("OPENAI_IMAGE_MODEL") {
                cfg.image_model = model;
            }
            cfg
        });

        let smtp = get("SMTP_HOST").map(|host| {
            let defaults = SmtpConfig::new(host);
            let port = get("SMTP_PORT").and_then(|raw| match raw.trim().parse::<u16>() {
                Ok(port) => Some(port),
                Err(_) => {
                    warn!(key = "SMTP_PORT", value = %raw, "invalid configuration value; using default");
                    None
                }
            });
            SmtpConfig {
                port,
                username: get("SMTP_USERNAME"),
                password: get("SMTP_PASSWORD"),
                security: parse_or("SMTP_SECURITY", get("SMTP_SECURITY"), defaults.security),
                timeout: Duration::from_millis(parse_or(
                    "SMTP_TIMEOUT_MS",
                    get("SMTP_TIMEOUT_MS"),
                    defaults.timeout.as_millis() as u64,
                )),
                ..defaults
            }
        });

        let queues = QueueName::ALL
            .into_iter()
            .map(|name| (name, queue_config(name, &get)))
            .collect();

        Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            jwt_secret,
            openai,
            webhook_timeout: Duration::from_millis(parse_or("WEBHOOK_TIMEOUT_MS", get("WEBHOOK_TIMEOUT_MS"), 5_000)),
            email_from: get("EMAIL_FROM").unwrap_or_else(|| DEFAULT_EMAIL_FROM.to_string()),
            smtp,
            queues,
        }
    }

    pub fn queue(&self, name: QueueName) -> QueueConfig {
        self.queues
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, cfg)| cfg.clone())
            .unwrap_or_default()
    }
}

fn queue_config(name: QueueName, get: &impl Fn(&str) -> Option<String>) -> QueueConfig {
    let defaults = QueueConfig::default();
    let key = |suffix: &str| format!("QUEUE_{}_{suffix}", name.env_key());

    let concurrency_key = key("CONCURRENCY");
    let attempts_key = key("ATTEMPTS");
    let backoff_key = key("BACKOFF_MS");

    let concurrency: usize = parse_or(&concurrency_key, get(&concurrency_key), defaults.concurrency);
    let attempts: u32 = parse_or(&attempts_key, get(&attempts_key), defaults.retry.max_attempts);
    let backoff_ms: u64 = parse_or(
        &backoff_key,
        get(&backoff_key),
        defaults.retry.base_delay.as_millis() as u64,
    );

    defaults
        .clone()
        .with_concurrency(concurrency.max(1))
        .with_retry(RetryPolicy::exponential(
            attempts.max(1),
            Duration::from_millis(backoff_ms),
            defaults.retry.max_delay,
        ))
}

fn parse_or<T: FromStr + Copy>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "invalid configuration value; using default");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::SmtpSecurity;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> AppConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_match_queue_contract() {
        let cfg = config(&[]);
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert!(cfg.openai.is_none());
        assert_eq!(cfg.webhook_timeout, Duration::from_secs(5));
        assert!(cfg.smtp.is_none());

        for name in QueueName::ALL {
            let q = cfg.queue(name);
            assert_eq!(q.concurrency, 5);
            assert_eq!(q.retry.max_attempts, 3);
            assert_eq!(q.retry.base_delay, Duration::from_secs(2));
        }
    }

    #[test]
    fn per_queue_overrides_apply_only_to_that_queue() {
        let cfg = config(&[
            ("QUEUE_PUBLICATION_CONCURRENCY", "2"),
            ("QUEUE_PUBLICATION_ATTEMPTS", "5"),
            ("QUEUE_PUBLICATION_BACKOFF_MS", "250"),
        ]);
        let publication = cfg.queue(QueueName::Publication);
        assert_eq!(publication.concurrency, 2);
        assert_eq!(publication.retry.max_attempts, 5);
        assert_eq!(publication.retry.base_delay, Duration::from_millis(250));
        assert_eq!(cfg.queue(QueueName::Email).concurrency, 5);
    }

    #[test]
    fn bad_values_fall_back_to_defaults() {
        let cfg = config(&[
            ("QUEUE_EMAIL_CONCURRENCY", "lots"),
            ("WEBHOOK_TIMEOUT_MS", "-1"),
            ("JWT_SECRET", "  "),
        ]);
        assert_eq!(cfg.queue(QueueName::Email).concurrency, 5);
        assert_eq!(cfg.webhook_timeout, Duration::from_secs(5));
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
    }

    #[test]
    fn openai_is_enabled_by_api_key() {
        let cfg = config(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_TEXT_MODEL", "gpt-test"),
        ]);
        let openai = cfg.openai.unwrap();
        assert_eq!(openai.text_model, "gpt-test");
    }

    #[test]
    fn smtp_is_enabled_by_host() {
        let cfg = config(&[
            ("SMTP_HOST", "smtp.example.test"),
            ("SMTP_PORT", "2525"),
            ("SMTP_USERNAME", "mailer"),
            ("SMTP_PASSWORD", "pw"),
            ("SMTP_SECURITY", "tls"),
        ]);
        let smtp = cfg.smtp.unwrap();
        assert_eq!(smtp.host, "smtp.example.test");
        assert_eq!(smtp.port, Some(2525));
        assert_eq!(smtp.username.as_deref(), Some("mailer"));
        assert_eq!(smtp.security, SmtpSecurity::Tls);
        assert_eq!(smtp.timeout, Duration::from_secs(10));

        let fallback = config(&[("SMTP_HOST", "relay"), ("SMTP_PORT", "99999"), ("SMTP_SECURITY", "?")]);
        let smtp = fallback.smtp.unwrap();
        assert_eq!(smtp.port, None);
        assert_eq!(smtp.security, SmtpSecurity::StartTls);
    }

    #[test]
    fn debug_output_hides_secrets() {
        let cfg = config(&[
            ("JWT_SECRET", "s3cr3t"),
            ("OPENAI_API_KEY", "sk-live"),
            ("SMTP_HOST", "relay"),
            ("SMTP_PASSWORD", "smtp-pw"),
        ]);
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("s3cr3t"));
        assert!(!printed.contains("sk-live"));
        assert!(!printed.contains("smtp-pw"));
    }
}
