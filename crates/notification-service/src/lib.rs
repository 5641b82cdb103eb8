mod digest;
mod smtp;

pub use digest::render_digest;
pub use smtp::SmtpNotifier;

use async_trait::async_trait;
use screener_core::ScoredInstrument;

/// A rendered screen digest ready for delivery.
#[derive(Debug, Clone)]
pub struct ScreenDigest {
    pub subject: String,
    pub body: String,
}

impl ScreenDigest {
    pub fn from_results(subject: impl Into<String>, results: &[ScoredInstrument]) -> Self {
        Self {
            subject: subject.into(),
            body: render_digest(results),
        }
    }
}

/// Trait for digest delivery channels.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, digest: &ScreenDigest) -> Result<(), NotificationError>;
    fn name(&self) -> &str;
}

/// Errors from the notification system.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("SMTP error: {0}")]
    Smtp(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Configuration for the notification service.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub smtp_to: Vec<String>,
    pub subject: String,
}

impl NotificationConfig {
    /// Load from environment variables.
    pub fn from_env() -> Self {
        let smtp_to = std::env::var("NOTIFICATION_EMAIL_TO")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            smtp_host: std::env::var("SMTP_HOST").ok().filter(|s| !s.is_empty()),
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(587),
            smtp_username: std::env::var("SMTP_USERNAME")
                .ok()
                .filter(|s| !s.is_empty()),
            smtp_password: std::env::var("SMTP_PASSWORD")
                .ok()
                .filter(|s| !s.is_empty()),
            smtp_from: std::env::var("SMTP_FROM_ADDRESS")
                .ok()
                .filter(|s| !s.is_empty()),
            smtp_to,
            subject: std::env::var("NOTIFICATION_SUBJECT")
                .unwrap_or_else(|_| "Stock screen results".to_string()),
        }
    }
}

/// Dispatches a digest to every configured channel. With nothing
/// configured, sending is a logged no-op rather than an error.
pub struct NotificationService {
    channels: Vec<Box<dyn NotificationChannel>>,
}

impl NotificationService {
    pub fn new(config: &NotificationConfig) -> Self {
        let mut channels: Vec<Box<dyn NotificationChannel>> = Vec::new();

        if config.smtp_host.is_some() && config.smtp_from.is_some() && !config.smtp_to.is_empty() {
            match SmtpNotifier::new(config) {
                Ok(notifier) => {
                    tracing::info!(
                        "Email notifications enabled (SMTP -> {} recipients)",
                        config.smtp_to.len()
                    );
                    channels.push(Box::new(notifier));
                }
                Err(e) => {
                    tracing::warn!("Failed to initialize SMTP notifier: {}", e);
                }
            }
        }

        if channels.is_empty() {
            tracing::info!("No notification channels configured (set SMTP_HOST)");
        }

        Self { channels }
    }

    /// Send a digest to all channels, awaiting completion. Per-channel
    /// failures are logged, not propagated.
    pub async fn send_digest(&self, digest: &ScreenDigest) {
        for channel in &self.channels {
            match channel.send(digest).await {
                Ok(()) => tracing::debug!("Sent digest via {}", channel.name()),
                Err(e) => tracing::warn!("Failed to send digest via {}: {}", channel.name(), e),
            }
        }
    }
}
