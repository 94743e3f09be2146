//! Password reset notification delivery.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use warden_common::{AppError, AppResult, config::EmailConfig};

/// Delivers password reset tokens.
///
/// Failures are reported to the caller and never retried here.
#[async_trait]
pub trait ResetMailer: Send + Sync {
    /// Send `token` to `to`.
    async fn send_password_reset(&self, to: &str, token: &str) -> AppResult<()>;
}

/// Shared mailer handle.
pub type MailerService = Arc<dyn ResetMailer>;

/// Build the mailer for the given configuration.
///
/// Without an `email` section, delivery is disabled and every send fails.
pub fn mailer_from_config(config: Option<&EmailConfig>) -> AppResult<MailerService> {
    match config {
        Some(config) => Ok(Arc::new(SmtpMailer::new(config)?)),
        None => {
            tracing::warn!("No email configuration, password reset delivery is disabled");
            Ok(Arc::new(LogMailer))
        }
    }
}

/// SMTP mailer.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    reset_url: Option<String>,
}

impl SmtpMailer {
    /// Create an SMTP mailer using STARTTLS.
    pub fn new(config: &EmailConfig) -> AppResult<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| AppError::Config(format!("Invalid SMTP relay: {e}")))?
            .port(config.smtp_port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let address = config
            .from_address
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid from address: {e}")))?;

        Ok(Self {
            transport: builder.build(),
            from: Mailbox::new(Some(config.from_name.clone()), address),
            reset_url: config.reset_url.clone(),
        })
    }

    fn body(&self, token: &str) -> String {
        let action = self.reset_url.as_ref().map_or_else(
            || format!("Use the following token to reset your password:\n\n{token}"),
            |url| format!("Open the following link to reset your password:\n\n{url}?token={token}"),
        );
        format!(
            "You have requested to reset your password.\n\n{action}\n\n\
             This token will expire in 1 hour.\n\
             If you did not request this password reset, please ignore this email.\n"
        )
    }
}

#[async_trait]
impl ResetMailer for SmtpMailer {
    async fn send_password_reset(&self, to: &str, token: &str) -> AppResult<()> {
        let recipient: Mailbox = to
            .parse()
            .map_err(|e| AppError::ExternalService(format!("Invalid recipient: {e}")))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject("Password Reset Request")
            .header(ContentType::TEXT_PLAIN)
            .body(self.body(token))
            .map_err(|e| AppError::Internal(format!("Failed to build email: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::ExternalService(format!("SMTP delivery failed: {e}")))?;

        tracing::info!(to = %to, "Password reset email sent");
        Ok(())
    }
}

/// Mailer used when delivery is not configured.
#[derive(Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl ResetMailer for LogMailer {
    async fn send_password_reset(&self, to: &str, _token: &str) -> AppResult<()> {
        tracing::warn!(to = %to, "Password reset requested but email delivery is disabled");
        Err(AppError::ExternalService(
            "Email delivery is not configured".to_string(),
        ))
    }
}
