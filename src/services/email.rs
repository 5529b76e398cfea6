//! Email service for account verification and welcome messages
//!
//! Without an SMTP host the message is written to the log instead.

use lettre::{
    message::{header::ContentType, Mailbox, Message, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};
use std::str::FromStr;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
};

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Link the user follows to verify their address
    pub fn verification_url(&self, token: &str) -> String {
        format!(
            "{}/verify-email?token={}",
            self.config.app_url.trim_end_matches('/'),
            token
        )
    }

    pub async fn send_verification_email(&self, to: &str, name: &str, token: &str) -> AppResult<()> {
        let subject = "Verify Your Email Address - Inventory System";
        let url = self.verification_url(token);
        let body = format!(
            r#"
Hello {name},

Thank you for registering with the Inventory System.

Please verify your email address by opening the link below:

{url}

This link will expire in 24 hours.

If you did not create an account, you can ignore this email.
"#,
            name = name,
            url = url
        );

        self.send_email(to, subject, &body).await
    }

    pub async fn send_welcome_email(&self, to: &str, name: &str) -> AppResult<()> {
        let subject = "Welcome to Inventory System!";
        let body = format!(
            r#"
Hello {name},

Your email address has been verified and your account is now active.

You can sign in at {url}/login
"#,
            name = name,
            url = self.config.app_url.trim_end_matches('/')
        );

        self.send_email(to, subject, &body).await
    }

    async fn send_email(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        let Some(host) = self.config.smtp_host.as_deref() else {
            tracing::info!(to = %to, subject = %subject, "SMTP not configured, email logged instead\n{}", body);
            return Ok(());
        };

        let from_name = self
            .config
            .smtp_from_name
            .as_deref()
            .unwrap_or("Inventory System");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let to_mailbox = Mailbox::from_str(to)
            .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(format!(
                                r#"<html><body><pre>{}</pre></body></html>"#,
                                body.replace('\n', "<br>")
                            )),
                    ),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        let mailer_builder = if self.config.smtp_use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        }
        .port(self.config.smtp_port);

        let mailer_builder = if let (Some(username), Some(password)) =
            (&self.config.smtp_username, &self.config.smtp_password)
        {
            mailer_builder.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            mailer_builder
        };

        mailer_builder
            .build()
            .send(email)
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to send email: {}", e)))?;

        tracing::info!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_url() {
        let service = EmailService::new(EmailConfig {
            app_url: "https://inventory.example.com/".to_string(),
            ..Default::default()
        });
        assert_eq!(
            service.verification_url("abc"),
            "https://inventory.example.com/verify-email?token=abc"
        );
    }

    #[tokio::test]
    async fn test_console_fallback_without_smtp_host() {
        let service = EmailService::new(EmailConfig::default());
        assert!(service
            .send_welcome_email("someone@example.com", "Someone")
            .await
            .is_ok());
    }
}
