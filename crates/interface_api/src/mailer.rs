//! Outgoing account mail
//!
//! Delivery sits behind [`Mailer`]. The bundled [`LogMailer`] writes each
//! mail to the log, which is what development and tests run with.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ApiConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
#[error("Mail delivery failed: {0}")]
pub struct MailError(pub String);

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: Mail) -> Result<(), MailError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: Mail) -> Result<(), MailError> {
        tracing::info!(to = %mail.to, subject = %mail.subject, body = %mail.body, "Mail queued");
        Ok(())
    }
}

/// Builds the links mailed to users
#[derive(Debug, Clone)]
pub struct MailTemplates {
    frontend_url: String,
}

impl MailTemplates {
    pub fn from_config(config: &ApiConfig) -> Self {
        Self {
            frontend_url: config.frontend_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn verification(&self, to: &str, token: &str) -> Mail {
        Mail {
            to: to.to_string(),
            subject: "Verify your Nestmate account".to_string(),
            body: format!(
                "Welcome to Nestmate! Confirm your email address by opening {}/verify-email?token={}",
                self.frontend_url, token
            ),
        }
    }

    pub fn password_reset(&self, to: &str, token: &str) -> Mail {
        Mail {
            to: to.to_string(),
            subject: "Reset your Nestmate password".to_string(),
            body: format!(
                "A password reset was requested for this address. Choose a new password at {}/reset-password?token={}",
                self.frontend_url, token
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_use_frontend_url() {
        let config = ApiConfig {
            frontend_url: "https://nestmate.example/".to_string(),
            ..ApiConfig::default()
        };
        let templates = MailTemplates::from_config(&config);
        let mail = templates.verification("a@b.com", "tok");
        assert_eq!(mail.to, "a@b.com");
        assert!(mail.body.contains("https://nestmate.example/verify-email?token=tok"));
        assert!(templates
            .password_reset("a@b.com", "tok")
            .body
            .contains("/reset-password?token=tok"));
    }
}
