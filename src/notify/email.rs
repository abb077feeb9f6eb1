use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::config::MailConfig;

use super::NotifyError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(&self, email: &Email) -> Result<(), NotifyError>;
}

#[derive(Serialize)]
struct MailPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// Transactional mail over a JSON HTTP API (`POST <MAIL_API_URL>` with a
/// bearer key), the shape shared by most hosted mail providers.
#[derive(Clone)]
pub struct HttpMailer {
    client: Client,
    config: MailConfig,
}

impl HttpMailer {
    pub fn new(config: MailConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(3))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        let (Some(url), Some(key), Some(from)) = (
            self.config.api_url.as_deref(),
            self.config.api_key.as_deref(),
            self.config.from.as_deref(),
        ) else {
            return Err(NotifyError::NotConfigured("mail API"));
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(key)
            .json(&MailPayload {
                from,
                to: &email.to,
                subject: &email.subject,
                html: &email.html,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(to = %email.to, subject = %email.subject, "email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_mailer_reports_it() {
        let mailer = HttpMailer::new(MailConfig::default()).unwrap();
        let err = mailer
            .send(&Email {
                to: "ana@example.com".into(),
                subject: "hi".into(),
                html: "<p>hi</p>".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::NotConfigured(_)));
    }
}
