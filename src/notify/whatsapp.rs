use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::TwilioConfig;

use super::NotifyError;

#[async_trait]
pub trait Messenger: Send + Sync + 'static {
    /// Send `body` to `phone`. An unconfigured messenger succeeds without sending.
    async fn send(&self, phone: &str, body: &str) -> Result<(), NotifyError>;
}

/// WhatsApp delivery through the Twilio Messages REST API.
#[derive(Clone)]
pub struct TwilioMessenger {
    client: Client,
    config: TwilioConfig,
}

const TWILIO_API: &str = "https://api.twilio.com";

impl TwilioMessenger {
    pub fn new(config: TwilioConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(3))
            .build()?;
        Ok(Self { client, config })
    }
}

/// `whatsapp:+<digits>` address for a human-entered phone number.
pub fn whatsapp_address(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("whatsapp:+{digits}")
}

#[async_trait]
impl Messenger for TwilioMessenger {
    async fn send(&self, phone: &str, body: &str) -> Result<(), NotifyError> {
        let (Some(sid), Some(token)) = (
            self.config.account_sid.as_deref(),
            self.config.auth_token.as_deref(),
        ) else {
            tracing::info!("twilio not configured, whatsapp skipped");
            return Ok(());
        };

        let to = whatsapp_address(phone);
        let url = format!("{TWILIO_API}/2010-04-01/Accounts/{sid}/Messages.json");
        let response = self
            .client
            .post(url)
            .basic_auth(sid, Some(token))
            .form(&[
                ("From", self.config.whatsapp_number.as_str()),
                ("To", to.as_str()),
                ("Body", body),
            ])
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

        tracing::info!(to = %to, "whatsapp sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_keeps_only_digits() {
        assert_eq!(whatsapp_address("525574756704"), "whatsapp:+525574756704");
        assert_eq!(whatsapp_address("+52 (55) 7475-6704"), "whatsapp:+525574756704");
    }

    #[tokio::test]
    async fn unconfigured_messenger_is_a_noop() {
        let messenger = TwilioMessenger::new(TwilioConfig::default()).unwrap();
        assert!(messenger.send("5512345678", "hola").await.is_ok());
    }
}
