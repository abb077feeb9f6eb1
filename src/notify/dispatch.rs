use std::sync::Arc;

use chrono::Utc;

use crate::config::NotifyConfig;

use super::{
    Email, Mailer, Messenger, NotifyError, OutboundEvent, OutboundSink, templates,
};

/// Production sink: each event is delivered on its own tokio task.
///
/// Delivery is at most once. Failures are logged and dropped.
#[derive(Clone)]
pub struct TaskDispatcher {
    mailer: Arc<dyn Mailer>,
    messenger: Arc<dyn Messenger>,
    recipients: NotifyConfig,
}

impl TaskDispatcher {
    pub fn new(
        mailer: Arc<dyn Mailer>,
        messenger: Arc<dyn Messenger>,
        recipients: NotifyConfig,
    ) -> Self {
        Self {
            mailer,
            messenger,
            recipients,
        }
    }

    pub async fn deliver(&self, event: &OutboundEvent) -> Result<(), NotifyError> {
        let now = Utc::now();
        match event {
            OutboundEvent::CustomerEmail(summary) => {
                let email = Email {
                    to: summary.customer_email.clone(),
                    subject: templates::customer_subject(summary),
                    html: templates::customer_confirmation_html(
                        summary,
                        &self.recipients.store_whatsapp,
                        now,
                    ),
                };
                self.mailer.send(&email).await
            }
            OutboundEvent::CustomerWhatsApp(summary) => {
                let Some(phone) = summary.customer_phone.as_deref() else {
                    return Err(NotifyError::MissingRecipient("customer phone"));
                };
                self.messenger
                    .send(phone, &templates::customer_whatsapp_text(summary))
                    .await
            }
            OutboundEvent::AdminEmail(summary) => {
                let to = self
                    .recipients
                    .admin_email
                    .clone()
                    .ok_or(NotifyError::MissingRecipient("ADMIN_EMAIL"))?;
                let email = Email {
                    to,
                    subject: templates::admin_subject(summary),
                    html: templates::admin_html(summary, now),
                };
                self.mailer.send(&email).await
            }
            OutboundEvent::AdminWhatsApp(summary) => {
                let Some(phone) = self.recipients.admin_whatsapp.as_deref() else {
                    tracing::info!(order_id = %summary.order_id, "ADMIN_WHATSAPP not set, skipped");
                    return Ok(());
                };
                self.messenger
                    .send(phone, &templates::admin_whatsapp_text(summary))
                    .await
            }
        }
    }
}

impl OutboundSink for TaskDispatcher {
    fn submit(&self, event: OutboundEvent) {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            let kind = event.kind();
            let order_id = event.summary().order_id.clone();
            match dispatcher.deliver(&event).await {
                Ok(()) => tracing::debug!(kind, order_id = %order_id, "notification delivered"),
                Err(err) => tracing::warn!(
                    kind,
                    order_id = %order_id,
                    error = %err,
                    "notification failed"
                ),
            }
        });
    }
}
