use std::env;

use crate::store::StockPolicy;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub stock_policy: StockPolicy,
    pub notify: NotifyConfig,
    pub mail: MailConfig,
    pub twilio: TwilioConfig,
    pub payment: PaymentConfig,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_hours: i64,
}

/// Recipients for order notifications.
#[derive(Debug, Clone, Default)]
pub struct NotifyConfig {
    pub admin_email: Option<String>,
    pub admin_whatsapp: Option<String>,
    pub store_whatsapp: String,
}

#[derive(Debug, Clone, Default)]
pub struct MailConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub from: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TwilioConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub whatsapp_number: String,
}

impl TwilioConfig {
    pub fn is_configured(&self) -> bool {
        self.account_sid.is_some() && self.auth_token.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PaymentConfig {
    pub api_url: String,
    pub access_token: Option<String>,
    pub success_url: Option<String>,
    pub failure_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(4000);

        let jwt = JwtConfig {
            secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?,
            issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "urbangoal".to_string()),
            audience: env::var("JWT_AUDIENCE").unwrap_or_else(|_| "urbangoal-app".to_string()),
            ttl_hours: env::var("JWT_TTL_HOURS")
                .ok()
                .and_then(|h| h.parse::<i64>().ok())
                .unwrap_or(24),
        };

        let stock_policy = match env::var("STOCK_POLICY") {
            Ok(raw) => raw
                .parse::<StockPolicy>()
                .map_err(|e| anyhow::anyhow!("STOCK_POLICY: {e}"))?,
            Err(_) => StockPolicy::default(),
        };

        let notify = NotifyConfig {
            admin_email: optional("ADMIN_EMAIL"),
            admin_whatsapp: optional("ADMIN_WHATSAPP"),
            store_whatsapp: env::var("STORE_WHATSAPP")
                .unwrap_or_else(|_| "525574756704".to_string()),
        };

        let mail = MailConfig {
            api_url: optional("MAIL_API_URL"),
            api_key: optional("MAIL_API_KEY"),
            from: optional("MAIL_FROM"),
        };

        let twilio = TwilioConfig {
            account_sid: optional("TWILIO_ACCOUNT_SID"),
            auth_token: optional("TWILIO_AUTH_TOKEN"),
            whatsapp_number: env::var("TWILIO_WHATSAPP_NUMBER")
                .unwrap_or_else(|_| "whatsapp:+14155238886".to_string()),
        };

        let payment = PaymentConfig {
            api_url: env::var("PAYMENT_API_URL")
                .unwrap_or_else(|_| "https://api.mercadopago.com".to_string()),
            access_token: optional("PAYMENT_ACCESS_TOKEN"),
            success_url: optional("PAYMENT_SUCCESS_URL"),
            failure_url: optional("PAYMENT_FAILURE_URL"),
        };

        Ok(Self {
            port,
            database_url,
            host,
            jwt,
            stock_policy,
            notify,
            mail,
            twilio,
            payment,
        })
    }
}

// Empty values count as unset so `FOO=` in a .env file disables an integration.
fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
