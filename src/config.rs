use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub cors_origin: Option<String>,
    pub payment_provider: String,
    pub currency: String,
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,
    pub square_access_token: String,
    pub square_location_id: String,
    pub square_environment: String,
    pub square_webhook_signature_key: String,
    pub square_webhook_url: String,
    pub admin_email: String,
    pub admin_password: String,
    pub admin_name: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "studio.db".to_string()),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "change-me-in-production".to_string()),
            session_ttl_hours: env::var("SESSION_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(24),
            cors_origin: env::var("CORS_ORIGIN").ok().filter(|v| !v.is_empty()),
            payment_provider: env::var("PAYMENT_PROVIDER")
                .unwrap_or_else(|_| "stripe".to_string())
                .to_lowercase(),
            currency: env::var("CURRENCY")
                .unwrap_or_else(|_| "usd".to_string())
                .to_lowercase(),
            stripe_secret_key: env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
            stripe_webhook_secret: env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
            square_access_token: env::var("SQUARE_ACCESS_TOKEN").unwrap_or_default(),
            square_location_id: env::var("SQUARE_LOCATION_ID").unwrap_or_default(),
            square_environment: env::var("SQUARE_ENVIRONMENT")
                .unwrap_or_else(|_| "sandbox".to_string()),
            square_webhook_signature_key: env::var("SQUARE_WEBHOOK_SIGNATURE_KEY")
                .unwrap_or_default(),
            square_webhook_url: env::var("SQUARE_WEBHOOK_URL").unwrap_or_default(),
            admin_email: env::var("ADMIN_EMAIL").unwrap_or_default(),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or_default(),
            admin_name: env::var("ADMIN_NAME").unwrap_or_else(|_| "Studio Admin".to_string()),
        }
    }
}
