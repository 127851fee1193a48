use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use studiobook::config::AppConfig;
use studiobook::db;
use studiobook::routes;
use studiobook::services::auth;
use studiobook::services::payments::square::SquareProvider;
use studiobook::services::payments::stripe::StripeProvider;
use studiobook::services::payments::PaymentProvider;
use studiobook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    if auth::bootstrap_admin(&conn, &config, bcrypt::DEFAULT_COST)? {
        tracing::info!("created initial admin account from ADMIN_EMAIL");
    }

    let payments: Box<dyn PaymentProvider> = match config.payment_provider.as_str() {
        "square" => {
            anyhow::ensure!(
                !config.square_access_token.is_empty() && !config.square_location_id.is_empty(),
                "SQUARE_ACCESS_TOKEN and SQUARE_LOCATION_ID must be set when PAYMENT_PROVIDER=square"
            );
            tracing::info!("using Square payments ({})", config.square_environment);
            Box::new(SquareProvider::new(
                config.square_access_token.clone(),
                config.square_location_id.clone(),
                &config.square_environment,
                config.currency.clone(),
                config.square_webhook_signature_key.clone(),
                config.square_webhook_url.clone(),
            ))
        }
        "stripe" => {
            anyhow::ensure!(
                !config.stripe_secret_key.is_empty(),
                "STRIPE_SECRET_KEY must be set when PAYMENT_PROVIDER=stripe"
            );
            tracing::info!("using Stripe payments");
            Box::new(StripeProvider::new(
                config.stripe_secret_key.clone(),
                config.stripe_webhook_secret.clone(),
                config.currency.clone(),
            ))
        }
        other => anyhow::bail!("unknown PAYMENT_PROVIDER: {other}"),
    };

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        payments,
    });

    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
