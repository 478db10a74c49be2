use careerquest::{
    config::{validate_production_config, ServerConfig, VerificationConfig},
    db, handlers,
    services::create_email_service,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "careerquest=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    validate_production_config()?;
    let server_config = ServerConfig::from_env()?;
    let verification_config = VerificationConfig::from_env();
    tracing::info!(
        "Verification codes: {} digits, valid for {} minutes",
        verification_config.code_length,
        verification_config.ttl_minutes()
    );

    // Database connection
    let pool = db::create_pool().await?;

    // Run migrations
    db::run_migrations(&pool).await?;

    let purge_interval = verification_config.purge_interval;
    let app_state = AppState::new(pool, create_email_service(), verification_config);

    // Expired entries are rejected on confirm; this only reclaims the rows.
    let verification_service = Arc::clone(&app_state.verification_service);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(purge_interval);
        loop {
            ticker.tick().await;
            if let Err(e) = verification_service.purge_expired().await {
                tracing::warn!("Failed to purge expired verifications: {}", e);
            }
        }
    });

    let app = handlers::build_router(app_state);

    // Start server
    let addr = server_config.addr();
    tracing::info!("Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
