use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    routing::get_service,
    Router,
};
use secrecy::ExposeSecret;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cardcraft::api::middleware::session::{create_session_layer, AppState};
use cardcraft::config::Config;
use cardcraft::db;
use cardcraft::jobs::premium_expiry;
use cardcraft::services::{
    accounts::bootstrap_admin, background::BackgroundLoader, encryption::PaymentCipher,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cardcraft=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting CardCraft server...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // Create database pool
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
        bootstrap_admin(&pool, email, password.expose_secret())
            .await
            .context("Failed to set up the admin account")?;
    }

    // Create session layer
    let session_layer = create_session_layer(pool.clone(), config.secure_cookies()).await?;
    tracing::info!("Session layer initialized");

    let cipher = PaymentCipher::from_secret(config.payment_encryption_key.expose_secret())?;

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.remote_fetch_timeout_secs))
        .build()?;

    // Keep the scheduler alive for the lifetime of the server
    let _scheduler = match &config.premium_expiry_schedule {
        Some(schedule) => Some(
            premium_expiry::start(pool.clone(), schedule, config.premium_period_days).await?,
        ),
        None => {
            tracing::info!("Premium expiry job disabled");
            None
        }
    };

    // Build application state
    let state = AppState {
        pool: pool.clone(),
        backgrounds: BackgroundLoader::new(
            http_client,
            &config.assets_dir,
            config.max_background_bytes,
        ),
        cipher: Arc::new(cipher),
        config: config.clone(),
    };

    // Serve template assets
    let static_routes = Router::new().nest_service(
        "/static",
        get_service(ServeDir::new(&config.assets_dir)),
    );

    let mut app = cardcraft::api::router(&config)
        .merge(static_routes)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if let Some(origin) = &config.cors_allowed_origin {
        let cors = CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true)
            .expose_headers([
                cardcraft::api::cards::PREMIUM_FEATURES_HEADER,
                header::CONTENT_DISPOSITION,
            ]);
        app = app.layer(cors);
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, cleaning up...");
}
