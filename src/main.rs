use split_portal::{
    AppState,
    api::{ApiState, HttpApiClient},
    config::{AppConfig, Env},
    create_router,
    session::{SessionManager, SessionState},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// The asynchronous entry point for the portal, responsible for initializing
/// all core components: Configuration, Logging, the upstream API client, the
/// session record, and the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    // Loads .env file settings before configuration can be read.
    dotenv::dotenv().ok();
    // AppConfig::load() implements the fail-fast principle for missing Production settings.
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // Sets the default log level. It prioritizes the RUST_LOG environment variable,
    // falling back to sensible defaults for local development.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "split_portal=debug,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment
    // The structured logging format is dynamically selected based on the APP_ENV.
    match config.env {
        Env::Local => {
            // LOCAL: Pretty print output for human readability during local debugging.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: JSON format output for ingestion by centralized log aggregators.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Portal starting in {:?} mode", config.env);
    tracing::info!("Upstream expense API: {}", config.api_url);

    // 4. API Client Initialization
    // One shared reqwest-backed client for the remote expense-splitting service.
    let api = Arc::new(HttpApiClient::new(&config.api_url)) as ApiState;

    // 5. Session Initialization
    // The single in-memory session record, Uninitialized until the first page
    // request bootstraps it from the access token cookie.
    let session = Arc::new(SessionManager::new()) as SessionState;

    // 6. Unified State Assembly
    // Bundles all initialized dependencies into the shared AppState.
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState {
        api,
        session,
        config,
    };

    // 7. Router and Server Startup
    let app = create_router(app_state);

    // Binds the TCP listener and initiates the HTTP server.
    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: failed to bind listener. Check BIND_ADDR.");

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on {}", bind_addr);

    // The long-running Axum server process.
    axum::serve(listener, app).await.unwrap();
}
