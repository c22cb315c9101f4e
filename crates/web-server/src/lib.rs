use analyzer::Analyzer;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use configuration::Config;
use database::{DbRepository, MemoryTradeStore, TradeStore};
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    trace::TraceLayer,
};

pub mod error;
pub mod extract;
pub mod handlers;

/// Largest accepted request body; imports are the only large payloads.
const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TradeStore>,
    pub analyzer: Analyzer,
}

impl AppState {
    pub fn new(store: Arc<dyn TradeStore>) -> Self {
        let analyzer = Analyzer::new(Arc::clone(&store));
        Self { store, analyzer }
    }
}

/// Opens the configured trade store: PostgreSQL by default, or a fresh
/// in-process store when `in_memory` is set.
pub async fn open_store(config: &Config, in_memory: bool) -> anyhow::Result<Arc<dyn TradeStore>> {
    if in_memory {
        tracing::warn!("Using the in-memory trade store; data will be lost on exit.");
        return Ok(Arc::new(MemoryTradeStore::new()));
    }

    let db_pool = database::connect(&config.database).await?;
    if config.database.run_migrations {
        database::run_migrations(&db_pool).await?;
    }
    Ok(Arc::new(DbRepository::new(db_pool)))
}

/// Builds the application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>, cors_allow_any: bool) -> Router {
    let cors = if cors_allow_any {
        CorsLayer::new()
            .allow_origin(AllowOrigin::any())
            .allow_methods(Any)
            .allow_headers(AllowHeaders::any())
            .expose_headers(ExposeHeaders::any())
    } else {
        CorsLayer::new()
    };

    // --- DEFINE THE APPLICATION ROUTES ---
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/trades", get(handlers::list_trades).post(handlers::create_trade))
        .route("/api/trades/import", post(handlers::import_trades))
        .route(
            "/api/trades/:trade_id",
            get(handlers::get_trade)
                .put(handlers::update_trade)
                .delete(handlers::delete_trade),
        )
        .route("/api/analytics/summary", get(handlers::get_summary))
        .route("/api/analytics/by-emotion", get(handlers::get_by_emotion))
        .route("/api/analytics/by-strategy", get(handlers::get_by_strategy))
        .route("/api/analytics/by-coin", get(handlers::get_by_coin))
        .route("/api/analytics/by-time", get(handlers::get_by_time))
        .route("/api/analytics/insights", get(handlers::get_insights))
        .with_state(state)
        .layer(cors)
        // Logs information about every incoming request.
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
}

/// The main function to configure and run the web server.
///
/// Tracing must already be initialised by the caller.
pub async fn run_server(config: &Config, store: Arc<dyn TradeStore>) -> anyhow::Result<()> {
    let addr = config.server.socket_addr()?;
    let app_state = Arc::new(AppState::new(store));
    let app = build_router(app_state, config.server.cors_allow_any);

    tracing::info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
