use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leaders_api::auth::sessions::{start_session_cleanup, SESSION_CLEANUP_INTERVAL};
use leaders_api::config::{RateLimitBackend, ServerConfig};
use leaders_api::push::PushService;
use leaders_api::rate_limit::{self, PgRateLimiter};
use leaders_api::router::build_app_router;
use leaders_api::state::AppState;
use leaders_api::ws;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leaders_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = leaders_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    leaders_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    leaders_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Storage ---
    tokio::fs::create_dir_all(&config.storage.root)
        .await
        .expect("Failed to create STORAGE_ROOT");
    tracing::info!(root = %config.storage.root.display(), "Object storage ready");

    // --- Web Push ---
    let push = PushService::from_config(&config.push, pool.clone())
        .expect("Invalid VAPID configuration")
        .map(Arc::new);
    if push.is_some() {
        tracing::info!("Web Push enabled");
    } else {
        tracing::warn!("VAPID_PRIVATE_KEY not set, Web Push disabled");
    }

    // --- Rate limiting ---
    let push_limiter = rate_limit::build_rate_limiter(&config.rate_limit, pool.clone());
    let purge_handle = (config.rate_limit.backend == RateLimitBackend::Postgres)
        .then(|| rate_limit::start_purge(PgRateLimiter::new(pool.clone(), &config.rate_limit)));
    tracing::info!(
        backend = ?config.rate_limit.backend,
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        "Push rate limiter configured"
    );

    // --- Session cleanup ---
    let session_cleanup_handle = start_session_cleanup(pool.clone(), SESSION_CLEANUP_INTERVAL);

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager));

    // --- Event bus ---
    let event_bus = Arc::new(leaders_events::EventBus::default());
    let forwarder_handle = ws::start_forwarder(event_bus.subscribe(), Arc::clone(&ws_manager));
    tracing::info!("Event bus and change forwarder started");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager: Arc::clone(&ws_manager),
        event_bus: Arc::clone(&event_bus),
        push,
        push_limiter,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    let grace = Duration::from_secs(config.shutdown_timeout_secs);

    if let Some(handle) = purge_handle {
        handle.abort();
    }
    session_cleanup_handle.abort();

    // Dropping the last bus handle closes the channel and ends the forwarder.
    drop(event_bus);
    if tokio::time::timeout(grace, forwarder_handle).await.is_err() {
        tracing::warn!("Change forwarder did not stop in time");
    }

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
