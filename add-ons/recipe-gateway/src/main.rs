//! Axum-based chat gateway for the recipe assistant. Config-driven via CoreConfig.

mod handlers;

use axum::{
    extract::{Path, State},
    http::Method,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use recipe_core::{ConfigError, CoreConfig, Exchange, SessionStore, TraceLogger};
use recipe_llm::{ChatModel, ModelRouter};
use serde::Serialize;
use std::path::Path as StdPath;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Pre-flight check: provider settings present, logs directory writable, port available.
fn run_verify() -> Result<(), String> {
    let config = CoreConfig::load().map_err(|e| format!("Config load failed: {}", e))?;

    print!("Checking provider settings... ");
    let settings = config.provider_settings().map_err(|e| e.to_string())?;
    println!(
        "OK (instance {}, deployment {})",
        settings.instance_name, settings.deployment_name
    );

    print!("Checking logs directory {}... ", config.logs_dir);
    let logs_dir = StdPath::new(&config.logs_dir);
    std::fs::create_dir_all(logs_dir)
        .map_err(|e| format!("logs directory {} not writable: {}", config.logs_dir, e))?;
    println!("OK");

    let port = config.port;
    print!("Checking port {}... ", port);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    match std::net::TcpListener::bind(addr) {
        Ok(listener) => {
            drop(listener);
            println!("OK (available)");
        }
        Err(e) => {
            return Err(format!("Port {} BLOCKED: {}", port, e));
        }
    }

    println!("\n✅ SUCCESS: All systems GO. Ready to start gateway.");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[recipe-gateway] .env not loaded: {} (using system environment)", e);
    }

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--verify") {
        match run_verify() {
            Ok(()) => std::process::exit(0),
            Err(e) => {
                eprintln!("❌ PRE-FLIGHT FAILED: {}", e);
                std::process::exit(1);
            }
        }
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CoreConfig::load().unwrap_or_else(|e| exit_on_config_error(e));
    let settings = config
        .provider_settings()
        .unwrap_or_else(|e| exit_on_config_error(e));

    let model: Arc<dyn ChatModel> = Arc::new(ModelRouter::new(&settings));
    let traces = Arc::new(TraceLogger::new(&config.logs_dir));
    let config = Arc::new(config);

    let app = build_app(AppState {
        config: Arc::clone(&config),
        model,
        sessions: Arc::new(SessionStore::new()),
        traces,
    });

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(
        target: "recipe::gateway",
        deployment = %settings.deployment_name,
        logs_dir = %config.logs_dir,
        "{} listening on {}",
        config.app_name,
        addr
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn exit_on_config_error(e: ConfigError) -> ! {
    tracing::error!(target: "recipe::gateway", error = %e, "Startup configuration invalid");
    eprintln!("[recipe-gateway] {}", e);
    std::process::exit(1);
}

fn frontend_root_dir() -> std::path::PathBuf {
    // Prefer a working-directory relative path for local development (run from workspace root).
    let cwd = std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));
    let from_cwd = cwd.join("recipe-frontend");
    if from_cwd.exists() {
        return from_cwd;
    }

    std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("recipe-frontend")
}

fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", post(handlers::chat::chat))
        .route("/api/history/:session_id", get(history))
        .route("/api/health", get(health))
        // Map `/` -> `recipe-frontend/index.html`
        .route_service("/", ServeFile::new(frontend_root_dir().join("index.html")))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<CoreConfig>,
    pub(crate) model: Arc<dyn ChatModel>,
    pub(crate) sessions: Arc<SessionStore>,
    pub(crate) traces: Arc<TraceLogger>,
}

#[derive(Serialize)]
struct HistoryResponse {
    history: Vec<Exchange>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
    active_sessions: usize,
}

/// GET /api/history/:session_id – exchanges in order; unknown sessions are empty.
async fn history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> axum::Json<HistoryResponse> {
    axum::Json(HistoryResponse {
        history: state.sessions.get(&session_id),
    })
}

/// GET /api/health – liveness plus the number of sessions held in memory.
async fn health(State(state): State<AppState>) -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now(),
        active_sessions: state.sessions.len(),
    })
}
