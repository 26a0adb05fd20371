mod config;
mod handlers;
mod models;
mod netlify;
mod publisher;
mod slug;
mod supabase;

use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wedsite_gateway=debug,tower_http=debug".into()),
        )
        .init();

    // Load config
    let config = Arc::new(Config::from_env()?);
    info!("Config loaded successfully");

    // Missing credentials are reported per-request as a configuration
    // error; the server still starts so the other endpoint keeps working.
    if config.supabase_url.is_none() || config.supabase_anon_key.is_none() {
        warn!("Supabase credentials not configured; /api/auth will refuse requests");
    }
    if config.netlify_token.is_none() {
        warn!("Netlify token not configured; /api/deploy-site will refuse requests");
    }

    let state = AppState {
        config: config.clone(),
    };

    // The front-end is served from arbitrary origins, so the API gets
    // permissive CORS. Non-POST requests on the API routes get 405 from
    // axum's method routing.
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any);

    let app = Router::new()
        .route("/api/auth", post(handlers::auth::handle_auth))
        .route("/api/deploy-site", post(handlers::publish::deploy_site))
        .route("/health", get(|| async { "OK" }))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start HTTP server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Gateway API server listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
