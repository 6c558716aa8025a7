use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use cove_api::messages;
use cove_api::middleware::require_auth;
use cove_api::reactions;
use cove_api::state::{AppState, AppStateInner};
use cove_api::store::MessageStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cove=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("COVE_DB_PATH").unwrap_or_else(|_| "cove.db".into());
    let host = std::env::var("COVE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("COVE_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = cove_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        store: MessageStore::new(Arc::new(db)),
    });

    // Routes — identity is supplied by the auth middleware; the handlers
    // trust the resolved claims.
    let app = Router::new()
        .route("/channels/{channel_id}/messages", get(messages::list_messages))
        .route("/channels/{channel_id}/messages", post(messages::create_message))
        .route("/messages/{message_id}", put(messages::update_message))
        .route("/messages/{message_id}/thread", get(messages::list_thread_replies))
        .route("/messages/{message_id}/reactions", post(reactions::toggle_reaction))
        .layer(middleware::from_fn(require_auth))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Cove server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
