use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use cove_types::api::{Claims, CreateMessageRequest, UpdateMessageRequest};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    /// Page size; defaults to 30, capped at 100.
    pub limit: Option<u32>,
    /// Keyset cursor: the id of the last message of the previous page.
    pub cursor: Option<String>,
}

pub async fn create_message(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Run blocking DB work off the async runtime
    let store = state.store.clone();
    let created = tokio::task::spawn_blocking(move || store.create(&channel_id, &req, &claims))
        .await
        .map_err(ApiError::blocking_join)??;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_messages(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Query(query): Query<MessageQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.clone();
    let page = tokio::task::spawn_blocking(move || {
        store.list_root(&channel_id, query.cursor.as_deref(), query.limit, &claims)
    })
    .await
    .map_err(ApiError::blocking_join)??;

    Ok(Json(page))
}

pub async fn update_message(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.clone();
    let updated =
        tokio::task::spawn_blocking(move || store.update(&message_id, &req.content, &claims))
            .await
            .map_err(ApiError::blocking_join)??;

    Ok(Json(updated))
}

pub async fn list_thread_replies(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.clone();
    let thread = tokio::task::spawn_blocking(move || store.list_thread(&message_id, &claims))
        .await
        .map_err(ApiError::blocking_join)??;

    Ok(Json(thread))
}
