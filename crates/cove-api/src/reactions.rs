use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use cove_types::api::{Claims, ToggleReactionRequest};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn toggle_reaction(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ToggleReactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.clone();
    let result =
        tokio::task::spawn_blocking(move || store.toggle_reaction(&message_id, &req.emoji, &claims))
            .await
            .map_err(ApiError::blocking_join)??;

    Ok(Json(result))
}
