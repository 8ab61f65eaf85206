use axum::{
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{AppState, error::AppError, models::EntityKind, utils::success_to_api_response};

use crate::routes::user::load_user_view;

#[axum::debug_handler]
pub async fn get_favorites(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let view = load_user_view(&state, user_id).await?;

    Ok(success_to_api_response(view))
}

#[axum::debug_handler]
pub async fn add_favorite(
    State(state): State<AppState>,
    Path((user_id, kind, entity_id)): Path<(i32, String, i32)>,
) -> Result<impl IntoResponse, AppError> {
    let kind: EntityKind = kind.parse()?;

    if state.store.add_favorite(user_id, kind, entity_id).await? {
        tracing::info!("User {} favorited {} {}", user_id, kind, entity_id);
    }
    let view = load_user_view(&state, user_id).await?;

    Ok(success_to_api_response(view))
}

#[axum::debug_handler]
pub async fn remove_favorite(
    State(state): State<AppState>,
    Path((user_id, kind, entity_id)): Path<(i32, String, i32)>,
) -> Result<impl IntoResponse, AppError> {
    let kind: EntityKind = kind.parse()?;

    if !state.store.remove_favorite(user_id, kind, entity_id).await? {
        return Err(AppError::NotFound(format!(
            "User {} has no favorite {} {}",
            user_id, kind, entity_id
        )));
    }
    let view = load_user_view(&state, user_id).await?;

    Ok(success_to_api_response(view))
}
