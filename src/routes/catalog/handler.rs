use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    error::AppError,
    models::{EntityKind, EntityRecord, NewEntity, UserSummary},
    utils::success_to_api_response,
};

fn not_found(kind: EntityKind, id: i32) -> AppError {
    AppError::NotFound(format!("{} {} not found", kind, id))
}

#[axum::debug_handler]
pub async fn list_entities(
    State(state): State<AppState>,
    Extension(kind): Extension<EntityKind>,
) -> Result<impl IntoResponse, AppError> {
    let records = state.store.list_entities(kind).await?;
    let views = records.iter().map(EntityRecord::serialize).collect::<Vec<_>>();

    Ok(success_to_api_response(views))
}

#[axum::debug_handler]
pub async fn create_entity(
    State(state): State<AppState>,
    Extension(kind): Extension<EntityKind>,
    Json(req): Json<NewEntity>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let record = state.store.create_entity(kind, req).await?;

    Ok((StatusCode::CREATED, success_to_api_response(record.serialize())))
}

#[axum::debug_handler]
pub async fn get_entity(
    State(state): State<AppState>,
    Extension(kind): Extension<EntityKind>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let record = state
        .store
        .get_entity(kind, id)
        .await?
        .ok_or_else(|| not_found(kind, id))?;

    Ok(success_to_api_response(record.serialize()))
}

#[axum::debug_handler]
pub async fn update_entity(
    State(state): State<AppState>,
    Extension(kind): Extension<EntityKind>,
    Path(id): Path<i32>,
    Json(req): Json<NewEntity>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let record = state
        .store
        .update_entity(kind, id, req)
        .await?
        .ok_or_else(|| not_found(kind, id))?;

    Ok(success_to_api_response(record.serialize()))
}

#[axum::debug_handler]
pub async fn delete_entity(
    State(state): State<AppState>,
    Extension(kind): Extension<EntityKind>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.delete_entity(kind, id).await? {
        return Err(not_found(kind, id));
    }
    tracing::info!("Deleted {} {}", kind, id);

    Ok(success_to_api_response(serde_json::json!({
        "deleted": true
    })))
}

#[axum::debug_handler]
pub async fn favorited_by(
    State(state): State<AppState>,
    Extension(kind): Extension<EntityKind>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    if state.store.get_entity(kind, id).await?.is_none() {
        return Err(not_found(kind, id));
    }

    let users = state.store.favorited_by(kind, id).await?;
    let summaries = users.iter().map(UserSummary::from).collect::<Vec<_>>();

    Ok(success_to_api_response(summaries))
}
