use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    error::AppError,
    models::{CreateUserRequest, LoginRequest, UserSummary, UserView},
    utils::{hash_password, success_to_api_response, verify_password},
};

/// 加载用户及其收藏并序列化
pub(crate) async fn load_user_view(state: &AppState, user_id: i32) -> Result<UserView, AppError> {
    state
        .store
        .load_profile(user_id)
        .await?
        .map(|profile| profile.serialize())
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
}

#[axum::debug_handler]
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let users = state.store.list_users().await?;
    let summaries = users.iter().map(UserSummary::from).collect::<Vec<_>>();

    Ok(success_to_api_response(summaries))
}

#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new_user = req.into_new_user(state.config.bcrypt_cost)?;
    let user = state.store.create_user(new_user).await?;
    let view = load_user_view(&state, user.id).await?;

    Ok((StatusCode::CREATED, success_to_api_response(view)))
}

#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let view = load_user_view(&state, user_id).await?;

    Ok(success_to_api_response(view))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.delete_user(user_id).await? {
        return Err(AppError::NotFound(format!("User {} not found", user_id)));
    }
    tracing::info!("Deleted user {}", user_id);

    Ok(success_to_api_response(serde_json::json!({
        "deleted": true
    })))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let Some(user) = state.store.find_user_by_email(req.email.trim()).await? else {
        // 未注册邮箱同样做一次 bcrypt 运算，响应耗时不暴露邮箱是否存在
        hash_password(&req.password, state.config.bcrypt_cost)?;
        return Err(AppError::Unauthorized);
    };

    if !verify_password(&req.password, &user.password)? {
        tracing::debug!("Rejected login for user {}", user.id);
        return Err(AppError::Unauthorized);
    }

    let view = load_user_view(&state, user.id).await?;
    Ok(success_to_api_response(view))
}
