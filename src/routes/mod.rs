use axum::{
    Extension, Router,
    routing::{get, post},
};

use crate::{AppState, middleware::log_errors, models::EntityKind};

pub mod catalog;
pub mod favorite;
pub mod user;

// 单个实体类型的路由，类型通过 Extension 传给处理函数
fn entity_routes(kind: EntityKind) -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::list_entities).post(catalog::create_entity))
        .route(
            "/{id}",
            get(catalog::get_entity)
                .put(catalog::update_entity)
                .delete(catalog::delete_entity),
        )
        .route("/{id}/favorited-by", get(catalog::favorited_by))
        .layer(Extension(kind))
}

pub fn api_routes() -> Router<AppState> {
    let mut router = Router::new()
        .route("/login", post(user::login))
        .route("/users", get(user::list_users).post(user::create_user))
        .route("/users/{id}", get(user::get_user).delete(user::delete_user))
        .route("/users/{id}/favorites", get(favorite::get_favorites))
        .route(
            "/users/{id}/favorites/{kind}/{entity_id}",
            post(favorite::add_favorite).delete(favorite::remove_favorite),
        );

    for kind in EntityKind::ALL {
        router = router.nest(&format!("/{}", kind.segment()), entity_routes(kind));
    }

    router
}

/// 挂载到 api_base_uri 下并附加错误日志中间件
pub fn create_router(state: AppState) -> Router {
    let base = state.config.api_base_uri.clone();
    let router = if base == "/" {
        api_routes()
    } else {
        Router::new().nest(&base, api_routes())
    };

    router
        .layer(axum::middleware::from_fn(log_errors))
        .with_state(state)
}
