// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Json, Router,
};
use utoipa::OpenApi;

use crate::{
    config::AppState,
    docs::ApiDoc,
    handlers,
    middleware::auth::{auth_guard, tenant_guard},
};

pub fn router(app_state: AppState) -> Router {
    // A última camada é a mais externa: autenticação antes do vínculo com o restaurante
    let guard_routes = Router::new()
        .route("/shift", get(handlers::guard::get_shift_status))
        .route("/cash-register", get(handlers::guard::get_cash_register_status))
        .route("/refresh", post(handlers::guard::refresh))
        .route("/check", post(handlers::guard::check))
        .route("/session", delete(handlers::guard::end_session))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api/guard", guard_routes)
        .with_state(app_state)
}
