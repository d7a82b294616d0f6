// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::RestaurantContext,
    models::{auth::AuthenticatedUser, restaurant::RestaurantAccess},
};

// Valida o Bearer e deixa o `AuthenticatedUser` nos extensions da requisição
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(AppError::InvalidToken)?;

    let user = app_state.auth_service.validate_token(bearer.token())?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

// Roda depois do `auth_guard`: confere o vínculo com o restaurante do cabeçalho
// e deixa o `RestaurantAccess` (papel e fuso) para os handlers
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    RestaurantContext(restaurant_id): RestaurantContext,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .copied()
        .ok_or(AppError::InvalidToken)?;

    let access = app_state.access_service.resolve(user, restaurant_id).await?;

    request.extensions_mut().insert(access);
    Ok(next.run(request).await)
}

// Extrator para obter o acesso resolvido diretamente nos handlers
#[derive(Debug, Clone, Copy)]
pub struct CurrentAccess(pub RestaurantAccess);

impl<S> FromRequestParts<S> for CurrentAccess
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RestaurantAccess>()
            .copied()
            .map(CurrentAccess)
            .ok_or(AppError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{auth::Actor, guard::ActorRole},
        services::test_support::access,
    };
    use axum::http::Request as HttpRequest;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_extracts_access_from_extensions() {
        let resolved = access(Actor { id: Uuid::new_v4(), role: ActorRole::Employee }, Uuid::new_v4());
        let mut request = HttpRequest::builder().body(()).unwrap();
        request.extensions_mut().insert(resolved);
        let (mut parts, _) = request.into_parts();

        let CurrentAccess(extracted) =
            CurrentAccess::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(extracted, resolved);
    }

    #[tokio::test]
    async fn test_authenticated_user_alone_is_not_access() {
        let mut request = HttpRequest::builder().body(()).unwrap();
        request.extensions_mut().insert(AuthenticatedUser { id: Uuid::new_v4() });
        let (mut parts, _) = request.into_parts();

        let result = CurrentAccess::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }
}
