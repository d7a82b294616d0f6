// src/middleware/tenancy.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::common::error::AppError;

// O nome do nosso cabeçalho HTTP customizado
const RESTAURANT_ID_HEADER: &str = "x-restaurant-id";

// O restaurante em que o ator está operando
#[derive(Debug, Clone, Copy)]
pub struct RestaurantContext(pub Uuid);

impl<S> FromRequestParts<S> for RestaurantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(RESTAURANT_ID_HEADER)
            .ok_or(AppError::InvalidRestaurantContext(
                "O cabeçalho X-Restaurant-ID é obrigatório.",
            ))?;

        let value_str = value.to_str().map_err(|_| {
            AppError::InvalidRestaurantContext(
                "Cabeçalho X-Restaurant-ID contém caracteres inválidos.",
            )
        })?;

        let restaurant_id = Uuid::parse_str(value_str.trim()).map_err(|_| {
            AppError::InvalidRestaurantContext("Cabeçalho X-Restaurant-ID inválido (não é um UUID).")
        })?;

        Ok(RestaurantContext(restaurant_id))
    }
}
