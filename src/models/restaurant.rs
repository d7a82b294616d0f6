// src/models/restaurant.rs

use chrono::FixedOffset;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::{auth::Actor, guard::ActorRole};

// Vínculo do usuário com o restaurante, junto com o fuso do restaurante
#[derive(Debug, Clone, FromRow)]
pub struct Membership {
    pub role: ActorRole,
    /// `NULL` quando o restaurante não configurou fuso; vale o padrão do serviço.
    pub utc_offset_minutes: Option<i32>,
}

/// Acesso resolvido para uma requisição: quem, onde e em que fuso o "dia" é contado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestaurantAccess {
    pub actor: Actor,
    pub restaurant_id: Uuid,
    pub utc_offset: FixedOffset,
}
