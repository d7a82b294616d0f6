// src/db/restaurant_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::restaurant::Membership,
    services::sources::MembershipSource,
};

// Vínculos usuário <-> restaurante (quem escreve é o módulo de cadastro)
#[derive(Clone)]
pub struct RestaurantRepository {
    pool: PgPool,
}

impl RestaurantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Papel do usuário no restaurante e o fuso do restaurante.
    /// Esta é a verificação de autorização de toda rota do guard.
    pub async fn find_membership(
        &self,
        user_id: Uuid,
        restaurant_id: Uuid,
    ) -> Result<Option<Membership>, AppError> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT m.role, r.utc_offset_minutes
            FROM restaurant_members m
            JOIN restaurants r ON r.id = m.restaurant_id
            WHERE m.user_id = $1 AND m.restaurant_id = $2
            "#,
        )
        .bind(user_id)
        .bind(restaurant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(membership)
    }
}

#[async_trait]
impl MembershipSource for RestaurantRepository {
    async fn membership(
        &self,
        user_id: Uuid,
        restaurant_id: Uuid,
    ) -> Result<Option<Membership>, AppError> {
        self.find_membership(user_id, restaurant_id).await
    }
}
