// src/db/cash_register_repo.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::{AppError, GuardError},
    models::cash_register::CashRegisterSession,
    services::sources::CashRegisterSource,
};

#[derive(Clone)]
pub struct CashRegisterRepository {
    pool: PgPool,
}

impl CashRegisterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // No máximo uma linha por (restaurante, dia). Ausência não é erro.
    pub async fn find_by_date(
        &self,
        restaurant_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<CashRegisterSession>, AppError> {
        let session = sqlx::query_as::<_, CashRegisterSession>(
            r#"
            SELECT id, restaurant_id, date, opening_balance, is_closed
            FROM cash_register_sessions
            WHERE restaurant_id = $1 AND date = $2
            "#,
        )
        .bind(restaurant_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }
}

#[async_trait]
impl CashRegisterSource for CashRegisterRepository {
    async fn session_for_date(
        &self,
        restaurant_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<CashRegisterSession>, GuardError> {
        self.find_by_date(restaurant_id, date)
            .await
            .map_err(|e| GuardError::query("cash_register_sessions", e))
    }
}
