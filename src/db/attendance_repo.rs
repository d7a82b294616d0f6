// src/db/attendance_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{clock::LocalDay, error::{AppError, GuardError}},
    models::attendance::AttendanceRecord,
    services::sources::AttendanceSource,
};

// Leitura da tabela 'attendance_records' (quem escreve é o módulo de presença)
#[derive(Clone)]
pub struct AttendanceRepository {
    pool: PgPool,
}

impl AttendanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Batidas do intervalo [start, end), mais recente primeiro
    pub async fn find_in_range(
        &self,
        employee_id: Uuid,
        restaurant_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let records = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT id, employee_id, restaurant_id, clock_type, "timestamp"
            FROM attendance_records
            WHERE employee_id = $1
              AND restaurant_id = $2
              AND "timestamp" >= $3
              AND "timestamp" < $4
            ORDER BY "timestamp" DESC
            "#,
        )
        .bind(employee_id)
        .bind(restaurant_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

#[async_trait]
impl AttendanceSource for AttendanceRepository {
    async fn records_for_day(
        &self,
        employee_id: Uuid,
        restaurant_id: Uuid,
        day: &LocalDay,
    ) -> Result<Vec<AttendanceRecord>, GuardError> {
        self.find_in_range(employee_id, restaurant_id, day.start, day.end)
            .await
            .map_err(|e| GuardError::query("attendance_records", e))
    }
}
