// src/db/audit_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::audit::{AuditEntry, SuspiciousEvent},
    services::sources::GuardEventSink,
};

// Inserções simples; nenhuma leitura passa por aqui
#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_audit_entry(&self, entry: &AuditEntry) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO guard_audit_logs (
                actor_id, restaurant_id, action, allowed, reason, occurred_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.actor_id)
        .bind(entry.restaurant_id)
        .bind(entry.action.as_code())
        .bind(entry.allowed)
        .bind(entry.reason.map(|r| r.as_code()))
        .bind(entry.occurred_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn insert_suspicious_event(&self, event: &SuspiciousEvent) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO suspicious_events (
                actor_id, restaurant_id, order_id, item_count,
                subtotal, total, reason, occurred_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(event.actor_id)
        .bind(event.restaurant_id)
        .bind(event.order_id)
        .bind(event.item_count)
        .bind(event.subtotal)
        .bind(event.total)
        .bind(event.reason.as_code())
        .bind(event.occurred_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl GuardEventSink for AuditRepository {
    async fn record_audit(&self, entry: &AuditEntry) -> Result<(), AppError> {
        self.insert_audit_entry(entry).await
    }

    async fn record_suspicious(&self, event: &SuspiciousEvent) -> Result<(), AppError> {
        self.insert_suspicious_event(event).await
    }
}
