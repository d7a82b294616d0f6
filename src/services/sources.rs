// src/services/sources.rs

// ---
// Colaboradores externos do guard
// ---
// Os repositórios Postgres implementam estes traits; os testes usam fakes em memória.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    common::{clock::LocalDay, error::{AppError, GuardError}},
    models::{
        attendance::AttendanceRecord,
        audit::{AuditEntry, SuspiciousEvent},
        cash_register::CashRegisterSession,
        restaurant::Membership,
    },
};

#[async_trait]
pub trait AttendanceSource: Send + Sync {
    /// Batidas de ponto do funcionário no restaurante dentro do dia local.
    async fn records_for_day(
        &self,
        employee_id: Uuid,
        restaurant_id: Uuid,
        day: &LocalDay,
    ) -> Result<Vec<AttendanceRecord>, GuardError>;
}

#[async_trait]
pub trait CashRegisterSource: Send + Sync {
    /// `Ok(None)` quando o caixa do dia ainda não foi aberto.
    async fn session_for_date(
        &self,
        restaurant_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<CashRegisterSession>, GuardError>;
}

#[async_trait]
pub trait MembershipSource: Send + Sync {
    /// `Ok(None)` quando o usuário não pertence ao restaurante.
    async fn membership(
        &self,
        user_id: Uuid,
        restaurant_id: Uuid,
    ) -> Result<Option<Membership>, AppError>;
}

#[async_trait]
pub trait GuardEventSink: Send + Sync {
    async fn record_audit(&self, entry: &AuditEntry) -> Result<(), AppError>;

    async fn record_suspicious(&self, event: &SuspiciousEvent) -> Result<(), AppError>;
}
