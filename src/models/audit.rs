// src/models/audit.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::guard::{DenialReason, SensitiveAction};

// Tentativa que violou a sequência esperada (ex: cobrar sem enviar a comanda)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspiciousEvent {
    pub actor_id: Uuid,
    pub restaurant_id: Uuid,
    pub order_id: Option<Uuid>,
    pub item_count: i32,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub reason: DenialReason,
    pub occurred_at: DateTime<Utc>,
}

// Uma linha por decisão negada do guard
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub actor_id: Uuid,
    pub restaurant_id: Uuid,
    pub action: SensitiveAction,
    pub allowed: bool,
    pub reason: Option<DenialReason>,
    pub occurred_at: DateTime<Utc>,
}
