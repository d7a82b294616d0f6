// src/models/change.rs

use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeCollection {
    Attendance,
    CashRegister,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeOperation {
    Insert,
    Update,
    Delete,
}

// Payload que os triggers publicam no canal `guard_changes`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowChange {
    pub collection: ChangeCollection,
    pub operation: ChangeOperation,
    pub restaurant_id: Uuid,
    pub employee_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Row(RowChange),
    /// A conexão com o feed caiu e voltou: notificações podem ter sido perdidas.
    Resync,
}
