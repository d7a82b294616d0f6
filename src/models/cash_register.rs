// src/models/cash_register.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// ---
// Sessão de caixa (uma linha por restaurante e por dia)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashRegisterSession {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    #[schema(value_type = String, format = Date, example = "2024-05-01")]
    pub date: NaiveDate,
    #[schema(example = "50000.00")]
    pub opening_balance: Decimal,
    pub is_closed: bool,
}

/// Estado do caixa de hoje, derivado da existência da linha e do flag `is_closed`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashRegisterStatus {
    pub is_open: bool,
    pub is_closed: bool,
    // Informativo apenas; não participa da decisão de vender.
    pub has_opening_balance: bool,
    pub opening_balance: Decimal,
    pub register_id: Option<Uuid>,
    pub can_process_sales: bool,
}
