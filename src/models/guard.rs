// src/models/guard.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums ---

// Papel do ator dentro de um restaurante (tabela 'restaurant_members')
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "actor_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
    Owner,
    Admin,
    Employee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensitiveAction {
    KitchenOrder, // Envio de comanda para a cozinha
    Payment,      // Cobrança
}

impl SensitiveAction {
    pub fn as_code(self) -> &'static str {
        match self {
            SensitiveAction::KitchenOrder => "KITCHEN_ORDER",
            SensitiveAction::Payment => "PAYMENT",
        }
    }
}

/// Motivo de bloqueio. Cada variante corresponde a um modal no front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenialReason {
    RegisterNotOpened,
    RegisterClosed,
    NoActiveShift,
    KitchenOrderNotSent,
    StatusUnavailable,
}

impl DenialReason {
    pub fn as_code(self) -> &'static str {
        match self {
            DenialReason::RegisterNotOpened => "REGISTER_NOT_OPENED",
            DenialReason::RegisterClosed => "REGISTER_CLOSED",
            DenialReason::NoActiveShift => "NO_ACTIVE_SHIFT",
            DenialReason::KitchenOrderNotSent => "KITCHEN_ORDER_NOT_SENT",
            DenialReason::StatusUnavailable => "STATUS_UNAVAILABLE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Deny(DenialReason),
}

impl GateDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, GateDecision::Allow)
    }

    pub fn reason(self) -> Option<DenialReason> {
        match self {
            GateDecision::Allow => None,
            GateDecision::Deny(reason) => Some(reason),
        }
    }
}

// O que o front quer fazer, com o contexto necessário para auditoria
#[derive(Debug, Clone)]
pub struct ActionAttempt {
    pub action: SensitiveAction,
    pub order_id: Option<Uuid>,
    pub kitchen_order_sent: bool,
    pub item_count: i32,
    pub subtotal: Decimal,
    pub total: Decimal,
}

// --- Respostas (o formato que os hooks do front consomem) ---

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShiftView {
    pub has_active_shift: bool,
    pub last_clock_in: Option<DateTime<Utc>>,
    pub last_clock_out: Option<DateTime<Utc>>,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashRegisterView {
    pub is_open: bool,
    pub has_opening_balance: bool,
    pub is_closed: bool,
    #[schema(example = "50000.00")]
    pub opening_balance: Decimal,
    pub register_id: Option<Uuid>,
    pub is_loading: bool,
    pub can_process_sales: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModalPrompt {
    #[schema(example = "Register not opened")]
    pub title: String,
    pub message: String,
    #[schema(example = "Open register")]
    pub action_label: String,
    #[schema(example = "/cash-register/open")]
    pub action_route: String,
}
