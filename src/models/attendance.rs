// src/models/attendance.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "clock_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClockType {
    ClockIn,  // Entrada
    ClockOut, // Saída
}

// ---
// Registro de ponto (somente leitura para o guard)
// ---
// Uma linha por batida de ponto. Quem escreve é o módulo de presença.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub restaurant_id: Uuid,
    pub clock_type: ClockType,
    pub timestamp: DateTime<Utc>,
}

/// Estado do turno derivado dos registros do dia. Nunca é persistido.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShiftStatus {
    pub has_active_shift: bool,
    pub last_clock_in: Option<DateTime<Utc>>,
    pub last_clock_out: Option<DateTime<Utc>>,
}

impl ShiftStatus {
    /// Donos e administradores não batem ponto: o turno é sempre considerado ativo.
    pub fn exempt() -> Self {
        Self {
            has_active_shift: true,
            last_clock_in: None,
            last_clock_out: None,
        }
    }
}
