// src/services/status_resolver.rs

use std::{sync::Arc, time::Duration};

use backon::{ExponentialBuilder, Retryable};
use chrono::FixedOffset;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{clock::{Clock, LocalDay}, error::GuardError},
    models::{
        attendance::{AttendanceRecord, ClockType, ShiftStatus},
        cash_register::{CashRegisterSession, CashRegisterStatus},
        guard::ActorRole,
        restaurant::RestaurantAccess,
    },
    services::sources::{AttendanceSource, CashRegisterSource},
};

/// Turno ativo se a batida mais recente do dia for uma entrada.
///
/// Os registros já devem estar filtrados para o dia local do funcionário.
/// Em empate de horário a saída vence.
pub fn resolve_shift(role: ActorRole, records: &[AttendanceRecord]) -> ShiftStatus {
    match role {
        ActorRole::Owner | ActorRole::Admin => return ShiftStatus::exempt(),
        ActorRole::Employee => {}
    }

    let latest = records.iter().max_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| clock_rank(a.clock_type).cmp(&clock_rank(b.clock_type)))
    });

    let last_of = |kind: ClockType| {
        records
            .iter()
            .filter(|r| r.clock_type == kind)
            .map(|r| r.timestamp)
            .max()
    };

    ShiftStatus {
        has_active_shift: latest.is_some_and(|r| r.clock_type == ClockType::ClockIn),
        last_clock_in: last_of(ClockType::ClockIn),
        last_clock_out: last_of(ClockType::ClockOut),
    }
}

fn clock_rank(kind: ClockType) -> u8 {
    match kind {
        ClockType::ClockIn => 0,
        ClockType::ClockOut => 1,
    }
}

/// A existência da linha é o único sinal de "aberto". O saldo inicial não decide nada.
pub fn resolve_cash_register(session: Option<&CashRegisterSession>) -> CashRegisterStatus {
    match session {
        None => CashRegisterStatus::default(),
        Some(s) => CashRegisterStatus {
            is_open: !s.is_closed,
            is_closed: s.is_closed,
            has_opening_balance: s.opening_balance > Decimal::ZERO,
            opening_balance: s.opening_balance,
            register_id: Some(s.id),
            can_process_sales: !s.is_closed,
        },
    }
}

/// Lê as fontes com backoff e resolve os dois status.
///
/// O fuso vem de cada chamada: o "hoje" é o dia local do restaurante consultado.
#[derive(Clone)]
pub struct StatusResolver {
    attendance: Arc<dyn AttendanceSource>,
    cash_registers: Arc<dyn CashRegisterSource>,
    clock: Arc<dyn Clock>,
    backoff: ExponentialBuilder,
}

impl StatusResolver {
    pub fn new(
        attendance: Arc<dyn AttendanceSource>,
        cash_registers: Arc<dyn CashRegisterSource>,
        clock: Arc<dyn Clock>,
        backoff: ExponentialBuilder,
    ) -> Self {
        Self {
            attendance,
            cash_registers,
            clock,
            backoff,
        }
    }

    pub fn today(&self, utc_offset: FixedOffset) -> LocalDay {
        LocalDay::containing(self.clock.now(), utc_offset)
    }

    pub async fn shift_status(&self, access: &RestaurantAccess) -> Result<ShiftStatus, GuardError> {
        let actor = access.actor;
        // Donos e admins nem consultam o ponto
        match actor.role {
            ActorRole::Owner | ActorRole::Admin => return Ok(ShiftStatus::exempt()),
            ActorRole::Employee => {}
        }

        let day = self.today(access.utc_offset);
        let source = self.attendance.as_ref();
        let employee_id = actor.id;
        let restaurant_id = access.restaurant_id;
        let day_ref = &day;

        let records = (move || source.records_for_day(employee_id, restaurant_id, day_ref))
            .retry(self.backoff)
            .notify(|e: &GuardError, delay: Duration| {
                tracing::warn!(error = %e, ?delay, "Leitura do ponto falhou, tentando de novo");
            })
            .await?;

        let todays: Vec<AttendanceRecord> = records
            .into_iter()
            .filter(|r| {
                r.employee_id == employee_id
                    && r.restaurant_id == restaurant_id
                    && day.contains(r.timestamp)
            })
            .collect();

        let status = resolve_shift(actor.role, &todays);
        tracing::debug!(
            %employee_id,
            %restaurant_id,
            date = %day.date,
            records = todays.len(),
            has_active_shift = status.has_active_shift,
            "Turno resolvido"
        );
        Ok(status)
    }

    pub async fn cash_register_status(
        &self,
        restaurant_id: Uuid,
        utc_offset: FixedOffset,
    ) -> Result<CashRegisterStatus, GuardError> {
        let date = self.today(utc_offset).date;
        let source = self.cash_registers.as_ref();

        let session = (move || source.session_for_date(restaurant_id, date))
            .retry(self.backoff)
            .notify(|e: &GuardError, delay: Duration| {
                tracing::warn!(error = %e, ?delay, "Leitura do caixa falhou, tentando de novo");
            })
            .await?;

        let status = resolve_cash_register(session.as_ref());
        tracing::debug!(
            %restaurant_id,
            %date,
            is_open = status.is_open,
            is_closed = status.is_closed,
            "Caixa resolvido"
        );
        Ok(status)
    }
}
