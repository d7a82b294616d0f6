// src/services/session_guard.rs

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::{sync::watch, time::Instant};
use uuid::Uuid;

use crate::{
    models::{
        audit::{AuditEntry, SuspiciousEvent},
        auth::Actor,
        change::{ChangeCollection, ChangeEvent},
        guard::{
            ActionAttempt, ActorRole, CashRegisterView, DenialReason, GateDecision, ShiftView,
        },
        restaurant::RestaurantAccess,
    },
    services::{
        change_hub::ChangeScope,
        guard_gate,
        session_store::{SessionSnapshot, SessionStateStore, StatusKind},
        sources::GuardEventSink,
        status_resolver::StatusResolver,
    },
};

/// Guard de uma dupla (ator, restaurante).
///
/// Mantém o último status conhecido no store, relê tudo a cada refresh e
/// decide sobre o snapshot. Depois de `teardown` nada mais é escrito.
pub struct SessionGuard {
    access: RestaurantAccess,
    resolver: StatusResolver,
    store: SessionStateStore,
    events: Arc<dyn GuardEventSink>,
    staleness: Duration,
}

impl SessionGuard {
    pub fn new(
        access: RestaurantAccess,
        resolver: StatusResolver,
        events: Arc<dyn GuardEventSink>,
        staleness: Duration,
    ) -> Self {
        Self {
            access,
            resolver,
            store: SessionStateStore::new(),
            events,
            staleness,
        }
    }

    pub fn access(&self) -> RestaurantAccess {
        self.access
    }

    pub fn actor(&self) -> Actor {
        self.access.actor
    }

    pub fn restaurant_id(&self) -> Uuid {
        self.access.restaurant_id
    }

    pub fn change_scope(&self) -> ChangeScope {
        let actor = self.actor();
        let employee_id = match actor.role {
            ActorRole::Owner | ActorRole::Admin => None,
            ActorRole::Employee => Some(actor.id),
        };
        ChangeScope {
            restaurant_id: self.restaurant_id(),
            employee_id,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.store.is_alive()
    }

    pub fn teardown(&self) {
        self.store.teardown();
        tracing::debug!(actor_id = %self.actor().id, restaurant_id = %self.restaurant_id(), "Guard desmontado");
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.store.subscribe()
    }

    // =========================================================================
    //  REFRESH (relê o dia inteiro, nunca aplica deltas)
    // =========================================================================

    pub async fn refresh_shift(&self) {
        let Some(ticket) = self.store.begin(StatusKind::Shift) else {
            return;
        };

        let result = self.resolver.shift_status(&self.access).await;
        if let Err(e) = &result {
            tracing::warn!(actor_id = %self.actor().id, restaurant_id = %self.restaurant_id(), error = %e, "Falha ao resolver turno");
        }

        // O guard pode ter sido desmontado durante a espera
        if !self.store.apply_shift(ticket, result) {
            tracing::debug!(actor_id = %self.actor().id, "Resultado de turno descartado");
        }
    }

    pub async fn refresh_cash_register(&self) {
        let Some(ticket) = self.store.begin(StatusKind::CashRegister) else {
            return;
        };

        let result = self
            .resolver
            .cash_register_status(self.restaurant_id(), self.access.utc_offset)
            .await;
        if let Err(e) = &result {
            tracing::warn!(restaurant_id = %self.restaurant_id(), error = %e, "Falha ao resolver caixa");
        }

        if !self.store.apply_cash_register(ticket, result) {
            tracing::debug!(restaurant_id = %self.restaurant_id(), "Resultado de caixa descartado");
        }
    }

    pub async fn refresh(&self) {
        tokio::join!(self.refresh_shift(), self.refresh_cash_register());
    }

    /// Reação a uma notificação do feed.
    pub async fn apply_change(&self, event: &ChangeEvent) {
        match event {
            ChangeEvent::Resync => self.refresh().await,
            ChangeEvent::Row(row) => match row.collection {
                ChangeCollection::Attendance => self.refresh_shift().await,
                ChangeCollection::CashRegister => self.refresh_cash_register().await,
            },
        }
    }

    /// Relê o que passou do limite de staleness, nunca foi lido ou falhou na última leitura.
    pub async fn refresh_if_stale(&self) {
        let snapshot = self.store.snapshot();
        let now = Instant::now();
        let shift_stale = snapshot.shift.is_stale(now, self.staleness);
        let cash_stale = snapshot.cash_register.is_stale(now, self.staleness);

        match (shift_stale, cash_stale) {
            (true, true) => self.refresh().await,
            (true, false) => self.refresh_shift().await,
            (false, true) => self.refresh_cash_register().await,
            (false, false) => {}
        }
    }

    // =========================================================================
    //  CONSULTAS
    // =========================================================================

    pub fn has_active_shift(&self) -> bool {
        guard_gate::shift_denial(self.actor().role, &self.store.snapshot().shift).is_none()
    }

    pub fn can_process_sales(&self) -> bool {
        guard_gate::cash_register_denial(&self.store.snapshot().cash_register).is_none()
    }

    pub fn shift_view(&self) -> ShiftView {
        let view = self.store.snapshot().shift;
        let has_active_shift = guard_gate::shift_denial(self.actor().role, &view).is_none();
        let status = view.status.unwrap_or_default();
        ShiftView {
            has_active_shift,
            last_clock_in: status.last_clock_in,
            last_clock_out: status.last_clock_out,
            is_loading: view.is_loading,
            error: view.error,
        }
    }

    pub fn cash_register_view(&self) -> CashRegisterView {
        let view = self.store.snapshot().cash_register;
        // Valor anterior preservado para exibição; a decisão usa só o confirmado
        let can_process_sales = guard_gate::cash_register_denial(&view).is_none();
        let status = view.status.unwrap_or_default();
        CashRegisterView {
            is_open: status.is_open,
            has_opening_balance: status.has_opening_balance,
            is_closed: status.is_closed,
            opening_balance: status.opening_balance,
            register_id: status.register_id,
            is_loading: view.is_loading,
            can_process_sales,
            error: view.error,
        }
    }

    // =========================================================================
    //  GATE
    // =========================================================================

    pub async fn check(&self, attempt: &ActionAttempt) -> GateDecision {
        self.refresh_if_stale().await;

        let decision = guard_gate::decide(self.actor().role, &self.store.snapshot(), attempt);
        if let GateDecision::Deny(reason) = decision {
            tracing::info!(
                actor_id = %self.actor().id,
                restaurant_id = %self.restaurant_id(),
                action = attempt.action.as_code(),
                reason = reason.as_code(),
                "Ação bloqueada pelo guard"
            );
            self.report_denial(attempt, reason);
        }
        decision
    }

    // Fire-and-forget: falha de log nunca altera nem atrasa a negação
    fn report_denial(&self, attempt: &ActionAttempt, reason: DenialReason) {
        let occurred_at = Utc::now();
        let (actor_id, restaurant_id) = (self.actor().id, self.restaurant_id());
        let audit = AuditEntry {
            actor_id,
            restaurant_id,
            action: attempt.action,
            allowed: false,
            reason: Some(reason),
            occurred_at,
        };
        let suspicious = match reason {
            DenialReason::KitchenOrderNotSent => Some(SuspiciousEvent {
                actor_id,
                restaurant_id,
                order_id: attempt.order_id,
                item_count: attempt.item_count,
                subtotal: attempt.subtotal,
                total: attempt.total,
                reason,
                occurred_at,
            }),
            DenialReason::RegisterNotOpened
            | DenialReason::RegisterClosed
            | DenialReason::NoActiveShift
            | DenialReason::StatusUnavailable => None,
        };

        let events = self.events.clone();
        tokio::spawn(async move {
            if let Err(e) = events.record_audit(&audit).await {
                tracing::warn!(error = %e, "Falha ao gravar auditoria do guard (ignorada)");
            }
            if let Some(event) = suspicious {
                tracing::warn!(
                    actor_id = %event.actor_id,
                    order_id = ?event.order_id,
                    item_count = event.item_count,
                    total = %event.total,
                    "Cobrança sem comanda enviada"
                );
                if let Err(e) = events.record_suspicious(&event).await {
                    tracing::warn!(error = %e, "Falha ao gravar evento suspeito (ignorada)");
                }
            }
        });
    }
}
