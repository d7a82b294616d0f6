// src/services/session_store.rs

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::{sync::watch, time::Instant};

use crate::{
    common::error::GuardError,
    models::{attendance::ShiftStatus, cash_register::CashRegisterStatus},
};

// Último estado conhecido de um dos dois status
#[derive(Debug, Clone)]
pub struct StatusView<T> {
    pub status: Option<T>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub resolved_at: Option<Instant>,
    applied_seq: u64,
    pending: u32,
}

impl<T> Default for StatusView<T> {
    fn default() -> Self {
        Self {
            status: None,
            is_loading: false,
            error: None,
            resolved_at: None,
            applied_seq: 0,
            pending: 0,
        }
    }
}

impl<T> StatusView<T> {
    /// Só conta como conhecido o valor resolvido sem erro na última leitura.
    pub fn confirmed(&self) -> Option<&T> {
        match self.error {
            Some(_) => None,
            None => self.status.as_ref(),
        }
    }

    /// Uma leitura que falhou nunca conta como fresca.
    pub fn is_stale(&self, now: Instant, threshold: std::time::Duration) -> bool {
        if self.error.is_some() {
            return true;
        }
        match self.resolved_at {
            None => true,
            Some(at) => now.saturating_duration_since(at) > threshold,
        }
    }

    fn start(&mut self) {
        self.pending += 1;
        self.is_loading = true;
    }

    // Encerra uma leitura pendente. Devolve se o `is_loading` mudou.
    fn settle(&mut self) -> bool {
        self.pending = self.pending.saturating_sub(1);
        let was_loading = self.is_loading;
        self.is_loading = self.pending > 0;
        was_loading != self.is_loading
    }

    // Aplica o resultado se ele não for mais velho que o já aplicado.
    // Em caso de erro, o valor anterior é preservado.
    fn apply(&mut self, seq: u64, result: Result<T, GuardError>, now: Instant) -> bool {
        if seq < self.applied_seq {
            return false;
        }
        self.applied_seq = seq;
        self.resolved_at = Some(now);
        match result {
            Ok(status) => {
                self.status = Some(status);
                self.error = None;
            }
            Err(e) => self.error = Some(e.to_string()),
        }
        true
    }
}

#[cfg(test)]
impl<T> StatusView<T> {
    pub fn resolved(status: T) -> Self {
        Self {
            status: Some(status),
            resolved_at: Some(Instant::now()),
            ..Self::default()
        }
    }

    pub fn failed(previous: Option<T>, error: &str) -> Self {
        Self {
            status: previous,
            error: Some(error.to_string()),
            resolved_at: Some(Instant::now()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub shift: StatusView<ShiftStatus>,
    pub cash_register: StatusView<CashRegisterStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Shift,
    CashRegister,
}

/// Comprovante de uma leitura em andamento (a mais recente iniciada vence).
///
/// Se for descartado sem passar por `apply_*` (refresh cancelado), a leitura
/// deixa de contar como pendente.
pub struct Ticket<'a> {
    store: &'a SessionStateStore,
    kind: StatusKind,
    seq: u64,
    settled: bool,
}

impl Drop for Ticket<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.store.cancel(self.kind);
        }
    }
}

pub struct SessionStateStore {
    snapshot: watch::Sender<SessionSnapshot>,
    alive: AtomicBool,
    shift_seq: AtomicU64,
    cash_seq: AtomicU64,
}

impl Default for SessionStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStateStore {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(SessionSnapshot::default());
        Self {
            snapshot,
            alive: AtomicBool::new(true),
            shift_seq: AtomicU64::new(0),
            cash_seq: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Recebe cada snapshot publicado.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Depois disso nenhuma escrita é aceita.
    pub fn teardown(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Marca o status como carregando e devolve o ticket. `None` se já foi desmontado.
    pub fn begin(&self, kind: StatusKind) -> Option<Ticket<'_>> {
        if !self.is_alive() {
            return None;
        }
        let seq = self.counter(kind).fetch_add(1, Ordering::SeqCst) + 1;
        self.snapshot.send_modify(|s| match kind {
            StatusKind::Shift => s.shift.start(),
            StatusKind::CashRegister => s.cash_register.start(),
        });
        Some(Ticket {
            store: self,
            kind,
            seq,
            settled: false,
        })
    }

    pub fn apply_shift(&self, mut ticket: Ticket<'_>, result: Result<ShiftStatus, GuardError>) -> bool {
        debug_assert_eq!(ticket.kind, StatusKind::Shift);
        ticket.settled = true;
        if !self.is_alive() {
            return false;
        }
        let now = Instant::now();
        let mut applied = false;
        self.snapshot.send_if_modified(|s| {
            let loading_changed = s.shift.settle();
            applied = s.shift.apply(ticket.seq, result, now);
            applied || loading_changed
        });
        applied
    }

    pub fn apply_cash_register(
        &self,
        mut ticket: Ticket<'_>,
        result: Result<CashRegisterStatus, GuardError>,
    ) -> bool {
        debug_assert_eq!(ticket.kind, StatusKind::CashRegister);
        ticket.settled = true;
        if !self.is_alive() {
            return false;
        }
        let now = Instant::now();
        let mut applied = false;
        self.snapshot.send_if_modified(|s| {
            let loading_changed = s.cash_register.settle();
            applied = s.cash_register.apply(ticket.seq, result, now);
            applied || loading_changed
        });
        applied
    }

    // Leitura abandonada: sai da contagem de pendentes sem tocar no valor
    fn cancel(&self, kind: StatusKind) {
        if !self.is_alive() {
            return;
        }
        self.snapshot.send_if_modified(|s| match kind {
            StatusKind::Shift => s.shift.settle(),
            StatusKind::CashRegister => s.cash_register.settle(),
        });
        tracing::debug!(?kind, "Leitura cancelada antes de terminar");
    }

    fn counter(&self, kind: StatusKind) -> &AtomicU64 {
        match kind {
            StatusKind::Shift => &self.shift_seq,
            StatusKind::CashRegister => &self.cash_seq,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::time::Duration;

    fn open_register() -> CashRegisterStatus {
        CashRegisterStatus {
            is_open: true,
            opening_balance: Decimal::ZERO,
            can_process_sales: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_begin_marks_loading() {
        let store = SessionStateStore::new();
        store.begin(StatusKind::Shift).unwrap();
        let snapshot = store.snapshot();
        assert!(snapshot.shift.is_loading);
        assert!(!snapshot.cash_register.is_loading);
    }

    #[tokio::test]
    async fn test_apply_clears_loading_and_stores_value() {
        let store = SessionStateStore::new();
        let ticket = store.begin(StatusKind::CashRegister).unwrap();
        assert!(store.apply_cash_register(ticket, Ok(open_register())));

        let view = store.snapshot().cash_register;
        assert!(!view.is_loading);
        assert_eq!(view.confirmed(), Some(&open_register()));
        assert!(view.resolved_at.is_some());
    }

    #[tokio::test]
    async fn test_error_preserves_previous_value() {
        let store = SessionStateStore::new();
        let first = store.begin(StatusKind::CashRegister).unwrap();
        store.apply_cash_register(first, Ok(open_register()));

        let second = store.begin(StatusKind::CashRegister).unwrap();
        store.apply_cash_register(second, Err(GuardError::query("cash_register_sessions", "timeout")));

        let view = store.snapshot().cash_register;
        assert_eq!(view.status, Some(open_register()));
        assert!(view.error.is_some());
        assert!(!view.is_loading);
        assert_eq!(view.confirmed(), None);
    }

    #[tokio::test]
    async fn test_older_result_never_overwrites_newer() {
        let store = SessionStateStore::new();
        let slow = store.begin(StatusKind::Shift).unwrap();
        let fast = store.begin(StatusKind::Shift).unwrap();

        assert!(store.apply_shift(fast, Ok(ShiftStatus::exempt())));
        assert!(store.snapshot().shift.is_loading);

        assert!(!store.apply_shift(slow, Ok(ShiftStatus::default())));
        let view = store.snapshot().shift;
        assert_eq!(view.status, Some(ShiftStatus::exempt()));
        // O resultado descartado ainda encerra a leitura pendente
        assert!(!view.is_loading);
    }

    #[tokio::test]
    async fn test_dropped_ticket_clears_loading() {
        let store = SessionStateStore::new();
        let ticket = store.begin(StatusKind::CashRegister).unwrap();
        assert!(store.snapshot().cash_register.is_loading);

        drop(ticket);
        let view = store.snapshot().cash_register;
        assert!(!view.is_loading);
        assert_eq!(view.status, None);
        assert_eq!(view.resolved_at, None);
    }

    #[tokio::test]
    async fn test_dropped_ticket_keeps_other_reads_loading() {
        let store = SessionStateStore::new();
        let abandoned = store.begin(StatusKind::Shift).unwrap();
        let running = store.begin(StatusKind::Shift).unwrap();

        drop(abandoned);
        assert!(store.snapshot().shift.is_loading);

        store.apply_shift(running, Ok(ShiftStatus::exempt()));
        assert!(!store.snapshot().shift.is_loading);
    }

    #[tokio::test]
    async fn test_loading_stays_while_newer_read_is_pending() {
        let store = SessionStateStore::new();
        let first = store.begin(StatusKind::Shift).unwrap();
        let _second = store.begin(StatusKind::Shift).unwrap();

        store.apply_shift(first, Ok(ShiftStatus::default()));
        assert!(store.snapshot().shift.is_loading);
    }

    #[tokio::test]
    async fn test_no_writes_after_teardown() {
        let store = SessionStateStore::new();
        let ticket = store.begin(StatusKind::Shift).unwrap();
        store.teardown();

        assert!(!store.apply_shift(ticket, Ok(ShiftStatus::exempt())));
        assert!(store.begin(StatusKind::Shift).is_none());
        assert_eq!(store.snapshot().shift.status, None);
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let store = SessionStateStore::new();
        let mut receiver = store.subscribe();
        let ticket = store.begin(StatusKind::Shift).unwrap();
        store.apply_shift(ticket, Ok(ShiftStatus::exempt()));

        receiver.changed().await.unwrap();
        assert_eq!(receiver.borrow().shift.status, Some(ShiftStatus::exempt()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_staleness() {
        let store = SessionStateStore::new();
        let threshold = Duration::from_secs(60);
        assert!(store.snapshot().shift.is_stale(Instant::now(), threshold));

        let ticket = store.begin(StatusKind::Shift).unwrap();
        store.apply_shift(ticket, Ok(ShiftStatus::default()));
        assert!(!store.snapshot().shift.is_stale(Instant::now(), threshold));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(!store.snapshot().shift.is_stale(Instant::now() - Duration::from_secs(2), threshold));
        assert!(store.snapshot().shift.is_stale(Instant::now(), threshold));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_read_is_always_stale() {
        let store = SessionStateStore::new();
        let threshold = Duration::from_secs(60);

        let ticket = store.begin(StatusKind::CashRegister).unwrap();
        store.apply_cash_register(ticket, Err(GuardError::query("cash_register_sessions", "timeout")));
        let view = store.snapshot().cash_register;
        assert!(view.resolved_at.is_some());
        assert!(view.is_stale(Instant::now(), threshold));

        let ticket = store.begin(StatusKind::CashRegister).unwrap();
        store.apply_cash_register(ticket, Ok(open_register()));
        assert!(!store.snapshot().cash_register.is_stale(Instant::now(), threshold));
    }
}
