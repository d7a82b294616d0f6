// Fakes em memória dos colaboradores do guard (apenas testes)

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    common::{
        clock::{FixedClock, LocalDay},
        error::{AppError, GuardError},
        retry,
    },
    models::{
        attendance::{AttendanceRecord, ClockType},
        audit::{AuditEntry, SuspiciousEvent},
        auth::Actor,
        cash_register::CashRegisterSession,
        guard::ActorRole,
        restaurant::{Membership, RestaurantAccess},
    },
    services::{
        sources::{AttendanceSource, CashRegisterSource, GuardEventSink, MembershipSource},
        status_resolver::StatusResolver,
    },
};

/// 2024-05-01 12:00 UTC, o "agora" de todos os testes.
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn test_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, minute, 0).unwrap()
}

pub fn record(
    employee_id: Uuid,
    restaurant_id: Uuid,
    clock_type: ClockType,
    timestamp: DateTime<Utc>,
) -> AttendanceRecord {
    AttendanceRecord {
        id: Uuid::new_v4(),
        employee_id,
        restaurant_id,
        clock_type,
        timestamp,
    }
}

pub fn session(restaurant_id: Uuid, opening_balance: i64, is_closed: bool) -> CashRegisterSession {
    CashRegisterSession {
        id: Uuid::new_v4(),
        restaurant_id,
        date: test_today(),
        opening_balance: Decimal::new(opening_balance, 0),
        is_closed,
    }
}

#[derive(Default)]
pub struct FakeAttendance {
    records: Mutex<Vec<AttendanceRecord>>,
    queries: AtomicUsize,
    failing: AtomicBool,
}

impl FakeAttendance {
    pub fn push(&self, record: AttendanceRecord) {
        self.records.lock().unwrap().push(record);
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl AttendanceSource for FakeAttendance {
    async fn records_for_day(
        &self,
        employee_id: Uuid,
        restaurant_id: Uuid,
        day: &LocalDay,
    ) -> Result<Vec<AttendanceRecord>, GuardError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(GuardError::query("attendance_records", "conexão recusada"));
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                r.employee_id == employee_id
                    && r.restaurant_id == restaurant_id
                    && day.contains(r.timestamp)
            })
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct FakeCashRegisters {
    sessions: Mutex<HashMap<(Uuid, NaiveDate), CashRegisterSession>>,
    queries: AtomicUsize,
    failing: AtomicBool,
    delay: Mutex<Duration>,
}

impl FakeCashRegisters {
    pub fn put(&self, session: CashRegisterSession) {
        self.sessions
            .lock()
            .unwrap()
            .insert((session.restaurant_id, session.date), session);
    }

    pub fn remove(&self, restaurant_id: Uuid) {
        self.sessions
            .lock()
            .unwrap()
            .retain(|(r, _), _| *r != restaurant_id);
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }
}

#[async_trait]
impl CashRegisterSource for FakeCashRegisters {
    async fn session_for_date(
        &self,
        restaurant_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<CashRegisterSession>, GuardError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        // Captura o resultado antes de "esperar a rede"
        let snapshot = self.sessions.lock().unwrap().get(&(restaurant_id, date)).cloned();
        let failing = self.failing.load(Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if failing {
            return Err(GuardError::query("cash_register_sessions", "timeout"));
        }
        Ok(snapshot)
    }
}

#[derive(Debug, Clone)]
pub enum SinkRecord {
    Audit(AuditEntry),
    Suspicious(SuspiciousEvent),
}

pub struct FakeSink {
    sender: mpsc::UnboundedSender<SinkRecord>,
    failing: bool,
}

impl FakeSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SinkRecord>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender, failing: false }, receiver)
    }

    pub fn failing() -> (Self, mpsc::UnboundedReceiver<SinkRecord>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender, failing: true }, receiver)
    }
}

#[async_trait]
impl GuardEventSink for FakeSink {
    async fn record_audit(&self, entry: &AuditEntry) -> Result<(), AppError> {
        let _ = self.sender.send(SinkRecord::Audit(entry.clone()));
        if self.failing {
            return Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    async fn record_suspicious(&self, event: &SuspiciousEvent) -> Result<(), AppError> {
        let _ = self.sender.send(SinkRecord::Suspicious(event.clone()));
        if self.failing {
            return Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

pub fn resolver(
    attendance: Arc<FakeAttendance>,
    cash_registers: Arc<FakeCashRegisters>,
) -> StatusResolver {
    StatusResolver::new(
        attendance,
        cash_registers,
        Arc::new(FixedClock(test_now())),
        retry::immediate(1),
    )
}

/// Acesso em um restaurante que conta o dia em UTC.
pub fn access(actor: Actor, restaurant_id: Uuid) -> RestaurantAccess {
    RestaurantAccess {
        actor,
        restaurant_id,
        utc_offset: FixedOffset::east_opt(0).unwrap(),
    }
}

#[derive(Default)]
pub struct FakeMemberships {
    members: Mutex<HashMap<(Uuid, Uuid), Membership>>,
    failing: AtomicBool,
}

impl FakeMemberships {
    pub fn add(&self, user_id: Uuid, restaurant_id: Uuid, role: ActorRole, utc_offset_minutes: Option<i32>) {
        self.members.lock().unwrap().insert(
            (user_id, restaurant_id),
            Membership { role, utc_offset_minutes },
        );
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl MembershipSource for FakeMemberships {
    async fn membership(
        &self,
        user_id: Uuid,
        restaurant_id: Uuid,
    ) -> Result<Option<Membership>, AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut));
        }
        Ok(self.members.lock().unwrap().get(&(user_id, restaurant_id)).cloned())
    }
}
