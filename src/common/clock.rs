// src/common/clock.rs

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeDelta, Utc};

// Fonte de "agora". Injetável para os testes fixarem o dia.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Dia civil local do restaurante, convertido para o intervalo UTC `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalDay {
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl LocalDay {
    pub fn containing(instant: DateTime<Utc>, offset: FixedOffset) -> Self {
        let date = instant.with_timezone(&offset).date_naive();
        Self::of(date, offset)
    }

    pub fn of(date: NaiveDate, offset: FixedOffset) -> Self {
        // Meia-noite local menos o deslocamento = instante UTC
        let local_midnight = date.and_time(NaiveTime::MIN);
        let start = (local_midnight - TimeDelta::seconds(offset.local_minus_utc() as i64)).and_utc();

        Self {
            date,
            start,
            end: start + TimeDelta::days(1),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

#[cfg(test)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
