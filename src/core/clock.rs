/// Source of the current local time, injectable for tests.
use chrono::{DateTime, Local};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Starts at a fixed instant and moves forward by `step` on every reading.
#[cfg(test)]
pub(crate) struct SteppingClock {
    next: std::sync::Mutex<DateTime<Local>>,
    step: chrono::Duration,
}

#[cfg(test)]
impl SteppingClock {
    pub(crate) fn new(start: DateTime<Local>, step: chrono::Duration) -> Self {
        Self {
            next: std::sync::Mutex::new(start),
            step,
        }
    }

    /// 2026-10-14 09:05:03.120034 local time, one second per reading.
    pub(crate) fn seconds() -> Self {
        use chrono::TimeZone;
        let start = Local
            .with_ymd_and_hms(2026, 10, 14, 9, 5, 3)
            .earliest()
            .unwrap()
            + chrono::Duration::microseconds(120_034);
        Self::new(start, chrono::Duration::seconds(1))
    }
}

#[cfg(test)]
impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Local> {
        let mut next = self.next.lock().unwrap();
        let now = *next;
        *next = now + self.step;
        now
    }
}
