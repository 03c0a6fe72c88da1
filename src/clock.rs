use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone};
use std::sync::Mutex;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// The half-open `[start, end)` span of one local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyWindow {
    pub date: NaiveDate,
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
}

impl DailyWindow {
    pub fn for_date(date: NaiveDate) -> Self {
        let next = date.succ_opt().unwrap_or(date);
        Self {
            date,
            start: start_of_day(date),
            end: start_of_day(next),
        }
    }

    pub fn contains(&self, at: DateTime<Local>) -> bool {
        self.start <= at && at < self.end
    }
}

/// Local midnight. Days whose midnight falls into a DST gap start at 01:00.
pub fn start_of_day(date: NaiveDate) -> DateTime<Local> {
    let midnight = date.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            date.and_hms_opt(1, 0, 0)
                .and_then(|one| Local.from_local_datetime(&one).earliest())
        })
        .unwrap_or_else(|| Local.from_utc_datetime(&midnight))
}
