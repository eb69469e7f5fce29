//! Canonical time.
//!
//! Device wall clocks and timezones are not trusted. Every "now" and every
//! "which day is it" question goes through a [`CanonicalClock`], which pairs
//! an instant source with a fixed IANA timezone.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::constants::{DEFAULT_ANCHOR_DATE, DEFAULT_TIMEZONE};
use crate::domain::midnight_utc;
use crate::error::{MedSyncError, MedSyncResult};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Clone)]
pub struct CanonicalClock {
    clock: Arc<dyn Clock>,
    tz: Tz,
}

impl CanonicalClock {
    pub fn new(clock: impl Clock + 'static, tz: Tz) -> Self {
        CanonicalClock {
            clock: Arc::new(clock),
            tz,
        }
    }

    /// System clock in the default canonical timezone.
    pub fn system() -> MedSyncResult<Self> {
        Ok(Self::new(SystemClock, parse_timezone(DEFAULT_TIMEZONE)?))
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn now_local(&self) -> DateTime<Tz> {
        self.now().with_timezone(&self.tz)
    }

    /// Calendar day of `instant` in the canonical timezone.
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    pub fn today(&self) -> NaiveDate {
        self.date_of(self.now())
    }

    pub fn is_today(&self, instant: DateTime<Utc>) -> bool {
        self.date_of(instant) == self.today()
    }
}

pub fn parse_timezone(name: &str) -> MedSyncResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| MedSyncError::UnknownTimezone(name.to_string()))
}

/// Parse a YYYY-MM-DD anchor day as midnight UTC.
pub fn parse_anchor(date: &str) -> MedSyncResult<DateTime<Utc>> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(midnight_utc)
        .map_err(|_| {
            MedSyncError::Config(format!(
                "Invalid anchor date '{date}'. Expected YYYY-MM-DD"
            ))
        })
}

pub fn default_anchor() -> DateTime<Utc> {
    parse_anchor(DEFAULT_ANCHOR_DATE).unwrap_or(DateTime::<Utc>::MIN_UTC)
}
