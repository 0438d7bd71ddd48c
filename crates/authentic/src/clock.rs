//! Time source used for token expiry decisions

use chrono::{DateTime, Utc};
use std::fmt::Debug;

/// Answers whether an instant is still ahead of "now"
///
/// The validator never reads the system time directly; substituting a
/// [`FixedClock`] makes expiry evaluation deterministic.
pub trait Clock: Send + Sync + Debug {
    /// `true` when `instant` is strictly after the current time
    fn is_future(&self, instant: DateTime<Utc>) -> bool;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn is_future(&self, instant: DateTime<Utc>) -> bool {
        Utc::now() < instant
    }
}

/// Clock frozen at a single instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    /// Freeze the clock at `now`
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Freeze the clock at a unix timestamp (seconds)
    ///
    /// Returns `None` when the timestamp is out of range.
    pub fn at_unix(secs: i64) -> Option<Self> {
        DateTime::from_timestamp(secs, 0).map(Self::new)
    }

    /// The frozen instant
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

impl Clock for FixedClock {
    fn is_future(&self, instant: DateTime<Utc>) -> bool {
        self.now < instant
    }
}
