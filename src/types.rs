//! Core value types shared by checkpoints and commits.

use crate::error::HistoryError;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Id of whoever produced a change (owner of a repository or a peer).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity(String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Result<Self, HistoryError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(HistoryError::InvalidArguments(
                "identity must not be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Nanoseconds since the Unix epoch.
///
/// Stored big-endian in keys so byte order equals time order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    pub fn now() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self(nanos)
    }

    pub fn as_nanos(&self) -> u64 {
        self.0
    }

    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    pub fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let secs = (self.0 / 1_000_000_000) as i64;
        let nanos = (self.0 % 1_000_000_000) as u32;
        DateTime::<Utc>::from_timestamp(secs, nanos)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::Nanos, true)),
            None => write!(f, "{}ns", self.0),
        }
    }
}

/// Clock that never hands out the same timestamp twice.
///
/// Wall clock readings that do not advance past the last issued value are
/// bumped by one nanosecond.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: u64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start after `floor`, e.g. the newest timestamp already on disk.
    pub fn starting_after(floor: Timestamp) -> Self {
        Self { last: floor.0 }
    }

    pub fn tick(&mut self) -> Timestamp {
        let now = Timestamp::now().0;
        self.last = if now > self.last { now } else { self.last + 1 };
        Timestamp(self.last)
    }
}
