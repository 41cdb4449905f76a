//! # Temporal Types — UTC-Only Timestamps
//!
//! Defines `Timestamp`, a UTC-only instant used for the convergence timer
//! and for every time-valued status field the operators write.
//!
//! ## Precision
//!
//! Sub-second precision is kept in memory and through serde, so an engine
//! rehydrated from a persisted status compares against exactly the instant
//! it recorded. [`Timestamp::to_rfc3339()`] renders the seconds-precision
//! layout used by Kubernetes `metav1.Time` for display and condition
//! messages.
//!
//! Non-UTC inputs are rejected by [`Timestamp::parse()`]. Use
//! [`Timestamp::parse_lenient()`] when ingesting timestamps from tools that
//! emit explicit offsets.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::O2imsError;

/// A UTC-only timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Wrap a `chrono::DateTime<Utc>`.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Parse an RFC 3339 timestamp with the `Z` suffix.
    ///
    /// # Errors
    ///
    /// Returns [`O2imsError::Validation`] if the string is not RFC 3339 or
    /// carries an explicit offset (even `+00:00`).
    pub fn parse(s: &str) -> Result<Self, O2imsError> {
        if !s.ends_with('Z') {
            return Err(O2imsError::Validation(format!(
                "timestamp must use Z suffix (UTC only), got: {s:?}"
            )));
        }
        Self::parse_lenient(s)
    }

    /// Parse an RFC 3339 timestamp with any offset, converting to UTC.
    pub fn parse_lenient(s: &str) -> Result<Self, O2imsError> {
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| {
            O2imsError::Validation(format!("invalid RFC 3339 timestamp {s:?}: {e}"))
        })?;
        Ok(Self(dt.with_timezone(&Utc)))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Time elapsed from `earlier` to `self`.
    ///
    /// Returns `None` when `earlier` is after `self`, which happens when a
    /// persisted timestamp was written by a host whose clock ran ahead.
    pub fn elapsed_since(&self, earlier: &Timestamp) -> Option<Duration> {
        (self.0 - earlier.0).to_std().ok()
    }

    /// `self + duration`, or `None` on overflow.
    pub fn checked_add(&self, duration: Duration) -> Option<Timestamp> {
        let delta = TimeDelta::from_std(duration).ok()?;
        self.0.checked_add_signed(delta).map(Self)
    }

    /// Render in the `metav1.Time` layout (e.g., `2026-01-15T12:00:00Z`).
    pub fn to_rfc3339(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}
