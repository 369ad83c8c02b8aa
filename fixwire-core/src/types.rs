/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Core types for FIX session operations.
//!
//! This module provides fundamental types used throughout the fixwire engine:
//! - [`SeqNum`]: Message sequence number wrapper
//! - [`CompId`]: Component identifier (SenderCompID, TargetCompID)
//! - [`FixTimestamp`]: FIX UTC timestamp with strict parse/format grammar

use crate::error::DecodeError;
use arrayvec::ArrayString;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length for CompID strings in bytes.
pub const COMP_ID_MAX_LEN: usize = 32;

/// FIX message sequence number (tag 34).
///
/// Sequence numbers are unsigned 64-bit integers that identify messages
/// within one direction of a FIX session. They start at 1 and increment
/// for each message sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct SeqNum(u64);

impl SeqNum {
    /// Creates a new sequence number.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw sequence number value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns the next sequence number.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl Default for SeqNum {
    fn default() -> Self {
        Self(1)
    }
}

impl From<u64> for SeqNum {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<SeqNum> for u64 {
    fn from(seq: SeqNum) -> Self {
        seq.0
    }
}

impl fmt::Display for SeqNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Component identifier for FIX sessions.
///
/// Used for SenderCompID (tag 49), TargetCompID (tag 56), and related
/// fields. Maximum length is 32 bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct CompId(ArrayString<COMP_ID_MAX_LEN>);

impl CompId {
    /// Creates a new CompId from a string slice.
    ///
    /// # Returns
    /// `Some(CompId)` if the string fits within the maximum length, `None`
    /// otherwise.
    #[must_use]
    pub fn new(s: &str) -> Option<Self> {
        ArrayString::from(s).ok().map(Self)
    }

    /// Returns the CompId as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the length of the CompId in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the CompId is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for CompId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for CompId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CompId {
    type Err = arrayvec::CapacityError<()>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArrayString::try_from(s)
            .map(Self)
            .map_err(|_| arrayvec::CapacityError::new(()))
    }
}

/// Format string for the whole-second FIX UTC timestamp grammar.
const FMT_SECONDS: &str = "%Y%m%d-%H:%M:%S";
/// Format string for the millisecond FIX UTC timestamp grammar.
const FMT_MILLIS: &str = "%Y%m%d-%H:%M:%S%.3f";

/// Length of `YYYYMMDD-HH:MM:SS`.
const LEN_SECONDS: usize = 17;
/// Length of `YYYYMMDD-HH:MM:SS.mmm`.
const LEN_MILLIS: usize = 21;

/// A FIX UTC timestamp (tag 52 and friends).
///
/// Serializes as `YYYYMMDD-HH:MM:SS` or, with millisecond precision
/// requested, `YYYYMMDD-HH:MM:SS.mmm`. The millisecond field is always
/// three digits and is truncated, never rounded, from finer input.
/// Parsing accepts exactly those two grammars and pins the result to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct FixTimestamp(DateTime<Utc>);

impl FixTimestamp {
    /// Returns the current UTC instant.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a chrono `DateTime<Utc>`.
    #[inline]
    #[must_use]
    pub const fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Creates a timestamp from milliseconds since the Unix epoch.
    ///
    /// # Returns
    /// `None` if the value is outside chrono's representable range.
    #[must_use]
    pub fn from_unix_millis(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(Self)
    }

    /// Returns the underlying `DateTime<Utc>`.
    #[inline]
    #[must_use]
    pub const fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Renders the timestamp in FIX wire form.
    ///
    /// # Arguments
    /// * `millis` - Whether to include the three-digit millisecond field
    #[must_use]
    pub fn format(&self, millis: bool) -> String {
        let fmt = if millis { FMT_MILLIS } else { FMT_SECONDS };
        self.0.format(fmt).to_string()
    }

    /// Parses a FIX UTC timestamp string.
    ///
    /// Both grammars are accepted; anything else (wrong length, non-digit
    /// positions, out-of-range calendar components, trailing bytes) is
    /// rejected.
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidTimestamp` on any deviation from the
    /// grammar.
    pub fn parse(s: &str) -> Result<Self, DecodeError> {
        let fmt = match s.len() {
            LEN_SECONDS => FMT_SECONDS,
            LEN_MILLIS => FMT_MILLIS,
            _ => {
                return Err(DecodeError::InvalidTimestamp {
                    value: s.to_string(),
                })
            }
        };

        let naive = NaiveDateTime::parse_from_str(s, fmt).map_err(|_| {
            DecodeError::InvalidTimestamp {
                value: s.to_string(),
            }
        })?;

        Ok(Self(Utc.from_utc_datetime(&naive)))
    }
}

impl From<DateTime<Utc>> for FixTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl fmt::Display for FixTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(true))
    }
}

impl FromStr for FixTimestamp {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
