//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Environment variables are read by the binaries only; services see
//! an immutable [`CoreConfig`] so that request handling and tests never race on process state.

use crate::constants::{BOOKINGS_DIR_NAME, PATIENTS_DIR_NAME, USERS_DIR_NAME};
use crate::{ClinicError, ClinicResult};
use chrono::{FixedOffset, Offset, Utc};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    utc_offset: FixedOffset,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `utc_offset` is the clinic's local offset; it decides which calendar day is "today" and
    /// how wall-clock appointment times relate to UTC instants.
    pub fn new(data_dir: PathBuf, utc_offset: FixedOffset) -> ClinicResult<Self> {
        if data_dir.as_os_str().is_empty() {
            return Err(ClinicError::InvalidInput(
                "data directory cannot be empty".into(),
            ));
        }

        Ok(Self {
            data_dir,
            utc_offset,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn patients_dir(&self) -> PathBuf {
        self.data_dir.join(PATIENTS_DIR_NAME)
    }

    pub fn users_dir(&self) -> PathBuf {
        self.data_dir.join(USERS_DIR_NAME)
    }

    pub fn bookings_dir(&self) -> PathBuf {
        self.data_dir.join(BOOKINGS_DIR_NAME)
    }

    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }
}

/// Parse the clinic UTC offset from an optional string value.
///
/// Accepts `Z`, `UTC`, or `±HH:MM` / `±HHMM` / `±HH`. If `value` is `None` or blank, returns UTC.
pub fn utc_offset_from_env_value(value: Option<String>) -> ClinicResult<FixedOffset> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let Some(value) = value else {
        return Ok(Utc.fix());
    };

    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return Ok(Utc.fix());
    }

    let invalid = || {
        ClinicError::InvalidInput(format!(
            "UTC offset must look like +07:00, -05:30 or Z; got '{value}'"
        ))
    };

    let (sign, rest) = match value.as_bytes().first() {
        Some(b'+') => (1, &value[1..]),
        Some(b'-') => (-1, &value[1..]),
        _ => return Err(invalid()),
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.bytes().all(|b| b.is_ascii_digit()) || !matches!(digits.len(), 2 | 4) {
        return Err(invalid());
    }

    let hours: i32 = digits[0..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = if digits.len() == 4 {
        digits[2..4].parse().map_err(|_| invalid())?
    } else {
        0
    };
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}
