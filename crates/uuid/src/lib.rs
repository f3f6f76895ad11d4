//! Record identifiers and sharded-path utilities.
//!
//! Every persisted clinic record (patient, user, booking, medical record) is identified by a
//! random UUID. To keep path derivation deterministic, identifiers use a *canonical*
//! representation: **32 lowercase hexadecimal characters** (no hyphens).
//!
//! This crate provides:
//! - [`RecordId`], a wrapper that *guarantees* the canonical format once constructed.
//! - Shared sharding logic to derive a record's directory from its identifier.
//!
//! ## Canonical form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Externally supplied identifiers (CLI arguments, REST path segments) must already be
//! canonical. Use [`RecordId::parse`] to validate them; uppercase or hyphenated forms are
//! rejected rather than normalised.
//!
//! ## Sharded directory layout
//! For a canonical id `u`, records are stored under:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`
//!
//! Example:
//! `clinic_data/bookings/55/0e/550e8400e29b41d4a716446655440000/`

mod service;

pub use service::{RecordId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
