//! Input validation utilities.
//!
//! This module contains functions for validating user inputs before they are written to a
//! record file. Required-text and length checks come from `clinic-types`; the shape checks for
//! contact details live here.

use crate::constants::MAX_PHONE_LEN;
use crate::{ClinicError, ClinicResult};
use clinic_types::NonEmptyText;

/// Validates a phone number and returns it trimmed.
///
/// Digits are required; spaces, `+`, `-`, `(` and `)` are accepted as separators.
///
/// # Errors
///
/// Returns a `ClinicError::InvalidField` when blank or too long, and
/// `ClinicError::InvalidInput` when it contains other characters or no digits at all.
pub fn validate_phone_number(input: &str) -> ClinicResult<NonEmptyText> {
    let phone =
        NonEmptyText::bounded(input, MAX_PHONE_LEN).map_err(ClinicError::field("phone number"))?;

    let ok = phone
        .as_str()
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'));
    if !ok || !phone.as_str().chars().any(|c| c.is_ascii_digit()) {
        return Err(ClinicError::InvalidInput(format!(
            "phone number may only contain digits, spaces and + - ( ); got '{}'",
            phone
        )));
    }

    Ok(phone)
}

/// Validates an email address and returns it trimmed.
///
/// Deliberately shallow: one `@` with something on both sides, and no whitespace.
///
/// # Errors
///
/// Returns a `ClinicError::InvalidField` when blank, or `ClinicError::InvalidInput` otherwise.
pub fn validate_email(input: &str) -> ClinicResult<NonEmptyText> {
    let email = NonEmptyText::new(input).map_err(ClinicError::field("email"))?;

    let well_formed = match email.as_str().split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        }
        None => false,
    };
    if !well_formed || email.as_str().chars().any(char::is_whitespace) {
        return Err(ClinicError::InvalidInput(format!(
            "email address is not valid: '{}'",
            email
        )));
    }

    Ok(email)
}
