/// Reasons a request fails API-key authentication.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("API key not configured")]
    NotConfigured,
    #[error("Missing API key")]
    Missing,
    #[error("Invalid API key")]
    Invalid,
}

/// Validates the provided API key against the key configured at startup.
///
/// Returns `Ok(())` if the key matches. An empty configured key rejects everything.
pub fn validate_api_key(provided_key: Option<&str>, expected_key: &str) -> Result<(), AuthError> {
    if expected_key.is_empty() {
        return Err(AuthError::NotConfigured);
    }

    match provided_key {
        None => Err(AuthError::Missing),
        Some(key) if constant_time_eq(key.as_bytes(), expected_key.as_bytes()) => Ok(()),
        Some(_) => Err(AuthError::Invalid),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_api_key() {
        assert_eq!(validate_api_key(Some("secret"), "secret"), Ok(()));
        assert_eq!(
            validate_api_key(Some("secreT"), "secret"),
            Err(AuthError::Invalid)
        );
        assert_eq!(
            validate_api_key(Some("secret-longer"), "secret"),
            Err(AuthError::Invalid)
        );
        assert_eq!(validate_api_key(None, "secret"), Err(AuthError::Missing));
        assert_eq!(
            validate_api_key(Some(""), ""),
            Err(AuthError::NotConfigured)
        );
    }
}
