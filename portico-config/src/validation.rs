//! Shared validation helpers for domain configurations

use crate::error::{ConfigError, ConfigResult};

/// Implemented by every domain configuration.
pub trait Validatable {
    fn validate(&self) -> ConfigResult<()>;
}

/// Fail when a required string field is empty.
pub fn validate_required_string(value: &str, field: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}

/// Fail when a numeric field is zero.
pub fn validate_positive(value: u64, field: &str) -> ConfigResult<()> {
    if value == 0 {
        return Err(ConfigError::ValidationError(format!(
            "{} must be greater than zero",
            field
        )));
    }
    Ok(())
}

/// Fail when a field is not an absolute http(s) URL.
pub fn validate_url(value: &str, field: &str) -> ConfigResult<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| ConfigError::ValidationError(format!("{} is not a valid URL: {}", field, e)))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigError::ValidationError(format!(
            "{} must use http or https",
            field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_required_string() {
        assert!(validate_required_string("  ", "jwt_signing_key").is_err());
        assert!(validate_required_string("secret", "jwt_signing_key").is_ok());
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(validate_url("ftp://example.com", "base_url").is_err());
        assert!(validate_url("https://example.com", "base_url").is_ok());
        assert!(validate_url("not a url", "base_url").is_err());
    }
}
