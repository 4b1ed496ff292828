//! Configuration loading and environment variable handling

use crate::domains::PorticoConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new config loader with the default prefix
    pub fn new() -> Self {
        Self {
            prefix: "PORTICO".to_string(),
        }
    }

    /// Create a new config loader with a custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<PorticoConfig> {
        let content = std::fs::read_to_string(path)?;
        let mut config: PorticoConfig = serde_yaml::from_str(&content)?;
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<PorticoConfig> {
        let mut config = PorticoConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<PorticoConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    fn apply_env_overrides(&self, config: &mut PorticoConfig) -> ConfigResult<()> {
        self.override_string("DATABASE_URL", &mut config.database.url);
        self.override_parse("DATABASE_MAX_CONNECTIONS", &mut config.database.max_connections)?;

        self.override_string("BIND_ADDRESS", &mut config.server.bind_address);
        self.override_parse("PORT", &mut config.server.port)?;
        self.override_string("BASE_URL", &mut config.server.base_url);
        self.override_string("FRONTEND_URL", &mut config.server.frontend_url);

        self.override_string("JWT_SIGNING_KEY", &mut config.auth.jwt_signing_key);
        self.override_string(
            "REFRESH_TOKEN_HMAC_KEY",
            &mut config.auth.refresh_token_hmac_key,
        );
        self.override_string("GOOGLE_CLIENT_ID", &mut config.auth.google_client_id);
        self.override_string("GOOGLE_CLIENT_SECRET", &mut config.auth.google_client_secret);

        self.override_string("EMAIL_API_KEY", &mut config.email.api_key);
        self.override_string("EMAIL_FROM_ADDRESS", &mut config.email.from_address);

        self.override_string("EMBEDDINGS_API_KEY", &mut config.embeddings.api_key);
        self.override_string("EMBEDDINGS_MODEL", &mut config.embeddings.model);

        self.override_string("STRIPE_SECRET_KEY", &mut config.stripe.secret_key);
        self.override_string("STRIPE_WEBHOOK_SECRET", &mut config.stripe.webhook_secret);

        self.override_parse(
            "UPSTREAM_TIMEOUT_SECONDS",
            &mut config.gateway.upstream_timeout_seconds,
        )?;
        self.override_parse(
            "SESSION_IDLE_TTL_SECONDS",
            &mut config.gateway.session_idle_ttl_seconds,
        )?;

        Ok(())
    }

    fn env_var(&self, name: &str) -> Option<String> {
        std::env::var(format!("{}_{}", self.prefix, name)).ok()
    }

    fn override_string(&self, name: &str, target: &mut String) {
        if let Some(value) = self.env_var(name) {
            *target = value;
        }
    }

    fn override_parse<T: FromStr>(&self, name: &str, target: &mut T) -> ConfigResult<()>
    where
        T::Err: std::fmt::Display,
    {
        if let Some(value) = self.env_var(name) {
            *target = value.parse().map_err(|e| {
                ConfigError::EnvError(format!("{}_{}: {}", self.prefix, name, e))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            concat!(
                "auth:\n",
                "  jwt_signing_key: test-signing-key\n",
                "  refresh_token_hmac_key: test-hmac-key\n",
                "server:\n",
                "  port: 9000\n",
            )
        )
        .unwrap();

        let config = ConfigLoader::with_prefix("PORTICO_TEST_NONE")
            .from_file(file.path())
            .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth.jwt_signing_key, "test-signing-key");
        assert_eq!(config.gateway.session_idle_ttl_seconds, 3600);
    }

    #[test]
    fn env_override_wins_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            concat!(
                "auth:\n",
                "  jwt_signing_key: file-key\n",
                "  refresh_token_hmac_key: file-hmac\n",
            )
        )
        .unwrap();

        std::env::set_var("PORTICO_LOADER_TEST_JWT_SIGNING_KEY", "env-key");
        let config = ConfigLoader::with_prefix("PORTICO_LOADER_TEST")
            .from_file(file.path())
            .unwrap();
        std::env::remove_var("PORTICO_LOADER_TEST_JWT_SIGNING_KEY");
        assert_eq!(config.auth.jwt_signing_key, "env-key");
    }
}
