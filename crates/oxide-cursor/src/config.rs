//! Session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Environment variable holding the database URL.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Environment variable enabling per-statement debug logging.
pub const LOG_STATEMENTS_ENV: &str = "OXIDE_CURSOR_LOG_STATEMENTS";

/// Settings for opening a [`SqliteSession`](crate::SqliteSession).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// SQLite connection URL, e.g. `sqlite://data.db` or `sqlite::memory:`.
    pub database_url: String,
    /// Create the database file when it does not exist.
    pub create_if_missing: bool,
    /// How long to wait on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,
    /// Log every executed statement at debug level.
    pub log_statements: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            create_if_missing: true,
            busy_timeout_ms: 5000,
            log_statements: false,
        }
    }
}

impl SessionConfig {
    /// Creates a configuration for `database_url` with default settings.
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Self::default()
        }
    }

    /// Reads `DATABASE_URL` and `OXIDE_CURSOR_LOG_STATEMENTS`; unset
    /// variables keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup(DATABASE_URL_ENV) {
            config.database_url = url;
        }
        if let Some(flag) = lookup(LOG_STATEMENTS_ENV) {
            config.log_statements = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        config
    }

    /// Parses a JSON configuration; missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::Config`](crate::CursorError::Config) for
    /// malformed JSON.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Sets whether the database file is created when missing.
    #[must_use]
    pub fn create_if_missing(mut self, enabled: bool) -> Self {
        self.create_if_missing = enabled;
        self
    }

    /// Sets the busy timeout.
    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Enables per-statement debug logging.
    #[must_use]
    pub fn log_statements(mut self, enabled: bool) -> Self {
        self.log_statements = enabled;
        self
    }

    /// The busy timeout as a [`Duration`].
    #[must_use]
    pub const fn busy_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert!(config.create_if_missing);
        assert_eq!(config.busy_timeout_duration(), Duration::from_secs(5));
        assert!(!config.log_statements);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = SessionConfig::from_json(r#"{"database_url": "sqlite://app.db"}"#).unwrap();
        assert_eq!(config.database_url, "sqlite://app.db");
        assert_eq!(config.busy_timeout_ms, 5000);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            SessionConfig::from_json("{not json"),
            Err(crate::CursorError::Config(_))
        ));
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (DATABASE_URL_ENV, "sqlite://env.db"),
            (LOG_STATEMENTS_ENV, " Yes "),
        ]
        .into_iter()
        .collect();
        let config = SessionConfig::from_lookup(|name| vars.get(name).map(ToString::to_string));
        assert_eq!(config.database_url, "sqlite://env.db");
        assert!(config.log_statements);
        assert_eq!(config.busy_timeout_ms, 5000);

        let config = SessionConfig::from_lookup(|name| {
            (name == LOG_STATEMENTS_ENV).then(|| "off".to_string())
        });
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn test_from_env() {
        std::env::set_var(DATABASE_URL_ENV, "sqlite://from-env.db");
        std::env::set_var(LOG_STATEMENTS_ENV, "1");
        let config = SessionConfig::from_env();
        std::env::remove_var(DATABASE_URL_ENV);
        std::env::remove_var(LOG_STATEMENTS_ENV);

        assert_eq!(config.database_url, "sqlite://from-env.db");
        assert!(config.log_statements);
        assert!(config.create_if_missing);
    }

    #[test]
    fn test_builder() {
        let config = SessionConfig::new("sqlite://x.db")
            .create_if_missing(false)
            .busy_timeout(Duration::from_millis(250))
            .log_statements(true);
        assert_eq!(config.busy_timeout_ms, 250);
        assert!(!config.create_if_missing);
        assert!(config.log_statements);
    }
}
