//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.
//!
//! Only process-level settings live here (where to log, where the database is,
//! pipeline limits). Services never read this singleton themselves; the binary
//! reads it once and hands the values to the services it constructs.

use std::env;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    pub host: String,
    pub port: u16,
    /// Upper bound for a single progress read against the store.
    pub fetch_timeout_ms: u64,
    pub max_quiz_attempts: u32,
    pub reset_code_expiry_minutes: u64,
    pub max_password_reset_requests_per_hour: u32,
    pub smtp_host: String,
    pub smtp_username: String,
    pub smtp_password: String,
    pub email_from_name: String,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

fn parsed_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// Every key has a default so a bare checkout can run the server and the
    /// test suites. Malformed numeric values fall back to their defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "learnboard".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "api=info,services=info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "api.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "data/learnboard.db".into()),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: parsed_or("PORT", 3000),
            fetch_timeout_ms: parsed_or("FETCH_TIMEOUT_MS", 5_000),
            max_quiz_attempts: parsed_or("MAX_QUIZ_ATTEMPTS", 3),
            reset_code_expiry_minutes: parsed_or("RESET_CODE_EXPIRY_MINUTES", 15),
            max_password_reset_requests_per_hour: parsed_or(
                "MAX_PASSWORD_RESET_REQUESTS_PER_HOUR",
                3,
            ),
            smtp_host: env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".into()),
            smtp_username: env::var("SMTP_USERNAME").unwrap_or_default(),
            smtp_password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            email_from_name: env::var("EMAIL_FROM_NAME").unwrap_or_else(|_| "Learnboard".into()),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock cannot be acquired.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock.write().expect("Failed to acquire AppConfig write lock");
            *guard = AppConfig::from_env();
        }
    }

    /// Generic internal setter for any field in the config.
    ///
    /// Used by public per-field setter methods.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_log_level(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_level = value.into());
    }

    pub fn set_log_to_stdout(value: bool) {
        AppConfig::set_field(|cfg| cfg.log_to_stdout = value);
    }

    pub fn set_database_path(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.database_path = value.into());
    }

    pub fn set_fetch_timeout_ms(value: u64) {
        AppConfig::set_field(|cfg| cfg.fetch_timeout_ms = value);
    }

    pub fn set_max_quiz_attempts(value: u32) {
        AppConfig::set_field(|cfg| cfg.max_quiz_attempts = value);
    }

    pub fn set_reset_code_expiry_minutes(value: u64) {
        AppConfig::set_field(|cfg| cfg.reset_code_expiry_minutes = value);
    }

    pub fn set_max_password_reset_requests_per_hour(value: u32) {
        AppConfig::set_field(|cfg| cfg.max_password_reset_requests_per_hour = value);
    }
}

// --- Free accessors, mirroring how the binary reads its settings ---

pub fn env() -> String {
    AppConfig::global().env.clone()
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn database_path() -> String {
    AppConfig::global().database_path.clone()
}

pub fn host() -> String {
    AppConfig::global().host.clone()
}

pub fn port() -> u16 {
    AppConfig::global().port
}

pub fn fetch_timeout_ms() -> u64 {
    AppConfig::global().fetch_timeout_ms
}

pub fn max_quiz_attempts() -> u32 {
    AppConfig::global().max_quiz_attempts
}

pub fn reset_code_expiry_minutes() -> u64 {
    AppConfig::global().reset_code_expiry_minutes
}

pub fn max_password_reset_requests_per_hour() -> u32 {
    AppConfig::global().max_password_reset_requests_per_hour
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn setters_override_loaded_values() {
        AppConfig::set_fetch_timeout_ms(250);
        AppConfig::set_max_quiz_attempts(5);
        assert_eq!(fetch_timeout_ms(), 250);
        assert_eq!(max_quiz_attempts(), 5);

        AppConfig::reset();
        assert_ne!(fetch_timeout_ms(), 0);
    }

    #[test]
    #[serial]
    fn reset_code_defaults_to_fifteen_minutes() {
        AppConfig::reset();
        if env::var("RESET_CODE_EXPIRY_MINUTES").is_err() {
            assert_eq!(reset_code_expiry_minutes(), 15);
        }
    }
}
