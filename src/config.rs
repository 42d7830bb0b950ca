//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default location of the libSQL database file.
pub const DEFAULT_DB_PATH: &str = "./data/remont-bot.db";

/// Bot process configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram Bot API token.
    pub telegram_token: SecretString,
    /// Path of the content database.
    pub db_path: PathBuf,
    /// Port of the admin HTTP API.
    pub http_port: u16,
    /// Long-poll timeout passed to `getUpdates`.
    pub poll_timeout: Duration,
    /// Idle time after which an unfinished wizard run is dropped.
    /// `None` keeps sessions until the process exits.
    pub session_idle_timeout: Option<Duration>,
    /// Admin credentials. The admin API is not served without them.
    pub admin: Option<AdminAuthConfig>,
}

/// Static credentials for the admin HTTP API.
#[derive(Debug, Clone)]
pub struct AdminAuthConfig {
    pub login: String,
    pub password: SecretString,
    pub token: SecretString,
}

impl AdminAuthConfig {
    /// Read `AUTH_LOGIN`, `AUTH_PASSWORD` and `AUTH_TOKEN`. Returns `None`
    /// when any of them is unset or empty.
    pub fn from_env() -> Option<Self> {
        let login = non_empty_var("AUTH_LOGIN")?;
        let password = non_empty_var("AUTH_PASSWORD")?;
        let token = non_empty_var("AUTH_TOKEN")?;
        Some(Self {
            login,
            password: SecretString::from(password),
            token: SecretString::from(token),
        })
    }
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let telegram_token = non_empty_var("TELEGRAM_BOT_TOKEN")
            .ok_or_else(|| ConfigError::MissingEnvVar("TELEGRAM_BOT_TOKEN".into()))?;

        let db_path = std::env::var("BOT_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DB_PATH));

        let http_port = parse_var("BOT_HTTP_PORT")?.unwrap_or(3000);
        let poll_timeout_secs: u64 = parse_var("BOT_POLL_TIMEOUT_SECS")?.unwrap_or(30);
        let session_idle_timeout =
            parse_var::<u64>("BOT_SESSION_IDLE_SECS")?.map(Duration::from_secs);

        Ok(Self {
            telegram_token: SecretString::from(telegram_token),
            db_path,
            http_port,
            poll_timeout: Duration::from_secs(poll_timeout_secs),
            session_idle_timeout,
            admin: AdminAuthConfig::from_env(),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty_var(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{raw:?}: {e}"),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_unset_is_none() {
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::remove_var("REMONT_TEST_UNSET_PORT") };
        let parsed: Option<u16> = parse_var("REMONT_TEST_UNSET_PORT").unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn parse_var_rejects_garbage() {
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var("REMONT_TEST_BAD_PORT", "eighty") };
        let err = parse_var::<u16>("REMONT_TEST_BAD_PORT").unwrap_err();
        assert!(err.to_string().contains("REMONT_TEST_BAD_PORT"));
    }

    #[test]
    fn parse_var_reads_value() {
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var("REMONT_TEST_GOOD_PORT", " 8081 ") };
        let parsed: Option<u16> = parse_var("REMONT_TEST_GOOD_PORT").unwrap();
        assert_eq!(parsed, Some(8081));
    }
}
