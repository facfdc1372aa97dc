//! HTTP server settings and the configuration object built from them.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use sugar_spike::domain::{CalendarError, DEFAULT_STORE_TIMEOUT, LocalCalendar};
use sugar_spike::outbound::persistence::DbPool;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Settings read from `SPIKE_*` environment variables, files, and flags.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SPIKE")]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; the in-memory store is used when absent.
    pub database_url: Option<String>,
    /// Fixed offset of the local calendar, in minutes east of UTC.
    pub utc_offset_minutes: Option<i32>,
    /// Deadline for each store call, in milliseconds.
    pub store_timeout_ms: Option<u64>,
    /// Skip the embedded migrations that otherwise run when a database is set.
    #[ortho_config(default = false)]
    pub skip_migrations: bool,
}

/// Errors raised while interpreting [`ServerSettings`].
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address {value}: {message}")]
    BindAddr { value: String, message: String },
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error("store timeout must be positive")]
    ZeroStoreTimeout,
}

impl ServerSettings {
    /// Parsed listen address, defaulting to all interfaces on 8080.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|err: std::net::AddrParseError| SettingsError::BindAddr {
            value: value.to_owned(),
            message: err.to_string(),
        })
    }

    /// Local calendar, defaulting to UTC.
    pub fn calendar(&self) -> Result<LocalCalendar, SettingsError> {
        match self.utc_offset_minutes {
            Some(minutes) => Ok(LocalCalendar::from_offset_minutes(minutes)?),
            None => Ok(LocalCalendar::utc()),
        }
    }

    /// Whether to migrate before serving.
    pub fn run_migrations(&self) -> bool {
        self.database_url.is_some() && !self.skip_migrations
    }

    pub fn store_timeout(&self) -> Result<Duration, SettingsError> {
        match self.store_timeout_ms {
            Some(0) => Err(SettingsError::ZeroStoreTimeout),
            Some(ms) => Ok(Duration::from_millis(ms)),
            None => Ok(DEFAULT_STORE_TIMEOUT),
        }
    }
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) calendar: LocalCalendar,
    pub(crate) store_timeout: Duration,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    /// Construct a configuration with the UTC calendar and default deadline.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            calendar: LocalCalendar::utc(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
            db_pool: None,
        }
    }

    /// Build a configuration from loaded settings, without a pool.
    pub fn from_settings(settings: &ServerSettings) -> Result<Self, SettingsError> {
        Ok(Self::new(settings.bind_addr()?)
            .with_calendar(settings.calendar()?)
            .with_store_timeout(settings.store_timeout()?))
    }

    #[must_use]
    pub fn with_calendar(mut self, calendar: LocalCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    #[must_use]
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Attach a database connection pool for persistence adapters.
    ///
    /// Without one the server keeps events in process memory.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for server settings parsing.

    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    use super::*;

    const VARS: [&str; 5] = [
        "SPIKE_BIND_ADDR",
        "SPIKE_DATABASE_URL",
        "SPIKE_UTC_OFFSET_MINUTES",
        "SPIKE_STORE_TIMEOUT_MS",
        "SPIKE_SKIP_MIGRATIONS",
    ];

    fn load_from_empty_args() -> ServerSettings {
        ServerSettings::load_from_iter([OsString::from("sugar-spike")])
            .expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("bind addr"),
            DEFAULT_BIND_ADDR.parse::<SocketAddr>().expect("socket addr")
        );
        assert!(settings.database_url.is_none());
        assert!(!settings.run_migrations());
        assert_eq!(settings.calendar().expect("calendar"), LocalCalendar::utc());
        assert_eq!(settings.store_timeout().expect("timeout"), DEFAULT_STORE_TIMEOUT);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("SPIKE_BIND_ADDR", Some("127.0.0.1:9090".to_owned())),
            ("SPIKE_DATABASE_URL", Some("postgres://localhost/spike".to_owned())),
            ("SPIKE_UTC_OFFSET_MINUTES", Some("-300".to_owned())),
            ("SPIKE_STORE_TIMEOUT_MS", Some("2500".to_owned())),
            ("SPIKE_SKIP_MIGRATIONS", None),
        ]);

        let settings = load_from_empty_args();
        let config = ServerConfig::from_settings(&settings).expect("config");
        assert_eq!(config.bind_addr.port(), 9090);
        assert_eq!(config.store_timeout, Duration::from_millis(2500));
        assert_eq!(
            config.calendar,
            LocalCalendar::from_offset_minutes(-300).expect("offset")
        );
        assert_eq!(settings.database_url.as_deref(), Some("postgres://localhost/spike"));
        assert!(settings.run_migrations());
    }

    #[rstest]
    fn a_database_url_alone_enables_migrations() {
        let _guard = lock_env(VARS.map(|var| {
            let value =
                (var == "SPIKE_DATABASE_URL").then(|| "postgres://localhost/spike".to_owned());
            (var, value)
        }));

        let settings = load_from_empty_args();
        assert!(!settings.skip_migrations);
        assert!(settings.run_migrations());
    }

    #[rstest]
    fn migrations_can_be_disabled_with_a_database() {
        let _guard = lock_env(VARS.map(|var| {
            let value = match var {
                "SPIKE_DATABASE_URL" => Some("postgres://localhost/spike".to_owned()),
                "SPIKE_SKIP_MIGRATIONS" => Some("true".to_owned()),
                _ => None,
            };
            (var, value)
        }));

        let settings = load_from_empty_args();
        assert!(!settings.run_migrations());
    }

    #[rstest]
    #[case::bind("SPIKE_BIND_ADDR", "not-an-address")]
    #[case::offset("SPIKE_UTC_OFFSET_MINUTES", "1500")]
    #[case::timeout("SPIKE_STORE_TIMEOUT_MS", "0")]
    fn invalid_values_are_rejected(#[case] name: &str, #[case] value: &str) {
        let _guard = lock_env(VARS.map(|var| {
            let value = (var == name).then(|| value.to_owned());
            (var, value)
        }));

        let settings = load_from_empty_args();
        assert!(ServerConfig::from_settings(&settings).is_err());
    }
}
