use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::moderation::pagination::DEFAULT_MAX_VISIBLE;
use crate::moderation::profiles::ResubmissionPolicy;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub moderation: ModerationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            moderation: ModerationConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Paging and review policy for the admin console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModerationConfig {
    /// Page size used when a listing request names none.
    pub page_size: u32,
    /// Requests asking for more rows are capped here.
    pub max_page_size: u32,
    /// Width of the page bar sent with every listing.
    pub max_visible_pages: u32,
    pub resubmission: ResubmissionPolicy,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            max_page_size: 100,
            max_visible_pages: DEFAULT_MAX_VISIBLE,
            resubmission: ResubmissionPolicy::Overwrite,
        }
    }
}

impl ModerationConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let page_size = positive_var("APP_MODERATION_PAGE_SIZE", defaults.page_size)?;
        let max_page_size = positive_var("APP_MODERATION_MAX_PAGE_SIZE", defaults.max_page_size)?;
        let max_visible_pages =
            positive_var("APP_PAGINATION_MAX_VISIBLE", defaults.max_visible_pages)?;

        let resubmission = match env::var("APP_PROFILE_RESUBMISSION") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidResubmissionPolicy(raw))?,
            Err(_) => defaults.resubmission,
        };

        Ok(Self {
            page_size: page_size.min(max_page_size),
            max_page_size,
            max_visible_pages,
            resubmission,
        })
    }

    /// Page size to use for a request, falling back to `fallback` and capped at the maximum.
    pub fn page_size_for(&self, requested: Option<u32>, fallback: u32) -> u32 {
        requested
            .filter(|size| *size > 0)
            .unwrap_or(fallback)
            .min(self.max_page_size)
    }
}

fn positive_var(name: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<u32>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ConfigError::InvalidNumber { name, value: raw }),
        },
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { name: &'static str, value: String },
    InvalidResubmissionPolicy(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { name, value } => {
                write!(f, "{name} must be a positive integer (got '{value}')")
            }
            ConfigError::InvalidResubmissionPolicy(value) => write!(
                f,
                "APP_PROFILE_RESUBMISSION must be 'overwrite' or 'reject' (got '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("APP_MODERATION_PAGE_SIZE");
        env::remove_var("APP_MODERATION_MAX_PAGE_SIZE");
        env::remove_var("APP_PAGINATION_MAX_VISIBLE");
        env::remove_var("APP_PROFILE_RESUBMISSION");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.moderation, ModerationConfig::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn moderation_settings_come_from_env() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_MODERATION_PAGE_SIZE", "25");
        env::set_var("APP_MODERATION_MAX_PAGE_SIZE", "20");
        env::set_var("APP_PAGINATION_MAX_VISIBLE", "7");
        env::set_var("APP_PROFILE_RESUBMISSION", "reject");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.moderation.page_size, 20);
        assert_eq!(config.moderation.max_visible_pages, 7);
        assert_eq!(
            config.moderation.resubmission,
            ResubmissionPolicy::RejectWhilePending
        );
        reset_env();
    }

    #[test]
    fn rejects_zero_page_size() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_MODERATION_PAGE_SIZE", "0");
        let err = AppConfig::load().expect_err("zero is refused");
        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                name: "APP_MODERATION_PAGE_SIZE",
                ..
            }
        ));
        reset_env();
    }

    #[test]
    fn page_size_is_capped() {
        let config = ModerationConfig::default();
        assert_eq!(config.page_size_for(None, 5), 5);
        assert_eq!(config.page_size_for(Some(0), 10), 10);
        assert_eq!(config.page_size_for(Some(500), 10), 100);
    }
}
