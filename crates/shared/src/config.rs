//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtConfig,
    /// Email configuration.
    #[serde(default)]
    pub email: EmailConfig,
    /// Exchange-rate provider configuration.
    #[serde(default)]
    pub rates: RatesConfig,
    /// Aggregation defaults and result caching.
    #[serde(default)]
    pub aggregation: AggregationConfig,
    /// Renewal notification batches.
    #[serde(default)]
    pub notification: NotificationConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
///
/// Tokens are issued by the identity provider; this service only validates them.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Shared secret the identity provider signs tokens with.
    pub secret: String,
    /// Allowed clock skew in seconds when checking `exp`.
    #[serde(default = "default_leeway")]
    pub leeway_secs: u64,
}

fn default_leeway() -> u64 {
    30
}

/// SMTP configuration for outgoing notification email.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// SMTP relay host.
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    /// SMTP relay port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub smtp_username: String,
    /// SMTP password.
    #[serde(default)]
    pub smtp_password: String,
    /// Sender address.
    #[serde(default = "default_from_email")]
    pub from_email: String,
    /// Sender display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Public URL of the web application, used for links in emails.
    #[serde(default = "default_app_url")]
    pub app_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: default_from_email(),
            from_name: default_from_name(),
            app_url: default_app_url(),
        }
    }
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    1025
}

fn default_from_email() -> String {
    "noreply@subtrack.local".to_string()
}

fn default_from_name() -> String {
    "SubTrack".to_string()
}

fn default_app_url() -> String {
    "http://localhost:3000".to_string()
}

/// Exchange-rate provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RatesConfig {
    /// Provider base URL; `/latest?base=...` is appended.
    #[serde(default = "default_rates_url")]
    pub api_url: String,
    /// Optional provider API key, sent as a bearer token.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base currency used for fetching and for two-hop conversion.
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
    /// Request timeout in seconds.
    #[serde(default = "default_rates_timeout")]
    pub timeout_secs: u64,
    /// Maximum fetch attempts.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay between attempts in milliseconds (doubled per attempt).
    #[serde(default = "default_rates_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            api_url: default_rates_url(),
            api_key: None,
            base_currency: default_base_currency(),
            timeout_secs: default_rates_timeout(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_rates_delay_ms(),
        }
    }
}

fn default_rates_url() -> String {
    "https://api.exchangerate.host".to_string()
}

fn default_base_currency() -> String {
    "CNY".to_string()
}

fn default_rates_timeout() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_rates_delay_ms() -> u64 {
    1000
}

/// Aggregation defaults and result caching.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregationConfig {
    /// Display currency when a request does not name one.
    #[serde(default = "default_base_currency")]
    pub default_currency: String,
    /// Default upcoming-renewal window in days.
    #[serde(default = "default_window_days")]
    pub upcoming_days: u32,
    /// Default recently-paid window in days.
    #[serde(default = "default_window_days")]
    pub recent_days: u32,
    /// Result cache time-to-live in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    /// Result cache capacity (entries).
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            default_currency: default_base_currency(),
            upcoming_days: default_window_days(),
            recent_days: default_window_days(),
            cache_ttl_secs: default_cache_ttl(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

fn default_window_days() -> u32 {
    7
}

fn default_cache_ttl() -> u64 {
    30
}

fn default_cache_capacity() -> u64 {
    10_000
}

/// Renewal notification batch configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// How many days ahead of the next billing date reminders go out.
    #[serde(default = "default_reminder_days")]
    pub reminder_days: u32,
    /// Running batches older than this are considered crashed and failed.
    #[serde(default = "default_stale_minutes")]
    pub stale_batch_minutes: i64,
    /// Maximum send attempts per digest.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay between send attempts in milliseconds.
    #[serde(default = "default_send_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            reminder_days: default_reminder_days(),
            stale_batch_minutes: default_stale_minutes(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_send_delay_ms(),
        }
    }
}

fn default_reminder_days() -> u32 {
    3
}

fn default_stale_minutes() -> i64 {
    30
}

fn default_send_delay_ms() -> u64 {
    500
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones winning: `config/default`, `config/{RUN_MODE}`,
    /// then `SUBTRACK__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("SUBTRACK")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_env_with_defaults() {
        temp_env::with_vars(
            [
                ("SUBTRACK__DATABASE__URL", Some("postgres://localhost/subtrack")),
                ("SUBTRACK__JWT__SECRET", Some("test-secret")),
                ("SUBTRACK__SERVER__PORT", Some("9090")),
                ("RUN_MODE", Some("test")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/subtrack");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.jwt.secret, "test-secret");
                assert_eq!(config.jwt.leeway_secs, 30);
                assert_eq!(config.server.port, 9090);
                assert_eq!(config.server.host, "0.0.0.0");
                assert_eq!(config.rates.base_currency, "CNY");
                assert_eq!(config.aggregation.upcoming_days, 7);
                assert_eq!(config.aggregation.cache_ttl_secs, 30);
                assert_eq!(config.notification.reminder_days, 3);
            },
        );
    }

    #[test]
    fn test_load_requires_database_url() {
        temp_env::with_vars(
            [
                ("SUBTRACK__DATABASE__URL", None::<&str>),
                ("SUBTRACK__JWT__SECRET", Some("test-secret")),
                ("RUN_MODE", Some("test")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }

    #[test]
    fn test_email_config_default() {
        let config = EmailConfig::default();
        assert_eq!(config.smtp_host, "localhost");
        assert_eq!(config.smtp_port, 1025);
        assert_eq!(config.from_name, "SubTrack");
    }
}
