use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    /// Bearer token verification for user-scoped endpoints
    #[serde(default)]
    pub jwt: JwtAuthConfig,
    /// Transactional email delivery
    #[serde(default)]
    pub email: EmailConfig,
    /// Stripe billing
    #[serde(default)]
    pub stripe: StripeConfig,
    /// Periodic rule engine runs
    #[serde(default)]
    pub notification_engine: NotificationEngineConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityConfig {
    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Adds `Strict-Transport-Security` to responses.
    #[serde(default)]
    pub hsts_enabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JwtAuthConfig {
    /// HS256 secret shared with the auth provider. Empty disables bearer auth.
    #[serde(default)]
    pub secret: String,

    /// Expected `aud` claim (e.g. `authenticated`). Empty skips the check.
    #[serde(default)]
    pub audience: String,

    /// Leeway in seconds for clock skew tolerance
    #[serde(default = "default_jwt_leeway")]
    pub leeway_secs: u64,
}

impl JwtAuthConfig {
    pub fn is_configured(&self) -> bool {
        !self.secret.is_empty()
    }
}

/// Email delivery configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// `console` (log only) or `sendgrid`
    #[serde(default = "default_email_provider")]
    pub provider: String,

    /// SendGrid API key. Empty falls back to console delivery.
    #[serde(default)]
    pub sendgrid_api_key: String,

    /// SendGrid API base URL
    #[serde(default = "default_sendgrid_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_sender_email")]
    pub sender_email: String,

    #[serde(default = "default_sender_name")]
    pub sender_name: String,

    /// Frontend URL used for links in email bodies
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,

    #[serde(default = "default_email_timeout")]
    pub timeout_secs: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            provider: default_email_provider(),
            sendgrid_api_key: String::new(),
            api_base_url: default_sendgrid_base_url(),
            sender_email: default_sender_email(),
            sender_name: default_sender_name(),
            frontend_url: default_frontend_url(),
            timeout_secs: default_email_timeout(),
        }
    }
}

/// Stripe billing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeConfig {
    /// Secret API key. Empty disables checkout and the billing portal.
    #[serde(default)]
    pub secret_key: String,

    /// Webhook signing secret (`whsec_...`). Empty disables the webhook.
    #[serde(default)]
    pub webhook_secret: String,

    #[serde(default = "default_stripe_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_stripe_api_version")]
    pub api_version: String,

    /// Redirect origin used when the request carries neither Origin nor Referer.
    #[serde(default = "default_app_origin")]
    pub default_origin: String,

    #[serde(default = "default_stripe_timeout")]
    pub timeout_secs: u64,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            webhook_secret: String::new(),
            api_base_url: default_stripe_base_url(),
            api_version: default_stripe_api_version(),
            default_origin: default_app_origin(),
            timeout_secs: default_stripe_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationEngineConfig {
    /// Minutes between scheduled runs. Zero disables the job.
    #[serde(default = "default_schedule_minutes")]
    pub schedule_minutes: u64,
}

impl Default for NotificationEngineConfig {
    fn default() -> Self {
        Self {
            schedule_minutes: default_schedule_minutes(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_shutdown_timeout() -> u64 {
    10
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    2
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_jwt_leeway() -> u64 {
    30
}
fn default_email_provider() -> String {
    "console".to_string()
}
fn default_sendgrid_base_url() -> String {
    "https://api.sendgrid.com/v3".to_string()
}
fn default_sender_email() -> String {
    "notifications@smartsaver.app".to_string()
}
fn default_sender_name() -> String {
    "SmartSaver".to_string()
}
fn default_frontend_url() -> String {
    "https://smartsaver.app".to_string()
}
fn default_email_timeout() -> u64 {
    10
}
fn default_stripe_base_url() -> String {
    "https://api.stripe.com/v1".to_string()
}
fn default_stripe_api_version() -> String {
    "2023-10-16".to_string()
}
fn default_app_origin() -> String {
    "http://localhost:5173".to_string()
}
fn default_stripe_timeout() -> u64 {
    15
}
fn default_schedule_minutes() -> u64 {
    15
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml
    /// 2. config/local.toml (optional, not in git)
    /// 3. Environment variables with SS__ prefix, e.g. `SS__DATABASE__URL`
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("SS")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("security.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Builds a configuration from an inline TOML document plus overrides,
    /// without touching the filesystem or environment.
    pub fn from_toml(toml: &str, overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "SS__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if !matches!(self.email.provider.as_str(), "console" | "sendgrid") {
            return Err(ConfigValidationError::InvalidValue(format!(
                "Unknown email provider: {}",
                self.email.provider
            )));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}
