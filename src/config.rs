use clap::{Args, Parser, ValueEnum};

#[derive(Clone, Debug, Default, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub provider: ProviderConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "PUSH_GATEWAY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PUSH_GATEWAY_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Port for the management server (liveness)
    #[arg(long, env = "PUSH_GATEWAY_MGMT_PORT", default_value_t = 9090)]
    pub mgmt_port: u16,

    /// Path prefix the API routes are mounted under (e.g. /.netlify/functions/push)
    #[arg(long, env = "PUSH_GATEWAY_BASE_PATH", default_value = "")]
    pub base_path: String,

    /// Upper bound on the handling time of a single inbound request
    #[arg(long, env = "PUSH_GATEWAY_REQUEST_TIMEOUT_SECS", default_value_t = 60)]
    pub request_timeout_secs: u64,

    /// How long to wait for in-flight requests during shutdown
    #[arg(long, env = "PUSH_GATEWAY_SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            mgmt_port: 9090,
            base_path: String::new(),
            request_timeout_secs: 60,
            shutdown_timeout_secs: 5,
        }
    }
}

impl ServerConfig {
    /// Normalized mount prefix: empty, or `/segment[/segment...]` without a trailing slash.
    #[must_use]
    pub fn normalized_base_path(&self) -> String {
        let trimmed = self.base_path.trim().trim_matches('/');
        if trimmed.is_empty() { String::new() } else { format!("/{trimmed}") }
    }
}

#[derive(Clone, Debug, Args)]
pub struct ProviderConfig {
    /// Base URL of the Expo push service
    #[arg(long = "expo-base-url", env = "PUSH_GATEWAY_EXPO_BASE_URL", default_value = "https://exp.host")]
    pub base_url: String,

    /// Expo access token, required only when enhanced push security is enabled
    #[arg(long = "expo-access-token", env = "PUSH_GATEWAY_EXPO_ACCESS_TOKEN")]
    pub access_token: Option<String>,

    /// Timeout for a single call to the push provider
    #[arg(long, env = "PUSH_GATEWAY_PROVIDER_TIMEOUT_SECS", default_value_t = 30)]
    pub provider_timeout_secs: u64,

    /// Timeout for establishing a connection to the push provider
    #[arg(long, env = "PUSH_GATEWAY_PROVIDER_CONNECT_TIMEOUT_SECS", default_value_t = 10)]
    pub provider_connect_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://exp.host".to_string(),
            access_token: None,
            provider_timeout_secs: 30,
            provider_connect_timeout_secs: 10,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Default, Args)]
pub struct TelemetryConfig {
    /// OTLP collector endpoint (e.g. http://localhost:4318); export is disabled when unset
    #[arg(long, env = "PUSH_GATEWAY_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Log output format
    #[arg(long, env = "PUSH_GATEWAY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}
