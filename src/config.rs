/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, GOOGLE_CLOUD_PROJECT, metadata / JWKS の URL など)
 * - 設定値のバリデーション (不正なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_METADATA_PROJECT_ID_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/project/project-id";
pub const DEFAULT_METADATA_TIMEOUT_MS: u64 = 500;
pub const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Output format of the tracing subscriber.
///
/// Cloud Logging parses one JSON object per line, so production defaults to `Json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn from_env(app_env: AppEnv) -> Result<Self, ConfigError> {
        match std::env::var("LOG_FORMAT") {
            Ok(v) => match v.trim().to_ascii_lowercase().as_str() {
                "json" => Ok(Self::Json),
                "text" | "pretty" => Ok(Self::Text),
                _ => Err(ConfigError::Invalid("LOG_FORMAT")),
            },
            Err(_) if app_env.is_production() => Ok(Self::Json),
            Err(_) => Ok(Self::Text),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Where to look for the project id before falling back to the metadata server.
#[derive(Debug, Clone)]
pub struct MetadataConfig {
    pub project_id_url: String,
    pub timeout: Duration,
}

/// Inputs to Application Default Credentials discovery.
#[derive(Debug, Clone, Default)]
pub struct CredentialsConfig {
    // GOOGLE_APPLICATION_CREDENTIALS
    pub explicit_path: Option<PathBuf>,
    // $CLOUDSDK_CONFIG or $HOME/.config/gcloud
    pub gcloud_config_dir: Option<PathBuf>,
    // K_SERVICE / GCE_METADATA_HOST present
    pub on_platform: bool,
}

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub jwks_url: String,
    pub http_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub log_format: LogFormat,

    // GOOGLE_CLOUD_PROJECT (空文字は未設定扱い)
    pub project_id: Option<String>,
    pub metadata: MetadataConfig,

    pub credentials: CredentialsConfig,
    pub identity: IdentityConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = match std::env::var("PORT") {
            Ok(s) => s.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            Err(_) => DEFAULT_PORT,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();
        let log_format = LogFormat::from_env(app_env)?;

        let project_id = present_var("GOOGLE_CLOUD_PROJECT");

        let metadata_timeout_ms = match std::env::var("METADATA_TIMEOUT_MS") {
            Ok(s) => s
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or(ConfigError::Invalid("METADATA_TIMEOUT_MS"))?,
            Err(_) => DEFAULT_METADATA_TIMEOUT_MS,
        };

        let metadata = MetadataConfig {
            project_id_url: non_empty_var("METADATA_PROJECT_ID_URL")
                .unwrap_or_else(|| DEFAULT_METADATA_PROJECT_ID_URL.to_string()),
            timeout: Duration::from_millis(metadata_timeout_ms),
        };
        url::Url::parse(&metadata.project_id_url)
            .map_err(|_| ConfigError::Invalid("METADATA_PROJECT_ID_URL"))?;

        let gcloud_config_dir = non_empty_var("CLOUDSDK_CONFIG")
            .map(PathBuf::from)
            .or_else(|| non_empty_var("HOME").map(|h| PathBuf::from(h).join(".config/gcloud")));

        let credentials = CredentialsConfig {
            explicit_path: non_empty_var("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from),
            gcloud_config_dir,
            on_platform: non_empty_var("K_SERVICE").is_some()
                || non_empty_var("GCE_METADATA_HOST").is_some(),
        };

        let identity = IdentityConfig {
            jwks_url: non_empty_var("IDENTITY_JWKS_URL")
                .unwrap_or_else(|| DEFAULT_JWKS_URL.to_string()),
            http_timeout: Duration::from_secs(10),
        };
        url::Url::parse(&identity.jwks_url)
            .map_err(|_| ConfigError::Invalid("IDENTITY_JWKS_URL"))?;

        Ok(Self {
            addr,
            app_env,
            log_format,
            project_id,
            metadata,
            credentials,
            identity,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

// 空文字だけが未設定扱い (空白のみの値はそのまま使う)
fn present_var(key: &str) -> Option<String> {
    non_empty(std::env::var(key).ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
