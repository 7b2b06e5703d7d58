// common/src/config.rs
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use config::{Config as ConfigFile, File, Environment};

/// Central configuration for the relay service
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server_addr: String,
    pub upstream: UpstreamConfig,
    pub session: SessionConfig,
    pub cookie_policy: CookiePolicy,
    pub static_files: StaticFilesConfig,
    pub cors: CorsConfig,
}

/// Where the n8n instance lives and how long we wait on it
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    /// Key sent as `X-N8N-API-KEY` to the public user API. Never logged.
    pub api_key: Option<String>,
    pub login_timeout_ms: u64,
    pub session_timeout_ms: u64,
    pub admin_timeout_ms: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the upstream auth cookie replayed by the session probe
    pub cookie_name: String,
}

/// Attributes imposed on every cookie relayed from upstream.
///
/// The defaults let an iframe on plain-HTTP localhost carry the session.
/// Production deployments should turn `http_only` and `secure` back on.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CookiePolicy {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSitePolicy,
    pub default_path: String,
    pub default_max_age_ms: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSitePolicy {
    #[serde(alias = "lax", alias = "LAX")]
    Lax,
    #[serde(alias = "strict", alias = "STRICT")]
    Strict,
    #[serde(alias = "none", alias = "NONE")]
    None,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    pub path: String,
    pub index: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allow_origin: String,
}

// 7 days
pub const DEFAULT_COOKIE_MAX_AGE_MS: i64 = 7 * 24 * 60 * 60 * 1000;

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:3000".to_string(),
            upstream: UpstreamConfig::default(),
            session: SessionConfig::default(),
            cookie_policy: CookiePolicy::default(),
            static_files: StaticFilesConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5678".to_string(),
            api_key: None,
            login_timeout_ms: 10_000,
            session_timeout_ms: 5_000,
            admin_timeout_ms: 10_000,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "n8n-auth".to_string(),
        }
    }
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self {
            http_only: false,
            secure: false,
            same_site: SameSitePolicy::Lax,
            default_path: "/".to_string(),
            default_max_age_ms: DEFAULT_COOKIE_MAX_AGE_MS,
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            path: "./static".to_string(),
            index: "index.html".to_string(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_origin: "*".to_string(),
        }
    }
}

impl UpstreamConfig {
    /// Base URL without a trailing slash, ready for path concatenation
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        // Get the run mode, defaulting to "development"
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        // Locate the config directory
        let config_dir = env::var("CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                // Check if we're in the project root or a subcrate
                let mut path = PathBuf::from("./config");
                if !path.exists() {
                    path = PathBuf::from("../config");
                }
                path
            });

        tracing::info!("Loading configuration from {}", config_dir.display());
        tracing::info!("Using run mode: {}", run_mode);

        Self::load_from(&config_dir, &run_mode)
    }

    /// Layer `default.toml`, `<run_mode>.toml`, `local.toml` and `RELAY__*` variables
    pub fn load_from(config_dir: &Path, run_mode: &str) -> Result<Self, config::ConfigError> {
        ConfigFile::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", run_mode))).required(false))
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(Environment::with_prefix("RELAY").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Load from files, falling back to flat environment variables
    pub fn from_env() -> Self {
        match Self::load() {
            Ok(config) => {
                tracing::info!("Configuration loaded from files and environment");
                config
            },
            Err(e) => {
                tracing::warn!("Failed to load configuration from files: {}", e);
                tracing::info!("Falling back to environment variables only");
                Self::from_flat_env()
            }
        }
    }

    fn from_flat_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = env::var("RELAY_SERVER_ADDR") {
            config.server_addr = addr;
        }
        if let Ok(url) = env::var("N8N_BASE_URL") {
            config.upstream.base_url = url;
        }
        config.upstream.api_key = env::var("N8N_API_KEY").ok().filter(|k| !k.is_empty());
        if let Ok(name) = env::var("SESSION_COOKIE_NAME") {
            config.session.cookie_name = name;
        }
        if let Ok(path) = env::var("STATIC_FILES_PATH") {
            config.static_files.path = path;
        }

        config
    }
}
