use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "dailink.toml",
    "config/dailink.toml",
    "../dailink.toml",
    "../config/dailink.toml",
];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub unipile: UnipileConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub hsc: HscConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 7080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://dailink.db".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "AuthConfig::default_session_ttl")]
    pub session_ttl_seconds: u64,
    #[serde(default = "AuthConfig::default_allow_registration")]
    pub allow_registration: bool,
    #[serde(default = "AuthConfig::default_min_password_length")]
    pub min_password_length: usize,
}

impl AuthConfig {
    const fn default_session_ttl() -> u64 {
        86_400
    }

    const fn default_allow_registration() -> bool {
        true
    }

    const fn default_min_password_length() -> usize {
        8
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_seconds: Self::default_session_ttl(),
            allow_registration: Self::default_allow_registration(),
            min_password_length: Self::default_min_password_length(),
        }
    }
}

/// Connection settings for the Unipile LinkedIn automation API.
///
/// ```
/// use dailink_config::UnipileConfig;
///
/// let unipile = UnipileConfig::default();
/// assert_eq!(unipile.base_url, "https://api1.unipile.com:13111/api/v1");
/// assert_eq!(unipile.request_timeout_seconds, 30);
/// assert!(unipile.api_key.is_none());
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct UnipileConfig {
    #[serde(default = "UnipileConfig::default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "UnipileConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl UnipileConfig {
    fn default_base_url() -> String {
        "https://api1.unipile.com:13111/api/v1".to_string()
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    /// API key from the configuration, falling back to `UNIPILE_API_KEY`.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var("UNIPILE_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
    }
}

impl Default for UnipileConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            api_key: None,
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

// Keeps the key out of the debug dump emitted by `load`.
impl std::fmt::Debug for UnipileConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnipileConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "AssistantConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "AssistantConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "AssistantConfig::default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default = "AssistantConfig::default_max_poll_attempts")]
    pub max_poll_attempts: u32,
}

impl AssistantConfig {
    fn default_base_url() -> String {
        "https://api.openai.com/v1".to_string()
    }

    const fn default_request_timeout() -> u64 {
        60
    }

    const fn default_poll_interval() -> u64 {
        1_000
    }

    const fn default_max_poll_attempts() -> u32 {
        60
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            request_timeout_seconds: Self::default_request_timeout(),
            poll_interval_ms: Self::default_poll_interval(),
            max_poll_attempts: Self::default_max_poll_attempts(),
        }
    }
}

/// Pacing for HSC runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HscConfig {
    #[serde(default = "HscConfig::default_page_delay")]
    pub page_delay_ms: u64,
    #[serde(default = "HscConfig::default_page_size")]
    pub page_size: u32,
    #[serde(default = "HscConfig::default_max_pages")]
    pub max_pages: u32,
}

impl HscConfig {
    const fn default_page_delay() -> u64 {
        2_000
    }

    const fn default_page_size() -> u32 {
        25
    }

    const fn default_max_pages() -> u32 {
        40
    }
}

impl Default for HscConfig {
    fn default() -> Self {
        Self {
            page_delay_ms: Self::default_page_delay(),
            page_size: Self::default_page_size(),
            max_pages: Self::default_max_pages(),
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use dailink_config::load;
///
/// std::env::remove_var("DAILINK_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let builder = config::Config::builder()
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default("database.url", defaults.database.url.clone())?
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )?
        .set_default("unipile.base_url", defaults.unipile.base_url.clone())?
        .set_default("assistant.base_url", defaults.assistant.base_url.clone())?;

    let mut builder = builder;
    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("DAILINK_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via DAILINK_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(config::Environment::with_prefix("DAILINK").separator("__"));

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    if config.auth.session_ttl_seconds > i64::MAX as u64 {
        config.auth.session_ttl_seconds = i64::MAX as u64;
    }
    if config.hsc.max_pages == 0 {
        config.hsc.max_pages = 1;
    }

    debug!(?config, "loaded backend configuration");
    Ok(config)
}
