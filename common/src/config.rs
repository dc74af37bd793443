// common/src/config.rs
use ::config::{Config as ConfigFile, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Central configuration for the coordinator and the probe binary
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub identity: IdentityConfig,
    pub session: SessionConfig,
    pub navigation: NavigationConfig,
    pub credential_store: CredentialStoreConfig,
}

/// Where and how the "whoami" call is made
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub base_url: String,
    pub whoami_path: String,
    pub timeout_secs: u64,
}

/// Session cache and retry tuning
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Fixed key the bearer credential is stored under
    pub credential_key: String,
    pub freshness_window_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

/// Views that may be shown without a signed-in user
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub sign_in_path: String,
    pub public_paths: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialStoreConfig {
    pub path: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5001".to_string(),
            whoami_path: "/api/auth/me".to_string(),
            timeout_secs: 60,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            credential_key: "token".to_string(),
            freshness_window_secs: 30,
            max_retries: 2,
            retry_delay_ms: 2000,
        }
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            sign_in_path: "/login".to_string(),
            public_paths: vec!["/".to_string(), "/login".to_string(), "/register".to_string()],
        }
    }
}

impl Default for CredentialStoreConfig {
    fn default() -> Self {
        Self {
            path: "./.auth/credentials.json".to_string(),
        }
    }
}

impl IdentityConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SessionConfig {
    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_window_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, ::config::ConfigError> {
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

        ConfigFile::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", run_mode))).required(false))
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // APP__IDENTITY__BASE_URL and friends
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Load from files, falling back to defaults plus a few flat variables
    pub fn from_env() -> Self {
        match Self::load() {
            Ok(config) => {
                tracing::info!("Configuration loaded from files and environment");
                config
            }
            Err(e) => {
                tracing::warn!("Failed to load configuration from files: {}", e);
                tracing::info!("Falling back to defaults and environment variables");

                let mut config = Self::default();
                if let Ok(base_url) = env::var("IDENTITY_BASE_URL") {
                    config.identity.base_url = base_url;
                }
                if let Ok(path) = env::var("CREDENTIAL_STORE_PATH") {
                    config.credential_store.path = path;
                }
                config
            }
        }
    }
}
