//! Connection configuration for talking to proctord.
//!
//! Settings are looked up in the environment first and then in
//! `<config dir>/proctor.yaml`. The environment is reached through
//! [`EnvSource`] so resolution can be driven from a plain map in tests.
//!
//! ```text
//! env var  >  proctor.yaml  >  default (CONNECTION_TIMEOUT_SECS only, 10s)
//! ```
//!
//! Blank values count as unset at every level. `CONNECTION_TIMEOUT_SECS: 0`
//! means no timeout.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::{debug, trace};

pub const PROCTOR_HOST: &str = "PROCTOR_HOST";
pub const EMAIL_ID: &str = "EMAIL_ID";
pub const ACCESS_TOKEN: &str = "ACCESS_TOKEN";
pub const CONNECTION_TIMEOUT_SECS: &str = "CONNECTION_TIMEOUT_SECS";

/// Selects the run mode; `test` points the config directory at `/tmp`.
pub const ENVIRONMENT: &str = "ENVIRONMENT";

pub const CONFIG_FILE_NAME: &str = "proctor.yaml";
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

const TEST_ENVIRONMENT: &str = "test";
const TEST_CONFIG_DIR: &str = "/tmp";
const CONFIG_DIR_NAME: &str = ".proctor";

/// Read-only key/value lookup standing in for the process environment.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Fully resolved connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub email: String,
    pub access_token: String,
    pub connection_timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("email", &self.email)
            .field("access_token", &"<redacted>")
            .field("connection_timeout", &self.connection_timeout)
            .finish()
    }
}

/// Why configuration could not be resolved.
#[derive(Debug, Error)]
pub enum ConfigCause {
    #[error("config file {} does not exist", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to read config file {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("mandatory config {key} is missing")]
    MissingMandatory { key: &'static str },
}

/// A resolution failure: the root cause plus what the user should do about it.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ConfigError {
    #[source]
    cause: ConfigCause,
    message: String,
}

impl ConfigError {
    fn new(cause: ConfigCause, message: impl Into<String>) -> Self {
        Self {
            cause,
            message: message.into(),
        }
    }

    pub fn root_cause(&self) -> &ConfigCause {
        &self.cause
    }

    /// Remediation text for the user.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// On-disk shape of `proctor.yaml`.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(rename = "PROCTOR_HOST", default, deserialize_with = "scalar")]
    host: Option<String>,
    #[serde(rename = "EMAIL_ID", default, deserialize_with = "scalar")]
    email: Option<String>,
    #[serde(rename = "ACCESS_TOKEN", default, deserialize_with = "scalar")]
    access_token: Option<String>,
    #[serde(rename = "CONNECTION_TIMEOUT_SECS", default, deserialize_with = "scalar")]
    connection_timeout_secs: Option<String>,
}

impl ConfigFile {
    fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            PROCTOR_HOST => &self.host,
            EMAIL_ID => &self.email,
            ACCESS_TOKEN => &self.access_token,
            CONNECTION_TIMEOUT_SECS => &self.connection_timeout_secs,
            _ => return None,
        };
        value.as_deref()
    }
}

/// Accept any YAML scalar and keep its textual form; `30` and `"30"` are the
/// same timeout.
fn scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<serde_yaml::Value>::deserialize(deserializer)? {
        None | Some(serde_yaml::Value::Null) => Ok(None),
        Some(serde_yaml::Value::String(s)) => Ok(Some(s)),
        Some(serde_yaml::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(serde_yaml::Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a scalar value, found {other:?}"
        ))),
    }
}

/// Resolves [`Config`] from an environment source and the config file.
#[derive(Debug, Clone)]
pub struct ConfigStore<E: EnvSource> {
    env: E,
    dir: Option<PathBuf>,
}

impl ConfigStore<ProcessEnv> {
    pub fn from_process_env() -> Self {
        Self::new(ProcessEnv)
    }
}

impl<E: EnvSource> ConfigStore<E> {
    pub fn new(env: E) -> Self {
        Self { env, dir: None }
    }

    /// Pin the config directory instead of deriving it from the environment.
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Directory expected to hold `proctor.yaml`.
    pub fn config_dir(&self) -> PathBuf {
        if let Some(dir) = &self.dir {
            return dir.clone();
        }
        if self.env_value(ENVIRONMENT).as_deref() == Some(TEST_ENVIRONMENT) {
            return PathBuf::from(TEST_CONFIG_DIR);
        }
        dirs::home_dir().unwrap_or_default().join(CONFIG_DIR_NAME)
    }

    pub fn config_file_path(&self) -> PathBuf {
        self.config_dir().join(CONFIG_FILE_NAME)
    }

    pub fn load_config(&self) -> Result<Config, ConfigError> {
        let keys = [PROCTOR_HOST, EMAIL_ID, ACCESS_TOKEN, CONNECTION_TIMEOUT_SECS];
        let from_env: HashMap<&str, String> = keys
            .iter()
            .filter_map(|k| self.env_value(k).map(|v| (*k, v)))
            .collect();

        let file = if from_env.len() == keys.len() {
            trace!("all settings present in environment, skipping config file");
            ConfigFile::default()
        } else {
            read_config_file(&self.config_file_path())?
        };

        let lookup = |key: &str| -> Option<String> {
            from_env.get(key).cloned().or_else(|| {
                file.get(key)
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            })
        };

        let host = lookup(PROCTOR_HOST).ok_or_else(|| missing(PROCTOR_HOST))?;
        let email = lookup(EMAIL_ID).ok_or_else(|| missing(EMAIL_ID))?;
        let access_token = lookup(ACCESS_TOKEN).ok_or_else(|| missing(ACCESS_TOKEN))?;

        let connection_timeout = lookup(CONNECTION_TIMEOUT_SECS)
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CONNECTION_TIMEOUT);

        debug!(
            host = %host,
            email = %email,
            timeout_secs = connection_timeout.as_secs(),
            "resolved proctor config"
        );

        Ok(Config {
            host,
            email,
            access_token,
            connection_timeout,
        })
    }

    fn env_value(&self, key: &str) -> Option<String> {
        self.env
            .get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::new(
                ConfigCause::FileNotFound {
                    path: path.to_path_buf(),
                },
                file_not_found_message(path),
            ));
        }
        Err(source) => {
            return Err(ConfigError::new(
                ConfigCause::Unreadable {
                    path: path.to_path_buf(),
                    source,
                },
                format!("Unable to read config file {}", path.display()),
            ));
        }
    };

    if raw.trim().is_empty() {
        return Ok(ConfigFile::default());
    }

    serde_yaml::from_str(&raw).map_err(|source| {
        ConfigError::new(
            ConfigCause::Malformed {
                path: path.to_path_buf(),
                source,
            },
            format!(
                "Config file {} is not valid YAML. Expected template:\n\n{}",
                path.display(),
                config_template()
            ),
        )
    })
}

fn config_template() -> String {
    format!("{PROCTOR_HOST}: <host>\n{EMAIL_ID}: <email>\n{ACCESS_TOKEN}: <access-token>\n")
}

fn file_not_found_message(path: &Path) -> String {
    format!(
        "Config file not found in {}\nCreate a config file with template:\n\n{}",
        path.display(),
        config_template()
    )
}

fn missing(key: &'static str) -> ConfigError {
    ConfigError::new(
        ConfigCause::MissingMandatory { key },
        format!("Mandatory config {key} is missing in Proctor Config file."),
    )
}
