use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

use directories::ProjectDirs;
use thiserror::Error;

pub const PROJECT_IDENTIFIER: &str = "fyi.angelo.hydrate-sync";

pub const DATA_DIR_VAR: &str = "HYDRATE_DATA_DIR";
pub const STORAGE_TIMEOUT_VAR: &str = "HYDRATE_STORAGE_TIMEOUT_MS";
pub const PLATFORM_VAR: &str = "HYDRATE_PLATFORM";

const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(5);

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("fyi", "angelo", "hydrate-sync")
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to locate a home directory for the data files. Set HYDRATE_DATA_DIR.")]
    NoProjectDir,

    #[error("Invalid value {value:?} for {var}")]
    InvalidValue { var: &'static str, value: String },
}

/// Target the app runs on. Decides which reminder scheduler is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// No local notifications; reminder calls are no-ops
    Web,
    Mobile,
    Desktop,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_arch = "wasm32") {
            Platform::Web
        } else if cfg!(any(target_os = "android", target_os = "ios")) {
            Platform::Mobile
        } else {
            Platform::Desktop
        }
    }
}

impl FromStr for Platform {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "web" => Ok(Platform::Web),
            "mobile" | "android" | "ios" => Ok(Platform::Mobile),
            "desktop" => Ok(Platform::Desktop),
            _ => Err(()),
        }
    }
}

/// Where a configuration value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Default,
    Environment,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory the JSON records are written to
    pub data_dir: ConfigValue<PathBuf>,
    /// Directory for rolling log files
    pub log_dir: PathBuf,
    /// Upper bound on a single storage read or write
    pub storage_timeout: ConfigValue<Duration>,
    pub platform: ConfigValue<Platform>,
}

impl AppConfig {
    /// Load configuration with priority: env vars > defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`AppConfig::load`] but reads variables through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let dirs = project_dirs();

        let data_dir = match lookup(DATA_DIR_VAR) {
            Some(dir) => ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment),
            None => ConfigValue::new(
                dirs.as_ref()
                    .ok_or(ConfigError::NoProjectDir)?
                    .data_dir()
                    .to_path_buf(),
                ConfigSource::Default,
            ),
        };

        let log_dir = match &dirs {
            Some(dirs) if data_dir.source == ConfigSource::Default => {
                dirs.data_local_dir().join("logs")
            }
            _ => data_dir.value.join("logs"),
        };

        let storage_timeout = match lookup(STORAGE_TIMEOUT_VAR) {
            Some(raw) => {
                let millis = raw
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|ms| *ms > 0)
                    .ok_or_else(|| ConfigError::InvalidValue {
                        var: STORAGE_TIMEOUT_VAR,
                        value: raw.clone(),
                    })?;
                ConfigValue::new(Duration::from_millis(millis), ConfigSource::Environment)
            }
            None => ConfigValue::new(DEFAULT_STORAGE_TIMEOUT, ConfigSource::Default),
        };

        let platform = match lookup(PLATFORM_VAR) {
            Some(raw) => {
                let platform =
                    raw.parse::<Platform>()
                        .map_err(|()| ConfigError::InvalidValue {
                            var: PLATFORM_VAR,
                            value: raw.clone(),
                        })?;
                ConfigValue::new(platform, ConfigSource::Environment)
            }
            None => ConfigValue::new(Platform::current(), ConfigSource::Default),
        };

        Ok(Self {
            data_dir,
            log_dir,
            storage_timeout,
            platform,
        })
    }
}
