use crate::infra::{DirSource, HttpSource, SnapshotSource};
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_SERVER: &str = "http://localhost:8000";
pub const DEFAULT_LISTING_PATH: &str = "/Records";
pub const DEFAULT_RECORDS_PATH: &str = "/Records";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid server URL {value:?}: {message}")]
    InvalidUrl { value: String, message: String },

    #[error("invalid timeout {0:?}: expected a positive number of seconds")]
    InvalidTimeout(String),
}

#[derive(Debug, Error)]
pub enum ResolveStateDirError {
    #[error("home directory not found")]
    HomeDirNotFound,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConfigOverrides {
    pub server: Option<String>,
    pub listing_path: Option<String>,
    pub records_path: Option<String>,
    pub records_dir: Option<PathBuf>,
    pub timeout_secs: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SourceConfig {
    Http { listing_url: Url, records_url: Url },
    Directory(PathBuf),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub fetch_timeout: Duration,
}

impl AppConfig {
    pub fn from_env(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        Self::resolve(overrides, |key| std::env::var(key).ok())
    }

    pub fn resolve(
        overrides: ConfigOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let pick = |flag: Option<String>, key: &str| {
            flag.or_else(|| env(key))
                .filter(|value| !value.trim().is_empty())
        };

        let timeout_raw = pick(overrides.timeout_secs, "ASSETBOX_TIMEOUT_SECS");
        let fetch_timeout = match timeout_raw {
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            Some(raw) => parse_timeout(&raw)?,
        };

        let records_dir = overrides
            .records_dir
            .or_else(|| pick(None, "ASSETBOX_RECORDS_DIR").map(PathBuf::from));
        if let Some(dir) = records_dir {
            return Ok(Self {
                source: SourceConfig::Directory(dir),
                fetch_timeout,
            });
        }

        let server = pick(overrides.server, "ASSETBOX_SERVER")
            .unwrap_or_else(|| DEFAULT_SERVER.to_string());
        let listing_path = pick(overrides.listing_path, "ASSETBOX_LISTING_PATH")
            .unwrap_or_else(|| DEFAULT_LISTING_PATH.to_string());
        let records_path = pick(overrides.records_path, "ASSETBOX_RECORDS_PATH")
            .unwrap_or_else(|| DEFAULT_RECORDS_PATH.to_string());

        let base = parse_url(&server)?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                value: server,
                message: "expected an http:// or https:// URL".to_string(),
            });
        }
        let listing_url = join_url(&base, &listing_path)?;
        let records_url = join_url(&base, &records_path)?;

        Ok(Self {
            source: SourceConfig::Http {
                listing_url,
                records_url,
            },
            fetch_timeout,
        })
    }

    pub fn build_source(&self) -> Box<dyn SnapshotSource + Send> {
        match &self.source {
            SourceConfig::Http {
                listing_url,
                records_url,
            } => Box::new(HttpSource::new(
                listing_url.clone(),
                records_url.clone(),
                self.fetch_timeout,
            )),
            SourceConfig::Directory(dir) => Box::new(DirSource::new(dir.clone())),
        }
    }

    pub fn source_label(&self) -> String {
        match &self.source {
            SourceConfig::Http { listing_url, .. } => listing_url.to_string(),
            SourceConfig::Directory(dir) => dir.display().to_string(),
        }
    }
}

pub fn resolve_assetbox_state_dir() -> Result<PathBuf, ResolveStateDirError> {
    state_dir_from(std::env::var_os("ASSETBOX_STATE_DIR"), dirs::home_dir())
}

fn state_dir_from(
    override_dir: Option<OsString>,
    home: Option<PathBuf>,
) -> Result<PathBuf, ResolveStateDirError> {
    if let Some(override_dir) = override_dir.filter(|dir| !dir.is_empty()) {
        return Ok(PathBuf::from(override_dir));
    }

    let Some(home) = home else {
        return Err(ResolveStateDirError::HomeDirNotFound);
    };
    Ok(home.join(".assetbox"))
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout(raw.to_string())),
    }
}

fn parse_url(value: &str) -> Result<Url, ConfigError> {
    Url::parse(value.trim()).map_err(|error| ConfigError::InvalidUrl {
        value: value.to_string(),
        message: error.to_string(),
    })
}

fn join_url(base: &Url, path: &str) -> Result<Url, ConfigError> {
    base.join(path.trim()).map_err(|error| ConfigError::InvalidUrl {
        value: format!("{base} + {path}"),
        message: error.to_string(),
    })
}
