use crate::domain::AssetSnapshot;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;
use walkdir::WalkDir;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("listing from {url} is not a JSON array")]
    NotAnArray { url: String },

    #[error("failed to decode {location}: {message}")]
    Decode { location: String, message: String },

    #[error("records directory does not exist: {0}")]
    RecordsDirMissing(String),

    #[error("failed to read {path}: {source}")]
    Read { path: String, source: io::Error },

    #[error("refusing to open {0:?}: not a plain file name")]
    InvalidFilename(String),

    #[error("cannot build a file URL under {0}")]
    InvalidBaseUrl(String),
}

pub trait SnapshotSource {
    fn describe(&self) -> String;

    fn list_filenames(&self) -> Result<Vec<String>, SourceError>;

    fn fetch_snapshot(&self, filename: &str) -> Result<AssetSnapshot, SourceError>;
}

#[derive(Clone, Debug)]
pub struct HttpSource {
    agent: ureq::Agent,
    listing_url: Url,
    records_url: Url,
}

impl HttpSource {
    pub fn new(listing_url: Url, records_url: Url, timeout: Duration) -> Self {
        Self {
            agent: make_agent(timeout),
            listing_url,
            records_url,
        }
    }

    pub fn file_url(&self, filename: &str) -> Result<Url, SourceError> {
        let mut url = self.records_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| SourceError::InvalidBaseUrl(self.records_url.to_string()))?;
            segments.pop_if_empty().push(filename);
        }
        Ok(url)
    }
}

impl SnapshotSource for HttpSource {
    fn describe(&self) -> String {
        self.listing_url.to_string()
    }

    fn list_filenames(&self) -> Result<Vec<String>, SourceError> {
        let url = self.listing_url.as_str();
        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .call()
            .map_err(|error| request_error(url, error))?;

        let listing: serde_json::Value = response
            .body_mut()
            .read_json::<serde_json::Value>()
            .map_err(|error| SourceError::Decode {
                location: url.to_string(),
                message: error.to_string(),
            })?;

        let serde_json::Value::Array(entries) = listing else {
            return Err(SourceError::NotAnArray {
                url: url.to_string(),
            });
        };

        let mut names = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry {
                serde_json::Value::String(name) => names.push(name),
                other => tracing::debug!(%url, entry = %other, "skipping non-string listing entry"),
            }
        }
        Ok(names)
    }

    fn fetch_snapshot(&self, filename: &str) -> Result<AssetSnapshot, SourceError> {
        let url = self.file_url(filename)?;
        let mut response = self
            .agent
            .get(url.as_str())
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .call()
            .map_err(|error| request_error(url.as_str(), error))?;

        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|error| request_error(url.as_str(), error))?;

        serde_json::from_str(&body).map_err(|error| SourceError::Decode {
            location: url.to_string(),
            message: error.to_string(),
        })
    }
}

fn make_agent(timeout: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build();
    config.into()
}

fn request_error(url: &str, error: ureq::Error) -> SourceError {
    match error {
        ureq::Error::StatusCode(status) => SourceError::Status {
            url: url.to_string(),
            status,
        },
        other => SourceError::Request {
            url: url.to_string(),
            message: other.to_string(),
        },
    }
}

#[derive(Clone, Debug)]
pub struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl SnapshotSource for DirSource {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    fn list_filenames(&self) -> Result<Vec<String>, SourceError> {
        if !self.dir.is_dir() {
            return Err(SourceError::RecordsDirMissing(self.dir.display().to_string()));
        }

        let mut names = Vec::new();
        let walker = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();
        for entry in walker {
            let entry = entry.map_err(|error| SourceError::Read {
                path: self.dir.display().to_string(),
                source: error.into(),
            })?;
            // Follows symlinks so linked snapshot files are listed too.
            if !entry.path().is_file() {
                continue;
            }
            match entry.file_name().to_str() {
                Some(name) => names.push(name.to_string()),
                None => tracing::debug!(path = %entry.path().display(), "skipping non-UTF-8 file name"),
            }
        }
        Ok(names)
    }

    fn fetch_snapshot(&self, filename: &str) -> Result<AssetSnapshot, SourceError> {
        if !is_plain_file_name(filename) {
            return Err(SourceError::InvalidFilename(filename.to_string()));
        }

        let path = self.dir.join(filename);
        let raw = fs::read_to_string(&path).map_err(|error| SourceError::Read {
            path: path.display().to_string(),
            source: error,
        })?;
        serde_json::from_str(&raw).map_err(|error| SourceError::Decode {
            location: path.display().to_string(),
            message: error.to_string(),
        })
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && Path::new(name).file_name().is_some_and(|file| file == name)
}
