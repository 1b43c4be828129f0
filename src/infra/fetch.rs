use crate::domain::{AssetSnapshot, FileDescriptor, ResolvedSet};
use crate::infra::SnapshotSource;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FetchFailure {
    pub filename: String,
    pub message: String,
}

#[derive(Clone, Debug, Default)]
pub struct FetchOutcome {
    pub snapshots: Vec<AssetSnapshot>,
    pub failures: Vec<FetchFailure>,
}

pub fn fetch_snapshots(source: &dyn SnapshotSource, resolved: &ResolvedSet) -> FetchOutcome {
    let mut outcome = FetchOutcome::default();
    for descriptor in resolved.iter() {
        match source.fetch_snapshot(&descriptor.filename) {
            Ok(snapshot) => {
                tracing::debug!(filename = %descriptor.filename, "fetched snapshot");
                outcome.snapshots.push(fill_from_descriptor(snapshot, descriptor));
            }
            Err(error) => {
                tracing::warn!(filename = %descriptor.filename, %error, "skipping snapshot");
                outcome.failures.push(FetchFailure {
                    filename: descriptor.filename.clone(),
                    message: error.to_string(),
                });
            }
        }
    }
    outcome
}

fn fill_from_descriptor(mut snapshot: AssetSnapshot, descriptor: &FileDescriptor) -> AssetSnapshot {
    if snapshot.owner_name.trim().is_empty() {
        snapshot.owner_name = descriptor.owner_name.clone();
    }
    if snapshot.timestamp.is_none() {
        snapshot.timestamp = descriptor.iso_timestamp();
    }
    snapshot
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::domain::AssetSnapshot;
    use crate::infra::{SnapshotSource, SourceError};
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct FakeSource {
        pub listing: Option<Vec<String>>,
        pub files: HashMap<String, String>,
        pub requests: RefCell<Vec<String>>,
    }

    impl FakeSource {
        pub fn with_listing(names: &[&str]) -> Self {
            Self {
                listing: Some(names.iter().map(|name| (*name).to_string()).collect()),
                ..Self::default()
            }
        }

        pub fn with_file(mut self, name: &str, body: &str) -> Self {
            self.files.insert(name.to_string(), body.to_string());
            self
        }
    }

    impl SnapshotSource for FakeSource {
        fn describe(&self) -> String {
            "fake".to_string()
        }

        fn list_filenames(&self) -> Result<Vec<String>, SourceError> {
            self.listing.clone().ok_or(SourceError::NotAnArray {
                url: "fake://listing".to_string(),
            })
        }

        fn fetch_snapshot(&self, filename: &str) -> Result<AssetSnapshot, SourceError> {
            self.requests.borrow_mut().push(filename.to_string());
            let Some(body) = self.files.get(filename) else {
                return Err(SourceError::Status {
                    url: format!("fake://{filename}"),
                    status: 404,
                });
            };
            serde_json::from_str(body).map_err(|error| SourceError::Decode {
                location: filename.to_string(),
                message: error.to_string(),
            })
        }
    }
}
