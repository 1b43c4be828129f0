use crate::domain::{AssetSnapshot, ResolvedSet, json_filenames, resolve_latest};
use crate::infra::{FetchFailure, SnapshotSource, SourceError, fetch_snapshots};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to list snapshots from {location}: {error}")]
    Listing {
        location: String,
        #[source]
        error: SourceError,
    },
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SyncReport {
    pub listed: usize,
    pub json_files: usize,
    pub rejected: usize,
    pub resolved: usize,
    pub fetched: usize,
    pub failed: usize,
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} owners, {} loaded",
            self.resolved, self.fetched
        )?;
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        if self.rejected > 0 {
            write!(f, ", {} unrecognized", self.rejected)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct Resolution {
    pub resolved: ResolvedSet,
    pub report: SyncReport,
}

#[derive(Clone, Debug)]
pub struct SyncOutput {
    pub snapshots: Vec<AssetSnapshot>,
    pub failures: Vec<FetchFailure>,
    pub report: SyncReport,
}

pub fn list_and_resolve(source: &dyn SnapshotSource) -> Result<Resolution, SyncError> {
    let listing = source
        .list_filenames()
        .map_err(|error| SyncError::Listing {
            location: source.describe(),
            error,
        })?;
    let listed = listing.len();
    let json_names = json_filenames(listing);
    let resolved = resolve_latest(json_names.iter().map(String::as_str));
    if resolved.is_empty() && !json_names.is_empty() {
        tracing::warn!(
            json_files = json_names.len(),
            "no listed file follows the SystemInfo_<owner>_<timestamp>.json convention"
        );
    }

    let report = SyncReport {
        listed,
        json_files: json_names.len(),
        rejected: resolved.rejected(),
        resolved: resolved.len(),
        ..SyncReport::default()
    };
    tracing::info!(
        source = %source.describe(),
        listed = report.listed,
        json_files = report.json_files,
        rejected = report.rejected,
        resolved = report.resolved,
        "resolved snapshot listing"
    );
    Ok(Resolution { resolved, report })
}

pub fn run_sync(source: &dyn SnapshotSource) -> Result<SyncOutput, SyncError> {
    let Resolution {
        resolved,
        mut report,
    } = list_and_resolve(source)?;
    let outcome = fetch_snapshots(source, &resolved);
    report.fetched = outcome.snapshots.len();
    report.failed = outcome.failures.len();
    tracing::info!(
        fetched = report.fetched,
        failed = report.failed,
        "sync finished"
    );

    Ok(SyncOutput {
        snapshots: outcome.snapshots,
        failures: outcome.failures,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::fetch::testing::FakeSource;

    #[test]
    fn scenario_listing_resolves_and_fetches_latest() {
        let source = FakeSource::with_listing(&[
            "SystemInfo_Jane_Doe_2024-01-01_10_00_00.json",
            "SystemInfo_Jane_Doe_2024-02-01_10_00_00.json",
            "notes.txt",
            "manifest.json",
        ])
        .with_file(
            "SystemInfo_Jane_Doe_2024-02-01_10_00_00.json",
            r#"{"OwnerName":"Jane Doe"}"#,
        );

        let output = run_sync(&source).expect("sync");
        assert_eq!(output.snapshots.len(), 1);
        assert_eq!(output.snapshots[0].owner_name, "Jane Doe");
        assert_eq!(
            *source.requests.borrow(),
            vec!["SystemInfo_Jane_Doe_2024-02-01_10_00_00.json"]
        );
        assert_eq!(
            output.report,
            SyncReport {
                listed: 4,
                json_files: 3,
                rejected: 1,
                resolved: 1,
                fetched: 1,
                failed: 0,
            }
        );
    }

    #[test]
    fn listing_failure_aborts_the_cycle() {
        let source = FakeSource::default();
        let error = run_sync(&source).expect_err("listing fails");
        assert!(matches!(error, SyncError::Listing { .. }));
        assert!(source.requests.borrow().is_empty());
    }

    #[test]
    fn all_fetches_failing_is_not_an_error() {
        let source = FakeSource::with_listing(&[
            "SystemInfo_A_2024-01-01_10_00_00.json",
            "SystemInfo_B_2024-01-01_10_00_00.json",
        ]);
        let output = run_sync(&source).expect("sync");
        assert!(output.snapshots.is_empty());
        assert_eq!(output.report.failed, 2);
        assert_eq!(output.report.to_string(), "2 owners, 0 loaded, 2 failed");
    }
}
