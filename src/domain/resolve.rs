use crate::domain::{FileDescriptor, parse_snapshot_filename};
use std::collections::HashMap;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ResolvedSet {
    entries: Vec<FileDescriptor>,
    rejected: usize,
}

impl ResolvedSet {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileDescriptor> {
        self.entries.iter()
    }

    pub fn rejected(&self) -> usize {
        self.rejected
    }
}

pub fn json_filenames<I, S>(listing: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    listing
        .into_iter()
        .map(Into::into)
        .filter(|name| name.ends_with(".json"))
        .collect()
}

/// Ties (same instant, or two timestamps that are not real dates) go to the name seen
/// last, so the result depends on listing order. A timestamp that is not a real date
/// loses to any that is.
pub fn resolve_latest<'a, I>(filenames: I) -> ResolvedSet
where
    I: IntoIterator<Item = &'a str>,
{
    let mut resolved = ResolvedSet::default();
    let mut slot_by_owner: HashMap<String, usize> = HashMap::new();

    for filename in filenames {
        let Some(candidate) = parse_snapshot_filename(filename) else {
            resolved.rejected += 1;
            continue;
        };

        match slot_by_owner.get(&candidate.owner_name).copied() {
            None => {
                slot_by_owner.insert(candidate.owner_name.clone(), resolved.entries.len());
                resolved.entries.push(candidate);
            }
            Some(slot) => {
                let current = &resolved.entries[slot];
                if candidate.captured_at() >= current.captured_at() {
                    resolved.entries[slot] = candidate;
                }
            }
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    impl ResolvedSet {
        fn get(&self, owner_name: &str) -> Option<&FileDescriptor> {
            self.entries
                .iter()
                .find(|descriptor| descriptor.owner_name == owner_name)
        }
    }

    #[test]
    fn selects_latest_for_single_owner() {
        let resolved = resolve_latest([
            "SystemInfo_A_2024-06-01_00_00_00.json",
            "SystemInfo_A_2024-01-01_00_00_00.json",
        ]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(
            resolved.get("A").map(|d| d.filename.as_str()),
            Some("SystemInfo_A_2024-06-01_00_00_00.json")
        );

        let resolved = resolve_latest([
            "SystemInfo_A_2024-01-01_00_00_00.json",
            "SystemInfo_A_2024-06-01_00_00_00.json",
        ]);
        assert_eq!(
            resolved.get("A").map(|d| d.timestamp.as_str()),
            Some("2024-06-01:00:00:00")
        );
    }

    #[test]
    fn keeps_one_entry_per_owner() {
        let resolved = resolve_latest([
            "SystemInfo_Ann_Lee_2024-03-01_09_00_00.json",
            "SystemInfo_Bob_2024-03-02_09_00_00.json",
            "SystemInfo_Ann_Lee_2024-03-05_09_00_00.json",
            "SystemInfo_Bob_2023-12-31_23_59_59.json",
        ]);
        let owners: Vec<&str> = resolved.iter().map(|d| d.owner_name.as_str()).collect();
        assert_eq!(owners, vec!["Ann Lee", "Bob"]);
        assert_eq!(
            resolved.get("Ann Lee").map(|d| d.filename.as_str()),
            Some("SystemInfo_Ann_Lee_2024-03-05_09_00_00.json")
        );
        assert_eq!(
            resolved.get("Bob").map(|d| d.filename.as_str()),
            Some("SystemInfo_Bob_2024-03-02_09_00_00.json")
        );
    }

    #[test]
    fn compares_chronologically_within_a_day() {
        let resolved = resolve_latest([
            "SystemInfo_A_2024-01-01_09_59_59.json",
            "SystemInfo_A_2024-01-01_10_00_00.json",
            "SystemInfo_A_2024-01-01_09_00_00.json",
        ]);
        assert_eq!(
            resolved.get("A").map(|d| d.timestamp.as_str()),
            Some("2024-01-01:10:00:00")
        );
    }

    #[test]
    fn identical_timestamps_resolve_to_last_seen() {
        let resolved = resolve_latest([
            "SystemInfo_A_B_2024-01-01_10_00_00.json",
            "SystemInfo_A B_2024-01-01_10_00_00.json",
        ]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(
            resolved.get("A B").map(|d| d.filename.as_str()),
            Some("SystemInfo_A B_2024-01-01_10_00_00.json")
        );
    }

    #[test]
    fn real_dates_beat_impossible_ones() {
        let resolved = resolve_latest([
            "SystemInfo_A_2024-01-01_10_00_00.json",
            "SystemInfo_A_2024-99-01_10_00_00.json",
        ]);
        assert_eq!(
            resolved.get("A").map(|d| d.timestamp.as_str()),
            Some("2024-01-01:10:00:00")
        );
    }

    #[test]
    fn listing_scenario_resolves_february_file() {
        let listing = json_filenames([
            "SystemInfo_Jane_Doe_2024-01-01_10_00_00.json",
            "SystemInfo_Jane_Doe_2024-02-01_10_00_00.json",
            "notes.txt",
        ]);
        assert_eq!(listing.len(), 2);

        let resolved = resolve_latest(listing.iter().map(String::as_str));
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved.rejected(), 0);
        let jane = resolved.get("Jane Doe").expect("Jane Doe");
        assert_eq!(jane.filename, "SystemInfo_Jane_Doe_2024-02-01_10_00_00.json");
    }

    #[test]
    fn unrelated_json_is_counted_as_rejected() {
        let resolved = resolve_latest(["index.json", "SystemInfo_A_2024-01-01_10_00_00.json"]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved.rejected(), 1);
    }
}
