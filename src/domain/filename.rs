use time::PrimitiveDateTime;
use time::format_description::FormatItem;
use time::macros::format_description;

const FILENAME_PREFIX: &str = "SystemInfo_";
const FILENAME_SUFFIX: &str = ".json";

// `YYYY-MM-DD_HH_MM_SS`
const TIMESTAMP_SHAPE: &[u8; 19] = b"0000-00-00_00_00_00";

const HYPHENATED_TIMESTAMP: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]-[hour]-[minute]-[second]");
const ISO_TIMESTAMP: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileDescriptor {
    pub owner_name: String,
    /// Colon-normalized capture time, `YYYY-MM-DD:HH:MM:SS`.
    pub timestamp: String,
    pub filename: String,
}

impl FileDescriptor {
    pub fn captured_at(&self) -> Option<PrimitiveDateTime> {
        let hyphenated = self.timestamp.replace(':', "-");
        PrimitiveDateTime::parse(&hyphenated, HYPHENATED_TIMESTAMP).ok()
    }

    pub fn iso_timestamp(&self) -> Option<String> {
        self.captured_at()?.format(ISO_TIMESTAMP).ok()
    }
}

/// Decodes `SystemInfo_<Owner_Name>_<YYYY-MM-DD_HH_MM_SS>.json`.
pub fn parse_snapshot_filename(filename: &str) -> Option<FileDescriptor> {
    let middle = filename
        .strip_prefix(FILENAME_PREFIX)?
        .strip_suffix(FILENAME_SUFFIX)?;

    // owner (at least one char) + '_' + fixed-width timestamp
    let bytes = middle.as_bytes();
    if bytes.len() < TIMESTAMP_SHAPE.len() + 2 {
        return None;
    }
    let split = bytes.len() - TIMESTAMP_SHAPE.len();
    if bytes[split - 1] != b'_' || !matches_timestamp_shape(&bytes[split..]) {
        return None;
    }

    let owner_raw = &middle[..split - 1];
    let timestamp_raw = &middle[split..];
    if owner_raw.chars().any(is_line_terminator) {
        return None;
    }

    Some(FileDescriptor {
        owner_name: owner_raw.replace('_', " "),
        timestamp: timestamp_raw.replace('_', ":"),
        filename: filename.to_string(),
    })
}

fn matches_timestamp_shape(candidate: &[u8]) -> bool {
    candidate.len() == TIMESTAMP_SHAPE.len()
        && candidate
            .iter()
            .zip(TIMESTAMP_SHAPE.iter())
            .all(|(actual, expected)| match expected {
                b'0' => actual.is_ascii_digit(),
                other => actual == other,
            })
}

fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

#[cfg(test)]
mod tests {
    use super::*;

    // Inverse of the parser for owners that were encoded with underscores.
    fn snapshot_filename(owner_name: &str, timestamp: &str) -> String {
        format!(
            "{FILENAME_PREFIX}{}_{}{FILENAME_SUFFIX}",
            owner_name.replace(' ', "_"),
            timestamp.replace(':', "_")
        )
    }

    #[test]
    fn parses_owner_with_underscores() {
        let parsed =
            parse_snapshot_filename("SystemInfo_Jane_Q_Doe_2024-02-01_10_05_09.json").expect("parse");
        assert_eq!(parsed.owner_name, "Jane Q Doe");
        assert_eq!(parsed.timestamp, "2024-02-01:10:05:09");
        assert_eq!(
            parsed.filename,
            "SystemInfo_Jane_Q_Doe_2024-02-01_10_05_09.json"
        );
    }

    #[test]
    fn owner_may_contain_timestamp_like_text() {
        let parsed = parse_snapshot_filename(
            "SystemInfo_lab_2023-01-01_00_00_00_2024-03-04_05_06_07.json",
        )
        .expect("parse");
        assert_eq!(parsed.owner_name, "lab 2023-01-01 00 00 00");
        assert_eq!(parsed.timestamp, "2024-03-04:05:06:07");
    }

    #[test]
    fn round_trips_accepted_filenames() {
        for name in [
            "SystemInfo_Jane_Doe_2024-01-01_10_00_00.json",
            "SystemInfo_x_1999-12-31_23_59_59.json",
            "SystemInfo___2024-01-01_10_00_00.json",
            "SystemInfo_Zoë_Ünal_2025-07-04_08_09_10.json",
        ] {
            let parsed = parse_snapshot_filename(name).expect(name);
            assert_eq!(
                snapshot_filename(&parsed.owner_name, &parsed.timestamp),
                name
            );
        }
    }

    #[test]
    fn rejects_non_matching_names() {
        for name in [
            "",
            "notes.txt",
            "SystemInfo_.json",
            "SystemInfo__2024-01-01_10_00_00.json",
            "SystemInfo_Jane_2024-01-01_10_00_00.JSON",
            "SystemInfo_Jane_2024-01-01_10_00.json",
            "SystemInfo_Jane_2024-1-01_10_00_00.json",
            "SystemInfo_Jane-2024-01-01_10_00_00.json",
            "systeminfo_Jane_2024-01-01_10_00_00.json",
            "SystemInfo_Jane_2024-01-01_10_00_0x.json",
            "SystemInfo_Ja\nne_2024-01-01_10_00_00.json",
            "SystemInfo_Jane_2024-01-01_10_00_00.json.bak",
            "SystemInfo_Jane_٢٠٢٤-01-01_10_00_00.json",
        ] {
            assert_eq!(parse_snapshot_filename(name), None, "{name:?}");
        }
    }

    #[test]
    fn captured_at_uses_hyphenated_form() {
        let parsed =
            parse_snapshot_filename("SystemInfo_A_2024-06-01_13_14_15.json").expect("parse");
        let captured = parsed.captured_at().expect("valid date");
        assert_eq!(captured.hour(), 13);
        assert_eq!(captured.minute(), 14);
        assert_eq!(parsed.iso_timestamp().as_deref(), Some("2024-06-01T13:14:15"));
    }

    #[test]
    fn impossible_dates_parse_as_names_but_not_as_times() {
        let parsed =
            parse_snapshot_filename("SystemInfo_A_2024-13-45_99_00_00.json").expect("parse");
        assert_eq!(parsed.captured_at(), None);
        assert_eq!(parsed.iso_timestamp(), None);
    }
}
