use crate::app::owner_matches;
use crate::domain::AssetSnapshot;
use crate::infra::{
    AppConfig, ConfigOverrides, SnapshotSource, SyncError, list_and_resolve, run_sync,
};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliInvocation {
    PrintHelp,
    PrintVersion,
    Tui { overrides: ConfigOverrides },
    Command {
        overrides: ConfigOverrides,
        command: CliCommand,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliCommand {
    Resolve,
    List { query: Option<String> },
    Show { owner: String },
}

#[derive(Debug, Error)]
pub enum CliParseError {
    #[error("unknown subcommand: {0}")]
    UnknownSubcommand(String),

    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    #[error("missing value for flag: {0}")]
    MissingFlagValue(String),

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),
}

#[derive(Debug, Error)]
pub enum CliRunError {
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),

    #[error("no snapshot found for owner: {0}\nHint: run `assetbox list` to see loaded owners.")]
    OwnerNotFound(String),
}

pub fn parse_invocation(args: &[String]) -> Result<CliInvocation, CliParseError> {
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        return Ok(CliInvocation::PrintHelp);
    }
    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        return Ok(CliInvocation::PrintVersion);
    }

    let mut overrides = ConfigOverrides::default();
    let mut subcommand: Option<String> = None;
    let mut positionals: Vec<String> = Vec::new();

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        if take_config_flag(arg, &mut iter, &mut overrides)? {
            continue;
        }
        if arg == "--" {
            positionals.extend(iter.by_ref().cloned());
            break;
        }
        if arg.starts_with('-') && arg.len() > 1 {
            return Err(CliParseError::UnknownFlag(arg.to_string()));
        }
        if subcommand.is_none() {
            subcommand = Some(arg.to_string());
        } else {
            positionals.push(arg.to_string());
        }
    }

    let Some(subcommand) = subcommand else {
        if let Some(extra) = positionals.first() {
            return Err(CliParseError::UnexpectedArgument(extra.to_string()));
        }
        return Ok(CliInvocation::Tui { overrides });
    };

    let mut positionals = positionals.into_iter();
    let command = match subcommand.as_str() {
        "resolve" => CliCommand::Resolve,
        "list" => CliCommand::List {
            query: positionals.next(),
        },
        "show" => CliCommand::Show {
            owner: positionals
                .next()
                .ok_or(CliParseError::MissingArgument("owner"))?,
        },
        other => return Err(CliParseError::UnknownSubcommand(other.to_string())),
    };
    if let Some(extra) = positionals.next() {
        return Err(CliParseError::UnexpectedArgument(extra));
    }

    Ok(CliInvocation::Command { overrides, command })
}

fn take_config_flag<'a>(
    arg: &str,
    iter: &mut impl Iterator<Item = &'a String>,
    overrides: &mut ConfigOverrides,
) -> Result<bool, CliParseError> {
    let (flag, inline_value) = match arg.split_once('=') {
        Some((flag, value)) if flag.starts_with("--") => (flag, Some(value.to_string())),
        _ => (arg, None),
    };
    let slot = match flag {
        "--server" | "-s" => &mut overrides.server,
        "--listing-path" => &mut overrides.listing_path,
        "--records-path" => &mut overrides.records_path,
        "--timeout" => &mut overrides.timeout_secs,
        "--records-dir" | "-d" => {
            let value = flag_value(flag, inline_value, iter)?;
            overrides.records_dir = Some(PathBuf::from(value));
            return Ok(true);
        }
        _ => return Ok(false),
    };
    *slot = Some(flag_value(flag, inline_value, iter)?);
    Ok(true)
}

fn flag_value<'a>(
    flag: &str,
    inline_value: Option<String>,
    iter: &mut impl Iterator<Item = &'a String>,
) -> Result<String, CliParseError> {
    inline_value
        .or_else(|| iter.next().cloned())
        .ok_or_else(|| CliParseError::MissingFlagValue(flag.to_string()))
}

pub fn run(command: CliCommand, config: &AppConfig) -> Result<(), CliRunError> {
    let source = config.build_source();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let stderr = io::stderr();
    let mut err = io::BufWriter::new(stderr.lock());

    execute(command, source.as_ref(), &mut out, &mut err)?;
    out.flush().or_else(ignore_broken_pipe)?;
    err.flush().or_else(ignore_broken_pipe)?;
    Ok(())
}

fn ignore_broken_pipe(error: io::Error) -> io::Result<()> {
    if error.kind() == io::ErrorKind::BrokenPipe {
        Ok(())
    } else {
        Err(error)
    }
}

fn execute(
    command: CliCommand,
    source: &dyn SnapshotSource,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<(), CliRunError> {
    match command {
        CliCommand::Resolve => {
            let resolution = list_and_resolve(source)?;
            for descriptor in resolution.resolved.iter() {
                let when = descriptor
                    .iso_timestamp()
                    .unwrap_or_else(|| descriptor.timestamp.clone());
                let line = format!("{}\t{}\t{}", descriptor.owner_name, when, descriptor.filename);
                if !write_line(out, &line)? {
                    return Ok(());
                }
            }
            let report = resolution.report;
            write_line(
                err,
                &format!(
                    "{} listed, {} json, {} owners, {} unrecognized",
                    report.listed, report.json_files, report.resolved, report.rejected
                ),
            )?;
            Ok(())
        }
        CliCommand::List { query } => {
            let output = run_sync(source)?;
            let needle = query.as_deref().unwrap_or("").trim().to_lowercase();
            for snapshot in output
                .snapshots
                .iter()
                .filter(|snapshot| owner_matches(&needle, &snapshot.owner_name))
            {
                if !write_line(out, &list_row(snapshot))? {
                    return Ok(());
                }
            }
            for failure in &output.failures {
                if !write_line(err, &format!("skipped {}: {}", failure.filename, failure.message))? {
                    return Ok(());
                }
            }
            write_line(err, &output.report.to_string())?;
            Ok(())
        }
        CliCommand::Show { owner } => {
            let output = run_sync(source)?;
            let Some(snapshot) = find_owner(&output.snapshots, &owner) else {
                return Err(CliRunError::OwnerNotFound(owner));
            };
            let json = serde_json::to_string_pretty(snapshot)?;
            write_line(out, &json)?;
            Ok(())
        }
    }
}

fn list_row(snapshot: &AssetSnapshot) -> String {
    let asset = &snapshot.asset;
    let cell = |value: &Option<crate::domain::Scalar>| {
        crate::domain::display_or_na(value.as_ref()).replace(['\t', '\n'], " ")
    };
    format!(
        "{}\t{}\t{} {}\t{}\t{}",
        snapshot.owner_name,
        cell(&asset.hostname),
        cell(&asset.manufacturer),
        cell(&asset.model),
        cell(&asset.os),
        snapshot.timestamp.as_deref().unwrap_or("N/A")
    )
}

fn find_owner<'a>(snapshots: &'a [AssetSnapshot], owner: &str) -> Option<&'a AssetSnapshot> {
    let needle = owner.trim().to_lowercase();
    snapshots
        .iter()
        .find(|snapshot| snapshot.owner_name.to_lowercase() == needle)
        .or_else(|| {
            snapshots
                .iter()
                .find(|snapshot| owner_matches(&needle, &snapshot.owner_name))
        })
}

fn write_line(out: &mut impl Write, line: &str) -> io::Result<bool> {
    match writeln!(out, "{line}") {
        Ok(()) => Ok(true),
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(false),
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::DirSource;
    use std::fs;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    fn records(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        for (name, body) in files {
            fs::write(dir.path().join(name), body).expect("write");
        }
        dir
    }

    fn execute_to_strings(
        command: CliCommand,
        source: &dyn SnapshotSource,
    ) -> (Result<(), CliRunError>, String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = execute(command, source, &mut out, &mut err);
        (
            result,
            String::from_utf8(out).expect("utf8"),
            String::from_utf8(err).expect("utf8"),
        )
    }

    #[test]
    fn parse_defaults_to_tui_when_no_args() {
        let parsed = parse_invocation(&args(&["assetbox"])).expect("parse");
        assert_eq!(
            parsed,
            CliInvocation::Tui {
                overrides: ConfigOverrides::default()
            }
        );
    }

    #[test]
    fn parse_help_flag_wins() {
        let parsed = parse_invocation(&args(&["assetbox", "show", "--help"])).expect("parse");
        assert_eq!(parsed, CliInvocation::PrintHelp);
        let parsed = parse_invocation(&args(&["assetbox", "-V"])).expect("parse");
        assert_eq!(parsed, CliInvocation::PrintVersion);
    }

    #[test]
    fn parse_config_flags_in_any_position() {
        let parsed = parse_invocation(&args(&[
            "assetbox",
            "--server",
            "http://inventory:8000",
            "list",
            "jane",
            "--timeout=3",
        ]))
        .expect("parse");
        assert_eq!(
            parsed,
            CliInvocation::Command {
                overrides: ConfigOverrides {
                    server: Some("http://inventory:8000".to_string()),
                    timeout_secs: Some("3".to_string()),
                    ..ConfigOverrides::default()
                },
                command: CliCommand::List {
                    query: Some("jane".to_string())
                },
            }
        );
    }

    #[test]
    fn parse_records_dir_for_tui() {
        let parsed = parse_invocation(&args(&["assetbox", "-d", "/srv/Records"])).expect("parse");
        let CliInvocation::Tui { overrides } = parsed else {
            panic!("expected tui");
        };
        assert_eq!(overrides.records_dir, Some(PathBuf::from("/srv/Records")));
    }

    #[test]
    fn parse_subcommands() {
        assert_eq!(
            parse_invocation(&args(&["assetbox", "resolve"])).expect("parse"),
            CliInvocation::Command {
                overrides: ConfigOverrides::default(),
                command: CliCommand::Resolve,
            }
        );
        assert_eq!(
            parse_invocation(&args(&["assetbox", "show", "Jane Doe"])).expect("parse"),
            CliInvocation::Command {
                overrides: ConfigOverrides::default(),
                command: CliCommand::Show {
                    owner: "Jane Doe".to_string()
                },
            }
        );
        assert_eq!(
            parse_invocation(&args(&["assetbox", "list", "--", "-dash"])).expect("parse"),
            CliInvocation::Command {
                overrides: ConfigOverrides::default(),
                command: CliCommand::List {
                    query: Some("-dash".to_string())
                },
            }
        );
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            parse_invocation(&args(&["assetbox", "frobnicate"])),
            Err(CliParseError::UnknownSubcommand(_))
        ));
        assert!(matches!(
            parse_invocation(&args(&["assetbox", "--verbose"])),
            Err(CliParseError::UnknownFlag(_))
        ));
        assert!(matches!(
            parse_invocation(&args(&["assetbox", "list", "--server"])),
            Err(CliParseError::MissingFlagValue(_))
        ));
        assert!(matches!(
            parse_invocation(&args(&["assetbox", "show"])),
            Err(CliParseError::MissingArgument("owner"))
        ));
        assert!(matches!(
            parse_invocation(&args(&["assetbox", "resolve", "extra"])),
            Err(CliParseError::UnexpectedArgument(_))
        ));
    }

    #[test]
    fn resolve_prints_latest_file_per_owner() {
        let dir = records(&[
            ("SystemInfo_Jane_Doe_2024-01-01_10_00_00.json", "{}"),
            ("SystemInfo_Jane_Doe_2024-02-01_10_00_00.json", "{}"),
            ("notes.txt", ""),
        ]);
        let source = DirSource::new(dir.path().to_path_buf());
        let (result, out, err) = execute_to_strings(CliCommand::Resolve, &source);
        result.expect("resolve");
        assert_eq!(
            out,
            "Jane Doe\t2024-02-01T10:00:00\tSystemInfo_Jane_Doe_2024-02-01_10_00_00.json\n"
        );
        assert_eq!(err, "3 listed, 2 json, 1 owners, 0 unrecognized\n");
    }

    #[test]
    fn list_filters_by_owner_and_reports_failures() {
        let dir = records(&[
            (
                "SystemInfo_Jane_Doe_2024-02-01_10_00_00.json",
                r#"{"OwnerName":"Jane Doe","AssetInformation":{"Hostname":"JD-PC","Manufacturer":"Dell","Model":"XPS","OS":"Windows 11"}}"#,
            ),
            ("SystemInfo_John_Smith_2024-02-01_10_00_00.json", "{"),
        ]);
        let source = DirSource::new(dir.path().to_path_buf());
        let (result, out, err) = execute_to_strings(
            CliCommand::List {
                query: Some("JANE".to_string()),
            },
            &source,
        );
        result.expect("list");
        assert_eq!(
            out,
            "Jane Doe\tJD-PC\tDell XPS\tWindows 11\t2024-02-01T10:00:00\n"
        );
        assert!(err.contains("skipped SystemInfo_John_Smith_2024-02-01_10_00_00.json"));
        assert!(err.ends_with("2 owners, 1 loaded, 1 failed\n"));
    }

    #[test]
    fn show_prefers_exact_owner_match() {
        let dir = records(&[
            (
                "SystemInfo_Ann_Lee_2024-02-01_10_00_00.json",
                r#"{"OwnerName":"Ann Lee"}"#,
            ),
            ("SystemInfo_Ann_2024-02-01_10_00_00.json", r#"{"OwnerName":"Ann"}"#),
        ]);
        let source = DirSource::new(dir.path().to_path_buf());
        let (result, out, _) = execute_to_strings(
            CliCommand::Show {
                owner: "ann".to_string(),
            },
            &source,
        );
        result.expect("show");
        let shown: serde_json::Value = serde_json::from_str(&out).expect("json");
        assert_eq!(shown["OwnerName"], "Ann");

        let (result, _, _) = execute_to_strings(
            CliCommand::Show {
                owner: "nobody".to_string(),
            },
            &source,
        );
        assert!(matches!(result, Err(CliRunError::OwnerNotFound(_))));
    }

    #[test]
    fn listing_failure_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = DirSource::new(dir.path().join("missing"));
        let (result, out, _) = execute_to_strings(CliCommand::Resolve, &source);
        assert!(matches!(result, Err(CliRunError::Sync(_))));
        assert!(out.is_empty());
    }
}
