use crate::domain::{AssetSnapshot, BatteryHealth, Scalar, display_or_na, join_scalars};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Tone {
    Normal,
    Accent,
    Good,
    Warn,
    Bad,
    Muted,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReportRow {
    Item { title: String, aside: String, tone: Tone },
    Field { label: &'static str, value: String },
    Gauge {
        label: &'static str,
        ratio: f64,
        caption: String,
        tone: Tone,
    },
    Empty(&'static str),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReportSection {
    pub title: &'static str,
    pub rows: Vec<ReportRow>,
}

/// Lines the rendered report occupies: a title per section, one line per row, and a blank
/// separator between sections.
pub fn report_line_count(sections: &[ReportSection]) -> usize {
    let body: usize = sections.iter().map(|section| 1 + section.rows.len()).sum();
    body + sections.len().saturating_sub(1)
}

pub fn build_report(snapshot: &AssetSnapshot) -> Vec<ReportSection> {
    vec![
        summary_section(snapshot),
        system_section(snapshot),
        storage_section(snapshot),
        network_section(snapshot),
        software_section(snapshot),
        memory_section(snapshot),
        battery_section(snapshot),
        monitor_section(snapshot),
    ]
}

fn na(value: &Option<Scalar>) -> String {
    display_or_na(value.as_ref())
}

fn with_unit(value: &Option<Scalar>, unit: &str) -> String {
    match value.as_ref().map(Scalar::to_string) {
        Some(text) if !text.trim().is_empty() => format!("{text} {unit}"),
        _ => "N/A".to_string(),
    }
}

fn field(label: &'static str, value: String) -> ReportRow {
    ReportRow::Field { label, value }
}

fn summary_section(snapshot: &AssetSnapshot) -> ReportSection {
    let asset = &snapshot.asset;
    let owner = if snapshot.owner_name.trim().is_empty() {
        "N/A".to_string()
    } else {
        snapshot.owner_name.clone()
    };
    ReportSection {
        title: "Summary",
        rows: vec![
            ReportRow::Item {
                title: na(&asset.hostname),
                aside: format!("{} {}", na(&asset.manufacturer), na(&asset.model)),
                tone: Tone::Accent,
            },
            field("Asset Type", na(&asset.asset_type)),
            field("OS", na(&asset.os)),
            field("Serial", na(&asset.serial_number)),
            field("Owner", owner),
            field("Last User", na(&asset.last_user)),
        ],
    }
}

fn system_section(snapshot: &AssetSnapshot) -> ReportSection {
    let asset = &snapshot.asset;
    let os = match (&asset.os, &asset.version) {
        (Some(os), Some(version)) => format!("{os} {version}"),
        (os, _) => na(os),
    };
    ReportSection {
        title: "System Information",
        rows: vec![
            field("Operating System", os),
            field("Build Number", na(&asset.build)),
            field("Processor", na(&asset.processor)),
            field("Graphics", join_scalars(&asset.graphics)),
            field("Motherboard", na(&asset.motherboard)),
            field("Antivirus", na(&asset.antivirus)),
            field("Firewall", na(&asset.firewall)),
            field("Audio", join_scalars(&asset.audio)),
        ],
    }
}

fn storage_section(snapshot: &AssetSnapshot) -> ReportSection {
    let mut rows = Vec::new();
    if snapshot.physical_disks.is_empty() {
        rows.push(ReportRow::Empty("No physical disks reported."));
    }
    for disk in &snapshot.physical_disks {
        rows.push(ReportRow::Item {
            title: na(&disk.model),
            aside: with_unit(&disk.size_gb, "GB"),
            tone: Tone::Normal,
        });
        rows.push(field(
            "Media / Bus / Status",
            format!(
                "{} / {} / {}",
                na(&disk.media_type),
                na(&disk.bus_type),
                na(&disk.status)
            ),
        ));
    }

    if snapshot.logical_drives.is_empty() {
        rows.push(ReportRow::Empty("No logical drives reported."));
    }
    for drive in &snapshot.logical_drives {
        let ratio = drive.used_ratio().unwrap_or(0.0);
        rows.push(ReportRow::Item {
            title: format!("Drive {}: {}", na(&drive.drive_letter), na(&drive.volume_label)),
            aside: format!(
                "{} / {}",
                with_unit(&drive.used_space_gb, "GB"),
                with_unit(&drive.total_size_gb, "GB")
            ),
            tone: Tone::Normal,
        });
        rows.push(ReportRow::Gauge {
            label: "Used",
            ratio,
            caption: match drive.used_percent.as_ref().and_then(Scalar::as_f64) {
                Some(percent) => format!("{percent}%"),
                None => "N/A".to_string(),
            },
            tone: usage_tone(ratio),
        });
        let free_percent = drive
            .used_percent
            .as_ref()
            .and_then(Scalar::as_f64)
            .map(|used| format!(" ({}%)", 100.0 - used))
            .unwrap_or_default();
        rows.push(field(
            "File System",
            format!(
                "{}, {} free{free_percent}",
                na(&drive.file_system),
                with_unit(&drive.free_space_gb, "GB")
            ),
        ));
    }

    ReportSection {
        title: "Storage",
        rows,
    }
}

fn usage_tone(ratio: f64) -> Tone {
    if ratio >= 0.9 {
        Tone::Bad
    } else if ratio >= 0.75 {
        Tone::Warn
    } else {
        Tone::Accent
    }
}

fn network_section(snapshot: &AssetSnapshot) -> ReportSection {
    let mut rows = Vec::new();
    if snapshot.network_interfaces.is_empty() {
        rows.push(ReportRow::Empty("No network interfaces reported."));
    }
    for adapter in &snapshot.network_interfaces {
        rows.push(ReportRow::Item {
            title: na(&adapter.name),
            aside: na(&adapter.status),
            tone: if adapter.is_up() { Tone::Good } else { Tone::Muted },
        });
        rows.push(field("IPv4 Address", na(&adapter.ipv4)));
        rows.push(field("MAC Address", na(&adapter.mac)));
        rows.push(field("Vendor", na(&adapter.vendor)));
    }
    ReportSection {
        title: "Network Interfaces",
        rows,
    }
}

fn software_section(snapshot: &AssetSnapshot) -> ReportSection {
    let mut rows = Vec::new();
    if snapshot.installed_software.is_empty() {
        rows.push(ReportRow::Empty("No installed software reported."));
    }
    for package in &snapshot.installed_software {
        rows.push(ReportRow::Item {
            title: na(&package.name),
            aside: na(&package.version),
            tone: Tone::Normal,
        });
        rows.push(field("Publisher", na(&package.publisher)));
        rows.push(field("Install Date", na(&package.install_date)));
        rows.push(field("Scope", na(&package.scope)));
    }
    ReportSection {
        title: "Installed Software",
        rows,
    }
}

fn memory_section(snapshot: &AssetSnapshot) -> ReportSection {
    let memory = &snapshot.memory;
    let mut rows = vec![field("Total Memory", with_unit(&memory.total_memory_gb, "GB"))];
    for module in &memory.modules {
        rows.push(ReportRow::Item {
            title: na(&module.manufacturer),
            aside: with_unit(&module.capacity_gb, "GB"),
            tone: Tone::Normal,
        });
        rows.push(field(
            "Type",
            format!("{} @ {}", na(&module.ram_type), with_unit(&module.speed_mhz, "MHz")),
        ));
        rows.push(field("Part Number", na(&module.part_number)));
    }
    ReportSection {
        title: "Memory",
        rows,
    }
}

fn battery_section(snapshot: &AssetSnapshot) -> ReportSection {
    let Some(battery) = &snapshot.battery else {
        return ReportSection {
            title: "Battery",
            rows: vec![ReportRow::Empty("No battery reported.")],
        };
    };

    let health_tone = match battery.health() {
        Some(BatteryHealth::Good) => Tone::Good,
        Some(BatteryHealth::Fair) => Tone::Warn,
        Some(BatteryHealth::Poor) => Tone::Bad,
        None => Tone::Muted,
    };
    ReportSection {
        title: "Battery",
        rows: vec![
            field("Model", na(&battery.model)),
            ReportRow::Gauge {
                label: "Health",
                ratio: battery.health_ratio().unwrap_or(0.0),
                caption: format!("{}% health", na(&battery.battery_health_percent)),
                tone: health_tone,
            },
            ReportRow::Gauge {
                label: "Charge Remaining",
                ratio: battery.charge_ratio().unwrap_or(0.0),
                caption: format!("{}%", na(&battery.estimated_charge_remaining_percent)),
                tone: Tone::Good,
            },
            field("Designed Capacity", with_unit(&battery.designed_capacity_wh, "Wh")),
            field(
                "Full Charged Capacity",
                with_unit(&battery.full_charged_capacity_wh, "Wh"),
            ),
            field("Cycle Count", na(&battery.cycle_count)),
        ],
    }
}

fn monitor_section(snapshot: &AssetSnapshot) -> ReportSection {
    let mut rows = Vec::new();
    if snapshot.monitors.is_empty() {
        rows.push(ReportRow::Empty("No monitors reported."));
    }
    for monitor in &snapshot.monitors {
        rows.push(ReportRow::Item {
            title: na(&monitor.manufacturer),
            aside: with_unit(&monitor.screen_size_inch, "in"),
            tone: Tone::Normal,
        });
        rows.push(field("Resolution", na(&monitor.native_resolution)));
        rows.push(field("Year", na(&monitor.year_of_manufacture)));
        rows.push(field("Model", na(&monitor.friendly_name)));
        rows.push(field("Serial", na(&monitor.serial_number)));
    }
    ReportSection {
        title: "Monitors",
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(json: &str) -> AssetSnapshot {
        serde_json::from_str(json).expect("snapshot")
    }

    fn find_field<'a>(sections: &'a [ReportSection], label: &str) -> Option<&'a str> {
        sections.iter().flat_map(|section| &section.rows).find_map(|row| match row {
            ReportRow::Field { label: found, value } if *found == label => Some(value.as_str()),
            _ => None,
        })
    }

    #[test]
    fn report_has_every_section_in_order() {
        let titles: Vec<&str> = build_report(&AssetSnapshot::default())
            .iter()
            .map(|section| section.title)
            .collect();
        assert_eq!(
            titles,
            vec![
                "Summary",
                "System Information",
                "Storage",
                "Network Interfaces",
                "Installed Software",
                "Memory",
                "Battery",
                "Monitors",
            ]
        );
    }

    #[test]
    fn missing_values_read_as_na() {
        let report = build_report(&snapshot(
            r#"{"NetworkInterfaces": {"Name": "Ethernet", "Status": "Disconnected"}}"#,
        ));
        assert_eq!(find_field(&report, "IPv4 Address"), Some("N/A"));
        assert_eq!(find_field(&report, "Owner"), Some("N/A"));
        assert_eq!(find_field(&report, "Total Memory"), Some("N/A"));
        assert_eq!(find_field(&report, "Graphics"), Some("N/A"));

        let network = &report[3];
        assert!(matches!(
            &network.rows[0],
            ReportRow::Item { aside, tone: Tone::Muted, .. } if aside == "Disconnected"
        ));
    }

    #[test]
    fn drive_and_battery_gauges_carry_ratio_and_tone() {
        let report = build_report(&snapshot(
            r#"{
                "LogicalDrives": [{"DriveLetter": "C", "UsedPercent": 92, "FreeSpaceGB": 20}],
                "BatteryInformation": {"BatteryHealthPercent": 72, "EstimatedChargeRemainingPercent": 40}
            }"#,
        ));
        let gauges: Vec<(&str, f64, Tone)> = report
            .iter()
            .flat_map(|section| &section.rows)
            .filter_map(|row| match row {
                ReportRow::Gauge {
                    label, ratio, tone, ..
                } => Some((*label, *ratio, *tone)),
                _ => None,
            })
            .collect();
        assert_eq!(
            gauges,
            vec![
                ("Used", 0.92, Tone::Bad),
                ("Health", 0.72, Tone::Warn),
                ("Charge Remaining", 0.4, Tone::Good),
            ]
        );
        assert_eq!(find_field(&report, "File System"), Some("N/A, 20 GB free (8%)"));
    }

    #[test]
    fn line_count_matches_rendered_layout() {
        let sections = vec![
            ReportSection {
                title: "A",
                rows: vec![ReportRow::Empty("x"), ReportRow::Empty("y")],
            },
            ReportSection {
                title: "B",
                rows: vec![],
            },
        ];
        assert_eq!(report_line_count(&sections), 3 + 1 + 1);
        assert_eq!(report_line_count(&[]), 0);
    }
}
