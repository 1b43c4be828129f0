use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AssetSnapshot {
    #[serde(rename = "OwnerName", deserialize_with = "null_as_empty")]
    pub owner_name: String,
    #[serde(rename = "Timestamp", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(rename = "AssetInformation")]
    pub asset: AssetInformation,
    #[serde(rename = "PhysicalDisks", deserialize_with = "one_or_many")]
    pub physical_disks: Vec<PhysicalDisk>,
    #[serde(rename = "LogicalDrives", deserialize_with = "one_or_many")]
    pub logical_drives: Vec<LogicalDrive>,
    #[serde(rename = "NetworkInterfaces", deserialize_with = "one_or_many")]
    pub network_interfaces: Vec<NetworkInterface>,
    #[serde(rename = "InstalledSoftware", deserialize_with = "one_or_many")]
    pub installed_software: Vec<InstalledSoftware>,
    #[serde(rename = "MemoryInformation")]
    pub memory: MemoryInformation,
    #[serde(rename = "BatteryInformation")]
    pub battery: Option<BatteryInformation>,
    #[serde(rename = "MonitorInformation", deserialize_with = "one_or_many")]
    pub monitors: Vec<MonitorInformation>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, rename_all = "PascalCase")]
pub struct AssetInformation {
    pub hostname: Option<Scalar>,
    pub asset_type: Option<Scalar>,
    pub last_user: Option<Scalar>,
    #[serde(rename = "OS")]
    pub os: Option<Scalar>,
    pub version: Option<Scalar>,
    pub build: Option<Scalar>,
    pub domain: Option<Scalar>,
    pub manufacturer: Option<Scalar>,
    pub model: Option<Scalar>,
    pub serial_number: Option<Scalar>,
    pub processor: Option<Scalar>,
    #[serde(deserialize_with = "one_or_many")]
    pub graphics: Vec<Scalar>,
    pub motherboard: Option<Scalar>,
    pub antivirus: Option<Scalar>,
    pub firewall: Option<Scalar>,
    #[serde(deserialize_with = "one_or_many")]
    pub audio: Vec<Scalar>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, rename_all = "PascalCase")]
pub struct PhysicalDisk {
    pub model: Option<Scalar>,
    #[serde(rename = "SizeGB")]
    pub size_gb: Option<Scalar>,
    pub media_type: Option<Scalar>,
    pub bus_type: Option<Scalar>,
    pub status: Option<Scalar>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, rename_all = "PascalCase")]
pub struct LogicalDrive {
    pub drive_letter: Option<Scalar>,
    pub volume_label: Option<Scalar>,
    pub file_system: Option<Scalar>,
    #[serde(rename = "TotalSizeGB")]
    pub total_size_gb: Option<Scalar>,
    #[serde(rename = "UsedSpaceGB")]
    pub used_space_gb: Option<Scalar>,
    #[serde(rename = "FreeSpaceGB")]
    pub free_space_gb: Option<Scalar>,
    pub used_percent: Option<Scalar>,
}

impl LogicalDrive {
    pub fn used_ratio(&self) -> Option<f64> {
        percent_ratio(self.used_percent.as_ref())
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, rename_all = "PascalCase")]
pub struct NetworkInterface {
    pub name: Option<Scalar>,
    pub status: Option<Scalar>,
    #[serde(rename = "IPv4")]
    pub ipv4: Option<Scalar>,
    #[serde(rename = "MAC")]
    pub mac: Option<Scalar>,
    pub vendor: Option<Scalar>,
}

impl NetworkInterface {
    pub fn is_up(&self) -> bool {
        matches!(&self.status, Some(Scalar::Text(status)) if status == "Up")
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, rename_all = "PascalCase")]
pub struct InstalledSoftware {
    pub name: Option<Scalar>,
    pub version: Option<Scalar>,
    pub publisher: Option<Scalar>,
    pub install_date: Option<Scalar>,
    pub scope: Option<Scalar>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, rename_all = "PascalCase")]
pub struct MemoryInformation {
    #[serde(rename = "TotalMemoryGB")]
    pub total_memory_gb: Option<Scalar>,
    #[serde(deserialize_with = "one_or_many")]
    pub modules: Vec<MemoryModule>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, rename_all = "PascalCase")]
pub struct MemoryModule {
    pub manufacturer: Option<Scalar>,
    #[serde(rename = "CapacityGB")]
    pub capacity_gb: Option<Scalar>,
    #[serde(rename = "RAMType")]
    pub ram_type: Option<Scalar>,
    #[serde(rename = "SpeedMHz")]
    pub speed_mhz: Option<Scalar>,
    pub part_number: Option<Scalar>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, rename_all = "PascalCase")]
pub struct BatteryInformation {
    pub model: Option<Scalar>,
    pub current_state: Option<Scalar>,
    pub battery_health_percent: Option<Scalar>,
    pub estimated_charge_remaining_percent: Option<Scalar>,
    pub designed_capacity_wh: Option<Scalar>,
    pub full_charged_capacity_wh: Option<Scalar>,
    pub cycle_count: Option<Scalar>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BatteryHealth {
    Good,
    Fair,
    Poor,
}

impl BatteryInformation {
    pub fn health(&self) -> Option<BatteryHealth> {
        let percent = self.battery_health_percent.as_ref()?.as_f64()?;
        Some(if percent >= 80.0 {
            BatteryHealth::Good
        } else if percent >= 60.0 {
            BatteryHealth::Fair
        } else {
            BatteryHealth::Poor
        })
    }

    pub fn health_ratio(&self) -> Option<f64> {
        percent_ratio(self.battery_health_percent.as_ref())
    }

    pub fn charge_ratio(&self) -> Option<f64> {
        percent_ratio(self.estimated_charge_remaining_percent.as_ref())
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, rename_all = "PascalCase")]
pub struct MonitorInformation {
    pub manufacturer: Option<Scalar>,
    pub friendly_name: Option<Scalar>,
    pub screen_size_inch: Option<Scalar>,
    pub native_resolution: Option<Scalar>,
    pub year_of_manufacture: Option<Scalar>,
    pub serial_number: Option<Scalar>,
}

/// A leaf value from the report. Collectors are not consistent about quoting numbers, so
/// leaves keep whatever JSON scalar they arrived as.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(number) => number.as_f64(),
            Self::Text(text) => text.trim().parse::<f64>().ok(),
            Self::Bool(_) => None,
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, Self::Text(text) if text.trim().is_empty())
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

pub fn display_or_na(value: Option<&Scalar>) -> String {
    match value {
        Some(scalar) if !scalar.is_blank() => scalar.to_string(),
        _ => "N/A".to_string(),
    }
}

pub fn join_scalars(values: &[Scalar]) -> String {
    if values.is_empty() {
        return "N/A".to_string();
    }
    values
        .iter()
        .map(Scalar::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn percent_ratio(value: Option<&Scalar>) -> Option<f64> {
    let percent = value?.as_f64()?;
    Some((percent / 100.0).clamp(0.0, 1.0))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts `[..]`, a lone object/value, or `null`. PowerShell's JSON export collapses
/// single-element arrays, so all three shapes show up in practice.
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::Many(values)) => values,
        Some(OneOrMany::One(value)) => vec![value],
    })
}
