use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::data::resolve::nfc;

/// Default growth workbook name inside the data directory.
pub const DEFAULT_GROWTH_FILE: &str = "4개교_생육결과데이터.xlsx";
/// Token stripped from environment file stems to obtain the group name.
pub const DEFAULT_ENV_SUFFIX: &str = "_환경데이터";

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "ec-dashboard", version, about = "Polar-plant EC concentration study dashboard")]
pub struct Cli {
    /// Directory holding the environment CSVs and the growth workbook.
    #[arg(long, env = "EC_DASHBOARD_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// JSON file overriding file names and the group → EC mapping.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the summaries and exit instead of opening the window.
    #[arg(long)]
    pub report: bool,
}

// ---------------------------------------------------------------------------
// Group → target EC mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTarget {
    pub name: String,
    pub ec: f64,
}

/// Ordered mapping from group name to its target EC concentration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<GroupTarget>", into = "Vec<GroupTarget>")]
pub struct EcMapping {
    groups: Vec<GroupTarget>,
}

impl EcMapping {
    /// Build a mapping; names are NFC-normalized and the first entry of a
    /// duplicated name wins.
    pub fn new(groups: impl IntoIterator<Item = GroupTarget>) -> Self {
        let mut unique: Vec<GroupTarget> = Vec::new();
        for GroupTarget { name, ec } in groups {
            let name = nfc(&name);
            if unique.iter().any(|g| g.name == name) {
                log::warn!("EC mapping lists '{name}' more than once; keeping the first entry");
                continue;
            }
            unique.push(GroupTarget { name, ec });
        }
        EcMapping { groups: unique }
    }

    pub fn target_ec(&self, group: &str) -> Option<f64> {
        self.groups.iter().find(|g| g.name == group).map(|g| g.ec)
    }

    pub fn contains(&self, group: &str) -> bool {
        self.target_ec(group).is_some()
    }

    /// Groups in configured order.
    pub fn iter(&self) -> impl Iterator<Item = &GroupTarget> {
        self.groups.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl Default for EcMapping {
    fn default() -> Self {
        EcMapping::new([
            GroupTarget { name: "송도고".into(), ec: 1.0 },
            GroupTarget { name: "하늘고".into(), ec: 2.0 },
            GroupTarget { name: "아라고".into(), ec: 4.0 },
            GroupTarget { name: "동산고".into(), ec: 8.0 },
        ])
    }
}

impl From<Vec<GroupTarget>> for EcMapping {
    fn from(groups: Vec<GroupTarget>) -> Self {
        EcMapping::new(groups)
    }
}

impl From<EcMapping> for Vec<GroupTarget> {
    fn from(mapping: EcMapping) -> Self {
        mapping.groups
    }
}

// ---------------------------------------------------------------------------
// Config file
// ---------------------------------------------------------------------------

/// Optional JSON overrides; every field falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    pub growth_file: String,
    pub env_suffix: String,
    pub groups: EcMapping,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            growth_file: DEFAULT_GROWTH_FILE.to_string(),
            env_suffix: DEFAULT_ENV_SUFFIX.to_string(),
            groups: EcMapping::default(),
        }
    }
}

impl FileSettings {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Everything the loaders and the aggregation need, passed explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub data_dir: PathBuf,
    pub growth_file: String,
    pub env_suffix: String,
    pub groups: EcMapping,
}

impl DashboardConfig {
    pub fn new(data_dir: impl Into<PathBuf>, settings: FileSettings) -> Self {
        Self {
            data_dir: data_dir.into(),
            growth_file: settings.growth_file,
            env_suffix: nfc(&settings.env_suffix),
            groups: settings.groups,
        }
    }

    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let settings = match &cli.config {
            Some(path) => FileSettings::from_file(path)?,
            None => FileSettings::default(),
        };
        Ok(Self::new(&cli.data_dir, settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mapping_has_four_schools() {
        let mapping = EcMapping::default();
        assert_eq!(mapping.len(), 4);
        assert_eq!(mapping.target_ec("하늘고"), Some(2.0));
        assert_eq!(mapping.target_ec("동산고"), Some(8.0));
        assert_eq!(mapping.target_ec("서울고"), None);
        assert_eq!(
            mapping.names().collect::<Vec<_>>(),
            ["송도고", "하늘고", "아라고", "동산고"]
        );
    }

    #[test]
    fn partial_config_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        std::fs::write(
            &path,
            r#"{ "groups": [ { "name": "A", "ec": 0.5 }, { "name": "A", "ec": 9.0 } ] }"#,
        )
        .unwrap();

        let settings = FileSettings::from_file(&path).unwrap();
        assert_eq!(settings.growth_file, DEFAULT_GROWTH_FILE);
        assert_eq!(settings.env_suffix, DEFAULT_ENV_SUFFIX);
        assert_eq!(settings.groups.len(), 1);
        assert_eq!(settings.groups.target_ec("A"), Some(0.5));
    }

    #[test]
    fn malformed_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        std::fs::write(&path, "{ groups: ").unwrap();
        assert!(FileSettings::from_file(&path).is_err());
    }

    #[test]
    fn cli_defaults_to_data_directory() {
        let cli = Cli::parse_from(["ec-dashboard"]);
        let config = DashboardConfig::from_cli(&cli).unwrap();
        assert_eq!(config.growth_file, DEFAULT_GROWTH_FILE);
        assert!(!cli.report);
    }
}
