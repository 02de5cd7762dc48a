//! Column-name constants for the two table kinds.
//! Single source of truth - loaders validate against these, exports write them.

use std::str::FromStr;

use super::error::{LoadError, UnknownColumn};

// ── Environment time-series columns ─────────────────────────────────────────
pub mod environment {
    pub const TIME: &str = "time";
    pub const TEMPERATURE: &str = "temperature";
    pub const HUMIDITY: &str = "humidity";
    pub const PH: &str = "ph";
    pub const EC: &str = "ec";

    pub const REQUIRED: [&str; 5] = [TEMPERATURE, HUMIDITY, PH, EC, TIME];
}

// ── Growth result columns ───────────────────────────────────────────────────
pub mod growth {
    pub const FRESH_WEIGHT: &str = "생중량(g)";
    pub const LEAF_COUNT: &str = "잎 수(장)";
    pub const SHOOT_LENGTH: &str = "지상부 길이(mm)";

    pub const REQUIRED: [&str; 3] = [FRESH_WEIGHT, LEAF_COUNT, SHOOT_LENGTH];
}

// ── Combined-table columns (exports, parquet container) ─────────────────────
pub mod combined {
    pub const GROUP: &str = "학교";
}

/// Numeric columns of an environment table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvColumn {
    Temperature,
    Humidity,
    Ph,
    Ec,
}

impl EnvColumn {
    pub const ALL: [EnvColumn; 4] = [
        EnvColumn::Temperature,
        EnvColumn::Humidity,
        EnvColumn::Ph,
        EnvColumn::Ec,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EnvColumn::Temperature => environment::TEMPERATURE,
            EnvColumn::Humidity => environment::HUMIDITY,
            EnvColumn::Ph => environment::PH,
            EnvColumn::Ec => environment::EC,
        }
    }
}

/// Numeric columns of a growth table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthColumn {
    FreshWeight,
    LeafCount,
    ShootLength,
}

impl GrowthColumn {
    pub const ALL: [GrowthColumn; 3] = [
        GrowthColumn::FreshWeight,
        GrowthColumn::LeafCount,
        GrowthColumn::ShootLength,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GrowthColumn::FreshWeight => growth::FRESH_WEIGHT,
            GrowthColumn::LeafCount => growth::LEAF_COUNT,
            GrowthColumn::ShootLength => growth::SHOOT_LENGTH,
        }
    }
}

impl FromStr for EnvColumn {
    type Err = UnknownColumn;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EnvColumn::ALL
            .into_iter()
            .find(|c| c.name() == s.trim())
            .ok_or_else(|| UnknownColumn(s.to_string()))
    }
}

impl FromStr for GrowthColumn {
    type Err = UnknownColumn;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GrowthColumn::ALL
            .into_iter()
            .find(|c| c.name() == s.trim())
            .ok_or_else(|| UnknownColumn(s.to_string()))
    }
}

/// Normalize a raw header cell: trim whitespace and a leading byte-order mark.
pub fn clean_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_string()
}

/// Locate every required column in `headers`, in the order of `required`.
///
/// The first absent column is reported as [`LoadError::MissingColumn`].
pub fn locate_columns<const N: usize>(
    headers: &[String],
    required: &[&str; N],
    table: &str,
) -> Result<[usize; N], LoadError> {
    let mut positions = [0usize; N];
    for (slot, name) in positions.iter_mut().zip(required.iter()) {
        *slot = headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| LoadError::MissingColumn {
                table: table.to_string(),
                column: name.to_string(),
            })?;
    }
    Ok(positions)
}
