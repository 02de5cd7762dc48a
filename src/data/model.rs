use std::collections::BTreeMap;
use std::path::PathBuf;

use super::error::LoadFailure;
use super::schema::{EnvColumn, GrowthColumn};

// ---------------------------------------------------------------------------
// Record – one row of a table
// ---------------------------------------------------------------------------

/// A row type whose numeric columns can be addressed by a typed column key.
pub trait Record {
    type Column: Copy;

    /// The value of `column`, or `None` when the cell was empty.
    fn value(&self, column: Self::Column) -> Option<f64>;
}

/// One timestamped environment sample.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentRecord {
    /// Timestamp exactly as recorded in the source file.
    pub time: String,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub ph: Option<f64>,
    pub ec: Option<f64>,
}

impl Record for EnvironmentRecord {
    type Column = EnvColumn;

    fn value(&self, column: EnvColumn) -> Option<f64> {
        match column {
            EnvColumn::Temperature => self.temperature,
            EnvColumn::Humidity => self.humidity,
            EnvColumn::Ph => self.ph,
            EnvColumn::Ec => self.ec,
        }
    }
}

/// One measured specimen.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthRecord {
    /// Grams.
    pub fresh_weight: Option<f64>,
    pub leaf_count: Option<f64>,
    /// Millimetres.
    pub shoot_length: Option<f64>,
}

impl Record for GrowthRecord {
    type Column = GrowthColumn;

    fn value(&self, column: GrowthColumn) -> Option<f64> {
        match column {
            GrowthColumn::FreshWeight => self.fresh_weight,
            GrowthColumn::LeafCount => self.leaf_count,
            GrowthColumn::ShootLength => self.shoot_length,
        }
    }
}

// ---------------------------------------------------------------------------
// Table – all records of one group
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Table<R> {
    /// Group (school) name, NFC-normalized.
    pub group: String,
    /// File the records were read from.
    pub source: PathBuf,
    pub records: Vec<R>,
}

impl<R: Record> Table<R> {
    /// All values of `column`, missing cells included as `None`.
    pub fn column(&self, column: R::Column) -> impl Iterator<Item = Option<f64>> + '_ {
        self.records.iter().map(move |r| r.value(column))
    }
}

impl<R> Table<R> {
    /// Number of records (rows).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Tables keyed by group name.
pub type Tables<R> = BTreeMap<String, Table<R>>;
pub type EnvironmentTables = Tables<EnvironmentRecord>;
pub type GrowthTables = Tables<GrowthRecord>;

// ---------------------------------------------------------------------------
// Snapshot – the complete loaded dataset
// ---------------------------------------------------------------------------

/// Everything loaded from the data directory. Immutable once built.
#[derive(Debug)]
pub struct Snapshot {
    pub environment: EnvironmentTables,
    pub growth: GrowthTables,
    /// Files or sheets that were skipped, in load order.
    pub failures: Vec<LoadFailure>,
}

impl Snapshot {
    /// Total number of growth specimens across all groups.
    pub fn specimen_count(&self) -> usize {
        self.growth.values().map(Table::len).sum()
    }
}
