use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which side of the dashboard a dataset belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Environment,
    Growth,
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetKind::Environment => write!(f, "environment"),
            DatasetKind::Growth => write!(f, "growth"),
        }
    }
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("'{name}' not found in {}", dir.display())]
    MissingFile { dir: PathBuf, name: String },

    #[error("{table}: missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("{table}: {reason}")]
    Parse { table: String, reason: String },

    #[error("growth data {} is unreadable: {reason}", path.display())]
    GrowthUnreadable { path: PathBuf, reason: String },

    #[error("no {0} data could be loaded")]
    EmptyDataset(DatasetKind),

    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    pub(crate) fn parse(table: impl Into<String>, reason: impl fmt::Display) -> Self {
        LoadError::Parse {
            table: table.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoadError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A single table (file or sheet) that was skipped during loading.
#[derive(Debug)]
pub struct LoadFailure {
    pub source: PathBuf,
    pub error: LoadError,
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source.display(), self.error)
    }
}

/// Returned when a column name matches no known column of the table kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown column '{0}'")]
pub struct UnknownColumn(pub String);

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}
