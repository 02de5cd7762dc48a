use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use calamine::{open_workbook_auto, Data, Range, Reader};
use log::{info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::error::{DatasetKind, LoadError, LoadFailure};
use super::model::{
    EnvironmentRecord, EnvironmentTables, GrowthRecord, GrowthTables, Snapshot, Table,
};
use super::resolve::{find_file, nfc, sorted_entries};
use super::schema::{clean_header, combined, environment, growth, locate_columns};
use crate::config::DashboardConfig;

/// Tables that loaded plus the files or sheets that did not.
#[derive(Debug)]
pub struct Loaded<T> {
    pub tables: T,
    pub failures: Vec<LoadFailure>,
}

pub type EnvironmentLoad = Loaded<EnvironmentTables>;
pub type GrowthLoad = Loaded<GrowthTables>;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load everything the dashboard needs from `config.data_dir`.
///
/// Individual bad environment files or growth sheets are skipped and kept in
/// [`Snapshot::failures`]. A missing or unreadable growth file, or an empty
/// side of the dataset, is fatal.
pub fn load_snapshot(config: &DashboardConfig) -> Result<Snapshot, LoadError> {
    let dir = &config.data_dir;

    let env = load_environment_dir(dir, &config.env_suffix)?;
    if env.tables.is_empty() {
        return Err(LoadError::EmptyDataset(DatasetKind::Environment));
    }

    let growth_path = find_file(dir, &config.growth_file)
        .map_err(|e| LoadError::io(dir, e))?
        .ok_or_else(|| LoadError::MissingFile {
            dir: dir.clone(),
            name: config.growth_file.clone(),
        })?;
    let growth = load_growth_file(&growth_path)?;
    if growth.tables.is_empty() {
        return Err(LoadError::EmptyDataset(DatasetKind::Growth));
    }

    info!(
        "Loaded {} environment tables and {} growth tables from {}",
        env.tables.len(),
        growth.tables.len(),
        dir.display()
    );

    let mut failures = env.failures;
    failures.extend(growth.failures);
    Ok(Snapshot {
        environment: env.tables,
        growth: growth.tables,
        failures,
    })
}

// ---------------------------------------------------------------------------
// Environment CSV loader
// ---------------------------------------------------------------------------

/// Field delimiter for a delimited-text file, or `None` if `path` is not one.
pub fn tabular_delimiter(path: &Path) -> Option<u8> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => Some(b','),
        "tsv" => Some(b'\t'),
        _ => None,
    }
}

/// Group name for an environment file: NFC stem with `suffix` removed.
/// Stems without the suffix are used whole.
pub fn group_key(path: &Path, suffix: &str) -> Option<String> {
    let stem = nfc(&path.file_stem()?.to_string_lossy());
    Some(match stem.strip_suffix(suffix) {
        Some(group) if !group.is_empty() => group.to_string(),
        _ => stem,
    })
}

/// Load every delimited-text file in `dir` as one group's environment table.
///
/// Files are visited in name order; if two files map to the same group the
/// later one wins. A file that fails to parse is reported and skipped.
pub fn load_environment_dir(dir: &Path, suffix: &str) -> Result<EnvironmentLoad, LoadError> {
    let entries = sorted_entries(dir).map_err(|e| LoadError::io(dir, e))?;

    let mut tables = EnvironmentTables::new();
    let mut failures = Vec::new();

    for path in entries {
        let Some(delimiter) = tabular_delimiter(&path) else {
            continue;
        };
        if !path.is_file() {
            continue;
        }
        let Some(group) = group_key(&path, suffix) else {
            continue;
        };

        match load_environment_file(&path, delimiter, &group) {
            Ok(records) => {
                info!("{group}: {} environment samples from {}", records.len(), path.display());
                let table = Table {
                    group: group.clone(),
                    source: path.clone(),
                    records,
                };
                if let Some(previous) = tables.insert(group.clone(), table) {
                    warn!(
                        "{group}: {} replaces {}",
                        path.display(),
                        previous.source.display()
                    );
                }
            }
            Err(error) => {
                warn!("Skipping environment file {}: {error}", path.display());
                failures.push(LoadFailure {
                    source: path,
                    error,
                });
            }
        }
    }

    Ok(Loaded { tables, failures })
}

fn load_environment_file(
    path: &Path,
    delimiter: u8,
    table: &str,
) -> Result<Vec<EnvironmentRecord>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .map_err(|e| LoadError::parse(table, e))?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| LoadError::parse(table, e))?
        .iter()
        .map(clean_header)
        .collect();

    let [t_idx, h_idx, ph_idx, ec_idx, time_idx] =
        locate_columns(&headers, &environment::REQUIRED, table)?;

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let line = row_no + 2;
        let record = result.map_err(|e| LoadError::parse(table, format!("row {line}: {e}")))?;
        let number = |idx: usize| {
            parse_number(record.get(idx).unwrap_or("")).map_err(|reason| {
                LoadError::parse(table, format!("row {line}, column '{}': {reason}", headers[idx]))
            })
        };

        records.push(EnvironmentRecord {
            time: record.get(time_idx).unwrap_or("").trim().to_string(),
            temperature: number(t_idx)?,
            humidity: number(h_idx)?,
            ph: number(ph_idx)?,
            ec: number(ec_idx)?,
        });
    }

    Ok(records)
}

/// Parse a text cell. Empty and `NaN`/`NA` cells are missing values.
fn parse_number(s: &str) -> Result<Option<f64>, String> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("na") {
        return Ok(None);
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        Ok(_) => Ok(None),
        Err(_) => Err(format!("'{s}' is not a number")),
    }
}

// ---------------------------------------------------------------------------
// Growth loader
// ---------------------------------------------------------------------------

/// Load the growth container. Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` – one sheet per group
/// * `.parquet` – combined table with a `학교` group column
///
/// The container as a whole must be readable and yield at least one group;
/// otherwise the result is [`LoadError::GrowthUnreadable`].
pub fn load_growth_file(path: &Path) -> Result<GrowthLoad, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let loaded = match ext.as_str() {
        "parquet" | "pq" => read_growth_parquet(path)
            .map(|tables| Loaded {
                tables,
                failures: Vec::new(),
            })
            .map_err(|e| unreadable(path, format!("{e:#}")))?,
        _ => load_workbook(path)?,
    };

    if loaded.tables.is_empty() {
        let reason = match loaded.failures.first() {
            Some(first) => format!("no readable sheet ({})", first.error),
            None => "no sheets".to_string(),
        };
        return Err(unreadable(path, reason));
    }
    Ok(loaded)
}

fn unreadable(path: &Path, reason: impl Into<String>) -> LoadError {
    LoadError::GrowthUnreadable {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn load_workbook(path: &Path) -> Result<GrowthLoad, LoadError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| unreadable(path, e.to_string()))?;

    let mut tables = GrowthTables::new();
    let mut failures = Vec::new();

    for sheet in workbook.sheet_names() {
        let group = nfc(&sheet);
        let parsed = workbook
            .worksheet_range(&sheet)
            .map_err(|e| LoadError::parse(group.as_str(), e))
            .and_then(|range| parse_growth_sheet(&range, &group));

        match parsed {
            Ok(records) => {
                info!("{group}: {} growth records", records.len());
                let table = Table {
                    group: group.clone(),
                    source: sheet_source(path, &sheet),
                    records,
                };
                if let Some(previous) = tables.insert(group.clone(), table) {
                    warn!(
                        "{group}: sheet '{sheet}' replaces {}",
                        previous.source.display()
                    );
                }
            }
            Err(error) => {
                warn!("Skipping growth sheet '{sheet}': {error}");
                failures.push(LoadFailure {
                    source: sheet_source(path, &sheet),
                    error,
                });
            }
        }
    }

    Ok(Loaded { tables, failures })
}

/// `<workbook>#<sheet>` for failure reports.
fn sheet_source(path: &Path, sheet: &str) -> PathBuf {
    let mut source = path.as_os_str().to_owned();
    source.push("#");
    source.push(sheet);
    PathBuf::from(source)
}

fn parse_growth_sheet(range: &Range<Data>, table: &str) -> Result<Vec<GrowthRecord>, LoadError> {
    let mut rows = range.rows();
    let header_row = rows
        .next()
        .ok_or_else(|| LoadError::parse(table, "sheet is empty"))?;
    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| clean_header(&cell.to_string()))
        .collect();

    let [fw_idx, lc_idx, sl_idx] = locate_columns(&headers, &growth::REQUIRED, table)?;

    let mut records = Vec::new();
    for (row_no, row) in rows.enumerate() {
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }
        let line = row_no + 2;
        let number = |idx: usize| {
            row.get(idx).map_or(Ok(None), cell_number).map_err(|reason| {
                LoadError::parse(table, format!("row {line}, column '{}': {reason}", headers[idx]))
            })
        };

        records.push(GrowthRecord {
            fresh_weight: number(fw_idx)?,
            leaf_count: number(lc_idx)?,
            shoot_length: number(sl_idx)?,
        });
    }

    Ok(records)
}

fn cell_number(cell: &Data) -> Result<Option<f64>, String> {
    match cell {
        Data::Empty | Data::Error(_) => Ok(None),
        Data::Int(i) => Ok(Some(*i as f64)),
        Data::Float(f) if f.is_finite() => Ok(Some(*f)),
        Data::Float(_) => Ok(None),
        Data::String(s) => parse_number(s),
        other => Err(format!("'{other}' is not a number")),
    }
}

// ---------------------------------------------------------------------------
// Parquet growth container
// ---------------------------------------------------------------------------

/// Expected schema:
/// - `학교`: Utf8 / LargeUtf8 – group name
/// - `생중량(g)`, `잎 수(장)`, `지상부 길이(mm)`: Float64 / Float32 / Int64 / Int32
///
/// Other columns are ignored. Rows are split into one table per group.
fn read_growth_parquet(path: &Path) -> Result<GrowthTables> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut grouped: BTreeMap<String, Vec<GrowthRecord>> = BTreeMap::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let column = |name: &str| {
            schema
                .index_of(name)
                .map(|idx| batch.column(idx))
                .map_err(|_| anyhow::anyhow!("missing required column '{name}'"))
        };
        let group_col = column(combined::GROUP)?;
        let fw_col = column(growth::FRESH_WEIGHT)?;
        let lc_col = column(growth::LEAF_COUNT)?;
        let sl_col = column(growth::SHOOT_LENGTH)?;

        for row in 0..batch.num_rows() {
            let group = extract_string(group_col, row)
                .with_context(|| format!("Row {row}: failed to read '{}'", combined::GROUP))?;
            let number = |col: &Arc<dyn Array>, name: &str| {
                extract_f64(col, row).with_context(|| format!("Row {row}: failed to read '{name}'"))
            };

            grouped.entry(nfc(&group)).or_default().push(GrowthRecord {
                fresh_weight: number(fw_col, growth::FRESH_WEIGHT)?,
                leaf_count: number(lc_col, growth::LEAF_COUNT)?,
                shoot_length: number(sl_col, growth::SHOOT_LENGTH)?,
            });
        }
    }

    Ok(grouped
        .into_iter()
        .map(|(group, records)| {
            let table = Table {
                group: group.clone(),
                source: path.to_path_buf(),
                records,
            };
            (group, table)
        })
        .collect())
}

// -- Parquet / Arrow helpers --

fn extract_string(col: &Arc<dyn Array>, row: usize) -> Result<String> {
    if col.is_null(row) {
        bail!("null group name");
    }
    match col.data_type() {
        DataType::Utf8 => Ok(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(row).to_string()),
        other => bail!("Expected Utf8 column, got {other:?}"),
    }
}

fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Result<Option<f64>> {
    if col.is_null(row) {
        return Ok(None);
    }
    let value = match col.data_type() {
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .context("expected Float64Array")?
            .value(row),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .context("expected Float32Array")?
            .value(row) as f64,
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .context("expected Int64Array")?
            .value(row) as f64,
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .context("expected Int32Array")?
            .value(row) as f64,
        DataType::Utf8 => {
            let text = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?
                .value(row);
            return parse_number(text).map_err(anyhow::Error::msg);
        }
        other => bail!("Expected a numeric column, got {other:?}"),
    };
    Ok(value.is_finite().then_some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileSettings;
    use crate::data::fixtures::{write_env_csv, write_growth_workbook};
    use unicode_normalization::UnicodeNormalization;

    const SUFFIX: &str = "_환경데이터";

    #[test]
    fn empty_directory_gives_empty_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_environment_dir(dir.path(), SUFFIX).unwrap();
        assert!(loaded.tables.is_empty());
        assert!(loaded.failures.is_empty());
    }

    #[test]
    fn strips_suffix_and_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        write_env_csv(dir.path(), "송도고_환경데이터.csv", &[(20.0, 50.0, 6.0, 1.0)]);
        write_env_csv(dir.path(), "하늘고_환경데이터.CSV", &[(21.0, 51.0, 6.1, 2.0)]);
        write_env_csv(dir.path(), "plain.csv", &[(22.0, 52.0, 6.2, 3.0)]);
        std::fs::write(dir.path().join("notes.txt"), "temperature").unwrap();

        let loaded = load_environment_dir(dir.path(), SUFFIX).unwrap();
        let keys: Vec<&str> = loaded.tables.keys().map(String::as_str).collect();
        assert_eq!(keys, ["plain", "송도고", "하늘고"]);
        assert_eq!(loaded.tables["하늘고"].records[0].ec, Some(2.0));
    }

    #[test]
    fn nfd_file_names_give_nfc_group_keys() {
        let dir = tempfile::tempdir().unwrap();
        let name: String = "아라고_환경데이터.csv".nfd().collect();
        write_env_csv(dir.path(), &name, &[(20.0, 50.0, 6.0, 4.0)]);

        let loaded = load_environment_dir(dir.path(), SUFFIX).unwrap();
        assert!(loaded.tables.contains_key("아라고"));
    }

    #[test]
    fn bad_files_are_reported_and_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_env_csv(dir.path(), "A_환경데이터.csv", &[(20.0, 50.0, 6.0, 1.0)]);
        std::fs::write(
            dir.path().join("B_환경데이터.csv"),
            "time,temperature,humidity,ec\n2025-05-01,20,50,1\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("C_환경데이터.csv"),
            "time,temperature,humidity,ph,ec\n2025-05-01,warm,50,6,1\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("D_환경데이터.csv"),
            "time,temperature,humidity,ph,ec\n2025-05-01,20,50\n",
        )
        .unwrap();

        let loaded = load_environment_dir(dir.path(), SUFFIX).unwrap();
        assert_eq!(loaded.tables.keys().collect::<Vec<_>>(), ["A"]);
        assert_eq!(loaded.failures.len(), 3);
        assert!(matches!(
            &loaded.failures[0].error,
            LoadError::MissingColumn { column, .. } if column == "ph"
        ));
        assert!(matches!(&loaded.failures[1].error, LoadError::Parse { .. }));
        assert!(loaded.failures[1].to_string().contains("warm"));
    }

    #[test]
    fn empty_cells_and_bom_headers_are_accepted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("A_환경데이터.csv"),
            "\u{feff}time, temperature ,humidity,ph,ec\n2025-05-01 00:00,,50,NaN,1.5\n",
        )
        .unwrap();

        let loaded = load_environment_dir(dir.path(), SUFFIX).unwrap();
        let record = &loaded.tables["A"].records[0];
        assert_eq!(record.time, "2025-05-01 00:00");
        assert_eq!(record.temperature, None);
        assert_eq!(record.humidity, Some(50.0));
        assert_eq!(record.ph, None);
        assert_eq!(record.ec, Some(1.5));
    }

    #[test]
    fn duplicate_group_keys_keep_the_later_file() {
        let dir = tempfile::tempdir().unwrap();
        write_env_csv(dir.path(), "A_환경데이터.csv", &[(1.0, 1.0, 1.0, 1.0)]);
        std::fs::write(
            dir.path().join("A_환경데이터.tsv"),
            "time\ttemperature\thumidity\tph\tec\nt0\t9\t9\t9\t9\n",
        )
        .unwrap();

        let loaded = load_environment_dir(dir.path(), SUFFIX).unwrap();
        assert_eq!(loaded.tables.len(), 1);
        assert_eq!(loaded.tables["A"].records[0].temperature, Some(9.0));
    }

    #[test]
    fn workbook_sheets_become_groups() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("growth.xlsx");
        write_growth_workbook(
            &path,
            &[
                ("A", vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]),
                ("B", vec![[7.0, 8.0, 9.0]]),
            ],
        );

        let loaded = load_growth_file(&path).unwrap();
        assert_eq!(loaded.tables.keys().collect::<Vec<_>>(), ["A", "B"]);
        assert_eq!(loaded.tables["A"].len(), 2);
        assert_eq!(loaded.tables["B"].len(), 1);
        assert_eq!(loaded.tables["A"].records[1].leaf_count, Some(5.0));
        assert!(loaded.failures.is_empty());
    }

    #[test]
    fn sheets_with_the_same_nfc_name_keep_the_later_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("growth.xlsx");
        let decomposed: String = "하늘고".nfd().collect();
        write_growth_workbook(
            &path,
            &[
                (decomposed.as_str(), vec![[1.0, 2.0, 3.0]]),
                ("하늘고", vec![[7.0, 8.0, 9.0], [4.0, 5.0, 6.0]]),
            ],
        );

        let loaded = load_growth_file(&path).unwrap();
        assert_eq!(loaded.tables.len(), 1);
        let sky = &loaded.tables["하늘고"];
        assert_eq!(sky.len(), 2);
        assert_eq!(sky.records[0].fresh_weight, Some(7.0));
        assert_eq!(sky.source, sheet_source(&path, "하늘고"));
        assert!(loaded.failures.is_empty());
    }

    #[test]
    fn sheet_without_required_column_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("growth.xlsx");
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let good = workbook.add_worksheet();
        good.set_name("A").unwrap();
        for (col, header) in growth::REQUIRED.iter().enumerate() {
            good.write_string(0, col as u16, *header).unwrap();
            good.write_number(1, col as u16, 1.0).unwrap();
        }
        let bad = workbook.add_worksheet();
        bad.set_name("B").unwrap();
        bad.write_string(0, 0, growth::FRESH_WEIGHT).unwrap();
        bad.write_number(1, 0, 1.0).unwrap();
        workbook.save(&path).unwrap();

        let loaded = load_growth_file(&path).unwrap();
        assert_eq!(loaded.tables.keys().collect::<Vec<_>>(), ["A"]);
        assert_eq!(loaded.failures.len(), 1);
        assert!(matches!(
            &loaded.failures[0].error,
            LoadError::MissingColumn { table, .. } if table == "B"
        ));
    }

    #[test]
    fn unreadable_growth_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("growth.xlsx");
        std::fs::write(&path, b"not a workbook").unwrap();
        assert!(matches!(
            load_growth_file(&path),
            Err(LoadError::GrowthUnreadable { .. })
        ));
    }

    fn config(dir: &Path) -> DashboardConfig {
        DashboardConfig::new(dir, FileSettings::default())
    }

    #[test]
    fn snapshot_requires_growth_workbook() {
        let dir = tempfile::tempdir().unwrap();
        write_env_csv(dir.path(), "송도고_환경데이터.csv", &[(20.0, 50.0, 6.0, 1.0)]);

        match load_snapshot(&config(dir.path())) {
            Err(LoadError::MissingFile { name, .. }) => {
                assert_eq!(name, crate::config::DEFAULT_GROWTH_FILE)
            }
            other => panic!("expected MissingFile, got {other:?}"),
        }
    }

    #[test]
    fn snapshot_requires_environment_data() {
        let dir = tempfile::tempdir().unwrap();
        write_growth_workbook(
            &dir.path().join(crate::config::DEFAULT_GROWTH_FILE),
            &[("송도고", vec![[1.0, 2.0, 3.0]])],
        );
        assert!(matches!(
            load_snapshot(&config(dir.path())),
            Err(LoadError::EmptyDataset(DatasetKind::Environment))
        ));
    }

    #[test]
    fn snapshot_resolves_nfd_growth_file_name() {
        let dir = tempfile::tempdir().unwrap();
        write_env_csv(dir.path(), "송도고_환경데이터.csv", &[(20.0, 50.0, 6.0, 1.0)]);
        std::fs::write(dir.path().join("broken_환경데이터.csv"), "a,b\n1,2\n").unwrap();
        let nfd_name: String = crate::config::DEFAULT_GROWTH_FILE.nfd().collect();
        write_growth_workbook(
            &dir.path().join(nfd_name),
            &[("송도고", vec![[1.0, 2.0, 3.0]])],
        );

        let snapshot = load_snapshot(&config(dir.path())).unwrap();
        assert_eq!(snapshot.environment.len(), 1);
        assert_eq!(snapshot.specimen_count(), 1);
        assert_eq!(snapshot.failures.len(), 1);
    }
}
