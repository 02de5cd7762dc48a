//! Download copies of the loaded data. Source files are never touched.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use log::info;
use parquet::arrow::ArrowWriter;
use rust_xlsxwriter::{Workbook, Worksheet};

use super::aggregate::GrowthSummary;
use super::error::ExportError;
use super::model::{EnvironmentTables, GrowthTables};
use super::schema::{combined, environment, growth};

/// Spreadsheet tools detect UTF-8 CSV by this prefix.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Sheet name of the growth summary export.
pub const SUMMARY_SHEET: &str = "요약";
const SUMMARY_HEADER: [&str; 6] = [
    combined::GROUP,
    "EC",
    "평균 생중량",
    "평균 잎 수",
    "평균 지상부 길이",
    "개체수",
];

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Environment CSV
// ---------------------------------------------------------------------------

/// Write all environment tables as one CSV with a leading group column.
pub fn write_environment_csv<W: Write>(
    tables: &EnvironmentTables,
    mut out: W,
) -> Result<(), ExportError> {
    out.write_all(UTF8_BOM)?;
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record([
        combined::GROUP,
        environment::TIME,
        environment::TEMPERATURE,
        environment::HUMIDITY,
        environment::PH,
        environment::EC,
    ])?;

    for table in tables.values() {
        for r in &table.records {
            writer.write_record([
                table.group.clone(),
                r.time.clone(),
                cell(r.temperature),
                cell(r.humidity),
                cell(r.ph),
                cell(r.ec),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}

pub fn export_environment_csv(tables: &EnvironmentTables, path: &Path) -> Result<(), ExportError> {
    write_environment_csv(tables, BufWriter::new(File::create(path)?))?;
    info!("Exported environment data to {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Growth workbook
// ---------------------------------------------------------------------------

fn write_optional(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: Option<f64>,
) -> Result<(), ExportError> {
    if let Some(v) = value {
        sheet.write_number(row, col, v)?;
    }
    Ok(())
}

/// One sheet per group with the growth columns, loadable again as growth data.
///
/// Missing values become empty cells; a record with no values at all is an
/// empty row and is skipped when the workbook is read back.
pub fn export_growth_workbook(tables: &GrowthTables, path: &Path) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();

    for table in tables.values() {
        let sheet = workbook.add_worksheet();
        sheet.set_name(&table.group)?;
        for (col, header) in growth::REQUIRED.iter().enumerate() {
            sheet.write_string(0, col as u16, *header)?;
        }
        for (i, r) in table.records.iter().enumerate() {
            let row = i as u32 + 1;
            write_optional(sheet, row, 0, r.fresh_weight)?;
            write_optional(sheet, row, 1, r.leaf_count)?;
            write_optional(sheet, row, 2, r.shoot_length)?;
        }
    }

    workbook.save(path)?;
    info!("Exported growth workbook to {}", path.display());
    Ok(())
}

/// A single summary sheet, one row per group.
pub fn export_growth_summary_workbook(
    rows: &[GrowthSummary],
    path: &Path,
) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SUMMARY_SHEET)?;

    for (col, header) in SUMMARY_HEADER.iter().enumerate() {
        sheet.write_string(0, col as u16, *header)?;
    }
    for (i, s) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &s.group)?;
        sheet.write_number(row, 1, s.target_ec)?;
        write_optional(sheet, row, 2, s.fresh_weight)?;
        write_optional(sheet, row, 3, s.leaf_count)?;
        write_optional(sheet, row, 4, s.shoot_length)?;
        sheet.write_number(row, 5, s.specimens as f64)?;
    }

    workbook.save(path)?;
    info!("Exported growth summary to {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Growth Parquet
// ---------------------------------------------------------------------------

/// Combined growth table: `학교` plus the three growth columns (nullable).
pub fn export_growth_parquet(tables: &GrowthTables, path: &Path) -> Result<(), ExportError> {
    let records = tables
        .values()
        .flat_map(|t| t.records.iter().map(move |r| (t.group.as_str(), r)));

    let mut groups = Vec::new();
    let mut weights = Vec::new();
    let mut leaves = Vec::new();
    let mut lengths = Vec::new();
    for (group, r) in records {
        groups.push(group);
        weights.push(r.fresh_weight);
        leaves.push(r.leaf_count);
        lengths.push(r.shoot_length);
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new(combined::GROUP, DataType::Utf8, false),
        Field::new(growth::FRESH_WEIGHT, DataType::Float64, true),
        Field::new(growth::LEAF_COUNT, DataType::Float64, true),
        Field::new(growth::SHOOT_LENGTH, DataType::Float64, true),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(groups)),
        Arc::new(Float64Array::from(weights)),
        Arc::new(Float64Array::from(leaves)),
        Arc::new(Float64Array::from(lengths)),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns)?;

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    info!("Exported growth parquet to {}", path.display());
    Ok(())
}
