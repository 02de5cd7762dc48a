//! Builders for test tables and on-disk sample files.

use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;

use super::model::{EnvironmentRecord, GrowthRecord, Table};
use super::schema::{environment, growth};

/// Environment table from `[temperature, humidity, ph, ec]` rows.
pub fn env_table(group: &str, rows: &[[Option<f64>; 4]]) -> Table<EnvironmentRecord> {
    Table {
        group: group.to_string(),
        source: PathBuf::from(format!("{group}.csv")),
        records: rows
            .iter()
            .enumerate()
            .map(|(i, [t, h, ph, ec])| EnvironmentRecord {
                time: format!("2025-05-01 {:02}:00", i % 24),
                temperature: *t,
                humidity: *h,
                ph: *ph,
                ec: *ec,
            })
            .collect(),
    }
}

/// Growth table from `[fresh_weight, leaf_count, shoot_length]` rows.
pub fn growth_table(group: &str, rows: &[[f64; 3]]) -> Table<GrowthRecord> {
    Table {
        group: group.to_string(),
        source: PathBuf::from("growth.xlsx"),
        records: rows
            .iter()
            .map(|[w, l, s]| GrowthRecord {
                fresh_weight: Some(*w),
                leaf_count: Some(*l),
                shoot_length: Some(*s),
            })
            .collect(),
    }
}

/// Write an environment CSV with `(temperature, humidity, ph, ec)` rows.
pub fn write_env_csv(dir: &Path, name: &str, rows: &[(f64, f64, f64, f64)]) -> PathBuf {
    let mut text = format!(
        "{},{},{},{},{}\n",
        environment::TIME,
        environment::TEMPERATURE,
        environment::HUMIDITY,
        environment::PH,
        environment::EC
    );
    for (i, (t, h, ph, ec)) in rows.iter().enumerate() {
        text.push_str(&format!("2025-05-01 {:02}:00,{t},{h},{ph},{ec}\n", i % 24));
    }
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

/// Write a workbook with one sheet per `(name, rows)` using the growth header
/// plus a leading specimen-number column.
pub fn write_growth_workbook(path: &Path, sheets: &[(&str, Vec<[f64; 3]>)]) {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name).unwrap();
        sheet.write_string(0, 0, "개체번호").unwrap();
        for (col, header) in growth::REQUIRED.iter().enumerate() {
            sheet.write_string(0, col as u16 + 1, *header).unwrap();
        }
        for (row, values) in rows.iter().enumerate() {
            let row = row as u32 + 1;
            sheet.write_number(row, 0, row as f64).unwrap();
            for (col, value) in values.iter().enumerate() {
                sheet.write_number(row, col as u16 + 1, *value).unwrap();
            }
        }
    }
    workbook.save(path).unwrap();
}
