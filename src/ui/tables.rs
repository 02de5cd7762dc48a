use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};

use super::fmt_opt;
use crate::data::aggregate::{EnvironmentSummary, GrowthSummary, OverviewRow};

/// Striped read-only table of preformatted cells.
fn text_table(ui: &mut Ui, id: &str, header: &[&str], rows: &[Vec<String>]) {
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .columns(Column::auto().at_least(90.0), header.len())
            .header(22.0, |mut row| {
                for title in header {
                    row.col(|ui| {
                        ui.strong(*title);
                    });
                }
            })
            .body(|mut body| {
                for cells in rows {
                    body.row(20.0, |mut row| {
                        for cell in cells {
                            row.col(|ui| {
                                ui.label(cell.as_str());
                            });
                        }
                    });
                }
            });
    });
}

pub fn overview_table(ui: &mut Ui, rows: &[OverviewRow]) {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|r| vec![r.group.clone(), format!("{:.1}", r.target_ec), r.specimens.to_string()])
        .collect();
    text_table(ui, "overview_table", &["학교", "EC 목표", "개체수"], &cells);
}

pub fn environment_table(ui: &mut Ui, rows: &[EnvironmentSummary]) {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.group.clone(),
                fmt_opt(r.temperature, 2),
                fmt_opt(r.humidity, 2),
                fmt_opt(r.ph, 2),
                fmt_opt(r.ec, 2),
                format!("{:.1}", r.target_ec),
                r.samples.to_string(),
            ]
        })
        .collect();
    text_table(
        ui,
        "environment_table",
        &["학교", "온도", "습도", "pH", "실측 EC", "목표 EC", "측정수"],
        &cells,
    );
}

pub fn growth_table(ui: &mut Ui, rows: &[GrowthSummary]) {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.group.clone(),
                format!("{:.1}", r.target_ec),
                fmt_opt(r.fresh_weight, 2),
                fmt_opt(r.leaf_count, 2),
                fmt_opt(r.shoot_length, 2),
                r.specimens.to_string(),
            ]
        })
        .collect();
    text_table(
        ui,
        "growth_table",
        &["학교", "EC", "평균 생중량", "평균 잎 수", "평균 지상부 길이", "개체수"],
        &cells,
    );
}
