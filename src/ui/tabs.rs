use eframe::egui::{RichText, Ui};

use super::plot::{ec_comparison, environment_series, group_bars, GroupBar};
use super::tables::{environment_table, growth_table, overview_table};
use super::fmt_opt;
use crate::data::aggregate::{EnvironmentSummary, GrowthSummary};
use crate::state::AppState;

/// A headline number with a caption above it.
fn metric(ui: &mut Ui, caption: &str, value: String) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(caption).small());
        ui.label(RichText::new(value).heading());
    });
}

/// Environment bars sit at consecutive positions in mapping order.
fn env_bars(
    rows: &[EnvironmentSummary],
    value: fn(&EnvironmentSummary) -> Option<f64>,
) -> Vec<GroupBar<'_>> {
    rows.iter()
        .enumerate()
        .map(|(i, r)| GroupBar {
            x: i as f64,
            group: &r.group,
            value: value(r),
        })
        .collect()
}

/// Growth bars sit at their target EC so the trend line lines up.
fn growth_bars(
    rows: &[GrowthSummary],
    value: fn(&GrowthSummary) -> Option<f64>,
) -> Vec<GroupBar<'_>> {
    rows.iter()
        .map(|r| GroupBar {
            x: r.target_ec,
            group: &r.group,
            value: value(r),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Overview
// ---------------------------------------------------------------------------

pub fn overview(ui: &mut Ui, state: &AppState) {
    let Some(s) = &state.summaries else {
        return;
    };

    ui.heading("연구 목적");
    ui.label("서로 다른 EC 조건에서 극지식물의 생육 반응을 비교하여 최적 EC 농도를 도출한다.");
    ui.add_space(8.0);

    overview_table(ui, &s.overview);
    ui.add_space(12.0);

    let best = s
        .best
        .as_ref()
        .map_or_else(|| "-".to_string(), |b| format!("{:.1} ({}) ⭐", b.target_ec, b.group));
    ui.columns(4, |cols| {
        metric(&mut cols[0], "총 개체수", s.total_specimens().to_string());
        metric(&mut cols[1], "평균 온도", format!("{} ℃", fmt_opt(s.mean_temperature, 1)));
        metric(&mut cols[2], "평균 습도", format!("{} %", fmt_opt(s.mean_humidity, 1)));
        metric(&mut cols[3], "최적 EC", best);
    });
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

pub fn environment(ui: &mut Ui, state: &AppState) {
    let Some(s) = &state.summaries else {
        return;
    };
    let rows = &s.environment.rows;

    ui.heading("환경 데이터 비교");

    let colors = &state.colors;
    let temperature = env_bars(rows, |r| r.temperature);
    let humidity = env_bars(rows, |r| r.humidity);
    let ph = env_bars(rows, |r| r.ph);

    ui.columns(2, |cols| {
        group_bars(&mut cols[0], "env_temperature", "평균 온도", "℃", &temperature, colors, None);
        group_bars(&mut cols[1], "env_humidity", "평균 습도", "%", &humidity, colors, None);
    });
    ui.columns(2, |cols| {
        group_bars(&mut cols[0], "env_ph", "평균 pH", "pH", &ph, colors, None);
        ec_comparison(&mut cols[1], rows);
    });

    ui.add_space(8.0);
    environment_series(ui, state);
    ui.add_space(8.0);
    environment_table(ui, rows);
}

// ---------------------------------------------------------------------------
// Growth
// ---------------------------------------------------------------------------

pub fn growth(ui: &mut Ui, state: &AppState) {
    let Some(s) = &state.summaries else {
        return;
    };
    let rows = &s.growth.rows;

    ui.heading("EC별 생육 결과");
    if let Some(best) = &s.best {
        metric(
            ui,
            "🥇 최고 생중량",
            format!(
                "{} g  (EC {:.1}, {})",
                fmt_opt(best.fresh_weight, 2),
                best.target_ec,
                best.group
            ),
        );
    }
    if let Some(trend) = &s.trend {
        ui.label(format!(
            "추세선: 생중량 = {:.3} × EC + {:.3}  (r² {})",
            trend.slope,
            trend.intercept,
            fmt_opt(trend.r_squared, 3)
        ));
    }
    ui.add_space(8.0);

    let colors = &state.colors;
    let weight = growth_bars(rows, |r| r.fresh_weight);
    let leaves = growth_bars(rows, |r| r.leaf_count);
    let length = growth_bars(rows, |r| r.shoot_length);
    let count = growth_bars(rows, |r| Some(r.specimens as f64));

    ui.columns(2, |cols| {
        let trend = s.trend.as_ref();
        group_bars(&mut cols[0], "growth_weight", "생중량", "g", &weight, colors, trend);
        group_bars(&mut cols[1], "growth_leaves", "잎 수", "장", &leaves, colors, None);
    });
    ui.columns(2, |cols| {
        group_bars(&mut cols[0], "growth_length", "지상부 길이", "mm", &length, colors, None);
        group_bars(&mut cols[1], "growth_count", "개체수", "", &count, colors, None);
    });

    ui.add_space(8.0);
    growth_table(ui, rows);
}
