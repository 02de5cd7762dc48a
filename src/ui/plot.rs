use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints};

use crate::color::GroupColors;
use crate::data::aggregate::{EnvironmentSummary, LinearTrend};
use crate::data::filter::selected_tables;
use crate::data::model::Record;
use crate::state::AppState;

const CHART_HEIGHT: f32 = 260.0;

/// One bar: where it sits, which group it belongs to, and its height.
pub struct GroupBar<'a> {
    pub x: f64,
    pub group: &'a str,
    pub value: Option<f64>,
}

// ---------------------------------------------------------------------------
// Bar charts
// ---------------------------------------------------------------------------

/// Bar chart with one coloured bar per group; undefined values are left out.
/// An optional trend line is drawn over the bars.
pub fn group_bars(
    ui: &mut Ui,
    id: &str,
    title: &str,
    y_label: &str,
    bars: &[GroupBar<'_>],
    colors: &GroupColors,
    trend: Option<&LinearTrend>,
) {
    ui.strong(title);
    Plot::new(id)
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .y_axis_label(y_label)
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for bar in bars {
                let Some(value) = bar.value else {
                    continue;
                };
                let chart = BarChart::new(vec![Bar::new(bar.x, value).width(0.6).name(bar.group)])
                    .name(bar.group)
                    .color(colors.color_for(bar.group));
                plot_ui.bar_chart(chart);
            }

            if let Some(trend) = trend {
                let xs = bars.iter().map(|b| b.x);
                let (lo, hi) = xs.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
                    (lo.min(x), hi.max(x))
                });
                if lo.is_finite() && hi.is_finite() {
                    let points: PlotPoints = vec![[lo, trend.at(lo)], [hi, trend.at(hi)]].into();
                    plot_ui.line(Line::new(points).name("추세선").color(Color32::WHITE).width(1.5));
                }
            }
        });
}

/// Measured EC next to target EC for every group.
pub fn ec_comparison(ui: &mut Ui, rows: &[EnvironmentSummary]) {
    ui.strong("EC 비교");
    Plot::new("ec_comparison")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .y_axis_label("EC")
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            let measured: Vec<Bar> = rows
                .iter()
                .enumerate()
                .filter_map(|(i, r)| {
                    r.ec.map(|ec| Bar::new(i as f64 - 0.2, ec).width(0.4).name(&r.group))
                })
                .collect();
            let target: Vec<Bar> = rows
                .iter()
                .enumerate()
                .map(|(i, r)| Bar::new(i as f64 + 0.2, r.target_ec).width(0.4).name(&r.group))
                .collect();

            plot_ui.bar_chart(BarChart::new(measured).name("실측").color(Color32::LIGHT_BLUE));
            plot_ui.bar_chart(BarChart::new(target).name("목표").color(Color32::LIGHT_RED));
        });
}

// ---------------------------------------------------------------------------
// Environment time series
// ---------------------------------------------------------------------------

/// Chosen column over sample index for the selected groups.
pub fn environment_series(ui: &mut Ui, state: &AppState) {
    let Some(summaries) = &state.summaries else {
        return;
    };
    let column = state.series_column;

    ui.strong(format!("{} ({})", column.name(), state.selection));
    Plot::new("environment_series")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .x_axis_label("sample")
        .y_axis_label(column.name())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for table in selected_tables(&summaries.snapshot.environment, &state.selection) {
                let points: PlotPoints = table
                    .records
                    .iter()
                    .enumerate()
                    .filter_map(|(i, r)| r.value(column).map(|v| [i as f64, v]))
                    .collect();

                let line = Line::new(points)
                    .name(&table.group)
                    .color(state.colors.color_for(&table.group))
                    .width(1.5);

                plot_ui.line(line);
            }
        });
}
