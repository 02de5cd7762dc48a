//! Summary statistics over a loaded [`Snapshot`](super::model::Snapshot).
//!
//! Every function here is pure: the same tables always give the same rows.
//! Means skip missing cells; a column with no values at all has an
//! undefined mean, represented as `None`.

use log::warn;

use super::model::{EnvironmentTables, GrowthTables, Record, Table, Tables};
use super::schema::{EnvColumn, GrowthColumn};
use crate::config::EcMapping;

// ---------------------------------------------------------------------------
// Summary rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentSummary {
    pub group: String,
    pub target_ec: f64,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub ph: Option<f64>,
    /// Mean measured EC.
    pub ec: Option<f64>,
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrowthSummary {
    pub group: String,
    pub target_ec: f64,
    pub fresh_weight: Option<f64>,
    pub leaf_count: Option<f64>,
    pub shoot_length: Option<f64>,
    pub specimens: usize,
}

/// Summary rows in mapping order, plus the loaded groups that were left out
/// because the EC mapping does not know them.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryReport<T> {
    pub rows: Vec<T>,
    pub unmapped: Vec<String>,
}

/// One line of the experiment overview table.
#[derive(Debug, Clone, PartialEq)]
pub struct OverviewRow {
    pub group: String,
    pub target_ec: f64,
    pub specimens: usize,
}

/// Least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTrend {
    pub slope: f64,
    pub intercept: f64,
    /// Undefined when every y value is identical.
    pub r_squared: Option<f64>,
}

impl LinearTrend {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

/// Arithmetic mean of the present, finite values.
pub fn mean(values: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Mean of `column` across every group's records concatenated.
pub fn global_average<R: Record>(tables: &Tables<R>, column: R::Column) -> Option<f64> {
    mean(tables.values().flat_map(|t| t.column(column)))
}

fn summarize<R, T>(
    tables: &Tables<R>,
    mapping: &EcMapping,
    row: impl Fn(&Table<R>, f64) -> T,
) -> SummaryReport<T> {
    let rows = mapping
        .iter()
        .filter_map(|target| tables.get(&target.name).map(|t| row(t, target.ec)))
        .collect();

    let unmapped: Vec<String> = tables
        .keys()
        .filter(|group| !mapping.contains(group))
        .cloned()
        .collect();
    if !unmapped.is_empty() {
        warn!("Groups without a target EC are left out of the summary: {unmapped:?}");
    }

    SummaryReport { rows, unmapped }
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

pub fn environment_summary(
    tables: &EnvironmentTables,
    mapping: &EcMapping,
) -> SummaryReport<EnvironmentSummary> {
    summarize(tables, mapping, |table, target_ec| EnvironmentSummary {
        group: table.group.clone(),
        target_ec,
        temperature: mean(table.column(EnvColumn::Temperature)),
        humidity: mean(table.column(EnvColumn::Humidity)),
        ph: mean(table.column(EnvColumn::Ph)),
        ec: mean(table.column(EnvColumn::Ec)),
        samples: table.len(),
    })
}

pub fn growth_summary(tables: &GrowthTables, mapping: &EcMapping) -> SummaryReport<GrowthSummary> {
    summarize(tables, mapping, |table, target_ec| GrowthSummary {
        group: table.group.clone(),
        target_ec,
        fresh_weight: mean(table.column(GrowthColumn::FreshWeight)),
        leaf_count: mean(table.column(GrowthColumn::LeafCount)),
        shoot_length: mean(table.column(GrowthColumn::ShootLength)),
        specimens: table.len(),
    })
}

/// The group with the greatest mean fresh weight.
///
/// Rows with an undefined mean are ignored. Exact ties go to the
/// lexicographically smallest group name.
pub fn best_performer(rows: &[GrowthSummary]) -> Option<&GrowthSummary> {
    rows.iter()
        .filter_map(|row| row.fresh_weight.map(|w| (w, row)))
        .fold(None, |best: Option<(f64, &GrowthSummary)>, (w, row)| match best {
            Some((best_w, best_row))
                if best_w > w || (best_w == w && best_row.group <= row.group) =>
            {
                Some((best_w, best_row))
            }
            _ => Some((w, row)),
        })
        .map(|(_, row)| row)
}

/// Every mapped group with its target EC and specimen count, in mapping
/// order. Groups without a growth sheet count zero specimens.
pub fn overview(growth: &GrowthTables, mapping: &EcMapping) -> Vec<OverviewRow> {
    mapping
        .iter()
        .map(|target| OverviewRow {
            group: target.name.clone(),
            target_ec: target.ec,
            specimens: growth.get(&target.name).map_or(0, Table::len),
        })
        .collect()
}

/// Ordinary least-squares fit. `None` with fewer than two distinct x values.
pub fn linear_trend(points: &[(f64, f64)]) -> Option<LinearTrend> {
    let n = points.len() as f64;
    if points.len() < 2 {
        return None;
    }
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

    let sxx: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    let sxy: f64 = points.iter().map(|(x, y)| (x - mean_x) * (y - mean_y)).sum();
    let syy: f64 = points.iter().map(|(_, y)| (y - mean_y).powi(2)).sum();
    if is_flat(sxx, points.iter().map(|p| p.0)) {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let r_squared =
        (!is_flat(syy, points.iter().map(|p| p.1))).then(|| (sxy * sxy) / (sxx * syy));
    Some(LinearTrend {
        slope,
        intercept,
        r_squared,
    })
}

/// Whether a sum of squared deviations is rounding noise, judged against the
/// magnitude of the values it was computed from.
fn is_flat(sum_sq: f64, values: impl Iterator<Item = f64>) -> bool {
    let (count, scale) = values.fold((0usize, 0.0f64), |(n, m), v| (n + 1, m.max(v.abs())));
    sum_sq <= f64::EPSILON * count as f64 * scale * scale
}

/// Trend of mean fresh weight against target EC.
pub fn growth_trend(rows: &[GrowthSummary]) -> Option<LinearTrend> {
    let points: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|row| row.fresh_weight.map(|w| (row.target_ec, w)))
        .collect();
    linear_trend(&points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GroupTarget;
    use crate::data::fixtures::{env_table, growth_table, write_env_csv};
    use crate::data::loader::load_environment_dir;

    fn summary(group: &str, weight: Option<f64>) -> GrowthSummary {
        GrowthSummary {
            group: group.to_string(),
            target_ec: 1.0,
            fresh_weight: weight,
            leaf_count: None,
            shoot_length: None,
            specimens: 1,
        }
    }

    #[test]
    fn mean_skips_missing_and_is_undefined_when_empty() {
        assert_eq!(mean([Some(1.0), None, Some(3.0)]), Some(2.0));
        assert_eq!(mean([Some(f64::NAN), Some(4.0)]), Some(4.0));
        assert_eq!(mean([None, None]), None);
        assert_eq!(mean(std::iter::empty()), None);
    }

    #[test]
    fn best_performer_picks_heaviest() {
        let rows = [
            summary("A", Some(5.0)),
            summary("B", Some(9.2)),
            summary("C", Some(3.1)),
        ];
        assert_eq!(best_performer(&rows).map(|r| r.group.as_str()), Some("B"));
    }

    #[test]
    fn best_performer_ties_break_by_name() {
        let rows = [
            summary("하늘고", Some(7.0)),
            summary("B", None),
            summary("동산고", Some(7.0)),
            summary("아라고", Some(2.0)),
        ];
        assert_eq!(
            best_performer(&rows).map(|r| r.group.as_str()),
            Some("동산고")
        );
        assert!(best_performer(&[summary("A", None)]).is_none());
        assert!(best_performer(&[]).is_none());
    }

    #[test]
    fn summaries_follow_mapping_and_report_unmapped_groups() {
        let mapping = EcMapping::default();
        let mut tables = GrowthTables::new();
        for (group, rows) in [
            ("하늘고", vec![[10.0, 6.0, 100.0], [14.0, 8.0, 120.0]]),
            ("송도고", vec![[4.0, 5.0, 80.0]]),
            ("서울고", vec![[1.0, 1.0, 1.0]]),
        ] {
            tables.insert(group.to_string(), growth_table(group, &rows));
        }

        let report = growth_summary(&tables, &mapping);
        let groups: Vec<&str> = report.rows.iter().map(|r| r.group.as_str()).collect();
        assert_eq!(groups, ["송도고", "하늘고"]);
        assert_eq!(report.unmapped, ["서울고"]);

        let sky = &report.rows[1];
        assert_eq!(sky.target_ec, 2.0);
        assert_eq!(sky.fresh_weight, Some(12.0));
        assert_eq!(sky.leaf_count, Some(7.0));
        assert_eq!(sky.shoot_length, Some(110.0));
        assert_eq!(sky.specimens, 2);
        for row in &report.rows {
            assert_eq!(Some(row.target_ec), mapping.target_ec(&row.group));
        }
    }

    #[test]
    fn environment_summary_means_each_column() {
        let mapping = EcMapping::new([GroupTarget { name: "A".into(), ec: 4.0 }]);
        let mut tables = EnvironmentTables::new();
        tables.insert(
            "A".into(),
            env_table(
                "A",
                &[
                    [Some(20.0), Some(60.0), Some(6.0), Some(3.8)],
                    [Some(22.0), Some(70.0), None, Some(4.2)],
                ],
            ),
        );

        let report = environment_summary(&tables, &mapping);
        assert_eq!(report.rows.len(), 1);
        let row = &report.rows[0];
        assert_eq!(row.target_ec, 4.0);
        assert_eq!(row.temperature, Some(21.0));
        assert_eq!(row.humidity, Some(65.0));
        assert_eq!(row.ph, Some(6.0));
        assert!((row.ec.unwrap() - 4.0).abs() < 1e-9);
        assert_eq!(row.samples, 2);
    }

    #[test]
    fn environment_summary_from_school_files() {
        let dir = tempfile::tempdir().unwrap();
        write_env_csv(dir.path(), "송도고_환경데이터.csv", &[(20.0, 50.0, 6.0, 1.1)]);
        write_env_csv(
            dir.path(),
            "하늘고_환경데이터.csv",
            &[(22.0, 55.0, 6.2, 2.1), (24.0, 65.0, 6.4, 1.9)],
        );

        let loaded = load_environment_dir(dir.path(), "_환경데이터").unwrap();
        let report = environment_summary(&loaded.tables, &EcMapping::default());

        let rows: Vec<(&str, f64)> = report
            .rows
            .iter()
            .map(|r| (r.group.as_str(), r.target_ec))
            .collect();
        assert_eq!(rows, [("송도고", 1.0), ("하늘고", 2.0)]);
        assert_eq!(report.rows[1].temperature, Some(23.0));
        assert!(report.unmapped.is_empty());
    }

    #[test]
    fn global_average_spans_all_groups() {
        let mut tables = GrowthTables::new();
        tables.insert("A".into(), growth_table("A", &[[1.0, 0.0, 0.0]]));
        tables.insert(
            "B".into(),
            growth_table("B", &[[2.0, 0.0, 0.0], [6.0, 0.0, 0.0]]),
        );
        assert_eq!(global_average(&tables, GrowthColumn::FreshWeight), Some(3.0));
        assert_eq!(global_average(&GrowthTables::new(), GrowthColumn::LeafCount), None);
    }

    #[test]
    fn overview_counts_zero_for_missing_sheets() {
        let mut tables = GrowthTables::new();
        tables.insert("아라고".into(), growth_table("아라고", &[[1.0, 2.0, 3.0]; 3]));
        let rows = overview(&tables, &EcMapping::default());
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[2].group, "아라고");
        assert_eq!(rows[2].specimens, 3);
        assert_eq!(rows[0].specimens, 0);
    }

    #[test]
    fn linear_trend_fits_a_line() {
        let trend = linear_trend(&[(1.0, 3.0), (2.0, 5.0), (4.0, 9.0)]).unwrap();
        assert!((trend.slope - 2.0).abs() < 1e-9);
        assert!((trend.intercept - 1.0).abs() < 1e-9);
        assert!((trend.r_squared.unwrap() - 1.0).abs() < 1e-9);
        assert!((trend.at(8.0) - 17.0).abs() < 1e-9);

        assert!(linear_trend(&[(1.0, 3.0)]).is_none());
        assert!(linear_trend(&[(2.0, 3.0), (2.0, 5.0)]).is_none());
        assert_eq!(
            linear_trend(&[(1.0, 3.0), (2.0, 3.0)]).unwrap().r_squared,
            None
        );
    }

    #[test]
    fn linear_trend_scales_with_the_data() {
        let tiny = linear_trend(&[(1e-9, 1.0), (2e-9, 2.0), (3e-9, 3.0)]).unwrap();
        assert!((tiny.slope - 1e9).abs() / 1e9 < 1e-9);
        assert!((tiny.r_squared.unwrap() - 1.0).abs() < 1e-9);

        let tiny_y = linear_trend(&[(1.0, 1e-9), (2.0, 2e-9)]).unwrap();
        assert!(tiny_y.r_squared.is_some());

        assert!(linear_trend(&[(0.1, 1.0), (0.1, 2.0), (0.1, 3.0)]).is_none());
        assert!(linear_trend(&[(0.0, 1.0), (0.0, 2.0)]).is_none());
    }
}
