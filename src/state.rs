use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use log::{error, info, warn};

use crate::color::GroupColors;
use crate::config::DashboardConfig;
use crate::data::aggregate::{
    best_performer, environment_summary, global_average, growth_summary, growth_trend, overview,
    EnvironmentSummary, GrowthSummary, LinearTrend, OverviewRow, SummaryReport,
};
use crate::data::cache::SnapshotCache;
use crate::data::export;
use crate::data::filter::GroupSelection;
use crate::data::model::Snapshot;
use crate::data::schema::EnvColumn;

// ---------------------------------------------------------------------------
// Summaries – everything the views display, derived from one snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Summaries {
    pub snapshot: Arc<Snapshot>,
    pub overview: Vec<OverviewRow>,
    pub environment: SummaryReport<EnvironmentSummary>,
    pub growth: SummaryReport<GrowthSummary>,
    pub best: Option<GrowthSummary>,
    pub trend: Option<LinearTrend>,
    pub mean_temperature: Option<f64>,
    pub mean_humidity: Option<f64>,
}

impl Summaries {
    pub fn build(snapshot: Arc<Snapshot>, config: &DashboardConfig) -> Self {
        let environment = environment_summary(&snapshot.environment, &config.groups);
        let growth = growth_summary(&snapshot.growth, &config.groups);
        Self {
            overview: overview(&snapshot.growth, &config.groups),
            best: best_performer(&growth.rows).cloned(),
            trend: growth_trend(&growth.rows),
            mean_temperature: global_average(&snapshot.environment, EnvColumn::Temperature),
            mean_humidity: global_average(&snapshot.environment, EnvColumn::Humidity),
            environment,
            growth,
            snapshot,
        }
    }

    pub fn total_specimens(&self) -> usize {
        self.overview.iter().map(|r| r.specimens).sum()
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Overview,
    Environment,
    Growth,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Overview, Tab::Environment, Tab::Growth];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Overview => "📖 실험 개요",
            Tab::Environment => "🌡 환경 데이터",
            Tab::Growth => "📊 생육 결과",
        }
    }
}

/// Which file an export menu entry writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    EnvironmentCsv,
    GrowthWorkbook,
    GrowthSummary,
    GrowthParquet,
}

impl ExportKind {
    pub const ALL: [ExportKind; 4] = [
        ExportKind::EnvironmentCsv,
        ExportKind::GrowthWorkbook,
        ExportKind::GrowthSummary,
        ExportKind::GrowthParquet,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ExportKind::EnvironmentCsv => "Environment data (CSV)…",
            ExportKind::GrowthWorkbook => "Growth data (XLSX)…",
            ExportKind::GrowthSummary => "Growth summary (XLSX)…",
            ExportKind::GrowthParquet => "Growth data (Parquet)…",
        }
    }

    pub fn default_file_name(self) -> &'static str {
        match self {
            ExportKind::EnvironmentCsv => "환경데이터_전체.csv",
            ExportKind::GrowthWorkbook => "생육결과_전체.xlsx",
            ExportKind::GrowthSummary => "생육결과_요약.xlsx",
            ExportKind::GrowthParquet => "생육결과_전체.parquet",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportKind::EnvironmentCsv => "csv",
            ExportKind::GrowthWorkbook | ExportKind::GrowthSummary => "xlsx",
            ExportKind::GrowthParquet => "parquet",
        }
    }
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,
    cache: SnapshotCache,

    /// Derived views of the current snapshot (None until a load succeeds).
    pub summaries: Option<Summaries>,

    /// Set when the data cannot be shown at all.
    pub fatal_error: Option<String>,

    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,

    /// Groups shown in the environment time series.
    pub selection: GroupSelection,

    /// Column plotted in the environment time series.
    pub series_column: EnvColumn,

    pub tab: Tab,

    pub colors: GroupColors,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let colors = GroupColors::new(config.groups.names());
        let mut state = Self {
            config,
            cache: SnapshotCache::new(),
            summaries: None,
            fatal_error: None,
            status_message: None,
            selection: GroupSelection::default(),
            series_column: EnvColumn::Temperature,
            tab: Tab::default(),
            colors,
        };
        state.reload();
        state
    }

    /// Re-read the data directory if any input file changed.
    pub fn reload(&mut self) {
        match self.cache.load(&self.config) {
            Ok(snapshot) => {
                let unchanged = self
                    .summaries
                    .as_ref()
                    .is_some_and(|s| Arc::ptr_eq(&s.snapshot, &snapshot));
                if unchanged {
                    self.status_message = Some("Data unchanged".into());
                    return;
                }
                self.set_snapshot(snapshot);
            }
            Err(e) => {
                error!("Failed to load data: {e}");
                if self.summaries.is_some() {
                    self.status_message = Some(format!("Reload failed: {e}"));
                } else {
                    self.fatal_error = Some(format!("❌ 데이터 파일을 찾을 수 없습니다. data 폴더를 확인하세요.\n{e}"));
                }
            }
        }
    }

    /// Drop the cache and read everything again.
    pub fn force_reload(&mut self) {
        self.cache.invalidate();
        self.summaries = None;
        self.reload();
    }

    fn set_snapshot(&mut self, snapshot: Arc<Snapshot>) {
        for failure in &snapshot.failures {
            warn!("Skipped {failure}");
        }
        self.status_message = (!snapshot.failures.is_empty())
            .then(|| format!("{} file(s) or sheet(s) skipped", snapshot.failures.len()));
        self.summaries = Some(Summaries::build(snapshot, &self.config));
        self.fatal_error = None;
    }

    /// Write the chosen export to `path` and report the outcome in the status line.
    pub fn export(&mut self, kind: ExportKind, path: &Path) {
        match self.try_export(kind, path) {
            Ok(()) => {
                info!("Exported {kind:?} to {}", path.display());
                self.status_message = Some(format!("Saved {}", path.display()));
            }
            Err(e) => {
                error!("Export failed: {e:#}");
                self.status_message = Some(format!("Export failed: {e:#}"));
            }
        }
    }

    fn try_export(&self, kind: ExportKind, path: &Path) -> Result<()> {
        let summaries = self
            .summaries
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no data loaded"))?;
        let snapshot = &summaries.snapshot;
        match kind {
            ExportKind::EnvironmentCsv => export::export_environment_csv(&snapshot.environment, path)?,
            ExportKind::GrowthWorkbook => export::export_growth_workbook(&snapshot.growth, path)?,
            ExportKind::GrowthSummary => {
                export::export_growth_summary_workbook(&summaries.growth.rows, path)?
            }
            ExportKind::GrowthParquet => export::export_growth_parquet(&snapshot.growth, path)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FileSettings, DEFAULT_GROWTH_FILE};
    use crate::data::fixtures::{write_env_csv, write_growth_workbook};

    #[test]
    fn loads_summaries_on_start() {
        let dir = tempfile::tempdir().unwrap();
        write_env_csv(dir.path(), "송도고_환경데이터.csv", &[(20.0, 40.0, 6.0, 1.0)]);
        write_env_csv(dir.path(), "하늘고_환경데이터.csv", &[(24.0, 60.0, 6.0, 2.0)]);
        write_growth_workbook(
            &dir.path().join(DEFAULT_GROWTH_FILE),
            &[
                ("송도고", vec![[3.0, 5.0, 80.0]]),
                ("하늘고", vec![[9.0, 8.0, 120.0], [11.0, 8.0, 130.0]]),
            ],
        );

        let state = AppState::new(DashboardConfig::new(dir.path(), FileSettings::default()));
        assert!(state.fatal_error.is_none());
        let summaries = state.summaries.as_ref().unwrap();
        assert_eq!(summaries.total_specimens(), 3);
        assert_eq!(summaries.mean_temperature, Some(22.0));
        assert_eq!(summaries.mean_humidity, Some(50.0));
        assert_eq!(summaries.best.as_ref().unwrap().group, "하늘고");
        assert!(summaries.trend.unwrap().slope > 0.0);

        let out = dir.path().join("out.csv");
        let mut state = state;
        state.export(ExportKind::EnvironmentCsv, &out);
        assert!(std::fs::read(&out).unwrap().starts_with(export::UTF8_BOM));
    }

    #[test]
    fn missing_data_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(DashboardConfig::new(dir.path(), FileSettings::default()));
        assert!(state.summaries.is_none());
        assert!(state.fatal_error.is_some());
    }
}
