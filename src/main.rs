mod app;
mod color;
mod config;
mod data;
mod fonts;
mod report;
mod state;
mod ui;

use anyhow::Result;
use app::EcDashboardApp;
use clap::Parser;
use config::{Cli, DashboardConfig};
use eframe::egui;
use state::AppState;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = DashboardConfig::from_cli(&cli)?;
    log::info!("Data directory: {}", config.data_dir.display());

    if cli.report {
        return report::run(&config);
    }

    let state = AppState::new(config);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "🌱 극지식물 최적 EC 농도 연구",
        options,
        Box::new(move |cc| {
            fonts::install_hangul_font(&cc.egui_ctx);
            Ok(Box::new(EcDashboardApp::new(state)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("running the dashboard window: {e}"))
}
