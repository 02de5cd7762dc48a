use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::{AppState, Tab};
use crate::ui::{panels, tabs};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct EcDashboardApp {
    pub state: AppState,
}

impl EcDashboardApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for EcDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Nothing to chart: show why and stop ----
        if let Some(msg) = &self.state.fatal_error {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.centered_and_justified(|ui: &mut Ui| {
                    ui.heading(RichText::new(msg).color(Color32::RED));
                });
            });
            return;
        }

        // ---- Left side panel: group selection ----
        egui::SidePanel::left("group_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: active tab ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| match self.state.tab {
                    Tab::Overview => tabs::overview(ui, &self.state),
                    Tab::Environment => tabs::environment(ui, &self.state),
                    Tab::Growth => tabs::growth(ui, &self.state),
                });
        });
    }
}
