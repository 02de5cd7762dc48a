use eframe::egui::{self, Color32, RichText, Ui};

use crate::data::filter::selection_options;
use crate::data::schema::EnvColumn;
use crate::state::{AppState, ExportKind, Tab};

// ---------------------------------------------------------------------------
// Left side panel – group selection
// ---------------------------------------------------------------------------

/// Render the left panel: group selector, target EC legend, load problems.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("🔍 학교 선택");
    ui.separator();

    let options = selection_options(&state.config.groups);
    egui::ComboBox::from_id_salt("group_selection")
        .selected_text(state.selection.to_string())
        .show_ui(ui, |ui: &mut Ui| {
            for option in options {
                let label = option.to_string();
                ui.selectable_value(&mut state.selection, option, label);
            }
        });

    ui.add_space(6.0);
    ui.strong("Series");
    egui::ComboBox::from_id_salt("series_column")
        .selected_text(state.series_column.name())
        .show_ui(ui, |ui: &mut Ui| {
            for column in EnvColumn::ALL {
                ui.selectable_value(&mut state.series_column, column, column.name());
            }
        });

    ui.add_space(8.0);
    ui.strong("목표 EC");
    for target in state.config.groups.iter() {
        let text = RichText::new(format!("{}  EC {:.1}", target.name, target.ec))
            .color(state.colors.color_for(&target.name));
        ui.label(text);
    }

    let Some(summaries) = &state.summaries else {
        return;
    };

    let mut unmapped = summaries.environment.unmapped.clone();
    unmapped.extend(summaries.growth.unmapped.iter().cloned());
    unmapped.sort();
    unmapped.dedup();
    if !unmapped.is_empty() {
        ui.separator();
        ui.label(
            RichText::new(format!("No target EC, not charted: {}", unmapped.join(", ")))
                .color(Color32::YELLOW),
        );
    }

    let failures = &summaries.snapshot.failures;
    if !failures.is_empty() {
        ui.separator();
        egui::CollapsingHeader::new(RichText::new(format!("Skipped ({})", failures.len())).strong())
            .default_open(false)
            .show(ui, |ui: &mut Ui| {
                for failure in failures {
                    ui.label(RichText::new(failure.to_string()).small());
                }
            });
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu, tab switcher and status line.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
            if ui.button("Reload from disk").clicked() {
                state.force_reload();
                ui.close_menu();
            }
            ui.separator();
            let has_data = state.summaries.is_some();
            ui.add_enabled_ui(has_data, |ui: &mut Ui| {
                ui.menu_button("Export", |ui: &mut Ui| {
                    for kind in ExportKind::ALL {
                        if ui.button(kind.label()).clicked() {
                            save_file_dialog(state, kind);
                            ui.close_menu();
                        }
                    }
                });
            });
        });

        ui.separator();

        for tab in Tab::ALL {
            ui.selectable_value(&mut state.tab, tab, tab.label());
        }

        ui.separator();

        if let Some(summaries) = &state.summaries {
            let snapshot = &summaries.snapshot;
            ui.label(format!(
                "{} environment / {} growth groups, {} specimens loaded",
                snapshot.environment.len(),
                snapshot.growth.len(),
                snapshot.specimen_count()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn save_file_dialog(state: &mut AppState, kind: ExportKind) {
    let file = rfd::FileDialog::new()
        .set_title("Export")
        .set_file_name(kind.default_file_name())
        .add_filter(kind.extension(), &[kind.extension()])
        .save_file();

    if let Some(path) = file {
        state.export(kind, &path);
    }
}
