use eframe::egui::{self, Color32, DragValue, RichText, ScrollArea, Ui};

use crate::config::{ErrorBars, PlotConfig, StatisticMode};
use crate::state::{Notice, Session};

// ---------------------------------------------------------------------------
// Left side panel – file selection and chart settings
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut Session) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.heading("Wrapped Tile Analysis Tool");
    });
    ui.add_space(8.0);

    ui.vertical_centered_justified(|ui: &mut Ui| {
        let select = egui::Button::new(RichText::new("Select Files").strong().color(Color32::WHITE))
            .fill(Color32::from_rgb(30, 80, 200))
            .min_size(egui::vec2(0.0, 32.0));
        if ui.add(select).clicked() {
            open_files_dialog(state);
        }

        let generate = egui::Button::new(RichText::new("Generate Graph").strong().color(Color32::WHITE))
            .fill(Color32::from_rgb(200, 40, 40))
            .min_size(egui::vec2(0.0, 32.0));
        if ui.add(generate).clicked() {
            let notices = state.generate();
            show_notices(&notices);
        }
    });

    ui.separator();
    settings(ui, state);
    ui.separator();

    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Selected Files");
        if !state.selected_files.is_empty() && ui.small_button("Clear").clicked() {
            state.clear_files();
        }
    });

    if state.selected_files.is_empty() {
        ui.label("No files selected");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (i, name) in state.selected_names().iter().enumerate() {
                ui.label(format!("{}. {name}", i + 1));
            }
        });
}

/// Statistic mode, error bars and display bounds.
fn settings(ui: &mut Ui, state: &mut Session) {
    let mode = &mut state.config.mode;

    ui.strong("Statistic");
    if ui
        .radio(matches!(mode, StatisticMode::Pooled), "Pooled over all files (legacy)")
        .clicked()
    {
        *mode = StatisticMode::Pooled;
    }
    let fixed_selected = matches!(
        mode,
        StatisticMode::PerFile {
            error_bars: ErrorBars::Fixed(_)
        }
    );
    if ui.radio(fixed_selected, "Per file, fixed error bar").clicked() && !fixed_selected {
        *mode = PlotConfig::legacy_per_file().mode;
    }
    if ui
        .radio(mode.needs_uncertainties(), "Per file, reported uncertainty")
        .clicked()
    {
        *mode = StatisticMode::PerFile {
            error_bars: ErrorBars::Reported,
        };
    }
    if let StatisticMode::PerFile {
        error_bars: ErrorBars::Fixed(v),
    } = mode
    {
        ui.horizontal(|ui: &mut Ui| {
            ui.label("Error bar");
            ui.add(DragValue::new(v).speed(0.005).range(0.0..=1.0).prefix("±"));
        });
    }

    ui.add_space(4.0);
    ui.strong("Display");
    let cfg = &mut state.config;
    egui::Grid::new("display_bounds")
        .num_columns(2)
        .show(ui, |ui: &mut Ui| {
            ui.label("Y min");
            ui.add(DragValue::new(&mut cfg.y_range.0).speed(0.01));
            ui.end_row();
            ui.label("Y max");
            ui.add(DragValue::new(&mut cfg.y_range.1).speed(0.01));
            ui.end_row();
            ui.label("Tolerance");
            ui.add(DragValue::new(&mut cfg.tolerance).speed(0.01));
            ui.end_row();
        });
    if cfg.y_range.1 <= cfg.y_range.0 {
        cfg.y_range.1 = cfg.y_range.0 + 0.1;
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / status bar.
pub fn top_bar(ui: &mut Ui, state: &mut Session) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Select Files…").clicked() {
                open_files_dialog(state);
                ui.close_menu();
            }
            if ui.button("Generate Graph").clicked() {
                let notices = state.generate();
                show_notices(&notices);
                ui.close_menu();
            }
        });

        ui.separator();
        ui.label(format!(
            "{} file(s) selected · {}",
            state.selected_files.len(),
            state.config.mode.describe()
        ));

        if let Some(msg) = &state.status_message {
            ui.separator();
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                ui.visuals().text_color()
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// Dialogs
// ---------------------------------------------------------------------------

pub fn open_files_dialog(state: &mut Session) {
    let files = rfd::FileDialog::new()
        .set_title("Select CSV files")
        .add_filter("CSV files", &["csv"])
        .pick_files();

    if let Some(paths) = files {
        state.add_files(paths);
    }
}

/// Show one modal message box per notice, in order.
pub fn show_notices(notices: &[Notice]) {
    for notice in notices {
        let (level, title, text) = match notice {
            Notice::Warning(msg) => (rfd::MessageLevel::Warning, "Warning".to_string(), msg.clone()),
            Notice::Error { title, message } => {
                (rfd::MessageLevel::Error, title.clone(), message.clone())
            }
            Notice::Saved(path) => (
                rfd::MessageLevel::Info,
                "Graph Saved".to_string(),
                format!("Graph saved to:\n{}", path.display()),
            ),
        };
        rfd::MessageDialog::new()
            .set_level(level)
            .set_title(title)
            .set_description(text)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}
