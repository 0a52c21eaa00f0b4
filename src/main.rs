mod app;
mod config;
mod data;
mod figure;
mod render;
mod report;
mod state;
mod style;
mod ui;

use app::TileAnalysisApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 850.0])
            .with_min_inner_size([500.0, 450.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Tile Analysis Tool",
        options,
        Box::new(|_cc| Ok(Box::new(TileAnalysisApp::default()))),
    )
}
