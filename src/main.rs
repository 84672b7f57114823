#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod engine;
mod error;
mod io;
mod model;
mod render;
mod ui;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 400.0])
            .with_title("Timeloom"),
        ..Default::default()
    };

    eframe::run_native(
        "Timeloom",
        options,
        Box::new(|cc| Ok(Box::new(app::TimeloomApp::new(cc)))),
    )
}
