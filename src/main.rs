mod app;
mod color;
mod config;
mod data;
mod export;
mod pipeline;
mod predict;
mod state;
mod ui;
mod worker;

use anyhow::{Context, anyhow};
use app::GenderPandaApp;
use config::Settings;
use eframe::egui;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let settings = Settings::load().context("loading settings")?;
    log::info!(
        "inference endpoint {} ({}), batch size {}",
        settings.endpoint,
        settings.api_name,
        settings.batch_size
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([640.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Gender Panda – Mass Name Gender Prediction",
        options,
        Box::new(move |_cc| Ok(Box::new(GenderPandaApp::new(settings)))),
    )
    .map_err(|e| anyhow!("{e}"))
}
