//! Main application entry point

use anyhow::Result;
use eframe::egui;
use fc_data::AppConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod startup;

use app::FloatChatApp;
use startup::Startup;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting FloatChat");

    let config = AppConfig::load()?;
    let startup = Startup::build(config)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 860.0])
            .with_min_inner_size([900.0, 600.0]),
        default_theme: eframe::Theme::Dark,
        persist_window: false,
        ..Default::default()
    };

    eframe::run_native(
        "FloatChat - ARGO float explorer",
        options,
        Box::new(move |cc| Box::new(FloatChatApp::new(cc, startup))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))?;

    Ok(())
}
