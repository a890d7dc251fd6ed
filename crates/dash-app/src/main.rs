//! Insight dashboard desktop app

use anyhow::Result;
use eframe::egui;
use tracing::info;

mod app;
mod dispatch;

use app::DashboardApp;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    info!("Starting Insight Dashboard");

    let runtime = tokio::runtime::Runtime::new()?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([800.0, 600.0]),
        default_theme: eframe::Theme::Dark,
        persist_window: false,
        ..Default::default()
    };

    eframe::run_native(
        "Insight Dashboard",
        options,
        Box::new(move |cc| Box::new(DashboardApp::new(cc, runtime))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))?;

    Ok(())
}
