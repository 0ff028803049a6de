#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]

use anyhow::Result;
use eframe::egui;

use cascade_agent::agentapp::AgentApp;
use cascade_agent::settings::Settings;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cascade_agent=info".into()),
        )
        .init();

    let settings_path = Settings::default_path();
    let settings = Settings::load_or_default(settings_path.as_deref());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("SimpleCASCADE — AI agent")
            .with_inner_size([900.0, 700.0]),
        ..Default::default()
    };

    eframe::run_native(
        "SimpleCASCADE",
        options,
        Box::new(move |cc| Box::new(AgentApp::new(cc, settings, settings_path))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))
}
