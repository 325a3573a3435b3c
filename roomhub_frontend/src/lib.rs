pub mod api;
pub mod app;
pub mod config;
pub mod feed;
pub mod media;
pub mod models;
pub mod session;

use eframe::{self, egui};

pub use app::{AppContext, RoomhubApp};
use config::ClientConfig;
use session::AuthSession;

/// Launches the egui application with default window options.
pub fn run_frontend() -> anyhow::Result<()> {
    run_frontend_with_options(default_native_options())
}

/// Launches the egui app with caller-provided options.
pub fn run_frontend_with_options(options: eframe::NativeOptions) -> anyhow::Result<()> {
    let _ = env_logger::builder().is_test(false).try_init();

    let config = ClientConfig::from_env();
    log::info!("using API at {}", config.api_url);
    let session = AuthSession::load(&config.session_file).unwrap_or_else(|err| {
        log::warn!("ignoring unreadable session file: {err:#}");
        AuthSession::in_memory()
    });
    let ctx = AppContext::from_config(config, session)?;

    eframe::run_native(
        "Roomhub",
        options,
        Box::new(|cc| Ok(Box::new(RoomhubApp::new(cc, ctx)))),
    )
    .map_err(|err| anyhow::anyhow!("failed to start the UI: {err}"))
}

fn default_native_options() -> eframe::NativeOptions {
    eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([800.0, 600.0]),
        ..Default::default()
    }
}
