#[cfg(feature = "gtk")]
pub mod app;
pub mod config;
pub mod error;
pub mod geometry;
pub mod hotkey;
pub mod input;
pub mod instance;
pub mod launcher;
pub mod logging;
pub mod notification;
pub mod preview;
pub mod registry;
pub mod renderer;
pub mod selection;
pub mod session;
pub mod state;
pub mod ui;
pub use error::{AppError, AppResult};

/// Entrypoint used by higher-level integrations and CLI bindings.
#[cfg(feature = "gtk")]
pub fn run() -> AppResult<()> {
    logging::init();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting QuickPeek");

    let mut app = app::App::new();
    app.start()?;

    tracing::info!("shutdown complete");
    Ok(())
}
