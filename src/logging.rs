use std::sync::Once;

use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "QUICKPEEK_LOG";
const DEFAULT_DIRECTIVE: &str = "info";

/// Installs the global subscriber and the panic hook. Safe to call twice.
pub fn init() {
    let filter = env_filter(
        std::env::var(LOG_ENV).ok().as_deref(),
        std::env::var("RUST_LOG").ok().as_deref(),
    );
    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
    {
        tracing::debug!(%err, "tracing subscriber already installed");
    }
    install_panic_hook();
}

fn env_filter(app_directive: Option<&str>, rust_log: Option<&str>) -> EnvFilter {
    [app_directive, rust_log]
        .into_iter()
        .flatten()
        .filter(|directive| !directive.trim().is_empty())
        .find_map(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

fn install_panic_hook() {
    static PANIC_HOOK: Once = Once::new();

    PANIC_HOOK.call_once(|| {
        let default_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let thread = std::thread::current();
            tracing::error!(
                thread = thread.name().unwrap_or("<unnamed>"),
                "panic: {info}"
            );
            default_hook(info);
        }));
    });
}
