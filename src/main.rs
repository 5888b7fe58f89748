//! Subhealth: Lifestyle questionnaire screening for sub-health risk
//!
//! Main entry point for the terminal application.

use anyhow::{Context, Result};
use std::io::IsTerminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use subhealth::adapters::sanitize::SanitizingMakeWriter;
use subhealth::config::AppConfig;
use subhealth::tui::App;

fn main() -> Result<()> {
    let config = AppConfig::from_env().context("Invalid configuration")?;

    // Logs written to the terminal would corrupt the TUI (alternate screen):
    // interactive sessions log to a file unless told otherwise.
    let interactive = std::io::stdout().is_terminal();
    let (writer, _guard) = if config.log.use_file(interactive) {
        let log_file = &config.log.file;
        if let Some(parent) = log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            // Best-effort: a missing directory surfaces as an open error below.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .with_context(|| format!("Failed to open log file {}", log_file.display()))?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(SanitizingMakeWriter::with_limit(
                    writer,
                    config.log.sanitize_max_bytes,
                )),
        )
        .init();

    tracing::info!("Starting subhealth {}...", env!("CARGO_PKG_VERSION"));

    let mut app = App::new(&config)?;
    app.run()?;

    tracing::info!("Subhealth shutdown complete.");
    Ok(())
}
