//! Heart Risk: heart disease risk prediction
//!
//! Main entry point for the terminal application.

mod config;

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use heart_risk::adapters::sanitize::SanitizingMakeWriter;
use heart_risk::adapters::ForestClassifier;
use heart_risk::application::RiskPredictor;
use heart_risk::tui::App;

use config::AppConfig;

fn main() -> Result<()> {
    let config = AppConfig::from_env();

    // Logging to the terminal would corrupt the TUI (alternate screen), so an
    // interactive session logs to a file unless told otherwise.
    let interactive = std::io::stdout().is_terminal();
    let (writer, _guard) = if config.log_mode.use_file(interactive) {
        if let Some(parent) = config.log_file.parent() {
            // Best-effort: the open below reports the real error.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)
            .with_context(|| format!("Failed to open log file {:?}", config.log_file))?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    tracing::info!("Starting Heart Risk...");

    let policy = config.load_policy()?;
    if config.allow_unsigned {
        tracing::warn!("Unsigned artifacts allowed (debug build)");
    }

    // Refuse to start without a loaded, verified artifact.
    let classifier = ForestClassifier::load(&config.model_path, &policy).map_err(|e| {
        tracing::error!("{}", e);
        anyhow::Error::new(e).context(format!(
            "Failed to load classifier from {:?}. Set HEARTRISK_MODEL_PATH to the artifact directory.",
            config.model_path
        ))
    })?;

    let predictor = RiskPredictor::new(Arc::new(classifier));
    predictor.check_schema().map_err(|e| {
        tracing::error!("{}", e);
        anyhow::Error::new(e).context(format!(
            "Artifact at {:?} does not match the patient record schema",
            config.model_path
        ))
    })?;

    let mut app = App::new(predictor);
    app.run()?;

    tracing::info!("Heart Risk shutdown complete.");
    Ok(())
}
