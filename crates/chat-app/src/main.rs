use doodle::AppError;
use doodle::settings::SettingsStore;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Logs go to stderr so the redrawn transcript on stdout stays intact.
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = SettingsStore::load();
    tracing::info!(path = ?settings.config_path(), "loaded settings");
    doodle::run(settings).await
}
