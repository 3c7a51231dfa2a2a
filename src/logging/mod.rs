pub mod config;
mod filters;
mod formatter;
pub mod handle;
pub mod sinks;

pub use config::{ConsoleConfig, FileConfig, LogFormat, LoggingConfig};
pub use handle::LoggingHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{CourierResult, GenericError, ResultExt, StatusCode};

/// Инициализация глобального subscriber'а по конфигурации.
///
/// Фильтр берётся из `RUST_LOG`, если переменная задана, иначе из
/// `config.level`. Повторная инициализация в том же процессе даёт ошибку.
pub fn init_logging(config: LoggingConfig) -> CourierResult<LoggingHandle> {
    config.validate().context("validating logging config")?;
    config
        .ensure_log_dir()
        .with_context(|| format!("creating log directory {}", config.log_dir.display()))?;

    let env_filter = filters::build_filter_from_config(&config);
    let mut layers = Vec::new();

    if config.console.enabled {
        layers.push(sinks::console::layer_with_config(&config));
    }

    let file_guard = if config.file.enabled {
        let (file_layer, guard) = sinks::file::layer_with_config(&config)
            .with_context(|| format!("opening log file in {}", config.log_dir.display()))?;
        layers.push(file_layer);
        Some(guard)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .map_err(|e| GenericError::new(StatusCode::Internal, e.to_string()))
        .context("installing global subscriber")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_level = %config.level,
        format = ?config.format,
        log_dir = %config.log_dir.display(),
        console_enabled = config.console.enabled,
        file_enabled = config.file.enabled,
        "Logging system initialized"
    );

    Ok(LoggingHandle::new(file_guard))
}
