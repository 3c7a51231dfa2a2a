use std::io;

use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling::daily};
use tracing_subscriber::{layer::Layer as LayerTrait, registry::LookupSpan};

use crate::logging::{config::LoggingConfig, formatter};

/// Файловый layer с ежедневной ротацией и неблокирующей записью.
///
/// `WorkerGuard` нужно держать до конца работы: при его drop фоновый
/// поток дописывает буфер.
pub fn layer_with_config<S>(
    config: &LoggingConfig
) -> io::Result<(Box<dyn LayerTrait<S> + Send + Sync>, WorkerGuard)>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    std::fs::create_dir_all(&config.log_dir)?;

    let file_appender = daily(&config.log_dir, &config.file.filename);
    let (writer, guard) = non_blocking(file_appender);

    let layer = formatter::build_formatter_from_config(config, config.file_format(), false, writer);

    Ok((layer, guard))
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::{prelude::*, registry::Registry};

    use super::*;
    use crate::logging::config::{FileConfig, LogFormat};

    /// Тест проверяет, что после drop guard'а событие оказывается в файле.
    #[test]
    fn test_file_layer_writes_after_guard_drop() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = LoggingConfig {
            log_dir: tmp.path().to_path_buf(),
            file: FileConfig {
                enabled: true,
                filename: "broker.log".to_string(),
                format: Some(LogFormat::Json),
            },
            ..Default::default()
        };

        let (layer, guard) = layer_with_config::<Registry>(&cfg).unwrap();
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(dropped = 3, "queue full");
        });
        drop(guard);

        let contents: String = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("broker.log"))
            .map(|e| std::fs::read_to_string(e.path()).unwrap())
            .collect();
        assert!(contents.contains("queue full"), "got: {contents}");
        assert!(contents.contains("\"dropped\":3"));
    }
}
