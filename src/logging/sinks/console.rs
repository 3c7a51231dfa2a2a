use std::io::{self, Stdout};

/// Возвращаем boxed trait-объект — согласованно с build_formatter_from_config.
use tracing_subscriber::layer::Layer as LayerTrait;
use tracing_subscriber::registry::LookupSpan;

use crate::logging::{config::LoggingConfig, formatter};

/// Console layer (stdout) с конфигурацией.
pub fn layer_with_config<S>(config: &LoggingConfig) -> Box<dyn LayerTrait<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let writer: fn() -> Stdout = io::stdout;
    formatter::build_formatter_from_config(
        config,
        config.console_format(),
        config.console.with_ansi,
        writer,
    )
}

#[cfg(test)]
mod tests {
    use tracing::info;
    use tracing_subscriber::{prelude::*, registry::Registry};

    use super::*;
    use crate::logging::config::{ConsoleConfig, LogFormat};

    /// Тест проверят, что полученный layer можно зарегистрировать в
    /// Registry и что вызов логирования не приводит к панике.
    #[test]
    fn test_layer_with_config_registers_and_logs() {
        for format in [LogFormat::Pretty, LogFormat::Compact, LogFormat::Json] {
            let cfg = LoggingConfig {
                format,
                console: ConsoleConfig {
                    with_ansi: false,
                    with_thread_ids: true,
                    ..Default::default()
                },
                ..Default::default()
            };

            let subscriber = Registry::default().with(layer_with_config::<Registry>(&cfg));
            tracing::subscriber::with_default(subscriber, || {
                info!(?format, "console layer smoke test");
            });
        }
    }
}
