use std::{io, path::PathBuf};

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::ConfigError;

/// Формат вывода событий.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    #[default]
    Compact,
    Json,
}

/// Настройки консольного вывода.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub enabled: bool,
    pub with_ansi: bool,
    pub with_target: bool,
    pub with_thread_ids: bool,
    pub with_line_numbers: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            with_ansi: true,
            with_target: true,
            with_thread_ids: false,
            with_line_numbers: false,
        }
    }
}

/// Настройки файлового вывода (ежедневная ротация).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub enabled: bool,
    pub filename: String,
    /// Формат для файла; по умолчанию совпадает с общим.
    pub format: Option<LogFormat>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            filename: "courier.log".to_string(),
            format: None,
        }
    }
}

/// Конфигурация логирования.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Уровень или полная директива `EnvFilter`, например
    /// `"info"` или `"courier=debug,warn"`.
    pub level: String,
    pub format: LogFormat,
    pub log_dir: PathBuf,
    pub console: ConsoleConfig,
    pub file: FileConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            log_dir: PathBuf::from("logs"),
            console: ConsoleConfig::default(),
            file: FileConfig::default(),
        }
    }
}

impl LoggingConfig {
    pub fn build_filter_directive(&self) -> String {
        self.level.trim().to_string()
    }

    pub fn console_format(&self) -> LogFormat {
        self.format
    }

    pub fn file_format(&self) -> LogFormat {
        self.file.format.unwrap_or(self.format)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let directive = self.build_filter_directive();
        if directive.is_empty() {
            return Err(ConfigError::invalid("logging.level", "must not be empty"));
        }
        if let Err(e) = EnvFilter::try_new(&directive) {
            return Err(ConfigError::invalid("logging.level", e.to_string()));
        }
        if self.file.enabled && self.file.filename.trim().is_empty() {
            return Err(ConfigError::invalid(
                "logging.file.filename",
                "must not be empty when file logging is enabled",
            ));
        }
        Ok(())
    }

    /// Создаёт каталог логов, если включён файловый вывод.
    pub fn ensure_log_dir(&self) -> io::Result<()> {
        if self.file.enabled {
            std::fs::create_dir_all(&self.log_dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = LoggingConfig::default();
        assert!(cfg.validate().is_ok());
        assert!(cfg.console.enabled);
        assert!(!cfg.file.enabled);
        assert_eq!(cfg.file_format(), LogFormat::Compact);
    }

    #[test]
    fn test_invalid_directive_rejected() {
        let cfg = LoggingConfig {
            level: "courier=notalevel".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid { ref field, .. }) if field == "logging.level"
        ));
    }

    #[test]
    fn test_empty_filename_rejected_when_file_enabled() {
        let mut cfg = LoggingConfig::default();
        cfg.file.filename = " ".to_string();
        assert!(cfg.validate().is_ok());

        cfg.file.enabled = true;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_file_format_override() {
        let mut cfg = LoggingConfig::default();
        cfg.file.format = Some(LogFormat::Json);
        assert_eq!(cfg.console_format(), LogFormat::Compact);
        assert_eq!(cfg.file_format(), LogFormat::Json);
    }

    #[test]
    fn test_ensure_log_dir_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cfg = LoggingConfig {
            log_dir: tmp.path().join("nested/logs"),
            ..Default::default()
        };

        cfg.ensure_log_dir().unwrap();
        assert!(!cfg.log_dir.exists(), "file sink disabled, nothing to create");

        cfg.file.enabled = true;
        cfg.ensure_log_dir().unwrap();
        assert!(cfg.log_dir.is_dir());
    }
}
