use std::fmt;

/// Коды статуса для категоризации ошибок.
///
/// # Диапазоны:
/// - 1xxx: Внутренние ошибки и конфигурация
/// - 2xxx: Ошибки идентификаторов подписок
/// - 5xxx: Жизненный цикл брокера
/// - 6xxx: Каналы доставки / IO
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    // === 1xxx: Общие ошибки ===
    Internal = 1003,
    InvalidConfig = 1006,

    // === 2xxx: Идентификаторы ===
    NotFound = 2000,
    DuplicateId = 2003,

    // === 5xxx: Брокер ===
    BrokerClosed = 5000,

    // === 6xxx: Каналы/IO ===
    Io = 6000,
    ChannelClosed = 6001,
    Timeout = 6002,
    Empty = 6003,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl StatusCode {
    /// Числовое представление кода статуса.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Требуется ли логировать как критическую ошибку.
    ///
    /// `DuplicateId` означает нарушение инварианта выдачи идентификаторов.
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Internal | Self::DuplicateId)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для StatusCode
////////////////////////////////////////////////////////////////////////////////

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code() {
        assert_eq!(StatusCode::NotFound.code(), 2000);
        assert_eq!(StatusCode::BrokerClosed.code(), 5000);
    }

    #[test]
    fn test_is_critical() {
        assert!(StatusCode::DuplicateId.is_critical());
        assert!(StatusCode::Internal.is_critical());
        assert!(!StatusCode::NotFound.is_critical());
        assert!(!StatusCode::BrokerClosed.is_critical());
    }

    /// Тест проверяет формат `Display` — строка должна содержать имя варианта и
    /// числовой код.
    #[test]
    fn test_display_contains_name_and_code() {
        let s = format!("{}", StatusCode::BrokerClosed);
        assert!(
            s.contains("5000"),
            "Display must contain code 5000, got: {s}"
        );
        assert!(
            s.contains("BrokerClosed"),
            "Display must contain variant name 'BrokerClosed', got: {s}"
        );
    }
}
