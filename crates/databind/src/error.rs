//! Модуль ошибок привязки данных.

use thiserror::Error;

/// Главная ошибка привязки данных.
///
/// Объединяет ошибки построения конфигурации (CSV и фиксированной длины),
/// ошибки формата при чтении, ошибки кодирования полей при записи
/// и I/O ошибки нижележащего потока.
#[derive(Debug, Error)]
pub enum DataBindError {
    // === I/O ошибки ===
    /// Ошибка ввода/вывода.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Ошибки конфигурации ===
    /// Некорректная раскладка записи фиксированной длины.
    #[error("{0}")]
    Layout(String),

    /// Некорректная конфигурация CSV.
    #[error("{0}")]
    Config(String),

    /// Не удалось разобрать JSON-схему.
    #[error("schema is invalid: {0}")]
    Schema(#[from] serde_json::Error),

    // === Ошибки чтения ===
    /// Данные не соответствуют формату.
    #[error("data format is invalid. {message} line number = [{line}]")]
    DataFormat {
        /// Описание нарушения.
        message: String,
        /// Номер строки или записи (1-based).
        line: u64,
    },

    /// Количество полей в строке CSV не совпадает с количеством ключей.
    #[error(
        "data format is invalid. property size does not match. \
         expected field count = [{expected}], actual field count = [{actual}]. \
         line number = [{line}]"
    )]
    FieldCount {
        /// Ожидаемое количество полей.
        expected: usize,
        /// Фактическое количество полей.
        actual: usize,
        /// Номер строки (1-based).
        line: u64,
    },

    // === Ошибки записи ===
    /// Значение поля не удалось закодировать в объявленную длину.
    ///
    /// Сообщение уже содержит имя поля.
    #[error("{message}")]
    FieldEncoding {
        /// Имя поля.
        field: String,
        /// Описание ошибки.
        message: String,
    },

    // === Прочее ===
    /// Некорректные входные данные вызывающей стороны.
    #[error("{0}")]
    InvalidInput(String),
}

impl DataBindError {
    pub(crate) fn data_format(message: impl Into<String>, line: u64) -> Self {
        Self::DataFormat { message: message.into(), line }
    }

    pub(crate) fn field_encoding(field: &str, message: impl Into<String>) -> Self {
        Self::FieldEncoding { field: field.to_string(), message: message.into() }
    }

    pub(crate) fn field_length(field: &str, expected: usize, actual: usize) -> Self {
        Self::field_encoding(
            field,
            format!(
                "length is invalid. expected length {expected} but was actual length {actual}. field_name: {field}"
            ),
        )
    }
}

/// Удобный alias для Result с DataBindError.
pub type Result<T> = std::result::Result<T, DataBindError>;
