//! Потоковый reader записей CSV.

use std::io::Read;

use tracing::{debug, trace};

use super::{
    config::CsvConfig,
    tokenizer::{CsvTokenizer, Field, Terminator},
};
use crate::{
    charset,
    error::{DataBindError, Result},
    record::{Record, Value},
};

/// Одна физическая строка: поля и номер строки, с которой она началась.
struct Row {
    line: u64,
    fields: Vec<Field>,
}

impl Row {
    /// Пустая физическая строка читается как одно пустое поле без кавычек.
    fn is_blank(&self) -> bool {
        matches!(self.fields.as_slice(), [field] if !field.quoted && field.value.is_empty())
    }
}

/// Читает строки CSV как записи [`Record`] с ключами.
///
/// Реализует [`Iterator`]; итерация останавливается после первой ошибки.
///
/// # Пример
///
/// ```
/// use std::io::Cursor;
/// use databind::csv::{CsvConfig, CsvReader};
///
/// let config = CsvConfig::rfc4180().with_properties(["a", "b"]).build().unwrap();
/// let mut reader = CsvReader::new(Cursor::new("1,2\r\n3,\"x,y\"\r\n"), config);
///
/// let first = reader.read_record().unwrap().unwrap();
/// assert_eq!(first.get("b").unwrap().as_str(), Some("2"));
/// let second = reader.read_record().unwrap().unwrap();
/// assert_eq!(second.get("b").unwrap().as_str(), Some("x,y"));
/// assert!(reader.read_record().unwrap().is_none());
/// ```
pub struct CsvReader<R> {
    tokenizer: CsvTokenizer<R>,
    config: CsvConfig,
    /// Флаг: был ли пропущен заголовок.
    header_consumed: bool,
    /// Счётчик прочитанных записей.
    records_read: u64,
    /// Флаг достижения EOF или ошибки (для итератора).
    finished: bool,
}

impl<R: Read> CsvReader<R> {
    /// Создаёт reader, декодирующий поток в кодировке конфигурации.
    pub fn new(reader: R, config: CsvConfig) -> Self {
        let tokenizer = CsvTokenizer::new(reader, &config);
        Self::from_tokenizer(tokenizer, config)
    }

    /// Создаёт reader поверх UTF-8 текста, игнорируя кодировку конфигурации.
    pub fn from_text(reader: R, config: CsvConfig) -> Self {
        let tokenizer = CsvTokenizer::with_charset(reader, &config, charset::UTF_8);
        Self::from_tokenizer(tokenizer, config)
    }

    fn from_tokenizer(tokenizer: CsvTokenizer<R>, config: CsvConfig) -> Self {
        debug!(keys = ?config.keys(), header = config.header_required(), "csv reader opened");
        Self { tokenizer, config, header_consumed: false, records_read: 0, finished: false }
    }

    /// Читает следующую запись. Возвращает `Ok(None)` в конце данных.
    pub fn read_record(&mut self) -> Result<Option<Record>> {
        if !self.header_consumed && self.config.header_required() {
            self.header_consumed = true;
            // Ширина заголовка не сверяется с ключами.
            if self.read_row()?.is_none() {
                return Ok(None);
            }
        }

        let Some(row) = self.read_row()? else {
            return Ok(None);
        };

        let keys = self.config.keys();
        if row.fields.len() != keys.len() {
            return Err(DataBindError::FieldCount {
                expected: keys.len(),
                actual: row.fields.len(),
                line: row.line,
            });
        }

        let empty_to_null = self.config.empty_to_null();
        let record: Record = keys
            .iter()
            .zip(row.fields)
            .map(|(key, field)| {
                let value = if empty_to_null && field.value.is_empty() {
                    Value::Null
                } else {
                    Value::Text(field.value)
                };
                (key.clone(), value)
            })
            .collect();

        self.records_read += 1;
        trace!(line = row.line, records_read = self.records_read, "csv record read");
        Ok(Some(record))
    }

    /// Собирает следующую строку, пропуская пустые строки, если это настроено.
    fn read_row(&mut self) -> Result<Option<Row>> {
        loop {
            let line = self.tokenizer.line_number();
            let mut fields = Vec::new();
            loop {
                match self.tokenizer.next_field()? {
                    Some(field) => {
                        let terminator = field.terminator;
                        fields.push(field);
                        if terminator != Terminator::FieldSeparator {
                            break;
                        }
                    }
                    None => break,
                }
            }
            if fields.is_empty() {
                return Ok(None);
            }

            let row = Row { line, fields };
            if self.config.ignore_empty_lines() && row.is_blank() {
                trace!(line, "skipped empty line");
                continue;
            }
            return Ok(Some(row));
        }
    }

    /// Текущая физическая строка токенизатора (с 1).
    #[must_use]
    pub fn line_number(&self) -> u64 {
        self.tokenizer.line_number()
    }

    /// Количество прочитанных записей (без заголовка).
    #[must_use]
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    #[must_use]
    pub fn config(&self) -> &CsvConfig {
        &self.config
    }

    /// Извлекает внутренний reader.
    pub fn into_inner(self) -> R {
        self.tokenizer.into_inner()
    }

    /// Освобождает поток.
    pub fn close(self) -> Result<()> {
        debug!(records_read = self.records_read, "csv reader closed");
        drop(self.into_inner());
        Ok(())
    }
}

impl<R: Read> Iterator for CsvReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true; // Остановка при ошибке
                Some(Err(e))
            }
        }
    }
}
