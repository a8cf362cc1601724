//! Потоковый reader для записей фиксированной длины.

use std::io::{BufReader, ErrorKind, Read};

use tracing::{debug, trace};

use super::{config::FixedLengthConfig, layout::RecordLayout};
use crate::{
    charset,
    error::{DataBindError, Result},
    record::{RECORD_NAME_KEY, Record, Value},
};

/// Читает записи фиксированной длины и декодирует их подходящей раскладкой.
///
/// Запись одной раскладки отображает имена полей в значения. Запись из
/// нескольких раскладок хранит имя записи под [`RECORD_NAME_KEY`], а поля
/// как вложенную запись под этим именем. Поля-заполнители не включаются.
///
/// # Пример
///
/// ```
/// use databind::fixed::{FixedLengthConfig, FixedLengthReader, Rpad};
///
/// let config = FixedLengthConfig::builder(4)
///     .line_separator("\n")
///     .single_layout()
///     .field_with("name", 1, 4, Rpad::default())
///     .build()
///     .unwrap();
///
/// let mut reader = FixedLengthReader::new(&b"ab  \ncd  \n"[..], config);
/// let names: Vec<String> = reader
///     .by_ref()
///     .map(|r| r.unwrap().get("name").unwrap().as_str().unwrap().to_string())
///     .collect();
/// assert_eq!(names, ["ab", "cd"]);
/// assert_eq!(reader.records_read(), 2);
/// ```
pub struct FixedLengthReader<R: Read> {
    inner: BufReader<R>,
    config: FixedLengthConfig,
    buffer: Vec<u8>,
    separator: Vec<u8>,
    separator_buffer: Vec<u8>,
    /// Счётчик прочитанных записей.
    records_read: u64,
    /// Флаг достижения EOF или ошибки (для итератора).
    finished: bool,
}

impl<R: Read> FixedLengthReader<R> {
    /// Создаёт новый reader.
    pub fn new(reader: R, config: FixedLengthConfig) -> Self {
        let separator = config.line_separator_bytes();
        debug!(
            record_length = config.record_length(),
            separator_length = separator.len(),
            multi_layout = config.is_multi_layout(),
            "fixed-length reader opened"
        );
        Self {
            inner: BufReader::new(reader),
            buffer: vec![0; config.record_length()],
            separator_buffer: vec![0; separator.len()],
            separator,
            config,
            records_read: 0,
            finished: false,
        }
    }

    /// Читает следующую запись. Возвращает `Ok(None)` в конце данных.
    pub fn read_record(&mut self) -> Result<Option<Record>> {
        // Ошибки содержат номер читаемой записи.
        let record_number = self.records_read + 1;

        let n = read_full(&mut self.inner, &mut self.buffer)?;
        if n == 0 {
            return Ok(None);
        }
        if n < self.buffer.len() {
            return Err(DataBindError::data_format("last record is short.", record_number));
        }
        self.skip_line_separator(record_number)?;

        let record = match self.config.identify(&self.buffer) {
            Some(record_name) => {
                let layout = self.config.layout(&record_name).ok_or_else(|| {
                    DataBindError::InvalidInput(format!(
                        "record layout is not found. record_name:{record_name}"
                    ))
                })?;
                let fields = self.decode_fields(layout)?;
                let mut record = Record::with_capacity(2);
                record.insert(RECORD_NAME_KEY, record_name.as_str());
                record.insert(record_name, fields);
                record
            }
            None => {
                let layout = self.config.single_layout().ok_or_else(|| {
                    DataBindError::InvalidInput("single layout is not defined.".to_string())
                })?;
                self.decode_fields(layout)?
            }
        };

        self.records_read = record_number;
        trace!(record_number, "fixed-length record read");
        Ok(Some(record))
    }

    fn skip_line_separator(&mut self, record_number: u64) -> Result<()> {
        if self.separator.is_empty() {
            return Ok(());
        }
        let n = read_full(&mut self.inner, &mut self.separator_buffer)?;
        if n == 0 {
            return Ok(());
        }
        if n < self.separator.len()
            || charset::decode(self.config.charset(), &self.separator_buffer) != self.config.line_separator()
        {
            return Err(DataBindError::data_format("line separator is invalid.", record_number));
        }
        Ok(())
    }

    fn decode_fields(&self, layout: &RecordLayout) -> Result<Record> {
        let mut record = Record::with_capacity(layout.fields().len());
        for field in layout.data_fields() {
            let value = field.converter().decode(field, &self.buffer[field.range()], &self.config)?;
            record.insert(field.name(), value);
        }
        Ok(record)
    }

    /// Возвращает количество прочитанных записей.
    #[must_use]
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    #[must_use]
    pub fn config(&self) -> &FixedLengthConfig {
        &self.config
    }

    /// Извлекает внутренний reader.
    ///
    /// Уже буферизованные, но не прочитанные байты теряются.
    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }

    /// Освобождает поток.
    pub fn close(self) -> Result<()> {
        debug!(records_read = self.records_read, "fixed-length reader closed");
        drop(self.into_inner());
        Ok(())
    }
}

impl<R: Read> Iterator for FixedLengthReader<R> {
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

/// Заполняет `buf`, пока позволяет поток; возвращает число прочитанных байт.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
