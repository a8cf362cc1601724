//! Потоковый writer для записей фиксированной длины.

use std::io::{BufWriter, Write};

use tracing::{debug, trace};

use super::{config::FixedLengthConfig, layout::RecordLayout};
use crate::{
    error::{DataBindError, Result},
    record::{RECORD_NAME_KEY, Record, Value},
};

static NULL: Value = Value::Null;

/// Кодирует записи в байтовые записи фиксированной длины.
///
/// Для нескольких раскладок запись должна содержать имя записи под
/// [`RECORD_NAME_KEY`] и значения полей как вложенную запись под этим
/// именем: ту же форму, что выдаёт
/// [`FixedLengthReader`](super::FixedLengthReader).
///
/// Разделитель строк пишется после каждой записи, включая последнюю.
pub struct FixedLengthWriter<W: Write> {
    inner: BufWriter<W>,
    config: FixedLengthConfig,
    blank: Vec<u8>,
    separator: Vec<u8>,
    /// Счётчик записанных записей.
    records_written: u64,
}

impl<W: Write> FixedLengthWriter<W> {
    /// Создаёт новый writer.
    pub fn new(writer: W, config: FixedLengthConfig) -> Self {
        debug!(
            record_length = config.record_length(),
            multi_layout = config.is_multi_layout(),
            "fixed-length writer opened"
        );
        Self {
            inner: BufWriter::new(writer),
            blank: config.blank_record(),
            separator: config.line_separator_bytes(),
            config,
            records_written: 0,
        }
    }

    /// Кодирует и записывает одну запись.
    ///
    /// Если хотя бы одно поле не кодируется, ничего не пишется.
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        let (layout, values) = self.resolve(record)?;
        let buffer = self.encode(layout, values)?;

        self.inner.write_all(&buffer)?;
        self.inner.write_all(&self.separator)?;
        self.records_written += 1;
        trace!(records_written = self.records_written, "fixed-length record written");
        Ok(())
    }

    /// Записывает несколько записей.
    pub fn write_all(&mut self, records: &[Record]) -> Result<()> {
        for record in records {
            self.write_record(record)?;
        }
        Ok(())
    }

    /// Находит раскладку для `record` и запись со значениями её полей.
    fn resolve<'a>(&self, record: &'a Record) -> Result<(&RecordLayout, &'a Record)> {
        if !self.config.is_multi_layout() {
            let layout = self
                .config
                .single_layout()
                .ok_or_else(|| DataBindError::InvalidInput("single layout is not defined.".to_string()))?;
            return Ok((layout, record));
        }

        let record_name = record
            .record_name()
            .ok_or_else(|| DataBindError::InvalidInput("record name is not found.".to_string()))?;
        let layout = self.config.layout(record_name).ok_or_else(|| {
            DataBindError::InvalidInput(format!("record layout is not found. record_name:{record_name}"))
        })?;
        let values = match record.get(record_name) {
            Some(Value::Record(values)) => values,
            Some(_) => {
                return Err(DataBindError::InvalidInput(format!(
                    "record data must be a record. record_name:{record_name}"
                )));
            }
            None => {
                return Err(DataBindError::InvalidInput(format!(
                    "record data is not found. record_name:{record_name}"
                )));
            }
        };
        Ok((layout, values))
    }

    fn encode(&self, layout: &RecordLayout, values: &Record) -> Result<Vec<u8>> {
        let mut buffer = self.blank.clone();
        for field in layout.fields() {
            let value = if field.is_filler() { &NULL } else { values.get(field.name()).unwrap_or(&NULL) };
            let bytes = field.converter().encode(field, value, &self.config)?;
            if bytes.len() != field.length() {
                return Err(DataBindError::field_length(field.name(), field.length(), bytes.len()));
            }
            buffer[field.range()].copy_from_slice(&bytes);
        }
        Ok(buffer)
    }

    /// Принудительно сбрасывает буфер.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Возвращает количество записанных записей.
    #[must_use]
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    #[must_use]
    pub fn config(&self) -> &FixedLengthConfig {
        &self.config
    }

    /// Получает ссылку на внутренний writer.
    #[must_use]
    pub fn get_ref(&self) -> &W {
        self.inner.get_ref()
    }

    /// Извлекает внутренний writer (с предварительным flush).
    pub fn into_inner(self) -> Result<W> {
        self.inner.into_inner().map_err(|e| DataBindError::Io(e.into_error()))
    }

    /// Завершает поток и возвращает ошибку финального сброса буфера.
    pub fn close(self) -> Result<()> {
        let records_written = self.records_written;
        drop(self.into_inner()?);
        debug!(records_written, "fixed-length writer closed");
        Ok(())
    }
}
