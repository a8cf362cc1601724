//! Потоковый writer для CSV.
//!
//! Предоставляет [`CsvWriter`] для записи строк в любой тип,
//! реализующий [`Write`].

use std::{
    borrow::Cow,
    io::{BufWriter, Write},
};

use tracing::{debug, trace};

use super::config::{CsvConfig, QuoteMode};
use crate::{
    charset::{self, Charset},
    error::{DataBindError, Result},
    record::{Record, Value},
};

static NULL: Value = Value::Null;

/// Потоковый CSV writer.
///
/// Заголовок (если он требуется конфигурацией) пишется один раз: перед
/// первой строкой или в [`close`](Self::close), если строк не было.
///
/// # Пример
///
/// ```
/// use databind::csv::{CsvConfig, CsvWriter};
/// use databind::record::Value;
///
/// let config = CsvConfig::rfc4180().with_properties(["a", "b"]).build().unwrap();
/// let mut out = Vec::new();
/// let mut writer = CsvWriter::new(&mut out, config);
/// writer.write_values(&[Value::from("1"), Value::from("x,y")]).unwrap();
/// writer.close().unwrap();
///
/// assert_eq!(out, b"1,\"x,y\"\r\n");
/// ```
pub struct CsvWriter<W: Write> {
    inner: BufWriter<W>,
    config: CsvConfig,
    charset: Charset,
    /// Счётчик записанных строк (без заголовка).
    records_written: u64,
    /// Флаг: записан ли заголовок.
    header_written: bool,
    line: String,
}

impl<W: Write> CsvWriter<W> {
    /// Создаёт writer, кодирующий текст в кодировке конфигурации.
    pub fn new(writer: W, config: CsvConfig) -> Self {
        let charset = config.charset();
        Self::with_charset(writer, config, charset)
    }

    /// Создаёт writer, всегда пишущий UTF-8.
    pub fn to_text(writer: W, config: CsvConfig) -> Self {
        Self::with_charset(writer, config, charset::UTF_8)
    }

    fn with_charset(writer: W, config: CsvConfig, charset: Charset) -> Self {
        debug!(charset = charset.name(), quote_mode = ?config.quote_mode(), "csv writer opened");
        Self {
            inner: BufWriter::new(writer),
            header_written: !config.header_required(),
            config,
            charset,
            records_written: 0,
            line: String::new(),
        }
    }

    /// Записывает строку из позиционных значений.
    ///
    /// [`Value::Null`] пишется как пустое поле.
    pub fn write_values(&mut self, values: &[Value]) -> Result<()> {
        if values.is_empty() {
            return Err(DataBindError::InvalidInput("columns should not be empty and null.".to_string()));
        }
        self.write_row(values.iter())
    }

    /// Записывает строку, беря из `record` значения ключей конфигурации.
    ///
    /// Отсутствующие ключи дают пустые поля, лишние игнорируются.
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        let values: Vec<&Value> =
            self.config.keys().iter().map(|key| record.get(key).unwrap_or(&NULL)).collect();
        self.write_row(values.into_iter())
    }

    /// Записывает несколько записей.
    pub fn write_all(&mut self, records: &[Record]) -> Result<()> {
        for record in records {
            self.write_record(record)?;
        }
        Ok(())
    }

    fn write_row<'a>(&mut self, values: impl Iterator<Item = &'a Value>) -> Result<()> {
        self.write_header()?;

        let mut line = std::mem::take(&mut self.line);
        line.clear();
        for (index, value) in values.enumerate() {
            if index > 0 {
                line.push(self.config.field_separator());
            }
            let text = value.to_text().ok_or_else(|| {
                DataBindError::InvalidInput(format!(
                    "value can not be written as csv. column index = [{index}], type = [{}]",
                    value.type_name()
                ))
            })?;
            let quoted = self.requires_quote(index, value, &text);
            self.push_field(&mut line, &text, quoted);
        }
        line.push_str(self.config.line_separator().as_str());

        let result = self.write_line(&line);
        self.line = line;
        result?;

        self.records_written += 1;
        trace!(records_written = self.records_written, "csv row written");
        Ok(())
    }

    fn write_header(&mut self) -> Result<()> {
        if self.header_written {
            return Ok(());
        }
        let mut line = String::new();
        for (index, title) in self.config.header_titles().iter().enumerate() {
            if index > 0 {
                line.push(self.config.field_separator());
            }
            let quoted = self.config.quote_mode() == QuoteMode::All || self.contains_special(title);
            self.push_field(&mut line, title, quoted);
        }
        line.push_str(self.config.line_separator().as_str());
        self.write_line(&line)?;
        self.header_written = true;
        Ok(())
    }

    fn requires_quote(&self, index: usize, value: &Value, text: &str) -> bool {
        let by_mode = match self.config.quote_mode() {
            QuoteMode::Normal => false,
            QuoteMode::All => true,
            QuoteMode::NotNumeric => !value.is_numeric(),
            QuoteMode::Custom => self.config.is_quoted_column(index),
        };
        by_mode || self.contains_special(text)
    }

    fn contains_special(&self, text: &str) -> bool {
        let separator = self.config.field_separator();
        let quote = self.config.quote();
        text.chars().any(|c| c == separator || c == quote || c == '\r' || c == '\n')
    }

    fn push_field(&self, line: &mut String, text: &str, quoted: bool) {
        if !quoted {
            line.push_str(text);
            return;
        }
        let quote = self.config.quote();
        line.push(quote);
        let escaped: Cow<'_, str> = if text.contains(quote) {
            Cow::Owned(text.replace(quote, &format!("{quote}{quote}")))
        } else {
            Cow::Borrowed(text)
        };
        line.push_str(&escaped);
        line.push(quote);
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        let bytes =
            charset::encode(self.charset, line).map_err(|e| DataBindError::InvalidInput(e.to_string()))?;
        self.inner.write_all(&bytes)?;
        Ok(())
    }

    /// Принудительно сбрасывает буфер.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Возвращает количество записанных строк.
    #[must_use]
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    #[must_use]
    pub fn config(&self) -> &CsvConfig {
        &self.config
    }

    /// Получает ссылку на внутренний writer.
    #[must_use]
    pub fn get_ref(&self) -> &W {
        self.inner.get_ref()
    }

    /// Дописывает заголовок (если ещё не записан), сбрасывает буфер
    /// и извлекает внутренний writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.write_header()?;
        self.inner.into_inner().map_err(|e| DataBindError::Io(e.into_error()))
    }

    /// Завершает поток и возвращает ошибку финального сброса буфера.
    pub fn close(self) -> Result<()> {
        let records_written = self.records_written;
        drop(self.into_inner()?);
        debug!(records_written, "csv writer closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::LineSeparator;

    fn write_rows(config: CsvConfig, rows: &[Vec<Value>]) -> String {
        let mut out = Vec::new();
        let mut writer = CsvWriter::new(&mut out, config);
        for row in rows {
            writer.write_values(row).unwrap();
        }
        writer.close().unwrap();
        String::from_utf8(out).unwrap()
    }

    fn rfc4180(keys: &[&str]) -> CsvConfig {
        CsvConfig::rfc4180().with_properties(keys.iter().copied()).build().unwrap()
    }

    #[test]
    fn test_null_is_empty_field() {
        let out = write_rows(
            rfc4180(&["col1", "col2", "col3"]),
            &[vec![Value::from("12345"), Value::Null, Value::from("54321")]],
        );
        assert_eq!(out, "12345,,54321\r\n");
    }

    #[test]
    fn test_non_ascii_is_not_quoted() {
        let out = write_rows(
            rfc4180(&["a", "b", "c"]),
            &[vec![Value::from("12345"), Value::from("あいうえお"), Value::from("🙀")]],
        );
        assert_eq!(out, "12345,あいうえお,🙀\r\n");
    }

    #[test]
    fn test_normal_mode_quotes_special_characters() {
        let out = write_rows(
            rfc4180(&["a", "b", "c", "d", "e"]),
            &[vec![
                Value::from("x,y"),
                Value::from("say \"hi\""),
                Value::from("cr\r"),
                Value::from("lf\n"),
                Value::from("plain"),
            ]],
        );
        assert_eq!(out, "\"x,y\",\"say \"\"hi\"\"\",\"cr\r\",\"lf\n\",plain\r\n");
    }

    #[test]
    fn test_tsv_quotes_tab_not_comma() {
        let config = CsvConfig::tsv().with_properties(["a", "b"]).build().unwrap();
        let out = write_rows(config, &[vec![Value::from("x,y"), Value::from("x\ty")]]);
        assert_eq!(out, "x,y\t\"x\ty\"\r\n");
    }

    #[test]
    fn test_quote_mode_all() {
        let config = CsvConfig::tsv()
            .with_properties(["col1", "col2", "col3", "col4"])
            .with_quote_mode(QuoteMode::All)
            .build()
            .unwrap();
        let out = write_rows(
            config,
            &[vec![Value::from("12345"), Value::from(1), Value::Integer(100), Value::Float(1.5)]],
        );
        assert_eq!(out, "\"12345\"\t\"1\"\t\"100\"\t\"1.5\"\r\n");
    }

    #[test]
    fn test_quote_mode_not_numeric() {
        let config = CsvConfig::rfc4180()
            .with_properties(["c1", "c2", "c3", "c4", "c5", "c6"])
            .with_quote_mode(QuoteMode::NotNumeric)
            .build()
            .unwrap();
        let out = write_rows(
            config,
            &[vec![
                Value::from("12345"),
                Value::from(1),
                Value::Integer(100),
                Value::Float(1.0),
                Value::from("\r"),
                Value::from("あ"),
            ]],
        );
        assert_eq!(out, "\"12345\",1,100,1.0,\"\r\",\"あ\"\r\n");
    }

    #[test]
    fn test_quote_mode_custom() {
        let config = CsvConfig::rfc4180()
            .with_properties(["field1", "field2", "field3", "field4"])
            .with_quote_mode(QuoteMode::Custom)
            .with_quoted_columns(["field1", "field3"])
            .build()
            .unwrap();
        let out = write_rows(
            config,
            &[vec![Value::from("12345"), Value::from("aaa"), Value::Null, Value::from(1)]],
        );
        assert_eq!(out, "\"12345\",aaa,\"\",1\r\n");
    }

    #[test]
    fn test_custom_quote_character() {
        let config = rfc4180(&["a", "b"]).to_builder().with_quote('\'').build().unwrap();
        let out = write_rows(config, &[vec![Value::from("it's"), Value::from("x,y")]]);
        assert_eq!(out, "'it''s','x,y'\r\n");
    }

    #[test]
    fn test_header_written_once_before_rows() {
        let config = CsvConfig::builder().with_header_titles(["年齢", "氏名"]).build().unwrap();
        let out = write_rows(
            config,
            &[
                vec![Value::from(20), Value::from("山田太郎")],
                vec![Value::from(25), Value::from("田中次郎")],
            ],
        );
        assert_eq!(out, "年齢,氏名\r\n20,山田太郎\r\n25,田中次郎\r\n");
    }

    #[test]
    fn test_header_written_on_close_without_rows() {
        let config = CsvConfig::builder()
            .with_header_titles(["a", "b"])
            .with_line_separator(LineSeparator::Lf)
            .build()
            .unwrap();
        assert_eq!(write_rows(config, &[]), "a,b\n");
    }

    #[test]
    fn test_empty_columns_rejected() {
        let mut out = Vec::new();
        let mut writer = CsvWriter::new(&mut out, rfc4180(&["a"]));
        let err = writer.write_values(&[]).unwrap_err();
        assert_eq!(err.to_string(), "columns should not be empty and null.");
        assert_eq!(writer.records_written(), 0);
    }

    #[test]
    fn test_bytes_value_rejected() {
        let mut out = Vec::new();
        let mut writer = CsvWriter::new(&mut out, rfc4180(&["a"]));
        let err = writer.write_values(&[Value::Bytes(vec![1, 2])]).unwrap_err();
        assert!(matches!(err, DataBindError::InvalidInput(_)));
    }

    #[test]
    fn test_write_record_follows_keys() {
        let config = CsvConfig::builder()
            .with_header_titles(["年齢", "氏名"])
            .with_properties(["age", "name"])
            .build()
            .unwrap();
        let record: Record =
            [("name", Value::from("山田太郎")), ("extra", Value::from("x")), ("age", Value::from(20))]
                .into_iter()
                .collect();
        let missing: Record = [("age", Value::from(30))].into_iter().collect();

        let mut out = Vec::new();
        let mut writer = CsvWriter::new(&mut out, config);
        writer.write_all(&[record, missing]).unwrap();
        assert_eq!(writer.records_written(), 2);
        writer.close().unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "年齢,氏名\r\n20,山田太郎\r\n30,\r\n");
    }

    #[test]
    fn test_float_and_bool_text() {
        let out = write_rows(
            rfc4180(&["a", "b", "c"]),
            &[vec![Value::Float(3.0), Value::Float(1e-7), Value::Bool(false)]],
        );
        assert_eq!(out, "3.0,0.0000001,false\r\n");
    }

    #[test]
    fn test_excel_writes_shift_jis() {
        let config = CsvConfig::excel().with_properties(["name"]).build().unwrap();
        let mut out = Vec::new();
        let mut writer = CsvWriter::new(&mut out, config.clone());
        writer.write_values(&[Value::from("山田")]).unwrap();
        writer.close().unwrap();
        assert_eq!(out, charset::encode(charset::SHIFT_JIS, "山田\r\n").unwrap().into_owned());

        let mut text = Vec::new();
        let mut writer = CsvWriter::to_text(&mut text, config);
        writer.write_values(&[Value::from("山田")]).unwrap();
        writer.close().unwrap();
        assert_eq!(text, "山田\r\n".as_bytes());
    }

    #[test]
    fn test_unmappable_character_is_error() {
        let config = CsvConfig::excel().with_properties(["name"]).build().unwrap();
        let mut writer = CsvWriter::new(Vec::new(), config);

        let err = writer.write_values(&[Value::from("山田😀")]).unwrap_err();
        assert!(matches!(err, DataBindError::InvalidInput(_)));
        assert_eq!(err.to_string(), "character can not be encoded. charset = [Shift_JIS], character = [😀]");
        assert_eq!(writer.records_written(), 0);

        writer.write_values(&[Value::from("山田")]).unwrap();
        let out = writer.into_inner().unwrap();
        assert_eq!(out, charset::encode(charset::SHIFT_JIS, "山田\r\n").unwrap().into_owned());
    }

    #[test]
    fn test_unmappable_header_is_retried() {
        let config = CsvConfig::excel()
            .with_header_titles(["名前😀"])
            .with_header_required(true)
            .build()
            .unwrap();
        let mut writer = CsvWriter::new(Vec::new(), config);
        assert!(writer.write_values(&[Value::from("a")]).is_err());
        assert!(writer.write_values(&[Value::from("a")]).is_err());
        assert!(writer.into_inner().is_err());
    }

    #[test]
    fn test_output_is_readable_by_csv_crate() {
        let rows = vec![
            vec![Value::from("1"), Value::from("x,y"), Value::from("multi\r\nline")],
            vec![Value::from("2"), Value::from("say \"hi\""), Value::Null],
        ];
        let out = write_rows(rfc4180(&["id", "text", "note"]), &rows);

        let mut reader = ::csv::ReaderBuilder::new().has_headers(false).from_reader(out.as_bytes());
        let parsed: Vec<Vec<String>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect();
        assert_eq!(
            parsed,
            vec![
                vec!["1".to_string(), "x,y".to_string(), "multi\r\nline".to_string()],
                vec!["2".to_string(), "say \"hi\"".to_string(), String::new()],
            ]
        );
    }

    #[test]
    fn test_round_trip_through_reader() {
        let config = CsvConfig::builder().with_header_titles(["id", "text"]).build().unwrap();
        let mut out = Vec::new();
        let mut writer = CsvWriter::new(&mut out, config.clone());
        writer.write_values(&[Value::from("1"), Value::from("a\r\n\"b\"")]).unwrap();
        writer.close().unwrap();

        let mut reader = crate::csv::CsvReader::new(out.as_slice(), config);
        let record = reader.read_record().unwrap().unwrap();
        assert_eq!(record.get("text").and_then(Value::as_str), Some("a\r\n\"b\""));
        assert!(reader.read_record().unwrap().is_none());
    }
}
