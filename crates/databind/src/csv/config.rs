//! CSV format configuration.
//!
//! [`CsvConfig`] is immutable once built. Use one of the preset builders
//! ([`CsvConfig::builder`], [`CsvConfig::rfc4180`], [`CsvConfig::excel`],
//! [`CsvConfig::tsv`]) and adjust it with the `with_*` methods.

use std::{fmt, str::FromStr};

use serde::Deserialize;
use tracing::debug;

use crate::{
    charset::{self, Charset},
    error::{DataBindError, Result},
};

/// Record terminator of a CSV stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineSeparator {
    /// `\r`
    Cr,
    /// `\n`
    Lf,
    /// `\r\n`
    #[default]
    CrLf,
}

impl LineSeparator {
    /// Returns the separator text.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cr => "\r",
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

impl FromStr for LineSeparator {
    type Err = DataBindError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "\r" => Ok(Self::Cr),
            "\n" => Ok(Self::Lf),
            "\r\n" => Ok(Self::CrLf),
            _ => Err(DataBindError::Config(
                "invalid line separator. must be set '\\r\\n or \\n or \\r'".to_string(),
            )),
        }
    }
}

impl fmt::Display for LineSeparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy deciding which values the writer wraps in quote characters.
///
/// Values containing the separator, the quote or a line break are quoted
/// under every mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteMode {
    /// Quote only values containing the separator, the quote or a line break.
    #[default]
    Normal,
    /// Quote every value.
    All,
    /// Quote every value that is not a number.
    NotNumeric,
    /// Quote the columns listed in `quoted_columns`.
    Custom,
}

/// Immutable CSV configuration.
#[derive(Debug, Clone)]
pub struct CsvConfig {
    field_separator: char,
    quote: char,
    line_separator: LineSeparator,
    quote_mode: QuoteMode,
    quoted_columns: Vec<String>,
    header_titles: Vec<String>,
    properties: Vec<String>,
    keys: Vec<String>,
    header_required: bool,
    ignore_empty_lines: bool,
    empty_to_null: bool,
    charset: Charset,
}

impl CsvConfig {
    /// Builder preset: `,` / CRLF / `"`, header required, empty lines skipped,
    /// UTF-8, empty fields read as null.
    #[must_use]
    pub fn builder() -> CsvConfigBuilder {
        CsvConfigBuilder {
            field_separator: ',',
            quote: '"',
            line_separator: LineSeparator::CrLf,
            quote_mode: QuoteMode::Normal,
            quoted_columns: Vec::new(),
            header_titles: Vec::new(),
            properties: Vec::new(),
            header_required: true,
            ignore_empty_lines: true,
            empty_to_null: true,
            charset: charset::UTF_8,
        }
    }

    /// Builder preset following RFC 4180: no header, empty lines kept.
    #[must_use]
    pub fn rfc4180() -> CsvConfigBuilder {
        Self::builder().with_header_required(false).with_ignore_empty_lines(false).with_empty_to_null(false)
    }

    /// Builder preset for spreadsheet exports: RFC 4180 in Windows-31J.
    #[must_use]
    pub fn excel() -> CsvConfigBuilder {
        Self::rfc4180().with_charset(charset::SHIFT_JIS)
    }

    /// Builder preset for tab separated values.
    #[must_use]
    pub fn tsv() -> CsvConfigBuilder {
        Self::rfc4180().with_field_separator('\t')
    }

    /// Returns a builder initialised from this config.
    #[must_use]
    pub fn to_builder(&self) -> CsvConfigBuilder {
        CsvConfigBuilder {
            field_separator: self.field_separator,
            quote: self.quote,
            line_separator: self.line_separator,
            quote_mode: self.quote_mode,
            quoted_columns: self.quoted_columns.clone(),
            header_titles: self.header_titles.clone(),
            properties: self.properties.clone(),
            header_required: self.header_required,
            ignore_empty_lines: self.ignore_empty_lines,
            empty_to_null: self.empty_to_null,
            charset: self.charset,
        }
    }

    #[must_use]
    pub fn field_separator(&self) -> char {
        self.field_separator
    }

    #[must_use]
    pub fn quote(&self) -> char {
        self.quote
    }

    #[must_use]
    pub fn line_separator(&self) -> LineSeparator {
        self.line_separator
    }

    #[must_use]
    pub fn quote_mode(&self) -> QuoteMode {
        self.quote_mode
    }

    #[must_use]
    pub fn quoted_columns(&self) -> &[String] {
        &self.quoted_columns
    }

    #[must_use]
    pub fn header_titles(&self) -> &[String] {
        &self.header_titles
    }

    #[must_use]
    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    /// Names of the decoded fields, in column order.
    ///
    /// The properties when given, otherwise the header titles.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    #[must_use]
    pub fn header_required(&self) -> bool {
        self.header_required
    }

    #[must_use]
    pub fn ignore_empty_lines(&self) -> bool {
        self.ignore_empty_lines
    }

    #[must_use]
    pub fn empty_to_null(&self) -> bool {
        self.empty_to_null
    }

    #[must_use]
    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// Returns `true` if the column at `index` is quoted under [`QuoteMode::Custom`].
    pub(crate) fn is_quoted_column(&self, index: usize) -> bool {
        self.keys.get(index).is_some_and(|key| self.quoted_columns.contains(key))
    }
}

/// Builder for [`CsvConfig`].
#[derive(Debug, Clone)]
pub struct CsvConfigBuilder {
    field_separator: char,
    quote: char,
    line_separator: LineSeparator,
    quote_mode: QuoteMode,
    quoted_columns: Vec<String>,
    header_titles: Vec<String>,
    properties: Vec<String>,
    header_required: bool,
    ignore_empty_lines: bool,
    empty_to_null: bool,
    charset: Charset,
}

impl CsvConfigBuilder {
    #[must_use]
    pub fn with_field_separator(mut self, field_separator: char) -> Self {
        self.field_separator = field_separator;
        self
    }

    #[must_use]
    pub fn with_quote(mut self, quote: char) -> Self {
        self.quote = quote;
        self
    }

    #[must_use]
    pub fn with_line_separator(mut self, line_separator: LineSeparator) -> Self {
        self.line_separator = line_separator;
        self
    }

    #[must_use]
    pub fn with_quote_mode(mut self, quote_mode: QuoteMode) -> Self {
        self.quote_mode = quote_mode;
        self
    }

    #[must_use]
    pub fn with_quoted_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.quoted_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_header_titles<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header_titles = titles.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties = properties.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_header_required(mut self, header_required: bool) -> Self {
        self.header_required = header_required;
        self
    }

    #[must_use]
    pub fn with_ignore_empty_lines(mut self, ignore_empty_lines: bool) -> Self {
        self.ignore_empty_lines = ignore_empty_lines;
        self
    }

    #[must_use]
    pub fn with_empty_to_null(mut self, empty_to_null: bool) -> Self {
        self.empty_to_null = empty_to_null;
        self
    }

    #[must_use]
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    /// Validates the settings and derives the keys.
    pub fn build(self) -> Result<CsvConfig> {
        if self.field_separator == self.quote {
            return Err(DataBindError::Config(format!(
                "field separator and quote must be different. field_separator = [{:?}], quote = [{:?}]",
                self.field_separator, self.quote
            )));
        }
        if self.header_required && self.header_titles.is_empty() {
            return Err(DataBindError::Config("csv header is required.".to_string()));
        }
        if self.header_titles.is_empty() && self.properties.is_empty() {
            return Err(DataBindError::Config("csv header or property is required.".to_string()));
        }
        if !self.header_titles.is_empty()
            && !self.properties.is_empty()
            && self.header_titles.len() != self.properties.len()
        {
            return Err(DataBindError::Config(
                "csv header size and property size does not match.".to_string(),
            ));
        }

        let keys =
            if self.properties.is_empty() { self.header_titles.clone() } else { self.properties.clone() };
        debug!(
            keys = keys.len(),
            separator = ?self.field_separator,
            quote_mode = ?self.quote_mode,
            charset = self.charset.name(),
            "csv config built"
        );

        Ok(CsvConfig {
            field_separator: self.field_separator,
            quote: self.quote,
            line_separator: self.line_separator,
            quote_mode: self.quote_mode,
            quoted_columns: self.quoted_columns,
            header_titles: self.header_titles,
            properties: self.properties,
            keys,
            header_required: self.header_required,
            ignore_empty_lines: self.ignore_empty_lines,
            empty_to_null: self.empty_to_null,
            charset: self.charset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preset() {
        let config = CsvConfig::builder().with_header_titles(["a", "b"]).build().unwrap();

        assert_eq!(config.field_separator(), ',');
        assert_eq!(config.quote(), '"');
        assert_eq!(config.line_separator(), LineSeparator::CrLf);
        assert_eq!(config.quote_mode(), QuoteMode::Normal);
        assert!(config.header_required());
        assert!(config.ignore_empty_lines());
        assert!(config.empty_to_null());
        assert_eq!(config.charset(), charset::UTF_8);
        assert_eq!(config.keys(), ["a", "b"]);
    }

    #[test]
    fn test_other_presets() {
        let tsv = CsvConfig::tsv().with_properties(["x"]).build().unwrap();
        assert_eq!(tsv.field_separator(), '\t');
        assert!(!tsv.header_required());
        assert!(!tsv.ignore_empty_lines());

        let excel = CsvConfig::excel().with_properties(["x"]).build().unwrap();
        assert_eq!(excel.charset(), charset::SHIFT_JIS);
        assert_eq!(excel.field_separator(), ',');
    }

    #[test]
    fn test_to_builder_changes_one_setting() {
        let base = CsvConfig::builder().with_header_titles(["a"]).build().unwrap();
        let changed = base.to_builder().with_quote('\'').build().unwrap();

        assert_eq!(changed.quote(), '\'');
        assert_eq!(changed.field_separator(), base.field_separator());
        assert_eq!(changed.keys(), base.keys());
        assert_eq!(changed.empty_to_null(), base.empty_to_null());
    }

    #[test]
    fn test_properties_take_precedence_over_titles() {
        let config = CsvConfig::builder()
            .with_header_titles(["年齢", "氏名"])
            .with_properties(["age", "name"])
            .build()
            .unwrap();

        assert_eq!(config.keys(), ["age", "name"]);
        assert_eq!(config.header_titles(), ["年齢", "氏名"]);
    }

    #[test]
    fn test_header_required_without_titles() {
        let err = CsvConfig::builder().with_properties(["a"]).build().unwrap_err();
        assert_eq!(err.to_string(), "csv header is required.");
    }

    #[test]
    fn test_no_keys() {
        let err = CsvConfig::rfc4180().build().unwrap_err();
        assert_eq!(err.to_string(), "csv header or property is required.");
    }

    #[test]
    fn test_header_property_size_mismatch() {
        let err = CsvConfig::builder()
            .with_header_titles(["年齢", "氏名"])
            .with_properties(["age"])
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "csv header size and property size does not match.");
    }

    #[test]
    fn test_separator_equal_to_quote() {
        let err = CsvConfig::rfc4180().with_properties(["a"]).with_quote(',').build().unwrap_err();
        assert!(matches!(err, DataBindError::Config(_)));
    }

    #[test]
    fn test_line_separator_from_str() {
        assert_eq!("\r".parse::<LineSeparator>().unwrap(), LineSeparator::Cr);
        assert_eq!("\n".parse::<LineSeparator>().unwrap(), LineSeparator::Lf);
        assert_eq!("\r\n".parse::<LineSeparator>().unwrap(), LineSeparator::CrLf);

        let err = "\r\n\n".parse::<LineSeparator>().unwrap_err();
        assert_eq!(err.to_string(), "invalid line separator. must be set '\\r\\n or \\n or \\r'");
    }

    #[test]
    fn test_custom_quoted_column_lookup() {
        let config = CsvConfig::rfc4180()
            .with_properties(["field1", "field2", "field3"])
            .with_quote_mode(QuoteMode::Custom)
            .with_quoted_columns(["field1", "field3"])
            .build()
            .unwrap();

        assert!(config.is_quoted_column(0));
        assert!(!config.is_quoted_column(1));
        assert!(config.is_quoted_column(2));
        assert!(!config.is_quoted_column(3));
    }
}
