//! Fixed-length format configuration.
//!
//! A [`FixedLengthConfig`] is built once through
//! [`FixedLengthConfig::builder`] and then shared read-only by readers and
//! writers. Every record declared on the builder is validated with
//! [`validate_and_build`] before the config exists.

use std::{fmt, sync::Arc};

use tracing::debug;

use super::{
    converter::FieldConverter,
    layout::{FieldSpec, RecordLayout, validate_and_build},
};
use crate::{
    charset::{self, Charset},
    error::{DataBindError, Result},
};

/// Record name of the only layout of a single-layout config.
pub const SINGLE_LAYOUT_RECORD_NAME: &str = "single";

/// Chooses the record name for a multi-layout record from its raw bytes.
///
/// Implemented for any `Fn(&[u8]) -> String`.
pub trait RecordIdentifier: Send + Sync {
    fn identify(&self, record: &[u8]) -> String;
}

impl<F> RecordIdentifier for F
where
    F: Fn(&[u8]) -> String + Send + Sync,
{
    fn identify(&self, record: &[u8]) -> String {
        self(record)
    }
}

/// Immutable fixed-length configuration.
#[derive(Clone)]
pub struct FixedLengthConfig {
    record_length: usize,
    charset: Charset,
    line_separator: String,
    fill_char: char,
    separator_bytes: Arc<[u8]>,
    fill_bytes: Arc<[u8]>,
    records: Arc<[RecordLayout]>,
    identifier: Option<Arc<dyn RecordIdentifier>>,
}

impl FixedLengthConfig {
    /// Starts a builder for records of `record_length` bytes.
    ///
    /// Defaults: UTF-8, no line separator, space as fill char.
    #[must_use]
    pub fn builder(record_length: usize) -> FixedLengthConfigBuilder {
        FixedLengthConfigBuilder {
            record_length,
            charset: charset::UTF_8,
            line_separator: String::new(),
            fill_char: ' ',
        }
    }

    #[must_use]
    pub fn record_length(&self) -> usize {
        self.record_length
    }

    #[must_use]
    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// Separator written after every record; empty for none.
    #[must_use]
    pub fn line_separator(&self) -> &str {
        &self.line_separator
    }

    #[must_use]
    pub fn fill_char(&self) -> char {
        self.fill_char
    }

    #[must_use]
    pub fn is_multi_layout(&self) -> bool {
        self.identifier.is_some()
    }

    /// Layouts in declaration order.
    #[must_use]
    pub fn layouts(&self) -> &[RecordLayout] {
        &self.records
    }

    /// Layout registered under `record_name`.
    #[must_use]
    pub fn layout(&self, record_name: &str) -> Option<&RecordLayout> {
        self.records.iter().find(|l| l.name() == record_name)
    }

    /// The layout of a single-layout config.
    #[must_use]
    pub fn single_layout(&self) -> Option<&RecordLayout> {
        if self.is_multi_layout() { None } else { self.layout(SINGLE_LAYOUT_RECORD_NAME) }
    }

    /// Record name for a raw record; `None` for single-layout configs.
    pub fn identify(&self, record: &[u8]) -> Option<String> {
        self.identifier.as_ref().map(|id| id.identify(record))
    }

    /// Separator bytes in the configured charset.
    pub(crate) fn line_separator_bytes(&self) -> Vec<u8> {
        self.separator_bytes.to_vec()
    }

    /// A record-sized buffer filled with the encoded fill char.
    pub(crate) fn blank_record(&self) -> Vec<u8> {
        self.fill_bytes.iter().copied().cycle().take(self.record_length).collect()
    }
}

impl fmt::Debug for FixedLengthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedLengthConfig")
            .field("record_length", &self.record_length)
            .field("charset", &self.charset.name())
            .field("line_separator", &self.line_separator)
            .field("fill_char", &self.fill_char)
            .field("records", &self.records)
            .field("multi_layout", &self.is_multi_layout())
            .finish()
    }
}

/// Common settings; pick a layout kind to declare fields.
#[derive(Debug, Clone)]
pub struct FixedLengthConfigBuilder {
    record_length: usize,
    charset: Charset,
    line_separator: String,
    fill_char: char,
}

impl FixedLengthConfigBuilder {
    #[must_use]
    pub fn charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    #[must_use]
    pub fn line_separator(mut self, line_separator: impl Into<String>) -> Self {
        self.line_separator = line_separator.into();
        self
    }

    #[must_use]
    pub fn fill_char(mut self, fill_char: char) -> Self {
        self.fill_char = fill_char;
        self
    }

    /// Every record has the same layout.
    #[must_use]
    pub fn single_layout(self) -> SingleLayoutBuilder {
        SingleLayoutBuilder { base: self, fields: Vec::new() }
    }

    /// Records are told apart by a [`RecordIdentifier`].
    #[must_use]
    pub fn multi_layout(self) -> MultiLayoutBuilder {
        MultiLayoutBuilder { base: self, records: Vec::new(), current: None, orphan_field: false, identifier: None }
    }

    fn verify_length(&self) -> Result<()> {
        if self.record_length == 0 {
            return Err(DataBindError::Layout("length is invalid. must set greater than 0.".to_string()));
        }
        Ok(())
    }

    fn finish(
        self,
        records: Vec<RecordLayout>,
        identifier: Option<Arc<dyn RecordIdentifier>>,
    ) -> Result<FixedLengthConfig> {
        let separator_bytes = charset::encode(self.charset, &self.line_separator)
            .map(std::borrow::Cow::into_owned)
            .map_err(|e| DataBindError::Layout(format!("line separator is invalid. {e}")))?;
        let fill_bytes = charset::encode_char(self.charset, self.fill_char)
            .map_err(|e| DataBindError::Layout(format!("fill char is invalid. {e}")))?;
        debug!(
            record_length = self.record_length,
            charset = self.charset.name(),
            records = records.len(),
            multi_layout = identifier.is_some(),
            "fixed-length config built"
        );
        Ok(FixedLengthConfig {
            record_length: self.record_length,
            charset: self.charset,
            separator_bytes: separator_bytes.into(),
            line_separator: self.line_separator,
            fill_char: self.fill_char,
            fill_bytes: fill_bytes.into(),
            records: records.into(),
            identifier,
        })
    }
}

/// Declares the fields of a single-layout config.
#[derive(Debug)]
pub struct SingleLayoutBuilder {
    base: FixedLengthConfigBuilder,
    fields: Vec<FieldSpec>,
}

impl SingleLayoutBuilder {
    /// Adds a text field using the default converter.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, offset: usize, length: usize) -> Self {
        self.fields.push(FieldSpec::new(name, offset, length));
        self
    }

    #[must_use]
    pub fn field_with(
        mut self,
        name: impl Into<String>,
        offset: usize,
        length: usize,
        converter: impl FieldConverter + 'static,
    ) -> Self {
        self.fields.push(FieldSpec::with_converter(name, offset, length, converter));
        self
    }

    /// Adds a prepared field spec.
    #[must_use]
    pub fn field_spec(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(self) -> Result<FixedLengthConfig> {
        self.base.verify_length()?;
        let layout = validate_and_build(SINGLE_LAYOUT_RECORD_NAME, self.fields, self.base.record_length)?;
        self.base.finish(vec![layout], None)
    }
}

/// Declares the records of a multi-layout config.
///
/// Fields belong to the record most recently named with
/// [`record`](Self::record).
pub struct MultiLayoutBuilder {
    base: FixedLengthConfigBuilder,
    records: Vec<(String, Vec<FieldSpec>)>,
    current: Option<usize>,
    orphan_field: bool,
    identifier: Option<Arc<dyn RecordIdentifier>>,
}

impl MultiLayoutBuilder {
    /// Starts (or restarts) the record `name`.
    #[must_use]
    pub fn record(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        let index = match self.records.iter().position(|(n, _)| *n == name) {
            Some(index) => {
                self.records[index].1.clear();
                index
            }
            None => {
                self.records.push((name, Vec::new()));
                self.records.len() - 1
            }
        };
        self.current = Some(index);
        self
    }

    /// Adds a text field to the current record.
    #[must_use]
    pub fn field(self, name: impl Into<String>, offset: usize, length: usize) -> Self {
        self.field_spec(FieldSpec::new(name, offset, length))
    }

    #[must_use]
    pub fn field_with(
        self,
        name: impl Into<String>,
        offset: usize,
        length: usize,
        converter: impl FieldConverter + 'static,
    ) -> Self {
        self.field_spec(FieldSpec::with_converter(name, offset, length, converter))
    }

    /// Adds a prepared field spec to the current record.
    #[must_use]
    pub fn field_spec(mut self, field: FieldSpec) -> Self {
        match self.current {
            Some(index) => self.records[index].1.push(field),
            None => self.orphan_field = true,
        }
        self
    }

    #[must_use]
    pub fn record_identifier(mut self, identifier: impl RecordIdentifier + 'static) -> Self {
        self.identifier = Some(Arc::new(identifier));
        self
    }

    pub fn build(self) -> Result<FixedLengthConfig> {
        if self.orphan_field {
            return Err(DataBindError::Layout(
                "must be calling record method before calling field method.".to_string(),
            ));
        }
        let Some(identifier) = self.identifier else {
            return Err(DataBindError::Layout("record identifier is undefined.".to_string()));
        };
        self.base.verify_length()?;
        if self.records.is_empty() {
            return Err(DataBindError::Layout("record was not found.".to_string()));
        }

        let record_length = self.base.record_length;
        let layouts = self
            .records
            .into_iter()
            .map(|(name, fields)| validate_and_build(&name, fields, record_length))
            .collect::<Result<Vec<_>>>()?;
        self.base.finish(layouts, Some(identifier))
    }
}

impl fmt::Debug for MultiLayoutBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiLayoutBuilder")
            .field("base", &self.base)
            .field("records", &self.records)
            .field("has_identifier", &self.identifier.is_some())
            .finish_non_exhaustive()
    }
}
