//! Record layouts: validated, gap-filled field lists.

use std::{fmt, ops::Range, sync::Arc};

use tracing::debug;

use super::converter::{DefaultConverter, FieldConverter, Filler};
use crate::error::{DataBindError, Result};

/// Name given to synthesized gap fields.
pub const FILLER_FIELD_NAME: &str = "filler";

/// Position, width and converter of one field.
#[derive(Clone)]
pub struct FieldSpec {
    name: String,
    /// 1-based byte offset.
    offset: usize,
    length: usize,
    converter: Arc<dyn FieldConverter>,
    filler: bool,
}

impl FieldSpec {
    /// A text field using [`DefaultConverter`].
    pub fn new(name: impl Into<String>, offset: usize, length: usize) -> Self {
        Self::with_converter(name, offset, length, DefaultConverter)
    }

    pub fn with_converter(
        name: impl Into<String>,
        offset: usize,
        length: usize,
        converter: impl FieldConverter + 'static,
    ) -> Self {
        Self::with_shared_converter(name, offset, length, Arc::new(converter))
    }

    /// Like [`with_converter`](Self::with_converter), reusing a shared converter.
    pub fn with_shared_converter(
        name: impl Into<String>,
        offset: usize,
        length: usize,
        converter: Arc<dyn FieldConverter>,
    ) -> Self {
        Self { name: name.into(), offset, length, converter, filler: false }
    }

    pub(crate) fn filler(offset: usize, length: usize) -> Self {
        Self {
            name: FILLER_FIELD_NAME.to_string(),
            offset,
            length,
            converter: Arc::new(Filler),
            filler: true,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    #[must_use]
    pub fn converter(&self) -> &dyn FieldConverter {
        self.converter.as_ref()
    }

    /// `true` for fields synthesized to cover a gap.
    #[must_use]
    pub fn is_filler(&self) -> bool {
        self.filler
    }

    /// Zero-based byte range within the record.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        let start = self.offset.saturating_sub(1);
        start..start.saturating_add(self.length)
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("offset", &self.offset)
            .field("length", &self.length)
            .field("converter", &self.converter)
            .field("filler", &self.filler)
            .finish()
    }
}

/// Offset-ordered fields covering bytes `1..=record_length` exactly.
#[derive(Debug, Clone)]
pub struct RecordLayout {
    name: String,
    record_length: usize,
    fields: Vec<FieldSpec>,
}

impl RecordLayout {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn record_length(&self) -> usize {
        self.record_length
    }

    /// All fields, fillers included, in offset order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Declared fields only.
    pub fn data_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| !f.is_filler())
    }
}

/// Validates the declared fields of one record and fills the gaps.
///
/// Fields are sorted by offset; a gap before a field or after the last one
/// becomes a [`Filler`] field. Fails on a zero record length, a record
/// without fields, a zero-length field, overlapping fields, duplicate names
/// and fields reaching past `record_length`.
pub fn validate_and_build(
    record_name: &str,
    mut fields: Vec<FieldSpec>,
    record_length: usize,
) -> Result<RecordLayout> {
    if record_length == 0 {
        return Err(DataBindError::Layout("length is invalid. must set greater than 0.".to_string()));
    }
    if fields.is_empty() {
        return Err(DataBindError::Layout(format!("field was not found. record_name:{record_name}")));
    }
    if let Some(field) = fields.iter().find(|f| f.length == 0) {
        return Err(DataBindError::Layout(format!(
            "field length must be greater than 0. record_name:{record_name}, field_name:{}",
            field.name
        )));
    }
    for (i, field) in fields.iter().enumerate() {
        if fields[..i].iter().any(|f| f.name == field.name) {
            return Err(DataBindError::Layout(format!(
                "field name is duplicated. record_name:{record_name}, field_name:{}",
                field.name
            )));
        }
    }

    fields.sort_by_key(|f| f.offset);

    let mut layout = Vec::with_capacity(fields.len() + 1);
    let mut expected_offset = 1;
    for field in fields {
        if field.offset < expected_offset {
            return Err(DataBindError::Layout(format!(
                "field offset is invalid. record_name:{record_name}, field_name:{}, expected offset:{expected_offset} but was {}",
                field.name, field.offset
            )));
        }
        if field.offset > expected_offset {
            layout.push(FieldSpec::filler(expected_offset, field.offset - expected_offset));
        }
        expected_offset = field.offset.checked_add(field.length).ok_or_else(|| {
            DataBindError::Layout(format!(
                "field offset is invalid. record_name:{record_name}, field_name:{}, offset:{} and length:{} overflow",
                field.name, field.offset, field.length
            ))
        })?;
        layout.push(field);
    }

    if expected_offset - 1 > record_length {
        // The loop pushed at least one declared field, and it is the last one.
        let last = layout.last().map(|f| (f.name.clone(), f.offset, f.length)).unwrap_or_default();
        return Err(DataBindError::Layout(format!(
            "field length is invalid. record_name:{record_name}, field_name:{}, expected length:{} but was {}",
            last.0,
            record_length.saturating_sub(last.1.saturating_sub(1)),
            last.2
        )));
    }
    if expected_offset <= record_length {
        layout.push(FieldSpec::filler(expected_offset, record_length - expected_offset + 1));
    }

    debug!(
        record = record_name,
        fields = layout.len(),
        fillers = layout.iter().filter(|f| f.is_filler()).count(),
        record_length,
        "record layout built"
    );
    Ok(RecordLayout { name: record_name.to_string(), record_length, fields: layout })
}
