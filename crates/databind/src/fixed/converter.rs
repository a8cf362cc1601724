//! Field converters: byte slice <-> [`Value`] for one fixed-length field.
//!
//! Converters are stateless apart from their own settings (pad character)
//! and are shared between every layout that uses them.

use std::{borrow::Cow, fmt};

use super::{config::FixedLengthConfig, layout::FieldSpec};
use crate::{
    charset,
    error::{DataBindError, Result},
    record::Value,
};

/// Converts a field's bytes to a [`Value`] and back.
pub trait FieldConverter: fmt::Debug + Send + Sync {
    /// Decodes the bytes of `field` sliced out of a record.
    fn decode(&self, field: &FieldSpec, input: &[u8], config: &FixedLengthConfig) -> Result<Value>;

    /// Encodes `value` into exactly `field.length()` bytes.
    fn encode(&self, field: &FieldSpec, value: &Value, config: &FixedLengthConfig) -> Result<Vec<u8>>;
}

/// Text form of a value for the text converters.
fn text_of<'a>(field: &FieldSpec, value: &'a Value) -> Result<Cow<'a, str>> {
    value.to_text().ok_or_else(|| {
        DataBindError::field_encoding(
            field.name(),
            format!(
                "value can not be converted to text. type = [{}]. field_name: {}",
                value.type_name(),
                field.name()
            ),
        )
    })
}

fn unmappable_error(field: &FieldSpec, err: charset::Unmappable) -> DataBindError {
    DataBindError::field_encoding(field.name(), format!("{err}. field_name: {}", field.name()))
}

/// Text in the config's charset.
fn encode_text<'a>(field: &FieldSpec, text: &'a str, config: &FixedLengthConfig) -> Result<Cow<'a, [u8]>> {
    charset::encode(config.charset(), text).map_err(|e| unmappable_error(field, e))
}

/// A pad or fill character in the config's charset.
fn encode_pad(field: &FieldSpec, c: char, config: &FixedLengthConfig) -> Result<Vec<u8>> {
    charset::encode_char(config.charset(), c).map_err(|e| unmappable_error(field, e))
}

fn padding_error(field: &FieldSpec, actual: usize, output: &str, pad_char: char) -> DataBindError {
    DataBindError::field_encoding(
        field.name(),
        format!(
            "length after padding is invalid. expected length {} but was actual length {actual}. \
             field_name: {} output value: {output} padding_char: {pad_char}",
            field.length(),
            field.name()
        ),
    )
}

/// Plain text in the config's charset. The value must already have the
/// field's exact length; nothing is padded.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConverter;

impl FieldConverter for DefaultConverter {
    fn decode(&self, _field: &FieldSpec, input: &[u8], config: &FixedLengthConfig) -> Result<Value> {
        Ok(Value::Text(charset::decode(config.charset(), input).into_owned()))
    }

    fn encode(&self, field: &FieldSpec, value: &Value, config: &FixedLengthConfig) -> Result<Vec<u8>> {
        let text = text_of(field, value)?;
        let chars = text.chars().count();
        if chars != field.length() {
            return Err(DataBindError::field_encoding(
                field.name(),
                format!(
                    "length is invalid. expected length {} but was actual length {chars}. \
                     field_name: {} output value: {text}",
                    field.length(),
                    field.name()
                ),
            ));
        }
        Ok(encode_text(field, &text, config)?.into_owned())
    }
}

/// Left-aligned text padded on the right with `pad_char` (space by default).
#[derive(Debug, Clone, Copy)]
pub struct Rpad {
    pad_char: char,
}

impl Rpad {
    #[must_use]
    pub const fn new(pad_char: char) -> Self {
        Self { pad_char }
    }

    #[must_use]
    pub const fn pad_char(&self) -> char {
        self.pad_char
    }
}

impl Default for Rpad {
    fn default() -> Self {
        Self::new(' ')
    }
}

impl FieldConverter for Rpad {
    fn decode(&self, _field: &FieldSpec, input: &[u8], config: &FixedLengthConfig) -> Result<Value> {
        let text = charset::decode(config.charset(), input);
        Ok(Value::Text(text.trim_end_matches(self.pad_char).to_string()))
    }

    fn encode(&self, field: &FieldSpec, value: &Value, config: &FixedLengthConfig) -> Result<Vec<u8>> {
        let text = text_of(field, value)?;
        let pad = encode_pad(field, self.pad_char, config)?;
        let mut out = encode_text(field, &text, config)?.into_owned();

        while out.len() < field.length() {
            out.extend_from_slice(&pad);
        }
        if out.len() != field.length() {
            return Err(padding_error(field, out.len(), &text, self.pad_char));
        }
        Ok(out)
    }
}

/// Right-aligned text padded on the left with `pad_char` (`0` by default).
#[derive(Debug, Clone, Copy)]
pub struct Lpad {
    pad_char: char,
}

impl Lpad {
    #[must_use]
    pub const fn new(pad_char: char) -> Self {
        Self { pad_char }
    }

    #[must_use]
    pub const fn pad_char(&self) -> char {
        self.pad_char
    }
}

impl Default for Lpad {
    fn default() -> Self {
        Self::new('0')
    }
}

impl FieldConverter for Lpad {
    fn decode(&self, _field: &FieldSpec, input: &[u8], config: &FixedLengthConfig) -> Result<Value> {
        let text = charset::decode(config.charset(), input);
        Ok(Value::Text(text.trim_start_matches(self.pad_char).to_string()))
    }

    fn encode(&self, field: &FieldSpec, value: &Value, config: &FixedLengthConfig) -> Result<Vec<u8>> {
        let text = text_of(field, value)?;
        let pad = encode_pad(field, self.pad_char, config)?;
        let bytes = encode_text(field, &text, config)?;

        let prefix_len = field.length().saturating_sub(bytes.len());
        let mut out = Vec::with_capacity(field.length());
        while out.len() < prefix_len {
            out.extend_from_slice(&pad);
        }
        out.extend_from_slice(&bytes);
        if out.len() != field.length() {
            return Err(padding_error(field, out.len(), &text, self.pad_char));
        }
        Ok(out)
    }
}

/// Raw bytes, passed through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Binary;

impl FieldConverter for Binary {
    fn decode(&self, _field: &FieldSpec, input: &[u8], _config: &FixedLengthConfig) -> Result<Value> {
        Ok(Value::Bytes(input.to_vec()))
    }

    fn encode(&self, field: &FieldSpec, value: &Value, _config: &FixedLengthConfig) -> Result<Vec<u8>> {
        let bytes = value
            .as_bytes()
            .ok_or_else(|| DataBindError::field_encoding(field.name(), "output is byte array only."))?;
        if bytes.len() != field.length() {
            return Err(DataBindError::field_length(field.name(), field.length(), bytes.len()));
        }
        Ok(bytes.to_vec())
    }
}

/// Unused byte range. Writes the config's fill char whatever the value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Filler;

impl FieldConverter for Filler {
    fn decode(&self, _field: &FieldSpec, input: &[u8], config: &FixedLengthConfig) -> Result<Value> {
        Ok(Value::Text(charset::decode(config.charset(), input).into_owned()))
    }

    fn encode(&self, field: &FieldSpec, _value: &Value, config: &FixedLengthConfig) -> Result<Vec<u8>> {
        let fill = encode_pad(field, config.fill_char(), config)?;
        let mut out = Vec::with_capacity(field.length());
        while out.len() < field.length() {
            out.extend_from_slice(&fill);
        }
        if out.len() != field.length() {
            return Err(padding_error(field, out.len(), "", config.fill_char()));
        }
        Ok(out)
    }
}
