//! Declarative format definitions loaded from JSON.
//!
//! A [`Schema`] describes a CSV format, a fixed-length format, or both, and
//! converts them into validated [`CsvConfig`] / [`FixedLengthConfig`] values.
//!
//! ```
//! use databind::schema::Schema;
//!
//! let schema = Schema::from_json(r#"{
//!     "csv": { "preset": "rfc4180", "properties": ["name", "age"] },
//!     "fixed_length": {
//!         "record_length": 7,
//!         "line_separator": "\n",
//!         "fields": [
//!             { "name": "name", "offset": 1, "length": 4, "converter": { "type": "rpad" } },
//!             { "name": "age", "offset": 5, "length": 3, "converter": { "type": "lpad" } }
//!         ]
//!     }
//! }"#).unwrap();
//!
//! assert_eq!(schema.csv_config().unwrap().keys(), ["name", "age"]);
//! assert_eq!(schema.fixed_length_config().unwrap().record_length(), 7);
//! ```

use std::{collections::BTreeMap, io::Read};

use serde::Deserialize;

use crate::{
    charset,
    csv::{CsvConfig, CsvConfigBuilder, LineSeparator, QuoteMode},
    error::{DataBindError, Result},
    fixed::{Binary, FieldSpec, FixedLengthConfig, Lpad, RegionIdentifier, Rpad},
    mapper::{FormatConfig, FormatKind},
};

/// Root of a schema file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Schema {
    #[serde(default)]
    pub csv: Option<CsvSchema>,
    #[serde(default)]
    pub fixed_length: Option<FixedLengthSchema>,
}

impl Schema {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Builds the CSV config; fails if the schema has no `csv` section.
    pub fn csv_config(&self) -> Result<CsvConfig> {
        self.csv
            .as_ref()
            .ok_or_else(|| DataBindError::Config("csv definition is not found.".to_string()))?
            .to_config()
    }

    /// Builds the fixed-length config; fails if the schema has no `fixed_length` section.
    pub fn fixed_length_config(&self) -> Result<FixedLengthConfig> {
        self.fixed_length
            .as_ref()
            .ok_or_else(|| DataBindError::Layout("fixed-length definition is not found.".to_string()))?
            .to_config()
    }

    /// Builds the config of the given kind.
    pub fn format_config(&self, kind: FormatKind) -> Result<FormatConfig> {
        Ok(match kind {
            FormatKind::Csv => self.csv_config()?.into(),
            FormatKind::FixedLength => self.fixed_length_config()?.into(),
        })
    }
}

/// Starting point of a CSV definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CsvPreset {
    #[default]
    Default,
    Rfc4180,
    Excel,
    Tsv,
}

impl CsvPreset {
    fn builder(self) -> CsvConfigBuilder {
        match self {
            Self::Default => CsvConfig::builder(),
            Self::Rfc4180 => CsvConfig::rfc4180(),
            Self::Excel => CsvConfig::excel(),
            Self::Tsv => CsvConfig::tsv(),
        }
    }
}

/// CSV definition; unset settings keep the preset's value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CsvSchema {
    pub preset: CsvPreset,
    pub field_separator: Option<char>,
    pub quote: Option<char>,
    pub line_separator: Option<String>,
    pub quote_mode: Option<QuoteMode>,
    pub quoted_columns: Vec<String>,
    pub header_titles: Vec<String>,
    pub properties: Vec<String>,
    pub header_required: Option<bool>,
    pub ignore_empty_lines: Option<bool>,
    pub empty_to_null: Option<bool>,
    pub charset: Option<String>,
}

impl CsvSchema {
    pub fn to_config(&self) -> Result<CsvConfig> {
        let mut builder = self
            .preset
            .builder()
            .with_quoted_columns(self.quoted_columns.iter().cloned())
            .with_header_titles(self.header_titles.iter().cloned())
            .with_properties(self.properties.iter().cloned());

        if let Some(c) = self.field_separator {
            builder = builder.with_field_separator(c);
        }
        if let Some(c) = self.quote {
            builder = builder.with_quote(c);
        }
        if let Some(s) = &self.line_separator {
            builder = builder.with_line_separator(s.parse::<LineSeparator>()?);
        }
        if let Some(mode) = self.quote_mode {
            builder = builder.with_quote_mode(mode);
        }
        if let Some(b) = self.header_required {
            builder = builder.with_header_required(b);
        }
        if let Some(b) = self.ignore_empty_lines {
            builder = builder.with_ignore_empty_lines(b);
        }
        if let Some(b) = self.empty_to_null {
            builder = builder.with_empty_to_null(b);
        }
        if let Some(label) = &self.charset {
            builder = builder.with_charset(charset::for_label(label)?);
        }
        builder.build()
    }
}

/// Fixed-length definition.
///
/// Single-layout formats list `fields`; multi-layout formats list
/// `records` and an `identifier`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixedLengthSchema {
    pub record_length: usize,
    #[serde(default)]
    pub charset: Option<String>,
    #[serde(default)]
    pub line_separator: String,
    #[serde(default)]
    pub fill_char: Option<char>,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
    #[serde(default)]
    pub records: Vec<RecordSchema>,
    #[serde(default)]
    pub identifier: Option<IdentifierSchema>,
}

impl FixedLengthSchema {
    pub fn to_config(&self) -> Result<FixedLengthConfig> {
        let charset = match &self.charset {
            Some(label) => charset::for_label(label)?,
            None => charset::UTF_8,
        };
        let mut builder =
            FixedLengthConfig::builder(self.record_length).charset(charset).line_separator(&self.line_separator);
        if let Some(c) = self.fill_char {
            builder = builder.fill_char(c);
        }

        if self.records.is_empty() {
            if self.identifier.is_some() {
                return Err(DataBindError::Layout("record identifier requires records.".to_string()));
            }
            return self.fields.iter().fold(builder.single_layout(), |b, f| b.field_spec(f.to_spec())).build();
        }

        if !self.fields.is_empty() {
            return Err(DataBindError::Layout("fields and records can not be used together.".to_string()));
        }
        let mut multi = builder.multi_layout();
        for record in &self.records {
            multi = record.fields.iter().fold(multi.record(&record.name), |b, f| b.field_spec(f.to_spec()));
        }
        if let Some(identifier) = &self.identifier {
            multi = multi.record_identifier(identifier.to_identifier(charset)?);
        }
        multi.build()
    }
}

/// One record of a multi-layout definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordSchema {
    pub name: String,
    pub fields: Vec<FieldSchema>,
}

/// One field declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSchema {
    pub name: String,
    pub offset: usize,
    pub length: usize,
    #[serde(default)]
    pub converter: ConverterSchema,
}

impl FieldSchema {
    pub fn to_spec(&self) -> FieldSpec {
        let (name, offset, length) = (self.name.as_str(), self.offset, self.length);
        match self.converter {
            ConverterSchema::Default => FieldSpec::new(name, offset, length),
            ConverterSchema::Rpad { pad_char } => {
                FieldSpec::with_converter(name, offset, length, pad_char.map_or_else(Rpad::default, Rpad::new))
            }
            ConverterSchema::Lpad { pad_char } => {
                FieldSpec::with_converter(name, offset, length, pad_char.map_or_else(Lpad::default, Lpad::new))
            }
            ConverterSchema::Binary => FieldSpec::with_converter(name, offset, length, Binary),
        }
    }
}

/// Converter of a field; `{"type": "rpad", "pad_char": " "}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConverterSchema {
    #[default]
    Default,
    Rpad {
        #[serde(default)]
        pad_char: Option<char>,
    },
    Lpad {
        #[serde(default)]
        pad_char: Option<char>,
    },
    Binary,
}

/// Discriminator region of a multi-layout definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentifierSchema {
    pub offset: usize,
    pub length: usize,
    /// Region text -> record name.
    pub values: BTreeMap<String, String>,
    #[serde(default)]
    pub default: Option<String>,
}

impl IdentifierSchema {
    pub fn to_identifier(&self, charset: charset::Charset) -> Result<RegionIdentifier> {
        let identifier = self
            .values
            .iter()
            .fold(RegionIdentifier::new(self.offset, self.length, charset)?, |id, (value, name)| {
                id.value(value, name)
            });
        Ok(match &self.default {
            Some(name) => identifier.default_record(name),
            None => identifier,
        })
    }
}
