//! Format-independent entry points.
//!
//! [`FormatConfig`] selects a codec at runtime; [`RecordReader`] and
//! [`RecordWriter`] wrap the concrete readers and writers so callers can
//! stream records without knowing the format.

use std::io::{Read, Write};

use crate::{
    csv::{CsvConfig, CsvReader, CsvWriter},
    error::Result,
    fixed::{FixedLengthConfig, FixedLengthReader, FixedLengthWriter},
    record::Record,
};

/// Kind of format, without its settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Csv,
    FixedLength,
}

/// A validated configuration for one of the supported formats.
#[derive(Debug, Clone)]
pub enum FormatConfig {
    Csv(CsvConfig),
    FixedLength(FixedLengthConfig),
}

impl FormatConfig {
    #[must_use]
    pub fn kind(&self) -> FormatKind {
        match self {
            Self::Csv(_) => FormatKind::Csv,
            Self::FixedLength(_) => FormatKind::FixedLength,
        }
    }

    /// Opens a reader over `reader` decoding bytes with the configured charset.
    pub fn open_reader<R: Read>(&self, reader: R) -> RecordReader<R> {
        match self {
            Self::Csv(config) => RecordReader::Csv(CsvReader::new(reader, config.clone())),
            Self::FixedLength(config) => RecordReader::FixedLength(FixedLengthReader::new(reader, config.clone())),
        }
    }

    /// Opens a writer over `writer` encoding with the configured charset.
    pub fn open_writer<W: Write>(&self, writer: W) -> RecordWriter<W> {
        match self {
            Self::Csv(config) => RecordWriter::Csv(CsvWriter::new(writer, config.clone())),
            Self::FixedLength(config) => RecordWriter::FixedLength(FixedLengthWriter::new(writer, config.clone())),
        }
    }
}

impl From<CsvConfig> for FormatConfig {
    fn from(config: CsvConfig) -> Self {
        Self::Csv(config)
    }
}

impl From<FixedLengthConfig> for FormatConfig {
    fn from(config: FixedLengthConfig) -> Self {
        Self::FixedLength(config)
    }
}

/// Reader over any supported format.
pub enum RecordReader<R: Read> {
    Csv(CsvReader<R>),
    FixedLength(FixedLengthReader<R>),
}

impl<R: Read> RecordReader<R> {
    /// Reads the next record. Returns `Ok(None)` at end of data.
    pub fn read_record(&mut self) -> Result<Option<Record>> {
        match self {
            Self::Csv(r) => r.read_record(),
            Self::FixedLength(r) => r.read_record(),
        }
    }

    #[must_use]
    pub fn records_read(&self) -> u64 {
        match self {
            Self::Csv(r) => r.records_read(),
            Self::FixedLength(r) => r.records_read(),
        }
    }

    pub fn close(self) -> Result<()> {
        match self {
            Self::Csv(r) => r.close(),
            Self::FixedLength(r) => r.close(),
        }
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Csv(r) => r.next(),
            Self::FixedLength(r) => r.next(),
        }
    }
}

/// Writer for any supported format.
pub enum RecordWriter<W: Write> {
    Csv(CsvWriter<W>),
    FixedLength(FixedLengthWriter<W>),
}

impl<W: Write> RecordWriter<W> {
    /// Writes one keyed record. CSV takes the values of the configured keys.
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        match self {
            Self::Csv(w) => w.write_record(record),
            Self::FixedLength(w) => w.write_record(record),
        }
    }

    #[must_use]
    pub fn records_written(&self) -> u64 {
        match self {
            Self::Csv(w) => w.records_written(),
            Self::FixedLength(w) => w.records_written(),
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        match self {
            Self::Csv(w) => w.flush(),
            Self::FixedLength(w) => w.flush(),
        }
    }

    pub fn into_inner(self) -> Result<W> {
        match self {
            Self::Csv(w) => w.into_inner(),
            Self::FixedLength(w) => w.into_inner(),
        }
    }

    pub fn close(self) -> Result<()> {
        match self {
            Self::Csv(w) => w.close(),
            Self::FixedLength(w) => w.close(),
        }
    }
}
