//! Character-level CSV scanner.
//!
//! [`CsvTokenizer`] yields one [`Field`] per call. Bytes are decoded
//! incrementally with the configured charset, so multi-byte sequences
//! split across read boundaries decode correctly.

use std::io::Read;

use encoding_rs::{CoderResult, Decoder};
use tracing::warn;

use super::config::{CsvConfig, LineSeparator};
use crate::{
    charset::Charset,
    error::{DataBindError, Result},
};

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// What ended a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// The field separator; more fields follow on the same row.
    FieldSeparator,
    /// The configured line separator.
    LineSeparator,
    /// End of stream.
    EndOfStream,
}

/// One scanned field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field text with quotes removed and escaped quotes collapsed.
    pub value: String,
    /// Whether the field was enclosed in quotes.
    pub quoted: bool,
    /// What ended the field.
    pub terminator: Terminator,
}

/// Incremental charset decoder with one character of look-ahead.
struct CharSource<R> {
    inner: R,
    decoder: Decoder,
    raw: Vec<u8>,
    decoded: String,
    pos: usize,
    eof: bool,
}

impl<R: Read> CharSource<R> {
    fn new(inner: R, charset: Charset) -> Self {
        Self {
            inner,
            decoder: charset.new_decoder_without_bom_handling(),
            raw: vec![0; READ_BUFFER_SIZE],
            decoded: String::new(),
            pos: 0,
            eof: false,
        }
    }

    /// Refills the decoded buffer. Returns `false` once the stream is drained.
    fn fill(&mut self) -> Result<bool> {
        while self.pos >= self.decoded.len() {
            if self.eof {
                return Ok(false);
            }
            let n = self.inner.read(&mut self.raw)?;
            let last = n == 0;

            self.decoded.clear();
            self.pos = 0;
            let needed = self.decoder.max_utf8_buffer_length(n).unwrap_or(n * 3 + 16);
            self.decoded.reserve(needed);
            let (result, _, replaced) = self.decoder.decode_to_string(&self.raw[..n], &mut self.decoded, last);
            debug_assert_eq!(result, CoderResult::InputEmpty);
            if replaced {
                warn!(encoding = self.decoder.encoding().name(), "malformed input replaced with U+FFFD");
            }

            if last {
                self.eof = true;
            }
        }
        Ok(true)
    }

    fn peek(&mut self) -> Result<Option<char>> {
        if !self.fill()? {
            return Ok(None);
        }
        Ok(self.decoded[self.pos..].chars().next())
    }

    fn next(&mut self) -> Result<Option<char>> {
        let c = self.peek()?;
        if let Some(c) = c {
            self.pos += c.len_utf8();
        }
        Ok(c)
    }

    fn into_inner(self) -> R {
        self.inner
    }
}

/// Splits a character stream into CSV fields.
pub struct CsvTokenizer<R> {
    source: CharSource<R>,
    field_separator: char,
    quote: char,
    line_separator: LineSeparator,
    /// Current physical line (1-based).
    line_number: u64,
    /// A field separator was consumed, so one more field is due even at EOF.
    field_pending: bool,
}

impl<R: Read> CsvTokenizer<R> {
    /// Creates a tokenizer decoding `reader` with the config's charset.
    pub fn new(reader: R, config: &CsvConfig) -> Self {
        Self::with_charset(reader, config, config.charset())
    }

    /// Creates a tokenizer decoding `reader` with an explicit charset.
    pub fn with_charset(reader: R, config: &CsvConfig, charset: Charset) -> Self {
        Self {
            source: CharSource::new(reader, charset),
            field_separator: config.field_separator(),
            quote: config.quote(),
            line_separator: config.line_separator(),
            line_number: 1,
            field_pending: false,
        }
    }

    /// Current physical line number (1-based).
    #[must_use]
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Returns the underlying reader.
    pub fn into_inner(self) -> R {
        self.source.into_inner()
    }

    /// Scans the next field. Returns `Ok(None)` at end of stream.
    pub fn next_field(&mut self) -> Result<Option<Field>> {
        let Some(first) = self.source.peek()? else {
            if std::mem::take(&mut self.field_pending) {
                return Ok(Some(Field {
                    value: String::new(),
                    quoted: false,
                    terminator: Terminator::EndOfStream,
                }));
            }
            return Ok(None);
        };

        let mut value = String::new();
        let quoted = first == self.quote;
        if quoted {
            self.source.next()?;
            self.read_quoted(&mut value)?;
        }
        let terminator = self.read_unquoted(&mut value)?;
        self.field_pending = terminator == Terminator::FieldSeparator;

        Ok(Some(Field { value, quoted, terminator }))
    }

    /// Copies a quoted region up to and including its closing quote.
    fn read_quoted(&mut self, value: &mut String) -> Result<()> {
        let start_line = self.line_number;
        loop {
            let Some(c) = self.source.next()? else {
                return Err(DataBindError::data_format(
                    format!("EOF reached before quoted token was closed. quoted token started at line {start_line}."),
                    self.line_number,
                ));
            };

            if c == self.quote {
                if self.source.peek()? == Some(self.quote) {
                    self.source.next()?;
                    value.push(c);
                    continue;
                }
                return Ok(());
            }

            value.push(c);
            if self.completes_line_separator(c)? {
                if self.line_separator == LineSeparator::CrLf {
                    self.source.next()?;
                    value.push('\n');
                }
                self.line_number += 1;
            }
        }
    }

    /// Copies characters until a field separator, line separator or EOF.
    fn read_unquoted(&mut self, value: &mut String) -> Result<Terminator> {
        loop {
            let Some(c) = self.source.next()? else {
                return Ok(Terminator::EndOfStream);
            };

            if self.completes_line_separator(c)? {
                if self.line_separator == LineSeparator::CrLf {
                    self.source.next()?;
                }
                self.line_number += 1;
                return Ok(Terminator::LineSeparator);
            }
            if c == self.field_separator {
                return Ok(Terminator::FieldSeparator);
            }
            value.push(c);
        }
    }

    /// Checks whether `c` (already consumed) starts the configured line separator.
    ///
    /// For CRLF the `\n` is only peeked; the caller consumes it.
    fn completes_line_separator(&mut self, c: char) -> Result<bool> {
        Ok(match self.line_separator {
            LineSeparator::Cr => c == '\r',
            LineSeparator::Lf => c == '\n',
            LineSeparator::CrLf => c == '\r' && self.source.peek()? == Some('\n'),
        })
    }
}
