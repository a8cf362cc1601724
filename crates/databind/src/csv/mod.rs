//! Кодек CSV.
//!
//! - [`CsvConfig`] / [`CsvConfigBuilder`]: формат и пресеты
//! - [`CsvTokenizer`]: разбиение потока символов на поля
//! - [`CsvReader`] / [`CsvWriter`]: потоковое чтение и запись записей

mod config;
mod reader;
mod tokenizer;
mod writer;

pub use config::{CsvConfig, CsvConfigBuilder, LineSeparator, QuoteMode};
pub use reader::CsvReader;
pub use tokenizer::{CsvTokenizer, Field, Terminator};
pub use writer::CsvWriter;
