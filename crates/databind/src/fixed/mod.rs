//! Кодек записей фиксированной длины.
//!
//! - [`FixedLengthConfig`]: длина записи, кодировка, разделитель и раскладки
//! - [`validate_and_build`]: проверка раскладки и заполнение пропусков
//! - [`FieldConverter`] и встроенные конвертеры полей
//! - [`FixedLengthReader`] / [`FixedLengthWriter`]: потоковое чтение и запись

mod config;
mod converter;
mod identifier;
mod layout;
mod reader;
mod writer;

pub use config::{
    FixedLengthConfig, FixedLengthConfigBuilder, MultiLayoutBuilder, RecordIdentifier,
    SINGLE_LAYOUT_RECORD_NAME, SingleLayoutBuilder,
};
pub use converter::{Binary, DefaultConverter, FieldConverter, Filler, Lpad, Rpad};
pub use identifier::RegionIdentifier;
pub use layout::{FILLER_FIELD_NAME, FieldSpec, RecordLayout, validate_and_build};
pub use reader::FixedLengthReader;
pub use writer::FixedLengthWriter;
