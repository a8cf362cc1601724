//! Библиотека привязки данных для CSV и файлов с записями фиксированной длины.
//!
//! Крейт преобразует внешние форматы в записи ключ-значение ([`Record`]) и обратно:
//!
//! - **CSV** — настраиваемые разделитель, кавычки, перевод строки и режим
//!   кавычек, заголовок, пропуск пустых строк ([`csv`])
//! - **Фиксированная длина** — записи по смещениям в байтах, конвертеры полей
//!   (Rpad, Lpad, Binary), несколько раскладок с выбором по дискриминатору ([`fixed`])
//!
//! Конфигурация строится один раз и затем только читается; ридеры и райтеры
//! создаются на каждый поток. [`schema`] загружает конфигурации из JSON,
//! [`mapper`] выбирает кодек во время выполнения.
//!
//! # Быстрый старт
//!
//! ```
//! use databind::fixed::{FixedLengthConfig, FixedLengthWriter, Lpad, Rpad};
//! use databind::{Record, Value};
//!
//! let config = FixedLengthConfig::builder(7)
//!     .line_separator("\r\n")
//!     .single_layout()
//!     .field_with("name", 1, 4, Rpad::default())
//!     .field_with("age", 5, 3, Lpad::default())
//!     .build()
//!     .unwrap();
//!
//! let record: Record = [("name", Value::from("ab")), ("age", Value::from(3))].into_iter().collect();
//!
//! let mut writer = FixedLengthWriter::new(Vec::new(), config);
//! writer.write_record(&record).unwrap();
//! assert_eq!(writer.into_inner().unwrap(), b"ab  003\r\n");
//! ```

pub mod charset;
pub mod csv;
pub mod error;
pub mod fixed;
pub mod mapper;
pub mod record;
pub mod schema;

pub use error::{DataBindError, Result};
pub use record::{Record, Value};
