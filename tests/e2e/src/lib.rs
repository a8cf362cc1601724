//! # e2e-tests - End-to-end тесты CLI инструмента `converter`
//!
//! Тесты запускают собранный бинарник и проверяют конвертацию между
//! CSV и файлами фиксированной длины по JSON-схеме.
//!
//! ## Фикстуры
//!
//! Тестовые файлы расположены в `fixtures/`:
//! - `accounts.json` — схема с CSV и фиксированной раскладкой (20 байт)
//! - `accounts.csv` — те же записи в CSV с заголовком
//! - `accounts.dat` — записи фиксированной длины
//! - `multi_layout.json` — схема с несколькими раскладками (не конвертируется)

use std::path::PathBuf;

/// Получить путь к директории фикстур.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Получить путь к фикстуре по имени файла.
pub fn fixture(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}
