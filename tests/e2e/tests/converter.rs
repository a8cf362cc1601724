//! E2E тесты для CLI инструмента `converter`.
//!
//! Тестируем конвертацию между форматами по схеме `accounts.json`:
//! - fixed (записи фиксированной длины)
//! - csv (с заголовком)

use std::fs;

use assert_cmd::Command;
use e2e_tests::fixture;
use predicates::prelude::*;
use tempfile::tempdir;

/// Создать команду для запуска converter.
///
/// `cargo_bin` deprecated из-за edge case с custom build directories,
/// но это единственный способ для кросс-крейтовых бинарников.
#[expect(deprecated)]
fn converter() -> Command {
    Command::cargo_bin("converter").unwrap()
}

/// Путь к схеме как строка для аргументов.
fn schema(name: &str) -> String {
    fixture(name).to_str().unwrap().to_string()
}

// ============================================================================
// Тесты конвертации
// ============================================================================

#[test]
fn test_fixed_to_csv() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("output.csv");

    converter()
        .args([
            "--schema",
            &schema("accounts.json"),
            "--input",
            fixture("accounts.dat").to_str().unwrap(),
            "--input-format",
            "fixed",
            "--output-format",
            "csv",
            "--output",
            output.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Converted 4 record(s)"));

    let content = fs::read_to_string(&output).unwrap();
    assert_eq!(content, fs::read_to_string(fixture("accounts.csv")).unwrap());
}

#[test]
fn test_csv_to_fixed() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("output.dat");

    converter()
        .args([
            "-s",
            &schema("accounts.json"),
            "-i",
            fixture("accounts.csv").to_str().unwrap(),
            "--input-format",
            "csv",
            "--output-format",
            "fixed",
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let content = fs::read(&output).unwrap();
    assert_eq!(content, fs::read(fixture("accounts.dat")).unwrap());
    // Каждая запись: 20 байт плюс перевод строки
    assert_eq!(content.len(), 4 * 21);
}

#[test]
fn test_quoted_separator_survives() {
    let output = converter()
        .args([
            "--schema",
            &schema("accounts.json"),
            "--input-format",
            "fixed",
            "--output-format",
            "csv",
        ])
        .write_stdin("0004lee, k    000300\n")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    assert_eq!(String::from_utf8(output).unwrap(), "id,name,amount\n4,\"lee, k\",300\n");
}

// ============================================================================
// Round-trip тесты: формат A → формат B → формат A
// ============================================================================

#[test]
fn test_roundtrip_fixed_via_csv() {
    let dir = tempdir().unwrap();
    let intermediate = dir.path().join("intermediate.csv");
    let final_output = dir.path().join("final.dat");

    // fixed → csv
    converter()
        .args([
            "--schema",
            &schema("accounts.json"),
            "--input",
            fixture("accounts.dat").to_str().unwrap(),
            "--input-format",
            "fixed",
            "--output-format",
            "csv",
            "--output",
            intermediate.to_str().unwrap(),
        ])
        .assert()
        .success();

    // csv → fixed
    converter()
        .args([
            "--schema",
            &schema("accounts.json"),
            "--input",
            intermediate.to_str().unwrap(),
            "--input-format",
            "csv",
            "--output-format",
            "fixed",
            "--output",
            final_output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let expected = fs::read(fixture("accounts.dat")).unwrap();
    let converted = fs::read(&final_output).unwrap();
    assert_eq!(expected, converted, "Round-trip fixed→csv→fixed должен сохранить содержимое");
}

// ============================================================================
// Тесты обработки ошибок
// ============================================================================

#[test]
fn test_missing_input_file() {
    converter()
        .args([
            "--schema",
            &schema("accounts.json"),
            "--input",
            "/nonexistent/path/to/file.dat",
            "--input-format",
            "fixed",
            "--output-format",
            "csv",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: Failed to open input file"));
}

#[test]
fn test_missing_schema_file() {
    converter()
        .args(["--schema", "/nonexistent/schema.json", "--input-format", "csv", "--output-format", "fixed"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to open schema file"));
}

#[test]
fn test_missing_required_args() {
    // Без --input-format
    converter()
        .args(["--schema", &schema("accounts.json"), "--output-format", "csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--input-format"));
}

#[test]
fn test_short_last_record() {
    converter()
        .args([
            "--schema",
            &schema("accounts.json"),
            "--input-format",
            "fixed",
            "--output-format",
            "csv",
        ])
        .write_stdin("0001alice     001500\n0002bob")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to read record #2"))
        .stderr(predicate::str::contains("last record is short."));
}

#[test]
fn test_value_too_long_for_field() {
    converter()
        .args([
            "--schema",
            &schema("accounts.json"),
            "--input-format",
            "csv",
            "--output-format",
            "fixed",
        ])
        .write_stdin("id,name,amount\n1,bartholomew-the-third,1\n")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to write record #1"))
        .stderr(predicate::str::contains("field_name: name"));
}

#[test]
fn test_multi_layout_rejected() {
    converter()
        .args([
            "--schema",
            &schema("multi_layout.json"),
            "--input-format",
            "fixed",
            "--output-format",
            "csv",
        ])
        .write_stdin("120240\n2hello\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Multi-layout fixed-length definitions can not be converted"));
}

// ============================================================================
// Тесты stdin/stdout
// ============================================================================

#[test]
fn test_stdin_to_stdout() {
    let input_data = fs::read(fixture("accounts.csv")).unwrap();

    let output = converter()
        .args(["--schema", &schema("accounts.json"), "--input-format", "csv", "--output-format", "fixed"])
        .write_stdin(input_data)
        .assert()
        .success()
        .stderr(predicate::str::contains("Converted 4 record(s)"))
        .get_output()
        .stdout
        .clone();

    assert_eq!(output, fs::read(fixture("accounts.dat")).unwrap());
}

#[test]
fn test_empty_input_writes_header() {
    converter()
        .args(["--schema", &schema("accounts.json"), "--input-format", "fixed", "--output-format", "csv"])
        .write_stdin("")
        .assert()
        .success()
        .stdout("id,name,amount\n")
        .stderr(predicate::str::contains("Converted 0 record(s)"));
}
