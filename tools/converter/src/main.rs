//! CLI tool for converting record files between CSV and fixed-length formats.
//!
//! Both formats are described by one JSON schema file (see `databind::schema`).
//!
//! # Usage
//!
//! ```bash
//! # Fixed-length to CSV
//! converter --schema layout.json --input data.dat --input-format fixed --output-format csv --output data.csv
//!
//! # Read from stdin, write to stdout
//! cat data.csv | converter --schema layout.json --input-format csv --output-format fixed > data.dat
//!
//! # Validate by round-trip conversion
//! converter --schema layout.json -i data.dat --input-format fixed --output-format fixed -o validated.dat
//! ```

use std::fs::File;
use std::io::{Read, Write, stdin, stdout};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use databind::mapper::{FormatConfig, FormatKind};
use databind::schema::Schema;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Convert record files between CSV and fixed-length formats.
///
/// Reads records from input (file or stdin) and writes them
/// to output (file or stdout) in the specified format.
#[derive(Parser, Debug)]
#[command(name = "converter")]
#[command(version, about)]
struct Args {
    /// JSON schema describing the CSV and fixed-length formats.
    #[arg(short, long)]
    schema: PathBuf,

    /// Input file path. If not specified, reads from stdin.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Input format.
    #[arg(long, value_enum)]
    input_format: FormatArg,

    /// Output format.
    #[arg(long, value_enum)]
    output_format: FormatArg,

    /// Output file path. If not specified, writes to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Supported formats for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Delimited text per the schema's `csv` section.
    Csv,
    /// Fixed-size records per the schema's `fixed_length` section.
    Fixed,
}

impl From<FormatArg> for FormatKind {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => FormatKind::Csv,
            FormatArg::Fixed => FormatKind::FixedLength,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let schema_file = File::open(&args.schema)
        .with_context(|| format!("Failed to open schema file: {}", args.schema.display()))?;
    let schema = Schema::from_reader(schema_file)
        .with_context(|| format!("Failed to parse schema file: {}", args.schema.display()))?;

    let input_format = load_format(&schema, args.input_format)?;
    let output_format = load_format(&schema, args.output_format)?;

    // Open input source
    let input: Box<dyn Read> = match &args.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input file: {}", path.display()))?;
            Box::new(file)
        }
        None => Box::new(stdin().lock()),
    };

    // Open output destination
    let output: Box<dyn Write> = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            Box::new(file)
        }
        None => Box::new(stdout().lock()),
    };

    let count = convert(input, output, &input_format, &output_format)?;

    // Report result to stderr (so it doesn't interfere with stdout output)
    eprintln!("Converted {count} record(s)");

    Ok(())
}

/// Builds the config for `format` from the schema.
fn load_format(schema: &Schema, format: FormatArg) -> Result<FormatConfig> {
    let config = schema
        .format_config(format.into())
        .with_context(|| format!("Invalid {format:?} definition in schema"))?;
    if let FormatConfig::FixedLength(fixed) = &config
        && fixed.is_multi_layout()
    {
        bail!("Multi-layout fixed-length definitions can not be converted");
    }
    Ok(config)
}

/// Streams records from input to output, one at a time.
fn convert<R: Read, W: Write>(
    input: R,
    output: W,
    input_format: &FormatConfig,
    output_format: &FormatConfig,
) -> Result<u64> {
    debug!(from = ?input_format.kind(), to = ?output_format.kind(), "converting");

    let mut reader = input_format.open_reader(input);
    let mut writer = output_format.open_writer(output);

    for (idx, result) in reader.by_ref().enumerate() {
        let record = result.with_context(|| format!("Failed to read record #{}", idx + 1))?;
        writer.write_record(&record).with_context(|| format!("Failed to write record #{}", idx + 1))?;
    }

    let count = writer.records_written();
    reader.close().context("Failed to close input")?;
    // Flushes buffered data and writes a pending CSV header
    writer.close().context("Failed to flush output")?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SCHEMA: &str = r#"{
        "csv": {
            "header_titles": ["name", "age"],
            "line_separator": "\n"
        },
        "fixed_length": {
            "record_length": 7,
            "line_separator": "\n",
            "fields": [
                { "name": "name", "offset": 1, "length": 4, "converter": { "type": "rpad" } },
                { "name": "age", "offset": 5, "length": 3, "converter": { "type": "lpad" } }
            ]
        }
    }"#;

    fn formats() -> (FormatConfig, FormatConfig) {
        let schema = Schema::from_json(SCHEMA).unwrap();
        (load_format(&schema, FormatArg::Csv).unwrap(), load_format(&schema, FormatArg::Fixed).unwrap())
    }

    #[test]
    fn test_fixed_to_csv_conversion() {
        let (csv, fixed) = formats();
        let mut output = Vec::new();

        let count = convert(Cursor::new("ab  003\ncd  042\n"), &mut output, &fixed, &csv).unwrap();

        assert_eq!(count, 2);
        assert_eq!(String::from_utf8(output).unwrap(), "name,age\nab,3\ncd,42\n");
    }

    #[test]
    fn test_csv_to_fixed_conversion() {
        let (csv, fixed) = formats();
        let mut output = Vec::new();

        let count = convert(Cursor::new("name,age\nab,3\n\ncd,42\n"), &mut output, &csv, &fixed).unwrap();

        assert_eq!(count, 2);
        assert_eq!(output, b"ab  003\ncd  042\n");
    }

    #[test]
    fn test_empty_input() {
        let (csv, fixed) = formats();
        let mut output = Vec::new();

        let count = convert(Cursor::new(""), &mut output, &fixed, &csv).unwrap();

        assert_eq!(count, 0);
        // CSV should still have header even for empty input
        assert_eq!(String::from_utf8(output).unwrap(), "name,age\n");
    }

    #[test]
    fn test_read_error_names_record() {
        let (csv, fixed) = formats();
        let err = convert(Cursor::new("ab  003\ncd"), Vec::new(), &fixed, &csv).unwrap_err();

        let message = format!("{err:#}");
        assert!(message.contains("Failed to read record #2"));
        assert!(message.contains("last record is short."));
    }

    #[test]
    fn test_write_error_names_record() {
        let (csv, fixed) = formats();
        let err = convert(Cursor::new("name,age\nabcdef,1\n"), Vec::new(), &csv, &fixed).unwrap_err();

        let message = format!("{err:#}");
        assert!(message.contains("Failed to write record #1"));
        assert!(message.contains("field_name: name"));
    }

    #[test]
    fn test_multi_layout_rejected() {
        let schema = Schema::from_json(
            r#"{ "fixed_length": {
                "record_length": 2,
                "records": [ { "name": "r", "fields": [ { "name": "a", "offset": 1, "length": 2 } ] } ],
                "identifier": { "offset": 1, "length": 1, "values": {}, "default": "r" }
            } }"#,
        )
        .unwrap();
        assert!(load_format(&schema, FormatArg::Fixed).is_err());
    }

    #[test]
    fn test_missing_section() {
        let schema = Schema::from_json(r#"{ "csv": { "header_titles": ["a"] } }"#).unwrap();
        let err = load_format(&schema, FormatArg::Fixed).unwrap_err();
        assert!(format!("{err:#}").contains("fixed-length definition is not found."));
    }
}
