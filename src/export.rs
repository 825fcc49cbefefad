//! Serializers for exporting a [`ScanResult`].
//!
//! - `txt`: a blank line, `Duplicate set (size: <natural size>)`, then one
//!   two-space indented path per line.
//! - `json`: `{"duplicate_sets": [{"size": <bytes>, "files": [..]}]}`, two-space
//!   indent, non-ASCII escaped as `\uXXXX`, no trailing newline.
//! - `csv`: header `Set,Size,File`, one CRLF-terminated row per file; `Set`
//!   counts from 1.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::ser::{Formatter, PrettyFormatter};
use thiserror::Error;

use crate::cli::ExportFormat;
use crate::duplicates::ScanResult;
use crate::error::{self, DupError};
use crate::utils::natural_size;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonExport {
    pub duplicate_sets: Vec<JsonDuplicateSet>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonDuplicateSet {
    pub size: u64,
    pub files: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CsvRow {
    #[serde(rename = "Set")]
    pub set: usize,
    #[serde(rename = "Size")]
    pub size: u64,
    #[serde(rename = "File")]
    pub file: String,
}

impl From<&ScanResult> for JsonExport {
    fn from(result: &ScanResult) -> Self {
        Self {
            duplicate_sets: result
                .duplicate_sets
                .iter()
                .map(|set| JsonDuplicateSet {
                    size: set.size,
                    files: set
                        .files
                        .iter()
                        .map(|f| f.to_string_lossy().into_owned())
                        .collect(),
                })
                .collect(),
        }
    }
}

pub fn write_txt<W: Write>(result: &ScanResult, mut writer: W) -> Result<(), ExportError> {
    for set in &result.duplicate_sets {
        writeln!(writer, "\nDuplicate set (size: {})", natural_size(set.size))?;
        for file in &set.files {
            writeln!(writer, "  {}", file.display())?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Pretty printer that keeps string output pure ASCII.
struct AsciiFormatter<'a>(PrettyFormatter<'a>);

impl Formatter for AsciiFormatter<'_> {
    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_array(writer)
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.0.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object(writer)
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.0.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object_value(writer)
    }

    /// Anything outside printable ASCII becomes `\uXXXX`, using a surrogate
    /// pair above the BMP.
    fn write_string_fragment<W: ?Sized + Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        let bytes = fragment.as_bytes();
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if (' '..='~').contains(&ch) {
                continue;
            }
            writer.write_all(&bytes[start..idx])?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = idx + ch.len_utf8();
        }
        writer.write_all(&bytes[start..])
    }
}

pub fn write_json<W: Write>(result: &ScanResult, mut writer: W) -> Result<(), ExportError> {
    let formatter = AsciiFormatter(PrettyFormatter::with_indent(b"  "));
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    JsonExport::from(result).serialize(&mut serializer)?;
    writer.flush()?;
    Ok(())
}

pub fn write_csv<W: Write>(result: &ScanResult, writer: W) -> Result<(), ExportError> {
    // Header written by hand so an empty result still carries it.
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);
    csv_writer.write_record(["Set", "Size", "File"])?;

    for (idx, set) in result.duplicate_sets.iter().enumerate() {
        for file in &set.files {
            csv_writer.serialize(CsvRow {
                set: idx + 1,
                size: set.size,
                file: file.to_string_lossy().into_owned(),
            })?;
        }
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn write_format<W: Write>(
    result: &ScanResult,
    format: ExportFormat,
    writer: W,
) -> Result<(), ExportError> {
    match format {
        ExportFormat::Txt => write_txt(result, writer),
        ExportFormat::Json => write_json(result, writer),
        ExportFormat::Csv => write_csv(result, writer),
    }
}

/// Writes `result` to `output_file` in the requested format.
pub fn export_to_file(result: &ScanResult, output_file: &Path, format: ExportFormat) -> error::Result<()> {
    File::create(output_file)
        .map_err(ExportError::from)
        .and_then(|file| write_format(result, format, BufWriter::new(file)))
        .map_err(|source| DupError::Export {
            path: output_file.to_path_buf(),
            source,
        })?;

    info!("Results exported to {} in {} format", output_file.display(), format);
    Ok(())
}
