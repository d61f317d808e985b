//! Every store except the rules side-file is a comma-separated file with a
//! header row. Rows are written with `\n` terminators and minimal quoting, so
//! a file that is read and written back unchanged stays byte-identical.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use walkdir::WalkDir;

use crate::domain::{FeatureRecord, ListedValueRecord, ProfileEntry};

/// A record stored as one row of a flat file.
pub trait Row: Serialize + DeserializeOwned {
    /// The header row, in column order.
    const COLUMNS: &'static [&'static str];
}

impl Row for FeatureRecord {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "en",
        "ru",
        "description_formatted_en",
        "description_formatted_ru",
        "is_multiselect",
        "not_applicable_if",
        "schema_sections",
    ];
}

impl Row for ListedValueRecord {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "feature_id",
        "en",
        "ru",
        "description_formatted_en",
        "description_formatted_ru",
    ];
}

impl Row for ProfileEntry {
    const COLUMNS: &'static [&'static str] = &[
        "feature_id",
        "feature_name_ru",
        "value_type",
        "value_id",
        "value_ru",
        "comment_ru",
        "comment_en",
        "page_numbers",
    ];
}

/// Reads every row of a flat file, in file order.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a row does not parse.
pub fn read_rows<R: Row>(path: &Path) -> Result<Vec<R>, csv::Error> {
    decode_rows(&fs::read(path)?)
}

/// Decodes rows from the content of a flat file.
///
/// # Errors
///
/// Returns an error if a row does not parse.
pub fn decode_rows<R: Row>(bytes: &[u8]) -> Result<Vec<R>, csv::Error> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes)
        .deserialize()
        .collect()
}

/// Encodes rows, header first, in memory.
///
/// # Errors
///
/// Returns an error if a row cannot be serialized.
pub fn encode_rows<R: Row>(rows: &[R]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());

    if rows.is_empty() {
        writer.write_record(R::COLUMNS)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Writes rows to a flat file, replacing its content.
///
/// # Errors
///
/// Returns an error if a row cannot be serialized or the file cannot be
/// written.
pub fn write_rows<R: Row>(path: &Path, rows: &[R]) -> Result<(), csv::Error> {
    let bytes = encode_rows(rows)?;
    fs::write(path, bytes)?;
    Ok(())
}

/// The profile files directly inside `dir`, sorted by path.
///
/// A missing directory holds no profiles.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be listed.
pub fn glob_profiles(dir: &Path) -> Result<Vec<PathBuf>, walkdir::Error> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "csv") {
            paths.push(path.to_path_buf());
        }
    }
    paths.sort();
    Ok(paths)
}
