use crate::acquisition::error::ArchiveError;
use polars::prelude::*;
use std::io::{Cursor, Read};
use ::zip::ZipArchive;

/// Parses every `.csv` entry of a zip payload and stacks them into one raw
/// table. All cells are read as strings; typing happens during normalization.
///
/// `label` only feeds error messages (usually `"{dataset} {period}"`).
pub fn extract_archive(payload: &[u8], label: &str) -> Result<DataFrame, ArchiveError> {
    let mut archive = ZipArchive::new(Cursor::new(payload))
        .map_err(|e| ArchiveError::ArchiveCorrupt(label.to_string(), e))?;

    let mut entry_names: Vec<String> = archive
        .file_names()
        .filter(|name| name.to_ascii_lowercase().ends_with(".csv"))
        .map(str::to_string)
        .collect();
    entry_names.sort();

    if entry_names.is_empty() {
        return Err(ArchiveError::NoTabularEntries(label.to_string()));
    }

    let mut frames = Vec::with_capacity(entry_names.len());
    for name in &entry_names {
        let mut entry = archive
            .by_name(name)
            .map_err(|e| ArchiveError::ArchiveCorrupt(label.to_string(), e))?;
        let mut buffer = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut buffer)
            .map_err(|e| ArchiveError::EntryRead {
                label: label.to_string(),
                entry: name.clone(),
                source: e,
            })?;
        frames.push(read_csv(buffer, label, name)?.lazy());
    }

    concat_lf_diagonal(frames, UnionArgs::default())
        .and_then(|lf| lf.collect())
        .map_err(|e| ArchiveError::Concat {
            label: label.to_string(),
            source: e,
        })
}

fn read_csv(buffer: Vec<u8>, label: &str, entry: &str) -> Result<DataFrame, ArchiveError> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(buffer))
        .finish()
        .map_err(|e| ArchiveError::CsvParse {
            label: label.to_string(),
            entry: entry.to_string(),
            source: e,
        })
}
