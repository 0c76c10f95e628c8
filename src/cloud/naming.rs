//! Deterministic output names for downloaded files

use crate::cloud::FileObject;
use crate::models::{FileFormat, ReportKind};
use chrono::DateTime;
use std::path::{Path, PathBuf};
use tracing::error;

const CREATED_FILE_FORMAT: &str = "%Y-%m-%dT%H_%M_%S";

/// Replace characters that are not allowed in file names on common platforms
pub fn safe_encode(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '/' | '\\' | '|' | '?' | '*' => '_',
            other => other,
        })
        .collect()
}

/// Build the output file name for a file object:
/// `prefix_created_REPORTTYPE_[_source...]_periodStart_periodEnd_reference_basename.format`
pub fn generate_file_name(file: &FileObject, prefix: &str, format: FileFormat) -> String {
    let created = match DateTime::parse_from_rfc3339(&file.created) {
        Ok(created) => created.format(CREATED_FILE_FORMAT).to_string(),
        Err(e) => {
            error!(
                "Failed to parse created timestamp '{}' of {}: {}",
                file.created, file.file_reference, e
            );
            String::new()
        }
    };

    let report_type = ReportKind::label_for_code(file.report_type);
    let sources: String = if is_drilling_report(file) {
        file.sources
            .iter()
            .map(|source| format!("_{}", safe_encode(&source.name)))
            .collect()
    } else {
        String::new()
    };

    let base_name = Path::new(&file.file_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    format!(
        "{}_{}_{}_{}_{}_{}_{}_{}.{}",
        safe_encode(prefix),
        created,
        report_type,
        sources,
        safe_encode(&file.meta_data.period_start),
        safe_encode(&file.meta_data.period_end),
        safe_encode(&file.file_reference),
        safe_encode(&base_name),
        format.as_str()
    )
}

/// All paths a file object should be written to.
///
/// Drilling reports get one copy per source under a subfolder named after the
/// source; everything else, and drilling reports without sources, get a single
/// path directly under `output_folder`.
pub fn build_output_paths(
    file: &FileObject,
    prefix: &str,
    output_folder: &Path,
    format: FileFormat,
) -> Vec<PathBuf> {
    let file_name = generate_file_name(file, prefix, format);

    if is_drilling_report(file) && !file.sources.is_empty() {
        file.sources
            .iter()
            .map(|source| output_folder.join(safe_encode(&source.name)).join(&file_name))
            .collect()
    } else {
        vec![output_folder.join(file_name)]
    }
}

fn is_drilling_report(file: &FileObject) -> bool {
    ReportKind::from_code(file.report_type) == Some(ReportKind::Ddrml)
}
