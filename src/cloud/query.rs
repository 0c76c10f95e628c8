//! Metadata query construction

use crate::cloud::window::ResolvedTimeWindow;
use crate::models::{FileFormat, ReportKind};
use std::fmt::Write;
use std::path::PathBuf;
use tracing::debug;

/// Which timestamps a file query filters on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryVariant {
    /// Upload time (`created_after` / `created_before`)
    ByCreated,
    /// Reporting period (`period_start` / `period_end`)
    ByPeriod,
}

impl QueryVariant {
    pub fn from_use_uploaded_from(use_uploaded_from: bool) -> Self {
        if use_uploaded_from {
            QueryVariant::ByCreated
        } else {
            QueryVariant::ByPeriod
        }
    }

    fn bound_names(&self) -> (&'static str, &'static str) {
        match self {
            QueryVariant::ByCreated => ("created_after", "created_before"),
            QueryVariant::ByPeriod => ("period_start", "period_end"),
        }
    }
}

/// A normalized query for one report kind of one configuration entry
#[derive(Debug, Clone, PartialEq)]
pub struct FileQuery {
    pub window: ResolvedTimeWindow,
    pub field: Option<String>,
    pub report_kind: ReportKind,
    /// Format requested at download time
    pub format: FileFormat,
    pub use_uploaded_from: bool,
    pub output_folder: PathBuf,
    pub output_prefix: String,
}

impl FileQuery {
    pub fn variant(&self) -> QueryVariant {
        QueryVariant::from_use_uploaded_from(self.use_uploaded_from)
    }

    /// File type to filter on in the metadata query.
    ///
    /// Kinds stored only as XML are always queried as XML; a PDF download of
    /// them is rendered by the service from the stored XML.
    pub fn query_file_type(&self) -> FileFormat {
        if self.report_kind.stored_as_xml_only() {
            FileFormat::Xml
        } else {
            self.format
        }
    }
}

const FILE_SELECTION: &str = "    fileName
    fileReferenceId
    created
    metadata {
      fileType
      periodEnd
      periodStart
      reportId
      reportStatus
    }
    reportType
    sources {
      kind
      name
      namingSystem
    }";

/// Render the metadata query document for `query`
pub fn build_query(query: &FileQuery, variant: QueryVariant) -> String {
    let (after, before) = variant.bound_names();
    let file_type = query.query_file_type();

    debug!(
        "Building file query: field={:?}, fileType={}, reportType={}, range={} - {}",
        query.field, file_type.query_value(), query.report_kind, query.window.from, query.window.to
    );

    let mut arguments = format!(
        "{}: \"{}\", {}: \"{}\"",
        after,
        escape(&query.window.from),
        before,
        escape(&query.window.to)
    );
    if let Some(field) = query.field.as_deref().filter(|f| !f.is_empty()) {
        let _ = write!(arguments, ", field: \"{}\"", escape(field));
    }
    let _ = write!(
        arguments,
        ", fileType: {}, report_type: {}",
        file_type.query_value(),
        query.report_kind.as_str()
    );

    let document = format!("query {{\n  files({}) {{\n{}\n  }}\n}}", arguments, FILE_SELECTION);
    debug!("Generated query: {}", document);
    document
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}
