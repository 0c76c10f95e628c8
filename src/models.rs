use anyhow::{Context, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Value of `rollDays` that means "not set".
pub const ROLL_DAYS_UNSET: i64 = -999;

/// Report families known to the file service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    /// Daily production report, primary format
    Dpr10,
    /// Daily production report, secondary format
    Dpr20,
    /// Daily drilling report
    Ddrml,
    /// Monthly production report to the government
    MprmlGov,
    /// Monthly production report to partners
    MprmlPartner,
}

impl ReportKind {
    /// Label used for unknown report type codes
    pub const UNKNOWN_LABEL: &'static str = "NONE_REPORTTYPE";

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Dpr10 => "DPR10",
            ReportKind::Dpr20 => "DPR20",
            ReportKind::Ddrml => "DDRML",
            ReportKind::MprmlGov => "MPRMLGov",
            ReportKind::MprmlPartner => "MPRMLPartner",
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            ReportKind::Dpr10 => 1,
            ReportKind::Dpr20 => 2,
            ReportKind::Ddrml => 3,
            ReportKind::MprmlGov => 4,
            ReportKind::MprmlPartner => 5,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(ReportKind::Dpr10),
            2 => Some(ReportKind::Dpr20),
            3 => Some(ReportKind::Ddrml),
            4 => Some(ReportKind::MprmlGov),
            5 => Some(ReportKind::MprmlPartner),
            _ => None,
        }
    }

    /// Label for a numeric report type code as returned by the file service
    pub fn label_for_code(code: i32) -> &'static str {
        Self::from_code(code)
            .map(|kind| kind.as_str())
            .unwrap_or(Self::UNKNOWN_LABEL)
    }

    /// The storage only keeps XML for these kinds; PDF is rendered at download time.
    pub fn stored_as_xml_only(&self) -> bool {
        matches!(self, ReportKind::Dpr20 | ReportKind::Ddrml)
    }

    pub fn is_monthly(&self) -> bool {
        matches!(self, ReportKind::MprmlGov | ReportKind::MprmlPartner)
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Xml,
    Pdf,
}

impl FileFormat {
    /// Lower-case form used in download query strings and file extensions
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Xml => "xml",
            FileFormat::Pdf => "pdf",
        }
    }

    /// Upper-case form used in metadata queries
    pub fn query_value(&self) -> &'static str {
        match self {
            FileFormat::Xml => "XML",
            FileFormat::Pdf => "PDF",
        }
    }
}

impl FromStr for FileFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "xml" => Ok(FileFormat::Xml),
            "pdf" => Ok(FileFormat::Pdf),
            other => Err(format!(
                "Unsupported format: '{}'. Supported formats: xml, pdf",
                other
            )),
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declarative download configuration, the `<subsurface>` document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename = "subsurface")]
pub struct DownloadConfiguration {
    /// Optional connection settings overriding the environment
    #[serde(rename = "config", default)]
    pub cloud: Option<CloudSettingsBlock>,

    /// Production reports; each entry yields a DPR10 and a DPR20 query
    #[serde(rename = "dpr", default)]
    pub production: Vec<ReportEntry>,

    #[serde(rename = "mprmlGov", default)]
    pub monthly_government: Vec<ReportEntry>,

    #[serde(rename = "mprmlPartner", default)]
    pub monthly_partner: Vec<ReportEntry>,

    /// Drilling reports; `fieldName` is not used for these
    #[serde(rename = "ddrml", default)]
    pub drilling: Vec<ReportEntry>,
}

impl DownloadConfiguration {
    /// Parse a configuration document
    pub fn from_xml(xml: &str) -> Result<Self> {
        quick_xml::de::from_str(xml).context("Failed to parse download configuration XML")
    }

    /// Read and parse a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let xml = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read configuration file: {}", path.display()))?;
        Self::from_xml(&xml)
            .with_context(|| format!("Invalid configuration file: {}", path.display()))
    }

    /// All entries paired with the report kind they were declared under.
    /// Production entries are listed once, as `Dpr10`.
    pub fn entries(&self) -> impl Iterator<Item = (ReportKind, &ReportEntry)> {
        self.production
            .iter()
            .map(|e| (ReportKind::Dpr10, e))
            .chain(self.monthly_government.iter().map(|e| (ReportKind::MprmlGov, e)))
            .chain(self.monthly_partner.iter().map(|e| (ReportKind::MprmlPartner, e)))
            .chain(self.drilling.iter().map(|e| (ReportKind::Ddrml, e)))
    }
}

/// Connection settings that may be embedded in the configuration document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudSettingsBlock {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub token_url: Option<String>,
    #[serde(default)]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub file_download_url: Option<String>,
    #[serde(default)]
    pub subscription_key: Option<String>,
    #[serde(default)]
    pub graph_url: Option<String>,
}

/// One report entry of the configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    #[serde(default)]
    pub field_name: Option<String>,
    /// Fixed range start (YYYY-MM-DD), may be empty
    #[serde(default)]
    pub date_from: String,
    /// Fixed range end (YYYY-MM-DD), may be empty
    #[serde(default)]
    pub date_to: String,
    /// Rolling window in days; overrides the fixed range when set
    #[serde(default, deserialize_with = "blank_as_none")]
    pub roll_days: Option<i64>,
    /// Filter on upload time instead of reporting period
    #[serde(default, deserialize_with = "blank_as_false")]
    pub use_uploaded_from: bool,
    pub common: OutputSettings,
}

impl ReportEntry {
    pub fn format(&self) -> Result<FileFormat, String> {
        self.common.format.parse()
    }
}

// Configuration templates leave numeric and flag elements empty, e.g.
// `<rollDays></rollDays>` or `<useUploadedFrom/>`; those read as unset.
fn blank_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    match text.trim() {
        "" => Ok(None),
        value => value.parse().map(Some).map_err(D::Error::custom),
    }
}

fn blank_as_false<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    match text.trim() {
        "" | "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        other => Err(D::Error::custom(format!("invalid boolean value '{}'", other))),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSettings {
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub output_folder: PathBuf,
    #[serde(default)]
    pub file_output_prefix: String,
}
