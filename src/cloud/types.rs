//! Wire types for the subsurface cloud services

use serde::{Deserialize, Serialize};

/// GraphQL request envelope
#[derive(Debug, Serialize)]
pub struct GraphQuery<'a> {
    pub query: &'a str,
}

/// Metadata query response envelope
#[derive(Debug, Deserialize)]
pub struct FileGraphResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: DataObject,
}

/// Files matched by a query plus any errors reported alongside them
#[derive(Debug, Default, Deserialize)]
pub struct DataObject {
    #[serde(default)]
    pub files: Vec<FileObject>,
    #[serde(default)]
    pub errors: Vec<DataError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataError {
    pub message: String,
}

/// Metadata of one file stored in the cloud
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileObject {
    /// Original file name as uploaded
    #[serde(rename = "fileName", default)]
    pub file_name: String,

    /// Stable reference id - required for downloading
    #[serde(rename = "fileReferenceId", default)]
    pub file_reference: String,

    /// Upload timestamp (RFC 3339)
    #[serde(default)]
    pub created: String,

    #[serde(rename = "metadata", default)]
    pub meta_data: FileMetaData,

    /// Numeric report type code
    #[serde(rename = "reportType", default)]
    pub report_type: i32,

    /// Named entities the report covers, e.g. wellbores for drilling reports
    #[serde(default, deserialize_with = "null_as_default")]
    pub sources: Vec<DataSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetaData {
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub period_end: String,
    #[serde(default)]
    pub period_start: String,
    #[serde(default)]
    pub report_id: Option<String>,
    #[serde(default)]
    pub report_status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub naming_system: Option<String>,
}

/// OAuth2 token endpoint response, success and failure fields alike
#[derive(Debug, Default, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub resource: Option<String>,
    pub error_description: Option<String>,
}

/// Header names and constants shared by the cloud endpoints
pub struct CloudApi;

impl CloudApi {
    /// API management subscription header
    pub const SUBSCRIPTION_KEY_HEADER: &'static str = "Ocp-Apim-Subscription-Key";
    /// OAuth2 grant used for service principals
    pub const GRANT_TYPE: &'static str = "client_credentials";
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
