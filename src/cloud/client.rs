//! HTTP access to the metadata query and file download endpoints

use crate::cloud::auth::Authenticator;
use crate::cloud::{CloudApi, CloudError, DataObject, FileGraphResult, GraphQuery};
use crate::config::Settings;
use crate::models::FileFormat;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use tracing::{debug, error, warn};

/// Operations the download engine needs from the cloud services
#[async_trait]
pub trait CloudClient: Send + Sync {
    /// Obtain a bearer token for this run
    async fn authenticate(&self) -> Result<String, CloudError>;

    /// Execute a metadata query and return the matched files
    async fn run_query(
        &self,
        token: &str,
        endpoint: &str,
        subscription_key: &str,
        query: &str,
    ) -> Result<DataObject, CloudError>;

    /// Fetch the content of one file in the given format
    async fn download_file(
        &self,
        file_reference: &str,
        base_url: &str,
        token: &str,
        subscription_key: &str,
        format: FileFormat,
    ) -> Result<Vec<u8>, CloudError>;
}

/// `CloudClient` backed by reqwest
pub struct HttpCloudClient {
    client: Client,
    authenticator: Authenticator,
}

impl HttpCloudClient {
    /// Build a client with the timeout and user agent from `settings`
    pub fn new(settings: &Settings) -> Result<Self, CloudError> {
        let client = Client::builder()
            .user_agent(&settings.http.user_agent)
            .timeout(settings.http_timeout())
            .build()?;

        Ok(Self::with_client(client, settings))
    }

    pub fn with_client(client: Client, settings: &Settings) -> Self {
        let authenticator = Authenticator::new(client.clone(), settings.credentials.clone());
        Self {
            client,
            authenticator,
        }
    }
}

#[async_trait]
impl CloudClient for HttpCloudClient {
    async fn authenticate(&self) -> Result<String, CloudError> {
        self.authenticator.authenticate().await
    }

    async fn run_query(
        &self,
        token: &str,
        endpoint: &str,
        subscription_key: &str,
        query: &str,
    ) -> Result<DataObject, CloudError> {
        let response = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(CloudApi::SUBSCRIPTION_KEY_HEADER, subscription_key)
            .bearer_auth(token)
            .json(&GraphQuery { query })
            .send()
            .await
            .map_err(|e| {
                error!("Failed in metadata query request: {}", e);
                CloudError::Transport(e)
            })?;

        let response = ensure_success(response).await?;
        let body = response.text().await?;
        debug!("Got response from server: {}", body);

        let result: FileGraphResult = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to decode metadata query response: {}, got: {}", e, body);
            CloudError::Decode(e)
        })?;

        for data_error in &result.data.errors {
            warn!("Metadata query reported error: {}", data_error.message);
        }

        Ok(result.data)
    }

    async fn download_file(
        &self,
        file_reference: &str,
        base_url: &str,
        token: &str,
        subscription_key: &str,
        format: FileFormat,
    ) -> Result<Vec<u8>, CloudError> {
        if base_url.trim().is_empty() {
            return Err(CloudError::config("Missing file download url"));
        }

        let url = format!("{}/{}", base_url.trim_end_matches('/'), file_reference);
        debug!(
            "Downloading file with reference id: {}, format: {}, from url: {}",
            file_reference, format, url
        );

        let response = self
            .client
            .get(&url)
            .query(&[("format", format.as_str())])
            .header(CONTENT_TYPE, "application/json")
            .header(CloudApi::SUBSCRIPTION_KEY_HEADER, subscription_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                error!(
                    "Failed in get of file, referenceId: {}, format: {}, error: {}",
                    file_reference, format, e
                );
                CloudError::Transport(e)
            })?;

        let response = ensure_success(response).await?;
        let content = response.bytes().await?;
        Ok(content.to_vec())
    }
}

/// Turn a non-success response into a `Service` error carrying the body
async fn ensure_success(response: Response) -> Result<Response, CloudError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    error!(
        "Server responded with http error, code: {}, status: {}, body: {}",
        status.as_u16(),
        status,
        body
    );
    Err(CloudError::Service {
        status_code: status.as_u16(),
        status: status.to_string(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::test_support::{serve_once, CannedResponse};

    fn client() -> HttpCloudClient {
        HttpCloudClient::new(&Settings::default()).unwrap()
    }

    #[tokio::test]
    async fn test_run_query_posts_graphql_envelope() {
        let server = serve_once(CannedResponse::json(
            200,
            r#"{"data":{"files":[{"fileName":"a.xml","fileReferenceId":"ref-1","created":"2020-02-25T06:12:44Z","metadata":{"periodStart":"2020-02-24","periodEnd":"2020-02-24"},"reportType":1,"sources":[]}],"errors":[]}}"#,
        ))
        .await;

        let data = client()
            .run_query("tok", &server.url("/graphql"), "sub-key", "query { files }")
            .await
            .unwrap();
        assert_eq!(data.files.len(), 1);
        assert_eq!(data.files[0].file_reference, "ref-1");

        let request = server.request().await;
        let lowered = request.to_lowercase();
        assert!(request.starts_with("POST /graphql "));
        assert!(lowered.contains("content-type: application/json"));
        assert!(lowered.contains("ocp-apim-subscription-key: sub-key"));
        assert!(lowered.contains("authorization: bearer tok"));
        assert!(request.contains(r#"{"query":"query { files }"}"#));
    }

    #[tokio::test]
    async fn test_run_query_keeps_errors_from_successful_response() {
        let server = serve_once(CannedResponse::json(
            200,
            r#"{"data":{"files":[],"errors":[{"message":"field not found"}]}}"#,
        ))
        .await;

        let data = client()
            .run_query("tok", &server.url("/graphql"), "sub-key", "query {}")
            .await
            .unwrap();
        assert!(data.files.is_empty());
        assert_eq!(data.errors[0].message, "field not found");
    }

    #[tokio::test]
    async fn test_run_query_service_error() {
        let server = serve_once(CannedResponse::text(403, "subscription key invalid")).await;

        let err = client()
            .run_query("tok", &server.url("/graphql"), "bad-key", "query {}")
            .await
            .unwrap_err();
        match err {
            CloudError::Service { status_code, body, .. } => {
                assert_eq!(status_code, 403);
                assert_eq!(body, "subscription key invalid");
            }
            other => panic!("expected service error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_query_malformed_body() {
        let server = serve_once(CannedResponse::json(200, "not json")).await;

        let err = client()
            .run_query("tok", &server.url("/graphql"), "sub-key", "query {}")
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::Decode(_)));
    }

    #[tokio::test]
    async fn test_download_file_requests_lowercase_format() {
        let server = serve_once(CannedResponse::bytes(200, b"<report/>")).await;

        let content = client()
            .download_file("ref-9", &server.url("/files"), "tok", "sub-key", FileFormat::Pdf)
            .await
            .unwrap();
        assert_eq!(content, b"<report/>");

        let request = server.request().await;
        assert!(request.starts_with("GET /files/ref-9?format=pdf "));
        assert!(request.to_lowercase().contains("ocp-apim-subscription-key: sub-key"));
    }

    #[tokio::test]
    async fn test_download_file_service_error() {
        let server = serve_once(CannedResponse::text(404, "unknown reference")).await;

        let err = client()
            .download_file("missing", &server.url("/files"), "tok", "sub-key", FileFormat::Xml)
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::Service { status_code: 404, .. }));
    }

    #[tokio::test]
    async fn test_download_file_requires_base_url() {
        let err = client()
            .download_file("ref", "", "tok", "sub-key", FileFormat::Xml)
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let err = client()
            .download_file("ref", "http://127.0.0.1:9/files", "tok", "sub-key", FileFormat::Xml)
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::Transport(_)));
    }
}
