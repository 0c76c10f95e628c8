//! OAuth2 client-credentials authentication

use crate::cloud::{CloudApi, CloudError, TokenResponse};
use crate::config::Credentials;
use reqwest::{Client, StatusCode};
use tracing::{debug, error, info};

/// Exchanges service principal credentials for a bearer token
pub struct Authenticator {
    client: Client,
    credentials: Credentials,
}

impl Authenticator {
    pub fn new(client: Client, credentials: Credentials) -> Self {
        Self { client, credentials }
    }

    /// Request a token. No network call is made when a credential is blank.
    pub async fn authenticate(&self) -> Result<String, CloudError> {
        info!("Authenticating");

        let missing = self.credentials.missing();
        if !missing.is_empty() {
            let message = format!(
                "Failed in authentication, required settings are not set: {}",
                missing.join(",")
            );
            error!("{}", message);
            return Err(CloudError::Configuration(message));
        }

        let form = [
            ("grant_type", CloudApi::GRANT_TYPE),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("resource", self.credentials.resource_id.as_str()),
        ];

        let response = self
            .client
            .post(&self.credentials.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                error!("Error in authentication post: {}", e);
                CloudError::Transport(e)
            })?;

        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::OK {
            let token: TokenResponse = serde_json::from_str(&body)?;
            debug!(
                "Token type: {:?}, resource: {:?}",
                token.token_type, token.resource
            );
            return token.access_token.ok_or_else(|| CloudError::Authentication {
                description: "token endpoint response did not contain an access_token".to_string(),
            });
        }

        // Best effort: a body without error_description still yields an error
        let description = serde_json::from_str::<TokenResponse>(&body)
            .ok()
            .and_then(|r| r.error_description)
            .unwrap_or_default();
        error!(
            "Authentication service responded with code {}, error: {}",
            status.as_u16(),
            description
        );
        Err(CloudError::Authentication { description })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::test_support::{serve_once, CannedResponse};

    fn credentials(token_url: String) -> Credentials {
        Credentials {
            client_id: "client".to_string(),
            client_secret: "s3cret".to_string(),
            token_url,
            resource_id: "api://subsurface".to_string(),
        }
    }

    #[tokio::test]
    async fn test_successful_token_exchange() {
        let server = serve_once(CannedResponse::json(
            200,
            r#"{"token_type":"Bearer","resource":"api://subsurface","access_token":"tok-123"}"#,
        ))
        .await;

        let auth = Authenticator::new(Client::new(), credentials(server.url("/token")));
        let token = auth.authenticate().await.unwrap();
        assert_eq!(token, "tok-123");

        let request = server.request().await;
        assert!(request.starts_with("POST /token "));
        assert!(request
            .to_lowercase()
            .contains("content-type: application/x-www-form-urlencoded"));
        assert!(request.contains("grant_type=client_credentials"));
        assert!(request.contains("client_id=client"));
        assert!(request.contains("client_secret=s3cret"));
        assert!(request.contains("resource=api%3A%2F%2Fsubsurface"));
    }

    #[tokio::test]
    async fn test_rejected_credentials_carry_error_description() {
        let server = serve_once(CannedResponse::json(
            401,
            r#"{"error":"invalid_client","error_description":"bad secret"}"#,
        ))
        .await;

        let auth = Authenticator::new(Client::new(), credentials(server.url("/token")));
        match auth.authenticate().await {
            Err(CloudError::Authentication { description }) => assert_eq!(description, "bad secret"),
            other => panic!("expected authentication error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejection_without_json_body_has_empty_description() {
        let server = serve_once(CannedResponse::text(500, "upstream unavailable")).await;

        let auth = Authenticator::new(Client::new(), credentials(server.url("/token")));
        match auth.authenticate().await {
            Err(CloudError::Authentication { description }) => assert!(description.is_empty()),
            other => panic!("expected authentication error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blank_credentials_fail_without_network_call() {
        // Nothing listens here; a request would surface as a transport error.
        let mut creds = credentials("http://127.0.0.1:9/token".to_string());
        creds.client_secret.clear();

        let auth = Authenticator::new(Client::new(), creds);
        let err = auth.authenticate().await.unwrap_err();
        assert!(matches!(err, CloudError::Configuration(_)));
        assert!(err.to_string().contains("AzureClientSecret"));
    }
}
