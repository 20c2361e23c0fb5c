//! Authentication endpoints

use crate::BackendClient;
use crate::error::{ClientError, Result};
use probe_core::domain::credential::Credential;
use probe_core::dto::auth::{LoginRequest, LoginResponse};
use tracing::debug;

impl BackendClient {
    // =============================================================================
    // Authentication
    // =============================================================================

    /// Log in and obtain a bearer credential
    ///
    /// # Arguments
    /// * `email` - Account email
    /// * `password` - Account password
    ///
    /// # Returns
    /// The bearer credential to attach to later requests. An empty
    /// `accessToken` is treated as a schema error.
    ///
    /// # Example
    /// ```no_run
    /// # use probe_client::BackendClient;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = BackendClient::new("http://localhost:8083");
    /// let credential = client.login("user1@test.com", "pw1").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn login(&self, email: &str, password: &str) -> Result<Credential> {
        let url = self.url("/auth/login");
        let response = self
            .client
            .post(&url)
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;

        let login: LoginResponse = self.handle_response(response).await?;

        if login.access_token.trim().is_empty() {
            return Err(ClientError::Schema(
                "login response carried an empty accessToken".to_string(),
            ));
        }

        debug!("Logged in as {}", email);

        Ok(Credential::new(login.access_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_login_returns_credential() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({ "email": "user1@test.com", "password": "pw1" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "data": { "accessToken": "token-1" } })),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = BackendClient::new(mock_server.uri());
        let credential = client.login("user1@test.com", "pw1").await.unwrap();
        assert_eq!(credential.token(), "token-1");
    }

    #[tokio::test]
    async fn test_login_missing_token_is_schema_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
            .mount(&mock_server)
            .await;

        let client = BackendClient::new(mock_server.uri());
        let err = client.login("user1@test.com", "pw1").await.unwrap_err();
        assert!(err.is_schema());
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
            .mount(&mock_server)
            .await;

        let client = BackendClient::new(mock_server.uri());
        match client.login("user1@test.com", "wrong").await {
            Err(ClientError::ApiError { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "bad credentials");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
