use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::VerifyError;

/// Abstraction over bearer-token acquisition — the injected credential
/// capability. Enables test injection via [`StaticToken`].
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> Result<String, VerifyError>;
}

// ── Service Principal ─────────────────────────────────────────────────────────

/// Client-credentials flow against the tenant's login endpoint, with the
/// token cached until shortly before expiry.
pub struct ServicePrincipalTokenProvider {
    tenant_id: String,
    client_id: String,
    client_secret: String,
    login_base: String,
    client: reqwest::Client,
    cache: Mutex<Option<(String, Instant)>>,
}

impl ServicePrincipalTokenProvider {
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            login_base: "https://login.microsoftonline.com".into(),
            client: reqwest::Client::new(),
            cache: Mutex::new(None),
        }
    }

    /// Point at a different login endpoint. Used in tests.
    pub fn with_login_base(mut self, base: impl Into<String>) -> Self {
        self.login_base = base.into();
        self
    }
}

#[async_trait]
impl TokenProvider for ServicePrincipalTokenProvider {
    async fn token(&self) -> Result<String, VerifyError> {
        {
            let guard = self.cache.lock().await;
            if let Some((tok, expiry)) = guard.as_ref() {
                if Instant::now() < *expiry {
                    return Ok(tok.clone());
                }
            }
        }

        let url = format!("{}/{}/oauth2/v2.0/token", self.login_base, self.tenant_id);
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("scope", "https://management.azure.com/.default"),
        ];
        let resp: Value = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| VerifyError::Auth(format!("token request: {}", e)))?
            .json()
            .await
            .map_err(|e| VerifyError::Auth(format!("token decode: {}", e)))?;

        let tok = resp["access_token"]
            .as_str()
            .ok_or_else(|| VerifyError::Auth(format!("no access_token in response: {}", resp)))?
            .to_string();
        let expires_in = resp["expires_in"].as_u64().unwrap_or(3600);
        let expiry = Instant::now() + Duration::from_secs(expires_in.saturating_sub(60));

        *self.cache.lock().await = Some((tok.clone(), expiry));
        Ok(tok)
    }
}

// ── Static (tests) ────────────────────────────────────────────────────────────

pub struct StaticToken(pub String);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<String, VerifyError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sp_token_posts_client_credentials_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/test-tenant/oauth2/v2.0/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=cid"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok-123",
                "expires_in": 3600,
            })))
            .mount(&server)
            .await;

        let provider = ServicePrincipalTokenProvider::new("test-tenant", "cid", "secret")
            .with_login_base(server.uri());

        assert_eq!(provider.token().await.unwrap(), "tok-123");
    }

    #[tokio::test]
    async fn sp_token_is_cached_until_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/test-tenant/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok-123",
                "expires_in": 3600,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = ServicePrincipalTokenProvider::new("test-tenant", "cid", "secret")
            .with_login_base(server.uri());

        provider.token().await.unwrap();
        provider.token().await.unwrap();
    }

    #[tokio::test]
    async fn missing_access_token_is_an_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/test-tenant/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": "invalid_client",
            })))
            .mount(&server)
            .await;

        let provider = ServicePrincipalTokenProvider::new("test-tenant", "cid", "bad")
            .with_login_base(server.uri());

        let err = provider.token().await.unwrap_err();
        assert!(matches!(err, VerifyError::Auth(_)), "got: {err}");
    }
}
