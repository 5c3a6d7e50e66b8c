//! Supabase-compatible REST gateway.
//!
//! Uses raw HTTP requests against the auth, rest and storage endpoints
//! (no SDK dependency). The session lives only in process memory.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use complib_ids::{ComponentId, OwnerId};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::model::{image_content_type, image_object_path};
use crate::{BackendGateway, Component, ComponentPatch, GatewayError, NewComponent, Session};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for a hosted backend project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpGatewayConfig {
    /// Project base URL, e.g. `https://abc.supabase.co`
    pub url: String,
    /// Public (anon) API key
    pub api_key: String,
    /// Storage bucket for preview images
    pub bucket: String,
    /// Table holding component rows
    pub table: String,
}

impl HttpGatewayConfig {
    fn base(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base(), path)
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base(), self.table)
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base(), self.bucket, path)
    }

    /// Public URL of an uploaded object.
    pub fn public_object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base(), self.bucket, path)
    }
}

#[derive(Serialize)]
struct OtpRequest<'a> {
    email: &'a str,
    create_user: bool,
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    email: &'a str,
    token: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    user: AuthUser,
}

#[derive(Serialize)]
struct InsertRow<'a> {
    user_id: &'a OwnerId,
    name: &'a str,
    code: &'a str,
    image_url: &'a str,
    tags: &'a [String],
}

/// Gateway speaking the hosted backend's REST shape.
pub struct HttpGateway {
    config: HttpGatewayConfig,
    http_client: reqwest::Client,
    session: Mutex<Option<Session>>,
}

impl HttpGateway {
    pub fn new(config: HttpGatewayConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            config,
            http_client,
            session: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &HttpGatewayConfig {
        &self.config
    }

    fn session_slot(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn session(&self) -> Result<Session, GatewayError> {
        let mut slot = self.session_slot();
        if matches!(&*slot, Some(session) if session.is_expired_at(Utc::now())) {
            info!("session expired");
            *slot = None;
        }
        slot.as_ref()
            .cloned()
            .ok_or_else(|| GatewayError::Access("not signed in".to_string()))
    }

    fn with_key(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("apikey", &self.config.api_key)
    }

    fn authorized(&self, request: RequestBuilder, session: &Session) -> RequestBuilder {
        self.with_key(request).bearer_auth(&session.access_token)
    }

    async fn send(request: RequestBuilder, op: &'static str) -> Result<Response, GatewayError> {
        let response = request.send().await.map_err(|e| {
            error!(op, error = %e, "request failed");
            GatewayError::Network(e.to_string())
        })?;
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error!(op, %status, body = %body, "backend rejected request");
        Err(classify_status(status, &body))
    }

    async fn rows(response: Response) -> Result<Vec<Component>, GatewayError> {
        response
            .json::<Vec<Component>>()
            .await
            .map_err(|e| GatewayError::Network(format!("unexpected response body: {}", e)))
    }
}

/// Map a non-success HTTP status to the gateway taxonomy.
fn classify_status(status: StatusCode, body: &str) -> GatewayError {
    let detail = if body.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, body)
    };
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::Access(detail),
        StatusCode::NOT_FOUND => GatewayError::NotFound(detail),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY | StatusCode::CONFLICT => {
            GatewayError::Validation(detail)
        }
        _ => GatewayError::Network(detail),
    }
}

#[async_trait]
impl BackendGateway for HttpGateway {
    async fn authenticate(&self, email: &str) -> Result<(), GatewayError> {
        let request = self
            .with_key(self.http_client.post(self.config.auth_url("otp")))
            .json(&OtpRequest {
                email,
                create_user: true,
            });
        Self::send(request, "authenticate").await?;
        info!(email, "sign-in link requested");
        Ok(())
    }

    async fn verify_otp(&self, email: &str, code: &str) -> Result<Session, GatewayError> {
        let request = self
            .with_key(self.http_client.post(self.config.auth_url("verify")))
            .json(&VerifyRequest {
                kind: "email",
                email,
                token: code.trim(),
            });
        let token: TokenResponse = Self::send(request, "verify_otp")
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::Network(format!("unexpected token response: {}", e)))?;

        let user_id = OwnerId::parse(&token.user.id)
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        let session = Session {
            user_id,
            email: token.user.email.unwrap_or_else(|| email.to_string()),
            access_token: token.access_token,
            expires_at: token
                .expires_in
                .map(|secs| Utc::now() + ChronoDuration::seconds(secs)),
        };
        *self.session_slot() = Some(session.clone());
        info!(email = %session.email, "session established");
        Ok(session)
    }

    /// Session held by this process. A link opened in a browser signs in
    /// that browser, not this client, so only `verify_otp` fills the slot.
    async fn current_session(&self) -> Result<Option<Session>, GatewayError> {
        Ok(self.session().ok())
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        let Some(session) = self.session_slot().take() else {
            return Ok(());
        };
        let request = self.authorized(self.http_client.post(self.config.auth_url("logout")), &session);
        Self::send(request, "sign_out").await?;
        Ok(())
    }

    async fn list_entities(&self) -> Result<Vec<Component>, GatewayError> {
        let session = self.session()?;
        let request = self
            .authorized(self.http_client.get(self.config.table_url()), &session)
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        let rows = Self::rows(Self::send(request, "list_entities").await?).await?;
        debug!(count = rows.len(), "components listed");
        Ok(rows)
    }

    async fn insert_entity(&self, new: NewComponent) -> Result<Component, GatewayError> {
        let session = self.session()?;
        new.validate()?;
        let row = InsertRow {
            user_id: &session.user_id,
            name: &new.name,
            code: &new.code,
            image_url: &new.image_url,
            tags: &new.tags,
        };
        let request = self
            .authorized(self.http_client.post(self.config.table_url()), &session)
            .header("Prefer", "return=representation")
            .json(&[row]);
        Self::rows(Self::send(request, "insert_entity").await?)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::Network("insert returned no row".to_string()))
    }

    async fn update_entity(
        &self,
        id: &ComponentId,
        patch: ComponentPatch,
    ) -> Result<Component, GatewayError> {
        let session = self.session()?;
        patch.validate()?;
        let request = self
            .authorized(self.http_client.patch(self.config.table_url()), &session)
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(&patch);
        Self::rows(Self::send(request, "update_entity").await?)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::NotFound(id.to_string()))
    }

    async fn delete_entity(&self, id: &ComponentId) -> Result<(), GatewayError> {
        let session = self.session()?;
        let request = self
            .authorized(self.http_client.delete(self.config.table_url()), &session)
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation");
        let deleted = Self::rows(Self::send(request, "delete_entity").await?).await?;
        if deleted.is_empty() {
            return Err(GatewayError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn upload_image(&self, bytes: Vec<u8>, file_name: &str) -> Result<String, GatewayError> {
        let session = self.session()?;
        let path = image_object_path(file_name);
        let size = bytes.len();
        let request = self
            .authorized(self.http_client.post(self.config.object_url(&path)), &session)
            .header("Content-Type", image_content_type(file_name))
            .body(bytes);
        Self::send(request, "upload_image").await.map_err(|err| match err {
            GatewayError::Access(detail) => GatewayError::Access(detail),
            other => GatewayError::Storage(other.to_string()),
        })?;
        info!(path = %path, size, "image uploaded");
        Ok(self.config.public_object_url(&path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> HttpGatewayConfig {
        HttpGatewayConfig {
            url: "https://project.example.test/".to_string(),
            api_key: "anon".to_string(),
            bucket: "component-images".to_string(),
            table: "components".to_string(),
        }
    }

    #[test]
    fn test_endpoint_urls() {
        let config = config();
        assert_eq!(config.auth_url("otp"), "https://project.example.test/auth/v1/otp");
        assert_eq!(config.table_url(), "https://project.example.test/rest/v1/components");
        assert_eq!(
            config.public_object_url("components/a.png"),
            "https://project.example.test/storage/v1/object/public/component-images/components/a.png"
        );
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, ""),
            GatewayError::Access(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND, "gone"),
            GatewayError::NotFound(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::UNPROCESSABLE_ENTITY, ""),
            GatewayError::Validation(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, ""),
            GatewayError::Network(_)
        ));
    }

    #[tokio::test]
    async fn test_row_calls_without_session_fail_locally() {
        let gateway = HttpGateway::new(config()).unwrap();
        assert!(gateway.current_session().await.unwrap().is_none());
        let err = gateway.list_entities().await.unwrap_err();
        assert!(matches!(err, GatewayError::Access(_)));
        let err = gateway.upload_image(vec![0; 4], "a.png").await.unwrap_err();
        assert!(matches!(err, GatewayError::Access(_)));
        // Signing out without a session is a no-op.
        gateway.sign_out().await.unwrap();
    }
}
