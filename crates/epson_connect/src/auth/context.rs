//! Session lifecycle: grant exchanges, lazy token refresh, and the
//! bearer-wrapped `send` seam every device-scoped operation goes through.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::Method;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::{Error, Result};

pub(crate) const EMPTY_BODY_MESSAGE: &str = "Request was successful, but no data was returned.";

const TOKEN_PATH: &str = "/api/1/printing/oauth2/auth/token?subject=printer";

#[derive(Debug)]
struct SessionState {
    access_token: String,
    refresh_token: String,
    subject_id: String,
    expires_at: DateTime<Utc>,
}

impl SessionState {
    fn new() -> Self {
        SessionState {
            access_token: String::new(),
            refresh_token: String::new(),
            subject_id: String::new(),
            expires_at: Utc::now(),
        }
    }
}

/// Read-only copy of the current session fields.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub access_token: String,
    pub refresh_token: String,
    pub subject_id: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
    subject_id: String,
}

/// Owns the session state and performs every outbound request. Printer and
/// scanner views hold an `Arc` to the one instance; the session is never
/// copied out of it.
#[derive(Debug)]
pub struct AuthContext {
    client: Arc<ClientWithMiddleware>,
    base_url: String,
    printer_email: String,
    client_id: String,
    client_secret: String,
    session: tokio::sync::Mutex<SessionState>,
}

impl AuthContext {
    pub(crate) fn new(client: Arc<ClientWithMiddleware>, config: Config) -> Self {
        AuthContext {
            client,
            base_url: config.base_url,
            printer_email: config.printer_email,
            client_id: config.client_id,
            client_secret: config.client_secret,
            session: tokio::sync::Mutex::new(SessionState::new()),
        }
    }

    /// Makes sure a valid bearer token is held, performing a grant exchange
    /// only when the current token has expired. The session lock is held
    /// across the exchange, so concurrent callers that both observe an
    /// expired token serialize behind a single request.
    pub async fn ensure_authenticated(&self) -> Result<()> {
        let mut session = self.session.lock().await;

        if session.expires_at > Utc::now() {
            return Ok(());
        }

        let params: Vec<(&str, String)> = if session.access_token.is_empty() {
            // Password grant: the account email plus an empty password field.
            // The real credential is the basic-auth client id/secret; the
            // empty field is the vendor wire format.
            vec![
                ("grant_type", "password".to_string()),
                ("username", self.printer_email.clone()),
                ("password", String::new()),
            ]
        } else {
            vec![
                ("grant_type", "refresh_token".to_string()),
                ("refresh_token", session.refresh_token.clone()),
            ]
        };

        let body = self.token_exchange(&params).await.map_err(|e| match e {
            Error::Authentication(_) => e,
            other => Error::Authentication(other.to_string()),
        })?;

        if let Some(code) = body.get("error").and_then(Value::as_str) {
            return Err(Error::Authentication(code.to_string()));
        }

        let token: TokenResponse =
            serde_json::from_value(body).map_err(|e| Error::Authentication(e.to_string()))?;

        if let Some(refresh_token) = token.refresh_token.filter(|t| !t.is_empty()) {
            session.refresh_token = refresh_token;
        }
        session.expires_at = Utc::now() + Duration::seconds(token.expires_in);
        session.access_token = token.access_token;
        session.subject_id = token.subject_id;

        info!("authenticated subject {}", session.subject_id);
        Ok(())
    }

    /// Revokes the device registration remotely. Local session fields are
    /// left untouched; the instance is expected to be dropped afterwards.
    pub(crate) async fn deauthenticate(&self) -> Result<()> {
        let subject_id = self.device_id().await;
        let path = format!("/api/1/printing/printers/{subject_id}");
        self.send(Method::DELETE, &path, None).await?;
        Ok(())
    }

    async fn token_exchange(&self, params: &[(&str, String)]) -> Result<Value> {
        debug!("POST {TOKEN_PATH} auth=basic");
        let response = self
            .client
            .post(format!("{}{}", self.base_url, TOKEN_PATH))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(params)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Performs a bearer-authenticated JSON request against `path`. A valid
    /// token is ensured (awaited, not fire-and-forget) before the bearer
    /// header is read.
    pub(crate) async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value> {
        self.ensure_authenticated().await?;
        let access_token = self.session.lock().await.access_token.clone();

        debug!("{method} {path} auth=bearer");
        let mut request = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header(AUTHORIZATION, format!("Bearer {access_token}"))
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Raw-bytes variant of [`send`](Self::send) for file uploads. Only
    /// content headers are attached; upload URIs carry their own signed key.
    pub(crate) async fn send_octets(
        &self,
        method: Method,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<Value> {
        self.ensure_authenticated().await?;

        debug!("{method} {path} bytes={}", data.len());
        let response = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, data.len())
            .body(data)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Fetches an arbitrary URL as raw bytes, outside the authenticated
    /// session. Used for remote print sources.
    pub(crate) async fn fetch_bytes(&self, url: &str) -> Result<Bytes> {
        let response = self.client.get(url).send().await?;
        Ok(response.bytes().await?)
    }

    /// Normalizes a response body. Order matters: a declared non-JSON
    /// content type is wrapped as `{"code": <raw text>}` first, then a
    /// non-empty `code` field fails, then an empty body becomes the fixed
    /// success sentinel. A response with no content-type header at all is
    /// not wrapped, so a bare empty body still normalizes to the sentinel.
    async fn handle_response(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let text = response.text().await?;

        let body = if !content_type.is_empty() && !content_type.contains("application/json") {
            json!({ "code": text })
        } else if text.trim().is_empty() {
            Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_str(&text)?
        };

        if let Some(code) = body.get("code").and_then(Value::as_str) {
            if !code.is_empty() {
                return Err(Error::Api(code.to_string()));
            }
        }

        if !status.is_success() {
            return Err(Error::Api(status.to_string()));
        }

        if body.as_object().is_some_and(|o| o.is_empty()) {
            return Ok(json!({ "message": EMPTY_BODY_MESSAGE }));
        }

        Ok(body)
    }

    /// Remote identifier of the authenticated device. Empty until the first
    /// successful grant exchange.
    pub async fn device_id(&self) -> String {
        self.session.lock().await.subject_id.clone()
    }

    pub async fn session(&self) -> SessionSnapshot {
        let session = self.session.lock().await;
        SessionSnapshot {
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
            subject_id: session.subject_id.clone(),
            expires_at: session.expires_at,
        }
    }
}
