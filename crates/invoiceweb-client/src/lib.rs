//! REST client for the invoicing API
//!
//! Implements [`DataSource`] for every [`Resource`] and [`Authenticator`]
//! against a JWT login endpoint. The bearer token is attached to every
//! request once logged in.

pub mod error;
pub mod hydra;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hyper::body::Bytes;
use hyper::client::HttpConnector;
use hyper::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use hyper::{Body, Client, Method, Request, Uri};
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use invoiceweb_config::ApiConfig;
use invoiceweb_core::{Authenticator, CoreError, CoreResult, DataSource, RecordId, Registration};

pub use error::{ClientError, ClientResult};
pub use hydra::Resource;

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewUser<'a> {
    first_name: &'a str,
    last_name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Deserialize)]
struct Claims {
    exp: Option<i64>,
}

/// Whether the JWT's `exp` claim lies in the past.
/// Tokens without a readable claim are treated as valid.
pub fn token_expired(token: &str) -> bool {
    let claims = token
        .split('.')
        .nth(1)
        .and_then(|payload| URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok())
        .and_then(|json| serde_json::from_slice::<Claims>(&json).ok());

    match claims.and_then(|c| c.exp) {
        Some(exp) => exp <= chrono::Utc::now().timestamp(),
        None => false,
    }
}

/// HTTP client of the invoicing API
pub struct ApiClient {
    http: Client<HttpConnector>,
    base_url: String,
    login_path: String,
    register_path: String,
    timeout: Duration,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> ClientResult<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let uri: Uri = base_url.parse().map_err(|e: hyper::http::uri::InvalidUri| {
            ClientError::InvalidUrl {
                url: base_url.clone(),
                message: e.to_string(),
            }
        })?;
        if uri.scheme_str() != Some("http") {
            return Err(ClientError::UnsupportedScheme { url: base_url });
        }

        log::info!(target: "invoiceweb::client", "Using API at {}", base_url);
        Ok(Self {
            http: Client::new(),
            base_url,
            login_path: config.login_path.clone(),
            register_path: config.register_path.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
            token: RwLock::new(None),
        })
    }

    /// Start with an already issued token
    pub fn with_token(self, token: impl Into<String>) -> Self {
        self.set_token(Some(token.into()));
        self
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    async fn send(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> ClientResult<Bytes> {
        let url = self.build_url(path);
        let mut builder = Request::builder()
            .method(method.clone())
            .uri(url.as_str())
            .header(ACCEPT, "application/ld+json, application/json");
        if let Some(token) = self.token() {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(bytes) => builder.header(CONTENT_TYPE, "application/json").body(Body::from(bytes))?,
            None => builder.body(Body::empty())?,
        };

        log::debug!(target: "invoiceweb::client", "{} {}", method, url);
        let response = tokio::time::timeout(self.timeout, self.http.request(request))
            .await
            .map_err(|_| ClientError::Timeout { url: url.clone() })??;

        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await?;
        if !status.is_success() {
            log::warn!(target: "invoiceweb::client", "{} {} -> {}", method, url, status);
            return Err(ClientError::Status {
                method: method.to_string(),
                url,
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok(bytes)
    }

    async fn send_json(&self, method: Method, path: &str, body: &serde_json::Value) -> ClientResult<Bytes> {
        let bytes = serde_json::to_vec(body)?;
        self.send(method, path, Some(bytes)).await
    }
}

fn record_error<R: Resource>(error: ClientError, id: RecordId) -> CoreError {
    match error.status() {
        Some(404) => CoreError::NotFound {
            collection: R::COLLECTION.to_string(),
            id,
        },
        _ => error.into(),
    }
}

#[async_trait]
impl<R: Resource> DataSource<R> for ApiClient {
    async fn find_all(&self) -> CoreResult<Vec<R>> {
        let body = self.send(Method::GET, R::PATH, None).await?;
        let items = hydra::decode_collection(&body).map_err(ClientError::from)?;
        Ok(items)
    }

    async fn find(&self, id: RecordId) -> CoreResult<R> {
        let body = self
            .send(Method::GET, &R::iri(id), None)
            .await
            .map_err(|e| record_error::<R>(e, id))?;
        let record = serde_json::from_slice(&body).map_err(ClientError::from)?;
        Ok(record)
    }

    async fn delete(&self, id: RecordId) -> CoreResult<()> {
        self.send(Method::DELETE, &R::iri(id), None)
            .await
            .map_err(|e| record_error::<R>(e, id))?;
        Ok(())
    }

    async fn create(&self, draft: &R::Draft) -> CoreResult<R> {
        let body = self.send_json(Method::POST, R::PATH, &R::payload(draft)).await?;
        let record = serde_json::from_slice(&body).map_err(ClientError::from)?;
        Ok(record)
    }

    async fn update(&self, id: RecordId, draft: &R::Draft) -> CoreResult<R> {
        let body = self
            .send_json(Method::PUT, &R::iri(id), &R::payload(draft))
            .await
            .map_err(|e| record_error::<R>(e, id))?;
        let record = serde_json::from_slice(&body).map_err(ClientError::from)?;
        Ok(record)
    }
}

#[async_trait]
impl Authenticator for ApiClient {
    async fn login(&self, username: &str, password: &str) -> CoreResult<()> {
        let credentials = serde_json::to_value(Credentials { username, password })
            .map_err(ClientError::from)?;
        let body = self
            .send_json(Method::POST, &self.login_path, &credentials)
            .await
            .map_err(|e| match e.status() {
                Some(400 | 401) => CoreError::Unauthorized,
                _ => CoreError::from(e),
            })?;
        let response: TokenResponse = serde_json::from_slice(&body).map_err(ClientError::from)?;

        self.set_token(Some(response.token));
        log::info!(target: "invoiceweb::auth", "User '{}' logged in", username);
        Ok(())
    }

    async fn register(&self, registration: &Registration) -> CoreResult<()> {
        registration.validate()?;
        let user = serde_json::to_value(NewUser {
            first_name: registration.first_name.trim(),
            last_name: registration.last_name.trim(),
            email: registration.username(),
            password: &registration.password,
        })
        .map_err(ClientError::from)?;
        self.send_json(Method::POST, &self.register_path, &user).await?;
        log::info!(target: "invoiceweb::auth", "Registered account '{}'", registration.username());
        Ok(())
    }

    fn logout(&self) {
        self.set_token(None);
    }

    fn is_authenticated(&self) -> bool {
        match self.token() {
            Some(token) if !token_expired(&token) => true,
            Some(_) => {
                log::info!(target: "invoiceweb::auth", "Session token expired");
                self.set_token(None);
                false
            }
            None => false,
        }
    }
}
