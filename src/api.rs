//! Thin HTTP wrappers around the MoodScribe backend.
//!
//! One method per remote capability. Every call is a single attempt: no
//! retry, no timeout, no backoff. Callers decide what the user sees.

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::{AuthResponse, ChatResponse, DiaryEntry, Message, NewUser, Preferences, User, UserContext};

#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx response. `message` is the server's own text when it sent one.
    #[error("Request failed ({status}): {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response from server: {0}")]
    Decode(String),
}

impl ApiError {
    /// Server-supplied message, when the failure carried one
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::RequestFailed { message, .. } => Some(message.as_str()),
            _ => None,
        }
    }

    /// Rejected credentials or an expired/missing token
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ApiError::RequestFailed { status: 400 | 401 | 403, .. })
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    user: &'a NewUser,
    preferences: serde_json::Value,
}

/// Cheap-to-clone handle on the backend. Holds the bearer token captured at
/// construction so spawned calls use the session current at dispatch time.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            token: None,
        }
    }

    /// Same client with `token` as the bearer credential
    pub fn with_token(&self, token: Option<&str>) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            token: token.map(str::to_string),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, authenticated = self.token.is_some(), "api request");
        let builder = self.http.request(method, url);
        match self.token {
            Some(ref token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await.inspect_err(|e| {
            tracing::warn!(error = %e, "api transport failure");
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_error_message(&body).unwrap_or_else(|| default_message(status));
            tracing::warn!(status = status.as_u16(), %message, "api request rejected");
            return Err(ApiError::RequestFailed {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `POST /auth/login`
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let builder = self
            .request(Method::POST, "/auth/login")
            .json(&LoginRequest { username, password });
        self.send(builder).await
    }

    /// `POST /auth/register`. `None` preferences are sent as an empty object.
    pub async fn register(&self, user: &NewUser, preferences: Option<&Preferences>) -> Result<AuthResponse, ApiError> {
        let preferences = match preferences {
            Some(prefs) => serde_json::to_value(prefs).map_err(|e| ApiError::Decode(e.to_string()))?,
            None => serde_json::json!({}),
        };
        let builder = self
            .request(Method::POST, "/auth/register")
            .json(&RegisterRequest { user, preferences });
        self.send(builder).await
    }

    /// `POST /diary-entry`
    pub async fn post_diary_entry(&self, user_id: &str, content: &str, timestamp: &str) -> Result<ChatResponse, ApiError> {
        let entry = DiaryEntry {
            user_id: user_id.to_string(),
            content: content.to_string(),
            timestamp: timestamp.to_string(),
        };
        let builder = self.request(Method::POST, "/diary-entry").json(&entry);
        self.send(builder).await
    }

    /// `GET /conversation-history/{user_id}`
    pub async fn fetch_history(&self, user_id: &str) -> Result<Vec<Message>, ApiError> {
        let builder = self.request(Method::GET, &format!("/conversation-history/{}", user_id));
        self.send(builder).await
    }

    /// `GET /preferences/{user_id}`
    pub async fn fetch_preferences(&self, user_id: &str) -> Result<Preferences, ApiError> {
        let builder = self.request(Method::GET, &format!("/preferences/{}", user_id));
        self.send(builder).await
    }

    /// `PUT /preferences/{user_id}` with the full preference set
    pub async fn update_preferences(&self, user_id: &str, preferences: &Preferences) -> Result<Preferences, ApiError> {
        let builder = self
            .request(Method::PUT, &format!("/preferences/{}", user_id))
            .json(preferences);
        self.send(builder).await
    }

    /// `GET /auth/me`
    pub async fn fetch_profile(&self) -> Result<User, ApiError> {
        let builder = self.request(Method::GET, "/auth/me");
        self.send(builder).await
    }

    /// `GET /user-context/{user_id}`
    pub async fn fetch_user_context(&self, user_id: &str) -> Result<UserContext, ApiError> {
        let builder = self.request(Method::GET, &format!("/user-context/{}", user_id));
        self.send(builder).await
    }
}

/// Pull a human-readable message out of an error body
/// (`detail`, `error` or `message`, whichever is a string)
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["detail", "error", "message"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

fn default_message(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}
