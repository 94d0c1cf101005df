//! Bearer-authenticated client for the Inti REST backend.
//!
//! Every method maps to exactly one backend endpoint and returns the decoded
//! JSON body. Shape normalization is left to the callers (see
//! [`crate::normalize`] and [`crate::extract`]).

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::Form;
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::ApiError;
use crate::forms::{self, NewPost, NewProduct, ProfileUpdate, Upload};

/// Backend used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "https://20252-inti-production.up.railway.app";

/// Largest page the profile search endpoint accepts.
pub const MAX_SEARCH_LIMIT: u32 = 20;

/// Configuration for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, without a trailing slash.
    pub base_url: String,

    /// Per-request timeout. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

/// Login payload.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Registration payload.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    /// `"user"` or `"organization"`.
    #[serde(rename = "type")]
    pub kind: String,
}

/// Successful login/register response.
#[derive(Debug, Clone)]
pub struct AuthResponse {
    pub jwt: String,
    /// The whole response body, which also carries the profile fields.
    pub body: Value,
}

impl AuthResponse {
    fn from_body(body: Value) -> Result<Self, ApiError> {
        let jwt = body
            .get("jwt")
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
            .ok_or(ApiError::MissingToken)?
            .to_string();
        Ok(Self { jwt, body })
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl ApiClient {
    /// Creates an unauthenticated client.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/')).map_err(|e| {
            ApiError::InvalidArgument(format!("base URL {:?}: {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidArgument(format!(
                "base URL {:?} cannot carry paths",
                config.base_url
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url,
            token: None,
        })
    }

    /// Returns a copy of this client that sends `token` as a bearer token.
    #[must_use]
    pub fn with_token(&self, token: Option<String>) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            token,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves a media path against the backend. Absolute URLs pass through.
    pub fn media_url(&self, path: &str) -> Option<String> {
        resolve_media_url(self.base_url.as_str(), path)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let req = self
            .http
            .request(method, url)
            .header("Accept", "application/json");
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Value, ApiError> {
        let req = req.build()?;
        let path = req.url().path().to_string();
        tracing::debug!(method = %req.method(), %path, "backend request");

        let resp = self.http.execute(req).await.map_err(|e| {
            tracing::warn!(%path, error = %e, "backend request failed");
            ApiError::Transport(e)
        })?;
        handle_response(resp, &path).await
    }

    async fn get(&self, segments: &[&str]) -> Result<Value, ApiError> {
        self.send(self.request(Method::GET, self.endpoint(segments)))
            .await
    }

    async fn get_paged(&self, segments: &[&str], page: u32, size: u32) -> Result<Value, ApiError> {
        let req = self
            .request(Method::GET, self.endpoint(segments))
            .query(&[("page", page), ("size", size)]);
        self.send(req).await
    }

    async fn post(&self, segments: &[&str]) -> Result<Value, ApiError> {
        self.send(self.request(Method::POST, self.endpoint(segments)))
            .await
    }

    async fn delete(&self, segments: &[&str]) -> Result<Value, ApiError> {
        self.send(self.request(Method::DELETE, self.endpoint(segments)))
            .await
    }

    async fn send_form(
        &self,
        method: Method,
        segments: &[&str],
        form: Form,
    ) -> Result<Value, ApiError> {
        self.send(self.request(method, self.endpoint(segments)).multipart(form))
            .await
    }

    // --- auth ---

    pub async fn register(&self, registration: &Registration) -> Result<AuthResponse, ApiError> {
        let req = self
            .request(Method::POST, self.endpoint(&["auth", "register"]))
            .json(registration);
        AuthResponse::from_body(self.send(req).await?)
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        let req = self
            .request(Method::POST, self.endpoint(&["auth", "login"]))
            .json(credentials);
        AuthResponse::from_body(self.send(req).await?)
    }

    pub async fn auth_me(&self) -> Result<Value, ApiError> {
        self.get(&["auth", "me"]).await
    }

    // --- profiles ---

    /// The logged-in user's profile without posts.
    pub async fn own_profile(&self) -> Result<Value, ApiError> {
        self.get(&["profile"]).await
    }

    /// The logged-in user's profile with one page of posts.
    pub async fn my_profile(&self, page: u32, size: u32) -> Result<Value, ApiError> {
        self.get_paged(&["profile", "me"], page, size).await
    }

    /// A third party's profile with one page of posts.
    pub async fn public_profile(
        &self,
        username: &str,
        page: u32,
        size: u32,
    ) -> Result<Value, ApiError> {
        self.get_paged(&["profile", username], page, size).await
    }

    /// Exact-username lookup used to resolve profile ids.
    /// `PATCH /profile/update`. Only the fields that are set are sent.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<Value, ApiError> {
        self.send_form(Method::PATCH, &["profile", "update"], update.into_form()?)
            .await
    }

    /// `POST /profile/upload-me`.
    pub async fn upload_profile_picture(&self, picture: Upload) -> Result<Value, ApiError> {
        let form = forms::picture_form(picture)?;
        self.send_form(Method::POST, &["profile", "upload-me"], form)
            .await
    }

    pub async fn search_user(&self, username: &str) -> Result<Value, ApiError> {
        self.get(&["search", username]).await
    }

    /// Typeahead search. `limit` is clamped to `1..=20`.
    pub async fn search_profiles(&self, query: &str, limit: u32) -> Result<Value, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ApiError::InvalidArgument("search query is empty".into()));
        }
        let limit = limit.clamp(1, MAX_SEARCH_LIMIT).to_string();
        let req = self
            .request(Method::GET, self.endpoint(&["profile", "search"]))
            .query(&[("query", query), ("limit", limit.as_str())]);
        self.send(req).await
    }

    pub async fn follow(&self, username: &str) -> Result<Value, ApiError> {
        self.post(&["profile", username, "follow"]).await
    }

    pub async fn unfollow(&self, username: &str) -> Result<Value, ApiError> {
        self.delete(&["profile", username, "unfollow"]).await
    }

    // --- posts & feed ---

    pub async fn feed(&self, page: u32, size: u32) -> Result<Value, ApiError> {
        self.get_paged(&["feed"], page, size).await
    }

    pub async fn create_post(&self, post: NewPost) -> Result<Value, ApiError> {
        self.send_form(Method::POST, &["post"], post.into_form()?).await
    }

    pub async fn post_detail(&self, post_id: &str) -> Result<Value, ApiError> {
        self.get(&["post", post_id]).await
    }

    pub async fn delete_post(&self, post_id: &str) -> Result<Value, ApiError> {
        self.delete(&["post", post_id]).await
    }

    pub async fn like(&self, post_id: &str) -> Result<Value, ApiError> {
        self.post(&["post", post_id, "like"]).await
    }

    pub async fn unlike(&self, post_id: &str) -> Result<Value, ApiError> {
        self.delete(&["post", post_id, "like"]).await
    }

    // --- events ---

    pub async fn events(&self) -> Result<Value, ApiError> {
        self.get(&["event", "lists"]).await
    }

    pub async fn my_events(&self) -> Result<Value, ApiError> {
        self.get(&["event", "my"]).await
    }

    pub async fn event_detail(&self, event_id: &str) -> Result<Value, ApiError> {
        self.get(&["event", event_id]).await
    }

    pub async fn attend_event(&self, event_id: &str) -> Result<Value, ApiError> {
        self.post(&["event", event_id, "attendees"]).await
    }

    pub async fn cancel_attendance(&self, event_id: &str) -> Result<Value, ApiError> {
        self.delete(&["event", event_id, "attendees"]).await
    }

    pub async fn event_attendees(&self, event_id: &str) -> Result<Value, ApiError> {
        let req = self
            .request(Method::GET, self.endpoint(&["event", "following"]))
            .query(&[("eventId", event_id)]);
        self.send(req).await
    }

    /// Events of the logged-in organization.
    pub async fn organization_events(&self) -> Result<Value, ApiError> {
        self.get(&["org", "events"]).await
    }

    /// Events of an organization. Keyed by username, not by profile id.
    pub async fn organization_events_by_username(&self, username: &str) -> Result<Value, ApiError> {
        if username.trim().is_empty() {
            return Err(ApiError::InvalidArgument("username is empty".into()));
        }
        self.get(&["org", username, "events"]).await
    }

    // --- products ---

    pub async fn my_products(&self, page: u32, size: u32) -> Result<Value, ApiError> {
        self.get_paged(&["products"], page, size).await
    }

    pub async fn products_by_profile(&self, profile_id: &str) -> Result<Value, ApiError> {
        if profile_id.trim().is_empty() {
            return Err(ApiError::InvalidArgument("profile id is empty".into()));
        }
        self.get(&["products", "profile", profile_id]).await
    }

    pub async fn create_product(&self, product: NewProduct) -> Result<Value, ApiError> {
        self.send_form(Method::POST, &["products"], product.into_form()?)
            .await
    }

    pub async fn product_detail(&self, product_id: &str) -> Result<Value, ApiError> {
        self.get(&["products", product_id]).await
    }

    pub async fn delete_product(&self, product_id: &str) -> Result<Value, ApiError> {
        self.delete(&["products", product_id]).await
    }
}

async fn handle_response(resp: Response, path: &str) -> Result<Value, ApiError> {
    let status = resp.status();
    let declares_json = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));
    let body = resp.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|json| json.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| body.trim().to_string());
        tracing::debug!(status = status.as_u16(), %path, %message, "backend returned error status");
        return Err(ApiError::from_status(status.as_u16(), path, message));
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    decode_body(body, declares_json, path)
}

/// A body declared as JSON must parse. Undeclared bodies are parsed when
/// possible and otherwise returned as a JSON string.
fn decode_body(body: String, declares_json: bool, path: &str) -> Result<Value, ApiError> {
    match serde_json::from_str(&body) {
        Ok(value) => Ok(value),
        Err(e) if declares_json => Err(ApiError::Decode(format!("{path}: {e}"))),
        Err(_) => Ok(Value::String(body)),
    }
}

/// Joins a relative media path onto `base`. Absolute `http(s)` URLs pass through.
pub fn resolve_media_url(base: &str, path: &str) -> Option<String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Some(trimmed.to_string());
    }
    let base = base.trim_end_matches('/');
    let path = trimmed.trim_start_matches('/');
    Some(format!("{base}/{path}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> ApiClient {
        ApiClient::new(&ClientConfig::new("https://api.example.com/")).unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.request_timeout.is_none());

        let config = ClientConfig::new("http://localhost:8080")
            .with_request_timeout(Duration::from_secs(5));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ApiClient::new(&ClientConfig::new("not a url")),
            Err(ApiError::InvalidArgument(_))
        ));
        assert!(ApiClient::new(&ClientConfig::new("mailto:someone")).is_err());
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = client();
        assert_eq!(
            client.endpoint(&["org", "a b/c", "events"]).as_str(),
            "https://api.example.com/org/a%20b%2Fc/events"
        );
        assert_eq!(
            client.endpoint(&["products", "profile", "42"]).as_str(),
            "https://api.example.com/products/profile/42"
        );
    }

    #[test]
    fn test_with_token() {
        let client = client();
        assert!(client.token().is_none());
        let authed = client.with_token(Some("t0k".into()));
        assert_eq!(authed.token(), Some("t0k"));
        assert_eq!(authed.base_url(), client.base_url());
    }

    #[test]
    fn test_auth_response_requires_jwt() {
        let ok = AuthResponse::from_body(json!({ "jwt": "abc", "id": 1 })).unwrap();
        assert_eq!(ok.jwt, "abc");
        assert_eq!(ok.body["id"], 1);

        assert!(matches!(
            AuthResponse::from_body(json!({ "id": 1 })),
            Err(ApiError::MissingToken)
        ));
        assert!(matches!(
            AuthResponse::from_body(json!({ "jwt": "" })),
            Err(ApiError::MissingToken)
        ));
        assert!(matches!(
            AuthResponse::from_body(Value::Null),
            Err(ApiError::MissingToken)
        ));
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(
            decode_body(r#"{"id":1}"#.into(), true, "/post/1").unwrap(),
            json!({ "id": 1 })
        );
        assert_eq!(
            decode_body("Followed".into(), false, "/profile/ana/follow").unwrap(),
            json!("Followed")
        );
        assert!(matches!(
            decode_body("{truncated".into(), true, "/feed"),
            Err(ApiError::Decode(msg)) if msg.starts_with("/feed")
        ));
    }

    #[test]
    fn test_resolve_media_url() {
        let base = "https://api.example.com";
        assert_eq!(
            resolve_media_url(base, "/images/a.png").as_deref(),
            Some("https://api.example.com/images/a.png")
        );
        assert_eq!(
            resolve_media_url(base, "images/a.png").as_deref(),
            Some("https://api.example.com/images/a.png")
        );
        assert_eq!(
            resolve_media_url(base, "https://cdn.example.com/x.png").as_deref(),
            Some("https://cdn.example.com/x.png")
        );
        assert_eq!(resolve_media_url(base, "   "), None);
    }

    #[tokio::test]
    async fn test_search_rejects_blank_query() {
        let err = client().search_profiles("   ", 5).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(_)));
    }
}
