//! Login, logout, and "who am I" resolution for the logged-in user.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::client::{ApiClient, AuthResponse, Credentials, Registration};
use crate::error::{ApiError, AuthError, StoreError};
use crate::extract::{self, ProfileId};
use crate::session::{SessionStore, StoredSession};

/// A best-effort identity: either half may be unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Option<ProfileId>,
    pub username: Option<String>,
}

impl Identity {
    pub fn from_record(record: &Value) -> Self {
        Self {
            id: extract::profile_id(record),
            username: extract::username(record),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.id.is_some() && self.username.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.username.is_none()
    }

    /// Fills the missing halves from `other`. Known halves are never replaced.
    pub fn fill_from(&mut self, other: Identity) {
        if self.id.is_none() {
            self.id = other.id;
        }
        if self.username.is_none() {
            self.username = other.username;
        }
    }
}

/// Logs in and persists the session.
pub async fn login(
    client: &ApiClient,
    store: &dyn SessionStore,
    email: &str,
    password: &str,
) -> Result<StoredSession, AuthError> {
    let credentials = Credentials {
        email: email.to_string(),
        password: password.to_string(),
    };
    let resp = client.login(&credentials).await?;
    let session = session_from_auth(client, &resp, email, "user", "loginTime");
    store.save(&session)?;
    tracing::info!(username = ?session.user.as_ref().and_then(extract::username), "logged in");
    Ok(session)
}

/// Registers a new account and persists the resulting session.
pub async fn register(
    client: &ApiClient,
    store: &dyn SessionStore,
    registration: &Registration,
) -> Result<StoredSession, AuthError> {
    let resp = client.register(registration).await?;
    let session = session_from_auth(
        client,
        &resp,
        &registration.email,
        &registration.kind,
        "registerTime",
    );
    store.save(&session)?;
    tracing::info!(username = %registration.username, "registered");
    Ok(session)
}

fn session_from_auth(
    client: &ApiClient,
    resp: &AuthResponse,
    email: &str,
    default_kind: &str,
    time_key: &str,
) -> StoredSession {
    let body = &resp.body;
    let text = |field: &str| body.get(field).and_then(Value::as_str).map(str::to_string);
    let now = OffsetDateTime::now_utc().format(&Rfc3339).ok();

    let mut user = json!({
        "id": extract::profile_id(body),
        "name": text("name"),
        "username": extract::username(body),
        "email": text("email").unwrap_or_else(|| email.to_string()),
        "type": text("type").unwrap_or_else(|| default_kind.to_string()),
    });
    if let Some(obj) = user.as_object_mut() {
        obj.insert(time_key.to_string(), json!(now));
    }

    StoredSession {
        server: Some(client.base_url().as_str().trim_end_matches('/').to_string()),
        authenticated: true,
        token: Some(resp.jwt.clone()),
        user: Some(user),
    }
}

/// Removes the stored session.
pub fn logout(store: &dyn SessionStore) -> Result<bool, StoreError> {
    store.clear()
}

/// Clears the stored session when `err` says the backend rejected it.
///
/// Returns `true` when the session was cleared; callers must then send the
/// user back to login.
pub fn expire_on_rejection(store: &dyn SessionStore, err: &ApiError) -> bool {
    if !err.is_session_expired() {
        return false;
    }
    tracing::warn!(error = %err, "backend rejected session, clearing stored credentials");
    if let Err(e) = store.clear() {
        tracing::warn!(error = %e, "failed to clear stored session");
    }
    true
}

/// Returns a client carrying the stored bearer token, if logged in.
pub fn authenticated_client(
    client: &ApiClient,
    store: &dyn SessionStore,
) -> Result<Option<ApiClient>, StoreError> {
    let session = store.load()?;
    if !session.is_authenticated() {
        return Ok(None);
    }
    Ok(Some(client.with_token(session.token)))
}

/// Resolves the logged-in user's identity.
///
/// Sources are tried in order, each only filling what is still unknown:
/// the stored user blob, `GET /auth/me`, `GET /profile`, and finally the
/// claims of the bearer token. Failing endpoints are skipped, except for a
/// rejected session which is returned as an error.
pub async fn resolve_self(client: &ApiClient, stored: &StoredSession) -> Result<Identity, ApiError> {
    let mut identity = stored
        .user
        .as_ref()
        .map(Identity::from_record)
        .unwrap_or_default();

    if !identity.is_complete() {
        identity.fill_from(probe_endpoint("/auth/me", client.auth_me().await)?);
    }
    if !identity.is_complete() {
        identity.fill_from(probe_endpoint("/profile", client.own_profile().await)?);
    }
    if identity.is_empty()
        && let Some(claims) = stored.token.as_deref().and_then(decode_jwt_claims)
    {
        identity.fill_from(identity_from_claims(&claims));
    }

    tracing::debug!(?identity, "resolved own identity");
    Ok(identity)
}

fn probe_endpoint(name: &str, result: Result<Value, ApiError>) -> Result<Identity, ApiError> {
    match result {
        Ok(record) => Ok(Identity::from_record(&record)),
        Err(e) if e.is_session_expired() => Err(e),
        Err(e) => {
            tracing::debug!(endpoint = name, error = %e, "identity source unavailable");
            Ok(Identity::default())
        }
    }
}

/// Decodes the payload segment of a JWT without verifying it.
pub fn decode_jwt_claims(token: &str) -> Option<Value> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}

fn identity_from_claims(claims: &Value) -> Identity {
    let username = ["sub", "username", "preferred_username", "name"]
        .iter()
        .find_map(|k| claims.get(*k).and_then(Value::as_str))
        .and_then(extract::sanitize_username);
    let id = ["id", "profileId"]
        .iter()
        .find_map(|k| claims.get(*k).and_then(ProfileId::from_value));
    Identity { id, username }
}

/// Whether `entity` (a product or post) belongs to `identity`.
///
/// Matches on owner id or on owner username, trimmed and case-insensitive.
/// Direct owner fields win over a nested `author`/`owner` relationship.
pub fn is_owner(entity: &Value, identity: &Identity) -> bool {
    let owner_id = ["profileId", "userId", "createdBy"]
        .iter()
        .find_map(|k| entity.get(*k).and_then(ProfileId::from_value))
        .or_else(|| extract::owner_profile_id(entity));
    let owner_username = ["profileUsername", "username", "ownerUsername"]
        .iter()
        .find_map(|k| entity.get(*k).and_then(Value::as_str))
        .and_then(extract::sanitize_username)
        .or_else(|| extract::username(entity));

    let by_id = matches!(
        (&owner_id, &identity.id),
        (Some(a), Some(b)) if a.as_str().eq_ignore_ascii_case(b.as_str())
    );
    let by_username = matches!(
        (&owner_username, &identity.username),
        (Some(a), Some(b)) if a.trim().eq_ignore_ascii_case(b.trim())
    );
    by_id || by_username
}
