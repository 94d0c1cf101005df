//! Profile identity resolution for one view session.

use serde_json::Value;

use crate::client::ApiClient;
use crate::error::ViewError;
use crate::extract::{self, ProfileId};
use crate::normalize;

use super::session::ViewSession;

/// Resolves the profile id of the session's target.
///
/// Concurrent callers share a single lookup. A resolved id is final for the
/// session. An unresolved (`None`) outcome is memoized too, but the
/// session's cached sources are consulted again on every call, so a record
/// that finished loading after the lookup started still supplies its id. A
/// rejected session is returned as an error and not memoized.
pub async fn resolve_identity(
    client: &ApiClient,
    session: &ViewSession,
) -> Result<Option<ProfileId>, ViewError> {
    let resolved = session
        .identity
        .get_or_try_init(|| lookup(client, session))
        .await
        .cloned()?;
    Ok(resolved.or_else(|| session.cached_identity()))
}

async fn lookup(client: &ApiClient, session: &ViewSession) -> Result<Option<ProfileId>, ViewError> {
    if let Some(id) = session.cached_identity() {
        tracing::trace!(generation = session.generation(), %id, "identity cache hit");
        return Ok(Some(id));
    }

    let Some(username) = session.username() else {
        tracing::debug!(generation = session.generation(), "no username to resolve identity");
        return Ok(None);
    };

    tracing::debug!(generation = session.generation(), %username, "identity cache miss, searching");
    match client.search_user(&username).await {
        Ok(response) => {
            let found = match_candidate(normalize::collection_slice(&response), &username);
            if found.is_none() {
                tracing::warn!(%username, "no search result matches username");
            }
            Ok(found)
        }
        Err(e) if e.is_session_expired() => Err(e.into()),
        Err(e) => {
            tracing::warn!(%username, error = %e, "identity lookup failed");
            Ok(None)
        }
    }
}

/// Returns the id of the first candidate whose username equals `username`
/// case-insensitively and whose id is resolvable.
pub fn match_candidate(candidates: &[Value], username: &str) -> Option<ProfileId> {
    let wanted = username.trim().to_lowercase();
    candidates
        .iter()
        .filter(|candidate| {
            candidate
                .get("username")
                .and_then(Value::as_str)
                .is_some_and(|name| name.trim().to_lowercase() == wanted)
        })
        .find_map(extract::profile_id)
}
