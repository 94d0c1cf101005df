//! Collections that hang off a profile: products and organization events.

use serde_json::Value;

use crate::client::ApiClient;
use crate::error::{ApiError, ViewError};
use crate::models::ProfileKind;
use crate::normalize;

use super::resolver::resolve_identity;
use super::session::{ViewSession, ViewTarget};
use super::{Collection, Unavailable};

/// Products of the session's profile, fetched at most once per session
/// unless `refresh` is set.
pub async fn products(
    client: &ApiClient,
    session: &ViewSession,
    refresh: bool,
) -> Result<Collection, ViewError> {
    let cell = if refresh {
        session.products.reset()
    } else {
        session.products.current()
    };
    cell.get_or_try_init(|| fetch_products(client, session))
        .await
        .cloned()
}

async fn fetch_products(client: &ApiClient, session: &ViewSession) -> Result<Collection, ViewError> {
    let Some(id) = resolve_identity(client, session).await? else {
        return Ok(fallback(session, "products", Unavailable::IdentityUnresolved));
    };

    match client.products_by_profile(id.as_str()).await {
        Ok(body) => Ok(Collection::Loaded(normalize::into_collection(body))),
        Err(e) => recover(session, "products", e),
    }
}

/// Events of the session's organization, fetched at most once per session
/// unless `refresh` is set.
///
/// Public views query by username; the own view uses the logged-in
/// organization's endpoint.
pub async fn organization_events(
    client: &ApiClient,
    session: &ViewSession,
    refresh: bool,
) -> Result<Collection, ViewError> {
    let cell = if refresh {
        session.events.reset()
    } else {
        session.events.current()
    };
    cell.get_or_try_init(|| fetch_events(client, session))
        .await
        .cloned()
}

async fn fetch_events(client: &ApiClient, session: &ViewSession) -> Result<Collection, ViewError> {
    if let Some(record) = session.record()
        && ProfileKind::of(record) == Some(ProfileKind::User)
    {
        return Ok(Collection::Unavailable(Unavailable::NotOrganization));
    }

    let result = match session.target() {
        ViewTarget::Own => client.organization_events().await,
        ViewTarget::Public(username) => client.organization_events_by_username(username).await,
    };
    match result {
        Ok(body) => Ok(Collection::Loaded(normalize::into_collection(body))),
        Err(e) => recover(session, "events", e),
    }
}

fn recover(session: &ViewSession, field: &str, err: ApiError) -> Result<Collection, ViewError> {
    if err.is_session_expired() {
        return Err(err.into());
    }
    tracing::warn!(
        generation = session.generation(),
        collection = field,
        error = %err,
        "fetch failed, falling back to embedded data"
    );
    let reason = if err.is_not_found() {
        Unavailable::NotFound
    } else {
        Unavailable::Failed(err.to_string())
    };
    Ok(fallback(session, field, reason))
}

fn fallback(session: &ViewSession, field: &str, reason: Unavailable) -> Collection {
    session
        .record()
        .and_then(|record| normalize::embedded(record, field))
        .map(Collection::Embedded)
        .unwrap_or(Collection::Unavailable(reason))
}

/// Entries of a collection, if there are any to show.
pub fn entries(collection: &Collection) -> &[Value] {
    match collection {
        Collection::Loaded(items) | Collection::Embedded(items) => items,
        Collection::Unavailable(_) => &[],
    }
}
