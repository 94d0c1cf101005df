use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::OnceCell;

use crate::extract::{self, ProfileId};

use super::Collection;

/// Which profile a view shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewTarget {
    /// The logged-in user's own profile.
    Own,
    /// A third party's profile, by username.
    Public(String),
}

/// State of one profile view, from navigation-in to navigation-away.
///
/// Every cell is filled at most once; a new view gets a new `ViewSession`
/// instead of resetting this one, so late results from a discarded session
/// can only land in that discarded session.
pub struct ViewSession {
    generation: u64,
    target: ViewTarget,
    /// Cached user blob from the session store, consulted for the own profile.
    stored_user: Option<Value>,
    pub(super) record: OnceCell<Value>,
    pub(super) identity: OnceCell<Option<ProfileId>>,
    pub(super) products: RefreshableCell,
    pub(super) events: RefreshableCell,
}

impl ViewSession {
    pub(super) fn new(generation: u64, target: ViewTarget, stored_user: Option<Value>) -> Self {
        Self {
            generation,
            target,
            stored_user,
            record: OnceCell::new(),
            identity: OnceCell::new(),
            products: RefreshableCell::default(),
            events: RefreshableCell::default(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn target(&self) -> &ViewTarget {
        &self.target
    }

    pub fn is_own(&self) -> bool {
        self.target == ViewTarget::Own
    }

    /// The target username: the requested one for public views, otherwise
    /// whatever the stored user blob or the loaded record says.
    pub fn username(&self) -> Option<String> {
        match &self.target {
            ViewTarget::Public(username) => Some(username.clone()),
            ViewTarget::Own => self
                .stored_user
                .as_ref()
                .and_then(extract::username)
                .or_else(|| self.record().and_then(extract::username)),
        }
    }

    /// The loaded profile record, if loading has completed.
    pub fn record(&self) -> Option<&Value> {
        self.record.get()
    }

    /// The resolved identity, if resolution has completed.
    ///
    /// `Some(None)` means resolution finished without finding an id.
    pub fn identity(&self) -> Option<Option<&ProfileId>> {
        self.identity.get().map(Option::as_ref)
    }

    /// Identity already available without a network call.
    ///
    /// Priority: the record's own id, owner ids of embedded posts, owner ids
    /// of embedded products, then (own profile only) the stored user blob.
    pub fn cached_identity(&self) -> Option<ProfileId> {
        let from_record = self.record().and_then(|record| {
            extract::profile_id(record)
                .or_else(|| record.get("posts").and_then(extract::owner_profile_id_in))
                .or_else(|| record.get("products").and_then(extract::owner_profile_id_in))
        });
        from_record.or_else(|| {
            self.is_own()
                .then(|| self.stored_user.as_ref().and_then(extract::profile_id))
                .flatten()
        })
    }
}

/// A single-flight cell that an explicit refresh can replace.
#[derive(Default)]
pub(super) struct RefreshableCell {
    cell: Mutex<Arc<OnceCell<Collection>>>,
}

impl RefreshableCell {
    pub(super) fn current(&self) -> Arc<OnceCell<Collection>> {
        self.cell.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Drops the memoized value; in-flight callers keep their old cell.
    pub(super) fn reset(&self) -> Arc<OnceCell<Collection>> {
        let fresh = Arc::new(OnceCell::new());
        *self.cell.lock().unwrap_or_else(|e| e.into_inner()) = fresh.clone();
        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cached_identity_priority() {
        let session = ViewSession::new(1, ViewTarget::Public("ana".into()), None);
        assert_eq!(session.cached_identity(), None);

        session
            .record
            .set(json!({
                "username": "ana",
                "posts": [{ "id": "post-1", "profileId": "from-posts" }],
                "products": [{ "id": "prod-1", "profileId": "from-products" }]
            }))
            .unwrap();
        assert_eq!(session.cached_identity(), Some(ProfileId::new("from-posts")));
    }

    #[test]
    fn test_record_id_beats_collections() {
        let session = ViewSession::new(1, ViewTarget::Public("ana".into()), None);
        session
            .record
            .set(json!({ "profileId": "p1", "posts": [{ "userId": "other" }] }))
            .unwrap();
        assert_eq!(session.cached_identity(), Some(ProfileId::new("p1")));
    }

    #[test]
    fn test_own_view_uses_stored_user() {
        let stored = json!({ "id": "me-1", "username": "me" });
        let session = ViewSession::new(3, ViewTarget::Own, Some(stored));
        assert!(session.is_own());
        assert_eq!(session.username().as_deref(), Some("me"));
        assert_eq!(session.cached_identity(), Some(ProfileId::new("me-1")));

        session.record.set(json!({ "profileId": "rec-1" })).unwrap();
        assert_eq!(session.cached_identity(), Some(ProfileId::new("rec-1")));
    }

    #[test]
    fn test_public_view_ignores_stored_user() {
        let session = ViewSession::new(
            1,
            ViewTarget::Public("bob".into()),
            Some(json!({ "id": "me-1" })),
        );
        assert_eq!(session.cached_identity(), None);
        assert_eq!(session.username().as_deref(), Some("bob"));
    }

    #[test]
    fn test_refreshable_cell_reset() {
        let cell = RefreshableCell::default();
        let first = cell.current();
        first.set(Collection::Loaded(vec![json!(1)])).unwrap();
        assert!(cell.current().initialized());

        let fresh = cell.reset();
        assert!(!fresh.initialized());
        assert!(!cell.current().initialized());
        assert!(first.initialized());
    }
}
