//! Profile views: identity resolution and dependent collections.
//!
//! A [`ProfileView`] always has at most one active [`ViewSession`]. Every
//! operation runs against the session that was active when it started; if
//! the view navigates elsewhere before the operation finishes, the caller
//! gets [`ViewError::Superseded`] and the result stays in the discarded
//! session.
//!
//! ```text
//!   navigate("ana") ──► ViewSession #1 ──► record ─┐
//!                                    └──► identity ◄┘ (cached, else /search/{username})
//!                                              │
//!                                              ├──► products  (/products/profile/{id})
//!                                              └──► events    (/org/{username}/events)
//! ```

pub mod fetchers;
pub mod resolver;
mod session;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::client::ApiClient;
use crate::error::ViewError;
use crate::extract::ProfileId;
use crate::session::SessionStore;

pub use session::{ViewSession, ViewTarget};

/// Page size of the posts embedded in a loaded profile record.
pub const PROFILE_POSTS_PAGE_SIZE: u32 = 10;

/// Outcome of a dependent fetch. Never "still loading".
#[derive(Debug, Clone, PartialEq)]
pub enum Collection {
    /// Fetched from the dedicated endpoint. May be empty.
    Loaded(Vec<Value>),
    /// The fetch was impossible or failed; these came embedded in the profile record.
    Embedded(Vec<Value>),
    /// Nothing to show.
    Unavailable(Unavailable),
}

impl Collection {
    pub fn entries(&self) -> &[Value] {
        fetchers::entries(self)
    }
}

/// Why a [`Collection`] is unavailable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unavailable {
    /// The profile id could not be resolved.
    IdentityUnresolved,
    /// The backend answered 404.
    NotFound,
    /// Events were requested for a non-organization profile.
    NotOrganization,
    /// Any other failure, with its message.
    Failed(String),
}

pub struct ProfileView {
    client: Arc<ApiClient>,
    store: Option<Arc<dyn SessionStore>>,
    current: Mutex<Option<Arc<ViewSession>>>,
    generation: AtomicU64,
}

impl ProfileView {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            store: None,
            current: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Clears `store` whenever the backend rejects the session.
    #[must_use]
    pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Starts viewing `username`'s public profile, discarding the current session.
    pub fn navigate(&self, username: &str) -> Arc<ViewSession> {
        self.replace(ViewTarget::Public(username.trim().to_string()), None)
    }

    /// Starts viewing the logged-in user's own profile.
    ///
    /// `stored_user` is the cached user blob from the session store, used as
    /// the lowest-priority identity source.
    pub fn navigate_own(&self, stored_user: Option<Value>) -> Arc<ViewSession> {
        self.replace(ViewTarget::Own, stored_user)
    }

    /// Leaves the current profile without opening another.
    pub fn close(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.lock() = None;
    }

    /// The active session, if any.
    pub fn session(&self) -> Option<Arc<ViewSession>> {
        self.lock().clone()
    }

    fn replace(&self, target: ViewTarget, stored_user: Option<Value>) -> Arc<ViewSession> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let session = Arc::new(ViewSession::new(generation, target, stored_user));
        tracing::debug!(generation, target = ?session.target(), "profile view session started");
        *self.lock() = Some(session.clone());
        session
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Arc<ViewSession>>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn active(&self) -> Result<Arc<ViewSession>, ViewError> {
        self.session().ok_or(ViewError::NoProfileLoaded)
    }

    fn is_current(&self, session: &ViewSession) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|current| current.generation() == session.generation())
    }

    /// Applies the stale-session guard and the session-expiry policy.
    fn settle<T>(&self, session: &ViewSession, result: Result<T, ViewError>) -> Result<T, ViewError> {
        if let (Err(ViewError::SessionExpired), Some(store)) = (&result, &self.store)
            && let Err(e) = store.clear()
        {
            tracing::warn!(error = %e, "failed to clear stored session");
        }
        if !self.is_current(session) {
            tracing::debug!(generation = session.generation(), "discarding result of stale session");
            return Err(ViewError::Superseded);
        }
        result
    }

    /// Loads the profile record of the active session (once per session).
    pub async fn load_profile(&self) -> Result<Value, ViewError> {
        let session = self.active()?;
        let result = session
            .record
            .get_or_try_init(|| async {
                let record = match session.target() {
                    ViewTarget::Own => self.client.my_profile(0, PROFILE_POSTS_PAGE_SIZE).await?,
                    ViewTarget::Public(username) => {
                        self.client
                            .public_profile(username, 0, PROFILE_POSTS_PAGE_SIZE)
                            .await?
                    }
                };
                Ok::<_, ViewError>(record)
            })
            .await
            .cloned();

        if result.is_ok()
            && let Some(id) = session.cached_identity()
        {
            // Ignored when a lookup already settled the identity.
            let _ = session.identity.set(Some(id));
        }
        self.settle(&session, result)
    }

    /// Navigates to `username` and loads its profile record.
    pub async fn load(&self, username: &str) -> Result<Value, ViewError> {
        self.navigate(username);
        self.load_profile().await
    }

    /// Resolves the profile id of the active session.
    pub async fn resolve_identity(&self) -> Result<Option<ProfileId>, ViewError> {
        let session = self.active()?;
        let result = resolver::resolve_identity(&self.client, &session).await;
        self.settle(&session, result)
    }

    /// Products of the active profile, memoized per session.
    pub async fn products(&self) -> Result<Collection, ViewError> {
        let session = self.active()?;
        let result = fetchers::products(&self.client, &session, false).await;
        self.settle(&session, result)
    }

    /// Re-fetches the products of the active profile.
    pub async fn refresh_products(&self) -> Result<Collection, ViewError> {
        let session = self.active()?;
        let result = fetchers::products(&self.client, &session, true).await;
        self.settle(&session, result)
    }

    /// Organization events of the active profile, memoized per session.
    pub async fn organization_events(&self) -> Result<Collection, ViewError> {
        let session = self.active()?;
        let result = fetchers::organization_events(&self.client, &session, false).await;
        self.settle(&session, result)
    }

    /// Re-fetches the organization events of the active profile.
    pub async fn refresh_events(&self) -> Result<Collection, ViewError> {
        let session = self.active()?;
        let result = fetchers::organization_events(&self.client, &session, true).await;
        self.settle(&session, result)
    }
}
