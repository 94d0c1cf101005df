use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::ValueEnum;
use inti_client::auth;
use inti_client::{
    ApiClient, ApiError, AuthError, ClientConfig, FileSessionStore, ProfileView, SessionStore,
    StoredSession, ViewError,
};

use crate::cli::{Cli, OutputFormat};
use crate::config;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything a command needs: the client (carrying the stored token when
/// logged in), the session store of the active profile, and output format.
pub struct Context {
    pub client: ApiClient,
    pub store: Arc<FileSessionStore>,
    pub session: StoredSession,
    pub format: OutputFormat,
}

impl Context {
    pub fn load(cli: &Cli) -> Result<Self> {
        let store = Arc::new(FileSessionStore::for_profile(&cli.profile)?);
        let session = store
            .load()
            .with_context(|| format!("Failed to read session {}", store.path().display()))?;
        let cfg = config::load_profile(&cli.profile)?;

        let format = match (cli.format, cfg.format.as_deref()) {
            (Some(format), _) => format,
            (None, Some(name)) => OutputFormat::from_str(name, true)
                .map_err(|e| anyhow::anyhow!("Invalid format in config: {e}"))?,
            (None, None) => OutputFormat::default(),
        };

        let server = config::resolve_server(cli.server.as_deref(), &cfg, &session);
        tracing::debug!(%server, profile = %cli.profile, "using backend");
        let anonymous =
            ApiClient::new(&ClientConfig::new(server).with_request_timeout(REQUEST_TIMEOUT))?;
        let client = auth::authenticated_client(&anonymous, store.as_ref())?.unwrap_or(anonymous);

        Ok(Self {
            client,
            store,
            session,
            format,
        })
    }

    pub fn require_login(&self) -> Result<()> {
        if !self.session.is_authenticated() {
            anyhow::bail!("Not logged in. Run: inti login --email <email>");
        }
        Ok(())
    }

    /// A profile view that clears the stored session when the backend rejects it.
    pub fn view(&self) -> ProfileView {
        ProfileView::new(Arc::new(self.client.clone()))
            .with_session_store(self.store.clone())
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url().as_str()
    }
}

/// Returns `true` when any error in the chain means the backend rejected
/// the stored session.
pub fn is_session_expired(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<ApiError>()
            .is_some_and(ApiError::is_session_expired)
            || matches!(
                cause.downcast_ref::<ViewError>(),
                Some(ViewError::SessionExpired)
            )
            || matches!(
                cause.downcast_ref::<AuthError>(),
                Some(AuthError::Api(e)) if e.is_session_expired()
            )
    })
}
