//! Error types for backend calls and profile views.

/// Errors returned by [`ApiClient`](crate::client::ApiClient) calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend rejected the bearer token (401/403).
    #[error("Session expired (HTTP {status})")]
    SessionExpired {
        /// The rejecting status code.
        status: u16,
    },

    /// The requested resource does not exist (404).
    #[error("Not found: {path}")]
    NotFound {
        /// The request path that returned 404.
        path: String,
    },

    /// Any other non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// The status code.
        status: u16,
        /// Backend message, or the raw body when no `message` field is present.
        message: String,
    },

    /// The body could not be decoded into the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// The caller passed an argument the backend would reject anyway.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Login/register succeeded but no `jwt` came back.
    #[error("Token missing from authentication response")]
    MissingToken,
}

impl ApiError {
    /// Returns `true` for 401/403: the stored session is no longer valid.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired { .. })
    }

    /// Returns `true` for 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub(crate) fn from_status(status: u16, path: &str, message: String) -> Self {
        match status {
            401 | 403 => Self::SessionExpired { status },
            404 => Self::NotFound {
                path: path.to_string(),
            },
            _ => Self::Status { status, message },
        }
    }
}

/// Errors returned by [`ProfileView`](crate::view::ProfileView) operations.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    /// The view navigated to another profile while this operation was in flight.
    #[error("Profile view changed while the request was in flight")]
    Superseded,

    /// An operation needed the profile record but none is loaded yet.
    #[error("No profile loaded")]
    NoProfileLoaded,

    /// The backend rejected the session. A configured session store has been cleared.
    #[error("Session expired, log in again")]
    SessionExpired,

    #[error(transparent)]
    Api(ApiError),
}

impl From<ApiError> for ViewError {
    fn from(err: ApiError) -> Self {
        if err.is_session_expired() {
            Self::SessionExpired
        } else {
            Self::Api(err)
        }
    }
}

/// Errors from session persistence.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt session file: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Cannot determine home directory")]
    NoHomeDir,
}

/// Errors from the auth flows, which touch both the backend and the store.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(ApiError::from_status(401, "/feed", String::new()).is_session_expired());
        assert!(ApiError::from_status(403, "/feed", String::new()).is_session_expired());
        assert!(ApiError::from_status(404, "/post/1", String::new()).is_not_found());

        let err = ApiError::from_status(500, "/feed", "boom".into());
        assert!(!err.is_session_expired());
        assert_eq!(err.to_string(), "HTTP 500: boom");
    }

    #[test]
    fn test_view_error_from_api_error() {
        let expired: ViewError = ApiError::SessionExpired { status: 401 }.into();
        assert!(matches!(expired, ViewError::SessionExpired));

        let other: ViewError = ApiError::Decode("x".into()).into();
        assert!(matches!(other, ViewError::Api(ApiError::Decode(_))));
    }
}
