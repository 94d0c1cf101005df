//! Client library for the Inti social marketplace backend.
//!
//! The backend's responses are loosely shaped: identifiers and usernames
//! show up under different names depending on the endpoint, and collections
//! come bare or wrapped. This crate normalizes them and resolves profile
//! identities once per profile view.
//!
//! - [`client::ApiClient`] - bearer-authenticated endpoint calls
//! - [`extract`] - profile id / username probing
//! - [`normalize`] - collection response shapes
//! - [`view::ProfileView`] - per-view identity resolution and dependent fetches
//! - [`auth`] and [`session`] - login state and self identity
//! - [`forms`] - multipart payloads for posts, products and profile edits

pub mod auth;
pub mod client;
pub mod error;
pub mod extract;
pub mod forms;
pub mod interactions;
pub mod models;
pub mod normalize;
pub mod posts;
pub mod session;
pub mod view;

pub use client::{ApiClient, ClientConfig};
pub use error::{ApiError, AuthError, StoreError, ViewError};
pub use extract::ProfileId;
pub use session::{FileSessionStore, MemorySessionStore, SessionStore, StoredSession};
pub use view::{Collection, ProfileView, Unavailable};
