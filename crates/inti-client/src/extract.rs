//! Profile identity extraction from loosely shaped backend records.
//!
//! The backend exposes the same identifier under many names depending on the
//! endpoint (`id`, `profileId`, `profile_id`, `userId`, ...), sometimes nested
//! one level down under a relationship object (`profile`, `user`, `owner`,
//! `author`). The functions here probe those names in a fixed priority order.
//!
//! Probing is bounded to one level of nesting: a record's relationships are
//! inspected, but never the relationships of those relationships.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The backend's stable key for a user or organization.
///
/// The backend returns either strings or numbers; both are kept in their
/// textual form so they can be placed into URL paths and compared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Converts a JSON value into an identifier.
    ///
    /// Strings are trimmed and must be non-empty. Numbers are accepted as-is,
    /// including `0`. Everything else is absent.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
            }
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProfileId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// An ordered set of field names probed on a record, then on its relationships.
#[derive(Debug, Clone, Copy)]
pub struct IdProbe {
    /// Fields probed on the record itself, highest priority first.
    pub direct: &'static [&'static str],
    /// Fields probed on each relationship object.
    pub nested: &'static [&'static str],
    /// Relationship objects descended into, in order.
    pub relationships: &'static [&'static str],
}

const ID_ALIASES: &[&str] = &[
    "id",
    "profileId",
    "profile_id",
    "userId",
    "user_id",
    "profileUuid",
    "profile_uuid",
    "userUuid",
    "user_uuid",
    "ownerId",
    "owner_id",
    "accountId",
    "account_id",
];

const RELATIONSHIPS: &[&str] = &["profile", "user", "owner", "author"];

/// Probe for records that *are* profiles: their own `id` is the profile id.
pub const PROFILE_PROBE: IdProbe = IdProbe {
    direct: ID_ALIASES,
    nested: ID_ALIASES,
    relationships: RELATIONSHIPS,
};

/// Probe for records *owned by* a profile (posts, products): their own `id`
/// identifies the entity, so only owner aliases are considered directly.
pub const OWNED_PROBE: IdProbe = IdProbe {
    direct: ID_ALIASES.split_at(1).1,
    nested: ID_ALIASES,
    relationships: RELATIONSHIPS,
};

const USERNAME_FIELDS: &[&str] = &["username", "userName", "handle"];

/// Probe for usernames.
pub const USERNAME_PROBE: IdProbe = IdProbe {
    direct: USERNAME_FIELDS,
    nested: USERNAME_FIELDS,
    relationships: RELATIONSHIPS,
};

impl IdProbe {
    /// Runs the probe and returns the first value accepted by `accept`.
    pub fn find<T>(&self, record: &Value, accept: impl Fn(&Value) -> Option<T>) -> Option<T> {
        let obj = record.as_object()?;

        let direct = self
            .direct
            .iter()
            .filter_map(|field| obj.get(*field))
            .find_map(&accept);
        if direct.is_some() {
            return direct;
        }

        self.relationships
            .iter()
            .filter_map(|rel| obj.get(*rel).and_then(Value::as_object))
            .find_map(|related| {
                self.nested
                    .iter()
                    .filter_map(|field| related.get(*field))
                    .find_map(&accept)
            })
    }
}

/// Finds the profile identifier of a profile record.
pub fn profile_id(record: &Value) -> Option<ProfileId> {
    PROFILE_PROBE.find(record, ProfileId::from_value)
}

/// Finds the identifier of the profile owning a post or product.
pub fn owner_profile_id(entity: &Value) -> Option<ProfileId> {
    OWNED_PROBE.find(entity, ProfileId::from_value)
}

/// Finds the first owner id across a collection of owned entities.
pub fn owner_profile_id_in(entities: &Value) -> Option<ProfileId> {
    entities.as_array()?.iter().find_map(owner_profile_id)
}

/// Finds the username of a record, without a leading `@`.
pub fn username(record: &Value) -> Option<String> {
    USERNAME_PROBE.find(record, |v| v.as_str().and_then(sanitize_username))
}

/// Trims a username and strips a leading `@`. Empty results are absent.
pub fn sanitize_username(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('@').unwrap_or(trimmed).trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
