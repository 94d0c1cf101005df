//! Display models built from loosely shaped records.
//!
//! Missing or malformed fields degrade to defaults instead of failing the
//! whole view.

use serde::Serialize;
use serde_json::Value;
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::client::resolve_media_url;
use crate::extract::{self, ProfileId};

pub const DEFAULT_USER_NAME: &str = "Usuário";
pub const DEFAULT_PRODUCT_TITLE: &str = "Produto";
pub const DEFAULT_EVENT_TITLE: &str = "Evento";
pub const DEFAULT_ORGANIZER_NAME: &str = "Organização";
pub const UNSCHEDULED: &str = "Data a definir";

const LOCAL_DATETIME: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// First non-empty string among `fields`.
fn first_text(record: &Value, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .filter_map(|f| record.get(*f).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// First non-null value among `fields`.
fn first_value<'a>(record: &'a Value, fields: &[&str]) -> Option<&'a Value> {
    fields
        .iter()
        .filter_map(|f| record.get(*f))
        .find(|v| !v.is_null() && v.as_str() != Some(""))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    User,
    Organization,
}

impl ProfileKind {
    /// Kind declared by the record's `type`, if any.
    pub fn of(record: &Value) -> Option<Self> {
        let kind = record.get("type")?.as_str()?.trim();
        if kind.is_empty() {
            None
        } else if kind.eq_ignore_ascii_case("organization") {
            Some(Self::Organization)
        } else {
            Some(Self::User)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSummary {
    pub id: Option<ProfileId>,
    pub name: String,
    pub username: Option<String>,
    pub kind: ProfileKind,
    pub bio: Option<String>,
    pub picture_url: Option<String>,
    pub followers: u64,
    pub following: u64,
    pub total_posts: u64,
    pub is_following: bool,
}

impl ProfileSummary {
    pub fn from_record(record: &Value, base_url: &str) -> Self {
        let count = |field: &str| record.get(field).and_then(Value::as_u64).unwrap_or(0);
        Self {
            id: extract::profile_id(record),
            name: first_text(record, &["name", "displayName"])
                .unwrap_or_else(|| DEFAULT_USER_NAME.to_string()),
            username: extract::username(record),
            kind: ProfileKind::of(record).unwrap_or(ProfileKind::User),
            bio: first_text(record, &["bio"]),
            picture_url: first_text(record, &["profile_picture_url", "profilePictureUrl"])
                .and_then(|p| resolve_media_url(base_url, &p)),
            followers: count("followersCount"),
            following: count("followingCount"),
            total_posts: resolve_total_posts(record),
            is_following: record
                .get("isFollowing")
                .or_else(|| record.get("following"))
                .is_some_and(truthy),
        }
    }

    /// `@username`, or a placeholder handle.
    pub fn handle(&self) -> String {
        match &self.username {
            Some(u) => format!("@{u}"),
            None => "@usuário".to_string(),
        }
    }
}

/// `totalPosts` when it is a non-negative number, else the embedded posts count.
pub fn resolve_total_posts(record: &Value) -> u64 {
    let declared = record.get("totalPosts").and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    });
    match declared {
        Some(total) if total.is_finite() && total >= 0.0 => total as u64,
        _ => record
            .get("posts")
            .and_then(Value::as_array)
            .map_or(0, |posts| posts.len() as u64),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSummary {
    pub id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    /// Formatted price; absent when the record has none.
    pub price: Option<String>,
    pub image_url: Option<String>,
    pub created_at: Option<String>,
}

impl ProductSummary {
    pub fn from_record(record: &Value, base_url: &str) -> Self {
        Self {
            id: first_value(record, &["id", "productId"]).and_then(id_text),
            title: first_text(record, &["title", "name", "productName", "displayName"])
                .unwrap_or_else(|| DEFAULT_PRODUCT_TITLE.to_string()),
            description: first_text(record, &["description", "details", "summary", "about"]),
            price: first_value(record, &["price", "value", "cost", "amount"]).and_then(format_price),
            image_url: first_text(
                record,
                &["imageUrl", "imgLink", "image", "coverImage", "thumbnail"],
            )
            .and_then(|p| resolve_media_url(base_url, &p)),
            created_at: first_text(record, &["createdAt"]),
        }
    }
}

fn id_text(value: &Value) -> Option<String> {
    ProfileId::from_value(value).map(|id| id.as_str().to_string())
}

/// Formats a price value. Numbers (and numeric strings) become BRL currency;
/// other text passes through.
pub fn format_price(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => n.as_f64().map(format_brl),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(s.parse::<f64>().map_or_else(|_| s.to_string(), format_brl))
            }
        }
        _ => None,
    }
}

/// `1234.5` → `R$ 1.234,50`.
pub fn format_brl(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let (whole, frac) = (cents / 100, cents % 100);

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}R$ {grouped},{frac:02}")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizerInfo {
    pub id: Option<ProfileId>,
    /// Username without `@`.
    pub username: Option<String>,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl OrganizerInfo {
    /// Organizer fields of an event; `None` when the event names no organizer at all.
    pub fn from_event(event: &Value, base_url: &str) -> Option<Self> {
        let empty = Value::Null;
        let org = event
            .get("organization")
            .or_else(|| event.get("organizer"))
            .unwrap_or(&empty);

        let id = first_value(event, &["organizerId", "organizerProfileId"])
            .or_else(|| first_value(org, &["id", "profileId", "userId"]))
            .and_then(ProfileId::from_value);
        let username = first_text(event, &["organizerUsername"])
            .or_else(|| first_text(org, &["username", "handle"]))
            .and_then(|u| extract::sanitize_username(&u));
        let name = first_text(event, &["organizerName"])
            .or_else(|| first_text(org, &["name", "displayName"]))
            .or_else(|| username.clone());
        let avatar = first_text(event, &["organizerProfilePictureUrl"])
            .or_else(|| first_text(org, &["profilePictureUrl", "avatarUrl"]));

        if id.is_none() && username.is_none() && name.is_none() && avatar.is_none() {
            return None;
        }

        Some(Self {
            id,
            username,
            name: name.unwrap_or_else(|| DEFAULT_ORGANIZER_NAME.to_string()),
            avatar_url: avatar.and_then(|p| organizer_avatar_url(base_url, &p)),
        })
    }
}

/// Avatars live under `/images/` unless the path already says so.
fn organizer_avatar_url(base_url: &str, path: &str) -> Option<String> {
    let trimmed = path.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Some(trimmed.to_string());
    }
    let relative = trimmed.trim_start_matches('/');
    if relative.is_empty() {
        return None;
    }
    let path = if relative.starts_with("images/") {
        format!("/{relative}")
    } else {
        format!("/images/{relative}")
    };
    resolve_media_url(base_url, &path)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventSummary {
    pub id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    /// `dd/mm/yyyy às HH:MM`, or a placeholder.
    pub date: String,
    pub price: Option<String>,
    pub image_url: Option<String>,
    pub organizer: Option<OrganizerInfo>,
}

impl EventSummary {
    pub fn from_record(record: &Value, base_url: &str) -> Self {
        Self {
            id: first_value(record, &["id", "eventId"]).and_then(id_text),
            title: first_text(record, &["title", "name"])
                .unwrap_or_else(|| DEFAULT_EVENT_TITLE.to_string()),
            description: first_text(record, &["description"]),
            date: first_text(record, &["date", "data", "eventTime"])
                .as_deref()
                .map_or_else(|| UNSCHEDULED.to_string(), format_event_date),
            price: record.get("price").and_then(format_price),
            image_url: first_text(record, &["imageUrl", "imgLink"])
                .and_then(|p| resolve_media_url(base_url, &p)),
            organizer: OrganizerInfo::from_event(record, base_url),
        }
    }
}

/// Parses RFC 3339 timestamps and the backend's offset-less local timestamps
/// (taken as UTC). Fractional seconds are ignored for the latter.
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(ts);
    }
    let without_fraction = raw.split('.').next()?;
    PrimitiveDateTime::parse(without_fraction, LOCAL_DATETIME)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

pub fn format_event_date(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(ts) => format!(
            "{:02}/{:02}/{} às {:02}:{:02}",
            ts.day(),
            u8::from(ts.month()),
            ts.year(),
            ts.hour(),
            ts.minute()
        ),
        None => UNSCHEDULED.to_string(),
    }
}

const ATTENDANCE_FLAGS: &[&str] = &[
    "isSubscribed",
    "subscribed",
    "isRegistered",
    "registered",
    "userSubscribed",
    "userRegistered",
    "attending",
    "isAttending",
    "userIsAttendee",
    "alreadyRegistered",
];

/// Whether the user identified by `profile_id` attends `event`.
///
/// An explicit flag on the event wins; otherwise the attendee list is searched.
pub fn infer_attendance(event: &Value, profile_id: Option<&ProfileId>) -> bool {
    if let Some(flag) = ATTENDANCE_FLAGS.iter().find_map(|f| event.get(*f)) {
        return truthy(flag);
    }

    let (Some(attendees), Some(me)) = (event.get("attendees").and_then(Value::as_array), profile_id)
    else {
        return false;
    };
    attendees.iter().any(|participant| {
        ["id", "profileId", "userId"]
            .iter()
            .filter_map(|f| participant.get(*f))
            .chain(participant.get("profile").and_then(|p| p.get("id")))
            .filter_map(ProfileId::from_value)
            .any(|id| &id == me)
    })
}

/// Truthiness of loosely typed flag fields: `null`, `false`, `0` and `""` are false.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Compact counter: `999` → `999`, `1500` → `1.5k`.
pub fn format_count(n: u64) -> String {
    if n >= 1000 {
        format!("{:.1}k", n as f64 / 1000.0)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE: &str = "https://api.example.com";

    #[test]
    fn test_profile_defaults() {
        let summary = ProfileSummary::from_record(&json!({}), BASE);
        assert_eq!(summary.name, DEFAULT_USER_NAME);
        assert_eq!(summary.handle(), "@usuário");
        assert_eq!(summary.kind, ProfileKind::User);
        assert_eq!(summary.total_posts, 0);
        assert!(!summary.is_following);
    }

    #[test]
    fn test_profile_fields() {
        let record = json!({
            "id": 3,
            "name": "Feira Viva",
            "username": "feira",
            "type": "ORGANIZATION",
            "profile_picture_url": "/images/f.png",
            "followersCount": 1500,
            "followingCount": 2,
            "posts": [{}, {}],
            "isFollowing": true
        });
        let summary = ProfileSummary::from_record(&record, BASE);
        assert_eq!(summary.id, Some(ProfileId::new("3")));
        assert_eq!(summary.kind, ProfileKind::Organization);
        assert_eq!(summary.handle(), "@feira");
        assert_eq!(summary.picture_url.as_deref(), Some("https://api.example.com/images/f.png"));
        assert_eq!(summary.total_posts, 2);
        assert_eq!(format_count(summary.followers), "1.5k");
        assert!(summary.is_following);
    }

    #[test]
    fn test_total_posts() {
        assert_eq!(resolve_total_posts(&json!({ "totalPosts": 12, "posts": [] })), 12);
        assert_eq!(resolve_total_posts(&json!({ "totalPosts": "7" })), 7);
        assert_eq!(resolve_total_posts(&json!({ "totalPosts": -1, "posts": [1] })), 1);
        assert_eq!(resolve_total_posts(&json!({ "totalPosts": null, "posts": [1, 2] })), 2);
    }

    #[test]
    fn test_profile_kind() {
        assert_eq!(ProfileKind::of(&json!({ "type": "organization" })), Some(ProfileKind::Organization));
        assert_eq!(ProfileKind::of(&json!({ "type": "user" })), Some(ProfileKind::User));
        assert_eq!(ProfileKind::of(&json!({ "type": "" })), None);
        assert_eq!(ProfileKind::of(&json!({})), None);
    }

    #[test]
    fn test_product_defaults_and_aliases() {
        let empty = ProductSummary::from_record(&json!({}), BASE);
        assert_eq!(empty.title, DEFAULT_PRODUCT_TITLE);
        assert_eq!(empty.price, None);
        assert_eq!(empty.id, None);

        let product = ProductSummary::from_record(
            &json!({
                "productId": 8,
                "productName": "Bolo",
                "summary": "de cenoura",
                "amount": 1234.5,
                "imgLink": "uploads/bolo.png"
            }),
            BASE,
        );
        assert_eq!(product.id.as_deref(), Some("8"));
        assert_eq!(product.title, "Bolo");
        assert_eq!(product.description.as_deref(), Some("de cenoura"));
        assert_eq!(product.price.as_deref(), Some("R$ 1.234,50"));
        assert_eq!(
            product.image_url.as_deref(),
            Some("https://api.example.com/uploads/bolo.png")
        );
    }

    #[test]
    fn test_price_formatting() {
        assert_eq!(format_brl(0.0), "R$ 0,00");
        assert_eq!(format_brl(15.0), "R$ 15,00");
        assert_eq!(format_brl(1_000_000.125), "R$ 1.000.000,13");
        assert_eq!(format_brl(-3.5), "-R$ 3,50");
        assert_eq!(format_price(&json!("12.5")).as_deref(), Some("R$ 12,50"));
        assert_eq!(format_price(&json!("a combinar")).as_deref(), Some("a combinar"));
        assert_eq!(format_price(&json!("")), None);
        assert_eq!(format_price(&Value::Null), None);
    }

    #[test]
    fn test_event_summary() {
        let event = json!({
            "id": "e1",
            "name": "Feira",
            "eventTime": "2025-03-09T18:30:00",
            "price": 10,
            "organization": { "id": 4, "username": "@feira", "avatarUrl": "f.png" }
        });
        let summary = EventSummary::from_record(&event, BASE);
        assert_eq!(summary.title, "Feira");
        assert_eq!(summary.date, "09/03/2025 às 18:30");
        assert_eq!(summary.price.as_deref(), Some("R$ 10,00"));

        let organizer = summary.organizer.unwrap();
        assert_eq!(organizer.id, Some(ProfileId::new("4")));
        assert_eq!(organizer.username.as_deref(), Some("feira"));
        assert_eq!(organizer.name, "feira");
        assert_eq!(
            organizer.avatar_url.as_deref(),
            Some("https://api.example.com/images/f.png")
        );
    }

    #[test]
    fn test_event_defaults() {
        let summary = EventSummary::from_record(&json!({ "date": "soon" }), BASE);
        assert_eq!(summary.title, DEFAULT_EVENT_TITLE);
        assert_eq!(summary.date, UNSCHEDULED);
        assert!(summary.organizer.is_none());
    }

    #[test]
    fn test_parse_timestamp() {
        assert!(parse_timestamp("2025-01-02T03:04:05Z").is_some());
        assert!(parse_timestamp("2025-01-02T03:04:05.123456").is_some());
        assert!(parse_timestamp("02/01/2025").is_none());
    }

    #[test]
    fn test_infer_attendance() {
        let me = ProfileId::new("7");
        assert!(infer_attendance(&json!({ "isAttending": true }), Some(&me)));
        assert!(!infer_attendance(
            &json!({ "subscribed": false, "attendees": [{ "id": 7 }] }),
            Some(&me)
        ));
        assert!(infer_attendance(
            &json!({ "attendees": [{ "id": 1 }, { "profile": { "id": "7" } }] }),
            Some(&me)
        ));
        assert!(!infer_attendance(&json!({ "attendees": [{ "id": 7 }] }), None));
        assert!(!infer_attendance(&json!({}), Some(&me)));
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1.0k");
        assert_eq!(format_count(25_300), "25.3k");
    }
}
