//! Own-profile post aggregation.

use std::cmp::Reverse;

use serde_json::Value;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::parse_timestamp;

/// Posts requested per page of `/profile/me`.
pub const POSTS_PAGE_SIZE: u32 = 12;

/// Pages fetched at most, counting the initial one.
pub const MAX_POST_PAGES: u32 = 12;

/// Collects every post of the logged-in user, newest first.
///
/// `initial` holds the posts of page 0, already fetched with the profile.
/// Later pages are fetched until one comes back empty or short. A failing
/// page stops the walk and keeps what was collected, except for a rejected
/// session, which is returned as an error.
pub async fn collect_profile_posts(
    client: &ApiClient,
    initial: Vec<Value>,
) -> Result<Vec<Value>, ApiError> {
    let mut posts = initial;

    for page in 1..MAX_POST_PAGES {
        let batch = match client.my_profile(page, POSTS_PAGE_SIZE).await {
            Ok(profile) => page_posts(profile),
            Err(e) if e.is_session_expired() => return Err(e),
            Err(e) => {
                tracing::warn!(page, error = %e, "stopping post pagination");
                break;
            }
        };

        let short = batch.len() < POSTS_PAGE_SIZE as usize;
        posts.extend(batch);
        if short {
            break;
        }
    }

    sort_newest_first(&mut posts);
    Ok(posts)
}

fn page_posts(profile: Value) -> Vec<Value> {
    match profile {
        Value::Object(mut obj) => match obj.remove("posts") {
            Some(Value::Array(posts)) => posts,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Sorts by `createdAt`, newest first. Posts without a parseable date go last,
/// keeping their relative order.
pub fn sort_newest_first(posts: &mut [Value]) {
    posts.sort_by_key(|post| {
        Reverse(
            post.get("createdAt")
                .and_then(Value::as_str)
                .and_then(parse_timestamp),
        )
    });
}
