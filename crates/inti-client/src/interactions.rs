//! Follow and like toggles.

use crate::client::ApiClient;
use crate::error::ApiError;

/// Follow relationship towards one profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowState {
    pub following: bool,
}

impl FollowState {
    pub fn new(following: bool) -> Self {
        Self { following }
    }

    /// Follows when not following, unfollows otherwise. The state only
    /// changes once the backend accepted the request.
    pub async fn toggle(&mut self, client: &ApiClient, username: &str) -> Result<bool, ApiError> {
        if self.following {
            client.unfollow(username).await?;
        } else {
            client.follow(username).await?;
        }
        self.following = !self.following;
        tracing::debug!(%username, following = self.following, "follow toggled");
        Ok(self.following)
    }
}

/// Like status and counter of one post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeState {
    pub liked: bool,
    pub count: u64,
}

impl LikeState {
    pub fn new(liked: bool, count: u64) -> Self {
        Self { liked, count }
    }

    /// The state shown while the request is in flight.
    pub fn optimistic(self) -> Self {
        if self.liked {
            Self {
                liked: false,
                count: self.count.saturating_sub(1),
            }
        } else {
            Self {
                liked: true,
                count: self.count + 1,
            }
        }
    }

    /// Likes or unlikes `post_id`. The optimistic state is kept on success
    /// and reverted on failure.
    pub async fn toggle(&mut self, client: &ApiClient, post_id: &str) -> Result<Self, ApiError> {
        let previous = *self;
        *self = previous.optimistic();

        let result = if previous.liked {
            client.unlike(post_id).await
        } else {
            client.like(post_id).await
        };

        match result {
            Ok(_) => Ok(*self),
            Err(e) => {
                tracing::warn!(%post_id, error = %e, "like toggle failed, reverting");
                *self = previous;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimistic_like() {
        let state = LikeState::new(false, 4);
        assert_eq!(state.optimistic(), LikeState::new(true, 5));
        assert_eq!(state.optimistic().optimistic(), state);
    }

    #[test]
    fn test_optimistic_unlike_saturates() {
        assert_eq!(LikeState::new(true, 0).optimistic(), LikeState::new(false, 0));
    }
}
