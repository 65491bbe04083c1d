//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and the data store.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use std::collections::BTreeSet;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{
    BlockEdge, Comment, EngagementKind, FollowEdge, HashtagAggregate, HashtagDelta, Post,
};

/// Error type for ranking inputs
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RankError {
    #[error("Viewer id must not be empty")]
    EmptyViewer,
}

/// Error type for data store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error type for feed use cases
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Rank(#[from] RankError),
    #[error("Post not found: {0}")]
    NotFound(String),
    #[error("User {user} is not the author of post {post_id}")]
    NotAuthor { user: String, post_id: String },
    #[error("Content must not be empty")]
    EmptyContent,
    #[error("User {0} cannot follow or block themselves")]
    SelfRelation(String),
}

/// Port for reading and writing posts and per-user post collections
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Most recent `limit` posts, oldest first
    async fn fetch_recent_posts(&self, limit: usize) -> Result<Vec<Post>, StoreError>;

    /// Every post written by `author_id`, oldest first
    async fn fetch_posts_by_author(&self, author_id: &str) -> Result<Vec<Post>, StoreError>;

    /// Every post carrying `tag` (lowercase, without `#`), oldest first
    async fn fetch_posts_with_tag(&self, tag: &str) -> Result<Vec<Post>, StoreError>;

    /// The `limit` most liked posts; equal like counts keep oldest first
    async fn fetch_most_liked(&self, limit: usize) -> Result<Vec<Post>, StoreError>;

    /// A single post by ID
    async fn fetch_post(&self, post_id: &str) -> Result<Option<Post>, StoreError>;

    /// Insert a post, or update the author name, content and hashtags of an
    /// existing one. Likes, retweets and comments of an existing post are
    /// owned by `toggle_engagement` and `add_comment` and are left as stored.
    async fn put_post(&self, post: &Post) -> Result<(), StoreError>;

    /// Remove a post, returning whether it existed
    async fn remove_post(&self, post_id: &str) -> Result<bool, StoreError>;

    /// Flip `user`'s like/retweet on a post, returning the new state
    async fn toggle_engagement(
        &self,
        post_id: &str,
        user_id: &str,
        kind: EngagementKind,
    ) -> Result<bool, StoreError>;

    /// Append a comment to a post
    async fn add_comment(&self, post_id: &str, comment: &Comment) -> Result<(), StoreError>;

    /// Post IDs bookmarked by a user, in bookmark order
    async fn fetch_bookmarks(&self, user_id: &str) -> Result<Vec<String>, StoreError>;

    /// Flip a bookmark, returning the new state
    async fn toggle_bookmark(&self, user_id: &str, post_id: &str) -> Result<bool, StoreError>;
}

/// Port for the follow and block graph
#[async_trait]
pub trait SocialGraph: Send + Sync {
    /// Users `user_id` follows
    async fn fetch_following(&self, user_id: &str) -> Result<BTreeSet<String>, StoreError>;

    /// Users following `user_id`
    async fn fetch_followers(&self, user_id: &str) -> Result<BTreeSet<String>, StoreError>;

    /// Users `user_id` has blocked
    async fn fetch_blocked(&self, user_id: &str) -> Result<BTreeSet<String>, StoreError>;

    /// Create (`present = true`) or remove a follow edge.
    ///
    /// The following and followers views must both reflect the change.
    async fn set_follow(&self, edge: &FollowEdge, present: bool) -> Result<(), StoreError>;

    /// Create or remove a block edge
    async fn set_block(&self, edge: &BlockEdge, present: bool) -> Result<(), StoreError>;
}

/// Port for the denormalized hashtag index
#[async_trait]
pub trait HashtagIndex: Send + Sync {
    async fn fetch_hashtag_aggregates(&self) -> Result<Vec<HashtagAggregate>, StoreError>;

    /// Apply one delta; duplicate application must not drive counts negative
    async fn apply_hashtag_delta(&self, delta: &HashtagDelta) -> Result<(), StoreError>;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
