//! Domain models and value objects

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use time::OffsetDateTime;

use crate::ports::RankError;

/// Identifier of the user a feed is computed for.
///
/// Always non-empty; ranking calls take this instead of a bare string so an
/// absent viewer cannot reach the scoring code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ViewerId(String);

impl ViewerId {
    pub fn new(id: impl Into<String>) -> Result<Self, RankError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(RankError::EmptyViewer);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ViewerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A comment attached to a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author_id: String,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A post as stored by the data layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Opaque unique identifier
    pub id: String,
    /// Creating user
    pub author_id: String,
    /// Display name of the author
    #[serde(default = "default_author_name")]
    pub author_name: String,
    /// Text body
    pub content: String,
    /// Lowercase tags without the leading `#`
    #[serde(default, deserialize_with = "null_as_default")]
    pub hashtags: Vec<String>,
    /// When the post was created
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Users who liked the post
    #[serde(default, deserialize_with = "null_as_default")]
    pub likes: BTreeSet<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comments: Vec<Comment>,
    /// Users who retweeted the post
    #[serde(default, deserialize_with = "null_as_default")]
    pub retweets: BTreeSet<String>,
}

impl Post {
    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    pub fn retweet_count(&self) -> usize {
        self.retweets.len()
    }

    /// Whether the post carries `tag` (compared without `#`, case-insensitive)
    pub fn has_hashtag(&self, tag: &str) -> bool {
        let tag = crate::hashtags::normalize_tag(tag);
        self.hashtags.iter().any(|t| *t == tag)
    }
}

fn default_author_name() -> String {
    "Anonymous".to_string()
}

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Directed follow relation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FollowEdge {
    pub follower_id: String,
    pub followee_id: String,
}

impl FollowEdge {
    pub fn new(follower_id: impl Into<String>, followee_id: impl Into<String>) -> Self {
        Self {
            follower_id: follower_id.into(),
            followee_id: followee_id.into(),
        }
    }
}

/// Directed block relation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockEdge {
    pub blocker_id: String,
    pub blocked_id: String,
}

impl BlockEdge {
    pub fn new(blocker_id: impl Into<String>, blocked_id: impl Into<String>) -> Self {
        Self {
            blocker_id: blocker_id.into(),
            blocked_id: blocked_id.into(),
        }
    }
}

/// Denormalized per-hashtag counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashtagAggregate {
    /// Lowercase tag without `#`
    pub tag: String,
    /// Number of posts currently carrying the tag
    #[serde(default)]
    pub count: u64,
    /// Posts contributing to `count`
    #[serde(default, deserialize_with = "null_as_default")]
    pub post_ids: BTreeSet<String>,
}

impl HashtagAggregate {
    /// An empty aggregate (`count = 0`, no posts)
    pub fn empty(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            count: 0,
            post_ids: BTreeSet::new(),
        }
    }

    /// Apply a single delta.
    ///
    /// Membership in `post_ids` gates the change, so applying the same delta
    /// twice is a no-op. `count` is re-derived from `post_ids` afterwards.
    pub fn apply(&mut self, delta: &HashtagDelta) {
        if delta.added {
            self.post_ids.insert(delta.post_id.clone());
        } else {
            self.post_ids.remove(&delta.post_id);
        }
        self.reconcile();
    }

    /// Reset `count` to the number of contributing posts
    pub fn reconcile(&mut self) {
        self.count = self.post_ids.len() as u64;
    }

    pub fn is_consistent(&self) -> bool {
        self.count == self.post_ids.len() as u64
    }
}

/// Write intent for the hashtag index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashtagDelta {
    pub tag: String,
    /// +1 or -1
    pub count_delta: i64,
    pub post_id: String,
    /// Whether `post_id` joins (true) or leaves (false) the tag's post set
    pub added: bool,
}

impl HashtagDelta {
    pub fn increment(tag: impl Into<String>, post_id: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            count_delta: 1,
            post_id: post_id.into(),
            added: true,
        }
    }

    pub fn decrement(tag: impl Into<String>, post_id: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            count_delta: -1,
            post_id: post_id.into(),
            added: false,
        }
    }
}

/// Deltas produced by one create/edit/delete
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HashtagDeltaPlan {
    pub decrements: Vec<HashtagDelta>,
    pub increments: Vec<HashtagDelta>,
}

impl HashtagDeltaPlan {
    pub fn is_empty(&self) -> bool {
        self.decrements.is_empty() && self.increments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.decrements.len() + self.increments.len()
    }

    /// Decrements first, then increments
    pub fn iter(&self) -> impl Iterator<Item = &HashtagDelta> {
        self.decrements.iter().chain(self.increments.iter())
    }
}

/// An entity paired with its score for the duration of one ranking call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredItem<T> {
    pub item: T,
    pub score: f64,
}

/// Display label of a trending hashtag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendLabel {
    #[serde(rename = "Trending Worldwide")]
    Worldwide,
    #[serde(rename = "Technology · Trending")]
    Technology,
    #[serde(rename = "Trending in Your Network")]
    Network,
    #[serde(rename = "Trending")]
    Trending,
}

impl TrendLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Worldwide => "Trending Worldwide",
            Self::Technology => "Technology · Trending",
            Self::Network => "Trending in Your Network",
            Self::Trending => "Trending",
        }
    }
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the trending panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendingTag {
    pub tag: String,
    pub count: u64,
    pub score: f64,
    /// 1-based position
    pub rank: usize,
    pub label: TrendLabel,
    /// Compact count, e.g. `1.2K`
    pub display_count: String,
}

/// Engagement a user can toggle on a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementKind {
    Like,
    Retweet,
}

impl EngagementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Retweet => "retweet",
        }
    }
}

/// Answer to a membership query against possibly-unloaded data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "value")]
pub enum Membership {
    /// The backing set has not been fetched yet
    Pending,
    Resolved(bool),
}

impl Membership {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// `Some(answer)` once resolved
    pub fn value(&self) -> Option<bool> {
        match self {
            Self::Pending => None,
            Self::Resolved(v) => Some(*v),
        }
    }
}
