//! In-memory store for tests, snapshots and offline mode

use async_trait::async_trait;
use feedrank_domain::usecases::apply_delta;
use feedrank_domain::{
    BlockEdge, Comment, EngagementKind, FollowEdge, HashtagAggregate, HashtagDelta, HashtagIndex,
    Post, PostStore, SocialGraph, StoreError,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{PoisonError, RwLock};

use crate::snapshot_fs::Snapshot;

/// In-memory implementation of every store port
pub struct InMemoryStore {
    posts: RwLock<Vec<Post>>,
    follows: RwLock<BTreeSet<FollowEdge>>,
    blocks: RwLock<BTreeSet<BlockEdge>>,
    hashtags: RwLock<BTreeMap<String, HashtagAggregate>>,
    bookmarks: RwLock<BTreeMap<String, Vec<String>>>,
}

fn poisoned<T>(e: PoisonError<T>) -> StoreError {
    StoreError::Database(e.to_string())
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::from_snapshot(Snapshot::default())
    }

    /// Build a store holding the contents of a snapshot
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            posts: RwLock::new(snapshot.posts),
            follows: RwLock::new(snapshot.follows.into_iter().collect()),
            blocks: RwLock::new(snapshot.blocks.into_iter().collect()),
            hashtags: RwLock::new(
                snapshot
                    .hashtags
                    .into_iter()
                    .map(|mut agg| {
                        agg.reconcile();
                        (agg.tag.clone(), agg)
                    })
                    .collect(),
            ),
            bookmarks: RwLock::new(snapshot.bookmarks),
        }
    }

    /// Copy the current contents out as a snapshot
    pub fn snapshot(&self) -> Result<Snapshot, StoreError> {
        Ok(Snapshot {
            posts: self.posts.read().map_err(poisoned)?.clone(),
            follows: self.follows.read().map_err(poisoned)?.iter().cloned().collect(),
            blocks: self.blocks.read().map_err(poisoned)?.iter().cloned().collect(),
            hashtags: self
                .hashtags
                .read()
                .map_err(poisoned)?
                .values()
                .cloned()
                .collect(),
            bookmarks: self.bookmarks.read().map_err(poisoned)?.clone(),
        })
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostStore for InMemoryStore {
    async fn fetch_recent_posts(&self, limit: usize) -> Result<Vec<Post>, StoreError> {
        let mut posts = self.posts.read().map_err(poisoned)?.clone();
        posts.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        let skip = posts.len().saturating_sub(limit);
        Ok(posts.split_off(skip))
    }

    async fn fetch_posts_by_author(&self, author_id: &str) -> Result<Vec<Post>, StoreError> {
        let mut posts = self.fetch_recent_posts(usize::MAX).await?;
        posts.retain(|p| p.author_id == author_id);
        Ok(posts)
    }

    async fn fetch_posts_with_tag(&self, tag: &str) -> Result<Vec<Post>, StoreError> {
        let mut posts = self.fetch_recent_posts(usize::MAX).await?;
        posts.retain(|p| p.hashtags.iter().any(|t| t == tag));
        Ok(posts)
    }

    async fn fetch_most_liked(&self, limit: usize) -> Result<Vec<Post>, StoreError> {
        let mut posts = self.fetch_recent_posts(usize::MAX).await?;
        posts.sort_by(|a, b| b.like_count().cmp(&a.like_count()));
        posts.truncate(limit);
        Ok(posts)
    }

    async fn fetch_post(&self, post_id: &str) -> Result<Option<Post>, StoreError> {
        let posts = self.posts.read().map_err(poisoned)?;
        Ok(posts.iter().find(|p| p.id == post_id).cloned())
    }

    async fn put_post(&self, post: &Post) -> Result<(), StoreError> {
        let mut posts = self.posts.write().map_err(poisoned)?;
        match posts.iter_mut().find(|p| p.id == post.id) {
            Some(existing) => {
                existing.author_name = post.author_name.clone();
                existing.content = post.content.clone();
                existing.hashtags = post.hashtags.clone();
            }
            None => posts.push(post.clone()),
        }
        Ok(())
    }

    async fn remove_post(&self, post_id: &str) -> Result<bool, StoreError> {
        let mut posts = self.posts.write().map_err(poisoned)?;
        let before = posts.len();
        posts.retain(|p| p.id != post_id);
        Ok(posts.len() != before)
    }

    async fn toggle_engagement(
        &self,
        post_id: &str,
        user_id: &str,
        kind: EngagementKind,
    ) -> Result<bool, StoreError> {
        let mut posts = self.posts.write().map_err(poisoned)?;
        let post = posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| StoreError::NotFound(format!("post {}", post_id)))?;

        let set = match kind {
            EngagementKind::Like => &mut post.likes,
            EngagementKind::Retweet => &mut post.retweets,
        };
        if set.remove(user_id) {
            Ok(false)
        } else {
            set.insert(user_id.to_string());
            Ok(true)
        }
    }

    async fn add_comment(&self, post_id: &str, comment: &Comment) -> Result<(), StoreError> {
        let mut posts = self.posts.write().map_err(poisoned)?;
        let post = posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| StoreError::NotFound(format!("post {}", post_id)))?;
        post.comments.push(comment.clone());
        Ok(())
    }

    async fn fetch_bookmarks(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        let bookmarks = self.bookmarks.read().map_err(poisoned)?;
        Ok(bookmarks.get(user_id).cloned().unwrap_or_default())
    }

    async fn toggle_bookmark(&self, user_id: &str, post_id: &str) -> Result<bool, StoreError> {
        let mut bookmarks = self.bookmarks.write().map_err(poisoned)?;
        let list = bookmarks.entry(user_id.to_string()).or_default();
        match list.iter().position(|id| id == post_id) {
            Some(pos) => {
                list.remove(pos);
                Ok(false)
            }
            None => {
                list.push(post_id.to_string());
                Ok(true)
            }
        }
    }
}

#[async_trait]
impl SocialGraph for InMemoryStore {
    async fn fetch_following(&self, user_id: &str) -> Result<BTreeSet<String>, StoreError> {
        let follows = self.follows.read().map_err(poisoned)?;
        Ok(follows
            .iter()
            .filter(|e| e.follower_id == user_id)
            .map(|e| e.followee_id.clone())
            .collect())
    }

    async fn fetch_followers(&self, user_id: &str) -> Result<BTreeSet<String>, StoreError> {
        let follows = self.follows.read().map_err(poisoned)?;
        Ok(follows
            .iter()
            .filter(|e| e.followee_id == user_id)
            .map(|e| e.follower_id.clone())
            .collect())
    }

    async fn fetch_blocked(&self, user_id: &str) -> Result<BTreeSet<String>, StoreError> {
        let blocks = self.blocks.read().map_err(poisoned)?;
        Ok(blocks
            .iter()
            .filter(|e| e.blocker_id == user_id)
            .map(|e| e.blocked_id.clone())
            .collect())
    }

    async fn set_follow(&self, edge: &FollowEdge, present: bool) -> Result<(), StoreError> {
        // One edge set backs both views, so a single write updates both
        let mut follows = self.follows.write().map_err(poisoned)?;
        if present {
            follows.insert(edge.clone());
        } else {
            follows.remove(edge);
        }
        Ok(())
    }

    async fn set_block(&self, edge: &BlockEdge, present: bool) -> Result<(), StoreError> {
        let mut blocks = self.blocks.write().map_err(poisoned)?;
        if present {
            blocks.insert(edge.clone());
        } else {
            blocks.remove(edge);
        }
        Ok(())
    }
}

#[async_trait]
impl HashtagIndex for InMemoryStore {
    async fn fetch_hashtag_aggregates(&self) -> Result<Vec<HashtagAggregate>, StoreError> {
        let hashtags = self.hashtags.read().map_err(poisoned)?;
        Ok(hashtags.values().cloned().collect())
    }

    async fn apply_hashtag_delta(&self, delta: &HashtagDelta) -> Result<(), StoreError> {
        let mut hashtags = self.hashtags.write().map_err(poisoned)?;
        apply_delta(&mut hashtags, delta);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Duration, OffsetDateTime};

    fn post(id: &str, minutes_ago: i64) -> Post {
        Post {
            id: id.to_string(),
            author_id: "author".to_string(),
            author_name: "Author".to_string(),
            content: "text".to_string(),
            hashtags: vec![],
            created_at: OffsetDateTime::UNIX_EPOCH + Duration::days(20_000)
                - Duration::minutes(minutes_ago),
            likes: BTreeSet::new(),
            comments: vec![],
            retweets: BTreeSet::new(),
        }
    }

    #[tokio::test]
    async fn test_recent_posts_returns_newest_window_oldest_first() {
        let store = InMemoryStore::new();
        for (id, age) in [("p1", 30), ("p2", 10), ("p3", 20)] {
            store.put_post(&post(id, age)).await.unwrap();
        }

        let recent = store.fetch_recent_posts(2).await.unwrap();
        let ids: Vec<_> = recent.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p3", "p2"]);
    }

    #[tokio::test]
    async fn test_put_post_replaces_existing() {
        let store = InMemoryStore::new();
        store.put_post(&post("p1", 5)).await.unwrap();

        let mut edited = post("p1", 5);
        edited.content = "edited".to_string();
        store.put_post(&edited).await.unwrap();

        let fetched = store.fetch_post("p1").await.unwrap().unwrap();
        assert_eq!(fetched.content, "edited");
        assert_eq!(store.fetch_recent_posts(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_put_post_keeps_engagement_written_after_read() {
        let store = InMemoryStore::new();
        store.put_post(&post("p1", 5)).await.unwrap();

        let mut stale = store.fetch_post("p1").await.unwrap().unwrap();
        store
            .toggle_engagement("p1", "bob", EngagementKind::Like)
            .await
            .unwrap();
        stale.content = "edited".to_string();
        store.put_post(&stale).await.unwrap();

        let fetched = store.fetch_post("p1").await.unwrap().unwrap();
        assert_eq!(fetched.content, "edited");
        assert!(fetched.likes.contains("bob"));
    }

    #[tokio::test]
    async fn test_filtered_queries_scan_every_post() {
        let store = InMemoryStore::new();
        for i in 0..120 {
            store.put_post(&post(&format!("n{}", i), 1)).await.unwrap();
        }
        let mut old = post("old", 10_000);
        old.author_id = "alice".to_string();
        old.hashtags = vec!["rare".to_string()];
        old.likes = ["x".to_string(), "y".to_string()].into_iter().collect();
        store.put_post(&old).await.unwrap();

        let by_author = store.fetch_posts_by_author("alice").await.unwrap();
        assert_eq!(by_author.len(), 1);
        let tagged = store.fetch_posts_with_tag("rare").await.unwrap();
        assert_eq!(tagged.len(), 1);
        let liked = store.fetch_most_liked(5).await.unwrap();
        assert_eq!(liked.len(), 5);
        assert_eq!(liked[0].id, "old");
    }

    #[tokio::test]
    async fn test_snapshot_aggregates_are_reconciled_on_load() {
        let mut snapshot = Snapshot::default();
        let mut drifted = HashtagAggregate::empty("rust");
        drifted.count = 5;
        snapshot.hashtags.push(drifted);

        let store = InMemoryStore::from_snapshot(snapshot);
        store
            .apply_hashtag_delta(&HashtagDelta::increment("rust", "p1"))
            .await
            .unwrap();

        let aggregates = store.fetch_hashtag_aggregates().await.unwrap();
        assert_eq!(aggregates[0].count, 1);
        assert!(aggregates[0].is_consistent());
    }

    #[tokio::test]
    async fn test_toggle_engagement_on_missing_post() {
        let store = InMemoryStore::new();
        let err = store
            .toggle_engagement("nope", "u", EngagementKind::Like)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_follow_edge_symmetric_removal() {
        let store = InMemoryStore::new();
        let edge = FollowEdge::new("a", "b");
        store.set_follow(&edge, true).await.unwrap();
        assert!(store.fetch_followers("b").await.unwrap().contains("a"));

        store.set_follow(&edge, false).await.unwrap();
        assert!(store.fetch_following("a").await.unwrap().is_empty());
        assert!(store.fetch_followers("b").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hashtag_delta_duplicates_absorbed() {
        let store = InMemoryStore::new();
        let inc = HashtagDelta::increment("rust", "p1");
        store.apply_hashtag_delta(&inc).await.unwrap();
        store.apply_hashtag_delta(&inc).await.unwrap();

        let dec = HashtagDelta::decrement("rust", "p1");
        store.apply_hashtag_delta(&dec).await.unwrap();
        store.apply_hashtag_delta(&dec).await.unwrap();

        let aggregates = store.fetch_hashtag_aggregates().await.unwrap();
        assert_eq!(aggregates.len(), 1);
        assert_eq!(aggregates[0].count, 0);
        assert!(aggregates[0].is_consistent());
    }

    #[tokio::test]
    async fn test_snapshot_roundtrip_preserves_state() {
        let store = InMemoryStore::new();
        store.put_post(&post("p1", 1)).await.unwrap();
        store
            .set_follow(&FollowEdge::new("a", "b"), true)
            .await
            .unwrap();
        store.toggle_bookmark("a", "p1").await.unwrap();

        let restored = InMemoryStore::from_snapshot(store.snapshot().unwrap());
        assert!(restored.fetch_post("p1").await.unwrap().is_some());
        assert!(restored.fetch_following("a").await.unwrap().contains("b"));
        assert_eq!(restored.fetch_bookmarks("a").await.unwrap(), vec!["p1"]);
    }
}
