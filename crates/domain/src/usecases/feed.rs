//! Feed use case - fetches snapshots through the ports and ranks them

use std::sync::Arc;

use crate::{
    hashtags::normalize_tag,
    model::{Post, ScoredItem, TrendingTag, ViewerId},
    ports::{Clock, FeedError, HashtagIndex, PostStore, SocialGraph},
    usecases::{post_rank::PostRanker, trend_rank::TrendRanker},
};

/// Configuration for the feed views
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Recent posts considered by the smart feed; the other views scan every post
    pub candidate_limit: usize,
    /// Posts shown by the latest feed
    pub latest_limit: usize,
    /// Posts shown by the explore feed
    pub explore_limit: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            candidate_limit: 100,
            latest_limit: 50,
            explore_limit: 20,
        }
    }
}

/// Feed orchestrator
#[derive(Clone)]
pub struct FeedService<P, G, H, Cl>
where
    P: PostStore + ?Sized,
    G: SocialGraph + ?Sized,
    H: HashtagIndex + ?Sized,
    Cl: Clock + ?Sized,
{
    posts: Arc<P>,
    graph: Arc<G>,
    hashtags: Arc<H>,
    clock: Arc<Cl>,
    post_ranker: PostRanker,
    trend_ranker: TrendRanker,
    config: FeedConfig,
}

impl<P, G, H, Cl> FeedService<P, G, H, Cl>
where
    P: PostStore + ?Sized,
    G: SocialGraph + ?Sized,
    H: HashtagIndex + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(
        posts: Arc<P>,
        graph: Arc<G>,
        hashtags: Arc<H>,
        clock: Arc<Cl>,
        post_ranker: PostRanker,
        trend_ranker: TrendRanker,
        config: FeedConfig,
    ) -> Self {
        Self {
            posts,
            graph,
            hashtags,
            clock,
            post_ranker,
            trend_ranker,
            config,
        }
    }

    /// Personalized feed with scores attached
    pub async fn smart_feed_scored(
        &self,
        viewer: &ViewerId,
    ) -> Result<Vec<ScoredItem<Post>>, FeedError> {
        let (following, candidates) = futures::try_join!(
            self.graph.fetch_following(viewer.as_str()),
            self.posts.fetch_recent_posts(self.config.candidate_limit),
        )?;

        tracing::info!(
            viewer = %viewer,
            following = following.len(),
            candidates = candidates.len(),
            "Ranking smart feed"
        );

        Ok(self
            .post_ranker
            .rank_scored(viewer, &following, candidates, self.clock.now()))
    }

    /// Personalized feed: own and followed posts first, then engagement and recency
    pub async fn smart_feed(&self, viewer: &ViewerId) -> Result<Vec<Post>, FeedError> {
        Ok(self
            .smart_feed_scored(viewer)
            .await?
            .into_iter()
            .map(|s| s.item)
            .collect())
    }

    /// Most recent posts, newest first
    pub async fn latest_feed(&self) -> Result<Vec<Post>, FeedError> {
        let mut posts = self
            .posts
            .fetch_recent_posts(self.config.latest_limit)
            .await?;
        newest_first(&mut posts);
        Ok(posts)
    }

    /// Most liked posts across the whole store
    pub async fn explore_feed(&self) -> Result<Vec<Post>, FeedError> {
        Ok(self
            .posts
            .fetch_most_liked(self.config.explore_limit)
            .await?)
    }

    /// Posts carrying `tag` (with or without `#`), newest first
    pub async fn hashtag_feed(&self, tag: &str) -> Result<Vec<Post>, FeedError> {
        let tag = normalize_tag(tag);
        let mut posts = self.posts.fetch_posts_with_tag(&tag).await?;
        newest_first(&mut posts);

        tracing::debug!(tag = %tag, count = posts.len(), "Loaded hashtag feed");
        Ok(posts)
    }

    /// Posts written by `user_id`, newest first
    pub async fn profile_feed(&self, user_id: &str) -> Result<Vec<Post>, FeedError> {
        let mut posts = self.posts.fetch_posts_by_author(user_id).await?;
        newest_first(&mut posts);
        Ok(posts)
    }

    /// Bookmarked posts that still exist, in bookmark order
    pub async fn bookmarks(&self, viewer: &ViewerId) -> Result<Vec<Post>, FeedError> {
        let ids = self.posts.fetch_bookmarks(viewer.as_str()).await?;
        let mut posts = Vec::with_capacity(ids.len());
        for id in ids {
            match self.posts.fetch_post(&id).await? {
                Some(post) => posts.push(post),
                None => tracing::debug!(post_id = %id, "Skipping deleted bookmark"),
            }
        }
        Ok(posts)
    }

    /// Trending hashtags panel
    pub async fn trending(&self) -> Result<Vec<TrendingTag>, FeedError> {
        let aggregates = self.hashtags.fetch_hashtag_aggregates().await?;
        let trending = self.trend_ranker.rank(aggregates);
        tracing::info!(count = trending.len(), "Trending tags loaded");
        Ok(trending)
    }
}

fn newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
