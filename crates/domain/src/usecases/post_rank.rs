//! Post ranking - orders a candidate set of posts for one viewer

use std::collections::BTreeSet;
use time::OffsetDateTime;

use crate::model::{Post, ScoredItem, ViewerId};
use crate::scoring::{FeedWeights, hours_since, recency_bonus};

/// Default number of posts returned by a ranking call
pub const DEFAULT_FEED_LIMIT: usize = 30;

/// Stateless post ranker
#[derive(Debug, Clone)]
pub struct PostRanker {
    weights: FeedWeights,
    limit: usize,
}

impl Default for PostRanker {
    fn default() -> Self {
        Self::new(FeedWeights::default(), DEFAULT_FEED_LIMIT)
    }
}

impl PostRanker {
    pub fn new(weights: FeedWeights, limit: usize) -> Self {
        Self { weights, limit }
    }

    pub fn weights(&self) -> &FeedWeights {
        &self.weights
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Score a single post for `viewer`
    pub fn score(
        &self,
        viewer: &ViewerId,
        following: &BTreeSet<String>,
        post: &Post,
        now: OffsetDateTime,
    ) -> f64 {
        let w = &self.weights;
        let mut score = 0.0;

        if following.contains(&post.author_id) {
            score += w.following;
        }
        if post.author_id == viewer.as_str() {
            score += w.own_post;
        }

        score += post.like_count() as f64 * w.per_like;
        score += post.comment_count() as f64 * w.per_comment;
        score += post.retweet_count() as f64 * w.per_retweet;
        score += recency_bonus(hours_since(post.created_at, now), w);
        score += post.hashtags.len() as f64 * w.per_hashtag;

        score
    }

    /// Rank posts by descending score, keeping the scores.
    ///
    /// Ties keep input order; output holds at most `limit` entries.
    pub fn rank_scored(
        &self,
        viewer: &ViewerId,
        following: &BTreeSet<String>,
        posts: Vec<Post>,
        now: OffsetDateTime,
    ) -> Vec<ScoredItem<Post>> {
        let mut scored: Vec<ScoredItem<Post>> = posts
            .into_iter()
            .map(|post| {
                let score = self.score(viewer, following, &post, now);
                ScoredItem { item: post, score }
            })
            .collect();

        // sort_by is stable
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(self.limit);

        tracing::debug!(
            viewer = %viewer,
            returned = scored.len(),
            top_score = scored.first().map(|s| s.score),
            "Ranked posts"
        );

        scored
    }

    /// Rank posts by descending score
    pub fn rank(
        &self,
        viewer: &ViewerId,
        following: &BTreeSet<String>,
        posts: Vec<Post>,
        now: OffsetDateTime,
    ) -> Vec<Post> {
        self.rank_scored(viewer, following, posts, now)
            .into_iter()
            .map(|s| s.item)
            .collect()
    }
}
