//! Post lifecycle use case - create, edit, delete and engagement toggles
//!
//! Every content change keeps the hashtag index consistent by emitting the
//! deltas planned in [`crate::usecases::aggregates`].

use std::sync::Arc;
use uuid::Uuid;

use crate::{
    hashtags::extract_hashtags,
    model::{Comment, EngagementKind, HashtagDeltaPlan, Post, ViewerId},
    ports::{Clock, FeedError, HashtagIndex, PostStore},
    usecases::aggregates::{plan_create, plan_delete, plan_edit},
};

/// Post lifecycle orchestrator
#[derive(Clone)]
pub struct PostService<P, H, Cl>
where
    P: PostStore + ?Sized,
    H: HashtagIndex + ?Sized,
    Cl: Clock + ?Sized,
{
    posts: Arc<P>,
    hashtags: Arc<H>,
    clock: Arc<Cl>,
}

impl<P, H, Cl> PostService<P, H, Cl>
where
    P: PostStore + ?Sized,
    H: HashtagIndex + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(posts: Arc<P>, hashtags: Arc<H>, clock: Arc<Cl>) -> Self {
        Self {
            posts,
            hashtags,
            clock,
        }
    }

    /// Create a post and index its hashtags
    pub async fn create(
        &self,
        author: &ViewerId,
        author_name: Option<&str>,
        content: &str,
    ) -> Result<Post, FeedError> {
        let content = non_blank(content)?;
        let hashtags = extract_hashtags(content);

        let post = Post {
            id: Uuid::new_v4().to_string(),
            author_id: author.as_str().to_string(),
            author_name: author_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or("Anonymous")
                .to_string(),
            content: content.to_string(),
            hashtags,
            created_at: self.clock.now(),
            likes: Default::default(),
            comments: vec![],
            retweets: Default::default(),
        };

        self.posts.put_post(&post).await?;
        self.apply(&plan_create(&post.id, &post.hashtags)).await?;

        tracing::info!(
            post_id = %post.id,
            author = %author,
            hashtags = post.hashtags.len(),
            "Post created"
        );

        Ok(post)
    }

    /// Replace a post's content; only the author may edit
    pub async fn edit(
        &self,
        viewer: &ViewerId,
        post_id: &str,
        content: &str,
    ) -> Result<Post, FeedError> {
        let content = non_blank(content)?;
        let mut post = self.owned_post(viewer, post_id).await?;

        let old_tags = std::mem::take(&mut post.hashtags);
        post.content = content.to_string();
        post.hashtags = extract_hashtags(content);

        self.posts.put_post(&post).await?;
        let plan = plan_edit(&post.id, &old_tags, &post.hashtags);
        self.apply(&plan).await?;

        tracing::info!(
            post_id = %post.id,
            removed_tags = plan.decrements.len(),
            added_tags = plan.increments.len(),
            "Post updated"
        );

        Ok(post)
    }

    /// Delete a post; only the author may delete
    pub async fn delete(&self, viewer: &ViewerId, post_id: &str) -> Result<Post, FeedError> {
        let post = self.owned_post(viewer, post_id).await?;

        if !self.posts.remove_post(&post.id).await? {
            return Err(FeedError::NotFound(post.id));
        }
        self.apply(&plan_delete(&post.id, &post.hashtags)).await?;

        tracing::info!(post_id = %post.id, "Post deleted");
        Ok(post)
    }

    /// Flip a like or retweet, returning whether it is now set
    pub async fn toggle(
        &self,
        viewer: &ViewerId,
        post_id: &str,
        kind: EngagementKind,
    ) -> Result<bool, FeedError> {
        self.existing_post(post_id).await?;
        let active = self
            .posts
            .toggle_engagement(post_id, viewer.as_str(), kind)
            .await?;
        tracing::debug!(post_id, kind = kind.as_str(), active, "Engagement toggled");
        Ok(active)
    }

    /// Flip a bookmark, returning whether it is now set
    pub async fn toggle_bookmark(&self, viewer: &ViewerId, post_id: &str) -> Result<bool, FeedError> {
        self.existing_post(post_id).await?;
        Ok(self.posts.toggle_bookmark(viewer.as_str(), post_id).await?)
    }

    /// Append a comment
    pub async fn comment(
        &self,
        viewer: &ViewerId,
        post_id: &str,
        text: &str,
    ) -> Result<Comment, FeedError> {
        let text = non_blank(text)?;
        self.existing_post(post_id).await?;

        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            author_id: viewer.as_str().to_string(),
            text: text.to_string(),
            created_at: self.clock.now(),
        };
        self.posts.add_comment(post_id, &comment).await?;
        Ok(comment)
    }

    async fn existing_post(&self, post_id: &str) -> Result<Post, FeedError> {
        self.posts
            .fetch_post(post_id)
            .await?
            .ok_or_else(|| FeedError::NotFound(post_id.to_string()))
    }

    async fn owned_post(&self, viewer: &ViewerId, post_id: &str) -> Result<Post, FeedError> {
        let post = self.existing_post(post_id).await?;
        if post.author_id != viewer.as_str() {
            return Err(FeedError::NotAuthor {
                user: viewer.to_string(),
                post_id: post_id.to_string(),
            });
        }
        Ok(post)
    }

    async fn apply(&self, plan: &HashtagDeltaPlan) -> Result<(), FeedError> {
        for delta in plan.iter() {
            self.hashtags.apply_hashtag_delta(delta).await?;
        }
        Ok(())
    }
}

fn non_blank(text: &str) -> Result<&str, FeedError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(FeedError::EmptyContent);
    }
    Ok(trimmed)
}
