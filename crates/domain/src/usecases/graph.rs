//! Social graph use case - follow, unfollow, block, unblock

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::{
    model::{BlockEdge, FollowEdge, Membership, ViewerId},
    ports::{FeedError, SocialGraph},
};

/// Follow/block orchestrator
#[derive(Clone)]
pub struct GraphService<G>
where
    G: SocialGraph + ?Sized,
{
    graph: Arc<G>,
}

impl<G> GraphService<G>
where
    G: SocialGraph + ?Sized,
{
    pub fn new(graph: Arc<G>) -> Self {
        Self { graph }
    }

    pub async fn follow(&self, viewer: &ViewerId, target: &str) -> Result<(), FeedError> {
        let edge = self.edge_to(viewer, target)?;
        self.graph.set_follow(&edge, true).await?;
        tracing::info!(follower = %viewer, followee = target, "Followed user");
        Ok(())
    }

    /// Removes the edge from both the following and followers views
    pub async fn unfollow(&self, viewer: &ViewerId, target: &str) -> Result<(), FeedError> {
        let edge = self.edge_to(viewer, target)?;
        self.graph.set_follow(&edge, false).await?;
        tracing::info!(follower = %viewer, followee = target, "Unfollowed user");
        Ok(())
    }

    /// Block a user; also drops the viewer's follow of that user
    pub async fn block(&self, viewer: &ViewerId, target: &str) -> Result<(), FeedError> {
        let follow = self.edge_to(viewer, target)?;
        self.graph
            .set_block(&BlockEdge::new(viewer.as_str(), target), true)
            .await?;
        self.graph.set_follow(&follow, false).await?;
        tracing::info!(blocker = %viewer, blocked = target, "Blocked user");
        Ok(())
    }

    pub async fn unblock(&self, viewer: &ViewerId, target: &str) -> Result<(), FeedError> {
        self.edge_to(viewer, target)?;
        self.graph
            .set_block(&BlockEdge::new(viewer.as_str(), target), false)
            .await?;
        tracing::info!(blocker = %viewer, blocked = target, "Unblocked user");
        Ok(())
    }

    pub async fn following(&self, user_id: &str) -> Result<BTreeSet<String>, FeedError> {
        Ok(self.graph.fetch_following(user_id).await?)
    }

    pub async fn followers(&self, user_id: &str) -> Result<BTreeSet<String>, FeedError> {
        Ok(self.graph.fetch_followers(user_id).await?)
    }

    /// Fetch both of the viewer's sets into a resolved [`GraphView`]
    pub async fn load_view(&self, viewer: &ViewerId) -> Result<GraphView, FeedError> {
        let (following, blocked) = futures::try_join!(
            self.graph.fetch_following(viewer.as_str()),
            self.graph.fetch_blocked(viewer.as_str()),
        )?;

        let mut view = GraphView::new(viewer.clone());
        view.resolve_following(following);
        view.resolve_blocked(blocked);
        Ok(view)
    }

    fn edge_to(&self, viewer: &ViewerId, target: &str) -> Result<FollowEdge, FeedError> {
        if target == viewer.as_str() {
            return Err(FeedError::SelfRelation(target.to_string()));
        }
        Ok(FollowEdge::new(viewer.as_str(), target))
    }
}

/// A viewer's follow and block sets, either of which may still be loading.
///
/// Queries answer [`Membership::Pending`] until the matching set is resolved.
#[derive(Debug, Clone)]
pub struct GraphView {
    viewer: ViewerId,
    following: Option<BTreeSet<String>>,
    blocked: Option<BTreeSet<String>>,
}

impl GraphView {
    pub fn new(viewer: ViewerId) -> Self {
        Self {
            viewer,
            following: None,
            blocked: None,
        }
    }

    pub fn viewer(&self) -> &ViewerId {
        &self.viewer
    }

    pub fn resolve_following(&mut self, following: BTreeSet<String>) {
        self.following = Some(following);
    }

    pub fn resolve_blocked(&mut self, blocked: BTreeSet<String>) {
        self.blocked = Some(blocked);
    }

    pub fn is_following(&self, user_id: &str) -> Membership {
        membership(self.following.as_ref(), user_id)
    }

    pub fn is_blocked(&self, user_id: &str) -> Membership {
        membership(self.blocked.as_ref(), user_id)
    }

    /// The following set, once resolved
    pub fn following(&self) -> Option<&BTreeSet<String>> {
        self.following.as_ref()
    }

    pub fn blocked(&self) -> Option<&BTreeSet<String>> {
        self.blocked.as_ref()
    }
}

fn membership(set: Option<&BTreeSet<String>>, user_id: &str) -> Membership {
    match set {
        Some(set) => Membership::Resolved(set.contains(user_id)),
        None => Membership::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::SocialGraph;
    use crate::usecases::feed::fakes::FakeStore;

    fn viewer(id: &str) -> ViewerId {
        ViewerId::new(id).unwrap()
    }

    #[tokio::test]
    async fn test_follow_shows_in_both_views() {
        let store = Arc::new(FakeStore::default());
        let graph = GraphService::new(Arc::clone(&store));

        graph.follow(&viewer("alice"), "bob").await.unwrap();

        assert!(graph.following("alice").await.unwrap().contains("bob"));
        assert!(graph.followers("bob").await.unwrap().contains("alice"));
    }

    #[tokio::test]
    async fn test_unfollow_removes_from_both_views() {
        let store = Arc::new(FakeStore::default());
        let graph = GraphService::new(Arc::clone(&store));
        let alice = viewer("alice");

        graph.follow(&alice, "bob").await.unwrap();
        graph.unfollow(&alice, "bob").await.unwrap();

        assert!(graph.following("alice").await.unwrap().is_empty());
        assert!(graph.followers("bob").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_block_drops_follow() {
        let store = Arc::new(FakeStore::default());
        let graph = GraphService::new(Arc::clone(&store));
        let alice = viewer("alice");

        graph.follow(&alice, "bob").await.unwrap();
        graph.block(&alice, "bob").await.unwrap();

        assert!(graph.following("alice").await.unwrap().is_empty());
        assert!(store.fetch_blocked("alice").await.unwrap().contains("bob"));

        graph.unblock(&alice, "bob").await.unwrap();
        assert!(store.fetch_blocked("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_self_follow_rejected() {
        let graph = GraphService::new(Arc::new(FakeStore::default()));
        let err = graph.follow(&viewer("alice"), "alice").await.unwrap_err();
        assert!(matches!(err, FeedError::SelfRelation(_)));
    }

    #[test]
    fn test_graph_view_pending_until_resolved() {
        let mut view = GraphView::new(viewer("alice"));
        assert_eq!(view.is_following("bob"), Membership::Pending);
        assert_eq!(view.is_blocked("bob"), Membership::Pending);

        view.resolve_following(["bob".to_string()].into_iter().collect());
        assert_eq!(view.is_following("bob"), Membership::Resolved(true));
        assert_eq!(view.is_following("carol"), Membership::Resolved(false));
        assert_eq!(view.is_blocked("bob"), Membership::Pending);
    }

    #[tokio::test]
    async fn test_load_view_resolves_both_sets() {
        let store = Arc::new(FakeStore::default());
        let graph = GraphService::new(Arc::clone(&store));
        let alice = viewer("alice");
        graph.follow(&alice, "bob").await.unwrap();
        graph.block(&alice, "mallory").await.unwrap();

        let view = graph.load_view(&alice).await.unwrap();
        assert_eq!(view.is_following("bob"), Membership::Resolved(true));
        assert_eq!(view.is_blocked("mallory"), Membership::Resolved(true));
        assert_eq!(view.is_blocked("bob"), Membership::Resolved(false));
    }
}
