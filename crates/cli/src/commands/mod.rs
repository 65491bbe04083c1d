//! Subcommand implementations and the shared store wiring

pub mod config;
pub mod doctor;
pub mod feed;
pub mod graph;
pub mod post;
pub mod trending;

use anyhow::{Context, Result};
use feedrank_adapters::snapshot::SnapshotFile;
use feedrank_adapters::store::{InMemoryStore, SqliteStore};
use feedrank_domain::usecases::{FeedService, GraphService, PostService};
use feedrank_domain::{HashtagIndex, PostStore, SocialGraph, SystemClock};
use std::path::Path;
use std::sync::Arc;

use crate::config::AppConfig;

pub(crate) type DynFeedService =
    FeedService<dyn PostStore, dyn SocialGraph, dyn HashtagIndex, SystemClock>;
pub(crate) type DynPostService = PostService<dyn PostStore, dyn HashtagIndex, SystemClock>;
pub(crate) type DynGraphService = GraphService<dyn SocialGraph>;

/// Storage backend selected by `general.backend`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BackendKind {
    Snapshot,
    Sqlite,
}

impl BackendKind {
    pub(crate) fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "snapshot" | "json" => Ok(Self::Snapshot),
            "sqlite" => Ok(Self::Sqlite),
            other => anyhow::bail!("Unknown backend: {} (expected snapshot or sqlite)", other),
        }
    }
}

/// Opened store ports plus what is needed to persist snapshot changes
pub(crate) struct Backend {
    posts: Arc<dyn PostStore>,
    graph: Arc<dyn SocialGraph>,
    hashtags: Arc<dyn HashtagIndex>,
    snapshot: Option<(Arc<InMemoryStore>, SnapshotFile)>,
}

impl Backend {
    pub(crate) async fn open(config: &AppConfig) -> Result<Self> {
        match BackendKind::parse(&config.general.backend)? {
            BackendKind::Snapshot => Self::open_snapshot(&config.general.snapshot_path).await,
            BackendKind::Sqlite => Self::open_sqlite(&config.general.state_db_path).await,
        }
    }

    async fn open_snapshot(path: &Path) -> Result<Self> {
        let file = SnapshotFile::new(path);
        let snapshot = file
            .load()
            .await
            .with_context(|| format!("Failed to load snapshot: {}", path.display()))?;

        tracing::debug!(path = %path.display(), posts = snapshot.posts.len(), "Opened snapshot backend");

        let store = Arc::new(InMemoryStore::from_snapshot(snapshot));
        Ok(Self {
            posts: store.clone(),
            graph: store.clone(),
            hashtags: store.clone(),
            snapshot: Some((store, file)),
        })
    }

    async fn open_sqlite(path: &Path) -> Result<Self> {
        let store = Arc::new(
            SqliteStore::new(path)
                .await
                .context("Failed to initialize SQLite store")?,
        );

        tracing::debug!(path = %path.display(), "Opened sqlite backend");

        Ok(Self {
            posts: store.clone(),
            graph: store.clone(),
            hashtags: store,
            snapshot: None,
        })
    }

    pub(crate) fn posts(&self) -> &Arc<dyn PostStore> {
        &self.posts
    }

    pub(crate) fn hashtags(&self) -> &Arc<dyn HashtagIndex> {
        &self.hashtags
    }

    pub(crate) fn feed_service(&self, config: &AppConfig) -> DynFeedService {
        FeedService::new(
            self.posts.clone(),
            self.graph.clone(),
            self.hashtags.clone(),
            Arc::new(SystemClock),
            config.feed.post_ranker(),
            config.trending.trend_ranker(),
            config.feed.feed_config(),
        )
    }

    pub(crate) fn post_service(&self) -> DynPostService {
        PostService::new(
            self.posts.clone(),
            self.hashtags.clone(),
            Arc::new(SystemClock),
        )
    }

    pub(crate) fn graph_service(&self) -> DynGraphService {
        GraphService::new(self.graph.clone())
    }

    /// Write mutations back to the snapshot file; sqlite commits as it goes
    pub(crate) async fn persist(&self) -> Result<()> {
        let Some((store, file)) = &self.snapshot else {
            return Ok(());
        };

        let snapshot = store.snapshot().context("Failed to read in-memory store")?;
        file.save(&snapshot)
            .await
            .with_context(|| format!("Failed to save snapshot: {}", file.path().display()))?;

        tracing::info!(path = %file.path().display(), "Snapshot saved");
        Ok(())
    }
}
