//! JSON snapshot file of the whole data set

use feedrank_domain::{BlockEdge, FollowEdge, HashtagAggregate, Post, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Serialized form of every record the store ports expose
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub follows: Vec<FollowEdge>,
    #[serde(default)]
    pub blocks: Vec<BlockEdge>,
    #[serde(default)]
    pub hashtags: Vec<HashtagAggregate>,
    /// Bookmarked post IDs per user
    #[serde(default)]
    pub bookmarks: BTreeMap<String, Vec<String>>,
}

/// A snapshot persisted as a JSON file
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the snapshot; a missing file is an empty data set
    pub async fn load(&self) -> Result<Snapshot, StoreError> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "Snapshot file missing, starting empty");
            return Ok(Snapshot::default());
        }

        let content = fs::read_to_string(&self.path).await?;
        let snapshot: Snapshot = serde_json::from_str(&content).map_err(|e| {
            StoreError::Serialization(format!("{}: {}", self.path.display(), e))
        })?;

        tracing::debug!(
            path = %self.path.display(),
            posts = snapshot.posts.len(),
            follows = snapshot.follows.len(),
            hashtags = snapshot.hashtags.len(),
            "Loaded snapshot"
        );

        Ok(snapshot)
    }

    /// Write the snapshot via a temporary file and rename
    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;

        tracing::debug!(path = %self.path.display(), "Saved snapshot");
        Ok(())
    }
}
