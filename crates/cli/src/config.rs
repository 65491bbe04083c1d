//! Configuration loading and management

use anyhow::{Context, Result};
use feedrank_domain::usecases::{
    DEFAULT_FEED_LIMIT, DEFAULT_TREND_LIMIT, FeedConfig, PostRanker, TrendRanker,
};
use feedrank_domain::{FeedWeights, TrendWeights};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file looked up when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "./feedrank.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub feed: FeedSection,

    #[serde(default)]
    pub trending: TrendingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// `snapshot` or `sqlite`
    #[serde(default = "default_backend")]
    pub backend: String,

    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,

    #[serde(default = "default_state_db_path")]
    pub state_db_path: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSection {
    #[serde(default = "default_feed_limit")]
    pub limit: usize,

    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,

    #[serde(default = "default_latest_limit")]
    pub latest_limit: usize,

    #[serde(default = "default_explore_limit")]
    pub explore_limit: usize,

    #[serde(default)]
    pub weights: FeedWeights,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingSection {
    #[serde(default = "default_trend_limit")]
    pub limit: usize,

    #[serde(default = "default_count_multiplier")]
    pub count_multiplier: f64,

    #[serde(default = "default_high_volume_threshold")]
    pub high_volume_threshold: u64,

    #[serde(default = "default_network_threshold")]
    pub network_threshold: u64,
}

// Default value functions
fn default_backend() -> String {
    "snapshot".to_string()
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("./feedrank.json")
}

fn default_state_db_path() -> PathBuf {
    PathBuf::from("./feedrank.sqlite")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_feed_limit() -> usize {
    DEFAULT_FEED_LIMIT
}

fn default_candidate_limit() -> usize {
    FeedConfig::default().candidate_limit
}

fn default_latest_limit() -> usize {
    FeedConfig::default().latest_limit
}

fn default_explore_limit() -> usize {
    FeedConfig::default().explore_limit
}

fn default_trend_limit() -> usize {
    DEFAULT_TREND_LIMIT
}

fn default_count_multiplier() -> f64 {
    TrendWeights::default().count_multiplier
}

fn default_high_volume_threshold() -> u64 {
    TrendWeights::default().high_volume_threshold
}

fn default_network_threshold() -> u64 {
    TrendWeights::default().network_threshold
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            snapshot_path: default_snapshot_path(),
            state_db_path: default_state_db_path(),
            log_level: default_log_level(),
        }
    }
}

impl Default for FeedSection {
    fn default() -> Self {
        Self {
            limit: default_feed_limit(),
            candidate_limit: default_candidate_limit(),
            latest_limit: default_latest_limit(),
            explore_limit: default_explore_limit(),
            weights: FeedWeights::default(),
        }
    }
}

impl Default for TrendingSection {
    fn default() -> Self {
        Self {
            limit: default_trend_limit(),
            count_multiplier: default_count_multiplier(),
            high_volume_threshold: default_high_volume_threshold(),
            network_threshold: default_network_threshold(),
        }
    }
}

impl FeedSection {
    pub fn post_ranker(&self) -> PostRanker {
        PostRanker::new(self.weights.clone(), self.limit)
    }

    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            candidate_limit: self.candidate_limit,
            latest_limit: self.latest_limit,
            explore_limit: self.explore_limit,
        }
    }
}

impl TrendingSection {
    pub fn weights(&self) -> TrendWeights {
        TrendWeights {
            count_multiplier: self.count_multiplier,
            high_volume_threshold: self.high_volume_threshold,
            network_threshold: self.network_threshold,
        }
    }

    pub fn trend_ranker(&self) -> TrendRanker {
        TrendRanker::new(self.weights(), self.limit)
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("FEEDRANK")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# feedrank configuration

[general]
backend = "snapshot"  # snapshot, sqlite
snapshot_path = "./feedrank.json"
state_db_path = "./feedrank.sqlite"
log_level = "info"

[feed]
limit = 30
candidate_limit = 100
latest_limit = 50
explore_limit = 20

[feed.weights]
following = 100.0
own_post = 200.0
per_like = 5.0
per_comment = 15.0
per_retweet = 8.0
per_hashtag = 2.0
recency_max = 50.0
recency_decay_per_hour = 2.0

[trending]
limit = 4
count_multiplier = 1.5
high_volume_threshold = 1000
network_threshold = 100
"#
        .to_string()
    }
}
