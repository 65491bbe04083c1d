//! Scoring weights and shared helpers for the rankers

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Weights of the additive post score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedWeights {
    /// Bonus when the author is followed by the viewer
    pub following: f64,
    /// Bonus for the viewer's own posts
    pub own_post: f64,
    pub per_like: f64,
    pub per_comment: f64,
    pub per_retweet: f64,
    pub per_hashtag: f64,
    /// Recency bonus of a brand new post
    pub recency_max: f64,
    /// Recency points lost per hour of age
    pub recency_decay_per_hour: f64,
}

impl Default for FeedWeights {
    fn default() -> Self {
        Self {
            following: 100.0,
            own_post: 200.0,
            per_like: 5.0,
            per_comment: 15.0,
            per_retweet: 8.0,
            per_hashtag: 2.0,
            recency_max: 50.0,
            recency_decay_per_hour: 2.0,
        }
    }
}

/// Weights and thresholds of the trending panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendWeights {
    /// Trend score per post carrying the tag
    pub count_multiplier: f64,
    /// Count at which a tag is labelled "Technology · Trending"
    pub high_volume_threshold: u64,
    /// Count at which a tag is labelled "Trending in Your Network"
    pub network_threshold: u64,
}

impl Default for TrendWeights {
    fn default() -> Self {
        Self {
            count_multiplier: 1.5,
            high_volume_threshold: 1000,
            network_threshold: 100,
        }
    }
}

/// Hours elapsed since `created_at`; posts from the future count as brand new
pub fn hours_since(created_at: OffsetDateTime, now: OffsetDateTime) -> f64 {
    let hours = (now - created_at).as_seconds_f64() / 3600.0;
    hours.max(0.0)
}

/// Linear recency decay floored at zero
pub fn recency_bonus(hours: f64, weights: &FeedWeights) -> f64 {
    (weights.recency_max - weights.recency_decay_per_hour * hours.max(0.0)).max(0.0)
}

/// Compact count for display: `950`, `1.2K`, `3.4M`
pub fn format_count(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}

/// Relative age label: `now`, `5m ago`, `3h ago`, `2d ago`, or the date
pub fn format_relative(timestamp: OffsetDateTime, now: OffsetDateTime) -> String {
    let minutes = (now - timestamp).whole_minutes();
    let hours = minutes / 60;
    let days = hours / 24;

    if minutes < 1 {
        "now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else if days < 7 {
        format!("{}d ago", days)
    } else {
        let date = timestamp.date();
        format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            u8::from(date.month()),
            date.day()
        )
    }
}
