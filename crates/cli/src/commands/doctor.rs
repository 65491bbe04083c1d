//! Doctor command - validate configuration, storage and the hashtag index

use anyhow::Result;
use feedrank_domain::{FeedWeights, HashtagAggregate, Post};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use super::{Backend, BackendKind};
use crate::args::DoctorArgs;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    weights: CheckResult,
    store: CheckResult,
    hashtags: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        weights: CheckResult::error("Not checked"),
        store: CheckResult::error("Not checked"),
        hashtags: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.weights = check_weights(config);

        match open_store(config).await {
            Ok((backend, check)) => {
                report.store = check;
                report.hashtags = check_hashtags(&backend).await;
            }
            Err(check) => report.store = check,
        }
    }

    let checks = [
        &report.config,
        &report.weights,
        &report.store,
        &report.hashtags,
    ];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

fn check_weights(config: &AppConfig) -> CheckResult {
    let w: &FeedWeights = &config.feed.weights;
    let negative: Vec<&str> = [
        ("following", w.following),
        ("own_post", w.own_post),
        ("per_like", w.per_like),
        ("per_comment", w.per_comment),
        ("per_retweet", w.per_retweet),
        ("per_hashtag", w.per_hashtag),
        ("recency_max", w.recency_max),
        ("recency_decay_per_hour", w.recency_decay_per_hour),
    ]
    .into_iter()
    .filter(|(_, v)| *v < 0.0)
    .map(|(name, _)| name)
    .collect();

    let mut warnings = Vec::new();

    if config.feed.limit == 0 || config.trending.limit == 0 {
        warnings.push("Feed or trending limit is 0, views will be empty".to_string());
    }

    if config.feed.candidate_limit < config.feed.limit {
        warnings.push(format!(
            "candidate_limit {} is below feed limit {}",
            config.feed.candidate_limit, config.feed.limit
        ));
    }

    if !negative.is_empty() {
        warnings.push(format!("Negative weights: {}", negative.join(", ")));
    }

    if !warnings.is_empty() {
        return CheckResult::warn(warnings.join("; "))
            .with_details(serde_json::json!({ "warnings": warnings }));
    }

    CheckResult::ok(format!(
        "Feed limit {}, trending limit {}, trend multiplier {}",
        config.feed.limit, config.trending.limit, config.trending.count_multiplier
    ))
}

async fn open_store(config: &AppConfig) -> Result<(Backend, CheckResult), CheckResult> {
    let kind = BackendKind::parse(&config.general.backend)
        .map_err(|e| CheckResult::error(e.to_string()))?;

    let location = match kind {
        BackendKind::Snapshot => &config.general.snapshot_path,
        BackendKind::Sqlite => &config.general.state_db_path,
    };

    let backend = Backend::open(config)
        .await
        .map_err(|e| CheckResult::error(format!("{:#}", e)))?;

    let check = if kind == BackendKind::Snapshot && !location.exists() {
        CheckResult::warn(format!(
            "Snapshot {} does not exist yet, starting empty",
            location.display()
        ))
    } else {
        CheckResult::ok(format!("Backend: {:?}, Path: {}", kind, location.display()))
    };

    Ok((backend, check))
}

async fn check_hashtags(backend: &Backend) -> CheckResult {
    let posts = match backend.posts().fetch_recent_posts(usize::MAX).await {
        Ok(p) => p,
        Err(e) => return CheckResult::error(format!("Failed to read posts: {}", e)),
    };
    let aggregates = match backend.hashtags().fetch_hashtag_aggregates().await {
        Ok(a) => a,
        Err(e) => return CheckResult::error(format!("Failed to read hashtags: {}", e)),
    };

    let drifted = index_drift(&posts, &aggregates);
    let details = serde_json::json!({
        "posts": posts.len(),
        "tags": aggregates.len(),
        "drifted": drifted,
    });

    if drifted.is_empty() {
        CheckResult::ok(format!(
            "{} tags indexed over {} posts",
            aggregates.len(),
            posts.len()
        ))
        .with_details(details)
    } else {
        CheckResult::warn(format!("{} tags disagree with post contents", drifted.len()))
            .with_details(details)
    }
}

/// Tags whose aggregate does not match the posts that currently carry them
fn index_drift(posts: &[Post], aggregates: &[HashtagAggregate]) -> Vec<String> {
    let mut expected: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for post in posts {
        for tag in &post.hashtags {
            expected
                .entry(tag.as_str())
                .or_default()
                .insert(post.id.as_str());
        }
    }

    let mut drifted = BTreeSet::new();
    for agg in aggregates {
        let actual: BTreeSet<&str> = agg.post_ids.iter().map(String::as_str).collect();
        let wanted = expected.remove(agg.tag.as_str()).unwrap_or_default();
        if !agg.is_consistent() || actual != wanted {
            drifted.insert(agg.tag.clone());
        }
    }
    drifted.extend(expected.into_keys().map(str::to_string));

    drifted.into_iter().collect()
}

fn print_report(report: &DoctorReport) {
    println!("feedrank Doctor Report");
    println!("======================");
    println!();

    print_check("Config", &report.config);
    print_check("Weights", &report.weights);
    print_check("Store", &report.store);
    print_check("Hashtag Index", &report.hashtags);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall != "error" {
        println!();
        println!("Ready! Try: feedrank feed --viewer <id>");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn post(id: &str, tags: &[&str]) -> Post {
        Post {
            id: id.to_string(),
            author_id: "u".to_string(),
            author_name: "U".to_string(),
            content: String::new(),
            hashtags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            likes: Default::default(),
            comments: Vec::new(),
            retweets: Default::default(),
        }
    }

    fn aggregate(tag: &str, ids: &[&str]) -> HashtagAggregate {
        HashtagAggregate {
            tag: tag.to_string(),
            count: ids.len() as u64,
            post_ids: ids.iter().map(|i| i.to_string()).collect(),
        }
    }

    #[test]
    fn test_check_weights_reports_every_problem() {
        let mut config = AppConfig::default();
        config.feed.limit = 0;
        config.feed.weights.per_like = -5.0;

        let check = check_weights(&config);
        assert_eq!(check.status, "warn");
        assert!(check.message.contains("limit is 0"));
        assert!(check.message.contains("per_like"));
        assert_eq!(check.details.unwrap()["warnings"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_check_weights_defaults_ok() {
        assert!(check_weights(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_index_drift_clean() {
        let posts = vec![post("p1", &["rust"]), post("p2", &["rust", "go"])];
        let aggs = vec![aggregate("rust", &["p1", "p2"]), aggregate("go", &["p2"])];
        assert!(index_drift(&posts, &aggs).is_empty());
    }

    #[test]
    fn test_index_drift_reports_missing_and_stale() {
        let posts = vec![post("p1", &["rust", "go"])];
        let aggs = vec![aggregate("rust", &["p1", "p9"])];
        assert_eq!(index_drift(&posts, &aggs), vec!["go", "rust"]);
    }

    #[test]
    fn test_empty_aggregate_is_not_drift() {
        let aggs = vec![aggregate("old", &[])];
        assert!(index_drift(&[], &aggs).is_empty());
    }
}
