//! Feed command - print a feed view for a viewer

use anyhow::{Context, Result};
use feedrank_domain::scoring::format_relative;
use feedrank_domain::{Post, ScoredItem, ViewerId};
use serde::Serialize;
use std::path::PathBuf;
use time::OffsetDateTime;

use super::Backend;
use crate::args::{FeedArgs, FeedKind};
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct FeedEntry<'a> {
    #[serde(flatten)]
    post: &'a Post,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
}

pub async fn execute(args: FeedArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let viewer = ViewerId::new(args.viewer.as_str())?;
    let backend = Backend::open(&config).await?;
    let service = backend.feed_service(&config);

    tracing::debug!(viewer = %viewer, kind = ?args.kind, "Loading feed");

    let scored: Vec<ScoredItem<Post>> = match args.kind {
        FeedKind::Smart => service.smart_feed_scored(&viewer).await?,
        FeedKind::Latest => unscored(service.latest_feed().await?),
        FeedKind::Explore => unscored(service.explore_feed().await?),
        FeedKind::Hashtag => {
            let tag = args
                .tag
                .as_deref()
                .context("--tag is required for --kind hashtag")?;
            unscored(service.hashtag_feed(tag).await?)
        }
        FeedKind::Profile => {
            let user = args.user.as_deref().unwrap_or(viewer.as_str());
            unscored(service.profile_feed(user).await?)
        }
        FeedKind::Bookmarks => unscored(service.bookmarks(&viewer).await?),
    };

    let show_scores = args.scores && args.kind == FeedKind::Smart;

    if args.json {
        let entries: Vec<FeedEntry<'_>> = scored
            .iter()
            .map(|s| FeedEntry {
                post: &s.item,
                score: show_scores.then_some(s.score),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print_feed(&scored, show_scores, OffsetDateTime::now_utc());
    }

    Ok(())
}

fn unscored(posts: Vec<Post>) -> Vec<ScoredItem<Post>> {
    posts
        .into_iter()
        .map(|item| ScoredItem { item, score: 0.0 })
        .collect()
}

fn print_feed(entries: &[ScoredItem<Post>], show_scores: bool, now: OffsetDateTime) {
    if entries.is_empty() {
        println!("No posts yet.");
        return;
    }

    for entry in entries {
        let post = &entry.item;
        let mut header = format!(
            "{} (@{}) · {}",
            post.author_name,
            post.author_id,
            format_relative(post.created_at, now)
        );
        if show_scores {
            header.push_str(&format!(" · score {:.1}", entry.score));
        }

        println!("{}", header);
        println!("  {}", post.content);
        println!(
            "  [{}] likes {} · comments {} · retweets {}",
            post.id,
            post.like_count(),
            post.comment_count(),
            post.retweet_count()
        );
        println!();
    }
}
