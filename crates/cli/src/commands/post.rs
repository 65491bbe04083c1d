//! Post command - create, edit, delete and engage with posts

use anyhow::Result;
use feedrank_domain::{EngagementKind, ViewerId};
use std::path::PathBuf;

use super::Backend;
use crate::args::{PostArgs, PostCommands};
use crate::config::AppConfig;

pub async fn execute(args: PostArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let backend = Backend::open(&config).await?;
    let service = backend.post_service();

    match args.command {
        PostCommands::Create {
            author,
            name,
            text,
            json,
        } => {
            let author = ViewerId::new(author)?;
            let post = service.create(&author, name.as_deref(), &text).await?;
            backend.persist().await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&post)?);
            } else {
                println!("Created post {}", post.id);
                if !post.hashtags.is_empty() {
                    let tags: Vec<String> = post.hashtags.iter().map(|t| format!("#{}", t)).collect();
                    println!("Hashtags: {}", tags.join(" "));
                }
            }
        }
        PostCommands::Edit { viewer, id, text } => {
            let viewer = ViewerId::new(viewer)?;
            let post = service.edit(&viewer, &id, &text).await?;
            backend.persist().await?;
            println!("Updated post {}", post.id);
        }
        PostCommands::Delete { viewer, id } => {
            let viewer = ViewerId::new(viewer)?;
            let post = service.delete(&viewer, &id).await?;
            backend.persist().await?;
            println!("Deleted post {}", post.id);
        }
        PostCommands::Like { viewer, id } => {
            toggle(&backend, &viewer, &id, EngagementKind::Like).await?;
        }
        PostCommands::Retweet { viewer, id } => {
            toggle(&backend, &viewer, &id, EngagementKind::Retweet).await?;
        }
        PostCommands::Bookmark { viewer, id } => {
            let viewer = ViewerId::new(viewer)?;
            let bookmarked = service.toggle_bookmark(&viewer, &id).await?;
            backend.persist().await?;
            println!(
                "{} post {}",
                if bookmarked { "Bookmarked" } else { "Removed bookmark from" },
                id
            );
        }
        PostCommands::Comment { viewer, id, text } => {
            let viewer = ViewerId::new(viewer)?;
            let comment = service.comment(&viewer, &id, &text).await?;
            backend.persist().await?;
            println!("Added comment {} to post {}", comment.id, id);
        }
    }

    Ok(())
}

async fn toggle(backend: &Backend, viewer: &str, post_id: &str, kind: EngagementKind) -> Result<()> {
    let viewer = ViewerId::new(viewer)?;
    let active = backend.post_service().toggle(&viewer, post_id, kind).await?;
    backend.persist().await?;

    let verb = match (kind, active) {
        (EngagementKind::Like, true) => "Liked",
        (EngagementKind::Like, false) => "Unliked",
        (EngagementKind::Retweet, true) => "Retweeted",
        (EngagementKind::Retweet, false) => "Removed retweet of",
    };
    println!("{} post {}", verb, post_id);
    Ok(())
}
