//! Graph command - follow, unfollow, block, unblock and inspect

use anyhow::Result;
use feedrank_domain::ViewerId;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

use super::Backend;
use crate::args::{GraphArgs, GraphCommands};
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct GraphReport {
    user: String,
    following: BTreeSet<String>,
    followers: BTreeSet<String>,
    blocked: BTreeSet<String>,
}

pub async fn execute(args: GraphArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let backend = Backend::open(&config).await?;
    let service = backend.graph_service();

    match args.command {
        GraphCommands::Follow { viewer, target } => {
            service.follow(&ViewerId::new(viewer)?, &target).await?;
            backend.persist().await?;
            println!("Following {}", target);
        }
        GraphCommands::Unfollow { viewer, target } => {
            service.unfollow(&ViewerId::new(viewer)?, &target).await?;
            backend.persist().await?;
            println!("Unfollowed {}", target);
        }
        GraphCommands::Block { viewer, target } => {
            service.block(&ViewerId::new(viewer)?, &target).await?;
            backend.persist().await?;
            println!("Blocked {}", target);
        }
        GraphCommands::Unblock { viewer, target } => {
            service.unblock(&ViewerId::new(viewer)?, &target).await?;
            backend.persist().await?;
            println!("Unblocked {}", target);
        }
        GraphCommands::Show { user, json } => {
            let viewer = ViewerId::new(user)?;
            let view = service.load_view(&viewer).await?;
            let followers = service.followers(viewer.as_str()).await?;

            let report = GraphReport {
                user: viewer.as_str().to_string(),
                following: view.following().cloned().unwrap_or_default(),
                followers,
                blocked: view.blocked().cloned().unwrap_or_default(),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
    }

    Ok(())
}

fn print_report(report: &GraphReport) {
    println!("@{}", report.user);
    print_set("Following", &report.following);
    print_set("Followers", &report.followers);
    print_set("Blocked", &report.blocked);
}

fn print_set(name: &str, users: &BTreeSet<String>) {
    if users.is_empty() {
        println!("{} (0)", name);
    } else {
        let list: Vec<&str> = users.iter().map(String::as_str).collect();
        println!("{} ({}): {}", name, users.len(), list.join(", "));
    }
}
