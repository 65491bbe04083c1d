//! Trending command - print the trending hashtags panel

use anyhow::Result;
use std::path::PathBuf;

use super::Backend;
use crate::args::TrendingArgs;
use crate::config::AppConfig;

pub async fn execute(args: TrendingArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let backend = Backend::open(&config).await?;
    let trending = backend.feed_service(&config).trending().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&trending)?);
        return Ok(());
    }

    if trending.is_empty() {
        println!("No trending hashtags yet.");
        return Ok(());
    }

    for tag in &trending {
        println!("{}. {}", tag.rank, tag.label);
        println!("   #{}", tag.tag);
        println!("   {} posts", tag.display_count);
    }

    Ok(())
}
