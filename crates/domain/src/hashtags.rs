//! Hashtag extraction from post content

use regex::Regex;
use std::sync::OnceLock;

fn hashtag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"#[A-Za-z0-9_]+").expect("Valid regex"))
}

/// Extract lowercase tags (without `#`) in first-occurrence order, deduplicated
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for m in hashtag_pattern().find_iter(text) {
        let tag = m.as_str()[1..].to_lowercase();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Normalize user input like `#Rust` to the stored form `rust`
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().trim_start_matches('#').to_lowercase()
}
