use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Write a config pointing at `data.json` inside the temp dir, plus the snapshot itself
fn setup(dir: &TempDir, snapshot: Value) -> PathBuf {
    let data_path = dir.path().join("data.json");
    fs::write(&data_path, serde_json::to_string(&snapshot).unwrap()).expect("write snapshot");

    let config_path = dir.path().join("feedrank.toml");
    let config = format!(
        "[general]\nbackend = \"snapshot\"\nsnapshot_path = {:?}\n",
        data_path.display().to_string()
    );
    fs::write(&config_path, config).expect("write config");
    config_path
}

fn feedrank(dir: &TempDir, config: &PathBuf) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("feedrank");
    cmd.current_dir(dir.path()).arg("--config").arg(config);
    cmd
}

fn post(id: &str, author: &str, likes: &[&str], tags: &[&str]) -> Value {
    json!({
        "id": id,
        "author_id": author,
        "author_name": author.to_uppercase(),
        "content": format!("post {}", id),
        "hashtags": tags,
        "created_at": "2020-01-01T00:00:00Z",
        "likes": likes,
    })
}

fn aggregate(tag: &str, count: usize) -> Value {
    let post_ids: Vec<String> = (0..count).map(|i| format!("{}-{}", tag, i)).collect();
    json!({"tag": tag, "count": count, "post_ids": post_ids})
}

fn json_stdout(output: std::process::Output) -> Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

#[test]
fn config_init_writes_example_file() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("config.toml");

    let mut cmd = cargo_bin_cmd!("feedrank");
    cmd.current_dir(dir.path())
        .args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .success();

    let content = fs::read_to_string(&config_path).expect("read config");
    assert!(content.contains("snapshot_path"));
    assert!(content.contains("count_multiplier = 1.5"));
}

#[test]
fn config_init_refuses_to_overwrite() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "# mine\n").expect("write config");

    let mut cmd = cargo_bin_cmd!("feedrank");
    cmd.current_dir(dir.path())
        .args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn smart_feed_orders_own_then_followed_then_engaged() {
    let dir = TempDir::new().expect("temp dir");
    let config = setup(
        &dir,
        json!({
            "posts": [
                post("c1", "carol", &["u1", "u2", "u3", "u4", "u5", "u6", "u7", "u8", "u9", "u10"], &[]),
                post("b1", "bob", &[], &[]),
                post("a1", "alice", &[], &[]),
            ],
            "follows": [{"follower_id": "alice", "followee_id": "bob"}],
        }),
    );

    let output = feedrank(&dir, &config)
        .args(["feed", "--viewer", "alice", "--json", "--scores"])
        .output()
        .expect("run feed");
    let value = json_stdout(output);

    let entries = value.as_array().expect("array");
    let ids: Vec<&str> = entries.iter().map(|e| e["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["a1", "b1", "c1"]);

    let scores: Vec<f64> = entries.iter().map(|e| e["score"].as_f64().unwrap()).collect();
    assert_eq!(scores, vec![200.0, 100.0, 50.0]);
}

#[test]
fn explore_feed_orders_by_likes() {
    let dir = TempDir::new().expect("temp dir");
    let config = setup(
        &dir,
        json!({
            "posts": [
                post("p1", "bob", &["x"], &[]),
                post("p2", "bob", &["x", "y", "z"], &[]),
                post("p3", "bob", &[], &[]),
            ],
        }),
    );

    let output = feedrank(&dir, &config)
        .args(["feed", "--viewer", "alice", "--kind", "explore", "--json"])
        .output()
        .expect("run feed");
    let value = json_stdout(output);

    let ids: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["p2", "p1", "p3"]);
    assert!(value[0].get("score").is_none());
}

#[test]
fn hashtag_feed_finds_posts_outside_recent_window() {
    let dir = TempDir::new().expect("temp dir");
    let mut posts = vec![json!({
        "id": "old",
        "author_id": "alice",
        "content": "vintage #rare",
        "hashtags": ["rare"],
        "created_at": "2019-01-01T00:00:00Z",
    })];
    posts.extend((0..120).map(|i| post(&format!("n{}", i), "crowd", &[], &[])));
    let config = setup(
        &dir,
        json!({
            "posts": posts,
            "hashtags": [{"tag": "rare", "count": 1, "post_ids": ["old"]}],
        }),
    );

    let output = feedrank(&dir, &config)
        .args(["feed", "--viewer", "bob", "--kind", "hashtag", "--tag", "#rare", "--json"])
        .output()
        .expect("run feed");
    let value = json_stdout(output);

    assert_eq!(value.as_array().unwrap().len(), 1);
    assert_eq!(value[0]["id"], "old");
}

#[test]
fn feed_rejects_empty_viewer() {
    let dir = TempDir::new().expect("temp dir");
    let config = setup(&dir, json!({}));

    feedrank(&dir, &config)
        .args(["feed", "--viewer", ""])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Viewer id must not be empty"));
}

#[test]
fn trending_ranks_by_count_with_labels() {
    let dir = TempDir::new().expect("temp dir");
    let config = setup(
        &dir,
        json!({
            "hashtags": [
                aggregate("rust", 5),
                aggregate("python", 3),
                aggregate("go", 8),
                aggregate("js", 1),
                aggregate("zig", 0),
            ],
        }),
    );

    let output = feedrank(&dir, &config)
        .args(["trending", "--json"])
        .output()
        .expect("run trending");
    let value = json_stdout(output);

    let tags: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["tag"].as_str().unwrap())
        .collect();
    assert_eq!(tags, vec!["go", "rust", "python", "js"]);
    assert_eq!(value[0]["score"].as_f64(), Some(12.0));
    assert_eq!(value[0]["count"], 8);
    assert_eq!(value[0]["label"], "Trending Worldwide");
    assert_eq!(value[1]["label"], "Trending");
}

#[test]
fn created_post_shows_up_in_trending() {
    let dir = TempDir::new().expect("temp dir");
    let config = setup(&dir, json!({}));

    feedrank(&dir, &config)
        .args([
            "post", "create", "--author", "alice", "--text", "Learning #Rust and #rust today",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hashtags: #rust"));

    let output = feedrank(&dir, &config)
        .args(["trending", "--json"])
        .output()
        .expect("run trending");
    let value = json_stdout(output);

    assert_eq!(value.as_array().unwrap().len(), 1);
    assert_eq!(value[0]["tag"], "rust");
    assert_eq!(value[0]["count"], 1);
}

#[test]
fn edit_by_non_author_fails() {
    let dir = TempDir::new().expect("temp dir");
    let config = setup(&dir, json!({"posts": [post("p1", "alice", &[], &[])]}));

    feedrank(&dir, &config)
        .args(["post", "edit", "--viewer", "bob", "--id", "p1", "--text", "hijacked"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not the author"));
}

#[test]
fn block_removes_follow() {
    let dir = TempDir::new().expect("temp dir");
    let config = setup(
        &dir,
        json!({"follows": [{"follower_id": "alice", "followee_id": "bob"}]}),
    );

    feedrank(&dir, &config)
        .args(["graph", "block", "--viewer", "alice", "--target", "bob"])
        .assert()
        .success();

    let output = feedrank(&dir, &config)
        .args(["graph", "show", "--user", "alice", "--json"])
        .output()
        .expect("run graph show");
    let value = json_stdout(output);

    assert_eq!(value["following"], json!([]));
    assert_eq!(value["blocked"], json!(["bob"]));
}

#[test]
fn follow_self_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let config = setup(&dir, json!({}));

    feedrank(&dir, &config)
        .args(["graph", "follow", "--viewer", "alice", "--target", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("themselves"));
}

#[test]
fn doctor_reports_ok_json() {
    let dir = TempDir::new().expect("temp dir");
    let config = setup(&dir, json!({"posts": [post("p1", "alice", &[], &["rust"])],
        "hashtags": [{"tag": "rust", "count": 1, "post_ids": ["p1"]}]}));

    let output = feedrank(&dir, &config)
        .args(["doctor", "--json"])
        .output()
        .expect("run doctor");
    let value = json_stdout(output);

    assert_eq!(value["overall"], "ok");
    assert_eq!(value["hashtags"]["status"], "ok");
}
