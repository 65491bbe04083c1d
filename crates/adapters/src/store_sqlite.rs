//! SQLite store implementation

use async_trait::async_trait;
use feedrank_domain::{
    BlockEdge, Comment, EngagementKind, FollowEdge, HashtagAggregate, HashtagDelta, HashtagIndex,
    Post, PostStore, SocialGraph, StoreError,
};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// SQLite-backed store
pub struct SqliteStore {
    pool: SqlitePool,
}

fn db(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn format_ts(ts: OffsetDateTime) -> Result<String, StoreError> {
    ts.format(&Rfc3339)
        .map_err(|e| StoreError::Serialization(e.to_string()))
}

fn parse_ts(s: &str) -> Result<OffsetDateTime, StoreError> {
    OffsetDateTime::parse(s, &Rfc3339).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn sort_key(ts: OffsetDateTime) -> i64 {
    (ts.unix_timestamp_nanos() / 1_000) as i64
}

type PostRow = (String, String, String, String, String, String);

impl SqliteStore {
    /// Create a new SQLite store, initializing the database if needed
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Database(format!("Failed to create directory: {}", e)))?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(db)?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(db)?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id TEXT PRIMARY KEY,
                author_id TEXT NOT NULL,
                author_name TEXT NOT NULL,
                content TEXT NOT NULL,
                hashtags TEXT NOT NULL,
                created_at TEXT NOT NULL,
                created_micros INTEGER NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(created_micros)",
            r#"
            CREATE TABLE IF NOT EXISTS engagements (
                post_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                PRIMARY KEY (post_id, user_id, kind)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                id TEXT PRIMARY KEY,
                post_id TEXT NOT NULL,
                author_id TEXT NOT NULL,
                text TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS follows (
                follower_id TEXT NOT NULL,
                followee_id TEXT NOT NULL,
                PRIMARY KEY (follower_id, followee_id)
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_follows_followee ON follows(followee_id)",
            r#"
            CREATE TABLE IF NOT EXISTS blocks (
                blocker_id TEXT NOT NULL,
                blocked_id TEXT NOT NULL,
                PRIMARY KEY (blocker_id, blocked_id)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS hashtags (
                tag TEXT PRIMARY KEY,
                count INTEGER NOT NULL DEFAULT 0
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS hashtag_posts (
                tag TEXT NOT NULL,
                post_id TEXT NOT NULL,
                PRIMARY KEY (tag, post_id)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS bookmarks (
                user_id TEXT NOT NULL,
                post_id TEXT NOT NULL,
                PRIMARY KEY (user_id, post_id)
            )
            "#,
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(db)?;
        }

        Ok(())
    }

    async fn hydrate(&self, row: PostRow) -> Result<Post, StoreError> {
        let (id, author_id, author_name, content, hashtags_json, created_at) = row;

        let hashtags: Vec<String> = serde_json::from_str(&hashtags_json)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let engagements: Vec<(String, String)> =
            sqlx::query_as("SELECT user_id, kind FROM engagements WHERE post_id = ?")
                .bind(&id)
                .fetch_all(&self.pool)
                .await
                .map_err(db)?;

        let mut likes = BTreeSet::new();
        let mut retweets = BTreeSet::new();
        for (user_id, kind) in engagements {
            match kind.as_str() {
                "like" => {
                    likes.insert(user_id);
                }
                "retweet" => {
                    retweets.insert(user_id);
                }
                other => tracing::warn!(post_id = %id, kind = other, "Unknown engagement kind"),
            }
        }

        let comment_rows: Vec<(String, String, String, String)> = sqlx::query_as(
            "SELECT id, author_id, text, created_at FROM comments WHERE post_id = ? ORDER BY rowid",
        )
        .bind(&id)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        let comments = comment_rows
            .into_iter()
            .map(|(id, author_id, text, created_at)| {
                Ok(Comment {
                    id,
                    author_id,
                    text,
                    created_at: parse_ts(&created_at)?,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        Ok(Post {
            id,
            author_id,
            author_name,
            content,
            hashtags,
            created_at: parse_ts(&created_at)?,
            likes,
            comments,
            retweets,
        })
    }

    async fn hydrate_all(&self, rows: Vec<PostRow>) -> Result<Vec<Post>, StoreError> {
        let mut posts = Vec::with_capacity(rows.len());
        for row in rows {
            posts.push(self.hydrate(row).await?);
        }
        Ok(posts)
    }

    async fn post_exists(&self, post_id: &str) -> Result<bool, StoreError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts WHERE id = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db)?;
        Ok(count.0 > 0)
    }
}

#[async_trait]
impl PostStore for SqliteStore {
    async fn fetch_recent_posts(&self, limit: usize) -> Result<Vec<Post>, StoreError> {
        let rows: Vec<PostRow> = sqlx::query_as(
            r#"
            SELECT id, author_id, author_name, content, hashtags, created_at
            FROM posts
            ORDER BY created_micros DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        self.hydrate_all(rows.into_iter().rev().collect()).await
    }

    async fn fetch_posts_by_author(&self, author_id: &str) -> Result<Vec<Post>, StoreError> {
        let rows: Vec<PostRow> = sqlx::query_as(
            r#"
            SELECT id, author_id, author_name, content, hashtags, created_at
            FROM posts
            WHERE author_id = ?
            ORDER BY created_micros, rowid
            "#,
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        self.hydrate_all(rows).await
    }

    async fn fetch_posts_with_tag(&self, tag: &str) -> Result<Vec<Post>, StoreError> {
        let rows: Vec<PostRow> = sqlx::query_as(
            r#"
            SELECT p.id, p.author_id, p.author_name, p.content, p.hashtags, p.created_at
            FROM posts p
            JOIN hashtag_posts h ON h.post_id = p.id
            WHERE h.tag = ?
            ORDER BY p.created_micros, p.rowid
            "#,
        )
        .bind(tag)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        self.hydrate_all(rows).await
    }

    async fn fetch_most_liked(&self, limit: usize) -> Result<Vec<Post>, StoreError> {
        let rows: Vec<PostRow> = sqlx::query_as(
            r#"
            SELECT p.id, p.author_id, p.author_name, p.content, p.hashtags, p.created_at
            FROM posts p
            LEFT JOIN engagements e ON e.post_id = p.id AND e.kind = 'like'
            GROUP BY p.id
            ORDER BY COUNT(e.user_id) DESC, p.created_micros, p.rowid
            LIMIT ?
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        self.hydrate_all(rows).await
    }

    async fn fetch_post(&self, post_id: &str) -> Result<Option<Post>, StoreError> {
        let row: Option<PostRow> = sqlx::query_as(
            r#"
            SELECT id, author_id, author_name, content, hashtags, created_at
            FROM posts
            WHERE id = ?
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn put_post(&self, post: &Post) -> Result<(), StoreError> {
        let hashtags = serde_json::to_string(&post.hashtags)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let created_at = format_ts(post.created_at)?;

        let mut tx = self.pool.begin().await.map_err(db)?;

        // Engagement and comment rows of an existing post belong to their own writers
        let updated = sqlx::query(
            "UPDATE posts SET author_name = ?, content = ?, hashtags = ? WHERE id = ?",
        )
        .bind(&post.author_name)
        .bind(&post.content)
        .bind(&hashtags)
        .bind(&post.id)
        .execute(&mut *tx)
        .await
        .map_err(db)?
        .rows_affected();

        if updated > 0 {
            tx.commit().await.map_err(db)?;
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO posts (id, author_id, author_name, content, hashtags, created_at, created_micros)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.author_id)
        .bind(&post.author_name)
        .bind(&post.content)
        .bind(&hashtags)
        .bind(&created_at)
        .bind(sort_key(post.created_at))
        .execute(&mut *tx)
        .await
        .map_err(db)?;

        let engagements = post
            .likes
            .iter()
            .map(|u| (u, EngagementKind::Like))
            .chain(post.retweets.iter().map(|u| (u, EngagementKind::Retweet)));
        for (user_id, kind) in engagements {
            sqlx::query("INSERT INTO engagements (post_id, user_id, kind) VALUES (?, ?, ?)")
                .bind(&post.id)
                .bind(user_id)
                .bind(kind.as_str())
                .execute(&mut *tx)
                .await
                .map_err(db)?;
        }

        for comment in &post.comments {
            sqlx::query(
                "INSERT INTO comments (id, post_id, author_id, text, created_at) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&comment.id)
            .bind(&post.id)
            .bind(&comment.author_id)
            .bind(&comment.text)
            .bind(format_ts(comment.created_at)?)
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        }

        tx.commit().await.map_err(db)?;
        Ok(())
    }

    async fn remove_post(&self, post_id: &str) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db)?;

        let removed = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .map_err(db)?
            .rows_affected();

        for sql in [
            "DELETE FROM engagements WHERE post_id = ?",
            "DELETE FROM comments WHERE post_id = ?",
        ] {
            sqlx::query(sql)
                .bind(post_id)
                .execute(&mut *tx)
                .await
                .map_err(db)?;
        }

        tx.commit().await.map_err(db)?;
        Ok(removed > 0)
    }

    async fn toggle_engagement(
        &self,
        post_id: &str,
        user_id: &str,
        kind: EngagementKind,
    ) -> Result<bool, StoreError> {
        if !self.post_exists(post_id).await? {
            return Err(StoreError::NotFound(format!("post {}", post_id)));
        }

        let removed = sqlx::query(
            "DELETE FROM engagements WHERE post_id = ? AND user_id = ? AND kind = ?",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(kind.as_str())
        .execute(&self.pool)
        .await
        .map_err(db)?
        .rows_affected();

        if removed > 0 {
            return Ok(false);
        }

        sqlx::query("INSERT OR IGNORE INTO engagements (post_id, user_id, kind) VALUES (?, ?, ?)")
            .bind(post_id)
            .bind(user_id)
            .bind(kind.as_str())
            .execute(&self.pool)
            .await
            .map_err(db)?;

        Ok(true)
    }

    async fn add_comment(&self, post_id: &str, comment: &Comment) -> Result<(), StoreError> {
        if !self.post_exists(post_id).await? {
            return Err(StoreError::NotFound(format!("post {}", post_id)));
        }

        sqlx::query(
            "INSERT INTO comments (id, post_id, author_id, text, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&comment.id)
        .bind(post_id)
        .bind(&comment.author_id)
        .bind(&comment.text)
        .bind(format_ts(comment.created_at)?)
        .execute(&self.pool)
        .await
        .map_err(db)?;

        Ok(())
    }

    async fn fetch_bookmarks(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT post_id FROM bookmarks WHERE user_id = ? ORDER BY rowid")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
                .map_err(db)?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn toggle_bookmark(&self, user_id: &str, post_id: &str) -> Result<bool, StoreError> {
        let removed = sqlx::query("DELETE FROM bookmarks WHERE user_id = ? AND post_id = ?")
            .bind(user_id)
            .bind(post_id)
            .execute(&self.pool)
            .await
            .map_err(db)?
            .rows_affected();

        if removed > 0 {
            return Ok(false);
        }

        sqlx::query("INSERT INTO bookmarks (user_id, post_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(post_id)
            .execute(&self.pool)
            .await
            .map_err(db)?;

        Ok(true)
    }
}

#[async_trait]
impl SocialGraph for SqliteStore {
    async fn fetch_following(&self, user_id: &str) -> Result<BTreeSet<String>, StoreError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT followee_id FROM follows WHERE follower_id = ?")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
                .map_err(db)?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn fetch_followers(&self, user_id: &str) -> Result<BTreeSet<String>, StoreError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT follower_id FROM follows WHERE followee_id = ?")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
                .map_err(db)?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn fetch_blocked(&self, user_id: &str) -> Result<BTreeSet<String>, StoreError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT blocked_id FROM blocks WHERE blocker_id = ?")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
                .map_err(db)?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn set_follow(&self, edge: &FollowEdge, present: bool) -> Result<(), StoreError> {
        // A single row serves both the following and followers queries
        let sql = if present {
            "INSERT OR IGNORE INTO follows (follower_id, followee_id) VALUES (?, ?)"
        } else {
            "DELETE FROM follows WHERE follower_id = ? AND followee_id = ?"
        };

        sqlx::query(sql)
            .bind(&edge.follower_id)
            .bind(&edge.followee_id)
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(())
    }

    async fn set_block(&self, edge: &BlockEdge, present: bool) -> Result<(), StoreError> {
        let sql = if present {
            "INSERT OR IGNORE INTO blocks (blocker_id, blocked_id) VALUES (?, ?)"
        } else {
            "DELETE FROM blocks WHERE blocker_id = ? AND blocked_id = ?"
        };

        sqlx::query(sql)
            .bind(&edge.blocker_id)
            .bind(&edge.blocked_id)
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(())
    }
}

#[async_trait]
impl HashtagIndex for SqliteStore {
    async fn fetch_hashtag_aggregates(&self) -> Result<Vec<HashtagAggregate>, StoreError> {
        let tags: Vec<(String, i64)> = sqlx::query_as("SELECT tag, count FROM hashtags ORDER BY rowid")
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;

        let members: Vec<(String, String)> =
            sqlx::query_as("SELECT tag, post_id FROM hashtag_posts")
                .fetch_all(&self.pool)
                .await
                .map_err(db)?;

        let mut post_ids: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (tag, post_id) in members {
            post_ids.entry(tag).or_default().insert(post_id);
        }

        Ok(tags
            .into_iter()
            .map(|(tag, count)| HashtagAggregate {
                post_ids: post_ids.remove(&tag).unwrap_or_default(),
                count: count.max(0) as u64,
                tag,
            })
            .collect())
    }

    async fn apply_hashtag_delta(&self, delta: &HashtagDelta) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(db)?;

        sqlx::query("INSERT OR IGNORE INTO hashtags (tag, count) VALUES (?, 0)")
            .bind(&delta.tag)
            .execute(&mut *tx)
            .await
            .map_err(db)?;

        let membership_sql = if delta.added {
            "INSERT OR IGNORE INTO hashtag_posts (tag, post_id) VALUES (?, ?)"
        } else {
            "DELETE FROM hashtag_posts WHERE tag = ? AND post_id = ?"
        };

        sqlx::query(membership_sql)
            .bind(&delta.tag)
            .bind(&delta.post_id)
            .execute(&mut *tx)
            .await
            .map_err(db)?;

        // Count is always the size of the membership set, which absorbs replays
        sqlx::query(
            "UPDATE hashtags SET count = (SELECT COUNT(*) FROM hashtag_posts WHERE tag = ?) WHERE tag = ?",
        )
        .bind(&delta.tag)
        .bind(&delta.tag)
        .execute(&mut *tx)
        .await
        .map_err(db)?;

        tx.commit().await.map_err(db)?;
        Ok(())
    }
}
