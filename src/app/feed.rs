use anyhow::Result;
use sqlx::Row;
use std::collections::HashMap;

use crate::domain::post::{CommentView, FeedPost};
use crate::infra::db::{self, Db};

/// The feed never returns more than this many posts.
const FEED_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    NotOwner,
}

#[derive(Clone)]
pub struct FeedService {
    db: Db,
}

impl FeedService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Persist a post and return its projection. Input is already trimmed
    /// and length-capped by the handler. Returns None if the authoring user
    /// no longer exists.
    pub async fn create_post(
        &self,
        user_id: i64,
        title: &str,
        content: &str,
        category: &str,
        image: Option<&str>,
    ) -> Result<Option<FeedPost>> {
        let username: Option<String> = sqlx::query_scalar("SELECT username FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;
        let username = match username {
            Some(username) => username,
            None => return Ok(None),
        };

        let created_at = db::now();
        let post_id: i64 = sqlx::query_scalar(
            "INSERT INTO posts (user_id, title, content, category, image, created_at) \
             VALUES (?, ?, ?, ?, ?, ?) \
             RETURNING id",
        )
        .bind(user_id)
        .bind(title)
        .bind(content)
        .bind(category)
        .bind(image)
        .bind(created_at)
        .fetch_one(self.db.pool())
        .await?;

        Ok(Some(FeedPost {
            id: post_id,
            user_id,
            username,
            title: title.to_string(),
            content: content.to_string(),
            category: category.to_string(),
            image: image.map(str::to_string),
            created_at,
            likes_count: 0,
            likers: Vec::new(),
            comments: Vec::new(),
            liked: false,
            can_delete: true,
        }))
    }

    /// Newest-first feed, capped at 100 posts, with author names, likers,
    /// comments, and the viewer-relative `liked`/`can_delete` flags.
    ///
    /// SQLite has no array binds, so likers and comments are fetched with
    /// subqueries repeating the feed filter instead of an id list.
    pub async fn list_feed(
        &self,
        viewer: Option<i64>,
        category: Option<&str>,
    ) -> Result<Vec<FeedPost>> {
        let post_rows = match category {
            Some(category) => {
                sqlx::query(
                    "SELECT p.id, p.user_id, u.username, p.title, p.content, p.category, \
                            p.image, p.created_at \
                     FROM posts p \
                     JOIN users u ON u.id = p.user_id \
                     WHERE p.category = ? \
                     ORDER BY p.id DESC \
                     LIMIT ?",
                )
                .bind(category)
                .bind(FEED_LIMIT)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT p.id, p.user_id, u.username, p.title, p.content, p.category, \
                            p.image, p.created_at \
                     FROM posts p \
                     JOIN users u ON u.id = p.user_id \
                     ORDER BY p.id DESC \
                     LIMIT ?",
                )
                .bind(FEED_LIMIT)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        let like_rows = match category {
            Some(category) => {
                sqlx::query(
                    "SELECT l.post_id, l.user_id, u.username \
                     FROM post_likes l \
                     JOIN users u ON u.id = l.user_id \
                     WHERE l.post_id IN ( \
                         SELECT id FROM posts WHERE category = ? ORDER BY id DESC LIMIT ?)",
                )
                .bind(category)
                .bind(FEED_LIMIT)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT l.post_id, l.user_id, u.username \
                     FROM post_likes l \
                     JOIN users u ON u.id = l.user_id \
                     WHERE l.post_id IN ( \
                         SELECT id FROM posts ORDER BY id DESC LIMIT ?)",
                )
                .bind(FEED_LIMIT)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        let comment_rows = match category {
            Some(category) => {
                sqlx::query(
                    "SELECT c.id, c.post_id, u.username, c.body, c.created_at \
                     FROM post_comments c \
                     JOIN users u ON u.id = c.user_id \
                     WHERE c.post_id IN ( \
                         SELECT id FROM posts WHERE category = ? ORDER BY id DESC LIMIT ?) \
                     ORDER BY c.id ASC",
                )
                .bind(category)
                .bind(FEED_LIMIT)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT c.id, c.post_id, u.username, c.body, c.created_at \
                     FROM post_comments c \
                     JOIN users u ON u.id = c.user_id \
                     WHERE c.post_id IN ( \
                         SELECT id FROM posts ORDER BY id DESC LIMIT ?) \
                     ORDER BY c.id ASC",
                )
                .bind(FEED_LIMIT)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        let mut likers_by_post: HashMap<i64, Vec<(i64, String)>> = HashMap::new();
        for row in &like_rows {
            likers_by_post
                .entry(row.get("post_id"))
                .or_default()
                .push((row.get("user_id"), row.get("username")));
        }

        let mut comments_by_post: HashMap<i64, Vec<CommentView>> = HashMap::new();
        for row in &comment_rows {
            comments_by_post
                .entry(row.get("post_id"))
                .or_default()
                .push(CommentView {
                    id: row.get("id"),
                    username: row.get("username"),
                    text: row.get("body"),
                    created_at: row.get("created_at"),
                });
        }

        let mut posts = Vec::with_capacity(post_rows.len());
        for row in &post_rows {
            let post_id: i64 = row.get("id");
            let owner_id: i64 = row.get("user_id");
            let likers = likers_by_post.remove(&post_id).unwrap_or_default();
            let liked = viewer
                .map(|viewer| likers.iter().any(|(user_id, _)| *user_id == viewer))
                .unwrap_or(false);

            posts.push(FeedPost {
                id: post_id,
                user_id: owner_id,
                username: row.get("username"),
                title: row.get("title"),
                content: row.get("content"),
                category: row.get("category"),
                image: row.get("image"),
                created_at: row.get("created_at"),
                likes_count: likers.len() as i64,
                likers: likers.into_iter().map(|(_, username)| username).collect(),
                comments: comments_by_post.remove(&post_id).unwrap_or_default(),
                liked,
                can_delete: viewer == Some(owner_id),
            });
        }

        Ok(posts)
    }

    /// Toggle the viewer's like: remove if present, add otherwise. Returns
    /// the new liked flag and total like count, or None if the post is gone.
    pub async fn toggle_like(&self, post_id: i64, user_id: i64) -> Result<Option<(bool, i64)>> {
        let mut tx = self.db.pool().begin().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM posts WHERE id = ?")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let removed = sqlx::query("DELETE FROM post_likes WHERE post_id = ? AND user_id = ?")
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let liked = if removed.rows_affected() == 0 {
            sqlx::query(
                "INSERT INTO post_likes (post_id, user_id, created_at) VALUES (?, ?, ?)",
            )
            .bind(post_id)
            .bind(user_id)
            .bind(db::now())
            .execute(&mut *tx)
            .await?;
            true
        } else {
            false
        };

        let likes_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM post_likes WHERE post_id = ?")
                .bind(post_id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;
        Ok(Some((liked, likes_count)))
    }

    /// Append a comment and return its projection with the author name
    /// resolved. Returns None if the post is gone.
    pub async fn add_comment(
        &self,
        post_id: i64,
        user_id: i64,
        text: &str,
    ) -> Result<Option<CommentView>> {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM posts WHERE id = ?")
            .bind(post_id)
            .fetch_optional(self.db.pool())
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let username: Option<String> = sqlx::query_scalar("SELECT username FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;
        let username = match username {
            Some(username) => username,
            None => return Ok(None),
        };

        let created_at = db::now();
        let comment_id: i64 = sqlx::query_scalar(
            "INSERT INTO post_comments (post_id, user_id, body, created_at) \
             VALUES (?, ?, ?, ?) \
             RETURNING id",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(text)
        .bind(created_at)
        .fetch_one(self.db.pool())
        .await?;

        Ok(Some(CommentView {
            id: comment_id,
            username,
            text: text.to_string(),
            created_at,
        }))
    }

    /// Owner-only hard delete; likes and comments cascade.
    pub async fn delete_post(&self, post_id: i64, user_id: i64) -> Result<DeleteOutcome> {
        let owner: Option<i64> = sqlx::query_scalar("SELECT user_id FROM posts WHERE id = ?")
            .bind(post_id)
            .fetch_optional(self.db.pool())
            .await?;

        match owner {
            None => Ok(DeleteOutcome::NotFound),
            Some(owner) if owner != user_id => Ok(DeleteOutcome::NotOwner),
            Some(_) => {
                sqlx::query("DELETE FROM posts WHERE id = ?")
                    .bind(post_id)
                    .execute(self.db.pool())
                    .await?;
                Ok(DeleteOutcome::Deleted)
            }
        }
    }
}
