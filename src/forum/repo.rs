use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// TEXT posts are plain; IMAGE and ZIP posts carry an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
pub enum PostCategory {
    Text,
    Image,
    Zip,
}

impl std::str::FromStr for PostCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TEXT" => Ok(Self::Text),
            "IMAGE" => Ok(Self::Image),
            "ZIP" => Ok(Self::Zip),
            other => anyhow::bail!("unknown post category: {other}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ForumPost {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub category: PostCategory,
    pub body: Option<String>,
    pub file_name: Option<String>,
    pub file_mime: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ForumComment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub body: String,
    pub created_at: OffsetDateTime,
}

/// Comment joined with the author's name for the post view.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CommentWithUser {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub body: String,
    pub created_at: OffsetDateTime,
    pub user_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ForumLike {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LikeWithUser {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub created_at: OffsetDateTime,
    pub user_name: String,
}

const POST_COLUMNS: &str =
    "id, user_id, title, category, body, file_name, file_mime, created_at";

impl ForumPost {
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        title: &str,
        category: PostCategory,
        body: Option<&str>,
        file_name: Option<&str>,
        file_mime: Option<&str>,
    ) -> anyhow::Result<ForumPost> {
        let post = sqlx::query_as::<_, ForumPost>(&format!(
            "INSERT INTO forum_posts (user_id, title, category, body, file_name, file_mime)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {POST_COLUMNS}"
        ))
        .bind(user_id)
        .bind(title)
        .bind(category)
        .bind(body)
        .bind(file_name)
        .bind(file_mime)
        .fetch_one(db)
        .await?;
        Ok(post)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<ForumPost>> {
        let post = sqlx::query_as::<_, ForumPost>(&format!(
            "SELECT {POST_COLUMNS} FROM forum_posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(post)
    }

    /// Newest first.
    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<ForumPost>> {
        let posts = sqlx::query_as::<_, ForumPost>(&format!(
            "SELECT {POST_COLUMNS} FROM forum_posts ORDER BY created_at DESC"
        ))
        .fetch_all(db)
        .await?;
        Ok(posts)
    }

    /// Attachment-bearing posts only (the "resources" view).
    pub async fn list_resources(db: &PgPool) -> anyhow::Result<Vec<ForumPost>> {
        let posts = sqlx::query_as::<_, ForumPost>(&format!(
            "SELECT {POST_COLUMNS} FROM forum_posts WHERE category <> 'TEXT'
             ORDER BY created_at DESC"
        ))
        .fetch_all(db)
        .await?;
        Ok(posts)
    }

    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<ForumPost>> {
        let posts = sqlx::query_as::<_, ForumPost>(&format!(
            "SELECT {POST_COLUMNS} FROM forum_posts WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(posts)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let deleted = sqlx::query("DELETE FROM forum_posts WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(deleted.is_some())
    }
}

impl ForumComment {
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        post_id: Uuid,
        body: &str,
    ) -> anyhow::Result<ForumComment> {
        let comment = sqlx::query_as::<_, ForumComment>(
            r#"
            INSERT INTO forum_comments (user_id, post_id, body)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, post_id, body, created_at
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .bind(body)
        .fetch_one(db)
        .await?;
        Ok(comment)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<ForumComment>> {
        let comment = sqlx::query_as::<_, ForumComment>(
            r#"
            SELECT id, user_id, post_id, body, created_at
            FROM forum_comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(comment)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let deleted = sqlx::query("DELETE FROM forum_comments WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(deleted.is_some())
    }

    pub async fn list_by_post(db: &PgPool, post_id: Uuid) -> anyhow::Result<Vec<CommentWithUser>> {
        let comments = sqlx::query_as::<_, CommentWithUser>(
            r#"
            SELECT c.id, c.user_id, c.post_id, c.body, c.created_at, u.name AS user_name
            FROM forum_comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.post_id = $1
            ORDER BY c.created_at
            "#,
        )
        .bind(post_id)
        .fetch_all(db)
        .await?;
        Ok(comments)
    }

    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<ForumComment>> {
        let comments = sqlx::query_as::<_, ForumComment>(
            r#"
            SELECT id, user_id, post_id, body, created_at
            FROM forum_comments
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(comments)
    }
}

impl ForumLike {
    /// Atomic insert-if-absent: the UNIQUE (user_id, post_id) constraint
    /// makes two concurrent likes for the same pair resolve to one row,
    /// with no read-then-write window. Returns None if the like existed.
    pub async fn insert_if_absent(
        db: &PgPool,
        user_id: Uuid,
        post_id: Uuid,
    ) -> anyhow::Result<Option<ForumLike>> {
        let like = sqlx::query_as::<_, ForumLike>(
            r#"
            INSERT INTO forum_likes (user_id, post_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, post_id) DO NOTHING
            RETURNING id, user_id, post_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(db)
        .await?;
        Ok(like)
    }

    /// Atomic delete-if-present counterpart. Returns false if there was
    /// nothing to remove.
    pub async fn remove(db: &PgPool, user_id: Uuid, post_id: Uuid) -> anyhow::Result<bool> {
        let deleted = sqlx::query(
            "DELETE FROM forum_likes WHERE user_id = $1 AND post_id = $2 RETURNING id",
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(db)
        .await?;
        Ok(deleted.is_some())
    }

    pub async fn list_by_post(db: &PgPool, post_id: Uuid) -> anyhow::Result<Vec<LikeWithUser>> {
        let likes = sqlx::query_as::<_, LikeWithUser>(
            r#"
            SELECT l.id, l.user_id, l.post_id, l.created_at, u.name AS user_name
            FROM forum_likes l
            JOIN users u ON u.id = l.user_id
            WHERE l.post_id = $1
            ORDER BY l.created_at
            "#,
        )
        .bind(post_id)
        .fetch_all(db)
        .await?;
        Ok(likes)
    }

    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<ForumLike>> {
        let likes = sqlx::query_as::<_, ForumLike>(
            r#"
            SELECT id, user_id, post_id, created_at
            FROM forum_likes
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(likes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&PostCategory::Image).unwrap(),
            "\"IMAGE\""
        );
        let c: PostCategory = serde_json::from_str("\"ZIP\"").unwrap();
        assert_eq!(c, PostCategory::Zip);
        assert!(serde_json::from_str::<PostCategory>("\"GIF\"").is_err());
    }

    #[test]
    fn category_parses_from_multipart_field() {
        assert_eq!("TEXT".parse::<PostCategory>().unwrap(), PostCategory::Text);
        assert_eq!("IMAGE".parse::<PostCategory>().unwrap(), PostCategory::Image);
        assert!("text".parse::<PostCategory>().is_err());
    }
}
