use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Mood {
    pub id: Uuid,
    pub user_id: Uuid,
    pub score: i32,
    pub notes: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Mood joined with the owner's name, for the admin analytics view.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MoodWithUser {
    pub id: Uuid,
    pub user_id: Uuid,
    pub score: i32,
    pub notes: Option<String>,
    pub created_at: OffsetDateTime,
    pub user_name: String,
}

impl Mood {
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        score: i32,
        notes: Option<&str>,
    ) -> anyhow::Result<Mood> {
        let mood = sqlx::query_as::<_, Mood>(
            r#"
            INSERT INTO moods (user_id, score, notes)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, score, notes, created_at
            "#,
        )
        .bind(user_id)
        .bind(score)
        .bind(notes)
        .fetch_one(db)
        .await?;
        Ok(mood)
    }

    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Mood>> {
        let moods = sqlx::query_as::<_, Mood>(
            r#"
            SELECT id, user_id, score, notes, created_at
            FROM moods
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(moods)
    }

    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<MoodWithUser>> {
        let moods = sqlx::query_as::<_, MoodWithUser>(
            r#"
            SELECT m.id, m.user_id, m.score, m.notes, m.created_at, u.name AS user_name
            FROM moods m
            JOIN users u ON u.id = m.user_id
            ORDER BY m.created_at DESC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(moods)
    }
}
