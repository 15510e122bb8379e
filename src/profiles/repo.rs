use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// Profile row, owned by a user (1:N).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub display_name: String,
    pub bio: Option<String>,
    pub created_at: OffsetDateTime,
}

pub async fn list_by_user(db: &PgPool, user_id: i64) -> anyhow::Result<Vec<Profile>> {
    let rows = sqlx::query_as::<_, Profile>(
        r#"
        SELECT id, user_id, display_name, bio, created_at
        FROM profiles
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn create(
    db: &PgPool,
    user_id: i64,
    display_name: &str,
    bio: Option<&str>,
) -> anyhow::Result<Profile> {
    let profile = sqlx::query_as::<_, Profile>(
        r#"
        INSERT INTO profiles (user_id, display_name, bio)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, display_name, bio, created_at
        "#,
    )
    .bind(user_id)
    .bind(display_name)
    .bind(bio)
    .fetch_one(db)
    .await?;
    Ok(profile)
}

pub async fn get(db: &PgPool, user_id: i64, id: i64) -> anyhow::Result<Option<Profile>> {
    let profile = sqlx::query_as::<_, Profile>(
        r#"
        SELECT id, user_id, display_name, bio, created_at
        FROM profiles
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(profile)
}

pub async fn update(
    db: &PgPool,
    user_id: i64,
    id: i64,
    display_name: &str,
    bio: Option<&str>,
) -> anyhow::Result<Option<Profile>> {
    let profile = sqlx::query_as::<_, Profile>(
        r#"
        UPDATE profiles
        SET display_name = $3, bio = $4
        WHERE id = $1 AND user_id = $2
        RETURNING id, user_id, display_name, bio, created_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(display_name)
    .bind(bio)
    .fetch_optional(db)
    .await?;
    Ok(profile)
}

pub async fn delete(db: &PgPool, user_id: i64, id: i64) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM profiles
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}
