/*
 * Responsibility
 * - SQLx access to the users table
 * - takes a PgPool, returns rows or RepoError (mapped to AppError upstream)
 */
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::repos::error::RepoError;

#[derive(Debug, FromRow)]
pub struct UserRow {
    #[sqlx(rename = "userId")]
    pub id: Uuid,
    #[sqlx(rename = "userName")]
    pub user_name: String,
    #[sqlx(rename = "imageUrl")]
    pub image_url: Option<String>,
}

pub async fn list(db: &PgPool) -> Result<Vec<UserRow>, RepoError> {
    let rows = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT "userId", "userName", "imageUrl"
        FROM users
        ORDER BY "createdAt" DESC
        "#,
    )
    .fetch_all(db)
    .await?;

    Ok(rows)
}

pub async fn create(
    db: &PgPool,
    user_name: &str,
    image_url: Option<&str>,
) -> Result<UserRow, RepoError> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users ("userName", "imageUrl")
        VALUES ($1, $2)
        RETURNING "userId", "userName", "imageUrl"
        "#,
    )
    .bind(user_name.trim())
    .bind(image_url)
    .fetch_one(db)
    .await?;

    Ok(row)
}

pub async fn find(db: &PgPool, user_id: Uuid) -> Result<Option<UserRow>, RepoError> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT "userId", "userName", "imageUrl"
        FROM users
        WHERE "userId" = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

/// `image_url`: `None` keeps the column, `Some(None)` clears it, `Some(Some(v))` sets it.
pub async fn update(
    db: &PgPool,
    user_id: Uuid,
    user_name: Option<&str>,
    image_url: Option<Option<&str>>,
) -> Result<Option<UserRow>, RepoError> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        UPDATE users
        SET
            "userName" = COALESCE($2, "userName"),
            "imageUrl" = CASE WHEN $3 THEN $4 ELSE "imageUrl" END
        WHERE "userId" = $1
        RETURNING "userId", "userName", "imageUrl"
        "#,
    )
    .bind(user_id)
    .bind(user_name.map(str::trim))
    .bind(image_url.is_some())
    .bind(image_url.flatten())
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn delete(db: &PgPool, user_id: Uuid) -> Result<bool, RepoError> {
    let result = sqlx::query(r#"DELETE FROM users WHERE "userId" = $1"#)
        .bind(user_id)
        .execute(db)
        .await?;

    Ok(result.rows_affected() > 0)
}
