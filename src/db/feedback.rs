use sqlx::{Pool, Sqlite};
use crate::db::models::{Feedback, NewFeedback};
use crate::error::AppError;

pub struct FeedbackRepository;

impl FeedbackRepository {
    pub async fn insert(
        pool: &Pool<Sqlite>,
        new_feedback: &NewFeedback,
    ) -> Result<Feedback, AppError> {
        let feedback = sqlx::query_as::<_, Feedback>(
            r#"
INSERT INTO feedbacks (title, content, username)
VALUES (?, ?, ?)
RETURNING *
            "#,
        )
        .bind(&new_feedback.title)
        .bind(&new_feedback.content)
        .bind(&new_feedback.username)
        .fetch_one(pool)
        .await?;

        Ok(feedback)
    }

    pub async fn get_by_id(
        pool: &Pool<Sqlite>,
        id: i64,
    ) -> Result<Option<Feedback>, AppError> {
        let feedback = sqlx::query_as::<_, Feedback>(
            "SELECT * FROM feedbacks WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(feedback)
    }

    /// All feedback owned by `username`, oldest first.
    pub async fn list_for_user(
        pool: &Pool<Sqlite>,
        username: &str,
    ) -> Result<Vec<Feedback>, AppError> {
        let feedbacks = sqlx::query_as::<_, Feedback>(
            "SELECT * FROM feedbacks WHERE username = ? ORDER BY id ASC"
        )
        .bind(username)
        .fetch_all(pool)
        .await?;

        Ok(feedbacks)
    }

    /// Replace the title and content; the owner never changes.
    pub async fn update(
        pool: &Pool<Sqlite>,
        id: i64,
        title: &str,
        content: &str,
    ) -> Result<Option<Feedback>, AppError> {
        let feedback = sqlx::query_as::<_, Feedback>(
            r#"
UPDATE feedbacks SET title = ?, content = ?
WHERE id = ?
RETURNING *
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(feedback)
    }

    pub async fn delete(
        pool: &Pool<Sqlite>,
        id: i64,
    ) -> Result<bool, AppError> {
        let deleted = sqlx::query("DELETE FROM feedbacks WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }
}
