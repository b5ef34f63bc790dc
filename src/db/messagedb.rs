use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::messagemodel::{Message, Review};

const MESSAGE_COLUMNS: &str = r#"
    id, sender_id, sender_name, receiver_id, job_id, content, read, created_at
"#;

const REVIEW_COLUMNS: &str = r#"
    id, homeowner_id, homeowner_name, contractor_id, job_id, rating, comment, created_at
"#;

#[async_trait]
pub trait MessageExt {
    async fn create_message(
        &self,
        sender_id: Uuid,
        sender_name: String,
        receiver_id: Uuid,
        job_id: Option<Uuid>,
        content: String,
    ) -> Result<Message, Error>;

    async fn get_messages_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<Message>, Error>;

    async fn get_conversation(
        &self,
        user_id: Uuid,
        other_user_id: Uuid,
    ) -> Result<Vec<Message>, Error>;

    async fn mark_conversation_read(&self, user_id: Uuid, other_user_id: Uuid)
        -> Result<(), Error>;

    async fn create_review(
        &self,
        homeowner_id: Uuid,
        homeowner_name: String,
        contractor_id: Uuid,
        job_id: Uuid,
        rating: i32,
        comment: String,
    ) -> Result<Review, Error>;

    async fn find_review(&self, job_id: Uuid, homeowner_id: Uuid)
        -> Result<Option<Review>, Error>;

    async fn get_reviews_for_contractor(&self, contractor_id: Uuid) -> Result<Vec<Review>, Error>;
}

#[async_trait]
impl MessageExt for DBClient {
    async fn create_message(
        &self,
        sender_id: Uuid,
        sender_name: String,
        receiver_id: Uuid,
        job_id: Option<Uuid>,
        content: String,
    ) -> Result<Message, Error> {
        sqlx::query_as::<_, Message>(&format!(
            r#"
            INSERT INTO messages (sender_id, sender_name, receiver_id, job_id, content)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(sender_id)
        .bind(sender_name)
        .bind(receiver_id)
        .bind(job_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_messages_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Message>, Error> {
        sqlx::query_as::<_, Message>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS} FROM messages
            WHERE sender_id = $1 OR receiver_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_conversation(
        &self,
        user_id: Uuid,
        other_user_id: Uuid,
    ) -> Result<Vec<Message>, Error> {
        sqlx::query_as::<_, Message>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS} FROM messages
            WHERE (sender_id = $1 AND receiver_id = $2)
               OR (sender_id = $2 AND receiver_id = $1)
            ORDER BY created_at ASC
            LIMIT 200
            "#
        ))
        .bind(user_id)
        .bind(other_user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn mark_conversation_read(
        &self,
        user_id: Uuid,
        other_user_id: Uuid,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE messages SET read = TRUE
            WHERE sender_id = $2 AND receiver_id = $1 AND read = FALSE
            "#,
        )
        .bind(user_id)
        .bind(other_user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_review(
        &self,
        homeowner_id: Uuid,
        homeowner_name: String,
        contractor_id: Uuid,
        job_id: Uuid,
        rating: i32,
        comment: String,
    ) -> Result<Review, Error> {
        sqlx::query_as::<_, Review>(&format!(
            r#"
            INSERT INTO reviews (homeowner_id, homeowner_name, contractor_id, job_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {REVIEW_COLUMNS}
            "#
        ))
        .bind(homeowner_id)
        .bind(homeowner_name)
        .bind(contractor_id)
        .bind(job_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(&self.pool)
        .await
    }

    async fn find_review(
        &self,
        job_id: Uuid,
        homeowner_id: Uuid,
    ) -> Result<Option<Review>, Error> {
        sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE job_id = $1 AND homeowner_id = $2"
        ))
        .bind(job_id)
        .bind(homeowner_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_reviews_for_contractor(&self, contractor_id: Uuid) -> Result<Vec<Review>, Error> {
        sqlx::query_as::<_, Review>(&format!(
            r#"
            SELECT {REVIEW_COLUMNS} FROM reviews
            WHERE contractor_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(contractor_id)
        .fetch_all(&self.pool)
        .await
    }
}
