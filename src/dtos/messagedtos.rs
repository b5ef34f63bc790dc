use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::messagemodel::Review;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateMessageDto {
    pub receiver_id: Uuid,

    pub job_id: Option<Uuid>,

    #[validate(length(min = 1, max = 5000, message = "Message content must be 1-5000 characters"))]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationDto {
    pub user_id: Uuid,
    pub user_name: String,
    pub user_type: String,
    pub last_message: String,
    pub last_message_time: chrono::DateTime<chrono::Utc>,
    pub unread_count: i64,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateReviewDto {
    pub contractor_id: Uuid,

    pub job_id: Uuid,

    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    #[validate(length(min = 1, max = 2000, message = "Comment must be 1-2000 characters"))]
    pub comment: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContractorReviewsDto {
    pub reviews: Vec<Review>,
    pub average_rating: f64,
    pub total_reviews: i64,
}
