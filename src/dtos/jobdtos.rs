use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::jobmodel::{Bid, Job};
use crate::dtos::userdtos::ContractorVerificationDto;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateJobDto {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1-255 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[validate(length(min = 1, message = "Location is required"))]
    pub location: String,

    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,

    #[validate(range(min = 0.0, message = "Minimum budget must be positive"))]
    pub budget_min: f64,

    #[validate(range(min = 0.0, message = "Maximum budget must be positive"))]
    pub budget_max: f64,

    pub start_date: Option<String>,

    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct UpdateJobDto {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1-255 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: Option<String>,

    pub location: Option<String>,
    pub category: Option<String>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub start_date: Option<String>,
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct JobSearchQueryDto {
    pub location: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub min_budget: Option<f64>,
    pub max_budget: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobResponseDto {
    #[serde(flatten)]
    pub job: Job,
    pub bid_count: i64,
}

impl JobResponseDto {
    pub fn from_job(job: Job, bid_count: i64) -> Self {
        Self { job, bid_count }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateBidDto {
    #[validate(range(min = 0.01, message = "Bid amount must be positive"))]
    pub amount: f64,

    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,

    #[validate(range(min = 1, max = 1095, message = "Estimated days must be between 1 and 1095"))]
    pub estimated_days: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BidWithContractorDto {
    #[serde(flatten)]
    pub bid: Bid,
    pub contractor_verified: bool,
    pub contractor_verification: Option<ContractorVerificationDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MyBidDto {
    #[serde(flatten)]
    pub bid: Bid,
    pub job_title: Option<String>,
    pub job_status: Option<String>,
    pub job_location: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct EscrowPaymentRequestDto {
    pub job_id: Uuid,

    #[validate(url(message = "origin_url must be a valid URL"))]
    pub origin_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EscrowSessionResponseDto {
    pub checkout_url: String,
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentStatusResponseDto {
    pub status: String,
    pub job_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentReleaseRequestDto {
    pub job_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentReleaseResponseDto {
    pub message: String,
    pub escrow_amount: f64,
    pub platform_fee: f64,
    pub contractor_payout: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminResolveDto {
    pub action: String,
}
