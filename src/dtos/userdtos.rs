use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::usermodel::{User, UserRole};
use crate::utils::password;

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(custom = "validate_password_strength")]
    pub password: String,

    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,

    #[validate(custom = "validate_user_type")]
    pub user_type: String,

    pub phone: Option<String>,
}

fn validate_password_strength(value: &str) -> Result<(), ValidationError> {
    if !password::is_strong_enough(value) {
        let mut error = ValidationError::new("weak_password");
        error.message =
            Some("Password must be at least 8 characters with letters and numbers".into());
        return Err(error);
    }
    Ok(())
}

fn validate_user_type(value: &str) -> Result<(), ValidationError> {
    match UserRole::from_str(value) {
        Some(UserRole::Homeowner) | Some(UserRole::Contractor) => Ok(()),
        _ => {
            let mut error = ValidationError::new("invalid_user_type");
            error.message = Some("User type must be homeowner or contractor".into());
            Err(error)
        }
    }
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateProfileDto {
    #[validate(length(min = 1, max = 255, message = "Full name must be between 1-255 characters"))]
    pub full_name: Option<String>,

    #[validate(length(min = 7, max = 50, message = "Phone must be between 7-50 characters"))]
    pub phone: Option<String>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct ContractorVerificationDto {
    #[validate(length(max = 100, message = "License number too long"))]
    pub license_number: Option<String>,

    #[validate(length(max = 255, message = "Insurance info too long"))]
    pub insurance_info: Option<String>,

    #[validate(length(max = 255, message = "Company name too long"))]
    pub company_name: Option<String>,

    #[validate(range(min = 0, max = 80, message = "Years of experience must be 0-80"))]
    pub years_experience: Option<i32>,

    #[serde(default)]
    pub specialties: Vec<String>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct PageQueryDto {
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: Option<i64>,

    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FilterUserDto {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub user_type: String,
    pub phone: Option<String>,
    pub verified: bool,
    pub verification: Option<ContractorVerificationDto>,
    pub created_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        let verification = if user.role == UserRole::Contractor {
            Some(ContractorVerificationDto {
                license_number: user.license_number.clone(),
                insurance_info: user.insurance_info.clone(),
                company_name: user.company_name.clone(),
                years_experience: user.years_experience,
                specialties: user.specialties.clone(),
            })
        } else {
            None
        };

        FilterUserDto {
            id: user.id.to_string(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            user_type: user.role.to_str().to_string(),
            phone: user.phone.clone(),
            verified: user.verified,
            verification,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponseDto {
    pub token: String,
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            data: Some(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_rejects_weak_password() {
        let dto = RegisterUserDto {
            email: "h@example.com".to_string(),
            password: "short1".to_string(),
            full_name: "Helen Owner".to_string(),
            user_type: "homeowner".to_string(),
            phone: None,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn register_rejects_admin_role() {
        let dto = RegisterUserDto {
            email: "h@example.com".to_string(),
            password: "Renovate2024".to_string(),
            full_name: "Helen Owner".to_string(),
            user_type: "admin".to_string(),
            phone: None,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn register_accepts_contractor() {
        let dto = RegisterUserDto {
            email: "c@example.com".to_string(),
            password: "Renovate2024".to_string(),
            full_name: "Carl Builder".to_string(),
            user_type: "contractor".to_string(),
            phone: Some("416-555-0123".to_string()),
        };
        assert!(dto.validate().is_ok());
    }
}
