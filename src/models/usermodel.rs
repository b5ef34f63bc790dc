use chrono::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Homeowner,
    Contractor,
    Admin,
}

impl UserRole {
    pub fn to_str(&self) -> &str {
        match self {
            UserRole::Homeowner => "homeowner",
            UserRole::Contractor => "contractor",
            UserRole::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<UserRole> {
        match s {
            "homeowner" => Some(UserRole::Homeowner),
            "contractor" => Some(UserRole::Contractor),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: uuid::Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub role: UserRole,
    pub phone: Option<String>,

    // Contractor verification data
    pub license_number: Option<String>,
    pub insurance_info: Option<String>,
    pub company_name: Option<String>,
    pub years_experience: Option<i32>,
    pub specialties: Vec<String>,

    pub verified: bool,
    pub suspended: bool,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Verified iff both license and insurance are on file. An admin can
    /// force the flag through the admin verify endpoint regardless.
    pub fn derive_verified(license_number: Option<&str>, insurance_info: Option<&str>) -> bool {
        matches!(
            (license_number, insurance_info),
            (Some(l), Some(i)) if !l.is_empty() && !i.is_empty()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verified_requires_license_and_insurance() {
        assert!(User::derive_verified(Some("LIC-123"), Some("Wawanesa #88")));
        assert!(!User::derive_verified(Some("LIC-123"), None));
        assert!(!User::derive_verified(None, Some("Wawanesa #88")));
        assert!(!User::derive_verified(None, None));
        assert!(!User::derive_verified(Some(""), Some("x")));
    }

    #[test]
    fn role_round_trips_through_str() {
        for role in [UserRole::Homeowner, UserRole::Contractor, UserRole::Admin] {
            assert_eq!(UserRole::from_str(role.to_str()), Some(role));
        }
        assert_eq!(UserRole::from_str("landlord"), None);
    }
}
