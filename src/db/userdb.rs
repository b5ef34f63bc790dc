use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::usermodel::{User, UserRole};

pub const USER_COLUMNS: &str = r#"
    id, email, password_hash, full_name, role, phone,
    license_number, insurance_info, company_name, years_experience, specialties,
    verified, suspended, created_at, updated_at
"#;

#[async_trait]
pub trait UserExt {
    async fn save_user(
        &self,
        email: String,
        password_hash: String,
        full_name: String,
        role: UserRole,
        phone: Option<String>,
    ) -> Result<User, Error>;

    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, Error>;

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        full_name: Option<String>,
        phone: Option<String>,
    ) -> Result<User, Error>;

    async fn update_contractor_verification(
        &self,
        user_id: Uuid,
        license_number: Option<String>,
        insurance_info: Option<String>,
        company_name: Option<String>,
        years_experience: Option<i32>,
        specialties: Vec<String>,
        verified: bool,
    ) -> Result<User, Error>;

    async fn set_user_verified(&self, user_id: Uuid, verified: bool) -> Result<User, Error>;

    async fn set_user_suspended(&self, user_id: Uuid, suspended: bool) -> Result<User, Error>;

    async fn get_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, Error>;

    async fn count_users(&self) -> Result<i64, Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn save_user(
        &self,
        email: String,
        password_hash: String,
        full_name: String,
        role: UserRole,
        phone: Option<String>,
    ) -> Result<User, Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, full_name, role, phone)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(password_hash)
        .bind(full_name)
        .bind(role)
        .bind(phone)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, Error> {
        if let Some(user_id) = user_id {
            sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
            ))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
        } else if let Some(email) = email {
            sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
            ))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
        } else {
            Ok(None)
        }
    }

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        full_name: Option<String>,
        phone: Option<String>,
    ) -> Result<User, Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET full_name = COALESCE($2, full_name),
                phone = COALESCE($3, phone),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(full_name)
        .bind(phone)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_contractor_verification(
        &self,
        user_id: Uuid,
        license_number: Option<String>,
        insurance_info: Option<String>,
        company_name: Option<String>,
        years_experience: Option<i32>,
        specialties: Vec<String>,
        verified: bool,
    ) -> Result<User, Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET license_number = $2,
                insurance_info = $3,
                company_name = $4,
                years_experience = $5,
                specialties = $6,
                verified = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(license_number)
        .bind(insurance_info)
        .bind(company_name)
        .bind(years_experience)
        .bind(specialties)
        .bind(verified)
        .fetch_one(&self.pool)
        .await
    }

    async fn set_user_verified(&self, user_id: Uuid, verified: bool) -> Result<User, Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET verified = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(verified)
        .fetch_one(&self.pool)
        .await
    }

    async fn set_user_suspended(&self, user_id: Uuid, suspended: bool) -> Result<User, Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET suspended = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(suspended)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn count_users(&self) -> Result<i64, Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
    }
}
