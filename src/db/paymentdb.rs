use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::jobmodel::{PaymentTransaction, Payout};

const TRANSACTION_COLUMNS: &str = r#"
    id, session_id, job_id, payer_id, amount, currency, payment_status, created_at
"#;

const PAYOUT_COLUMNS: &str = r#"
    id, job_id, contractor_id, escrow_amount, platform_fee, contractor_payout,
    status, resolved_by_admin, released_at
"#;

#[async_trait]
pub trait PaymentExt {
    async fn create_transaction(
        &self,
        session_id: String,
        job_id: Uuid,
        payer_id: Uuid,
        amount: f64,
        currency: String,
    ) -> Result<PaymentTransaction, Error>;

    async fn get_transaction_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<PaymentTransaction>, Error>;

    /// Flips pending -> paid. The WHERE clause is the idempotency guard:
    /// a second confirmation finds no unpaid row and gets None back.
    async fn mark_transaction_paid(
        &self,
        session_id: &str,
    ) -> Result<Option<PaymentTransaction>, Error>;

    async fn mark_transaction_expired(
        &self,
        session_id: &str,
    ) -> Result<Option<PaymentTransaction>, Error>;

    async fn create_payout(
        &self,
        job_id: Uuid,
        contractor_id: Uuid,
        escrow_amount: f64,
        platform_fee: f64,
        contractor_payout: f64,
        resolved_by_admin: bool,
    ) -> Result<Payout, Error>;

    async fn total_earnings_for_contractor(&self, contractor_id: Uuid) -> Result<f64, Error>;

    async fn get_all_transactions(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PaymentTransaction>, Error>;

    async fn total_platform_fees(&self) -> Result<f64, Error>;
}

#[async_trait]
impl PaymentExt for DBClient {
    async fn create_transaction(
        &self,
        session_id: String,
        job_id: Uuid,
        payer_id: Uuid,
        amount: f64,
        currency: String,
    ) -> Result<PaymentTransaction, Error> {
        sqlx::query_as::<_, PaymentTransaction>(&format!(
            r#"
            INSERT INTO payment_transactions (session_id, job_id, payer_id, amount, currency)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(session_id)
        .bind(job_id)
        .bind(payer_id)
        .bind(amount)
        .bind(currency)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_transaction_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<PaymentTransaction>, Error> {
        sqlx::query_as::<_, PaymentTransaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM payment_transactions WHERE session_id = $1"
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn mark_transaction_paid(
        &self,
        session_id: &str,
    ) -> Result<Option<PaymentTransaction>, Error> {
        sqlx::query_as::<_, PaymentTransaction>(&format!(
            r#"
            UPDATE payment_transactions
            SET payment_status = 'paid'
            WHERE session_id = $1 AND payment_status <> 'paid'
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn mark_transaction_expired(
        &self,
        session_id: &str,
    ) -> Result<Option<PaymentTransaction>, Error> {
        sqlx::query_as::<_, PaymentTransaction>(&format!(
            r#"
            UPDATE payment_transactions
            SET payment_status = 'expired'
            WHERE session_id = $1 AND payment_status = 'pending'
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_payout(
        &self,
        job_id: Uuid,
        contractor_id: Uuid,
        escrow_amount: f64,
        platform_fee: f64,
        contractor_payout: f64,
        resolved_by_admin: bool,
    ) -> Result<Payout, Error> {
        sqlx::query_as::<_, Payout>(&format!(
            r#"
            INSERT INTO payouts
            (job_id, contractor_id, escrow_amount, platform_fee, contractor_payout, resolved_by_admin)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PAYOUT_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(contractor_id)
        .bind(escrow_amount)
        .bind(platform_fee)
        .bind(contractor_payout)
        .bind(resolved_by_admin)
        .fetch_one(&self.pool)
        .await
    }

    async fn total_earnings_for_contractor(&self, contractor_id: Uuid) -> Result<f64, Error> {
        sqlx::query_scalar::<_, Option<f64>>(
            r#"
            SELECT SUM(contractor_payout) FROM payouts
            WHERE contractor_id = $1 AND status = 'released'
            "#,
        )
        .bind(contractor_id)
        .fetch_one(&self.pool)
        .await
        .map(|total| total.unwrap_or(0.0))
    }

    async fn get_all_transactions(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PaymentTransaction>, Error> {
        sqlx::query_as::<_, PaymentTransaction>(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS} FROM payment_transactions
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn total_platform_fees(&self) -> Result<f64, Error> {
        sqlx::query_scalar::<_, Option<f64>>("SELECT SUM(platform_fee) FROM payouts")
            .fetch_one(&self.pool)
            .await
            .map(|total| total.unwrap_or(0.0))
    }
}
