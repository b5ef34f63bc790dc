use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::{
        db::DBClient,
        jobdb::JobExt,
        paymentdb::PaymentExt,
    },
    models::{
        jobmodel::{Bid, Job, JobStatus, PaymentStatus, Payout},
        usermodel::{User, UserRole},
    },
    service::{
        error::ServiceError,
        payment_provider::{StripeCheckout, WebhookEvent},
    },
};

/// Outcome of a payment confirmation, reported to the poller or webhook.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConfirmationResult {
    pub status: String,
    pub job_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolveAction {
    ReleaseToContractor,
    RefundToHomeowner,
}

impl ResolveAction {
    pub fn parse(action: &str) -> Result<Self, ServiceError> {
        match action {
            "release_to_contractor" => Ok(ResolveAction::ReleaseToContractor),
            "refund_to_homeowner" => Ok(ResolveAction::RefundToHomeowner),
            other => Err(ServiceError::Validation(format!(
                "Unknown resolution action: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub job: Job,
    pub payout: Option<Payout>,
}

/// Splits the escrow between the platform and the contractor.
pub fn compute_payout(escrow_amount: f64, fee_percent: f64) -> (f64, f64) {
    let platform_fee = escrow_amount * fee_percent / 100.0;
    let contractor_payout = escrow_amount - platform_fee;
    (platform_fee, contractor_payout)
}

/// Orchestrates the escrow flow: checkout session creation, payment
/// confirmation, bid acceptance, payout release and admin dispute
/// resolution. Every job transition here is a conditional update keyed on
/// the current status, so concurrent attempts fail cleanly instead of
/// double-applying.
#[derive(Debug, Clone)]
pub struct EscrowService {
    db_client: Arc<DBClient>,
    provider: Arc<StripeCheckout>,
    fee_percent: f64,
    currency: String,
}

impl EscrowService {
    pub fn new(
        db_client: Arc<DBClient>,
        provider: Arc<StripeCheckout>,
        fee_percent: f64,
        currency: String,
    ) -> Self {
        Self {
            db_client,
            provider,
            fee_percent,
            currency,
        }
    }

    /// Creates a hosted checkout session for the job's full budget_max and
    /// records a pending transaction keyed by the provider's session id.
    pub async fn create_escrow_session(
        &self,
        job_id: Uuid,
        payer: &User,
        origin_url: &str,
    ) -> Result<(String, String), ServiceError> {
        let job = self
            .db_client
            .get_job_by_id(job_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Job".to_string()))?;

        if job.homeowner_id != payer.id {
            return Err(ServiceError::Forbidden("Not your job".to_string()));
        }
        if job.status != JobStatus::Open {
            return Err(ServiceError::InvalidState(
                "Job already has payment or is closed".to_string(),
            ));
        }

        // The escrow charge is always the full budget ceiling, never a
        // homeowner-chosen figure.
        let amount = job.budget_max;

        let success_url = format!(
            "{}/payment-success?session_id={{CHECKOUT_SESSION_ID}}",
            origin_url
        );
        let cancel_url = format!("{}/jobs/{}", origin_url, job_id);

        let session = self
            .provider
            .create_checkout_session(
                amount,
                &self.currency,
                &success_url,
                &cancel_url,
                &job_id.to_string(),
                &payer.id.to_string(),
            )
            .await?;

        self.db_client
            .create_transaction(
                session.session_id.clone(),
                job_id,
                payer.id,
                amount,
                self.currency.clone(),
            )
            .await?;

        tracing::info!(
            job_id = %job_id,
            session_id = %session.session_id,
            amount,
            "escrow checkout session created"
        );

        Ok((session.url, session.session_id))
    }

    /// Polling path. Degrades to the last-known transaction status when the
    /// provider cannot be reached, rather than failing the request.
    pub async fn confirm_payment(
        &self,
        session_id: &str,
    ) -> Result<ConfirmationResult, ServiceError> {
        let transaction = self
            .db_client
            .get_transaction_by_session(session_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Transaction".to_string()))?;

        // Idempotent short-circuit: once paid, stay paid.
        if transaction.payment_status == PaymentStatus::Paid {
            return Ok(ConfirmationResult {
                status: "paid".to_string(),
                job_id: transaction.job_id,
            });
        }

        let checkout_status = match self.provider.get_checkout_status(session_id).await {
            Ok(status) => status,
            Err(e) => {
                tracing::error!("error checking payment status: {}", e);
                return Ok(ConfirmationResult {
                    status: transaction.payment_status.to_str().to_string(),
                    job_id: transaction.job_id,
                });
            }
        };

        if checkout_status.payment_status == "paid" {
            self.apply_paid(session_id).await?;
            Ok(ConfirmationResult {
                status: "paid".to_string(),
                job_id: transaction.job_id,
            })
        } else if checkout_status.status == "expired" {
            self.db_client.mark_transaction_expired(session_id).await?;
            Ok(ConfirmationResult {
                status: "expired".to_string(),
                job_id: transaction.job_id,
            })
        } else {
            Ok(ConfirmationResult {
                status: "pending".to_string(),
                job_id: transaction.job_id,
            })
        }
    }

    /// Webhook path. Shares the idempotent core with the poller; a race
    /// between the two cannot double-apply the job update because only the
    /// caller that wins the pending -> paid flip touches the job.
    pub async fn handle_webhook_event(&self, event: &WebhookEvent) -> Result<(), ServiceError> {
        if event.payment_status != "paid" {
            tracing::debug!(
                session_id = %event.session_id,
                payment_status = %event.payment_status,
                "ignoring webhook event without payment"
            );
            return Ok(());
        }

        if self
            .db_client
            .get_transaction_by_session(&event.session_id)
            .await?
            .is_none()
        {
            tracing::warn!(session_id = %event.session_id, "webhook for unknown session");
            return Ok(());
        }

        self.apply_paid(&event.session_id).await
    }

    /// Idempotent core of payment confirmation. The pending -> paid flip is
    /// a conditional update; only its winner marks the job in escrow.
    async fn apply_paid(&self, session_id: &str) -> Result<(), ServiceError> {
        let Some(transaction) = self.db_client.mark_transaction_paid(session_id).await? else {
            // Someone else already applied this confirmation.
            return Ok(());
        };

        match self
            .db_client
            .mark_job_in_escrow(transaction.job_id, transaction.amount)
            .await?
        {
            Some(job) => {
                tracing::info!(
                    job_id = %job.id,
                    escrow_amount = transaction.amount,
                    "job moved to escrow"
                );
            }
            None => {
                // Transaction won the flip but the job already left open.
                tracing::warn!(
                    job_id = %transaction.job_id,
                    "payment confirmed but job was not open"
                );
            }
        }

        Ok(())
    }

    /// Accepts one bid and rejects the rest as a single batch; the job must
    /// still be in escrow and the caller must own it.
    pub async fn accept_bid(&self, bid_id: Uuid, caller: &User) -> Result<Job, ServiceError> {
        let bid = self
            .db_client
            .get_bid_by_id(bid_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Bid".to_string()))?;

        let job = self
            .db_client
            .get_job_by_id(bid.job_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Job".to_string()))?;

        if job.homeowner_id != caller.id {
            return Err(ServiceError::Forbidden("Not your job".to_string()));
        }
        if job.status != JobStatus::InEscrow {
            return Err(ServiceError::InvalidState(
                "Payment must be in escrow before accepting bid".to_string(),
            ));
        }

        let awarded = self
            .db_client
            .accept_bid_and_award(job.id, bid.id, bid.contractor_id)
            .await?
            .ok_or_else(|| {
                // Lost the race; the precondition no longer holds.
                ServiceError::InvalidState(
                    "Payment must be in escrow before accepting bid".to_string(),
                )
            })?;

        tracing::info!(
            job_id = %awarded.id,
            contractor_id = %bid.contractor_id,
            "bid accepted, job awarded"
        );

        Ok(awarded)
    }

    /// Releases escrow to the awarded contractor and appends the payout.
    pub async fn release_payment(
        &self,
        job_id: Uuid,
        caller: &User,
    ) -> Result<Payout, ServiceError> {
        let job = self
            .db_client
            .get_job_by_id(job_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Job".to_string()))?;

        if job.homeowner_id != caller.id {
            return Err(ServiceError::Forbidden("Not your job".to_string()));
        }

        if !job.status.can_transition_to(JobStatus::Completed, false) {
            return Err(ServiceError::InvalidState(
                "Job must be awarded before releasing payment".to_string(),
            ));
        }

        // The conditional update is still the authority under concurrency.
        let completed = self.db_client.complete_job(job_id).await?.ok_or_else(|| {
            ServiceError::InvalidState(
                "Job must be awarded before releasing payment".to_string(),
            )
        })?;

        self.append_payout(&completed, false).await
    }

    /// Admin dispute resolution: either release to the contractor or refund
    /// the homeowner, bypassing the owner entirely.
    pub async fn admin_resolve(
        &self,
        job_id: Uuid,
        action: ResolveAction,
    ) -> Result<ResolutionResult, ServiceError> {
        let job = self
            .db_client
            .get_job_by_id(job_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Job".to_string()))?;

        match action {
            ResolveAction::ReleaseToContractor => {
                if job.awarded_contractor_id.is_none() {
                    return Err(ServiceError::Validation(
                        "Cannot release: no contractor awarded".to_string(),
                    ));
                }

                let completed =
                    self.db_client.admin_release_job(job_id).await?.ok_or_else(|| {
                        ServiceError::InvalidState(
                            "Job is not in escrow or awarded".to_string(),
                        )
                    })?;

                let payout = self.append_payout(&completed, true).await?;
                Ok(ResolutionResult {
                    job: completed,
                    payout: Some(payout),
                })
            }
            ResolveAction::RefundToHomeowner => {
                let cancelled =
                    self.db_client.admin_refund_job(job_id).await?.ok_or_else(|| {
                        ServiceError::InvalidState(
                            "Job is not in escrow or awarded".to_string(),
                        )
                    })?;

                tracing::info!(job_id = %cancelled.id, "escrow refunded to homeowner");
                Ok(ResolutionResult {
                    job: cancelled,
                    payout: None,
                })
            }
        }
    }

    async fn append_payout(&self, job: &Job, resolved_by_admin: bool) -> Result<Payout, ServiceError> {
        let contractor_id = job.awarded_contractor_id.ok_or_else(|| {
            ServiceError::InvalidState("Job has no awarded contractor".to_string())
        })?;
        let escrow_amount = job.escrow_amount.unwrap_or(0.0);
        let (platform_fee, contractor_payout) = compute_payout(escrow_amount, self.fee_percent);

        let payout = self
            .db_client
            .create_payout(
                job.id,
                contractor_id,
                escrow_amount,
                platform_fee,
                contractor_payout,
                resolved_by_admin,
            )
            .await?;

        tracing::info!(
            job_id = %job.id,
            contractor_id = %contractor_id,
            escrow_amount,
            platform_fee,
            contractor_payout,
            resolved_by_admin,
            "payment released"
        );

        Ok(payout)
    }
}

/// Submit-side checks for the bid ledger, kept next to the escrow flow since
/// they gate the same lifecycle.
pub fn check_bid_submission(
    job: &Job,
    contractor: &User,
    existing_bid: Option<&Bid>,
) -> Result<(), ServiceError> {
    if contractor.role != UserRole::Contractor {
        return Err(ServiceError::Forbidden(
            "Only contractors can bid".to_string(),
        ));
    }
    if !job.status.accepts_bids() {
        return Err(ServiceError::InvalidState(
            "Job is not accepting bids".to_string(),
        ));
    }
    if existing_bid.is_some() {
        return Err(ServiceError::Conflict(
            "You already bid on this job".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn job_with_status(status: JobStatus) -> Job {
        Job {
            id: Uuid::new_v4(),
            homeowner_id: Uuid::new_v4(),
            homeowner_name: "Helen Owner".to_string(),
            title: "Kitchen reno".to_string(),
            description: "Full gut".to_string(),
            location: "Toronto".to_string(),
            category: "Kitchen Renovation".to_string(),
            budget_min: 1000.0,
            budget_max: 5000.0,
            start_date: None,
            images: vec![],
            status,
            escrow_amount: None,
            awarded_contractor_id: None,
            created_at: Utc::now(),
        }
    }

    fn contractor() -> User {
        User {
            id: Uuid::new_v4(),
            email: "c@example.com".to_string(),
            password_hash: "x".to_string(),
            full_name: "Carl Builder".to_string(),
            role: UserRole::Contractor,
            phone: None,
            license_number: None,
            insurance_info: None,
            company_name: None,
            years_experience: None,
            specialties: vec![],
            verified: false,
            suspended: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn payout_math() {
        let (fee, payout) = compute_payout(1000.0, 10.0);
        assert_eq!(fee, 100.0);
        assert_eq!(payout, 900.0);

        let (fee, payout) = compute_payout(5000.0, 10.0);
        assert_eq!(fee, 500.0);
        assert_eq!(payout, 4500.0);

        let (fee, payout) = compute_payout(0.0, 10.0);
        assert_eq!(fee, 0.0);
        assert_eq!(payout, 0.0);
    }

    #[test]
    fn resolve_action_parsing() {
        assert_eq!(
            ResolveAction::parse("release_to_contractor").unwrap(),
            ResolveAction::ReleaseToContractor
        );
        assert_eq!(
            ResolveAction::parse("refund_to_homeowner").unwrap(),
            ResolveAction::RefundToHomeowner
        );
        assert!(matches!(
            ResolveAction::parse("split_the_difference"),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn bid_allowed_while_open_and_in_escrow() {
        let contractor = contractor();
        assert!(check_bid_submission(&job_with_status(JobStatus::Open), &contractor, None).is_ok());
        assert!(
            check_bid_submission(&job_with_status(JobStatus::InEscrow), &contractor, None).is_ok()
        );
    }

    #[test]
    fn bid_rejected_after_award() {
        let contractor = contractor();
        for status in [JobStatus::Awarded, JobStatus::Completed, JobStatus::Cancelled] {
            assert!(matches!(
                check_bid_submission(&job_with_status(status), &contractor, None),
                Err(ServiceError::InvalidState(_))
            ));
        }
    }

    #[test]
    fn duplicate_bid_is_a_conflict() {
        let contractor = contractor();
        let job = job_with_status(JobStatus::Open);
        let existing = Bid {
            id: Uuid::new_v4(),
            job_id: job.id,
            contractor_id: contractor.id,
            contractor_name: contractor.full_name.clone(),
            amount: 4000.0,
            message: "Can start Monday".to_string(),
            estimated_days: 14,
            status: crate::models::jobmodel::BidStatus::Pending,
            created_at: Utc::now(),
        };
        assert!(matches!(
            check_bid_submission(&job, &contractor, Some(&existing)),
            Err(ServiceError::Conflict(_))
        ));
    }

    #[test]
    fn homeowner_cannot_bid() {
        let mut user = contractor();
        user.role = UserRole::Homeowner;
        assert!(matches!(
            check_bid_submission(&job_with_status(JobStatus::Open), &user, None),
            Err(ServiceError::Forbidden(_))
        ));
    }
}
