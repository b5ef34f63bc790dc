use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Open,
    InEscrow,
    Awarded,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn to_str(&self) -> &str {
        match self {
            JobStatus::Open => "open",
            JobStatus::InEscrow => "in_escrow",
            JobStatus::Awarded => "awarded",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<JobStatus> {
        match s {
            "open" => Some(JobStatus::Open),
            "in_escrow" => Some(JobStatus::InEscrow),
            "awarded" => Some(JobStatus::Awarded),
            "completed" => Some(JobStatus::Completed),
            "cancelled" => Some(JobStatus::Cancelled),
            _ => None,
        }
    }

    /// Transition table for the job lifecycle. Admin dispute resolution is
    /// the only path that may jump from in_escrow straight to a terminal
    /// state; everything else moves one step at a time.
    pub fn can_transition_to(&self, to: JobStatus, by_admin: bool) -> bool {
        match (self, to) {
            (JobStatus::Open, JobStatus::InEscrow) => true,
            (JobStatus::Open, JobStatus::Cancelled) => true,
            (JobStatus::InEscrow, JobStatus::Awarded) => true,
            (JobStatus::Awarded, JobStatus::Completed) => true,
            (JobStatus::InEscrow, JobStatus::Completed) => by_admin,
            (JobStatus::InEscrow, JobStatus::Cancelled) => by_admin,
            (JobStatus::Awarded, JobStatus::Cancelled) => by_admin,
            _ => false,
        }
    }

    pub fn accepts_bids(&self) -> bool {
        matches!(self, JobStatus::Open | JobStatus::InEscrow)
    }

    /// Owners may delete a listing only before any money moves.
    pub fn deletable_by_owner(&self) -> bool {
        matches!(self, JobStatus::Open)
    }

    /// Admin cleanup also covers cancelled listings. Completed jobs are
    /// never deleted; the payout ledger and reviews hang off them.
    pub fn deletable_by_admin(&self) -> bool {
        matches!(self, JobStatus::Open | JobStatus::Cancelled)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "bid_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Expired,
}

impl PaymentStatus {
    pub fn to_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: Uuid,
    pub homeowner_id: Uuid,
    pub homeowner_name: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub category: String,
    pub budget_min: f64,
    pub budget_max: f64,
    pub start_date: Option<String>,
    pub images: Vec<String>,
    pub status: JobStatus,
    pub escrow_amount: Option<f64>,
    pub awarded_contractor_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: Uuid,
    pub job_id: Uuid,
    pub contractor_id: Uuid,
    pub contractor_name: String,
    pub amount: f64,
    pub message: String,
    pub estimated_days: i32,
    pub status: BidStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentTransaction {
    pub id: Uuid,
    pub session_id: String,
    pub job_id: Uuid,
    pub payer_id: Uuid,
    pub amount: f64,
    pub currency: String,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payout {
    pub id: Uuid,
    pub job_id: Uuid,
    pub contractor_id: Uuid,
    pub escrow_amount: f64,
    pub platform_fee: f64,
    pub contractor_payout: f64,
    pub status: String,
    pub resolved_by_admin: bool,
    pub released_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_moves_one_step_without_admin() {
        assert!(JobStatus::Open.can_transition_to(JobStatus::InEscrow, false));
        assert!(JobStatus::Open.can_transition_to(JobStatus::Cancelled, false));
        assert!(JobStatus::InEscrow.can_transition_to(JobStatus::Awarded, false));
        assert!(JobStatus::Awarded.can_transition_to(JobStatus::Completed, false));

        // no skipping states
        assert!(!JobStatus::Open.can_transition_to(JobStatus::Awarded, false));
        assert!(!JobStatus::Open.can_transition_to(JobStatus::Completed, false));
        assert!(!JobStatus::InEscrow.can_transition_to(JobStatus::Completed, false));
        assert!(!JobStatus::InEscrow.can_transition_to(JobStatus::Cancelled, false));

        // terminal states stay terminal
        assert!(!JobStatus::Completed.can_transition_to(JobStatus::Open, false));
        assert!(!JobStatus::Cancelled.can_transition_to(JobStatus::Open, false));
    }

    #[test]
    fn owner_may_delete_only_open_jobs() {
        assert!(JobStatus::Open.deletable_by_owner());

        for status in [
            JobStatus::InEscrow,
            JobStatus::Awarded,
            JobStatus::Completed,
            JobStatus::Cancelled,
        ] {
            assert!(!status.deletable_by_owner());
        }
    }

    #[test]
    fn admin_may_delete_open_or_cancelled_jobs() {
        assert!(JobStatus::Open.deletable_by_admin());
        assert!(JobStatus::Cancelled.deletable_by_admin());

        // escrowed jobs need resolution first; completed jobs keep their
        // payout record
        for status in [JobStatus::InEscrow, JobStatus::Awarded, JobStatus::Completed] {
            assert!(!status.deletable_by_admin());
        }
    }

    #[test]
    fn admin_may_resolve_from_escrow_or_awarded() {
        assert!(JobStatus::InEscrow.can_transition_to(JobStatus::Completed, true));
        assert!(JobStatus::InEscrow.can_transition_to(JobStatus::Cancelled, true));
        assert!(JobStatus::Awarded.can_transition_to(JobStatus::Cancelled, true));
        assert!(JobStatus::Awarded.can_transition_to(JobStatus::Completed, true));

        // not from open or terminal states
        assert!(!JobStatus::Open.can_transition_to(JobStatus::Completed, true));
        assert!(!JobStatus::Completed.can_transition_to(JobStatus::Cancelled, true));
    }

    #[test]
    fn bids_only_while_open_or_in_escrow() {
        assert!(JobStatus::Open.accepts_bids());
        assert!(JobStatus::InEscrow.accepts_bids());
        assert!(!JobStatus::Awarded.accepts_bids());
        assert!(!JobStatus::Completed.accepts_bids());
        assert!(!JobStatus::Cancelled.accepts_bids());
    }
}
