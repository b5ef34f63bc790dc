use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::dtos::jobdtos::{JobSearchQueryDto, UpdateJobDto};
use crate::models::jobmodel::{Bid, BidStatus, Job, JobStatus};

const JOB_COLUMNS: &str = r#"
    id, homeowner_id, homeowner_name, title, description, location, category,
    budget_min, budget_max, start_date, images, status, escrow_amount,
    awarded_contractor_id, created_at
"#;

const BID_COLUMNS: &str = r#"
    id, job_id, contractor_id, contractor_name, amount, message,
    estimated_days, status, created_at
"#;

#[async_trait]
pub trait JobExt {
    async fn create_job(
        &self,
        homeowner_id: Uuid,
        homeowner_name: String,
        title: String,
        description: String,
        location: String,
        category: String,
        budget_min: f64,
        budget_max: f64,
        start_date: Option<String>,
        images: Vec<String>,
    ) -> Result<Job, Error>;

    async fn get_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>, Error>;

    async fn search_jobs(&self, query: &JobSearchQueryDto) -> Result<Vec<Job>, Error>;

    async fn get_jobs_by_homeowner(&self, homeowner_id: Uuid) -> Result<Vec<Job>, Error>;

    /// Jobs a contractor is involved in: awarded to them, or bid on by them.
    async fn get_jobs_for_contractor(&self, contractor_id: Uuid) -> Result<Vec<Job>, Error>;

    async fn update_job_fields(&self, job_id: Uuid, updates: &UpdateJobDto) -> Result<Job, Error>;

    /// Deletes a job; its bids go with it via FK cascade.
    async fn delete_job(&self, job_id: Uuid) -> Result<(), Error>;

    /// open -> in_escrow, stamping the escrow amount. Conditional on the job
    /// still being open; None means the precondition no longer held.
    async fn mark_job_in_escrow(&self, job_id: Uuid, amount: f64) -> Result<Option<Job>, Error>;

    /// The single multi-row mutation: accept one bid, reject its siblings and
    /// award the job, all inside one transaction. The job update is guarded
    /// on status = in_escrow; losing that race rolls everything back.
    async fn accept_bid_and_award(
        &self,
        job_id: Uuid,
        bid_id: Uuid,
        contractor_id: Uuid,
    ) -> Result<Option<Job>, Error>;

    /// awarded -> completed. None when the job was not awarded.
    async fn complete_job(&self, job_id: Uuid) -> Result<Option<Job>, Error>;

    /// Admin release: in_escrow/awarded -> completed.
    async fn admin_release_job(&self, job_id: Uuid) -> Result<Option<Job>, Error>;

    /// Admin refund: in_escrow/awarded -> cancelled with escrow zeroed out.
    async fn admin_refund_job(&self, job_id: Uuid) -> Result<Option<Job>, Error>;

    async fn count_bids_for_job(&self, job_id: Uuid) -> Result<i64, Error>;

    async fn create_bid(
        &self,
        job_id: Uuid,
        contractor_id: Uuid,
        contractor_name: String,
        amount: f64,
        message: String,
        estimated_days: i32,
    ) -> Result<Bid, Error>;

    async fn get_bid_by_id(&self, bid_id: Uuid) -> Result<Option<Bid>, Error>;

    async fn get_bids_for_job(&self, job_id: Uuid) -> Result<Vec<Bid>, Error>;

    async fn get_bids_by_contractor(&self, contractor_id: Uuid) -> Result<Vec<Bid>, Error>;

    async fn find_bid(&self, job_id: Uuid, contractor_id: Uuid) -> Result<Option<Bid>, Error>;

    async fn get_all_jobs(&self, limit: i64, offset: i64) -> Result<Vec<Job>, Error>;

    async fn count_jobs(&self) -> Result<i64, Error>;

    async fn count_jobs_by_homeowner_and_statuses(
        &self,
        homeowner_id: Uuid,
        statuses: &[JobStatus],
    ) -> Result<i64, Error>;

    async fn count_completed_jobs_for_contractor(&self, contractor_id: Uuid) -> Result<i64, Error>;

    async fn total_spent_by_homeowner(&self, homeowner_id: Uuid) -> Result<f64, Error>;

    async fn count_bids_by_contractor_and_status(
        &self,
        contractor_id: Uuid,
        status: Option<BidStatus>,
    ) -> Result<i64, Error>;
}

#[async_trait]
impl JobExt for DBClient {
    async fn create_job(
        &self,
        homeowner_id: Uuid,
        homeowner_name: String,
        title: String,
        description: String,
        location: String,
        category: String,
        budget_min: f64,
        budget_max: f64,
        start_date: Option<String>,
        images: Vec<String>,
    ) -> Result<Job, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            INSERT INTO jobs
            (homeowner_id, homeowner_name, title, description, location, category,
             budget_min, budget_max, start_date, images)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(homeowner_id)
        .bind(homeowner_name)
        .bind(title)
        .bind(description)
        .bind(location)
        .bind(category)
        .bind(budget_min)
        .bind(budget_max)
        .bind(start_date)
        .bind(images)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>, Error> {
        sqlx::query_as::<_, Job>(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"))
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn search_jobs(&self, query: &JobSearchQueryDto) -> Result<Vec<Job>, Error> {
        // Unfiltered status defaults to the publicly biddable set.
        let statuses: Vec<String> = match query.status.as_deref().and_then(JobStatus::from_str) {
            Some(status) => vec![status.to_str().to_string()],
            None => vec![
                JobStatus::Open.to_str().to_string(),
                JobStatus::InEscrow.to_str().to_string(),
            ],
        };

        sqlx::query_as::<_, Job>(&format!(
            r#"
            SELECT {JOB_COLUMNS} FROM jobs
            WHERE status = ANY($1::job_status[])
              AND ($2::VARCHAR IS NULL OR location = $2)
              AND ($3::VARCHAR IS NULL OR category = $3)
              AND ($4::DOUBLE PRECISION IS NULL OR budget_max >= $4)
              AND ($5::DOUBLE PRECISION IS NULL OR budget_min <= $5)
            ORDER BY created_at DESC
            LIMIT 100
            "#
        ))
        .bind(statuses)
        .bind(query.location.as_deref())
        .bind(query.category.as_deref())
        .bind(query.min_budget)
        .bind(query.max_budget)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_jobs_by_homeowner(&self, homeowner_id: Uuid) -> Result<Vec<Job>, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            SELECT {JOB_COLUMNS} FROM jobs
            WHERE homeowner_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(homeowner_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_jobs_for_contractor(&self, contractor_id: Uuid) -> Result<Vec<Job>, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            SELECT {JOB_COLUMNS} FROM jobs
            WHERE awarded_contractor_id = $1
               OR id IN (SELECT job_id FROM bids WHERE contractor_id = $1)
            ORDER BY (awarded_contractor_id = $1) DESC, created_at DESC
            "#
        ))
        .bind(contractor_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn update_job_fields(&self, job_id: Uuid, updates: &UpdateJobDto) -> Result<Job, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                location = COALESCE($4, location),
                category = COALESCE($5, category),
                budget_min = COALESCE($6, budget_min),
                budget_max = COALESCE($7, budget_max),
                start_date = COALESCE($8, start_date),
                images = COALESCE($9, images)
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(updates.title.as_deref())
        .bind(updates.description.as_deref())
        .bind(updates.location.as_deref())
        .bind(updates.category.as_deref())
        .bind(updates.budget_min)
        .bind(updates.budget_max)
        .bind(updates.start_date.as_deref())
        .bind(updates.images.as_deref())
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_job(&self, job_id: Uuid) -> Result<(), Error> {
        sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_job_in_escrow(&self, job_id: Uuid, amount: f64) -> Result<Option<Job>, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET status = 'in_escrow', escrow_amount = $2
            WHERE id = $1 AND status = 'open'
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await
    }

    async fn accept_bid_and_award(
        &self,
        job_id: Uuid,
        bid_id: Uuid,
        contractor_id: Uuid,
    ) -> Result<Option<Job>, Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE bids SET status = 'accepted' WHERE id = $1")
            .bind(bid_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE bids SET status = 'rejected' WHERE job_id = $1 AND id <> $2")
            .bind(job_id)
            .bind(bid_id)
            .execute(&mut *tx)
            .await?;

        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET status = 'awarded', awarded_contractor_id = $2
            WHERE id = $1 AND status = 'in_escrow'
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(contractor_id)
        .fetch_optional(&mut *tx)
        .await?;

        match job {
            Some(job) => {
                tx.commit().await?;
                Ok(Some(job))
            }
            None => {
                tx.rollback().await?;
                Ok(None)
            }
        }
    }

    async fn complete_job(&self, job_id: Uuid) -> Result<Option<Job>, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET status = 'completed'
            WHERE id = $1 AND status = 'awarded'
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn admin_release_job(&self, job_id: Uuid) -> Result<Option<Job>, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET status = 'completed'
            WHERE id = $1 AND status IN ('in_escrow', 'awarded')
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn admin_refund_job(&self, job_id: Uuid) -> Result<Option<Job>, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET status = 'cancelled', escrow_amount = 0
            WHERE id = $1 AND status IN ('in_escrow', 'awarded')
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn count_bids_for_job(&self, job_id: Uuid) -> Result<i64, Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bids WHERE job_id = $1")
            .bind(job_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn create_bid(
        &self,
        job_id: Uuid,
        contractor_id: Uuid,
        contractor_name: String,
        amount: f64,
        message: String,
        estimated_days: i32,
    ) -> Result<Bid, Error> {
        sqlx::query_as::<_, Bid>(&format!(
            r#"
            INSERT INTO bids
            (job_id, contractor_id, contractor_name, amount, message, estimated_days)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {BID_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(contractor_id)
        .bind(contractor_name)
        .bind(amount)
        .bind(message)
        .bind(estimated_days)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_bid_by_id(&self, bid_id: Uuid) -> Result<Option<Bid>, Error> {
        sqlx::query_as::<_, Bid>(&format!("SELECT {BID_COLUMNS} FROM bids WHERE id = $1"))
            .bind(bid_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_bids_for_job(&self, job_id: Uuid) -> Result<Vec<Bid>, Error> {
        sqlx::query_as::<_, Bid>(&format!(
            r#"
            SELECT {BID_COLUMNS} FROM bids
            WHERE job_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_bids_by_contractor(&self, contractor_id: Uuid) -> Result<Vec<Bid>, Error> {
        sqlx::query_as::<_, Bid>(&format!(
            r#"
            SELECT {BID_COLUMNS} FROM bids
            WHERE contractor_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(contractor_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn find_bid(&self, job_id: Uuid, contractor_id: Uuid) -> Result<Option<Bid>, Error> {
        sqlx::query_as::<_, Bid>(&format!(
            "SELECT {BID_COLUMNS} FROM bids WHERE job_id = $1 AND contractor_id = $2"
        ))
        .bind(job_id)
        .bind(contractor_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_all_jobs(&self, limit: i64, offset: i64) -> Result<Vec<Job>, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            SELECT {JOB_COLUMNS} FROM jobs
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn count_jobs(&self) -> Result<i64, Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM jobs")
            .fetch_one(&self.pool)
            .await
    }

    async fn count_jobs_by_homeowner_and_statuses(
        &self,
        homeowner_id: Uuid,
        statuses: &[JobStatus],
    ) -> Result<i64, Error> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.to_str().to_string()).collect();

        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM jobs WHERE homeowner_id = $1 AND status = ANY($2::job_status[])",
        )
        .bind(homeowner_id)
        .bind(statuses)
        .fetch_one(&self.pool)
        .await
    }

    async fn count_completed_jobs_for_contractor(&self, contractor_id: Uuid) -> Result<i64, Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM jobs WHERE awarded_contractor_id = $1 AND status = 'completed'",
        )
        .bind(contractor_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn total_spent_by_homeowner(&self, homeowner_id: Uuid) -> Result<f64, Error> {
        sqlx::query_scalar::<_, Option<f64>>(
            r#"
            SELECT SUM(escrow_amount) FROM jobs
            WHERE homeowner_id = $1 AND status = 'completed'
            "#,
        )
        .bind(homeowner_id)
        .fetch_one(&self.pool)
        .await
        .map(|total| total.unwrap_or(0.0))
    }

    async fn count_bids_by_contractor_and_status(
        &self,
        contractor_id: Uuid,
        status: Option<BidStatus>,
    ) -> Result<i64, Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM bids
            WHERE contractor_id = $1 AND ($2::bid_status IS NULL OR status = $2)
            "#,
        )
        .bind(contractor_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
    }
}
