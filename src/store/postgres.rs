use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::Store;
use crate::{
    admin::repo_types::{ApplicationStats, JobStats, ReportType, UserStats},
    auth::repo_types::{
        AdminProfile, EmployerProfile, JobSeekerProfile, NewUser, Role, User, UserRecord,
    },
    jobs::repo_types::{
        Application, ApplicationStatus, JobListing, JobStatus, ListingInput, NewApplication,
        SavedJob,
    },
    notifications::NewNotification,
};

const LISTING_COLUMNS: &str = "id, employer_id, title, description, location, salary_range, \
                               job_type, deadline, status, created_at";
const APPLICATION_COLUMNS: &str =
    "id, listing_id, seeker_id, cover_letter, resume_version, status, created_at";

/// PostgreSQL-backed store. Cloning shares the pool.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_user_record(&self, user_id: Uuid) -> anyhow::Result<Option<UserRecord>> {
        let Some(user) = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?
        else {
            return Ok(None);
        };

        let job_seeker = sqlx::query_as::<_, JobSeekerProfile>(
            "SELECT id, user_id, full_name FROM job_seekers WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("load job seeker profile")?;

        let employer = sqlx::query_as::<_, EmployerProfile>(
            r#"
            SELECT id, user_id, company_name, is_approved, approval_date
            FROM employers
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("load employer profile")?;

        let admin =
            sqlx::query_as::<_, AdminProfile>("SELECT id, user_id FROM admins WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.db)
                .await
                .context("load admin profile")?;

        Ok(Some(UserRecord {
            user,
            job_seeker,
            employer,
            admin,
        }))
    }

    async fn create_user(&self, new_user: NewUser<'_>) -> anyhow::Result<Option<User>> {
        // Dropping `tx` on any early return rolls the user insert back.
        let mut tx = self.db.begin().await.context("begin tx")?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, email, password_hash, role, created_at
            "#,
        )
        .bind(new_user.email)
        .bind(new_user.password_hash)
        .bind(new_user.role)
        .fetch_optional(&mut *tx)
        .await
        .context("insert user")?;

        let Some(user) = user else {
            return Ok(None);
        };

        match new_user.role {
            Role::JobSeeker => {
                sqlx::query("INSERT INTO job_seekers (user_id, full_name) VALUES ($1, $2)")
                    .bind(user.id)
                    .bind(new_user.display_name)
                    .execute(&mut *tx)
                    .await
                    .context("insert job seeker profile")?;
            }
            Role::Employer => {
                sqlx::query("INSERT INTO employers (user_id, company_name) VALUES ($1, $2)")
                    .bind(user.id)
                    .bind(new_user.display_name)
                    .execute(&mut *tx)
                    .await
                    .context("insert employer profile")?;
            }
            Role::Admin => {
                sqlx::query("INSERT INTO admins (user_id) VALUES ($1)")
                    .bind(user.id)
                    .execute(&mut *tx)
                    .await
                    .context("insert admin profile")?;
            }
        }

        tx.commit().await.context("commit tx")?;
        Ok(Some(user))
    }

    async fn find_employer(&self, employer_id: Uuid) -> anyhow::Result<Option<EmployerProfile>> {
        let row = sqlx::query_as::<_, EmployerProfile>(
            r#"
            SELECT id, user_id, company_name, is_approved, approval_date
            FROM employers
            WHERE id = $1
            "#,
        )
        .bind(employer_id)
        .fetch_optional(&self.db)
        .await
        .context("find employer")?;
        Ok(row)
    }

    async fn approve_employer(
        &self,
        employer_id: Uuid,
        at: OffsetDateTime,
    ) -> anyhow::Result<EmployerProfile> {
        let row = sqlx::query_as::<_, EmployerProfile>(
            r#"
            UPDATE employers
               SET is_approved = TRUE, approval_date = $2
             WHERE id = $1
            RETURNING id, user_id, company_name, is_approved, approval_date
            "#,
        )
        .bind(employer_id)
        .bind(at)
        .fetch_one(&self.db)
        .await
        .context("approve employer")?;
        Ok(row)
    }

    async fn find_job_seeker(&self, seeker_id: Uuid) -> anyhow::Result<Option<JobSeekerProfile>> {
        let row = sqlx::query_as::<_, JobSeekerProfile>(
            "SELECT id, user_id, full_name FROM job_seekers WHERE id = $1",
        )
        .bind(seeker_id)
        .fetch_optional(&self.db)
        .await
        .context("find job seeker")?;
        Ok(row)
    }

    async fn create_listing(
        &self,
        employer_id: Uuid,
        input: &ListingInput,
    ) -> anyhow::Result<JobListing> {
        let sql = format!(
            r#"
            INSERT INTO job_listings
                (employer_id, title, description, location, salary_range, job_type, deadline)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {LISTING_COLUMNS}
            "#
        );
        let listing = sqlx::query_as::<_, JobListing>(&sql)
            .bind(employer_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.location)
            .bind(input.salary_range.as_deref())
            .bind(input.job_type)
            .bind(input.deadline)
            .fetch_one(&self.db)
            .await
            .context("insert job listing")?;
        Ok(listing)
    }

    async fn find_listing(&self, listing_id: Uuid) -> anyhow::Result<Option<JobListing>> {
        let sql = format!("SELECT {LISTING_COLUMNS} FROM job_listings WHERE id = $1");
        let listing = sqlx::query_as::<_, JobListing>(&sql)
            .bind(listing_id)
            .fetch_optional(&self.db)
            .await
            .context("find job listing")?;
        Ok(listing)
    }

    async fn update_listing(
        &self,
        listing_id: Uuid,
        input: &ListingInput,
        status: JobStatus,
    ) -> anyhow::Result<JobListing> {
        let sql = format!(
            r#"
            UPDATE job_listings
               SET title = $2, description = $3, location = $4, salary_range = $5,
                   job_type = $6, deadline = $7, status = $8, updated_at = now()
             WHERE id = $1
            RETURNING {LISTING_COLUMNS}
            "#
        );
        let listing = sqlx::query_as::<_, JobListing>(&sql)
            .bind(listing_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.location)
            .bind(input.salary_range.as_deref())
            .bind(input.job_type)
            .bind(input.deadline)
            .bind(status)
            .fetch_one(&self.db)
            .await
            .context("update job listing")?;
        Ok(listing)
    }

    async fn delete_listing(&self, listing_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM job_listings WHERE id = $1")
            .bind(listing_id)
            .execute(&self.db)
            .await
            .context("delete job listing")?;
        Ok(())
    }

    async fn find_application(&self, application_id: Uuid) -> anyhow::Result<Option<Application>> {
        let sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1");
        let row = sqlx::query_as::<_, Application>(&sql)
            .bind(application_id)
            .fetch_optional(&self.db)
            .await
            .context("find application")?;
        Ok(row)
    }

    async fn find_application_for(
        &self,
        listing_id: Uuid,
        seeker_id: Uuid,
    ) -> anyhow::Result<Option<Application>> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE listing_id = $1 AND seeker_id = $2"
        );
        let row = sqlx::query_as::<_, Application>(&sql)
            .bind(listing_id)
            .bind(seeker_id)
            .fetch_optional(&self.db)
            .await
            .context("find application for seeker")?;
        Ok(row)
    }

    async fn create_application(
        &self,
        new_application: NewApplication<'_>,
    ) -> anyhow::Result<Option<Application>> {
        let sql = format!(
            r#"
            INSERT INTO applications (listing_id, seeker_id, cover_letter, resume_version)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (listing_id, seeker_id) DO NOTHING
            RETURNING {APPLICATION_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, Application>(&sql)
            .bind(new_application.listing_id)
            .bind(new_application.seeker_id)
            .bind(new_application.cover_letter)
            .bind(new_application.resume_version)
            .fetch_optional(&self.db)
            .await
            .context("insert application")?;
        Ok(row)
    }

    async fn update_application_status(
        &self,
        application_id: Uuid,
        status: ApplicationStatus,
    ) -> anyhow::Result<Application> {
        let sql = format!(
            r#"
            UPDATE applications
               SET status = $2, updated_at = now()
             WHERE id = $1
            RETURNING {APPLICATION_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, Application>(&sql)
            .bind(application_id)
            .bind(status)
            .fetch_one(&self.db)
            .await
            .context("update application status")?;
        Ok(row)
    }

    async fn find_saved_job(
        &self,
        listing_id: Uuid,
        seeker_id: Uuid,
    ) -> anyhow::Result<Option<SavedJob>> {
        let row = sqlx::query_as::<_, SavedJob>(
            r#"
            SELECT id, listing_id, seeker_id, created_at
              FROM saved_jobs
             WHERE listing_id = $1 AND seeker_id = $2
            "#,
        )
        .bind(listing_id)
        .bind(seeker_id)
        .fetch_optional(&self.db)
        .await
        .context("find saved job")?;
        Ok(row)
    }

    async fn save_job(
        &self,
        listing_id: Uuid,
        seeker_id: Uuid,
    ) -> anyhow::Result<Option<SavedJob>> {
        let row = sqlx::query_as::<_, SavedJob>(
            r#"
            INSERT INTO saved_jobs (listing_id, seeker_id)
            VALUES ($1, $2)
            ON CONFLICT (listing_id, seeker_id) DO NOTHING
            RETURNING id, listing_id, seeker_id, created_at
            "#,
        )
        .bind(listing_id)
        .bind(seeker_id)
        .fetch_optional(&self.db)
        .await
        .context("insert saved job")?;
        Ok(row)
    }

    async fn unsave_job(&self, saved_job_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM saved_jobs WHERE id = $1")
            .bind(saved_job_id)
            .execute(&self.db)
            .await
            .context("delete saved job")?;
        Ok(())
    }

    async fn create_notification(&self, notification: NewNotification) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO notifications (user_id, type, message) VALUES ($1, $2, $3)")
            .bind(notification.user_id)
            .bind(notification.kind)
            .bind(&notification.message)
            .execute(&self.db)
            .await
            .context("insert notification")?;
        Ok(())
    }

    async fn user_stats(&self) -> anyhow::Result<UserStats> {
        let stats = sqlx::query_as::<_, UserStats>(
            r#"
            SELECT (SELECT COUNT(*) FROM users)       AS total_users,
                   (SELECT COUNT(*) FROM job_seekers) AS job_seekers,
                   (SELECT COUNT(*) FROM employers)   AS employers,
                   (SELECT COUNT(*) FROM admins)      AS admins
            "#,
        )
        .fetch_one(&self.db)
        .await
        .context("count users")?;
        Ok(stats)
    }

    async fn job_stats(&self) -> anyhow::Result<JobStats> {
        let stats = sqlx::query_as::<_, JobStats>(
            r#"
            SELECT COUNT(*)                                     AS total_jobs,
                   COUNT(*) FILTER (WHERE status = 'ACTIVE')    AS active_jobs,
                   COUNT(*) FILTER (WHERE status = 'EXPIRED')   AS expired_jobs,
                   COUNT(*) FILTER (WHERE status = 'FILLED')    AS filled_jobs
              FROM job_listings
            "#,
        )
        .fetch_one(&self.db)
        .await
        .context("count job listings")?;
        Ok(stats)
    }

    async fn application_stats(&self) -> anyhow::Result<ApplicationStats> {
        let stats = sqlx::query_as::<_, ApplicationStats>(
            r#"
            SELECT COUNT(*)                                       AS total_applications,
                   COUNT(*) FILTER (WHERE status = 'PENDING')     AS pending_applications,
                   COUNT(*) FILTER (WHERE status = 'REVIEWED')    AS reviewed_applications,
                   COUNT(*) FILTER (WHERE status = 'SHORTLISTED') AS shortlisted_applications,
                   COUNT(*) FILTER (WHERE status = 'INTERVIEW')   AS interview_applications,
                   COUNT(*) FILTER (WHERE status = 'REJECTED')    AS rejected_applications,
                   COUNT(*) FILTER (WHERE status = 'ACCEPTED')    AS accepted_applications
              FROM applications
            "#,
        )
        .fetch_one(&self.db)
        .await
        .context("count applications")?;
        Ok(stats)
    }

    async fn record_analytics(
        &self,
        admin_id: Uuid,
        report: ReportType,
        metrics: &serde_json::Value,
    ) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO analytics (admin_id, report_type, metrics) VALUES ($1, $2, $3)")
            .bind(admin_id)
            .bind(report.as_str())
            .bind(Json(metrics))
            .execute(&self.db)
            .await
            .context("insert analytics")?;
        Ok(())
    }
}
