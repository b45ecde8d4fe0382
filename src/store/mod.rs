use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    admin::repo_types::{ApplicationStats, JobStats, ReportType, UserStats},
    auth::repo_types::{EmployerProfile, JobSeekerProfile, NewUser, User, UserRecord},
    jobs::repo_types::{
        Application, ApplicationStatus, JobListing, JobStatus, ListingInput, NewApplication,
        SavedJob,
    },
    notifications::NewNotification,
};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

/// Persistence boundary used by every handler.
///
/// Insert methods that can collide with a unique constraint return `Ok(None)`
/// on collision instead of an error.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_user_record(&self, user_id: Uuid) -> anyhow::Result<Option<UserRecord>>;
    /// Inserts the user and its role profile in one transaction.
    async fn create_user(&self, new_user: NewUser<'_>) -> anyhow::Result<Option<User>>;

    async fn find_employer(&self, employer_id: Uuid) -> anyhow::Result<Option<EmployerProfile>>;
    async fn approve_employer(
        &self,
        employer_id: Uuid,
        at: OffsetDateTime,
    ) -> anyhow::Result<EmployerProfile>;
    async fn find_job_seeker(&self, seeker_id: Uuid) -> anyhow::Result<Option<JobSeekerProfile>>;

    async fn create_listing(
        &self,
        employer_id: Uuid,
        input: &ListingInput,
    ) -> anyhow::Result<JobListing>;
    async fn find_listing(&self, listing_id: Uuid) -> anyhow::Result<Option<JobListing>>;
    async fn update_listing(
        &self,
        listing_id: Uuid,
        input: &ListingInput,
        status: JobStatus,
    ) -> anyhow::Result<JobListing>;
    async fn delete_listing(&self, listing_id: Uuid) -> anyhow::Result<()>;

    async fn find_application(&self, application_id: Uuid) -> anyhow::Result<Option<Application>>;
    async fn find_application_for(
        &self,
        listing_id: Uuid,
        seeker_id: Uuid,
    ) -> anyhow::Result<Option<Application>>;
    async fn create_application(
        &self,
        new_application: NewApplication<'_>,
    ) -> anyhow::Result<Option<Application>>;
    async fn update_application_status(
        &self,
        application_id: Uuid,
        status: ApplicationStatus,
    ) -> anyhow::Result<Application>;

    async fn find_saved_job(
        &self,
        listing_id: Uuid,
        seeker_id: Uuid,
    ) -> anyhow::Result<Option<SavedJob>>;
    async fn save_job(&self, listing_id: Uuid, seeker_id: Uuid)
        -> anyhow::Result<Option<SavedJob>>;
    async fn unsave_job(&self, saved_job_id: Uuid) -> anyhow::Result<()>;

    async fn create_notification(&self, notification: NewNotification) -> anyhow::Result<()>;

    async fn user_stats(&self) -> anyhow::Result<UserStats>;
    async fn job_stats(&self) -> anyhow::Result<JobStats>;
    async fn application_stats(&self) -> anyhow::Result<ApplicationStats>;
    async fn record_analytics(
        &self,
        admin_id: Uuid,
        report: ReportType,
        metrics: &serde_json::Value,
    ) -> anyhow::Result<()>;
}
