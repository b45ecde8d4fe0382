//! In-process `Store` used by the router tests.

use std::sync::Mutex;

use async_trait::async_trait;
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

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    job_seekers: Vec<JobSeekerProfile>,
    employers: Vec<EmployerProfile>,
    admins: Vec<AdminProfile>,
    listings: Vec<JobListing>,
    applications: Vec<Application>,
    saved_jobs: Vec<SavedJob>,
    notifications: Vec<NewNotification>,
    analytics: Vec<(Uuid, ReportType, serde_json::Value)>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_writes: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store poisoned")
    }

    fn check_writable(&self) -> anyhow::Result<()> {
        if *self.fail_writes.lock().expect("memory store poisoned") {
            anyhow::bail!("simulated storage outage");
        }
        Ok(())
    }

    /// Makes every subsequent write fail, to exercise storage-failure paths.
    pub fn fail_writes(&self) {
        *self.fail_writes.lock().expect("memory store poisoned") = true;
    }

    /// Admins cannot self-register, so tests create them directly.
    pub fn seed_admin(&self, email: &str) -> User {
        let mut t = self.lock();
        let user = User {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash: String::new(),
            role: Role::Admin,
            created_at: OffsetDateTime::now_utc(),
        };
        t.admins.push(AdminProfile {
            id: Uuid::new_v4(),
            user_id: user.id,
        });
        t.users.push(user.clone());
        user
    }

    /// Deletes a user row and its profiles, as an out-of-band admin action would.
    pub fn remove_user(&self, user_id: Uuid) {
        let mut t = self.lock();
        t.users.retain(|u| u.id != user_id);
        t.job_seekers.retain(|p| p.user_id != user_id);
        t.employers.retain(|p| p.user_id != user_id);
        t.admins.retain(|p| p.user_id != user_id);
    }

    pub fn employer_for_user(&self, user_id: Uuid) -> Option<EmployerProfile> {
        self.lock()
            .employers
            .iter()
            .find(|e| e.user_id == user_id)
            .cloned()
    }

    pub fn applications(&self) -> Vec<Application> {
        self.lock().applications.clone()
    }

    pub fn listings(&self) -> Vec<JobListing> {
        self.lock().listings.clone()
    }

    pub fn notifications(&self) -> Vec<NewNotification> {
        self.lock().notifications.clone()
    }

    pub fn analytics_count(&self) -> usize {
        self.lock().analytics.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_record(&self, user_id: Uuid) -> anyhow::Result<Option<UserRecord>> {
        let t = self.lock();
        let Some(user) = t.users.iter().find(|u| u.id == user_id).cloned() else {
            return Ok(None);
        };
        Ok(Some(UserRecord {
            user,
            job_seeker: t.job_seekers.iter().find(|p| p.user_id == user_id).cloned(),
            employer: t.employers.iter().find(|p| p.user_id == user_id).cloned(),
            admin: t.admins.iter().find(|p| p.user_id == user_id).cloned(),
        }))
    }

    async fn create_user(&self, new_user: NewUser<'_>) -> anyhow::Result<Option<User>> {
        self.check_writable()?;
        let mut t = self.lock();
        if t.users.iter().any(|u| u.email == new_user.email) {
            return Ok(None);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email.into(),
            password_hash: new_user.password_hash.into(),
            role: new_user.role,
            created_at: OffsetDateTime::now_utc(),
        };
        match new_user.role {
            Role::JobSeeker => t.job_seekers.push(JobSeekerProfile {
                id: Uuid::new_v4(),
                user_id: user.id,
                full_name: new_user.display_name.into(),
            }),
            Role::Employer => t.employers.push(EmployerProfile {
                id: Uuid::new_v4(),
                user_id: user.id,
                company_name: new_user.display_name.into(),
                is_approved: false,
                approval_date: None,
            }),
            Role::Admin => t.admins.push(AdminProfile {
                id: Uuid::new_v4(),
                user_id: user.id,
            }),
        }
        t.users.push(user.clone());
        Ok(Some(user))
    }

    async fn find_employer(&self, employer_id: Uuid) -> anyhow::Result<Option<EmployerProfile>> {
        Ok(self
            .lock()
            .employers
            .iter()
            .find(|e| e.id == employer_id)
            .cloned())
    }

    async fn approve_employer(
        &self,
        employer_id: Uuid,
        at: OffsetDateTime,
    ) -> anyhow::Result<EmployerProfile> {
        self.check_writable()?;
        let mut t = self.lock();
        let employer = t
            .employers
            .iter_mut()
            .find(|e| e.id == employer_id)
            .ok_or_else(|| anyhow::anyhow!("employer {employer_id} not found"))?;
        employer.is_approved = true;
        employer.approval_date = Some(at);
        Ok(employer.clone())
    }

    async fn find_job_seeker(&self, seeker_id: Uuid) -> anyhow::Result<Option<JobSeekerProfile>> {
        Ok(self
            .lock()
            .job_seekers
            .iter()
            .find(|s| s.id == seeker_id)
            .cloned())
    }

    async fn create_listing(
        &self,
        employer_id: Uuid,
        input: &ListingInput,
    ) -> anyhow::Result<JobListing> {
        self.check_writable()?;
        let listing = JobListing {
            id: Uuid::new_v4(),
            employer_id,
            title: input.title.clone(),
            description: input.description.clone(),
            location: input.location.clone(),
            salary_range: input.salary_range.clone(),
            job_type: input.job_type,
            deadline: input.deadline,
            status: JobStatus::Active,
            created_at: OffsetDateTime::now_utc(),
        };
        self.lock().listings.push(listing.clone());
        Ok(listing)
    }

    async fn find_listing(&self, listing_id: Uuid) -> anyhow::Result<Option<JobListing>> {
        Ok(self
            .lock()
            .listings
            .iter()
            .find(|l| l.id == listing_id)
            .cloned())
    }

    async fn update_listing(
        &self,
        listing_id: Uuid,
        input: &ListingInput,
        status: JobStatus,
    ) -> anyhow::Result<JobListing> {
        self.check_writable()?;
        let mut t = self.lock();
        let listing = t
            .listings
            .iter_mut()
            .find(|l| l.id == listing_id)
            .ok_or_else(|| anyhow::anyhow!("listing {listing_id} not found"))?;
        listing.title = input.title.clone();
        listing.description = input.description.clone();
        listing.location = input.location.clone();
        listing.salary_range = input.salary_range.clone();
        listing.job_type = input.job_type;
        listing.deadline = input.deadline;
        listing.status = status;
        Ok(listing.clone())
    }

    async fn delete_listing(&self, listing_id: Uuid) -> anyhow::Result<()> {
        self.check_writable()?;
        let mut t = self.lock();
        t.listings.retain(|l| l.id != listing_id);
        t.applications.retain(|a| a.listing_id != listing_id);
        t.saved_jobs.retain(|s| s.listing_id != listing_id);
        Ok(())
    }

    async fn find_application(&self, application_id: Uuid) -> anyhow::Result<Option<Application>> {
        Ok(self
            .lock()
            .applications
            .iter()
            .find(|a| a.id == application_id)
            .cloned())
    }

    async fn find_application_for(
        &self,
        listing_id: Uuid,
        seeker_id: Uuid,
    ) -> anyhow::Result<Option<Application>> {
        Ok(self
            .lock()
            .applications
            .iter()
            .find(|a| a.listing_id == listing_id && a.seeker_id == seeker_id)
            .cloned())
    }

    async fn create_application(
        &self,
        new_application: NewApplication<'_>,
    ) -> anyhow::Result<Option<Application>> {
        self.check_writable()?;
        let mut t = self.lock();
        if t.applications.iter().any(|a| {
            a.listing_id == new_application.listing_id && a.seeker_id == new_application.seeker_id
        }) {
            return Ok(None);
        }
        let application = Application {
            id: Uuid::new_v4(),
            listing_id: new_application.listing_id,
            seeker_id: new_application.seeker_id,
            cover_letter: new_application.cover_letter.map(str::to_owned),
            resume_version: new_application.resume_version.map(str::to_owned),
            status: ApplicationStatus::Pending,
            created_at: OffsetDateTime::now_utc(),
        };
        t.applications.push(application.clone());
        Ok(Some(application))
    }

    async fn update_application_status(
        &self,
        application_id: Uuid,
        status: ApplicationStatus,
    ) -> anyhow::Result<Application> {
        self.check_writable()?;
        let mut t = self.lock();
        let application = t
            .applications
            .iter_mut()
            .find(|a| a.id == application_id)
            .ok_or_else(|| anyhow::anyhow!("application {application_id} not found"))?;
        application.status = status;
        Ok(application.clone())
    }

    async fn find_saved_job(
        &self,
        listing_id: Uuid,
        seeker_id: Uuid,
    ) -> anyhow::Result<Option<SavedJob>> {
        Ok(self
            .lock()
            .saved_jobs
            .iter()
            .find(|s| s.listing_id == listing_id && s.seeker_id == seeker_id)
            .cloned())
    }

    async fn save_job(
        &self,
        listing_id: Uuid,
        seeker_id: Uuid,
    ) -> anyhow::Result<Option<SavedJob>> {
        self.check_writable()?;
        let mut t = self.lock();
        if t
            .saved_jobs
            .iter()
            .any(|s| s.listing_id == listing_id && s.seeker_id == seeker_id)
        {
            return Ok(None);
        }
        let saved = SavedJob {
            id: Uuid::new_v4(),
            listing_id,
            seeker_id,
            created_at: OffsetDateTime::now_utc(),
        };
        t.saved_jobs.push(saved.clone());
        Ok(Some(saved))
    }

    async fn unsave_job(&self, saved_job_id: Uuid) -> anyhow::Result<()> {
        self.check_writable()?;
        self.lock().saved_jobs.retain(|s| s.id != saved_job_id);
        Ok(())
    }

    async fn create_notification(&self, notification: NewNotification) -> anyhow::Result<()> {
        self.check_writable()?;
        self.lock().notifications.push(notification);
        Ok(())
    }

    async fn user_stats(&self) -> anyhow::Result<UserStats> {
        let t = self.lock();
        Ok(UserStats {
            total_users: t.users.len() as i64,
            job_seekers: t.job_seekers.len() as i64,
            employers: t.employers.len() as i64,
            admins: t.admins.len() as i64,
        })
    }

    async fn job_stats(&self) -> anyhow::Result<JobStats> {
        let t = self.lock();
        let count = |s: JobStatus| t.listings.iter().filter(|l| l.status == s).count() as i64;
        Ok(JobStats {
            total_jobs: t.listings.len() as i64,
            active_jobs: count(JobStatus::Active),
            expired_jobs: count(JobStatus::Expired),
            filled_jobs: count(JobStatus::Filled),
        })
    }

    async fn application_stats(&self) -> anyhow::Result<ApplicationStats> {
        let t = self.lock();
        let count = |s: ApplicationStatus| {
            t.applications.iter().filter(|a| a.status == s).count() as i64
        };
        Ok(ApplicationStats {
            total_applications: t.applications.len() as i64,
            pending_applications: count(ApplicationStatus::Pending),
            reviewed_applications: count(ApplicationStatus::Reviewed),
            shortlisted_applications: count(ApplicationStatus::Shortlisted),
            interview_applications: count(ApplicationStatus::Interview),
            rejected_applications: count(ApplicationStatus::Rejected),
            accepted_applications: count(ApplicationStatus::Accepted),
        })
    }

    async fn record_analytics(
        &self,
        admin_id: Uuid,
        report: ReportType,
        metrics: &serde_json::Value,
    ) -> anyhow::Result<()> {
        self.check_writable()?;
        self.lock().analytics.push((admin_id, report, metrics.clone()));
        Ok(())
    }
}
