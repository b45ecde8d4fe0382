use std::str::FromStr;

use serde::Serialize;
use sqlx::FromRow;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportType {
    UserStats,
    JobStats,
    ApplicationStats,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::UserStats => "USER_STATS",
            ReportType::JobStats => "JOB_STATS",
            ReportType::ApplicationStats => "APPLICATION_STATS",
        }
    }
}

impl FromStr for ReportType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER_STATS" => Ok(ReportType::UserStats),
            "JOB_STATS" => Ok(ReportType::JobStats),
            "APPLICATION_STATS" => Ok(ReportType::ApplicationStats),
            other => Err(AppError::validation(format!("Unknown report type: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_users: i64,
    pub job_seekers: i64,
    pub employers: i64,
    pub admins: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobStats {
    pub total_jobs: i64,
    pub active_jobs: i64,
    pub expired_jobs: i64,
    pub filled_jobs: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStats {
    pub total_applications: i64,
    pub pending_applications: i64,
    pub reviewed_applications: i64,
    pub shortlisted_applications: i64,
    pub interview_applications: i64,
    pub rejected_applications: i64,
    pub accepted_applications: i64,
}
