use serde::{Deserialize, Serialize};
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
};

use super::repo_types::{ApplicationStatus, JobStatus, ListingInput};
use crate::error::AppError;

/// Editable listing fields as submitted by the employer form.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingFields {
    pub title: String,
    pub description: String,
    pub location: String,
    #[serde(default)]
    pub salary_range: Option<String>,
    pub job_type: String,
    /// RFC 3339 timestamp or a plain `YYYY-MM-DD` date (midnight UTC).
    pub deadline: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListingRequest {
    #[serde(flatten)]
    pub fields: ListingFields,
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    #[serde(default)]
    pub cover_letter: Option<String>,
    #[serde(default)]
    pub resume_version: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateApplicationStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveAction {
    Saved,
    Unsaved,
}

#[derive(Debug, Serialize)]
pub struct SaveJobResponse {
    pub success: bool,
    pub action: SaveAction,
}

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

pub(crate) fn parse_deadline(raw: &str) -> Result<OffsetDateTime, AppError> {
    let raw = raw.trim();
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(ts);
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map(|d| d.midnight().assume_utc())
        .map_err(|_| AppError::validation("Invalid deadline"))
}

impl TryFrom<ListingFields> for ListingInput {
    type Error = AppError;

    fn try_from(f: ListingFields) -> Result<Self, Self::Error> {
        Ok(Self {
            title: required(&f.title, "Title")?,
            description: required(&f.description, "Description")?,
            location: required(&f.location, "Location")?,
            salary_range: f
                .salary_range
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            job_type: f.job_type.parse()?,
            deadline: parse_deadline(&f.deadline)?,
        })
    }
}

impl UpdateListingRequest {
    pub fn into_parts(self) -> Result<(ListingInput, JobStatus), AppError> {
        let status = self.status.parse()?;
        Ok((self.fields.try_into()?, status))
    }
}

impl UpdateApplicationStatusRequest {
    pub fn status(&self) -> Result<ApplicationStatus, AppError> {
        self.status.parse()
    }
}
