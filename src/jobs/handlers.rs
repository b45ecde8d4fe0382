use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{
        ActionResponse, ApplyRequest, ListingFields, SaveAction, SaveJobResponse,
        UpdateApplicationStatusRequest, UpdateListingRequest,
    },
    repo_types::{Application, JobListing, ListingInput, NewApplication},
};
use crate::{
    auth::{repo_types::EmployerProfile, session::CurrentIdentity},
    error::AppError,
    extract::{ApiJson, OptionalJson},
    notifications::{self, NewNotification},
    state::AppState,
    store::Store,
};

pub fn jobs_routes() -> Router<AppState> {
    Router::new()
        .route("/api/jobs", post(create_listing))
        .route("/api/jobs/:id", put(update_listing).delete(delete_listing))
        .route("/api/jobs/:id/apply", post(apply_for_job))
        .route("/api/jobs/:id/save", post(toggle_saved_job))
        .route(
            "/api/applications/:id/status",
            put(update_application_status),
        )
}

/// Loads a listing and checks it belongs to `employer`.
async fn owned_listing(
    store: &dyn Store,
    employer: &EmployerProfile,
    listing_id: Uuid,
    failure: &'static str,
) -> Result<JobListing, AppError> {
    let listing = store
        .find_listing(listing_id)
        .await
        .map_err(AppError::storage(failure))?
        .ok_or_else(|| AppError::NotFound("Job listing not found".into()))?;
    if listing.employer_id != employer.id {
        warn!(employer_id = %employer.id, owner_id = %listing.employer_id, %listing_id, "employer does not own listing");
        return Err(AppError::unauthorized());
    }
    Ok(listing)
}

#[instrument(skip(state, identity, fields))]
pub async fn create_listing(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    ApiJson(fields): ApiJson<ListingFields>,
) -> Result<(StatusCode, Json<JobListing>), AppError> {
    const FAILED: &str = "Failed to create job listing";
    let (_, employer) = identity.employer()?;
    let input = ListingInput::try_from(fields)?;

    let listing = state
        .store
        .create_listing(employer.id, &input)
        .await
        .map_err(AppError::storage(FAILED))?;

    info!(listing_id = %listing.id, employer_id = %employer.id, "job listing created");
    Ok((StatusCode::CREATED, Json(listing)))
}

#[instrument(skip(state, identity, body))]
pub async fn update_listing(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<UpdateListingRequest>,
) -> Result<Json<JobListing>, AppError> {
    const FAILED: &str = "Failed to update job listing";
    let (_, employer) = identity.employer()?;
    let (input, status) = body.into_parts()?;
    owned_listing(state.store.as_ref(), employer, id, FAILED).await?;

    let listing = state
        .store
        .update_listing(id, &input, status)
        .await
        .map_err(AppError::storage(FAILED))?;

    info!(listing_id = %id, status = ?status, "job listing updated");
    Ok(Json(listing))
}

#[instrument(skip(state, identity))]
pub async fn delete_listing(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse>, AppError> {
    const FAILED: &str = "Failed to delete job listing";
    let (_, employer) = identity.employer()?;
    owned_listing(state.store.as_ref(), employer, id, FAILED).await?;

    state
        .store
        .delete_listing(id)
        .await
        .map_err(AppError::storage(FAILED))?;

    info!(listing_id = %id, "job listing deleted");
    Ok(Json(ActionResponse { success: true }))
}

#[instrument(skip(state, identity, body))]
pub async fn apply_for_job(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(listing_id): Path<Uuid>,
    OptionalJson(body): OptionalJson<ApplyRequest>,
) -> Result<(StatusCode, Json<Application>), AppError> {
    const FAILED: &str = "Failed to apply for job";
    let (_, seeker) = identity.job_seeker()?;
    let store = state.store.as_ref();

    let listing = store
        .find_listing(listing_id)
        .await
        .map_err(AppError::storage(FAILED))?
        .ok_or_else(|| AppError::NotFound("Job listing not found".into()))?;

    let already = || AppError::Conflict("You have already applied for this job".into());
    if store
        .find_application_for(listing_id, seeker.id)
        .await
        .map_err(AppError::storage(FAILED))?
        .is_some()
    {
        warn!(%listing_id, seeker_id = %seeker.id, "duplicate application");
        return Err(already());
    }

    // A concurrent duplicate that slipped past the check above lands here.
    let application = store
        .create_application(NewApplication {
            listing_id,
            seeker_id: seeker.id,
            cover_letter: body.cover_letter.as_deref(),
            resume_version: body.resume_version.as_deref(),
        })
        .await
        .map_err(AppError::storage(FAILED))?
        .ok_or_else(already)?;

    match store.find_employer(listing.employer_id).await {
        Ok(Some(owner)) => {
            let notification = NewNotification::new_application(owner.user_id, &listing.title);
            notifications::deliver(store, notification).await
        }
        Ok(None) => warn!(employer_id = %listing.employer_id, "listing owner missing"),
        Err(e) => warn!(error = %format!("{e:#}"), "listing owner lookup failed"),
    }

    info!(application_id = %application.id, %listing_id, "application submitted");
    Ok((StatusCode::CREATED, Json(application)))
}

#[instrument(skip(state, identity))]
pub async fn toggle_saved_job(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(listing_id): Path<Uuid>,
) -> Result<Json<SaveJobResponse>, AppError> {
    const FAILED: &str = "Failed to save job";
    let (_, seeker) = identity.job_seeker()?;
    let store = state.store.as_ref();

    if store
        .find_listing(listing_id)
        .await
        .map_err(AppError::storage(FAILED))?
        .is_none()
    {
        return Err(AppError::NotFound("Job listing not found".into()));
    }

    let existing = store
        .find_saved_job(listing_id, seeker.id)
        .await
        .map_err(AppError::storage(FAILED))?;

    let action = match existing {
        Some(saved) => {
            store
                .unsave_job(saved.id)
                .await
                .map_err(AppError::storage(FAILED))?;
            SaveAction::Unsaved
        }
        None => {
            // A concurrent save of the same pair already produced the row.
            store
                .save_job(listing_id, seeker.id)
                .await
                .map_err(AppError::storage(FAILED))?;
            SaveAction::Saved
        }
    };

    info!(%listing_id, seeker_id = %seeker.id, ?action, "saved job toggled");
    Ok(Json(SaveJobResponse {
        success: true,
        action,
    }))
}

#[instrument(skip(state, identity, body))]
pub async fn update_application_status(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(application_id): Path<Uuid>,
    ApiJson(body): ApiJson<UpdateApplicationStatusRequest>,
) -> Result<Json<Application>, AppError> {
    const FAILED: &str = "Failed to update application status";
    let (_, employer) = identity.employer()?;
    let status = body.status()?;
    let store = state.store.as_ref();

    let application = store
        .find_application(application_id)
        .await
        .map_err(AppError::storage(FAILED))?
        .ok_or_else(|| AppError::NotFound("Application not found".into()))?;
    let listing = owned_listing(store, employer, application.listing_id, FAILED).await?;

    let updated = store
        .update_application_status(application_id, status)
        .await
        .map_err(AppError::storage(FAILED))?;

    match store.find_job_seeker(application.seeker_id).await {
        Ok(Some(seeker)) => {
            notifications::deliver(
                store,
                NewNotification::application_update(seeker.user_id, &listing.title, status),
            )
            .await
        }
        Ok(None) => warn!(seeker_id = %application.seeker_id, "applicant missing"),
        Err(e) => warn!(error = %format!("{e:#}"), "applicant lookup failed"),
    }

    info!(%application_id, %status, "application status updated");
    Ok(Json(updated))
}
