use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{jobs::repo_types::ApplicationStatus, store::Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    NewApplication,
    ApplicationUpdate,
    AccountApproved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub kind: NotificationType,
    pub message: String,
}

impl NewNotification {
    pub fn new_application(employer_user_id: Uuid, listing_title: &str) -> Self {
        Self {
            user_id: employer_user_id,
            kind: NotificationType::NewApplication,
            message: format!("New application received for {listing_title}"),
        }
    }

    pub fn application_update(
        seeker_user_id: Uuid,
        listing_title: &str,
        status: ApplicationStatus,
    ) -> Self {
        Self {
            user_id: seeker_user_id,
            kind: NotificationType::ApplicationUpdate,
            message: format!(
                "Your application for {listing_title} has been updated to {status}"
            ),
        }
    }

    pub fn account_approved(employer_user_id: Uuid) -> Self {
        Self {
            user_id: employer_user_id,
            kind: NotificationType::AccountApproved,
            message: "Your employer account has been approved. You can now post job listings."
                .into(),
        }
    }
}

/// Stores a notification after the action it reports has been committed.
/// Failures are logged and swallowed so they never undo or fail that action.
pub async fn deliver(store: &dyn Store, notification: NewNotification) {
    let user_id = notification.user_id;
    let kind = notification.kind;
    match store.create_notification(notification).await {
        Ok(()) => debug!(%user_id, ?kind, "notification stored"),
        Err(e) => warn!(error = %format!("{e:#}"), %user_id, ?kind, "notification insert failed"),
    }
}
