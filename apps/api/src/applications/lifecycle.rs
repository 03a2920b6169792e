use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::listing::JobListingRow;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Reviewing,
    Shortlisted,
    Rejected,
    Hired,
}

/// How the candidate applied. `External` means they were redirected to the
/// recruiter's WhatsApp; only the intent is recorded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationType {
    Platform,
    External,
}

#[derive(Debug, Error, PartialEq)]
#[error("application cannot move from {from} to {to}")]
pub struct ApplicationTransitionError {
    pub from: &'static str,
    pub to: &'static str,
}

#[derive(Debug, Error, PartialEq)]
pub enum ApplyError {
    #[error("listing is not accepting applications")]
    ListingNotActive,
    #[error("listing only accepts external applications")]
    PlatformDisabled,
    #[error("authors cannot apply to their own listing")]
    OwnListing,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Reviewing,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Rejected,
        ApplicationStatus::Hired,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ApplicationStatus::Pending),
            "reviewing" => Some(ApplicationStatus::Reviewing),
            "shortlisted" => Some(ApplicationStatus::Shortlisted),
            "rejected" => Some(ApplicationStatus::Rejected),
            "hired" => Some(ApplicationStatus::Hired),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewing => "reviewing",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Hired => "hired",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Rejected | ApplicationStatus::Hired)
    }

    /// `pending → reviewing → shortlisted → hired`; rejection from any
    /// non-terminal status.
    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Pending, Reviewing) | (Reviewing, Shortlisted) | (Shortlisted, Hired) | (_, Rejected)
        )
    }

    pub fn transition_to(
        self,
        next: ApplicationStatus,
    ) -> Result<ApplicationStatus, ApplicationTransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ApplicationTransitionError {
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }
}

impl ApplicationType {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationType::Platform => "platform",
            ApplicationType::External => "external",
        }
    }
}

/// Whether `candidate_id` may apply to `listing` the given way.
pub fn check_can_apply(
    listing: &JobListingRow,
    candidate_id: uuid::Uuid,
    application_type: ApplicationType,
) -> Result<(), ApplyError> {
    if listing.author_id == candidate_id {
        return Err(ApplyError::OwnListing);
    }
    if !listing.is_active() {
        return Err(ApplyError::ListingNotActive);
    }
    if application_type == ApplicationType::Platform && !listing.accepts_platform_applications {
        return Err(ApplyError::PlatformDisabled);
    }
    Ok(())
}
