use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Active,
    Paused,
    Closed,
}

#[derive(Debug, Error, PartialEq)]
#[error("listing cannot move from {from} to {to}")]
pub struct ListingTransitionError {
    pub from: &'static str,
    pub to: &'static str,
}

impl ListingStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(ListingStatus::Active),
            "paused" => Some(ListingStatus::Paused),
            "closed" => Some(ListingStatus::Closed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ListingStatus::Active => "active",
            ListingStatus::Paused => "paused",
            ListingStatus::Closed => "closed",
        }
    }

    /// `active ↔ paused`, `active | paused → closed`. Closed is terminal.
    pub fn can_transition_to(self, next: ListingStatus) -> bool {
        use ListingStatus::*;
        matches!(
            (self, next),
            (Active, Paused) | (Paused, Active) | (Active, Closed) | (Paused, Closed)
        )
    }

    pub fn transition_to(
        self,
        next: ListingStatus,
    ) -> Result<ListingStatus, ListingTransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ListingTransitionError {
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }
}
