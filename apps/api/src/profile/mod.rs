// Candidate profile: typed sub-collection entries with stable ids, field
// validation shared with onboarding, and the JSONB-backed store.

pub mod collections;
pub mod entries;
pub mod handlers;
pub mod store;
pub mod validation;
