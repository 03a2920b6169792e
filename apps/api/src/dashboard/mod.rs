// Recruiter dashboard: listing and application statistics.

pub mod handlers;
pub mod stats;
