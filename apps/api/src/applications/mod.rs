// Job applications: the candidate-side apply flow and the recruiter-side
// review pipeline.

pub mod handlers;
pub mod lifecycle;
pub mod queries;
