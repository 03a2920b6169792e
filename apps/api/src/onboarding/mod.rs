// Candidate onboarding: a fixed sequence of steps, each validated by its own
// entry in the step table and persisted as a disjoint partial update. The
// server keeps each user's wizard, so steps are accepted strictly in order.

pub mod handlers;
pub mod sessions;
pub mod steps;
pub mod wizard;
