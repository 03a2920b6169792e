// Job listings: creation by recruiters, the status lifecycle, and the SQL
// shared with the feed and dashboard.

pub mod handlers;
pub mod lifecycle;
pub mod queries;
