// Engagement signals on listings: daily-deduplicated views, like toggles and
// comments. Counters are adjusted by single-statement store primitives.

pub mod comments;
pub mod handlers;
pub mod likes;
pub mod optimistic;
pub mod store;
pub mod views;
