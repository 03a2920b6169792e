// Public job feed: filtering, importance ranking and incremental reveal.
// Ranking happens once per snapshot over the full filtered set; pages are
// prefixes of that stored ranking, never independently sorted slices.

pub mod filters;
pub mod handlers;
pub mod reveal;
pub mod scoring;
pub mod session;
pub mod snapshots;
