pub mod application;
pub mod engagement;
pub mod listing;
pub mod profile;
