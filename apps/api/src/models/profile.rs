use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Candidate,
    Recruiter,
}

impl UserType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "candidate" => Some(UserType::Candidate),
            "recruiter" => Some(UserType::Recruiter),
            _ => None,
        }
    }
}

/// The acting user. Sub-collections are JSONB arrays whose entries carry a
/// stable `id`; see `profile::collections`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub user_type: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city_id: Option<i32>,
    pub location: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub is_verified: bool,
    pub has_experience: Option<bool>,
    pub experiences: Option<Value>,
    pub education: Option<Value>,
    pub courses: Option<Value>,
    pub skills: Vec<String>,
    pub driver_license_categories: Vec<String>,
    pub summary: Option<String>,
    pub address: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl ProfileRow {
    pub fn user_type(&self) -> Option<UserType> {
        UserType::parse(&self.user_type)
    }
}
