use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

/// One element of a profile sub-collection. The id is assigned at creation
/// and never reused, so edits address entries by identity, not position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileEntry<T> {
    pub id: Uuid,
    #[serde(flatten)]
    pub data: T,
}

impl<T> ProfileEntry<T> {
    pub fn new(data: T) -> Self {
        Self {
            id: Uuid::new_v4(),
            data,
        }
    }
}

/// The JSONB-backed sub-collections of a profile row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryCollection {
    Experiences,
    Education,
    Courses,
}

impl EntryCollection {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "experiences" => Some(Self::Experiences),
            "education" => Some(Self::Education),
            "courses" => Some(Self::Courses),
            _ => None,
        }
    }

    /// Column on `profiles` holding this collection.
    pub fn column(self) -> &'static str {
        match self {
            Self::Experiences => "experiences",
            Self::Education => "education",
            Self::Courses => "courses",
        }
    }
}

/// Ordered entries keyed by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryList<T> {
    entries: Vec<ProfileEntry<T>>,
}

impl<T> Default for EntryList<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> EntryList<T> {
    /// Appends `data` under a fresh id and returns that id.
    pub fn add(&mut self, data: T) -> Uuid {
        let entry = ProfileEntry::new(data);
        let id = entry.id;
        self.entries.push(entry);
        id
    }
}

impl<T: DeserializeOwned> EntryList<T> {
    /// Reads a stored JSONB array. Elements that fail to decode (legacy rows
    /// without ids, hand-edited data) are skipped with a warning.
    pub fn from_json(value: Option<&Value>) -> Self {
        let Some(Value::Array(items)) = value else {
            return Self::default();
        };
        let entries = items
            .iter()
            .filter_map(|item| match ProfileEntry::<T>::deserialize(item) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping malformed profile entry: {e}");
                    None
                }
            })
            .collect();
        Self { entries }
    }
}
