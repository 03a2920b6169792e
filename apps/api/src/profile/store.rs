//! Profile persistence behind a trait seam.
//!
//! Sub-collection edits are single JSONB statements keyed on the entry `id`,
//! so two concurrent edits to different entries cannot overwrite each other.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::profile::ProfileRow;
use crate::onboarding::steps::ProfilePatch;
use crate::profile::collections::EntryCollection;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Writes exactly the fields carried by `patch`.
    async fn apply_patch(&self, user_id: Uuid, patch: &ProfilePatch) -> Result<()>;

    /// Appends an entry (already carrying its `id`) to `collection`.
    async fn append_entry(&self, user_id: Uuid, collection: EntryCollection, entry: Value)
        -> Result<bool>;

    /// Replaces the entry whose `id` matches, keeping its position.
    async fn replace_entry(
        &self,
        user_id: Uuid,
        collection: EntryCollection,
        entry_id: Uuid,
        entry: Value,
    ) -> Result<bool>;

    async fn remove_entry(&self, user_id: Uuid, collection: EntryCollection, entry_id: Uuid)
        -> Result<bool>;

    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<ProfileRow>>;
}

pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PROFILE_COLUMNS: &str = r#"
    id, user_type, full_name, email, phone, city_id, location, birth_date,
    COALESCE(is_verified, FALSE) AS is_verified, has_experience,
    experiences, education, courses,
    COALESCE(skills, '{}') AS skills,
    COALESCE(driver_license_categories, '{}') AS driver_license_categories,
    summary, address, created_at
"#;

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn apply_patch(&self, user_id: Uuid, patch: &ProfilePatch) -> Result<()> {
        let query = match patch {
            ProfilePatch::Contact { email, phone } => {
                sqlx::query("UPDATE profiles SET email = $2, phone = $3 WHERE id = $1")
                    .bind(user_id)
                    .bind(email)
                    .bind(phone)
            }
            ProfilePatch::Name { full_name } => {
                sqlx::query("UPDATE profiles SET full_name = $2 WHERE id = $1")
                    .bind(user_id)
                    .bind(full_name)
            }
            ProfilePatch::Location { city_id, location } => {
                sqlx::query("UPDATE profiles SET city_id = $2, location = $3 WHERE id = $1")
                    .bind(user_id)
                    .bind(city_id)
                    .bind(location)
            }
            ProfilePatch::BirthDate { birth_date } => {
                sqlx::query("UPDATE profiles SET birth_date = $2 WHERE id = $1")
                    .bind(user_id)
                    .bind(birth_date)
            }
            ProfilePatch::Education { education } => {
                sqlx::query("UPDATE profiles SET education = $2 WHERE id = $1")
                    .bind(user_id)
                    .bind(serde_json::to_value(education)?)
            }
            ProfilePatch::WorkHistory {
                has_experience,
                experiences,
            } => sqlx::query(
                "UPDATE profiles SET has_experience = $2, experiences = $3 WHERE id = $1",
            )
            .bind(user_id)
            .bind(has_experience)
            .bind(serde_json::to_value(experiences)?),
            ProfilePatch::Skills { skills } => {
                sqlx::query("UPDATE profiles SET skills = $2 WHERE id = $1")
                    .bind(user_id)
                    .bind(skills)
            }
            ProfilePatch::DriverLicense { categories } => {
                sqlx::query("UPDATE profiles SET driver_license_categories = $2 WHERE id = $1")
                    .bind(user_id)
                    .bind(categories)
            }
            ProfilePatch::Summary { summary } => {
                sqlx::query("UPDATE profiles SET summary = $2 WHERE id = $1")
                    .bind(user_id)
                    .bind(summary)
            }
            ProfilePatch::Address { address } => {
                sqlx::query("UPDATE profiles SET address = $2 WHERE id = $1")
                    .bind(user_id)
                    .bind(serde_json::to_value(address)?)
            }
            ProfilePatch::Courses { courses } => {
                sqlx::query("UPDATE profiles SET courses = $2 WHERE id = $1")
                    .bind(user_id)
                    .bind(serde_json::to_value(courses)?)
            }
        };

        let result = query
            .execute(&self.pool)
            .await
            .context("Failed to update profile")?;
        if result.rows_affected() == 0 {
            anyhow::bail!("Profile {user_id} does not exist");
        }
        Ok(())
    }

    async fn append_entry(
        &self,
        user_id: Uuid,
        collection: EntryCollection,
        entry: Value,
    ) -> Result<bool> {
        let column = collection.column();
        let sql = format!(
            "UPDATE profiles \
             SET {column} = COALESCE({column}, '[]'::jsonb) || jsonb_build_array($2::jsonb) \
             WHERE id = $1"
        );
        let result = sqlx::query(&sql)
            .bind(user_id)
            .bind(entry)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn replace_entry(
        &self,
        user_id: Uuid,
        collection: EntryCollection,
        entry_id: Uuid,
        entry: Value,
    ) -> Result<bool> {
        let column = collection.column();
        let sql = format!(
            r#"
            UPDATE profiles
            SET {column} = (
                SELECT jsonb_agg(
                    CASE WHEN e.value ->> 'id' = $2 THEN $3::jsonb ELSE e.value END
                    ORDER BY e.ordinality)
                FROM jsonb_array_elements({column}) WITH ORDINALITY AS e(value, ordinality)
            )
            WHERE id = $1
              AND jsonb_typeof({column}) = 'array'
              AND EXISTS (
                  SELECT 1 FROM jsonb_array_elements({column}) AS x(value)
                  WHERE x.value ->> 'id' = $2
              )
            "#
        );
        let result = sqlx::query(&sql)
            .bind(user_id)
            .bind(entry_id.to_string())
            .bind(entry)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_entry(
        &self,
        user_id: Uuid,
        collection: EntryCollection,
        entry_id: Uuid,
    ) -> Result<bool> {
        let column = collection.column();
        let sql = format!(
            r#"
            UPDATE profiles
            SET {column} = COALESCE((
                SELECT jsonb_agg(e.value ORDER BY e.ordinality)
                FROM jsonb_array_elements({column}) WITH ORDINALITY AS e(value, ordinality)
                WHERE e.value ->> 'id' <> $2
            ), '[]'::jsonb)
            WHERE id = $1
              AND jsonb_typeof({column}) = 'array'
              AND EXISTS (
                  SELECT 1 FROM jsonb_array_elements({column}) AS x(value)
                  WHERE x.value ->> 'id' = $2
              )
            "#
        );
        let result = sqlx::query(&sql)
            .bind(user_id)
            .bind(entry_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<ProfileRow>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1");
        Ok(sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }
}

#[cfg(test)]
pub(crate) mod memory {
    //! Records every write so tests can assert what was (not) persisted.

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;

    #[derive(Default)]
    pub struct MemoryProfileStore {
        pub patches: Mutex<Vec<(Uuid, ProfilePatch)>>,
        pub profiles: Mutex<HashMap<Uuid, ProfileRow>>,
        pub fail: AtomicBool,
    }

    impl MemoryProfileStore {
        pub fn with_profile(user_id: Uuid, user_type: &str) -> Self {
            let store = Self::default();
            store
                .profiles
                .lock()
                .unwrap()
                .insert(user_id, blank_profile(user_id, user_type));
            store
        }

        pub fn patch_count(&self) -> usize {
            self.patches.lock().unwrap().len()
        }

        fn check(&self) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("connection refused");
            }
            Ok(())
        }

        fn edit_collection(
            &self,
            user_id: Uuid,
            collection: EntryCollection,
            edit: impl FnOnce(&mut Vec<Value>) -> bool,
        ) -> Result<bool> {
            self.check()?;
            let mut profiles = self.profiles.lock().unwrap();
            let Some(profile) = profiles.get_mut(&user_id) else {
                return Ok(false);
            };
            let slot = match collection {
                EntryCollection::Experiences => &mut profile.experiences,
                EntryCollection::Education => &mut profile.education,
                EntryCollection::Courses => &mut profile.courses,
            };
            let mut items = match slot.take() {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            };
            let changed = edit(&mut items);
            *slot = Some(Value::Array(items));
            Ok(changed)
        }
    }

    pub fn blank_profile(user_id: Uuid, user_type: &str) -> ProfileRow {
        ProfileRow {
            id: user_id,
            user_type: user_type.to_string(),
            full_name: None,
            email: None,
            phone: None,
            city_id: None,
            location: None,
            birth_date: None,
            is_verified: false,
            has_experience: None,
            experiences: None,
            education: None,
            courses: None,
            skills: Vec::new(),
            driver_license_categories: Vec::new(),
            summary: None,
            address: None,
            created_at: Utc::now(),
        }
    }

    fn has_id(value: &Value, id: Uuid) -> bool {
        value.get("id").and_then(Value::as_str) == Some(id.to_string().as_str())
    }

    #[async_trait]
    impl ProfileStore for MemoryProfileStore {
        async fn apply_patch(&self, user_id: Uuid, patch: &ProfilePatch) -> Result<()> {
            self.check()?;
            self.patches.lock().unwrap().push((user_id, patch.clone()));
            Ok(())
        }

        async fn append_entry(
            &self,
            user_id: Uuid,
            collection: EntryCollection,
            entry: Value,
        ) -> Result<bool> {
            self.edit_collection(user_id, collection, |items| {
                items.push(entry);
                true
            })
        }

        async fn replace_entry(
            &self,
            user_id: Uuid,
            collection: EntryCollection,
            entry_id: Uuid,
            entry: Value,
        ) -> Result<bool> {
            self.edit_collection(user_id, collection, |items| {
                match items.iter_mut().find(|v| has_id(v, entry_id)) {
                    Some(slot) => {
                        *slot = entry;
                        true
                    }
                    None => false,
                }
            })
        }

        async fn remove_entry(
            &self,
            user_id: Uuid,
            collection: EntryCollection,
            entry_id: Uuid,
        ) -> Result<bool> {
            self.edit_collection(user_id, collection, |items| {
                let before = items.len();
                items.retain(|v| !has_id(v, entry_id));
                items.len() != before
            })
        }

        async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<ProfileRow>> {
            self.check()?;
            Ok(self.profiles.lock().unwrap().get(&user_id).cloned())
        }
    }
}

#[cfg(test)]
mod pg_tests {
    use serde_json::json;

    use super::*;
    use crate::db::pg::{scratch_pool, seed_profile};

    async fn seeded(pool: &PgPool) -> (Uuid, [Uuid; 3]) {
        let user = seed_profile(pool, "candidate").await;
        let ids = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let store = PgProfileStore::new(pool.clone());
        for (id, company) in ids.iter().zip(["Padaria", "Mercado", "Farmácia"]) {
            assert!(store
                .append_entry(
                    user,
                    EntryCollection::Experiences,
                    json!({"id": id, "company": company}),
                )
                .await
                .unwrap());
        }
        (user, ids)
    }

    async fn companies(store: &PgProfileStore, user: Uuid) -> Vec<String> {
        let profile = store.fetch_profile(user).await.unwrap().unwrap();
        match profile.experiences {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item["company"].as_str().map(str::to_string))
                .collect(),
            other => panic!("unexpected experiences {other:?}"),
        }
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn test_replace_entry_keeps_position() {
        let pool = scratch_pool().await;
        let (user, ids) = seeded(&pool).await;
        let store = PgProfileStore::new(pool);

        let replaced = store
            .replace_entry(
                user,
                EntryCollection::Experiences,
                ids[1],
                json!({"id": ids[1], "company": "Atacadão"}),
            )
            .await
            .unwrap();
        assert!(replaced);
        assert_eq!(companies(&store, user).await, ["Padaria", "Atacadão", "Farmácia"]);

        let missing = store
            .replace_entry(user, EntryCollection::Experiences, Uuid::new_v4(), json!({}))
            .await
            .unwrap();
        assert!(!missing);
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn test_concurrent_removals_only_drop_their_own_entry() {
        let pool = scratch_pool().await;
        let (user, ids) = seeded(&pool).await;
        let store = PgProfileStore::new(pool);

        let (first, last) = tokio::join!(
            store.remove_entry(user, EntryCollection::Experiences, ids[0]),
            store.remove_entry(user, EntryCollection::Experiences, ids[2]),
        );
        assert!(first.unwrap());
        assert!(last.unwrap());
        assert_eq!(companies(&store, user).await, ["Mercado"]);
    }
}
