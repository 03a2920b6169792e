//! Linear onboarding state machine.
//!
//! `advance` validates the current step, persists only that step's patch and
//! moves on. Answers stay in memory for `back` and for pre-filling a revisited
//! step; nothing is reloaded from storage, so every new wizard starts at the
//! first step.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::onboarding::steps::{validate_step, StepContext, StepInput, WizardStep};
use crate::profile::store::ProfileStore;
use crate::profile::validation::FieldError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Advanced { next: WizardStep },
    Completed { redirect_to: String },
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("expected the {} step, got {}", expected.as_str(), got.as_str())]
    WrongStep {
        expected: WizardStep,
        got: WizardStep,
    },

    #[error("{} step has invalid fields", step.as_str())]
    Invalid {
        step: WizardStep,
        errors: Vec<FieldError>,
    },

    #[error("could not save the {} step: {cause}", step.as_str())]
    Persistence {
        step: WizardStep,
        cause: anyhow::Error,
    },

    #[error("onboarding is already complete")]
    AlreadyCompleted,
}

pub struct OnboardingWizard {
    user_id: Uuid,
    current: WizardStep,
    answers: HashMap<WizardStep, StepInput>,
    completed: bool,
    redirect_to: String,
}

impl OnboardingWizard {
    pub fn new(user_id: Uuid, redirect_to: impl Into<String>) -> Self {
        Self {
            user_id,
            current: WizardStep::first(),
            answers: HashMap::new(),
            completed: false,
            redirect_to: redirect_to.into(),
        }
    }

    pub fn current_step(&self) -> WizardStep {
        self.current
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// The last answer given for `step` in this session, if any.
    pub fn answer(&self, step: WizardStep) -> Option<&StepInput> {
        self.answers.get(&step)
    }

    /// Validates and persists `input` for the current step.
    ///
    /// On any error the wizard stays where it is. Validation errors never
    /// reach the store.
    pub async fn advance(
        &mut self,
        input: StepInput,
        ctx: &StepContext,
        store: &dyn ProfileStore,
    ) -> Result<AdvanceOutcome, WizardError> {
        if self.completed {
            return Err(WizardError::AlreadyCompleted);
        }
        let step = self.current;
        if input.step() != step {
            return Err(WizardError::WrongStep {
                expected: step,
                got: input.step(),
            });
        }

        let patch = validate_step(&input, ctx)
            .map_err(|errors| WizardError::Invalid { step, errors })?;

        if let Err(cause) = store.apply_patch(self.user_id, &patch).await {
            warn!(
                "Onboarding step {} failed to persist for {}: {cause:#}",
                step.as_str(),
                self.user_id
            );
            return Err(WizardError::Persistence { step, cause });
        }
        self.answers.insert(step, input);

        match step.next() {
            Some(next) => {
                self.current = next;
                Ok(AdvanceOutcome::Advanced { next })
            }
            None => {
                self.completed = true;
                info!("Onboarding completed for {}", self.user_id);
                Ok(AdvanceOutcome::Completed {
                    redirect_to: self.redirect_to.clone(),
                })
            }
        }
    }

    /// Steps back one step, keeping every answer. No-op on the first step
    /// and once the wizard is completed.
    pub fn back(&mut self) -> WizardStep {
        if self.completed {
            return self.current;
        }
        if let Some(previous) = self.current.previous() {
            self.current = previous;
        }
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::entries::{AddressDraft, EducationDraft};
    use crate::profile::store::memory::MemoryProfileStore;
    use chrono::NaiveDate;
    use std::sync::atomic::Ordering;

    fn ctx() -> StepContext {
        StepContext {
            today: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        }
    }

    fn valid_input(step: WizardStep) -> StepInput {
        match step {
            WizardStep::Contact => StepInput::Contact {
                email: "ana@exemplo.com".to_string(),
                phone: "41998765432".to_string(),
            },
            WizardStep::Name => StepInput::Name {
                full_name: "Ana Souza".to_string(),
            },
            WizardStep::Location => StepInput::Location {
                city_id: Some(4106902),
                city_name: "Curitiba".to_string(),
            },
            WizardStep::BirthDate => StepInput::BirthDate {
                birth_date: NaiveDate::from_ymd_opt(1998, 3, 14),
            },
            WizardStep::Education => StepInput::Education {
                entries: vec![EducationDraft {
                    institution: "Colégio Estadual".to_string(),
                    level: "ensino_medio".to_string(),
                    completed: true,
                    end_year: Some(2015),
                    ..EducationDraft::default()
                }],
            },
            WizardStep::WorkHistory => StepInput::WorkHistory {
                has_experience: false,
                experiences: vec![],
            },
            WizardStep::Skills => StepInput::Skills {
                skills: vec!["Atendimento".to_string()],
            },
            WizardStep::DriverLicense => StepInput::DriverLicense {
                has_license: false,
                categories: vec![],
            },
            WizardStep::Summary => StepInput::Summary {
                summary: "Pontual e comunicativa.".to_string(),
            },
            WizardStep::Address => StepInput::Address {
                address: AddressDraft {
                    street: "Rua XV de Novembro".to_string(),
                    number: "100".to_string(),
                    neighborhood: "Centro".to_string(),
                    postal_code: "80020-310".to_string(),
                    complement: None,
                },
            },
            WizardStep::Courses => StepInput::Courses {
                has_courses: false,
                courses: vec![],
            },
        }
    }

    #[tokio::test]
    async fn test_empty_name_blocks_advance_without_persisting() {
        let store = MemoryProfileStore::default();
        let mut wizard = OnboardingWizard::new(Uuid::new_v4(), "/feed");
        wizard
            .advance(valid_input(WizardStep::Contact), &ctx(), &store)
            .await
            .unwrap();
        assert_eq!(wizard.current_step(), WizardStep::Name);
        assert_eq!(store.patch_count(), 1);

        let result = wizard
            .advance(
                StepInput::Name {
                    full_name: String::new(),
                },
                &ctx(),
                &store,
            )
            .await;

        assert!(matches!(result, Err(WizardError::Invalid { step: WizardStep::Name, .. })));
        assert_eq!(wizard.current_step(), WizardStep::Name);
        assert_eq!(store.patch_count(), 1);
    }

    #[tokio::test]
    async fn test_wrong_step_is_rejected() {
        let store = MemoryProfileStore::default();
        let mut wizard = OnboardingWizard::new(Uuid::new_v4(), "/feed");
        let result = wizard
            .advance(valid_input(WizardStep::Name), &ctx(), &store)
            .await;
        assert!(matches!(result, Err(WizardError::WrongStep { .. })));
        assert_eq!(store.patch_count(), 0);
    }

    #[tokio::test]
    async fn test_fresh_wizard_cannot_jump_to_last_step() {
        let store = MemoryProfileStore::default();
        let mut wizard = OnboardingWizard::new(Uuid::new_v4(), "/feed");
        let result = wizard
            .advance(valid_input(WizardStep::Courses), &ctx(), &store)
            .await;
        assert!(matches!(
            result,
            Err(WizardError::WrongStep {
                expected: WizardStep::Contact,
                got: WizardStep::Courses
            })
        ));
        assert!(!wizard.is_completed());
        assert_eq!(store.patch_count(), 0);
    }

    #[tokio::test]
    async fn test_persistence_failure_stays_on_step() {
        let store = MemoryProfileStore::default();
        store.fail.store(true, Ordering::SeqCst);
        let mut wizard = OnboardingWizard::new(Uuid::new_v4(), "/feed");

        let result = wizard
            .advance(valid_input(WizardStep::Contact), &ctx(), &store)
            .await;
        assert!(matches!(result, Err(WizardError::Persistence { .. })));
        assert_eq!(wizard.current_step(), WizardStep::Contact);
        assert!(wizard.answer(WizardStep::Contact).is_none());

        store.fail.store(false, Ordering::SeqCst);
        let retry = wizard
            .advance(valid_input(WizardStep::Contact), &ctx(), &store)
            .await;
        assert_eq!(retry.unwrap(), AdvanceOutcome::Advanced { next: WizardStep::Name });
    }

    #[tokio::test]
    async fn test_full_run_persists_each_step_once_and_redirects() {
        let store = MemoryProfileStore::default();
        let user = Uuid::new_v4();
        let mut wizard = OnboardingWizard::new(user, "/feed");

        let mut last = None;
        for step in WizardStep::ALL {
            last = Some(wizard.advance(valid_input(step), &ctx(), &store).await.unwrap());
        }

        assert_eq!(
            last,
            Some(AdvanceOutcome::Completed {
                redirect_to: "/feed".to_string()
            })
        );
        assert!(wizard.is_completed());
        let patches = store.patches.lock().unwrap();
        assert_eq!(patches.len(), WizardStep::ALL.len());
        assert!(patches.iter().all(|(id, _)| *id == user));
        drop(patches);

        let again = wizard
            .advance(valid_input(WizardStep::Courses), &ctx(), &store)
            .await;
        assert!(matches!(again, Err(WizardError::AlreadyCompleted)));
    }

    #[tokio::test]
    async fn test_back_keeps_answers() {
        let store = MemoryProfileStore::default();
        let mut wizard = OnboardingWizard::new(Uuid::new_v4(), "/feed");
        wizard
            .advance(valid_input(WizardStep::Contact), &ctx(), &store)
            .await
            .unwrap();

        assert_eq!(wizard.back(), WizardStep::Contact);
        assert_eq!(wizard.back(), WizardStep::Contact);
        assert!(matches!(
            wizard.answer(WizardStep::Contact),
            Some(StepInput::Contact { .. })
        ));
    }

    #[tokio::test]
    async fn test_back_then_forward_replaces_answer() {
        let store = MemoryProfileStore::default();
        let mut wizard = OnboardingWizard::new(Uuid::new_v4(), "/feed");
        for step in [WizardStep::Contact, WizardStep::Name] {
            wizard.advance(valid_input(step), &ctx(), &store).await.unwrap();
        }
        assert_eq!(wizard.back(), WizardStep::Name);

        let corrected = StepInput::Name {
            full_name: "Ana Paula Souza".to_string(),
        };
        let outcome = wizard.advance(corrected, &ctx(), &store).await.unwrap();
        assert_eq!(outcome, AdvanceOutcome::Advanced { next: WizardStep::Location });
        assert!(matches!(
            wizard.answer(WizardStep::Name),
            Some(StepInput::Name { full_name }) if full_name == "Ana Paula Souza"
        ));
        assert_eq!(store.patch_count(), 3);
    }

    #[tokio::test]
    async fn test_back_after_completion_is_noop() {
        let store = MemoryProfileStore::default();
        let mut wizard = OnboardingWizard::new(Uuid::new_v4(), "/feed");
        for step in WizardStep::ALL {
            wizard.advance(valid_input(step), &ctx(), &store).await.unwrap();
        }
        assert_eq!(wizard.back(), WizardStep::Courses);
        assert!(wizard.is_completed());
    }

    #[test]
    fn test_new_wizard_starts_at_first_step() {
        let wizard = OnboardingWizard::new(Uuid::new_v4(), "/feed");
        assert_eq!(wizard.current_step(), WizardStep::Contact);
        assert!(!wizard.is_completed());
    }
}
