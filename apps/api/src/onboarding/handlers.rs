use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::onboarding::steps::{StepContext, StepInput, WizardStep};
use crate::onboarding::wizard::{AdvanceOutcome, OnboardingWizard};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StepSubmission {
    pub user_id: Uuid,
    pub input: StepInput,
}

#[derive(Debug, Deserialize)]
pub struct WizardRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct StepAccepted {
    pub step: WizardStep,
    pub next_step: Option<WizardStep>,
    pub redirect_to: Option<String>,
}

/// Where a user's wizard stands, with the answer already given for the
/// current step when they came back to it.
#[derive(Debug, Serialize)]
pub struct WizardPosition {
    pub step: WizardStep,
    pub completed: bool,
    pub answer: Option<StepInput>,
}

impl From<&OnboardingWizard> for WizardPosition {
    fn from(wizard: &OnboardingWizard) -> Self {
        let step = wizard.current_step();
        WizardPosition {
            step,
            completed: wizard.is_completed(),
            answer: wizard.answer(step).cloned(),
        }
    }
}

/// GET /api/v1/onboarding?user_id=
pub async fn handle_wizard_position(
    State(state): State<AppState>,
    Query(params): Query<WizardRequest>,
) -> Json<WizardPosition> {
    let wizard = state.onboarding.wizard(params.user_id);
    let wizard = wizard.lock().await;
    Json(WizardPosition::from(&*wizard))
}

/// POST /api/v1/onboarding/steps
///
/// Validates the user's current step and persists only its fields. A step
/// other than the current one is rejected without touching the profile.
pub async fn handle_submit_step(
    State(state): State<AppState>,
    Json(req): Json<StepSubmission>,
) -> Result<Json<StepAccepted>, AppError> {
    let step = req.input.step();
    let ctx = StepContext {
        today: Utc::now().date_naive(),
    };
    let wizard = state.onboarding.wizard(req.user_id);
    let mut wizard = wizard.lock().await;

    let accepted = match wizard
        .advance(req.input, &ctx, state.profiles.as_ref())
        .await?
    {
        AdvanceOutcome::Advanced { next } => StepAccepted {
            step,
            next_step: Some(next),
            redirect_to: None,
        },
        AdvanceOutcome::Completed { redirect_to } => StepAccepted {
            step,
            next_step: None,
            redirect_to: Some(redirect_to),
        },
    };
    Ok(Json(accepted))
}

/// POST /api/v1/onboarding/back
pub async fn handle_step_back(
    State(state): State<AppState>,
    Json(req): Json<WizardRequest>,
) -> Json<WizardPosition> {
    let wizard = state.onboarding.wizard(req.user_id);
    let mut wizard = wizard.lock().await;
    wizard.back();
    Json(WizardPosition::from(&*wizard))
}

/// POST /api/v1/onboarding/restart
pub async fn handle_restart(
    State(state): State<AppState>,
    Json(req): Json<WizardRequest>,
) -> Json<WizardPosition> {
    let wizard = state.onboarding.restart(req.user_id);
    let wizard = wizard.lock().await;
    Json(WizardPosition::from(&*wizard))
}
