//! Drives one user's plan generation through the fixed stage sequence.
//!
//! ```text
//! Initialize -> NutritionCalculation -> WorkoutPlan -> MealPlan
//!            -> ExtractIngredients -> ShoppingList -> Complete
//! any stage  -> Failed     (stage error; `resume` re-runs that stage)
//! any stage  -> Cancelled  (cancel token; in-flight results discarded)
//! any state  -> Idle       (admin reset)
//! ```

use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::progress::{GenerationProgress, ProgressTracker};
use super::stage::GenerationStage;
use crate::errors::GenerationError;
use crate::extraction::IngredientExtractor;
use crate::plan::meals::build_meal_plan;
use crate::plan::nutrition::calculate_nutrition_targets;
use crate::plan::shopping::ShoppingList;
use crate::plan::workout::build_workout_plan;
use crate::plan::{PlanDraft, StageOutput, UserProfile};
use crate::store::PlanStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub is_admin: bool,
}

impl Caller {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            is_admin: false,
        }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            is_admin: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    Applied,
    NotPermitted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running(GenerationStage),
    Complete,
    Cancelled(GenerationStage),
    Failed {
        stage: GenerationStage,
        message: String,
    },
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Complete | RunState::Cancelled(_) | RunState::Failed { .. }
        )
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => f.write_str("idle"),
            RunState::Running(stage) => write!(f, "running ({})", stage),
            RunState::Complete => f.write_str("complete"),
            RunState::Cancelled(stage) => write!(f, "cancelled during {}", stage),
            RunState::Failed { stage, message } => write!(f, "failed during {}: {}", stage, message),
        }
    }
}

pub struct PlanOrchestrator {
    profile: UserProfile,
    extractor: IngredientExtractor,
    store: Arc<dyn PlanStore>,
    tracker: ProgressTracker,
    cancel: CancellationToken,
    draft: PlanDraft,
    state: RunState,
}

impl PlanOrchestrator {
    pub fn new(
        profile: UserProfile,
        extractor: IngredientExtractor,
        store: Arc<dyn PlanStore>,
    ) -> Self {
        Self::with_tracker(profile, extractor, store, ProgressTracker::new())
    }

    /// Like [`PlanOrchestrator::new`] but writes into an existing tracker, so
    /// observers subscribed to it keep receiving updates.
    pub fn with_tracker(
        profile: UserProfile,
        extractor: IngredientExtractor,
        store: Arc<dyn PlanStore>,
        tracker: ProgressTracker,
    ) -> Self {
        let cancel = CancellationToken::new();
        Self {
            profile,
            extractor: extractor.with_cancellation(cancel.clone()),
            store,
            tracker,
            cancel,
            draft: PlanDraft::default(),
            state: RunState::Idle,
        }
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn tracker(&self) -> ProgressTracker {
        self.tracker.clone()
    }

    pub fn get_progress(&self) -> GenerationProgress {
        self.tracker.get_progress()
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn draft(&self) -> &PlanDraft {
        &self.draft
    }

    /// Token observers can use to cancel the run from another task.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Runs a fresh generation from `Initialize`. Only valid from `Idle`;
    /// any other state is returned unchanged.
    pub async fn run(&mut self) -> RunState {
        if self.state != RunState::Idle {
            tracing::warn!(
                user_id = %self.profile.user_id,
                state = %self.state,
                "run requested on a used orchestrator, reset first"
            );
            return self.state.clone();
        }
        tracing::info!(user_id = %self.profile.user_id, "plan generation started");
        self.drive(GenerationStage::Initialize).await
    }

    /// The user-initiated "Continue": re-runs the stage that failed and
    /// carries on from there.
    pub async fn resume(&mut self) -> Result<RunState, GenerationError> {
        let RunState::Failed { stage, .. } = &self.state else {
            return Err(GenerationError::NotResumable(format!("run is {}", self.state)));
        };
        let stage = *stage;
        tracing::info!(user_id = %self.profile.user_id, stage = %stage, "continuing plan generation");
        Ok(self.drive(stage).await)
    }

    /// Admin-only. Discards outputs, stored stage results and any pending
    /// cancellation, and returns progress to its initial snapshot.
    pub async fn reset(&mut self, caller: &Caller) -> ResetOutcome {
        if !caller.is_admin {
            tracing::info!(
                user_id = %self.profile.user_id,
                caller = %caller.user_id,
                "reset refused for non-admin caller"
            );
            return ResetOutcome::NotPermitted;
        }

        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.extractor = self.extractor.clone().with_cancellation(self.cancel.clone());
        self.draft = PlanDraft::default();
        self.state = RunState::Idle;
        if let Err(err) = self.store.clear(&self.profile.user_id).await {
            tracing::warn!(user_id = %self.profile.user_id, error = %err, "failed to clear stored plan on reset");
        }
        self.tracker.replace(GenerationProgress::idle());
        tracing::info!(user_id = %self.profile.user_id, caller = %caller.user_id, "plan generation reset");
        ResetOutcome::Applied
    }

    async fn drive(&mut self, from: GenerationStage) -> RunState {
        let countdown_stop = self.cancel.child_token();
        let countdown_guard = countdown_stop.clone().drop_guard();
        self.tracker.spawn_countdown(countdown_stop);

        let mut stage = from;
        let outcome = loop {
            if self.cancel.is_cancelled() {
                break self.mark_cancelled(stage);
            }
            self.enter_stage(stage);
            if stage.is_final() {
                break self.mark_complete();
            }

            let result = self.execute_stage(stage).await;
            if self.cancel.is_cancelled() {
                tracing::info!(stage = %stage, "discarding stage result after cancellation");
                break self.mark_cancelled(stage);
            }

            match result {
                Ok(output) => {
                    if let Some(output) = output {
                        self.draft.record(output);
                    }
                    match stage.next() {
                        Some(next) => stage = next,
                        None => break self.mark_complete(),
                    }
                }
                Err(err) => break self.mark_failed(stage, err),
            }
        };

        drop(countdown_guard);
        self.state = outcome.clone();
        outcome
    }

    fn enter_stage(&mut self, stage: GenerationStage) {
        self.state = RunState::Running(stage);
        self.tracker.update(|progress| {
            progress.current_step = stage;
            progress.step_message = stage.message().to_string();
            progress.estimated_time_remaining_seconds = stage.estimated_remaining_seconds();
            progress.is_generating = true;
            progress.is_cancelled = false;
            progress.error = None;
        });
        tracing::info!(user_id = %self.profile.user_id, stage = %stage, "entering stage");
    }

    fn mark_complete(&self) -> RunState {
        self.tracker.update(|progress| {
            progress.is_generating = false;
            progress.is_complete = true;
            progress.estimated_time_remaining_seconds = 0;
        });
        tracing::info!(user_id = %self.profile.user_id, "plan generation complete");
        RunState::Complete
    }

    fn mark_cancelled(&self, stage: GenerationStage) -> RunState {
        self.tracker.update(|progress| {
            progress.is_generating = false;
            progress.is_cancelled = true;
            progress.estimated_time_remaining_seconds = 0;
            progress.step_message = "Plan generation cancelled".to_string();
        });
        tracing::info!(user_id = %self.profile.user_id, stage = %stage, "plan generation cancelled");
        RunState::Cancelled(stage)
    }

    fn mark_failed(&self, stage: GenerationStage, err: GenerationError) -> RunState {
        let message = err.to_string();
        self.tracker.update(|progress| {
            progress.is_generating = false;
            progress.estimated_time_remaining_seconds = 0;
            progress.error = Some(message.clone());
        });
        tracing::error!(user_id = %self.profile.user_id, stage = %stage, error = %message, "stage failed");
        RunState::Failed { stage, message }
    }

    async fn execute_stage(
        &self,
        stage: GenerationStage,
    ) -> Result<Option<StageOutput>, GenerationError> {
        match stage {
            GenerationStage::Initialize => {
                self.profile.validate()?;
                Ok(None)
            }
            GenerationStage::NutritionCalculation => {
                let targets = calculate_nutrition_targets(&self.profile);
                self.persist(StageOutput::Nutrition(targets)).await
            }
            GenerationStage::WorkoutPlan => {
                let plan = build_workout_plan(&self.profile);
                self.persist(StageOutput::Workout(plan)).await
            }
            GenerationStage::MealPlan => {
                let targets = self
                    .draft
                    .nutrition
                    .clone()
                    .unwrap_or_else(|| calculate_nutrition_targets(&self.profile));
                let meals = build_meal_plan(&self.profile, &targets);
                self.persist(StageOutput::Meals(meals)).await
            }
            GenerationStage::ExtractIngredients => {
                let meals = self
                    .draft
                    .meals
                    .as_ref()
                    .ok_or(GenerationError::MissingOutput(GenerationStage::MealPlan))?;
                let ingredients = self.extractor.extract_for_plan(meals).await;
                if let Some(err) = ingredients.error() {
                    tracing::warn!(user_id = %self.profile.user_id, error = %err, "ingredient extraction was partial");
                }
                self.persist(StageOutput::Ingredients(ingredients)).await
            }
            GenerationStage::ShoppingList => {
                let ingredients = self
                    .draft
                    .ingredients
                    .as_ref()
                    .ok_or(GenerationError::MissingOutput(GenerationStage::ExtractIngredients))?;
                let list = ShoppingList::from_ingredients(ingredients);
                self.persist(StageOutput::Shopping(list)).await
            }
            GenerationStage::Complete => Ok(None),
        }
    }

    async fn persist(&self, output: StageOutput) -> Result<Option<StageOutput>, GenerationError> {
        self.store
            .save_stage(&self.profile.user_id, &output)
            .await
            .map_err(|source| GenerationError::Persistence {
                stage: output.stage(),
                source,
            })?;
        Ok(Some(output))
    }
}
