//! Owns one orchestrator per user and runs it on the tokio runtime, so a
//! caller can start a plan, watch its progress and steer it from elsewhere.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{watch, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::orchestrator::{Caller, PlanOrchestrator, ResetOutcome, RunState};
use super::progress::{GenerationProgress, ProgressTracker};
use crate::errors::GenerationError;
use crate::extraction::IngredientExtractor;
use crate::plan::{PlanDraft, UserProfile};
use crate::store::PlanStore;

struct RunSlot {
    /// Held by `reset`, `resume` and `wait` while they own the orchestrator,
    /// and briefly by `start`; `start` refuses when it cannot take it.
    op: Arc<tokio::sync::Mutex<()>>,
    profile: UserProfile,
    tracker: ProgressTracker,
    cancel: CancellationToken,
    task: Option<JoinHandle<PlanOrchestrator>>,
    parked: Option<PlanOrchestrator>,
}

impl RunSlot {
    fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

pub struct PlanGenerationService {
    extractor: IngredientExtractor,
    store: Arc<dyn PlanStore>,
    runs: Mutex<HashMap<String, RunSlot>>,
}

impl PlanGenerationService {
    pub fn new(extractor: IngredientExtractor, store: Arc<dyn PlanStore>) -> Self {
        Self {
            extractor,
            store,
            runs: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> Arc<dyn PlanStore> {
        Arc::clone(&self.store)
    }

    fn runs(&self) -> MutexGuard<'_, HashMap<String, RunSlot>> {
        self.runs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn orchestrator_for(&self, profile: UserProfile, tracker: ProgressTracker) -> PlanOrchestrator {
        PlanOrchestrator::with_tracker(
            profile,
            self.extractor.clone(),
            Arc::clone(&self.store),
            tracker,
        )
    }

    /// Starts a fresh run for `profile.user_id`. Rejected while a run for the
    /// same user is still in flight or another call is steering it.
    pub fn start(&self, profile: UserProfile) -> Result<ProgressTracker, GenerationError> {
        let user_id = profile.user_id.clone();
        let mut runs = self.runs();

        let slot = runs.entry(user_id.clone()).or_insert_with(|| RunSlot {
            op: Arc::new(tokio::sync::Mutex::new(())),
            profile: profile.clone(),
            tracker: ProgressTracker::new(),
            cancel: CancellationToken::new(),
            task: None,
            parked: None,
        });
        let Ok(_op) = Arc::clone(&slot.op).try_lock_owned() else {
            return Err(GenerationError::AlreadyRunning(user_id));
        };
        if slot.is_running() {
            return Err(GenerationError::AlreadyRunning(user_id));
        }

        slot.tracker.replace(GenerationProgress::idle());
        let mut orchestrator = self.orchestrator_for(profile.clone(), slot.tracker.clone());
        slot.cancel = orchestrator.cancellation_token();
        slot.profile = profile;
        slot.parked = None;
        slot.task = Some(tokio::spawn(async move {
            orchestrator.run().await;
            orchestrator
        }));

        tracing::info!(user_id = %user_id, "plan generation scheduled");
        Ok(slot.tracker.clone())
    }

    pub fn progress(&self, user_id: &str) -> Option<GenerationProgress> {
        self.runs().get(user_id).map(|slot| slot.tracker.get_progress())
    }

    pub fn subscribe(&self, user_id: &str) -> Option<watch::Receiver<GenerationProgress>> {
        self.runs().get(user_id).map(|slot| slot.tracker.subscribe())
    }

    /// Requests cancellation. The run stops at its next stage boundary or
    /// before its next external call, whichever comes first.
    pub fn cancel(&self, user_id: &str) -> Result<(), GenerationError> {
        let runs = self.runs();
        let slot = runs
            .get(user_id)
            .ok_or_else(|| GenerationError::NoRun(user_id.to_string()))?;
        slot.cancel.cancel();
        tracing::info!(user_id, "plan generation cancellation requested");
        Ok(())
    }

    /// Continues a failed run from the stage that failed.
    pub async fn resume(&self, user_id: &str) -> Result<ProgressTracker, GenerationError> {
        let _op = self.exclusive(user_id).await?;
        if self.runs().get(user_id).is_some_and(RunSlot::is_running) {
            return Err(GenerationError::AlreadyRunning(user_id.to_string()));
        }

        let mut orchestrator = self.checkout(user_id).await?;
        if !matches!(orchestrator.state(), RunState::Failed { .. }) {
            let state = orchestrator.state().to_string();
            self.park(user_id, orchestrator);
            return Err(GenerationError::NotResumable(format!("run is {}", state)));
        }

        let tracker = orchestrator.tracker();
        let cancel = orchestrator.cancellation_token();
        let task = tokio::spawn(async move {
            if let Err(err) = orchestrator.resume().await {
                tracing::warn!(error = %err, "continue rejected");
            }
            orchestrator
        });
        if let Some(slot) = self.runs().get_mut(user_id) {
            slot.cancel = cancel;
            slot.task = Some(task);
        }
        Ok(tracker)
    }

    /// Admin-only. Stops any in-flight run and returns the user's plan to
    /// its initial state.
    pub async fn reset(&self, user_id: &str, caller: &Caller) -> Result<ResetOutcome, GenerationError> {
        if !caller.is_admin {
            tracing::info!(user_id, caller = %caller.user_id, "reset refused for non-admin caller");
            return Ok(ResetOutcome::NotPermitted);
        }

        // Lets a `wait` holding the slot return before we queue behind it.
        self.cancel(user_id)?;
        let _op = self.exclusive(user_id).await?;

        let (task, parked, profile, tracker) = {
            let mut runs = self.runs();
            let slot = runs
                .get_mut(user_id)
                .ok_or_else(|| GenerationError::NoRun(user_id.to_string()))?;
            slot.cancel.cancel();
            (
                slot.task.take(),
                slot.parked.take(),
                slot.profile.clone(),
                slot.tracker.clone(),
            )
        };

        let recovered = match (parked, task) {
            (Some(orchestrator), _) => Some(orchestrator),
            (None, Some(task)) => {
                task.abort();
                task.await.ok()
            }
            (None, None) => None,
        };
        let mut orchestrator =
            recovered.unwrap_or_else(|| self.orchestrator_for(profile, tracker));

        let outcome = orchestrator.reset(caller).await;
        self.park(user_id, orchestrator);
        Ok(outcome)
    }

    /// Waits for the user's current run to stop and reports how it ended.
    pub async fn wait(&self, user_id: &str) -> Result<RunState, GenerationError> {
        let _op = self.exclusive(user_id).await?;
        let orchestrator = self.checkout(user_id).await?;
        let state = orchestrator.state().clone();
        self.park(user_id, orchestrator);
        Ok(state)
    }

    /// Outputs produced by the user's last run, once it has stopped.
    pub fn draft(&self, user_id: &str) -> Option<PlanDraft> {
        self.runs()
            .get(user_id)
            .and_then(|slot| slot.parked.as_ref())
            .map(|orchestrator| orchestrator.draft().clone())
    }

    async fn exclusive(&self, user_id: &str) -> Result<OwnedMutexGuard<()>, GenerationError> {
        let op = {
            let runs = self.runs();
            let slot = runs
                .get(user_id)
                .ok_or_else(|| GenerationError::NoRun(user_id.to_string()))?;
            Arc::clone(&slot.op)
        };
        Ok(op.lock_owned().await)
    }

    /// Callers hold the slot's operation lock.
    fn park(&self, user_id: &str, orchestrator: PlanOrchestrator) {
        if let Some(slot) = self.runs().get_mut(user_id) {
            slot.cancel = orchestrator.cancellation_token();
            slot.parked = Some(orchestrator);
        }
    }

    /// Takes the orchestrator out of the slot, joining its task if one is
    /// still attached. Callers hold the slot's operation lock.
    async fn checkout(&self, user_id: &str) -> Result<PlanOrchestrator, GenerationError> {
        let (task, parked, profile, tracker) = {
            let mut runs = self.runs();
            let slot = runs
                .get_mut(user_id)
                .ok_or_else(|| GenerationError::NoRun(user_id.to_string()))?;
            (
                slot.task.take(),
                slot.parked.take(),
                slot.profile.clone(),
                slot.tracker.clone(),
            )
        };

        if let Some(orchestrator) = parked {
            return Ok(orchestrator);
        }
        match task {
            Some(task) => match task.await {
                Ok(orchestrator) => Ok(orchestrator),
                Err(err) => {
                    self.park(user_id, self.orchestrator_for(profile, tracker));
                    Err(GenerationError::Interrupted {
                        user_id: user_id.to_string(),
                        reason: err.to_string(),
                    })
                }
            },
            None => Ok(self.orchestrator_for(profile, tracker)),
        }
    }
}
