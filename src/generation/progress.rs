use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::stage::{GenerationStage, TOTAL_STEPS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationProgress {
    pub current_step: GenerationStage,
    pub step_message: String,
    pub total_steps: u32,
    /// Best-effort hint: a local countdown reset at every stage boundary.
    pub estimated_time_remaining_seconds: u32,
    pub is_generating: bool,
    pub is_complete: bool,
    pub is_cancelled: bool,
    pub error: Option<String>,
}

impl GenerationProgress {
    pub fn idle() -> Self {
        Self {
            current_step: GenerationStage::Initialize,
            step_message: String::new(),
            total_steps: TOTAL_STEPS,
            estimated_time_remaining_seconds: 0,
            is_generating: false,
            is_complete: false,
            is_cancelled: false,
            error: None,
        }
    }

    pub fn percentage(&self) -> u8 {
        progress_percentage(
            i64::from(self.current_step.index()),
            self.total_steps,
            self.is_complete,
        )
    }

    pub fn is_terminal(&self) -> bool {
        self.is_complete || self.is_cancelled || self.error.is_some()
    }

    pub fn tick_estimated_time(&mut self) {
        if self.is_generating {
            self.estimated_time_remaining_seconds =
                self.estimated_time_remaining_seconds.saturating_sub(1);
        }
    }

    pub fn report(&self) -> ProgressReport {
        ProgressReport {
            current_step: StepRef::Index(i64::from(self.current_step.index())),
            step_message: self.step_message.clone(),
            total_steps: self.total_steps,
            estimated_time_remaining: self.estimated_time_remaining_seconds,
            error: self.error.clone(),
            error_message: None,
            is_complete: self.is_complete,
            progress_percentage: self.percentage(),
        }
    }
}

impl Default for GenerationProgress {
    fn default() -> Self {
        Self::idle()
    }
}

/// `round(index / total * 100)`, pinned to 100 once complete and to 0 for
/// indices that do not name a stage.
pub fn progress_percentage(step_index: i64, total_steps: u32, is_complete: bool) -> u8 {
    if is_complete {
        return 100;
    }
    if step_index < 0 || total_steps == 0 {
        return 0;
    }
    let ratio = step_index as f64 / f64::from(total_steps);
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

/// The step as observers may send it: a stage name or a bare index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepRef {
    Stage(GenerationStage),
    Index(i64),
}

impl StepRef {
    pub fn index(&self) -> i64 {
        match self {
            StepRef::Stage(stage) => i64::from(stage.index()),
            StepRef::Index(index) => *index,
        }
    }
}

/// Polling payload. `error` is the canonical field; the legacy
/// `errorMessage` is read when `error` is absent and never written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub current_step: StepRef,
    #[serde(default)]
    pub step_message: String,
    #[serde(default = "default_total_steps")]
    pub total_steps: u32,
    #[serde(default)]
    pub estimated_time_remaining: u32,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, skip_serializing)]
    error_message: Option<String>,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default, skip_deserializing)]
    pub progress_percentage: u8,
}

fn default_total_steps() -> u32 {
    TOTAL_STEPS
}

impl ProgressReport {
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref().or(self.error_message.as_deref())
    }

    pub fn percentage(&self) -> u8 {
        progress_percentage(self.current_step.index(), self.total_steps, self.is_complete)
    }
}

/// Shared read model for one user's generation progress. The orchestrator
/// writes through it; everyone else reads snapshots or subscribes.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    sender: Arc<watch::Sender<GenerationProgress>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(GenerationProgress::idle());
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn get_progress(&self) -> GenerationProgress {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<GenerationProgress> {
        self.sender.subscribe()
    }

    pub fn tick_estimated_time(&self) {
        self.sender.send_if_modified(|progress| {
            let before = progress.estimated_time_remaining_seconds;
            progress.tick_estimated_time();
            before != progress.estimated_time_remaining_seconds
        });
    }

    pub(crate) fn update(&self, apply: impl FnOnce(&mut GenerationProgress)) {
        self.sender.send_modify(apply);
    }

    pub(crate) fn replace(&self, progress: GenerationProgress) {
        self.sender.send_replace(progress);
    }

    /// Ticks the estimate once per second until `stop` is cancelled.
    pub fn spawn_countdown(&self, stop: CancellationToken) -> JoinHandle<()> {
        let tracker = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = interval.tick() => tracker.tick_estimated_time(),
                }
            }
        })
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
