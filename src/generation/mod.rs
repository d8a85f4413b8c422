pub mod orchestrator;
pub mod progress;
pub mod service;
pub mod stage;

pub use orchestrator::{Caller, PlanOrchestrator, ResetOutcome, RunState};
pub use progress::{progress_percentage, GenerationProgress, ProgressReport, ProgressTracker, StepRef};
pub use service::PlanGenerationService;
pub use stage::{GenerationStage, TOTAL_STEPS};
