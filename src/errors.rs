use thiserror::Error;

use crate::generation::GenerationStage;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store rejected write: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid profile: {0}")]
    InvalidProfile(String),
    #[error("failed to persist {stage} output: {source}")]
    Persistence {
        stage: GenerationStage,
        #[source]
        source: StoreError,
    },
    #[error("a plan generation run is already active for user {0}")]
    AlreadyRunning(String),
    #[error("no plan generation run for user {0}")]
    NoRun(String),
    #[error("cannot continue: {0}")]
    NotResumable(String),
    #[error("stage {0} output is missing")]
    MissingOutput(GenerationStage),
    #[error("plan generation task for user {user_id} was interrupted: {reason}")]
    Interrupted { user_id: String, reason: String },
}
