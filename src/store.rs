//! Persistence for stage outputs. Each completed stage is saved as soon as it
//! finishes so a failed run can be continued without redoing earlier work.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::errors::StoreError;
use crate::plan::{PlanDraft, StageOutput};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPlan {
    pub user_id: String,
    pub updated_at: DateTime<Utc>,
    pub draft: PlanDraft,
}

impl StoredPlan {
    fn empty(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            updated_at: Utc::now(),
            draft: PlanDraft::default(),
        }
    }

    fn apply(&mut self, output: &StageOutput) {
        self.draft.record(output.clone());
        self.updated_at = Utc::now();
    }
}

#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn save_stage(&self, user_id: &str, output: &StageOutput) -> Result<(), StoreError>;
    async fn load_plan(&self, user_id: &str) -> Result<Option<StoredPlan>, StoreError>;
    async fn clear(&self, user_id: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryPlanStore {
    plans: Mutex<HashMap<String, StoredPlan>>,
}

impl InMemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlanStore for InMemoryPlanStore {
    async fn save_stage(&self, user_id: &str, output: &StageOutput) -> Result<(), StoreError> {
        let mut plans = self.plans.lock().await;
        plans
            .entry(user_id.to_string())
            .or_insert_with(|| StoredPlan::empty(user_id))
            .apply(output);
        Ok(())
    }

    async fn load_plan(&self, user_id: &str) -> Result<Option<StoredPlan>, StoreError> {
        Ok(self.plans.lock().await.get(user_id).cloned())
    }

    async fn clear(&self, user_id: &str) -> Result<(), StoreError> {
        self.plans.lock().await.remove(user_id);
        Ok(())
    }
}

/// One pretty-printed JSON document per user under `dir`.
#[derive(Debug)]
pub struct JsonFilePlanStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFilePlanStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn plan_path(&self, user_id: &str) -> PathBuf {
        let file_stem: String = user_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.plan.json", file_stem))
    }

    async fn read(&self, path: &Path) -> Result<Option<StoredPlan>, StoreError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl PlanStore for JsonFilePlanStore {
    async fn save_stage(&self, user_id: &str, output: &StageOutput) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.plan_path(user_id);
        let mut plan = self
            .read(&path)
            .await?
            .unwrap_or_else(|| StoredPlan::empty(user_id));
        plan.apply(output);

        let json = serde_json::to_vec_pretty(&plan)?;
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &path).await?;
        tracing::debug!(user_id, stage = %output.stage(), path = %path.display(), "saved stage output");
        Ok(())
    }

    async fn load_plan(&self, user_id: &str) -> Result<Option<StoredPlan>, StoreError> {
        self.read(&self.plan_path(user_id)).await
    }

    async fn clear(&self, user_id: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(self.plan_path(user_id)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
