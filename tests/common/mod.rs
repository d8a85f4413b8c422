#![allow(dead_code)]

use async_trait::async_trait;
use fitplan::api_connection::endpoints::{ChatCompletionRequest, ChatCompletionResponse};
use fitplan::api_connection::{ApiConnectionError, CompletionClient};
use fitplan::errors::StoreError;
use fitplan::extraction::{ExtractionConfig, IngredientExtractor};
use fitplan::generation::GenerationStage;
use fitplan::plan::profile::{ActivityLevel, DietaryPreference, FitnessGoal, Sex};
use fitplan::plan::{StageOutput, UserProfile};
use fitplan::store::{InMemoryPlanStore, PlanStore, StoredPlan};
use reqwest::StatusCode;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, Semaphore};
use tokio::time::Instant;

pub const DAY_JSON: &str = r#"{
    "Produce": [{"name": "spinach", "quantity": 2, "unit": "cups"}],
    "Protein": [{"name": "chicken breast", "quantity": 150, "unit": "g"}],
    "Dairy": [],
    "Grains": [{"name": "brown rice", "quantity": 1, "unit": "cup"}],
    "Other": []
}"#;

#[derive(Debug, Clone)]
pub enum Reply {
    Content(String),
    RateLimited,
    /// Non-429 status whose body reports rate limiting.
    RateLimitedBody(StatusCode),
    Status(StatusCode),
}

impl Reply {
    pub fn day() -> Self {
        Reply::Content(DAY_JSON.to_string())
    }
}

/// Answers completion calls from a script, then repeats `otherwise`.
/// Every call is timestamped on the tokio clock.
pub struct ScriptedClient {
    script: Mutex<VecDeque<Reply>>,
    otherwise: Reply,
    calls: Mutex<Vec<(Instant, ChatCompletionRequest)>>,
}

impl ScriptedClient {
    pub fn new(script: Vec<Reply>, otherwise: Reply) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            otherwise,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn always(reply: Reply) -> Arc<Self> {
        Self::new(Vec::new(), reply)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(at, _)| *at).collect()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, request)| request.messages.last().map(|m| m.content.clone()))
            .collect()
    }

    pub fn gaps_secs(&self) -> Vec<u64> {
        self.call_times()
            .windows(2)
            .map(|w| (w[1] - w[0]).as_secs())
            .collect()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn call_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        let model = request.model.clone();
        self.calls.lock().unwrap().push((Instant::now(), request));
        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.otherwise.clone());
        match reply {
            Reply::Content(content) => Ok(ChatCompletionResponse::from_content(&model, content)),
            Reply::RateLimited => Err(ApiConnectionError::ApiError {
                status: StatusCode::TOO_MANY_REQUESTS,
                error_body: "Rate limit exceeded".to_string(),
            }),
            Reply::RateLimitedBody(status) => Err(ApiConnectionError::ApiError {
                status,
                error_body: "Rate limit exceeded, retry later".to_string(),
            }),
            Reply::Status(status) => Err(ApiConnectionError::ApiError {
                status,
                error_body: "upstream error".to_string(),
            }),
        }
    }
}

pub fn extractor(client: Arc<ScriptedClient>) -> IngredientExtractor {
    IngredientExtractor::new(client, ExtractionConfig::default())
}

pub fn profile(user_id: &str) -> UserProfile {
    UserProfile {
        user_id: user_id.to_string(),
        age: 34,
        sex: Sex::Female,
        height_cm: 168.0,
        weight_kg: 64.0,
        activity_level: ActivityLevel::LightlyActive,
        goal: FitnessGoal::MuscleGain,
        workout_days_per_week: 4,
        dietary_preference: DietaryPreference::Omnivore,
    }
}

/// In-memory store that can hold a save open until released and can be
/// told to reject saves for chosen stages.
pub struct ControlledStore {
    inner: InMemoryPlanStore,
    gate: Option<GenerationStage>,
    pub reached: Notify,
    release: Semaphore,
    failures: Mutex<HashMap<GenerationStage, u32>>,
}

impl Default for ControlledStore {
    fn default() -> Self {
        Self {
            inner: InMemoryPlanStore::new(),
            gate: None,
            reached: Notify::new(),
            release: Semaphore::new(0),
            failures: Mutex::new(HashMap::new()),
        }
    }
}

impl ControlledStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn gated_at(stage: GenerationStage) -> Arc<Self> {
        Arc::new(Self {
            gate: Some(stage),
            ..Self::default()
        })
    }

    pub fn failing(failures: HashMap<GenerationStage, u32>) -> Arc<Self> {
        Arc::new(Self {
            failures: Mutex::new(failures),
            ..Self::default()
        })
    }

    pub fn release(&self) {
        self.release.add_permits(1);
    }
}

#[async_trait]
impl PlanStore for ControlledStore {
    async fn save_stage(&self, user_id: &str, output: &StageOutput) -> Result<(), StoreError> {
        let stage = output.stage();
        {
            let mut failures = self.failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(&stage) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(StoreError::Rejected(format!("{} save refused", stage)));
                }
            }
        }
        if self.gate == Some(stage) {
            self.reached.notify_one();
            if let Ok(permit) = self.release.acquire().await {
                permit.forget();
            }
        }
        self.inner.save_stage(user_id, output).await
    }

    async fn load_plan(&self, user_id: &str) -> Result<Option<StoredPlan>, StoreError> {
        self.inner.load_plan(user_id).await
    }

    async fn clear(&self, user_id: &str) -> Result<(), StoreError> {
        self.inner.clear(user_id).await
    }
}
