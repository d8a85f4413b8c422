use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::categories::categorize;
use super::fallback;
use super::retry::{ExtractionAttempt, RetryPolicy};
use super::{CategorizedIngredientList, IngredientCategory, IngredientRecord, Quantity};
use crate::api_connection::endpoints::{
    ChatCompletionRequest, ChatMessage, ResponseFormat, DEFAULT_MODEL,
};
use crate::api_connection::{extract_json_content, ApiConnectionError, CompletionClient};
use crate::plan::meals::{DayMeals, WeeklyMealPlan};

const SYSTEM_PROMPT: &str = "/no_thinking
You are a nutrition assistant that extracts grocery ingredients from meal descriptions.
Return the output as a JSON object. The JSON object must be the only content in your response. Do not include any explanatory text, comments, or markdown formatting (like ```json) before or after the JSON object.
The JSON object must have exactly these top-level properties, each an array: \"Produce\", \"Protein\", \"Dairy\", \"Grains\", \"Other\".
Each array item must be an object with the properties:
- \"name\": the ingredient as it would appear on a shopping list (e.g. 'brown rice', 'chicken breast').
- \"quantity\": a number when the amount is numeric, otherwise a short string (e.g. 'a pinch').
- \"unit\": the unit of measurement (e.g. 'g', 'cups', 'tbsp'), or an empty string.
Use an empty array for a category with no ingredients.
Your response must start with { and end with }.
";

#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub model: String,
    /// Any failure is retried with this policy for single meals.
    pub meal_retry: RetryPolicy,
    /// Only rate-limit failures are retried with this policy for whole days.
    pub day_retry: RetryPolicy,
    pub inter_day_delay: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            meal_retry: RetryPolicy::new(3, Duration::from_millis(1000)),
            day_retry: RetryPolicy::new(3, Duration::from_secs(5)),
            inter_day_delay: Duration::from_secs(5),
            temperature: 0.05,
            max_tokens: 1024,
        }
    }
}

#[derive(Clone)]
pub struct IngredientExtractor {
    client: Arc<dyn CompletionClient>,
    config: ExtractionConfig,
    cancel: Option<CancellationToken>,
}

impl IngredientExtractor {
    pub fn new(client: Arc<dyn CompletionClient>, config: ExtractionConfig) -> Self {
        Self {
            client,
            config,
            cancel: None,
        }
    }

    /// Once `token` is cancelled no new completion call is started; calls
    /// already in flight run to completion.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    async fn request_ingredients(
        &self,
        user_content: &str,
    ) -> Result<CategorizedIngredientList, ApiConnectionError> {
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user_content)],
            response_format: Some(ResponseFormat::json_object()),
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
        };
        let response = self.client.call_chat_completion(request).await?;
        let content = extract_json_content(&response)?;
        Ok(parse_ai_response(&content)?)
    }

    /// Extracts ingredients for a single meal. Every failure is retried with
    /// exponential backoff; once retries are spent the local fallback parser
    /// takes over. Always returns a usable list.
    pub async fn extract_for_meal(
        &self,
        meal_name: &str,
        meal_description: &str,
    ) -> CategorizedIngredientList {
        let prompt = format!("Meal: {}\nDescription: {}", meal_name, meal_description);
        let mut attempt = ExtractionAttempt::new(self.config.meal_retry);

        let reason = loop {
            if self.is_cancelled() {
                break "extraction cancelled".to_string();
            }
            match self.request_ingredients(&prompt).await {
                Ok(list) => return list,
                Err(err) => {
                    let call = attempt.call_number();
                    match attempt.record_failure(err.to_string()) {
                        Some(delay) => {
                            tracing::warn!(
                                meal = %meal_name,
                                attempt = call,
                                delay_ms = delay.as_millis() as u64,
                                error = %err,
                                "meal extraction failed, backing off"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => {
                            break format!(
                                "AI extraction failed after {} attempts: {}",
                                call,
                                attempt.last_error().unwrap_or("unknown error")
                            );
                        }
                    }
                }
            }
        };

        tracing::warn!(meal = %meal_name, reason = %reason, "using fallback ingredient parser");
        let mut list = fallback::parse_meal(meal_name, meal_description);
        list.set_error(format!("{}; used fallback parser", reason));
        list
    }

    /// Extracts ingredients for every meal of one day in a single call. Only
    /// rate limiting is retried; any other failure returns an empty list with
    /// the error recorded so the caller can move on to the next day.
    pub async fn extract_for_day(
        &self,
        day_label: &str,
        day_meals: &DayMeals,
    ) -> CategorizedIngredientList {
        let prompt = day_prompt(day_label, day_meals);
        let mut attempt = ExtractionAttempt::new(self.config.day_retry);

        loop {
            if self.is_cancelled() {
                return CategorizedIngredientList::failed(format!(
                    "{}: extraction cancelled",
                    day_label
                ));
            }
            match self.request_ingredients(&prompt).await {
                Ok(list) => {
                    tracing::debug!(day = %day_label, count = list.total_count(), "day extracted");
                    return list;
                }
                Err(err) if err.is_rate_limited() => {
                    let call = attempt.call_number();
                    match attempt.record_failure(err.to_string()) {
                        Some(delay) => {
                            tracing::warn!(
                                day = %day_label,
                                attempt = call,
                                delay_ms = delay.as_millis() as u64,
                                "rate limited, backing off"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => {
                            return CategorizedIngredientList::failed(format!(
                                "{}: rate limited after {} attempts: {}",
                                day_label,
                                call,
                                attempt.last_error().unwrap_or("unknown error")
                            ));
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(day = %day_label, error = %err, "day extraction failed");
                    return CategorizedIngredientList::failed(format!("{}: {}", day_label, err));
                }
            }
        }
    }

    /// Walks the week one day at a time with a fixed pause between days, so
    /// the upstream rate limit is never hit by a burst. Failed days are noted
    /// in the aggregate's error and otherwise skipped.
    pub async fn extract_for_plan(&self, plan: &WeeklyMealPlan) -> CategorizedIngredientList {
        let mut aggregate = CategorizedIngredientList::new();
        let mut error_trail: Vec<String> = Vec::new();
        let mut processed = 0usize;

        for day in &plan.days {
            if !day.has_parsable_meals() {
                tracing::debug!(day = %day.label(), "no parsable meals, skipping");
                continue;
            }
            if processed > 0 {
                tokio::time::sleep(self.config.inter_day_delay).await;
            }
            if self.is_cancelled() {
                error_trail.push("extraction cancelled".to_string());
                break;
            }
            processed += 1;

            let day_result = self.extract_for_day(&day.label(), day).await;
            if let Some(err) = day_result.error() {
                error_trail.push(err.to_string());
            }
            aggregate.merge(day_result);
        }

        tracing::info!(
            days = processed,
            ingredients = aggregate.total_count(),
            failures = error_trail.len(),
            "plan ingredient extraction finished"
        );
        if !error_trail.is_empty() {
            aggregate.set_error(error_trail.join("; "));
        }
        aggregate
    }
}

fn day_prompt(day_label: &str, day_meals: &DayMeals) -> String {
    let mut prompt = format!("Day: {}\n", day_label);
    for meal in &day_meals.meals {
        prompt.push_str(&format!("- {}: {} ({})\n", meal.slot, meal.name, meal.description));
    }
    prompt
}

#[derive(Debug, Deserialize)]
struct AiIngredient {
    name: String,
    #[serde(default)]
    quantity: Option<Quantity>,
    #[serde(default)]
    unit: Option<String>,
}

/// Parses the categorized JSON object the model is asked for. A top-level
/// `categories` wrapper is tolerated, and non-array members are ignored.
pub fn parse_ai_response(content: &str) -> Result<CategorizedIngredientList, serde_json::Error> {
    let value: Value = serde_json::from_str(content)?;
    let Value::Object(object) = value.get("categories").unwrap_or(&value) else {
        return Err(serde::de::Error::custom("expected a JSON object keyed by category"));
    };

    let mut list = CategorizedIngredientList::new();
    for (key, members) in object {
        if !members.is_array() {
            continue;
        }
        let items: Vec<AiIngredient> = serde_json::from_value(members.clone())?;
        let declared =
            IngredientCategory::from_label(key).filter(|c| *c != IngredientCategory::Other);

        for item in items {
            let name = item.name.trim();
            if name.is_empty() {
                continue;
            }
            let quantity = match item.quantity {
                Some(Quantity::Text(text)) => Quantity::parse(&text),
                Some(amount) => amount,
                None => Quantity::default(),
            };
            list.push(IngredientRecord {
                name: name.to_string(),
                quantity,
                unit: item.unit.unwrap_or_default(),
                category: declared.unwrap_or_else(|| categorize(name)),
            });
        }
    }
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_categorized_object() {
        let content = r#"{
            "Produce": [{"name": "spinach", "quantity": 2, "unit": "cups"}],
            "Protein": [{"name": "salmon", "quantity": "150", "unit": "g"}],
            "Dairy": [],
            "Grains": [{"name": "quinoa", "quantity": null, "unit": null}],
            "Other": [{"name": "olive oil", "quantity": "a drizzle", "unit": ""}]
        }"#;
        let list = parse_ai_response(content).unwrap();
        assert_eq!(list.total_count(), 4);
        assert_eq!(list.get(IngredientCategory::Protein)[0].quantity, Quantity::Amount(150.0));
        assert_eq!(list.get(IngredientCategory::Grains)[0].quantity, Quantity::Text(String::new()));
        assert_eq!(
            list.get(IngredientCategory::Other)[0].quantity,
            Quantity::Text("a drizzle".to_string())
        );
    }

    #[test]
    fn test_unknown_keys_are_keyword_categorized() {
        let content = r#"{"categories": {"Misc": [{"name": "cheddar cheese"}, {"name": "  "}]}, "totalCount": 1}"#;
        let list = parse_ai_response(content).unwrap();
        assert_eq!(list.total_count(), 1);
        assert_eq!(list.get(IngredientCategory::Dairy)[0].name, "cheddar cheese");
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(parse_ai_response("[1, 2, 3]").is_err());
        assert!(parse_ai_response("not json").is_err());
    }
}
