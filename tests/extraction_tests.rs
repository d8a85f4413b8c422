mod common;

use chrono::Weekday;
use common::{extractor, Reply, ScriptedClient};
use fitplan::extraction::{IngredientCategory, Quantity};
use fitplan::plan::meals::{DayMeals, Meal, MealSlot, WeeklyMealPlan};
use reqwest::StatusCode;

fn meal(slot: MealSlot, name: &str, description: &str) -> Meal {
    Meal {
        slot,
        name: name.to_string(),
        description: description.to_string(),
        calories: 500,
    }
}

fn day(day: Weekday) -> DayMeals {
    DayMeals {
        day,
        meals: vec![
            meal(MealSlot::Breakfast, "Spinach omelette", "ingredients: [2 eggs, 1 cup spinach]"),
            meal(MealSlot::Dinner, "Chicken rice bowl", "ingredients: [150g chicken breast, 1 cup rice]"),
        ],
    }
}

fn empty_day(day: Weekday) -> DayMeals {
    DayMeals {
        day,
        meals: vec![meal(MealSlot::Lunch, " ", "")],
    }
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_day_backs_off_exponentially() {
    let client = ScriptedClient::new(
        vec![Reply::RateLimited, Reply::RateLimited, Reply::RateLimited],
        Reply::day(),
    );
    let extractor = extractor(client.clone());

    let list = extractor.extract_for_day("Monday", &day(Weekday::Mon)).await;

    assert_eq!(client.call_count(), 4);
    assert_eq!(client.gaps_secs(), vec![5, 10, 20]);
    assert!(list.error().is_none());
    assert_eq!(list.total_count(), 3);
    assert_eq!(list.get(IngredientCategory::Produce)[0].name, "spinach");
    assert_eq!(list.get(IngredientCategory::Protein)[0].quantity, Quantity::Amount(150.0));
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_exhaustion_gives_empty_day() {
    let client = ScriptedClient::new(
        vec![Reply::RateLimited, Reply::RateLimited, Reply::RateLimited],
        Reply::RateLimitedBody(StatusCode::BAD_GATEWAY),
    );
    let extractor = extractor(client.clone());

    let list = extractor.extract_for_day("Tuesday", &day(Weekday::Tue)).await;

    assert_eq!(client.call_count(), 4);
    assert_eq!(list.total_count(), 0);
    let error = list.error().unwrap();
    assert!(error.starts_with("Tuesday: rate limited after 4 attempts"), "{}", error);
    assert!(error.contains("502"), "last failure is reported: {}", error);
    assert!(!error.contains("429"), "{}", error);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_reported_in_body_is_retried() {
    let client = ScriptedClient::new(
        vec![
            Reply::RateLimitedBody(StatusCode::BAD_GATEWAY),
            Reply::RateLimitedBody(StatusCode::SERVICE_UNAVAILABLE),
        ],
        Reply::day(),
    );
    let extractor = extractor(client.clone());

    let list = extractor.extract_for_day("Monday", &day(Weekday::Mon)).await;

    assert_eq!(client.call_count(), 3);
    assert_eq!(client.gaps_secs(), vec![5, 10]);
    assert!(list.error().is_none());
    assert_eq!(list.total_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_other_day_errors_are_not_retried() {
    let client = ScriptedClient::always(Reply::Status(StatusCode::INTERNAL_SERVER_ERROR));
    let extractor = extractor(client.clone());

    let list = extractor.extract_for_day("Monday", &day(Weekday::Mon)).await;

    assert_eq!(client.call_count(), 1);
    assert_eq!(list.total_count(), 0);
    let error = list.error().unwrap();
    assert!(error.starts_with("Monday: "), "{}", error);
    assert!(error.contains("500"), "{}", error);
}

#[tokio::test(start_paused = true)]
async fn test_unparsable_reply_is_a_day_error() {
    let client = ScriptedClient::always(Reply::Content("I am not JSON".to_string()));
    let extractor = extractor(client.clone());

    let list = extractor.extract_for_day("Friday", &day(Weekday::Fri)).await;

    assert_eq!(client.call_count(), 1);
    assert!(list.is_empty());
    assert!(list.error().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_meal_falls_back_after_retries() {
    let client = ScriptedClient::always(Reply::Status(StatusCode::BAD_GATEWAY));
    let extractor = extractor(client.clone());

    let list = extractor
        .extract_for_meal("Rice bowl", "ingredients: [2 cups rice, 100g chicken]")
        .await;

    assert_eq!(client.call_count(), 4);
    assert_eq!(client.gaps_secs(), vec![1, 2, 4]);
    let rice = &list.get(IngredientCategory::Grains)[0];
    assert_eq!(rice.name, "rice");
    assert_eq!(rice.quantity, Quantity::Amount(2.0));
    assert_eq!(rice.unit, "cups");
    let chicken = &list.get(IngredientCategory::Protein)[0];
    assert_eq!(chicken.name, "chicken");
    assert_eq!(chicken.unit, "g");
    assert!(list.error().unwrap().ends_with("used fallback parser"));
}

#[tokio::test(start_paused = true)]
async fn test_meal_fallback_reports_last_failure() {
    let client = ScriptedClient::new(
        vec![
            Reply::Status(StatusCode::SERVICE_UNAVAILABLE),
            Reply::Status(StatusCode::SERVICE_UNAVAILABLE),
            Reply::Status(StatusCode::SERVICE_UNAVAILABLE),
        ],
        Reply::Status(StatusCode::GATEWAY_TIMEOUT),
    );
    let extractor = extractor(client.clone());

    let list = extractor.extract_for_meal("Toast", "ingredients: [2 slices bread]").await;

    assert_eq!(client.call_count(), 4);
    let error = list.error().unwrap();
    assert!(error.starts_with("AI extraction failed after 4 attempts: "), "{}", error);
    assert!(error.contains("504"), "{}", error);
    assert!(!error.contains("503"), "{}", error);
}

#[tokio::test(start_paused = true)]
async fn test_meal_recovers_within_retry_budget() {
    let client = ScriptedClient::new(
        vec![Reply::Status(StatusCode::SERVICE_UNAVAILABLE)],
        Reply::day(),
    );
    let extractor = extractor(client.clone());

    let list = extractor.extract_for_meal("Bowl", "chicken and rice").await;

    assert_eq!(client.call_count(), 2);
    assert!(list.error().is_none());
    assert_eq!(list.total_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_plan_walks_days_with_fixed_gap() {
    let plan = WeeklyMealPlan {
        days: vec![day(Weekday::Mon), empty_day(Weekday::Tue), day(Weekday::Wed), day(Weekday::Thu)],
    };
    let client = ScriptedClient::new(
        vec![
            Reply::day(),
            Reply::Status(StatusCode::INTERNAL_SERVER_ERROR),
            Reply::day(),
        ],
        Reply::day(),
    );
    let extractor = extractor(client.clone());

    let list = extractor.extract_for_plan(&plan).await;

    assert_eq!(client.call_count(), 3);
    assert_eq!(client.gaps_secs(), vec![5, 5]);
    let prompts = client.prompts();
    assert!(prompts[0].starts_with("Day: Monday"));
    assert!(prompts[1].starts_with("Day: Wednesday"));
    assert!(prompts[2].starts_with("Day: Thursday"));

    assert_eq!(list.total_count(), 6);
    let error = list.error().unwrap();
    assert!(error.starts_with("Wednesday: "), "{}", error);
    assert!(!error.contains("Monday"));
}

#[tokio::test(start_paused = true)]
async fn test_plan_without_parsable_days_makes_no_calls() {
    let plan = WeeklyMealPlan {
        days: vec![empty_day(Weekday::Sat), empty_day(Weekday::Sun)],
    };
    let client = ScriptedClient::always(Reply::day());
    let extractor = extractor(client.clone());

    let list = extractor.extract_for_plan(&plan).await;

    assert_eq!(client.call_count(), 0);
    assert!(list.is_empty());
    assert!(list.error().is_none());
}
