use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::nutrition::NutritionTargets;
use super::profile::{DietaryPreference, UserProfile};
use super::workout::WEEK;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealSlot {
    pub const DAILY: [MealSlot; 4] = [
        MealSlot::Breakfast,
        MealSlot::Lunch,
        MealSlot::Dinner,
        MealSlot::Snack,
    ];

    /// Share of the day's calories this slot carries.
    pub fn calorie_share(self) -> f64 {
        match self {
            MealSlot::Breakfast => 0.25,
            MealSlot::Lunch => 0.35,
            MealSlot::Dinner => 0.30,
            MealSlot::Snack => 0.10,
        }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MealSlot::Breakfast => "Breakfast",
            MealSlot::Lunch => "Lunch",
            MealSlot::Dinner => "Dinner",
            MealSlot::Snack => "Snack",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub slot: MealSlot,
    pub name: String,
    pub description: String,
    pub calories: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayMeals {
    pub day: Weekday,
    pub meals: Vec<Meal>,
}

impl DayMeals {
    pub fn label(&self) -> String {
        day_name(self.day).to_string()
    }

    /// A day is worth sending for extraction only if at least one meal has
    /// some text to work from.
    pub fn has_parsable_meals(&self) -> bool {
        self.meals
            .iter()
            .any(|m| !m.name.trim().is_empty() || !m.description.trim().is_empty())
    }

    pub fn total_calories(&self) -> u32 {
        self.meals.iter().map(|m| m.calories).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyMealPlan {
    pub days: Vec<DayMeals>,
}

pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

struct MealTemplate {
    name: &'static str,
    ingredients: &'static str,
}

const BREAKFASTS: &[MealTemplate] = &[
    MealTemplate { name: "Oatmeal with berries", ingredients: "80g rolled oats, 1 cup milk, 100g blueberries" },
    MealTemplate { name: "Greek yogurt parfait", ingredients: "200g greek yogurt, 40g granola, 1 banana" },
    MealTemplate { name: "Whole wheat toast with avocado", ingredients: "2 slices wheat bread, 1 avocado, 1 tomato" },
];

const OMNIVORE_LUNCHES: &[MealTemplate] = &[
    MealTemplate { name: "Chicken rice bowl", ingredients: "150g chicken breast, 1 cup brown rice, 100g broccoli" },
    MealTemplate { name: "Tuna salad wrap", ingredients: "120g tuna, 1 tortilla, 2 cups lettuce, 1 cucumber" },
    MealTemplate { name: "Turkey and quinoa salad", ingredients: "120g turkey, 1 cup quinoa, 1 cup spinach" },
];

const VEGETARIAN_LUNCHES: &[MealTemplate] = &[
    MealTemplate { name: "Lentil and rice bowl", ingredients: "1 cup lentils, 1 cup brown rice, 100g carrots" },
    MealTemplate { name: "Chickpea salad wrap", ingredients: "150g chickpeas, 1 tortilla, 2 cups lettuce" },
    MealTemplate { name: "Tofu quinoa bowl", ingredients: "150g tofu, 1 cup quinoa, 1 cup spinach" },
];

const OMNIVORE_DINNERS: &[MealTemplate] = &[
    MealTemplate { name: "Salmon with sweet potato", ingredients: "150g salmon, 200g sweet potato, 100g zucchini" },
    MealTemplate { name: "Beef stir fry with noodles", ingredients: "150g beef, 100g noodles, 1 pepper, 1 onion" },
    MealTemplate { name: "Baked chicken with pasta", ingredients: "150g chicken thigh, 100g pasta, 1 cup tomato" },
];

const VEGETARIAN_DINNERS: &[MealTemplate] = &[
    MealTemplate { name: "Bean chili with rice", ingredients: "1 cup black beans, 1 cup rice, 1 onion, 1 pepper" },
    MealTemplate { name: "Vegetable pasta with feta", ingredients: "100g pasta, 60g feta, 1 zucchini, 1 tomato" },
    MealTemplate { name: "Tempeh stir fry with noodles", ingredients: "150g tempeh, 100g noodles, 100g broccoli" },
];

const SNACKS: &[MealTemplate] = &[
    MealTemplate { name: "Apple and peanut butter", ingredients: "1 apple, 2 tbsp peanut butter" },
    MealTemplate { name: "Cottage cheese and pear", ingredients: "150g cottage cheese, 1 pear" },
];

fn templates_for(slot: MealSlot, preference: DietaryPreference) -> &'static [MealTemplate] {
    match (slot, preference) {
        (MealSlot::Breakfast, _) => BREAKFASTS,
        (MealSlot::Lunch, DietaryPreference::Omnivore) => OMNIVORE_LUNCHES,
        (MealSlot::Lunch, DietaryPreference::Vegetarian) => VEGETARIAN_LUNCHES,
        (MealSlot::Dinner, DietaryPreference::Omnivore) => OMNIVORE_DINNERS,
        (MealSlot::Dinner, DietaryPreference::Vegetarian) => VEGETARIAN_DINNERS,
        (MealSlot::Snack, _) => SNACKS,
    }
}

/// Seven days of four meals. Templates rotate per day; each description
/// carries an `ingredients: [...]` block so extraction works offline too.
pub fn build_meal_plan(profile: &UserProfile, targets: &NutritionTargets) -> WeeklyMealPlan {
    let days = WEEK
        .iter()
        .enumerate()
        .map(|(day_index, day)| {
            let meals = MealSlot::DAILY
                .iter()
                .map(|slot| {
                    let options = templates_for(*slot, profile.dietary_preference);
                    let template = &options[day_index % options.len()];
                    let calories = (targets.daily_kcal * slot.calorie_share()).round() as u32;
                    Meal {
                        slot: *slot,
                        name: template.name.to_string(),
                        description: format!(
                            "About {} kcal. ingredients: [{}]",
                            calories, template.ingredients
                        ),
                        calories,
                    }
                })
                .collect();
            DayMeals { day: *day, meals }
        })
        .collect();

    WeeklyMealPlan { days }
}
