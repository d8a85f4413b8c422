//! Stage generators and the payloads they produce.

pub mod meals;
pub mod nutrition;
pub mod profile;
pub mod shopping;
pub mod workout;

use serde::{Deserialize, Serialize};

use crate::extraction::CategorizedIngredientList;
use crate::generation::GenerationStage;
use meals::WeeklyMealPlan;
use nutrition::NutritionTargets;
use shopping::ShoppingList;
use workout::WorkoutPlan;

pub use profile::UserProfile;

/// What a stage hands to the persistence layer. Stages without output
/// (initialize, complete) have no variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum StageOutput {
    Nutrition(NutritionTargets),
    Workout(WorkoutPlan),
    Meals(WeeklyMealPlan),
    Ingredients(CategorizedIngredientList),
    Shopping(ShoppingList),
}

impl StageOutput {
    pub fn stage(&self) -> GenerationStage {
        match self {
            StageOutput::Nutrition(_) => GenerationStage::NutritionCalculation,
            StageOutput::Workout(_) => GenerationStage::WorkoutPlan,
            StageOutput::Meals(_) => GenerationStage::MealPlan,
            StageOutput::Ingredients(_) => GenerationStage::ExtractIngredients,
            StageOutput::Shopping(_) => GenerationStage::ShoppingList,
        }
    }
}

/// Outputs gathered so far in one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanDraft {
    pub nutrition: Option<NutritionTargets>,
    pub workout: Option<WorkoutPlan>,
    pub meals: Option<WeeklyMealPlan>,
    pub ingredients: Option<CategorizedIngredientList>,
    pub shopping: Option<ShoppingList>,
}

impl PlanDraft {
    pub fn record(&mut self, output: StageOutput) {
        match output {
            StageOutput::Nutrition(v) => self.nutrition = Some(v),
            StageOutput::Workout(v) => self.workout = Some(v),
            StageOutput::Meals(v) => self.meals = Some(v),
            StageOutput::Ingredients(v) => self.ingredients = Some(v),
            StageOutput::Shopping(v) => self.shopping = Some(v),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.nutrition.is_some()
            && self.workout.is_some()
            && self.meals.is_some()
            && self.ingredients.is_some()
            && self.shopping.is_some()
    }
}
