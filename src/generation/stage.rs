use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of transitions between `Initialize` and `Complete`.
pub const TOTAL_STEPS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationStage {
    Initialize,
    NutritionCalculation,
    WorkoutPlan,
    MealPlan,
    ExtractIngredients,
    ShoppingList,
    Complete,
}

impl GenerationStage {
    pub const ALL: [GenerationStage; 7] = [
        GenerationStage::Initialize,
        GenerationStage::NutritionCalculation,
        GenerationStage::WorkoutPlan,
        GenerationStage::MealPlan,
        GenerationStage::ExtractIngredients,
        GenerationStage::ShoppingList,
        GenerationStage::Complete,
    ];

    pub fn index(self) -> u32 {
        match self {
            GenerationStage::Initialize => 0,
            GenerationStage::NutritionCalculation => 1,
            GenerationStage::WorkoutPlan => 2,
            GenerationStage::MealPlan => 3,
            GenerationStage::ExtractIngredients => 4,
            GenerationStage::ShoppingList => 5,
            GenerationStage::Complete => 6,
        }
    }

    pub fn from_index(index: i64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn next(self) -> Option<Self> {
        Self::from_index(i64::from(self.index()) + 1)
    }

    pub fn is_final(self) -> bool {
        self == GenerationStage::Complete
    }

    pub fn message(self) -> &'static str {
        match self {
            GenerationStage::Initialize => "Initializing your plan...",
            GenerationStage::NutritionCalculation => "Calculating your nutrition targets...",
            GenerationStage::WorkoutPlan => "Building your weekly workout plan...",
            GenerationStage::MealPlan => "Designing your meal plan...",
            GenerationStage::ExtractIngredients => "Extracting ingredients from your meals...",
            GenerationStage::ShoppingList => "Creating your shopping list...",
            GenerationStage::Complete => "Your plan is ready!",
        }
    }

    /// Rough wall time of this stage's own work, in seconds.
    fn stage_seconds(self) -> u32 {
        match self {
            GenerationStage::Initialize => 2,
            GenerationStage::NutritionCalculation => 5,
            GenerationStage::WorkoutPlan => 10,
            GenerationStage::MealPlan => 15,
            GenerationStage::ExtractIngredients => 75,
            GenerationStage::ShoppingList => 5,
            GenerationStage::Complete => 0,
        }
    }

    /// Estimate shown when a stage begins: its own time plus every later stage.
    pub fn estimated_remaining_seconds(self) -> u32 {
        Self::ALL
            .iter()
            .filter(|s| s.index() >= self.index())
            .map(|s| s.stage_seconds())
            .sum()
    }
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GenerationStage::Initialize => "initialize",
            GenerationStage::NutritionCalculation => "nutrition calculation",
            GenerationStage::WorkoutPlan => "workout plan",
            GenerationStage::MealPlan => "meal plan",
            GenerationStage::ExtractIngredients => "ingredient extraction",
            GenerationStage::ShoppingList => "shopping list",
            GenerationStage::Complete => "complete",
        };
        f.write_str(label)
    }
}
