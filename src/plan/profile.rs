use serde::{Deserialize, Serialize};

use crate::errors::GenerationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
    ExtraActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessGoal {
    WeightLoss,
    Maintenance,
    MuscleGain,
    Endurance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietaryPreference {
    #[default]
    Omnivore,
    Vegetarian,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub age: u32,
    pub sex: Sex,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub activity_level: ActivityLevel,
    pub goal: FitnessGoal,
    pub workout_days_per_week: u8,
    #[serde(default)]
    pub dietary_preference: DietaryPreference,
}

impl UserProfile {
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.user_id.trim().is_empty() {
            return Err(GenerationError::InvalidProfile("user id is empty".to_string()));
        }
        if !(13..=100).contains(&self.age) {
            return Err(GenerationError::InvalidProfile(format!(
                "age {} outside 13-100",
                self.age
            )));
        }
        if !(100.0..=250.0).contains(&self.height_cm) {
            return Err(GenerationError::InvalidProfile(format!(
                "height {} cm outside 100-250",
                self.height_cm
            )));
        }
        if !(30.0..=300.0).contains(&self.weight_kg) {
            return Err(GenerationError::InvalidProfile(format!(
                "weight {} kg outside 30-300",
                self.weight_kg
            )));
        }
        if !(1..=7).contains(&self.workout_days_per_week) {
            return Err(GenerationError::InvalidProfile(format!(
                "{} workout days per week outside 1-7",
                self.workout_days_per_week
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample_profile() -> UserProfile {
    UserProfile {
        user_id: "user-1".to_string(),
        age: 30,
        sex: Sex::Male,
        height_cm: 180.0,
        weight_kg: 80.0,
        activity_level: ActivityLevel::ModeratelyActive,
        goal: FitnessGoal::Maintenance,
        workout_days_per_week: 3,
        dietary_preference: DietaryPreference::Omnivore,
    }
}
