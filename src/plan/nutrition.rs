use serde::{Deserialize, Serialize};

use super::profile::{ActivityLevel, FitnessGoal, Sex, UserProfile};

/// Atwater factors, kcal per gram.
const KCAL_PER_G_PROTEIN: f64 = 4.0;
const KCAL_PER_G_CARB: f64 = 4.0;
const KCAL_PER_G_FAT: f64 = 9.0;

const FAT_SHARE_OF_KCAL: f64 = 0.25;
const MIN_DAILY_KCAL: f64 = 1200.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionTargets {
    pub bmr_kcal: f64,
    pub tdee_kcal: f64,
    pub daily_kcal: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

/// Mifflin-St Jeor: 10·kg + 6.25·cm − 5·age, +5 for men, −161 for women.
pub fn basal_metabolic_rate(profile: &UserProfile) -> f64 {
    let base = 10.0 * profile.weight_kg + 6.25 * profile.height_cm - 5.0 * f64::from(profile.age);
    match profile.sex {
        Sex::Male => base + 5.0,
        Sex::Female => base - 161.0,
    }
}

pub fn activity_factor(level: ActivityLevel) -> f64 {
    match level {
        ActivityLevel::Sedentary => 1.2,
        ActivityLevel::LightlyActive => 1.375,
        ActivityLevel::ModeratelyActive => 1.55,
        ActivityLevel::VeryActive => 1.725,
        ActivityLevel::ExtraActive => 1.9,
    }
}

fn goal_adjustment_kcal(goal: FitnessGoal) -> f64 {
    match goal {
        FitnessGoal::WeightLoss => -500.0,
        FitnessGoal::Maintenance => 0.0,
        FitnessGoal::MuscleGain => 300.0,
        FitnessGoal::Endurance => 200.0,
    }
}

fn protein_g_per_kg(goal: FitnessGoal) -> f64 {
    match goal {
        FitnessGoal::WeightLoss => 2.0,
        FitnessGoal::MuscleGain => 1.8,
        FitnessGoal::Endurance => 1.6,
        FitnessGoal::Maintenance => 1.6,
    }
}

pub fn calculate_nutrition_targets(profile: &UserProfile) -> NutritionTargets {
    let bmr = basal_metabolic_rate(profile);
    let tdee = bmr * activity_factor(profile.activity_level);
    let daily_kcal = (tdee + goal_adjustment_kcal(profile.goal)).max(MIN_DAILY_KCAL);

    let protein_g = profile.weight_kg * protein_g_per_kg(profile.goal);
    let fat_g = daily_kcal * FAT_SHARE_OF_KCAL / KCAL_PER_G_FAT;
    let remaining_kcal = daily_kcal - protein_g * KCAL_PER_G_PROTEIN - fat_g * KCAL_PER_G_FAT;
    let carbs_g = (remaining_kcal / KCAL_PER_G_CARB).max(0.0);

    NutritionTargets {
        bmr_kcal: bmr.round(),
        tdee_kcal: tdee.round(),
        daily_kcal: daily_kcal.round(),
        protein_g: protein_g.round(),
        carbs_g: carbs_g.round(),
        fat_g: fat_g.round(),
    }
}
