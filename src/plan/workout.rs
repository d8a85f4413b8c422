use chrono::Weekday;
use serde::{Deserialize, Serialize};

use super::profile::{FitnessGoal, UserProfile};

pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub sets: u8,
    pub reps: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub name: String,
    pub focus: String,
    pub duration_minutes: u32,
    pub exercises: Vec<Exercise>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDay {
    pub day: Weekday,
    /// `None` is a rest day.
    pub session: Option<WorkoutSession>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub days: Vec<WorkoutDay>,
}

impl WorkoutPlan {
    pub fn training_days(&self) -> impl Iterator<Item = &WorkoutDay> {
        self.days.iter().filter(|d| d.session.is_some())
    }

    pub fn total_minutes(&self) -> u32 {
        self.training_days()
            .filter_map(|d| d.session.as_ref())
            .map(|s| s.duration_minutes)
            .sum()
    }
}

/// Training days spread over the week so sessions are separated by rest
/// wherever the count allows it.
pub fn training_weekdays(days_per_week: u8) -> Vec<Weekday> {
    use Weekday::*;
    match days_per_week {
        0 => vec![],
        1 => vec![Mon],
        2 => vec![Mon, Thu],
        3 => vec![Mon, Wed, Fri],
        4 => vec![Mon, Tue, Thu, Fri],
        5 => vec![Mon, Tue, Wed, Fri, Sat],
        6 => vec![Mon, Tue, Wed, Thu, Fri, Sat],
        _ => WEEK.to_vec(),
    }
}

fn exercise(name: &str, sets: u8, reps: &str) -> Exercise {
    Exercise {
        name: name.to_string(),
        sets,
        reps: reps.to_string(),
    }
}

fn session_rotation(goal: FitnessGoal) -> Vec<WorkoutSession> {
    match goal {
        FitnessGoal::MuscleGain | FitnessGoal::Maintenance => vec![
            WorkoutSession {
                name: "Upper Body Strength".to_string(),
                focus: "push/pull".to_string(),
                duration_minutes: 60,
                exercises: vec![
                    exercise("Bench Press", 4, "6-8"),
                    exercise("Bent-over Row", 4, "8-10"),
                    exercise("Overhead Press", 3, "8-10"),
                    exercise("Pull-up", 3, "AMRAP"),
                ],
            },
            WorkoutSession {
                name: "Lower Body Strength".to_string(),
                focus: "legs".to_string(),
                duration_minutes: 60,
                exercises: vec![
                    exercise("Back Squat", 4, "6-8"),
                    exercise("Romanian Deadlift", 3, "8-10"),
                    exercise("Walking Lunge", 3, "12"),
                    exercise("Calf Raise", 3, "15"),
                ],
            },
            WorkoutSession {
                name: "Full Body Conditioning".to_string(),
                focus: "conditioning".to_string(),
                duration_minutes: 45,
                exercises: vec![
                    exercise("Kettlebell Swing", 4, "15"),
                    exercise("Push-up", 3, "AMRAP"),
                    exercise("Goblet Squat", 3, "12"),
                    exercise("Plank", 3, "45s"),
                ],
            },
        ],
        FitnessGoal::WeightLoss => vec![
            WorkoutSession {
                name: "Circuit Training".to_string(),
                focus: "fat loss".to_string(),
                duration_minutes: 45,
                exercises: vec![
                    exercise("Jump Squat", 3, "15"),
                    exercise("Mountain Climber", 3, "30s"),
                    exercise("Dumbbell Thruster", 3, "12"),
                    exercise("Burpee", 3, "10"),
                ],
            },
            WorkoutSession {
                name: "Steady-State Cardio".to_string(),
                focus: "aerobic base".to_string(),
                duration_minutes: 40,
                exercises: vec![exercise("Brisk Walk or Cycle", 1, "40 min")],
            },
        ],
        FitnessGoal::Endurance => vec![
            WorkoutSession {
                name: "Interval Run".to_string(),
                focus: "speed".to_string(),
                duration_minutes: 45,
                exercises: vec![
                    exercise("Warm-up Jog", 1, "10 min"),
                    exercise("400m Repeat", 6, "1"),
                    exercise("Cool-down Jog", 1, "10 min"),
                ],
            },
            WorkoutSession {
                name: "Long Easy Run".to_string(),
                focus: "aerobic base".to_string(),
                duration_minutes: 75,
                exercises: vec![exercise("Easy Run", 1, "75 min")],
            },
            WorkoutSession {
                name: "Strength for Runners".to_string(),
                focus: "stability".to_string(),
                duration_minutes: 40,
                exercises: vec![
                    exercise("Single-leg Deadlift", 3, "10"),
                    exercise("Step-up", 3, "12"),
                    exercise("Side Plank", 3, "30s"),
                ],
            },
        ],
    }
}

/// Lays sessions onto the week, rotating through the goal's templates.
pub fn build_workout_plan(profile: &UserProfile) -> WorkoutPlan {
    let training = training_weekdays(profile.workout_days_per_week);
    let rotation = session_rotation(profile.goal);
    let mut next_session = rotation.iter().cycle();

    let days = WEEK
        .iter()
        .map(|day| WorkoutDay {
            day: *day,
            session: if training.contains(day) {
                next_session.next().cloned()
            } else {
                None
            },
        })
        .collect();

    WorkoutPlan { days }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::profile::sample_profile;

    #[test]
    fn test_week_has_seven_ordered_days() {
        let plan = build_workout_plan(&sample_profile());
        let days: Vec<Weekday> = plan.days.iter().map(|d| d.day).collect();
        assert_eq!(days, WEEK.to_vec());
    }

    #[test]
    fn test_training_days_match_request() {
        for n in 1..=7u8 {
            let profile = UserProfile {
                workout_days_per_week: n,
                ..sample_profile()
            };
            let plan = build_workout_plan(&profile);
            assert_eq!(plan.training_days().count(), n as usize);
        }
    }

    #[test]
    fn test_rotation_cycles_sessions() {
        let profile = UserProfile {
            workout_days_per_week: 4,
            ..sample_profile()
        };
        let plan = build_workout_plan(&profile);
        let names: Vec<&str> = plan
            .training_days()
            .map(|d| d.session.as_ref().unwrap().name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "Upper Body Strength",
                "Lower Body Strength",
                "Full Body Conditioning",
                "Upper Body Strength"
            ]
        );
        assert_eq!(plan.total_minutes(), 225);
    }
}
