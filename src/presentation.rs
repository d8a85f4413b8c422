//! Plain-text rendering of generation progress and the controls a caller
//! may use on it.

use std::fmt;

use crate::generation::{Caller, GenerationProgress};

const BAR_WIDTH: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Cancel,
    Continue,
    Reset,
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlAction::Cancel => f.write_str("cancel"),
            ControlAction::Continue => f.write_str("continue"),
            ControlAction::Reset => f.write_str("reset"),
        }
    }
}

pub fn render_progress(progress: &GenerationProgress) -> String {
    let percentage = progress.percentage();
    let filled = usize::from(percentage) * BAR_WIDTH / 100;
    let bar = format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled));
    let mut line = format!(
        "{} {:>3}% step {}/{}",
        bar,
        percentage,
        progress.current_step.index(),
        progress.total_steps
    );

    if let Some(err) = &progress.error {
        line.push_str(&format!(" error: {}", err));
        return line;
    }
    if !progress.step_message.is_empty() {
        line.push_str(&format!(" {}", progress.step_message));
    }
    if progress.is_generating && progress.estimated_time_remaining_seconds > 0 {
        line.push_str(&format!(
            " (about {} left)",
            format_remaining(progress.estimated_time_remaining_seconds)
        ));
    }
    line
}

fn format_remaining(seconds: u32) -> String {
    if seconds >= 60 {
        format!("{}m {:02}s", seconds / 60, seconds % 60)
    } else {
        format!("{}s", seconds)
    }
}

pub fn available_actions(progress: &GenerationProgress, caller: &Caller) -> Vec<ControlAction> {
    let mut actions = Vec::new();
    if progress.is_generating {
        actions.push(ControlAction::Cancel);
    }
    if progress.error.is_some() && !progress.is_generating {
        actions.push(ControlAction::Continue);
    }
    if caller.is_admin {
        actions.push(ControlAction::Reset);
    }
    actions
}

pub fn support_notice(caller: &Caller) -> Option<String> {
    if caller.is_admin {
        None
    } else {
        Some("If the problem persists, please contact support to reset your plan.".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GenerationStage;

    fn generating(stage: GenerationStage) -> GenerationProgress {
        GenerationProgress {
            current_step: stage,
            step_message: stage.message().to_string(),
            estimated_time_remaining_seconds: stage.estimated_remaining_seconds(),
            is_generating: true,
            ..GenerationProgress::idle()
        }
    }

    #[test]
    fn test_render_in_flight() {
        let line = render_progress(&generating(GenerationStage::MealPlan));
        assert!(line.starts_with("[############------------]"));
        assert!(line.contains(" 50% step 3/6"));
        assert!(line.contains("Designing your meal plan..."));
        assert!(line.contains("about 1m 35s left"), "{}", line);
    }

    #[test]
    fn test_render_error_replaces_message() {
        let progress = GenerationProgress {
            error: Some("store offline".to_string()),
            ..generating(GenerationStage::WorkoutPlan)
        };
        let line = render_progress(&progress);
        assert!(line.ends_with("error: store offline"));
        assert!(!line.contains("left"));
    }

    #[test]
    fn test_actions_by_state_and_role() {
        let user = Caller::user("u1");
        let admin = Caller::admin("ops");

        let running = generating(GenerationStage::Initialize);
        assert_eq!(available_actions(&running, &user), vec![ControlAction::Cancel]);

        let failed = GenerationProgress {
            is_generating: false,
            error: Some("boom".to_string()),
            ..running.clone()
        };
        assert_eq!(available_actions(&failed, &user), vec![ControlAction::Continue]);
        assert_eq!(
            available_actions(&failed, &admin),
            vec![ControlAction::Continue, ControlAction::Reset]
        );
    }

    #[test]
    fn test_support_notice_only_for_non_admins() {
        assert!(support_notice(&Caller::user("u1")).unwrap().contains("contact support"));
        assert!(support_notice(&Caller::admin("ops")).is_none());
    }
}
