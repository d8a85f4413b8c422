use anyhow::{Context, Result};
use fitplan::cli::parse_args;
use fitplan::config::AppConfig;
use fitplan::extraction::IngredientExtractor;
use fitplan::generation::{Caller, GenerationProgress, GenerationStage, PlanGenerationService, RunState};
use fitplan::plan::{PlanDraft, UserProfile};
use fitplan::presentation::{available_actions, render_progress, support_notice};
use fitplan::store::JsonFilePlanStore;
use std::sync::Arc;
use tokio::fs;

/// Key for deciding when a snapshot is worth printing; countdown ticks alone
/// are not.
fn milestone(progress: &GenerationProgress) -> (GenerationStage, bool, bool, Option<String>) {
    (
        progress.current_step,
        progress.is_complete,
        progress.is_cancelled,
        progress.error.clone(),
    )
}

fn print_summary(draft: &PlanDraft) {
    if let Some(targets) = &draft.nutrition {
        println!(
            "Daily target: {} kcal (protein {} g, carbs {} g, fat {} g)",
            targets.daily_kcal, targets.protein_g, targets.carbs_g, targets.fat_g
        );
    }
    if let Some(workout) = &draft.workout {
        println!(
            "Workouts: {} sessions, {} minutes per week",
            workout.training_days().count(),
            workout.total_minutes()
        );
    }
    if let Some(ingredients) = &draft.ingredients {
        println!("Ingredients extracted: {}", ingredients.total_count());
        if let Some(err) = ingredients.error() {
            println!("  note: {}", err);
        }
    }
    if let Some(shopping) = &draft.shopping {
        println!("Shopping list items: {}", shopping.item_count());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = parse_args();
    let mut config = AppConfig::from_env().context("Failed to load configuration")?;
    if let Some(dir) = &cli.store_dir {
        config.store_dir = dir.clone();
    }
    if let Some(model) = &cli.model {
        config.extraction.model = model.clone();
    }

    let profile_json = fs::read_to_string(&cli.profile)
        .await
        .with_context(|| format!("Failed to read profile file '{}'", cli.profile.display()))?;
    let profile: UserProfile = serde_json::from_str(&profile_json)
        .with_context(|| format!("Failed to parse profile file '{}'", cli.profile.display()))?;
    let user_id = profile.user_id.clone();
    let caller = if cli.admin {
        Caller::admin(user_id.clone())
    } else {
        Caller::user(user_id.clone())
    };

    let extractor = IngredientExtractor::new(Arc::new(config.provider()), config.extraction.clone());
    let store = Arc::new(JsonFilePlanStore::new(config.store_dir.clone()));
    let service = PlanGenerationService::new(extractor, store);

    let tracker = service
        .start(profile)
        .with_context(|| format!("Failed to start plan generation for '{}'", user_id))?;
    let mut updates = tracker.subscribe();
    let mut last_milestone = None;
    let mut interrupt_seen = false;

    loop {
        let progress = updates.borrow_and_update().clone();
        let key = milestone(&progress);
        if last_milestone.as_ref() != Some(&key) {
            println!("{}", render_progress(&progress));
            last_milestone = Some(key);
        }
        if progress.is_terminal() && !progress.is_generating {
            break;
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            signal = tokio::signal::ctrl_c(), if !interrupt_seen => {
                interrupt_seen = true;
                signal.context("Failed to listen for Ctrl-C")?;
                println!("Cancelling plan generation...");
                service.cancel(&user_id)?;
            }
        }
    }

    let state = service.wait(&user_id).await?;
    let progress = tracker.get_progress();
    match &state {
        RunState::Complete => {
            if let Some(draft) = service.draft(&user_id) {
                print_summary(&draft);
                if let (Some(path), Some(shopping)) = (&cli.shopping_csv, &draft.shopping) {
                    let file = std::fs::File::create(path)
                        .with_context(|| format!("Failed to create '{}'", path.display()))?;
                    shopping
                        .write_csv(file)
                        .with_context(|| format!("Failed to write shopping list to '{}'", path.display()))?;
                    println!("Shopping list written to {}", path.display());
                }
            }
        }
        RunState::Failed { .. } => {
            let actions: Vec<String> = available_actions(&progress, &caller)
                .iter()
                .map(ToString::to_string)
                .collect();
            println!("Plan generation stopped: {}", state);
            println!("Available actions: {}", actions.join(", "));
            if let Some(notice) = support_notice(&caller) {
                println!("{}", notice);
            }
        }
        other => println!("Plan generation {}", other),
    }

    Ok(())
}
