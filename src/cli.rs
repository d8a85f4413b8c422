use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate a weekly fitness and meal plan", long_about = None)]
pub struct Cli {
    /// Path to the user profile JSON file
    #[arg(short, long)]
    pub profile: PathBuf,

    /// Run with admin permissions (enables reset)
    #[arg(long)]
    pub admin: bool,

    /// Directory for stored plans; overrides FITPLAN_STORE_DIR
    #[arg(long)]
    pub store_dir: Option<PathBuf>,

    /// Write the shopping list as CSV to this file
    #[arg(long)]
    pub shopping_csv: Option<PathBuf>,

    /// Model id for ingredient extraction; overrides FITPLAN_MODEL
    #[arg(long)]
    pub model: Option<String>,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
