//! Quest CLI - guided coding quests in your own project folder.

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use quest_core::QuestError;

mod commands;

#[derive(Parser)]
#[command(name = "quest")]
#[command(about = "Learn by building: guided tasks, hints, and instant validation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new quest from a template
    Begin {
        /// Template name (defaults to [templates] default in config)
        #[arg(short, long)]
        template: Option<String>,
        /// List available templates and exit
        #[arg(long)]
        list: bool,
    },
    /// Move to the next task
    Next {
        /// Advance without asking, even if the last check did not pass
        #[arg(short, long)]
        yes: bool,
    },
    /// Validate the current task
    Check {
        /// Ask the feedback generator to annotate your files
        #[arg(short, long)]
        annotate: bool,
    },
    /// Jump to a task number or the last completed task
    JumpTo {
        /// Task number (1-based)
        #[arg(required_unless_present = "last_complete")]
        task: Option<usize>,
        /// Jump to the last completed task
        #[arg(short, long, conflicts_with = "task")]
        last_complete: bool,
    },
    /// End the quest and remove the .quest folder
    Complete {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show progress through the plan
    Summary,
    /// Diagnose the .quest folder and environment
    Health,
    /// Insert hints for the current task into your files
    Explain,
}

fn main() {
    // Initialize tracing subscriber
    // Respects RUST_LOG environment variable (e.g., RUST_LOG=debug)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli.command) {
        eprintln!("{} {:#}", style("×").red().bold(), err);
        if let Some(tip) = err
            .downcast_ref::<QuestError>()
            .and_then(QuestError::recovery_suggestion)
        {
            eprintln!("  {} {}", style("Tip:").cyan(), tip);
        }
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Begin { template, list } => commands::begin::run(template.as_deref(), list),
        Commands::Next { yes } => commands::next::run(yes),
        Commands::Check { annotate } => commands::check::run(annotate),
        Commands::JumpTo {
            task,
            last_complete,
        } => commands::jump::run(task, last_complete),
        Commands::Complete { yes } => commands::complete::run(yes),
        Commands::Summary => commands::summary::run(),
        Commands::Health => commands::health::run(),
        Commands::Explain => commands::explain::run(),
    }
}
