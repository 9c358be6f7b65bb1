//! CLI commands.

pub mod begin;
pub mod check;
pub mod complete;
pub mod explain;
pub mod health;
pub mod jump;
pub mod next;
pub mod summary;

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use quest_core::{Navigator, ProgressStore, Task};
use std::io::{self, Write};

/// Opens the quest in the current directory.
pub(crate) fn open() -> Result<(ProgressStore, Navigator)> {
    let store = ProgressStore::open(".")?;
    let (state, plan) = store.load()?;
    let nav = Navigator::new(plan, state, store.root());
    Ok((store, nav))
}

/// Persists the navigator's documents.
pub(crate) fn save(store: &ProgressStore, nav: Navigator) -> Result<()> {
    let (state, mut plan) = nav.into_parts();
    store.save(&state, &mut plan)?;
    Ok(())
}

/// Asks a y/N question on stdin. Anything but `y` is a no.
pub(crate) fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N]: ", question);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Starts a spinner; callers must finish it before touching files.
pub(crate) fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(pb)
}

/// Prints a task with its steps and files.
pub(crate) fn print_task(index: usize, task: &Task) {
    println!();
    println!(
        "{} {}",
        style(format!("Task {}:", index + 1)).magenta().bold(),
        style(&task.title).bold()
    );
    if !task.objective.is_empty() {
        println!("{}", style(&task.objective).dim());
    }
    println!();

    if !task.steps.is_empty() {
        println!("{}", style("Steps:").magenta());
        for (i, step) in task.steps.iter().enumerate() {
            println!("  {}. {}", i + 1, step);
        }
        println!();
    }

    if !task.artifacts.is_empty() {
        println!("{}", style("Files to create:").magenta());
        for artifact in &task.artifacts {
            println!("  {} {}", style("•").dim(), artifact);
        }
        println!();
    }
}

/// Prints a `→ <label> <command>` hint line.
pub(crate) fn hint(label: &str, command: &str) {
    println!("{} {} {}", style("→").cyan(), label, style(command).cyan());
}
