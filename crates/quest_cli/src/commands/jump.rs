//! Jump to a task.

use super::{open, save};
use anyhow::{bail, Result};
use console::style;
use quest_core::QuestError;

/// `task` is the 1-based task number shown to the learner.
pub fn run(task: Option<usize>, last_complete: bool) -> Result<()> {
    let (store, mut nav) = open()?;

    let (index, title) = if last_complete {
        match nav.jump_to_last_completed() {
            Ok((index, task)) => (index, task.title.clone()),
            Err(err @ (QuestError::NoCompletedTasks | QuestError::CompletedTaskNotFound)) => {
                println!("{} {}", style("⚠").yellow(), capitalize(&err.to_string()));
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        }
    } else {
        let total = nav.plan().count_tasks();
        let Some(index) = task.and_then(|n| n.checked_sub(1)) else {
            bail!("task numbers run from 1 to {}", total);
        };
        match nav.jump_to(index) {
            Ok(task) => (index, task.title.clone()),
            Err(QuestError::OutOfRange { total, .. }) => {
                bail!("task index out of range (1-{})", total)
            }
            Err(err) => return Err(err.into()),
        }
    };

    save(&store, nav)?;
    println!(
        "{} Jumped to Task {}: {}",
        style("✓").green(),
        index + 1,
        title
    );
    super::hint("View task details with", "quest summary");
    Ok(())
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
