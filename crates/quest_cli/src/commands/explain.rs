//! Insert hints for the current task.

use super::check::existing;
use super::{open, save, spinner};
use anyhow::{bail, Result};
use console::style;
use quest_core::{request, CommandGenerator, FeedbackRequest, Patcher, Position, QuestError};

pub fn run() -> Result<()> {
    let (store, mut nav) = open()?;
    let config = store.config()?;

    let total = nav.plan().count_tasks();
    let task = match nav.position()? {
        Position::AllTasksComplete => None,
        _ => nav.plan().task(nav.state().current_task_index).cloned(),
    }
    .ok_or(QuestError::NoActiveTask { total })?;

    let files = existing(store.root(), &task.artifacts);
    if files.is_empty() {
        bail!(
            "none of this task's files exist yet ({})",
            task.artifacts.join(", ")
        );
    }

    let (_, attempt) = nav.begin_explain()?;
    let index = nav.state().current_task_index;
    save(&store, nav)?;

    let generator = CommandGenerator::from_config(&config.generator);
    let pb = spinner(&format!("Looking at your code (attempt {})...", attempt))?;
    let hints = request(&generator, &FeedbackRequest::hint(&task, files, attempt));
    pb.finish_and_clear();
    let hints = hints?;

    if hints.is_empty() {
        println!(
            "{} No hints for Task {}. Your code looks on track.",
            style("✓").green(),
            index + 1
        );
        return Ok(());
    }

    let patch = Patcher::new(config.annotate.marker.clone()).apply(&hints, store.root())?;
    println!(
        "{} Added {} hint(s) to {} file(s)",
        style("✓").green(),
        patch.inserted,
        patch.files_patched
    );
    if patch.dropped > 0 {
        println!(
            "  {} {} hint(s) pointed past the end of a file",
            style("⚠").yellow(),
            patch.dropped
        );
    }
    super::hint("When ready, run", "quest check");

    Ok(())
}
