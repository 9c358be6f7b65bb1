//! Advance to the next task.

use super::{confirm, open, print_task, save};
use anyhow::Result;
use console::style;
use quest_core::Advance;

pub fn run(yes: bool) -> Result<()> {
    let (store, mut nav) = open()?;

    if let Some(check) = nav.advance_guard() {
        println!(
            "{} The previous check didn't pass ({}: {}).",
            style("⚠").yellow(),
            check.status,
            check.message
        );
        if !yes && !confirm("Continue without passing the check?")? {
            println!(
                "{} Run {} to validate your progress first.",
                style("→").cyan(),
                style("quest check").cyan()
            );
            return Ok(());
        }
    }

    let outcome = nav.advance()?;
    let index = nav.state().current_task_index;
    let task = nav.plan().task(index).cloned();
    save(&store, nav)?;

    match (outcome, task) {
        (Advance::AlreadyComplete { .. }, _) | (Advance::Finished { .. }, _) => {
            println!(
                "{} You've reached the end of the quest! Run {} when done.",
                style("✓").green(),
                style("quest complete").cyan()
            );
        }
        (_, Some(task)) => {
            print_task(index, &task);
            super::hint("When ready, run", "quest check");
        }
        (_, None) => {}
    }

    Ok(())
}
