//! End the quest.

use super::{confirm, open};
use anyhow::{Context, Result};
use console::style;

pub fn run(yes: bool) -> Result<()> {
    let (store, nav) = open()?;
    let completion = nav.completion();

    if completion.all_completed {
        println!(
            "{} All {} tasks completed!",
            style("✓").green(),
            completion.total
        );
    } else {
        println!(
            "{} You've completed {} of {} tasks.",
            style("⚠").yellow(),
            completion.completed,
            completion.total
        );
    }

    if !yes && !confirm("Remove the .quest folder and end this quest?")? {
        println!("{} Quest completion cancelled.", style("✓").green());
        return Ok(());
    }

    store
        .destroy()
        .context("Failed to remove .quest folder; try deleting it manually")?;

    if completion.all_completed {
        println!("{} Quest completed! All files cleaned up.", style("✓").green());
    } else {
        println!("{} Quest marked as complete. Files cleaned up.", style("✓").green());
        println!(
            "  You completed {} of {} tasks.",
            completion.completed, completion.total
        );
    }
    Ok(())
}
