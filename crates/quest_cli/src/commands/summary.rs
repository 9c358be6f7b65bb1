//! Show quest progress.

use super::open;
use anyhow::Result;
use console::style;
use quest_core::{Progress, Summary};

fn glyph(progress: Progress) -> console::StyledObject<&'static str> {
    match progress {
        Progress::Done => style("✔").green(),
        Progress::Current => style("→").magenta(),
        Progress::Pending => style("○").dim(),
    }
}

pub fn run() -> Result<()> {
    let (_store, nav) = open()?;
    nav.position()?;
    let summary = Summary::build(nav.plan(), nav.state());

    println!();
    println!("{}", style("Quest Progress").bold().underlined());
    println!("{}", style(&summary.name).bold());
    if !summary.description.is_empty() {
        println!("{}", style(&summary.description).dim());
    }
    println!(
        "{}",
        style(format!("{} • {}", summary.tier, summary.focus.join(", "))).dim()
    );
    println!();

    if let Some(current) = &summary.current {
        if summary.chapters.len() > 1 {
            println!("{}", style("Chapters:").bold());
            for (i, chapter) in summary.chapters.iter().enumerate() {
                println!(
                    "  {} Chapter {}: {}",
                    glyph(chapter.progress),
                    i + 1,
                    chapter.title
                );
            }
            println!();
        }

        println!("{}", style("Current Chapter:").bold());
        println!(
            "  {}",
            style(format!(
                "Chapter {}: {}",
                current.chapter + 1,
                current.chapter_title
            ))
            .magenta()
        );
        println!("    {}", style(format!("Quest: {}", current.quest_title)).dim());
        println!();
        for task in &current.tasks {
            println!("      {} {}", glyph(task.progress), task.title);
        }
        println!();
    }

    println!(
        "{}",
        style(format!(
            "Completed: {} / {} tasks",
            summary.completed, summary.total
        ))
        .dim()
    );
    if summary.all_complete {
        println!(
            "{} All tasks completed! Run {}",
            style("✓").green(),
            style("quest complete").cyan()
        );
    } else {
        super::hint("Next action: run", "quest check");
    }
    println!();

    Ok(())
}
