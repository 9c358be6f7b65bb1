//! Start a new quest.

use anyhow::{Context, Result};
use console::style;
use quest_core::{Catalog, Config, ProgressStore, State, TemplateSource, Tier};

/// Start a quest in the current directory, or list templates.
pub fn run(template: Option<&str>, list: bool) -> Result<()> {
    let store = ProgressStore::at(".");
    let config = Config::load(store.dir())?;
    let catalog = Catalog::new(config.templates.directory.clone());

    if list {
        println!("{}", style("Available templates:").bold());
        for info in catalog.list() {
            println!(
                "  {} {} - {}",
                style("•").dim(),
                style(&info.name).cyan(),
                info.title
            );
            println!(
                "    {}",
                style(format!("{} ({} tasks, {})", info.description, info.tasks, info.tier)).dim()
            );
        }
        return Ok(());
    }

    let name = template.unwrap_or(&config.templates.default);
    let mut plan = catalog.load(name)?;

    let store = ProgressStore::init(".")?;
    if let Err(err) = store.save(&State::new(), &mut plan) {
        println!("{} Removing .quest folder after failed write", style("⚠").yellow());
        store.destroy().context("Failed to remove .quest folder")?;
        return Err(err.into());
    }

    println!(
        "{} Quest ready: {}",
        style("✓").green(),
        style(&plan.journey.name).bold()
    );
    if !plan.journey.description.is_empty() {
        println!("  {}", style(&plan.journey.description).dim());
    }
    println!(
        "  {}",
        style(format!(
            "{} • {} tasks • {}",
            Tier::for_task_count(plan.number_of_tasks),
            plan.number_of_tasks,
            plan.journey.focus.join(", ")
        ))
        .dim()
    );
    println!();
    super::hint("Ready to start? Run", "quest next");

    Ok(())
}
