//! Diagnose the quest folder and environment.

use anyhow::Result;
use console::style;
use quest_core::{diagnose, Config, ProgressStore};
use std::path::Path;

pub fn run() -> Result<()> {
    let root = Path::new(".");
    let config = match Config::load(ProgressStore::at(root).dir()) {
        Ok(config) => config,
        Err(err) => {
            println!("{} {}; using defaults", style("⚠").yellow(), err);
            Config::default()
        }
    };
    let report = diagnose(root, &config);

    println!();
    println!("{}", style("Quest Health Check").bold().underlined());
    println!();
    for check in &report.required {
        if check.passed {
            println!("  {} {}: {}", style("✓").green(), check.name, check.detail);
        } else {
            println!("  {} {}: {}", style("×").red(), check.name, check.detail);
        }
    }

    println!();
    println!("{}", style("Environment Checks:").bold());
    for note in &report.environment {
        if note.passed {
            println!("  {} {}", style("✓").green(), note.detail);
        } else {
            println!("  {} {}", style("⚠").yellow(), note.detail);
        }
    }
    println!();

    if report.has_issues() {
        println!("{} {}", style("×").red(), report.summary());
        super::hint("Try running", "quest begin");
    } else {
        println!("{} {}", style("✓").green(), report.summary());
        super::hint("Continue your quest with", "quest next");
    }

    Ok(())
}
