//! Validate the current task.

use super::{open, save, spinner};
use anyhow::Result;
use console::style;
use quest_core::{request, CheckStatus, CommandGenerator, FeedbackRequest, Patcher};
use std::path::Path;

pub fn run(annotate: bool) -> Result<()> {
    let (store, mut nav) = open()?;
    let config = store.config()?;

    let report = nav.check()?;

    println!();
    println!(
        "{} {}",
        style(format!("Checking Task {}:", report.task_index + 1)).bold(),
        report.task_title
    );
    for rule in &report.rules {
        if rule.passed() {
            println!("  {} {}", style("✓").green(), rule.label);
        } else {
            println!("  {} {} - {}", style("×").red(), rule.label, rule.detail());
            if !rule.description.is_empty() {
                println!("    {}", style(&rule.description).dim());
            }
        }
    }
    println!();

    if annotate {
        let task = nav
            .plan()
            .task(report.task_index)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("task {} disappeared", report.task_index + 1))?;
        let files = existing(store.root(), &task.artifacts);
        let generator = CommandGenerator::from_config(&config.generator);

        let pb = spinner("Reviewing your code...")?;
        let feedback = request(&generator, &FeedbackRequest::review(&task, files));
        pb.finish_and_clear();

        match feedback {
            Ok(annotations) => {
                let patch = Patcher::new(config.annotate.marker.clone()).apply(&annotations, store.root())?;
                nav.apply_feedback_verdict(annotations.iter().filter_map(|a| a.kind));
                println!(
                    "{} Added {} comment(s) to {} file(s)",
                    style("→").cyan(),
                    patch.inserted,
                    patch.files_patched
                );
            }
            Err(err) => {
                println!("{} Feedback unavailable: {}", style("⚠").yellow(), err);
            }
        }
    }

    let status = nav
        .state()
        .last_check
        .as_ref()
        .map(|c| c.status)
        .unwrap_or(report.result.status);
    save(&store, nav)?;

    match status {
        CheckStatus::Pass => {
            println!("{} {}", style("✓").green(), report.result.message);
            super::hint("Move on with", "quest next");
        }
        CheckStatus::Warn => {
            println!(
                "{} Checks passed with warnings. See the comments in your files.",
                style("⚠").yellow()
            );
            super::hint("Move on with", "quest next");
        }
        CheckStatus::Fail => {
            if report.all_passed() {
                println!(
                    "{} Rules passed, but the review found errors. See the comments in your files.",
                    style("×").red()
                );
            } else {
                println!("{} {}", style("×").red(), report.result.message);
            }
            super::hint("Need a nudge? Run", "quest explain");
        }
    }

    Ok(())
}

/// Artifacts that exist under `root`.
pub(crate) fn existing(root: &Path, artifacts: &[String]) -> Vec<String> {
    artifacts
        .iter()
        .filter(|a| root.join(a).is_file())
        .cloned()
        .collect()
}
