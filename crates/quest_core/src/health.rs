//! Diagnostics for a quest working root.

use crate::config::Config;
use crate::navigator::{Navigator, Position};
use crate::store::ProgressStore;
use std::env;
use std::path::{Path, PathBuf};

/// A single diagnostic line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheck {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl HealthCheck {
    fn pass(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            detail: detail.into(),
        }
    }

    fn fail(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            detail: detail.into(),
        }
    }
}

/// Report returned by [`diagnose`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthReport {
    /// Checks that must pass for quest commands to work.
    pub required: Vec<HealthCheck>,
    /// Advisory notes about the surrounding environment.
    pub environment: Vec<HealthCheck>,
}

impl HealthReport {
    /// Returns true if any required check failed.
    pub fn has_issues(&self) -> bool {
        self.required.iter().any(|c| !c.passed)
    }

    /// Returns a summary message.
    pub fn summary(&self) -> String {
        let failed: Vec<&str> = self
            .required
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.name.as_str())
            .collect();
        if failed.is_empty() {
            "All health checks passed.".to_string()
        } else {
            format!("Some health checks failed: {}", failed.join(", "))
        }
    }
}

/// Inspects the `.quest` folder under `root` and the environment.
pub fn diagnose(root: &Path, config: &Config) -> HealthReport {
    let mut report = HealthReport::default();
    let store = ProgressStore::at(root);

    report.required.push(if store.exists() {
        HealthCheck::pass(".quest folder", "exists")
    } else {
        HealthCheck::fail(".quest folder", "not found - run 'quest begin' to start")
    });
    for (name, path) in [
        ("plan.json", store.plan_path()),
        ("state.json", store.state_path()),
    ] {
        report.required.push(if path.is_file() {
            HealthCheck::pass(name, "exists")
        } else {
            HealthCheck::fail(name, "not found")
        });
    }

    let plan = match store.load_plan() {
        Ok(plan) => {
            report.required.push(HealthCheck::pass(
                "plan loading",
                format!("loaded successfully ({} tasks)", plan.number_of_tasks),
            ));
            Some(plan)
        }
        Err(e) => {
            report
                .required
                .push(HealthCheck::fail("plan loading", format!("failed to load: {}", e)));
            None
        }
    };

    match (store.load_state(), plan) {
        (Ok(state), Some(plan)) => {
            let total = plan.number_of_tasks;
            let index = state.current_task_index;
            report.required.push(match Navigator::new(plan, state, root).position() {
                Ok(Position::NotStarted) => {
                    HealthCheck::pass("state loading", format!("loaded successfully (not started, {} tasks)", total))
                }
                Ok(Position::OnTask(i)) => HealthCheck::pass(
                    "state loading",
                    format!("loaded successfully (task {}/{})", i + 1, total),
                ),
                Ok(Position::AllTasksComplete) => HealthCheck::pass(
                    "state loading",
                    format!("loaded successfully (all {} tasks done)", total),
                ),
                Err(e) => HealthCheck::fail("state loading", format!("index {}: {}", index, e)),
            });
        }
        (Ok(_), None) => report
            .required
            .push(HealthCheck::pass("state loading", "loaded successfully")),
        (Err(e), _) => report
            .required
            .push(HealthCheck::fail("state loading", format!("failed to load: {}", e))),
    }

    report.environment.push(if root.join(".git").exists() {
        HealthCheck::pass("git", "Git repository detected")
    } else {
        HealthCheck::fail("git", "Not in a git repository - version control recommended")
    });

    let command = &config.generator.command;
    report.environment.push(match find_program(command) {
        Some(path) => HealthCheck::pass("generator", format!("{} found at {}", command, path.display())),
        None => HealthCheck::fail(
            "generator",
            format!("{} not found on PATH - explain and check --annotate will not work", command),
        ),
    });

    report
}

/// Resolves a program name the way a shell would, without running it.
pub fn find_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths).find_map(|dir| {
        let full = dir.join(program);
        if full.is_file() {
            return Some(full);
        }
        #[cfg(windows)]
        {
            let exe = full.with_extension("exe");
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}
