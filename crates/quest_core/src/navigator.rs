//! Progression state machine over the flattened task list.
//!
//! ```text
//! NotStarted --advance--> OnTask(0) --advance--> OnTask(1) ... --advance--> AllTasksComplete
//!                             ^                                                   |
//!                             +-------------------- jump_to(i) ------------------+
//! ```
//!
//! The navigator is the only writer of [`State`]. It never persists anything
//! itself; callers save through [`ProgressStore`](crate::ProgressStore)
//! after a successful transition.

use crate::annotate::AnnotationKind;
use crate::error::{QuestError, Result};
use crate::rules::{self, RuleFailure, Satisfied};
use crate::types::{CheckResult, CheckStatus, Plan, State, Task};
use crate::TimeProvider;
use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Content written into auto-created task files.
pub const PLACEHOLDER: &str = "// TODO: implement\n";

/// Where the learner is in the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// `quest next` has never been run.
    NotStarted,
    /// Working on the task at this flattened index.
    OnTask(usize),
    /// Every task has been advanced past.
    AllTasksComplete,
}

/// Outcome of [`Navigator::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// First advance: the quest is now on task 0.
    Started,
    /// Moved from one task to the next.
    Moved { from: usize, to: usize },
    /// Advanced past the final task (or started an empty plan).
    Finished { total: usize },
    /// Already past the final task; nothing changed.
    AlreadyComplete { total: usize },
}

/// One rule's result within a check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleReport {
    /// Rule name, or `Rule N` when unnamed.
    pub label: String,
    pub description: String,
    pub outcome: std::result::Result<Satisfied, RuleFailure>,
}

impl RuleReport {
    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Human-readable reason for the outcome.
    pub fn detail(&self) -> String {
        match &self.outcome {
            Ok(satisfied) => satisfied.to_string(),
            Err(failure) => failure.to_string(),
        }
    }
}

/// Result of [`Navigator::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub task_index: usize,
    pub task_id: String,
    pub task_title: String,
    pub rules: Vec<RuleReport>,
    pub passed: usize,
    pub failed: usize,
    /// The result stored as the state's last check.
    pub result: CheckResult,
}

impl CheckReport {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Progress counts for ending a quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub completed: usize,
    pub total: usize,
    pub all_completed: bool,
}

/// Owns a plan and its progress for the duration of one command.
pub struct Navigator {
    root: PathBuf,
    plan: Plan,
    state: State,
    time_provider: Option<Arc<dyn TimeProvider>>,
}

impl std::fmt::Debug for Navigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator")
            .field("root", &self.root)
            .field("current_task_index", &self.state.current_task_index)
            .field("number_of_tasks", &self.plan.number_of_tasks)
            .finish()
    }
}

impl Navigator {
    /// `root` is the learner's project root; rule paths and task files are
    /// resolved against it.
    pub fn new(plan: Plan, state: State, root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            plan,
            state,
            time_provider: None,
        }
    }

    /// Overrides the clock used for check timestamps.
    pub fn with_time_provider<T: TimeProvider + 'static>(mut self, provider: T) -> Self {
        self.time_provider = Some(Arc::new(provider));
        self
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Hands back the documents for persisting.
    pub fn into_parts(self) -> (State, Plan) {
        (self.state, self.plan)
    }

    fn now(&self) -> DateTime<Utc> {
        match &self.time_provider {
            Some(provider) => provider.now(),
            None => Utc::now(),
        }
    }

    /// Number of tasks in the flattened list, after validating the cache.
    fn total(&self) -> Result<usize> {
        let total = self.plan.count_tasks();
        if self.plan.number_of_tasks != total {
            return Err(QuestError::Inconsistent {
                reason: format!(
                    "plan records {} tasks but contains {}",
                    self.plan.number_of_tasks, total
                ),
            });
        }
        Ok(total)
    }

    /// Derives the current position.
    ///
    /// # Errors
    ///
    /// [`QuestError::Inconsistent`] if the index is past the end or the
    /// cached task count disagrees with the plan tree.
    pub fn position(&self) -> Result<Position> {
        let total = self.total()?;
        let index = self.state.current_task_index;
        if index > total {
            return Err(QuestError::Inconsistent {
                reason: format!("current task index {} exceeds {} tasks", index, total),
            });
        }
        Ok(if !self.state.quest_started {
            Position::NotStarted
        } else if index == total {
            Position::AllTasksComplete
        } else {
            Position::OnTask(index)
        })
    }

    /// The task at the current index, if one is active.
    pub fn current_task(&self) -> Result<Option<&Task>> {
        Ok(match self.position()? {
            Position::OnTask(i) => self.plan.task(i),
            _ => None,
        })
    }

    /// Returns the last check if it exists and did not pass.
    ///
    /// Advancing is still allowed; callers decide whether to ask first.
    pub fn advance_guard(&self) -> Option<&CheckResult> {
        self.state
            .last_check
            .as_ref()
            .filter(|check| check.status != CheckStatus::Pass)
    }

    /// Moves to the next task, creating its placeholder files first.
    ///
    /// # Errors
    ///
    /// Fails before touching state if the position is inconsistent or a
    /// placeholder file cannot be created.
    pub fn advance(&mut self) -> Result<Advance> {
        let total = self.total()?;
        let (target, outcome) = match self.position()? {
            Position::NotStarted if total == 0 => (0, Advance::Finished { total }),
            Position::NotStarted => (0, Advance::Started),
            Position::OnTask(i) if i + 1 == total => (total, Advance::Finished { total }),
            Position::OnTask(i) => (i + 1, Advance::Moved { from: i, to: i + 1 }),
            Position::AllTasksComplete => return Ok(Advance::AlreadyComplete { total }),
        };

        if let Some(task) = self.plan.task(target) {
            for file in &task.files {
                ensure_file(&self.root, file)?;
            }
        }

        self.state.quest_started = true;
        self.state.current_task_index = target;
        self.state.explain_count = 0;
        self.state.last_check = None;
        info!(index = target, total, "advanced");
        Ok(outcome)
    }

    /// Evaluates every rule of the current task and records the result.
    ///
    /// Before the quest is started, task 0 is checked. The index never moves.
    pub fn check(&mut self) -> Result<CheckReport> {
        let total = self.total()?;
        let index = match self.position()? {
            Position::NotStarted => 0,
            Position::OnTask(i) => i,
            Position::AllTasksComplete => return Err(QuestError::NoActiveTask { total }),
        };
        let timestamp = self.now();

        let task = self
            .plan
            .task_mut(index)
            .ok_or(QuestError::NoActiveTask { total })?;

        let mut reports = Vec::with_capacity(task.validation.rules.len());
        for (i, rule) in task.validation.rules.iter_mut().enumerate() {
            let outcome = rules::evaluate(rule, &self.root);
            debug!(rule = rule.kind.type_name(), passed = outcome.is_ok(), "evaluated rule");
            reports.push(RuleReport {
                label: rule.label(i),
                description: rule.description.clone(),
                outcome,
            });
        }

        let passed = reports.iter().filter(|r| r.passed()).count();
        let failed = reports.len() - passed;
        let (status, message) = if failed == 0 {
            self.state.completed_task_ids.insert(task.id.clone());
            (CheckStatus::Pass, "All checks passed".to_string())
        } else {
            (
                CheckStatus::Fail,
                format!("{} of {} checks failed", failed, reports.len()),
            )
        };

        let result = CheckResult {
            task_index: index,
            status,
            timestamp,
            message,
        };
        self.state.last_check = Some(result.clone());
        info!(task = %task.id, %status, passed, failed, "checked task");

        Ok(CheckReport {
            task_index: index,
            task_id: task.id.clone(),
            task_title: task.title.clone(),
            rules: reports,
            passed,
            failed,
            result,
        })
    }

    /// Folds check-time annotation kinds into the last check's status.
    ///
    /// Any error fails the check; otherwise any warning downgrades a pass to
    /// a warn. Success and info never upgrade. Returns the resulting status,
    /// or `None` if there is no last check.
    pub fn apply_feedback_verdict<I>(&mut self, kinds: I) -> Option<CheckStatus>
    where
        I: IntoIterator<Item = AnnotationKind>,
    {
        let worst = kinds.into_iter().max();
        let check = self.state.last_check.as_mut()?;
        match worst {
            Some(AnnotationKind::Error) => check.status = CheckStatus::Fail,
            Some(AnnotationKind::Warning) if check.status == CheckStatus::Pass => {
                check.status = CheckStatus::Warn
            }
            _ => {}
        }
        Some(check.status)
    }

    /// Makes the task at `index` current.
    ///
    /// # Errors
    ///
    /// [`QuestError::OutOfRange`] unless `index < total`; nothing changes.
    pub fn jump_to(&mut self, index: usize) -> Result<&Task> {
        let total = self.total()?;
        self.position()?;
        if index >= total {
            return Err(QuestError::OutOfRange { index, total });
        }

        if index != self.state.current_task_index {
            self.state.explain_count = 0;
        }
        if self
            .state
            .last_check
            .as_ref()
            .is_some_and(|check| check.task_index != index)
        {
            self.state.last_check = None;
        }
        self.state.current_task_index = index;
        self.state.quest_started = true;
        info!(index, "jumped");

        self.plan.task(index).ok_or(QuestError::OutOfRange { index, total })
    }

    /// Jumps to the completed task with the highest flattened index.
    pub fn jump_to_last_completed(&mut self) -> Result<(usize, &Task)> {
        if self.state.completed_task_ids.is_empty() {
            return Err(QuestError::NoCompletedTasks);
        }
        let index = self
            .plan
            .tasks()
            .iter()
            .rposition(|task| self.state.is_completed(&task.id))
            .ok_or(QuestError::CompletedTaskNotFound)?;
        let task = self.jump_to(index)?;
        Ok((index, task))
    }

    /// Counts an explain request for the current task.
    ///
    /// Returns the task and the 1-based attempt number.
    pub fn begin_explain(&mut self) -> Result<(&Task, u32)> {
        let total = self.total()?;
        let index = match self.position()? {
            Position::OnTask(i) => i,
            Position::NotStarted if total > 0 => 0,
            _ => return Err(QuestError::NoActiveTask { total }),
        };
        self.state.explain_count = self.state.explain_count.saturating_add(1);
        let attempt = self.state.explain_count;
        let task = self
            .plan
            .task(index)
            .ok_or(QuestError::NoActiveTask { total })?;
        Ok((task, attempt))
    }

    pub fn completion(&self) -> Completion {
        let total = self.plan.count_tasks();
        let completed = self
            .plan
            .tasks()
            .iter()
            .filter(|task| self.state.is_completed(&task.id))
            .count();
        Completion {
            completed,
            total,
            all_completed: completed == total,
        }
    }
}

/// Creates `root/relative` with placeholder content unless it already exists.
///
/// Returns true if the file was created.
pub fn ensure_file(root: &Path, relative: &str) -> Result<bool> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| QuestError::io(parent, e))?;
    }
    match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(mut file) => {
            file.write_all(PLACEHOLDER.as_bytes())
                .map_err(|e| QuestError::io(&path, e))?;
            debug!(path = %path.display(), "created placeholder");
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(QuestError::io(&path, e)),
    }
}
