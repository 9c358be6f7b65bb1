//! Core data types for Quest.
//!
//! A [`Plan`] is the immutable curriculum tree; a [`State`] is the learner's
//! mutable progress through its flattened task list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// Schema version written into new plan and state documents.
pub const SCHEMA_VERSION: u32 = 1;

/// Wire name of the `exists` rule.
pub const RULE_EXISTS: &str = "exists";
/// Wire name of the `glob_count_min` rule.
pub const RULE_GLOB_COUNT_MIN: &str = "glob_count_min";
/// Wire name of the `file_contains_any` rule.
pub const RULE_FILE_CONTAINS_ANY: &str = "file_contains_any";

/// Curriculum description: chapters of quests of tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// Document schema version.
    #[serde(default)]
    pub version: u32,
    /// Journey metadata.
    pub journey: Journey,
    /// Ordered chapters.
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    /// Cached total task count, see [`Plan::normalize`].
    #[serde(default)]
    pub number_of_tasks: usize,
}

/// Journey metadata shown in summaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journey {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub focus: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub quests: Vec<Quest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// A single unit of work with validation rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier, unique across the whole plan.
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub objective: String,
    /// Instructional steps.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<String>,
    /// Files created as placeholders when the task becomes current.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    /// Files the learner is expected to touch.
    #[serde(default)]
    pub artifacts: Vec<String>,
    #[serde(default)]
    pub validation: Validation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// Where a flattened task index sits in the plan tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskLocation {
    /// Chapter index within the plan.
    pub chapter: usize,
    /// Quest index within the chapter.
    pub quest: usize,
    /// Task index within the quest.
    pub task: usize,
}

impl Plan {
    fn iter_tasks(&self) -> impl Iterator<Item = &Task> {
        self.chapters
            .iter()
            .flat_map(|c| c.quests.iter())
            .flat_map(|q| q.tasks.iter())
    }

    /// Returns the flattened task list.
    ///
    /// Computed from the tree on every call; the order defines the linear
    /// progression index.
    pub fn tasks(&self) -> Vec<&Task> {
        self.iter_tasks().collect()
    }

    /// Counts tasks across all quests of all chapters.
    pub fn count_tasks(&self) -> usize {
        self.chapters
            .iter()
            .flat_map(|c| c.quests.iter())
            .map(|q| q.tasks.len())
            .sum()
    }

    /// Recomputes the cached task count.
    pub fn normalize(&mut self) {
        self.number_of_tasks = self.count_tasks();
    }

    /// Returns the task at a flattened index.
    pub fn task(&self, index: usize) -> Option<&Task> {
        self.iter_tasks().nth(index)
    }

    /// Returns the task at a flattened index for rule bookkeeping.
    pub fn task_mut(&mut self, index: usize) -> Option<&mut Task> {
        self.chapters
            .iter_mut()
            .flat_map(|c| c.quests.iter_mut())
            .flat_map(|q| q.tasks.iter_mut())
            .nth(index)
    }

    /// Maps a flattened index back onto the tree.
    pub fn locate(&self, index: usize) -> Option<TaskLocation> {
        let mut offset = 0;
        for (ci, chapter) in self.chapters.iter().enumerate() {
            for (qi, quest) in chapter.quests.iter().enumerate() {
                if index < offset + quest.tasks.len() {
                    return Some(TaskLocation {
                        chapter: ci,
                        quest: qi,
                        task: index - offset,
                    });
                }
                offset += quest.tasks.len();
            }
        }
        None
    }
}

/// Declarative, file-system-checkable condition attached to a task.
///
/// On the wire a rule is a flat object keyed by `type`; unknown types load as
/// [`RuleKind::Unsupported`] so that a single bad rule fails evaluation
/// instead of the whole plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RuleDocument", into = "RuleDocument")]
pub struct Rule {
    pub kind: RuleKind,
    /// Optional display name (empty when unset).
    pub name: String,
    /// Optional description shown when the rule fails without a reason.
    pub description: String,
    /// Outcome of the most recent evaluation.
    pub last_state: Option<RuleOutcome>,
}

/// The closed set of rule kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    /// An entry exists at `path`.
    Exists { path: String },
    /// At least `min` entries match `glob`.
    GlobCountMin { glob: String, min: usize },
    /// Some file matching `glob` matches one of the regex `patterns`.
    FileContainsAny { glob: String, patterns: Vec<String> },
    /// A `type` this version does not understand.
    Unsupported { kind: String },
}

impl RuleKind {
    /// Returns the wire name of this kind.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Exists { .. } => RULE_EXISTS,
            Self::GlobCountMin { .. } => RULE_GLOB_COUNT_MIN,
            Self::FileContainsAny { .. } => RULE_FILE_CONTAINS_ANY,
            Self::Unsupported { kind } => kind,
        }
    }
}

impl Rule {
    /// Creates an unnamed rule of the given kind.
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            name: String::new(),
            description: String::new(),
            last_state: None,
        }
    }

    /// Sets the display name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Display label, falling back to `Rule N` (1-based).
    pub fn label(&self, position: usize) -> String {
        if self.name.is_empty() {
            format!("Rule {}", position + 1)
        } else {
            self.name.clone()
        }
    }
}

/// Cached result of a rule evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleOutcome {
    Pass,
    Fail,
}

/// Flat wire representation of a [`Rule`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuleDocument {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    glob: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    min: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    any: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_state: Option<RuleOutcome>,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl From<RuleDocument> for Rule {
    fn from(doc: RuleDocument) -> Self {
        let kind = match doc.kind.as_str() {
            RULE_EXISTS => RuleKind::Exists { path: doc.path },
            RULE_GLOB_COUNT_MIN => RuleKind::GlobCountMin {
                glob: doc.glob,
                min: doc.min,
            },
            RULE_FILE_CONTAINS_ANY => RuleKind::FileContainsAny {
                glob: doc.glob,
                patterns: doc.any,
            },
            _ => RuleKind::Unsupported { kind: doc.kind },
        };
        Self {
            kind,
            name: doc.name,
            description: doc.description,
            last_state: doc.last_state,
        }
    }
}

impl From<Rule> for RuleDocument {
    fn from(rule: Rule) -> Self {
        let mut doc = RuleDocument {
            kind: rule.kind.type_name().to_string(),
            name: rule.name,
            description: rule.description,
            path: String::new(),
            glob: String::new(),
            min: 0,
            any: Vec::new(),
            last_state: rule.last_state,
        };
        match rule.kind {
            RuleKind::Exists { path } => doc.path = path,
            RuleKind::GlobCountMin { glob, min } => {
                doc.glob = glob;
                doc.min = min;
            }
            RuleKind::FileContainsAny { glob, patterns } => {
                doc.glob = glob;
                doc.any = patterns;
            }
            RuleKind::Unsupported { .. } => {}
        }
        doc
    }
}

/// Learner progress through the flattened task list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    #[serde(default)]
    pub version: u32,
    /// 0-based index into [`Plan::tasks`].
    #[serde(default)]
    pub current_task_index: usize,
    /// Ids of tasks whose rules all passed at some point.
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed_task_ids: BTreeSet<String>,
    /// Result of the most recent check (`None` if never run for this task).
    #[serde(default)]
    pub last_check: Option<CheckResult>,
    /// Distinguishes "not started" from "on task 0".
    #[serde(default)]
    pub quest_started: bool,
    /// Explain requests made for the current task.
    #[serde(default)]
    pub explain_count: u32,
}

impl State {
    /// Fresh state for a newly started quest.
    pub fn new() -> Self {
        Self {
            version: SCHEMA_VERSION,
            current_task_index: 0,
            completed_task_ids: BTreeSet::new(),
            last_check: None,
            quest_started: false,
            explain_count: 0,
        }
    }

    /// Returns true if the task id is in the completed set.
    pub fn is_completed(&self, task_id: &str) -> bool {
        self.completed_task_ids.contains(task_id)
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Outcome of checking the current task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Flattened index the check was computed for.
    #[serde(rename = "taskId")]
    pub task_index: usize,
    pub status: CheckStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

/// Overall status of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Pass => "pass",
            Self::Warn => "warn",
            Self::Fail => "fail",
        })
    }
}
