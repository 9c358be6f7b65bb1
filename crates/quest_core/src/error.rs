//! Error types for quest_core operations.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for quest_core operations.
#[derive(Error, Debug)]
pub enum QuestError {
    /// No `.quest` directory exists in the working root.
    #[error("no quest in progress at {}", root.display())]
    NotInitialized {
        /// Working root that was searched
        root: PathBuf,
    },

    /// A quest is already in progress in the working root.
    #[error("a quest already exists at {}", path.display())]
    SessionExists {
        /// Path to the existing `.quest` directory
        path: PathBuf,
    },

    /// A progress document is missing.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that was expected to exist
        path: PathBuf,
    },

    /// A progress document could not be parsed or serialized.
    #[error("malformed document {}: {source}", path.display())]
    Malformed {
        /// Path to the offending document
        path: PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Template is unknown or does not describe a usable plan.
    #[error("template not found: {name}")]
    TemplateNotFound {
        /// Requested template name
        name: String,
        /// Why the template was rejected, if it was found but unusable
        reason: Option<String>,
    },

    /// Task index outside `[0, total)`.
    #[error("task index {index} out of range (plan has {total} tasks)")]
    OutOfRange {
        /// Requested 0-based index
        index: usize,
        /// Number of tasks in the plan
        total: usize,
    },

    /// The operation needs an active task but all tasks are done.
    #[error("no active task: all {total} tasks are complete")]
    NoActiveTask {
        /// Number of tasks in the plan
        total: usize,
    },

    /// Plan and state disagree in a way that cannot be recovered.
    #[error("progress is inconsistent: {reason}")]
    Inconsistent {
        /// Description of the inconsistency
        reason: String,
    },

    /// The completed-task set is empty.
    #[error("no completed tasks yet")]
    NoCompletedTasks,

    /// None of the completed ids exist in the plan.
    #[error("could not find the last completed task in the plan")]
    CompletedTaskNotFound,

    /// The external feedback generator failed.
    #[error("feedback generator failed: {0}")]
    GeneratorFailed(String),

    /// Configuration error (loading, parsing, invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error on a specific path.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl QuestError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns a user-friendly recovery suggestion for the error, if available.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            Self::NotInitialized { .. } | Self::FileNotFound { .. } => {
                Some("Run 'quest begin' to start a new quest.")
            }
            Self::Malformed { .. } | Self::Inconsistent { .. } => {
                Some("Run 'quest health' to inspect the .quest folder, or 'quest complete' and begin again.")
            }
            Self::SessionExists { .. } => {
                Some("Finish the current quest with 'quest complete' before starting another.")
            }
            Self::TemplateNotFound { .. } => Some("List available templates with 'quest begin --list'."),
            Self::OutOfRange { .. } => Some("Run 'quest summary' to see the task list."),
            Self::NoActiveTask { .. } => Some("Run 'quest complete' to wrap up."),
            Self::NoCompletedTasks => Some("Pass a task with 'quest check' first."),
            Self::GeneratorFailed(_) => {
                Some("Check the [generator] command in .quest/config.toml and that it is on PATH.")
            }
            Self::Io { .. } => Some("Check folder permissions."),
            _ => None,
        }
    }
}

/// Convenience Result type for quest_core operations.
pub type Result<T> = std::result::Result<T, QuestError>;
