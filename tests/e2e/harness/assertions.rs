use anyhow::Result;
use quest_core::{Advance, CheckStatus, Position, ProgressStore, QuestError};

/// Declarative assertions on quest state and the learner's files
pub enum Assertion {
    // Progress
    Position(Position),
    NoQuest,
    CompletedTasks(Vec<String>),
    ExplainCount(u32),
    TaskCount(usize),

    // Checks
    LastCheckStatus(CheckStatus),
    NoLastCheck,
    LastCheckMessage(String),
    /// The last check was stamped with the scenario clock's current time
    LastCheckAtClockTime,

    // Command outcomes
    LastAdvance(Advance),
    LastPatch {
        inserted: usize,
        dropped: usize,
    },

    // Files
    FileExists {
        path: String,
    },
    FileMissing {
        path: String,
    },
    FileContentEquals {
        path: String,
        content: String,
    },
    FileContentContains {
        path: String,
        content: String,
    },

    // Custom (read access to the store)
    Custom(Box<dyn Fn(&ProgressStore) -> Result<()> + Send + Sync>),
}

impl std::fmt::Debug for Assertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Position(p) => write!(f, "Position({:?})", p),
            Self::NoQuest => write!(f, "NoQuest"),
            Self::CompletedTasks(ids) => write!(f, "CompletedTasks({:?})", ids),
            Self::ExplainCount(n) => write!(f, "ExplainCount({})", n),
            Self::TaskCount(n) => write!(f, "TaskCount({})", n),
            Self::LastCheckStatus(s) => write!(f, "LastCheckStatus({:?})", s),
            Self::NoLastCheck => write!(f, "NoLastCheck"),
            Self::LastCheckMessage(m) => write!(f, "LastCheckMessage({:?})", m),
            Self::LastCheckAtClockTime => write!(f, "LastCheckAtClockTime"),
            Self::LastAdvance(a) => write!(f, "LastAdvance({:?})", a),
            Self::LastPatch { inserted, dropped } => {
                write!(f, "LastPatch {{ inserted: {}, dropped: {} }}", inserted, dropped)
            }
            Self::FileExists { path } => write!(f, "FileExists {{ path: {:?} }}", path),
            Self::FileMissing { path } => write!(f, "FileMissing {{ path: {:?} }}", path),
            Self::FileContentEquals { path, content } => {
                write!(f, "FileContentEquals {{ path: {:?}, content: {:?} }}", path, content)
            }
            Self::FileContentContains { path, content } => {
                write!(f, "FileContentContains {{ path: {:?}, content: {:?} }}", path, content)
            }
            Self::Custom(_) => write!(f, "Custom(<fn>)"),
        }
    }
}

/// Expected failure of a step
#[derive(Clone, Debug)]
pub enum ErrorMatch {
    NotInitialized,
    SessionExists,
    TemplateNotFound,
    Malformed,
    OutOfRange,
    NoActiveTask,
    Inconsistent,
    NoCompletedTasks,
    CompletedTaskNotFound,
}

impl ErrorMatch {
    pub fn matches(&self, err: &QuestError) -> bool {
        matches!(
            (self, err),
            (Self::NotInitialized, QuestError::NotInitialized { .. })
                | (Self::SessionExists, QuestError::SessionExists { .. })
                | (Self::TemplateNotFound, QuestError::TemplateNotFound { .. })
                | (Self::Malformed, QuestError::Malformed { .. })
                | (Self::OutOfRange, QuestError::OutOfRange { .. })
                | (Self::NoActiveTask, QuestError::NoActiveTask { .. })
                | (Self::Inconsistent, QuestError::Inconsistent { .. })
                | (Self::NoCompletedTasks, QuestError::NoCompletedTasks)
                | (Self::CompletedTaskNotFound, QuestError::CompletedTaskNotFound)
        )
    }
}
