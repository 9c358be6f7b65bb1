//! Quest Core Library
//!
//! Guided coding curricula that live next to the learner's code:
//! - A plan of chapters, quests and tasks, walked one task at a time
//! - Declarative validation rules checked against the file system
//! - Inline feedback comments patched into source files
//!
//! # Quick Start
//!
//! ```
//! use quest_core::{Catalog, Navigator, Position, ProgressStore, State, TemplateSource};
//! use tempfile::TempDir;
//!
//! let tmp = TempDir::new().unwrap();
//! let store = ProgressStore::init(tmp.path()).unwrap();
//! let mut plan = Catalog::builtin().load("rust-cli-basics").unwrap();
//! store.save(&State::new(), &mut plan).unwrap();
//!
//! let (state, plan) = store.load().unwrap();
//! let mut nav = Navigator::new(plan, state, tmp.path());
//! nav.advance().unwrap();
//! assert_eq!(nav.position().unwrap(), Position::OnTask(0));
//!
//! // Nothing written yet, so the first task's checks fail.
//! let report = nav.check().unwrap();
//! assert!(!report.all_passed());
//!
//! let (state, mut plan) = nav.into_parts();
//! store.save(&state, &mut plan).unwrap();
//! ```
//!
//! # Annotations
//!
//! Feedback is inserted above the target line and replaced on the next run:
//!
//! ```
//! use quest_core::{Annotation, Patcher};
//! use tempfile::TempDir;
//!
//! let tmp = TempDir::new().unwrap();
//! std::fs::write(tmp.path().join("main.rs"), "fn main() {\n    run();\n}\n").unwrap();
//!
//! let batch = [Annotation::hint("main.rs", 2, "what if run fails?")];
//! Patcher::default().apply(&batch, tmp.path()).unwrap();
//! Patcher::default().apply(&batch, tmp.path()).unwrap();
//!
//! let text = std::fs::read_to_string(tmp.path().join("main.rs")).unwrap();
//! assert_eq!(text, "fn main() {\n    // quest: what if run fails?\n    run();\n}\n");
//! ```

mod annotate;
mod catalog;
mod config;
mod error;
mod feedback;
mod health;
mod navigator;
pub mod rules;
mod store;
mod summary;
mod types;

use chrono::{DateTime, Utc};

pub use annotate::{
    comment_token, Annotation, AnnotationKind, PatchReport, Patcher, DEFAULT_MARKER,
};
pub use catalog::{accept_template, Catalog, TemplateInfo, TemplateSource};
pub use config::{AnnotateConfig, Config, GeneratorConfig, TemplateConfig, CONFIG_FILE};
pub use error::{QuestError, Result};
pub use feedback::{parse_annotations, request, CommandGenerator, FeedbackRequest, Generator};
pub use health::{diagnose, find_program, HealthCheck, HealthReport};
pub use navigator::{
    ensure_file, Advance, CheckReport, Completion, Navigator, Position, RuleReport, PLACEHOLDER,
};
pub use rules::{RuleFailure, Satisfied};
pub use store::{ProgressStore, PLAN_FILE, QUEST_DIR, STATE_FILE};
pub use summary::{ChapterLine, CurrentQuest, Progress, Summary, TaskLine, Tier};
pub use types::*;

/// Time provider trait for testing.
///
/// Allows injecting a controlled clock into check timestamps via
/// [`Navigator::with_time_provider`].
pub trait TimeProvider: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

impl<F> TimeProvider for F
where
    F: Fn() -> DateTime<Utc> + Send + Sync,
{
    fn now(&self) -> DateTime<Utc> {
        self()
    }
}
