//! Line-based insertion of feedback comments into learner files.
//!
//! Every inserted line carries a marker (`// quest: ...`) so that a later
//! run can strip stale annotations before inserting fresh ones. Placement is
//! driven purely by line numbers.

use crate::error::{QuestError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Component, Path};
use tracing::{debug, warn};

/// Default marker written after the comment token.
pub const DEFAULT_MARKER: &str = "quest:";

/// Severity of a check-time annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Success,
    Info,
    Warning,
    Error,
}

impl AnnotationKind {
    /// Infers the kind from glyphs or keywords in the comment text.
    pub fn classify(comment: &str) -> Self {
        if comment.contains('✓') || comment.contains("GOOD") {
            Self::Success
        } else if comment.contains('✗') || comment.contains("ERROR") {
            Self::Error
        } else if comment.contains('⚠') || comment.contains("WARNING") {
            Self::Warning
        } else {
            Self::Info
        }
    }
}

/// A comment to insert above a 1-based line of a file under the working root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Path relative to the working root.
    pub file: String,
    /// 1-based target line.
    pub line: usize,
    pub comment: String,
    /// `None` for hints.
    pub kind: Option<AnnotationKind>,
}

impl Annotation {
    pub fn hint(file: impl Into<String>, line: usize, comment: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            comment: comment.into(),
            kind: None,
        }
    }

    /// Builds a check-time annotation, classifying its kind from the text.
    pub fn review(file: impl Into<String>, line: usize, comment: impl Into<String>) -> Self {
        let comment = comment.into();
        Self {
            file: file.into(),
            line,
            kind: Some(AnnotationKind::classify(&comment)),
            comment,
        }
    }
}

/// What an [`Patcher::apply`] call did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PatchReport {
    /// Files rewritten.
    pub files_patched: usize,
    /// Files named in the batch that do not exist.
    pub files_skipped: Vec<String>,
    /// Comments inserted.
    pub inserted: usize,
    /// Entries whose line was out of range.
    pub dropped: usize,
}

/// Inserts annotation batches into files.
#[derive(Debug, Clone)]
pub struct Patcher {
    marker: String,
}

impl Default for Patcher {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER)
    }
}

impl Patcher {
    /// A blank marker would match every comment, so it falls back to
    /// [`DEFAULT_MARKER`].
    pub fn new(marker: impl Into<String>) -> Self {
        let marker = marker.into();
        let marker = if marker.trim().is_empty() {
            DEFAULT_MARKER.to_string()
        } else {
            marker.trim().to_string()
        };
        Self { marker }
    }

    /// Applies a batch of annotations to files under `root`.
    ///
    /// Missing files and paths that would leave `root` (absolute, or with
    /// `..`) are skipped. Out-of-range lines are dropped without affecting
    /// the rest of the batch. A failed write aborts with an I/O error naming
    /// the file.
    pub fn apply(&self, batch: &[Annotation], root: &Path) -> Result<PatchReport> {
        // Files in first-seen order.
        let mut by_file: Vec<(&str, Vec<(usize, &str)>)> = Vec::new();
        for ann in batch {
            let entry = (ann.line, ann.comment.as_str());
            match by_file.iter_mut().find(|(file, _)| *file == ann.file.as_str()) {
                Some((_, entries)) => entries.push(entry),
                None => by_file.push((ann.file.as_str(), vec![entry])),
            }
        }

        let mut report = PatchReport::default();
        for (file, entries) in by_file {
            if !is_contained(file) {
                warn!(file, "annotation path leaves the working root, skipping");
                report.files_skipped.push(file.to_string());
                continue;
            }
            let path = root.join(file);
            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(file, "annotation target missing, skipping");
                    report.files_skipped.push(file.to_string());
                    continue;
                }
                Err(e) => return Err(QuestError::io(path, e)),
            };

            let token = comment_token(&path);
            let (patched, inserted, dropped) = self.patch_text(&text, &entries, token);
            fs::write(&path, patched).map_err(|e| QuestError::io(&path, e))?;

            if dropped > 0 {
                warn!(file, dropped, "dropped annotations with out-of-range lines");
            }
            report.files_patched += 1;
            report.inserted += inserted;
            report.dropped += dropped;
        }
        Ok(report)
    }

    /// Patches text in memory, returning `(text, inserted, dropped)`.
    ///
    /// Entries are `(line, comment)` in batch order.
    pub fn patch_text(&self, text: &str, entries: &[(usize, &str)], token: &str) -> (String, usize, usize) {
        let mut lines: Vec<String> = self
            .strip(text, token)
            .split('\n')
            .map(str::to_string)
            .collect();
        let count = lines.len();
        let eol = if text.contains("\r\n") { "\r" } else { "" };

        // Bottom-up so insertions never shift unprocessed targets. Equal lines
        // go in reverse batch order so they read top-to-bottom in batch order.
        let mut ordered: Vec<(usize, usize, &str)> = entries
            .iter()
            .enumerate()
            .map(|(i, (line, comment))| (*line, i, *comment))
            .collect();
        ordered.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));

        let (mut inserted, mut dropped) = (0, 0);
        for (line, _, comment) in ordered {
            if line < 1 || line > count {
                dropped += 1;
                continue;
            }
            let idx = line - 1;
            let indent = indentation(&lines[idx]).to_string();
            lines.insert(
                idx,
                format!("{}{} {} {}{}", indent, token, self.marker, comment, eol),
            );
            inserted += 1;
        }

        (lines.join("\n"), inserted, dropped)
    }

    /// Removes every previously inserted annotation line.
    pub fn strip(&self, text: &str, token: &str) -> String {
        text.split('\n')
            .filter(|line| !self.is_annotation(line, token))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn is_annotation(&self, line: &str, token: &str) -> bool {
        line.trim_start()
            .strip_prefix(token)
            .is_some_and(|rest| rest.trim_start().starts_with(self.marker.as_str()))
    }
}

/// True for a non-empty relative path made only of normal components.
fn is_contained(file: &str) -> bool {
    let path = Path::new(file);
    path.components().next().is_some()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Line comment token for a file, by extension.
pub fn comment_token(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("py" | "sh" | "bash" | "zsh" | "rb" | "pl" | "r" | "toml" | "yaml" | "yml") => "#",
        Some("sql" | "lua" | "hs") => "--",
        _ => "//",
    }
}

/// Leading spaces and tabs of a line.
pub fn indentation(line: &str) -> &str {
    let end = line
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(line.len());
    &line[..end]
}
