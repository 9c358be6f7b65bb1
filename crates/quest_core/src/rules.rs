//! Rule evaluation against the learner's file system.
//!
//! File selection uses shell-style globs; content matching uses regular
//! expressions. The two pattern languages are deliberately kept apart.

use crate::types::{Rule, RuleKind, RuleOutcome};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Why a rule passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Satisfied {
    /// The required entry exists.
    Exists { path: String },
    /// Enough entries matched the glob.
    Count { glob: String, found: usize },
    /// First (file, pattern) pair that matched.
    Contains { file: PathBuf, pattern: String },
}

impl std::fmt::Display for Satisfied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exists { path } => write!(f, "found '{}'", path),
            Self::Count { glob, found } => {
                write!(f, "found {} file(s) matching '{}'", found, glob)
            }
            Self::Contains { file, pattern } => {
                write!(f, "{} contains '{}'", file.display(), pattern)
            }
        }
    }
}

/// Why a rule failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleFailure {
    #[error("'{path}' does not exist")]
    Missing { path: String },

    #[error("found {found} file(s) matching '{glob}', expected at least {min}")]
    TooFewMatches {
        glob: String,
        found: usize,
        min: usize,
    },

    #[error("no files found matching pattern '{glob}'")]
    NoFilesMatched { glob: String },

    #[error("{glob} doesn't contain {}", describe_patterns(.patterns))]
    NoPatternMatched { glob: String, patterns: Vec<String> },

    #[error("invalid glob '{glob}': {reason}")]
    InvalidGlob { glob: String, reason: String },

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("unsupported rule type '{kind}'")]
    UnsupportedKind { kind: String },
}

fn describe_patterns(patterns: &[String]) -> String {
    match patterns {
        [single] => format!("'{}'", single),
        many => format!("any of: {:?}", many),
    }
}

impl RuleFailure {
    /// True for malformed rules (bad glob, bad regex, unknown type) that can
    /// never pass no matter what the learner writes.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidGlob { .. } | Self::InvalidPattern { .. } | Self::UnsupportedKind { .. }
        )
    }
}

/// Evaluates a rule relative to `root` and caches the outcome on the rule.
///
/// Only reads the file system.
pub fn evaluate(rule: &mut Rule, root: &Path) -> Result<Satisfied, RuleFailure> {
    let result = check(&rule.kind, root);
    rule.last_state = Some(if result.is_ok() {
        RuleOutcome::Pass
    } else {
        RuleOutcome::Fail
    });
    debug!(rule = rule.kind.type_name(), passed = result.is_ok(), "evaluated rule");
    result
}

/// Evaluates a rule kind without touching any cached state.
pub fn check(kind: &RuleKind, root: &Path) -> Result<Satisfied, RuleFailure> {
    match kind {
        RuleKind::Exists { path } => {
            if root.join(path).exists() {
                Ok(Satisfied::Exists { path: path.clone() })
            } else {
                Err(RuleFailure::Missing { path: path.clone() })
            }
        }
        RuleKind::GlobCountMin { glob, min } => {
            let found = expand(glob, root)?.len();
            if found >= *min {
                Ok(Satisfied::Count {
                    glob: glob.clone(),
                    found,
                })
            } else {
                Err(RuleFailure::TooFewMatches {
                    glob: glob.clone(),
                    found,
                    min: *min,
                })
            }
        }
        RuleKind::FileContainsAny { glob, patterns } => contains_any(glob, patterns, root),
        RuleKind::Unsupported { kind } => Err(RuleFailure::UnsupportedKind { kind: kind.clone() }),
    }
}

fn contains_any(glob: &str, patterns: &[String], root: &Path) -> Result<Satisfied, RuleFailure> {
    let compiled = patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| RuleFailure::InvalidPattern {
                pattern: p.clone(),
                reason: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let matches = expand(glob, root)?;
    if matches.is_empty() {
        return Err(RuleFailure::NoFilesMatched {
            glob: glob.to_string(),
        });
    }

    for file in matches {
        let content = match fs::read_to_string(root.join(&file)) {
            Ok(content) => content,
            Err(e) => {
                debug!(file = %file.display(), error = %e, "skipping unreadable file");
                continue;
            }
        };
        for (pattern, regex) in patterns.iter().zip(&compiled) {
            if regex.is_match(&content) {
                return Ok(Satisfied::Contains {
                    file,
                    pattern: pattern.clone(),
                });
            }
        }
    }

    Err(RuleFailure::NoPatternMatched {
        glob: glob.to_string(),
        patterns: patterns.to_vec(),
    })
}

/// Expands a glob under `root`, returning paths relative to `root` in the
/// glob crate's (sorted) iteration order.
pub fn expand(glob: &str, root: &Path) -> Result<Vec<PathBuf>, RuleFailure> {
    let pattern = if Path::new(glob).is_absolute() {
        glob.to_string()
    } else {
        format!(
            "{}/{}",
            glob::Pattern::escape(&root.to_string_lossy()),
            glob
        )
    };

    let paths = glob::glob(&pattern).map_err(|e| RuleFailure::InvalidGlob {
        glob: glob.to_string(),
        reason: e.to_string(),
    })?;

    Ok(paths
        .filter_map(|entry| entry.ok())
        .map(|path| path.strip_prefix(root).map(Path::to_path_buf).unwrap_or(path))
        .collect())
}
