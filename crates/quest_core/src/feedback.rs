//! Boundary to the external feedback generator.
//!
//! The generator is an opaque program: it receives a prompt on stdin and
//! answers with lines of the form `path:line: // comment`. Only parsing that
//! answer into [`Annotation`]s is core behavior; everything else here is
//! plumbing around it.

use crate::annotate::Annotation;
use crate::config::GeneratorConfig;
use crate::error::{QuestError, Result};
use crate::types::{Rule, RuleOutcome, Task};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::debug;

static FEEDBACK_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^:]+):(\d+):\s*//\s*(.+)$").expect("static regex"));

/// Parses generator output into annotations, skipping malformed lines.
///
/// With `classify`, each annotation gets a kind inferred from its text
/// (check-time review); otherwise kinds are left unset (hints).
pub fn parse_annotations(raw: &str, classify: bool) -> Vec<Annotation> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let caps = FEEDBACK_LINE.captures(line)?;
            let number = match caps[2].parse::<usize>() {
                Ok(n) => n,
                Err(_) => {
                    debug!(line, "skipping feedback line with unparsable number");
                    return None;
                }
            };
            let file = caps[1].trim();
            let comment = caps[3].trim();
            Some(if classify {
                Annotation::review(file, number, comment)
            } else {
                Annotation::hint(file, number, comment)
            })
        })
        .collect()
}

/// What the generator is asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackRequest {
    /// Nudge a learner who asked for help with the current task.
    Hint {
        task: String,
        objective: String,
        files: Vec<String>,
        /// 1-based explain attempt for this task.
        attempt: u32,
    },
    /// Comment on the learner's code in light of a check.
    Review {
        task: String,
        passed: Vec<String>,
        failed: Vec<String>,
        files: Vec<String>,
    },
}

impl FeedbackRequest {
    pub fn hint(task: &Task, files: Vec<String>, attempt: u32) -> Self {
        Self::Hint {
            task: task.title.clone(),
            objective: task.objective.clone(),
            files,
            attempt,
        }
    }

    /// Splits the task's rules into passed and failed by their cached outcome.
    pub fn review(task: &Task, files: Vec<String>) -> Self {
        let (passed, failed): (Vec<(usize, &Rule)>, Vec<(usize, &Rule)>) = task
            .validation
            .rules
            .iter()
            .enumerate()
            .partition(|(_, r)| r.last_state == Some(RuleOutcome::Pass));
        // Labels keep the rule's position within the task.
        let labels = |rules: Vec<(usize, &Rule)>| {
            rules
                .into_iter()
                .map(|(i, r)| format!("- {}", r.label(i)))
                .collect()
        };
        Self::Review {
            task: task.title.clone(),
            passed: labels(passed),
            failed: labels(failed),
            files,
        }
    }

    /// True for review requests, whose output is classified by kind.
    pub fn is_review(&self) -> bool {
        matches!(self, Self::Review { .. })
    }

    /// Renders the prompt sent to the generator.
    pub fn prompt(&self) -> String {
        match self {
            Self::Hint {
                task,
                objective,
                files,
                attempt,
            } => {
                let (level, max_hints, guidance) = match attempt {
                    0 | 1 => ("MINIMAL", 3, "Do NOT write solutions or give away answers"),
                    2 => (
                        "MORE SPECIFIC",
                        4,
                        "Be more specific about what's wrong. You can hint at function names or patterns to use",
                    ),
                    _ => (
                        "DIRECT",
                        5,
                        "Be very direct. Show partial code examples if needed. The learner is clearly stuck",
                    ),
                };
                format!(
                    "Task: {task}\nObjective: {objective}\n\nLearner files:\n- {files}\n\n\
                     This is attempt #{attempt} for hints on this task.\n\n\
                     Review the learner's code and provide {level} guiding hints.\n\n\
                     Output ONLY in this exact format (one hint per line):\n\
                     <file>:<line>: // <hint comment>\n\n\
                     Rules:\n- {guidance}\n- Focus on bugs, edge cases, or missing logic\n\
                     - Maximum {max_hints} hints per file\n- If the code looks good, output nothing\n",
                    files = files.join("\n- "),
                )
            }
            Self::Review {
                task,
                passed,
                failed,
                files,
            } => format!(
                "Task: {task}\n\nFiles to review:\n- {files}\n\n\
                 Checks that PASSED:\n{passed}\n\nChecks that FAILED:\n{failed}\n\n\
                 Review the learner's code and provide inline feedback comments.\n\
                 Use \"// ✓ GOOD: <explanation>\" for what works and \
                 \"// ✗ ERROR: <issue>\" or \"// ⚠ WARNING: <suggestion>\" for what doesn't.\n\n\
                 Output ONLY in this format (one comment per line):\n\
                 <file>:<line>: // <type>: <comment>\n\n\
                 Maximum 5 comments total, each under 80 characters.\n",
                files = files.join("\n- "),
                passed = passed.join("\n"),
                failed = failed.join("\n"),
            ),
        }
    }
}

/// Produces raw feedback text for a prompt.
pub trait Generator {
    fn generate(&self, prompt: &str) -> Result<String>;
}

impl<F> Generator for F
where
    F: Fn(&str) -> Result<String>,
{
    fn generate(&self, prompt: &str) -> Result<String> {
        self(prompt)
    }
}

/// Requests feedback and parses it into annotations.
pub fn request(generator: &dyn Generator, request: &FeedbackRequest) -> Result<Vec<Annotation>> {
    let raw = generator.generate(&request.prompt())?;
    Ok(parse_annotations(&raw, request.is_review()))
}

/// Runs an external program with the prompt on stdin.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
}

impl CommandGenerator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }
}

impl Generator for CommandGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| QuestError::GeneratorFailed(format!("failed to start {}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .map_err(|e| QuestError::GeneratorFailed(format!("failed to send prompt: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| QuestError::GeneratorFailed(e.to_string()))?;
        if !output.status.success() {
            return Err(QuestError::GeneratorFailed(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
