//! Template catalog: where new plans come from.
//!
//! A configured directory of `<name>.json` files shadows the templates
//! embedded in the binary.

use crate::error::{QuestError, Result};
use crate::summary::Tier;
use crate::types::Plan;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

const BUILTIN: &[(&str, &str)] = &[
    (
        "rust-cli-basics",
        include_str!("../templates/rust-cli-basics.json"),
    ),
    (
        "rust-concurrency",
        include_str!("../templates/rust-concurrency.json"),
    ),
];

/// Listing entry for `quest begin --list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateInfo {
    pub name: String,
    pub title: String,
    pub description: String,
    pub tasks: usize,
    pub tier: Tier,
}

impl TemplateInfo {
    fn describe(name: &str, plan: &Plan) -> Self {
        let tasks = plan.count_tasks();
        Self {
            name: name.to_string(),
            title: plan.journey.name.clone(),
            description: plan.journey.description.clone(),
            tasks,
            tier: Tier::for_task_count(tasks),
        }
    }
}

/// Something that can hand out plans by name.
pub trait TemplateSource {
    /// Loads and accepts the named template.
    fn load(&self, name: &str) -> Result<Plan>;

    /// Lists the templates that load successfully, sorted by name.
    fn list(&self) -> Vec<TemplateInfo>;
}

/// Directory templates first, then built-ins.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    directory: Option<PathBuf>,
}

impl Catalog {
    pub fn new(directory: Option<PathBuf>) -> Self {
        Self { directory }
    }

    /// Built-in templates only.
    pub fn builtin() -> Self {
        Self::default()
    }

    fn from_directory(dir: &Path, name: &str) -> Result<Option<String>> {
        let path = dir.join(format!("{}.json", name));
        match fs::read_to_string(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(QuestError::io(path, e)),
        }
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = BUILTIN.iter().map(|(n, _)| n.to_string()).collect();
        if let Some(dir) = &self.directory {
            if let Ok(entries) = fs::read_dir(dir) {
                for entry in entries.flatten() {
                    let path = entry.path();
                    if path.extension().is_some_and(|ext| ext == "json") {
                        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                            names.push(stem.to_string());
                        }
                    }
                }
            }
        }
        names.sort();
        names.dedup();
        names
    }
}

impl TemplateSource for Catalog {
    fn load(&self, name: &str) -> Result<Plan> {
        let data = match &self.directory {
            Some(dir) => Self::from_directory(dir, name)?,
            None => None,
        };
        let data = match data {
            Some(data) => {
                debug!(name, "loading template from directory");
                data
            }
            None => BUILTIN
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, data)| data.to_string())
                .ok_or_else(|| QuestError::TemplateNotFound {
                    name: name.to_string(),
                    reason: None,
                })?,
        };

        let plan: Plan = serde_json::from_str(&data).map_err(|e| QuestError::TemplateNotFound {
            name: name.to_string(),
            reason: Some(format!("failed to parse template: {}", e)),
        })?;
        accept_template(name, plan)
    }

    fn list(&self) -> Vec<TemplateInfo> {
        self.names()
            .into_iter()
            .filter_map(|name| {
                let plan = self.load(&name).ok()?;
                Some(TemplateInfo::describe(&name, &plan))
            })
            .collect()
    }
}

/// Validates a loaded template and normalizes its task count.
///
/// # Errors
///
/// [`QuestError::TemplateNotFound`] (with a reason) when the journey name is
/// empty or there are no chapters.
pub fn accept_template(name: &str, mut plan: Plan) -> Result<Plan> {
    let reject = |reason: &str| QuestError::TemplateNotFound {
        name: name.to_string(),
        reason: Some(reason.to_string()),
    };
    if plan.journey.name.trim().is_empty() {
        return Err(reject("journey name is empty"));
    }
    if plan.chapters.is_empty() {
        return Err(reject("no chapters found"));
    }
    plan.normalize();
    Ok(plan)
}
