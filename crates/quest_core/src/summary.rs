//! Progress summary for display.

use crate::types::{Plan, State};

/// Plan size category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Up to 3 tasks.
    Quick,
    /// Up to 10 tasks.
    Standard,
    Extended,
}

impl Tier {
    pub fn for_task_count(tasks: usize) -> Self {
        match tasks {
            0..=3 => Self::Quick,
            4..=10 => Self::Standard,
            _ => Self::Extended,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Quick => "Quick",
            Self::Standard => "Standard",
            Self::Extended => "Extended",
        })
    }
}

/// Status of a chapter or task relative to the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Done,
    Current,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterLine {
    pub title: String,
    pub progress: Progress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLine {
    pub title: String,
    pub progress: Progress,
}

/// The quest the current task belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentQuest {
    /// 0-based chapter index.
    pub chapter: usize,
    pub chapter_title: String,
    pub quest_title: String,
    pub tasks: Vec<TaskLine>,
}

/// Everything `quest summary` shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub name: String,
    pub description: String,
    pub focus: Vec<String>,
    pub tier: Tier,
    pub chapters: Vec<ChapterLine>,
    /// `None` once every task is completed or the index is past the end.
    pub current: Option<CurrentQuest>,
    pub completed: usize,
    pub total: usize,
    pub all_complete: bool,
}

impl Summary {
    pub fn build(plan: &Plan, state: &State) -> Self {
        let total = plan.count_tasks();
        let completed = plan
            .tasks()
            .iter()
            .filter(|t| state.is_completed(&t.id))
            .count();
        let all_complete = completed == total;
        let location = if all_complete {
            None
        } else {
            plan.locate(state.current_task_index)
        };

        let chapters = plan
            .chapters
            .iter()
            .enumerate()
            .map(|(ci, chapter)| {
                let done = chapter
                    .quests
                    .iter()
                    .flat_map(|q| q.tasks.iter())
                    .all(|t| state.is_completed(&t.id));
                let progress = if done {
                    Progress::Done
                } else if location.is_some_and(|l| l.chapter == ci) {
                    Progress::Current
                } else {
                    Progress::Pending
                };
                ChapterLine {
                    title: chapter.title.clone(),
                    progress,
                }
            })
            .collect();

        let current = location.map(|loc| {
            let chapter = &plan.chapters[loc.chapter];
            let quest = &chapter.quests[loc.quest];
            let tasks = quest
                .tasks
                .iter()
                .enumerate()
                .map(|(ti, task)| TaskLine {
                    title: task.title.clone(),
                    progress: if state.is_completed(&task.id) {
                        Progress::Done
                    } else if ti == loc.task {
                        Progress::Current
                    } else {
                        Progress::Pending
                    },
                })
                .collect();
            CurrentQuest {
                chapter: loc.chapter,
                chapter_title: chapter.title.clone(),
                quest_title: quest.title.clone(),
                tasks,
            }
        });

        Self {
            name: plan.journey.name.clone(),
            description: plan.journey.description.clone(),
            focus: plan.journey.focus.clone(),
            tier: Tier::for_task_count(total),
            chapters,
            current,
            completed,
            total,
            all_complete,
        }
    }
}
