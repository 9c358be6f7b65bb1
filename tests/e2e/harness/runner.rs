use super::assertions::{Assertion, ErrorMatch};
use super::clock::MockClock;
use super::steps::{PlanSource, ScenarioStep};
use super::workspace::{fixtures_dir, TestWorkspace};
use anyhow::{anyhow, bail, ensure, Context, Result};
use quest_core::{
    request, Advance, Catalog, FeedbackRequest, Navigator, PatchReport, Patcher, ProgressStore,
    QuestError, State, TemplateSource,
};
use std::collections::HashMap;
use std::fs;
use std::time::Duration;

/// Executes scenarios against a real `.quest` folder, the way the CLI does:
/// every command loads the documents, runs one navigator operation and saves.
pub struct ScenarioRunner {
    workspace: TestWorkspace,
    clock: MockClock,
    current_step: usize,
    last_advance: Option<Advance>,
    last_patch: Option<PatchReport>,
}

impl ScenarioRunner {
    /// Create a new runner with initial files, optionally on top of a fixture
    pub fn new(fixture: Option<&str>, initial_files: HashMap<String, Vec<u8>>) -> Result<Self> {
        let workspace = match fixture {
            Some(name) => TestWorkspace::from_fixture(name)?,
            None => TestWorkspace::empty()?,
        };
        for (path, content) in initial_files {
            workspace.write_file(&path, &content)?;
        }

        Ok(Self {
            workspace,
            clock: MockClock::new(),
            current_step: 0,
            last_advance: None,
            last_patch: None,
        })
    }

    /// Get current step number
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Execute all steps in sequence
    pub fn execute(&mut self, steps: &[ScenarioStep]) -> Result<()> {
        for (i, step) in steps.iter().enumerate() {
            self.current_step = i;
            self.execute_step(step)
                .with_context(|| format!("Step {}: {:?}", i, step))?;
        }
        Ok(())
    }

    /// Execute a single step
    fn execute_step(&mut self, step: &ScenarioStep) -> Result<()> {
        match step {
            ScenarioStep::Begin { source } => self.handle_begin(source),
            ScenarioStep::Next => self.handle_next(),
            ScenarioStep::Check => self.handle_check(),
            ScenarioStep::CheckWithReview { reply } => self.handle_check_with_review(reply),
            ScenarioStep::Explain { reply } => self.handle_explain(reply),
            ScenarioStep::JumpTo { task } => self.handle_jump_to(*task),
            ScenarioStep::JumpToLastCompleted => self.handle_jump_to_last_completed(),
            ScenarioStep::Complete => self.handle_complete(),

            ScenarioStep::LearnerWrites { path, content } => {
                self.workspace.write_file(path, content)
            }
            ScenarioStep::LearnerDeletes { path } => self.workspace.remove_file(path),

            ScenarioStep::Wait { duration } => self.handle_wait(*duration),

            ScenarioStep::ExpectError { step, error } => self.handle_expect_error(step, error),

            ScenarioStep::Assert { assertion } => self.handle_assertion(assertion),
        }
    }

    fn store(&self) -> ProgressStore {
        self.workspace.store()
    }

    /// Load, run one navigator operation, save.
    fn with_navigator<T>(
        &mut self,
        op: impl FnOnce(&mut Navigator) -> quest_core::Result<T>,
    ) -> Result<T> {
        let store = ProgressStore::open(self.workspace.path())?;
        let (state, plan) = store.load()?;
        let mut nav =
            Navigator::new(plan, state, store.root()).with_time_provider(self.clock.as_provider());
        let value = op(&mut nav)?;
        let (state, mut plan) = nav.into_parts();
        store.save(&state, &mut plan)?;
        Ok(value)
    }

    /// Load without saving, for assertions.
    fn navigator(&self) -> Result<Navigator> {
        let store = ProgressStore::open(self.workspace.path())?;
        let (state, plan) = store.load()?;
        Ok(Navigator::new(plan, state, store.root()))
    }

    fn state(&self) -> Result<State> {
        Ok(self.store().load_state()?)
    }

    // ===== Quest command handlers =====

    fn handle_begin(&mut self, source: &PlanSource) -> Result<()> {
        let mut plan = match source {
            PlanSource::Fixture(name) => Catalog::new(Some(fixtures_dir().join("plans"))).load(name)?,
            PlanSource::Builtin(name) => Catalog::builtin().load(name)?,
        };
        let store = ProgressStore::init(self.workspace.path())?;
        store.save(&State::new(), &mut plan)?;
        Ok(())
    }

    fn handle_next(&mut self) -> Result<()> {
        let advance = self.with_navigator(|nav| nav.advance())?;
        self.last_advance = Some(advance);
        Ok(())
    }

    fn handle_check(&mut self) -> Result<()> {
        self.with_navigator(|nav| nav.check().map(|_| ()))
    }

    fn handle_check_with_review(&mut self, reply: &str) -> Result<()> {
        let root = self.workspace.path().to_path_buf();
        let reply = reply.to_string();
        let patch = self.with_navigator(move |nav| {
            let report = nav.check()?;
            let task = nav
                .plan()
                .task(report.task_index)
                .cloned()
                .ok_or(QuestError::NoActiveTask {
                    total: nav.plan().count_tasks(),
                })?;
            let generator = move |_prompt: &str| -> quest_core::Result<String> { Ok(reply.clone()) };
            let annotations =
                request(&generator, &FeedbackRequest::review(&task, task.artifacts.clone()))?;
            let patch = Patcher::default().apply(&annotations, &root)?;
            nav.apply_feedback_verdict(annotations.iter().filter_map(|a| a.kind));
            Ok(patch)
        })?;
        self.last_patch = Some(patch);
        Ok(())
    }

    fn handle_explain(&mut self, reply: &str) -> Result<()> {
        let (task, attempt) = self.with_navigator(|nav| {
            let (task, attempt) = nav.begin_explain()?;
            Ok((task.clone(), attempt))
        })?;

        let generator = |prompt: &str| -> quest_core::Result<String> {
            assert!(prompt.contains(&format!("attempt #{}", attempt)));
            Ok(reply.to_string())
        };
        let hints = request(
            &generator,
            &FeedbackRequest::hint(&task, task.artifacts.clone(), attempt),
        )?;
        self.last_patch = Some(Patcher::default().apply(&hints, self.workspace.path())?);
        Ok(())
    }

    fn handle_jump_to(&mut self, task: usize) -> Result<()> {
        let index = task
            .checked_sub(1)
            .ok_or_else(|| anyhow!("task numbers start at 1"))?;
        self.with_navigator(|nav| nav.jump_to(index).map(|_| ()))
    }

    fn handle_jump_to_last_completed(&mut self) -> Result<()> {
        self.with_navigator(|nav| nav.jump_to_last_completed().map(|_| ()))
    }

    fn handle_complete(&mut self) -> Result<()> {
        let store = ProgressStore::open(self.workspace.path())?;
        store.destroy()?;
        Ok(())
    }

    // ===== Time control =====

    fn handle_wait(&mut self, duration: Duration) -> Result<()> {
        self.clock.advance(duration);
        Ok(())
    }

    // ===== Failures =====

    fn handle_expect_error(&mut self, step: &ScenarioStep, expected: &ErrorMatch) -> Result<()> {
        let state_path = self.store().state_path();
        let before = fs::read(&state_path).ok();

        match self.execute_step(step) {
            Ok(()) => bail!("expected {:?}, but the step succeeded", expected),
            Err(err) => match err.downcast_ref::<QuestError>() {
                Some(quest_err) if expected.matches(quest_err) => {}
                _ => bail!("expected {:?}, got: {:#}", expected, err),
            },
        }

        let after = fs::read(&state_path).ok();
        ensure!(before == after, "state.json changed during a failed step");
        Ok(())
    }

    // ===== Assertions =====

    fn handle_assertion(&mut self, assertion: &Assertion) -> Result<()> {
        match assertion {
            Assertion::Position(expected) => {
                let actual = self.navigator()?.position()?;
                ensure!(
                    actual == *expected,
                    "Expected position {:?}, got {:?}",
                    expected,
                    actual
                );
                Ok(())
            }
            Assertion::NoQuest => {
                ensure!(!self.store().exists(), "Expected no .quest folder");
                Ok(())
            }
            Assertion::CompletedTasks(expected) => {
                let state = self.state()?;
                let mut expected = expected.clone();
                expected.sort();
                let actual: Vec<String> = state.completed_task_ids.into_iter().collect();
                ensure!(
                    actual == expected,
                    "Expected completed {:?}, got {:?}",
                    expected,
                    actual
                );
                Ok(())
            }
            Assertion::ExplainCount(expected) => {
                let actual = self.state()?.explain_count;
                ensure!(
                    actual == *expected,
                    "Expected explain count {}, got {}",
                    expected,
                    actual
                );
                Ok(())
            }
            Assertion::TaskCount(expected) => {
                let plan = self.store().load_plan()?;
                ensure!(
                    plan.number_of_tasks == *expected && plan.tasks().len() == *expected,
                    "Expected {} tasks, plan records {} and contains {}",
                    expected,
                    plan.number_of_tasks,
                    plan.tasks().len()
                );
                Ok(())
            }
            Assertion::LastCheckStatus(expected) => {
                let state = self.state()?;
                let check = state
                    .last_check
                    .ok_or_else(|| anyhow!("Expected a last check, found none"))?;
                ensure!(
                    check.status == *expected,
                    "Expected last check {}, got {} ({})",
                    expected,
                    check.status,
                    check.message
                );
                Ok(())
            }
            Assertion::NoLastCheck => {
                let state = self.state()?;
                ensure!(
                    state.last_check.is_none(),
                    "Expected no last check, found {:?}",
                    state.last_check
                );
                Ok(())
            }
            Assertion::LastCheckMessage(expected) => {
                let state = self.state()?;
                let message = state.last_check.map(|c| c.message).unwrap_or_default();
                ensure!(
                    message == *expected,
                    "Expected check message {:?}, got {:?}",
                    expected,
                    message
                );
                Ok(())
            }
            Assertion::LastCheckAtClockTime => {
                let state = self.state()?;
                let check = state
                    .last_check
                    .ok_or_else(|| anyhow!("Expected a last check, found none"))?;
                ensure!(
                    check.timestamp == self.clock.now(),
                    "Expected check at {}, got {}",
                    self.clock.now(),
                    check.timestamp
                );
                Ok(())
            }
            Assertion::LastAdvance(expected) => {
                ensure!(
                    self.last_advance.as_ref() == Some(expected),
                    "Expected advance {:?}, got {:?}",
                    expected,
                    self.last_advance
                );
                Ok(())
            }
            Assertion::LastPatch { inserted, dropped } => {
                let patch = self
                    .last_patch
                    .as_ref()
                    .ok_or_else(|| anyhow!("No annotations were applied"))?;
                ensure!(
                    patch.inserted == *inserted && patch.dropped == *dropped,
                    "Expected {} inserted / {} dropped, got {:?}",
                    inserted,
                    dropped,
                    patch
                );
                Ok(())
            }
            Assertion::FileExists { path } => {
                ensure!(self.workspace.file_exists(path), "File not found: {}", path);
                Ok(())
            }
            Assertion::FileMissing { path } => {
                ensure!(!self.workspace.file_exists(path), "File should not exist: {}", path);
                Ok(())
            }
            Assertion::FileContentEquals { path, content } => {
                let actual = self.workspace.read_to_string(path)?;
                ensure!(
                    actual == *content,
                    "File {} content mismatch:\n--- expected\n{}\n--- actual\n{}",
                    path,
                    content,
                    actual
                );
                Ok(())
            }
            Assertion::FileContentContains { path, content } => {
                let actual = self.workspace.read_to_string(path)?;
                ensure!(
                    actual.contains(content.as_str()),
                    "File {} does not contain {:?}:\n{}",
                    path,
                    content,
                    actual
                );
                Ok(())
            }
            Assertion::Custom(f) => f(&self.store()),
        }
    }
}
