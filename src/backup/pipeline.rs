//! Sequential step driver with guaranteed workspace cleanup.
//!
//! A [`Pipeline`] owns the [`Workspace`] of one backup or restore run. Steps
//! execute strictly in order and the first error stops the run. Whatever the
//! outcome, the workspace is destroyed exactly once before [`Pipeline::run`]
//! returns; a cleanup failure is logged and never replaces the step error.
//! On success an optional post-success hook runs (the retention purge for
//! backups), whose failure is logged but does not fail the run.

use crate::backup::command::{build, BackupOptions};
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithMsg;
use crate::backup::runner::CommandRunner;
use crate::backup::workspace::Workspace;
use derive_more::Display;
use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything a step may look at while it runs.
#[derive(Clone, Debug)]
pub struct StepContext {
    pub workspace: PathBuf,
    pub destination: PathBuf,
    pub filename: String,
    pub overwrite: bool,
    pub runner: Arc<dyn CommandRunner + Send + Sync>,
}

impl StepContext {
    /// `<destination>/<filename>.tar.gz`
    pub fn archive_path(&self) -> PathBuf {
        self.destination.join(format!("{}.tar.gz", self.filename))
    }

    /// Fails with [`Error::ArchiveExists`] when the target archive is present
    /// and overwriting is not allowed.
    pub fn ensure_archive_absent(&self) -> Result<()> {
        let archive = self.archive_path();
        if archive.exists() && !self.overwrite {
            return Err(Error::ArchiveExists(archive));
        }
        Ok(())
    }

    /// Where a new archive is written inside the workspace before it is moved
    /// to [`StepContext::archive_path`].
    pub fn staged_archive_path(&self) -> PathBuf {
        self.workspace.join(format!("{}.tar.gz", self.filename))
    }

    /// Moves a freshly written archive into the destination, replacing an
    /// existing one only when overwriting is allowed.
    pub fn publish_archive(&self, staged: &Path) -> Result<()> {
        self.ensure_archive_absent()?;
        let archive = self.archive_path();
        std::fs::rename(staged, &archive)
            .map_err(Error::from)
            .with_msg(format!("Moving {staged:?} to {archive:?} failed"))
    }

    /// Runs `binary` with `options`, then checks that `expected` exists.
    ///
    /// Both a zero exit and the expected output are required: the wrapped
    /// tools sometimes exit cleanly without writing anything.
    pub fn run_tool<F: FnOnce(&Path) -> bool>(
        &self,
        binary: &str,
        options: &BackupOptions,
        expected: &Path,
        produced: F,
    ) -> Result<()> {
        let command = build(options, binary)?;
        let output = self.runner.run(&command)?;
        if !*output.success() {
            return Err(Error::tool(command, output.failure_reason()));
        }
        if !produced(expected) {
            return Err(Error::tool(
                command,
                format!("{binary} failed, expected output {expected:?} is missing"),
            ));
        }
        tracing::info!("{}", command);
        Ok(())
    }
}

type StepAction = Box<dyn FnOnce(&StepContext) -> Result<()>>;
type Hook = Box<dyn FnOnce() -> Result<()>>;

/// One named unit of work.
pub struct Step {
    name: String,
    action: StepAction,
}

impl Step {
    pub fn new<N: Into<String>, F: FnOnce(&StepContext) -> Result<()> + 'static>(
        name: N,
        action: F,
    ) -> Self {
        Self {
            name: name.into(),
            action: Box::new(action),
        }
    }
}

impl Debug for Step {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step").field("name", &self.name).finish()
    }
}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum PipelineState {
    #[display("pending")]
    Pending,
    #[display("running step {_0}")]
    Running(usize),
    #[display("failed")]
    Failed,
    #[display("succeeded")]
    Succeeded,
}

pub struct Pipeline {
    workspace: Workspace,
    context: StepContext,
    steps: Vec<Step>,
    on_success: Option<Hook>,
    state: PipelineState,
}

impl Pipeline {
    /// The context's `workspace` field is overwritten with the path of `workspace`.
    pub fn new(workspace: Workspace, mut context: StepContext) -> Self {
        context.workspace = workspace.path().to_path_buf();
        Self {
            workspace,
            context,
            steps: Vec::new(),
            on_success: None,
            state: PipelineState::Pending,
        }
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps<I: IntoIterator<Item = Step>>(mut self, steps: I) -> Self {
        self.steps.extend(steps);
        self
    }

    pub fn on_success<F: FnOnce() -> Result<()> + 'static>(mut self, hook: F) -> Self {
        self.on_success = Some(Box::new(hook));
        self
    }

    pub fn run(self) -> Result<()> {
        self.run_with_state().1
    }

    /// Like [`Pipeline::run`], also returning the terminal state.
    pub fn run_with_state(mut self) -> (PipelineState, Result<()>) {
        let steps = std::mem::take(&mut self.steps);
        let total = steps.len();
        let mut result = Ok(());

        for (i, step) in steps.into_iter().enumerate() {
            self.state = PipelineState::Running(i);
            tracing::debug!("[{}/{}] {}", i + 1, total, step.name);
            if let Err(e) = (step.action)(&self.context) {
                tracing::error!("Step {} failed: {}", step.name, e);
                result = Err(e);
                break;
            }
        }
        self.state = if result.is_ok() {
            PipelineState::Succeeded
        } else {
            PipelineState::Failed
        };

        tracing::debug!("Pipeline {}", self.state);

        if let Err(cleanup_error) = self.workspace.destroy() {
            tracing::warn!("{}", cleanup_error);
        }

        if result.is_ok() {
            if let Some(hook) = self.on_success {
                if let Err(e) = hook() {
                    tracing::warn!("Post-success step failed: {}", e);
                }
            }
        }

        (self.state, result)
    }
}
