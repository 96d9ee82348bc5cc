//! Public façade: one [`BackupTool`] bound to one validated [`BackupConfig`].
//!
//! `backup` and `restore` each run a single [`Pipeline`] in a fresh workspace
//! under `<path>/tmp`. A successful backup is followed by one retention purge.
//! Invocations against the same destination are not synchronised; callers
//! must serialise them.

use crate::backup::backup_config::{BackupConfig, ConfigOverrides};
use crate::backup::command::BackupOptions;
use crate::backup::function_path;
use crate::backup::inventory::{self, BackupArtifact};
use crate::backup::pipeline::{Pipeline, StepContext};
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithDebugObjectAndFnName;
use crate::backup::retention::PurgeOutcome;
use crate::backup::runner::{CommandRunner, ShellRunner};
use crate::backup::tool::BackupTool;
use crate::backup::validate::validate_writable_dir;
use crate::backup::workspace::Workspace;
use function_name::named;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct BackupPlugin<T: BackupTool> {
    config: BackupConfig,
    tool: T,
    runner: Arc<dyn CommandRunner + Send + Sync>,
}

impl<T: BackupTool> BackupPlugin<T> {
    /// Validates `config` and runs commands through [`ShellRunner`].
    pub fn new(config: BackupConfig, tool: T) -> Result<Self> {
        Ok(Self {
            config: config.validated()?,
            tool,
            runner: Arc::new(ShellRunner),
        })
    }

    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner + Send + Sync>) -> Self {
        self.runner = runner;
        self
    }

    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }

    /// See [`BackupConfig::configure`].
    pub fn configure(&mut self, overrides: ConfigOverrides) -> Result<()> {
        self.config.configure(overrides)
    }

    /// The destination may have vanished (e.g. an unmounted volume) since
    /// the configuration was validated.
    fn ensure_destination(&self) -> Result<()> {
        validate_writable_dir(self.config.path()).map_err(|e| Error::Path {
            path: self.config.path().clone(),
            reason: e.to_string(),
        })
    }

    fn step_context(&self) -> StepContext {
        StepContext {
            workspace: PathBuf::new(),
            destination: self.config.path().clone(),
            filename: self.config.filename().clone(),
            overwrite: self.config.overwrite(),
            runner: self.runner.clone(),
        }
    }

    /// Dumps the database into `<path>/<filename>.tar.gz` and returns that path.
    ///
    /// Fails with [`Error::ArchiveExists`] before any tool runs when the
    /// archive is already there and `overwrite` is off, and with
    /// [`Error::Path`] when the destination is no longer a writable directory.
    pub fn backup(&self, options: BackupOptions) -> Result<PathBuf> {
        self.ensure_destination()?;
        let steps = self.tool.backup_steps(options)?;
        let context = self.step_context();
        let archive = context.archive_path();
        let retention = self.config.retention();
        let destination = self.config.path().clone();

        info!("Starting {} backup to {:?}", self.tool.name(), archive);
        let workspace = Workspace::create(self.config.path(), "backup")?;
        Pipeline::new(workspace, context)
            .steps(steps)
            .on_success(move || retention.purge(&destination).map(|_| ()))
            .run()?;

        info!("Backup created: {:?}", archive);
        Ok(archive)
    }

    /// Loads the most recent backup into the database and returns its path.
    ///
    /// With no backup present this fails with [`Error::ArtifactNotFound`]
    /// and no workspace is created.
    pub fn restore(&self, options: BackupOptions) -> Result<PathBuf> {
        self.ensure_destination()?;
        let artifact = self
            .latest()
            .ok_or_else(|| Error::ArtifactNotFound(self.config.path().clone()))?;
        let steps = self.tool.restore_steps(options, &artifact)?;

        info!("Restoring {} from {}", self.tool.name(), artifact.name());
        let workspace = Workspace::create(self.config.path(), "restore")?;
        Pipeline::new(workspace, self.step_context())
            .steps(steps)
            .run()?;

        info!("Restored from {:?}", artifact.path());
        Ok(artifact.path().clone())
    }

    /// Applies the retention policy once, outside of a backup run.
    #[named]
    pub fn purge(&self) -> Result<PurgeOutcome> {
        self.config
            .retention()
            .purge(self.config.path())
            .with_debug_object_and_fn_name(self.config.path().clone(), function_path!())
    }

    /// Backups in the destination, oldest first.
    pub fn list(&self) -> Vec<BackupArtifact> {
        inventory::list(self.config.path())
    }

    pub fn latest(&self) -> Option<BackupArtifact> {
        inventory::latest(self.config.path())
    }
}
