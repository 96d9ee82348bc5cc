pub mod mongodb;
pub mod mysql;

use crate::backup::archiver::{create_archive, extract_archive};
use crate::backup::command::BackupOptions;
use crate::backup::inventory::BackupArtifact;
use crate::backup::pipeline::{Step, StepContext};
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::tool::mongodb::MongoDbTool;
use crate::backup::tool::mysql::MySqlTool;
use derive_more::From;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// A backup tool family, expressed as the steps of its backup and restore runs.
pub trait BackupTool: Debug {
    fn name(&self) -> &str;

    /// Steps that dump into the workspace and leave the archive in the destination.
    fn backup_steps(&self, options: BackupOptions) -> Result<Vec<Step>>;

    /// Steps that unpack `artifact` into the workspace and load it into the database.
    fn restore_steps(&self, options: BackupOptions, artifact: &BackupArtifact) -> Result<Vec<Step>>;
}

/// Tool selection as written in the configuration file.
#[derive(Clone, Debug, From, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
#[serde(deny_unknown_fields)]
pub enum ToolConfig {
    Mongodb(MongoDbTool),
    Mysql(MySqlTool),
}

impl BackupTool for ToolConfig {
    fn name(&self) -> &str {
        match self {
            ToolConfig::Mongodb(t) => t.name(),
            ToolConfig::Mysql(t) => t.name(),
        }
    }

    fn backup_steps(&self, options: BackupOptions) -> Result<Vec<Step>> {
        match self {
            ToolConfig::Mongodb(t) => t.backup_steps(options),
            ToolConfig::Mysql(t) => t.backup_steps(options),
        }
    }

    fn restore_steps(&self, options: BackupOptions, artifact: &BackupArtifact) -> Result<Vec<Step>> {
        match self {
            ToolConfig::Mongodb(t) => t.restore_steps(options, artifact),
            ToolConfig::Mysql(t) => t.restore_steps(options, artifact),
        }
    }
}

/// Refuses to start when the target archive exists and may not be replaced.
pub(crate) fn check_destination_step() -> Step {
    Step::new("check destination", |ctx| ctx.ensure_archive_absent())
}

/// Archives every top level entry of the workspace into the target archive.
pub(crate) fn archive_workspace_step(tool: &str) -> Step {
    let tool = tool.to_string();
    Step::new("archive", move |ctx| {
        let entries = workspace_entries(&ctx.workspace)?;
        if entries.is_empty() {
            return Err(Error::tool(&tool, format!("{tool} failed, nothing was dumped")));
        }
        archive_into_destination(ctx, entries.as_slice())
    })
}

/// Writes `entries` of the workspace into a staged archive and moves it to
/// the destination once tar has produced it.
pub(crate) fn archive_into_destination<S: AsRef<str>>(ctx: &StepContext, entries: &[S]) -> Result<()> {
    ctx.ensure_archive_absent()?;
    let staged = ctx.staged_archive_path();
    create_archive(ctx.runner.as_ref(), &ctx.workspace, entries, &staged)?;
    ctx.publish_archive(&staged)
}

pub(crate) fn extract_step(artifact: &BackupArtifact) -> Step {
    let archive = artifact.path().clone();
    Step::new("extract", move |ctx| {
        if !archive.is_file() {
            return Err(Error::ArtifactNotFound(archive));
        }
        extract_archive(ctx.runner.as_ref(), &archive, &ctx.workspace)
    })
}

/// Names of the entries directly inside `dir`, sorted.
pub(crate) fn workspace_entries(dir: &Path) -> Result<Vec<String>> {
    Ok(std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .sorted()
        .collect())
}

/// First file with extension `ext` directly inside `dir`, by name.
pub(crate) fn find_by_extension(dir: &Path, ext: &str) -> Result<Option<PathBuf>> {
    Ok(workspace_entries(dir)?
        .into_iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file() && p.extension().is_some_and(|e| e == ext)))
}
