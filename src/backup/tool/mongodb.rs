use crate::backup::archiver::is_empty_dir;
use crate::backup::command::{BackupOptions, CommandArg};
use crate::backup::inventory::BackupArtifact;
use crate::backup::pipeline::Step;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::tool::{archive_workspace_step, check_destination_step, extract_step, BackupTool};
use bon::Builder;
use getset::Getters;
use serde::{Deserialize, Serialize};
use std::path::Path;

static OUT_FLAG: &str = "out";

fn default_dump_binary() -> String {
    "mongodump".into()
}

fn default_restore_binary() -> String {
    "mongorestore".into()
}

/// `mongodump` / `mongorestore` wiring.
///
/// Backup dumps into the workspace with `--out` and archives every database
/// directory it produced. Restore unpacks the latest archive and passes the
/// workspace to `mongorestore` as its dump directory.
#[derive(Clone, Debug, Serialize, Deserialize, Builder, Getters, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct MongoDbTool {
    #[serde(default = "default_dump_binary")]
    #[builder(default = default_dump_binary(), into)]
    dump_binary: String,
    #[serde(default = "default_restore_binary")]
    #[builder(default = default_restore_binary(), into)]
    restore_binary: String,
}

impl Default for MongoDbTool {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl BackupTool for MongoDbTool {
    fn name(&self) -> &str {
        "mongodb"
    }

    fn backup_steps(&self, options: BackupOptions) -> Result<Vec<Step>> {
        if options.contains_flag(OUT_FLAG) {
            return Err(Error::InvalidOptions(format!(
                "`{OUT_FLAG}` is set to the backup workspace and cannot be configured"
            )));
        }
        let binary = self.dump_binary.clone();
        let dump = Step::new("mongodump", move |ctx| {
            let options = options.with(CommandArg::flag(OUT_FLAG, ctx.workspace.to_string_lossy()));
            ctx.run_tool(&binary, &options, &ctx.workspace, |p: &Path| !is_empty_dir(p))
        });

        Ok(vec![
            check_destination_step(),
            dump,
            archive_workspace_step(&self.dump_binary),
        ])
    }

    fn restore_steps(&self, options: BackupOptions, artifact: &BackupArtifact) -> Result<Vec<Step>> {
        let binary = self.restore_binary.clone();
        let restore = Step::new("mongorestore", move |ctx| {
            let options = options.with(CommandArg::raw(ctx.workspace.to_string_lossy()));
            ctx.run_tool(&binary, &options, &ctx.workspace, Path::exists)
        });

        Ok(vec![extract_step(artifact), restore])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::pipeline::{Pipeline, StepContext};
    use crate::backup::runner::tests::RecordingRunner;
    use crate::backup::runner::CommandOutput;
    use crate::backup::tool::tests::fake_tools;
    use crate::backup::workspace::Workspace;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn context(base: &Path, runner: Arc<RecordingRunner>) -> StepContext {
        StepContext {
            workspace: PathBuf::new(),
            destination: base.to_path_buf(),
            filename: "backup-2024010100".into(),
            overwrite: false,
            runner,
        }
    }

    fn options() -> BackupOptions {
        BackupOptions::from_yaml_str("host: localhost\ngzip: true\n").unwrap()
    }

    #[test]
    fn test_backup_dumps_then_archives() {
        let base = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::new(fake_tools));
        let workspace = Workspace::create(base.path(), "backup").unwrap();
        let workspace_path = workspace.path().display().to_string();

        let steps = MongoDbTool::default().backup_steps(options()).unwrap();
        Pipeline::new(workspace, context(base.path(), runner.clone()))
            .steps(steps)
            .run()
            .unwrap();

        let archive = base.path().join("backup-2024010100.tar.gz");
        assert!(archive.is_file());
        assert_eq!(
            runner.commands(),
            vec![
                format!("mongodump --host localhost --gzip --out {workspace_path}"),
                format!("tar -C {workspace_path} -czvf {workspace_path}/backup-2024010100.tar.gz shop"),
            ]
        );
    }

    #[test]
    fn test_backup_rejects_user_out_flag() {
        let result = MongoDbTool::default()
            .backup_steps(BackupOptions::from_yaml_str("out: /elsewhere").unwrap());

        assert!(matches!(result, Err(Error::InvalidOptions(_))));
    }

    #[test]
    fn test_backup_fails_when_dump_produces_nothing() {
        let base = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::new(|_| CommandOutput::succeeded()));
        let workspace = Workspace::create(base.path(), "backup").unwrap();

        let steps = MongoDbTool::default().backup_steps(options()).unwrap();
        let result = Pipeline::new(workspace, context(base.path(), runner.clone()))
            .steps(steps)
            .run();

        assert!(matches!(result, Err(Error::ToolExecution { .. })));
        assert_eq!(runner.commands().len(), 1);
    }

    #[test]
    fn test_backup_honours_binary_override() {
        let base = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::new(|_| CommandOutput::failed(127, "not found")));
        let workspace = Workspace::create(base.path(), "backup").unwrap();
        let tool = MongoDbTool::builder()
            .dump_binary("/opt/mongo/bin/mongodump")
            .build();

        let steps = tool.backup_steps(BackupOptions::new()).unwrap();
        let result = Pipeline::new(workspace, context(base.path(), runner.clone()))
            .steps(steps)
            .run();

        assert!(result.is_err());
        assert!(runner.commands()[0].starts_with("/opt/mongo/bin/mongodump --out "));
    }

    #[test]
    fn test_restore_extracts_then_restores() {
        let base = TempDir::new().unwrap();
        let archive = base.path().join("backup-2024010100.tar.gz");
        std::fs::write(&archive, "archive").unwrap();
        let artifact = crate::backup::inventory::latest(base.path()).unwrap();
        let runner = Arc::new(RecordingRunner::new(fake_tools));
        let workspace = Workspace::create(base.path(), "restore").unwrap();
        let workspace_path = workspace.path().display().to_string();

        let steps = MongoDbTool::default()
            .restore_steps(BackupOptions::from_yaml_str("drop: true").unwrap(), &artifact)
            .unwrap();
        Pipeline::new(workspace, context(base.path(), runner.clone()))
            .steps(steps)
            .run()
            .unwrap();

        assert_eq!(
            runner.commands(),
            vec![
                format!("tar -xzvf {} -C {workspace_path}", archive.display()),
                format!("mongorestore --drop {workspace_path}"),
            ]
        );
    }
}
