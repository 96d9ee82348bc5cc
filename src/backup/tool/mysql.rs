use crate::backup::command::{BackupOptions, CommandArg};
use crate::backup::inventory::BackupArtifact;
use crate::backup::pipeline::Step;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithMsg;
use crate::backup::tool::{
    archive_into_destination, check_destination_step, extract_step, find_by_extension, BackupTool,
};
use bon::Builder;
use getset::Getters;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_dump_binary() -> String {
    "mysqldump".into()
}

fn default_restore_binary() -> String {
    "mysql".into()
}

/// `mysqldump` / `mysql` wiring.
///
/// The dump is a single `<filename>.sql` written into the workspace through
/// shell redirection, then compressed into the destination archive.
#[derive(Clone, Debug, Serialize, Deserialize, Builder, Getters, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct MySqlTool {
    #[serde(default = "default_dump_binary")]
    #[builder(default = default_dump_binary(), into)]
    dump_binary: String,
    #[serde(default = "default_restore_binary")]
    #[builder(default = default_restore_binary(), into)]
    restore_binary: String,
}

impl Default for MySqlTool {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Dumps every database unless the caller picked some.
fn shape_dump_options(mut options: BackupOptions, dump_file: &Path) -> BackupOptions {
    if !options.contains_flag("databases") && !options.contains_flag("all-databases") {
        options.push(CommandArg::toggle("all-databases"));
    }
    options.push(CommandArg::raw(format!("> {}", dump_file.display())));
    options
}

impl BackupTool for MySqlTool {
    fn name(&self) -> &str {
        "mysql"
    }

    fn backup_steps(&self, options: BackupOptions) -> Result<Vec<Step>> {
        let binary = self.dump_binary.clone();
        let dump = Step::new("mysqldump", move |ctx| {
            let dump_file = ctx.workspace.join(format!("{}.sql", ctx.filename));
            let options = shape_dump_options(options, &dump_file);
            ctx.run_tool(&binary, &options, &dump_file, Path::is_file)
        });

        let archive = Step::new("archive", |ctx| {
            let dump_name = format!("{}.sql", ctx.filename);
            archive_into_destination(ctx, &[&dump_name])?;

            let dump_file = ctx.workspace.join(&dump_name);
            std::fs::remove_file(&dump_file)
                .map_err(Error::from)
                .with_msg(format!("Removing intermediate dump {dump_file:?} failed"))
        });

        Ok(vec![check_destination_step(), dump, archive])
    }

    fn restore_steps(&self, options: BackupOptions, artifact: &BackupArtifact) -> Result<Vec<Step>> {
        let binary = self.restore_binary.clone();
        let restore = Step::new("mysql", move |ctx| {
            let dump_file = find_by_extension(&ctx.workspace, "sql")?
                .ok_or_else(|| Error::tool(&binary, "no .sql dump found in the extracted backup"))?;
            let options = options.with(CommandArg::raw(format!("< {}", dump_file.display())));
            ctx.run_tool(&binary, &options, &dump_file, Path::is_file)
        });

        Ok(vec![extract_step(artifact), restore])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::inventory;
    use crate::backup::pipeline::{Pipeline, StepContext};
    use crate::backup::runner::tests::RecordingRunner;
    use crate::backup::runner::CommandOutput;
    use crate::backup::tool::tests::fake_tools;
    use crate::backup::workspace::Workspace;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn context(base: &Path, runner: Arc<RecordingRunner>, overwrite: bool) -> StepContext {
        StepContext {
            workspace: PathBuf::new(),
            destination: base.to_path_buf(),
            filename: "backup-2024010100".into(),
            overwrite,
            runner,
        }
    }

    #[test]
    fn test_shape_dump_options_defaults_to_all_databases() {
        let options = shape_dump_options(
            BackupOptions::from_yaml_str("user: root").unwrap(),
            Path::new("/w/backup.sql"),
        );
        assert_eq!(
            crate::backup::command::build(&options, "mysqldump").unwrap(),
            "mysqldump --user root --all-databases > /w/backup.sql"
        );
    }

    #[test]
    fn test_shape_dump_options_keeps_selected_databases() {
        let options = shape_dump_options(
            BackupOptions::from_yaml_str("databases: shop").unwrap(),
            Path::new("/w/backup.sql"),
        );
        assert_eq!(
            crate::backup::command::build(&options, "mysqldump").unwrap(),
            "mysqldump --databases shop > /w/backup.sql"
        );
    }

    #[test]
    fn test_backup_removes_intermediate_dump() {
        let base = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::new(fake_tools));
        let workspace = Workspace::create(base.path(), "backup").unwrap();
        let workspace_path = workspace.path().to_path_buf();
        let dump_file = workspace_path.join("backup-2024010100.sql");
        let seen = dump_file.clone();

        let mut steps = MySqlTool::default().backup_steps(BackupOptions::new()).unwrap();
        steps.push(Step::new("inspect", move |_| {
            assert!(!seen.exists());
            Ok(())
        }));
        Pipeline::new(workspace, context(base.path(), runner.clone(), false))
            .steps(steps)
            .run()
            .unwrap();

        let archive = base.path().join("backup-2024010100.tar.gz");
        assert!(archive.is_file());
        assert_eq!(
            runner.commands(),
            vec![
                format!("mysqldump --all-databases > {}", dump_file.display()),
                format!(
                    "tar -C {} -czvf {} backup-2024010100.sql",
                    workspace_path.display(),
                    workspace_path.join("backup-2024010100.tar.gz").display()
                ),
            ]
        );
        assert_eq!(inventory::list(base.path()).len(), 1);
    }

    #[test]
    fn test_backup_fails_before_dump_when_archive_exists() {
        let base = TempDir::new().unwrap();
        std::fs::write(base.path().join("backup-2024010100.tar.gz"), "old").unwrap();
        let runner = Arc::new(RecordingRunner::new(fake_tools));
        let workspace = Workspace::create(base.path(), "backup").unwrap();

        let steps = MySqlTool::default().backup_steps(BackupOptions::new()).unwrap();
        let result = Pipeline::new(workspace, context(base.path(), runner.clone(), false))
            .steps(steps)
            .run();

        assert!(matches!(result, Err(Error::ArchiveExists(_))));
        assert!(runner.commands().is_empty());
    }

    #[test]
    fn test_backup_overwrites_when_allowed() {
        let base = TempDir::new().unwrap();
        let archive = base.path().join("backup-2024010100.tar.gz");
        std::fs::write(&archive, "old").unwrap();
        let runner = Arc::new(RecordingRunner::new(fake_tools));
        let workspace = Workspace::create(base.path(), "backup").unwrap();

        let steps = MySqlTool::default().backup_steps(BackupOptions::new()).unwrap();
        Pipeline::new(workspace, context(base.path(), runner.clone(), true))
            .steps(steps)
            .run()
            .unwrap();

        assert_eq!(std::fs::read_to_string(archive).unwrap(), "backup-2024010100.sql");
    }

    #[test]
    fn test_backup_fails_when_dump_file_missing() {
        let base = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::new(|_| CommandOutput::succeeded()));
        let workspace = Workspace::create(base.path(), "backup").unwrap();

        let steps = MySqlTool::default().backup_steps(BackupOptions::new()).unwrap();
        let result = Pipeline::new(workspace, context(base.path(), runner.clone(), false))
            .steps(steps)
            .run();

        match result {
            Err(Error::ToolExecution { reason, .. }) => assert!(reason.contains("missing")),
            other => panic!("Expected ToolExecution, got {other:?}"),
        }
        assert_eq!(runner.commands().len(), 1);
    }

    #[test]
    fn test_restore_feeds_dump_to_mysql() {
        let base = TempDir::new().unwrap();
        std::fs::write(base.path().join("backup-2024010100.tar.gz"), "archive").unwrap();
        let artifact = inventory::latest(base.path()).unwrap();
        let runner = Arc::new(RecordingRunner::new(fake_tools));
        let workspace = Workspace::create(base.path(), "restore").unwrap();
        let workspace_path = workspace.path().to_path_buf();

        let steps = MySqlTool::default()
            .restore_steps(BackupOptions::from_yaml_str("user: root").unwrap(), &artifact)
            .unwrap();
        Pipeline::new(workspace, context(base.path(), runner.clone(), false))
            .steps(steps)
            .run()
            .unwrap();

        assert_eq!(
            runner.commands()[1],
            format!("mysql --user root < {}", workspace_path.join("restored.sql").display())
        );
        assert!(!workspace_path.exists());
    }
}
