use crate::backup::command::{build, BackupOptions, CommandArg};
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::runner::CommandRunner;
use std::path::Path;

static TAR: &str = "tar";

fn path_arg<P: AsRef<Path>>(path: P) -> CommandArg {
    CommandArg::raw(path.as_ref().to_string_lossy())
}

/// `tar -C <src_dir> -czvf <archive> <entries...>`
pub fn create_command<P1: AsRef<Path>, P2: AsRef<Path>, S: AsRef<str>>(
    src_dir: P1,
    entries: &[S],
    archive: P2,
) -> Result<String> {
    let options: BackupOptions = [
        CommandArg::raw("-C"),
        path_arg(src_dir),
        CommandArg::raw("-czvf"),
        path_arg(archive),
    ]
    .into_iter()
    .chain(entries.iter().map(|e| CommandArg::raw(e.as_ref())))
    .collect();
    build(&options, TAR)
}

/// `tar -xzvf <archive> -C <dest_dir>`
pub fn extract_command<P1: AsRef<Path>, P2: AsRef<Path>>(archive: P1, dest_dir: P2) -> Result<String> {
    let options: BackupOptions = [
        CommandArg::raw("-xzvf"),
        path_arg(archive),
        CommandArg::raw("-C"),
        path_arg(dest_dir),
    ]
    .into_iter()
    .collect();
    build(&options, TAR)
}

/// Packs `entries` of `src_dir` into a gzip compressed `archive`.
///
/// Succeeds only if tar exits cleanly and the archive file exists afterwards.
pub fn create_archive<P1: AsRef<Path>, P2: AsRef<Path>, S: AsRef<str>>(
    runner: &dyn CommandRunner,
    src_dir: P1,
    entries: &[S],
    archive: P2,
) -> Result<()> {
    if entries.is_empty() {
        return Err(Error::tool(TAR, "nothing to archive"));
    }
    let command = create_command(src_dir, entries, archive.as_ref())?;
    let output = runner.run(&command)?;
    if !*output.success() {
        return Err(Error::tool(command, output.failure_reason()));
    }
    if !archive.as_ref().is_file() {
        return Err(Error::tool(command, "archiving failed, no archive was written"));
    }
    tracing::info!("{}", command);
    Ok(())
}

/// Unpacks `archive` into `dest_dir`, which must end up non-empty.
pub fn extract_archive<P1: AsRef<Path>, P2: AsRef<Path>>(
    runner: &dyn CommandRunner,
    archive: P1,
    dest_dir: P2,
) -> Result<()> {
    let command = extract_command(archive, dest_dir.as_ref())?;
    let output = runner.run(&command)?;
    if !*output.success() {
        return Err(Error::tool(command, output.failure_reason()));
    }
    if is_empty_dir(dest_dir.as_ref()) {
        return Err(Error::tool(command, "extracting backup failed"));
    }
    tracing::info!("{}", command);
    Ok(())
}

/// True when `dir` is missing, unreadable or has no entries.
pub fn is_empty_dir(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(true)
}
