use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithMsg;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Directory under the backup destination that holds all workspaces.
pub static WORKSPACE_PARENT: &str = "tmp";

/// Scratch directory owned by exactly one backup or restore run.
///
/// Removed by [`Workspace::destroy`]; if that is never reached (early return,
/// panic) the directory is still removed on drop, silently.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Creates `<base_dir>/tmp/<label>-<random suffix>`; the suffix is
    /// alphanumeric.
    ///
    /// `base_dir` must already be a directory, only the `tmp` child is created.
    pub fn create<P: AsRef<Path>>(base_dir: P, label: &str) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        if !base_dir.is_dir() {
            return Err(Error::Path {
                path: base_dir.to_path_buf(),
                reason: "destination directory is missing".into(),
            });
        }

        let parent = base_dir.join(WORKSPACE_PARENT);
        match std::fs::create_dir(&parent) {
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            res => res
                .map_err(Error::from)
                .with_msg(format!("Creating workspace parent {parent:?} failed"))?,
        }

        let dir = tempfile::Builder::new()
            .prefix(&format!("{label}-"))
            .tempdir_in(&parent)
            .map_err(Error::from)
            .with_msg(format!("Creating {label} workspace in {parent:?} failed"))?;
        tracing::debug!("Created workspace {:?}", dir.path());

        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Recursively removes the workspace, reporting failure as [`Error::Cleanup`].
    pub fn destroy(self) -> Result<()> {
        let path: PathBuf = self.dir.path().to_path_buf();
        self.dir
            .close()
            .map_err(|source| Error::Cleanup { path: path.clone(), source })?;
        tracing::debug!("Removed workspace {:?}", path);
        Ok(())
    }
}
