use getset::Getters;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// A completed backup archive sitting in the destination directory.
#[derive(Clone, Debug, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct BackupArtifact {
    name: String,
    path: PathBuf,
    size: u64,
}

impl BackupArtifact {
    fn from_dir_entry(de: DirEntry) -> Option<Self> {
        let metadata = match std::fs::metadata(de.path()) {
            Ok(md) => md,
            Err(e) => {
                tracing::warn!("Skipping {:?}, cannot read metadata: {}", de.path(), e);
                return None;
            }
        };
        if !metadata.is_file() {
            tracing::trace!("Skipping {:?} not a file", de.path());
            return None;
        }

        Some(Self {
            name: de.file_name().to_string_lossy().into_owned(),
            path: de.into_path(),
            size: metadata.len(),
        })
    }
}

/// Lists regular files directly inside `dir`, oldest first.
///
/// File names embed a zero padded timestamp, so name order is age order.
/// Subdirectories (including the `tmp` workspace parent) are skipped, and a
/// missing or unreadable directory yields an empty list.
pub fn list<P: AsRef<Path>>(dir: P) -> Vec<BackupArtifact> {
    let dir = dir.as_ref();
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|res| match res {
            Ok(de) => BackupArtifact::from_dir_entry(de),
            Err(e) => {
                tracing::warn!("Cannot list backup files in {:?}: {}", dir, e);
                None
            }
        })
        .collect()
}

/// The most recent backup in `dir`, if any.
pub fn latest<P: AsRef<Path>>(dir: P) -> Option<BackupArtifact> {
    list(dir).pop()
}
