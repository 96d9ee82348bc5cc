//! Validation functions for configuration values.

use sanitize_filename::{is_sanitized, sanitize};
use validator::ValidationError;

use std::path::Path;

pub fn validate_valid_archive_base_name<S: AsRef<str>>(name: S) -> Result<(), ValidationError> {
    let name = name.as_ref();
    if name.trim().is_empty() {
        return Err(ValidationError::new("InvalidArchiveBaseName")
            .with_message("file name must not be empty".into()));
    }
    if !is_sanitized(name) {
        return Err(ValidationError::new("InvalidArchiveBaseName").with_message(
            format!(
                "Invalid file name, try sanitizing like {:?}",
                sanitize(name)
            )
            .into(),
        ));
    }

    Ok(())
}

pub fn validate_dir_exist<P: AsRef<Path>>(dir: P) -> Result<(), ValidationError> {
    let dir = dir.as_ref();
    if dir.exists() {
        if !dir.is_dir() {
            return Err(ValidationError::new("InvalidDirectory")
                .with_message(format!("{:?} is not a directory", dir).into()));
        }
    } else {
        return Err(ValidationError::new("InvalidDirectory")
            .with_message(format!("{:?} not found", dir).into()));
    }

    Ok(())
}

/// Existing directory that is not read-only. Never creates anything.
pub fn validate_writable_dir<P: AsRef<Path>>(dir: P) -> Result<(), ValidationError> {
    let dir = dir.as_ref();
    validate_dir_exist(dir)?;
    let md = std::fs::metadata(dir).map_err(|e| {
        ValidationError::new("InvalidDirectory")
            .with_message(format!("cannot access metadata for {:?}: {}", dir, e).into())
    })?;
    if md.permissions().readonly() {
        Err(ValidationError::new("InvalidDirectory")
            .with_message(format!("cannot write to dir {:?}", dir).into()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_archive_base_name() {
        assert!(validate_valid_archive_base_name("backup-2024010100").is_ok());
        assert!(validate_valid_archive_base_name("../escape").is_err());
        assert!(validate_valid_archive_base_name("a/b").is_err());
        assert!(validate_valid_archive_base_name("  ").is_err());
    }

    #[test]
    fn test_dir_exist() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file");
        std::fs::write(&file, "x").unwrap();

        assert!(validate_dir_exist(temp_dir.path()).is_ok());
        assert!(validate_dir_exist(&file).is_err());
        assert!(validate_dir_exist(temp_dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_writable_dir_does_not_create() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");

        assert!(validate_writable_dir(temp_dir.path()).is_ok());
        assert!(validate_writable_dir(&missing).is_err());
        assert!(!missing.exists());
    }
}
