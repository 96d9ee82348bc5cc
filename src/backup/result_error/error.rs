use crate::backup::result_error::{WithDebugObjectAndFnName, WithMsg};
use std::fmt::Debug;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    SerdeYml(#[from] serde_yml::Error),
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    #[error("invalid path for backup files {path:?}: {reason}")]
    Path { path: PathBuf, reason: String },
    #[error("{command} failed: {reason}")]
    ToolExecution { command: String, reason: String },
    #[error("backup file already exists: {0:?}")]
    ArchiveExists(PathBuf),
    #[error("backup file not found in {0:?}")]
    ArtifactNotFound(PathBuf),
    #[error("removing temporary folder {path:?} failed: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}:\n{}", msg, indent::indent_all_with("  ", error.to_string()))]
    WithMsg { msg: String, error: Box<Error> },
    #[error("{:?} {} failed:\n{}", obj_debug, fn_name, indent::indent_all_with("  ", error.to_string()))]
    WithDebugObjAndFnName {
        error: Box<Error>,
        obj_debug: Box<dyn Debug + Send>,
        fn_name: String,
    },
}

impl<S: Into<String>, O: Debug + Send + 'static> WithDebugObjectAndFnName<S, O> for Error {
    fn with_debug_object_and_fn_name(self, obj: O, fn_name: S) -> Self {
        Error::WithDebugObjAndFnName {
            error: Box::new(self),
            obj_debug: Box::new(obj),
            fn_name: fn_name.into(),
        }
    }
}

impl<S: Into<String>> WithMsg<S> for Error {
    fn with_msg(self, msg: S) -> Self {
        Self::WithMsg {
            msg: msg.into(),
            error: Box::new(self),
        }
    }
}

impl Error {
    pub fn tool<C: Into<String>, R: Into<String>>(command: C, reason: R) -> Self {
        Error::ToolExecution {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// Strips context wrappers and returns the error that caused the failure.
    pub fn root(&self) -> &Error {
        match self {
            Error::WithMsg { error, .. } => error.root(),
            Error::WithDebugObjAndFnName { error, .. } => error.root(),
            e => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = Error::from(io_error);

        match error {
            Error::Io(_) => (),
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_with_msg() {
        let error = Error::InvalidOptions("bad".into()).with_msg("Custom message");

        match error {
            Error::WithMsg { msg, .. } => assert_eq!(msg, "Custom message"),
            _ => panic!("Expected WithMsg error"),
        }
    }

    #[test]
    fn test_error_with_debug_object_and_fn_name() {
        let error = Error::ArchiveExists(PathBuf::from("/backup/a.tar.gz"))
            .with_debug_object_and_fn_name("test_object", "test_function");
        let error_str = error.to_string();

        match &error {
            Error::WithDebugObjAndFnName { fn_name, .. } => assert_eq!(fn_name, "test_function"),
            _ => panic!("Expected WithDebugObjAndFnName error"),
        }
        assert!(error_str.contains("test_function"));
        assert!(error_str.contains("already exists"));
    }

    #[test]
    fn test_error_root_unwraps_context() {
        let error = Error::ArtifactNotFound(PathBuf::from("/backup"))
            .with_msg("outer")
            .with_debug_object_and_fn_name(1, "restore");

        match error.root() {
            Error::ArtifactNotFound(p) => assert_eq!(p, &PathBuf::from("/backup")),
            e => panic!("Expected ArtifactNotFound, got {e:?}"),
        }
    }

    #[test]
    fn test_tool_error_display() {
        let error = Error::tool("mysqldump --all-databases", "exited with code 2");
        assert_eq!(
            error.to_string(),
            "mysqldump --all-databases failed: exited with code 2"
        );
    }
}
