use crate::backup::command::BackupOptions;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithMsg;
use crate::backup::retention::RetentionPolicy;
use crate::backup::tool::ToolConfig;
use crate::backup::validate::{validate_valid_archive_base_name, validate_writable_dir};
use bon::Builder;
use chrono::Local;
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::fs::File;
use std::path::{Path, PathBuf};
use validator::Validate;

/// Max total size of backup files before the oldest one is deleted.
pub static DEFAULT_SIZE: u64 = 100 * 1024 * 1024;
/// At least this many backups are always kept.
pub static DEFAULT_MIN: usize = 3;
static FILENAME_TIME_FORMAT: &str = "%Y%m%d%H";

fn default_path() -> PathBuf {
    std::env::temp_dir().join("backup")
}

fn default_filename() -> String {
    format!("backup-{}", Local::now().format(FILENAME_TIME_FORMAT))
}

fn default_size() -> u64 {
    DEFAULT_SIZE
}

fn default_min() -> usize {
    DEFAULT_MIN
}

/// Where backups go and how many of them are kept.
#[derive(Clone, Debug, Serialize, Deserialize, Validate, Builder, Getters, CopyGetters, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BackupConfig {
    /// Destination directory, must already exist.
    #[validate(custom(function = validate_writable_dir))]
    #[serde(default = "default_path")]
    #[builder(default = default_path(), into)]
    #[getset(get = "pub")]
    path: PathBuf,
    /// Archive name without the `.tar.gz` extension.
    #[validate(custom(function = validate_valid_archive_base_name))]
    #[serde(default = "default_filename")]
    #[builder(default = default_filename(), into)]
    #[getset(get = "pub")]
    filename: String,
    #[serde(default = "default_size")]
    #[builder(default = DEFAULT_SIZE)]
    #[getset(get_copy = "pub")]
    size: u64,
    #[serde(default = "default_min")]
    #[builder(default = DEFAULT_MIN)]
    #[getset(get_copy = "pub")]
    min: usize,
    #[serde(default)]
    #[builder(default)]
    #[getset(get_copy = "pub")]
    overwrite: bool,
    #[serde(default)]
    #[builder(default)]
    #[getset(get_copy = "pub")]
    debug: bool,
}

/// Partial update for [`BackupConfig::configure`]; unset fields stay as they are.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, Serialize, Deserialize, Builder, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    #[builder(into)]
    pub path: Option<PathBuf>,
    #[builder(into)]
    pub filename: Option<String>,
    pub size: Option<u64>,
    pub min: Option<usize>,
    pub overwrite: Option<bool>,
    pub debug: Option<bool>,
}

impl BackupConfig {
    /// Runs every field validator.
    ///
    /// A bad destination is reported as [`Error::Path`], anything else as
    /// [`Error::InvalidOptions`].
    pub fn validated(self) -> Result<Self> {
        match self.validate() {
            Ok(()) => Ok(self),
            Err(errors) if errors.field_errors().contains_key("path") => Err(Error::Path {
                path: self.path.clone(),
                reason: errors.to_string(),
            }),
            Err(errors) => Err(Error::InvalidOptions(errors.to_string())),
        }
    }

    /// Overwrites the given settings and re-validates.
    ///
    /// On error the current settings are left untouched.
    pub fn configure(&mut self, overrides: ConfigOverrides) -> Result<()> {
        let mut next = self.clone();
        if let Some(path) = overrides.path {
            next.path = path;
        }
        if let Some(filename) = overrides.filename {
            next.filename = filename;
        }
        if let Some(size) = overrides.size {
            next.size = size;
        }
        if let Some(min) = overrides.min {
            next.min = min;
        }
        if let Some(overwrite) = overrides.overwrite {
            next.overwrite = overwrite;
        }
        if let Some(debug) = overrides.debug {
            next.debug = debug;
        }
        *self = next.validated()?;
        Ok(())
    }

    pub fn retention(&self) -> RetentionPolicy {
        RetentionPolicy::builder().min(self.min).size(self.size).build()
    }
}

/// Layout of the configuration file read by the binary.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub storage: BackupConfig,
    pub tool: ToolConfig,
    #[serde(default)]
    pub backup_options: BackupOptions,
    #[serde(default)]
    pub restore_options: BackupOptions,
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        File::open(path)
            .map_err(Error::from)
            .and_then(|f| serde_yml::from_reader::<_, AppConfig>(f).map_err(Error::from))
            .with_msg(format!("Parse YAML config failed: {:?}", path))
    }
}
