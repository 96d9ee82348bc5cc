//! # db_backup
//!
//! Backup and restore orchestration for databases whose dump tools are
//! external command line programs.
//!
//! ## Features
//!
//! - **Tools**: MongoDB (`mongodump`/`mongorestore`) and MySQL (`mysqldump`/`mysql`)
//! - **Archives**: each backup is one `<filename>.tar.gz` in the destination directory
//! - **Retention Management**: after every backup the oldest archive is dropped
//!   once the total size limit is reached, never going below a minimum count
//! - **Isolated Workspaces**: every run dumps into its own scratch directory
//!   under `<destination>/tmp`, removed whatever the outcome
//!
//! ## Quick Start
//!
//! ```no_run
//! use db_backup::backup::backup_config::BackupConfig;
//! use db_backup::backup::command::BackupOptions;
//! use db_backup::backup::plugin::BackupPlugin;
//! use db_backup::backup::tool::mongodb::MongoDbTool;
//!
//! let config = BackupConfig::builder().path("/var/backups/mongo").build();
//! let plugin = BackupPlugin::new(config, MongoDbTool::default())?;
//!
//! let options = BackupOptions::from_yaml_str("uri: mongodb://localhost:27017\ngzip: true")?;
//! let archive = plugin.backup(options)?;
//! println!("created {}", archive.display());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod backup;
