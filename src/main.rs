use clap::{Parser, Subcommand};
use db_backup::backup::backup_config::AppConfig;
use db_backup::backup::plugin::BackupPlugin;
use db_backup::backup::result_error::result::Result;
use db_backup::backup::result_error::WithMsg;
use db_backup::backup::retention::PurgeOutcome;
use db_backup::backup::size::human_readable_size;
use std::path::PathBuf;
use std::process::exit;
use tracing::{error, Level};

/// Dump a database into a compressed archive, restore the latest one, or tidy old ones
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Location of config file
    #[arg(short, long)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Create a new backup, then apply the retention policy
    Backup,
    /// Restore the most recent backup
    Restore,
    /// Apply the retention policy once
    Purge,
    /// List backups, oldest first
    List,
}

fn run(command: Command, app: AppConfig) -> Result<()> {
    let plugin = BackupPlugin::new(app.storage, app.tool)?;
    match command {
        Command::Backup => {
            let archive = plugin.backup(app.backup_options)?;
            println!("{}", archive.display());
        }
        Command::Restore => {
            let restored = plugin.restore(app.restore_options)?;
            println!("{}", restored.display());
        }
        Command::Purge => match plugin.purge()? {
            PurgeOutcome::Evicted(artifact) => println!("deleted {}", artifact.name()),
            _ => println!("nothing to delete"),
        },
        Command::List => {
            for artifact in plugin.list() {
                println!("{}\t{}", artifact.name(), human_readable_size(*artifact.size()));
            }
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    let app = match AppConfig::load(&args.config) {
        Ok(app) => app,
        Err(e) => {
            tracing_subscriber::fmt().with_max_level(Level::WARN).init();
            error!("{e}");
            exit(1);
        }
    };

    let level = if app.storage.debug() {
        Level::DEBUG
    } else {
        Level::WARN
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    if let Err(e) = run(args.command, app)
        .with_msg(format!("{:?} using {:?} failed", args.command, args.config))
    {
        error!("{e}");
        exit(1);
    }
}
