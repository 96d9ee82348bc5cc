use crate::backup::inventory::{self, BackupArtifact};
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithMsg;
use crate::backup::size::human_readable_size;
use bon::Builder;
use getset::CopyGetters;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Decides whether the oldest backup must go, based on count and total size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Builder, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct RetentionPolicy {
    /// Backups are never evicted while fewer than this many exist.
    min: usize,
    /// Total size in bytes that triggers an eviction once reached.
    size: u64,
}

/// What a single [`RetentionPolicy::purge`] call did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PurgeOutcome {
    BelowMinimum { count: usize, min: usize },
    BelowSizeLimit { total: u64, limit: u64 },
    Evicted(BackupArtifact),
}

impl RetentionPolicy {
    /// Removes at most one backup, the oldest, from `dir`.
    ///
    /// The minimum count always wins over size pressure. Repeated calls keep
    /// shrinking the backlog one file at a time until the thresholds hold.
    pub fn purge<P: AsRef<Path>>(&self, dir: P) -> Result<PurgeOutcome> {
        let backups = inventory::list(dir);
        let outcome = self.evaluate(&backups);

        match &outcome {
            PurgeOutcome::BelowMinimum { count, min } => {
                tracing::warn!(
                    "Number of backups ({} files) are less than {}.",
                    count,
                    min
                );
            }
            PurgeOutcome::BelowSizeLimit { total, limit } => {
                tracing::warn!(
                    "Total size of backups ({}) are not greater than {}",
                    human_readable_size(*total),
                    human_readable_size(*limit)
                );
            }
            PurgeOutcome::Evicted(oldest) => {
                std::fs::remove_file(oldest.path())
                    .map_err(Error::from)
                    .with_msg(format!("Deleting old backup {:?} failed", oldest.path()))?;
                tracing::info!(
                    "An old backup called {} ({}) deleted!",
                    oldest.name(),
                    human_readable_size(*oldest.size())
                );
            }
        }

        Ok(outcome)
    }

    /// Pure decision over an oldest-first inventory.
    pub fn evaluate(&self, backups: &[BackupArtifact]) -> PurgeOutcome {
        if backups.len() < self.min {
            return PurgeOutcome::BelowMinimum {
                count: backups.len(),
                min: self.min,
            };
        }

        let total: u64 = backups.iter().map(|b| *b.size()).sum();
        match backups.first() {
            Some(oldest) if total >= self.size => PurgeOutcome::Evicted(oldest.clone()),
            _ => PurgeOutcome::BelowSizeLimit {
                total,
                limit: self.size,
            },
        }
    }
}
