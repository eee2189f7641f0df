//! The full annotation run: Level-1, Level-2, Level-3, then priority.

use tracing::info;

use crate::config::Config;
use crate::model::{Action, ActionsBySession, SessionLogs};
use crate::parse::{self, ParseError};
use crate::plugin::PluginRegistry;
use crate::priority::resolve_priority;
use crate::similarity::Similarity;
use crate::storage::{Storage, StorageError};

/// Errors that can stop a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Every stage's output, one snapshot each.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifacts {
    pub level_1: ActionsBySession,
    pub level_2: ActionsBySession,
    pub level_3: ActionsBySession,
    pub prioritized: ActionsBySession,
}

impl Artifacts {
    pub fn action_count(&self) -> usize {
        self.prioritized.values().map(Vec::len).sum()
    }

    /// Write all four snapshots to `storage`.
    pub fn save(&self, storage: &Storage) -> Result<(), PipelineError> {
        storage.write_artifacts(&self.level_1, &self.level_2, &self.level_3, &self.prioritized)?;
        Ok(())
    }
}

/// Run every stage over `sessions`.
///
/// Each stage reads the previous snapshot and produces a new one, so all
/// intermediate results stay available for inspection.
pub fn run(
    sessions: &SessionLogs,
    config: &Config,
    oracle: &dyn Similarity,
    registry: &PluginRegistry,
) -> Result<Artifacts, PipelineError> {
    let level_1 = parse::parse_level_1(sessions, &config.merge)?;
    info!(sessions = level_1.len(), actions = count(&level_1), "level 1 done");

    let level_2 = parse::parse_level_2(&level_1, oracle, &config.level_2)?;
    info!(labeled = labeled(&level_2, |a| a.level_2_action_type.is_some()), "level 2 done");

    let level_3 = parse::parse_level_3(&level_2, oracle, &config.level_3)?;
    info!(labeled = labeled(&level_3, |a| a.level_3_action_type.is_some()), "level 3 done");

    let priority = registry.priority_order();
    let prioritized = resolve_priority(&priority, &level_3);
    info!(plugins = ?priority, "priority resolved");

    Ok(Artifacts {
        level_1,
        level_2,
        level_3,
        prioritized,
    })
}

fn count(sessions: &ActionsBySession) -> usize {
    sessions.values().map(Vec::len).sum()
}

fn labeled(sessions: &ActionsBySession, f: impl Fn(&Action) -> bool) -> usize {
    sessions.values().flatten().filter(|a| f(a)).count()
}
