use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::KeyValueStore;

pub const STATISTICS_KEY: &str = "zetamac-statistics";
pub const MAX_RECENT_GAMES: usize = 10;

/// round(100 * correct / total) with halves rounding up, 0 when nothing
/// was attempted. Integer arithmetic keeps 23/40 at 58.
pub fn accuracy_percent(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let (correct, total) = (u64::from(correct), u64::from(total));
    ((200 * correct + total) / (2 * total)) as u32
}

/// Outcome of one finished session. Fields missing from a stored record
/// read as zero (the date as the epoch).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameResult {
    pub score: u32,
    pub accuracy: u32,
    pub problems_solved: u32,
    pub duration: u32,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Statistics {
    pub total_games: u32,
    pub best_score: u32,
    pub total_score: u64,
    pub best_accuracy: u32,
    /// Newest first, at most [`MAX_RECENT_GAMES`]
    pub recent_games: Vec<GameResult>,
}

impl Statistics {
    pub fn record(&mut self, result: GameResult) {
        self.total_games += 1;
        self.total_score += u64::from(result.score);
        self.best_score = self.best_score.max(result.score);
        self.best_accuracy = self.best_accuracy.max(result.accuracy);
        self.recent_games.insert(0, result);
        self.recent_games.truncate(MAX_RECENT_GAMES);
    }

    pub fn average_score(&self) -> u64 {
        if self.total_games == 0 {
            return 0;
        }
        let games = u64::from(self.total_games);
        (2 * self.total_score + games) / (2 * games)
    }
}

/// Aggregate statistics persisted under [`STATISTICS_KEY`].
#[derive(Debug)]
pub struct StatisticsStore<K: KeyValueStore> {
    kv: K,
    stats: Statistics,
}

impl<K: KeyValueStore> StatisticsStore<K> {
    /// Load the saved record, falling back to the zero baseline when it is
    /// missing or malformed.
    pub fn load(kv: K) -> Self {
        let stats = match kv.get(STATISTICS_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<Statistics>(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "malformed statistics record; starting fresh");
                Statistics::default()
            }),
            Ok(None) => Statistics::default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read statistics; starting fresh");
                Statistics::default()
            }
        };
        Self { kv, stats }
    }

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    /// Fold one result into the aggregate and persist it.
    pub fn append_result(&mut self, result: GameResult) -> crate::Result<&Statistics> {
        tracing::info!(
            score = result.score,
            accuracy = result.accuracy,
            problems = result.problems_solved,
            "recording game result"
        );
        self.stats.record(result);
        self.save()?;
        Ok(&self.stats)
    }

    /// Reset to the zero baseline and erase the durable record. Asking the
    /// user first is the caller's job.
    pub fn clear(&mut self) -> crate::Result<()> {
        tracing::info!(games = self.stats.total_games, "clearing statistics");
        self.stats = Statistics::default();
        self.kv.remove(STATISTICS_KEY)
    }

    fn save(&mut self) -> crate::Result<()> {
        let data = serde_json::to_string(&self.stats)?;
        self.kv.set(STATISTICS_KEY, &data)
    }
}
