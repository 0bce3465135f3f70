use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::problem::Operation;
use crate::storage::KeyValueStore;

pub const SETTINGS_KEY: &str = "zetamac-settings";
pub const DEFAULT_DURATION_SECS: u32 = 120;
pub const DEFAULT_AUTO_SUBMIT_DELAY_MS: u64 = 800;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase", from = "String")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Expert,
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "expert" => Ok(Difficulty::Expert),
            _ => Err(()),
        }
    }
}

// Unrecognized tiers play like medium.
impl From<String> for Difficulty {
    fn from(s: String) -> Self {
        s.parse().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Operations {
    pub addition: bool,
    pub subtraction: bool,
    pub multiplication: bool,
    pub division: bool,
}

impl Default for Operations {
    fn default() -> Self {
        Self {
            addition: true,
            subtraction: true,
            multiplication: true,
            division: false,
        }
    }
}

impl Operations {
    pub fn only(op: Operation) -> Self {
        let mut ops = Self::none();
        ops.set(op, true);
        ops
    }

    pub fn none() -> Self {
        Self {
            addition: false,
            subtraction: false,
            multiplication: false,
            division: false,
        }
    }

    pub fn is_enabled(&self, op: Operation) -> bool {
        match op {
            Operation::Addition => self.addition,
            Operation::Subtraction => self.subtraction,
            Operation::Multiplication => self.multiplication,
            Operation::Division => self.division,
        }
    }

    pub fn set(&mut self, op: Operation, enabled: bool) {
        match op {
            Operation::Addition => self.addition = enabled,
            Operation::Subtraction => self.subtraction = enabled,
            Operation::Multiplication => self.multiplication = enabled,
            Operation::Division => self.division = enabled,
        }
    }

    /// Enabled operations in declaration order.
    pub fn enabled(&self) -> Vec<Operation> {
        Operation::ALL
            .into_iter()
            .filter(|op| self.is_enabled(*op))
            .collect()
    }

    pub fn any(&self) -> bool {
        self.addition || self.subtraction || self.multiplication || self.division
    }
}

impl FromIterator<Operation> for Operations {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        let mut ops = Self::none();
        for op in iter {
            ops.set(op, true);
        }
        ops
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub duration: u32,
    pub difficulty: Difficulty,
    pub operations: Operations,
    pub allow_negatives: bool,
    pub auto_submit_delay: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION_SECS,
            difficulty: Difficulty::Medium,
            operations: Operations::default(),
            allow_negatives: false,
            auto_submit_delay: DEFAULT_AUTO_SUBMIT_DELAY_MS,
        }
    }
}

impl Settings {
    /// Coerce the record into a playable configuration. Returns true if
    /// anything had to change.
    pub fn normalize(&mut self) -> bool {
        let mut changed = false;
        if !self.operations.any() {
            self.operations.addition = true;
            changed = true;
        }
        if self.duration == 0 {
            self.duration = DEFAULT_DURATION_SECS;
            changed = true;
        }
        changed
    }

    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }
}

/// Durable settings record kept under [`SETTINGS_KEY`].
#[derive(Debug)]
pub struct SettingsStore<K: KeyValueStore> {
    kv: K,
}

impl<K: KeyValueStore> SettingsStore<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    /// Saved settings merged over defaults. Missing, unreadable or malformed
    /// records yield the defaults.
    pub fn load(&self) -> Settings {
        let raw = match self.kv.get(SETTINGS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Settings::default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read settings; using defaults");
                return Settings::default();
            }
        };
        match serde_json::from_str::<Settings>(&raw) {
            Ok(settings) => settings.normalized(),
            Err(e) => {
                tracing::warn!(error = %e, "malformed settings record; using defaults");
                Settings::default()
            }
        }
    }

    pub fn save(&mut self, settings: &Settings) -> crate::Result<()> {
        let data = serde_json::to_string(settings)?;
        self.kv.set(SETTINGS_KEY, &data)
    }

    /// Normalize and persist. Returns the record actually stored.
    pub fn update(&mut self, settings: Settings) -> crate::Result<Settings> {
        let mut settings = settings;
        if settings.normalize() {
            tracing::debug!("settings normalized before save");
        }
        self.save(&settings)?;
        Ok(settings)
    }
}
