use crate::problem::Operation;
use crate::settings::{Difficulty, Settings};

pub const DURATION_PRESETS: [u32; 5] = [30, 60, 120, 180, 300];
pub const AUTO_SUBMIT_STEP_MS: u64 = 100;
pub const MAX_AUTO_SUBMIT_DELAY_MS: u64 = 3000;

const DIFFICULTIES: [Difficulty; 4] = [
    Difficulty::Easy,
    Difficulty::Medium,
    Difficulty::Hard,
    Difficulty::Expert,
];

/// One editable row of the options screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionField {
    Duration,
    Difficulty,
    Op(Operation),
    AllowNegatives,
    AutoSubmitDelay,
}

pub const FIELDS: [OptionField; 8] = [
    OptionField::Duration,
    OptionField::Difficulty,
    OptionField::Op(Operation::Addition),
    OptionField::Op(Operation::Subtraction),
    OptionField::Op(Operation::Multiplication),
    OptionField::Op(Operation::Division),
    OptionField::AllowNegatives,
    OptionField::AutoSubmitDelay,
];

fn on_off(enabled: bool) -> String {
    let label = if enabled { "on" } else { "off" };
    label.to_string()
}

impl OptionField {
    pub fn label(&self) -> &'static str {
        match self {
            OptionField::Duration => "Duration",
            OptionField::Difficulty => "Difficulty",
            OptionField::Op(Operation::Addition) => "Addition",
            OptionField::Op(Operation::Subtraction) => "Subtraction",
            OptionField::Op(Operation::Multiplication) => "Multiplication",
            OptionField::Op(Operation::Division) => "Division",
            OptionField::AllowNegatives => "Negative answers",
            OptionField::AutoSubmitDelay => "Auto-submit delay",
        }
    }

    pub fn value(&self, settings: &Settings) -> String {
        match self {
            OptionField::Duration => format!("{}s", settings.duration),
            OptionField::Difficulty => settings.difficulty.to_string(),
            OptionField::Op(op) => on_off(settings.operations.is_enabled(*op)),
            OptionField::AllowNegatives => on_off(settings.allow_negatives),
            OptionField::AutoSubmitDelay if settings.auto_submit_delay == 0 => "off".to_string(),
            OptionField::AutoSubmitDelay => format!("{}ms", settings.auto_submit_delay),
        }
    }

    /// The settings with this field stepped one notch. Presets and tiers
    /// wrap around, the delay is clamped.
    pub fn adjust(&self, mut settings: Settings, forward: bool) -> Settings {
        match self {
            OptionField::Duration => {
                let current = settings.duration;
                settings.duration = if forward {
                    DURATION_PRESETS
                        .into_iter()
                        .find(|d| *d > current)
                        .unwrap_or(DURATION_PRESETS[0])
                } else {
                    DURATION_PRESETS
                        .into_iter()
                        .rev()
                        .find(|d| *d < current)
                        .unwrap_or(DURATION_PRESETS[DURATION_PRESETS.len() - 1])
                };
            }
            OptionField::Difficulty => {
                let idx = DIFFICULTIES
                    .iter()
                    .position(|d| *d == settings.difficulty)
                    .unwrap_or(1);
                let len = DIFFICULTIES.len();
                let next = if forward { idx + 1 } else { idx + len - 1 };
                settings.difficulty = DIFFICULTIES[next % len];
            }
            OptionField::Op(op) => {
                let enabled = settings.operations.is_enabled(*op);
                settings.operations.set(*op, !enabled);
            }
            OptionField::AllowNegatives => settings.allow_negatives = !settings.allow_negatives,
            OptionField::AutoSubmitDelay => {
                settings.auto_submit_delay = if forward {
                    (settings.auto_submit_delay + AUTO_SUBMIT_STEP_MS).min(MAX_AUTO_SUBMIT_DELAY_MS)
                } else {
                    settings.auto_submit_delay.saturating_sub(AUTO_SUBMIT_STEP_MS)
                };
            }
        }
        settings
    }
}
