use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::error::DrillError;
use crate::settings::{Difficulty, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    Addition,
    Subtraction,
    Multiplication,
    Division,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Addition,
        Operation::Subtraction,
        Operation::Multiplication,
        Operation::Division,
    ];

    pub fn symbol(&self) -> char {
        match self {
            Operation::Addition => '+',
            Operation::Subtraction => '-',
            Operation::Multiplication => '×',
            Operation::Division => '÷',
        }
    }

    /// Operand bounds for this operation at the given tier. Multiplication
    /// and division use tighter bounds than addition at the same tier.
    pub fn range(&self, difficulty: Difficulty) -> RangeInclusive<i64> {
        use Difficulty::*;
        match (self, difficulty) {
            (Operation::Addition | Operation::Subtraction, Easy) => 1..=10,
            (Operation::Addition | Operation::Subtraction, Medium) => 1..=50,
            (Operation::Addition | Operation::Subtraction, Hard) => 1..=100,
            (Operation::Addition | Operation::Subtraction, Expert) => 1..=999,
            (Operation::Multiplication, Easy) => 1..=5,
            (Operation::Multiplication, Medium) => 1..=12,
            (Operation::Multiplication, Hard) => 1..=25,
            (Operation::Multiplication, Expert) => 1..=99,
            (Operation::Division, Easy) => 2..=5,
            (Operation::Division, Medium) => 2..=12,
            (Operation::Division, Hard) => 2..=25,
            (Operation::Division, Expert) => 2..=50,
        }
    }
}

/// A single arithmetic question and its answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub operation: Operation,
    pub left: i64,
    pub right: i64,
    pub correct_answer: i64,
    pub display_text: String,
}

impl Problem {
    pub fn new(operation: Operation, left: i64, right: i64) -> Self {
        let correct_answer = match operation {
            Operation::Addition => left + right,
            Operation::Subtraction => left - right,
            Operation::Multiplication => left * right,
            Operation::Division => left / right,
        };
        Self {
            operation,
            left,
            right,
            correct_answer,
            display_text: format!("{} {} {}", left, operation.symbol(), right),
        }
    }

    pub fn is_correct(&self, answer: i64) -> bool {
        answer == self.correct_answer
    }
}

/// Draws problems for the enabled operations at the configured tier.
///
/// Fails with [`DrillError::Configuration`] if no operation is enabled;
/// callers normally guarantee at least one through [`Settings::normalize`].
pub fn generate<R: Rng>(settings: &Settings, rng: &mut R) -> crate::Result<Problem> {
    let enabled = settings.operations.enabled();
    if enabled.is_empty() {
        return Err(DrillError::configuration("no operation is enabled"));
    }

    let operation = enabled[rng.gen_range(0..enabled.len())];
    let range = operation.range(settings.difficulty);

    let problem = match operation {
        Operation::Subtraction => {
            let mut left = rng.gen_range(range.clone());
            let mut right = rng.gen_range(range);
            if !settings.allow_negatives && right > left {
                std::mem::swap(&mut left, &mut right);
            }
            Problem::new(operation, left, right)
        }
        Operation::Division => {
            // The dividend is built from divisor and quotient so it may run
            // past the nominal range; the quotient never does.
            let divisor = rng.gen_range(range.clone());
            let quotient = rng.gen_range(1..=*range.end());
            Problem::new(operation, divisor * quotient, divisor)
        }
        Operation::Addition | Operation::Multiplication => {
            let left = rng.gen_range(range.clone());
            let right = rng.gen_range(range);
            Problem::new(operation, left, right)
        }
    };

    Ok(problem)
}
