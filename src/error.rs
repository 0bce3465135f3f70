use derive_more::{Display, Error, From};

use crate::session::Phase;

/// Errors surfaced by the drill core and its stores.
#[derive(Debug, Display, Error, From)]
pub enum DrillError {
    /// The settings cannot produce a problem (no operation enabled).
    #[display("configuration error: {message}")]
    Configuration { message: String },

    /// An operation was requested in a phase that does not allow it.
    #[display("cannot {action} while {from}")]
    InvalidTransition { from: Phase, action: &'static str },

    #[display("io error: {_0}")]
    #[from]
    Io(std::io::Error),

    #[display("json error: {_0}")]
    #[from]
    Json(serde_json::Error),

    #[display("storage error: {_0}")]
    #[from]
    Sqlite(rusqlite::Error),

    #[display("csv error: {_0}")]
    #[from]
    Csv(csv::Error),
}

impl DrillError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn invalid_transition(from: Phase, action: &'static str) -> Self {
        Self::InvalidTransition { from, action }
    }
}

pub type Result<T> = std::result::Result<T, DrillError>;
