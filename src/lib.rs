// Library surface for the binary, headless integration tests and reuse.
pub mod app;
pub mod app_dirs;
pub mod auto_submit;
pub mod error;
pub mod export;
pub mod game;
pub mod options;
pub mod problem;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod ui;

pub use error::{DrillError, Result};
