use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "ZETADRILL_DATA_DIR";
pub const DB_FILE: &str = "zetadrill.db";
pub const LOG_FILE: &str = "zetadrill.log";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Directory holding the store and the log file. `ZETADRILL_DATA_DIR`
    /// wins over `$HOME/.local/state/zetadrill`, which wins over the
    /// platform data dir.
    pub fn data_dir() -> Option<PathBuf> {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            return Some(PathBuf::from(dir));
        }
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("zetadrill"),
            )
        } else {
            ProjectDirs::from("", "", "zetadrill").map(|dirs| dirs.data_local_dir().to_path_buf())
        }
    }

    /// An explicit directory (from the command line) beats every default;
    /// the working directory is the last resort.
    pub fn resolve(explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .or_else(Self::data_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dir_wins() {
        let dir = Path::new("/tmp/drill-explicit");
        assert_eq!(AppDirs::resolve(Some(dir)), dir.to_path_buf());
    }

    #[test]
    fn falls_back_to_default_dir() {
        let resolved = AppDirs::resolve(None);
        if let Some(dir) = AppDirs::data_dir() {
            assert_eq!(resolved, dir);
        }
    }
}
