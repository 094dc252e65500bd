use std::path::PathBuf;

use engine::storage::{read_text_if_exists, write_text_atomic};
use tracing::warn;

pub(crate) const HIGH_SCORE_FILE: &str = "highscore.txt";

/// Best-effort persistence of a single integer.
pub(crate) trait HighScoreStore {
    /// Anything unreadable counts as 0.
    fn load(&mut self) -> u32;

    /// Failures are logged and otherwise ignored.
    fn save(&mut self, high_score: u32);
}

#[derive(Debug, Clone)]
pub(crate) struct HighScoreFile {
    path: PathBuf,
}

impl HighScoreFile {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl HighScoreStore for HighScoreFile {
    fn load(&mut self) -> u32 {
        let raw = match read_text_if_exists(&self.path) {
            Ok(Some(raw)) => raw,
            Ok(None) => return 0,
            Err(error) => {
                warn!(path = %self.path.display(), error = %error, "high_score_read_failed");
                return 0;
            }
        };
        match raw.trim().parse::<u32>() {
            Ok(value) => value,
            Err(error) => {
                warn!(path = %self.path.display(), error = %error, "high_score_unparseable");
                0
            }
        }
    }

    fn save(&mut self, high_score: u32) {
        if let Err(error) = write_text_atomic(&self.path, &high_score.to_string()) {
            warn!(path = %self.path.display(), error = %error, "high_score_write_failed");
        }
    }
}
