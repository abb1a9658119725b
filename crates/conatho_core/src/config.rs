//! Document open configuration.
//!
//! # Responsibility
//! - Collect the tunables applied when a document file is opened.
//!
//! # Invariants
//! - Thumbnail size is part of the document format and is not configurable.

use std::time::Duration;

pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);
pub const THUMBNAIL_WIDTH: u32 = 150;
pub const THUMBNAIL_HEIGHT: u32 = 150;

/// Settings applied by `Document::open_with_config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentConfig {
    /// How long SQLite waits on a locked file before failing a statement.
    pub busy_timeout: Duration,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

impl DocumentConfig {
    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::DocumentConfig;
    use std::time::Duration;

    #[test]
    fn default_waits_five_seconds_on_locks() {
        let config = DocumentConfig::default();
        assert_eq!(config.busy_timeout, Duration::from_secs(5));

        let tuned = config.with_busy_timeout(Duration::from_millis(250));
        assert_eq!(tuned.busy_timeout, Duration::from_millis(250));
    }
}
