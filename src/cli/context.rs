use std::path::{Path, PathBuf};
use std::sync::Arc;

use roundwatch::{Config, FileSlots};

pub struct CliContext {
    config: Arc<Config>,
    config_path: PathBuf,
}

impl CliContext {
    pub fn new(config: Config, config_path: PathBuf) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
        }
    }

    pub fn config(&self) -> &Config {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// File-backed slots rooted at `dir`, or at the configured state directory.
    pub fn file_slots(&self, dir: Option<&Path>) -> FileSlots {
        FileSlots::new(dir.unwrap_or(self.config.state_dir.as_path()))
    }
}
