use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::session::{classify, Status};
use crate::util::parse_positive;

pub const DEFAULT_TARGET_SECONDS: u32 = 25;
pub const DEFAULT_WARNING_MARGIN: u32 = 10;

/// Pacing settings, persisted between runs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub target_seconds: u32,
    pub warning_margin: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_seconds: DEFAULT_TARGET_SECONDS,
            warning_margin: DEFAULT_WARNING_MARGIN,
        }
    }
}

impl Settings {
    pub fn classify(&self, elapsed: u32) -> Status {
        classify(elapsed, self.target_seconds, self.warning_margin)
    }

    /// Apply raw user input. A value that does not parse as a positive
    /// integer leaves the previous one in place. Returns whether anything changed.
    pub fn apply_input(&mut self, target: Option<&str>, warning: Option<&str>) -> bool {
        let before = *self;
        if let Some(v) = target.and_then(parse_positive) {
            self.target_seconds = v;
        }
        if let Some(v) = warning.and_then(parse_positive) {
            self.warning_margin = v;
        }
        if self.warning_margin >= self.target_seconds {
            tracing::warn!(
                target_seconds = self.target_seconds,
                warning_margin = self.warning_margin,
                "warning margin is not below the target; no answer will count as fast"
            );
        }
        before != *self
    }

    /// Values that were hand-edited to zero are put back to their defaults
    fn sanitized(mut self) -> Self {
        if self.target_seconds == 0 {
            self.target_seconds = DEFAULT_TARGET_SECONDS;
        }
        if self.warning_margin == 0 {
            self.warning_margin = DEFAULT_WARNING_MARGIN;
        }
        self
    }
}

pub trait SettingsStore {
    fn load(&self) -> Settings;
    fn save(&self, settings: &Settings) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "qpace") {
            pd.config_dir().join("settings.json")
        } else {
            PathBuf::from("qpace_settings.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileSettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Settings {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Settings>(&bytes) {
                Ok(settings) => return settings.sanitized(),
                Err(e) => tracing::warn!(path = %self.path.display(), "ignoring unreadable settings: {e}"),
            }
        }
        Settings::default()
    }

    fn save(&self, settings: &Settings) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(settings).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}
