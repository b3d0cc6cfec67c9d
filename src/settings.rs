//! Player settings and preferences
//!
//! Persisted as JSON next to the score files. Unknown or missing fields fall
//! back to their defaults so older settings files keep loading.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk replay format written for new recordings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReplayGeneration {
    /// `.nbr`, version 9 only
    Legacy,
    /// `.nbrx`, versions 9 and 10
    #[default]
    Extended,
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Name written into replays and rank tables
    pub player: String,

    // === Replays ===
    /// Record every attempt
    pub record_replays: bool,
    /// Directory holding `Last.<ext>` and saved replays
    pub replay_dir: PathBuf,
    pub replay_generation: ReplayGeneration,
    /// Pattern for saved replay names (`%s` set, `%l` level, `%r` result)
    pub replay_name_format: String,

    // === Gameplay ===
    /// Never relax a level's coin requirement after completion
    pub lock_goals: bool,
    pub cheat: bool,
    /// Accessibility slowdown; campaign ranks need at least 100
    pub slowdown_percent: u32,

    // === Career ===
    pub career_enabled: bool,
    pub career_unlocked: bool,

    // === Shop ===
    /// Purchased lives, spent before the session's own balls
    pub extra_lives: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            player: "Player".to_string(),

            record_replays: true,
            replay_dir: PathBuf::from("Replays"),
            replay_generation: ReplayGeneration::Extended,
            replay_name_format: "%s-%l".to_string(),

            lock_goals: false,
            cheat: false,
            slowdown_percent: 100,

            career_enabled: true,
            career_unlocked: false,

            extra_lives: 0,
        }
    }
}

impl Settings {
    /// Career ranks (campaign coin and goal tables) are open
    pub fn career_active(&self) -> bool {
        self.career_enabled && self.career_unlocked
    }

    /// Load settings, falling back to defaults on any failure
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(SettingsError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(err) => {
                log::warn!("Could not load settings from {}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }
}
