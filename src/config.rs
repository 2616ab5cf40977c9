//! Tuning values for navigation, movement and enemies
//!
//! Everything is `#[serde(default)]`, so a RON file only has to list the
//! values it changes:
//!
//! ```ron
//! (
//!     eye_monster: (engage_distance: 6.0),
//!     navigation: (slow_search_ms: 2.0),
//! )
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading or saving configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The file could not be read or written
    #[error("IO error: {0}")]
    Io(String),
    /// The RON text was malformed or did not match the schema
    #[error("Parse error: {0}")]
    Parse(String),
}

// ============================================================================
// Sections
// ============================================================================

/// Navmesh building and path search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Distance between grid samples, meters
    pub density: f32,
    /// Neighbours are linked within `density * connection_factor`
    pub connection_factor: f32,
    /// Searches slower than this are logged as warnings
    pub slow_search_ms: f32,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            density: 1.0,
            connection_factor: 1.5,
            slow_search_ms: 5.0,
        }
    }
}

impl NavigationConfig {
    /// Link distance for a given sampling density
    #[must_use]
    pub fn connection_distance(&self, density: f32) -> f32 {
        density * self.connection_factor
    }
}

/// Shared by homing and tracking movement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// A waypoint counts as reached within this distance
    pub waypoint_tolerance: f32,
    /// The final waypoint counts as reached within this distance
    pub arrival_distance: f32,
    /// Replan when the target moved further than this since the last plan
    pub repath_distance: f32,
    /// Replan at least this often while tracking
    pub repath_interval_ms: u32,
    /// Window over which progress is measured for stuck detection
    pub stuck_window_s: f32,
    /// Less progress than this over the window means stuck
    pub stuck_min_progress: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            waypoint_tolerance: 0.1,
            arrival_distance: 0.2,
            repath_distance: 1.0,
            repath_interval_ms: 2000,
            stuck_window_s: 1.0,
            stuck_min_progress: 0.05,
        }
    }
}

/// Eye monster: sleeps until something comes close, then hunts it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EyeMonsterTuning {
    pub engage_distance: f32,
    pub disengage_distance: f32,
    /// Telegraph delay between waking up and hunting
    pub time_before_hunt_s: f32,
    /// How often a sleeping monster looks for targets
    pub visibility_check_interval_s: f32,
    pub retarget_delay_s: f32,
    pub degrees_per_second: f32,
    pub move_speed: f32,
    pub tracking_speed: f32,
    /// Time between death and removal
    pub release_delay_s: f32,
}

impl Default for EyeMonsterTuning {
    fn default() -> Self {
        Self {
            engage_distance: 4.0,
            disengage_distance: 5.0,
            time_before_hunt_s: 0.3,
            visibility_check_interval_s: 1.0,
            retarget_delay_s: 0.5,
            degrees_per_second: 180.0,
            move_speed: 1.0,
            tracking_speed: 0.5,
            release_delay_s: 1.0,
        }
    }
}

/// Flying monster: keeps its distance and shoots
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlyingMonsterTuning {
    pub idle_time_s: f32,
    pub attack_start_delay_s: f32,
    pub move_speed: f32,
    pub degrees_per_second: f32,
    pub attack_distance: f32,
    pub max_attack_distance: f32,
    pub track_to_player_distance: f32,
    pub loose_interest_distance: f32,
    pub bullets_to_emit: u32,
    /// Time between death and removal
    pub release_delay_s: f32,
    pub weapon_id: u32,
    pub magazine_size: u32,
    pub weapon_cooldown_ms: u32,
    pub weapon_reload_ms: u32,
}

impl Default for FlyingMonsterTuning {
    fn default() -> Self {
        Self {
            idle_time_s: 1.0,
            attack_start_delay_s: 0.25,
            move_speed: 0.5,
            degrees_per_second: 360.0,
            attack_distance: 2.5,
            max_attack_distance: 3.0,
            track_to_player_distance: 4.0,
            loose_interest_distance: 5.0,
            bullets_to_emit: 2,
            release_delay_s: 1.0,
            weapon_id: 1,
            magazine_size: 6,
            weapon_cooldown_ms: 200,
            weapon_reload_ms: 1000,
        }
    }
}

// ============================================================================
// AiConfig
// ============================================================================

/// All AI tuning, handed to systems and controllers at construction
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub navigation: NavigationConfig,
    pub movement: MovementConfig,
    pub eye_monster: EyeMonsterTuning,
    pub flying_monster: FlyingMonsterTuning,
}

impl AiConfig {
    /// Parse a config from RON text
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not a valid config
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        ron::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load a config from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    /// Serialize to pretty RON
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if serialization fails
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Write the config to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let text = self.to_ron_string()?;
        fs::write(path, text).map_err(|e| ConfigError::Io(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config = AiConfig::from_ron_str("(eye_monster: (engage_distance: 6.0))").unwrap();

        assert_eq!(config.eye_monster.engage_distance, 6.0);
        assert_eq!(config.eye_monster.disengage_distance, 5.0);
        assert_eq!(config.navigation, NavigationConfig::default());
        assert_eq!(config.flying_monster.bullets_to_emit, 2);
    }

    #[test]
    fn test_ron_string_round_trip() {
        let mut config = AiConfig::default();
        config.movement.repath_interval_ms = 500;
        config.navigation.connection_factor = 2.0;

        let text = config.to_ron_string().unwrap();
        let loaded = AiConfig::from_ron_str(&text).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_bad_ron_is_parse_error() {
        let err = AiConfig::from_ron_str("(navigation: 12)").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = AiConfig::load_ron("/nonexistent/ai_config.ron").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("gameplay_ai_config_{}.ron", std::process::id()));
        let config = AiConfig::default();

        config.save_ron(&path).unwrap();
        let loaded = AiConfig::load_ron(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_connection_distance() {
        let config = NavigationConfig::default();
        assert!((config.connection_distance(2.0) - 3.0).abs() < f32::EPSILON);
    }
}
