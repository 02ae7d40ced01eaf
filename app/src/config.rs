//! Engine configuration loaded from RON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::AppError;

/// Engine settings. Every field has a default, so a config file only needs
/// the values it changes.
///
/// ```ron
/// (
///     asset_directory: "game/assets",
///     target_fps: 30,
///     max_frames: Some(300),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Root directory resource GUIDs are resolved against.
    pub asset_directory: String,
    /// `env_logger` filter, e.g. `info` or `ember_ecs=debug`.
    pub log_level: String,
    pub target_fps: u32,
    /// Resource cache sweep period in frames; 0 disables sweeping.
    pub gc_interval_frames: u64,
    /// Default speed for animators spawned by the application.
    pub playback_speed: f32,
    /// Stop after this many frames; `None` runs until interrupted.
    pub max_frames: Option<u64>,
    /// Start in the running state instead of stopped.
    pub start_running: bool,
    /// Scene tag given to entities created by the scene builder.
    pub scene_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            asset_directory: "assets".to_string(),
            log_level: "info".to_string(),
            target_fps: 60,
            gc_interval_frames: 300,
            playback_speed: 1.0,
            max_frames: None,
            start_running: true,
            scene_name: "main".to_string(),
        }
    }
}

impl EngineConfig {
    /// Reads a RON config file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(AppError::ConfigIo {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let config = ron::from_str(&text).map_err(|source| AppError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AppError> {
        let path = path.as_ref();
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, text).map_err(|source| AppError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Seconds per frame at `target_fps` (at least 1 fps).
    pub fn frame_time(&self) -> f32 {
        1.0 / self.target_fps.max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load(dir.path().join("absent.ron")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.ron");
        std::fs::write(&path, "(target_fps: 30, max_frames: Some(12))").unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.target_fps, 30);
        assert_eq!(config.max_frames, Some(12));
        assert_eq!(config.asset_directory, "assets");
        assert!((config.frame_time() - 1.0 / 30.0).abs() < 1e-6);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.ron");
        let config = EngineConfig {
            log_level: "debug".into(),
            start_running: false,
            ..EngineConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn syntax_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ron");
        std::fs::write(&path, "(target_fps: )").unwrap();

        let err = EngineConfig::load(&path).unwrap_err();
        assert!(matches!(err, AppError::ConfigParse { .. }));
        assert!(err.to_string().contains("broken.ron"));
    }

    #[test]
    fn zero_fps_is_clamped() {
        let config = EngineConfig {
            target_fps: 0,
            ..EngineConfig::default()
        };
        assert_eq!(config.frame_time(), 1.0);
    }
}
