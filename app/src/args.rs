//! Command line arguments of the `ember` binary.

use std::path::PathBuf;

use clap::Parser;

use crate::EngineConfig;

/// Ember Engine headless runner.
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "ember",
    about = "Ember Engine headless runner",
    long_about = "Runs the Ember engine core without a window: loads the configuration,\n\
        builds the scene, then ticks the ECS at the configured frame rate.\n\n\
        EXAMPLES:\n\
          # Play an animation on a skinned mesh for 120 frames\n\
          ember --assets game/assets --animation hero_walk --mesh hero --frames 120\n\
        \n\
          # Use a config file and verbose logging\n\
          ember --config engine.ron --log-level debug",
    version
)]
pub struct AppArgs {
    /// RON configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Asset directory, overriding the config.
    #[arg(long)]
    pub assets: Option<String>,

    /// Exit after N frames, overriding the config.
    #[arg(long)]
    pub frames: Option<u64>,

    /// Log filter, overriding the config (e.g. `debug`, `ember_ecs=trace`).
    #[arg(long)]
    pub log_level: Option<String>,

    /// GUID of an animation to play on a spawned entity.
    #[arg(long)]
    pub animation: Option<String>,

    /// GUID of the skinned mesh driven by `--animation`.
    #[arg(long, requires = "animation")]
    pub mesh: Option<String>,

    /// Start stopped instead of running.
    #[arg(long)]
    pub paused: bool,
}

impl AppArgs {
    /// Writes the values given on the command line over `config`.
    pub fn apply(&self, config: &mut EngineConfig) {
        if let Some(assets) = &self.assets {
            config.asset_directory.clone_from(assets);
        }
        if let Some(frames) = self.frames {
            config.max_frames = Some(frames);
        }
        if let Some(level) = &self.log_level {
            config.log_level.clone_from(level);
        }
        if self.paused {
            config.start_running = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_config() {
        let args = AppArgs::try_parse_from([
            "ember",
            "--assets",
            "data",
            "--frames",
            "5",
            "--log-level",
            "debug",
            "--paused",
        ])
        .unwrap();
        let mut config = EngineConfig::default();
        args.apply(&mut config);

        assert_eq!(config.asset_directory, "data");
        assert_eq!(config.max_frames, Some(5));
        assert_eq!(config.log_level, "debug");
        assert!(!config.start_running);
    }

    #[test]
    fn absent_flags_keep_config() {
        let args = AppArgs::try_parse_from(["ember"]).unwrap();
        let mut config = EngineConfig::default();
        args.apply(&mut config);
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn mesh_requires_animation() {
        assert!(AppArgs::try_parse_from(["ember", "--mesh", "hero"]).is_err());
        let args =
            AppArgs::try_parse_from(["ember", "--animation", "walk", "--mesh", "hero"]).unwrap();
        assert_eq!(args.mesh.as_deref(), Some("hero"));
    }
}
