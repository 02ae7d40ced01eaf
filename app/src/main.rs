use std::process::ExitCode;

use clap::Parser;

use ember_app::{AppArgs, AppContext, AppError, DefaultScene, EngineConfig, NullPhysics};

fn main() -> ExitCode {
    let args = AppArgs::parse();

    let mut config = match &args.config {
        Some(path) => match EngineConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("ember: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => EngineConfig::default(),
    };
    args.apply(&mut config);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    match run(config, &args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: EngineConfig, args: &AppArgs) -> Result<(), AppError> {
    let frames = config.max_frames;
    let start_running = config.start_running;
    log::info!(
        "assets: {}, {} fps, frames: {}",
        config.asset_directory,
        config.target_fps,
        frames.map_or_else(|| "unlimited".to_string(), |n| n.to_string())
    );

    let mut ctx = AppContext::new(config);
    ctx.install_default_systems(NullPhysics);
    ctx.set_scene_builder(
        DefaultScene::new(args.animation.clone(), args.mesh.clone()).into_builder(),
    )?;
    if start_running {
        ctx.play();
    }

    let summary = ctx.run(frames, true);
    log::info!(
        "{} frames in {:.2?}, {} system errors, {} entities, {} cached resources",
        summary.frames,
        summary.elapsed,
        summary.system_errors,
        ctx.world().entity_count(),
        ctx.cache().len()
    );
    ctx.shutdown();
    Ok(())
}
