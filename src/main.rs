//! Headless demo: an arena with a player, an eye monster and a flying monster

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use gameplay_ai::core::GameEvent;
use gameplay_ai::logging;
use gameplay_ai::prelude::*;

const TICK_RATE_HZ: f32 = 60.0;
const TICKS: u32 = 600;

/// Run the enemy AI in a small arena without rendering
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// AI tuning file in RON format
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    let config = match args.config {
        Some(path) => match AiConfig::load_ron(&path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                eprintln!("Config error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => AiConfig::default(),
    };

    run(config);
    ExitCode::SUCCESS
}

fn run(config: AiConfig) {
    log::info!("Building arena");
    let mut sim = Simulation::new(config);

    // Outer walls of a 20x12 room
    sim.add_wall(Vec2::new(10.0, -0.5), Vec2::new(10.5, 0.5));
    sim.add_wall(Vec2::new(10.0, 12.5), Vec2::new(10.5, 0.5));
    sim.add_wall(Vec2::new(-0.5, 6.0), Vec2::new(0.5, 6.5));
    sim.add_wall(Vec2::new(20.5, 6.0), Vec2::new(0.5, 6.5));

    // A pillar between the player and the eye monster
    sim.add_wall(Vec2::new(10.0, 6.0), Vec2::new(1.0, 2.0));

    sim.build_navmesh(Vec2::new(0.5, 0.5), Vec2::new(19.5, 11.5));
    log::info!(
        "Navmesh ready: {} nodes",
        sim.navigation().navmesh().map_or(0, |navmesh| navmesh.nodes.len())
    );

    let player = sim.spawn_player(Vec2::new(3.0, 6.0));
    let eye = sim.spawn_eye_monster(Vec2::new(16.0, 6.0));
    let flyer = sim.spawn_flying_monster(Vec2::new(6.5, 9.0), 7);

    let delta_s = 1.0 / TICK_RATE_HZ;
    let mut shots = 0;
    for _ in 0..TICKS {
        sim.tick(delta_s);

        for event in sim.events().pending() {
            match event {
                GameEvent::StateChanged {
                    entity,
                    controller,
                    state,
                } => {
                    let time_ms = sim.update_context().map_or(0, |update| update.timestamp_ms);
                    log::info!("[{time_ms:6}ms] {controller} {entity:?} -> {state}");
                }
                GameEvent::WeaponFired { .. } => shots += 1,
                _ => {}
            }
        }
    }

    log::info!("Shots fired: {shots}");
    for (label, entity) in [("eye monster", eye), ("flying monster", flyer)] {
        log::info!("{label}: {}", sim.state_of(entity).unwrap_or("removed"));
    }
    if let Some(position) = sim.world().world_position(player) {
        log::info!("Player at {position}");
    }
    log::info!("{}", sim.navigation().stats().format_stats());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["ai_demo"]).unwrap();
        assert!(!args.verbose);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_args_verbose_and_config() {
        let args = Args::try_parse_from(["ai_demo", "-v", "tuning.ron"]).unwrap();
        assert!(args.verbose);
        assert_eq!(args.config, Some(PathBuf::from("tuning.ron")));
    }

    #[test]
    fn test_help_is_not_a_config_path() {
        let err = Args::try_parse_from(["ai_demo", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        let err = Args::try_parse_from(["ai_demo", "--fast"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }
}
