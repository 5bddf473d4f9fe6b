use anyhow::Context;
use clap::{Parser, Subcommand};
use drivescape_frame::FrameDriver;
use drivescape_input::{Action, InputMapper, Key};
use drivescape_kernel::{MotionParams, Notice, Simulation, VehicleState};
use drivescape_render::{CameraControl, DebugTextRenderer, FixedCamera, Renderer};
use drivescape_scene::{SceneGraph, SceneHandles, build_scene};
use drivescape_textures::TextureSynth;
use drivescape_tools::TelemetryInspector;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "drivescape-cli", about = "Headless tools for the drivescape demo")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Hold keys for a number of frames and print the resulting scene
    Drive {
        /// Number of frames to run
        #[arg(short, long, default_value = "60")]
        frames: u64,
        /// Seconds per frame; values above the tuning's max_dt are clamped
        #[arg(long, default_value_t = 1.0 / 60.0)]
        dt: f32,
        /// Keys pressed before the first frame, e.g. "wa"; space, r and g trigger their actions
        #[arg(short, long, default_value = "")]
        keys: String,
        /// Make sure gravity is on before the first frame, even if a space in --keys toggled it off
        #[arg(short, long)]
        gravity: bool,
        /// Override the spawn height
        #[arg(long)]
        spawn_height: Option<f32>,
        /// Seed for textures and tree placement
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// JSON file overriding the motion tuning
        #[arg(long)]
        tuning: Option<PathBuf>,
        /// Print the final vehicle state as JSON instead of the scene listing
        #[arg(long)]
        json: bool,
    },
    /// Generate the texture set and print SHA-256 digests
    Textures {
        /// Seed for the random source
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
}

struct DriveOptions {
    frames: u64,
    dt: f32,
    keys: String,
    gravity: bool,
    spawn_height: Option<f32>,
    seed: u64,
    tuning: Option<PathBuf>,
    json: bool,
}

/// Press `keys` in order, then switch gravity on if `gravity` is set and the
/// keys left it off. Returns the notices raised along the way.
fn press_keys(
    keys: &str,
    gravity: bool,
    mapper: &mut InputMapper,
    sim: &mut Simulation,
    scene: &mut SceneGraph,
    handles: &SceneHandles,
) -> anyhow::Result<Vec<Notice>> {
    let mut notices = Vec::new();
    for c in keys.chars() {
        let Some(action) = mapper.key_pressed(Key::from_char(c)) else {
            continue;
        };
        if matches!(action, Action::ToggleGrid) {
            scene.toggle_visible(handles.grid)?;
        }
        notices.extend(sim.apply(&action));
    }
    if gravity && !sim.gravity() {
        notices.extend(sim.apply(&Action::ToggleGravity));
    }
    Ok(notices)
}

/// The action a held movement key re-issues every frame, like keyboard
/// auto-repeat.
fn held_repeat(keys: &str, mapper: &InputMapper) -> Option<Action> {
    keys.chars()
        .find_map(|c| mapper.key_repeated(Key::from_char(c)))
}

fn drive(opts: DriveOptions) -> anyhow::Result<()> {
    let mut params = match &opts.tuning {
        Some(path) => MotionParams::load(path)?,
        None => MotionParams::default(),
    };
    if let Some(height) = opts.spawn_height {
        params.spawn_position.y = height;
        params.validate().context("invalid --spawn-height")?;
    }

    let mut rng = StdRng::seed_from_u64(opts.seed);
    let textures = TextureSynth::new(&mut rng).generate_all()?;
    let (mut scene, handles) = build_scene(
        &textures,
        &mut rng,
        &VehicleState::at_rest(params.spawn_position),
    )?;
    let mut sim = Simulation::new(params);
    let mut mapper = InputMapper::new();
    let mut camera = FixedCamera::default();

    let notices = press_keys(
        &opts.keys,
        opts.gravity,
        &mut mapper,
        &mut sim,
        &mut scene,
        &handles,
    )?;
    for notice in notices {
        println!("{notice}");
    }
    let repeat = held_repeat(&opts.keys, &mapper);

    let mut driver = FrameDriver::new(params.max_dt);
    for _ in 0..opts.frames {
        if let Some(action) = &repeat {
            sim.apply(action);
        }
        driver.step(opts.dt, &mut sim, &mut scene, &handles, Some(&mut camera))?;
    }
    tracing::info!(frames = driver.frames(), "drive finished");

    let replayed = Simulation::replay(params, sim.events());
    let replay_ok = replayed.state_hash() == sim.state_hash();

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&sim.vehicle())?);
        return Ok(());
    }
    print!("{}", DebugTextRenderer::new().render(&scene, &camera.view()));
    println!("{}", TelemetryInspector::summary(&sim));
    println!(
        "Replay: {} (hash={:#018x})",
        if replay_ok { "OK" } else { "MISMATCH" },
        sim.state_hash()
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("drivescape-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("kernel: {}", drivescape_kernel::crate_info());
            println!("input: {}", drivescape_input::crate_info());
            println!("scene: {}", drivescape_scene::crate_info());
            println!("textures: {}", drivescape_textures::crate_info());
            println!("render: {}", drivescape_render::crate_info());
            println!("frame: {}", drivescape_frame::crate_info());
            println!("tools: {}", drivescape_tools::crate_info());
        }
        Commands::Drive {
            frames,
            dt,
            keys,
            gravity,
            spawn_height,
            seed,
            tuning,
            json,
        } => drive(DriveOptions {
            frames,
            dt,
            keys,
            gravity,
            spawn_height,
            seed,
            tuning,
            json,
        })?,
        Commands::Textures { seed } => {
            let textures = TextureSynth::from_seed(seed).generate_all()?;
            println!("Textures: seed={seed}");
            for texture in textures.iter() {
                println!(
                    "  {:<6} {:>4}x{:<4} {:<6} {}",
                    format!("{:?}", texture.slot),
                    texture.width,
                    texture.height,
                    format!("{:?}", texture.wrap),
                    texture.digest()
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivescape_input::MovementIntent;

    fn session() -> (Simulation, SceneGraph, SceneHandles) {
        let params = MotionParams::default();
        let textures = TextureSynth::from_seed(1).generate_all().unwrap();
        let (scene, handles) = build_scene(
            &textures,
            &mut StdRng::seed_from_u64(1),
            &VehicleState::at_rest(params.spawn_position),
        )
        .unwrap();
        (Simulation::new(params), scene, handles)
    }

    fn gravity_after(keys: &str, gravity: bool) -> (bool, Vec<Notice>) {
        let (mut sim, mut scene, handles) = session();
        let mut mapper = InputMapper::new();
        let notices =
            press_keys(keys, gravity, &mut mapper, &mut sim, &mut scene, &handles).unwrap();
        (sim.gravity(), notices)
    }

    #[test]
    fn gravity_flag_leaves_gravity_on() {
        assert_eq!(gravity_after("", true), (true, vec![Notice::GravityEnabled]));
        assert_eq!(gravity_after(" ", true), (true, vec![Notice::GravityEnabled]));
        assert_eq!(gravity_after(" ", false), (true, vec![Notice::GravityEnabled]));
        assert_eq!(gravity_after("", false), (false, vec![]));
        assert_eq!(
            gravity_after(" r", true),
            (
                true,
                vec![
                    Notice::GravityEnabled,
                    Notice::VehicleReset,
                    Notice::GravityEnabled
                ]
            )
        );
    }

    #[test]
    fn grid_key_hides_the_grid() {
        let (mut sim, mut scene, handles) = session();
        let mut mapper = InputMapper::new();
        press_keys("g", false, &mut mapper, &mut sim, &mut scene, &handles).unwrap();
        assert!(!scene.is_visible(handles.grid));
    }

    #[test]
    fn held_movement_keys_repeat() {
        let mut mapper = InputMapper::new();
        mapper.key_pressed(Key::W);
        let forward = MovementIntent {
            forward: true,
            ..MovementIntent::IDLE
        };
        assert_eq!(held_repeat("w", &mapper), Some(Action::Steer(forward)));
        assert_eq!(held_repeat(" rg", &mapper), None);
    }

    #[test]
    fn held_forward_keeps_moving_after_landing() {
        let (mut sim, mut scene, handles) = session();
        let mut mapper = InputMapper::new();
        press_keys("w", true, &mut mapper, &mut sim, &mut scene, &handles).unwrap();
        let repeat = held_repeat("w", &mapper).unwrap();
        let mut driver = FrameDriver::new(0.1);
        for _ in 0..600 {
            sim.apply(&repeat);
            driver
                .step(1.0 / 60.0, &mut sim, &mut scene, &handles, None)
                .unwrap();
        }
        let v = sim.vehicle().unwrap();
        assert_eq!(v.position.y, -1.5);
        assert!(v.velocity.z < -7.0);
    }
}
