//! Headless driving demo: build the road + car scene, feed a scripted key
//! sequence through the input channel, and run the frame loop while printing
//! state hashes on a cadence. Two runs with the same config and script print
//! identical hashes.

mod config;

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::mpsc::Sender;

use anyhow::Result;
use clap::Parser;

use autophys_core::{iso, quat_identity, vec3, BodyId, Isometry, Velocity};
use autophys_geom::{MassProps, Material, Shape};
use autophys_sync::{InputController, Key, KeyEvent, SyncLoop, VisualNode};
use autophys_vehicle::{Vehicle, Wheel, WheelParams};
use autophys_viz::DebugSettings;
use autophys_world::{World, WorldBuilder};

use config::SceneConfig;

#[derive(Parser, Debug)]
#[command(name = "autophys-demo", about = "Deterministic driving demo (headless)")]
struct Opts {
    /// Scene config JSON; defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of frames to simulate.
    #[arg(long, default_value_t = 600)]
    steps: u32,

    /// Print a state hash every N frames (0 = never).
    #[arg(long, default_value_t = 60)]
    hash_every: u32,

    /// Print the debug block every N frames (0 = never).
    #[arg(long, default_value_t = 0)]
    print_every: u32,

    /// Dump the event ledger as JSONL every N frames (0 = never).
    #[arg(long, default_value_t = 0)]
    json_every: u32,

    /// Skip the built-in drive script and just idle.
    #[arg(long)]
    no_script: bool,
}

/// Latest synced transform for one scene object; stands in for the renderer.
#[derive(Default)]
struct PoseNode {
    pose: Isometry,
}

impl VisualNode for PoseNode {
    fn set_transform(&mut self, pose: Isometry) {
        self.pose = pose;
    }
}

struct Scene {
    world: World,
    chassis: BodyId,
    wheels: [BodyId; 4],
}

fn build_scene(cfg: &SceneConfig) -> Scene {
    let mut world = WorldBuilder::new().with_capacity(8, 8).build();
    world.set_gravity(vec3(cfg.gravity[0], cfg.gravity[1], cfg.gravity[2]));

    let [rhx, rhy, rhz] = cfg.road.half_extents;
    let road = world.add_body(
        iso(vec3(0.0, cfg.road.center_y, 0.0), quat_identity()),
        Velocity::default(),
        MassProps::infinite(),
        false,
    );
    world.add_collider(road, Shape::Box { hx: rhx, hy: rhy, hz: rhz }, Material::asphalt());

    let [chx, chy, chz] = cfg.chassis.half_extents;
    let chassis = world.add_body(
        iso(vec3(0.0, cfg.chassis.start_height, 0.0), quat_identity()),
        Velocity::default(),
        MassProps::from_mass(cfg.chassis.mass),
        true,
    );
    world.add_collider(chassis, Shape::Box { hx: chx, hy: chy, hz: chz }, Material::default());

    let wc = cfg.wheel;
    let mounts = [
        (-wc.track, wc.wheelbase),
        (wc.track, wc.wheelbase),
        (-wc.track, -wc.wheelbase),
        (wc.track, -wc.wheelbase),
    ];
    let mut wheel_ids = [BodyId(0); 4];
    let wheels = core::array::from_fn::<_, 4, _>(|i| {
        let (x, z) = mounts[i];
        let params = WheelParams {
            local_pos: vec3(x, wc.mount_height, z),
            axis: vec3(0.0, 1.0, 0.0),
            susp_dir: vec3(0.0, -1.0, 0.0),
            rest_len: wc.rest_len,
            k_spring: wc.k_spring,
            k_damp: wc.k_damp,
            radius: wc.radius,
            mu_long: wc.mu_long,
            mu_lat: wc.mu_lat,
            ang_damping: wc.ang_damping,
        };
        let start = vec3(x, cfg.chassis.start_height + wc.mount_height - wc.rest_len, z);
        let body = world.add_body(
            iso(start, quat_identity()),
            Velocity::default(),
            MassProps::from_sphere(wc.radius, 1100.0),
            true,
        );
        world.add_collider(body, Shape::Sphere { r: wc.radius }, Material::rubber());
        world.set_ang_damping(body, wc.ang_damping);
        wheel_ids[i] = body;
        Wheel::new(params, body)
    });
    world.add_vehicle(Vehicle::new(chassis, cfg.chassis.mass, wheels));

    Scene { world, chassis, wheels: wheel_ids }
}

/// Accelerate, hold a left turn, straighten out, brake-reverse near the end.
fn drive_script() -> Vec<(u32, KeyEvent)> {
    vec![
        (60, KeyEvent::Down(Key::W)),
        (240, KeyEvent::Down(Key::A)),
        (360, KeyEvent::Up(Key::A)),
        (420, KeyEvent::Up(Key::W)),
        (480, KeyEvent::Down(Key::S)),
        (540, KeyEvent::Up(Key::S)),
    ]
}

fn send_due(script: &[(u32, KeyEvent)], frame: u32, tx: &Sender<KeyEvent>) -> Result<()> {
    for (at, ev) in script {
        if *at == frame {
            tx.send(*ev)?;
        }
    }
    Ok(())
}

fn hex32(bytes: &[u8; 32]) -> String {
    let mut s = String::with_capacity(64);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    let cfg = match &opts.config {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };

    let mut scene = build_scene(&cfg);
    scene.world.set_debug(DebugSettings {
        print_every: opts.print_every,
        json_every: opts.json_every,
        show_bodies: true,
        show_contacts: false,
        show_energy: true,
        max_lines: 16,
    });

    let (tx, mut input) = InputController::new(cfg.max_force);
    let mut sync = SyncLoop::new();
    let chassis_slot = sync.bind(scene.chassis);
    sync.attach(chassis_slot, PoseNode::default());
    for wheel in scene.wheels {
        let slot = sync.bind(wheel);
        sync.attach(slot, PoseNode::default());
    }

    let contract = autophys_core::DeterminismContract::default_contract();
    println!(
        "fixed dt {:.6}s, {} math, fma={}, {} solver iterations",
        contract.fixed_dt, contract.float, contract.fma, contract.iterations
    );
    scene.world.for_each_collider(|id, body, shape, _| {
        println!("collider {id}: body {body} shape {shape:?}");
    });

    let script = if opts.no_script { Vec::new() } else { drive_script() };
    for frame in 0..opts.steps {
        send_due(&script, frame, &tx)?;
        let stats = sync.run_frame(&mut scene.world, &mut input);
        if opts.hash_every != 0 && (frame + 1) % opts.hash_every == 0 {
            println!(
                "tick {:5}  hash {}  pairs {:3}  contacts {:3}  wheels {}",
                scene.world.tick_index(),
                hex32(&scene.world.step_hash()),
                stats.pairs_tested,
                stats.contacts,
                stats.wheels_on_ground,
            );
        }
    }

    let node = sync
        .node(chassis_slot)
        .ok_or_else(|| anyhow::anyhow!("chassis was never synced"))?;
    let p = node.pose.pos;
    println!("final chassis position: ({:+.3}, {:+.3}, {:+.3})", p.x, p.y, p.z);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test] fn scene_builds_with_defaults() {
        let scene = build_scene(&SceneConfig::default());
        assert_eq!(scene.world.num_bodies(), 6);
        assert!(scene.world.vehicle().is_some());
    }

    #[test] fn scripted_run_is_deterministic() {
        let run = || {
            let mut scene = build_scene(&SceneConfig::default());
            let (tx, mut input) = InputController::new(500.0);
            let mut sync: SyncLoop<PoseNode> = SyncLoop::new();
            let script = drive_script();
            for frame in 0..240 {
                send_due(&script, frame, &tx).unwrap();
                sync.run_frame(&mut scene.world, &mut input);
            }
            scene.world.step_hash()
        };
        assert_eq!(run(), run());
    }

    #[test] fn script_drives_the_car_forward() {
        let mut scene = build_scene(&SceneConfig::default());
        let (tx, mut input) = InputController::new(500.0);
        let mut sync: SyncLoop<PoseNode> = SyncLoop::new();
        let script = drive_script();
        for frame in 0..240 {
            send_due(&script, frame, &tx).unwrap();
            sync.run_frame(&mut scene.world, &mut input);
        }
        assert!(scene.world.body_pose(scene.chassis).pos.z > 1.0);
    }
}
