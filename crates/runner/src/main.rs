//! Headless sandart runner.
//!
//! Builds a scene, runs it for a number of ticks, flips gravity on a
//! schedule and prints ASCII frames plus a conservation report.
//!
//! Usage:
//!   sandart [--config sim.json] [--scene layers|bubbles|mixed] [--ticks 600]
//!           [--flip-every N] [--print-every N] [--seed N]

use sandart::{CellKind, Scene, SimConfig, Simulation};
use std::error::Error;
use std::path::Path;

struct Args {
    config: Option<String>,
    scene: Scene,
    ticks: u64,
    flip_every: u64,
    print_every: u64,
    seed: Option<u64>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            config: None,
            scene: Scene::Layers,
            ticks: 600,
            flip_every: 0,
            print_every: 0,
            seed: None,
        }
    }
}

fn parse_args() -> Result<Args, Box<dyn Error>> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);

    while let Some(flag) = iter.next() {
        let mut value = || iter.next().ok_or_else(|| format!("{} needs a value", flag));
        match flag.as_str() {
            "--config" => args.config = Some(value()?),
            "--scene" => args.scene = value()?.parse()?,
            "--ticks" => args.ticks = value()?.parse()?,
            "--flip-every" => args.flip_every = value()?.parse()?,
            "--print-every" => args.print_every = value()?.parse()?,
            "--seed" => args.seed = Some(value()?.parse()?),
            other => return Err(format!("unknown argument '{}'", other).into()),
        }
    }

    Ok(args)
}

fn print_frame(sim: &Simulation) {
    let snap = sim.snapshot();
    println!(
        "frame {} (gravity {:?}, {} air clusters)",
        snap.frame,
        snap.gravity,
        snap.clusters.len()
    );
    println!("{}", snap.grid);
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args = parse_args()?;
    let mut config = match &args.config {
        Some(path) => SimConfig::load_json(Path::new(path))?,
        None => SimConfig::with_size(60, 40),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let seed = config.seed;

    let mut sim = Simulation::new(config)?;
    args.scene.build(&mut sim, seed);
    print_frame(&sim);

    let mut settled_at = None;
    for n in 1..=args.ticks {
        if args.flip_every > 0 && n % args.flip_every == 0 {
            sim.flip_gravity();
            settled_at = None;
        }

        let stats = sim.tick();
        if stats.is_settled() {
            settled_at.get_or_insert(n);
        } else {
            settled_at = None;
        }

        if args.print_every > 0 && n % args.print_every == 0 {
            print_frame(&sim);
        }
    }

    if args.print_every == 0 || args.ticks % args.print_every != 0 {
        print_frame(&sim);
    }

    println!("counts: {}", sim.counts());
    let drift = sim.drift();
    for (kind, d) in CellKind::ALL.iter().zip(drift) {
        if d != 0 {
            println!("drift: {:?} {:+}", kind, d);
        }
    }
    if drift.iter().all(|&d| d == 0) {
        println!("drift: none");
    }
    match settled_at {
        Some(n) => println!("settled at tick {}", n),
        None => println!("still moving after {} ticks", args.ticks),
    }

    Ok(())
}
