//! Evolves a controller for the cart-centering task.
//!
//! 1. What is the "Terminal Set"?
//!
//! - `a`: the cart's position.
//! - `b`: the cart's velocity (fixed at 0 when partially observable).
//!
//! 2. What is the "Function Set"?
//!
//! - `+` `-` `*` `/` `>` `abs`
//! - `read` `write` when partially observable.
//!
//! 3. What is the "Fitness Measure"?
//!
//! - The mean reward over a number of episodes, -1 per step until the cart is centered.
//!
//! Usage: `cargo run --example cart_centering -- [config.toml] [seed]`
//!
//! Set `RUST_LOG=info` for per-generation logging.

use cart_gp::{CartCentering, EvolutionConfig, GenerationRecord, Simulation};
use rand::rngs::StdRng;
use rand::SeedableRng;

const DEFAULT_SEED: u64 = 42;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => EvolutionConfig::load(path)?,
        None => EvolutionConfig::default(),
    };
    let seed = match args.next() {
        Some(seed) => seed.parse()?,
        None => DEFAULT_SEED,
    };

    let mut rng = StdRng::seed_from_u64(seed);
    let mut simulation = Simulation::new(&mut rng, config, CartCentering::new())?;

    println!("{}", GenerationRecord::CSV_HEADER);
    for _ in 0..simulation.config().generation_count {
        let record = simulation.step(&mut rng);
        println!("{}", record);
    }

    if let Some(best) = simulation.most_fit() {
        println!();
        println!("Best tree:");
        println!("{}", best.report());
    }
    Ok(())
}
