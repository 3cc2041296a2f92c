//! Evolve symbolic control policies with genetic programming.
//!
//! A policy is an expression tree over two inputs (`gp::expr::Tree`). A `ga::Simulation` seeds
//! a population of random trees, scores them by running them as controllers in an
//! `ga::Environment`, and each generation keeps the better half and refills the population with
//! mutated copies of the survivors.
//!
//! ```no_run
//! use cart_gp::{CartCentering, EvolutionConfig, Simulation};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut sim = Simulation::new(&mut rng, EvolutionConfig::default(), CartCentering::new())?;
//! for record in sim.run(&mut rng) {
//!     println!("{}", record);
//! }
//! # Ok::<(), cart_gp::Error>(())
//! ```

pub mod cart;
pub mod config;
pub mod error;
pub mod ga;
pub mod gp;

pub use cart::CartCentering;
pub use config::{EvolutionConfig, Ranking};
pub use error::{Error, Result};
pub use ga::{Environment, Evaluation, GenerationRecord, Individual, Report, Simulation};
pub use gp::expr::Tree;
