//! A module for abstracting common processes related to Genetic Algorithms.
//!
//! # Genetic Algorithms
//!
//! The genetic algorithm process can be described as follows:
//!
//! 1. Initialise a *Population* of randomly grown *Individual*s.
//! 2. Evaluate the *Fitness* of each newly born *Individual* within the *Environment*.
//! 3. Rank the population and discard the worst half.
//! 4. Refill the population with mutated copies of the survivors, occasionally recombining two
//!    survivors first.
//! 5. Repeat from 2 for a fixed number of generations.

use crate::config::{EvolutionConfig, Ranking, CROSSOVER_PROBABILITY, PARSIMONY_TOLERANCE};
use crate::error::Result;
use crate::gp::expr::Tree;
use crate::gp::{gen, mutate};
use rand::Rng;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

// Traits.

/// The simulated system in which an individual's fitness is tested.
///
/// An episode starts with `reset` and advances one `update` at a time until `is_terminal`.
pub trait Environment {
    /// Begin a new episode, drawing its initial state from `rng`.
    fn reset<R: Rng>(&mut self, rng: &mut R);
    /// Whether the current episode has ended.
    fn is_terminal(&self) -> bool;
    /// Apply `action`, advance by one step and return the step's reward.
    fn update(&mut self, action: f64, animate: bool) -> f64;
    /// The state components fed to a program, e.g. position and velocity.
    fn observation(&self) -> (f64, f64);
}

// Model.

/// An expression tree along with its fitness.
#[derive(Clone, Debug)]
pub struct Individual {
    pub tree: Tree,
    /// Mean reward over the last evaluation's episodes.
    pub score: f64,
    /// Mean episode length over the last evaluation's episodes.
    pub steps: f64,
    /// The generation in which the individual was born.
    pub generation: u32,
}

/// How an individual is scored.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub episodes: usize,
    /// Feed only the first observation component, with `b` fixed at 0, and clear the memory
    /// register at the start of every episode.
    pub partially_observable: bool,
    pub animate: bool,
}

/// Summary of the best individual of one generation.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GenerationRecord {
    pub generation: u32,
    pub best_score: f64,
    pub best_steps: f64,
    pub best_size: usize,
    pub best_depth: usize,
}

/// The final description of an individual.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub expression: String,
    pub generation: u32,
    pub size: usize,
    pub depth: usize,
    pub score: f64,
}

/// The simulation in which the genetic algorithm is run.
pub struct Simulation<E> {
    config: EvolutionConfig,
    environment: E,
    population: Vec<Individual>,
    // The best individual as of the last completed generation.
    best: Option<Individual>,
    generation: u32,
}

// Impls.

impl Individual {
    /// An unscored individual born in `generation`.
    pub fn new(tree: Tree, generation: u32) -> Self {
        Individual {
            tree,
            score: 0.0,
            steps: 0.0,
            generation,
        }
    }

    pub fn size(&self) -> usize {
        self.tree.size()
    }

    pub fn depth(&self) -> usize {
        self.tree.depth()
    }

    pub fn report(&self) -> Report {
        Report {
            expression: self.tree.to_string(),
            generation: self.generation,
            size: self.size(),
            depth: self.depth(),
            score: self.score,
        }
    }
}

impl Evaluation {
    /// Run `individual` for `self.episodes` episodes and store its mean reward and episode
    /// length.
    pub fn run<R, E>(&self, rng: &mut R, environment: &mut E, individual: &mut Individual)
    where
        R: Rng,
        E: Environment,
    {
        let mut total_reward = 0.0;
        let mut total_steps = 0usize;
        for episode in 0..self.episodes {
            environment.reset(rng);
            if self.partially_observable {
                individual.tree.memory_mut().fill(0.0);
            }
            let mut reward = 0.0;
            let mut steps = 0usize;
            while !environment.is_terminal() {
                let (a, b) = environment.observation();
                let b = if self.partially_observable { 0.0 } else { b };
                let action = individual.tree.evaluate(a, b);
                reward += environment.update(action, self.animate);
                steps += 1;
            }
            log::trace!("episode {}: reward {}, steps {}", episode, reward, steps);
            total_reward += reward;
            total_steps += steps;
        }
        let n = self.episodes.max(1) as f64;
        individual.score = total_reward / n;
        individual.steps = total_steps as f64 / n;
    }
}

impl<'a> From<&'a EvolutionConfig> for Evaluation {
    fn from(config: &'a EvolutionConfig) -> Self {
        Evaluation {
            episodes: config.episodes_per_evaluation,
            partially_observable: config.partially_observable,
            animate: config.animate,
        }
    }
}

impl GenerationRecord {
    pub const CSV_HEADER: &'static str = "generation,fitness,steps,size,depth";

    fn new(generation: u32, best: &Individual) -> Self {
        GenerationRecord {
            generation,
            best_score: best.score,
            best_steps: best.steps,
            best_size: best.size(),
            best_depth: best.depth(),
        }
    }
}

impl<E> Simulation<E>
where
    E: Environment,
{
    /// Validate `config` and seed the population with randomly grown trees.
    pub fn new<R>(rng: &mut R, config: EvolutionConfig, environment: E) -> Result<Self>
    where
        R: Rng,
    {
        config.validate()?;
        let population = (0..config.population_size)
            .map(|_| {
                let tree = gen::grow_tree(rng, config.initial_max_depth, config.operators());
                Individual::new(tree.with_memory(config.memory()), 0)
            })
            .collect::<Vec<_>>();
        log::debug!(
            "seeded {} individuals with depth at most {}",
            population.len(),
            config.initial_max_depth
        );
        Ok(Simulation {
            config,
            environment,
            population,
            best: None,
            generation: 0,
        })
    }

    /// Step forward the simulation by a single generation.
    pub fn step<R>(&mut self, rng: &mut R) -> GenerationRecord
    where
        R: Rng,
    {
        self.generation += 1;
        let g = self.generation;
        let Simulation {
            ref config,
            ref mut environment,
            ref mut population,
            ref mut best,
            ..
        } = *self;

        // 1. Evaluate everyone born since the last evaluation. Older survivors keep their score.
        let evaluation = Evaluation::from(config);
        for individual in population.iter_mut() {
            if individual.generation + 1 < g {
                continue;
            }
            evaluation.run(rng, environment, individual);
        }

        // 2. Rank from worst to best.
        rank(population, config.ranking);

        // 3. Truncate the worst half.
        let cull = population.len() / 2;
        population.drain(..cull);

        *best = population.last().cloned();
        let record = best
            .as_ref()
            .map(|b| GenerationRecord::new(g, b))
            .unwrap_or(GenerationRecord {
                generation: g,
                ..Default::default()
            });

        // 4. Recombine two survivors.
        if config.use_crossover && rng.gen::<f64>() < CROSSOVER_PROBABILITY {
            let i = rng.gen_range(0..population.len());
            let j = rng.gen_range(0..population.len());
            if i != j {
                let (a, b) = pair_mut(population, i, j);
                mutate::crossover(rng, &mut a.tree, &mut b.tree, config.max_depth);
            }
        }

        // 5. Refill with mutated copies of the survivors.
        let survivors = population.len();
        while population.len() < config.population_size {
            let mut child = population[rng.gen_range(0..survivors)].clone();
            child.generation = g;
            mutate::delete_subtree(rng, &mut child.tree);
            mutate::add_subtree(rng, &mut child.tree, config.max_depth, config.operators());
            population.push(child);
        }

        log::info!(
            "generation {}: best score {:.3}, steps {:.1}, size {}, depth {}",
            record.generation,
            record.best_score,
            record.best_steps,
            record.best_size,
            record.best_depth
        );
        record
    }

    /// Run every remaining generation, returning one record per generation.
    pub fn run<R>(&mut self, rng: &mut R) -> Vec<GenerationRecord>
    where
        R: Rng,
    {
        let remaining = self.config.generation_count.saturating_sub(self.generation);
        log::info!("running {} generations", remaining);
        (0..remaining).map(|_| self.step(rng)).collect()
    }

    /// The current population: the ranked survivors followed by the latest children.
    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    /// The best individual of the last completed generation.
    pub fn most_fit(&self) -> Option<&Individual> {
        self.best.as_ref()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn environment(&self) -> &E {
        &self.environment
    }
}

/// Order `a` relative to `b` from worst to best.
pub fn compare(ranking: Ranking, a: &Individual, b: &Individual) -> Ordering {
    match ranking {
        Ranking::Score => a.score.total_cmp(&b.score),
        Ranking::Parsimony => {
            if (a.score - b.score).abs() < PARSIMONY_TOLERANCE {
                b.size().cmp(&a.size())
            } else {
                a.score.total_cmp(&b.score)
            }
        }
    }
}

/// Stable sort of `population` from worst to best.
pub fn rank(population: &mut [Individual], ranking: Ranking) {
    match ranking {
        Ranking::Score => population.sort_by(|a, b| compare(ranking, a, b)),
        // The tolerance band makes this ordering intransitive, so use an insertion sort that
        // never relies on transitivity.
        Ranking::Parsimony => {
            for i in 1..population.len() {
                let mut j = i;
                while j > 0
                    && compare(ranking, &population[j], &population[j - 1]) == Ordering::Less
                {
                    population.swap(j, j - 1);
                    j -= 1;
                }
            }
        }
    }
}

// Two distinct mutable elements of a slice.
fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    if i < j {
        let (lo, hi) = items.split_at_mut(j);
        (&mut lo[i], &mut hi[0])
    } else {
        let (lo, hi) = items.split_at_mut(i);
        (&mut hi[0], &mut lo[j])
    }
}

impl fmt::Display for GenerationRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{}",
            self.generation, self.best_score, self.best_steps, self.best_size, self.best_depth
        )
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.expression)?;
        writeln!(f, "Generation: {}", self.generation)?;
        writeln!(f, "Size: {}", self.size)?;
        writeln!(f, "Depth: {}", self.depth)?;
        write!(f, "Fitness: {}", self.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Counts down from `length`, observing the remaining count and a constant 1, and rewards
    /// each step with the action taken.
    struct Countdown {
        length: usize,
        remaining: usize,
    }

    impl Environment for Countdown {
        fn reset<R: Rng>(&mut self, rng: &mut R) {
            let _ = rng.gen::<f64>();
            self.remaining = self.length;
        }
        fn is_terminal(&self) -> bool {
            self.remaining == 0
        }
        fn update(&mut self, action: f64, _animate: bool) -> f64 {
            self.remaining -= 1;
            action
        }
        fn observation(&self) -> (f64, f64) {
            (self.remaining as f64, 1.0)
        }
    }

    fn countdown(length: usize) -> Countdown {
        Countdown {
            length,
            remaining: 0,
        }
    }

    /// Ends every episode after one step, rewarding it with minus the number of resets so far.
    /// Each evaluation therefore scores lower than every earlier one.
    #[derive(Default)]
    struct ResetCounter {
        resets: usize,
        done: bool,
    }

    impl Environment for ResetCounter {
        fn reset<R: Rng>(&mut self, _rng: &mut R) {
            self.resets += 1;
            self.done = false;
        }
        fn is_terminal(&self) -> bool {
            self.done
        }
        fn update(&mut self, _action: f64, _animate: bool) -> f64 {
            self.done = true;
            -(self.resets as f64)
        }
        fn observation(&self) -> (f64, f64) {
            (0.0, 0.0)
        }
    }

    fn individual(postfix: &str, score: f64, generation: u32) -> Individual {
        let mut i = Individual::new(Tree::from_postfix(postfix).unwrap(), generation);
        i.score = score;
        i
    }

    fn evaluation(episodes: usize, partially_observable: bool) -> Evaluation {
        Evaluation {
            episodes,
            partially_observable,
            animate: false,
        }
    }

    #[test]
    fn evaluation_averages_over_episodes() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut env = countdown(3);
        let mut ind = individual("a", 0.0, 0);
        evaluation(4, false).run(&mut rng, &mut env, &mut ind);
        assert_eq!(ind.score, 6.0);
        assert_eq!(ind.steps, 3.0);
    }

    #[test]
    fn partial_observability_hides_second_input() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut env = countdown(5);
        let mut ind = individual("b", 0.0, 0);
        evaluation(1, false).run(&mut rng, &mut env, &mut ind);
        assert_eq!(ind.score, 5.0);
        evaluation(1, true).run(&mut rng, &mut env, &mut ind);
        assert_eq!(ind.score, 0.0);
    }

    #[test]
    fn memory_is_cleared_every_episode() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut env = countdown(4);
        let mut once = individual("a write read +", 0.0, 0);
        let mut twice = once.clone();
        evaluation(1, true).run(&mut rng, &mut env, &mut once);
        evaluation(3, true).run(&mut rng, &mut env, &mut twice);
        assert_eq!(once.score, twice.score);
    }

    #[test]
    fn score_ranking() {
        let mut pop = vec![
            individual("a", 3.0, 0),
            individual("a", -1.0, 0),
            individual("b", 2.0, 0),
        ];
        rank(&mut pop, Ranking::Score);
        let scores: Vec<f64> = pop.iter().map(|i| i.score).collect();
        assert_eq!(scores, vec![-1.0, 2.0, 3.0]);
    }

    #[test]
    fn parsimony_prefers_smaller_trees_on_ties() {
        let mut pop = vec![
            individual("a", 1.0, 0),
            individual("a b + a *", 1.005, 0),
            individual("a abs", 0.0, 0),
        ];
        rank(&mut pop, Ranking::Parsimony);
        let sizes: Vec<usize> = pop.iter().map(|i| i.size()).collect();
        assert_eq!(sizes, vec![2, 5, 1]);
        assert_eq!(compare(Ranking::Score, &pop[1], &pop[2]), Ordering::Greater);
    }

    #[test]
    fn step_keeps_population_size_and_stamps_children() {
        let mut rng = StdRng::seed_from_u64(42);
        let config = EvolutionConfig {
            population_size: 6,
            episodes_per_evaluation: 2,
            generation_count: 3,
            ..Default::default()
        };
        let env = countdown(3);
        let mut sim = Simulation::new(&mut rng, config, env).unwrap();
        assert_eq!(sim.population().len(), 6);
        assert!(sim.most_fit().is_none());

        let record = sim.step(&mut rng);
        assert_eq!(record.generation, 1);
        assert_eq!(sim.population().len(), 6);
        let children = sim.population().iter().filter(|i| i.generation == 1).count();
        assert_eq!(children, 3);
        let best = sim.most_fit().unwrap();
        assert_eq!(record.best_score, best.score);
        assert_eq!(record.best_size, best.size());

        let records = sim.run(&mut rng);
        assert_eq!(records.len(), 2);
        assert_eq!(sim.generation(), 3);
        for ind in sim.population() {
            assert!(ind.depth() <= sim.config().max_depth);
        }
    }

    #[test]
    fn only_newborns_are_evaluated() {
        let mut rng = StdRng::seed_from_u64(7);
        let config = EvolutionConfig {
            population_size: 10,
            episodes_per_evaluation: 1,
            use_crossover: false,
            ..Default::default()
        };
        let mut sim = Simulation::new(&mut rng, config, ResetCounter::default()).unwrap();

        let mut per_generation = Vec::new();
        let mut seen = 0;
        let mut survivor_scores = Vec::new();
        for g in 1..=4 {
            sim.step(&mut rng);
            let resets = sim.environment().resets;
            per_generation.push(resets - seen);
            seen = resets;

            let founders: Vec<f64> = sim
                .population()
                .iter()
                .filter(|i| i.generation == 0)
                .map(|i| i.score)
                .collect();
            if g == 1 {
                survivor_scores = founders;
            } else {
                assert_eq!(founders, survivor_scores);
            }
        }
        assert_eq!(per_generation, vec![10, 5, 5, 5]);
        assert_eq!(survivor_scores, vec![-5.0, -4.0, -3.0, -2.0, -1.0]);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let config = EvolutionConfig {
            population_size: 0,
            ..Default::default()
        };
        let env = countdown(1);
        assert!(Simulation::new(&mut rng, config, env).is_err());
    }

    #[test]
    fn report_formatting() {
        let ind = individual("3 4 +", 7.5, 2);
        let report = ind.report();
        assert_eq!(report.expression, "(3 + 4)");
        assert_eq!(
            report.to_string(),
            "(3 + 4)\nGeneration: 2\nSize: 3\nDepth: 1\nFitness: 7.5"
        );
        let record = GenerationRecord::new(4, &ind);
        assert_eq!(record.to_string(), "4,7.5,0,3,1");
    }
}
