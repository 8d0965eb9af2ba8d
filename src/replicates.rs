//! Monte Carlo replication and reduction to summary statistics.
//!
//! Every replicate owns a `StdRng` seeded from the run seed and the
//! replicate index.  Replicates are simulated in fixed-size blocks of
//! consecutive indexes, each folded into its own accumulator, and the
//! block accumulators are merged in block order.  Memory stays bounded
//! by the number of blocks and the result does not depend on the
//! number of worker threads.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::coalescent::{Coalescent, CoalescentOutcome};
use crate::error::SimulationError;
use crate::params::{CoalescentParams, WrightFisherParams};
use crate::stats::{Moments, OnlineStats};
use crate::wright_fisher::{Absorption, Trajectory, WrightFisher};

/// Number of consecutive replicates folded by a single task.
pub const REPLICATE_BLOCK: u32 = 1024;

/// Seed for replicate `replicate` of a run seeded with `seed`.
#[inline]
pub fn replicate_seed(seed: u64, replicate: u32) -> u64 {
    seed ^ (replicate as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

fn thread_pool(threads: Option<usize>) -> Result<rayon::ThreadPool, SimulationError> {
    // 0 lets rayon pick the number of logical CPUs
    Ok(rayon::ThreadPoolBuilder::new()
        .num_threads(threads.unwrap_or(0))
        .build()?)
}

/// Per-category accumulator for one kind of replicate outcome.
trait Tally: Default + Send {
    type Outcome;

    fn record(&mut self, outcome: Self::Outcome);
    fn merge(&mut self, other: &Self);
}

#[derive(Copy, Clone, Debug, Default)]
struct TrajectoryTally {
    fixation: OnlineStats,
    loss: OnlineStats,
    timed_out: u32,
}

impl Tally for TrajectoryTally {
    type Outcome = Trajectory;

    fn record(&mut self, outcome: Trajectory) {
        match outcome {
            Trajectory::Absorbed {
                generations,
                outcome: Absorption::Fixation,
            } => self.fixation.push(generations as f64),
            Trajectory::Absorbed {
                generations,
                outcome: Absorption::Loss,
            } => self.loss.push(generations as f64),
            Trajectory::TimedOut { .. } => self.timed_out += 1,
        }
    }

    fn merge(&mut self, other: &Self) {
        self.fixation.merge(&other.fixation);
        self.loss.merge(&other.loss);
        self.timed_out += other.timed_out;
    }
}

impl TrajectoryTally {
    fn summary(&self, replicates: u32) -> WrightFisherSummary {
        WrightFisherSummary {
            replicates,
            fixation: self.fixation.moments(),
            loss: self.loss.moments(),
            timed_out: self.timed_out,
        }
    }
}

#[derive(Copy, Clone, Debug, Default)]
struct CoalescentTally {
    reached: OnlineStats,
    not_reached: u32,
}

impl Tally for CoalescentTally {
    type Outcome = CoalescentOutcome;

    fn record(&mut self, outcome: CoalescentOutcome) {
        if outcome.reached {
            self.reached.push(outcome.elapsed);
        } else {
            self.not_reached += 1;
        }
    }

    fn merge(&mut self, other: &Self) {
        self.reached.merge(&other.reached);
        self.not_reached += other.not_reached;
    }
}

fn tally_replicates<A, F>(
    replicates: u32,
    seed: u64,
    threads: Option<usize>,
    block: u32,
    simulate: F,
) -> Result<A, SimulationError>
where
    A: Tally,
    F: Fn(&mut StdRng) -> Result<A::Outcome, SimulationError> + Sync,
{
    let block = block.max(1) as u64;
    let num_blocks = ((replicates as u64 + block - 1) / block) as usize;
    let pool = thread_pool(threads)?;
    let blocks = pool.install(|| {
        (0..num_blocks)
            .into_par_iter()
            .map(|b| {
                let start = b as u64 * block;
                let stop = (start + block).min(replicates as u64);
                let mut tally = A::default();
                for replicate in start as u32..stop as u32 {
                    let mut rng = StdRng::seed_from_u64(replicate_seed(seed, replicate));
                    tally.record(simulate(&mut rng)?);
                }
                Ok::<A, SimulationError>(tally)
            })
            .collect::<Result<Vec<A>, SimulationError>>()
    })?;
    Ok(blocks.iter().fold(A::default(), |mut acc, tally| {
        acc.merge(tally);
        acc
    }))
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WrightFisherSummary {
    pub replicates: u32,
    /// Generations to fixation, over replicates that fixed.
    pub fixation: Option<Moments>,
    /// Generations to loss, over replicates that lost the allele.
    pub loss: Option<Moments>,
    /// Replicates that hit the generation cap; excluded from both statistics.
    pub timed_out: u32,
}

impl WrightFisherSummary {
    pub fn from_trajectories(trajectories: &[Trajectory]) -> Self {
        let mut tally = TrajectoryTally::default();
        trajectories.iter().for_each(|t| tally.record(*t));
        tally.summary(trajectories.len() as u32)
    }

    /// Fraction of absorbed replicates that fixed.
    pub fn fixation_probability(&self) -> Option<f64> {
        let fixed = self.fixation.map_or(0, |m| m.count);
        let lost = self.loss.map_or(0, |m| m.count);
        if fixed + lost == 0 {
            None
        } else {
            Some(fixed as f64 / (fixed + lost) as f64)
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CoalescentSummary {
    pub replicates: u32,
    pub target_events: u32,
    /// Time to the target event, over replicates that reached it.
    pub reached: Option<Moments>,
    pub not_reached: u32,
}

fn trajectories_in_blocks(
    model: &WrightFisher,
    replicates: u32,
    seed: u64,
    threads: Option<usize>,
    block: u32,
) -> Result<WrightFisherSummary, SimulationError> {
    let tally: TrajectoryTally = tally_replicates(replicates, seed, threads, block, |rng| {
        model.simulate_trajectory(rng)
    })?;
    Ok(tally.summary(replicates))
}

pub fn aggregate_trajectories(
    model: &WrightFisher,
    replicates: u32,
    seed: u64,
    threads: Option<usize>,
) -> Result<WrightFisherSummary, SimulationError> {
    let summary = trajectories_in_blocks(model, replicates, seed, threads, REPLICATE_BLOCK)?;
    if summary.timed_out > 0 {
        tracing::warn!(
            timed_out = summary.timed_out,
            max_generations = model.max_generations(),
            "replicates did not absorb and were excluded"
        );
    }
    Ok(summary)
}

pub fn aggregate_coalescent(
    model: &Coalescent,
    replicates: u32,
    seed: u64,
    threads: Option<usize>,
) -> Result<CoalescentSummary, SimulationError> {
    if !model.can_reach_target() {
        tracing::warn!(
            sample_size = model.sample_size(),
            target_events = model.target_events(),
            "sample too small to ever reach the target event"
        );
    }
    let tally: CoalescentTally =
        tally_replicates(replicates, seed, threads, REPLICATE_BLOCK, |rng| {
            model.simulate_coalescent(rng)
        })?;
    Ok(CoalescentSummary {
        replicates,
        target_events: model.target_events(),
        reached: tally.reached.moments(),
        not_reached: tally.not_reached,
    })
}

/// Validate `params`, load any schedule, and run all replicates.
pub fn run_wright_fisher(
    params: &WrightFisherParams,
) -> Result<WrightFisherSummary, SimulationError> {
    let model = params.model()?;
    let seed = params.seed.unwrap_or_else(rand::random);
    tracing::info!(
        seed,
        replicates = params.replicates,
        allele_freq = model.initial_frequency(),
        fitness = model.fitness(),
        "simulating Wright-Fisher trajectories"
    );
    let summary = aggregate_trajectories(&model, params.replicates, seed, params.threads)?;
    tracing::info!(
        fixed = summary.fixation.map_or(0, |m| m.count),
        lost = summary.loss.map_or(0, |m| m.count),
        timed_out = summary.timed_out,
        "done"
    );
    Ok(summary)
}

pub fn run_coalescent(params: &CoalescentParams) -> Result<CoalescentSummary, SimulationError> {
    let model = params.model()?;
    let seed = params.seed.unwrap_or_else(rand::random);
    tracing::info!(
        seed,
        replicates = params.replicates,
        pop_size = model.population_size(),
        sample_size = model.sample_size(),
        "simulating coalescent waiting times"
    );
    let summary = aggregate_coalescent(&model, params.replicates, seed, params.threads)?;
    tracing::info!(
        reached = summary.reached.map_or(0, |m| m.count),
        not_reached = summary.not_reached,
        "done"
    );
    Ok(summary)
}
