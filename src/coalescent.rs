//! Waiting times between coalescent events in a sample of lineages.

use rand::Rng;
use rand_distr::Exp;

use crate::error::{SimulationError, ValidationError};

/// Number of coalescent events whose cumulative time is recorded by default.
pub const DEFAULT_TARGET_EVENTS: u32 = 8;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CoalescentOutcome {
    /// Total waiting time over all completed events.
    pub elapsed: f64,
    pub events: u32,
    /// `true` when the target number of events completed.
    pub reached: bool,
}

/// Pairwise coalescence rate among `lineages` lineages in a population of `size`.
#[inline]
pub fn coalescence_rate(lineages: u32, size: u32) -> f64 {
    let k = lineages as f64;
    k * (k - 1.0) / (2.0 * size as f64)
}

#[derive(Copy, Clone, Debug)]
pub struct Coalescent {
    population_size: u32,
    sample_size: u32,
    target_events: u32,
}

impl Coalescent {
    pub fn new(
        population_size: u32,
        sample_size: u32,
        target_events: u32,
    ) -> Result<Self, ValidationError> {
        if population_size == 0 {
            return Err(ValidationError::PopulationSize);
        }
        if sample_size < 2 {
            return Err(ValidationError::SampleSize(sample_size));
        }
        if target_events == 0 {
            return Err(ValidationError::Events);
        }
        Ok(Self {
            population_size,
            sample_size,
            target_events,
        })
    }

    pub fn population_size(&self) -> u32 {
        self.population_size
    }

    pub fn sample_size(&self) -> u32 {
        self.sample_size
    }

    pub fn target_events(&self) -> u32 {
        self.target_events
    }

    /// Whether a replicate can ever complete the target number of events.
    ///
    /// A sample of `n` lineages coalesces at most `n - 1` times.
    pub fn can_reach_target(&self) -> bool {
        self.sample_size > self.target_events
    }

    pub fn simulate_coalescent<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<CoalescentOutcome, SimulationError> {
        let mut lineages = self.sample_size;
        let mut events = 0;
        let mut elapsed = 0.0;
        while events < self.target_events && lineages > 1 {
            let rate = coalescence_rate(lineages, self.population_size);
            elapsed += rng.sample(Exp::new(rate)?);
            lineages -= 1;
            events += 1;
        }
        Ok(CoalescentOutcome {
            elapsed,
            events,
            reached: events == self.target_events,
        })
    }
}
