//! Haploid Wright-Fisher allele frequency trajectories with selection.
//!
//! Each generation the focal allele is transmitted with a
//! selection-weighted probability and the next generation's allele
//! count is a binomial draw of size `N`.  A trajectory ends when the
//! allele is lost (count 0) or fixed (count `N`).

use rand::Rng;
use rand_distr::Binomial;

use crate::error::{SimulationError, ValidationError};
use crate::schedule::PopulationSize;

/// Generation cap used when none is given.
pub const DEFAULT_MAX_GENERATIONS: u64 = 10_000_000;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Absorption {
    Fixation,
    Loss,
}

impl Absorption {
    pub fn frequency(self) -> f64 {
        match self {
            Self::Fixation => 1.0,
            Self::Loss => 0.0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Trajectory {
    Absorbed {
        generations: u64,
        outcome: Absorption,
    },
    /// The generation cap was hit with the allele still segregating.
    TimedOut { generations: u64, frequency: f64 },
}

impl Trajectory {
    pub fn generations(&self) -> u64 {
        match self {
            Self::Absorbed { generations, .. } | Self::TimedOut { generations, .. } => *generations,
        }
    }

    pub fn terminal_frequency(&self) -> f64 {
        match self {
            Self::Absorbed { outcome, .. } => outcome.frequency(),
            Self::TimedOut { frequency, .. } => *frequency,
        }
    }
}

/// Probability that a transmitted copy is the focal allele after selection.
///
/// Equal to `frequency` when `fitness == 1`.
#[inline]
pub fn transmission_probability(frequency: f64, fitness: f64) -> f64 {
    // Same as f*w / (f*w + 1 - f), but stays finite for extreme w.
    (frequency / (frequency + (1.0 - frequency) / fitness)).clamp(0.0, 1.0)
}

/// Checks shared by [`WrightFisher::new`] and the command-line parameters.
pub(crate) fn check_parameters(
    initial_frequency: f64,
    fitness: f64,
    max_generations: u64,
) -> Result<(), ValidationError> {
    if !(initial_frequency > 0.0 && initial_frequency < 1.0) {
        return Err(ValidationError::AlleleFrequency(initial_frequency));
    }
    if !fitness.is_finite() || fitness <= 0.0 {
        return Err(ValidationError::Fitness(fitness));
    }
    if max_generations == 0 {
        return Err(ValidationError::MaxGenerations);
    }
    Ok(())
}

/// A validated single-locus Wright-Fisher model.
#[derive(Clone, Debug)]
pub struct WrightFisher {
    initial_frequency: f64,
    fitness: f64,
    sizes: PopulationSize,
    max_generations: u64,
}

impl WrightFisher {
    pub fn new(
        initial_frequency: f64,
        sizes: PopulationSize,
        fitness: f64,
        max_generations: u64,
    ) -> Result<Self, ValidationError> {
        check_parameters(initial_frequency, fitness, max_generations)?;
        sizes.validate()?;
        Ok(Self {
            initial_frequency,
            fitness,
            sizes,
            max_generations,
        })
    }

    pub fn initial_frequency(&self) -> f64 {
        self.initial_frequency
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn sizes(&self) -> &PopulationSize {
        &self.sizes
    }

    pub fn max_generations(&self) -> u64 {
        self.max_generations
    }

    /// Run one trajectory until absorption or the generation cap.
    pub fn simulate_trajectory<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<Trajectory, SimulationError> {
        let mut frequency = self.initial_frequency;
        let mut generation = 0_u64;
        while generation < self.max_generations {
            let size = self.sizes.at_generation(generation);
            let q = transmission_probability(frequency, self.fitness);
            let copies = rng.sample(Binomial::new(size as u64, q)?);
            generation += 1;
            if copies == 0 {
                return Ok(Trajectory::Absorbed {
                    generations: generation,
                    outcome: Absorption::Loss,
                });
            }
            if copies == size as u64 {
                return Ok(Trajectory::Absorbed {
                    generations: generation,
                    outcome: Absorption::Fixation,
                });
            }
            frequency = copies as f64 / size as f64;
        }
        Ok(Trajectory::TimedOut {
            generations: generation,
            frequency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::PopulationSchedule;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn model(p0: f64, size: u32, fitness: f64) -> WrightFisher {
        WrightFisher::new(
            p0,
            PopulationSize::Constant(size),
            fitness,
            DEFAULT_MAX_GENERATIONS,
        )
        .unwrap()
    }

    fn fixation_probability(model: &WrightFisher, replicates: usize, seed: u64) -> f64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut fixed = 0;
        for _ in 0..replicates {
            match model.simulate_trajectory(&mut rng).unwrap() {
                Trajectory::Absorbed {
                    outcome: Absorption::Fixation,
                    ..
                } => fixed += 1,
                Trajectory::Absorbed { .. } => (),
                t => panic!("unexpected {t:?}"),
            }
        }
        fixed as f64 / replicates as f64
    }

    #[test]
    fn test_transmission_probability() {
        for f in [0.001, 0.25, 0.5, 0.999] {
            assert!((transmission_probability(f, 1.0) - f).abs() < 1e-15);
            let direct = f * 1.5 / (f * 1.5 + (1.0 - f));
            assert!((transmission_probability(f, 1.5) - direct).abs() < 1e-12);
            assert!(transmission_probability(f, 1.5) > f);
            assert!(transmission_probability(f, 0.5) < f);
        }
        assert_eq!(transmission_probability(0.5, f64::MAX), 1.0);
        assert!(transmission_probability(0.5, f64::MIN_POSITIVE) < 1e-300);
    }

    #[test]
    fn test_validation() {
        let size = PopulationSize::Constant(10);
        for p0 in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            assert!(matches!(
                WrightFisher::new(p0, size.clone(), 1.0, 10),
                Err(ValidationError::AlleleFrequency(_))
            ));
        }
        for w in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            assert!(matches!(
                WrightFisher::new(0.5, size.clone(), w, 10),
                Err(ValidationError::Fitness(_))
            ));
        }
        assert_eq!(
            WrightFisher::new(0.5, PopulationSize::Constant(0), 1.0, 10).unwrap_err(),
            ValidationError::PopulationSize
        );
        assert_eq!(
            WrightFisher::new(0.5, size, 1.0, 0).unwrap_err(),
            ValidationError::MaxGenerations
        );
    }

    #[test]
    fn test_neutral_fixation_probability() {
        // (p0, N, replicates)
        for (p0, size, replicates) in [(0.001, 1000, 20000), (0.5, 50, 4000), (0.999, 1000, 20000)]
        {
            let m = model(p0, size, 1.0);
            let estimate = fixation_probability(&m, replicates, 101);
            let se = (p0 * (1.0 - p0) / replicates as f64).sqrt();
            assert!(
                (estimate - p0).abs() < 5.0 * se,
                "p0 = {p0}, estimate = {estimate}"
            );
        }
    }

    #[test]
    fn test_selection_is_monotonic() {
        let p0 = 0.2;
        let beneficial = fixation_probability(&model(p0, 100, 1.05), 2000, 7);
        let neutral = fixation_probability(&model(p0, 100, 1.0), 2000, 7);
        let deleterious = fixation_probability(&model(p0, 100, 0.95), 2000, 7);
        assert!(beneficial > p0);
        assert!(deleterious < p0);
        assert!(beneficial > neutral);
        assert!(neutral > deleterious);
    }

    #[test]
    fn test_timeout() {
        let m = WrightFisher::new(0.5, PopulationSize::Constant(10000), 1.0, 1).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        match m.simulate_trajectory(&mut rng).unwrap() {
            Trajectory::TimedOut {
                generations,
                frequency,
            } => {
                assert_eq!(generations, 1);
                assert!(frequency > 0.0 && frequency < 1.0);
            }
            t => panic!("unexpected {t:?}"),
        }
    }

    #[test]
    fn test_schedule_bottleneck_forces_absorption() {
        // A single individual from generation 5 onward absorbs immediately.
        let schedule = PopulationSchedule::new(vec![(0, 10000), (5, 1)]).unwrap();
        let m = WrightFisher::new(0.5, schedule.into(), 1.0, DEFAULT_MAX_GENERATIONS).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let t = m.simulate_trajectory(&mut rng).unwrap();
            assert!(matches!(t, Trajectory::Absorbed { .. }));
            assert_eq!(t.generations(), 6);
        }
    }

    proptest! {
        #[test]
        fn test_trajectories_end_at_a_boundary(seed in 0..u64::MAX,
                                               p0 in 0.01..0.99_f64,
                                               size in 1..200_u32,
                                               fitness in 0.5..2.0_f64)
        {
            let m = model(p0, size, fitness);
            let mut rng = StdRng::seed_from_u64(seed);
            let t = m.simulate_trajectory(&mut rng).unwrap();
            prop_assert!(matches!(t, Trajectory::Absorbed { .. }), "{:?}", t);
            prop_assert!(t.generations() >= 1);
            let f = t.terminal_frequency();
            prop_assert!(f == 0.0 || f == 1.0);
        }
    }
}
