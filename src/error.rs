use std::path::PathBuf;

use thiserror::Error;

/// A simulation parameter is outside of its valid domain.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("allele frequency must be in (0, 1), got {0}")]
    AlleleFrequency(f64),
    #[error("relative fitness must be finite and > 0, got {0}")]
    Fitness(f64),
    #[error("population size must be > 0")]
    PopulationSize,
    #[error("sample size must be >= 2, got {0}")]
    SampleSize(u32),
    #[error("number of replicates must be > 0")]
    Replicates,
    #[error("number of coalescent events must be > 0")]
    Events,
    #[error("maximum number of generations must be > 0")]
    MaxGenerations,
    #[error("number of threads must be > 0")]
    Threads,
}

/// Failure to load a population size schedule.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("line {line}: {message}")]
    Format { line: usize, message: String },
    #[error("population size schedule has no entries")]
    Empty,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        source: Box<ScheduleError>,
    },
}

impl ScheduleError {
    pub(crate) fn format(line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            line,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid parameter: {0}")]
    Validation(#[from] ValidationError),
    #[error("invalid population size schedule: {0}")]
    Schedule(#[from] ScheduleError),
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("invalid binomial distribution: {0}")]
    Binomial(#[from] rand_distr::BinomialError),
    #[error("invalid exponential distribution: {0}")]
    Exponential(#[from] rand_distr::ExpError),
}
