use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use crate::coalescent::{Coalescent, DEFAULT_TARGET_EVENTS};
use crate::error::{SimulationError, ValidationError};
use crate::schedule::{PopulationSchedule, PopulationSize};
use crate::wright_fisher::{check_parameters, WrightFisher, DEFAULT_MAX_GENERATIONS};

/// Time to fixation or loss of an allele under Wright-Fisher reproduction with selection.
#[derive(Parser, Debug, Clone)]
#[command(group(
    ArgGroup::new("size")
        .required(true)
        .args(["pop_size", "pop_size_file"])
))]
pub struct WrightFisherParams {
    /// Initial frequency of the focal allele, in (0, 1)
    #[arg(short = 'p', long = "allele-freq")]
    pub allele_freq: f64,
    /// Constant (haploid) population size
    #[arg(short = 'N', long = "pop-size")]
    pub pop_size: Option<u32>,
    /// File of "generation size" lines giving a piecewise-constant population size
    #[arg(long = "pop-size-file")]
    pub pop_size_file: Option<PathBuf>,
    /// Relative fitness of the focal allele (1 is neutral)
    #[arg(short, long)]
    pub fitness: f64,
    #[arg(short, long)]
    pub replicates: u32,
    /// Random seed. A random one is drawn and logged when omitted.
    #[arg(short, long)]
    pub seed: Option<u64>,
    /// Replicates still segregating after this many generations are discarded
    #[arg(long = "max-generations", default_value_t = DEFAULT_MAX_GENERATIONS)]
    pub max_generations: u64,
    /// Worker threads (defaults to the number of logical CPUs)
    #[arg(short, long)]
    pub threads: Option<usize>,
}

impl WrightFisherParams {
    pub fn validate(self) -> Result<Self, ValidationError> {
        check_parameters(self.allele_freq, self.fitness, self.max_generations)?;
        if self.pop_size == Some(0) {
            return Err(ValidationError::PopulationSize);
        }
        if self.replicates == 0 {
            return Err(ValidationError::Replicates);
        }
        validate_threads(self.threads)?;
        Ok(self)
    }

    /// Resolve the size source, reading the schedule file if one was given.
    ///
    /// A schedule file takes precedence over a constant size.
    pub fn population_size(&self) -> Result<PopulationSize, SimulationError> {
        match (&self.pop_size_file, self.pop_size) {
            (Some(path), _) => Ok(PopulationSchedule::from_path(path)?.into()),
            (None, Some(size)) => Ok(PopulationSize::constant(size)?),
            (None, None) => Err(ValidationError::PopulationSize.into()),
        }
    }

    /// Validate everything and load the schedule, before any simulation work.
    pub fn model(&self) -> Result<WrightFisher, SimulationError> {
        let params = self.clone().validate()?;
        let sizes = params.population_size()?;
        Ok(WrightFisher::new(
            params.allele_freq,
            sizes,
            params.fitness,
            params.max_generations,
        )?)
    }
}

/// Time to the eighth coalescent event in a sample of lineages.
#[derive(Parser, Debug, Clone)]
pub struct CoalescentParams {
    /// Effective population size
    #[arg(short = 'N', long = "pop-size")]
    pub pop_size: u32,
    /// Number of sampled lineages (at least 2)
    #[arg(short = 'n', long = "sample-size")]
    pub sample_size: u32,
    #[arg(short, long)]
    pub replicates: u32,
    /// Coalescent event whose waiting time is recorded
    #[arg(short, long, default_value_t = DEFAULT_TARGET_EVENTS)]
    pub events: u32,
    /// Random seed. A random one is drawn and logged when omitted.
    #[arg(short, long)]
    pub seed: Option<u64>,
    /// Worker threads (defaults to the number of logical CPUs)
    #[arg(short, long)]
    pub threads: Option<usize>,
}

impl CoalescentParams {
    pub fn validate(self) -> Result<Self, ValidationError> {
        if self.replicates == 0 {
            return Err(ValidationError::Replicates);
        }
        validate_threads(self.threads)?;
        // remaining checks live with the model
        Coalescent::new(self.pop_size, self.sample_size, self.events)?;
        Ok(self)
    }

    pub fn model(&self) -> Result<Coalescent, ValidationError> {
        let params = self.clone().validate()?;
        Coalescent::new(params.pop_size, params.sample_size, params.events)
    }
}

fn validate_threads(threads: Option<usize>) -> Result<(), ValidationError> {
    match threads {
        Some(0) => Err(ValidationError::Threads),
        _ => Ok(()),
    }
}
