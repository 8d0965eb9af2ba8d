//! Monte Carlo estimates of absorption times for two classical
//! population-genetic processes:
//!
//! * a haploid, single-locus Wright-Fisher model with selection and drift,
//!   under a constant or piecewise-constant population size
//!   ([`wright_fisher`], [`schedule`]), and
//! * the coalescent, timing successive merges in a sample of lineages
//!   ([`coalescent`]).
//!
//! [`replicates`] runs independent replicates and reduces them to
//! per-outcome mean and variance; an outcome that never occurs is
//! reported as `None`.

pub mod coalescent;
pub mod error;
pub mod params;
pub mod replicates;
pub mod report;
pub mod schedule;
pub mod stats;
pub mod wright_fisher;

pub use coalescent::{Coalescent, CoalescentOutcome};
pub use error::{ScheduleError, SimulationError, ValidationError};
pub use params::{CoalescentParams, WrightFisherParams};
pub use replicates::{run_coalescent, run_wright_fisher, CoalescentSummary, WrightFisherSummary};
pub use schedule::{PopulationSchedule, PopulationSize};
pub use stats::{Moments, OnlineStats};
pub use wright_fisher::{Absorption, Trajectory, WrightFisher};
