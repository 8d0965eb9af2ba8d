//! Piecewise-constant population size histories.
//!
//! A schedule is a sparse list of `(generation, size)` change points.
//! The size in effect at generation `g` is the one paired with the
//! latest change point starting at or before `g`; the last change point
//! extends indefinitely.

use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;

use crate::error::{ScheduleError, ValidationError};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChangePoint {
    pub generation: u64,
    pub size: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PopulationSchedule {
    changes: Vec<ChangePoint>,
}

impl PopulationSchedule {
    /// Build a schedule from `(generation, size)` pairs.
    ///
    /// Entries must start at generation 0, be strictly increasing
    /// in generation, and have non-zero sizes.
    pub fn new(changes: Vec<(u64, u32)>) -> Result<Self, ScheduleError> {
        let mut rv = Self { changes: vec![] };
        for (index, (generation, size)) in changes.into_iter().enumerate() {
            rv.push(index + 1, generation, size)?;
        }
        rv.finish()
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, ScheduleError> {
        let mut rv = Self { changes: vec![] };
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let lineno = index + 1;
            let mut fields = line.split_whitespace();
            let (generation, size) = match (fields.next(), fields.next(), fields.next()) {
                (None, _, _) => continue,
                (Some(g), Some(n), None) => (g, n),
                _ => {
                    return Err(ScheduleError::format(
                        lineno,
                        format!("expected two integers, found {:?}", line.trim()),
                    ))
                }
            };
            let generation = generation.parse::<u64>().map_err(|_| {
                ScheduleError::format(lineno, format!("invalid generation {generation:?}"))
            })?;
            let size = size
                .parse::<u32>()
                .map_err(|_| ScheduleError::format(lineno, format!("invalid size {size:?}")))?;
            rv.push(lineno, generation, size)?;
        }
        rv.finish()
    }

    /// Load a schedule file; errors carry the file's path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ScheduleError> {
        let path = path.as_ref();
        let rv = std::fs::File::open(path)
            .map_err(ScheduleError::from)
            .and_then(|file| Self::from_reader(std::io::BufReader::new(file)))
            .map_err(|e| ScheduleError::File {
                path: path.to_path_buf(),
                source: Box::new(e),
            })?;
        tracing::debug!(
            path = %path.display(),
            num_changes = rv.changes.len(),
            "loaded population size schedule"
        );
        Ok(rv)
    }

    fn push(&mut self, lineno: usize, generation: u64, size: u32) -> Result<(), ScheduleError> {
        if size == 0 {
            return Err(ScheduleError::format(lineno, "population size must be > 0"));
        }
        match self.changes.last() {
            None if generation != 0 => {
                return Err(ScheduleError::format(
                    lineno,
                    format!("first change point must be at generation 0, got {generation}"),
                ))
            }
            Some(last) if generation <= last.generation => {
                return Err(ScheduleError::format(
                    lineno,
                    format!(
                        "generation {generation} does not follow generation {}",
                        last.generation
                    ),
                ))
            }
            _ => (),
        }
        self.changes.push(ChangePoint { generation, size });
        Ok(())
    }

    fn finish(self) -> Result<Self, ScheduleError> {
        if self.changes.is_empty() {
            Err(ScheduleError::Empty)
        } else {
            Ok(self)
        }
    }

    pub fn size_at_generation(&self, generation: u64) -> u32 {
        // The first change point is at generation 0, so n >= 1.
        let n = self.changes.partition_point(|c| c.generation <= generation);
        self.changes[n.saturating_sub(1)].size
    }

    pub fn changes(&self) -> &[ChangePoint] {
        &self.changes
    }
}

impl FromStr for PopulationSchedule {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_reader(s.as_bytes())
    }
}

/// Where the Wright-Fisher engine gets its population size from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PopulationSize {
    Constant(u32),
    Schedule(PopulationSchedule),
}

impl PopulationSize {
    pub fn constant(size: u32) -> Result<Self, ValidationError> {
        if size == 0 {
            Err(ValidationError::PopulationSize)
        } else {
            Ok(Self::Constant(size))
        }
    }

    #[inline]
    pub fn at_generation(&self, generation: u64) -> u32 {
        match self {
            Self::Constant(size) => *size,
            Self::Schedule(schedule) => schedule.size_at_generation(generation),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Constant(0) => Err(ValidationError::PopulationSize),
            _ => Ok(()),
        }
    }
}

impl From<PopulationSchedule> for PopulationSize {
    fn from(value: PopulationSchedule) -> Self {
        Self::Schedule(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;

    fn example() -> PopulationSchedule {
        PopulationSchedule::new(vec![(0, 100), (10, 50), (20, 200)]).unwrap()
    }

    #[test]
    fn test_size_at_generation() {
        let schedule = example();
        assert_eq!(schedule.size_at_generation(0), 100);
        assert_eq!(schedule.size_at_generation(5), 100);
        assert_eq!(schedule.size_at_generation(9), 100);
        assert_eq!(schedule.size_at_generation(10), 50);
        assert_eq!(schedule.size_at_generation(19), 50);
        assert_eq!(schedule.size_at_generation(20), 200);
        assert_eq!(schedule.size_at_generation(25), 200);
        assert_eq!(schedule.size_at_generation(u64::MAX), 200);
    }

    #[test]
    fn test_single_entry() {
        let schedule = PopulationSchedule::new(vec![(0, 7)]).unwrap();
        assert_eq!(schedule.size_at_generation(0), 7);
        assert_eq!(schedule.size_at_generation(1_000_000), 7);
    }

    #[test]
    fn test_parse() {
        let schedule: PopulationSchedule = "0 100\n10\t50\n\n  20   200  \n".parse().unwrap();
        assert_eq!(schedule, example());
    }

    #[test]
    fn test_parse_errors() {
        let cases = [
            ("0 100\n10\n", 2),
            ("0 100\n10 50 3\n", 2),
            ("0 100\nten 50\n", 2),
            ("0 100\n10 -50\n", 2),
            ("0 1.5\n", 1),
            ("0 100\n20 50\n10 200\n", 3),
            ("0 100\n10 50\n10 200\n", 3),
            ("5 100\n", 1),
            ("0 0\n", 1),
        ];
        for (input, expected_line) in cases {
            match input.parse::<PopulationSchedule>() {
                Err(ScheduleError::Format { line, .. }) => {
                    assert_eq!(line, expected_line, "{input:?}")
                }
                other => panic!("{input:?} gave {other:?}"),
            }
        }
    }

    #[test]
    fn test_empty() {
        assert!(matches!(
            "".parse::<PopulationSchedule>(),
            Err(ScheduleError::Empty)
        ));
        assert!(matches!(
            "\n   \n".parse::<PopulationSchedule>(),
            Err(ScheduleError::Empty)
        ));
        assert!(matches!(
            PopulationSchedule::new(vec![]),
            Err(ScheduleError::Empty)
        ));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0 100").unwrap();
        writeln!(file, "10 50").unwrap();
        writeln!(file, "20 200").unwrap();
        let schedule = PopulationSchedule::from_path(file.path()).unwrap();
        assert_eq!(schedule, example());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does_not_exist.txt");
        let err = PopulationSchedule::from_path(&path).unwrap_err();
        assert!(err.to_string().starts_with(&path.display().to_string()), "{err}");
        match err {
            ScheduleError::File { path: p, source } => {
                assert_eq!(p, path);
                assert!(matches!(*source, ScheduleError::Io(_)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_format_error_in_file_names_path_and_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0 100").unwrap();
        writeln!(file, "10 x").unwrap();
        let err = PopulationSchedule::from_path(file.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains(&file.path().display().to_string()), "{message}");
        assert!(message.contains("line 2"), "{message}");
        match err {
            ScheduleError::File { source, .. } => {
                assert!(matches!(*source, ScheduleError::Format { line: 2, .. }))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_population_size() {
        assert_eq!(
            PopulationSize::constant(0),
            Err(ValidationError::PopulationSize)
        );
        let constant = PopulationSize::constant(10).unwrap();
        assert_eq!(constant.at_generation(0), 10);
        assert_eq!(constant.at_generation(1000), 10);
        let scheduled = PopulationSize::from(example());
        assert_eq!(scheduled.at_generation(15), 50);
    }

    fn naive(changes: &[(u64, u32)], generation: u64) -> u32 {
        let mut rv = changes[0].1;
        for &(start, size) in changes {
            if start <= generation {
                rv = size;
            }
        }
        rv
    }

    proptest! {
        #[test]
        fn test_matches_linear_scan(
            steps in prop::collection::vec((1..50_u64, 1..10000_u32), 0..20),
            first_size in 1..10000_u32,
            generation in 0..1000_u64,
        )
        {
            let mut changes = vec![(0, first_size)];
            let mut start = 0;
            for (step, size) in steps {
                start += step;
                changes.push((start, size));
            }
            let schedule = PopulationSchedule::new(changes.clone()).unwrap();
            prop_assert_eq!(schedule.size_at_generation(generation), naive(&changes, generation));
        }
    }
}
