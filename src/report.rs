//! Plain-text reporting of replicate summaries.
//!
//! Only categories with at least one observation produce a line.

use std::fmt;

use crate::replicates::{CoalescentSummary, WrightFisherSummary};

/// English ordinal for small `n`, "13th"-style for larger values.
pub fn ordinal(n: u32) -> String {
    const WORDS: [&str; 12] = [
        "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth",
        "tenth", "eleventh", "twelfth",
    ];
    match n {
        1..=12 => WORDS[n as usize - 1].to_string(),
        _ => {
            let suffix = match (n % 10, n % 100) {
                (_, 11..=13) => "th",
                (1, _) => "st",
                (2, _) => "nd",
                (3, _) => "rd",
                _ => "th",
            };
            format!("{n}{suffix}")
        }
    }
}

impl fmt::Display for WrightFisherSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(m) = self.fixation {
            writeln!(
                f,
                "Allele was fixed in {:.2} generations. Variance: {:.2}",
                m.mean, m.variance
            )?;
        }
        if let Some(m) = self.loss {
            writeln!(
                f,
                "Allele was lost in {:.2} generations. Variance: {:.2}",
                m.mean, m.variance
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for CoalescentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(m) = self.reached {
            writeln!(
                f,
                "Time to {} coalescent event: {:.2}. Variance: {:.2}",
                ordinal(self.target_events),
                m.mean,
                m.variance
            )?;
        }
        Ok(())
    }
}
