//! Single-pass summary statistics for replicate outcomes.

/// Mean and population variance (divisor `count`) of a non-empty sample.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Moments {
    pub count: u64,
    pub mean: f64,
    pub variance: f64,
}

impl Moments {
    /// Returns `None` for an empty slice.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        values
            .iter()
            .fold(OnlineStats::default(), |mut acc, &x| {
                acc.push(x);
                acc
            })
            .moments()
    }
}

/// Welford's online accumulator.
///
/// Two accumulators can be merged, so partial results from
/// different workers combine into the same moments as a single
/// pass over all values.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct OnlineStats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl OnlineStats {
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    pub fn merge(&mut self, other: &Self) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        let count = self.count + other.count;
        let delta = other.mean - self.mean;
        let n = count as f64;
        self.mean += delta * other.count as f64 / n;
        self.m2 += other.m2 + delta * delta * (self.count as f64) * (other.count as f64) / n;
        self.count = count;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn moments(&self) -> Option<Moments> {
        if self.count == 0 {
            None
        } else {
            Some(Moments {
                count: self.count,
                mean: self.mean,
                variance: self.m2 / self.count as f64,
            })
        }
    }
}

impl Extend<f64> for OnlineStats {
    fn extend<T: IntoIterator<Item = f64>>(&mut self, iter: T) {
        iter.into_iter().for_each(|x| self.push(x));
    }
}
