//! Reduction of cumulative bucketed histograms into per-report statistics.

use crate::source::Histogram;

/// Maximum raw samples forwarded to the distribution stream per histogram
/// per report.
pub(crate) const DISTRIBUTION_BUDGET: usize = 64;

/// Scalar statistics over the occupancies added since the previous report.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Summary {
    pub(crate) avg: f64,
    pub(crate) min: f64,
    pub(crate) max: f64,
    pub(crate) median: f64,
    pub(crate) p95: f64,
    pub(crate) p99: f64,
}

/// Why a histogram sample was unusable this cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum HistogramError {
    /// Bounds and counts are not aligned, the bounds are not strictly
    /// increasing, or the bucket layout changed between reports.
    Malformed,
    /// A cumulative count decreased between reports.
    Reset,
    /// An occupied bucket has a non-finite representative.
    NonFinite,
}

/// The elementwise difference between two successive histogram snapshots.
///
/// Bucket `i` spans `(upper_bounds[i - 1], upper_bounds[i]]`, with a lower
/// bound of negative infinity for the first bucket. Each bucket is stood in
/// for by a single representative value: the midpoint of its bounds, or the
/// finite bound for the open-ended first and last buckets.
#[derive(Debug)]
pub(crate) struct DeltaHistogram<'a> {
    hist: &'a Histogram,
    deltas: Vec<u64>,
    total: u64,
}

impl<'a> DeltaHistogram<'a> {
    /// Diffs `hist` against the counts recorded at the previous report.
    ///
    /// `prev` is `None` on the first report, which diffs against zeros.
    pub(crate) fn new(hist: &'a Histogram, prev: Option<&[u64]>) -> Result<Self, HistogramError> {
        if hist.upper_bounds.len() != hist.counts.len() {
            return Err(HistogramError::Malformed);
        }
        if hist.upper_bounds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(HistogramError::Malformed);
        }
        if let Some(prev) = prev {
            if prev.len() != hist.counts.len() {
                return Err(HistogramError::Malformed);
            }
        }

        let mut deltas = Vec::with_capacity(hist.counts.len());
        let mut total: u64 = 0;
        for (i, &count) in hist.counts.iter().enumerate() {
            let before = prev.map_or(0, |prev| prev[i]);
            let delta = count.checked_sub(before).ok_or(HistogramError::Reset)?;
            total += delta;
            deltas.push(delta);
        }

        let delta_hist = DeltaHistogram { hist, deltas, total };
        for (i, &delta) in delta_hist.deltas.iter().enumerate() {
            if delta > 0 && !delta_hist.representative(i).is_finite() {
                return Err(HistogramError::NonFinite);
            }
        }
        Ok(delta_hist)
    }

    fn bounds(&self, i: usize) -> (f64, f64) {
        let lo = if i == 0 {
            f64::NEG_INFINITY
        } else {
            self.hist.upper_bounds[i - 1]
        };
        (lo, self.hist.upper_bounds[i])
    }

    fn representative(&self, i: usize) -> f64 {
        let (lo, hi) = self.bounds(i);
        match (lo.is_finite(), hi.is_finite()) {
            (false, _) => hi,
            (_, false) => lo,
            _ => lo + (hi - lo) / 2.0,
        }
    }

    /// Summarizes the delta occupancies.
    ///
    /// Returns `None` when nothing landed in any bucket since the previous
    /// report, in which case nothing should be emitted.
    pub(crate) fn summary(&self) -> Option<Summary> {
        if self.total == 0 {
            return None;
        }

        let mut min = f64::NAN;
        let mut max = f64::NAN;
        let mut weighted_sum = 0.0;
        for (i, &delta) in self.deltas.iter().enumerate() {
            if delta == 0 {
                continue;
            }
            let rep = self.representative(i);
            if min.is_nan() {
                min = rep;
            }
            max = rep;
            weighted_sum += rep * delta as f64;
        }

        Some(Summary {
            avg: weighted_sum / self.total as f64,
            min,
            max,
            median: self.quantile(0.5),
            p95: self.quantile(0.95),
            p99: self.quantile(0.99),
        })
    }

    /// Linear interpolation across the cumulative delta CDF.
    ///
    /// A rank landing exactly on a bucket's cumulative boundary resolves to
    /// that (lower) bucket's representative; a rank strictly inside an
    /// open-ended bucket resolves to its representative.
    fn quantile(&self, q: f64) -> f64 {
        let rank = q * self.total as f64;
        let mut cum: u64 = 0;
        for (i, &delta) in self.deltas.iter().enumerate() {
            if delta == 0 {
                continue;
            }
            let before = cum as f64;
            cum += delta;
            let after = cum as f64;
            if after < rank {
                continue;
            }
            if after > rank && rank > before {
                let (lo, hi) = self.bounds(i);
                if lo.is_finite() && hi.is_finite() {
                    return lo + (hi - lo) * (rank - before) / delta as f64;
                }
            }
            return self.representative(i);
        }
        f64::NAN
    }

    /// Expands the delta into at most `budget` raw samples for the
    /// distribution stream.
    ///
    /// Buckets contribute proportionally to their delta share, rounded with
    /// largest remainder so that exactly `min(total, budget)` samples come
    /// back; when the total fits the budget the expansion is exact. Each
    /// sample's value is its bucket's representative.
    pub(crate) fn distribution_samples(&self, budget: usize) -> Vec<f64> {
        if self.total == 0 || budget == 0 {
            return Vec::new();
        }
        let target = self.total.min(budget as u64);

        let mut shares: Vec<u64> = Vec::with_capacity(self.deltas.len());
        let mut remainders: Vec<(u64, usize)> = Vec::new();
        let mut assigned: u64 = 0;
        for (i, &delta) in self.deltas.iter().enumerate() {
            let exact = delta as u128 * target as u128;
            let share = (exact / self.total as u128) as u64;
            let remainder = (exact % self.total as u128) as u64;
            assigned += share;
            shares.push(share);
            if remainder > 0 {
                remainders.push((remainder, i));
            }
        }

        // Hand out the seats lost to flooring, biggest remainder first,
        // lower bucket winning ties.
        remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        let missing = (target - assigned) as usize;
        for &(_, i) in remainders.iter().take(missing) {
            shares[i] += 1;
        }

        let mut samples = Vec::with_capacity(target as usize);
        for (i, &share) in shares.iter().enumerate() {
            let rep = self.representative(i);
            samples.extend(std::iter::repeat(rep).take(share as usize));
        }
        samples
    }
}
