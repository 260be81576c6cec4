//! Histogram summaries over a fixed logarithmic bucket table.
use super::single_value;
use crate::{
    proto::{self, summary::value::Value},
    LogboardError, Result,
};
use std::sync::OnceLock;

/// Smallest positive bucket boundary.
const FIRST_BOUNDARY: f64 = 1e-12;

/// Boundaries grow by this factor until exceeding [`LAST_BOUNDARY`].
const GROWTH: f64 = 1.1;

/// Positive boundaries stop at the first value not below this.
const LAST_BOUNDARY: f64 = 1e20;

/// Returns the default bucket boundaries in ascending order.
///
/// Positive boundaries are `1e-12 * 1.1^k` below `1e20`, mirrored into negative
/// boundaries, with a single `0.0` in the middle. A final `f64::MAX` boundary catches
/// every larger finite value.
pub fn default_buckets() -> &'static [f64] {
    static BUCKETS: OnceLock<Vec<f64>> = OnceLock::new();
    BUCKETS.get_or_init(|| {
        let mut pos = vec![];
        let mut v = FIRST_BOUNDARY;
        while v < LAST_BOUNDARY {
            pos.push(v);
            v *= GROWTH;
        }

        let mut buckets = Vec::with_capacity(2 * pos.len() + 2);
        buckets.extend(pos.iter().rev().map(|v| -v));
        buckets.push(0.0);
        buckets.extend(pos.iter().copied());
        buckets.push(f64::MAX);
        buckets
    })
}

/// Statistics of a set of values with sparse bucket counts.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramStats {
    /// Minimum value.
    pub min: f64,

    /// Maximum value.
    pub max: f64,

    /// Number of values.
    pub count: f64,

    /// Sum of values.
    pub sum: f64,

    /// Sum of squared values.
    pub sum_squares: f64,

    /// `(upper_boundary, count)` of the non-empty buckets in ascending order.
    pub buckets: Vec<(f64, f64)>,
}

impl HistogramStats {
    /// Bucketizes `values` against `boundaries`, which must be sorted ascending.
    ///
    /// Each value is counted in the first boundary not smaller than it. Values above
    /// the last boundary are counted in the last bucket.
    pub fn from_values(values: &[f64], boundaries: &[f64]) -> Self {
        let mut counts = vec![0usize; boundaries.len()];
        let (mut min, mut max) = match values.first() {
            Some(v) => (*v, *v),
            None => (0.0, 0.0),
        };
        let mut sum = 0.0;
        let mut sum_squares = 0.0;

        for &v in values {
            if let Some(last) = boundaries.len().checked_sub(1) {
                counts[boundaries.partition_point(|b| *b < v).min(last)] += 1;
            }
            sum += v;
            sum_squares += v * v;
            if v > max {
                max = v;
            }
            if v < min {
                min = v;
            }
        }

        let buckets = boundaries
            .iter()
            .zip(counts)
            .filter(|(_, c)| *c > 0)
            .map(|(b, c)| (*b, c as f64))
            .collect();

        Self {
            min,
            max,
            count: values.len() as f64,
            sum,
            sum_squares,
            buckets,
        }
    }

    fn into_proto(self) -> proto::HistogramProto {
        let (bucket_limit, bucket): (Vec<f64>, Vec<f64>) = self.buckets.into_iter().unzip();
        proto::HistogramProto {
            min: self.min,
            max: self.max,
            num: self.count,
            sum: self.sum,
            sum_squares: self.sum_squares,
            bucket_limit,
            bucket,
        }
    }
}

/// Builds a histogram summary of `values` over [`default_buckets`].
pub fn histogram(tag: &str, values: &[f64]) -> proto::Summary {
    let stats = HistogramStats::from_values(values, default_buckets());
    single_value(tag, Value::Histo(stats.into_proto()), None)
}

/// Builds a histogram summary from precomputed statistics.
///
/// `bucket_limits` and `bucket_counts` must have the same length.
#[allow(clippy::too_many_arguments)]
pub fn histogram_raw(
    tag: &str,
    min: f64,
    max: f64,
    num: f64,
    sum: f64,
    sum_squares: f64,
    bucket_limits: &[f64],
    bucket_counts: &[f64],
) -> Result<proto::Summary> {
    if bucket_limits.len() != bucket_counts.len() {
        log::error!(
            "Number of bucket limits ({}) differs from number of bucket counts ({})",
            bucket_limits.len(),
            bucket_counts.len()
        );
        return Err(LogboardError::InvalidHistogram(format!(
            "{} bucket limits, {} bucket counts",
            bucket_limits.len(),
            bucket_counts.len()
        )));
    }

    let histo = proto::HistogramProto {
        min,
        max,
        num,
        sum,
        sum_squares,
        bucket_limit: bucket_limits.to_vec(),
        bucket: bucket_counts.to_vec(),
    };
    Ok(single_value(tag, Value::Histo(histo), None))
}
