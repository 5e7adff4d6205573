//! Secant sets built from point clouds.
//!
//! A secant is the unit vector joining two samples of a point cloud. For `N`
//! samples there are `N(N−1)/2` of them, enumerated as
//!
//! ```text
//! for i in 0..N { for j in i+1..N { yield normalize(p_j − p_i) } }
//! ```
//!
//! Two storage modes are supported:
//!
//! - **lazy**: only the samples are stored and a secant is rebuilt from its
//!   index on demand (see [`pair_from_index`]). Memory stays `O(N)`.
//! - **precomputed**: every secant is a column of an `n × count` matrix.
//!   Faster to iterate, and the only mode that carries non-unit weights.
//!
//! Pairs of (numerically) coincident samples have no direction. What happens
//! to them is decided by [`DegeneratePolicy`]; such a pair is never normalized.

use std::convert::Infallible;

use nalgebra::{DMatrix, DVector, DVectorView};
use num_traits::Float;
use secantopt_core::parallel::WorkerPool;
use secantopt_core::types::Scalar;
use tracing::debug;

use crate::dataset::PointCloud;
use crate::error::{SecantError, SecantResult};

/// What to do with a pair of coincident samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DegeneratePolicy {
    /// Leave the pair out of the set.
    #[default]
    Skip,
    /// Fail with [`SecantError::DegenerateSecant`].
    Reject,
}

/// Options for building a secant set.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SecantConfig<T: Scalar> {
    /// Materialize every secant up front
    pub precompute: bool,

    /// Handling of coincident samples
    pub degenerate_policy: DegeneratePolicy,

    /// Difference norms at or below this value count as coincident
    pub degenerate_tolerance: T,
}

impl<T: Scalar> Default for SecantConfig<T> {
    fn default() -> Self {
        Self {
            precompute: true,
            degenerate_policy: DegeneratePolicy::default(),
            degenerate_tolerance: T::DEGENERATE_TOLERANCE,
        }
    }
}

impl<T: Scalar> SecantConfig<T> {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for the lazy storage mode.
    pub fn lazy() -> Self {
        Self::default().with_precompute(false)
    }

    /// Sets the storage mode.
    pub fn with_precompute(mut self, precompute: bool) -> Self {
        self.precompute = precompute;
        self
    }

    /// Sets the degenerate-pair policy.
    pub fn with_degenerate_policy(mut self, policy: DegeneratePolicy) -> Self {
        self.degenerate_policy = policy;
        self
    }

    /// Sets the coincidence threshold.
    pub fn with_degenerate_tolerance(mut self, tolerance: T) -> Self {
        self.degenerate_tolerance = tolerance;
        self
    }
}

/// Summary of how a projection treats a secant set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecantStatistics<T: Scalar> {
    /// Number of secants inspected
    pub count: usize,
    /// Sum of their weights
    pub total_weight: usize,
    /// Shortest projected secant
    pub min: T,
    /// Longest projected secant
    pub max: T,
    /// Weighted mean projected length
    pub mean: T,
}

#[derive(Debug, Clone)]
pub(crate) enum Storage<T: Scalar> {
    Lazy {
        /// `n × N`, one sample per column
        points: DMatrix<T>,
        /// Coincidence threshold the set was built with
        tolerance: T,
    },
    Precomputed {
        /// `n × count`, one unit secant per column
        secants: DMatrix<T>,
        /// One weight per column
        weights: Vec<usize>,
    },
}

/// A weighted set of unit secants.
#[derive(Debug, Clone)]
pub struct Secants<T: Scalar> {
    pub(crate) storage: Storage<T>,
    pub(crate) dimension: usize,
    pub(crate) skipped: usize,
}

/// Number of unordered pairs among `n` items.
#[inline]
pub fn pair_count(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Index of the first pair `(i, i + 1)` of row `i`.
#[inline]
fn row_start(n: usize, i: usize) -> usize {
    i * (2 * n - i - 1) / 2
}

/// Decodes a secant index into its pair of sample indices.
///
/// Exact inverse of the `i < j` enumeration. Returns `None` if `k` is out of
/// range.
pub fn pair_from_index(n: usize, k: usize) -> Option<(usize, usize)> {
    if k >= pair_count(n) {
        return None;
    }
    // Closed-form guess, then fix rounding of the square root.
    let b = (2 * n - 1) as f64;
    let guess = (b - (b * b - 8.0 * k as f64).max(0.0).sqrt()) / 2.0;
    let mut i = (guess.floor().max(0.0) as usize).min(n - 2);
    while i > 0 && row_start(n, i) > k {
        i -= 1;
    }
    while i + 2 < n && row_start(n, i + 1) <= k {
        i += 1;
    }
    let j = k - row_start(n, i) + i + 1;
    Some((i, j))
}

/// Encodes a pair `i < j < n` as a secant index.
pub fn index_from_pair(n: usize, i: usize, j: usize) -> Option<usize> {
    if i < j && j < n {
        Some(row_start(n, i) + (j - i - 1))
    } else {
        None
    }
}

/// Writes `normalize(b − a)` into `out`; returns false for a coincident pair.
#[inline]
fn unit_difference<T: Scalar>(a: &[T], b: &[T], tolerance: T, out: &mut [T]) -> bool {
    let mut norm_sq = T::zero();
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = y - x;
        norm_sq += *o * *o;
    }
    let norm = <T as Float>::sqrt(norm_sq);
    if norm <= tolerance {
        return false;
    }
    for o in out.iter_mut() {
        *o /= norm;
    }
    true
}

impl<T: Scalar> Secants<T> {
    /// Builds the secant set of a sequence of samples.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` if the samples differ in length; `DegenerateSecant`
    /// on a coincident pair under [`DegeneratePolicy::Reject`].
    pub fn compute_from_data(points: &[DVector<T>], config: &SecantConfig<T>) -> SecantResult<Self> {
        let dimension = points.first().map_or(0, |p| p.len());
        Self::build(points, dimension, config)
    }

    /// Builds the secant set of a point cloud.
    pub fn from_cloud<P>(cloud: &P, config: &SecantConfig<T>) -> SecantResult<Self>
    where
        P: PointCloud<T> + ?Sized,
    {
        Self::build(cloud.points(), cloud.dimension(), config)
    }

    fn build(points: &[DVector<T>], dimension: usize, config: &SecantConfig<T>) -> SecantResult<Self> {
        if let Some(bad) = points.iter().find(|p| p.len() != dimension) {
            return Err(SecantError::dimension_mismatch(dimension, bad.len()));
        }
        if dimension == 0 && !points.is_empty() {
            return Err(SecantError::invalid_parameter("samples must have at least one coordinate"));
        }
        let n_points = points.len();
        let matrix = DMatrix::from_fn(dimension, n_points, |r, c| points[c][r]);

        let secants = if config.precompute {
            Self::precompute(&matrix, config)?
        } else {
            Self::lazy(matrix, config)?
        };

        debug!(
            points = n_points,
            secants = secants.count(),
            skipped = secants.skipped,
            precomputed = config.precompute,
            "Computed secant set"
        );
        Ok(secants)
    }

    /// Builds one secant set per cloud on the worker pool, in input order.
    pub fn compute_many<P>(
        clouds: &[P],
        config: &SecantConfig<T>,
        pool: &WorkerPool,
    ) -> SecantResult<Vec<Self>>
    where
        P: PointCloud<T> + Sync,
    {
        pool.try_map(clouds, |cloud| Self::from_cloud(cloud, config))
    }

    fn precompute(points: &DMatrix<T>, config: &SecantConfig<T>) -> SecantResult<Self> {
        let (dimension, n_points) = points.shape();
        let total = pair_count(n_points);
        let mut data = Vec::with_capacity(total * dimension);
        let mut buffer = vec![T::zero(); dimension];
        let mut skipped = 0;

        let columns: Vec<&[T]> = points.as_slice().chunks_exact(dimension.max(1)).collect();
        for i in 0..n_points {
            for j in (i + 1)..n_points {
                if unit_difference(columns[i], columns[j], config.degenerate_tolerance, &mut buffer) {
                    data.extend_from_slice(&buffer);
                } else {
                    match config.degenerate_policy {
                        DegeneratePolicy::Skip => skipped += 1,
                        DegeneratePolicy::Reject => {
                            return Err(SecantError::DegenerateSecant { first: i, second: j })
                        }
                    }
                }
            }
        }

        let stored = total - skipped;
        Ok(Self {
            storage: Storage::Precomputed {
                secants: DMatrix::from_vec(dimension, stored, data),
                weights: vec![1; stored],
            },
            dimension,
            skipped,
        })
    }

    fn lazy(points: DMatrix<T>, config: &SecantConfig<T>) -> SecantResult<Self> {
        let (dimension, n_points) = points.shape();
        let mut buffer = vec![T::zero(); dimension];
        let mut skipped = 0;
        {
            let columns: Vec<&[T]> = points.as_slice().chunks_exact(dimension.max(1)).collect();
            for i in 0..n_points {
                for j in (i + 1)..n_points {
                    if !unit_difference(columns[i], columns[j], config.degenerate_tolerance, &mut buffer) {
                        match config.degenerate_policy {
                            DegeneratePolicy::Skip => skipped += 1,
                            DegeneratePolicy::Reject => {
                                return Err(SecantError::DegenerateSecant { first: i, second: j })
                            }
                        }
                    }
                }
            }
        }
        Ok(Self {
            storage: Storage::Lazy {
                points,
                tolerance: config.degenerate_tolerance,
            },
            dimension,
            skipped,
        })
    }

    /// Builds a precomputed set from explicit columns and weights.
    ///
    /// Columns are normalized; zero columns and zero weights are rejected.
    pub fn from_columns(mut secants: DMatrix<T>, weights: Vec<usize>) -> SecantResult<Self> {
        if weights.len() != secants.ncols() {
            return Err(SecantError::dimension_mismatch(
                format!("{} weights", secants.ncols()),
                weights.len(),
            ));
        }
        if weights.contains(&0) {
            return Err(SecantError::invalid_parameter("secant weights must be positive"));
        }
        for (k, mut column) in secants.column_iter_mut().enumerate() {
            let norm = column.norm();
            if norm <= T::DEGENERATE_TOLERANCE || !<T as Float>::is_finite(norm) {
                return Err(SecantError::invalid_parameter(format!(
                    "secant column {} cannot be normalized (norm {})",
                    k, norm
                )));
            }
            column /= norm;
        }
        Ok(Self {
            dimension: secants.nrows(),
            storage: Storage::Precomputed { secants, weights },
            skipped: 0,
        })
    }

    /// Ambient dimension of the secants.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of secant slots.
    ///
    /// For a lazy set this is `N(N−1)/2` and includes skipped pairs; a
    /// precomputed set only stores the usable secants.
    pub fn count(&self) -> usize {
        match &self.storage {
            Storage::Lazy { points, .. } => pair_count(points.ncols()),
            Storage::Precomputed { secants, .. } => secants.ncols(),
        }
    }

    /// Number of coincident pairs left out at construction.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// True if no usable secant remains.
    pub fn is_empty(&self) -> bool {
        self.total_weight() == 0
    }

    /// True for the precomputed storage mode.
    pub fn is_precomputed(&self) -> bool {
        matches!(self.storage, Storage::Precomputed { .. })
    }

    /// Sum of the weights of all usable secants.
    pub fn total_weight(&self) -> usize {
        match &self.storage {
            Storage::Lazy { .. } => self.count() - self.skipped,
            Storage::Precomputed { weights, .. } => weights.iter().sum(),
        }
    }

    /// Weight of secant `k`; zero for skipped or out-of-range slots.
    pub fn weight(&self, k: usize) -> usize {
        match &self.storage {
            Storage::Lazy { .. } => usize::from(self.secant(k).is_some()),
            Storage::Precomputed { weights, .. } => weights.get(k).copied().unwrap_or(0),
        }
    }

    /// Secant `k`, or `None` if out of range or skipped.
    pub fn secant(&self, k: usize) -> Option<DVector<T>> {
        match &self.storage {
            Storage::Lazy { points, tolerance } => {
                let (i, j) = pair_from_index(points.ncols(), k)?;
                let n = self.dimension;
                let data = points.as_slice();
                let mut out = DVector::zeros(n);
                unit_difference(
                    &data[i * n..(i + 1) * n],
                    &data[j * n..(j + 1) * n],
                    *tolerance,
                    out.as_mut_slice(),
                )
                .then_some(out)
            }
            Storage::Precomputed { secants, .. } => {
                (k < secants.ncols()).then(|| secants.column(k).clone_owned())
            }
        }
    }

    /// The secant matrix of a precomputed set.
    pub fn matrix(&self) -> Option<&DMatrix<T>> {
        match &self.storage {
            Storage::Precomputed { secants, .. } => Some(secants),
            Storage::Lazy { .. } => None,
        }
    }

    /// The weights of a precomputed set.
    pub fn weights(&self) -> Option<&[usize]> {
        match &self.storage {
            Storage::Precomputed { weights, .. } => Some(weights),
            Storage::Lazy { .. } => None,
        }
    }

    /// Visits every usable secant with its weight, stopping at the first error.
    pub fn try_for_each<E, F>(&self, mut f: F) -> Result<(), E>
    where
        F: FnMut(&[T], usize) -> Result<(), E>,
    {
        let n = self.dimension;
        match &self.storage {
            Storage::Precomputed { secants, weights } => {
                if n == 0 {
                    return Ok(());
                }
                for (column, &weight) in secants.as_slice().chunks_exact(n).zip(weights) {
                    f(column, weight)?;
                }
            }
            Storage::Lazy { points, tolerance } => {
                if n == 0 {
                    return Ok(());
                }
                let columns: Vec<&[T]> = points.as_slice().chunks_exact(n).collect();
                let mut buffer = vec![T::zero(); n];
                for i in 0..columns.len() {
                    for j in (i + 1)..columns.len() {
                        if unit_difference(columns[i], columns[j], *tolerance, &mut buffer) {
                            f(&buffer, 1)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Visits every usable secant with its weight.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&[T], usize),
    {
        let visited = self.try_for_each(|s, w| {
            f(s, w);
            Ok::<(), Infallible>(())
        });
        match visited {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }

    /// Materializes the set; skipped pairs are dropped.
    pub fn to_precomputed(&self) -> Self {
        if self.is_precomputed() {
            return self.clone();
        }
        let mut data = Vec::with_capacity(self.total_weight() * self.dimension);
        self.for_each(|s, _| data.extend_from_slice(s));
        let stored = data.len() / self.dimension.max(1);
        Self {
            storage: Storage::Precomputed {
                secants: DMatrix::from_vec(self.dimension, stored, data),
                weights: vec![1; stored],
            },
            dimension: self.dimension,
            skipped: self.skipped,
        }
    }

    /// Projected lengths `‖Wᵀs‖` of the secants under `w`.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` if `w` does not have `dimension()` rows and
    /// `EmptySecantSet` if there is nothing to measure.
    pub fn analyse(&self, w: &DMatrix<T>) -> SecantResult<SecantStatistics<T>> {
        if w.nrows() != self.dimension {
            return Err(SecantError::dimension_mismatch(
                format!("{} rows", self.dimension),
                format!("{} rows", w.nrows()),
            ));
        }
        if self.is_empty() {
            return Err(SecantError::EmptySecantSet);
        }

        let mut count = 0;
        let mut total_weight = 0;
        let mut min = <T as Float>::infinity();
        let mut max = T::zero();
        let mut weighted_sum = T::zero();
        self.for_each(|s, weight| {
            let length = w.tr_mul(&DVectorView::from_slice(s, s.len())).norm();
            count += 1;
            total_weight += weight;
            min = <T as Float>::min(min, length);
            max = <T as Float>::max(max, length);
            weighted_sum += <T as Scalar>::from_usize(weight) * length;
        });

        Ok(SecantStatistics {
            count,
            total_weight,
            min,
            max,
            mean: weighted_sum / <T as Scalar>::from_usize(total_weight),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn line_points(n: usize) -> Vec<DVector<f64>> {
        (0..n)
            .map(|i| {
                let t = i as f64;
                DVector::from_vec(vec![t.cos(), t.sin(), 0.1 * t])
            })
            .collect()
    }

    #[test]
    fn test_pair_decode_small() {
        for n in 0..12 {
            let mut k = 0;
            for i in 0..n {
                for j in (i + 1)..n {
                    assert_eq!(pair_from_index(n, k), Some((i, j)));
                    assert_eq!(index_from_pair(n, i, j), Some(k));
                    k += 1;
                }
            }
            assert_eq!(k, pair_count(n));
            assert_eq!(pair_from_index(n, k), None);
        }
    }

    #[test]
    fn test_index_from_pair_rejects_bad_pairs() {
        assert_eq!(index_from_pair(5, 2, 2), None);
        assert_eq!(index_from_pair(5, 3, 1), None);
        assert_eq!(index_from_pair(5, 1, 5), None);
    }

    #[test]
    fn test_counts() {
        for n in 0..6 {
            let secants = Secants::compute_from_data(&line_points(n), &SecantConfig::default()).unwrap();
            assert_eq!(secants.count(), n * n.saturating_sub(1) / 2);
            let lazy = Secants::compute_from_data(&line_points(n), &SecantConfig::lazy()).unwrap();
            assert_eq!(lazy.count(), secants.count());
            assert_eq!(lazy.total_weight(), secants.total_weight());
        }
    }

    #[test]
    fn test_lazy_matches_precomputed() {
        let points = line_points(9);
        let precomputed = Secants::compute_from_data(&points, &SecantConfig::default()).unwrap();
        let lazy = Secants::compute_from_data(&points, &SecantConfig::lazy()).unwrap();
        assert!(!lazy.is_precomputed());
        for k in 0..precomputed.count() {
            let a = precomputed.secant(k).unwrap();
            let b = lazy.secant(k).unwrap();
            assert_relative_eq!(a, b, epsilon = 1e-15);
            assert_relative_eq!(a.norm(), 1.0, epsilon = 1e-14);
        }
        let materialized = lazy.to_precomputed();
        assert_eq!(materialized.matrix(), precomputed.matrix());
    }

    #[test]
    fn test_degenerate_skip() {
        let mut points = line_points(4);
        points.push(points[1].clone());
        let secants = Secants::compute_from_data(&points, &SecantConfig::default()).unwrap();
        assert_eq!(secants.skipped(), 1);
        assert_eq!(secants.count(), 9);
        assert_eq!(secants.total_weight(), 9);

        let lazy = Secants::compute_from_data(&points, &SecantConfig::lazy()).unwrap();
        assert_eq!(lazy.count(), 10);
        assert_eq!(lazy.total_weight(), 9);
        let k = index_from_pair(5, 1, 4).unwrap();
        assert!(lazy.secant(k).is_none());
        assert_eq!(lazy.weight(k), 0);
    }

    #[test]
    fn test_for_each_visits_usable_secants() {
        let mut points = line_points(5);
        points.push(points[2].clone());
        for config in [SecantConfig::default(), SecantConfig::lazy()] {
            let secants = Secants::compute_from_data(&points, &config).unwrap();
            let mut visits = 0;
            let mut weight = 0;
            secants.for_each(|s, w| {
                assert_relative_eq!(s.iter().map(|v| v * v).sum::<f64>(), 1.0, epsilon = 1e-14);
                visits += 1;
                weight += w;
            });
            assert_eq!(visits, 14);
            assert_eq!(weight, secants.total_weight());
        }
    }

    #[test]
    fn test_degenerate_reject() {
        let mut points = line_points(3);
        points.push(points[0].clone());
        let config = SecantConfig::default().with_degenerate_policy(DegeneratePolicy::Reject);
        let err = Secants::compute_from_data(&points, &config).unwrap_err();
        assert!(matches!(err, SecantError::DegenerateSecant { first: 0, second: 3 }));
        let err = Secants::compute_from_data(&points, &config.with_precompute(false)).unwrap_err();
        assert!(matches!(err, SecantError::DegenerateSecant { first: 0, second: 3 }));
    }

    #[test]
    fn test_ragged_points_rejected() {
        let points = vec![DVector::from_vec(vec![0.0, 1.0]), DVector::from_vec(vec![1.0])];
        assert!(Secants::compute_from_data(&points, &SecantConfig::default()).is_err());
    }

    #[test]
    fn test_from_columns() {
        let m = DMatrix::from_column_slice(2, 2, &[3.0, 4.0, 0.0, 2.0]);
        let secants = Secants::from_columns(m, vec![2, 1]).unwrap();
        assert_relative_eq!(secants.secant(0).unwrap()[0], 0.6);
        assert_eq!(secants.total_weight(), 3);

        let zero = DMatrix::from_column_slice(2, 1, &[0.0, 0.0]);
        assert!(Secants::from_columns(zero, vec![1]).is_err());
        let m = DMatrix::from_column_slice(2, 1, &[1.0, 0.0]);
        assert!(Secants::from_columns(m.clone(), vec![0]).is_err());
        assert!(Secants::from_columns(m, vec![1, 1]).is_err());
    }

    #[test]
    fn test_analyse() {
        // Secants along e₀, e₁ and (e₀ + e₁)/√2 seen through span{e₀}.
        let points = vec![
            DVector::from_vec(vec![0.0, 0.0]),
            DVector::from_vec(vec![1.0, 0.0]),
            DVector::from_vec(vec![1.0, 1.0]),
        ];
        let secants = Secants::compute_from_data(&points, &SecantConfig::default()).unwrap();
        let w = DMatrix::from_column_slice(2, 1, &[1.0, 0.0]);
        let stats = secants.analyse(&w).unwrap();
        assert_eq!(stats.count, 3);
        assert_relative_eq!(stats.min, 0.0);
        assert_relative_eq!(stats.max, 1.0);
        assert_relative_eq!(stats.mean, (1.0 + 0.0 + 0.5f64.sqrt()) / 3.0, epsilon = 1e-15);

        let bad = DMatrix::<f64>::identity(3, 1);
        assert!(secants.analyse(&bad).is_err());
        let empty = Secants::compute_from_data(&points[..1], &SecantConfig::default()).unwrap();
        assert!(matches!(empty.analyse(&w), Err(SecantError::EmptySecantSet)));
    }

    proptest! {
        #[test]
        fn prop_pair_decode_roundtrip(n in 2usize..200_000, fraction in 0.0f64..1.0) {
            let total = pair_count(n);
            let k = ((total as f64 * fraction) as usize).min(total - 1);
            let (i, j) = pair_from_index(n, k).unwrap();
            prop_assert!(i < j && j < n);
            prop_assert_eq!(index_from_pair(n, i, j), Some(k));
        }
    }
}
