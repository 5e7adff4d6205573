//! Greedy culling of near-parallel secants.
//!
//! Secants that point in (almost) the same direction, up to sign, carry the
//! same information for the projection cost. Culling keeps one
//! representative per group and gives it the weight of everything it
//! absorbed, so the weighted cost of the culled set approximates the cost of
//! the full set at a fraction of the evaluation price.
//!
//! The pass is greedy: secants are visited in index order and each survivor
//! absorbs every later, not yet absorbed secant within the angular
//! tolerance. The result depends on that order; it is always run
//! sequentially so it is reproducible.

use nalgebra::DMatrix;
use num_traits::Float;
use secantopt_core::types::Scalar;
use tracing::info;

use crate::error::{SecantError, SecantResult};
use crate::secants::{Secants, Storage};

impl<T: Scalar> Secants<T> {
    /// Merges secants whose absolute cosine is at least `cos_tolerance`.
    ///
    /// `cos_tolerance = 1` only merges exactly parallel secants and `0`
    /// merges everything into the first secant. Weights are summed, so the
    /// total weight is preserved. Returns a new precomputed set.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `cos_tolerance` is not in `[0, 1]`.
    pub fn cull(&self, cos_tolerance: T) -> SecantResult<Self> {
        if !(cos_tolerance >= T::zero() && cos_tolerance <= T::one()) {
            return Err(SecantError::invalid_parameter(format!(
                "cosine tolerance must lie in [0, 1], got {}",
                cos_tolerance
            )));
        }

        let full = self.to_precomputed();
        let (secants, weights) = match &full.storage {
            Storage::Precomputed { secants, weights } => (secants, weights),
            Storage::Lazy { .. } => {
                return Err(SecantError::invalid_parameter(
                    "culling needs a precomputed secant set",
                ))
            }
        };
        let n = full.dimension();
        let count = secants.ncols();
        if count == 0 || n == 0 {
            return Ok(full);
        }

        let columns: Vec<&[T]> = secants.as_slice().chunks_exact(n).collect();
        let mut merged_weights = weights.clone();
        let mut alive = vec![true; count];

        for i in 0..count {
            if !alive[i] {
                continue;
            }
            for j in (i + 1)..count {
                if !alive[j] {
                    continue;
                }
                let dot = columns[i]
                    .iter()
                    .zip(columns[j])
                    .fold(T::zero(), |acc, (&a, &b)| acc + a * b);
                if <T as Float>::abs(dot) >= cos_tolerance {
                    merged_weights[i] += merged_weights[j];
                    alive[j] = false;
                }
            }
        }

        let survivors: Vec<usize> = (0..count).filter(|&k| alive[k]).collect();
        let kept_weights: Vec<usize> = survivors.iter().map(|&k| merged_weights[k]).collect();
        let culled: DMatrix<T> = secants.select_columns(survivors.iter());

        info!(
            before = count,
            after = survivors.len(),
            cos_tolerance = %cos_tolerance,
            "Culled secant set"
        );

        let mut result = Self::from_columns(culled, kept_weights)?;
        result.skipped = full.skipped();
        Ok(result)
    }

    /// [`cull`](Self::cull) with an angular tolerance in degrees, in `[0, 90]`.
    pub fn cull_degrees(&self, angle: T) -> SecantResult<Self> {
        let ninety = <T as Scalar>::from_f64(90.0);
        if !(angle >= T::zero() && angle <= ninety) {
            return Err(SecantError::invalid_parameter(format!(
                "angular tolerance must lie in [0, 90] degrees, got {}",
                angle
            )));
        }
        // cos(90°) is not exactly zero in floating point.
        let cos_tolerance = if angle == ninety {
            T::zero()
        } else {
            <T as Float>::cos(angle * <T as Scalar>::from_f64(std::f64::consts::PI / 180.0))
        };
        self.cull(cos_tolerance)
    }
}
