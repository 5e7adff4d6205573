//! Small matrix helpers shared by the Grassmann routines.

use nalgebra::{DMatrix, DVector};
use num_traits::Float;
use secantopt_core::types::Scalar;

/// Returns a copy of `matrix` whose `j`-th column is multiplied by `f(σ_j)`.
#[inline]
pub fn scale_columns<T, F>(matrix: &DMatrix<T>, sigma: &DVector<T>, f: F) -> DMatrix<T>
where
    T: Scalar,
    F: Fn(T) -> T,
{
    debug_assert_eq!(matrix.ncols(), sigma.len(), "one factor per column");
    let mut scaled = matrix.clone();
    for (mut column, &s) in scaled.column_iter_mut().zip(sigma.iter()) {
        column *= f(s);
    }
    scaled
}

/// Frobenius norm of `WᵀW − I`.
#[inline]
pub fn orthonormality_error<T: Scalar>(w: &DMatrix<T>) -> T {
    let gram = w.tr_mul(w);
    let identity = DMatrix::<T>::identity(w.ncols(), w.ncols());
    (gram - identity).norm()
}

/// Clamps a cosine into `[-1, 1]` before taking `acos`.
#[inline]
pub fn clamped_acos<T: Scalar>(c: T) -> T {
    let clamped = <T as Float>::max(<T as Float>::min(c, T::one()), -T::one());
    <T as Float>::acos(clamped)
}
