//! # Grassmann Manifold Gr(k, n)
//!
//! The Grassmann manifold Gr(k, n) is the space of all k-dimensional linear
//! subspaces of ℝⁿ. A projection onto such a subspace is what the secant
//! optimizer searches for.
//!
//! ## Representation
//!
//! A point is stored as an `n × k` matrix `W` with orthonormal columns:
//! ```text
//! Gr(k, n) = {[W] : W ∈ ℝⁿˣᵏ, WᵀW = I_k}
//! ```
//! Two matrices represent the same point if `W₁ = W₂Q` for some `Q ∈ O(k)`.
//!
//! ## Horizontal and Vertical Spaces
//!
//! Every `n × k` matrix `V` splits into a horizontal part (the tangent
//! directions that actually move the subspace) and a vertical part (the
//! directions that only rotate the basis inside it):
//! ```text
//! horizontal(W, V) = V − W(WᵀV)
//! vertical(W, V)   = W(WᵀV)
//! ```
//!
//! ## Riemannian Metric
//!
//! The canonical metric is the Frobenius inner product `g(U, V) = tr(UᵀV)`.
//!
//! ## Geodesics
//!
//! For a horizontal `H = UΣVᵀ` (thin SVD) the geodesic from `W` is
//! ```text
//! γ(t) = W V cos(Σt) Vᵀ + U sin(Σt) Vᵀ
//! ```
//! and parallel transport of a horizontal `Y` along it is
//! ```text
//! τ_t(Y) = Y + (U cos(Σt) − W V sin(Σt) − U) Uᵀ Y
//! ```
//! See [`Geodesic`].
//!
//! ## Principal Angles and Distance
//!
//! The distance between subspaces is measured via principal angles θᵢ:
//! ```text
//! d([W₁], [W₂]) = ‖θ‖₂,   θᵢ = arccos(σᵢ(W₁ᵀW₂))
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use secantopt_manifolds::Grassmann;
//! use nalgebra::DMatrix;
//!
//! // 2-planes in ℝ⁵
//! let grassmann = Grassmann::<f64>::new(5, 2)?;
//! let w = grassmann.random_point();
//!
//! let v = DMatrix::from_fn(5, 2, |i, j| 0.1 * (i as f64 - j as f64));
//! let h = grassmann.horizontal_component(&w, &v)?;
//!
//! // Horizontality: Wᵀ H = 0
//! assert!(w.tr_mul(&h).norm() < 1e-12);
//! # Ok::<(), secantopt_core::error::ManifoldError>(())
//! ```

use crate::utils::{clamped_acos, orthonormality_error, scale_columns};
use nalgebra::{DMatrix, DVector};
use num_traits::Float;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use secantopt_core::{
    error::{ManifoldError, Result},
    types::Scalar,
};
use std::fmt::{self, Debug};
use tracing::debug;

/// The Grassmann manifold Gr(k, n) of k-dimensional subspaces in ℝⁿ.
///
/// # Invariants
///
/// - `1 ≤ k ≤ n`
/// - Points are `n × k` matrices with orthonormal columns
#[derive(Clone)]
pub struct Grassmann<T = f64> {
    /// Ambient dimension n
    n: usize,
    /// Subspace dimension k
    k: usize,
    /// Numerical tolerance for validations
    tolerance: T,
}

impl<T: Scalar> Debug for Grassmann<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Grassmann Gr({}, {})", self.k, self.n)
    }
}

impl<T: Scalar> Grassmann<T> {
    /// Creates a new Grassmann manifold Gr(k, n).
    ///
    /// # Errors
    ///
    /// Returns `ManifoldError::InvalidParameter` if `k = 0` or `k > n`.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use secantopt_manifolds::Grassmann;
    /// let planes = Grassmann::<f64>::new(5, 2)?;
    /// assert_eq!(planes.dimension(), 6);
    ///
    /// // k = n is the single point {ℝⁿ}
    /// let whole = Grassmann::<f64>::new(3, 3)?;
    /// assert_eq!(whole.dimension(), 0);
    /// # Ok::<(), secantopt_core::error::ManifoldError>(())
    /// ```
    pub fn new(n: usize, k: usize) -> Result<Self> {
        Self::with_tolerance(n, k, T::MANIFOLD_TOLERANCE)
    }

    /// Creates a Grassmann manifold with custom numerical tolerance.
    pub fn with_tolerance(n: usize, k: usize, tolerance: T) -> Result<Self> {
        if k == 0 {
            return Err(ManifoldError::invalid_parameter(
                "Grassmann manifold requires k > 0",
            ));
        }
        if k > n {
            return Err(ManifoldError::invalid_parameter(format!(
                "Grassmann manifold Gr(k, n) requires k ≤ n, got n={}, k={}",
                n, k
            )));
        }
        if tolerance <= T::zero() || tolerance >= T::one() {
            return Err(ManifoldError::invalid_parameter(
                "Tolerance must be in (0, 1)",
            ));
        }
        Ok(Self { n, k, tolerance })
    }

    /// Returns the ambient dimension n.
    #[inline]
    pub fn ambient_dim(&self) -> usize {
        self.n
    }

    /// Returns the subspace dimension k.
    #[inline]
    pub fn subspace_dim(&self) -> usize {
        self.k
    }

    /// Intrinsic dimension k(n − k).
    #[inline]
    pub fn dimension(&self) -> usize {
        self.k * (self.n - self.k)
    }

    /// Validation tolerance.
    #[inline]
    pub fn tolerance(&self) -> T {
        self.tolerance
    }

    fn check_shape(&self, m: &DMatrix<T>) -> Result<()> {
        if m.nrows() != self.n || m.ncols() != self.k {
            return Err(ManifoldError::dimension_mismatch(
                format!("{}×{}", self.n, self.k),
                format!("{}×{}", m.nrows(), m.ncols()),
            ));
        }
        Ok(())
    }

    /// Validates that a matrix represents a point on Grassmann.
    ///
    /// # Errors
    ///
    /// - `DimensionMismatch`: If the matrix is not `n × k`
    /// - `InvalidPoint`: If ‖WᵀW − I_k‖ > tolerance
    pub fn check_point(&self, w: &DMatrix<T>) -> Result<()> {
        self.check_shape(w)?;

        let constraint_error = orthonormality_error(w);
        if constraint_error > self.tolerance {
            return Err(ManifoldError::invalid_point(format!(
                "Orthonormality violated: ‖WᵀW − I‖ = {} (tolerance: {})",
                constraint_error, self.tolerance
            )));
        }
        Ok(())
    }

    /// Validates that a matrix lies in the horizontal space at W.
    ///
    /// # Errors
    ///
    /// - `DimensionMismatch`: If dimensions don't match
    /// - `InvalidPoint`: If W is not on Grassmann
    /// - `InvalidTangent`: If ‖WᵀV‖ > tolerance
    pub fn check_tangent(&self, w: &DMatrix<T>, v: &DMatrix<T>) -> Result<()> {
        self.check_point(w)?;
        self.check_shape(v)?;

        let horizontal_error = w.tr_mul(v).norm();
        if horizontal_error > self.tolerance {
            return Err(ManifoldError::invalid_tangent(format!(
                "Horizontality violated: ‖WᵀV‖ = {} (tolerance: {})",
                horizontal_error, self.tolerance
            )));
        }
        Ok(())
    }

    /// True if `w` has orthonormal columns within `tol`.
    pub fn is_point_on_manifold(&self, w: &DMatrix<T>, tol: T) -> bool {
        w.nrows() == self.n && w.ncols() == self.k && orthonormality_error(w) <= tol
    }

    /// Horizontal component `V − W(WᵀV)`.
    pub fn horizontal_component(&self, w: &DMatrix<T>, v: &DMatrix<T>) -> Result<DMatrix<T>> {
        self.check_shape(w)?;
        self.check_shape(v)?;
        let wtv = w.tr_mul(v);
        let mut h = v.clone();
        h.gemm(-T::one(), w, &wtv, T::one());
        Ok(h)
    }

    /// Vertical component `W(WᵀV)`.
    pub fn vertical_component(&self, w: &DMatrix<T>, v: &DMatrix<T>) -> Result<DMatrix<T>> {
        self.check_shape(w)?;
        self.check_shape(v)?;
        Ok(w * w.tr_mul(v))
    }

    /// Canonical metric `tr(UᵀV)`.
    pub fn inner_product(&self, w: &DMatrix<T>, u: &DMatrix<T>, v: &DMatrix<T>) -> Result<T> {
        self.check_shape(w)?;
        self.check_shape(u)?;
        self.check_shape(v)?;
        Ok(u.dot(v))
    }

    /// Norm induced by the canonical metric.
    pub fn norm(&self, w: &DMatrix<T>, v: &DMatrix<T>) -> Result<T> {
        self.inner_product(w, v, v).map(<T as Float>::sqrt)
    }

    /// Riemannian gradient: the horizontal component of the Euclidean gradient.
    pub fn euclidean_to_riemannian_gradient(
        &self,
        w: &DMatrix<T>,
        euclidean_grad: &DMatrix<T>,
    ) -> Result<DMatrix<T>> {
        self.horizontal_component(w, euclidean_grad)
    }

    /// Projects an `n × k` matrix onto the manifold via thin QR.
    ///
    /// Column signs follow the diagonal of R so that a matrix already close
    /// to orthonormal is moved as little as possible.
    ///
    /// # Errors
    ///
    /// Returns `ManifoldError::NumericalError` if the matrix is rank deficient.
    pub fn project_point(&self, point: &DMatrix<T>) -> Result<DMatrix<T>> {
        self.check_shape(point)?;

        let qr = point.clone().qr();
        let r = qr.r();
        let mut q = qr.q();
        let scale = <T as Float>::max(point.norm(), T::one());
        for j in 0..self.k {
            let rjj = r[(j, j)];
            if <T as Float>::abs(rjj) <= T::EPSILON * scale {
                return Err(ManifoldError::numerical_error(format!(
                    "cannot orthonormalize a rank-deficient matrix (column {})",
                    j
                )));
            }
            if rjj < T::zero() {
                q.column_mut(j).neg_mut();
            }
        }
        Ok(q)
    }

    /// Re-orthonormalizes `w` only if it drifted beyond the tolerance.
    pub fn ensure_orthonormal(&self, w: DMatrix<T>) -> Result<DMatrix<T>> {
        let drift = orthonormality_error(&w);
        if drift > self.tolerance {
            debug!(drift = Scalar::to_f64(drift), "re-orthonormalizing projection");
            return self.project_point(&w);
        }
        Ok(w)
    }

    /// Principal angles between two subspaces, ascending.
    pub fn principal_angles(&self, w1: &DMatrix<T>, w2: &DMatrix<T>) -> Result<DVector<T>> {
        self.check_point(w1)?;
        self.check_point(w2)?;

        let cosines = w1.tr_mul(w2).singular_values();
        let mut angles: Vec<T> = cosines.iter().map(|&c| clamped_acos(c)).collect();
        angles.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        Ok(DVector::from_vec(angles))
    }

    /// Geodesic distance ‖θ‖₂.
    pub fn distance(&self, w1: &DMatrix<T>, w2: &DMatrix<T>) -> Result<T> {
        Ok(self.principal_angles(w1, w2)?.norm())
    }

    /// Random point drawn from the uniform distribution on Gr(k, n).
    pub fn random_point(&self) -> DMatrix<T> {
        self.random_point_with(&mut rand::thread_rng())
    }

    /// Random point from a caller-supplied generator.
    pub fn random_point_with<R: Rng + ?Sized>(&self, rng: &mut R) -> DMatrix<T> {
        loop {
            let a = gaussian_matrix(self.n, self.k, rng);
            // A Gaussian matrix is full rank with probability one.
            if let Ok(q) = self.project_point(&a) {
                return q;
            }
        }
    }

    /// Random unit horizontal vector at `w`.
    pub fn random_tangent(&self, w: &DMatrix<T>) -> Result<DMatrix<T>> {
        self.random_tangent_with(w, &mut rand::thread_rng())
    }

    /// Random unit horizontal vector at `w` from a caller-supplied generator.
    pub fn random_tangent_with<R: Rng + ?Sized>(
        &self,
        w: &DMatrix<T>,
        rng: &mut R,
    ) -> Result<DMatrix<T>> {
        self.check_point(w)?;

        let z = gaussian_matrix(self.n, self.k, rng);
        let mut h = self.horizontal_component(w, &z)?;
        let norm = h.norm();
        if norm > T::EPSILON {
            h /= norm;
        }
        Ok(h)
    }
}

fn gaussian_matrix<T: Scalar, R: Rng + ?Sized>(n: usize, k: usize, rng: &mut R) -> DMatrix<T> {
    DMatrix::from_fn(n, k, |_, _| {
        let x: f64 = StandardNormal.sample(rng);
        <T as Scalar>::from_f64(x)
    })
}

/// Closed-form geodesic on Gr(k, n).
///
/// Built from a base point `W` and a horizontal velocity `H`; the thin SVD
/// `H = UΣVᵀ` is computed once so that evaluating the curve and transporting
/// vectors along it are cheap matrix products.
#[derive(Debug, Clone)]
pub struct Geodesic<T: Scalar> {
    base: DMatrix<T>,
    velocity: DMatrix<T>,
    u: DMatrix<T>,
    sigma: DVector<T>,
    v: DMatrix<T>,
    /// Cached W·V
    wv: DMatrix<T>,
}

impl<T: Scalar> Geodesic<T> {
    /// Creates the geodesic through `w` with initial velocity `h`.
    ///
    /// `w` must have orthonormal columns and `h` must be horizontal at `w`;
    /// only the shapes are validated here.
    pub fn new(w: &DMatrix<T>, h: &DMatrix<T>) -> Result<Self> {
        let (u, sigma, v) = thin_svd(w, h)?;
        let wv = w * &v;
        Ok(Self {
            base: w.clone(),
            velocity: h.clone(),
            u,
            sigma,
            v,
            wv,
        })
    }

    /// Replaces base point and velocity.
    pub fn set(&mut self, w: &DMatrix<T>, h: &DMatrix<T>) -> Result<()> {
        *self = Self::new(w, h)?;
        Ok(())
    }

    /// Base point `γ(0)`.
    pub fn base_point(&self) -> &DMatrix<T> {
        &self.base
    }

    /// Initial velocity `γ'(0)`.
    pub fn velocity(&self) -> &DMatrix<T> {
        &self.velocity
    }

    /// Singular values of the velocity.
    pub fn singular_values(&self) -> &DVector<T> {
        &self.sigma
    }

    /// Point `γ(t) = W V cos(Σt) Vᵀ + U sin(Σt) Vᵀ`.
    ///
    /// `at(0)` returns the base point exactly.
    pub fn at(&self, t: T) -> DMatrix<T> {
        if t == T::zero() {
            return self.base.clone();
        }
        let sigma_t = &self.sigma * t;
        let cos_part = scale_columns(&self.wv, &sigma_t, <T as Float>::cos);
        let sin_part = scale_columns(&self.u, &sigma_t, <T as Float>::sin);
        (cos_part + sin_part) * self.v.transpose()
    }

    /// Parallel transport of `y` from `γ(0)` to `γ(t)`.
    ///
    /// `τ_t(Y) = Y + (U cos(Σt) − W V sin(Σt) − U) Uᵀ Y`; `t = 0` returns `y`.
    pub fn parallel_translate(&self, y: &DMatrix<T>, t: T) -> Result<DMatrix<T>> {
        if y.shape() != self.base.shape() {
            return Err(ManifoldError::dimension_mismatch(
                format!("{}×{}", self.base.nrows(), self.base.ncols()),
                format!("{}×{}", y.nrows(), y.ncols()),
            ));
        }
        if t == T::zero() {
            return Ok(y.clone());
        }
        let sigma_t = &self.sigma * t;
        let cos_part = scale_columns(&self.u, &sigma_t, <T as Float>::cos);
        let sin_part = scale_columns(&self.wv, &sigma_t, <T as Float>::sin);
        let m = cos_part - sin_part - &self.u;
        let uty = self.u.tr_mul(y);
        let mut transported = y.clone();
        transported.gemm(T::one(), &m, &uty, T::one());
        Ok(transported)
    }

    /// Velocity `γ'(t)`, i.e. the velocity transported to `γ(t)`.
    pub fn velocity_at(&self, t: T) -> Result<DMatrix<T>> {
        self.parallel_translate(&self.velocity, t)
    }
}

fn thin_svd<T: Scalar>(
    w: &DMatrix<T>,
    h: &DMatrix<T>,
) -> Result<(DMatrix<T>, DVector<T>, DMatrix<T>)> {
    if w.shape() != h.shape() {
        return Err(ManifoldError::dimension_mismatch(
            format!("{}×{}", w.nrows(), w.ncols()),
            format!("{}×{}", h.nrows(), h.ncols()),
        ));
    }
    if w.ncols() == 0 || w.ncols() > w.nrows() {
        return Err(ManifoldError::invalid_parameter(format!(
            "geodesic base must be n×k with 0 < k ≤ n, got {}×{}",
            w.nrows(),
            w.ncols()
        )));
    }
    if h.iter().any(|x| !<T as Float>::is_finite(*x)) {
        return Err(ManifoldError::numerical_error(
            "geodesic velocity has non-finite entries",
        ));
    }

    let svd = h.clone().svd(true, true);
    match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => Ok((u, svd.singular_values, v_t.transpose())),
        _ => Err(ManifoldError::numerical_error(
            "SVD computation failed for geodesic velocity",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup(n: usize, k: usize, seed: u64) -> (Grassmann<f64>, DMatrix<f64>, DMatrix<f64>) {
        let gr = Grassmann::<f64>::new(n, k).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let w = gr.random_point_with(&mut rng);
        let h = gr.random_tangent_with(&w, &mut rng).unwrap() * 0.7;
        (gr, w, h)
    }

    #[test]
    fn test_grassmann_creation() {
        let gr = Grassmann::<f64>::new(5, 2).unwrap();
        assert_eq!(gr.ambient_dim(), 5);
        assert_eq!(gr.subspace_dim(), 2);
        assert_eq!(gr.dimension(), 6);

        assert!(Grassmann::<f64>::new(5, 0).is_err());
        assert!(Grassmann::<f64>::new(3, 4).is_err());
        assert!(Grassmann::<f64>::with_tolerance(3, 2, 2.0).is_err());
    }

    #[test]
    fn test_point_validation() {
        let gr = Grassmann::<f64>::new(4, 2).unwrap();
        let w = DMatrix::<f64>::identity(4, 2);
        assert!(gr.check_point(&w).is_ok());
        assert!(gr.check_point(&(w.clone() * 2.0)).is_err());
        assert!(matches!(
            gr.check_point(&DMatrix::<f64>::identity(3, 2)),
            Err(ManifoldError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_horizontal_vertical_split() {
        let (gr, w, _) = setup(6, 3, 1);
        let v = DMatrix::from_fn(6, 3, |i, j| (i as f64 + 1.0) * 0.3 - j as f64);

        let h = gr.horizontal_component(&w, &v).unwrap();
        let vert = gr.vertical_component(&w, &v).unwrap();

        assert_relative_eq!(&h + &vert, v, epsilon = 1e-12);
        assert!(w.tr_mul(&h).norm() < 1e-12);
        assert!(gr.check_tangent(&w, &h).is_ok());
    }

    #[test]
    fn test_inner_product_is_frobenius() {
        let gr = Grassmann::<f64>::new(3, 1).unwrap();
        let w = DMatrix::from_column_slice(3, 1, &[1.0, 0.0, 0.0]);
        let u = DMatrix::from_column_slice(3, 1, &[0.0, 1.0, 2.0]);
        let v = DMatrix::from_column_slice(3, 1, &[0.0, 3.0, -1.0]);
        assert_relative_eq!(gr.inner_product(&w, &u, &v).unwrap(), 1.0);
        assert_relative_eq!(gr.norm(&w, &u).unwrap(), 5.0_f64.sqrt());
    }

    #[test]
    fn test_project_point_sign_fix() {
        let gr = Grassmann::<f64>::new(3, 2).unwrap();
        let w = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        let q = gr.project_point(&(w.clone() * 3.0)).unwrap();
        assert_relative_eq!(q, w, epsilon = 1e-12);

        let rank_deficient = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
        assert!(gr.project_point(&rank_deficient).is_err());
    }

    #[test]
    fn test_geodesic_at_zero_is_exact() {
        let (_, w, h) = setup(5, 2, 2);
        let geo = Geodesic::new(&w, &h).unwrap();
        assert_eq!(geo.at(0.0), w);
        assert_eq!(geo.parallel_translate(&h, 0.0).unwrap(), h);
        assert_eq!(geo.velocity(), &h);
    }

    #[test]
    fn test_geodesic_stays_on_manifold() {
        let (gr, w, h) = setup(7, 3, 3);
        let geo = Geodesic::new(&w, &h).unwrap();
        for &t in &[0.1, 0.5, 1.0, 3.0, 10.0] {
            let wt = geo.at(t);
            assert!(gr.is_point_on_manifold(&wt, 1e-10), "drift at t = {}", t);
        }
    }

    #[test]
    fn test_geodesic_derivative_matches_transport() {
        let (_, w, h) = setup(6, 2, 4);
        let geo = Geodesic::new(&w, &h).unwrap();
        let t = 0.4;
        let eps = 1e-6;
        let fd = (geo.at(t + eps) - geo.at(t - eps)) / (2.0 * eps);
        let velocity = geo.velocity_at(t).unwrap();
        assert_relative_eq!(fd, velocity, epsilon = 1e-7);
    }

    #[test]
    fn test_transport_preserves_inner_products() {
        let (gr, w, h) = setup(6, 2, 5);
        let mut rng = StdRng::seed_from_u64(50);
        let y = gr.random_tangent_with(&w, &mut rng).unwrap();
        let z = gr.random_tangent_with(&w, &mut rng).unwrap();
        let geo = Geodesic::new(&w, &h).unwrap();

        let t = 0.8;
        let wt = geo.at(t);
        let ty = geo.parallel_translate(&y, t).unwrap();
        let tz = geo.parallel_translate(&z, t).unwrap();

        assert_relative_eq!(ty.dot(&tz), y.dot(&z), epsilon = 1e-10);
        // Transported vectors stay horizontal.
        assert!(wt.tr_mul(&ty).norm() < 1e-10);
    }

    #[test]
    fn test_geodesic_distance_matches_length() {
        // For a short geodesic the distance equals ‖H‖·t.
        let (gr, w, h) = setup(5, 2, 6);
        let geo = Geodesic::new(&w, &h).unwrap();
        let t = 0.5;
        let d = gr.distance(&w, &geo.at(t)).unwrap();
        assert_relative_eq!(d, h.norm() * t, epsilon = 1e-8);
    }

    #[test]
    fn test_principal_angles_orthogonal_planes() {
        let gr = Grassmann::<f64>::new(4, 2).unwrap();
        let w1 = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        let w2 = DMatrix::from_row_slice(4, 2, &[0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        let angles = gr.principal_angles(&w1, &w2).unwrap();
        for &a in angles.iter() {
            assert_relative_eq!(a, std::f64::consts::FRAC_PI_2, epsilon = 1e-12);
        }
        assert_relative_eq!(gr.distance(&w1, &w1).unwrap(), 0.0, epsilon = 1e-7);
    }

    #[test]
    fn test_geodesic_rejects_bad_shapes() {
        let w = DMatrix::<f64>::identity(4, 2);
        assert!(Geodesic::new(&w, &DMatrix::zeros(4, 3)).is_err());
        let geo = Geodesic::new(&w, &DMatrix::zeros(4, 2)).unwrap();
        assert!(geo.parallel_translate(&DMatrix::zeros(3, 2), 1.0).is_err());
        // Zero velocity is a constant curve.
        assert_relative_eq!(geo.at(2.0), w, epsilon = 1e-15);
    }

    #[test]
    fn test_ensure_orthonormal() {
        let gr = Grassmann::<f64>::new(3, 1).unwrap();
        let drifted = DMatrix::from_column_slice(3, 1, &[1.0 + 1e-6, 0.0, 0.0]);
        let fixed = gr.ensure_orthonormal(drifted).unwrap();
        assert_relative_eq!(fixed.norm(), 1.0, epsilon = 1e-15);

        let exact = DMatrix::<f64>::identity(3, 1);
        assert_eq!(gr.ensure_orthonormal(exact.clone()).unwrap(), exact);
    }
}
