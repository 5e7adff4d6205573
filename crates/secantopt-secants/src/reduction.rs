//! Projection of samples, vector fields and Jacobians onto a subspace.
//!
//! The full model is only seen through [`VectorField`] and [`Jacobian`].
//! Given a projection `W`, a sample `x` becomes `Wᵀx`, the vector field at
//! `x` becomes `Wᵀf(x)` and its Jacobian becomes `WᵀJ(x)W`. The reduced
//! triples are the training data for a surrogate model of the dynamics.
//!
//! [`TrajectoryComparison`] measures how far a reduced trajectory drifts from
//! the projection of the full one.

use std::io::Write;

use nalgebra::{DMatrix, DVector};
use num_traits::Float;
use secantopt_core::types::Scalar;

use crate::dataset::PointCloud;
use crate::error::{SecantError, SecantResult};

/// A vector field `f: Rⁿ → Rⁿ`.
pub trait VectorField<T: Scalar> {
    /// Dimension `n` of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates `f(x)`.
    fn evaluate(&self, x: &DVector<T>) -> DVector<T>;
}

/// The derivative of a vector field.
pub trait Jacobian<T: Scalar>: VectorField<T> {
    /// Evaluates the `n × n` Jacobian `∂f/∂x` at `x`.
    fn jacobian(&self, x: &DVector<T>) -> DMatrix<T>;
}

/// Samples and model derivatives expressed in reduced coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedData<T: Scalar> {
    /// `Wᵀx` for every sample
    pub points: Vec<DVector<T>>,
    /// `Wᵀf(x)` for every sample
    pub vector_field: Vec<DVector<T>>,
    /// `WᵀJ(x)W` for every sample, when requested
    pub jacobians: Option<Vec<DMatrix<T>>>,
    /// Parameter tag of the source data
    pub parameter: T,
}

fn check_dimensions<T, F, P>(field: &F, data: &P, w: &DMatrix<T>) -> SecantResult<()>
where
    T: Scalar,
    F: VectorField<T> + ?Sized,
    P: PointCloud<T> + ?Sized,
{
    if field.dimension() != w.nrows() {
        return Err(SecantError::dimension_mismatch(
            format!("vector field of dimension {}", w.nrows()),
            field.dimension(),
        ));
    }
    if data.dimension() != w.nrows() {
        return Err(SecantError::dimension_mismatch(
            format!("samples of dimension {}", w.nrows()),
            data.dimension(),
        ));
    }
    Ok(())
}

impl<T: Scalar> ReducedData<T> {
    /// Projects the samples and the vector field through `w`.
    pub fn compute<F, P>(field: &F, data: &P, w: &DMatrix<T>) -> SecantResult<Self>
    where
        F: VectorField<T> + ?Sized,
        P: PointCloud<T> + ?Sized,
    {
        check_dimensions(field, data, w)?;
        let (points, vector_field) = data
            .points()
            .iter()
            .map(|x| (w.tr_mul(x), w.tr_mul(&field.evaluate(x))))
            .unzip();
        Ok(Self {
            points,
            vector_field,
            jacobians: None,
            parameter: data.parameter(),
        })
    }

    /// Like [`compute`](Self::compute), also projecting the Jacobians.
    pub fn compute_with_jacobians<F, P>(field: &F, data: &P, w: &DMatrix<T>) -> SecantResult<Self>
    where
        F: Jacobian<T> + ?Sized,
        P: PointCloud<T> + ?Sized,
    {
        let mut reduced = Self::compute(field, data, w)?;
        let jacobians = data
            .points()
            .iter()
            .map(|x| w.tr_mul(&field.jacobian(x)) * w)
            .collect();
        reduced.jacobians = Some(jacobians);
        Ok(reduced)
    }

    /// Number of reduced samples.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Distance between a reduced trajectory and a reference trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryComparison<T: Scalar> {
    /// Parameter value of the trajectories
    pub parameter: T,
    /// `‖r_i − q_i‖` over the common prefix
    pub differences: Vec<T>,
    /// Root mean square of `differences`
    pub rms: T,
    /// Largest entry of `differences`
    pub max: T,
    /// Largest distance from a reduced point to its nearest reference point
    pub max_of_min: T,
}

impl<T: Scalar> TrajectoryComparison<T> {
    /// Compares two trajectories sample by sample.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for an empty trajectory and `DimensionMismatch`
    /// for vectors of different lengths.
    pub fn compute(reduced: &[DVector<T>], reference: &[DVector<T>], parameter: T) -> SecantResult<Self> {
        if reduced.is_empty() || reference.is_empty() {
            return Err(SecantError::invalid_parameter("cannot compare empty trajectories"));
        }
        let dimension = reference[0].len();
        if let Some(bad) = reduced.iter().chain(reference).find(|p| p.len() != dimension) {
            return Err(SecantError::dimension_mismatch(dimension, bad.len()));
        }

        let differences: Vec<T> = reduced
            .iter()
            .zip(reference)
            .map(|(r, q)| (r - q).norm())
            .collect();
        let sum_sq = differences.iter().fold(T::zero(), |acc, &d| acc + d * d);
        let rms = <T as Float>::sqrt(sum_sq / <T as Scalar>::from_usize(differences.len()));
        let max = differences
            .iter()
            .fold(T::zero(), |acc, &d| <T as Float>::max(acc, d));

        let max_of_min = reduced
            .iter()
            .map(|r| {
                reference
                    .iter()
                    .map(|q| (r - q).norm())
                    .fold(<T as Float>::infinity(), <T as Float>::min)
            })
            .fold(T::zero(), <T as Float>::max);

        Ok(Self {
            parameter,
            differences,
            rms,
            max,
            max_of_min,
        })
    }
}

/// Writes one CSV line per comparison: `parameter,rms,max,max_of_min,d_0,d_1,...,`.
pub fn write_comparisons_csv<T: Scalar, W: Write>(
    rows: &[TrajectoryComparison<T>],
    mut writer: W,
) -> SecantResult<()> {
    for row in rows {
        write!(
            writer,
            "{},{},{},{},",
            Scalar::to_f64(row.parameter),
            Scalar::to_f64(row.rms),
            Scalar::to_f64(row.max),
            Scalar::to_f64(row.max_of_min)
        )?;
        for d in &row.differences {
            write!(writer, "{},", Scalar::to_f64(*d))?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DataSet;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    /// Linear field `f(x) = A x`.
    struct Linear(DMatrix<f64>);

    impl VectorField<f64> for Linear {
        fn dimension(&self) -> usize {
            self.0.nrows()
        }

        fn evaluate(&self, x: &DVector<f64>) -> DVector<f64> {
            &self.0 * x
        }
    }

    impl Jacobian<f64> for Linear {
        fn jacobian(&self, _x: &DVector<f64>) -> DMatrix<f64> {
            self.0.clone()
        }
    }

    fn data() -> DataSet<f64> {
        DataSet::from_points(
            vec![
                DVector::from_vec(vec![1.0, 2.0, 3.0]),
                DVector::from_vec(vec![-1.0, 0.5, 0.0]),
            ],
            0.25,
        )
        .unwrap()
    }

    #[test]
    fn test_reduced_data() {
        let a = DMatrix::from_row_slice(3, 3, &[1.0, 2.0, 0.0, 0.0, 3.0, 0.0, 4.0, 0.0, 5.0]);
        let field = Linear(a);
        let w = DMatrix::<f64>::identity(3, 2);
        let reduced = ReducedData::compute_with_jacobians(&field, &data(), &w).unwrap();

        assert_eq!(reduced.len(), 2);
        assert_eq!(reduced.parameter, 0.25);
        assert_eq!(reduced.points[0], DVector::from_vec(vec![1.0, 2.0]));
        assert_eq!(reduced.vector_field[0], DVector::from_vec(vec![5.0, 6.0]));
        let jacobians = reduced.jacobians.unwrap();
        assert_eq!(jacobians[1], DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 0.0, 3.0]));
    }

    #[test]
    fn test_reduced_data_dimension_check() {
        let field = Linear(DMatrix::identity(4, 4));
        let w = DMatrix::<f64>::identity(3, 2);
        assert!(ReducedData::compute(&field, &data(), &w).is_err());
    }

    #[test]
    fn test_trajectory_comparison() {
        let reduced = vec![DVector::from_vec(vec![0.0]), DVector::from_vec(vec![1.0]), DVector::from_vec(vec![5.0])];
        let reference = vec![DVector::from_vec(vec![0.0]), DVector::from_vec(vec![2.0])];
        let cmp = TrajectoryComparison::compute(&reduced, &reference, 1.5).unwrap();
        assert_eq!(cmp.differences, vec![0.0, 1.0]);
        assert_relative_eq!(cmp.rms, 0.5f64.sqrt());
        assert_eq!(cmp.max, 1.0);
        assert_eq!(cmp.max_of_min, 3.0);

        let mut buffer = Vec::new();
        write_comparisons_csv(&[cmp], &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), format!("1.5,{},1,3,0,1,\n", 0.5f64.sqrt()));
    }

    #[test]
    fn test_trajectory_comparison_errors() {
        let one = vec![DVector::from_vec(vec![0.0])];
        let two = vec![DVector::from_vec(vec![0.0, 1.0])];
        assert!(TrajectoryComparison::compute(&one, &[], 0.0).is_err());
        assert!(TrajectoryComparison::compute(&one, &two, 0.0).is_err());
    }
}
