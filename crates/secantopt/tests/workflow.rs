//! The full workflow through the umbrella crate.

use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use secantopt::prelude::*;

/// A helix-like closed curve living in span{e₁, e₃, e₄} of R⁵.
fn curve(n: usize, seed: u64) -> DataSet<f64> {
    let noise = Normal::new(0.0, 1e-4).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    let points = (0..n)
        .map(|i| {
            let t = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
            DVector::from_vec(vec![
                t.cos(),
                noise.sample(&mut rng),
                t.sin(),
                0.4 * (2.0 * t).sin(),
                noise.sample(&mut rng),
            ])
        })
        .collect();
    DataSet::from_points(points, 1.0).unwrap()
}

#[test]
fn test_three_dimensional_reduction() -> SecantResult<()> {
    let data = curve(30, 11);
    let secants = Secants::from_cloud(&data, &SecantConfig::lazy())?;
    let culled = secants.cull_degrees(0.5)?;
    assert_eq!(culled.total_weight(), secants.total_weight());

    let config = ProjectionConfig::default()
        .with_cg(CGConfig::polak_ribiere().with_pr_plus(true))
        .with_max_iterations(400);
    let mut projection = SecantProjection::new(5, 3, config)?;
    projection.compute_initial(&[data])?.find(&culled)?;

    let w = projection.projection();
    let mut expected = DMatrix::zeros(5, 3);
    expected[(0, 0)] = 1.0;
    expected[(2, 1)] = 1.0;
    expected[(3, 2)] = 1.0;
    let distance = projection.manifold().distance(w, &expected)?;
    assert!(distance < 1e-2, "distance to the curve's subspace {}", distance);
    Ok(())
}

#[test]
fn test_initial_guess_is_coordinate_subspace() -> SecantResult<()> {
    let mut projection = SecantProjection::new(5, 3, ProjectionConfig::default())?;
    projection.compute_initial(&[curve(30, 12)])?;
    let w = projection.projection();
    let chosen: Vec<usize> = (0..3)
        .map(|c| (0..5).find(|&r| w[(r, c)] == 1.0).unwrap())
        .collect();
    assert_eq!(chosen, vec![0, 2, 3]);
    Ok(())
}
