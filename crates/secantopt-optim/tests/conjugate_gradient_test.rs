//! Integration tests for the Riemannian conjugate gradient optimizer.

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use secantopt_core::prelude::*;
use secantopt_manifolds::Grassmann;
use secantopt_optim::{CGConfig, ConjugateGradient};

/// Symmetric matrix with a clear gap after the `k` leading eigenvalues.
fn gapped_symmetric(n: usize, seed: u64) -> DMatrix<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let gr = Grassmann::<f64>::new(n, n).unwrap();
    let q = gr.random_point_with(&mut rng);
    let eigenvalues: Vec<f64> = (0..n).map(|i| (n - i) as f64 + rng.gen_range(0.0..0.3)).collect();
    let d = DMatrix::from_diagonal(&nalgebra::DVector::from_vec(eigenvalues));
    &q * d * q.transpose()
}

fn dominant_eigenspace(a: &DMatrix<f64>, k: usize) -> DMatrix<f64> {
    let eigen = a.clone().symmetric_eigen();
    let mut order: Vec<usize> = (0..a.nrows()).collect();
    order.sort_by(|&i, &j| eigen.eigenvalues[j].partial_cmp(&eigen.eigenvalues[i]).unwrap());
    DMatrix::from_fn(a.nrows(), k, |r, c| eigen.eigenvectors[(r, order[c])])
}

#[test]
fn test_recovers_dominant_eigenspace() -> OptimizerResult<()> {
    let n = 8;
    let k = 3;
    let a = gapped_symmetric(n, 7);
    let cost = RayleighTraceCost::new(a.clone())?;
    let manifold = Grassmann::<f64>::new(n, k)?;
    let start = manifold.random_point_with(&mut StdRng::seed_from_u64(8));

    let mut cg = ConjugateGradient::new(CGConfig::default());
    let criterion = StoppingCriterion::new()
        .with_max_iterations(1000)
        .with_gradient_tolerance(1e-10);
    let result = cg.optimize(&cost, &manifold, &start, &criterion)?;

    assert!(result.converged);
    let expected = dominant_eigenspace(&a, k);
    let distance = manifold.distance(&result.point, &expected)?;
    assert!(distance < 1e-5, "distance to eigenspace: {}", distance);
    assert!(result.function_evaluations >= result.iterations);
    Ok(())
}

#[test]
fn test_periodic_restart_still_converges() -> OptimizerResult<()> {
    let a = gapped_symmetric(6, 21);
    let cost = CountingCostFunction::new(RayleighTraceCost::new(a.clone())?);
    let manifold = Grassmann::<f64>::new(6, 2)?;
    let start = manifold.random_point_with(&mut StdRng::seed_from_u64(22));

    let mut cg = ConjugateGradient::new(CGConfig::polak_ribiere().with_pr_plus(true).with_restart_period(3));
    let result = cg.optimize(&cost, &manifold, &start, &StoppingCriterion::new())?;

    // Ends with NoFurtherDescent on the rounding floor, above the gradient tolerance.
    assert!(result.converged);
    let distance = manifold.distance(&result.point, &dominant_eigenspace(&a, 2))?;
    assert!(distance < 1e-4, "distance to eigenspace: {}", distance);
    let (cost_evals, _) = cost.counts();
    assert!(cost_evals > 0);
    Ok(())
}

#[test]
fn test_histories_are_monotone_for_every_method() -> OptimizerResult<()> {
    let a = gapped_symmetric(7, 3);
    let cost = RayleighTraceCost::new(a)?;
    let manifold = Grassmann::<f64>::new(7, 2)?;

    for seed in 0..5 {
        let start = manifold.random_point_with(&mut StdRng::seed_from_u64(100 + seed));
        for config in [
            CGConfig::fletcher_reeves(),
            CGConfig::polak_ribiere(),
            CGConfig::hestenes_stiefel(),
        ] {
            let mut cg = ConjugateGradient::new(config);
            let result = cg.optimize(&cost, &manifold, &start, &StoppingCriterion::new())?;
            for pair in result.cost_history.windows(2) {
                assert!(pair[1] <= pair[0], "{}: {} > {}", cg.name(), pair[1], pair[0]);
            }
        }
    }
    Ok(())
}
