//! Finds the subspace of a noisy closed curve hidden in a higher-dimensional space.
//!
//! Usage: `cargo run --example hidden_curve -- [target_dim] [points] [iterations]`
//!
//! The curve is a Lissajous figure drawn in a random 3-dimensional subspace
//! of R¹⁰, with small isotropic noise on top. The example compares the
//! projected secant lengths of the coordinate-axis initial guess with those
//! of the optimized projection and writes the result to the temp directory.

use std::env;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use secantopt::prelude::*;
use tracing::info;

const AMBIENT_DIM: usize = 10;

fn arg_or(index: usize, default: usize) -> usize {
    env::args()
        .nth(index)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(default)
}

fn main() -> SecantResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("info".parse().expect("valid directive")),
        )
        .init();

    let target_dim = arg_or(1, 3);
    let n_points = arg_or(2, 80);
    let iterations = arg_or(3, 300);

    let mut rng = StdRng::seed_from_u64(2024);
    let subspace = Grassmann::<f64>::new(AMBIENT_DIM, 3)?.random_point_with(&mut rng);
    let noise = Normal::new(0.0, 1e-3).expect("valid standard deviation");

    let points: Vec<DVector<f64>> = (0..n_points)
        .map(|i| {
            let t = 2.0 * std::f64::consts::PI * i as f64 / n_points as f64;
            let latent = DVector::from_vec(vec![t.cos(), (2.0 * t).sin(), 0.5 * (3.0 * t).cos()]);
            let mut x = &subspace * latent;
            x.iter_mut().for_each(|v| *v += noise.sample(&mut rng));
            x
        })
        .collect();
    let data = DataSet::from_points(points, 0.0)?;
    let secants = Secants::from_cloud(&data, &SecantConfig::default())?.cull_degrees(0.5)?;
    info!(secants = secants.count(), weight = secants.total_weight(), "Secant set ready");

    let config = ProjectionConfig::default().with_max_iterations(iterations);
    let mut projection = SecantProjection::new(AMBIENT_DIM, target_dim, config)?;
    let before = projection.compute_initial(&[data.clone()])?.analyse_secants(&secants)?;
    let after = projection.find(&secants)?.analyse_secants(&secants)?;

    if let Some(result) = projection.last_result() {
        println!(
            "{:?}: {} iterations, cost {:.6}, {:?}",
            projection.config().cg.method,
            result.iterations,
            result.value,
            result.termination_reason
        );
    }
    println!(
        "shortest projected secant: {:.4} -> {:.4} (mean {:.4} -> {:.4})",
        before.min, after.min, before.mean, after.mean
    );
    if target_dim == 3 {
        let angles = projection
            .manifold()
            .principal_angles(projection.projection(), &subspace)?;
        println!("largest principal angle to the hidden subspace: {:.2e}", angles.max());
    }

    let output = env::temp_dir().join("hidden_curve_projection.csv");
    projection.write_csv(&output)?;
    println!("projection written to {}", output.display());
    Ok(())
}
