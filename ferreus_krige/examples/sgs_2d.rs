use ferreus_krige::{
    KrigingConfig, KrigingInterpolator, SimulationParams, create_evaluation_grid,
    generate_random_points,
};
use ferreus_krige_utils::{VariogramFunction, models::SphericalVariogram};
use faer::Mat;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A handful of conditioning observations in the unit square.
    let num_points = 20usize;
    let points = generate_random_points(num_points, 2, Some(42));
    let values = Mat::from_fn(num_points, 1, |i, _| {
        let x = points[(i, 0)];
        let y = points[(i, 1)];
        (6.0 * x).sin() * (4.0 * y).cos()
    });

    let model: Arc<dyn VariogramFunction> =
        Arc::new(SphericalVariogram { range: 0.5, sill: 1.0, nugget: 0.0 });

    let interpolator = KrigingInterpolator::builder(points, values, model)
        .config(KrigingConfig::builder().max_neighbors(12).build())
        .build()?;

    // Simulate four conditional realizations on a 32 x 32 grid.
    let n = 32usize;
    let targets = create_evaluation_grid(&[(0.0, 1.0), (0.0, 1.0)], &[n, n]);

    let params = SimulationParams::builder().num_realizations(4).seed(7).build();
    let realizations = interpolator.simulate(&targets, &params);

    for (r, realization) in realizations.iter().enumerate() {
        let mean = realization.col(0).iter().sum::<f64>() / (n * n) as f64;
        let spread = realization
            .col(0)
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        println!(
            "realization {}: mean {:+.4}, min {:+.4}, max {:+.4}",
            r, mean, spread.0, spread.1
        );
    }

    Ok(())
}
