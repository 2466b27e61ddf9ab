use ferreus_krige::{
    KrigingConfig, KrigingInterpolator, NeighborhoodSpec, create_evaluation_grid,
};
use ferreus_krige_utils::{VariogramFunction, models::GaussianVariogram};
use faer::Mat;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Three observations on a 100-node line with a step pattern:
    // x = 25 -> 1.0, x = 50 -> 0.0, x = 75 -> 1.0.
    let points = Mat::from_fn(3, 1, |i, _| 25.0 + 25.0 * i as f64);
    let values = Mat::from_fn(3, 1, |i, _| if i == 1 { 0.0 } else { 1.0 });

    let model: Arc<dyn VariogramFunction> =
        Arc::new(GaussianVariogram { range: 35.0, sill: 1.0, nugget: 0.0 });

    let targets = create_evaluation_grid(&[(0.0, 99.0)], &[100]);

    // Global Ordinary Kriging: one fit over the whole dataset.
    let global = KrigingInterpolator::builder(points.clone(), values.clone(), model.clone())
        .build()?;
    let global_result = global.estimate(&targets);

    // Nearest-3-neighbour Kriging: a fresh local fit per grid node.
    let nearest = KrigingInterpolator::builder(points.clone(), values.clone(), model.clone())
        .config(KrigingConfig::builder().max_neighbors(3).build())
        .build()?;
    let nearest_result = nearest.estimate(&targets);

    // Windowed Kriging: neighbours within +/- 30 units of each node.
    let windowed = KrigingInterpolator::builder(points, values, model)
        .config(
            KrigingConfig::builder()
                .neighborhood(NeighborhoodSpec::Window { half_widths: vec![30.0] })
                .build(),
        )
        .build()?;
    let windowed_result = windowed.estimate(&targets);

    for node in [25usize, 50, 75] {
        println!(
            "node {:>2}: global {:+.6}  nearest-3 {:+.6}  windowed {:+.6}",
            node,
            global_result.means[(node, 0)],
            nearest_result.means[(node, 0)],
            windowed_result.means[(node, 0)],
        );
    }

    Ok(())
}
