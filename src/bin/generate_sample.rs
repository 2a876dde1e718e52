use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use pixel_audit::data::loader::save_file;
use pixel_audit::data::model::{NAME, PIXELS, RowCollection, SIZE, TYPE};
use pixel_audit::data::pixels::PixelMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const WIDTH: usize = 8;
const HEIGHT: usize = 8;

/// Radial blob centred at (cx, cy) on a dark background, plus sensor noise.
fn generate_image(cx: f64, cy: f64, radius: f64, rng: &mut StdRng) -> Vec<f64> {
    let mut pixels = Vec::with_capacity(WIDTH * HEIGHT);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let d = ((x as f64 - cx).powi(2) + (y as f64 - cy).powi(2)).sqrt();
            let signal = 220.0 * (-(d / radius).powi(2)).exp();
            let noisy = signal + 20.0 + rng.random_range(-8.0..8.0);
            pixels.push(noisy.clamp(0.0, 255.0).round());
        }
    }
    pixels
}

fn main() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);

    let labels = ["circle_small", "circle_large"];
    let mut rows = RowCollection::new(
        [NAME, TYPE, SIZE, PIXELS, "label"]
            .iter()
            .map(|c| c.to_string())
            .collect(),
    );

    for i in 0..100 {
        let label = labels[i % labels.len()];
        let radius = if label == "circle_small" { 1.5 } else { 3.0 };
        let cx = rng.random_range(2.0..6.0);
        let cy = rng.random_range(2.0..6.0);
        let pixels = PixelMatrix::flat(generate_image(cx, cy, radius, &mut rng));

        rows.push(BTreeMap::from([
            (NAME.to_string(), format!("img_{i:03}")),
            (TYPE.to_string(), "png".to_string()),
            (SIZE.to_string(), format!("{WIDTH}x{HEIGHT}")),
            (PIXELS.to_string(), pixels.render()),
            ("label".to_string(), label.to_string()),
        ]));
    }

    let output_path = Path::new("images.csv");
    save_file(&rows, output_path)?;

    println!(
        "Wrote {} images ({}x{} grayscale) to {}",
        rows.len(),
        WIDTH,
        HEIGHT,
        output_path.display()
    );
    Ok(())
}
