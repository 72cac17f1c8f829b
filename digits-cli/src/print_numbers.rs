use common::IMAGE_SIDE;
use digit_pipeline::{load_csv, Dataset, Task};
use std::error::Error;
use std::path::Path;

pub async fn print_numbers(csv_path: &Path, n: usize) -> Result<(), Box<dyn Error>> {
    let (dataset, _) = load_csv(csv_path, Task::Denoise).await?;

    print!("{}", render_digits(&dataset, n));

    if n > dataset.count() {
        tracing::warn!(requested = n, available = dataset.count(), "fewer digits than requested");
    }

    Ok(())
}

/// ASCII art for the first `n` digits, each under a short title.
fn render_digits(dataset: &Dataset, n: usize) -> String {
    let mut out = String::new();
    for (i, digit) in (0..n).map_while(|i| dataset.digit(i)).enumerate() {
        out.push_str(&format!("=== Digit {} (sample {}) ===\n", digit.label(), i + 1));
        out.push_str(&digit.to_ascii_art(IMAGE_SIDE, IMAGE_SIDE));
        out.push('\n');
    }
    out
}
