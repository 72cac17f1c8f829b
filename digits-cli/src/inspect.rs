use digit_pipeline::{load_csv, ParseReport, Task};
use std::error::Error;
use std::path::Path;

/// Rejections listed before the rest are summarized
const MAX_LISTED: usize = 10;

pub async fn inspect(csv_path: &Path, task: Task) -> Result<(), Box<dyn Error>> {
    let (dataset, report) = load_csv(csv_path, task).await?;

    println!("{}", summary(&report));
    println!("images: {:?}", dataset.images().shape());
    if dataset.labels().is_one_hot() {
        println!("labels: one-hot [{}, 10]", dataset.count());
    } else {
        println!("labels: raw [{}]", dataset.count());
    }

    println!();
    println!("label  count");
    for (label, count) in dataset.label_histogram().iter().enumerate() {
        println!("{label:>5}  {count}");
    }

    Ok(())
}

fn summary(report: &ParseReport) -> String {
    let mut out = format!(
        "{}: {} accepted, {} rejected",
        report.source_name,
        report.accepted,
        report.rejected_count()
    );
    if report.header_skipped {
        out.push_str(" (header skipped)");
    }
    for rejected in report.rejected.iter().take(MAX_LISTED) {
        out.push_str(&format!("\n  line {}: {}", rejected.line, rejected.reason));
    }
    if report.rejected_count() > MAX_LISTED {
        out.push_str(&format!("\n  ... {} more", report.rejected_count() - MAX_LISTED));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use digit_pipeline::{RejectedRow, RowError};

    #[test]
    fn test_summary_lists_rejections() {
        let report = ParseReport {
            source_name: "train.csv".to_string(),
            accepted: 40,
            header_skipped: true,
            rejected: (1..=12)
                .map(|line| RejectedRow {
                    line,
                    reason: RowError::FieldCount { found: 3 },
                })
                .collect(),
        };
        let text = summary(&report);
        assert!(text.starts_with("train.csv: 40 accepted, 12 rejected (header skipped)"));
        assert_eq!(text.lines().count(), 1 + MAX_LISTED + 1);
        assert!(text.ends_with("... 2 more"));
    }
}
