//! MNIST CSV parsing
//!
//! Each line is `label,pixel0,...,pixel783` with 8-bit pixel values. An
//! optional header line and a leading byte-order mark are tolerated. Lines
//! that do not hold exactly 785 usable fields are skipped and reported; the
//! load only fails when nothing survives.

use crate::config::Task;
use crate::dataset::{Dataset, Labels};
use crate::error::{PipelineError, Result, RowError};
use common::{FIELD_COUNT, IMAGE_SIDE, NUM_CLASSES, PIXEL_COUNT};
use csv::{ReaderBuilder, StringRecord};
use ndarray::Array4;

/// A line that was skipped while parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    /// One-based line number in the source text
    pub line: u64,
    pub reason: RowError,
}

/// Diagnostics collected while parsing one source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub source_name: String,
    pub accepted: usize,
    pub header_skipped: bool,
    pub rejected: Vec<RejectedRow>,
}

impl ParseReport {
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }
}

/// Parse CSV text into a dataset, discarding the diagnostics.
pub fn parse(text: &str, task: Task) -> Result<Dataset> {
    parse_with_report(text, "csv", task).map(|(dataset, _)| dataset)
}

/// Parse CSV text into a dataset plus a report of every rejected line.
///
/// Fails with `NoValidRows` when no line is accepted.
pub fn parse_with_report(
    text: &str,
    source_name: &str,
    task: Task,
) -> Result<(Dataset, ParseReport)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(text.as_bytes());

    let mut report = ParseReport {
        source_name: source_name.to_string(),
        ..ParseReport::default()
    };
    let mut pixels: Vec<f32> = Vec::new();
    let mut classes: Vec<u8> = Vec::new();
    let mut record = StringRecord::new();
    let mut first = true;

    while reader.read_record(&mut record)? {
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if first {
            first = false;
            if is_header(&record) {
                tracing::debug!(source = source_name, "skipping header line");
                report.header_skipped = true;
                continue;
            }
        }

        let start = pixels.len();
        match parse_row(&record, &mut pixels) {
            Ok(class) => classes.push(class),
            Err(reason) => {
                pixels.truncate(start);
                tracing::warn!(source = source_name, line, %reason, "rejected row");
                report.rejected.push(RejectedRow { line, reason });
            }
        }
    }

    report.accepted = classes.len();
    if classes.is_empty() {
        return Err(PipelineError::NoValidRows {
            source_name: source_name.to_string(),
            rejected: report.rejected.len(),
        });
    }

    let count = classes.len();
    let images = Array4::from_shape_vec((count, IMAGE_SIDE, IMAGE_SIDE, 1), pixels).map_err(
        |e| PipelineError::InvalidArgument(format!("pixel buffer does not fit images: {e}")),
    )?;
    let dataset = Dataset::new(images, Labels::from_classes(classes, task))?;

    tracing::info!(
        source = source_name,
        accepted = report.accepted,
        rejected = report.rejected.len(),
        "parsed CSV"
    );

    Ok((dataset, report))
}

/// Read and parse a CSV file.
///
/// The whole file is buffered before parsing.
#[cfg(feature = "fs")]
pub async fn load_csv<P: AsRef<std::path::Path>>(
    path: P,
    task: Task,
) -> Result<(Dataset, ParseReport)> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    parse_with_report(&text, &name, task)
}

/// A header is a first line whose first field is not an integer.
fn is_header(record: &StringRecord) -> bool {
    record
        .get(0)
        .map(|field| field.trim().parse::<i64>().is_err())
        .unwrap_or(false)
}

/// Append the normalized pixels of one row and return its label.
///
/// On error `pixels` may hold a partial row; the caller truncates it.
fn parse_row(record: &StringRecord, pixels: &mut Vec<f32>) -> std::result::Result<u8, RowError> {
    if record.len() != FIELD_COUNT {
        return Err(RowError::FieldCount {
            found: record.len(),
        });
    }

    let label = parse_label(&record[0])?;

    pixels.reserve(PIXEL_COUNT);
    for (column, field) in record.iter().skip(1).enumerate() {
        let value = parse_pixel(field).ok_or_else(|| RowError::Pixel {
            column,
            value: field.to_string(),
        })?;
        pixels.push(value / 255.0);
    }

    Ok(label)
}

fn parse_label(field: &str) -> std::result::Result<u8, RowError> {
    let trimmed = field.trim();
    let value = match trimmed.parse::<i64>() {
        Ok(v) => v,
        Err(_) => {
            // "5.0" is still a whole number
            let float: f64 = trimmed
                .parse()
                .map_err(|_| RowError::Label(field.to_string()))?;
            if !float.is_finite() || float.fract() != 0.0 {
                return Err(RowError::Label(field.to_string()));
            }
            float as i64
        }
    };

    if !(0..NUM_CLASSES as i64).contains(&value) {
        return Err(RowError::LabelOutOfRange(value));
    }
    Ok(value as u8)
}

fn parse_pixel(field: &str) -> Option<f32> {
    let value: f32 = field.trim().parse().ok()?;
    (value.is_finite() && (0.0..=255.0).contains(&value)).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(label: &str, hot: Option<usize>) -> String {
        let mut fields = vec![label.to_string()];
        fields.extend((0..PIXEL_COUNT).map(|p| {
            if Some(p) == hot {
                "255".to_string()
            } else {
                "0".to_string()
            }
        }));
        fields.join(",")
    }

    #[test]
    fn test_single_row() {
        let ds = parse(&row("5", Some(500)), Task::Denoise).unwrap();
        assert_eq!(ds.count(), 1);
        assert_eq!(ds.images().shape(), &[1, 28, 28, 1]);
        assert_eq!(ds.class_of(0), 5);
        // pixel 500 is row 17, col 24
        assert_eq!(ds.images()[[0, 17, 24, 0]], 1.0);
        assert_eq!(ds.images().sum(), 1.0);
    }

    #[test]
    fn test_header_and_bom_skipped() {
        let header = std::iter::once("label".to_string())
            .chain((0..PIXEL_COUNT).map(|p| format!("pixel{p}")))
            .collect::<Vec<_>>()
            .join(",");
        let text = format!("\u{feff}{header}\r\n{}\r\n{}\n", row("1", None), row("2", None));

        let (ds, report) = parse_with_report(&text, "train.csv", Task::Denoise).unwrap();
        assert_eq!(ds.count(), 2);
        assert!(report.header_skipped);
        assert!(report.rejected.is_empty());
        assert_eq!(ds.labels().classes(), vec![1, 2]);
    }

    #[test]
    fn test_bom_on_data_line() {
        let text = format!("\u{feff}{}", row("3", None));
        let (ds, report) = parse_with_report(&text, "bom", Task::Denoise).unwrap();
        assert_eq!(ds.count(), 1);
        assert!(!report.header_skipped);
    }

    #[test]
    fn test_malformed_rows_rejected() {
        let text = [
            row("1", None),
            "1,2,3".to_string(),
            row("x", None),
            row("12", None),
            row("2.5", None),
            row("4", None).replacen(",0", ",300", 1),
            row("7", None),
        ]
        .join("\n");

        let (ds, report) = parse_with_report(&text, "mixed", Task::Denoise).unwrap();
        assert_eq!(ds.count(), 2);
        assert_eq!(report.accepted, 2);
        assert_eq!(ds.labels().classes(), vec![1, 7]);

        let reasons: Vec<&RowError> = report.rejected.iter().map(|r| &r.reason).collect();
        assert_eq!(reasons.len(), 5);
        assert_eq!(reasons[0], &RowError::FieldCount { found: 3 });
        assert!(matches!(reasons[1], RowError::Label(_)));
        assert_eq!(reasons[2], &RowError::LabelOutOfRange(12));
        assert!(matches!(reasons[3], RowError::Label(_)));
        assert!(matches!(reasons[4], RowError::Pixel { column: 0, .. }));
        assert_eq!(report.rejected[0].line, 2);
    }

    #[test]
    fn test_rejected_row_leaves_no_pixels_behind() {
        let mut fields: Vec<String> = row("4", None).split(',').map(String::from).collect();
        fields[701] = "abc".to_string();
        let bad = fields.join(",");
        let text = format!("{}\n{}\n{}", row("1", Some(0)), bad, row("2", Some(783)));
        let ds = parse(&text, Task::Denoise).unwrap();
        assert_eq!(ds.count(), 2);
        assert_eq!(ds.images()[[0, 0, 0, 0]], 1.0);
        assert_eq!(ds.images()[[1, 27, 27, 0]], 1.0);
    }

    #[test]
    fn test_stray_quote_stays_on_its_line() {
        let text = [
            row("1", None),
            "\"oops,1,2".to_string(),
            row("2", None),
            row("3", None),
            row("4", None),
        ]
        .join("\n");

        let (ds, report) = parse_with_report(&text, "quoted", Task::Denoise).unwrap();
        assert_eq!(ds.count(), 4);
        assert_eq!(ds.labels().classes(), vec![1, 2, 3, 4]);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].line, 2);
        assert_eq!(report.rejected[0].reason, RowError::FieldCount { found: 3 });
    }

    #[test]
    fn test_float_label_accepted() {
        // a first line with a non-integer label reads as a header
        let text = format!("{}\n{}", row("1", None), row("5.0", None));
        let ds = parse(&text, Task::Denoise).unwrap();
        assert_eq!(ds.count(), 2);
        assert_eq!(ds.class_of(1), 5);
    }

    #[test]
    fn test_no_valid_rows() {
        let err = parse("1,2,3\n4,5,6\n", Task::Denoise).unwrap_err();
        match err {
            PipelineError::NoValidRows { rejected, .. } => assert_eq!(rejected, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_text() {
        assert!(matches!(
            parse("", Task::Denoise),
            Err(PipelineError::NoValidRows { rejected: 0, .. })
        ));
        assert!(matches!(
            parse("\n\n", Task::Classify),
            Err(PipelineError::NoValidRows { .. })
        ));
    }

    #[test]
    fn test_classify_task_one_hot() {
        let ds = parse(&row("5", None), Task::Classify).unwrap();
        match ds.labels() {
            Labels::OneHot(encoded) => {
                assert_eq!(
                    encoded.row(0).to_vec(),
                    vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]
                );
            }
            Labels::Raw(_) => panic!("expected one-hot labels"),
        }
    }

    #[test]
    fn test_normalization() {
        let text = row("0", None).replacen(",0", ",51", 1);
        let ds = parse(&text, Task::Denoise).unwrap();
        assert!((ds.images()[[0, 0, 0, 0]] - 0.2).abs() < 1e-6);
        assert!(ds.images().iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[cfg(feature = "fs")]
    #[tokio::test]
    async fn test_load_csv_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mnist_test.csv");
        std::fs::write(&path, format!("{}\n{}\n", row("8", None), row("9", None))).unwrap();

        let (ds, report) = load_csv(&path, Task::Denoise).await.unwrap();
        assert_eq!(ds.count(), 2);
        assert_eq!(report.source_name, "mnist_test.csv");
    }

    #[cfg(feature = "fs")]
    #[tokio::test]
    async fn test_load_csv_missing_file() {
        let err = load_csv("/definitely/not/here.csv", Task::Denoise)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}
