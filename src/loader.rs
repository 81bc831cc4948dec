// src/loader.rs

use crate::error::{AdcPcaError, Result};
use log::{debug, info};
use ndarray::{Array2, ArrayView2};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Events reshaped from the flat sample stream.
///
/// Row `i` holds samples `[i * D, (i + 1) * D)` of the stream, so the
/// underlying storage is the truncated stream itself in row-major order.
#[derive(Debug, Clone)]
pub struct RawMatrix {
    data: Array2<f64>,
}

impl RawMatrix {
    /// Reshapes `samples` into rows of `event_width` samples.
    ///
    /// Trailing samples that do not fill a whole event are dropped.
    pub fn from_samples(samples: &[i64], event_width: usize) -> Result<Self> {
        if event_width == 0 {
            return Err(AdcPcaError::config("event width must be greater than 0"));
        }
        let rows = samples.len() / event_width;
        let kept = rows * event_width;
        if kept < samples.len() {
            debug!(
                "Dropping {} trailing samples that do not fill a {}-sample event.",
                samples.len() - kept,
                event_width
            );
        }
        let flat: Vec<f64> = samples[..kept].iter().map(|&v| v as f64).collect();
        let data = Array2::from_shape_vec((rows, event_width), flat)
            .map_err(|e| AdcPcaError::config(format!("cannot reshape samples: {}", e)))?;
        Ok(RawMatrix { data })
    }

    /// Wraps an existing `rows x D` matrix of samples.
    pub fn from_array(data: Array2<f64>) -> Self {
        RawMatrix { data }
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Number of complete events.
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Samples per event (`D`).
    pub fn event_width(&self) -> usize {
        self.data.ncols()
    }

    /// All samples in stream order, or `None` if the storage is not contiguous.
    pub fn samples(&self) -> Option<&[f64]> {
        self.data.as_slice()
    }

    pub fn into_inner(self) -> Array2<f64> {
        self.data
    }
}

/// Parses one integer sample per line.
///
/// Surrounding whitespace is ignored. Any other content, blank lines
/// included, fails the whole load with the 1-based line number.
pub fn parse_samples<R: BufRead>(reader: R) -> Result<Vec<i64>> {
    let mut samples = Vec::new();
    for (idx, line) in reader.split(b'\n').enumerate() {
        let line = line.map_err(|e| AdcPcaError::io(format!("reading line {}", idx + 1), e))?;
        // Undecodable bytes become U+FFFD and fail the integer parse below.
        let line = String::from_utf8_lossy(&line);
        let token = line.trim();
        let value = token.parse::<i64>().map_err(|source| AdcPcaError::Parse {
            line: idx + 1,
            token: token.to_string(),
            source,
        })?;
        samples.push(value);
    }
    Ok(samples)
}

/// Reads every sample of the file at `path`.
pub fn read_samples<P: AsRef<Path>>(path: P) -> Result<Vec<i64>> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| AdcPcaError::io(format!("opening {}", path.display()), e))?;
    parse_samples(BufReader::new(file))
}

/// Reads the file at `path` and reshapes it into events of `event_width` samples.
pub fn load_raw_matrix<P: AsRef<Path>>(path: P, event_width: usize) -> Result<RawMatrix> {
    let path = path.as_ref();
    let start = std::time::Instant::now();
    let samples = read_samples(path)?;
    let raw = RawMatrix::from_samples(&samples, event_width)?;
    info!(
        "Loaded {} samples from {} into {} events of {} samples in {:?}",
        samples.len(),
        path.display(),
        raw.rows(),
        raw.event_width(),
        start.elapsed()
    );
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn parses_trimmed_integers() {
        let input = "500\n  498 \n-3\n\t512\n";
        let samples = parse_samples(Cursor::new(input)).unwrap();
        assert_eq!(samples, vec![500, 498, -3, 512]);
    }

    #[test]
    fn malformed_line_reports_its_number() {
        let input = "500\n501\n5o2\n503\n";
        match parse_samples(Cursor::new(input)) {
            Err(AdcPcaError::Parse { line, token, .. }) => {
                assert_eq!(line, 3);
                assert_eq!(token, "5o2");
            }
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        let input: &[u8] = b"500\n5\xff0\n502\n";
        match parse_samples(Cursor::new(input)) {
            Err(AdcPcaError::Parse { line, token, .. }) => {
                assert_eq!(line, 2);
                assert!(token.starts_with('5') && token.ends_with('0'), "token {:?}", token);
            }
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let samples = parse_samples(Cursor::new("500\r\n501\r\n502")).unwrap();
        assert_eq!(samples, vec![500, 501, 502]);
    }

    #[test]
    fn blank_and_csv_lines_are_rejected() {
        assert!(matches!(
            parse_samples(Cursor::new("1\n\n2\n")),
            Err(AdcPcaError::Parse { line: 2, .. })
        ));
        assert!(matches!(
            parse_samples(Cursor::new("1,0\n")),
            Err(AdcPcaError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn reshape_drops_trailing_samples() {
        let samples: Vec<i64> = (0..11).collect();
        let raw = RawMatrix::from_samples(&samples, 4).unwrap();
        assert_eq!(raw.rows(), 2);
        assert_eq!(raw.event_width(), 4);
        assert_eq!(raw.data()[[0, 0]], 0.0);
        assert_eq!(raw.data()[[1, 3]], 7.0);
        assert_eq!(raw.samples().unwrap().len(), 8);
    }

    #[test]
    fn too_few_samples_give_an_empty_matrix() {
        let raw = RawMatrix::from_samples(&[1, 2, 3], 4).unwrap();
        assert_eq!(raw.rows(), 0);
        assert_eq!(raw.event_width(), 4);
    }

    #[test]
    fn zero_event_width_is_a_config_error() {
        assert!(matches!(
            RawMatrix::from_samples(&[1, 2, 3], 0),
            Err(AdcPcaError::Config(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        for v in 0..10 {
            writeln!(file, "{}", 480 + v).unwrap();
        }
        file.flush().unwrap();

        let raw = load_raw_matrix(file.path(), 3).unwrap();
        assert_eq!(raw.data().dim(), (3, 3));
        assert_eq!(raw.data()[[2, 2]], 488.0);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("data.txt");
        assert!(matches!(read_samples(&missing), Err(AdcPcaError::Io { .. })));
    }
}
