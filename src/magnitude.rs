//! Tab-separated star records keyed by a magnitude column.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{PrepError, Result};

pub const DEFAULT_MAGNITUDE_COLUMN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagnitudeConfig {
    /// Zero-based index of the magnitude among the tab-separated fields.
    pub column: usize,
}

impl Default for MagnitudeConfig {
    fn default() -> Self {
        Self {
            column: DEFAULT_MAGNITUDE_COLUMN,
        }
    }
}

pub fn parse_magnitude(line: &str, line_number: usize, config: &MagnitudeConfig) -> Result<f64> {
    let field = line
        .split('\t')
        .nth(config.column)
        .ok_or_else(|| PrepError::Record {
            line: line_number,
            reason: format!("expected at least {} tab-separated fields", config.column + 1),
        })?
        .trim();

    field.parse::<f64>().map_err(|e| PrepError::Record {
        line: line_number,
        reason: format!("bad magnitude {:?}: {}", field, e),
    })
}

/// Calls `f` with every record line (terminator included) and its magnitude.
/// Blank lines are skipped. Returns the number of records seen.
fn for_each_record<R, F>(mut reader: R, config: &MagnitudeConfig, mut f: F) -> Result<usize>
where
    R: BufRead,
    F: FnMut(&str, f64) -> Result<()>,
{
    let mut line = String::new();
    let mut line_number = 0;
    let mut records = 0;
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        line_number += 1;
        if line.trim().is_empty() {
            debug!("Skipping blank line {}", line_number);
            continue;
        }
        let magnitude = parse_magnitude(&line, line_number, config)?;
        f(&line, magnitude)?;
        records += 1;
    }
    Ok(records)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartitionCounts {
    pub below: usize,
    pub at_or_above: usize,
}

fn check_pivot(pivot: f64) -> Result<()> {
    if pivot.is_nan() {
        return Err(PrepError::InvalidParameter {
            name: "pivot",
            value: pivot.to_string(),
            reason: "must be a number".into(),
        });
    }
    Ok(())
}

/// Copies each record verbatim to `below` if its magnitude is under `pivot`,
/// otherwise to `at_or_above`.
pub fn partition_by_magnitude<R, B, A>(
    reader: R,
    pivot: f64,
    below: &mut B,
    at_or_above: &mut A,
    config: &MagnitudeConfig,
) -> Result<PartitionCounts>
where
    R: BufRead,
    B: Write,
    A: Write,
{
    check_pivot(pivot)?;

    let mut counts = PartitionCounts::default();
    for_each_record(reader, config, |line, magnitude| {
        if magnitude < pivot {
            below.write_all(line.as_bytes())?;
            counts.below += 1;
        } else {
            at_or_above.write_all(line.as_bytes())?;
            counts.at_or_above += 1;
        }
        Ok(())
    })?;
    Ok(counts)
}

pub fn sort_file(
    input: &Path,
    pivot: f64,
    below_path: &Path,
    above_path: &Path,
    config: &MagnitudeConfig,
) -> Result<PartitionCounts> {
    // Outputs are truncated on create, so reject bad input before opening them.
    check_pivot(pivot)?;
    let reader = BufReader::new(File::open(input)?);
    let mut below = BufWriter::new(File::create(below_path)?);
    let mut above = BufWriter::new(File::create(above_path)?);

    let counts = partition_by_magnitude(reader, pivot, &mut below, &mut above, config)?;
    below.flush()?;
    above.flush()?;
    Ok(counts)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnitudeStats {
    pub max: f64,
    pub min: f64,
    pub count: usize,
    pub mean: f64,
}

impl fmt::Display for MagnitudeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "max {:.6}, min {:.6}, count {:.6}, av {:.6}",
            self.max, self.min, self.count as f64, self.mean
        )
    }
}

pub fn summarize<R: BufRead>(reader: R, config: &MagnitudeConfig) -> Result<MagnitudeStats> {
    let mut max = f64::NEG_INFINITY;
    let mut min = f64::INFINITY;
    let mut total = 0.0;

    let count = for_each_record(reader, config, |_, magnitude| {
        max = max.max(magnitude);
        min = min.min(magnitude);
        total += magnitude;
        Ok(())
    })?;

    if count == 0 {
        return Err(PrepError::EmptyInput);
    }
    Ok(MagnitudeStats {
        max,
        min,
        count,
        mean: total / count as f64,
    })
}

pub fn stats_file(input: &Path, config: &MagnitudeConfig) -> Result<MagnitudeStats> {
    summarize(BufReader::new(File::open(input)?), config)
}
