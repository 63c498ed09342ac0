//! Reshaping constellation descriptors.
//!
//! A descriptor lists its polygon files and label points as two parallel
//! arrays, `WktFiles` and `LabelPoints`. Reshaping folds them into a single
//! `Polys` array of objects and gives every entry a `MaxScale`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Serializer, Value};
use tracing::{info, warn};

use crate::error::{PrepError, Result};

const WKT_FILES: &str = "WktFiles";
const LABEL_POINTS: &str = "LabelPoints";
const POLYS: &str = "Polys";

pub const DEFAULT_MAX_SCALE: f64 = 0.012;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReshapeConfig {
    pub max_scale: f64,
}

impl Default for ReshapeConfig {
    fn default() -> Self {
        Self {
            max_scale: DEFAULT_MAX_SCALE,
        }
    }
}

/// One entry of the reshaped `Polys` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolyEntry {
    pub wkt_file: Value,
    pub label_point: Value,
    pub max_scale: f64,
}

fn into_array(value: Option<Value>, name: &'static str) -> Result<Vec<Value>> {
    match value {
        None => Err(PrepError::MissingField(name)),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(PrepError::InvalidField {
            name,
            reason: format!("expected an array, got {}", other),
        }),
    }
}

/// Replaces `WktFiles`/`LabelPoints` with `Polys`. Other keys keep their order
/// and `Polys` goes last.
pub fn reshape_descriptor(root: Value, config: &ReshapeConfig) -> Result<Value> {
    let fields = match root {
        Value::Object(fields) => fields,
        _ => {
            return Err(PrepError::InvalidField {
                name: "descriptor",
                reason: "expected a JSON object".into(),
            })
        }
    };

    let mut reshaped = Map::new();
    let mut wkt_files = None;
    let mut label_points = None;
    for (key, value) in fields {
        match key.as_str() {
            WKT_FILES => wkt_files = Some(value),
            LABEL_POINTS => label_points = Some(value),
            _ => {
                reshaped.insert(key, value);
            }
        }
    }

    let wkt_files = into_array(wkt_files, WKT_FILES)?;
    let label_points = into_array(label_points, LABEL_POINTS)?;
    if wkt_files.len() != label_points.len() {
        warn!(
            "{} has {} entries but {} has {}; extra entries are dropped",
            WKT_FILES,
            wkt_files.len(),
            LABEL_POINTS,
            label_points.len()
        );
    }

    let polys: Vec<PolyEntry> = wkt_files
        .into_iter()
        .zip(label_points)
        .map(|(wkt_file, label_point)| PolyEntry {
            wkt_file,
            label_point,
            max_scale: config.max_scale,
        })
        .collect();

    reshaped.insert(POLYS.to_string(), serde_json::to_value(polys)?);
    Ok(Value::Object(reshaped))
}

/// Serializes with four-space indentation.
pub fn to_pretty_json(value: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    Ok(out)
}

/// Reshapes a descriptor file in place. Returns the number of `Polys` entries.
pub fn reshape_file(path: &Path, config: &ReshapeConfig) -> Result<usize> {
    let text = fs::read_to_string(path)?;
    let root: Value = serde_json::from_str(&text)?;
    let reshaped = reshape_descriptor(root, config)?;

    let count = reshaped
        .get(POLYS)
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    fs::write(path, to_pretty_json(&reshaped)?)?;
    Ok(count)
}

pub fn reshape_files(files: &[PathBuf], config: &ReshapeConfig) -> Result<()> {
    for (file_index, file) in files.iter().enumerate() {
        info!("Reshaping file {}/{}: {}", file_index + 1, files.len(), file.display());
        let count = reshape_file(file, config)?;
        info!("Wrote {} polys to {}", count, file.display());
    }
    Ok(())
}
