use std::path::{Path, PathBuf};

pub mod descriptor;
pub mod error;
pub mod magnitude;
pub mod partitioner;
pub mod splitter;

pub use error::{PrepError, Result};
pub use splitter::{split_polygon, split_ring, Side, SplitConfig, SplitResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Wkt,
    GeoJson,
}

impl OutputFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "wkt" => Some(OutputFormat::Wkt),
            "geojson" => Some(OutputFormat::GeoJson),
            _ => None,
        }
    }
}

pub fn split_files(
    files: &[PathBuf],
    output_dir: &Path,
    config: &SplitConfig,
    format: OutputFormat,
) -> Result<()> {
    partitioner::process_wkt_files(files, output_dir, config, format)
}

pub fn reshape_files(files: &[PathBuf], config: &descriptor::ReshapeConfig) -> Result<()> {
    descriptor::reshape_files(files, config)
}
