use std::ffi::OsString;
use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use geo::{Geometry, LineString, Polygon};
use geojson::{Feature, FeatureCollection, Geometry as GeoJsonGeometry};
use tracing::{debug, info, warn};
use wkt::{ToWkt, Wkt};

use crate::error::{PrepError, Result};
use crate::splitter::{split_polygon, Side, SplitConfig};
use crate::OutputFormat;

/// Fewest coordinates a closed ring needs: three vertices plus the closing one.
const MIN_RING_COORDS: usize = 4;

/// Polygons built from both sides of a split. `None` marks an empty side.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitPolygons {
    pub left: Option<Polygon<f64>>,
    pub right: Option<Polygon<f64>>,
}

impl SplitPolygons {
    pub fn get(&self, side: Side) -> Option<&Polygon<f64>> {
        match side {
            Side::Left => self.left.as_ref(),
            Side::Right => self.right.as_ref(),
        }
    }
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "POINT",
        Geometry::LineString(_) => "LINESTRING",
        Geometry::MultiPoint(_) => "MULTIPOINT",
        Geometry::MultiLineString(_) => "MULTILINESTRING",
        Geometry::MultiPolygon(_) => "MULTIPOLYGON",
        Geometry::GeometryCollection(_) => "GEOMETRYCOLLECTION",
        _ => "non-polygon geometry",
    }
}

/// Parses `POLYGON((...))` text.
pub fn parse_polygon(text: &str) -> Result<Polygon<f64>> {
    let parsed = Wkt::<f64>::from_str(text.trim()).map_err(|e| PrepError::Wkt(e.to_string()))?;
    let geometry = Geometry::try_from(parsed).map_err(|e| PrepError::Wkt(e.to_string()))?;

    match geometry {
        Geometry::Polygon(polygon) => {
            if polygon.exterior().0.is_empty() {
                return Err(PrepError::Wkt("polygon has no exterior ring".into()));
            }
            Ok(polygon)
        }
        other => Err(PrepError::UnsupportedGeometry(geometry_kind(&other).into())),
    }
}

pub fn load_polygon(file_path: &Path) -> Result<Polygon<f64>> {
    debug!("Loading file: {}", file_path.display());
    let text = fs::read_to_string(file_path)?;
    let polygon = parse_polygon(&text)?;
    debug!("Exterior ring has {} points", polygon.exterior().0.len());
    Ok(polygon)
}

/// Builds a polygon from a closed ring. An empty ring gives `None`; a ring
/// too short to enclose an area is an error.
pub fn ring_to_polygon(ring: &LineString<f64>, side: Side) -> Result<Option<Polygon<f64>>> {
    match ring.0.len() {
        0 => Ok(None),
        n if n < MIN_RING_COORDS => Err(PrepError::DegenerateRing { side, points: n }),
        _ => Ok(Some(Polygon::new(ring.clone(), vec![]))),
    }
}

/// Splits `polygon` and builds both output polygons.
pub fn split_to_polygons(polygon: &Polygon<f64>, config: &SplitConfig) -> Result<SplitPolygons> {
    let rings = split_polygon(polygon, config);
    Ok(SplitPolygons {
        left: ring_to_polygon(&rings.left, Side::Left)?,
        right: ring_to_polygon(&rings.right, Side::Right)?,
    })
}

pub fn polygon_to_wkt(polygon: Option<&Polygon<f64>>) -> String {
    match polygon {
        Some(polygon) => polygon.wkt_string(),
        None => "POLYGON EMPTY".to_string(),
    }
}

pub fn polygon_to_feature_collection(polygon: Option<&Polygon<f64>>, side: Side) -> FeatureCollection {
    let geometry = polygon.map(|polygon| {
        let exterior: Vec<Vec<f64>> = polygon
            .exterior()
            .points()
            .map(|p| vec![p.x(), p.y()])
            .collect();
        GeoJsonGeometry::new(geojson::Value::Polygon(vec![exterior]))
    });

    let mut properties = serde_json::Map::new();
    properties.insert("side".to_string(), serde_json::Value::from(side.name()));

    FeatureCollection {
        bbox: None,
        features: vec![Feature {
            bbox: None,
            geometry,
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }],
        foreign_members: None,
    }
}

/// Where one side of `original_file` is written. The input's file name is
/// kept byte for byte so distinct inputs never share an output.
pub fn output_path(
    output_dir: &Path,
    original_file: &Path,
    side: Side,
    format: OutputFormat,
) -> Result<PathBuf> {
    let missing_name = || PrepError::InvalidParameter {
        name: "file",
        value: original_file.display().to_string(),
        reason: "has no file name".into(),
    };

    let mut name = OsString::from(format!("{}-", side));
    match format {
        OutputFormat::Wkt => name.push(original_file.file_name().ok_or_else(missing_name)?),
        OutputFormat::GeoJson => {
            name.push(original_file.file_stem().ok_or_else(missing_name)?);
            name.push(".geojson");
        }
    }
    Ok(output_dir.join(name))
}

fn render_side(polygons: &SplitPolygons, side: Side, format: OutputFormat) -> Result<String> {
    let polygon = polygons.get(side);
    match format {
        OutputFormat::Wkt => Ok(polygon_to_wkt(polygon)),
        OutputFormat::GeoJson => Ok(serde_json::to_string_pretty(
            &polygon_to_feature_collection(polygon, side),
        )?),
    }
}

/// Splits one WKT file and writes its left and right halves. Both outputs
/// are rendered before anything is written, and a failed right write removes
/// the left file again.
pub fn split_file(
    file_path: &Path,
    output_dir: &Path,
    config: &SplitConfig,
    format: OutputFormat,
) -> Result<(PathBuf, PathBuf)> {
    let polygon = load_polygon(file_path)?;
    let polygons = split_to_polygons(&polygon, config)?;

    let left_path = output_path(output_dir, file_path, Side::Left, format)?;
    let right_path = output_path(output_dir, file_path, Side::Right, format)?;
    let left_text = render_side(&polygons, Side::Left, format)?;
    let right_text = render_side(&polygons, Side::Right, format)?;
    for side in [Side::Left, Side::Right] {
        if polygons.get(side).is_none() {
            debug!("{} side of {} is empty", side, file_path.display());
        }
    }

    fs::write(&left_path, left_text)?;
    if let Err(e) = fs::write(&right_path, right_text) {
        if let Err(cleanup) = fs::remove_file(&left_path) {
            warn!("Could not remove {}: {}", left_path.display(), cleanup);
        }
        return Err(e.into());
    }
    Ok((left_path, right_path))
}

pub fn process_wkt_files(
    files: &[PathBuf],
    output_dir: &Path,
    config: &SplitConfig,
    format: OutputFormat,
) -> Result<()> {
    create_dir_all(output_dir)?;
    info!(
        "Splitting {} files at x = {} (wrap {}) into {}",
        files.len(),
        config.threshold,
        config.wrap,
        output_dir.display()
    );

    for (file_index, file) in files.iter().enumerate() {
        info!("Processing file {}/{}: {}", file_index + 1, files.len(), file.display());
        let (left, right) = split_file(file, output_dir, config, format)?;
        info!("Written {} and {}", left.display(), right.display());
    }

    Ok(())
}
