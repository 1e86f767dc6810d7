//! Single-pass ESRI shapefile reader, used for the `centerline` and `water_polygons` auxiliary
//! sources (spec.md §6). Shapefiles carry no node/way graph to rehydrate, so unlike
//! [`super::pbf`] this reader never needs a second pass.

use super::{RawGeometry, RoleInfo, SourceFeature, SourceKind, SourceReader, TagValue};
use anyhow::{Context, Result, bail};
use shapefile::dbase::FieldValue;
use shapefile::{Point, PolygonRing, Shape};
use std::path::{Path, PathBuf};

fn close_ring(mut points: Vec<[f64; 2]>) -> Vec<[f64; 2]> {
	if points.first() != points.last() {
		if let Some(&first) = points.first() {
			points.push(first);
		}
	}
	points
}

fn ring_points(points: &[Point]) -> Vec<[f64; 2]> {
	close_ring(points.iter().map(|p| [p.x, p.y]).collect())
}

fn field_to_tag(value: FieldValue) -> Option<TagValue> {
	match value {
		FieldValue::Character(Some(s)) => Some(TagValue::Str(s)),
		FieldValue::Character(None) => None,
		FieldValue::Numeric(Some(n)) => Some(TagValue::F64(n)),
		FieldValue::Numeric(None) => None,
		FieldValue::Logical(Some(b)) => Some(TagValue::Bool(b)),
		FieldValue::Logical(None) => None,
		FieldValue::Integer(i) => Some(TagValue::I64(i64::from(i))),
		FieldValue::Float(Some(f)) => Some(TagValue::F64(f64::from(f))),
		FieldValue::Float(None) => None,
		FieldValue::Double(d) => Some(TagValue::F64(d)),
		FieldValue::Currency(c) => Some(TagValue::F64(c)),
		FieldValue::Memo(s) => Some(TagValue::Str(s)),
		other => Some(TagValue::Str(format!("{other:?}"))),
	}
}

/// Reads every shape+record pair in an ESRI shapefile, reporting polygons as
/// [`SourceKind::Polygon`] and polylines as [`SourceKind::Line`] (spec.md §4.2: "always reported
/// as `Polygon` or `Line`, matching their source schema").
pub struct ShapefileReader {
	path: PathBuf,
}

impl ShapefileReader {
	#[must_use]
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

fn shape_to_feature(id: u64, shape: Shape, tags: std::collections::BTreeMap<String, TagValue>) -> Result<Option<SourceFeature>> {
	let (kind, geometry) = match shape {
		Shape::Polygon(polygon) => {
			let rings: Vec<Vec<[f64; 2]>> = polygon
				.rings()
				.iter()
				.map(|ring| match ring {
					PolygonRing::Outer(points) | PolygonRing::Inner(points) => ring_points(points),
				})
				.filter(|ring| ring.len() >= 4)
				.collect();
			if rings.is_empty() {
				return Ok(None);
			}
			(SourceKind::Polygon, RawGeometry::Polygon(rings))
		}
		Shape::Polyline(polyline) => {
			let parts: Vec<[f64; 2]> = polyline
				.parts()
				.iter()
				.flat_map(|part| part.iter().map(|p| [p.x, p.y]))
				.collect();
			if parts.len() < 2 {
				return Ok(None);
			}
			(SourceKind::Line, RawGeometry::Line(parts))
		}
		Shape::Point(point) => (SourceKind::Node, RawGeometry::Point([point.x, point.y])),
		Shape::NullShape => return Ok(None),
		other => bail!("unsupported shapefile shape type: {other:?}"),
	};
	Ok(Some(SourceFeature::new(id, kind, tags, move || Ok(geometry))))
}

impl SourceReader for ShapefileReader {
	fn for_each(&mut self, visit: &mut dyn FnMut(SourceFeature) -> Result<()>) -> Result<()> {
		let mut reader = shapefile::Reader::from_path(&self.path)
			.with_context(|| format!("opening shapefile {}", self.path.display()))?;

		for (idx, shape_record) in reader.iter_shapes_and_records().enumerate() {
			let (shape, record) = shape_record.with_context(|| format!("reading shape #{idx} from {}", self.path.display()))?;
			let mut tags = std::collections::BTreeMap::new();
			for (name, value) in record {
				if let Some(tag) = field_to_tag(value) {
					tags.insert(name, tag);
				}
			}
			if let Some(mut feature) = shape_to_feature(idx as u64, shape, tags)? {
				feature.role_info = RoleInfo::default();
				visit(feature)?;
			}
		}
		Ok(())
	}
}
