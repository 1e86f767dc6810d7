//! Single-pass reader for the Natural Earth SQLite dump (spec.md §6's `natural_earth` key).
//! The dump packages one table per feature layer, each with a `geometry` column holding
//! well-known-binary (WKB) blobs; every other column becomes a tag. There is no shared schema
//! across tables, so this reader discovers geometry-bearing tables at open time instead of
//! hard-coding a layer list.

use super::{RawGeometry, RoleInfo, SourceFeature, SourceKind, SourceReader, TagValue};
use anyhow::{Context, Result, bail, ensure};
use r2d2_sqlite::rusqlite::{Connection, types::ValueRef};
use std::path::{Path, PathBuf};

/// Reads every row of every table carrying a `geometry` column, reporting each row as a
/// [`SourceKind::Polygon`] or [`SourceKind::Line`] feature per spec.md §4.2.
pub struct NaturalEarthReader {
	path: PathBuf,
}

impl NaturalEarthReader {
	#[must_use]
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

fn geometry_tables(conn: &Connection) -> Result<Vec<String>> {
	let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
	let mut tables = Vec::new();
	let mut rows = stmt.query([])?;
	while let Some(row) = rows.next()? {
		let table: String = row.get(0)?;
		let mut info_stmt = conn.prepare(&format!("PRAGMA table_info(\"{table}\")"))?;
		let has_geometry = info_stmt
			.query_map([], |r| r.get::<_, String>(1))?
			.filter_map(std::result::Result::ok)
			.any(|name| name.eq_ignore_ascii_case("geometry"));
		if has_geometry {
			tables.push(table);
		}
	}
	Ok(tables)
}

impl SourceReader for NaturalEarthReader {
	fn for_each(&mut self, visit: &mut dyn FnMut(SourceFeature) -> Result<()>) -> Result<()> {
		let conn = Connection::open(&self.path).with_context(|| format!("opening {}", self.path.display()))?;
		let tables = geometry_tables(&conn)?;

		let mut next_id = 0u64;
		for table in tables {
			let mut stmt = conn.prepare(&format!("SELECT * FROM \"{table}\""))?;
			let column_names: Vec<String> = stmt.column_names().iter().map(|s| (*s).to_string()).collect();
			let mut rows = stmt.query([])?;
			while let Some(row) = rows.next()? {
				let mut tags = std::collections::BTreeMap::new();
				tags.insert("__layer".to_string(), TagValue::Str(table.clone()));
				let mut geometry_blob: Option<Vec<u8>> = None;
				for (i, name) in column_names.iter().enumerate() {
					let value = row.get_ref(i)?;
					if name.eq_ignore_ascii_case("geometry") {
						if let ValueRef::Blob(bytes) = value {
							geometry_blob = Some(bytes.to_vec());
						}
						continue;
					}
					if let Some(tag) = value_ref_to_tag(value) {
						tags.insert(name.clone(), tag);
					}
				}
				let Some(bytes) = geometry_blob else { continue };
				let Some((kind, raw)) = parse_wkb(&bytes)? else { continue };
				next_id += 1;
				let mut feature = SourceFeature::new(next_id, kind, tags, move || Ok(raw));
				feature.role_info = RoleInfo::default();
				visit(feature)?;
			}
		}
		Ok(())
	}
}

fn value_ref_to_tag(value: ValueRef<'_>) -> Option<TagValue> {
	match value {
		ValueRef::Null => None,
		ValueRef::Integer(i) => Some(TagValue::I64(i)),
		ValueRef::Real(f) => Some(TagValue::F64(f)),
		ValueRef::Text(t) => Some(TagValue::Str(String::from_utf8_lossy(t).into_owned())),
		ValueRef::Blob(_) => None,
	}
}

struct WkbCursor<'a> {
	data: &'a [u8],
	pos: usize,
	little_endian: bool,
}

impl<'a> WkbCursor<'a> {
	fn new(data: &'a [u8]) -> Result<Self> {
		ensure!(!data.is_empty(), "empty WKB blob");
		Ok(Self { data, pos: 1, little_endian: data[0] == 1 })
	}

	fn u32(&mut self) -> Result<u32> {
		ensure!(self.pos + 4 <= self.data.len(), "truncated WKB");
		let bytes: [u8; 4] = self.data[self.pos..self.pos + 4].try_into().unwrap();
		self.pos += 4;
		Ok(if self.little_endian { u32::from_le_bytes(bytes) } else { u32::from_be_bytes(bytes) })
	}

	fn f64(&mut self) -> Result<f64> {
		ensure!(self.pos + 8 <= self.data.len(), "truncated WKB");
		let bytes: [u8; 8] = self.data[self.pos..self.pos + 8].try_into().unwrap();
		self.pos += 8;
		Ok(if self.little_endian { f64::from_le_bytes(bytes) } else { f64::from_be_bytes(bytes) })
	}

	fn point(&mut self) -> Result<[f64; 2]> {
		Ok([self.f64()?, self.f64()?])
	}

	fn ring(&mut self) -> Result<Vec<[f64; 2]>> {
		let n = self.u32()? as usize;
		(0..n).map(|_| self.point()).collect()
	}
}

/// Parses a WKB blob into the `(kind, geometry)` the renderer expects. Recognizes the flat 2D
/// geometry types Natural Earth's dumps use (point, line string, polygon, and their multi-
/// variants); anything else is skipped rather than treated as fatal, matching spec.md §7's
/// per-feature `GeometryInvalid` handling for unusable source geometry.
fn parse_wkb(bytes: &[u8]) -> Result<Option<(SourceKind, RawGeometry)>> {
	let mut cursor = WkbCursor::new(bytes)?;
	let geom_type = cursor.u32()?;
	match geom_type {
		1 => Ok(Some((SourceKind::Node, RawGeometry::Point(cursor.point()?)))),
		2 => {
			let n = cursor.u32()? as usize;
			let line: Vec<[f64; 2]> = (0..n).map(|_| cursor.point()).collect::<Result<_>>()?;
			Ok(Some((SourceKind::Line, RawGeometry::Line(line))))
		}
		3 => {
			let n_rings = cursor.u32()? as usize;
			let rings: Vec<Vec<[f64; 2]>> = (0..n_rings).map(|_| cursor.ring()).collect::<Result<_>>()?;
			Ok(Some((SourceKind::Polygon, RawGeometry::Polygon(rings))))
		}
		5 => {
			// MultiLineString: flatten parts into one polyline, matching how the pipeline's
			// `RawGeometry::Line` already represents a way as a single vertex sequence.
			let n_parts = cursor.u32()? as usize;
			let mut line = Vec::new();
			for _ in 0..n_parts {
				let _sub_type = cursor.u32()?;
				let n = cursor.u32()? as usize;
				for _ in 0..n {
					line.push(cursor.point()?);
				}
			}
			if line.len() < 2 { Ok(None) } else { Ok(Some((SourceKind::Line, RawGeometry::Line(line)))) }
		}
		6 => {
			// MultiPolygon: flatten every ring of every part into one ring list; downstream
			// rendering treats ring winding, not part boundaries, as the outer/hole signal.
			let n_parts = cursor.u32()? as usize;
			let mut rings = Vec::new();
			for _ in 0..n_parts {
				let _sub_type = cursor.u32()?;
				let n_rings = cursor.u32()? as usize;
				for _ in 0..n_rings {
					rings.push(cursor.ring()?);
				}
			}
			if rings.is_empty() { Ok(None) } else { Ok(Some((SourceKind::Polygon, RawGeometry::Polygon(rings)))) }
		}
		other => {
			let _ = other;
			Ok(None)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn wkb_point(x: f64, y: f64) -> Vec<u8> {
		let mut buf = vec![1u8];
		buf.extend_from_slice(&1u32.to_le_bytes());
		buf.extend_from_slice(&x.to_le_bytes());
		buf.extend_from_slice(&y.to_le_bytes());
		buf
	}

	fn wkb_polygon(rings: &[Vec<[f64; 2]>]) -> Vec<u8> {
		let mut buf = vec![1u8];
		buf.extend_from_slice(&3u32.to_le_bytes());
		buf.extend_from_slice(&(rings.len() as u32).to_le_bytes());
		for ring in rings {
			buf.extend_from_slice(&(ring.len() as u32).to_le_bytes());
			for p in ring {
				buf.extend_from_slice(&p[0].to_le_bytes());
				buf.extend_from_slice(&p[1].to_le_bytes());
			}
		}
		buf
	}

	#[test]
	fn parses_little_endian_point() {
		let bytes = wkb_point(1.5, -2.5);
		let (kind, geom) = parse_wkb(&bytes).unwrap().unwrap();
		assert_eq!(kind, SourceKind::Node);
		assert_eq!(geom, RawGeometry::Point([1.5, -2.5]));
	}

	#[test]
	fn parses_polygon_with_hole() {
		let outer = vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]];
		let hole = vec![[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 1.0]];
		let bytes = wkb_polygon(&[outer.clone(), hole.clone()]);
		let (kind, geom) = parse_wkb(&bytes).unwrap().unwrap();
		assert_eq!(kind, SourceKind::Polygon);
		assert_eq!(geom, RawGeometry::Polygon(vec![outer, hole]));
	}

	#[test]
	fn unknown_geometry_type_is_skipped_not_fatal() {
		let mut buf = vec![1u8];
		buf.extend_from_slice(&99u32.to_le_bytes());
		assert!(parse_wkb(&buf).unwrap().is_none());
	}
}
