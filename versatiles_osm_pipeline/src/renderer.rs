//! C3: `FeatureRenderer` — projects one [`crate::source::SourceFeature`]'s geometry to Web
//! Mercator, simplifies and buffer-clips it against every tile it touches across a zoom range,
//! and quantizes the result to tile-local integer coordinates at [`EXTENT`].
//!
//! Clipping after simplification (and simplifying once per zoom rather than once globally)
//! matches spec.md §4.3: it bounds the vertex count handed to the sort/encode stages and keeps
//! low zooms from inheriting high-zoom detail.

use crate::source::{RawGeometry, TagValue};
use crate::tile_id::TileId;
use anyhow::Result;
use std::collections::BTreeMap;
use std::f64::consts::PI;

/// Tile-local coordinate extent, matching the MVT convention used throughout the pipeline.
pub const EXTENT: i32 = 4096;

/// Douglas-Peucker tolerance in tile pixels, matching spec.md §4.3 step 2's default.
pub const SIMPLIFY_TOLERANCE_PX: f64 = 0.0625;

/// Default buffer, in tile pixels, a layer may override per spec.md §4.3 step 3.
pub const DEFAULT_BUFFER_PX: f64 = 4.0;

/// What shape a [`crate::profile::FeatureCollector`] asked to be built from one source feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryRequest {
	Point,
	Line,
	Polygon,
	/// Collapses the source geometry to its centroid before rendering, regardless of the
	/// original geometry kind (used for point-labeling polygons, e.g. building centroids).
	Centroid,
}

/// Tile-local quantized geometry, grouped the way the MVT encoder wants it (one "multi" value
/// per feature): a single point is `Points` with one entry, a single line is `Lines` with one.
#[derive(Debug, Clone, PartialEq)]
pub enum QuantizedGeometry {
	Points(Vec<[i32; 2]>),
	Lines(Vec<Vec<[i32; 2]>>),
	/// Outer rings and holes, outer-ring-first per ring group (the renderer does not attempt to
	/// associate holes with a specific outer ring across a multi-polygon; profiles that need
	/// that association should emit one `RenderedFeature` per polygon part).
	Polygons(Vec<Vec<[i32; 2]>>),
}

/// One feature already placed in a single tile, ready for [`crate::sort`] and then
/// [`crate::group`]/[`crate::mbtiles_writer`].
#[derive(Debug, Clone)]
pub struct RenderedFeature {
	pub tile_id: TileId,
	pub zoom: u8,
	pub layer: String,
	pub z_order: i32,
	pub feature_id: u64,
	pub geometry: QuantizedGeometry,
	pub attrs: BTreeMap<String, TagValue>,
	pub group: Option<(u64, u32)>,
}

/// Everything a profile specified about one collected shape via [`crate::profile::FeatureCollector`].
#[derive(Debug, Clone)]
pub struct RenderRequest {
	pub kind: GeometryRequest,
	pub layer: String,
	pub zoom_min: u8,
	pub zoom_max: u8,
	pub buffer_px: f64,
	pub z_order: i32,
	pub attrs: BTreeMap<String, TagValue>,
	pub group: Option<(u64, u32)>,
}

fn lon_lat_to_px(lon: f64, lat: f64, zoom: u8) -> [f64; 2] {
	let scale = f64::from(EXTENT) * f64::from(2u32.pow(u32::from(zoom)));
	let x = (lon + 180.0) / 360.0 * scale;
	let lat_rad = lat.clamp(-85.051_128, 85.051_128) * PI / 180.0;
	let merc_y = (PI / 4.0 + lat_rad / 2.0).tan().ln();
	let y = (0.5 - merc_y / (2.0 * PI)) * scale;
	[x, y]
}

fn project(raw: &RawGeometry, zoom: u8) -> RawGeometry {
	match raw {
		RawGeometry::Point(p) => RawGeometry::Point(lon_lat_to_px(p[0], p[1], zoom)),
		RawGeometry::Line(line) => RawGeometry::Line(line.iter().map(|p| lon_lat_to_px(p[0], p[1], zoom)).collect()),
		RawGeometry::Polygon(rings) => RawGeometry::Polygon(
			rings.iter().map(|ring| ring.iter().map(|p| lon_lat_to_px(p[0], p[1], zoom)).collect()).collect(),
		),
	}
}

/// Centroid of a geometry's outer extent; used for `GeometryRequest::Centroid` and for computing
/// degeneracy after simplification.
fn centroid(raw: &RawGeometry) -> [f64; 2] {
	match raw {
		RawGeometry::Point(p) => *p,
		RawGeometry::Line(line) => average(line),
		RawGeometry::Polygon(rings) => rings.first().map(|r| average(r)).unwrap_or([0.0, 0.0]),
	}
}

fn average(points: &[[f64; 2]]) -> [f64; 2] {
	if points.is_empty() {
		return [0.0, 0.0];
	}
	let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
	[sx / points.len() as f64, sy / points.len() as f64]
}

/// Douglas-Peucker simplification. `closed` rings always keep their first/last point.
fn douglas_peucker(points: &[[f64; 2]], tolerance: f64) -> Vec<[f64; 2]> {
	if points.len() < 3 {
		return points.to_vec();
	}
	let mut keep = vec![false; points.len()];
	keep[0] = true;
	keep[points.len() - 1] = true;
	simplify_span(points, 0, points.len() - 1, tolerance, &mut keep);
	points.iter().zip(keep.iter()).filter_map(|(p, &k)| k.then_some(*p)).collect()
}

fn simplify_span(points: &[[f64; 2]], start: usize, end: usize, tolerance: f64, keep: &mut [bool]) {
	if end <= start + 1 {
		return;
	}
	let mut max_dist = 0.0;
	let mut max_idx = start;
	for i in (start + 1)..end {
		let d = perpendicular_distance(points[i], points[start], points[end]);
		if d > max_dist {
			max_dist = d;
			max_idx = i;
		}
	}
	if max_dist > tolerance {
		keep[max_idx] = true;
		simplify_span(points, start, max_idx, tolerance, keep);
		simplify_span(points, max_idx, end, tolerance, keep);
	}
}

fn perpendicular_distance(p: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
	let (dx, dy) = (b[0] - a[0], b[1] - a[1]);
	let len_sq = dx * dx + dy * dy;
	if len_sq < f64::EPSILON {
		return ((p[0] - a[0]).powi(2) + (p[1] - a[1]).powi(2)).sqrt();
	}
	let t = ((p[0] - a[0]) * dx + (p[1] - a[1]) * dy) / len_sq;
	let (projx, projy) = (a[0] + t * dx, a[1] + t * dy);
	((p[0] - projx).powi(2) + (p[1] - projy).powi(2)).sqrt()
}

fn bounds_of(points: &[[f64; 2]]) -> Option<[f64; 4]> {
	if points.is_empty() {
		return None;
	}
	let (mut x_min, mut y_min, mut x_max, mut y_max) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
	for p in points {
		x_min = x_min.min(p[0]);
		y_min = y_min.min(p[1]);
		x_max = x_max.max(p[0]);
		y_max = y_max.max(p[1]);
	}
	Some([x_min, y_min, x_max, y_max])
}

fn geometry_bounds(raw: &RawGeometry) -> Option<[f64; 4]> {
	match raw {
		RawGeometry::Point(p) => Some([p[0], p[1], p[0], p[1]]),
		RawGeometry::Line(line) => bounds_of(line),
		RawGeometry::Polygon(rings) => {
			let mut acc: Option<[f64; 4]> = None;
			for ring in rings {
				if let Some([x0, y0, x1, y1]) = bounds_of(ring) {
					acc = Some(match acc {
						None => [x0, y0, x1, y1],
						Some([ax0, ay0, ax1, ay1]) => [ax0.min(x0), ay0.min(y0), ax1.max(x1), ay1.max(y1)],
					});
				}
			}
			acc
		}
	}
}

/// Sutherland-Hodgman clip of a closed ring against an axis-aligned rectangle.
fn clip_ring(ring: &[[f64; 2]], rect: [f64; 4]) -> Vec<[f64; 2]> {
	let [x_min, y_min, x_max, y_max] = rect;
	let mut out = ring.to_vec();
	for edge in 0..4 {
		if out.is_empty() {
			break;
		}
		let inside = |p: &[f64; 2]| match edge {
			0 => p[0] >= x_min,
			1 => p[0] <= x_max,
			2 => p[1] >= y_min,
			_ => p[1] <= y_max,
		};
		let intersect = |a: &[f64; 2], b: &[f64; 2]| -> [f64; 2] {
			let (dx, dy) = (b[0] - a[0], b[1] - a[1]);
			let t = match edge {
				0 => (x_min - a[0]) / dx,
				1 => (x_max - a[0]) / dx,
				2 => (y_min - a[1]) / dy,
				_ => (y_max - a[1]) / dy,
			};
			[a[0] + t * dx, a[1] + t * dy]
		};
		let mut next = Vec::with_capacity(out.len());
		for i in 0..out.len() {
			let curr = out[i];
			let prev = out[if i == 0 { out.len() - 1 } else { i - 1 }];
			match (inside(&prev), inside(&curr)) {
				(true, true) => next.push(curr),
				(true, false) => next.push(intersect(&prev, &curr)),
				(false, true) => {
					next.push(intersect(&prev, &curr));
					next.push(curr);
				}
				(false, false) => {}
			}
		}
		out = next;
	}
	if out.len() >= 3 && out.first() != out.last() {
		out.push(out[0]);
	}
	out
}

/// Liang-Barsky clip of a single segment against an axis-aligned rectangle; returns the clipped
/// endpoints if any part of the segment survives.
fn clip_segment(a: [f64; 2], b: [f64; 2], rect: [f64; 4]) -> Option<([f64; 2], [f64; 2])> {
	let [x_min, y_min, x_max, y_max] = rect;
	let (dx, dy) = (b[0] - a[0], b[1] - a[1]);
	let mut t0 = 0.0_f64;
	let mut t1 = 1.0_f64;
	let checks = [(-dx, a[0] - x_min), (dx, x_max - a[0]), (-dy, a[1] - y_min), (dy, y_max - a[1])];
	for (p, q) in checks {
		if p == 0.0 {
			if q < 0.0 {
				return None;
			}
		} else {
			let r = q / p;
			if p < 0.0 {
				if r > t1 {
					return None;
				}
				t0 = t0.max(r);
			} else {
				if r < t0 {
					return None;
				}
				t1 = t1.min(r);
			}
		}
	}
	if t0 > t1 {
		return None;
	}
	Some(([a[0] + t0 * dx, a[1] + t0 * dy], [a[0] + t1 * dx, a[1] + t1 * dy]))
}

/// Clips a polyline against a rectangle, splitting it into however many contiguous sub-lines
/// survive (a line that exits and re-enters the rectangle yields more than one sub-line).
fn clip_line(line: &[[f64; 2]], rect: [f64; 4]) -> Vec<Vec<[f64; 2]>> {
	let mut out = Vec::new();
	let mut current: Vec<[f64; 2]> = Vec::new();
	for w in line.windows(2) {
		match clip_segment(w[0], w[1], rect) {
			Some((ca, cb)) => {
				if current.last() != Some(&ca) {
					if !current.is_empty() {
						out.push(std::mem::take(&mut current));
					}
					current.push(ca);
				}
				current.push(cb);
			}
			None => {
				if !current.is_empty() {
					out.push(std::mem::take(&mut current));
				}
			}
		}
	}
	if !current.is_empty() {
		out.push(current);
	}
	out
}

fn quantize_point(p: [f64; 2], tile_origin: [f64; 2]) -> [i32; 2] {
	[(p[0] - tile_origin[0]).round() as i32, (p[1] - tile_origin[1]).round() as i32]
}

fn ring_area(ring: &[[i32; 2]]) -> i64 {
	let mut sum = 0i64;
	for w in ring.windows(2) {
		sum += i64::from(w[0][0]) * i64::from(w[1][1]) - i64::from(w[1][0]) * i64::from(w[0][1]);
	}
	sum
}

/// Renders one collected shape into every `RenderedFeature` it produces across its zoom range.
///
/// # Errors
/// Propagates a [`crate::error::PipelineErrorKind::GeometryInvalid`]-classified error if the
/// source geometry is fundamentally unusable for the requested kind (e.g. a `Polygon` request
/// against an empty ring set).
pub fn render(raw_geometry: &RawGeometry, feature_id: u64, request: &RenderRequest) -> Result<Vec<RenderedFeature>> {
	let mut out = Vec::new();
	for zoom in request.zoom_min..=request.zoom_max {
		out.extend(render_at_zoom(raw_geometry, feature_id, request, zoom)?);
	}
	Ok(out)
}

fn render_at_zoom(
	raw_geometry: &RawGeometry,
	feature_id: u64,
	request: &RenderRequest,
	zoom: u8,
) -> Result<Vec<RenderedFeature>> {
	let projected = project(raw_geometry, zoom);

	let shaped = match request.kind {
		GeometryRequest::Centroid => RawGeometry::Point(centroid(&projected)),
		_ => projected,
	};

	let simplified = match &shaped {
		RawGeometry::Point(p) => RawGeometry::Point(*p),
		RawGeometry::Line(line) => RawGeometry::Line(douglas_peucker(line, SIMPLIFY_TOLERANCE_PX)),
		RawGeometry::Polygon(rings) => {
			RawGeometry::Polygon(rings.iter().map(|r| douglas_peucker(r, SIMPLIFY_TOLERANCE_PX)).collect())
		}
	};

	let Some(bounds) = geometry_bounds(&simplified) else {
		return Ok(Vec::new());
	};

	let tile_size = f64::from(EXTENT);
	let n_tiles = 2u32.pow(u32::from(zoom));

	// Points (and centroids, which are reduced to a point above) have no extent to buffer: a
	// point sitting exactly on a tile boundary belongs to exactly one tile, never its neighbors.
	// Buffering point bounds the way line/polygon bounds are buffered below would replicate a
	// boundary point into every adjacent tile.
	if let RawGeometry::Point(p) = &simplified {
		let tx = ((p[0] / tile_size).floor() as i64).clamp(0, i64::from(n_tiles) - 1) as u32;
		let ty = ((p[1] / tile_size).floor() as i64).clamp(0, i64::from(n_tiles) - 1) as u32;
		let origin = [f64::from(tx) * tile_size, f64::from(ty) * tile_size];
		let rect = [origin[0], origin[1], origin[0] + tile_size, origin[1] + tile_size];
		let Some(geometry) = clip_and_quantize(&simplified, request.kind, rect, origin)? else {
			return Ok(Vec::new());
		};
		let tile_id = TileId::from_coord(zoom, tx, ty)?;
		return Ok(vec![RenderedFeature {
			tile_id,
			zoom,
			layer: request.layer.clone(),
			z_order: request.z_order,
			feature_id,
			geometry,
			attrs: request.attrs.clone(),
			group: request.group,
		}]);
	}

	let buffer = request.buffer_px;
	let tx_min = ((bounds[0] - buffer) / tile_size).floor().max(0.0) as u32;
	let ty_min = ((bounds[1] - buffer) / tile_size).floor().max(0.0) as u32;
	let tx_max = (((bounds[2] + buffer) / tile_size).floor() as i64).clamp(0, i64::from(n_tiles) - 1) as u32;
	let ty_max = (((bounds[3] + buffer) / tile_size).floor() as i64).clamp(0, i64::from(n_tiles) - 1) as u32;

	let mut out = Vec::new();
	for ty in ty_min..=ty_max.min(n_tiles.saturating_sub(1)) {
		for tx in tx_min..=tx_max.min(n_tiles.saturating_sub(1)) {
			let origin = [f64::from(tx) * tile_size, f64::from(ty) * tile_size];
			let rect = [origin[0] - buffer, origin[1] - buffer, origin[0] + tile_size + buffer, origin[1] + tile_size + buffer];

			let Some(geometry) = clip_and_quantize(&simplified, request.kind, rect, origin)? else {
				continue;
			};

			let tile_id = TileId::from_coord(zoom, tx, ty)?;
			out.push(RenderedFeature {
				tile_id,
				zoom,
				layer: request.layer.clone(),
				z_order: request.z_order,
				feature_id,
				geometry,
				attrs: request.attrs.clone(),
				group: request.group,
			});
		}
	}
	Ok(out)
}

fn clip_and_quantize(
	geom: &RawGeometry,
	kind: GeometryRequest,
	rect: [f64; 4],
	origin: [f64; 2],
) -> Result<Option<QuantizedGeometry>> {
	match (kind, geom) {
		(GeometryRequest::Point | GeometryRequest::Centroid, RawGeometry::Point(p)) => {
			if p[0] < rect[0] || p[0] > rect[2] || p[1] < rect[1] || p[1] > rect[3] {
				return Ok(None);
			}
			Ok(Some(QuantizedGeometry::Points(vec![quantize_point(*p, origin)])))
		}
		(GeometryRequest::Line, RawGeometry::Line(line)) => {
			let clipped = clip_line(line, rect);
			let lines: Vec<Vec<[i32; 2]>> = clipped
				.into_iter()
				.map(|l| l.into_iter().map(|p| quantize_point(p, origin)).collect::<Vec<_>>())
				.filter(|l: &Vec<[i32; 2]>| line_has_length(l))
				.collect();
			if lines.is_empty() { Ok(None) } else { Ok(Some(QuantizedGeometry::Lines(lines))) }
		}
		(GeometryRequest::Polygon, RawGeometry::Polygon(rings)) => {
			let clipped: Vec<Vec<[i32; 2]>> = rings
				.iter()
				.map(|r| clip_ring(r, rect))
				.filter(|r| r.len() >= 4)
				.map(|r| r.into_iter().map(|p| quantize_point(p, origin)).collect::<Vec<_>>())
				.filter(|r: &Vec<[i32; 2]>| ring_area(r) != 0)
				.collect();
			if clipped.is_empty() { Ok(None) } else { Ok(Some(QuantizedGeometry::Polygons(clipped))) }
		}
		_ => Ok(None),
	}
}

fn line_has_length(points: &[[i32; 2]]) -> bool {
	points.len() >= 2 && points.windows(2).any(|w| w[0] != w[1])
}
