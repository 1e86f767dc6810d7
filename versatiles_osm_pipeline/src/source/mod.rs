//! C2: source reader interface consumed by the engine. The engine sees only [`SourceFeature`]
//! and [`SourceReader`] — concrete readers for OSM PBF, ESRI shapefiles and the Natural Earth
//! SQLite dump live in the sibling modules.

pub mod natural_earth;
pub mod pbf;
pub mod shapefile_reader;

use anyhow::Result;
use std::cell::OnceCell;
use std::collections::BTreeMap;

/// What an OSM element was before it reached the renderer. Shapefile and Natural Earth
/// features are always reported as `Polygon` or `Line`, matching their source schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
	Node,
	Way,
	Relation,
	Polygon,
	Line,
}

/// An open scalar tag/attribute value. Mirrors the scalar types the spec allows in
/// `SourceFeature.tags`.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
	I64(i64),
	F64(f64),
	Bool(bool),
	Str(String),
}

impl From<&str> for TagValue {
	fn from(v: &str) -> Self {
		TagValue::Str(v.to_string())
	}
}
impl From<String> for TagValue {
	fn from(v: String) -> Self {
		TagValue::Str(v)
	}
}
impl From<i64> for TagValue {
	fn from(v: i64) -> Self {
		TagValue::I64(v)
	}
}
impl From<f64> for TagValue {
	fn from(v: f64) -> Self {
		TagValue::F64(v)
	}
}
impl From<bool> for TagValue {
	fn from(v: bool) -> Self {
		TagValue::Bool(v)
	}
}

impl TagValue {
	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			TagValue::Str(s) => Some(s),
			_ => None,
		}
	}
}

/// Coordinates in the shape a [`crate::renderer::FeatureRenderer`] needs: plain WGS84
/// degree pairs, rings closed for polygons. Kept independent of `versatiles_geometry`'s
/// `Geometry` enum so the renderer can clip/simplify without round-tripping through it
/// until the final, already-quantized, tile-local emission step.
#[derive(Debug, Clone, PartialEq)]
pub enum RawGeometry {
	Point([f64; 2]),
	Line(Vec<[f64; 2]>),
	/// Outer ring first, then holes. Each ring is closed (`first == last`).
	Polygon(Vec<Vec<[f64; 2]>>),
}

/// Role a member plays in a relation, e.g. `"outer"`/`"inner"` for multipolygons.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoleInfo {
	pub role: Option<String>,
}

/// One element read from a source, with geometry resolved lazily: pass-2 readers hand the
/// engine a thunk so a profile that rejects a feature on tags alone never pays for
/// node-store lookups or ring assembly.
pub struct SourceFeature {
	pub id: u64,
	pub kind: SourceKind,
	pub tags: BTreeMap<String, TagValue>,
	pub role_info: RoleInfo,
	geometry_thunk: Option<Box<dyn FnOnce() -> Result<RawGeometry> + Send>>,
	geometry_cache: OnceCell<RawGeometry>,
}

impl SourceFeature {
	pub fn new(
		id: u64,
		kind: SourceKind,
		tags: BTreeMap<String, TagValue>,
		geometry_thunk: impl FnOnce() -> Result<RawGeometry> + Send + 'static,
	) -> Self {
		Self {
			id,
			kind,
			tags,
			role_info: RoleInfo::default(),
			geometry_thunk: Some(Box::new(geometry_thunk)),
			geometry_cache: OnceCell::new(),
		}
	}

	/// Resolves and caches the geometry. The first call runs the thunk (node lookups,
	/// ring assembly, ...); later calls return the cached result.
	///
	/// # Errors
	/// Propagates whatever the thunk returns, typically a `MissingNodeReference` or a
	/// `GeometryInvalid` classified error.
	pub fn geometry(&mut self) -> Result<&RawGeometry> {
		if self.geometry_cache.get().is_none() {
			// `take` so a thunk that errors can still be retried by a later call instead of
			// leaving behind a placeholder that would panic.
			let thunk = self.geometry_thunk.take().ok_or_else(|| anyhow::anyhow!("geometry thunk already consumed"))?;
			let geom = thunk()?;
			let _ = self.geometry_cache.set(geom);
		}
		Ok(self.geometry_cache.get().unwrap())
	}

	#[must_use]
	pub fn tag(&self, key: &str) -> Option<&TagValue> {
		self.tags.get(key)
	}
}

/// A finite, restartable stream of [`SourceFeature`]s. OSM readers restart from offset zero
/// to support the two-pass design; shapefile and Natural Earth readers are single-pass and
/// only ever `open()`ed once.
pub trait SourceReader {
	/// Visits every feature in source order, invoking `visit` for each. Implementations
	/// must stop and propagate the first error `visit` returns.
	fn for_each(&mut self, visit: &mut dyn FnMut(SourceFeature) -> Result<()>) -> Result<()>;
}
