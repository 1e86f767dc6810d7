//! C7: `MbtilesWriter` — MVT-encodes each tile batch, gzip-compresses it, and inserts it into an
//! MBTiles SQLite archive (spec.md §4.7). Metadata rows, including the frozen `layerStatsJson`,
//! are written last, once every tile has been inserted.

use crate::group::{LayerBatch, TileBatch};
use crate::renderer::QuantizedGeometry;
use crate::source::TagValue;
use crate::stats::FrozenLayerStats;
use crate::tile_id::TileId;
use anyhow::Result;
use flate2::write::GzEncoder;
use flate2::Compression;
use r2d2::Pool;
use r2d2_sqlite::rusqlite::params;
use r2d2_sqlite::SqliteConnectionManager;
use std::fs::remove_file;
use std::io::Write;
use std::path::Path;
use versatiles_core::json::{JsonObject, JsonValue};
use versatiles_core::types::Blob;
use versatiles_derive::context;
use versatiles_geometry::geo::{GeoFeature, GeoProperties, GeoValue, Geometry};
use versatiles_geometry::vector_tile::{VectorTile, VectorTileLayer};

/// Gzip level spec.md §4.7 names as the default for MVT tile compression.
const GZIP_LEVEL: u32 = 6;

fn gzip(bytes: &[u8]) -> Result<Vec<u8>> {
	let mut encoder = GzEncoder::new(Vec::new(), Compression::new(GZIP_LEVEL));
	encoder.write_all(bytes)?;
	Ok(encoder.finish()?)
}

/// MVT extent baked into every layer this writer produces, matching [`crate::renderer::EXTENT`].
const MVT_EXTENT: u32 = 4096;
/// One transaction covers this many tile inserts (spec.md §4.7's `txnTiles`, default 1000).
const DEFAULT_TXN_TILES: usize = 1000;

/// Bounding box and center the archive's `bounds`/`center` metadata rows describe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MbtilesBounds {
	pub min_lon: f64,
	pub min_lat: f64,
	pub max_lon: f64,
	pub max_lat: f64,
}

impl MbtilesBounds {
	#[must_use]
	pub fn center(self) -> [f64; 2] {
		[(self.min_lon + self.max_lon) / 2.0, (self.min_lat + self.max_lat) / 2.0]
	}
}

/// Everything [`MbtilesWriter::finalize`] needs to write the metadata table.
#[derive(Debug, Clone)]
pub struct MbtilesMetadata {
	pub name: String,
	pub bounds: MbtilesBounds,
	pub minzoom: u8,
	pub maxzoom: u8,
	pub layer_stats: FrozenLayerStats,
}

/// Incrementally builds an MBTiles archive from [`TileBatch`]es, batching inserts into
/// transactions of `txn_tiles` and performing the TMS row flip at write time (this crate carries
/// no reader of its own, so unlike a read/write pair sharing one convention, the flip must happen
/// here rather than at read time).
pub struct MbtilesWriter {
	pool: Pool<SqliteConnectionManager>,
	txn_tiles: usize,
	pending: Vec<(u8, u32, u32, Vec<u8>)>,
	defer_index_creation: bool,
	optimize_db: bool,
	tiles_written: u64,
	bytes_written: u64,
}

impl MbtilesWriter {
	/// Creates a new archive at `path`, overwriting any existing file, and creates the MBTiles
	/// schema. If `defer_index_creation` is set, the unique index on `tiles` is created by
	/// [`MbtilesWriter::finalize`] instead of up front, trading insert-time uniqueness checks for
	/// faster bulk loading.
	///
	/// # Errors
	/// Returns an error if the existing file cannot be removed or the schema cannot be created.
	#[context("Failed to create MBTiles archive at {path:?}")]
	pub fn create(path: &Path, defer_index_creation: bool, optimize_db: bool) -> Result<Self> {
		if path.exists() {
			remove_file(path)?;
		}
		let manager = SqliteConnectionManager::file(path);
		let pool = Pool::builder().max_size(4).build(manager)?;

		let conn = pool.get()?;
		conn.execute_batch(
			"CREATE TABLE metadata (name TEXT, value TEXT, UNIQUE (name));
			 CREATE TABLE tiles (zoom_level INTEGER, tile_column INTEGER, tile_row INTEGER, tile_data BLOB);",
		)?;
		if !defer_index_creation {
			conn.execute_batch(
				"CREATE UNIQUE INDEX tile_index ON tiles (zoom_level, tile_column, tile_row);",
			)?;
		}
		drop(conn);

		Ok(Self {
			pool,
			txn_tiles: DEFAULT_TXN_TILES,
			pending: Vec::with_capacity(DEFAULT_TXN_TILES),
			defer_index_creation,
			optimize_db,
			tiles_written: 0,
			bytes_written: 0,
		})
	}

	#[must_use]
	pub fn tiles_written(&self) -> u64 {
		self.tiles_written
	}

	#[must_use]
	pub fn bytes_written(&self) -> u64 {
		self.bytes_written
	}

	/// Encodes one tile's worth of layers to an MVT blob, gzips it, and queues it for insert.
	/// Flushes a transaction once `txn_tiles` tiles are queued.
	///
	/// # Errors
	/// Propagates MVT encoding failures or SQLite errors from a transaction flush.
	pub fn write_tile(&mut self, batch: TileBatch) -> Result<()> {
		let (level, x, y, bytes) = encode_and_compress_tile(batch)?;
		self.push_encoded(level, x, y, bytes)
	}

	/// Queues an already-encoded, already-gzipped tile for insert, applying the same
	/// `txn_tiles`-bounded transaction batching as [`MbtilesWriter::write_tile`]. Lets
	/// [`crate::engine::PipelineEngine`] run MVT encoding on a worker pool while keeping this
	/// writer the single thread that ever touches the SQLite connection (spec.md §5: "MBTiles
	/// file is single-writer"), handing off finished blobs through a reorder buffer so inserts
	/// still land in ascending tileId order even though encoding completed out of order.
	///
	/// # Errors
	/// Returns an error if a transaction flush fails.
	pub fn push_encoded(&mut self, level: u8, x: u32, y: u32, bytes: Vec<u8>) -> Result<()> {
		self.bytes_written += bytes.len() as u64;
		self.pending.push((level, x, y, bytes));
		if self.pending.len() >= self.txn_tiles {
			self.flush()?;
		}
		Ok(())
	}

	/// Flushes any queued tiles in one transaction, applying the TMS row flip
	/// (`tile_row = 2^z - 1 - y`) per tile.
	///
	/// # Errors
	/// Returns an error if the SQLite transaction fails.
	pub fn flush(&mut self) -> Result<()> {
		if self.pending.is_empty() {
			return Ok(());
		}
		let mut conn = self.pool.get()?;
		let txn = conn.transaction()?;
		for (level, x, y, bytes) in self.pending.drain(..) {
			let max_index = 2u32.pow(u32::from(level)) - 1;
			let tile_row = max_index - y;
			txn.execute(
				"INSERT INTO tiles (zoom_level, tile_column, tile_row, tile_data) VALUES (?1, ?2, ?3, ?4)",
				params![level, x, tile_row, bytes],
			)?;
			self.tiles_written += 1;
		}
		txn.commit()?;
		Ok(())
	}

	/// Writes the metadata table, optionally creates the deferred index, and optionally runs
	/// `VACUUM`/`ANALYZE`. Must be the last call made against this writer.
	///
	/// # Errors
	/// Returns an error if any metadata insert, the deferred index creation, or the
	/// vacuum/analyze pass fails.
	pub fn finalize(mut self, metadata: &MbtilesMetadata) -> Result<()> {
		self.flush()?;

		let conn = self.pool.get()?;
		if self.defer_index_creation {
			conn.execute_batch("CREATE UNIQUE INDEX tile_index ON tiles (zoom_level, tile_column, tile_row);")?;
		}

		let center = metadata.bounds.center();
		let rows: [(&str, String); 8] = [
			("name", metadata.name.clone()),
			("format", "pbf".to_string()),
			("type", "overlay".to_string()),
			("version", "3.0".to_string()),
			(
				"bounds",
				format!(
					"{},{},{},{}",
					metadata.bounds.min_lon, metadata.bounds.min_lat, metadata.bounds.max_lon, metadata.bounds.max_lat
				),
			),
			("center", format!("{},{},{}", center[0], center[1], metadata.maxzoom)),
			("minzoom", metadata.minzoom.to_string()),
			("maxzoom", metadata.maxzoom.to_string()),
		];
		for (name, value) in rows {
			conn.execute("INSERT OR REPLACE INTO metadata (name, value) VALUES (?1, ?2)", params![name, value])?;
		}
		let json = layer_stats_json_string(&metadata.layer_stats);
		conn.execute("INSERT OR REPLACE INTO metadata (name, value) VALUES (?1, ?2)", params!["json", json])?;

		drop(conn);
		if self.optimize_db {
			self.pool.get()?.execute_batch("VACUUM; ANALYZE;")?;
		}
		Ok(())
	}
}

fn layer_stats_json_string(stats: &FrozenLayerStats) -> String {
	let mut wrapper = JsonObject::default();
	wrapper.set("vector_layers", stats.to_json());
	JsonValue::Object(wrapper).stringify()
}

/// Encodes and gzips one tile batch without touching the database, so it can run on an encode
/// worker thread: returns the `(level, x, y)` MVT/XYZ coordinate (not yet TMS-flipped — that
/// happens in [`MbtilesWriter::flush`]) plus the compressed blob.
///
/// # Errors
/// Propagates MVT encoding or gzip failures.
pub fn encode_and_compress_tile(batch: TileBatch) -> Result<(u8, u32, u32, Vec<u8>)> {
	let (level, x, y) = batch.tile_id.to_coord()?;
	debug_assert_eq!(level, batch.zoom);
	let blob = encode_tile(batch)?;
	let bytes = gzip(blob.as_slice())?;
	Ok((level, x, y, bytes))
}

fn encode_tile(batch: TileBatch) -> Result<Blob> {
	let layers = batch
		.layers
		.into_iter()
		.map(layer_to_vector_tile_layer)
		.collect::<Result<Vec<VectorTileLayer>>>()?;
	VectorTile::new(layers).to_blob()
}

fn layer_to_vector_tile_layer(batch: LayerBatch) -> Result<VectorTileLayer> {
	let features = batch.features.into_iter().map(rendered_feature_to_geo_feature).collect::<Result<Vec<_>>>()?;
	VectorTileLayer::from_features(batch.layer, features, MVT_EXTENT, 2)
}

fn rendered_feature_to_geo_feature(feature: crate::renderer::RenderedFeature) -> Result<GeoFeature> {
	let geometry = match feature.geometry {
		QuantizedGeometry::Points(points) => Geometry::new_multi_point(points),
		QuantizedGeometry::Lines(lines) => Geometry::new_multi_line_string(lines),
		QuantizedGeometry::Polygons(rings) => Geometry::new_multi_polygon(group_polygon_rings(rings)),
	};
	let mut geo_feature = GeoFeature::new(geometry);
	geo_feature.set_id(feature.feature_id);
	geo_feature.set_properties(tags_to_properties(&feature.attrs));
	Ok(geo_feature)
}

/// Regroups a flat outer/hole ring list (spec.md §4.3: "outer ring first, then holes") into the
/// nested `polygon-of-rings` shape MVT multipolygons need. Holes are told apart from outer rings
/// by winding: a ring whose signed area has the same sign as the very first ring in the feature
/// starts a new polygon, anything with the opposite sign is a hole of the current one.
fn group_polygon_rings(rings: Vec<Vec<[i32; 2]>>) -> Vec<Vec<Vec<[i32; 2]>>> {
	let mut polygons: Vec<Vec<Vec<[i32; 2]>>> = Vec::new();
	let mut outer_sign: Option<bool> = None;
	for ring in rings {
		let sign = signed_area(&ring) >= 0;
		match outer_sign {
			Some(expected) if sign != expected => {
				if let Some(last) = polygons.last_mut() {
					last.push(ring);
				} else {
					polygons.push(vec![ring]);
				}
			}
			_ => {
				outer_sign = Some(sign);
				polygons.push(vec![ring]);
			}
		}
	}
	polygons
}

fn signed_area(ring: &[[i32; 2]]) -> i64 {
	let mut sum = 0i64;
	for w in ring.windows(2) {
		sum += i64::from(w[0][0]) * i64::from(w[1][1]) - i64::from(w[1][0]) * i64::from(w[0][1]);
	}
	sum
}

fn tags_to_properties(attrs: &std::collections::BTreeMap<String, TagValue>) -> GeoProperties {
	let mut properties = GeoProperties::new();
	for (key, value) in attrs {
		let geo_value = match value {
			TagValue::I64(v) => GeoValue::from(*v),
			TagValue::F64(v) => GeoValue::from(*v),
			TagValue::Bool(v) => GeoValue::from(*v),
			TagValue::Str(v) => GeoValue::from(v.as_str()),
		};
		properties.insert(key.clone(), geo_value);
	}
	properties
}
