//! C4: `FeatureSort` — external merge sort of [`RenderedFeature`]s keyed by
//! `(tileId, layerRank, zOrder)` (spec.md §4.4). Each writer thread appends sorted chunks to its
//! own file; [`merge_sorted`] performs a k-way merge over every chunk with a binary heap playing
//! the role of a loser tree, so merge-time memory is bounded by `chunks * one buffered record`
//! rather than by total record count.

use crate::renderer::{QuantizedGeometry, RenderedFeature};
use crate::source::TagValue;
use crate::tile_id::TileId;
use anyhow::{Context, Result, bail, ensure};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Default in-memory buffer per writer thread before a chunk is sorted and flushed to disk,
/// divided across `threads` the way spec.md §4.4 describes (`chunkBytes = 1 GiB / threads`).
pub const DEFAULT_TOTAL_CHUNK_BYTES: usize = 1 << 30;

// --- RenderedFeature <-> bytes ------------------------------------------------------------

fn write_string(buf: &mut Vec<u8>, s: &str) {
	let bytes = s.as_bytes();
	buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
	buf.extend_from_slice(bytes);
}

fn write_points(buf: &mut Vec<u8>, points: &[[i32; 2]]) {
	buf.extend_from_slice(&(points.len() as u32).to_le_bytes());
	for p in points {
		buf.extend_from_slice(&p[0].to_le_bytes());
		buf.extend_from_slice(&p[1].to_le_bytes());
	}
}

fn write_rings(buf: &mut Vec<u8>, rings: &[Vec<[i32; 2]>]) {
	buf.extend_from_slice(&(rings.len() as u32).to_le_bytes());
	for ring in rings {
		write_points(buf, ring);
	}
}

fn write_tag_value(buf: &mut Vec<u8>, value: &TagValue) {
	match value {
		TagValue::I64(v) => {
			buf.push(0);
			buf.extend_from_slice(&v.to_le_bytes());
		}
		TagValue::F64(v) => {
			buf.push(1);
			buf.extend_from_slice(&v.to_le_bytes());
		}
		TagValue::Bool(v) => {
			buf.push(2);
			buf.push(u8::from(*v));
		}
		TagValue::Str(v) => {
			buf.push(3);
			write_string(buf, v);
		}
	}
}

/// Serializes one rendered feature to its on-disk payload form (spec.md §3, `FeatureSort
/// record`'s payload). Kept independent of any general-purpose serde format so the sort hot
/// path has no reflection or schema-evolution overhead.
#[must_use]
pub fn encode_rendered_feature(feature: &RenderedFeature) -> Vec<u8> {
	let mut buf = Vec::with_capacity(64);
	buf.extend_from_slice(&feature.tile_id.as_u32().to_le_bytes());
	buf.push(feature.zoom);
	write_string(&mut buf, &feature.layer);
	buf.extend_from_slice(&feature.z_order.to_le_bytes());
	buf.extend_from_slice(&feature.feature_id.to_le_bytes());

	match &feature.geometry {
		QuantizedGeometry::Points(points) => {
			buf.push(0);
			write_points(&mut buf, points);
		}
		QuantizedGeometry::Lines(lines) => {
			buf.push(1);
			write_rings(&mut buf, lines);
		}
		QuantizedGeometry::Polygons(rings) => {
			buf.push(2);
			write_rings(&mut buf, rings);
		}
	}

	buf.extend_from_slice(&(feature.attrs.len() as u32).to_le_bytes());
	for (key, value) in &feature.attrs {
		write_string(&mut buf, key);
		write_tag_value(&mut buf, value);
	}

	match feature.group {
		Some((key, limit)) => {
			buf.push(1);
			buf.extend_from_slice(&key.to_le_bytes());
			buf.extend_from_slice(&limit.to_le_bytes());
		}
		None => buf.push(0),
	}

	buf
}

struct ByteCursor<'a> {
	data: &'a [u8],
	pos: usize,
}

impl<'a> ByteCursor<'a> {
	fn new(data: &'a [u8]) -> Self {
		Self { data, pos: 0 }
	}

	fn take(&mut self, n: usize) -> Result<&'a [u8]> {
		ensure!(self.pos + n <= self.data.len(), "truncated rendered-feature record");
		let slice = &self.data[self.pos..self.pos + n];
		self.pos += n;
		Ok(slice)
	}

	fn u8(&mut self) -> Result<u8> {
		Ok(self.take(1)?[0])
	}

	fn u32(&mut self) -> Result<u32> {
		Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
	}

	fn i32(&mut self) -> Result<i32> {
		Ok(i32::from_le_bytes(self.take(4)?.try_into().unwrap()))
	}

	fn u64(&mut self) -> Result<u64> {
		Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
	}

	fn f64(&mut self) -> Result<f64> {
		Ok(f64::from_le_bytes(self.take(8)?.try_into().unwrap()))
	}

	fn string(&mut self) -> Result<String> {
		let len = self.u32()? as usize;
		Ok(String::from_utf8(self.take(len)?.to_vec())?)
	}

	fn points(&mut self) -> Result<Vec<[i32; 2]>> {
		let len = self.u32()? as usize;
		(0..len).map(|_| Ok([self.i32()?, self.i32()?])).collect()
	}

	fn rings(&mut self) -> Result<Vec<Vec<[i32; 2]>>> {
		let len = self.u32()? as usize;
		(0..len).map(|_| self.points()).collect()
	}
}

/// Deserializes a payload produced by [`encode_rendered_feature`].
///
/// # Errors
/// Returns an error if the bytes are truncated or contain an unrecognized tag.
pub fn decode_rendered_feature(bytes: &[u8]) -> Result<RenderedFeature> {
	let mut cursor = ByteCursor::new(bytes);
	let tile_raw = cursor.u32()?;
	let zoom = cursor.u8()?;
	let layer = cursor.string()?;
	let z_order = cursor.i32()?;
	let feature_id = cursor.u64()?;

	let geometry = match cursor.u8()? {
		0 => QuantizedGeometry::Points(cursor.points()?),
		1 => QuantizedGeometry::Lines(cursor.rings()?),
		2 => QuantizedGeometry::Polygons(cursor.rings()?),
		other => bail!("unknown quantized geometry tag {other}"),
	};

	let attr_count = cursor.u32()? as usize;
	let mut attrs = BTreeMap::new();
	for _ in 0..attr_count {
		let key = cursor.string()?;
		let value = match cursor.u8()? {
			0 => TagValue::I64(i64::from_le_bytes(cursor.take(8)?.try_into().unwrap())),
			1 => TagValue::F64(cursor.f64()?),
			2 => TagValue::Bool(cursor.u8()? != 0),
			3 => TagValue::Str(cursor.string()?),
			other => bail!("unknown tag value tag {other}"),
		};
		attrs.insert(key, value);
	}

	let group = match cursor.u8()? {
		0 => None,
		_ => Some((cursor.u64()?, cursor.u32()?)),
	};

	Ok(RenderedFeature {
		tile_id: TileId::from_u32_unchecked(tile_raw),
		zoom,
		layer,
		z_order,
		feature_id,
		geometry,
		attrs,
		group,
	})
}

// --- chunked writer ------------------------------------------------------------------------

/// Accumulates rendered features for one writer thread, periodically sorting and flushing an
/// in-memory buffer to its own append-only chunk file (spec.md §4.4). Never shared across
/// threads: the "many-writer, one chunk each, no sharing" discipline spec.md §5 requires.
pub struct FeatureSortWriter {
	tmpdir: PathBuf,
	thread_id: usize,
	chunk_bytes_budget: usize,
	buffer: Vec<(u64, Vec<u8>)>,
	buffer_bytes: usize,
	chunk_paths: Vec<PathBuf>,
	next_chunk_idx: usize,
}

impl FeatureSortWriter {
	/// `chunk_bytes_budget` is this thread's share of spec.md §4.4's `chunkBytes`
	/// (`DEFAULT_TOTAL_CHUNK_BYTES / threads` is the usual caller-computed value).
	pub fn new(tmpdir: impl Into<PathBuf>, thread_id: usize, chunk_bytes_budget: usize) -> Self {
		Self {
			tmpdir: tmpdir.into(),
			thread_id,
			chunk_bytes_budget,
			buffer: Vec::new(),
			buffer_bytes: 0,
			chunk_paths: Vec::new(),
			next_chunk_idx: 0,
		}
	}

	/// Appends one rendered feature, keyed by `layer_rank` (the profile's layer registration
	/// order, used as the middle component of the packed sort key).
	///
	/// # Errors
	/// Returns an `IoFailure`-classified error if flushing a full buffer to disk fails.
	pub fn push(&mut self, feature: &RenderedFeature, layer_rank: u16) -> Result<()> {
		let sort_key = feature.tile_id.pack_sort_key(layer_rank, feature.z_order);
		let payload = encode_rendered_feature(feature);
		self.buffer_bytes += payload.len() + 12;
		self.buffer.push((sort_key, payload));
		if self.buffer_bytes >= self.chunk_bytes_budget {
			self.flush_chunk()?;
		}
		Ok(())
	}

	fn flush_chunk(&mut self) -> Result<()> {
		if self.buffer.is_empty() {
			return Ok(());
		}
		// Stable: equal sort keys keep push() order, which is how spec.md §4.4's
		// (chunkId, positionInChunk) tie-break is realized without storing it explicitly.
		self.buffer.sort_by_key(|(key, _)| *key);

		let path = self.tmpdir.join(format!("sort-{:04}-{:06}.chunk", self.thread_id, self.next_chunk_idx));
		let file = File::create(&path).with_context(|| format!("creating sort chunk {}", path.display()))?;
		let mut writer = BufWriter::new(file);
		for (sort_key, payload) in &self.buffer {
			writer.write_all(&sort_key.to_le_bytes())?;
			writer.write_all(&(payload.len() as u32).to_le_bytes())?;
			writer.write_all(payload)?;
		}
		writer.flush()?;

		self.chunk_paths.push(path);
		self.next_chunk_idx += 1;
		self.buffer.clear();
		self.buffer_bytes = 0;
		Ok(())
	}

	/// Flushes any remaining buffered records and returns every chunk file this writer produced.
	///
	/// # Errors
	/// Returns an `IoFailure`-classified error if the final flush fails.
	pub fn finish(mut self) -> Result<Vec<PathBuf>> {
		self.flush_chunk()?;
		Ok(self.chunk_paths)
	}
}

// --- k-way merge ---------------------------------------------------------------------------

struct ChunkCursor {
	reader: BufReader<File>,
	chunk_id: usize,
	next_position: u64,
}

impl ChunkCursor {
	fn open(path: &Path, chunk_id: usize) -> Result<Self> {
		Ok(Self {
			reader: BufReader::new(File::open(path).with_context(|| format!("opening sort chunk {}", path.display()))?),
			chunk_id,
			next_position: 0,
		})
	}

	fn read_next(&mut self) -> Result<Option<(u64, Vec<u8>)>> {
		let mut key_buf = [0u8; 8];
		match self.reader.read_exact(&mut key_buf) {
			Ok(()) => {}
			Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
			Err(e) => return Err(e.into()),
		}
		let sort_key = u64::from_le_bytes(key_buf);
		let mut len_buf = [0u8; 4];
		self.reader.read_exact(&mut len_buf)?;
		let len = u32::from_le_bytes(len_buf) as usize;
		let mut payload = vec![0u8; len];
		self.reader.read_exact(&mut payload)?;
		self.next_position += 1;
		Ok(Some((sort_key, payload)))
	}
}

struct HeapEntry {
	sort_key: u64,
	chunk_id: usize,
	position: u64,
	payload: Vec<u8>,
}

impl PartialEq for HeapEntry {
	fn eq(&self, other: &Self) -> bool {
		self.sort_key == other.sort_key && self.chunk_id == other.chunk_id && self.position == other.position
	}
}
impl Eq for HeapEntry {}

impl Ord for HeapEntry {
	fn cmp(&self, other: &Self) -> Ordering {
		// Reversed: `BinaryHeap` is a max-heap, the merge needs the smallest key out first.
		(other.sort_key, other.chunk_id, other.position).cmp(&(self.sort_key, self.chunk_id, self.position))
	}
}
impl PartialOrd for HeapEntry {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

/// Performs the k-way merge over every chunk file, invoking `emit` once per record in
/// ascending `sortKey` order (ties broken by `(chunkId, positionInChunk)`, spec.md §4.4).
/// Deletes every chunk file once it has been fully consumed.
///
/// # Errors
/// Propagates any I/O or decode error, or whatever `emit` returns.
pub fn merge_sorted(chunk_paths: &[PathBuf], mut emit: impl FnMut(RenderedFeature) -> Result<()>) -> Result<()> {
	let mut cursors: Vec<ChunkCursor> =
		chunk_paths.iter().enumerate().map(|(id, path)| ChunkCursor::open(path, id)).collect::<Result<_>>()?;

	let mut heap = BinaryHeap::with_capacity(cursors.len());
	for cursor in &mut cursors {
		if let Some((sort_key, payload)) = cursor.read_next()? {
			heap.push(HeapEntry {
				sort_key,
				chunk_id: cursor.chunk_id,
				position: cursor.next_position - 1,
				payload,
			});
		}
	}

	while let Some(entry) = heap.pop() {
		let feature = decode_rendered_feature(&entry.payload)?;
		emit(feature)?;

		let cursor = &mut cursors[entry.chunk_id];
		if let Some((sort_key, payload)) = cursor.read_next()? {
			heap.push(HeapEntry {
				sort_key,
				chunk_id: cursor.chunk_id,
				position: cursor.next_position - 1,
				payload,
			});
		}
	}

	for path in chunk_paths {
		if path.exists() {
			std::fs::remove_file(path)?;
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::BTreeMap;
	use tempfile::tempdir;

	fn feature(tile_id: TileId, zoom: u8, feature_id: u64, z_order: i32) -> RenderedFeature {
		RenderedFeature {
			tile_id,
			zoom,
			layer: "roads".to_string(),
			z_order,
			feature_id,
			geometry: QuantizedGeometry::Points(vec![[1, 2]]),
			attrs: BTreeMap::new(),
			group: None,
		}
	}

	#[test]
	fn round_trips_through_encode_decode() {
		let mut attrs = BTreeMap::new();
		attrs.insert("name".to_string(), TagValue::from("Main St"));
		attrs.insert("lanes".to_string(), TagValue::from(2i64));
		let f = RenderedFeature {
			tile_id: TileId::from_coord(10, 3, 5).unwrap(),
			zoom: 10,
			layer: "roads".to_string(),
			z_order: -7,
			feature_id: 42,
			geometry: QuantizedGeometry::Lines(vec![vec![[0, 0], [10, 10]]]),
			attrs,
			group: Some((99, 3)),
		};
		let bytes = encode_rendered_feature(&f);
		let decoded = decode_rendered_feature(&bytes).unwrap();
		assert_eq!(decoded.tile_id, f.tile_id);
		assert_eq!(decoded.zoom, f.zoom);
		assert_eq!(decoded.z_order, f.z_order);
		assert_eq!(decoded.feature_id, f.feature_id);
		assert_eq!(decoded.geometry, f.geometry);
		assert_eq!(decoded.group, f.group);
		assert_eq!(decoded.attrs.get("name").and_then(TagValue::as_str), Some("Main St"));
	}

	#[test]
	fn merge_produces_ascending_sort_key_order() -> Result<()> {
		let dir = tempdir()?;
		let t0 = TileId::from_coord(5, 1, 1)?;
		let t1 = TileId::from_coord(5, 2, 2)?;

		let mut w0 = FeatureSortWriter::new(dir.path(), 0, 1 << 20);
		w0.push(&feature(t1, 5, 1, 0), 0)?;
		w0.push(&feature(t0, 5, 2, 0), 0)?;
		let chunks0 = w0.finish()?;

		let mut w1 = FeatureSortWriter::new(dir.path(), 1, 1 << 20);
		w1.push(&feature(t0, 5, 3, 1), 0)?;
		let chunks1 = w1.finish()?;

		let mut all_chunks = chunks0;
		all_chunks.extend(chunks1);

		let mut seen = Vec::new();
		merge_sorted(&all_chunks, |f| {
			seen.push(f.feature_id);
			Ok(())
		})?;

		// t0 sorts before t1 (smaller tileId); within t0, zOrder 0 before zOrder 1.
		assert_eq!(seen, vec![2, 3, 1]);
		for path in &all_chunks {
			assert!(!path.exists(), "merge must delete consumed chunk files");
		}
		Ok(())
	}

	#[test]
	fn merge_is_stable_on_equal_sort_keys() -> Result<()> {
		let dir = tempdir()?;
		let t = TileId::from_coord(5, 1, 1)?;

		let mut w0 = FeatureSortWriter::new(dir.path(), 0, 1 << 20);
		w0.push(&feature(t, 5, 100, 0), 0)?;
		w0.push(&feature(t, 5, 101, 0), 0)?;
		let chunks = w0.finish()?;

		let mut seen = Vec::new();
		merge_sorted(&chunks, |f| {
			seen.push(f.feature_id);
			Ok(())
		})?;
		assert_eq!(seen, vec![100, 101]);
		Ok(())
	}
}
