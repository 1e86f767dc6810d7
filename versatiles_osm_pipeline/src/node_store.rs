//! C1: `NodeLocationStore` — a persistent `nodeId -> (lon, lat)` table, built sequentially in
//! pass-1 and read random-access in pass-2 so way/relation geometries can be rehydrated without
//! keeping the OSM node graph in memory.

use anyhow::{Result, bail, ensure};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use versatiles_derive::context;

/// Every Nth entry is kept in the in-memory sparse index; a lookup is one index probe
/// (binary search) plus a bounded linear scan of at most `SPARSE_INDEX_STRIDE` on-disk records.
const SPARSE_INDEX_STRIDE: usize = 256;

/// On-disk record: `(nodeId:u64, packedLonLat:u64)`, 16 bytes. Lon/lat are packed as
/// fixed-point 32-bit integers at 1e-7 degree resolution, matching OSM's own coordinate
/// precision. The sparse index keeps resident memory to `|nodes| / SPARSE_INDEX_STRIDE` entries.
const RECORD_SIZE: usize = 16;

fn pack_lon_lat(lon: f64, lat: f64) -> u64 {
	let lon_fp = ((lon * 1e7).round() as i32) as u32;
	let lat_fp = ((lat * 1e7).round() as i32) as u32;
	(u64::from(lon_fp) << 32) | u64::from(lat_fp)
}

fn unpack_lon_lat(packed: u64) -> (f64, f64) {
	let lon_fp = (packed >> 32) as u32 as i32;
	let lat_fp = (packed & 0xFFFF_FFFF) as u32 as i32;
	(f64::from(lon_fp) / 1e7, f64::from(lat_fp) / 1e7)
}

/// Write-side handle, owned exclusively by pass-1. `put` requires monotonically
/// nondecreasing `nodeId`s, matching the ascending-id invariant OSM PBF files guarantee.
pub struct NodeLocationStoreWriter {
	path: PathBuf,
	writer: BufWriter<File>,
	last_node_id: Option<u64>,
	count: u64,
}

impl NodeLocationStoreWriter {
	pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
		let path = path.into();
		let file = File::create(&path)?;
		Ok(Self {
			path,
			writer: BufWriter::new(file),
			last_node_id: None,
			count: 0,
		})
	}

	/// Appends one node. `node_id` must be `>=` every previously written id.
	///
	/// # Errors
	/// Returns an `IoFailure`-classified error if the append fails (e.g. disk full).
	pub fn put(&mut self, node_id: u64, lon: f64, lat: f64) -> Result<()> {
		debug_assert!(
			self.last_node_id.is_none_or(|prev| node_id >= prev),
			"NodeLocationStore.put requires nondecreasing nodeId, got {node_id} after {:?}",
			self.last_node_id
		);
		self.writer.write_all(&node_id.to_le_bytes())?;
		self.writer.write_all(&pack_lon_lat(lon, lat).to_le_bytes())?;
		self.last_node_id = Some(node_id);
		self.count += 1;
		Ok(())
	}

	/// Flushes and finalizes the store, returning a read-only handle plus the number of
	/// nodes written (surfaced in [`crate::error::RunStats::nodes_indexed`]).
	pub fn finish(mut self) -> Result<(NodeLocationStore, u64)> {
		self.writer.flush()?;
		drop(self.writer);
		let store = NodeLocationStore::open(&self.path)?;
		Ok((store, self.count))
	}
}

/// Read-only handle, shared (via `Clone`, each clone opens its own file descriptor) across
/// pass-2 worker threads.
pub struct NodeLocationStore {
	path: PathBuf,
	/// `(nodeId, fileOffset)` for every `SPARSE_INDEX_STRIDE`-th record.
	sparse_index: Vec<(u64, u64)>,
	record_count: u64,
}

impl NodeLocationStore {
	fn open(path: &Path) -> Result<Self> {
		let file = File::open(path)?;
		let len = file.metadata()?.len();
		ensure!(len % RECORD_SIZE as u64 == 0, "node store file size is not a multiple of the record size");
		let record_count = len / RECORD_SIZE as u64;

		let mut reader = BufReader::new(file);
		let mut sparse_index = Vec::with_capacity((record_count as usize / SPARSE_INDEX_STRIDE) + 1);
		let mut buf = [0u8; RECORD_SIZE];
		for i in 0..record_count {
			if i as usize % SPARSE_INDEX_STRIDE == 0 {
				let offset = i * RECORD_SIZE as u64;
				reader.seek(SeekFrom::Start(offset))?;
				reader.read_exact(&mut buf)?;
				let node_id = u64::from_le_bytes(buf[0..8].try_into().unwrap());
				sparse_index.push((node_id, offset));
			}
		}

		Ok(Self {
			path: path.to_path_buf(),
			sparse_index,
			record_count,
		})
	}

	/// Looks up a node by id. Returns `Ok(None)` if the id was never written in pass-1 —
	/// callers translate that into a `MissingNodeReference` for the referencing way/relation.
	#[context("Failed to look up node {node_id} in the node location store")]
	pub fn get(&self, node_id: u64) -> Result<Option<(f64, f64)>> {
		if self.sparse_index.is_empty() {
			return Ok(None);
		}
		let start_idx = match self.sparse_index.binary_search_by_key(&node_id, |&(id, _)| id) {
			Ok(i) => i,
			Err(0) => return Ok(None),
			Err(i) => i - 1,
		};
		let (_, start_offset) = self.sparse_index[start_idx];
		let end_offset = self
			.sparse_index
			.get(start_idx + 1)
			.map_or(self.record_count * RECORD_SIZE as u64, |&(_, off)| off);

		let mut file = File::open(&self.path)?;
		file.seek(SeekFrom::Start(start_offset))?;
		let span = (end_offset - start_offset) as usize;
		let mut page = vec![0u8; span];
		file.read_exact(&mut page)?;

		for chunk in page.chunks_exact(RECORD_SIZE) {
			let id = u64::from_le_bytes(chunk[0..8].try_into().unwrap());
			if id == node_id {
				let packed = u64::from_le_bytes(chunk[8..16].try_into().unwrap());
				return Ok(Some(unpack_lon_lat(packed)));
			}
			if id > node_id {
				break;
			}
		}
		Ok(None)
	}

	#[must_use]
	pub fn len(&self) -> u64 {
		self.record_count
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.record_count == 0
	}

	/// Deletes the backing file, reclaiming disk ahead of the sort/emit stages.
	///
	/// # Errors
	/// Returns an `IoFailure`-classified error if the file cannot be removed.
	pub fn delete(self) -> Result<()> {
		if self.path.exists() {
			std::fs::remove_file(&self.path)?;
		}
		Ok(())
	}
}

/// Raised when a way or relation references a node id absent from the store. Carries the
/// offending node id so callers can log it and bump [`crate::error::RunStats::missing_node_references`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingNodeReference(pub u64);

impl std::fmt::Display for MissingNodeReference {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "node {} was never indexed in pass 1", self.0)
	}
}

impl std::error::Error for MissingNodeReference {}

/// Looks up a node, turning a miss into a typed `MissingNodeReference` error.
pub fn require_node(store: &NodeLocationStore, node_id: u64) -> Result<(f64, f64)> {
	match store.get(node_id)? {
		Some(coord) => Ok(coord),
		None => bail!(MissingNodeReference(node_id)),
	}
}
