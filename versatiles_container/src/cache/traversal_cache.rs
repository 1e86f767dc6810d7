//! Specialized cache for tile traversal reordering.
//!
//! `TraversalCache<V>` provides a simple append-and-take cache optimized for the
//! tile traversal use case, where tiles are temporarily cached during Push phases
//! and retrieved during Pop phases.
//!
//! Unlike the generic `CacheMap`, this cache:
//! - Uses `usize` keys directly (no string conversion)
//! - Only provides `append` and `take` operations
//! - Uses simpler filenames for disk storage

use crate::cache::{cache_type::CacheType, traits::CacheValue};
use anyhow::Result;
use dashmap::DashMap;
use std::{
	fmt::Debug,
	fs::{File, OpenOptions, create_dir_all, remove_dir_all, remove_file, write},
	io::{Cursor, Read, Write},
	marker::PhantomData,
	path::PathBuf,
};
use uuid::Uuid;
use versatiles_derive::context;

/// A cache for temporarily storing tiles during traversal reordering.
///
/// Supports both in-memory and disk-backed storage, selected at runtime
/// via [`CacheType`].
pub enum TraversalCache<V: CacheValue> {
	/// In-memory cache using a concurrent hash map.
	Memory(DashMap<usize, Vec<V>>),
	/// Disk-backed cache storing values in binary files.
	Disk {
		path: PathBuf,
		_marker: PhantomData<V>,
	},
}

impl<V: CacheValue> TraversalCache<V> {
	/// Create a new cache using the specified cache type.
	///
	/// * `InMemory` -> uses an in-process concurrent map.
	/// * `Disk(path)` -> creates a unique subdirectory under `path`.
	#[must_use]
	pub fn new(cache_type: &CacheType) -> Self {
		match cache_type {
			CacheType::InMemory => Self::Memory(DashMap::new()),
			CacheType::Disk(base_path) => {
				let path = base_path.join(format!("traversal_{}", Uuid::new_v4()));
				create_dir_all(&path).ok();
				Self::Disk {
					path,
					_marker: PhantomData,
				}
			}
		}
	}

	/// Append values to the cache entry at `index`.
	///
	/// Creates a new entry if the index doesn't exist yet.
	#[context("Failed to append to traversal cache at index {}", index)]
	pub fn append(&self, index: usize, values: Vec<V>) -> Result<()> {
		match self {
			Self::Memory(map) => {
				map.entry(index).or_default().extend(values);
				Ok(())
			}
			Self::Disk { path, .. } => {
				let file_path = path.join(format!("{index}.bin"));
				let buffer = Self::values_to_buffer(&values)?;
				if file_path.exists() {
					OpenOptions::new()
						.append(true)
						.open(&file_path)?
						.write_all(&buffer)?;
				} else {
					write(&file_path, buffer)?;
				}
				Ok(())
			}
		}
	}

	/// Take and return all values at `index`, removing them from the cache.
	///
	/// Returns `Ok(None)` if no entry exists at the index.
	#[context("Failed to take from traversal cache at index {}", index)]
	pub fn take(&self, index: usize) -> Result<Option<Vec<V>>> {
		match self {
			Self::Memory(map) => Ok(map.remove(&index).map(|(_, v)| v)),
			Self::Disk { path, .. } => {
				let file_path = path.join(format!("{index}.bin"));
				if file_path.exists() {
					let mut file = File::open(&file_path)?;
					let mut data = Vec::new();
					file.read_to_end(&mut data)?;
					remove_file(&file_path)?;
					Ok(Some(Self::buffer_to_values(&data)?))
				} else {
					Ok(None)
				}
			}
		}
	}

	/// Serialize values into a binary buffer.
	fn values_to_buffer(values: &[V]) -> Result<Vec<u8>> {
		let mut buf = Vec::new();
		for value in values {
			value.write_to_cache(&mut buf)?;
		}
		Ok(buf)
	}

	/// Deserialize values from a binary buffer.
	fn buffer_to_values(buf: &[u8]) -> Result<Vec<V>> {
		let mut reader = Cursor::new(buf);
		let mut vec = Vec::new();
		while reader.position() < buf.len() as u64 {
			vec.push(V::read_from_cache(&mut reader)?);
		}
		Ok(vec)
	}

	/// Clean up cache resources.
	fn clean_up(&self) {
		match self {
			Self::Memory(map) => map.clear(),
			Self::Disk { path, .. } => {
				remove_dir_all(path).ok();
			}
		}
	}
}

impl<V: CacheValue> Drop for TraversalCache<V> {
	fn drop(&mut self) {
		self.clean_up();
	}
}

impl<V: CacheValue> Debug for TraversalCache<V> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Memory(map) => {
				write!(f, "TraversalCache::Memory({} entries)", map.len())
			}
			Self::Disk { path, .. } => {
				write!(f, "TraversalCache::Disk({})", path.display())
			}
		}
	}
}
