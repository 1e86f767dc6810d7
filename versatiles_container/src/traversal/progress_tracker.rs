//! Progress tracking utilities for tile traversal operations.
//!
//! This module provides [`ProgressTracker`], a helper struct for consistent
//! progress tracking using the midpoint of read/write operations.

use crate::ProgressHandle;
use std::sync::atomic::{AtomicU64, Ordering};

/// Helper for consistent progress tracking using midpoint of read/write operations.
///
/// The tracker maintains separate counters for read and write operations, plus an
/// offset counter for intermediate progress. The reported position is always the
/// midpoint: `(read + write + offset) / 2`.
///
/// This approach provides smooth progress indication when read and write operations
/// happen at different rates or in separate phases (e.g., Push/Pop caching).
pub(crate) struct ProgressTracker {
	progress: ProgressHandle,
	ti_read: AtomicU64,
	ti_write: AtomicU64,
	ti_offset: AtomicU64,
}

impl ProgressTracker {
	/// Create a new progress tracker wrapping the given progress handle.
	pub fn new(progress: ProgressHandle) -> Self {
		Self {
			progress,
			ti_read: AtomicU64::new(0),
			ti_write: AtomicU64::new(0),
			ti_offset: AtomicU64::new(0),
		}
	}

	/// Increment the offset counter by the given count.
	///
	/// Used for intermediate progress within a read or write phase.
	pub fn inc(&self, count: u64) {
		self.ti_offset.fetch_add(count, Ordering::Relaxed);
		self.update_position();
	}

	/// Increment the read counter and reset the offset.
	///
	/// Called when a read operation completes.
	pub fn inc_read(&self, value: u64) {
		self.ti_read.fetch_add(value, Ordering::Relaxed);
		self.ti_offset.store(0, Ordering::Relaxed);
		self.update_position();
	}

	/// Increment the write counter and reset the offset.
	///
	/// Called when a write operation completes.
	pub fn inc_write(&self, value: u64) {
		self.ti_write.fetch_add(value, Ordering::Relaxed);
		self.ti_offset.store(0, Ordering::Relaxed);
		self.update_position();
	}

	/// Increment both read and write counters and reset the offset.
	///
	/// Called when a streaming operation completes (simultaneous read+write).
	pub fn inc_read_write(&self, read: u64, write: u64) {
		self.ti_read.fetch_add(read, Ordering::Relaxed);
		self.ti_write.fetch_add(write, Ordering::Relaxed);
		self.ti_offset.store(0, Ordering::Relaxed);
		self.update_position();
	}

	/// Update the progress handle with the current midpoint position.
	fn update_position(&self) {
		let read = self.ti_read.load(Ordering::Relaxed);
		let write = self.ti_write.load(Ordering::Relaxed);
		let offset = self.ti_offset.load(Ordering::Relaxed);
		self.progress.set_position((read + write + offset) / 2);
	}

	/// Mark the progress as finished.
	pub fn finish(&self) {
		self.progress.finish();
	}
}
