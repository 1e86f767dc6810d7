//! Extension trait for tile source traversal.
//!
//! This module provides [`TileSourceTraverseExt`], an extension trait that adds
//! traversal capabilities to any [`TileSource`] implementation.

use super::{Traversal, TraversalTranslationStep, translate_traversals};
use crate::{ProgressHandle, Tile, TileSource, TilesRuntime, TraversalCache};
use anyhow::Result;
use futures::{StreamExt, future::BoxFuture, stream};
use std::sync::{
	Arc,
	atomic::{AtomicU64, Ordering},
};
use versatiles_core::{TileBBox, TileCoord, TileStream};

/// Helper for consistent progress tracking using midpoint of read/write operations.
struct ProgressTracker {
	progress: ProgressHandle,
	ti_read: AtomicU64,
	ti_write: AtomicU64,
	ti_offset: AtomicU64,
}

impl ProgressTracker {
	fn new(progress: ProgressHandle) -> Self {
		Self {
			progress,
			ti_read: AtomicU64::new(0),
			ti_write: AtomicU64::new(0),
			ti_offset: AtomicU64::new(0),
		}
	}

	fn inc(&self, count: u64) {
		self.ti_offset.fetch_add(count, Ordering::Relaxed);
		self.update_position();
	}

	fn inc_read(&self, value: u64) {
		self.ti_read.fetch_add(value, Ordering::Relaxed);
		self.ti_offset.store(0, Ordering::Relaxed);
		self.update_position();
	}

	fn inc_write(&self, value: u64) {
		self.ti_write.fetch_add(value, Ordering::Relaxed);
		self.ti_offset.store(0, Ordering::Relaxed);
		self.update_position();
	}

	fn inc_read_write(&self, read: u64, write: u64) {
		self.ti_read.fetch_add(read, Ordering::Relaxed);
		self.ti_write.fetch_add(write, Ordering::Relaxed);
		self.ti_offset.store(0, Ordering::Relaxed);
		self.update_position();
	}

	fn update_position(&self) {
		let read = self.ti_read.load(Ordering::Relaxed);
		let write = self.ti_write.load(Ordering::Relaxed);
		let offset = self.ti_offset.load(Ordering::Relaxed);
		self.progress.set_position((read + write + offset) / 2);
	}

	fn finish(&self) {
		self.update_position();
		self.progress.finish();
	}
}

/// Extension trait providing traversal with higher-rank trait bounds (HRTBs).
///
/// This trait is separate from [`TileSource`] to maintain object safety while
/// still supporting complex traversal scenarios that require HRTBs.
///
/// Automatically implemented for all types that implement [`TileSource`].
pub trait TileSourceTraverseExt: TileSource {
	/// Traverses all tiles according to a traversal plan, invoking a callback for each batch.
	///
	/// This method translates between the source's preferred traversal order and the desired
	/// write/consumption order, handling caching for `Push/Pop` phases as needed.
	///
	/// # Arguments
	///
	/// * `traversal_write` - Desired traversal order for consumption
	/// * `callback` - Async function called for each (bbox, stream) pair
	/// * `runtime` - Runtime configuration for caching and progress tracking
	/// * `progress_message` - Optional progress bar label
	fn traverse_all_tiles<'s, 'a, C>(
		&'s self,
		traversal_write: &'s Traversal,
		mut callback: C,
		runtime: TilesRuntime,
		progress_message: Option<&str>,
	) -> impl core::future::Future<Output = Result<()>> + Send + 'a
	where
		C: FnMut(TileBBox, TileStream<'a, Tile>) -> BoxFuture<'a, Result<()>> + Send + 'a,
		's: 'a,
	{
		let progress_message = progress_message.unwrap_or("processing tiles").to_string();

		async move {
			let traversal_steps = translate_traversals(
				&self.metadata().bbox_pyramid,
				&self.metadata().traversal,
				traversal_write,
			)?;

			use TraversalTranslationStep::{Pop, Push, Stream};

			let mut tn_read = 0;
			let mut tn_write = 0;

			for step in &traversal_steps {
				match step {
					Push(bboxes_in, _) => {
						tn_read += bboxes_in.iter().map(TileBBox::count_tiles).sum::<u64>();
					}
					Pop(_, bbox_out) => {
						tn_write += bbox_out.count_tiles();
					}
					Stream(bboxes_in, bbox_out) => {
						tn_read += bboxes_in.iter().map(TileBBox::count_tiles).sum::<u64>();
						tn_write += bbox_out.count_tiles();
					}
				}
			}
			let progress = runtime.create_progress(&progress_message, u64::midpoint(tn_read, tn_write));
			let tracker = Arc::new(ProgressTracker::new(progress));

			let cache = Arc::new(TraversalCache::<(TileCoord, Tile)>::new(runtime.cache_type()));
			for step in traversal_steps {
				match step {
					Push(bboxes, index) => {
						log::trace!("Cache {bboxes:?} at index {index}");
						let limits = versatiles_core::ConcurrencyLimits::default();
						let read_operations = bboxes.iter().map(TileBBox::count_tiles).sum::<u64>();
						stream::iter(bboxes)
							.map(|bbox| {
								let tracker = tracker.clone();
								let c = cache.clone();
								async move {
									let vec = self
										.get_tile_stream(bbox)
										.await?
										.inspect(move || tracker.inc(1))
										.to_vec()
										.await;

									c.append(index, vec)?;

									Ok::<_, anyhow::Error>(())
								}
							})
							.buffer_unordered(limits.io_bound) // I/O-bound: reading tiles from disk/network
							.collect::<Vec<_>>()
							.await
							.into_iter()
							.collect::<Result<Vec<_>>>()?;
						tracker.inc_read(read_operations);
					}
					Pop(index, bbox) => {
						log::trace!("Uncache {bbox:?} at index {index}");
						let vec = cache.take(index)?.unwrap();
						let tracker2 = tracker.clone();
						let stream = TileStream::from_vec(vec).inspect(move || tracker2.inc(1));
						callback(bbox, stream).await?;
						tracker.inc_write(bbox.count_tiles());
					}
					Stream(bboxes, bbox) => {
						log::trace!("Stream {bbox:?}");
						let tracker2 = tracker.clone();
						let read_operations = bboxes.iter().map(TileBBox::count_tiles).sum::<u64>();
						let streams = stream::iter(bboxes).map(move |bbox| {
							let tracker = tracker2.clone();
							async move {
								self.get_tile_stream(bbox).await.unwrap().inspect(move || {
									tracker.inc(2);
								})
							}
						});
						callback(bbox, TileStream::from_streams(streams)).await?;
						tracker.inc_read_write(read_operations, bbox.count_tiles());
					}
				}
			}

			tracker.finish();
			Ok(())
		}
	}
}

// Blanket implementation: all TileSource implementors get traversal support
impl<T: TileSource + ?Sized> TileSourceTraverseExt for T {}
