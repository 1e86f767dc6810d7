//! This module provides traversal utilities and logic for handling data structures
//! in various orders and sizes. It defines the main `Traversal` type and re-exports
//! `order`, `processing`, and `size` submodules, which collectively provide traversal
//! control, ordering logic, processing strategies, and size calculations.

mod order;
mod processing;
mod progress_tracker;
mod size;
mod traits;

pub use order::TraversalOrder;
pub use processing::{TraversalTranslationStep, translate_traversals};
pub use size::TraversalSize;
pub use traits::TileSourceTraverseExt;

use anyhow::Result;
use versatiles_core::{TileBBox, TileBBoxPyramid};
use versatiles_derive::context;

#[derive(Clone, PartialEq)]
/// Represents a traversal strategy for iterating over tile bounding boxes.
///
/// A `Traversal` combines a `TraversalOrder` (ordering of blocks)
/// and a `TraversalSize` (range of block sizes) to generate
/// an ordered sequence of `TileBBox` instances from a `TileBBoxPyramid`.
pub struct Traversal {
	/// The block ordering strategy.
	pub order: TraversalOrder,
	/// The block size range.
	pub size: TraversalSize,
}

impl Traversal {
	/// Create a new `Traversal` with the given block ordering and size range.
	///
	/// # Parameters
	/// - `order`: the `TraversalOrder` (e.g., depth-first, Hilbert).
	/// - `min_size`: minimum block size in tiles (power of two).
	/// - `max_size`: maximum block size in tiles (power of two).
	///
	/// # Errors
	/// Returns an error if size parameters are invalid (not powers of two or out of range).
	#[must_use = "this returns the new Traversal, it doesn't modify anything"]
	#[context("while creating Traversal with order {order:?}, min_size {min_size}, max_size {max_size}")]
	pub fn new(order: TraversalOrder, min_size: u32, max_size: u32) -> Result<Traversal> {
		Ok(Traversal {
			order,
			size: TraversalSize::new(min_size, max_size)?,
		})
	}

	/// Create a `Traversal` with any order and the specified size range.
	///
	/// Uses `TraversalOrder::AnyOrder` with the same size validation as `new`.
	#[must_use = "this returns the new Traversal, it doesn't modify anything"]
	#[context("while creating Traversal::AnyOrder with min_size {min_size}, max_size {max_size}")]
	pub fn new_any_size(min_size: u32, max_size: u32) -> Result<Traversal> {
		Ok(Traversal {
			order: TraversalOrder::AnyOrder,
			size: TraversalSize::new(min_size, max_size)?,
		})
	}

	/// Create a `Traversal` with any order and the default size range (1 to 2^31).
	#[must_use]
	pub const fn new_any() -> Self {
		Traversal {
			order: TraversalOrder::AnyOrder,
			size: TraversalSize::new_default(),
		}
	}

	/// Return the maximum block size in tiles for this `Traversal`.
	///
	/// # Errors
	/// Returns an error if the size range is invalid.
	#[context("while getting max_size for Traversal {:?}", self.order)]
	pub fn max_size(&self) -> Result<u32> {
		self.size.max_size()
	}

	/// Return the minimum block size in tiles for this `Traversal`.
	///
	/// # Errors
	/// Returns an error if the size range is invalid.
	#[context("while getting min_size for Traversal {:?}", self.order)]
	pub fn min_size(&self) -> Result<u32> {
		self.size.min_size()
	}

	/// Access the `TraversalOrder` (block ordering strategy).
	#[must_use]
	pub fn order(&self) -> &TraversalOrder {
		&self.order
	}

	/// Modify this `Traversal` to be the intersection with another.
	///
	/// Combines size and order; errors if the order or sizes cannot intersect.
	#[context("while intersecting Traversal {:?} with {:?}", self.order, other.order)]
	pub fn intersect(&mut self, other: &Traversal) -> Result<()> {
		self.order.intersect(&other.order)?;
		self.size.intersect(&other.size)?;
		Ok(())
	}

	/// Return a new `Traversal` that is the intersection of this and another, without modifying either.
	#[must_use = "this returns the new Traversal, it doesn't modify either input"]
	#[context("while computing intersected Traversal between {:?} and {:?}", self.order, other.order)]
	pub fn get_intersected(&self, other: &Traversal) -> Result<Traversal> {
		let mut result = self.clone();
		result.intersect(other)?;
		Ok(result)
	}

	/// Traverse the tile pyramid, returning all `TileBBox` in traversal order.
	///
	/// Generates bounding boxes at each level, groups them by block size,
	/// applies the traversal order, and returns a flat vector.
	///
	/// # Parameters
	/// - `pyramid`: the `TileBBoxPyramid` defining the tile grid per zoom level.
	///
	/// # Errors
	/// Returns an error if size computation or ordering fails.
	#[must_use = "this returns the traversed bboxes, it doesn't modify anything"]
	#[context("while traversing pyramid with Traversal {:?}", self.order)]
	pub fn traverse_pyramid(&self, pyramid: &TileBBoxPyramid) -> Result<Vec<TileBBox>> {
		let size = self.max_size()?;
		let mut bboxes: Vec<TileBBox> = pyramid.level_bbox.iter().flat_map(|b| b.iter_bbox_grid(size)).collect();
		self.order.sort_bboxes(&mut bboxes, size);
		Ok(bboxes)
	}

	#[must_use = "this returns the traversal steps, it doesn't modify anything"]
	#[context("while computing traversal translation steps between {:?} and {:?}", self.order, other.order)]
	pub fn get_traversal_steps(&self, other: &Self, pyramid: &TileBBoxPyramid) -> Result<Vec<TraversalTranslationStep>> {
		translate_traversals(pyramid, self, other)
	}

	#[must_use]
	pub fn is_any(&self) -> bool {
		self.order == TraversalOrder::AnyOrder
	}

	pub const ANY: Self = Self::new_any();
}

impl Default for Traversal {
	fn default() -> Self {
		Traversal::ANY
	}
}

impl std::fmt::Debug for Traversal {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "Traversal({},{})", self.order, self.size)
	}
}
