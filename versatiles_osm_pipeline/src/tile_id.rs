//! 32-bit tile identifiers whose byte order matches Hilbert-curve order within a zoom,
//! with zoom levels concatenated ascending — the sort key every downstream stage relies on.

use anyhow::Result;
use versatiles_core::TileCoord3;
use versatiles_core::utils::HilbertIndex;

/// Opaque tile identifier. Lexicographic (i.e. numeric) ordering of `TileId` values equals
/// Hilbert-curve order over `(x, y)` within a zoom, with zooms concatenated ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileId(u32);

impl TileId {
	/// Builds the tile id for a coordinate. Zoom levels up to 14 fit comfortably in 32 bits
	/// (the Hilbert index of the highest `z=14` tile is well under `2^32`).
	pub fn from_coord(level: u8, x: u32, y: u32) -> Result<TileId> {
		let coord = TileCoord3::new(level, x, y)?;
		let index = coord.get_hilbert_index()?;
		Ok(TileId(u32::try_from(index).expect("z<=14 hilbert index fits in u32")))
	}

	#[must_use]
	pub fn as_u32(self) -> u32 {
		self.0
	}

	/// Reconstructs a `TileId` from a raw value previously obtained via [`TileId::as_u32`]
	/// (e.g. when deserializing a `FeatureSort` record). Does not revalidate that the value is
	/// a genuine Hilbert index; only ever call this on values this module itself produced.
	#[must_use]
	pub fn from_u32_unchecked(value: u32) -> TileId {
		TileId(value)
	}

	/// Recovers the `(level, x, y)` tile coordinate this id was built from.
	pub fn to_coord(self) -> Result<(u8, u32, u32)> {
		let coord = TileCoord3::from_hilbert_index(u64::from(self.0))?;
		Ok((coord.level, coord.x, coord.y))
	}

	/// Packs this tile id into the high bits of a `FeatureSort` sort key, so that a byte-wise
	/// comparator over sort keys groups records by tile first and, within a tile, by layer
	/// rank and a coarsely folded zOrder. The folded zOrder only coarsens the external merge's
	/// comparisons (most real zOrder values collide into the same folded bucket); it is not
	/// enough on its own to guarantee `(zOrder, featureId)` order within a tile+layer. The sort
	/// only needs to get records tile- and layer-adjacent; [`crate::group::finalize_batch`]
	/// explicitly re-sorts each `(tile, layer)` run by `(zOrder, featureId)` once that batch
	/// (bounded in size) is in memory.
	#[must_use]
	pub fn pack_sort_key(self, layer_rank: u16, z_order: i32) -> u64 {
		// High 32 bits: tileId. Next 16: layer rank, so layers sort in the profile's
		// registration order within a tile. Low 16: zOrder folded to an unsigned,
		// order-preserving representation (saturating, since this is only a coarse key).
		let folded = (i64::from(z_order) - i64::from(i32::MIN)).clamp(0, i64::from(u16::MAX)) as u16;
		(u64::from(self.0) << 32) | (u64::from(layer_rank) << 16) | u64::from(folded)
	}
}
