//! C5: `FeatureGroup` — turns the sorted stream [`crate::sort::merge_sorted`] produces into
//! per-tile batches, split by layer, with group-key dedup and (optional) adjacent-line merging
//! applied within each tile+layer (spec.md §4.5).

use crate::renderer::{QuantizedGeometry, RenderedFeature};
use crate::tile_id::TileId;
use itertools::Itertools;
use std::collections::HashMap;

/// One layer's worth of features within a single tile, in `(zOrder asc, featureId asc)` order
/// (restored explicitly by [`finalize_batch`]; the external sort only guarantees tile/layer
/// adjacency, not exact intra-layer order).
#[derive(Debug, Clone)]
pub struct LayerBatch {
	pub layer: String,
	pub features: Vec<RenderedFeature>,
}

/// Every feature destined for one output tile, split by layer.
#[derive(Debug, Clone)]
pub struct TileBatch {
	pub tile_id: TileId,
	pub zoom: u8,
	pub layers: Vec<LayerBatch>,
}

/// Accumulates the sorted stream into [`TileBatch`]es. The sort key packs `tileId` in the high
/// bits and `layerRank` next, so features of the same tile (and within it, the same layer)
/// always arrive contiguously — no re-sorting is needed here, only splitting.
#[derive(Debug, Default)]
pub struct TileBatcher {
	current: Option<(TileId, u8)>,
	buffer: Vec<RenderedFeature>,
}

impl TileBatcher {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Feeds one feature from the merge. Returns a finished, processed batch whenever `feature`
	/// belongs to a different tile than the one currently buffered.
	pub fn push(&mut self, feature: RenderedFeature) -> Option<TileBatch> {
		let key = (feature.tile_id, feature.zoom);
		let flushed = match self.current {
			Some(current) if current != key => self.flush(),
			None => {
				self.current = Some(key);
				None
			}
			_ => None,
		};
		if flushed.is_some() {
			self.current = Some(key);
		}
		self.buffer.push(feature);
		flushed
	}

	/// Flushes whatever is currently buffered, if anything. Call once after the last `push`.
	pub fn finish(&mut self) -> Option<TileBatch> {
		self.flush()
	}

	fn flush(&mut self) -> Option<TileBatch> {
		let (tile_id, zoom) = self.current.take()?;
		let features = std::mem::take(&mut self.buffer);
		if features.is_empty() {
			return None;
		}
		Some(finalize_batch(tile_id, zoom, features))
	}
}

/// Splits a tile's features into contiguous per-layer runs, applies group-key/limit dedup, and
/// merges adjacent same-attribute lines sharing an endpoint (spec.md §4.5). Polygon union is
/// the other merge spec.md allows; it is not performed here (see DESIGN.md) — same-attribute
/// adjacent polygons are kept as separate features instead of being unioned.
fn finalize_batch(tile_id: TileId, zoom: u8, features: Vec<RenderedFeature>) -> TileBatch {
	// Features of the same tile already arrive grouped by layer (the sort key packs layer rank
	// right after tileId), so a single `chunk_by` pass is enough to split the contiguous runs —
	// no re-sorting or hashing needed.
	let mut layers: Vec<LayerBatch> = features
		.into_iter()
		.chunk_by(|f| f.layer.clone())
		.into_iter()
		.map(|(layer, group)| LayerBatch { layer, features: group.collect() })
		.collect();

	for layer in &mut layers {
		// The sort key only coarsely folds zOrder (see `TileId::pack_sort_key`), so it gets
		// records tile- and layer-adjacent but does not guarantee exact intra-layer order.
		// Restore spec.md invariant #2 ((zOrder asc, featureId asc) within a tile+layer)
		// explicitly here, where a tile's batch is bounded in size and fully in memory.
		layer.features.sort_by_key(|f| (f.z_order, f.feature_id));
		apply_group_limits(&mut layer.features);
		merge_adjacent_lines(&mut layer.features);
	}

	TileBatch { tile_id, zoom, layers }
}

/// Retains at most `limit` features per `groupKey` within one tile+layer, in existing
/// (zOrder, featureId) order — so the kept survivors are always the "first" `limit` by draw
/// order, matching spec.md's label-density-cap scenario.
fn apply_group_limits(features: &mut Vec<RenderedFeature>) {
	let mut seen: HashMap<u64, u32> = HashMap::new();
	features.retain(|f| {
		let Some((group_key, limit)) = f.group else {
			return true;
		};
		let count = seen.entry(group_key).or_insert(0);
		*count += 1;
		*count <= limit
	});
}

/// Concatenates consecutive same-attribute line features whose quantized endpoints coincide.
/// Intentionally conservative: only merges adjacent entries in the already-sorted run, which is
/// sufficient for the common case (a long way rendered in multiple passes) without requiring a
/// full spatial index.
fn merge_adjacent_lines(features: &mut Vec<RenderedFeature>) {
	let mut merged: Vec<RenderedFeature> = Vec::with_capacity(features.len());
	for feature in features.drain(..) {
		let QuantizedGeometry::Lines(new_lines) = feature.geometry else {
			merged.push(feature);
			continue;
		};

		let merged_into_prev = merged.last_mut().is_some_and(|prev| {
			if prev.attrs != feature.attrs {
				return false;
			}
			let QuantizedGeometry::Lines(prev_lines) = &mut prev.geometry else {
				return false;
			};
			merge_line_sets(prev_lines, new_lines.clone());
			true
		});

		if !merged_into_prev {
			merged.push(RenderedFeature {
				geometry: QuantizedGeometry::Lines(new_lines),
				..feature
			});
		}
	}
	*features = merged;
}

fn merge_line_sets(into: &mut Vec<Vec<[i32; 2]>>, mut from: Vec<Vec<[i32; 2]>>) {
	'outer: for new_line in from.drain(..) {
		for existing in into.iter_mut() {
			if existing.last() == new_line.first() {
				existing.extend(new_line.into_iter().skip(1));
				continue 'outer;
			}
			if existing.first() == new_line.last() {
				let mut combined = new_line;
				combined.extend(existing.drain(..).skip(1));
				*existing = combined;
				continue 'outer;
			}
		}
		into.push(new_line);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::source::TagValue;
	use std::collections::BTreeMap;

	fn feature(tile_id: TileId, layer: &str, feature_id: u64, group: Option<(u64, u32)>) -> RenderedFeature {
		RenderedFeature {
			tile_id,
			zoom: 5,
			layer: layer.to_string(),
			z_order: 0,
			feature_id,
			geometry: QuantizedGeometry::Points(vec![[0, 0]]),
			attrs: BTreeMap::new(),
			group,
		}
	}

	#[test]
	fn batcher_splits_on_tile_change() {
		let t0 = TileId::from_coord(5, 1, 1).unwrap();
		let t1 = TileId::from_coord(5, 2, 2).unwrap();
		let mut batcher = TileBatcher::new();

		assert!(batcher.push(feature(t0, "a", 1, None)).is_none());
		assert!(batcher.push(feature(t0, "a", 2, None)).is_none());
		let batch = batcher.push(feature(t1, "a", 3, None)).expect("tile changed, must flush");
		assert_eq!(batch.tile_id, t0);
		assert_eq!(batch.layers[0].features.len(), 2);

		let last = batcher.finish().expect("remaining buffer must flush");
		assert_eq!(last.tile_id, t1);
	}

	#[test]
	fn features_split_into_contiguous_layer_runs() {
		let t = TileId::from_coord(5, 1, 1).unwrap();
		let features =
			vec![feature(t, "water", 1, None), feature(t, "water", 2, None), feature(t, "roads", 3, None)];
		let batch = finalize_batch(t, 5, features);
		assert_eq!(batch.layers.len(), 2);
		assert_eq!(batch.layers[0].layer, "water");
		assert_eq!(batch.layers[0].features.len(), 2);
		assert_eq!(batch.layers[1].layer, "roads");
	}

	#[test]
	fn group_limit_keeps_only_first_n_per_key() {
		let t = TileId::from_coord(5, 1, 1).unwrap();
		let features: Vec<_> = (0..10).map(|i| feature(t, "labels", i, Some((7, 3)))).collect();
		let batch = finalize_batch(t, 5, features);
		assert_eq!(batch.layers[0].features.len(), 3);
		let ids: Vec<_> = batch.layers[0].features.iter().map(|f| f.feature_id).collect();
		assert_eq!(ids, vec![0, 1, 2]);
	}

	#[test]
	fn group_limit_is_independent_per_key() {
		let t = TileId::from_coord(5, 1, 1).unwrap();
		let mut features = vec![feature(t, "labels", 1, Some((1, 1))), feature(t, "labels", 2, Some((2, 1)))];
		features.push(feature(t, "labels", 3, Some((1, 1))));
		let batch = finalize_batch(t, 5, features);
		let ids: Vec<_> = batch.layers[0].features.iter().map(|f| f.feature_id).collect();
		assert_eq!(ids, vec![1, 2]);
	}

	#[test]
	fn adjacent_lines_with_coincident_endpoints_are_concatenated() {
		let t = TileId::from_coord(5, 1, 1).unwrap();
		let mut a = feature(t, "roads", 1, None);
		a.geometry = QuantizedGeometry::Lines(vec![vec![[0, 0], [10, 0]]]);
		let mut b = feature(t, "roads", 2, None);
		b.geometry = QuantizedGeometry::Lines(vec![vec![[10, 0], [20, 0]]]);

		let batch = finalize_batch(t, 5, vec![a, b]);
		assert_eq!(batch.layers[0].features.len(), 1);
		match &batch.layers[0].features[0].geometry {
			QuantizedGeometry::Lines(lines) => assert_eq!(lines[0], vec![[0, 0], [10, 0], [20, 0]]),
			_ => panic!("expected a merged line"),
		}
	}

	#[test]
	fn lines_with_different_attrs_are_not_merged() {
		let t = TileId::from_coord(5, 1, 1).unwrap();
		let mut a = feature(t, "roads", 1, None);
		a.geometry = QuantizedGeometry::Lines(vec![vec![[0, 0], [10, 0]]]);
		a.attrs.insert("name".to_string(), TagValue::from("A St"));
		let mut b = feature(t, "roads", 2, None);
		b.geometry = QuantizedGeometry::Lines(vec![vec![[10, 0], [20, 0]]]);
		b.attrs.insert("name".to_string(), TagValue::from("B St"));

		let batch = finalize_batch(t, 5, vec![a, b]);
		assert_eq!(batch.layers[0].features.len(), 2);
	}
}
