//! C6: `LayerStats` — the concurrent accumulator of per-layer attribute field types and zoom
//! range that backs `MbtilesMetadata.layerStatsJson` (spec.md §3, §4.6). Every emit-stage
//! worker thread calls [`LayerStats::accept`] for every rendered feature; `freeze()` is called
//! once, after pass-2 and sort/emit have fully drained.

use dashmap::DashMap;
use std::collections::BTreeMap;
use versatiles_core::json::{JsonObject, JsonValue};

use crate::renderer::RenderedFeature;
use crate::source::TagValue;

/// Merged scalar type for one attribute field across every feature observed in a layer.
/// Ordered `Boolean < Number < String` to match the absorption rule in spec.md §3: a string
/// absorbs everything, a number absorbs booleans, nothing absorbs a string back down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FieldType {
	Boolean,
	Number,
	String,
}

impl FieldType {
	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			FieldType::Boolean => "Boolean",
			FieldType::Number => "Number",
			FieldType::String => "String",
		}
	}
}

impl From<&TagValue> for FieldType {
	fn from(value: &TagValue) -> Self {
		match value {
			TagValue::Bool(_) => FieldType::Boolean,
			TagValue::I64(_) | TagValue::F64(_) => FieldType::Number,
			TagValue::Str(_) => FieldType::String,
		}
	}
}

#[derive(Debug, Clone)]
struct LayerAccumulator {
	fields: BTreeMap<String, FieldType>,
	minzoom: u8,
	maxzoom: u8,
}

/// Thread-safe, lock-free accumulator over `layerName -> {fields, minzoom, maxzoom}`. Built on
/// `dashmap` (sharded, internally-locked maps) the way the rest of the workspace reaches for
/// concurrent structures instead of a single `Mutex<HashMap<..>>`.
#[derive(Debug, Default)]
pub struct LayerStats {
	layers: DashMap<String, LayerAccumulator>,
}

impl LayerStats {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Records one rendered feature's layer, zoom and attribute types. Safe to call from any
	/// number of threads concurrently (spec.md §4.6: "safe under arbitrary interleaving").
	pub fn accept(&self, feature: &RenderedFeature) {
		let mut entry = self.layers.entry(feature.layer.clone()).or_insert_with(|| LayerAccumulator {
			fields: BTreeMap::new(),
			minzoom: feature.zoom,
			maxzoom: feature.zoom,
		});
		entry.minzoom = entry.minzoom.min(feature.zoom);
		entry.maxzoom = entry.maxzoom.max(feature.zoom);
		for (key, value) in &feature.attrs {
			let incoming = FieldType::from(value);
			entry
				.fields
				.entry(key.clone())
				.and_modify(|existing| *existing = (*existing).max(incoming))
				.or_insert(incoming);
		}
	}

	/// Consumes the accumulator into the final, immutable metadata structure. Call once every
	/// producer thread has finished (spec.md §3: "frozen before MBTiles metadata write").
	#[must_use]
	pub fn freeze(self) -> FrozenLayerStats {
		let mut layers: Vec<(String, LayerAccumulator)> = self.layers.into_iter().collect();
		layers.sort_by(|a, b| a.0.cmp(&b.0));
		FrozenLayerStats {
			layers: layers
				.into_iter()
				.map(|(name, acc)| FrozenLayer {
					name,
					fields: acc.fields,
					minzoom: acc.minzoom,
					maxzoom: acc.maxzoom,
				})
				.collect(),
		}
	}
}

/// One layer's final, immutable metadata entry.
#[derive(Debug, Clone, PartialEq)]
pub struct FrozenLayer {
	pub name: String,
	pub fields: BTreeMap<String, FieldType>,
	pub minzoom: u8,
	pub maxzoom: u8,
}

/// The final `layerStatsJson` content, ready to be embedded in MBTiles metadata (spec.md §4.7).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrozenLayerStats {
	pub layers: Vec<FrozenLayer>,
}

impl FrozenLayerStats {
	/// Renders the layer stats the way `MbtilesMetadata.layerStatsJson` (spec.md §3) expects:
	/// one object per layer with `fields`, `minzoom`, `maxzoom`.
	#[must_use]
	pub fn to_json(&self) -> JsonValue {
		JsonValue::Array(versatiles_core::json::JsonArray(
			self
				.layers
				.iter()
				.map(|layer| {
					let mut fields = JsonObject::default();
					for (name, ty) in &layer.fields {
						fields.set(name, ty.as_str());
					}
					let mut obj = JsonObject::default();
					obj.set("id", layer.name.as_str());
					obj.set("fields", JsonValue::Object(fields));
					obj.set("minzoom", layer.minzoom);
					obj.set("maxzoom", layer.maxzoom);
					JsonValue::Object(obj)
				})
				.collect(),
		)
	}

	/// Overall zoom range across every layer, used for `MbtilesMetadata.minzoom`/`maxzoom`.
	#[must_use]
	pub fn overall_zoom_range(&self) -> Option<(u8, u8)> {
		let min = self.layers.iter().map(|l| l.minzoom).min()?;
		let max = self.layers.iter().map(|l| l.maxzoom).max()?;
		Some((min, max))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::renderer::QuantizedGeometry;
	use crate::tile_id::TileId;
	use pretty_assertions::assert_eq;
	use std::collections::BTreeMap;
	use std::sync::Arc;
	use std::thread;

	fn feature(layer: &str, zoom: u8, attrs: BTreeMap<String, TagValue>) -> RenderedFeature {
		RenderedFeature {
			tile_id: TileId::from_coord(zoom, 0, 0).unwrap(),
			zoom,
			layer: layer.to_string(),
			z_order: 0,
			feature_id: 1,
			geometry: QuantizedGeometry::Points(vec![[0, 0]]),
			attrs,
			group: None,
		}
	}

	#[test]
	fn string_absorbs_number_and_boolean() {
		let stats = LayerStats::new();
		let mut a = BTreeMap::new();
		a.insert("a".to_string(), TagValue::I64(1));
		stats.accept(&feature("L1", 3, a));

		let mut b = BTreeMap::new();
		b.insert("a".to_string(), TagValue::Str("x".into()));
		stats.accept(&feature("L1", 4, b));

		let frozen = stats.freeze();
		let layer = &frozen.layers[0];
		assert_eq!(layer.name, "L1");
		assert_eq!(layer.fields["a"], FieldType::String);
		assert_eq!(layer.minzoom, 3);
		assert_eq!(layer.maxzoom, 4);
	}

	#[test]
	fn number_absorbs_boolean_but_not_string() {
		let stats = LayerStats::new();
		let mut a = BTreeMap::new();
		a.insert("n".to_string(), TagValue::Bool(false));
		stats.accept(&feature("L1", 0, a));
		let mut b = BTreeMap::new();
		b.insert("n".to_string(), TagValue::I64(5));
		stats.accept(&feature("L1", 0, b));
		let frozen = stats.freeze();
		assert_eq!(frozen.layers[0].fields["n"], FieldType::Number);
	}

	#[test]
	fn type_merge_is_order_independent_under_concurrent_writers() {
		let stats = Arc::new(LayerStats::new());
		let mut handles = Vec::new();
		for i in 0..8u8 {
			let stats = Arc::clone(&stats);
			handles.push(thread::spawn(move || {
				let mut attrs = BTreeMap::new();
				attrs.insert("a".to_string(), if i % 2 == 0 { TagValue::I64(1) } else { TagValue::Str("x".into()) });
				stats.accept(&feature("L1", i, attrs));
			}));
		}
		for h in handles {
			h.join().unwrap();
		}
		let frozen = stats.freeze();
		assert_eq!(frozen.layers[0].fields["a"], FieldType::String);
		assert_eq!(frozen.layers[0].minzoom, 0);
		assert_eq!(frozen.layers[0].maxzoom, 7);
	}

	#[test]
	fn overall_zoom_range_spans_every_layer() {
		let stats = LayerStats::new();
		stats.accept(&feature("L1", 2, BTreeMap::new()));
		stats.accept(&feature("L2", 9, BTreeMap::new()));
		let frozen = stats.freeze();
		assert_eq!(frozen.overall_zoom_range(), Some((2, 9)));
	}
}
