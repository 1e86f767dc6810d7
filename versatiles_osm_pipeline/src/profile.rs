//! C9 (profile half): the narrow interface the engine uses to turn one [`SourceFeature`] into
//! zero or more rendered shapes, plus the registry that resolves the CLI's positional
//! `profile-name` argument to a concrete [`Profile`] (spec.md §6, §9).
//!
//! Schema layers (`aerodrome_label` and friends) are out of scope; what is in scope is the
//! tagged-variant dispatch table they would plug into, and one trivial built-in profile so the
//! engine is runnable without an external profile crate.

use crate::config::PipelineConfig;
use crate::multi_expression::MultiExpressionIndex;
use crate::renderer::{GeometryRequest, RenderRequest};
use crate::source::{SourceFeature, SourceKind, TagValue};
use anyhow::{Result, bail};
use std::collections::BTreeMap;

/// Accumulates the shapes a [`Profile`] wants rendered from one source feature. The engine
/// drains it after `process_feature` returns and hands each request, together with the
/// feature's (by-then possibly already resolved) geometry, to [`crate::renderer::render`].
#[derive(Debug, Default)]
pub struct FeatureCollector {
	requests: Vec<RenderRequest>,
}

impl FeatureCollector {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn point(&mut self, layer: impl Into<String>) -> ShapeBuilder<'_> {
		ShapeBuilder::new(self, GeometryRequest::Point, layer)
	}

	pub fn line(&mut self, layer: impl Into<String>) -> ShapeBuilder<'_> {
		ShapeBuilder::new(self, GeometryRequest::Line, layer)
	}

	pub fn polygon(&mut self, layer: impl Into<String>) -> ShapeBuilder<'_> {
		ShapeBuilder::new(self, GeometryRequest::Polygon, layer)
	}

	pub fn centroid(&mut self, layer: impl Into<String>) -> ShapeBuilder<'_> {
		ShapeBuilder::new(self, GeometryRequest::Centroid, layer)
	}

	/// Evaluates a pre-compiled [`MultiExpressionIndex`] against a feature's tags. Exposed on
	/// the collector so a profile doesn't need to carry the index separately.
	#[must_use]
	pub fn match_tags<'a>(tags: &BTreeMap<String, TagValue>, index: &'a MultiExpressionIndex) -> Vec<&'a str> {
		index.matches(tags)
	}

	/// Drains the accumulated requests. Called by the engine, never by a profile.
	pub fn drain(&mut self) -> Vec<RenderRequest> {
		std::mem::take(&mut self.requests)
	}
}

/// Fluent setters for one collected shape, matching spec.md §6's `FeatureCollector` builders.
/// Nothing is recorded until [`ShapeBuilder::emit`] consumes the builder.
pub struct ShapeBuilder<'c> {
	collector: &'c mut FeatureCollector,
	kind: GeometryRequest,
	layer: String,
	zoom_min: u8,
	zoom_max: u8,
	buffer_px: f64,
	z_order: i32,
	attrs: BTreeMap<String, TagValue>,
	group: Option<(u64, u32)>,
}

impl<'c> ShapeBuilder<'c> {
	fn new(collector: &'c mut FeatureCollector, kind: GeometryRequest, layer: impl Into<String>) -> Self {
		Self {
			collector,
			kind,
			layer: layer.into(),
			zoom_min: 0,
			zoom_max: 14,
			buffer_px: crate::renderer::DEFAULT_BUFFER_PX,
			z_order: 0,
			attrs: BTreeMap::new(),
			group: None,
		}
	}

	#[must_use]
	pub fn zoom_range(mut self, min: u8, max: u8) -> Self {
		self.zoom_min = min;
		self.zoom_max = max;
		self
	}

	#[must_use]
	pub fn buffer_px(mut self, px: f64) -> Self {
		self.buffer_px = px;
		self
	}

	#[must_use]
	pub fn z_order(mut self, z_order: i32) -> Self {
		self.z_order = z_order;
		self
	}

	#[must_use]
	pub fn attr(mut self, key: impl Into<String>, value: impl Into<TagValue>) -> Self {
		self.attrs.insert(key.into(), value.into());
		self
	}

	#[must_use]
	pub fn attrs(mut self, attrs: BTreeMap<String, TagValue>) -> Self {
		self.attrs.extend(attrs);
		self
	}

	/// Caps this shape to `limit` survivors sharing `group_key` within its tile+layer
	/// (spec.md §4.5, label density caps).
	#[must_use]
	pub fn group(mut self, group_key: u64, limit: u32) -> Self {
		self.group = Some((group_key, limit));
		self
	}

	/// Commits this shape to the collector.
	pub fn emit(self) {
		self.collector.requests.push(RenderRequest {
			kind: self.kind,
			layer: self.layer,
			zoom_min: self.zoom_min,
			zoom_max: self.zoom_max,
			buffer_px: self.buffer_px,
			z_order: self.z_order,
			attrs: self.attrs,
			group: self.group,
		});
	}
}

/// Schema-specific classifier: decides, per source feature, which layers/shapes it becomes.
/// Implementations must be safe to share across emit-stage worker threads (spec.md §5).
pub trait Profile: Send + Sync {
	/// Classifies one feature, recording zero or more shapes on `collector`.
	///
	/// # Errors
	/// A `ProfileRejected`-classified error is treated as per-feature and non-fatal by the
	/// engine (spec.md §7); returning `Ok(())` having emitted nothing is the normal way to
	/// reject a feature outright.
	fn process_feature(&self, feature: &mut SourceFeature, collector: &mut FeatureCollector) -> Result<()>;

	/// Invoked once after pass-2 completes, for profiles that hold resources to flush/close.
	fn release(&self) -> Result<()> {
		Ok(())
	}
}

/// Emits every source feature's own tags, unfiltered, into a single `debug` layer. Exists so
/// the pipeline is runnable end to end without an external profile crate.
pub struct DebugProfile {
	zoom_min: u8,
	zoom_max: u8,
}

impl DebugProfile {
	#[must_use]
	pub fn new(config: &PipelineConfig) -> Self {
		Self {
			zoom_min: config.minzoom,
			zoom_max: config.maxzoom,
		}
	}
}

impl Profile for DebugProfile {
	fn process_feature(&self, feature: &mut SourceFeature, collector: &mut FeatureCollector) -> Result<()> {
		let attrs = feature.tags.clone();
		let id = feature.id;
		let builder = match feature.kind {
			SourceKind::Node => collector.point("debug"),
			SourceKind::Line | SourceKind::Way => collector.line("debug"),
			SourceKind::Polygon | SourceKind::Relation => collector.polygon("debug"),
		};
		builder
			.zoom_range(self.zoom_min, self.zoom_max)
			.z_order(0)
			.attr("__id", id as i64)
			.attrs(attrs)
			.emit();
		Ok(())
	}
}

/// Assigns a stable rank to every layer name the first time [`crate::engine::PipelineEngine`]
/// sees it emitted. Ranks feed [`crate::tile_id::TileId::pack_sort_key`]'s middle component, so
/// layers always sort in the order a profile first introduces them rather than alphabetically or
/// by hash (spec.md §4.4's sort key packs `layer` so a tile's layers stay grouped).
#[derive(Debug, Default)]
pub struct LayerRegistry {
	ranks: dashmap::DashMap<String, u16>,
	next: std::sync::atomic::AtomicU16,
}

impl LayerRegistry {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns `layer`'s rank, assigning the next free one if this is the first time it's seen.
	/// Safe to call from any number of emit-stage worker threads concurrently.
	pub fn rank_for(&self, layer: &str) -> u16 {
		if let Some(rank) = self.ranks.get(layer) {
			return *rank;
		}
		*self.ranks.entry(layer.to_string()).or_insert_with(|| {
			self.next.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
		})
	}
}

/// Resolves the CLI's positional `profile-name` argument to a constructor for a [`Profile`].
/// Holds factory functions rather than instances so every run gets a fresh profile built
/// against that run's [`PipelineConfig`].
pub struct ProfileRegistry {
	factories: BTreeMap<String, fn(&PipelineConfig) -> Box<dyn Profile>>,
}

impl ProfileRegistry {
	/// Registry pre-populated with every built-in profile (currently just `debug`).
	#[must_use]
	pub fn with_builtins() -> Self {
		let mut registry = Self { factories: BTreeMap::new() };
		registry.register("debug", |config| Box::new(DebugProfile::new(config)));
		registry
	}

	pub fn register(&mut self, name: impl Into<String>, factory: fn(&PipelineConfig) -> Box<dyn Profile>) {
		self.factories.insert(name.into(), factory);
	}

	/// Builds the named profile against `config`.
	///
	/// # Errors
	/// Returns a `BadArgument`-classified error if no profile is registered under `name`.
	pub fn build(&self, name: &str, config: &PipelineConfig) -> Result<Box<dyn Profile>> {
		let Some(factory) = self.factories.get(name) else {
			bail!("unknown profile '{name}'; known profiles: {}", self.names().join(", "));
		};
		Ok(factory(config))
	}

	#[must_use]
	pub fn names(&self) -> Vec<&str> {
		self.factories.keys().map(String::as_str).collect()
	}
}
