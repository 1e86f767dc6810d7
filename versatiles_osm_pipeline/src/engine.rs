//! C8: `PipelineEngine` — stages the rest of the crate into the dataflow spec.md §2 and §4.8
//! describe: `Readers -> Profile.processFeature -> FeatureRenderer -> FeatureGroup.accept
//! (buffered -> FeatureSort) -> FeatureSort.sort -> FeatureGroup.iterate -> MbtilesWriter`, run
//! as the state machine from spec.md §4.8:
//! `Init -> Pass1 -> (optional Wikidata) -> AuxReaders -> Pass2 -> DropNodeDb -> Sort -> Emit ->
//! Finalize -> Done`, with `Aborted` reachable from any stage.
//!
//! Workers are OS threads reading from bounded channels (spec.md §5 rules out an event loop or
//! cooperative yielding); a single `cancel` flag, polled at every queue operation, drives
//! best-effort cancellation.

use crate::config::{Bounds, PipelineConfig};
use crate::error::{PipelineErrorKind, RunStats};
use crate::group::TileBatcher;
use crate::mbtiles_writer::{self, MbtilesBounds, MbtilesMetadata, MbtilesWriter};
use crate::node_store::{MissingNodeReference, NodeLocationStore};
use crate::profile::{FeatureCollector, LayerRegistry, Profile};
use crate::renderer::{self, RenderRequest};
use crate::sort::{self, FeatureSortWriter};
use crate::source::natural_earth::NaturalEarthReader;
use crate::source::pbf::{self, OsmPbfReader};
use crate::source::shapefile_reader::ShapefileReader;
use crate::source::{SourceFeature, SourceReader};
use crate::stats::LayerStats;
use anyhow::{Context, Result, bail};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use parking_lot::Mutex as PlMutex;
use std::sync::mpsc::sync_channel;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Depth of the bounded channel between a source's single reader thread and its worker pool.
/// Small on purpose: a full channel is the backpressure mechanism spec.md §4.8 calls for.
const CHANNEL_CAPACITY: usize = 256;

/// Logs at most one warning per `RATE_LIMIT_WINDOW` for a given per-feature error kind, so a
/// source full of `GeometryInvalid`/`MissingNodeReference` records cannot flood stderr
/// (spec.md §7: "logged with rate-limit").
struct RateLimiter {
	last: PlMutex<Option<Instant>>,
	window: Duration,
}

impl RateLimiter {
	fn new(window: Duration) -> Self {
		Self { last: PlMutex::new(None), window }
	}

	fn allow(&self) -> bool {
		let mut last = self.last.lock();
		let now = Instant::now();
		if last.is_none_or(|t| now.duration_since(t) >= self.window) {
			*last = Some(now);
			true
		} else {
			false
		}
	}
}

/// Thread-safe accumulator mirroring [`RunStats`] but built from atomics so every emit-stage
/// worker can update it without a lock on the hot path; [`Counters::snapshot`] freezes it once.
#[derive(Default)]
struct Counters {
	nodes_indexed: AtomicU64,
	ways_read: AtomicU64,
	relations_read: AtomicU64,
	features_rendered: AtomicU64,
	features_dropped_degenerate: AtomicU64,
	features_rejected_by_profile: AtomicU64,
	missing_node_references: AtomicU64,
	tiles_written: AtomicU64,
	bytes_written: AtomicU64,
}

impl Counters {
	fn snapshot(&self) -> RunStats {
		RunStats {
			nodes_indexed: self.nodes_indexed.load(Ordering::Relaxed),
			ways_read: self.ways_read.load(Ordering::Relaxed),
			relations_read: self.relations_read.load(Ordering::Relaxed),
			features_rendered: self.features_rendered.load(Ordering::Relaxed),
			features_dropped_degenerate: self.features_dropped_degenerate.load(Ordering::Relaxed),
			features_rejected_by_profile: self.features_rejected_by_profile.load(Ordering::Relaxed),
			missing_node_references: self.missing_node_references.load(Ordering::Relaxed),
			tiles_written: self.tiles_written.load(Ordering::Relaxed),
			bytes_written: self.bytes_written.load(Ordering::Relaxed),
		}
	}
}

/// Running min/max over every raw-geometry coordinate seen, used to infer `bounds=world`
/// (spec.md §6: "inferred from input") without a dedicated pre-scan pass.
struct BoundsTracker(PlMutex<Option<[f64; 4]>>);

impl BoundsTracker {
	fn new() -> Self {
		Self(PlMutex::new(None))
	}

	fn observe(&self, points: &[[f64; 2]]) {
		if points.is_empty() {
			return;
		}
		let mut guard = self.0.lock();
		let mut acc = guard.unwrap_or([f64::MAX, f64::MAX, f64::MIN, f64::MIN]);
		for p in points {
			acc[0] = acc[0].min(p[0]);
			acc[1] = acc[1].min(p[1]);
			acc[2] = acc[2].max(p[0]);
			acc[3] = acc[3].max(p[1]);
		}
		*guard = Some(acc);
	}

	fn finish(self) -> Option<[f64; 4]> {
		self.0.into_inner()
	}
}

fn raw_geometry_points(raw: &crate::source::RawGeometry) -> Vec<[f64; 2]> {
	use crate::source::RawGeometry;
	match raw {
		RawGeometry::Point(p) => vec![*p],
		RawGeometry::Line(line) => line.clone(),
		RawGeometry::Polygon(rings) => rings.iter().flatten().copied().collect(),
	}
}

/// Stages a single source (OSM pass-2, a centerline/water-polygons shapefile, or the Natural
/// Earth dump) through `Profile -> FeatureRenderer -> FeatureSort`: one reader thread drives the
/// restartable [`SourceReader`], `threads` worker threads pull from a shared bounded channel and
/// do the rendering, each owning its own [`FeatureSortWriter`] (spec.md §5: "one chunk per
/// writer, no sharing").
struct EmitContext<'a> {
	profile: &'a (dyn Profile),
	layer_registry: &'a LayerRegistry,
	stats: &'a LayerStats,
	counters: &'a Counters,
	bounds_tracker: Option<&'a BoundsTracker>,
	cancel: &'a AtomicBool,
	tmpdir: &'a std::path::Path,
	threads: usize,
	chunk_bytes_budget: usize,
	geometry_invalid_limiter: &'a RateLimiter,
	profile_rejected_limiter: &'a RateLimiter,
	missing_node_limiter: &'a RateLimiter,
	writer_id_offset: usize,
	loginterval: Duration,
}

fn run_source(mut reader: impl SourceReader + Send, ctx: &EmitContext<'_>) -> Result<Vec<PathBuf>> {
	let (tx, rx) = sync_channel::<SourceFeature>(CHANNEL_CAPACITY);
	let rx = Arc::new(Mutex::new(rx));
	let first_error: Arc<Mutex<Option<anyhow::Error>>> = Arc::new(Mutex::new(None));

	std::thread::scope(|scope| {
		let mut worker_handles = Vec::with_capacity(ctx.threads);
		for i in 0..ctx.threads {
			let rx = Arc::clone(&rx);
			let first_error = Arc::clone(&first_error);
			let writer_id = ctx.writer_id_offset + i;
			worker_handles.push(scope.spawn(move || -> Vec<PathBuf> {
				let mut writer = FeatureSortWriter::new(ctx.tmpdir, writer_id, ctx.chunk_bytes_budget);
				loop {
					if ctx.cancel.load(Ordering::Relaxed) {
						break;
					}
					let feature = {
						let guard = rx.lock().unwrap();
						guard.recv()
					};
					let Ok(feature) = feature else { break };
					if let Err(e) = process_one_feature(feature, ctx, &mut writer) {
						*first_error.lock().unwrap() = Some(e);
						ctx.cancel.store(true, Ordering::Relaxed);
						break;
					}
				}
				writer.finish().unwrap_or_default()
			}));
		}

		let reader_result = {
			let cancel = ctx.cancel;
			let mut last_log = Instant::now();
			let mut read = 0u64;
			reader.for_each(&mut |feature| {
				if cancel.load(Ordering::Relaxed) {
					bail!("pipeline cancelled");
				}
				read += 1;
				if last_log.elapsed() >= ctx.loginterval {
					info!(
						"progress: {read} source feature(s) read, {} rendered so far",
						ctx.counters.features_rendered.load(Ordering::Relaxed)
					);
					last_log = Instant::now();
				}
				tx.send(feature).map_err(|_| anyhow::anyhow!("worker pool disconnected"))
			})
		};
		drop(tx);

		let mut chunk_paths = Vec::new();
		for handle in worker_handles {
			chunk_paths.extend(handle.join().map_err(|_| anyhow::anyhow!("renderer worker thread panicked"))?);
		}

		if let Some(err) = first_error.lock().unwrap().take() {
			return Err(err);
		}
		if let Err(e) = reader_result {
			if !ctx.cancel.load(Ordering::Relaxed) {
				return Err(e);
			}
		}
		Ok(chunk_paths)
	})
}

fn process_one_feature(mut feature: SourceFeature, ctx: &EmitContext<'_>, writer: &mut FeatureSortWriter) -> Result<()> {
	use crate::source::SourceKind;
	match feature.kind {
		SourceKind::Way => {
			ctx.counters.ways_read.fetch_add(1, Ordering::Relaxed);
		}
		SourceKind::Relation => {
			ctx.counters.relations_read.fetch_add(1, Ordering::Relaxed);
		}
		_ => {}
	}

	let mut collector = FeatureCollector::new();
	if let Err(e) = ctx.profile.process_feature(&mut feature, &mut collector) {
		ctx.counters.features_rejected_by_profile.fetch_add(1, Ordering::Relaxed);
		if ctx.profile_rejected_limiter.allow() {
			warn!("profile rejected feature {}: {e:#}", feature.id);
		}
		return Ok(());
	}

    let requests: Vec<RenderRequest> = collector.drain();
    if requests.is_empty() {
        return Ok(());
    }

	let geometry = match feature.geometry() {
		Ok(g) => g,
		Err(e) => {
			if let Some(missing) = e.downcast_ref::<MissingNodeReference>() {
				let _ = missing;
				ctx.counters.missing_node_references.fetch_add(1, Ordering::Relaxed);
				if ctx.missing_node_limiter.allow() {
					warn!("skipping feature {} referencing an unindexed node: {e:#}", feature.id);
				}
			} else {
				ctx.counters.features_dropped_degenerate.fetch_add(1, Ordering::Relaxed);
				if ctx.geometry_invalid_limiter.allow() {
					warn!("skipping feature {} with unresolvable geometry: {e:#}", feature.id);
				}
			}
			return Ok(());
		}
	};

	if let Some(tracker) = ctx.bounds_tracker {
		tracker.observe(&raw_geometry_points(geometry));
	}

	for request in requests {
		let layer_rank = ctx.layer_registry.rank_for(&request.layer);
		match renderer::render(geometry, feature.id, &request) {
			Ok(rendered) => {
				for rf in rendered {
					ctx.stats.accept(&rf);
					ctx.counters.features_rendered.fetch_add(1, Ordering::Relaxed);
					writer.push(&rf, layer_rank)?;
				}
			}
			Err(e) => {
				ctx.counters.features_dropped_degenerate.fetch_add(1, Ordering::Relaxed);
				if ctx.geometry_invalid_limiter.allow() {
					warn!("dropping degenerate render of feature {}: {e:#}", feature.id);
				}
			}
		}
	}
	Ok(())
}

/// Composes every other module into one pipeline run. Holds no state across calls: each
/// [`PipelineEngine::run`] is a fresh run against a [`PipelineConfig`] and a [`Profile`].
pub struct PipelineEngine {
	cancel: Arc<AtomicBool>,
}

impl Default for PipelineEngine {
	fn default() -> Self {
		Self::new()
	}
}

impl PipelineEngine {
	#[must_use]
	pub fn new() -> Self {
		Self { cancel: Arc::new(AtomicBool::new(false)) }
	}

	/// Exposes the cancel signal spec.md §5 describes: callers (e.g. a signal handler installed
	/// by the CLI binary) can request a clean shutdown from another thread.
	#[must_use]
	pub fn cancel_handle(&self) -> Arc<AtomicBool> {
		Arc::clone(&self.cancel)
	}

	/// Runs the full pipeline: pass-1 (if an OSM node graph needs indexing), the auxiliary
	/// single-pass sources, pass-2, the external sort, and tile emission, in the order spec.md
	/// §4.8's state machine names. On any fatal error, partial output is deleted and the error
	/// is returned classified by [`PipelineErrorKind`] (best-effort: the classification lives in
	/// the error's `anyhow::Context`/downcast chain, not a dedicated wrapper type, matching how
	/// the rest of this crate classifies errors).
	///
	/// # Errors
	/// Returns the first fatal error encountered by any stage. Per-feature errors
	/// (`GeometryInvalid`, `ProfileRejected`, `MissingNodeReference`) never reach this far; they
	/// are counted in the returned [`RunStats`] instead.
	pub fn run(&self, config: &PipelineConfig, profile: &dyn Profile) -> Result<RunStats> {
		std::fs::create_dir_all(&config.tmpdir)
			.with_context(|| format!("creating tmpdir {}", config.tmpdir.display()))?;

		let result = self.run_inner(config, profile);

		if result.is_err() || self.cancel.load(Ordering::Relaxed) {
			cleanup_partial_output(config);
		}

		let _ = profile.release();
		result
	}

	fn run_inner(&self, config: &PipelineConfig, profile: &dyn Profile) -> Result<RunStats> {
		let counters = Counters::default();
		let layer_stats_owned = LayerStats::new();
		let layer_registry = LayerRegistry::new();
		let bounds_tracker_owned = BoundsTracker::new();
		let geometry_invalid_limiter = RateLimiter::new(Duration::from_secs(5));
		let profile_rejected_limiter = RateLimiter::new(Duration::from_secs(5));
		let missing_node_limiter = RateLimiter::new(Duration::from_secs(5));
		let counters = &counters;
		let layer_stats = &layer_stats_owned;
		let layer_registry = &layer_registry;
		let bounds_tracker = &bounds_tracker_owned;
		let geometry_invalid_limiter = &geometry_invalid_limiter;
		let profile_rejected_limiter = &profile_rejected_limiter;
		let missing_node_limiter = &missing_node_limiter;

		let node_db_path = config.tmpdir.join("node.db");

		// --- Pass 1: index every OSM node's (lon, lat) ---------------------------------------
		info!("pass-1: indexing node locations from {}", config.input.display());
		let (node_store, nodes_indexed) = pbf::run_pass1(&config.input, &node_db_path)
			.with_context(|| "pass-1 failed")?;
		counters.nodes_indexed.fetch_add(nodes_indexed, Ordering::Relaxed);
		let node_store = Arc::new(node_store);

		// --- Optional Wikidata cache load ------------------------------------------------------
		crate::translations::validate_fetch_wikidata(config.fetch_wikidata, &config.wikidata_cache);
		if let Some(cache_path) = crate::translations::cache_path_if_enabled(config.use_wikidata, &config.wikidata_cache)
		{
			match crate::translations::TranslationCache::load(&cache_path) {
				Ok(cache) => info!("loaded {} cached Wikidata translation(s)", cache.len()),
				Err(e) => warn!("failed to load wikidata cache {}: {e:#}", cache_path.display()),
			}
		}

		let chunk_bytes_budget = sort::DEFAULT_TOTAL_CHUNK_BYTES / config.threads.max(1);
		let mut all_chunk_paths: Vec<PathBuf> = Vec::new();
		let mut writer_id_counter = 0usize;

		let mut next_writer_block = |n: usize| {
			let start = writer_id_counter;
			writer_id_counter += n;
			start
		};

		// --- Auxiliary single-pass sources (spec.md §4.2: shapefile/Natural Earth are single-pass) ---
		for (label, path) in [
			("centerline", config.centerline.as_ref()),
			("water_polygons", config.water_polygons.as_ref()),
		] {
			if let Some(path) = path {
				info!("reading auxiliary source {label} from {}", path.display());
				let reader = ShapefileReader::new(path.clone());
				let ctx = EmitContext {
					profile,
					layer_registry,
					stats: layer_stats,
					counters,
					bounds_tracker: matches!(config.bounds, Bounds::World).then_some(bounds_tracker),
					cancel: &self.cancel,
					tmpdir: &config.tmpdir,
					threads: config.threads,
					chunk_bytes_budget,
					geometry_invalid_limiter,
					profile_rejected_limiter,
					missing_node_limiter,
					writer_id_offset: next_writer_block(config.threads),
					loginterval: config.loginterval,
				};
				all_chunk_paths.extend(run_source(reader, &ctx).with_context(|| format!("reading {label}"))?);
				self.bail_if_cancelled()?;
			}
		}

		if let Some(path) = &config.natural_earth {
			info!("reading Natural Earth dump from {}", path.display());
			let reader = NaturalEarthReader::new(path.clone());
			let ctx = EmitContext {
				profile,
				layer_registry,
				stats: layer_stats,
				counters,
				bounds_tracker: matches!(config.bounds, Bounds::World).then_some(bounds_tracker),
				cancel: &self.cancel,
				tmpdir: &config.tmpdir,
				threads: config.threads,
				chunk_bytes_budget,
				geometry_invalid_limiter,
				profile_rejected_limiter,
				missing_node_limiter,
				writer_id_offset: next_writer_block(config.threads),
				loginterval: config.loginterval,
			};
			all_chunk_paths.extend(run_source(reader, &ctx).context("reading natural_earth")?);
			self.bail_if_cancelled()?;
		}

		// --- Pass 2: stream nodes/ways/relations, classify, render ----------------------------
		info!("pass-2: rendering features from {}", config.input.display());
		let reader = OsmPbfReader::new(config.input.clone(), Arc::clone(&node_store));
		let ctx = EmitContext {
			profile,
			layer_registry,
			stats: layer_stats,
			counters,
			bounds_tracker: matches!(config.bounds, Bounds::World).then_some(bounds_tracker),
			cancel: &self.cancel,
			tmpdir: &config.tmpdir,
			threads: config.threads,
			chunk_bytes_budget,
			geometry_invalid_limiter,
			profile_rejected_limiter,
			missing_node_limiter,
			writer_id_offset: next_writer_block(config.threads),
			loginterval: config.loginterval,
		};
		all_chunk_paths.extend(run_source(reader, &ctx).context("pass-2 failed")?);
		self.bail_if_cancelled()?;

		// --- DropNodeDb: reclaim disk before sort/emit -----------------------------------------
		let node_store =
			Arc::try_unwrap(node_store).unwrap_or_else(|_| panic!("node store still referenced after pass-2"));
		node_store.delete().context("deleting node store")?;

		// --- Sort: external k-way merge ---------------------------------------------------------
		info!("sorting {} chunk file(s)", all_chunk_paths.len());
		let explicit_bounds = match config.bounds {
			Bounds::Explicit(b) => Some(b),
			Bounds::World => None,
		};

		let mut writer = MbtilesWriter::create(&config.output, config.defer_mbtiles_index_creation, config.optimize_db)
			.with_context(|| format!("creating {}", config.output.display()))?;

		let (encode_tx, encode_rx) = sync_channel::<(u64, crate::group::TileBatch)>(CHANNEL_CAPACITY);
		let encode_rx = Arc::new(Mutex::new(encode_rx));
		let (result_tx, result_rx) = std::sync::mpsc::channel::<(u64, Result<(u8, u32, u32, Vec<u8>)>)>();

		std::thread::scope(|scope| -> Result<()> {
			let mut encoder_handles = Vec::with_capacity(config.threads);
			for _ in 0..config.threads {
				let encode_rx = Arc::clone(&encode_rx);
				let result_tx = result_tx.clone();
				encoder_handles.push(scope.spawn(move || {
					loop {
						let item = {
							let guard = encode_rx.lock().unwrap();
							guard.recv()
						};
						let Ok((seq, batch)) = item else { break };
						let encoded = mbtiles_writer::encode_and_compress_tile(batch);
						if result_tx.send((seq, encoded)).is_err() {
							break;
						}
					}
				}));
			}
			drop(result_tx);

			let mut batcher = TileBatcher::new();
			let mut seq = 0u64;
			let cancel = &self.cancel;
			let merge_result = sort::merge_sorted(&all_chunk_paths, |feature| {
				if cancel.load(Ordering::Relaxed) {
					bail!("pipeline cancelled");
				}
				if let Some(batch) = batcher.push(feature) {
					encode_tx
						.send((seq, batch))
						.map_err(|_| anyhow::anyhow!("encoder pool disconnected"))?;
					seq += 1;
				}
				Ok(())
			});
			if let Some(batch) = batcher.finish() {
				let _ = encode_tx.send((seq, batch));
			}
			drop(encode_tx);

			// Reorder buffer: encoder threads finish out of order, but the sink only ever
			// accepts the next expected sequence number (spec.md §4.8's "small" reorder buffer,
			// bounded because the merge already hands tiles out in tileId order).
			let mut pending: std::collections::BTreeMap<u64, (u8, u32, u32, Vec<u8>)> = std::collections::BTreeMap::new();
			let mut next_expected = 0u64;
			for (recv_seq, encoded) in result_rx {
				let (level, x, y, bytes) = encoded?;
				pending.insert(recv_seq, (level, x, y, bytes));
				while let Some((l, x, y, bytes)) = pending.remove(&next_expected) {
					writer.push_encoded(l, x, y, bytes)?;
					counters.tiles_written.fetch_add(1, Ordering::Relaxed);
					next_expected += 1;
				}
			}

			for handle in encoder_handles {
				handle.join().map_err(|_| anyhow::anyhow!("encoder worker thread panicked"))?;
			}

			merge_result
		})?;

		counters.bytes_written.fetch_add(writer.bytes_written(), Ordering::Relaxed);

		// --- Finalize: metadata, optional deferred index / vacuum -------------------------------
		let bounds = explicit_bounds.or_else(|| bounds_tracker_owned.finish()).unwrap_or([-180.0, -85.0, 180.0, 85.0]);
		let frozen_stats = layer_stats_owned.freeze();
		// Empty-input scenario (spec.md §8): no layer ever produced a feature, so there is no
		// observed zoom range to report. Falling back to the configured minzoom/maxzoom would
		// misreport an empty archive as spanning the whole requested range; report (0, 0) instead.
		let (minzoom, maxzoom) = frozen_stats.overall_zoom_range().unwrap_or((0, 0));
		writer
			.finalize(&MbtilesMetadata {
				name: config.profile_name.clone(),
				bounds: MbtilesBounds { min_lon: bounds[0], min_lat: bounds[1], max_lon: bounds[2], max_lat: bounds[3] },
				minzoom,
				maxzoom,
				layer_stats: frozen_stats,
			})
			.context("finalizing mbtiles")?;

		info!("done: {} tile(s) written to {}", counters.tiles_written.load(Ordering::Relaxed), config.output.display());
		Ok(counters.snapshot())
	}

	fn bail_if_cancelled(&self) -> Result<()> {
		if self.cancel.load(Ordering::Relaxed) {
			bail!("pipeline cancelled");
		}
		Ok(())
	}
}

/// Deletes whatever partial output this run may have produced: the `.mbtiles` output file, the
/// node store, and any leftover sort chunk files (spec.md §8, invariant 6).
fn cleanup_partial_output(config: &PipelineConfig) {
	if config.output.exists() {
		if let Err(e) = std::fs::remove_file(&config.output) {
			warn!("failed to remove partial output {}: {e:#}", config.output.display());
		}
	}
	let node_db = config.tmpdir.join("node.db");
	if node_db.exists() {
		let _ = std::fs::remove_file(&node_db);
	}
	if let Ok(entries) = std::fs::read_dir(&config.tmpdir) {
		for entry in entries.flatten() {
			if entry.path().extension().is_some_and(|ext| ext == "chunk") {
				let _ = std::fs::remove_file(entry.path());
			}
		}
	}
}
