//! CLI argument parsing and the validated configuration record handed to [`crate::engine::PipelineEngine`].

use crate::error::PipelineErrorKind;
use anyhow::{Result, bail, ensure};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Renders a batch of OpenStreetMap, shapefile and Natural Earth sources into an MBTiles archive.
///
/// Positional `profile-name` selects the registered [`crate::profile::Profile`]; all other
/// options are passed as `key=value` pairs, matching the reference tile-builder's argument style.
#[derive(Parser, Debug, Clone)]
#[command(name = "versatiles_osm_pipeline", version, about)]
pub struct CliArgs {
	/// Name of the registered profile to run (e.g. `debug`).
	pub profile_name: String,

	/// `key=value` pairs, see the module documentation for recognized keys.
	pub kv_args: Vec<String>,
}

/// Validated, fully-resolved configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
	pub profile_name: String,
	pub input: PathBuf,
	pub centerline: Option<PathBuf>,
	pub natural_earth: Option<PathBuf>,
	pub water_polygons: Option<PathBuf>,
	pub output: PathBuf,
	pub tmpdir: PathBuf,
	pub bounds: Bounds,
	pub threads: usize,
	pub minzoom: u8,
	pub maxzoom: u8,
	pub name_languages: Vec<String>,
	pub fetch_wikidata: bool,
	pub use_wikidata: bool,
	pub wikidata_cache: PathBuf,
	pub defer_mbtiles_index_creation: bool,
	pub optimize_db: bool,
	pub loginterval: Duration,
}

/// A `minLon,minLat,maxLon,maxLat` bounding box, or `world` meaning "infer from input".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bounds {
	World,
	Explicit([f64; 4]),
}

impl PipelineConfig {
	/// Parses and validates a `key=value` argument list into a `PipelineConfig`.
	///
	/// # Errors
	/// Returns a [`PipelineErrorKind::BadArgument`]-classified error (via `anyhow`) for any
	/// missing required key, malformed value, or out-of-range zoom pair.
	pub fn parse(args: &CliArgs) -> Result<Self> {
		let mut map = std::collections::HashMap::new();
		for kv in &args.kv_args {
			let Some((key, value)) = kv.split_once('=') else {
				bail!("argument {kv:?} is not of the form key=value");
			};
			map.insert(key.to_string(), value.to_string());
		}

		let take = |map: &mut std::collections::HashMap<String, String>, key: &str| map.remove(key);

		let input = take(&mut map, "input")
			.ok_or_else(|| anyhow::anyhow!("missing required argument: input"))?
			.into();

		let output = take(&mut map, "output")
			.ok_or_else(|| anyhow::anyhow!("missing required argument: output"))?
			.into();

		let centerline = take(&mut map, "centerline").map(PathBuf::from);
		let natural_earth = take(&mut map, "natural_earth").map(PathBuf::from);
		let water_polygons = take(&mut map, "water_polygons").map(PathBuf::from);

		let tmpdir = take(&mut map, "tmpdir")
			.map(PathBuf::from)
			.unwrap_or_else(|| PathBuf::from("./data/tmp"));

		let bounds = match take(&mut map, "bounds") {
			None => Bounds::World,
			Some(s) if s == "world" => Bounds::World,
			Some(s) => {
				let parts: Vec<f64> = s
					.split(',')
					.map(|p| p.trim().parse::<f64>())
					.collect::<std::result::Result<_, _>>()
					.map_err(|e| anyhow::anyhow!("invalid bounds {s:?}: {e}"))?;
				let [min_lon, min_lat, max_lon, max_lat]: [f64; 4] = parts
					.try_into()
					.map_err(|_| anyhow::anyhow!("bounds must have exactly 4 comma-separated components"))?;
				ensure!(min_lon <= max_lon && min_lat <= max_lat, "bounds {s:?} are not well-ordered");
				Bounds::Explicit([min_lon, min_lat, max_lon, max_lat])
			}
		};

		let threads = match take(&mut map, "threads") {
			None => num_cpus::get(),
			Some(s) => s.parse::<usize>().map_err(|e| anyhow::anyhow!("invalid threads {s:?}: {e}"))?,
		};
		ensure!(threads >= 1, "threads must be at least 1");

		let minzoom = match take(&mut map, "minzoom") {
			None => 0,
			Some(s) => s.parse::<u8>().map_err(|e| anyhow::anyhow!("invalid minzoom {s:?}: {e}"))?,
		};
		let maxzoom = match take(&mut map, "maxzoom") {
			None => 14,
			Some(s) => s.parse::<u8>().map_err(|e| anyhow::anyhow!("invalid maxzoom {s:?}: {e}"))?,
		};
		// Open question resolved: maxzoom=14 is valid, the bound is inclusive on both ends.
		ensure!(minzoom <= maxzoom && maxzoom <= 14, "zoom range must satisfy 0 <= minzoom <= maxzoom <= 14");

		let name_languages = match take(&mut map, "name_languages") {
			None => vec!["en".to_string()],
			Some(s) => s.split(',').map(|l| l.trim().to_string()).collect(),
		};

		let fetch_wikidata = parse_bool(take(&mut map, "fetch_wikidata"), false)?;
		let use_wikidata = parse_bool(take(&mut map, "use_wikidata"), true)?;

		let wikidata_cache = take(&mut map, "wikidata_cache")
			.map(PathBuf::from)
			.unwrap_or_else(|| PathBuf::from("data/sources/wikidata_names.json"));

		let defer_mbtiles_index_creation = parse_bool(take(&mut map, "defer_mbtiles_index_creation"), false)?;
		let optimize_db = parse_bool(take(&mut map, "optimize_db"), false)?;

		let loginterval = match take(&mut map, "loginterval") {
			None => Duration::from_secs(10),
			Some(s) => parse_duration(&s)?,
		};

		if !map.is_empty() {
			let unknown: Vec<_> = map.keys().cloned().collect();
			bail!("unrecognized argument key(s): {}", unknown.join(", "));
		}

		Ok(PipelineConfig {
			profile_name: args.profile_name.clone(),
			input,
			centerline,
			natural_earth,
			water_polygons,
			output,
			tmpdir,
			bounds,
			threads,
			minzoom,
			maxzoom,
			name_languages,
			fetch_wikidata,
			use_wikidata,
			wikidata_cache,
			defer_mbtiles_index_creation,
			optimize_db,
			loginterval,
		})
	}

	/// Classifies the given error as the kind config-validation failures should produce.
	#[must_use]
	pub fn error_kind() -> PipelineErrorKind {
		PipelineErrorKind::BadArgument
	}
}

fn parse_bool(value: Option<String>, default: bool) -> Result<bool> {
	match value {
		None => Ok(default),
		Some(s) => match s.as_str() {
			"true" | "1" => Ok(true),
			"false" | "0" => Ok(false),
			other => bail!("invalid boolean value {other:?}"),
		},
	}
}

fn parse_duration(s: &str) -> Result<Duration> {
	let s = s.trim();
	let (num, unit) = s.split_at(s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len()));
	let n: u64 = num.parse().map_err(|e| anyhow::anyhow!("invalid duration {s:?}: {e}"))?;
	let secs = match unit {
		"" | "s" => n,
		"m" => n * 60,
		"h" => n * 3600,
		other => bail!("invalid duration unit {other:?} in {s:?}"),
	};
	Ok(Duration::from_secs(secs))
}
