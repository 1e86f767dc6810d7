//! CLI entry point: parses `profile-name key=value...` arguments, builds the requested
//! `Profile`, and runs `PipelineEngine` against it, exiting with the code spec.md §6's CLI
//! contract names for each `PipelineErrorKind` (0 success, 1 bad argument, 2 missing input,
//! 3 any other runtime failure).

use clap::Parser;
use std::process::ExitCode;
use versatiles_osm_pipeline::config::{CliArgs, PipelineConfig};
use versatiles_osm_pipeline::engine::PipelineEngine;
use versatiles_osm_pipeline::error::{PipelineErrorKind, RunStats};
use versatiles_osm_pipeline::profile::ProfileRegistry;

fn main() -> ExitCode {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
		.format_timestamp(None)
		.init();

	let args = match parse_args() {
		Ok(args) => args,
		Err(code) => return code,
	};

	match run(&args) {
		Ok(stats) => {
			report(&stats);
			ExitCode::SUCCESS
		}
		Err((kind, err)) => {
			log::error!("{err:#}");
			ExitCode::from(kind.exit_code() as u8)
		}
	}
}

/// Parses argv, letting clap handle `--help`/`--version` itself (exit 0) while any other
/// usage error is reported as `BadArgument` (exit 1) rather than clap's own default exit code.
fn parse_args() -> Result<CliArgs, ExitCode> {
	CliArgs::try_parse().map_err(|e| {
		use clap::error::ErrorKind;
		if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
			e.exit();
		}
		eprint!("{e}");
		ExitCode::from(PipelineErrorKind::BadArgument.exit_code() as u8)
	})
}

fn run(args: &CliArgs) -> Result<RunStats, (PipelineErrorKind, anyhow::Error)> {
	let config = PipelineConfig::parse(args).map_err(|e| (PipelineErrorKind::BadArgument, e))?;

	for (label, path) in [
		("input", Some(&config.input)),
		("centerline", config.centerline.as_ref()),
		("water_polygons", config.water_polygons.as_ref()),
		("natural_earth", config.natural_earth.as_ref()),
	] {
		if let Some(path) = path
			&& !path.exists()
		{
			return Err((PipelineErrorKind::MissingInput, anyhow::anyhow!("{label} source not found: {}", path.display())));
		}
	}

	let registry = ProfileRegistry::with_builtins();
	let profile = registry.build(&args.profile_name, &config).map_err(|e| (PipelineErrorKind::BadArgument, e))?;

	let engine = PipelineEngine::new();
	engine.run(&config, profile.as_ref()).map_err(|e| (PipelineErrorKind::Internal, e))
}

fn report(stats: &RunStats) {
	log::info!(
		"{} tile(s) written ({} byte(s)); {} feature(s) rendered, {} dropped as degenerate, {} rejected by profile, {} missing node reference(s)",
		stats.tiles_written,
		stats.bytes_written,
		stats.features_rendered,
		stats.features_dropped_degenerate,
		stats.features_rejected_by_profile,
		stats.missing_node_references,
	);
}
