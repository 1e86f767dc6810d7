//! Error classification and run statistics shared across every pipeline stage.

use std::fmt;

/// Coarse classification of a pipeline failure, used to pick the process exit code
/// and to decide whether a failure should abort the run or just be logged and skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineErrorKind {
	/// A CLI argument or config value was missing, malformed, or out of range.
	BadArgument,
	/// The configured input source file does not exist or cannot be opened at all.
	MissingInput,
	/// Reading or writing a file (source extract, node store, output mbtiles) failed.
	IoFailure,
	/// A source file could not be parsed (corrupt PBF blob, malformed shapefile record, ...).
	SourceParseError,
	/// A way or relation referenced a node id that was never seen in pass 1.
	MissingNodeReference,
	/// The profile rejected a feature or raised an error while evaluating it.
	ProfileRejected,
	/// A geometry failed validation (too few points, self-intersecting ring, NaN coordinate, ...).
	GeometryInvalid,
	/// Writing spilled less than expected, most likely because disk space ran out.
	OutOfDisk,
	/// The run was cancelled, either by a signal or by an earlier stage's fatal error.
	Cancelled,
	/// Anything else: a bug, a panic caught at a thread boundary, an invariant violation.
	Internal,
}

impl PipelineErrorKind {
	/// Process exit code this error kind should produce, per the CLI contract (spec.md §6):
	/// `0` success, `1` argument error, `2` missing input, `3` runtime failure.
	#[must_use]
	pub fn exit_code(self) -> i32 {
		use PipelineErrorKind::*;
		match self {
			BadArgument => 1,
			MissingInput => 2,
			IoFailure | SourceParseError | MissingNodeReference | ProfileRejected | GeometryInvalid | OutOfDisk
			| Cancelled | Internal => 3,
		}
	}

	#[must_use]
	pub fn as_str(self) -> &'static str {
		use PipelineErrorKind::*;
		match self {
			BadArgument => "bad_argument",
			MissingInput => "missing_input",
			IoFailure => "io_failure",
			SourceParseError => "source_parse_error",
			MissingNodeReference => "missing_node_reference",
			ProfileRejected => "profile_rejected",
			GeometryInvalid => "geometry_invalid",
			OutOfDisk => "out_of_disk",
			Cancelled => "cancelled",
			Internal => "internal",
		}
	}
}

impl fmt::Display for PipelineErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

/// Aggregate counters produced by a run, reported on stdout when the pipeline finishes
/// and used by tests to assert on skip/drop behavior without re-parsing output files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
	pub nodes_indexed: u64,
	pub ways_read: u64,
	pub relations_read: u64,
	pub features_rendered: u64,
	pub features_dropped_degenerate: u64,
	pub features_rejected_by_profile: u64,
	pub missing_node_references: u64,
	pub tiles_written: u64,
	pub bytes_written: u64,
}

impl RunStats {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn merge(&mut self, other: &RunStats) {
		self.nodes_indexed += other.nodes_indexed;
		self.ways_read += other.ways_read;
		self.relations_read += other.relations_read;
		self.features_rendered += other.features_rendered;
		self.features_dropped_degenerate += other.features_dropped_degenerate;
		self.features_rejected_by_profile += other.features_rejected_by_profile;
		self.missing_node_references += other.missing_node_references;
		self.tiles_written += other.tiles_written;
		self.bytes_written += other.bytes_written;
	}
}
