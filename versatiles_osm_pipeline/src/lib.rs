//! Batch pipeline engine that turns OSM PBF extracts, shapefiles and a
//! Natural Earth SQLite dump into a single gzip-compressed MVT archive
//! stored as an MBTiles file.
//!
//! The crate is organized the way the dataflow described in the pipeline
//! design runs: source readers feed a [`renderer`] that clips/simplifies
//! features per zoom, an external [`sort`] groups rendered features by
//! tile, [`group`] batches them per tile, and [`mbtiles_writer`] encodes
//! and persists each batch. [`engine`] wires the stages together with
//! bounded queues and worker threads.

pub mod config;
pub mod engine;
pub mod error;
pub mod group;
pub mod mbtiles_writer;
pub mod multi_expression;
pub mod node_store;
pub mod profile;
pub mod renderer;
pub mod sort;
pub mod source;
pub mod stats;
pub mod tile_id;
pub mod translations;

pub use config::PipelineConfig;
pub use engine::PipelineEngine;
pub use error::{PipelineErrorKind, RunStats};
