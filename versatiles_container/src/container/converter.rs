//! `converter` module provides functionalities to convert tile data between different formats and compressions.
//!
//! # Example Usage
//!
//! ```rust
//! use versatiles_container::{convert_tiles_container, MBTilesReader, TilesConverterParameters};
//! use versatiles_core::types::{TileFormat, TileCompression, TileBBoxPyramid, TilesReaderTrait, TilesReaderParameters};
//! use std::path::Path;
//! use anyhow::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let path_mbtiles = std::env::current_dir()?.join("../testdata/berlin.mbtiles");
//!     let path_versatiles = std::env::current_dir()?.join("../testdata/temp2.versatiles");
//!
//!     // Create a mbtiles reader
//!     let mut reader = MBTilesReader::open_path(&path_mbtiles)?;
//!
//!     // Define converter parameters
//!     let converter_params = TilesConverterParameters {
//!         bbox_pyramid: Some(TileBBoxPyramid::new_full(8)),
//!         tile_compression: Some(TileCompression::Brotli),
//!         ..Default::default()
//!     };
//!
//!     // Convert the tiles container
//!     convert_tiles_container(Box::new(reader), converter_params, &path_versatiles.to_str().unwrap()).await?;
//!
//!     println!("Tiles have been successfully converted and saved to {path_versatiles:?}");
//!     Ok(())
//! }
//! ```

use super::{tile_converter::TileConverter, write_to_filename};
use anyhow::Result;
use async_trait::async_trait;
use versatiles_core::{tilejson::TileJSON, types::*, utils::TransformCoord};
use versatiles_derive::context;

/// Parameters for tile conversion.
#[derive(Debug)]
pub struct TilesConverterParameters {
	pub bbox_pyramid: Option<TileBBoxPyramid>,
	pub tile_format: Option<TileFormat>,
	pub flip_y: bool,
	pub force_recompress: bool,
	pub swap_xy: bool,
	pub tile_compression: Option<TileCompression>,
}

impl Default for TilesConverterParameters {
	/// Returns default converter parameters.
	fn default() -> Self {
		TilesConverterParameters {
			bbox_pyramid: None,
			flip_y: false,
			force_recompress: false,
			swap_xy: false,
			tile_compression: None,
			tile_format: None,
		}
	}
}

/// Converts tiles from a given reader and writes them to a file.
#[context("Converting tiles from reader to file")]
pub async fn convert_tiles_container(
	reader: Box<dyn TilesReaderTrait>,
	cp: TilesConverterParameters,
	filename: &str,
) -> Result<()> {
	let mut converter = TilesConvertReader::new_from_reader(reader, cp)?;
	write_to_filename(&mut converter, filename).await
}

/// A reader that converts tiles from one format to another.
#[derive(Debug)]
pub struct TilesConvertReader {
	reader: Box<dyn TilesReaderTrait>,
	converter_parameters: TilesConverterParameters,
	reader_parameters: TilesReaderParameters,
	container_name: String,
	tile_recompressor: Option<TileConverter>,
	name: String,
	tilejson: TileJSON,
}

impl TilesConvertReader {
	/// Creates a new converter reader from an existing reader.
	#[context("Creating converter reader from existing reader")]
	pub fn new_from_reader(
		reader: Box<dyn TilesReaderTrait>,
		cp: TilesConverterParameters,
	) -> Result<TilesConvertReader> {
		let container_name = format!("converter({})", reader.container_name());
		let name = format!("converter({})", reader.source_name());

		let rp: TilesReaderParameters = reader.parameters().to_owned();
		let mut new_rp: TilesReaderParameters = rp.clone();

		if cp.flip_y {
			new_rp.bbox_pyramid.flip_y();
		}
		if cp.swap_xy {
			new_rp.bbox_pyramid.swap_xy();
		}

		if let Some(bbox_pyramid) = &cp.bbox_pyramid {
			new_rp.bbox_pyramid.intersect(bbox_pyramid);
		}

		new_rp.tile_format = cp.tile_format.unwrap_or(rp.tile_format);
		new_rp.tile_compression = cp.tile_compression.unwrap_or(rp.tile_compression);

		let tile_recompressor = Some(TileConverter::new(
			rp.tile_format,
			rp.tile_compression,
			new_rp.tile_format,
			new_rp.tile_compression,
			cp.force_recompress,
		));

		let mut tilejson = reader.tilejson().clone();
		tilejson.update_from_reader_parameters(&new_rp);

		Ok(TilesConvertReader {
			reader,
			converter_parameters: cp,
			reader_parameters: new_rp,
			container_name,
			tile_recompressor,
			name,
			tilejson,
		})
	}
}

#[async_trait]
impl TilesReaderTrait for TilesConvertReader {
	fn source_name(&self) -> &str {
		&self.name
	}

	fn container_name(&self) -> &str {
		&self.container_name
	}

	fn parameters(&self) -> &TilesReaderParameters {
		&self.reader_parameters
	}

	fn override_compression(&mut self, tile_compression: TileCompression) {
		self.reader.override_compression(tile_compression);
	}

	fn tilejson(&self) -> &TileJSON {
		&self.tilejson
	}

	async fn get_tile_data(&self, coord: &TileCoord3) -> Result<Option<Blob>> {
		let mut coord = *coord;
		if self.converter_parameters.flip_y {
			coord.flip_y();
		}
		if self.converter_parameters.swap_xy {
			coord.swap_xy();
		}
		let mut blob = self.reader.get_tile_data(&coord).await?;

		if let Some(tile_recompressor) = &self.tile_recompressor {
			if let Some(b) = blob {
				blob = Some(tile_recompressor.process_blob(b)?);
			}
		}

		Ok(blob)
	}

	async fn get_tile_stream(&self, mut bbox: TileBBox) -> Result<TileStream> {
		if self.converter_parameters.swap_xy {
			bbox.swap_xy();
		}
		if self.converter_parameters.flip_y {
			bbox.flip_y();
		}

		let mut stream = self.reader.get_tile_stream(bbox).await?;

		let flip_y = self.converter_parameters.flip_y;
		let swap_xy = self.converter_parameters.swap_xy;

		if flip_y || swap_xy {
			stream = stream.map_coord(move |mut coord| {
				if flip_y {
					coord.flip_y()
				}
				if swap_xy {
					coord.swap_xy()
				}
				coord
			});
		}

		if let Some(tile_recompressor) = &self.tile_recompressor {
			stream = tile_recompressor.process_stream(stream);
		}

		Ok(stream)
	}
}
