//! `converter` module provides functionalities to convert tile data between different formats and compressions.
//!
//! # Example Usage
//!
//! ```rust
//! use versatiles::container::{convert_tiles_container, MBTilesReader, TilesConverterParameters};
//! use versatiles::types::{TileFormat, TileCompression, TileBBoxPyramid, TilesReader, TilesReaderParameters};
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
//!     let converter_params = TilesConverterParameters::new(
//!         None,
//!         Some(TileCompression::Brotli),
//!         Some(TileBBoxPyramid::new_full(8)),
//!         false,
//!         false,
//!         false,
//!     );
//!
//!     // Convert the tiles container
//!     convert_tiles_container(Box::new(reader), converter_params, &path_versatiles.to_str().unwrap()).await?;
//!
//!     println!("Tiles have been successfully converted and saved to {path_versatiles:?}");
//!     Ok(())
//! }
//! ```

use super::{utils::TileConverter, write_to_filename};
use crate::{
	types::{
		Blob, TileBBox, TileBBoxPyramid, TileCompression, TileCoord3, TileFormat, TileStream,
		TilesReader, TilesReaderParameters,
	},
	utils::TransformCoord,
};
use anyhow::Result;
use async_trait::async_trait;

/// Parameters for tile conversion.
#[derive(Debug)]
pub struct TilesConverterParameters {
	pub tile_format: Option<TileFormat>,
	pub tile_compression: Option<TileCompression>,
	pub bbox_pyramid: Option<TileBBoxPyramid>,
	pub force_recompress: bool,
	pub flip_y: bool,
	pub swap_xy: bool,
}

impl TilesConverterParameters {
	/// Create new converter parameters with specific settings.
	pub fn new(
		tile_format: Option<TileFormat>,
		tile_compression: Option<TileCompression>,
		bbox_pyramid: Option<TileBBoxPyramid>,
		force_recompress: bool,
		flip_y: bool,
		swap_xy: bool,
	) -> TilesConverterParameters {
		TilesConverterParameters {
			tile_format,
			tile_compression,
			bbox_pyramid,
			force_recompress,
			flip_y,
			swap_xy,
		}
	}

	/// Create new converter parameters with default settings.
	pub fn new_default() -> TilesConverterParameters {
		TilesConverterParameters {
			tile_format: None,
			tile_compression: None,
			bbox_pyramid: None,
			force_recompress: false,
			flip_y: false,
			swap_xy: false,
		}
	}
}

/// Converts tiles from a given reader and writes them to a file.
pub async fn convert_tiles_container(
	reader: Box<dyn TilesReader>,
	cp: TilesConverterParameters,
	filename: &str,
) -> Result<()> {
	let mut converter = TilesConvertReader::new_from_reader(reader, cp)?;
	write_to_filename(&mut converter, filename).await
}

/// A reader that converts tiles from one format to another.
#[derive(Debug)]
pub struct TilesConvertReader {
	reader: Box<dyn TilesReader>,
	converter_parameters: TilesConverterParameters,
	reader_parameters: TilesReaderParameters,
	container_name: String,
	tile_recompressor: Option<TileConverter>,
	name: String,
}

impl TilesConvertReader {
	/// Creates a new converter reader from an existing reader.
	pub fn new_from_reader(
		reader: Box<dyn TilesReader>,
		cp: TilesConverterParameters,
	) -> Result<TilesConvertReader> {
		let container_name = format!("converter({})", reader.get_container_name());
		let name = format!("converter({})", reader.get_name());

		let rp: TilesReaderParameters = reader.get_parameters().to_owned();
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

		let tile_recompressor = Some(TileConverter::new_tile_recompressor(
			&rp.tile_format,
			&rp.tile_compression,
			&new_rp.tile_format,
			&new_rp.tile_compression,
			cp.force_recompress,
		)?);

		Ok(TilesConvertReader {
			reader,
			converter_parameters: cp,
			reader_parameters: new_rp,
			container_name,
			tile_recompressor,
			name,
		})
	}
}

#[async_trait]
impl TilesReader for TilesConvertReader {
	fn get_name(&self) -> &str {
		&self.name
	}

	fn get_container_name(&self) -> &str {
		&self.container_name
	}

	fn get_parameters(&self) -> &TilesReaderParameters {
		&self.reader_parameters
	}

	fn override_compression(&mut self, tile_compression: TileCompression) {
		self.reader.override_compression(tile_compression);
	}

	fn get_meta(&self) -> Result<Option<Blob>> {
		self.reader.get_meta()
	}

	async fn get_tile_data(&mut self, coord: &TileCoord3) -> Result<Option<Blob>> {
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

	async fn get_bbox_tile_stream(&mut self, bbox: TileBBox) -> TileStream {
		let mut bbox = bbox.clone();
		if self.converter_parameters.swap_xy {
			bbox.swap_xy();
		}
		if self.converter_parameters.flip_y {
			bbox.flip_y();
		}

		let mut stream = self.reader.get_bbox_tile_stream(bbox).await;

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

		stream
	}
}
