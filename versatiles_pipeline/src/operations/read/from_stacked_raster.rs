//! # from_stacked_raster operation
//!
//! Combines *multiple* raster tile sources by **alphaâ€‘blending** the tiles for
//! each coordinate.  
//!  
//! * Sources are evaluated **in the order given** â€“ later sources overlay
//!   earlier ones.  
//! * Every source **must** produce raster tiles in the *same* resolution.  
//!
//! This file contains both the [`Args`] struct used by the VPL parser and the
//! [`Operation`] implementation that performs the blending.

use crate::{
	PipelineFactory,
	operations::read::traits::ReadTileSource,
	traits::{OperationFactoryTrait, ReadOperationFactoryTrait},
	vpl::{VPLNode, VPLPipeline},
};
use anyhow::{Result, ensure};
use async_trait::async_trait;
use std::{sync::Arc, vec};
use versatiles_container::{SourceType, Tile, TileSource, TileSourceMetadata, Traversal};
use versatiles_core::{TileBBox, TileBBoxPyramid, TileCoord, TileFormat, TileJSON, TileStream, TileType};
use versatiles_derive::context;
use versatiles_image::traits::{DynamicImageTraitInfo, DynamicImageTraitOperation};

#[derive(versatiles_derive::VPLDecode, Clone, Debug)]
/// Overlays multiple raster tile sources on top of each other.
struct Args {
	/// All tile sources must provide raster tiles in the same resolution.
	/// The first source overlays the others.
	sources: Vec<VPLPipeline>,

	/// The tile format to use for the output tiles.
	/// Default: format of the first source.
	format: Option<TileFormat>,

	/// Whether to automatically overscale tiles when a source does not
	/// provide tiles at the requested zoom level.
	/// Default: `false`.
	auto_overscale: Option<bool>,
}

/// [`TileSource`] implementation that overlays raster tiles "on the fly."
///
/// * Caches only metadata (`TileJSON`, `TileSourceMetadata`).
/// * Performs no disk I/O itself; all data come from the child pipelines.
#[derive(Debug)]
struct Operation {
	metadata: TileSourceMetadata,
	sources: Vec<(Arc<Box<dyn TileSource>>, u8)>,
	source_types: Vec<Arc<SourceType>>,
	tilejson: TileJSON,
}

/// Fetches tiles from all sources for a sub-bbox, collects them, stacks overlapping
/// tiles, and returns a stream of the resulting tiles.
#[allow(unused_variables)]
async fn get_tile(
	coord: TileCoord,
	sources: Vec<(Arc<Box<dyn TileSource>>, bool)>,
) -> Result<Option<(TileCoord, Tile)>> {
	let mut tile = Option::<Tile>::None;
	let mut non_overscaled_sources_used = false;

	for source in &sources {
		if let Some(mut tile_bg) = source.0.get_tile(&coord).await? {
			if tile_bg.as_image()?.is_empty() {
				continue;
			}
			if !source.1 {
				non_overscaled_sources_used = true;
			}
			if let Some(mut image_fg) = tile {
				tile_bg.as_image_mut()?.overlay(image_fg.as_image()?)?;
			}
			tile = Some(tile_bg);
			if tile.as_mut().unwrap().as_image()?.is_opaque() {
				break;
			}
		}
	}

	if !non_overscaled_sources_used {
		return Ok(None);
	}

	Ok(tile.map(|t| (coord, t)))
}

impl ReadTileSource for Operation {
	#[context("Failed to build from_stacked_raster operation in VPL node {:?}", vpl_node.name)]
	async fn build(vpl_node: VPLNode, factory: &PipelineFactory) -> Result<Box<dyn TileSource>>
	where
		Self: Sized + TileSource,
	{
		let args = Args::from_vpl_node(&vpl_node)?;

		let mut original_sources: Vec<Box<dyn TileSource>> = vec![];
		let mut source_types: Vec<Arc<SourceType>> = vec![];
		for source in args.sources {
			let s = factory.build_pipeline(source).await?;
			source_types.push(s.source_type());
			original_sources.push(s);
		}

		ensure!(!original_sources.is_empty(), "must have at least one source");

		let mut tilejson = TileJSON::default();

		let first_source_metadata = original_sources.first().unwrap().metadata();
		let tile_format = args.format.unwrap_or(first_source_metadata.tile_format);
		ensure!(
			tile_format.to_type() == TileType::Raster,
			"output format must be a raster format"
		);
		let tile_compression = first_source_metadata.tile_compression;

		let mut pyramid = TileBBoxPyramid::new_empty();
		let mut traversal = Traversal::new_any();

		for source in &original_sources {
			tilejson.merge(source.tilejson())?;

			let metadata = source.metadata();
			traversal.intersect(&metadata.traversal)?;
			pyramid.include_bbox_pyramid(&metadata.bbox_pyramid);

			ensure!(
				metadata.tile_format.to_type() == TileType::Raster,
				"all sources must be raster tiles"
			);
		}

		let metadata = TileSourceMetadata::new(tile_format, tile_compression, pyramid, traversal);
		metadata.update_tilejson(&mut tilejson);
		let level_max = metadata.bbox_pyramid.get_level_max().unwrap();

		let auto_overscale = args.auto_overscale.unwrap_or(false);
		let mut sources: Vec<(Arc<Box<dyn TileSource>>, u8)> = vec![];
		if auto_overscale {
			use crate::operations::raster::raster_overscale;

			for source in original_sources {
				let level_base = source.metadata().bbox_pyramid.get_level_max().unwrap();
				let args = raster_overscale::Args {
					level_base: Some(level_base),
					level_max: Some(level_max),
					enable_climbing: Some(false),
				};
				let operation = raster_overscale::Operation::new(source, args)?;
				sources.push((Arc::new(Box::new(operation)), level_base));
			}
		} else {
			for source in original_sources {
				sources.push((Arc::new(source), 30));
			}
		}

		Ok(Box::new(Self {
			metadata,
			sources,
			source_types,
			tilejson,
		}) as Box<dyn TileSource>)
	}
}

#[async_trait]
impl TileSource for Operation {
	/// Reader parameters (format, compression, pyramid) for the *blended* result.
	fn metadata(&self) -> &TileSourceMetadata {
		&self.metadata
	}

	/// Combined `TileJSON` derived from all sources.
	fn tilejson(&self) -> &TileJSON {
		&self.tilejson
	}

	fn source_type(&self) -> Arc<SourceType> {
		SourceType::new_composite("from_stacked_raster", &self.source_types)
	}

	/// Stream packed raster tiles intersecting `bbox`.
	#[context("Failed to get stacked raster tile stream for bbox: {:?}", bbox)]
	async fn get_tile_stream(&self, bbox: TileBBox) -> Result<TileStream<Tile>> {
		log::debug!("get_stream {bbox:?}");

		// Filter sources to only those that overlap with the bbox
		let sources: Vec<(Arc<Box<dyn TileSource>>, bool)> = self
			.sources
			.iter()
			.filter(|s| s.0.metadata().bbox_pyramid.overlaps_bbox(&bbox))
			.cloned()
			.map(|s| (s.0, s.1 < bbox.level))
			.collect();

		if sources.is_empty() {
			return Ok(TileStream::empty());
		}

		let tile_format = self.metadata.tile_format;

		Ok(TileStream::from_bbox_async_parallel(bbox, move |c| {
			let sources = sources.clone();
			async move {
				let tile = get_tile(c, sources).await.unwrap();
				if let Some((_coord, mut tile)) = tile {
					tile.change_format(tile_format, None, None).unwrap();
					return Some((c, tile));
				}
				tile
			}
		}))
	}
}

pub struct Factory {}

impl OperationFactoryTrait for Factory {
	fn get_docs(&self) -> String {
		Args::get_docs()
	}
	fn get_tag_name(&self) -> &str {
		"from_stacked_raster"
	}
}

#[async_trait]
impl ReadOperationFactoryTrait for Factory {
	async fn build<'a>(&self, vpl_node: VPLNode, factory: &'a PipelineFactory) -> Result<Box<dyn TileSource>> {
		Operation::build(vpl_node, factory).await
	}
}
