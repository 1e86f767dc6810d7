mod container_registry;
mod converter;
mod data_location;
mod data_source;
mod processor;
mod tile;
mod tile_content;
mod tile_source;
mod tile_source_metadata;
mod writer;

pub use container_registry::*;
pub use converter::*;
pub use data_location::*;
pub use data_source::*;
pub use processor::*;
pub use tile::*;
pub use tile_content::*;
pub use tile_source::*;
pub use tile_source_metadata::*;
pub use writer::*;

// Backward compatibility aliases
pub use tile_source::TileSourceTrait;
pub use tile_source::TileSourceTraverseExt as TilesReaderTraverseExt;
