//! Contains types like coordinates, bounding boxes (bboxes), format types, and more.

mod blob;
pub use blob::*;

mod byte_range;
pub use byte_range::*;

mod geo_bbox;
pub use geo_bbox::*;

mod geo_center;
pub use geo_center::*;

mod limited_cache;
pub use limited_cache::*;

mod probe_depth;
pub use probe_depth::*;

mod tile_bbox;
pub use tile_bbox::*;

mod tile_bbox_map;
pub use tile_bbox_map::*;

mod tile_bbox_pyramid;
pub use tile_bbox_pyramid::*;

mod tile_compression;
pub use tile_compression::*;

mod tile_coord;
pub use tile_coord::*;

mod tile_coord2;
pub use tile_coord2::*;

/// Alias kept for call sites written against the historical 3D-coordinate name.
pub type TileCoord3 = TileCoord;

mod tile_format;
pub use tile_format::*;

mod tile_schema;
pub use tile_schema::*;

mod tile_size;
pub use tile_size::*;

mod tile_stream;
pub use tile_stream::*;

mod tile_type;
pub use tile_type::*;

mod tiles_reader_parameters;
pub use tiles_reader_parameters::*;

mod tiles_reader;
pub use tiles_reader::*;
