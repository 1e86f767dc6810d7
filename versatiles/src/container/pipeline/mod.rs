/*!
The `composer` module provides functionality for reading, processing, and composing tiles from multiple sources.
*/

mod operations;
mod reader;
mod utils;

pub use reader::TileComposerReader;
pub use utils::get_composer_operation_docs;
use utils::*;
