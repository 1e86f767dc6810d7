mod compression_goal;
mod functions;
mod methods;
mod target_compression;
#[cfg(test)]
pub mod test_utils;

pub use compression_goal::*;
pub use functions::*;
pub use methods::*;
pub use target_compression::*;
