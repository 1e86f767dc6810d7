use crate::geometry::{GeoProperties, GeoValue};
use anyhow::{Context, Result};
use std::{os::unix::fs::MetadataExt, path::Path};
use versatiles_core::progress::get_progress_bar;

/// Reads a CSV file from the given path and returns a vector of `GeoProperties`.
///
/// # Arguments
///
/// * `path` - A reference to the path of the CSV file.
///
/// # Returns
///
/// * `Result<Vec<GeoProperties>>` - A vector of `GeoProperties` or an error if the file could not be read.
pub fn read_csv_file(path: &Path) -> Result<Vec<GeoProperties>> {
	let file = std::fs::File::open(path)
		.with_context(|| format!("Failed to open file at path: {:?}", path))?;

	let size = path.metadata()?.size();

	let mut data: Vec<GeoProperties> = Vec::new();

	let mut csv_reader = csv::Reader::from_reader(file);
	let header: Vec<(usize, String)> = csv_reader
		.headers()
		.context("Failed to read CSV headers")?
		.iter()
		.map(|s| s.to_string())
		.enumerate()
		.collect();

	let mut progress = get_progress_bar("read csv", size);
	for record in csv_reader.records() {
		let record = record.context("Failed to read CSV record")?;
		progress.set_position(record.position().unwrap().byte());
		let mut entry = GeoProperties::new();
		for (col_index, name) in header.iter() {
			entry.insert(
				name.to_string(),
				GeoValue::parse_str(
					record
						.get(*col_index)
						.with_context(|| format!("Failed to get value for column: {name}"))?,
				),
			);
		}
		data.push(entry);
	}
	progress.finish();

	Ok(data)
}
