//! CSV/TSV file reader with configurable separators.
//!
//! This module provides [`CsvReader`], a flexible reader for CSV and TSV files
//! that supports different regional formats commonly used in Europe.
//!
//! # Features
//!
//! - **Auto-detection**: Automatically uses tab separator for `.tsv` files
//! - **Configurable field separator**: Support for comma (`,`), semicolon (`;`), tab (`\t`), or any character
//! - **Configurable decimal separator**: Support for dot (`.`) or comma (`,`) in numeric values
//! - **Progress reporting**: Integrates with the tiles runtime for progress feedback
//!
//! # Examples
//!
//! ## Standard CSV (US/UK format)
//! ```ignore
//! let data = CsvReader::new(Path::new("data.csv"), runtime)
//!     .read()
//!     .await?;
//! ```
//!
//! ## German CSV (semicolon + comma decimal)
//! ```ignore
//! let data = CsvReader::new(Path::new("data.csv"), runtime)
//!     .with_field_separator(';')
//!     .with_decimal_separator(',')
//!     .read()
//!     .await?;
//! ```
//!
//! ## TSV file (auto-detected)
//! ```ignore
//! // Tab separator is auto-detected from .tsv extension
//! let data = CsvReader::new(Path::new("data.tsv"), runtime)
//!     .read()
//!     .await?;
//! ```

use anyhow::{Result, bail};
use std::{collections::HashSet, io::BufReader, path::Path};
use versatiles_container::TilesRuntime;
use versatiles_core::utils::read_csv_iter;
use versatiles_derive::context;
use versatiles_geometry::geo::*;

/// A configurable CSV/TSV file reader.
///
/// `CsvReader` reads delimited text files and converts each row into [`GeoProperties`],
/// which can then be used to update vector tile features.
///
/// The reader automatically detects TSV files by extension and supports configurable
/// field and decimal separators for international CSV formats.
///
/// # Example
///
/// ```ignore
/// use std::path::Path;
/// use versatiles_pipeline::helpers::CsvReader;
///
/// // Read a German CSV file with semicolon separator and comma decimals
/// let data = CsvReader::new(Path::new("german_data.csv"), runtime)
///     .with_field_separator(';')
///     .with_decimal_separator(',')
///     .read()
///     .await?;
///
/// // Each row becomes a GeoProperties map
/// for row in &data {
///     println!("{:?}", row.get("column_name"));
/// }
/// ```
#[derive(Clone)]
pub struct CsvReader {
	/// Field separator byte. Defaults to `b','` for `.csv` files and `b'\t'` for `.tsv` files.
	pub field_separator: u8,

	/// Decimal separator for parsing floating-point numbers.
	/// - `None` (default): Uses `.` as decimal separator
	/// - `Some(',')`: Uses `,` as decimal separator (common in German/French locales)
	pub decimal_separator: Option<char>,

	runtime: TilesRuntime,
	path: std::path::PathBuf,
	string_fields: HashSet<String>,
}

impl CsvReader {
	/// Creates a new `CsvReader` for the given file path.
	///
	/// The field separator is automatically detected based on the file extension:
	/// - `.tsv` files use tab (`\t`) as separator
	/// - All other files use comma (`,`) as separator
	///
	/// # Arguments
	///
	/// * `path` - Path to the CSV/TSV file to read
	/// * `runtime` - Tiles runtime for progress reporting
	///
	/// # Example
	///
	/// ```ignore
	/// let reader = CsvReader::new(Path::new("data.csv"), runtime);
	/// ```
	#[must_use]
	pub fn new(path: &Path, runtime: TilesRuntime) -> Self {
		// Auto-detect based on file extension
		let field_separator = if let Some(ext) = path.extension()
			&& ext.eq_ignore_ascii_case("tsv")
		{
			b'\t'
		} else {
			b','
		};

		Self {
			field_separator,
			decimal_separator: None,
			runtime,
			path: path.to_path_buf(),
			string_fields: HashSet::new(),
		}
	}

	/// Sets a custom field separator character.
	///
	/// Use this to override the auto-detected separator. Common values:
	/// - `,` (comma) - Standard CSV format (US/UK)
	/// - `;` (semicolon) - European CSV format (Germany, France)
	/// - `\t` (tab) - TSV format
	///
	/// # Example
	///
	/// ```ignore
	/// // Parse a German CSV file with semicolon separator
	/// let reader = CsvReader::new(path, runtime)
	///     .with_field_separator(';');
	/// ```
	#[must_use]
	pub fn with_field_separator(mut self, sep: char) -> Self {
		self.field_separator = sep as u8;
		self
	}

	/// Sets a custom decimal separator for parsing numbers.
	///
	/// By default, numbers are parsed with `.` as the decimal separator.
	/// Use this for files where numbers use `,` as the decimal separator
	/// (common in German, French, and other European locales).
	///
	/// # Example
	///
	/// ```ignore
	/// // Parse German numbers like "3,14" as 3.14
	/// let reader = CsvReader::new(path, runtime)
	///     .with_decimal_separator(',');
	/// ```
	///
	/// # Note
	///
	/// Setting the decimal separator to `.` is a no-op (keeps default behavior).
	#[must_use]
	pub fn with_decimal_separator(mut self, sep: char) -> Self {
		self.decimal_separator = if sep == '.' { None } else { Some(sep) };
		self
	}

	#[must_use]
	pub fn with_string_field(mut self, field_name: &str) -> Self {
		self.string_fields.insert(field_name.to_string());
		self
	}

	/// Converts a string value to a [`GeoValue`], applying decimal separator conversion if needed.
	fn convert_value(&self, value: &str) -> GeoValue {
		if let Some(decimal_sep) = self.decimal_separator {
			// Replace decimal separator with '.' for parsing
			let converted = value.replace(decimal_sep, ".");
			return GeoValue::parse_str(&converted);
		}
		GeoValue::parse_str(value)
	}

	/// Reads the CSV/TSV file and returns all rows as [`GeoProperties`].
	///
	/// The first row is treated as the header and defines the property names.
	/// Each subsequent row becomes a [`GeoProperties`] map where keys are
	/// column names and values are automatically parsed as numbers, booleans,
	/// or strings.
	///
	/// # Returns
	///
	/// A vector of [`GeoProperties`], one for each data row (excluding the header).
	///
	/// # Errors
	///
	/// Returns an error if:
	/// - The file cannot be opened
	/// - The file has inconsistent column counts
	/// - There are parsing errors
	///
	/// # Example
	///
	/// ```ignore
	/// let data = CsvReader::new(Path::new("data.csv"), runtime)
	///     .read()
	///     .await?;
	///
	/// for row in &data {
	///     if let Some(name) = row.get("name") {
	///         println!("Name: {name}");
	///     }
	/// }
	/// ```
	#[context("Failed to read CSV file at path: {:?}", self.path)]
	pub async fn read(&self) -> Result<Vec<GeoProperties>> {
		let file =
			std::fs::File::open(&self.path).with_context(|| format!("Failed to open file at path: {:?}", self.path))?;

		let size = file.metadata()?.len();
		let progress = self.runtime.create_progress("read csv", size);

		let reader = BufReader::new(file);

		let mut errors = vec![];
		let mut iter = read_csv_iter(reader, self.field_separator)?;
		let header: Vec<String> = iter.next().unwrap()?.0;
		let data: Vec<GeoProperties> = iter
			.filter_map(|e| {
				e.map(|(fields, _line_pos, byte_pos)| {
					progress.set_position(byte_pos as u64);

					fields
						.into_iter()
						.enumerate()
						.map(|(col, value)| {
							let key = header[col].clone();
							let value = if self.string_fields.contains(&key) {
								GeoValue::String(value)
							} else {
								self.convert_value(&value)
							};
							(key, value)
						})
						.collect()
				})
				.map_err(|e| errors.push(e))
				.ok()
			})
			.collect::<Vec<_>>();

		progress.finish();

		if !errors.is_empty() {
			eprintln!("{errors:?}");
			bail!("found {} error(s) while reading csv", errors.len());
		}

		Ok(data)
	}
}
