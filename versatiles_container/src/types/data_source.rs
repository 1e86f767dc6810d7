//! The `DataSource` struct represents a driver-aware wrapper around a `DataLocation`,
//! allowing for parsing and handling of input specifications that may include
//! driver prefixes, standard input, and extension inference.

use super::data_location::DataLocation;
use anyhow::Result;
use regex::Regex;
use versatiles_core::{Blob, json::JsonValue};
use versatiles_derive::context;

#[derive(Debug, Clone, PartialEq)]
/// Represents a parsed input specification which may include a driver prefix (like `mbtiles:`).
/// It can resolve standard input (`-`) into an in-memory Blob and derives the effective extension
/// that determines which reader to pick.
pub struct DataSource {
	container_type: Option<String>, // mbtiles / vpl / ...
	name: Option<String>,           // name identifier
	location: DataLocation,         // URL, filesystem path, or in-memory blob
}

use std::sync::LazyLock;

static RE_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[([\w,]*)\](.*)").unwrap());
static RE_POSTFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.*)\[([\w,]*)\]$").unwrap());

impl DataSource {
	/// Returns an optional reference to the container type, if specified.
	#[must_use]
	pub fn optional_container_type(&self) -> Option<&str> {
		self.container_type.as_deref()
	}

	/// Returns an optional reference to the name, if specified.
	#[must_use]
	pub fn optional_name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// Returns a reference to the container type, or an error if not specified.
	pub fn container_type(&self) -> Result<&str> {
		self
			.container_type
			.as_deref()
			.ok_or(anyhow::anyhow!("Could not determine container type for data source"))
	}

	/// Returns a reference to the name, or an error if not specified.
	pub fn name(&self) -> Result<&str> {
		self
			.name
			.as_deref()
			.ok_or(anyhow::anyhow!("Could not determine name for data source"))
	}

	/// Returns a reference to the underlying `DataLocation`.
	#[must_use]
	pub fn location(&self) -> &DataLocation {
		&self.location
	}

	/// Consumes the `DataSource` and returns the underlying `DataLocation`.
	#[must_use]
	pub fn into_location(self) -> DataLocation {
		self.location
	}

	/// Parses a string specification into a `DataSource`.
	///
	/// The input grammar supports optional name and `container_type` prefixes (e.g., `[osm,mbtiles]`),
	/// standard input (`-`) which is resolved into a Blob (requiring an explicit extension),
	/// and falls back to interpreting the string as a path or URL.
	#[context("parsing data source from input string '{}'", input)]
	pub fn parse(input: &str) -> Result<Self> {
		let mut name: Option<String> = None;
		let mut container_type: Option<String> = None;

		fn extract_name_and_type(text: &str) -> (Option<String>, Option<String>) {
			let mut parts = text.split(',');
			let name = parts.next().and_then(|s| (!s.is_empty()).then(|| s.to_string()));
			let container_type = parts.next().and_then(|s| (!s.is_empty()).then(|| s.to_string()));
			(name, container_type)
		}

		let location = if input.starts_with('{') {
			// JSON blob input
			let json = JsonValue::parse_str(input)?.into_object()?;
			name = json.get("name").map(JsonValue::to_string).transpose()?;
			container_type = json.get("type").map(JsonValue::to_string).transpose()?;

			if let Some(content) = json.get("content") {
				let blob = Blob::from(content.to_string()?);
				DataLocation::from(blob)
			} else {
				DataLocation::from(
					json
						.get("location")
						.ok_or(anyhow::anyhow!("missing `location`"))?
						.to_string()?,
				)
			}
		} else if input.starts_with('[')
			&& let Some(captures) = RE_PREFIX.captures(input)
		{
			// Prefix notation with optional name and container type
			(name, container_type) = extract_name_and_type(captures.get(1).unwrap().as_str());
			DataLocation::try_from(captures.get(2).unwrap().as_str())?
		} else if input.ends_with(']')
			&& let Some(captures) = RE_POSTFIX.captures(input)
		{
			// Postfix notation with optional name and container type
			(name, container_type) = extract_name_and_type(captures.get(2).unwrap().as_str());
			DataLocation::try_from(captures.get(1).unwrap().as_str())?
		} else {
			// No prefixes, just a plain location
			DataLocation::try_from(input)?
		};

		if container_type.is_none() {
			container_type = location.extension().ok();
		}

		if name.is_none() {
			name = location.name().ok();
		}

		Ok(DataSource {
			container_type,
			name,
			location,
		})
	}

	/// Resolves the underlying location relative to a base location.
	///
	/// This delegates to the `DataLocation::resolve` method.
	pub fn resolve(&mut self, base: &DataLocation) -> Result<()> {
		self.location.resolve(base)
	}
}

impl TryFrom<&str> for DataSource {
	type Error = anyhow::Error;
	fn try_from(s: &str) -> Result<Self> {
		Self::parse(s)
	}
}

impl TryFrom<&String> for DataSource {
	type Error = anyhow::Error;
	fn try_from(s: &String) -> Result<Self> {
		Self::parse(s)
	}
}

impl TryFrom<DataLocation> for DataSource {
	type Error = anyhow::Error;
	fn try_from(location: DataLocation) -> Result<Self> {
		Ok(DataSource {
			container_type: location.extension().ok(),
			name: location.name().ok(),
			location,
		})
	}
}
