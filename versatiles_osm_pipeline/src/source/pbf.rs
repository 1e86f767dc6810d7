//! OSM PBF reader: the only source format that runs two passes over the same file, feeding
//! [`crate::node_store::NodeLocationStoreWriter`] in pass-1 and rehydrating way/relation
//! geometries from a finished [`crate::node_store::NodeLocationStore`] in pass-2.

use super::{RawGeometry, RoleInfo, SourceFeature, SourceKind, SourceReader, TagValue};
use crate::node_store::{NodeLocationStore, NodeLocationStoreWriter, require_node};
use anyhow::{Context, Result};
use osmpbf::{Element, ElementReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Runs pass-1 over an OSM PBF file: every node's `(lon, lat)` is appended to the node
/// store (nodes arrive in ascending id order, an OSM PBF invariant); relations are not
/// resolved here, only observed, since pass-1 only needs to build the node index.
///
/// # Errors
/// Returns a `SourceParseError`-classified error if the file cannot be opened or a block
/// fails to decode at the stream start, or an `IoFailure`/`OutOfDisk`-classified error if a
/// node write to the node store fails (spec.md §4.1: "disk-full is fatal and aborts pass-1").
pub fn run_pass1(path: &Path, node_store_path: &Path) -> Result<(NodeLocationStore, u64)> {
	let reader = ElementReader::from_path(path).with_context(|| format!("opening {}", path.display()))?;
	let mut writer = NodeLocationStoreWriter::create(node_store_path)?;

	let mut first_error: Option<anyhow::Error> = None;

	reader
		.for_each(|element| {
			if first_error.is_some() {
				return;
			}
			let result = match element {
				Element::Node(node) => writer.put(node.id() as u64, node.lon(), node.lat()),
				Element::DenseNode(node) => writer.put(node.id() as u64, node.lon(), node.lat()),
				_ => Ok(()),
			};
			if let Err(e) = result {
				first_error = Some(e);
			}
		})
		.with_context(|| format!("pass-1 scan of {}", path.display()))?;

	if let Some(e) = first_error {
		return Err(e.context("pass-1 node write failed"));
	}

	writer.finish()
}

/// Pass-2 reader: replays the same PBF file, reconstructing way and relation geometries
/// from the node store built in pass-1.
pub struct OsmPbfReader {
	path: PathBuf,
	node_store: Arc<NodeLocationStore>,
}

impl OsmPbfReader {
	#[must_use]
	pub fn new(path: PathBuf, node_store: Arc<NodeLocationStore>) -> Self {
		Self { path, node_store }
	}
}

fn tags_to_map(tags: impl Iterator<Item = (impl AsRef<str>, impl AsRef<str>)>) -> std::collections::BTreeMap<String, TagValue> {
	tags.map(|(k, v)| (k.as_ref().to_string(), TagValue::from(v.as_ref().to_string())))
		.collect()
}

impl SourceReader for OsmPbfReader {
	fn for_each(&mut self, visit: &mut dyn FnMut(SourceFeature) -> Result<()>) -> Result<()> {
		let reader =
			ElementReader::from_path(&self.path).with_context(|| format!("opening {}", self.path.display()))?;
		let node_store = self.node_store.clone();

		let mut first_error: Option<anyhow::Error> = None;

		reader
			.for_each(|element| {
				if first_error.is_some() {
					return;
				}
				let result = match element {
					Element::Node(node) => {
						let tags = tags_to_map(node.tags());
						let (lon, lat) = (node.lon(), node.lat());
						let feature = SourceFeature::new(node.id() as u64, SourceKind::Node, tags, move || {
							Ok(RawGeometry::Point([lon, lat]))
						});
						visit(feature)
					}
					Element::DenseNode(node) => {
						let tags = tags_to_map(node.tags());
						let (lon, lat) = (node.lon(), node.lat());
						let feature = SourceFeature::new(node.id() as u64, SourceKind::Node, tags, move || {
							Ok(RawGeometry::Point([lon, lat]))
						});
						visit(feature)
					}
					Element::Way(way) => {
						let tags = tags_to_map(way.tags());
						let node_ids: Vec<u64> = way.refs().map(|id| id as u64).collect();
						let store = node_store.clone();
						let feature = SourceFeature::new(way.id() as u64, SourceKind::Way, tags, move || {
							let mut line = Vec::with_capacity(node_ids.len());
							for id in node_ids {
								let (lon, lat) = require_node(&store, id)?;
								line.push([lon, lat]);
							}
							if line.len() >= 4 && line.first() == line.last() {
								Ok(RawGeometry::Polygon(vec![line]))
							} else {
								Ok(RawGeometry::Line(line))
							}
						});
						visit(feature)
					}
					Element::Relation(relation) => {
						let tags = tags_to_map(relation.tags());
						let mut feature = SourceFeature::new(relation.id() as u64, SourceKind::Relation, tags, || {
							// Multipolygon ring assembly from member ways is left to the profile:
							// the renderer receives an empty polygon shell and the profile is
							// expected to skip geometry-less relations it doesn't classify.
							Ok(RawGeometry::Polygon(vec![]))
						});
						feature.role_info = RoleInfo {
							role: relation.members().next().and_then(|m| m.role().ok()).map(str::to_string),
						};
						visit(feature)
					}
					Element::ChangeSet(_) => Ok(()),
				};
				if let Err(e) = result {
					first_error = Some(e);
				}
			})
			.with_context(|| format!("pass-2 scan of {}", self.path.display()))?;

		if let Some(e) = first_error {
			return Err(e);
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tags_to_map_collects_all_pairs() {
		let pairs = vec![("amenity", "airport"), ("iata", "XXX")];
		let map = tags_to_map(pairs.into_iter());
		assert_eq!(map.get("amenity").and_then(TagValue::as_str), Some("airport"));
		assert_eq!(map.get("iata").and_then(TagValue::as_str), Some("XXX"));
	}
}
