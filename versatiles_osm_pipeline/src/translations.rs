//! Wikidata translation cache and `name_languages` resolution (SPEC_FULL.md §B). The cache is a
//! newline-delimited JSON file of `{qid, labels:{lang:text}}` records (spec.md §6's "Persisted
//! formats"), reloadable and append-friendly. Network fetching is out of scope: `fetch_wikidata`
//! is accepted and validated but only ever logs a warning and proceeds as a no-op.

use anyhow::{Context, Result};
use log::warn;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use versatiles_core::json::{read_ndjson_iter, JsonObject, JsonValue};

use crate::source::TagValue;

/// One cached Wikidata entity's labels, keyed by BCP-47 language tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WikidataLabels {
	pub qid: String,
	pub labels: BTreeMap<String, String>,
}

impl WikidataLabels {
	fn from_json(value: &JsonValue) -> Result<Self> {
		let obj = value.as_object()?;
		let qid = obj.get_string("qid")?.context("wikidata cache record missing 'qid'")?;
		let mut labels = BTreeMap::new();
		if let Some(labels_obj) = obj.get_object("labels")? {
			for (lang, text) in labels_obj.iter() {
				labels.insert(lang.clone(), text.as_str()?.to_string());
			}
		}
		Ok(Self { qid, labels })
	}

	fn to_json(&self) -> JsonValue {
		let mut labels = JsonObject::default();
		for (lang, text) in &self.labels {
			labels.set(lang, text.as_str());
		}
		let mut obj = JsonObject::default();
		obj.set("qid", self.qid.as_str());
		obj.set("labels", JsonValue::Object(labels));
		JsonValue::Object(obj)
	}
}

/// In-memory view of the wikidata cache file, loaded once at startup and consulted by every
/// emit-stage worker (read-only after load, so no locking is needed).
#[derive(Debug, Clone, Default)]
pub struct TranslationCache {
	by_qid: BTreeMap<String, WikidataLabels>,
}

impl TranslationCache {
	/// Loads the cache from `path`. A missing file is treated as an empty cache rather than an
	/// error, since the cache is append-friendly and may not exist yet on a first run.
	///
	/// # Errors
	/// Returns an `IoFailure`-classified error if the file exists but cannot be read, or a
	/// `SourceParseError`-classified error if a line is not valid JSON.
	pub fn load(path: &Path) -> Result<Self> {
		if !path.exists() {
			return Ok(Self::default());
		}
		let file = File::open(path).with_context(|| format!("opening wikidata cache {}", path.display()))?;
		let mut by_qid = BTreeMap::new();
		for record in read_ndjson_iter(BufReader::new(file)) {
			let value = record.with_context(|| format!("parsing wikidata cache {}", path.display()))?;
			let entry = WikidataLabels::from_json(&value)?;
			by_qid.insert(entry.qid.clone(), entry);
		}
		Ok(Self { by_qid })
	}

	#[must_use]
	pub fn get(&self, qid: &str) -> Option<&WikidataLabels> {
		self.by_qid.get(qid)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.by_qid.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.by_qid.is_empty()
	}
}

/// Append-only writer half, used only if a future fetch pass populates the cache. Kept separate
/// from [`TranslationCache`] so the read path never needs a file handle open for writing.
pub struct TranslationCacheWriter {
	writer: BufWriter<File>,
}

impl TranslationCacheWriter {
	/// Opens `path` for appending, creating it (and its parent directory) if absent.
	///
	/// # Errors
	/// Returns an `IoFailure`-classified error if the file or its parent directory cannot be
	/// created.
	pub fn open(path: &Path) -> Result<Self> {
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		let file = OpenOptions::new().create(true).append(true).open(path)?;
		Ok(Self { writer: BufWriter::new(file) })
	}

	/// Appends one record as a single NDJSON line.
	///
	/// # Errors
	/// Returns an `IoFailure`-classified error if the write fails.
	pub fn append(&mut self, entry: &WikidataLabels) -> Result<()> {
		writeln!(self.writer, "{}", entry.to_json().stringify())?;
		Ok(())
	}

	/// Flushes buffered writes to disk.
	///
	/// # Errors
	/// Returns an `IoFailure`-classified error if the flush fails.
	pub fn finish(mut self) -> Result<()> {
		self.writer.flush()?;
		Ok(())
	}
}

/// Validates `fetch_wikidata`: this crate carries no HTTP client, so a request to fetch is
/// logged and otherwise ignored rather than rejected as a bad argument (SPEC_FULL.md §B).
pub fn validate_fetch_wikidata(fetch_wikidata: bool, wikidata_cache: &Path) {
	if fetch_wikidata {
		warn!(
			"fetch_wikidata=true requested but no Wikidata HTTP client is wired into this build; \
			 continuing with the cache already present at {}",
			wikidata_cache.display()
		);
	}
}

/// Resolves the display name for one feature in `name_languages` preference order: a tag
/// `name:<lang>` wins first, then the cache's label for that language (if the feature carries a
/// `wikidata` tag), falling back through the list and finally to the bare `name` tag.
#[must_use]
pub fn resolve_name<'a>(
	tags: &'a BTreeMap<String, TagValue>,
	name_languages: &[String],
	cache: &'a TranslationCache,
) -> Option<&'a str> {
	let wikidata_qid = tags.get("wikidata").and_then(TagValue::as_str);
	let cached = wikidata_qid.and_then(|qid| cache.get(qid));

	for lang in name_languages {
		if let Some(v) = tags.get(&format!("name:{lang}")).and_then(TagValue::as_str) {
			return Some(v);
		}
		if let Some(labels) = cached {
			if let Some(v) = labels.labels.get(lang) {
				return Some(v.as_str());
			}
		}
	}
	tags.get("name").and_then(TagValue::as_str)
}

/// Resolves the cache path given the CLI's `wikidata_cache` key, only honoring it when
/// `use_wikidata` is set (spec.md §6).
#[must_use]
pub fn cache_path_if_enabled(use_wikidata: bool, wikidata_cache: &Path) -> Option<PathBuf> {
	use_wikidata.then(|| wikidata_cache.to_path_buf())
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	fn tags_with_name(pairs: &[(&str, &str)]) -> BTreeMap<String, TagValue> {
		pairs.iter().map(|(k, v)| (k.to_string(), TagValue::from(*v))).collect()
	}

	#[test]
	fn missing_cache_file_loads_empty() {
		let dir = tempdir().unwrap();
		let cache = TranslationCache::load(&dir.path().join("missing.json")).unwrap();
		assert!(cache.is_empty());
	}

	#[test]
	fn writer_then_loader_round_trips() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("cache.ndjson");
		let mut writer = TranslationCacheWriter::open(&path).unwrap();
		let mut labels = BTreeMap::new();
		labels.insert("de".to_string(), "Berlin".to_string());
		writer.append(&WikidataLabels { qid: "Q64".to_string(), labels }).unwrap();
		writer.finish().unwrap();

		let cache = TranslationCache::load(&path).unwrap();
		assert_eq!(cache.len(), 1);
		assert_eq!(cache.get("Q64").unwrap().labels.get("de").unwrap(), "Berlin");
	}

	#[test]
	fn resolve_name_prefers_explicit_name_tag_over_cache() {
		let tags = tags_with_name(&[("name:de", "Berlin DE"), ("wikidata", "Q64")]);
		let mut labels = BTreeMap::new();
		labels.insert("de".to_string(), "Berlin cached".to_string());
		let mut cache = TranslationCache::default();
        cache.by_qid.insert("Q64".to_string(), WikidataLabels { qid: "Q64".to_string(), labels });
		let name = resolve_name(&tags, &["de".to_string()], &cache);
		assert_eq!(name, Some("Berlin DE"));
	}

	#[test]
	fn resolve_name_falls_back_to_cache_then_bare_name() {
		let tags = tags_with_name(&[("name", "Berlin"), ("wikidata", "Q64")]);
		let mut labels = BTreeMap::new();
		labels.insert("fr".to_string(), "Berlin FR".to_string());
		let mut cache = TranslationCache::default();
		cache.by_qid.insert("Q64".to_string(), WikidataLabels { qid: "Q64".to_string(), labels });

		let name = resolve_name(&tags, &["fr".to_string()], &cache);
		assert_eq!(name, Some("Berlin FR"));

		let name_en = resolve_name(&tags, &["en".to_string()], &cache);
		assert_eq!(name_en, Some("Berlin"));
	}

	#[test]
	fn validate_fetch_wikidata_does_not_panic_when_requested() {
		validate_fetch_wikidata(true, Path::new("data/sources/wikidata_names.json"));
		validate_fetch_wikidata(false, Path::new("data/sources/wikidata_names.json"));
	}
}
