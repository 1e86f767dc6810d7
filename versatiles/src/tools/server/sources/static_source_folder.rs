use anyhow::{ensure, Result};
use async_trait::async_trait;
use std::{
	env::current_dir,
	fmt::Debug,
	fs::File,
	io::{BufReader, Read},
	path::{Path, PathBuf},
};
use versatiles_core::{
	types::{Blob, TileCompression},
	utils::TargetCompression,
};

use crate::tools::server::{utils::guess_mime, Url};

use super::{static_source::StaticSourceTrait, SourceResponse};

// Folder struct definition
#[derive(Clone)]
pub struct Folder {
	folder: PathBuf,
	name: String,
}

impl Folder {
	// Constructor for the Folder struct
	pub fn from(path: &Path) -> Result<Folder> {
		let mut folder = current_dir()?;
		folder.push(Path::new(path));
		folder = folder.canonicalize()?;

		// Check that the folder exists, is absolute and is a directory
		ensure!(folder.exists(), "path {folder:?} does not exist");
		ensure!(folder.is_absolute(), "path {folder:?} must be absolute");
		ensure!(folder.is_dir(), "path {folder:?} must be a directory");

		folder = folder.canonicalize()?;

		// Create a new Folder struct with the given path and name
		Ok(Folder {
			folder,
			name: path.to_str().unwrap().to_owned(),
		})
	}
}

#[async_trait]
impl StaticSourceTrait for Folder {
	#[cfg(test)]
	fn get_type(&self) -> &str {
		"folder"
	}

	// Returns the name of the folder
	#[cfg(test)]
	fn get_name(&self) -> &str {
		&self.name
	}

	// Gets the data at the given path and responds with a compressed or uncompressed version
	// based on the accept header
	fn get_data(&self, url: &Url, _accept: &TargetCompression) -> Option<SourceResponse> {
		let mut local_path = url.as_path(&self.folder);

		// If the path is a directory, append 'index.html'
		if local_path.is_dir() {
			local_path.push("index.html");
		}

		// If the local path is not a subpath of the folder or it doesn't exist, return not found
		if !local_path.starts_with(&self.folder) || !local_path.exists() || !local_path.is_file() {
			return None;
		}

		let f = File::open(&local_path).unwrap();
		let mut buffer = Vec::new();
		BufReader::new(f).read_to_end(&mut buffer).unwrap();
		let blob = Blob::from(buffer);

		let mime = guess_mime(&local_path);

		SourceResponse::new_some(blob, &TileCompression::Uncompressed, &mime)
	}
}

impl Debug for Folder {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Folder")
			.field("folder", &self.folder)
			.field("name", &self.name)
			.finish()
	}
}
