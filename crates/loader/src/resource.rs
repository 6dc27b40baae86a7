//! Resource locations definitions are loaded from.
//!
//! A location is either a directory of descriptor documents or a native
//! library exporting one symbol per definition. Identifiers are mapped to
//! both by naming convention:
//!
//! | Identifier | Directory entry | Library symbol |
//! |---|---|---|
//! | `org.example.Build` | `org/example/Build.toml` | `kscript_definition__org__example__Build` |
//!
//! A library symbol is an `extern "C" fn() -> *const c_char` returning a
//! NUL-terminated descriptor document with static lifetime. It must not
//! unwind.
//!
//! Segments never contain `__` nor start or end with `_`, so every `__` in a
//! symbol is a segment separator and distinct identifiers get distinct
//! symbols.

use std::ffi::{CStr, OsStr, c_char};
use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};

use crate::error::{BatchLoadError, MaterializeError};

/// Extension of descriptor documents inside directory resources.
pub const DESCRIPTOR_EXTENSION: &str = "toml";

/// Prefix of descriptor symbols exported by native libraries.
pub const SYMBOL_PREFIX: &str = "kscript_definition__";

type DescriptorFn = unsafe extern "C" fn() -> *const c_char;

enum Resource {
	Directory(PathBuf),
	Library { path: PathBuf, library: Library },
}

/// A descriptor document found for an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedItem {
	pub identifier: String,
	/// The file or library the document came from.
	pub location: PathBuf,
	pub document: String,
}

/// An opened, ordered set of resource locations.
pub struct ResourceSet {
	resources: Vec<Resource>,
}

impl ResourceSet {
	/// Opens every location, loading native libraries eagerly.
	///
	/// Fails as a whole if any location is missing or unusable.
	pub fn open(locations: &[PathBuf]) -> Result<Self, BatchLoadError> {
		let mut resources = Vec::with_capacity(locations.len());
		for path in locations {
			if path.is_dir() {
				resources.push(Resource::Directory(path.clone()));
			} else if path.is_file() && is_native_library(path) {
				// SAFETY: library initializers run arbitrary code; resource locations
				// are trusted like any plugin directory the host configures.
				let library = unsafe { Library::new(path) }.map_err(|e| BatchLoadError::Library {
					path: path.clone(),
					reason: e.to_string(),
				})?;
				resources.push(Resource::Library {
					path: path.clone(),
					library,
				});
			} else if path.exists() {
				return Err(BatchLoadError::UnsupportedLocation(path.clone()));
			} else {
				return Err(BatchLoadError::MissingLocation(path.clone()));
			}
		}
		Ok(Self { resources })
	}

	/// Directory locations, in search order.
	pub fn directories(&self) -> impl Iterator<Item = &Path> {
		self.resources.iter().filter_map(|r| match r {
			Resource::Directory(path) => Some(path.as_path()),
			Resource::Library { .. } => None,
		})
	}

	pub fn len(&self) -> usize {
		self.resources.len()
	}

	pub fn is_empty(&self) -> bool {
		self.resources.is_empty()
	}

	/// Finds the descriptor document for `identifier`; the first location
	/// holding it wins.
	pub fn locate(&self, identifier: &str) -> Result<LocatedItem, MaterializeError> {
		validate_identifier(identifier)?;

		for resource in &self.resources {
			let found = match resource {
				Resource::Directory(dir) => locate_in_directory(dir, identifier)?,
				Resource::Library { path, library } => locate_in_library(path, library, identifier)?,
			};
			if let Some(item) = found {
				return Ok(item);
			}
		}

		Err(MaterializeError::NotFound {
			identifier: identifier.to_string(),
		})
	}
}

fn locate_in_directory(dir: &Path, identifier: &str) -> Result<Option<LocatedItem>, MaterializeError> {
	let path = dir.join(descriptor_path(identifier));
	if !path.is_file() {
		return Ok(None);
	}
	let document = std::fs::read_to_string(&path)
		.map_err(|e| MaterializeError::malformed(identifier, format!("cannot read {}: {e}", path.display())))?;
	Ok(Some(LocatedItem {
		identifier: identifier.to_string(),
		location: path,
		document,
	}))
}

fn locate_in_library(path: &Path, library: &Library, identifier: &str) -> Result<Option<LocatedItem>, MaterializeError> {
	let symbol = symbol_name(identifier);
	// SAFETY: exported descriptor symbols have the `DescriptorFn` signature,
	// and the symbol does not outlive `library`.
	let describe: Symbol<DescriptorFn> = match unsafe { library.get(&symbol) } {
		Ok(sym) => sym,
		Err(_) => return Ok(None),
	};

	// SAFETY: takes no arguments and does not unwind across the boundary.
	let ptr = unsafe { describe() };
	if ptr.is_null() {
		return Err(MaterializeError::malformed(identifier, "descriptor symbol returned null"));
	}
	// SAFETY: non-null, NUL-terminated and static, valid while the library is
	// loaded; copied out before returning.
	let document = unsafe { CStr::from_ptr(ptr) }
		.to_str()
		.map_err(|e| MaterializeError::malformed(identifier, format!("descriptor is not UTF-8: {e}")))?
		.to_string();

	Ok(Some(LocatedItem {
		identifier: identifier.to_string(),
		location: path.to_path_buf(),
		document,
	}))
}

/// Checks that `identifier` is a dotted name of `[A-Za-z0-9_]` segments.
///
/// A segment may not start or end with `_` nor contain `__`, which keeps
/// [`symbol_name`] injective.
pub fn validate_identifier(identifier: &str) -> Result<(), MaterializeError> {
	let valid = !identifier.is_empty() && identifier.split('.').all(valid_segment);
	if valid {
		Ok(())
	} else {
		Err(MaterializeError::malformed(identifier, "invalid identifier"))
	}
}

fn valid_segment(seg: &str) -> bool {
	!seg.is_empty()
		&& seg.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
		&& !seg.starts_with('_')
		&& !seg.ends_with('_')
		&& !seg.contains("__")
}

/// Relative path of the descriptor document for `identifier`.
pub fn descriptor_path(identifier: &str) -> PathBuf {
	let mut path: PathBuf = identifier.split('.').collect();
	path.set_extension(DESCRIPTOR_EXTENSION);
	path
}

/// NUL-terminated symbol name for `identifier`.
pub fn symbol_name(identifier: &str) -> Vec<u8> {
	let mut name = String::from(SYMBOL_PREFIX);
	name.push_str(&identifier.replace('.', "__"));
	name.push('\0');
	name.into_bytes()
}

/// Returns true for shared library file names on any supported platform.
pub fn is_native_library(path: &Path) -> bool {
	matches!(path.extension().and_then(OsStr::to_str), Some("so" | "dylib" | "dll"))
}
