//! Marker-file discovery and the provider built on it.
//!
//! A directory resource announces its definitions with empty marker files
//! under [`MARKER_DIR`]; each file name is a definition identifier.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use kscript_definition::{DefinitionProvider, ProviderError, ProviderId, ScriptDefinition};

use crate::error::BatchLoadError;
use crate::loader::{DefinitionLoader, LoadRequest};
use crate::paths::definition_search_paths;
use crate::resource::ResourceSet;

/// Marker directory, relative to a resource root.
pub const MARKER_DIR: &str = "META-INF/kscript/templates";

/// Lists the identifiers announced by marker files.
///
/// Roots are visited in order and names sorted within a root; an identifier
/// seen twice keeps its first position.
pub fn discover_identifiers(resources: &[PathBuf]) -> Result<Vec<String>, BatchLoadError> {
	Ok(discover_in(&ResourceSet::open(resources)?))
}

fn discover_in(set: &ResourceSet) -> Vec<String> {
	let mut seen = HashSet::new();
	let mut identifiers = Vec::new();

	for root in set.directories() {
		for name in marker_names(root) {
			if seen.insert(name.clone()) {
				identifiers.push(name);
			}
		}
	}

	identifiers
}

fn marker_names(root: &Path) -> Vec<String> {
	let dir = root.join(MARKER_DIR);
	let entries = match std::fs::read_dir(&dir) {
		Ok(entries) => entries,
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
		Err(e) => {
			tracing::warn!(path = %dir.display(), error = %e, "cannot read marker directory");
			return Vec::new();
		}
	};

	let mut names: Vec<String> = entries
		.flatten()
		.filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
		.filter_map(|entry| entry.file_name().into_string().ok())
		.collect();
	names.sort();
	names
}

/// Provider discovering definitions through marker files.
#[derive(Debug)]
pub struct DiscoveryProvider {
	id: ProviderId,
	resources: Vec<PathBuf>,
	environment: BTreeMap<String, String>,
	resolver_resources: Vec<PathBuf>,
	loader: DefinitionLoader,
	error_state: AtomicBool,
}

impl DiscoveryProvider {
	pub fn new(id: impl Into<ProviderId>, resources: Vec<PathBuf>) -> Self {
		Self {
			id: id.into(),
			resources,
			environment: BTreeMap::new(),
			resolver_resources: Vec::new(),
			loader: DefinitionLoader::new(),
			error_state: AtomicBool::new(false),
		}
	}

	/// Provider over the existing entries of [`definition_search_paths`].
	pub fn from_search_paths(id: impl Into<ProviderId>) -> Self {
		let resources = definition_search_paths().into_iter().filter(|p| p.is_dir()).collect();
		Self::new(id, resources)
	}

	pub fn with_environment(mut self, environment: BTreeMap<String, String>) -> Self {
		self.environment = environment;
		self
	}

	pub fn with_resolver_resources(mut self, resources: Vec<PathBuf>) -> Self {
		self.resolver_resources = resources;
		self
	}

	pub fn resources(&self) -> &[PathBuf] {
		&self.resources
	}

	fn try_definitions(&self) -> Result<(Vec<Arc<ScriptDefinition>>, bool), BatchLoadError> {
		// Opened once: discovery and loading share the loaded libraries.
		let set = ResourceSet::open(&self.resources)?;
		let request = LoadRequest {
			identifiers: discover_in(&set),
			resources: self.resources.clone(),
			environment: self.environment.clone(),
			resolver_resources: self.resolver_resources.clone(),
		};
		let report = self.loader.load_from(&set, &request);
		let malformed = report.has_malformed();
		Ok((report.definitions, malformed))
	}
}

impl DefinitionProvider for DiscoveryProvider {
	fn id(&self) -> &ProviderId {
		&self.id
	}

	fn definitions(&self) -> Result<Vec<Arc<ScriptDefinition>>, ProviderError> {
		let (definitions, failed) = match self.try_definitions() {
			Ok(result) => result,
			Err(e) => {
				tracing::warn!(provider = %self.id, error = %e, "definition discovery failed");
				(Vec::new(), true)
			}
		};
		self.error_state.store(failed, Ordering::Release);
		Ok(definitions)
	}

	fn is_in_error_state(&self) -> bool {
		self.error_state.load(Ordering::Acquire)
	}
}

#[cfg(test)]
mod tests {
	use std::fs;

	use super::*;

	fn marker(root: &Path, name: &str) {
		let dir = root.join(MARKER_DIR);
		fs::create_dir_all(&dir).unwrap();
		fs::write(dir.join(name), "").unwrap();
	}

	#[test]
	fn discovers_sorted_unique_identifiers() {
		let a = tempfile::tempdir().unwrap();
		let b = tempfile::tempdir().unwrap();
		marker(a.path(), "org.Zeta");
		marker(a.path(), "org.Alpha");
		marker(b.path(), "org.Alpha");
		marker(b.path(), "org.Beta");

		let ids = discover_identifiers(&[a.path().to_path_buf(), b.path().to_path_buf()]).unwrap();
		assert_eq!(ids, vec!["org.Alpha", "org.Zeta", "org.Beta"]);
	}

	#[test]
	fn root_without_markers_contributes_nothing() {
		let a = tempfile::tempdir().unwrap();
		assert!(discover_identifiers(&[a.path().to_path_buf()]).unwrap().is_empty());
	}

	#[test]
	fn provider_flags_malformed_items() {
		let root = tempfile::tempdir().unwrap();
		marker(root.path(), "Good");
		marker(root.path(), "Bad");
		fs::write(root.path().join("Good.toml"), "[script]\nname = \"Good\"\n").unwrap();
		fs::write(root.path().join("Bad.toml"), "[nothing]\n").unwrap();

		let provider = DiscoveryProvider::new("disc", vec![root.path().to_path_buf()]);
		let defs = provider.definitions().unwrap();
		assert_eq!(defs.len(), 1);
		assert_eq!(defs[0].id(), "Good");
		assert!(provider.is_in_error_state());
	}

	#[test]
	fn missing_items_do_not_flag_error() {
		let root = tempfile::tempdir().unwrap();
		marker(root.path(), "Optional");

		let provider = DiscoveryProvider::new("disc", vec![root.path().to_path_buf()]);
		assert!(provider.definitions().unwrap().is_empty());
		assert!(!provider.is_in_error_state());
	}

	#[test]
	fn unreadable_resources_flag_error() {
		let root = tempfile::tempdir().unwrap();
		let provider = DiscoveryProvider::new("disc", vec![root.path().join("gone")]);
		assert!(provider.definitions().unwrap().is_empty());
		assert!(provider.is_in_error_state());
	}
}
