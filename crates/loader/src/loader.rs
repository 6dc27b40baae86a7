//! Materializing definitions from identifiers.
//!
//! Each identifier is processed in isolation: a missing or malformed item is
//! recorded and skipped, never aborting the batch. Only failing to open the
//! resource set fails the whole load, and [`load_definitions`] degrades even
//! that to an empty result.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kscript_definition::{
	DEFAULT_EXTENSION, DEFAULT_FILE_PATTERN, DefinitionOrigin, Dependencies, DependencyResolution,
	DependencyResolver, FileMatcher, ScriptDefinition,
};

use crate::error::{BatchLoadError, MaterializeError};
use crate::item::LoadedItem;
use crate::resource::{LocatedItem, ResourceSet};

/// Inputs of one load.
#[derive(Debug, Clone, Default)]
pub struct LoadRequest {
	/// Fully-qualified identifiers, in the order definitions are produced.
	pub identifiers: Vec<String>,
	/// Locations searched for the identifiers; become each definition's
	/// template resources.
	pub resources: Vec<PathBuf>,
	/// Passed through to every materialized definition.
	pub environment: BTreeMap<String, String>,
	/// Locations used only by the dependency resolver of each definition.
	pub resolver_resources: Vec<PathBuf>,
}

impl LoadRequest {
	pub fn new<I, S>(identifiers: I, resources: Vec<PathBuf>) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			identifiers: identifiers.into_iter().map(Into::into).collect(),
			resources,
			..Self::default()
		}
	}

	pub fn with_environment(mut self, environment: BTreeMap<String, String>) -> Self {
		self.environment = environment;
		self
	}

	pub fn with_resolver_resources(mut self, resources: Vec<PathBuf>) -> Self {
		self.resolver_resources = resources;
		self
	}
}

/// Result of a load whose resource set could be opened.
#[derive(Debug, Default)]
pub struct LoadReport {
	/// Materialized definitions, in request order.
	pub definitions: Vec<Arc<ScriptDefinition>>,
	/// Identifiers that could not be materialized, in request order.
	pub failures: Vec<MaterializeError>,
}

impl LoadReport {
	/// True if any identifier was located but malformed.
	pub fn has_malformed(&self) -> bool {
		self.failures.iter().any(|f| !f.is_not_found())
	}
}

/// Loads script definitions from resource locations.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefinitionLoader;

impl DefinitionLoader {
	pub fn new() -> Self {
		Self
	}

	/// Materializes every identifier of `request`, keeping per-identifier
	/// failures in the report.
	pub fn load(&self, request: &LoadRequest) -> Result<LoadReport, BatchLoadError> {
		let resources = ResourceSet::open(&request.resources)?;
		Ok(self.load_from(&resources, request))
	}

	/// Like [`DefinitionLoader::load`], against a set already opened from
	/// `request.resources`.
	pub fn load_from(&self, resources: &ResourceSet, request: &LoadRequest) -> LoadReport {
		let mut report = LoadReport::default();

		for identifier in &request.identifiers {
			match materialize(resources, identifier, request) {
				Ok(def) => {
					tracing::trace!(identifier = %identifier, "loaded script definition");
					report.definitions.push(Arc::new(def));
				}
				Err(e @ MaterializeError::NotFound { .. }) => {
					tracing::debug!(identifier = %identifier, "script definition not found");
					report.failures.push(e);
				}
				Err(e @ MaterializeError::Malformed { .. }) => {
					tracing::error!(identifier = %identifier, error = %e, "invalid script definition");
					report.failures.push(e);
				}
			}
		}

		report
	}
}

/// Loads the definitions of `request`, returning whatever could be
/// materialized. Never fails.
pub fn load_definitions(request: &LoadRequest) -> Vec<Arc<ScriptDefinition>> {
	match DefinitionLoader::new().load(request) {
		Ok(report) => report.definitions,
		Err(e) => {
			tracing::warn!(error = %e, "cannot load script definitions");
			Vec::new()
		}
	}
}

fn materialize(resources: &ResourceSet, identifier: &str, request: &LoadRequest) -> Result<ScriptDefinition, MaterializeError> {
	let LocatedItem {
		identifier,
		location,
		document,
	} = resources.locate(identifier)?;

	let item = LoadedItem::parse(&document)
		.map_err(|reason| MaterializeError::malformed(&identifier, format!("{}: {reason}", location.display())))?;

	build_definition(identifier, item, request)
}

/// Single dispatch point from item shape to definition.
fn build_definition(identifier: String, item: LoadedItem, request: &LoadRequest) -> Result<ScriptDefinition, MaterializeError> {
	let resolver = DeclaredDependencies::new(item.dependencies().to_vec(), request.resolver_resources.clone());

	let (name, origin, matcher) = match item {
		LoadedItem::LegacyTemplate(t) => {
			let pattern = t.file_pattern.as_deref().unwrap_or(DEFAULT_FILE_PATTERN);
			(t.name, DefinitionOrigin::LegacyTemplate, FileMatcher::pattern(pattern))
		}
		LoadedItem::StructuredDescriptor(d) => {
			let extension = d.file_extension.as_deref().unwrap_or(DEFAULT_EXTENSION);
			let matcher = FileMatcher::extension(extension, d.file_path_pattern.as_deref());
			(d.name, DefinitionOrigin::Descriptor, matcher)
		}
	};
	let matcher = matcher.map_err(|e| MaterializeError::malformed(&identifier, e.to_string()))?;

	Ok(ScriptDefinition::new(identifier, name, origin, matcher)
		.with_template_resources(request.resources.clone())
		.with_environment(request.environment.clone())
		.with_resolver(Arc::new(resolver)))
}

/// Resolves the dependency files a descriptor declares against the
/// resolver-only search path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredDependencies {
	declared: Vec<String>,
	search_path: Vec<PathBuf>,
}

impl DeclaredDependencies {
	pub fn new(declared: Vec<String>, search_path: Vec<PathBuf>) -> Self {
		Self { declared, search_path }
	}

	pub fn declared(&self) -> &[String] {
		&self.declared
	}

	pub fn search_path(&self) -> &[PathBuf] {
		&self.search_path
	}
}

impl DependencyResolver for DeclaredDependencies {
	fn resolve(&self, _script: &Path) -> DependencyResolution {
		let mut deps = Dependencies::default();
		for name in &self.declared {
			match self.search_path.iter().map(|dir| dir.join(name)).find(|p| p.is_file()) {
				Some(path) => deps.classpath.push(path),
				None => deps.unresolved.push(name.clone()),
			}
		}
		DependencyResolution::Resolved(deps)
	}
}

#[cfg(test)]
mod tests {
	use std::fs;

	use super::*;

	fn write(root: &Path, rel: &str, contents: &str) {
		let path = root.join(rel);
		fs::create_dir_all(path.parent().unwrap()).unwrap();
		fs::write(path, contents).unwrap();
	}

	#[test]
	fn legacy_template_uses_pattern() {
		let dir = tempfile::tempdir().unwrap();
		write(dir.path(), "org/Gradle.toml", "[script_template]\nname = \"Gradle\"\nfile_pattern = '.*\\.gradle\\.kts'\n");

		let defs = load_definitions(&LoadRequest::new(["org.Gradle"], vec![dir.path().to_path_buf()]));
		assert_eq!(defs.len(), 1);
		assert_eq!(defs[0].origin(), DefinitionOrigin::LegacyTemplate);
		assert!(defs[0].is_match("build.gradle.kts"));
		assert!(!defs[0].is_match("build.kts"));
	}

	#[test]
	fn legacy_template_defaults_to_kts() {
		let dir = tempfile::tempdir().unwrap();
		write(dir.path(), "Plain.toml", "[script_template]\nname = \"Plain\"\n");

		let defs = load_definitions(&LoadRequest::new(["Plain"], vec![dir.path().to_path_buf()]));
		assert!(defs[0].is_match("x.kts"));
	}

	#[test]
	fn descriptor_uses_extension() {
		let dir = tempfile::tempdir().unwrap();
		write(dir.path(), "org/Main.toml", "[script]\nname = \"Main\"\nfile_extension = \"main.kts\"\n");

		let defs = load_definitions(&LoadRequest::new(["org.Main"], vec![dir.path().to_path_buf()]));
		assert_eq!(defs[0].origin(), DefinitionOrigin::Descriptor);
		assert_eq!(defs[0].display_name(), "Main");
		assert!(defs[0].is_match("a.main.kts"));
		assert!(!defs[0].is_match("a.kts"));
	}

	#[test]
	fn invalid_regex_is_malformed() {
		let dir = tempfile::tempdir().unwrap();
		write(dir.path(), "Bad.toml", "[script_template]\nname = \"Bad\"\nfile_pattern = \"(\"\n");

		let report = DefinitionLoader::new()
			.load(&LoadRequest::new(["Bad"], vec![dir.path().to_path_buf()]))
			.unwrap();
		assert!(report.definitions.is_empty());
		assert!(report.has_malformed());
	}

	#[test]
	fn load_from_uses_the_given_set_without_reopening() {
		let dir = tempfile::tempdir().unwrap();
		write(dir.path(), "org/Main.toml", "[script]\nname = \"Main\"\n");
		let set = ResourceSet::open(&[dir.path().to_path_buf()]).unwrap();

		// No locations to open: only the shared set can supply the item.
		let request = LoadRequest::new(["org.Main", "org.Other"], Vec::new());
		let report = DefinitionLoader::new().load_from(&set, &request);
		assert_eq!(report.definitions.len(), 1);
		assert_eq!(report.definitions[0].id(), "org.Main");
		assert!(report.definitions[0].template_resources().is_empty());
		assert!(report.failures[0].is_not_found());
	}

	#[test]
	fn unreadable_resources_degrade_to_empty() {
		let dir = tempfile::tempdir().unwrap();
		let request = LoadRequest::new(["org.Main"], vec![dir.path().join("missing")]);
		assert!(DefinitionLoader::new().load(&request).is_err());
		assert!(load_definitions(&request).is_empty());
	}

	#[test]
	fn resolver_resources_stay_separate() {
		let defs_dir = tempfile::tempdir().unwrap();
		let deps_dir = tempfile::tempdir().unwrap();
		write(
			defs_dir.path(),
			"Ivy.toml",
			"[script]\nname = \"Ivy\"\ndependencies = [\"ivy.jar\", \"absent.jar\"]\n",
		);
		write(deps_dir.path(), "ivy.jar", "");

		let env = BTreeMap::from([("PROJECT".to_string(), "demo".to_string())]);
		let request = LoadRequest::new(["Ivy"], vec![defs_dir.path().to_path_buf()])
			.with_environment(env.clone())
			.with_resolver_resources(vec![deps_dir.path().to_path_buf()]);
		let defs = load_definitions(&request);

		let def = &defs[0];
		assert_eq!(def.template_resources(), &[defs_dir.path().to_path_buf()]);
		assert_eq!(def.environment(), &env);

		let res = def.resolve_dependencies(Path::new("a.kts"));
		let deps = res.dependencies().unwrap();
		assert_eq!(deps.classpath, vec![deps_dir.path().join("ivy.jar")]);
		assert_eq!(deps.unresolved, vec!["absent.jar".to_string()]);
	}
}
