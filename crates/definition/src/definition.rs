//! The script definition value type.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::matcher::FileMatcher;
use crate::resolver::{DependencyResolution, DependencyResolver, NoDependencies};

/// Where a definition came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionOrigin {
	/// The built-in plain script definition.
	Standard,
	/// A legacy annotated template (`[script_template]`).
	LegacyTemplate,
	/// A structured descriptor (`[script]`).
	Descriptor,
}

/// Immutable descriptor of a recognized script kind.
///
/// Definitions are shared as `Arc<ScriptDefinition>` and never mutated after
/// construction.
#[derive(Debug, Clone)]
pub struct ScriptDefinition {
	id: String,
	display_name: String,
	origin: DefinitionOrigin,
	matcher: FileMatcher,
	template_resources: Vec<PathBuf>,
	environment: BTreeMap<String, String>,
	resolver: Arc<dyn DependencyResolver>,
}

impl ScriptDefinition {
	/// Creates a definition with no resources, no environment and a
	/// [`NoDependencies`] resolver.
	pub fn new(id: impl Into<String>, display_name: impl Into<String>, origin: DefinitionOrigin, matcher: FileMatcher) -> Self {
		Self {
			id: id.into(),
			display_name: display_name.into(),
			origin,
			matcher,
			template_resources: Vec::new(),
			environment: BTreeMap::new(),
			resolver: Arc::new(NoDependencies),
		}
	}

	pub fn with_template_resources(mut self, resources: Vec<PathBuf>) -> Self {
		self.template_resources = resources;
		self
	}

	pub fn with_environment(mut self, environment: BTreeMap<String, String>) -> Self {
		self.environment = environment;
		self
	}

	pub fn with_resolver(mut self, resolver: Arc<dyn DependencyResolver>) -> Self {
		self.resolver = resolver;
		self
	}

	/// Fully-qualified identifier this definition was materialized from.
	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn display_name(&self) -> &str {
		&self.display_name
	}

	pub fn origin(&self) -> DefinitionOrigin {
		self.origin
	}

	pub fn matcher(&self) -> &FileMatcher {
		&self.matcher
	}

	/// Resources the definition itself needs at runtime.
	///
	/// Resolver-only resources are never part of this list.
	pub fn template_resources(&self) -> &[PathBuf] {
		&self.template_resources
	}

	pub fn environment(&self) -> &BTreeMap<String, String> {
		&self.environment
	}

	pub fn resolver(&self) -> &Arc<dyn DependencyResolver> {
		&self.resolver
	}

	/// Returns true if `name` is a script of this kind.
	#[inline]
	pub fn is_match(&self, name: &str) -> bool {
		self.matcher.matches(name)
	}

	/// Runs the dependency strategy for `script`.
	pub fn resolve_dependencies(&self, script: &Path) -> DependencyResolution {
		self.resolver.resolve(script)
	}
}
