//! Built-in plain script definition.
//!
//! The [`StandardProvider`] is always registered and contributes a single
//! definition for `.kts` files that use no template. Its dependencies are the
//! runtime libraries of whichever toolchain the host has installed.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use crate::definition::{DefinitionOrigin, ScriptDefinition};
use crate::matcher::{DEFAULT_EXTENSION, FileMatcher};
use crate::provider::{DefinitionProvider, ProviderError, ProviderId};
use crate::resolver::{Dependencies, DependencyResolution, DependencyResolver};

/// Identifier of the standard definition and of its provider.
pub const STANDARD_ID: &str = "kscript.standard";

/// Environment variable pointing at a toolchain installation.
pub const TOOLCHAIN_HOME_ENV: &str = "KOTLIN_HOME";

/// Compiler executable searched on `PATH` when the env var is unset.
pub const TOOLCHAIN_EXECUTABLE: &str = "kotlinc";

/// Minimal runtime libraries, relative to the toolchain home.
pub const RUNTIME_LIBRARIES: &[&str] = &["lib/kotlin-stdlib.jar", "lib/kotlin-script-runtime.jar"];

/// Resolves the toolchain runtime libraries for plain scripts.
#[derive(Debug)]
pub struct ToolchainResolver {
	home: OnceLock<Option<PathBuf>>,
}

impl ToolchainResolver {
	/// Locates the toolchain on first use.
	pub fn from_host() -> Self {
		Self { home: OnceLock::new() }
	}

	/// Uses a fixed toolchain home (or none) instead of probing the host.
	pub fn with_home(home: Option<PathBuf>) -> Self {
		Self {
			home: OnceLock::from(home),
		}
	}

	/// The toolchain home, if one was found.
	pub fn home(&self) -> Option<&Path> {
		self.home.get_or_init(locate_toolchain_home).as_deref()
	}
}

impl DependencyResolver for ToolchainResolver {
	fn resolve(&self, _script: &Path) -> DependencyResolution {
		let Some(home) = self.home() else {
			return DependencyResolution::Unresolvable {
				reason: "no toolchain found on this host".to_string(),
			};
		};

		let classpath: Vec<PathBuf> = RUNTIME_LIBRARIES
			.iter()
			.map(|lib| home.join(lib))
			.filter(|path| path.is_file())
			.collect();

		if classpath.is_empty() {
			return DependencyResolution::Unresolvable {
				reason: format!("no runtime libraries under {}", home.display()),
			};
		}

		DependencyResolution::Resolved(Dependencies {
			classpath,
			unresolved: Vec::new(),
		})
	}
}

fn locate_toolchain_home() -> Option<PathBuf> {
	if let Some(home) = std::env::var_os(TOOLCHAIN_HOME_ENV).map(PathBuf::from) {
		if home.is_dir() {
			return Some(home);
		}
		tracing::debug!(path = %home.display(), "{TOOLCHAIN_HOME_ENV} is not a directory");
	}

	// <home>/bin/kotlinc
	let exe = which::which(TOOLCHAIN_EXECUTABLE).ok()?;
	let exe = exe.canonicalize().unwrap_or(exe);
	let home = exe.parent()?.parent()?.to_path_buf();
	tracing::debug!(path = %home.display(), "located toolchain via PATH");
	Some(home)
}

/// Provider of the built-in plain script definition.
#[derive(Debug)]
pub struct StandardProvider {
	id: ProviderId,
	definition: Arc<ScriptDefinition>,
}

impl StandardProvider {
	/// Standard provider resolving dependencies against the host toolchain.
	pub fn new() -> Self {
		Self::with_resolver(ToolchainResolver::from_host())
	}

	pub fn with_resolver(resolver: ToolchainResolver) -> Self {
		let definition = ScriptDefinition::new(
			STANDARD_ID,
			"Kotlin script",
			DefinitionOrigin::Standard,
			FileMatcher::Extension {
				extension: DEFAULT_EXTENSION.to_string(),
				path_pattern: None,
			},
		)
		.with_resolver(Arc::new(resolver));

		Self {
			id: ProviderId::new(STANDARD_ID),
			definition: Arc::new(definition),
		}
	}

	/// The single definition this provider contributes.
	pub fn definition(&self) -> &Arc<ScriptDefinition> {
		&self.definition
	}
}

impl Default for StandardProvider {
	fn default() -> Self {
		Self::new()
	}
}

impl DefinitionProvider for StandardProvider {
	fn id(&self) -> &ProviderId {
		&self.id
	}

	fn definitions(&self) -> Result<Vec<Arc<ScriptDefinition>>, ProviderError> {
		Ok(vec![self.definition.clone()])
	}
}
