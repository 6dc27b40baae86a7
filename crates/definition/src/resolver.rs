//! Dependency-resolution strategies.
//!
//! Each definition carries an opaque [`DependencyResolver`]. The registry never
//! calls it; consumers invoke it after a script has been recognized.

use std::fmt;
use std::path::{Path, PathBuf};

/// Dependencies found for one script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies {
	/// Files to put on the script's classpath, in resolution order.
	pub classpath: Vec<PathBuf>,
	/// Declared dependencies that could not be located.
	pub unresolved: Vec<String>,
}

/// Outcome of a resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyResolution {
	Resolved(Dependencies),
	/// Nothing could be resolved, e.g. no toolchain on the host.
	Unresolvable { reason: String },
}

impl DependencyResolution {
	/// Returns the resolved dependencies, if any.
	pub fn dependencies(&self) -> Option<&Dependencies> {
		match self {
			Self::Resolved(deps) => Some(deps),
			Self::Unresolvable { .. } => None,
		}
	}

	pub fn is_resolved(&self) -> bool {
		matches!(self, Self::Resolved(_))
	}
}

/// Strategy resolving the dependencies of a script file.
///
/// Implementations must not panic; failures are reported as
/// [`DependencyResolution::Unresolvable`].
pub trait DependencyResolver: Send + Sync + fmt::Debug {
	fn resolve(&self, script: &Path) -> DependencyResolution;
}

/// Resolver that reports an empty dependency set.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDependencies;

impl DependencyResolver for NoDependencies {
	fn resolve(&self, _script: &Path) -> DependencyResolution {
		DependencyResolution::Resolved(Dependencies::default())
	}
}
