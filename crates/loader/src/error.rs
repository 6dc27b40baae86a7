use std::path::PathBuf;

use thiserror::Error;

/// Why a single identifier could not be turned into a definition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MaterializeError {
	/// No resource holds the identifier. Expected when an optional
	/// integration is absent.
	#[error("definition not found: {identifier}")]
	NotFound { identifier: String },

	/// The identifier was located (or is unusable as given) but does not
	/// describe a valid definition.
	#[error("malformed definition {identifier}: {reason}")]
	Malformed { identifier: String, reason: String },
}

impl MaterializeError {
	pub(crate) fn malformed(identifier: &str, reason: impl Into<String>) -> Self {
		Self::Malformed {
			identifier: identifier.to_string(),
			reason: reason.into(),
		}
	}

	pub fn identifier(&self) -> &str {
		match self {
			Self::NotFound { identifier } | Self::Malformed { identifier, .. } => identifier,
		}
	}

	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound { .. })
	}
}

/// The resource set as a whole could not be opened.
#[derive(Error, Debug)]
pub enum BatchLoadError {
	#[error("resource location does not exist: {}", .0.display())]
	MissingLocation(PathBuf),

	#[error("resource location is neither a directory nor a native library: {}", .0.display())]
	UnsupportedLocation(PathBuf),

	#[error("failed to load library {}: {reason}", path.display())]
	Library { path: PathBuf, reason: String },
}
