//! The provider contract.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::definition::ScriptDefinition;

/// Stable identity of a provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderId(Arc<str>);

impl ProviderId {
	pub fn new(id: impl AsRef<str>) -> Self {
		Self(Arc::from(id.as_ref()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for ProviderId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for ProviderId {
	fn from(id: &str) -> Self {
		Self::new(id)
	}
}

impl From<String> for ProviderId {
	fn from(id: String) -> Self {
		Self(Arc::from(id))
	}
}

impl Borrow<str> for ProviderId {
	fn borrow(&self) -> &str {
		&self.0
	}
}

/// A provider failed to produce its definitions.
#[derive(Error, Debug)]
pub enum ProviderError {
	#[error("{0}")]
	Failed(String),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

/// A named source of script definitions.
///
/// `definitions` is called on every refresh that covers this provider and its
/// result replaces the previous contribution wholesale.
pub trait DefinitionProvider: Send + Sync {
	fn id(&self) -> &ProviderId;

	fn definitions(&self) -> Result<Vec<Arc<ScriptDefinition>>, ProviderError>;

	/// True if the last production attempt went wrong in a way the provider
	/// recovered from internally.
	fn is_in_error_state(&self) -> bool {
		false
	}
}

impl fmt::Debug for dyn DefinitionProvider {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DefinitionProvider")
			.field("id", self.id())
			.finish_non_exhaustive()
	}
}
