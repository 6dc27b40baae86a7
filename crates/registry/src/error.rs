use kscript_definition::ProviderId;
use thiserror::Error;

/// Errors surfaced by registry operations.
///
/// Provider and loader failures are contained inside the registry; only
/// caller mistakes reach this type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
	/// The provider is not part of the loaded contribution map.
	#[error("unknown script definition provider: {0}")]
	UnknownProvider(ProviderId),
}
