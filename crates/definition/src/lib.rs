//! Script definitions and the provider contract.
//!
//! * [`definition`]: the immutable [`ScriptDefinition`] value
//! * [`matcher`]: file name predicates ([`FileMatcher`])
//! * [`resolver`]: opaque dependency-resolution strategies
//! * [`provider`]: the [`DefinitionProvider`] contract
//! * [`standard`]: the built-in plain script provider

pub mod definition;
pub mod matcher;
pub mod provider;
pub mod resolver;
pub mod standard;

pub use definition::{DefinitionOrigin, ScriptDefinition};
pub use matcher::{DEFAULT_EXTENSION, DEFAULT_FILE_PATTERN, FileMatcher, MatcherError};
pub use provider::{DefinitionProvider, ProviderError, ProviderId};
pub use resolver::{Dependencies, DependencyResolution, DependencyResolver, NoDependencies};
pub use standard::{STANDARD_ID, StandardProvider, ToolchainResolver};
