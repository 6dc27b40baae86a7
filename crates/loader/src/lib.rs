// Loader diagnostics go through tracing; hosts decide where they end up.
#![deny(clippy::print_stderr)]

//! Dynamic loading of script definitions.
//!
//! # Architecture
//!
//! * [`resource`]: opening directory and native library resource locations
//! * [`item`]: classifying descriptor documents into [`LoadedItem`] shapes
//! * [`loader`]: materializing identifiers into [`ScriptDefinition`]s with
//!   per-identifier fault isolation
//! * [`discovery`]: marker-file discovery and the [`DiscoveryProvider`]
//! * [`paths`]: definition search path configuration
//!
//! [`ScriptDefinition`]: kscript_definition::ScriptDefinition

pub mod discovery;
pub mod error;
pub mod item;
pub mod loader;
pub mod paths;
pub mod resource;

pub use discovery::{DiscoveryProvider, MARKER_DIR, discover_identifiers};
pub use error::{BatchLoadError, MaterializeError};
pub use item::{LegacyTemplate, LoadedItem, StructuredDescriptor};
pub use loader::{DeclaredDependencies, DefinitionLoader, LoadReport, LoadRequest, load_definitions};
pub use paths::{DEFINITIONS_PATH_ENV, definition_search_paths};
pub use resource::{LocatedItem, ResourceSet};
