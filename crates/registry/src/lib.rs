//! Registry of script definitions contributed by pluggable providers.
//!
//! # Architecture
//!
//! * [`registry`]: [`DefinitionRegistry`], the lazily loaded, lock-protected
//!   cache answering "which definition recognizes this file?"
//! * [`source`]: provider enumeration ([`ProviderList`], [`InventoryProviders`])
//! * [`invalidate`]: the [`DependentCache`] notified after every write
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use kscript_definition::{StandardProvider, ToolchainResolver};
//! use kscript_registry::{DefinitionRegistry, ProviderList};
//!
//! let providers = Arc::new(ProviderList::new());
//! providers.register(Arc::new(StandardProvider::with_resolver(ToolchainResolver::with_home(None))));
//!
//! let registry = DefinitionRegistry::new(providers);
//! assert!(registry.is_recognized("build.kts"));
//! assert_eq!(registry.resolve("build.kts").unwrap().id(), "kscript.standard");
//! assert!(registry.resolve("main.rs").is_none());
//! ```

pub mod error;
pub mod invalidate;
pub mod registry;
pub mod source;

pub use error::RegistryError;
pub use invalidate::{DependentCache, NoDependents};
pub use registry::{DefinitionRegistry, RegistrySnapshot};
pub use source::{InventoryProviders, ProviderList, ProviderRegistration, ProviderSource};

pub use kscript_definition as definition;
