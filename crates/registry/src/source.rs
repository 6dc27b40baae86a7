//! Provider enumeration.
//!
//! The registry asks its [`ProviderSource`] for the current providers on every
//! full load, so providers registered later are picked up by the next
//! [`crate::DefinitionRegistry::refresh_all`].

use std::sync::{Arc, OnceLock};

use kscript_definition::DefinitionProvider;
use parking_lot::RwLock;

/// Enumerates the currently registered providers, in registration order.
pub trait ProviderSource: Send + Sync {
	fn providers(&self) -> Vec<Arc<dyn DefinitionProvider>>;
}

/// Providers registered explicitly at runtime.
#[derive(Default)]
pub struct ProviderList {
	providers: RwLock<Vec<Arc<dyn DefinitionProvider>>>,
}

impl ProviderList {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a provider. It is seen by the next full load.
	pub fn register(&self, provider: Arc<dyn DefinitionProvider>) {
		self.providers.write().push(provider);
	}

	pub fn len(&self) -> usize {
		self.providers.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.providers.read().is_empty()
	}
}

impl From<Vec<Arc<dyn DefinitionProvider>>> for ProviderList {
	fn from(providers: Vec<Arc<dyn DefinitionProvider>>) -> Self {
		Self {
			providers: RwLock::new(providers),
		}
	}
}

impl ProviderSource for ProviderList {
	fn providers(&self) -> Vec<Arc<dyn DefinitionProvider>> {
		self.providers.read().clone()
	}
}

/// A provider registered at link time with `inventory::submit!`.
///
/// ```ignore
/// fn make() -> Arc<dyn DefinitionProvider> { Arc::new(MyProvider::new()) }
/// inventory::submit! { ProviderRegistration::new("my.provider", 10, make) }
/// ```
pub struct ProviderRegistration {
	/// Name used to order registrations with equal priority.
	pub name: &'static str,
	/// Lower priorities come first.
	pub priority: i32,
	pub create: fn() -> Arc<dyn DefinitionProvider>,
}

inventory::collect!(ProviderRegistration);

impl ProviderRegistration {
	pub const fn new(name: &'static str, priority: i32, create: fn() -> Arc<dyn DefinitionProvider>) -> Self {
		Self { name, priority, create }
	}
}

/// Providers collected from every [`ProviderRegistration`] linked into the
/// binary.
///
/// Each registration is instantiated once, on first enumeration, and the
/// same instances are returned afterwards.
#[derive(Default)]
pub struct InventoryProviders {
	instances: OnceLock<Vec<Arc<dyn DefinitionProvider>>>,
}

impl InventoryProviders {
	pub fn new() -> Self {
		Self::default()
	}
}

impl ProviderSource for InventoryProviders {
	fn providers(&self) -> Vec<Arc<dyn DefinitionProvider>> {
		self.instances
			.get_or_init(|| {
				let mut regs: Vec<&'static ProviderRegistration> = inventory::iter::<ProviderRegistration>.into_iter().collect();
				regs.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(b.name)));
				regs.into_iter().map(|reg| (reg.create)()).collect()
			})
			.clone()
	}
}
