//! Provider-partitioned definition cache.
//!
//! # Mental model
//!
//! * Each provider owns one contribution: the definitions it produced on its
//!   last refresh. Contributions are replaced wholesale, never edited.
//! * The flattened list is the concatenation of all contributions in
//!   provider-registration order, rebuilt on every write.
//! * Lookups walk the flattened list and the first match wins.
//!
//! # Concurrency & ordering
//!
//! * One `RwLock` guards contributions, the flattened list and the error flag.
//! * Reads take the shared lock; refreshes and the lazy first load take the
//!   exclusive lock, so a reader sees either the state before or after a write.
//! * The lazy load re-checks under the write lock: concurrent first readers
//!   perform exactly one load.
//! * Dependents are invalidated inside the write section, after the commit.
//!
//! # Failure modes & recovery
//!
//! * A provider that errors or panics contributes nothing for that cycle and
//!   sets the error flag; the refresh itself always completes.
//! * Referencing a provider missing from a loaded registry is a caller bug
//!   and returns [`RegistryError::UnknownProvider`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use indexmap::IndexMap;
use kscript_definition::{DefinitionProvider, ProviderId, ScriptDefinition};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::RegistryError;
use crate::invalidate::{DependentCache, NoDependents};
use crate::source::ProviderSource;

/// Flattened definitions together with the write that produced them.
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
	/// Number of committed writes so far; 0 before the first load.
	pub generation: u64,
	pub definitions: Arc<[Arc<ScriptDefinition>]>,
}

struct Contribution {
	provider: Arc<dyn DefinitionProvider>,
	definitions: Vec<Arc<ScriptDefinition>>,
	production_failed: bool,
	failed: bool,
}

impl Contribution {
	fn produce(provider: Arc<dyn DefinitionProvider>) -> Self {
		let id = provider.id().clone();
		let outcome = panic::catch_unwind(AssertUnwindSafe(|| provider.definitions()));

		let (definitions, production_failed) = match outcome {
			Ok(Ok(definitions)) => (definitions, false),
			Ok(Err(e)) => {
				tracing::warn!(provider = %id, error = %e, "script definition provider failed");
				(Vec::new(), true)
			}
			Err(payload) => {
				tracing::error!(provider = %id, panic = %panic_message(payload.as_ref()), "script definition provider panicked");
				(Vec::new(), true)
			}
		};

		let mut contribution = Self {
			provider,
			definitions,
			production_failed,
			failed: production_failed,
		};
		contribution.recheck_error_state();
		contribution
	}

	fn recheck_error_state(&mut self) {
		let reported = panic::catch_unwind(AssertUnwindSafe(|| self.provider.is_in_error_state())).unwrap_or(true);
		self.failed = self.production_failed || reported;
	}
}

struct RegistryState {
	loaded: bool,
	generation: u64,
	contributions: IndexMap<ProviderId, Contribution>,
	flattened: Arc<[Arc<ScriptDefinition>]>,
	has_failed_providers: bool,
}

impl Default for RegistryState {
	fn default() -> Self {
		Self {
			loaded: false,
			generation: 0,
			contributions: IndexMap::new(),
			flattened: Arc::from(Vec::<Arc<ScriptDefinition>>::new()),
			has_failed_providers: false,
		}
	}
}

/// Thread-safe registry of script definitions contributed by providers.
///
/// One registry is constructed per scope (e.g. per project) and shared with
/// its consumers, typically as `Arc<DefinitionRegistry>`.
pub struct DefinitionRegistry {
	providers: Arc<dyn ProviderSource>,
	dependents: Arc<dyn DependentCache>,
	state: RwLock<RegistryState>,
}

impl DefinitionRegistry {
	/// Creates an empty registry; nothing is loaded until first use.
	pub fn new(providers: Arc<dyn ProviderSource>) -> Self {
		Self {
			providers,
			dependents: Arc::new(NoDependents),
			state: RwLock::new(RegistryState::default()),
		}
	}

	/// Sets the cache invalidated after every committed write.
	pub fn with_dependents(mut self, dependents: Arc<dyn DependentCache>) -> Self {
		self.dependents = dependents;
		self
	}

	/// Returns true if some definition recognizes `name`.
	pub fn is_recognized(&self, name: &str) -> bool {
		self.read_loaded().flattened.iter().any(|def| def.is_match(name))
	}

	/// Returns the first definition recognizing `name`, in provider
	/// registration order.
	pub fn resolve(&self, name: &str) -> Option<Arc<ScriptDefinition>> {
		self.read_loaded()
			.flattened
			.iter()
			.find(|def| def.is_match(name))
			.cloned()
	}

	/// All definitions in lookup order.
	pub fn definitions(&self) -> Arc<[Arc<ScriptDefinition>]> {
		self.read_loaded().flattened.clone()
	}

	/// All definitions in lookup order, tagged with the write that produced
	/// them.
	pub fn snapshot(&self) -> RegistrySnapshot {
		let state = self.read_loaded();
		RegistrySnapshot {
			generation: state.generation,
			definitions: state.flattened.clone(),
		}
	}

	/// Current contribution of one provider.
	///
	/// Does not trigger a load: returns an empty list if nothing has been
	/// loaded yet.
	pub fn definitions_for(&self, id: &ProviderId) -> Result<Vec<Arc<ScriptDefinition>>, RegistryError> {
		let state = self.state.read();
		if !state.loaded {
			return Ok(Vec::new());
		}
		state
			.contributions
			.get(id)
			.map(|c| c.definitions.clone())
			.ok_or_else(|| RegistryError::UnknownProvider(id.clone()))
	}

	/// True if any provider failed its last production or reports an error
	/// state. Does not trigger a load.
	pub fn has_failed_providers(&self) -> bool {
		self.state.read().has_failed_providers
	}

	/// True once the first full load has completed.
	pub fn is_loaded(&self) -> bool {
		self.state.read().loaded
	}

	/// Loaded provider ids in registration order; empty before the first load.
	pub fn provider_ids(&self) -> Vec<ProviderId> {
		self.state.read().contributions.keys().cloned().collect()
	}

	/// Re-enumerates providers and rebuilds every contribution.
	pub fn refresh_all(&self) {
		let mut state = self.state.write();
		self.reload_all(&mut state);
	}

	/// Rebuilds the contribution of one provider.
	///
	/// A no-op before the first load.
	pub fn refresh_one(&self, id: &ProviderId) -> Result<(), RegistryError> {
		let mut state = self.state.write();
		if !state.loaded {
			tracing::trace!(provider = %id, "registry not loaded, skipping provider refresh");
			return Ok(());
		}

		let provider = state
			.contributions
			.get(id)
			.map(|c| c.provider.clone())
			.ok_or_else(|| RegistryError::UnknownProvider(id.clone()))?;

		let contribution = Contribution::produce(provider);
		state.contributions.insert(id.clone(), contribution);
		for c in state.contributions.values_mut() {
			c.recheck_error_state();
		}

		self.commit(&mut state);
		Ok(())
	}

	/// Shared guard over loaded state, performing the first load if needed.
	fn read_loaded(&self) -> RwLockReadGuard<'_, RegistryState> {
		let state = self.state.read();
		if state.loaded {
			return state;
		}
		drop(state);

		let mut state = self.state.write();
		// Another thread may have loaded while we waited.
		if !state.loaded {
			self.reload_all(&mut state);
		}
		RwLockWriteGuard::downgrade(state)
	}

	fn reload_all(&self, state: &mut RegistryState) {
		let providers = self.providers.providers();
		let mut contributions = IndexMap::with_capacity(providers.len());

		for provider in providers {
			let id = provider.id().clone();
			if contributions.contains_key(&id) {
				tracing::warn!(provider = %id, "duplicate script definition provider ignored");
				continue;
			}
			contributions.insert(id, Contribution::produce(provider));
		}

		state.contributions = contributions;
		state.loaded = true;
		self.commit(state);
	}

	fn commit(&self, state: &mut RegistryState) {
		state.flattened = state
			.contributions
			.values()
			.flat_map(|c| c.definitions.iter().cloned())
			.collect();
		state.has_failed_providers = state.contributions.values().any(|c| c.failed);
		state.generation += 1;

		tracing::debug!(
			generation = state.generation,
			providers = state.contributions.len(),
			definitions = state.flattened.len(),
			failed = state.has_failed_providers,
			"script definitions refreshed"
		);

		self.dependents.invalidate();
	}
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(s) = payload.downcast_ref::<&str>() {
		(*s).to_string()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"non-string panic payload".to_string()
	}
}
