//! Behavioral properties of the definition registry.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;

use kscript_definition::{DefinitionOrigin, DefinitionProvider, FileMatcher, ProviderError, ProviderId, ScriptDefinition};
use kscript_registry::{DefinitionRegistry, ProviderList, RegistryError};

fn init_tracing() {
	let _ = tracing_subscriber::fmt::try_init();
}

fn definition(id: &str, extension: &str) -> Arc<ScriptDefinition> {
	Arc::new(ScriptDefinition::new(
		id,
		id,
		DefinitionOrigin::Descriptor,
		FileMatcher::extension(extension, None).unwrap(),
	))
}

/// Returns the same definitions on every call and counts calls.
struct Counting {
	id: ProviderId,
	defs: Vec<Arc<ScriptDefinition>>,
	calls: AtomicUsize,
}

impl Counting {
	fn new(id: &str, defs: Vec<Arc<ScriptDefinition>>) -> Arc<Self> {
		Arc::new(Self {
			id: ProviderId::new(id),
			defs,
			calls: AtomicUsize::new(0),
		})
	}

	fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

impl DefinitionProvider for Counting {
	fn id(&self) -> &ProviderId {
		&self.id
	}

	fn definitions(&self) -> Result<Vec<Arc<ScriptDefinition>>, ProviderError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		Ok(self.defs.clone())
	}
}

struct Failing(ProviderId);

impl DefinitionProvider for Failing {
	fn id(&self) -> &ProviderId {
		&self.0
	}

	fn definitions(&self) -> Result<Vec<Arc<ScriptDefinition>>, ProviderError> {
		Err(ProviderError::Failed("backing store unavailable".into()))
	}
}

/// Produces fresh definitions tagged with a per-call round number.
struct Rounds {
	id: ProviderId,
	round: AtomicU64,
}

impl DefinitionProvider for Rounds {
	fn id(&self) -> &ProviderId {
		&self.id
	}

	fn definitions(&self) -> Result<Vec<Arc<ScriptDefinition>>, ProviderError> {
		let round = self.round.fetch_add(1, Ordering::SeqCst);
		Ok((0..4)
			.map(|i| definition(&format!("{}/{round}/{i}", self.id), "kts"))
			.collect())
	}
}

fn round_of(def: &ScriptDefinition) -> &str {
	def.id().split('/').nth(1).unwrap()
}

#[test]
fn first_read_loads_once() {
	init_tracing();
	let a = Counting::new("a", vec![definition("a.build", "build.kts")]);
	let b = Counting::new("b", vec![definition("b.main", "main.kts")]);
	let registry = DefinitionRegistry::new(Arc::new(ProviderList::from(vec![
		a.clone() as Arc<dyn DefinitionProvider>,
		b.clone(),
	])));

	assert!(registry.is_recognized("app.main.kts"));
	assert_eq!((a.calls(), b.calls()), (1, 1));

	assert!(!registry.is_recognized("app.rs"));
	assert!(registry.is_recognized("app.build.kts"));
	assert_eq!((a.calls(), b.calls()), (1, 1));
}

#[test]
fn concurrent_first_reads_load_once() {
	let a = Counting::new("a", vec![definition("a.any", "kts")]);
	let registry = Arc::new(DefinitionRegistry::new(Arc::new(ProviderList::from(vec![
		a.clone() as Arc<dyn DefinitionProvider>,
	]))));

	let handles: Vec<_> = (0..8)
		.map(|_| {
			let registry = registry.clone();
			thread::spawn(move || registry.is_recognized("x.kts"))
		})
		.collect();
	for handle in handles {
		assert!(handle.join().unwrap());
	}
	assert_eq!(a.calls(), 1);
}

#[test]
fn readers_never_see_mixed_generations() {
	init_tracing();
	let providers: Vec<Arc<dyn DefinitionProvider>> = ["a", "b", "c"]
		.into_iter()
		.map(|id| {
			Arc::new(Rounds {
				id: ProviderId::new(id),
				round: AtomicU64::new(0),
			}) as Arc<dyn DefinitionProvider>
		})
		.collect();
	let registry = Arc::new(DefinitionRegistry::new(Arc::new(ProviderList::from(providers))));
	registry.refresh_all();

	let readers: Vec<_> = (0..4)
		.map(|_| {
			let registry = registry.clone();
			thread::spawn(move || {
				for _ in 0..500 {
					let snap = registry.snapshot();
					assert_eq!(snap.definitions.len(), 12);
					let round = round_of(&snap.definitions[0]);
					assert!(snap.definitions.iter().all(|d| round_of(d) == round));

					let first = registry.resolve("x.kts").expect("always recognized");
					assert!(first.id().starts_with("a/"));
				}
			})
		})
		.collect();

	let writer = {
		let registry = registry.clone();
		thread::spawn(move || {
			for _ in 0..50 {
				registry.refresh_all();
			}
		})
	};

	writer.join().unwrap();
	for reader in readers {
		reader.join().unwrap();
	}
	assert_eq!(registry.snapshot().generation, 51);
}

#[test]
fn failing_provider_is_isolated() {
	init_tracing();
	let a = Counting::new("a", vec![definition("a.one", "one.kts"), definition("a.two", "two.kts")]);
	let registry = DefinitionRegistry::new(Arc::new(ProviderList::from(vec![
		a as Arc<dyn DefinitionProvider>,
		Arc::new(Failing(ProviderId::new("b"))),
	])));

	registry.refresh_all();

	assert!(registry.definitions_for(&ProviderId::new("b")).unwrap().is_empty());
	let from_a = registry.definitions_for(&ProviderId::new("a")).unwrap();
	assert_eq!(from_a.len(), 2);
	assert!(registry.has_failed_providers());
	assert!(registry.is_recognized("x.two.kts"));
}

#[test]
fn first_match_wins() {
	let a_def = definition("a.kts", "kts");
	let b_def = definition("b.kts", "kts");
	let registry = DefinitionRegistry::new(Arc::new(ProviderList::from(vec![
		Counting::new("a", vec![a_def.clone()]) as Arc<dyn DefinitionProvider>,
		Counting::new("b", vec![b_def]),
	])));

	let resolved = registry.resolve("foo.kts").unwrap();
	assert!(Arc::ptr_eq(&resolved, &a_def));
}

#[test]
fn unknown_provider_before_and_after_load() {
	let a = Counting::new("a", vec![definition("a.kts", "kts")]);
	let registry = DefinitionRegistry::new(Arc::new(ProviderList::from(vec![
		a.clone() as Arc<dyn DefinitionProvider>,
	])));
	let ghost = ProviderId::new("ghost");

	assert_eq!(registry.refresh_one(&ghost), Ok(()));
	assert!(!registry.is_loaded());
	assert_eq!(a.calls(), 0);

	registry.refresh_all();
	assert_eq!(registry.refresh_one(&ghost), Err(RegistryError::UnknownProvider(ghost.clone())));
	assert!(matches!(
		registry.definitions_for(&ghost),
		Err(RegistryError::UnknownProvider(id)) if id == ghost
	));
}

#[test]
fn repeated_refresh_is_stable() {
	let registry = DefinitionRegistry::new(Arc::new(ProviderList::from(vec![
		Counting::new("a", vec![definition("a.x", "x.kts"), definition("a.y", "y.kts")]) as Arc<dyn DefinitionProvider>,
		Counting::new("b", vec![definition("b.z", "kts")]),
	])));

	registry.refresh_all();
	let first = registry.definitions();
	registry.refresh_all();
	let second = registry.definitions();

	assert_eq!(first.len(), second.len());
	assert!(first.iter().zip(second.iter()).all(|(a, b)| Arc::ptr_eq(a, b)));
}

#[test]
fn providers_registered_later_join_on_refresh_all() {
	let list = Arc::new(ProviderList::new());
	list.register(Counting::new("a", vec![definition("a.kts", "kts")]));
	let registry = DefinitionRegistry::new(list.clone());

	assert!(!registry.is_recognized("x.gradle"));
	list.register(Counting::new("late", vec![definition("late.gradle", "gradle")]));
	assert!(!registry.is_recognized("x.gradle"));

	registry.refresh_all();
	assert!(registry.is_recognized("x.gradle"));
	assert_eq!(registry.provider_ids(), [ProviderId::new("a"), ProviderId::new("late")]);
}
