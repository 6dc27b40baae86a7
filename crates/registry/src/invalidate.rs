//! Dependent cache invalidation.

/// Cache keyed by script definitions, dropped whenever the aggregate set
/// changes.
///
/// Called with the registry's write lock held: implementations must not call
/// back into the registry's write path.
pub trait DependentCache: Send + Sync {
	fn invalidate(&self);
}

impl<F> DependentCache for F
where
	F: Fn() + Send + Sync,
{
	fn invalidate(&self) {
		self()
	}
}

/// No dependents to notify.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDependents;

impl DependentCache for NoDependents {
	fn invalidate(&self) {}
}
