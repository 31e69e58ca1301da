//! Primvar flattening: constant-interpolation primvars inherit down
//! namespace, with a per-prim concurrent cache and narrow invalidation.

use crate::ds::{ContainerDataSource, ContainerRef, DataSource, LocatorSet, RetainedSampled};
use crate::schema::primvars::{PrimvarsSchema, TOKENS};
use crate::tf;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

/// A prim's effective primvars: its own primvars plus the constant-
/// interpolation primvars visible on the parent's already-flattened set.
///
/// A primvar authored directly on the prim always shadows a same-named
/// inherited primvar. Only `constant` interpolation propagates down; any
/// other interpolation stops inheritance for that name.
pub struct FlattenedPrimvarsDataSource {
	/// This prim's own unflattened primvars container. Replaceable so the
	/// owning scene index can refresh it on a dirty notice without breaking
	/// the provider chains descendants hold.
	primvars: RwLock<Option<ContainerRef>>,
	/// The parent prim's flattened primvars. Shared, upward-only reference;
	/// the owning scene index governs its lifetime.
	parent: Option<Arc<FlattenedPrimvarsDataSource>>,
	/// name -> resolved primvar, with the shared bool-false leaf standing in
	/// for "resolved to absent". A missing key means "not yet computed".
	name_cache: DashMap<tf::Token, DataSource>,
	/// Names of constant-interpolation primvars visible at this prim,
	/// published as an immutable snapshot.
	constant_names: RwLock<Option<Arc<HashSet<tf::Token>>>>,
}

/// True for the cached marker meaning "this name resolves to absent here".
pub fn is_absent_sentinel(data_source: &DataSource) -> bool {
	match data_source {
		DataSource::Sampled(sampled) => Arc::ptr_eq(sampled, &RetainedSampled::bool_false()),
		DataSource::Container(_) => false,
	}
}

impl FlattenedPrimvarsDataSource {
	pub fn new(
		primvars: Option<ContainerRef>,
		parent: Option<Arc<FlattenedPrimvarsDataSource>>,
	) -> Arc<Self> {
		Arc::new(Self {
			primvars: RwLock::new(primvars),
			parent,
			name_cache: DashMap::new(),
			constant_names: RwLock::new(None),
		})
	}

	/// Swaps in the prim's current unflattened primvars container. Callers
	/// pair this with [`Self::invalidate`] for the locators that changed.
	pub fn update_input(&self, primvars: Option<ContainerRef>) {
		*self.primvars.write() = primvars;
	}

	fn own_primvars(&self) -> Option<ContainerRef> {
		self.primvars.read().clone()
	}

	fn own_names(&self) -> Vec<tf::Token> {
		self.own_primvars()
			.map(|primvars| primvars.names())
			.unwrap_or_default()
	}

	/// The constant-primvar names visible at this prim: its own constant
	/// primvars plus the parent's, minus every name this prim authors.
	///
	/// Concurrent callers may compute redundantly; whichever snapshot is
	/// published first wins and no caller observes a partial set.
	fn constant_primvar_names(&self) -> Arc<HashSet<tf::Token>> {
		if let Some(names) = self.constant_names.read().as_ref() {
			return names.clone();
		}

		let computed = Arc::new(self.compute_constant_primvar_names());

		let mut slot = self.constant_names.write();
		slot.get_or_insert(computed).clone()
	}

	fn compute_constant_primvar_names(&self) -> HashSet<tf::Token> {
		let mut names = HashSet::new();

		let own_names = self.own_names();
		if let Some(primvars) = self.own_primvars() {
			let schema = PrimvarsSchema::new(primvars);
			for name in &own_names {
				if schema.primvar(name).is_some_and(|primvar| primvar.is_constant()) {
					names.insert(name.clone());
				}
			}
		}

		if let Some(parent) = &self.parent {
			for name in parent.constant_primvar_names().iter() {
				if !own_names.contains(name) {
					names.insert(name.clone());
				}
			}
		}

		names
	}

	fn resolve(&self, name: &tf::Token) -> DataSource {
		if let Some(primvars) = self.own_primvars()
			&& let Some(own) = primvars.get(name)
		{
			return own;
		}

		if let Some(parent) = &self.parent
			&& parent.constant_primvar_names().contains(name)
			&& let Some(inherited) = parent.get(name)
			&& !is_absent_sentinel(&inherited)
		{
			return inherited;
		}

		DataSource::Sampled(RetainedSampled::bool_false())
	}

	/// Translates locators dirtied on a prim's primvars into the locators
	/// that must be considered dirty on its descendants.
	///
	/// Locators scoped to a single primvar's non-interpolation fields pass
	/// through unchanged. A locator that reaches `interpolation`, or is
	/// shallow enough to encompass it, changes which primvars descendants
	/// inherit, so the result collapses to the whole `primvars` locator.
	pub fn compute_dirty_primvars_locators(dirty_locators: &LocatorSet) -> LocatorSet {
		let primvars_locator = PrimvarsSchema::default_locator();
		let mut result = LocatorSet::new();
		for locator in dirty_locators {
			if !locator.intersects(primvars_locator) {
				continue;
			}
			if locator.element_count() <= 2
				|| locator.element(2) == Some(&TOKENS.interpolation)
			{
				return LocatorSet::from([primvars_locator.clone()]);
			}
			result.insert(locator.clone());
		}
		result
	}

	/// Drops cached state covered by `locators`.
	///
	/// Returns `true` if the instance remains usable. A `false` return means
	/// an interpolation-affecting (or broader) locator cleared everything;
	/// the caller must discard this instance and build a fresh one, as
	/// [`Self::compute_dirty_primvars_locators`] already reported the whole
	/// primvars subtree dirty in that case.
	#[must_use]
	pub fn invalidate(&self, locators: &LocatorSet) -> bool {
		let primvars_locator = PrimvarsSchema::default_locator();
		for locator in locators {
			if !locator.intersects(primvars_locator) {
				continue;
			}
			if locator.element_count() <= 2
				|| locator.element(2) == Some(&TOKENS.interpolation)
			{
				self.name_cache.clear();
				*self.constant_names.write() = None;
				return false;
			}
			if let Some(name) = locator.element(1) {
				self.name_cache.remove(name);
			}
		}
		true
	}
}

impl ContainerDataSource for FlattenedPrimvarsDataSource {
	fn names(&self) -> Vec<tf::Token> {
		let mut names = self.own_names();
		if let Some(parent) = &self.parent {
			for name in parent.constant_primvar_names().iter() {
				if !names.contains(name) {
					names.push(name.clone());
				}
			}
		}
		names
	}

	/// Resolves `name`, caching the result. Absence is reported as the
	/// identity-stable false sentinel rather than `None`, so repeated misses
	/// return the same object until invalidated.
	fn get(&self, name: &tf::Token) -> Option<DataSource> {
		if let Some(cached) = self.name_cache.get(name) {
			return Some(cached.value().clone());
		}

		let resolved = self.resolve(name);
		// Losing racers adopt the first published value.
		let published = self
			.name_cache
			.entry(name.clone())
			.or_insert(resolved)
			.value()
			.clone();
		Some(published)
	}

	fn has(&self, name: &tf::Token) -> bool {
		self.get(name).is_some_and(|ds| !is_absent_sentinel(&ds))
	}
}
