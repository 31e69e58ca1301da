//! Resolves purpose-qualified material bindings down to a single
//! all-purpose binding chosen by a static priority list.

use super::{FilteringBase, FilteringSceneIndex};
use crate::ds::{ContainerDataSource, ContainerRef, DataSource};
use crate::path::PrimPath;
use crate::scene::observer::{DirtiedEntry, SceneIndexObserver};
use crate::scene::{Prim, SceneIndex, SceneIndexRef};
use crate::schema::material::{MaterialBindingsSchema, TOKENS};
use crate::tf;
use std::sync::Arc;

pub struct MaterialBindingResolvingSceneIndex {
	base: FilteringBase,
	/// Purposes to consider, strongest first.
	purpose_priority: Vec<tf::Token>,
}

impl MaterialBindingResolvingSceneIndex {
	pub fn new(input: SceneIndexRef, purpose_priority: Vec<tf::Token>) -> Arc<Self> {
		let index = Arc::new(Self {
			base: FilteringBase::new(input),
			purpose_priority,
		});
		FilteringBase::observe_input(&index);
		index
	}
}

impl SceneIndex for MaterialBindingResolvingSceneIndex {
	fn prim(&self, path: &PrimPath) -> Prim {
		let mut prim = self.base.input().prim(path);
		if let Some(data_source) = &prim.data_source
			&& data_source.has(&TOKENS.material_bindings)
		{
			prim.data_source = Some(Arc::new(ResolvingPrimDataSource {
				input: data_source.clone(),
				purpose_priority: self.purpose_priority.clone(),
			}));
		}
		prim
	}

	fn child_prim_paths(&self, path: &PrimPath) -> Vec<PrimPath> {
		self.base.input().child_prim_paths(path)
	}

	fn add_observer(&self, observer: &Arc<dyn SceneIndexObserver>) {
		self.base.observers().add(observer);
	}

	fn remove_observer(&self, observer: &Arc<dyn SceneIndexObserver>) {
		self.base.observers().remove(observer);
	}
}

impl FilteringSceneIndex for MaterialBindingResolvingSceneIndex {
	fn base(&self) -> &FilteringBase {
		&self.base
	}

	fn on_prims_dirtied(&self, entries: &[DirtiedEntry]) {
		// A change to any purpose's binding can change which purpose wins,
		// so dirtying inside materialBindings widens to the whole container.
		let translated: Vec<DirtiedEntry> = entries
			.iter()
			.map(|entry| {
				if entry
					.locators
					.intersects(MaterialBindingsSchema::default_locator())
				{
					let mut locators = entry.locators.clone();
					locators.insert(MaterialBindingsSchema::default_locator().clone());
					DirtiedEntry {
						path: entry.path.clone(),
						locators,
					}
				} else {
					entry.clone()
				}
			})
			.collect();
		self.base.observers().send_dirtied(&translated);
	}
}

struct ResolvingPrimDataSource {
	input: ContainerRef,
	purpose_priority: Vec<tf::Token>,
}

impl ContainerDataSource for ResolvingPrimDataSource {
	fn names(&self) -> Vec<tf::Token> {
		self.input.names()
	}

	fn get(&self, name: &tf::Token) -> Option<DataSource> {
		let child = self.input.get(name)?;
		if name != &TOKENS.material_bindings {
			return Some(child);
		}
		let bindings = child.container()?;
		Some(DataSource::Container(Arc::new(ResolvedBindingsDataSource {
			bindings,
			purpose_priority: self.purpose_priority.clone(),
		})))
	}
}

/// Exposes only the all-purpose binding, resolved by priority.
struct ResolvedBindingsDataSource {
	bindings: ContainerRef,
	purpose_priority: Vec<tf::Token>,
}

impl ResolvedBindingsDataSource {
	fn resolved(&self) -> Option<DataSource> {
		for purpose in &self.purpose_priority {
			if let Some(binding) = self.bindings.get(purpose) {
				return Some(binding);
			}
		}
		None
	}
}

impl ContainerDataSource for ResolvedBindingsDataSource {
	fn names(&self) -> Vec<tf::Token> {
		match self.resolved() {
			Some(_) => vec![TOKENS.all_purpose.clone()],
			None => Vec::new(),
		}
	}

	fn get(&self, name: &tf::Token) -> Option<DataSource> {
		if name != &TOKENS.all_purpose {
			return None;
		}
		self.resolved()
	}
}
