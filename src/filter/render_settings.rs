//! Filters render-settings prims: trims namespaced settings to configured
//! prefixes and optionally injects a fallback settings prim.

use super::{FilteringBase, FilteringSceneIndex};
use crate::ds::{ContainerDataSource, ContainerRef, DataSource, RetainedContainer};
use crate::path::PrimPath;
use crate::scene::observer::SceneIndexObserver;
use crate::scene::{Prim, SceneIndex, SceneIndexRef};
use crate::schema::render_settings::{RenderSettingsSchema, TOKENS};
use crate::tf;
use std::sync::{Arc, LazyLock};

/// Fixed path of the injected fallback prim.
pub static FALLBACK_PRIM_PATH: LazyLock<PrimPath> =
	LazyLock::new(|| PrimPath::from("/__fallbackRenderSettings"));

pub struct RenderSettingsFilteringSceneIndex {
	base: FilteringBase,
	/// Setting-name prefixes to keep; empty keeps everything.
	namespace_prefixes: Vec<tf::Token>,
	add_fallback_prim: bool,
}

impl RenderSettingsFilteringSceneIndex {
	pub fn new(
		input: SceneIndexRef,
		namespace_prefixes: Vec<tf::Token>,
		add_fallback_prim: bool,
	) -> Arc<Self> {
		let index = Arc::new(Self {
			base: FilteringBase::new(input),
			namespace_prefixes,
			add_fallback_prim,
		});
		FilteringBase::observe_input(&index);
		index
	}

	fn fallback_prim(&self) -> Prim {
		Prim::new(
			TOKENS.render_settings.clone(),
			Some(RenderSettingsSchema::build(RetainedContainer::empty(), false)),
		)
	}
}

impl SceneIndex for RenderSettingsFilteringSceneIndex {
	fn prim(&self, path: &PrimPath) -> Prim {
		if self.add_fallback_prim && path == &*FALLBACK_PRIM_PATH {
			return self.fallback_prim();
		}

		let mut prim = self.base.input().prim(path);
		if prim.prim_type == TOKENS.render_settings
			&& !self.namespace_prefixes.is_empty()
			&& let Some(data_source) = &prim.data_source
		{
			prim.data_source = Some(Arc::new(FilteredSettingsPrimDataSource {
				input: data_source.clone(),
				namespace_prefixes: self.namespace_prefixes.clone(),
			}));
		}
		prim
	}

	fn child_prim_paths(&self, path: &PrimPath) -> Vec<PrimPath> {
		let mut children = self.base.input().child_prim_paths(path);
		if self.add_fallback_prim && path.is_absolute_root() {
			children.push(FALLBACK_PRIM_PATH.clone());
		}
		children
	}

	fn add_observer(&self, observer: &Arc<dyn SceneIndexObserver>) {
		self.base.observers().add(observer);
	}

	fn remove_observer(&self, observer: &Arc<dyn SceneIndexObserver>) {
		self.base.observers().remove(observer);
	}
}

impl FilteringSceneIndex for RenderSettingsFilteringSceneIndex {
	fn base(&self) -> &FilteringBase {
		&self.base
	}
}

struct FilteredSettingsPrimDataSource {
	input: ContainerRef,
	namespace_prefixes: Vec<tf::Token>,
}

impl ContainerDataSource for FilteredSettingsPrimDataSource {
	fn names(&self) -> Vec<tf::Token> {
		self.input.names()
	}

	fn get(&self, name: &tf::Token) -> Option<DataSource> {
		let child = self.input.get(name)?;
		if name != &TOKENS.render_settings {
			return Some(child);
		}
		let settings = child.container()?;
		Some(DataSource::Container(Arc::new(FilteredSettingsDataSource {
			settings,
			namespace_prefixes: self.namespace_prefixes.clone(),
		})))
	}
}

struct FilteredSettingsDataSource {
	settings: ContainerRef,
	namespace_prefixes: Vec<tf::Token>,
}

impl FilteredSettingsDataSource {
	fn keeps(&self, name: &tf::Token) -> bool {
		self.namespace_prefixes
			.iter()
			.any(|prefix| name.as_str().starts_with(prefix.as_str()))
	}
}

impl ContainerDataSource for FilteredSettingsDataSource {
	fn names(&self) -> Vec<tf::Token> {
		self.settings.names()
	}

	fn get(&self, name: &tf::Token) -> Option<DataSource> {
		let child = self.settings.get(name)?;
		if name != &TOKENS.namespaced_settings {
			return Some(child);
		}
		let namespaced = child.container()?;
		let kept: Vec<(tf::Token, Option<DataSource>)> = namespaced
			.names()
			.into_iter()
			.filter(|setting| self.keeps(setting))
			.map(|setting| {
				let value = namespaced.get(&setting);
				(setting, value)
			})
			.collect();
		Some(DataSource::Container(RetainedContainer::new(kept)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ds::RetainedSampled;
	use crate::scene::retained::{AddedPrim, RetainedSceneIndex};
	use crate::vt;

	fn p(s: &str) -> PrimPath {
		PrimPath::from(s)
	}

	fn t(s: &str) -> tf::Token {
		tf::Token::new(s)
	}

	fn settings_prim() -> Option<ContainerRef> {
		let namespaced = RetainedContainer::builder()
			.set(
				t("ri:integrator"),
				DataSource::Sampled(RetainedSampled::new(vt::Value::new("path".to_string()))),
			)
			.set(
				t("gl:samples"),
				DataSource::Sampled(RetainedSampled::new(vt::Value::new(8i32))),
			)
			.build();
		Some(
			RetainedContainer::builder()
				.set(
					TOKENS.render_settings.clone(),
					DataSource::Container(RenderSettingsSchema::build(namespaced, true)),
				)
				.build(),
		)
	}

	#[test]
	fn settings_outside_namespace_are_dropped() {
		let input = RetainedSceneIndex::new();
		input.add_prims(vec![AddedPrim {
			path: p("/render"),
			prim_type: TOKENS.render_settings.clone(),
			data_source: settings_prim(),
		}]);

		let index =
			RenderSettingsFilteringSceneIndex::new(input, vec![t("ri:")], false);
		let prim = index.prim(&p("/render"));
		let schema = RenderSettingsSchema::from_prim(prim.data_source.as_ref().unwrap()).unwrap();
		let namespaced = schema.namespaced_settings().unwrap();
		assert!(namespaced.has(&t("ri:integrator")));
		assert!(!namespaced.has(&t("gl:samples")));
	}

	#[test]
	fn fallback_prim_is_injected() {
		let input = RetainedSceneIndex::new();
		let index = RenderSettingsFilteringSceneIndex::new(input, Vec::new(), true);
		assert!(
			index
				.child_prim_paths(&PrimPath::absolute_root())
				.contains(&*FALLBACK_PRIM_PATH),
		);
		let prim = index.prim(&FALLBACK_PRIM_PATH);
		assert_eq!(prim.prim_type, TOKENS.render_settings);
		assert!(RenderSettingsSchema::from_prim(prim.data_source.as_ref().unwrap()).is_some());
	}
}
