//! Coordinate-system bindings: named references from a prim to the prim
//! whose transform defines the coordinate system.

use crate::ds::{ContainerRef, DataSource, Locator, RetainedContainer, RetainedSampled};
use crate::path::PrimPath;
use crate::tf::{self, declare_tokens};
use crate::vt;
use std::sync::LazyLock;

declare_tokens!(Tokens, TOKENS, [
	coord_sys_binding: "coordSysBinding",
	coord_sys: "coordSys",
	name: "name",
]);

static DEFAULT_LOCATOR: LazyLock<Locator> =
	LazyLock::new(|| Locator::from_token(TOKENS.coord_sys_binding.clone()));

const SYNTHESIZED_PREFIX: &str = "__coordSys:";

/// View over a prim's `coordSysBinding` container: binding name -> target
/// prim path.
pub struct CoordSysBindingSchema {
	container: ContainerRef,
}

impl CoordSysBindingSchema {
	pub fn new(container: ContainerRef) -> Self {
		Self { container }
	}

	pub fn from_prim(prim_container: &ContainerRef) -> Option<Self> {
		let container = prim_container.get(&TOKENS.coord_sys_binding)?.container()?;
		Some(Self { container })
	}

	pub fn binding_names(&self) -> Vec<tf::Token> {
		self.container.names()
	}

	pub fn binding_target(&self, name: &tf::Token) -> Option<PrimPath> {
		self.container.get(name)?.typed_value::<PrimPath>(0.0)
	}

	/// `coordSysBinding`
	pub fn default_locator() -> &'static Locator {
		&DEFAULT_LOCATOR
	}

	pub fn build(bindings: &[(tf::Token, PrimPath)]) -> ContainerRef {
		let mut builder = RetainedContainer::builder();
		for (name, target) in bindings {
			builder = builder.set(
				name.clone(),
				DataSource::Sampled(RetainedSampled::new(vt::Value::new(target.clone()))),
			);
		}
		builder.build()
	}
}

/// Child name of the synthesized coordinate-system prim for `binding_name`.
pub fn synthesized_child_name(binding_name: &tf::Token) -> tf::Token {
	tf::Token::new(format!("{SYNTHESIZED_PREFIX}{binding_name}"))
}

/// Inverse of [`synthesized_child_name`].
pub fn binding_name_of_synthesized(child_name: &tf::Token) -> Option<tf::Token> {
	child_name
		.as_str()
		.strip_prefix(SYNTHESIZED_PREFIX)
		.map(tf::Token::new)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn synthesized_names_round_trip() {
		let name = tf::Token::new("worldSpace");
		let child = synthesized_child_name(&name);
		assert_eq!(child.as_str(), "__coordSys:worldSpace");
		assert_eq!(binding_name_of_synthesized(&child), Some(name));
		assert_eq!(binding_name_of_synthesized(&tf::Token::new("plain")), None);
	}
}
