//! Locators address fields inside a nested data-source tree, and locator
//! sets describe what changed or what is requested.

use crate::tf;
use std::sync::Arc;

/// An ordered sequence of name tokens identifying a path into a data-source
/// tree, e.g. `primvars/points/primvarValue`.
///
/// Locators are value types: every modifying operation returns a new locator
/// and never mutates the receiver.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Locator {
	tokens: Arc<[tf::Token]>,
}

impl Locator {
	/// The empty locator, addressing a whole data source.
	pub fn empty() -> Self {
		Self { tokens: Arc::from([]) }
	}

	pub fn new(tokens: impl Into<Vec<tf::Token>>) -> Self {
		Self {
			tokens: Arc::from(tokens.into()),
		}
	}

	pub fn from_token(token: tf::Token) -> Self {
		Self {
			tokens: Arc::from([token]),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}

	pub fn element_count(&self) -> usize {
		self.tokens.len()
	}

	pub fn element(&self, i: usize) -> Option<&tf::Token> {
		self.tokens.get(i)
	}

	pub fn elements(&self) -> &[tf::Token] {
		&self.tokens
	}

	pub fn last_element(&self) -> Option<&tf::Token> {
		self.tokens.last()
	}

	/// Returns a new locator one token longer.
	pub fn append(&self, token: tf::Token) -> Self {
		let mut tokens = Vec::with_capacity(self.tokens.len() + 1);
		tokens.extend_from_slice(&self.tokens);
		tokens.push(token);
		Self {
			tokens: Arc::from(tokens),
		}
	}

	pub fn append_locator(&self, other: &Locator) -> Self {
		let mut tokens = Vec::with_capacity(self.tokens.len() + other.tokens.len());
		tokens.extend_from_slice(&self.tokens);
		tokens.extend_from_slice(&other.tokens);
		Self {
			tokens: Arc::from(tokens),
		}
	}

	pub fn remove_last_element(&self) -> Self {
		Self {
			tokens: Arc::from(&self.tokens[..self.tokens.len().saturating_sub(1)]),
		}
	}

	pub fn replace_last_element(&self, token: tf::Token) -> Self {
		self.remove_last_element().append(token)
	}

	/// Returns true if `prefix` names this locator or a shallower locator on
	/// the way to it. Every locator has the empty locator as prefix.
	pub fn has_prefix(&self, prefix: &Locator) -> bool {
		self.tokens.len() >= prefix.tokens.len()
			&& self.tokens[..prefix.tokens.len()] == prefix.tokens[..]
	}

	/// Returns this locator with `old_prefix` swapped for `new_prefix`, or
	/// the locator unchanged when `old_prefix` is not a prefix.
	pub fn replace_prefix(&self, old_prefix: &Locator, new_prefix: &Locator) -> Self {
		if !self.has_prefix(old_prefix) {
			return self.clone();
		}
		let mut tokens = Vec::new();
		tokens.extend_from_slice(&new_prefix.tokens);
		tokens.extend_from_slice(&self.tokens[old_prefix.tokens.len()..]);
		Self {
			tokens: Arc::from(tokens),
		}
	}

	pub fn common_prefix(&self, other: &Locator) -> Self {
		let shared = self
			.tokens
			.iter()
			.zip(other.tokens.iter())
			.take_while(|(a, b)| a == b)
			.count();
		Self {
			tokens: Arc::from(&self.tokens[..shared]),
		}
	}

	/// Two locators intersect when one is a prefix of the other.
	pub fn intersects(&self, other: &Locator) -> bool {
		self.has_prefix(other) || other.has_prefix(self)
	}
}

impl Default for Locator {
	fn default() -> Self {
		Self::empty()
	}
}

impl std::fmt::Display for Locator {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		let mut separator = false;
		for token in self.tokens.iter() {
			if separator {
				write!(f, "/")?;
			}
			separator = true;
			write!(f, "{token}")?;
		}
		Ok(())
	}
}

impl From<&str> for Locator {
	fn from(s: &str) -> Self {
		let tokens: Vec<tf::Token> = s
			.split('/')
			.filter(|element| !element.is_empty())
			.map(tf::Token::new)
			.collect();
		Self::new(tokens)
	}
}

/// A minimal set of locators: a locator already covered by a shorter member
/// is redundant and never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocatorSet {
	// Sorted lexicographically; no member is a prefix of another.
	locators: Vec<Locator>,
}

// Sets smaller than this are scanned linearly; larger ones use binary
// search over the sorted representation.
const BINARY_SEARCH_CUTOFF: usize = 8;

impl LocatorSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// The set intersecting everything: holds just the empty locator.
	pub fn universal() -> Self {
		Self {
			locators: vec![Locator::empty()],
		}
	}

	pub fn is_empty(&self) -> bool {
		self.locators.is_empty()
	}

	pub fn len(&self) -> usize {
		self.locators.len()
	}

	pub fn iter(&self) -> std::slice::Iter<'_, Locator> {
		self.locators.iter()
	}

	/// True exactly when the set denotes "everything is dirty".
	pub fn contains_empty(&self) -> bool {
		self.locators.first().is_some_and(Locator::is_empty)
	}

	pub fn insert(&mut self, locator: Locator) {
		match self.locators.binary_search(&locator) {
			Ok(_) => {}
			Err(index) => {
				// A shorter member ending just before the insertion point may
				// already cover the new locator.
				if index > 0 && locator.has_prefix(&self.locators[index - 1]) {
					return;
				}
				// Members covered by the new locator follow it contiguously.
				let mut end = index;
				while end < self.locators.len() && self.locators[end].has_prefix(&locator) {
					end += 1;
				}
				self.locators.splice(index..end, [locator]);
			}
		}
	}

	pub fn insert_set(&mut self, other: &LocatorSet) {
		for locator in other.iter() {
			self.insert(locator.clone());
		}
	}

	pub fn intersects(&self, locator: &Locator) -> bool {
		if self.locators.len() < BINARY_SEARCH_CUTOFF {
			return self.locators.iter().any(|member| member.intersects(locator));
		}

		// Members that have `locator` as prefix sit right at its sort
		// position; members that are prefixes of `locator` are found by
		// probing each proper prefix.
		let index = self.locators.partition_point(|member| member < locator);
		if self
			.locators
			.get(index)
			.is_some_and(|member| member.has_prefix(locator))
		{
			return true;
		}
		for count in (0..=locator.element_count()).rev() {
			let prefix = Locator::new(locator.elements()[..count].to_vec());
			if self.locators.binary_search(&prefix).is_ok() {
				return true;
			}
		}
		false
	}

	pub fn intersects_set(&self, other: &LocatorSet) -> bool {
		let (small, large) = if self.len() <= other.len() {
			(self, other)
		} else {
			(other, self)
		};
		small.iter().any(|locator| large.intersects(locator))
	}

	/// The deepest locators covered by both sets.
	pub fn intersection(&self, other: &LocatorSet) -> LocatorSet {
		let mut result = LocatorSet::new();
		for a in self.iter() {
			for b in other.iter() {
				if a.has_prefix(b) {
					result.insert(a.clone());
				} else if b.has_prefix(a) {
					result.insert(b.clone());
				}
			}
		}
		result
	}
}

impl FromIterator<Locator> for LocatorSet {
	fn from_iter<I: IntoIterator<Item = Locator>>(iter: I) -> Self {
		let mut set = LocatorSet::new();
		for locator in iter {
			set.insert(locator);
		}
		set
	}
}

impl<const N: usize> From<[Locator; N]> for LocatorSet {
	fn from(locators: [Locator; N]) -> Self {
		locators.into_iter().collect()
	}
}

impl<'a> IntoIterator for &'a LocatorSet {
	type Item = &'a Locator;
	type IntoIter = std::slice::Iter<'a, Locator>;

	fn into_iter(self) -> Self::IntoIter {
		self.locators.iter()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn l(s: &str) -> Locator {
		Locator::from(s)
	}

	#[test]
	fn parse_and_print() {
		assert_eq!(l("a/b/c").to_string(), "a/b/c");
		assert_eq!(l("/a/b").to_string(), "a/b");
		assert_eq!(Locator::empty().to_string(), "");
	}

	#[test]
	fn accessors() {
		let locator = l("a/b/c");
		assert_eq!(locator.element_count(), 3);
		assert_eq!(locator.element(1), Some(&tf::Token::new("b")));
		assert_eq!(locator.last_element(), Some(&tf::Token::new("c")));
		assert_eq!(locator.remove_last_element(), l("a/b"));
		assert_eq!(locator.replace_last_element(tf::Token::new("z")), l("a/b/z"));
	}

	#[test]
	fn prefixes() {
		let locator = l("a/b/c");
		assert!(locator.has_prefix(&Locator::empty()));
		assert!(locator.has_prefix(&l("a")));
		assert!(locator.has_prefix(&l("a/b/c")));
		assert!(!locator.has_prefix(&l("a/e")));
		assert_eq!(locator.common_prefix(&l("a/e")), l("a"));
		assert_eq!(locator.common_prefix(&l("e/f")), Locator::empty());
	}

	#[test]
	fn appends_and_replaces() {
		let locator = l("a/b/c");
		assert_eq!(locator.append(tf::Token::new("z")), l("a/b/c/z"));
		assert_eq!(locator.append_locator(&locator), l("a/b/c/a/b/c"));
		assert_eq!(locator.replace_prefix(&l("a"), &l("X/Y")), l("X/Y/b/c"));
		assert_eq!(locator.replace_prefix(&l("a/b"), &Locator::empty()), l("c"));
		assert_eq!(locator.replace_prefix(&l("X/Y"), &Locator::empty()), l("a/b/c"));
	}

	#[test]
	fn intersects() {
		assert!(l("a").intersects(&Locator::empty()));
		assert!(l("a").intersects(&l("a")));
		assert!(l("a/b/c").intersects(&l("a")));
		assert!(!l("a/b/c").intersects(&l("d/e")));
		assert!(!l("a/b/c").intersects(&l("a/b/d")));
	}

	#[test]
	fn set_insert_keeps_minimal_form() {
		let set: LocatorSet = [l("a/b"), l("c/d"), l("a/b/c"), l("f"), l("a/b/d")].into();
		let baseline: LocatorSet = [l("a/b"), l("c/d"), l("f")].into();
		assert_eq!(set, baseline);

		// A shorter member evicts everything it covers.
		let mut set: LocatorSet = [l("a/b"), l("a/c"), l("b")].into();
		set.insert(l("a"));
		assert_eq!(set, LocatorSet::from([l("a"), l("b")]));
	}

	#[test]
	fn set_collapses_on_empty_locator() {
		let mut set: LocatorSet = [l("a/b"), l("q/e/d")].into();
		set.insert(Locator::empty());
		assert_eq!(set, LocatorSet::universal());
		assert!(set.contains_empty());
	}

	#[test]
	fn set_intersects_small() {
		let set: LocatorSet = [l("a/b"), l("c/d"), l("a/b/c"), l("f"), l("a/b/d")].into();
		assert!(set.intersects(&l("a")));
		assert!(set.intersects(&l("a/b/e")));
		assert!(!set.intersects(&l("a/c")));
		assert!(set.intersects(&l("f")));
		assert!(!set.intersects(&l("x/y/z")));
		assert!(set.intersects(&Locator::empty()));
	}

	#[test]
	fn set_intersects_large() {
		// Exercises the binary-search code path.
		let set: LocatorSet = [
			l("a/b"),
			l("c/d"),
			l("f"),
			l("g/a"),
			l("g/b"),
			l("g/c"),
			l("g/d"),
			l("g/e"),
			l("g/f"),
			l("g/g"),
		]
		.into();
		assert!(set.intersects(&l("a")));
		assert!(set.intersects(&l("a/b/e")));
		assert!(!set.intersects(&l("a/c")));
		assert!(set.intersects(&l("f")));
		assert!(!set.intersects(&l("x/y/z")));
		assert!(set.intersects(&Locator::empty()));
	}

	#[test]
	fn set_intersection() {
		let a: LocatorSet = [l("a"), l("b/c")].into();
		let b: LocatorSet = [l("a/x"), l("b")].into();
		let result = a.intersection(&b);
		assert_eq!(result, LocatorSet::from([l("a/x"), l("b/c")]));

		let unrelated: LocatorSet = [l("q")].into();
		assert!(a.intersection(&unrelated).is_empty());
	}
}
