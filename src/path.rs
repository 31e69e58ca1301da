//! Prim paths addressing the scene namespace hierarchy.

use crate::tf;
use std::str::FromStr;
use std::sync::Arc;

/// A path value used to locate prims in a scene index.
///
/// Paths are cheap to clone and order element-wise, so all paths sharing a
/// prefix occupy a contiguous range in an ordered map. The absolute root
/// (`/`) is the zero-element path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PrimPath {
	tokens: Arc<[tf::Token]>,
}

impl PrimPath {
	/// The absolute path representing the top of the namespace hierarchy.
	pub fn absolute_root() -> Self {
		Self { tokens: Arc::from([]) }
	}

	pub fn new(tokens: impl Into<Vec<tf::Token>>) -> Self {
		Self {
			tokens: Arc::from(tokens.into()),
		}
	}

	pub fn is_absolute_root(&self) -> bool {
		self.tokens.is_empty()
	}

	pub fn element_count(&self) -> usize {
		self.tokens.len()
	}

	pub fn elements(&self) -> &[tf::Token] {
		&self.tokens
	}

	/// Returns the name of the prim identified by the path, or the empty
	/// token for the absolute root.
	pub fn name_token(&self) -> tf::Token {
		self.tokens.last().cloned().unwrap_or_default()
	}

	/// Creates a path by appending an element for `child_name` to this path.
	pub fn append_child(&self, child_name: &tf::Token) -> Self {
		let mut tokens = Vec::with_capacity(self.tokens.len() + 1);
		tokens.extend_from_slice(&self.tokens);
		tokens.push(child_name.clone());
		Self {
			tokens: Arc::from(tokens),
		}
	}

	/// Returns the path that identifies this path's namespace parent, or
	/// `None` for the absolute root.
	pub fn parent_path(&self) -> Option<Self> {
		if self.tokens.is_empty() {
			return None;
		}
		Some(Self {
			tokens: Arc::from(&self.tokens[..self.tokens.len() - 1]),
		})
	}

	/// Returns true if `prefix` names this path or one of its ancestors.
	pub fn has_prefix(&self, prefix: &PrimPath) -> bool {
		self.tokens.len() >= prefix.tokens.len()
			&& self.tokens[..prefix.tokens.len()] == prefix.tokens[..]
	}

	/// Return a range for iterating over the ancestors of this path.
	///
	/// The range provides iteration over the prefixes of a path, ordered from
	/// longest to shortest, starting with the path itself and ending with a
	/// single element path, not including the absolute root.
	pub fn ancestors_range(&self) -> PathAncestorsRange {
		PathAncestorsRange { path: self.clone() }
	}
}

impl Default for PrimPath {
	fn default() -> Self {
		Self::absolute_root()
	}
}

impl std::fmt::Display for PrimPath {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		if self.tokens.is_empty() {
			return write!(f, "/");
		}
		for token in self.tokens.iter() {
			write!(f, "/{token}")?;
		}
		Ok(())
	}
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PathParseError {
	#[error("prim path must start with '/': {0:?}")]
	NotAbsolute(String),
	#[error("prim path contains an empty element: {0:?}")]
	EmptyElement(String),
}

impl FromStr for PrimPath {
	type Err = PathParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let Some(rest) = s.strip_prefix('/') else {
			return Err(PathParseError::NotAbsolute(s.to_string()));
		};
		if rest.is_empty() {
			return Ok(Self::absolute_root());
		}
		let mut tokens = Vec::new();
		for element in rest.split('/') {
			if element.is_empty() {
				return Err(PathParseError::EmptyElement(s.to_string()));
			}
			tokens.push(tf::Token::new(element));
		}
		Ok(Self {
			tokens: Arc::from(tokens),
		})
	}
}

impl From<&str> for PrimPath {
	fn from(s: &str) -> Self {
		s.parse().unwrap_or_else(|err| {
			tracing::warn!("{err}");
			Self::absolute_root()
		})
	}
}

pub struct PathAncestorsRange {
	path: PrimPath,
}

impl Iterator for PathAncestorsRange {
	type Item = PrimPath;

	fn next(&mut self) -> Option<Self::Item> {
		if self.path.is_absolute_root() {
			return None;
		}
		let current = self.path.clone();
		self.path = current.parent_path().unwrap_or_default();
		Some(current)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn p(s: &str) -> PrimPath {
		PrimPath::from(s)
	}

	fn t(s: &str) -> tf::Token {
		tf::Token::new(s)
	}

	#[test]
	fn append_child() {
		assert_eq!(p("/foo").append_child(&t("bar")), p("/foo/bar"));
		assert_eq!(PrimPath::absolute_root().append_child(&t("foo")), p("/foo"));
	}

	#[test]
	fn parent_path() {
		assert_eq!(p("/foo").parent_path(), Some(PrimPath::absolute_root()));
		assert_eq!(p("/foo/bar").parent_path(), Some(p("/foo")));
		assert_eq!(PrimPath::absolute_root().parent_path(), None);
	}

	#[test]
	fn prefixes() {
		assert!(p("/foo/bar").has_prefix(&p("/foo")));
		assert!(p("/foo/bar").has_prefix(&p("/foo/bar")));
		assert!(p("/foo/bar").has_prefix(&PrimPath::absolute_root()));
		assert!(!p("/foo/bar").has_prefix(&p("/foo/baz")));
		assert!(!p("/foobar").has_prefix(&p("/foo")));
	}

	#[test]
	fn ancestors_range() {
		let path = p("/foo/bar/baz");
		let mut ancestors = path.ancestors_range();
		assert_eq!(ancestors.next(), Some(p("/foo/bar/baz")));
		assert_eq!(ancestors.next(), Some(p("/foo/bar")));
		assert_eq!(ancestors.next(), Some(p("/foo")));
		assert_eq!(ancestors.next(), None);
	}

	#[test]
	fn ordering_keeps_subtrees_contiguous() {
		// "/A/B" sorts before "/AB" because comparison is per-element.
		let mut paths = vec![p("/AB"), p("/A/B"), p("/A"), p("/A/B/C")];
		paths.sort();
		assert_eq!(paths, vec![p("/A"), p("/A/B"), p("/A/B/C"), p("/AB")]);
	}

	#[test]
	fn parse_and_print() {
		assert_eq!(p("/foo/bar").to_string(), "/foo/bar");
		assert_eq!(PrimPath::absolute_root().to_string(), "/");
		assert_eq!("/".parse::<PrimPath>(), Ok(PrimPath::absolute_root()));
		assert!("foo".parse::<PrimPath>().is_err());
		assert!("/foo//bar".parse::<PrimPath>().is_err());
	}
}
