//! Path resolution over the resource tree.
//!
//! A path is a `/`-separated list of segments, each coerced to a [`Key`] and
//! looked up against the current position. Resolution only reads the tree.
//!
//! Two containers are walked differently:
//!
//! - a resource node is entered through [`Resource::subscript`], which only
//!   ever yields child nodes;
//! - a plain `Map` or `List` value is entered through [`Value::get`], which
//!   may yield a raw leaf.
//!
//! Any failed lookup, whether the key is absent or the current position is
//! not a container at all, is [`DomainError::NotFound`].

use std::sync::Arc;

use tracing::trace;

use crate::error::{DomainError, DomainResult};
use crate::key::Key;
use crate::resource::Resource;
use crate::value::Value;

/// Where a path led: a resource node or a raw value.
#[derive(Clone, Copy, Debug)]
pub enum Target<'a> {
    Node(&'a Arc<dyn Resource>),
    Value(&'a Value),
}

impl<'a> Target<'a> {
    /// Classify a value, promoting embedded nodes to [`Target::Node`].
    pub fn of(value: &'a Value) -> Self {
        match value {
            Value::Node(node) => Self::Node(node),
            other => Self::Value(other),
        }
    }

    /// Look up one key from this position.
    pub fn lookup(self, key: &Key) -> Option<Target<'a>> {
        match self {
            Self::Node(node) => node.subscript(key).map(Self::Node),
            Self::Value(value) => value.get(key).map(Self::of),
        }
    }

    pub fn as_node(self) -> Option<&'a Arc<dyn Resource>> {
        match self {
            Self::Node(node) => Some(node),
            Self::Value(_) => None,
        }
    }

    pub fn as_value(self) -> Option<&'a Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Node(_) => None,
        }
    }

    /// Identity comparison: same node, or the very same value in the tree.
    pub fn same_as(self, other: Target<'_>) -> bool {
        match (self, other) {
            (Self::Node(a), Target::Node(b)) => Arc::ptr_eq(a, b),
            (Self::Value(a), Target::Value(b)) => std::ptr::eq(a, b),
            _ => false,
        }
    }
}

/// Walk `root` along `path`.
///
/// The empty path is the root itself. Every other path is split on each
/// `/`, so a trailing or doubled slash introduces an empty segment, which is
/// looked up as the empty string key and will normally miss.
pub fn resolve<'a>(root: &'a Value, path: &str) -> DomainResult<Target<'a>> {
    let mut current = Target::of(root);
    if path.is_empty() {
        return Ok(current);
    }

    for segment in path.split('/') {
        let key = Key::from_segment(segment);
        trace!(segment, key = ?key, "resolving path segment");
        current = current.lookup(&key).ok_or(DomainError::NotFound)?;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::resource::BasicResource;

    fn user(name: &str) -> Value {
        Value::node(BasicResource::new(Value::map([("name", name)])))
    }

    fn tree() -> Value {
        let users = Value::node(BasicResource::new(Value::map([
            (Key::from(1), user("User 1")),
            (Key::from(2), user("User 2")),
            (Key::from("count"), Value::from(2)),
        ])));
        Value::node(BasicResource::new(Value::map([("users", users)])))
    }

    fn name_of(target: Target<'_>) -> Option<Value> {
        target.as_node()?.payload().get(&Key::from("name")).cloned()
    }

    #[test]
    fn empty_path_is_root() {
        let root = tree();
        let target = resolve(&root, "").unwrap();
        assert!(target.same_as(Target::of(&root)));
    }

    #[test]
    fn nested_nodes_resolve() {
        let root = tree();
        let target = resolve(&root, "users/1").unwrap();
        assert_eq!(name_of(target), Some(Value::from("User 1")));
    }

    #[test]
    fn digit_segments_use_integer_keys() {
        let stringly = Value::node(BasicResource::new(Value::map([(
            "2",
            Value::node(BasicResource::new(Value::Null)),
        )])));
        assert_eq!(resolve(&stringly, "2").unwrap_err(), DomainError::NotFound);

        let root = tree();
        assert_eq!(name_of(resolve(&root, "users/2").unwrap()), Some(Value::from("User 2")));
    }

    #[test]
    fn raw_values_are_not_routable_through_nodes() {
        let root = tree();
        assert_eq!(resolve(&root, "users/count").unwrap_err(), DomainError::NotFound);
        assert_eq!(resolve(&root, "users/1/name").unwrap_err(), DomainError::NotFound);
    }

    #[test]
    fn missing_keys_are_not_found() {
        let root = tree();
        assert_eq!(resolve(&root, "users/9").unwrap_err(), DomainError::NotFound);
        assert_eq!(resolve(&root, "nope").unwrap_err(), DomainError::NotFound);
        assert_eq!(resolve(&root, "users/1/2/3").unwrap_err(), DomainError::NotFound);
    }

    #[test]
    fn trailing_and_double_slashes_miss() {
        let root = tree();
        assert_eq!(resolve(&root, "users/").unwrap_err(), DomainError::NotFound);
        assert_eq!(resolve(&root, "users//1").unwrap_err(), DomainError::NotFound);
        assert_eq!(resolve(&root, "/users").unwrap_err(), DomainError::NotFound);
    }

    #[test]
    fn plain_map_root_exposes_raw_leaves() {
        let root = Value::map([
            ("users", user("x")),
            ("version", Value::from("1.0")),
            ("tags", Value::list(["a", "b"])),
        ]);
        assert!(resolve(&root, "users").unwrap().as_node().is_some());
        assert_eq!(resolve(&root, "version").unwrap().as_value(), Some(&Value::from("1.0")));
        assert_eq!(resolve(&root, "tags/1").unwrap().as_value(), Some(&Value::from("b")));
        assert_eq!(resolve(&root, "version/0").unwrap_err(), DomainError::NotFound);
    }

    #[test]
    fn scalar_root_is_not_a_container() {
        let root = Value::from(5);
        assert!(resolve(&root, "").unwrap().as_value().is_some());
        assert_eq!(resolve(&root, "0").unwrap_err(), DomainError::NotFound);
    }

    proptest! {
        #[test]
        fn resolution_is_repeatable(path in "[a-z0-9/]{0,12}") {
            let root = tree();
            let first = resolve(&root, &path);
            let second = resolve(&root, &path);
            match (first, second) {
                (Ok(a), Ok(b)) => prop_assert!(a.same_as(b)),
                (Err(a), Err(b)) => prop_assert_eq!(a, b),
                _ => prop_assert!(false, "resolution of {:?} changed between calls", path),
            }
        }

        #[test]
        fn only_known_user_ids_resolve(id in 0u32..50) {
            let root = tree();
            let resolved = resolve(&root, &format!("users/{id}"));
            prop_assert_eq!(resolved.is_ok(), id == 1 || id == 2);
        }
    }
}
