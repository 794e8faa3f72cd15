//! Layered keyed maps with parent-chain lookup.
//!
//! A [`CascadeMap`] is a local insertion-ordered map plus an optional shared
//! handle to a parent map. Lookups check local entries first and then walk
//! the parent chain, so a derived layer shadows its parents on key collision
//! without touching them. This is the mechanism behind both static-info
//! inheritance (a derived component class registers only new entries) and
//! registry-element prototypes (a concrete element overrides a reusable
//! template).
//!
//! Parent handles are `Arc`s and the chain is strictly a tree: a layer can
//! never outlive the layers it shadows.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;

use indexmap::IndexMap;

/// A local map layer chained to an optional parent layer.
#[derive(Debug, Clone, Default)]
pub struct CascadeMap<K, V> {
	local: IndexMap<K, V>,
	parent: Option<Arc<CascadeMap<K, V>>>,
}

impl<K: Hash + Eq, V> CascadeMap<K, V> {
	/// Creates an empty map with no parent.
	pub fn new() -> Self {
		Self {
			local: IndexMap::new(),
			parent: None,
		}
	}

	/// Creates an empty map chained to the given parent layer.
	pub fn with_parent(parent: Arc<CascadeMap<K, V>>) -> Self {
		Self {
			local: IndexMap::new(),
			parent: Some(parent),
		}
	}

	/// Replaces the parent layer.
	pub fn set_parent(&mut self, parent: Option<Arc<CascadeMap<K, V>>>) {
		self.parent = parent;
	}

	/// Returns the parent layer, if any.
	pub fn parent(&self) -> Option<&Arc<CascadeMap<K, V>>> {
		self.parent.as_ref()
	}

	/// Inserts an entry into the local layer.
	///
	/// Returns `false` and leaves the map unchanged if the key already exists
	/// **locally**. Shadowing a parent entry is allowed and intended.
	pub fn insert_local(&mut self, key: K, value: V) -> bool {
		if self.local.contains_key(&key) {
			return false;
		}
		self.local.insert(key, value);
		true
	}

	/// Looks up a key through the full layer chain, local layer first.
	pub fn get<Q>(&self, key: &Q) -> Option<&V>
	where
		K: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
	{
		if let Some(v) = self.local.get(key) {
			return Some(v);
		}
		self.parent.as_ref()?.get(key)
	}

	/// Looks up a key in the local layer only.
	pub fn get_local<Q>(&self, key: &Q) -> Option<&V>
	where
		K: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
	{
		self.local.get(key)
	}

	/// Returns true if the key is visible through the layer chain.
	pub fn contains<Q>(&self, key: &Q) -> bool
	where
		K: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
	{
		self.get(key).is_some()
	}

	/// Iterates over visible entries: local entries in insertion order,
	/// followed by parent entries not shadowed by a nearer layer.
	pub fn iter(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
		match &self.parent {
			None => Box::new(self.local.iter()),
			Some(parent) => Box::new(
				self.local
					.iter()
					.chain(parent.iter().filter(|(k, _)| !self.local.contains_key(*k))),
			),
		}
	}

	/// Iterates over the visible keys.
	pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
		self.iter().map(|(k, _)| k)
	}

	/// Returns the number of distinct visible keys.
	pub fn len(&self) -> usize {
		self.iter().count()
	}

	/// Returns the number of local entries.
	pub fn local_len(&self) -> usize {
		self.local.len()
	}

	/// Returns true if no key is visible through the chain.
	pub fn is_empty(&self) -> bool {
		self.local.is_empty() && self.parent.as_ref().is_none_or(|p| p.is_empty())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn insert_local_rejects_duplicates() {
		let mut map = CascadeMap::new();
		assert!(map.insert_local("a", 1));
		assert!(!map.insert_local("a", 2));

		// The first registration is kept.
		assert_eq!(map.get("a"), Some(&1));
	}

	#[test]
	fn lookup_falls_back_to_parent() {
		let mut base = CascadeMap::new();
		base.insert_local("x", 10);
		base.insert_local("y", 20);
		let base = Arc::new(base);

		let mut derived = CascadeMap::with_parent(base.clone());
		derived.insert_local("x", 11);

		// Local shadows the parent; unshadowed parent entries stay visible.
		assert_eq!(derived.get("x"), Some(&11));
		assert_eq!(derived.get("y"), Some(&20));
		assert_eq!(derived.get_local("y"), None);
		assert_eq!(base.get("x"), Some(&10));
	}

	#[test]
	fn shadowing_the_parent_is_not_a_duplicate() {
		let mut base = CascadeMap::new();
		base.insert_local("x", 10);

		let mut derived = CascadeMap::with_parent(Arc::new(base));
		assert!(derived.insert_local("x", 11));
		assert!(!derived.insert_local("x", 12));
	}

	#[test]
	fn iter_is_local_first_and_skips_shadowed() {
		let mut base = CascadeMap::new();
		base.insert_local("x", 10);
		base.insert_local("y", 20);

		let mut derived = CascadeMap::with_parent(Arc::new(base));
		derived.insert_local("z", 30);
		derived.insert_local("x", 11);

		let entries: Vec<(&&str, &i32)> = derived.iter().collect();
		assert_eq!(entries, vec![(&"z", &30), (&"x", &11), (&"y", &20)]);
		assert_eq!(derived.len(), 3);
		assert_eq!(derived.local_len(), 2);
	}

	#[test]
	fn three_layer_chain() {
		let mut a = CascadeMap::new();
		a.insert_local("k", 1);
		let mut b = CascadeMap::with_parent(Arc::new(a));
		b.insert_local("k", 2);
		let c: CascadeMap<&str, i32> = CascadeMap::with_parent(Arc::new(b));

		// The nearest layer that defines the key wins.
		assert_eq!(c.get("k"), Some(&2));
		assert_eq!(c.len(), 1);
	}
}
