//! Registries: ordered collections of elements plus export tables.

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::element::RegistryElement;

/// Declarative wiring for one object graph.
///
/// A registry maps element ids to [`RegistryElement`]s (in insertion order)
/// and records which of its elements are visible from the outside: the
/// exported-components table maps an outward-facing id to an element id, and
/// the exported-interfaces table maps an interface name to the element (or
/// dotted element path) that provides it.
///
/// Registries are mutable while configuration is being assembled and are
/// frozen behind an `Arc` before the runtime sees them.
#[derive(Debug, Default)]
pub struct Registry {
	elements: IndexMap<Box<str>, Arc<RegistryElement>>,
	exported_components: FxHashMap<Box<str>, Box<str>>,
	exported_interfaces: FxHashMap<Box<str>, Box<str>>,
	description: String,
	keywords: String,
}

impl Registry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts an element under the given id.
	///
	/// Returns `false` and keeps the existing element if the id is taken.
	pub fn insert_element(&mut self, id: &str, element: Arc<RegistryElement>) -> bool {
		if self.elements.contains_key(id) {
			return false;
		}
		self.elements.insert(Box::from(id), element);
		true
	}

	/// Removes the element with the given id.
	pub fn remove_element(&mut self, id: &str) -> bool {
		self.elements.shift_remove(id).is_some()
	}

	/// Renames an element, keeping its position.
	///
	/// Returns `false` if the old id is missing or the new id is taken.
	pub fn rename_element(&mut self, old_id: &str, new_id: &str) -> bool {
		if self.elements.contains_key(new_id) {
			return false;
		}
		let Some(index) = self.elements.get_index_of(old_id) else {
			return false;
		};
		let (_, element) = self.elements.shift_remove_index(index).expect("index from lookup");
		self.elements.shift_insert(index, Box::from(new_id), element);
		true
	}

	/// Looks up an element by id.
	pub fn element(&self, id: &str) -> Option<&Arc<RegistryElement>> {
		self.elements.get(id)
	}

	/// Iterates over elements in insertion order.
	pub fn elements(&self) -> impl Iterator<Item = (&str, &Arc<RegistryElement>)> + '_ {
		self.elements.iter().map(|(id, element)| (&**id, element))
	}

	/// Returns the element ids in insertion order.
	pub fn element_ids(&self) -> impl Iterator<Item = &str> + '_ {
		self.elements.keys().map(|id| &**id)
	}

	/// Returns the number of elements.
	pub fn len(&self) -> usize {
		self.elements.len()
	}

	/// Returns true if the registry holds no elements.
	pub fn is_empty(&self) -> bool {
		self.elements.is_empty()
	}

	/// Exposes an element under an outward-facing component id.
	///
	/// Returns `false` if the element id is unknown.
	pub fn set_component_exported(&mut self, export_id: &str, element_id: &str) -> bool {
		if !self.elements.contains_key(element_id) {
			tracing::warn!(
				domain = "registry",
				export = export_id,
				element = element_id,
				"cannot export unknown element",
			);
			return false;
		}
		self.exported_components.insert(Box::from(export_id), Box::from(element_id));
		true
	}

	/// Resolves an outward-facing component id to the element providing it.
	pub fn exported_component(&self, export_id: &str) -> Option<&str> {
		self.exported_components.get(export_id).map(|id| &**id)
	}

	/// Iterates over the exported-components table.
	pub fn exported_components(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
		self.exported_components.iter().map(|(k, v)| (&**k, &**v))
	}

	/// Declares that an interface is provided by the given element path.
	pub fn set_interface_exported(&mut self, interface: &str, target: &str) {
		self.exported_interfaces.insert(Box::from(interface), Box::from(target));
	}

	/// Resolves an interface name to the element path providing it.
	pub fn exported_interface(&self, interface: &str) -> Option<&str> {
		self.exported_interfaces.get(interface).map(|id| &**id)
	}

	/// Iterates over the exported-interfaces table.
	pub fn exported_interfaces(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
		self.exported_interfaces.iter().map(|(k, v)| (&**k, &**v))
	}

	/// Returns the registry description.
	pub fn description(&self) -> &str {
		&self.description
	}

	/// Sets the registry description.
	pub fn set_description(&mut self, description: impl Into<String>) {
		self.description = description.into();
	}

	/// Returns the registry keywords.
	pub fn keywords(&self) -> &str {
		&self.keywords
	}

	/// Sets the registry keywords.
	pub fn set_keywords(&mut self, keywords: impl Into<String>) {
		self.keywords = keywords.into();
	}
}
