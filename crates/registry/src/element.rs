//! Registry elements: one configuration record per component slot.

use std::sync::Arc;

use bitflags::bitflags;

use crate::address::ComponentAddress;
use crate::cascade::CascadeMap;
use crate::registry::Registry;
use crate::value::AttrValue;

bitflags! {
	/// Per-element behavior flags.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
	pub struct ElementFlags: u32 {
		/// Instantiate this slot during the parent's auto-init walk instead
		/// of waiting for the first reference.
		const AUTO_INIT = 1 << 0;
	}
}

/// Configured binding of a single attribute.
///
/// `value` is the local value; `export_id`, if set, redirects resolution to
/// the enclosing context under that id. Both may coexist: the export is
/// tried first, and the local value serves as the fallback when no enclosing
/// scope provides the exported id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttrBinding {
	value: Option<AttrValue>,
	export_id: Option<String>,
}

impl AttrBinding {
	/// Creates a binding carrying a local value.
	pub fn value(value: AttrValue) -> Self {
		Self {
			value: Some(value),
			export_id: None,
		}
	}

	/// Creates a binding that delegates to the enclosing scope.
	pub fn export(export_id: impl Into<String>) -> Self {
		Self {
			value: None,
			export_id: Some(export_id.into()),
		}
	}

	/// Creates an exported binding with a local fallback value.
	pub fn exported_value(value: AttrValue, export_id: impl Into<String>) -> Self {
		Self {
			value: Some(value),
			export_id: Some(export_id.into()),
		}
	}

	/// Returns the local value, if any.
	pub fn local_value(&self) -> Option<&AttrValue> {
		self.value.as_ref()
	}

	/// Returns the export id, if any.
	pub fn export_id(&self) -> Option<&str> {
		self.export_id.as_deref()
	}
}

/// A configuration record: which component class to instantiate, its
/// attribute bindings, and (for composites) the nested registry wiring the
/// sub-graph.
///
/// Attribute bindings live in a [`CascadeMap`]; chaining an element to a
/// prototype element gives override semantics without copying or touching
/// the prototype. Elements are immutable once built and shared via `Arc`.
#[derive(Debug)]
pub struct RegistryElement {
	class: ComponentAddress,
	attributes: CascadeMap<Box<str>, AttrBinding>,
	flags: ElementFlags,
	registry: Option<Arc<Registry>>,
}

impl RegistryElement {
	/// Starts building an element for the given component class.
	pub fn builder(class: ComponentAddress) -> RegistryElementBuilder {
		RegistryElementBuilder {
			class,
			prototype: None,
			attributes: Vec::new(),
			flags: ElementFlags::empty(),
			registry: None,
		}
	}

	/// Returns the component class this element instantiates.
	pub fn class(&self) -> &ComponentAddress {
		&self.class
	}

	/// Looks up an attribute binding through the prototype chain.
	pub fn attribute(&self, id: &str) -> Option<&AttrBinding> {
		self.attributes.get(id)
	}

	/// Returns the attribute map (cascading view).
	pub fn attributes(&self) -> &CascadeMap<Box<str>, AttrBinding> {
		&self.attributes
	}

	/// Returns the behavior flags.
	pub fn flags(&self) -> ElementFlags {
		self.flags
	}

	/// Returns true if this slot takes part in the auto-init walk.
	pub fn is_auto_init(&self) -> bool {
		self.flags.contains(ElementFlags::AUTO_INIT)
	}

	/// Returns the nested registry if this element describes a composite.
	pub fn registry(&self) -> Option<&Arc<Registry>> {
		self.registry.as_ref()
	}
}

/// Builder for [`RegistryElement`].
pub struct RegistryElementBuilder {
	class: ComponentAddress,
	prototype: Option<Arc<RegistryElement>>,
	attributes: Vec<(Box<str>, AttrBinding)>,
	flags: ElementFlags,
	registry: Option<Arc<Registry>>,
}

impl RegistryElementBuilder {
	/// Chains this element to a prototype whose bindings it overrides.
	pub fn prototype(mut self, prototype: Arc<RegistryElement>) -> Self {
		self.prototype = Some(prototype);
		self
	}

	/// Sets a local attribute value.
	pub fn attr(self, id: &str, value: impl Into<AttrValue>) -> Self {
		self.binding(id, AttrBinding::value(value.into()))
	}

	/// Redirects an attribute to the enclosing scope.
	pub fn export(self, id: &str, export_id: &str) -> Self {
		self.binding(id, AttrBinding::export(export_id))
	}

	/// Sets an arbitrary attribute binding.
	pub fn binding(mut self, id: &str, binding: AttrBinding) -> Self {
		if self.attributes.iter().any(|(k, _)| &**k == id) {
			tracing::warn!(domain = "registry", attribute = id, "duplicate attribute binding ignored");
			return self;
		}
		self.attributes.push((Box::from(id), binding));
		self
	}

	/// Adds behavior flags.
	pub fn flag(mut self, flags: ElementFlags) -> Self {
		self.flags |= flags;
		self
	}

	/// Marks the slot for the auto-init walk.
	pub fn auto_init(self) -> Self {
		self.flag(ElementFlags::AUTO_INIT)
	}

	/// Attaches the nested registry describing this composite's sub-graph.
	pub fn registry(mut self, registry: Arc<Registry>) -> Self {
		self.registry = Some(registry);
		self
	}

	/// Freezes the element.
	pub fn build(self) -> Arc<RegistryElement> {
		let mut attributes = match &self.prototype {
			Some(proto) => CascadeMap::with_parent(Arc::new(proto.attributes.clone())),
			None => CascadeMap::new(),
		};
		for (id, binding) in self.attributes {
			attributes.insert_local(id, binding);
		}
		Arc::new(RegistryElement {
			class: self.class,
			attributes,
			flags: self.flags,
			registry: self.registry,
		})
	}
}
