//! Component contexts: the runtime binding between configuration and code.
//!
//! A [`ComponentContext`] glues one registry element to one static info and
//! to an optional parent context. Attribute resolution walks the element's
//! binding (export first, local value second) up the parent chain; composite
//! contexts additionally own the memoized sub-component slots of their
//! object graph.
//!
//! Contexts form a strict tree of shared handles: children hold an `Rc` to
//! their parent, parents never point down, so a context can never outlive
//! the scope it resolves against.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use armature_registry::{AttrValue, Registry, RegistryElement};
use rustc_hash::FxHashMap;

use crate::component::{Component, query_concrete};
use crate::composite::CompositeComponent;
use crate::env::Env;
use crate::info::StaticInfo;

/// An attribute value together with the context that owns it.
///
/// References must resolve in the owning context's parent, so resolution
/// reports where a value was actually found, not merely what it is.
#[derive(Clone)]
pub struct ResolvedAttr {
	/// The resolved value.
	pub value: AttrValue,
	/// The context whose element supplied the value.
	pub context: Rc<ComponentContext>,
}

/// Runtime binding of one registry element to its static info and parent.
pub struct ComponentContext {
	slot: Box<str>,
	element: Arc<RegistryElement>,
	info: Rc<dyn StaticInfo>,
	parent: Option<Rc<ComponentContext>>,
	assembly: Option<Assembly>,
}

/// Assembly state carried by composite contexts only.
struct Assembly {
	registry: Arc<Registry>,
	env: Rc<Env>,
	children: RefCell<FxHashMap<Box<str>, Option<Rc<dyn Component>>>>,
}

impl ComponentContext {
	/// Creates the root context of an object graph.
	pub fn root(element: Arc<RegistryElement>, info: Rc<dyn StaticInfo>, env: &Rc<Env>) -> Rc<Self> {
		Self::new(Box::from(""), element, info, None, env)
	}

	fn new(
		slot: Box<str>,
		element: Arc<RegistryElement>,
		info: Rc<dyn StaticInfo>,
		parent: Option<Rc<ComponentContext>>,
		env: &Rc<Env>,
	) -> Rc<Self> {
		let assembly = info.registry().cloned().map(|registry| Assembly {
			registry,
			env: env.clone(),
			children: RefCell::new(FxHashMap::default()),
		});
		Rc::new(Self {
			slot,
			element,
			info,
			parent,
			assembly,
		})
	}

	/// Returns the slot id this context was created under.
	pub fn slot_id(&self) -> &str {
		&self.slot
	}

	/// Returns the bound registry element.
	pub fn element(&self) -> &Arc<RegistryElement> {
		&self.element
	}

	/// Returns the bound static info.
	pub fn static_info(&self) -> &Rc<dyn StaticInfo> {
		&self.info
	}

	/// Returns the parent context.
	pub fn parent(&self) -> Option<&Rc<ComponentContext>> {
		self.parent.as_ref()
	}

	/// Returns the nested registry for composite contexts.
	pub fn registry(&self) -> Option<&Arc<Registry>> {
		self.assembly.as_ref().map(|a| &a.registry)
	}

	pub(crate) fn env(&self) -> Option<&Rc<Env>> {
		self.assembly.as_ref().map(|a| &a.env)
	}

	/// Resolves an attribute by id.
	///
	/// The element's binding is looked up through its prototype chain; a
	/// binding with an export id is redirected to the parent context first,
	/// and only falls back to its local value when no enclosing scope
	/// resolves the exported id. Pure lookup; a miss is `None`.
	pub fn attribute(self: &Rc<Self>, id: &str) -> Option<ResolvedAttr> {
		let binding = self.element.attribute(id)?;
		if let Some(export_id) = binding.export_id()
			&& !export_id.is_empty()
			&& let Some(parent) = &self.parent
			&& let Some(resolved) = parent.attribute(export_id)
		{
			return Some(resolved);
		}
		let value = binding.local_value()?.clone();
		Some(ResolvedAttr {
			value,
			context: self.clone(),
		})
	}

	/// Returns the sub-component in the given slot, creating it on first
	/// access.
	///
	/// At most one instance is ever created per slot; a slot that fails to
	/// build stays `None` on every subsequent call. Non-composite contexts
	/// have no slots and always return `None`.
	pub fn subcomponent(self: &Rc<Self>, id: &str) -> Option<Rc<dyn Component>> {
		let assembly = self.assembly.as_ref()?;
		if let Some(slot) = assembly.children.borrow().get(id) {
			return slot.clone();
		}

		let created = self.instantiate_slot(id);

		// A reentrant resolution during instantiation may have filled the
		// slot already; the first insertion wins.
		let winner = {
			let mut children = assembly.children.borrow_mut();
			children.entry(Box::from(id)).or_insert_with(|| created.clone()).clone()
		};
		if let (Some(winner), Some(created)) = (&winner, &created)
			&& Rc::ptr_eq(winner, created)
		{
			winner.notify_created();
		}
		winner
	}

	/// Creates a fresh instance from the given slot's configuration.
	///
	/// Unlike [`subcomponent`](Self::subcomponent) this never touches the
	/// memoized slot: every call constructs a new component. This is the
	/// factory-proxy path.
	pub fn create_subcomponent(self: &Rc<Self>, id: &str) -> Option<Rc<dyn Component>> {
		let component = self.instantiate_slot(id)?;
		component.notify_created();
		Some(component)
	}

	/// Instantiates every slot flagged auto-init, recursing into composite
	/// children.
	///
	/// Plain construction never walks eagerly; the bootstrap (or a host
	/// that wants a warm graph) invokes this explicitly.
	pub fn ensure_auto_created(self: &Rc<Self>) {
		let Some(assembly) = &self.assembly else {
			return;
		};
		for (id, element) in assembly.registry.elements() {
			if !element.is_auto_init() {
				continue;
			}
			match self.subcomponent(id) {
				Some(child) => {
					if let Some(composite) = query_concrete::<CompositeComponent>(&child) {
						composite.ensure_auto_created();
					}
				}
				None => {
					tracing::warn!(domain = "assembly", slot = id, "auto-init slot could not be created");
				}
			}
		}
	}

	fn instantiate_slot(self: &Rc<Self>, id: &str) -> Option<Rc<dyn Component>> {
		let assembly = self.assembly.as_ref()?;
		let element = assembly.registry.element(id)?.clone();
		let Some(info) = self.info.subcomponent_info(id) else {
			tracing::warn!(
				domain = "assembly",
				slot = id,
				class = %element.class(),
				"no static info for configured slot",
			);
			return None;
		};
		let ctx = Self::new(Box::from(id), element, info.clone(), Some(self.clone()), &assembly.env);
		Some(info.create(&ctx))
	}
}

impl core::fmt::Debug for ComponentContext {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("ComponentContext")
			.field("slot", &self.slot)
			.field("class", &self.info.meta().id())
			.field("composite", &self.assembly.is_some())
			.finish()
	}
}
