//! Composite components: object graphs built from nested registries.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use armature_registry::{Registry, split_component_path};
use rustc_hash::FxHashMap;

use crate::component::{
	Component, ComponentBase, ComponentDescriptor, ComponentWrap, query_concrete,
};
use crate::context::ComponentContext;
use crate::env::Env;
use crate::info::{ClassInfoBuilder, ClassMeta, StaticInfo};

/// Static info of a composite: a view over a nested [`Registry`].
///
/// Child static infos are materialized on first request and cached per slot
/// id, including the negative result, so an unconfigured slot yields a
/// stable `None` ("this optional sub-component was not configured", not an
/// error). Component instances are created even later, on first live
/// access through a context; metadata and instances are two separate
/// levels of laziness.
pub struct CompositeStaticInfo {
	meta: ClassMeta,
	registry: Arc<Registry>,
	env: Rc<Env>,
	children: RefCell<FxHashMap<Box<str>, Option<Rc<dyn StaticInfo>>>>,
}

impl CompositeStaticInfo {
	/// Wraps a registry as a composite class.
	pub fn new(meta: ClassMeta, registry: Arc<Registry>, env: Rc<Env>) -> Self {
		Self {
			meta,
			registry,
			env,
			children: RefCell::new(FxHashMap::default()),
		}
	}

	fn build_child(&self, id: &str) -> Option<Rc<dyn StaticInfo>> {
		let element = self.registry.element(id)?;
		if let Some(nested) = element.registry() {
			let meta = ClassMeta::new(
				element.class().to_string(),
				nested.description(),
				nested.keywords(),
			);
			return Some(Rc::new(CompositeStaticInfo::new(meta, nested.clone(), self.env.clone())));
		}
		let info = self.env.static_info(element.class());
		if info.is_none() {
			tracing::warn!(
				domain = "assembly",
				slot = id,
				class = %element.class(),
				"element names an unknown component class",
			);
		}
		info
	}
}

impl StaticInfo for CompositeStaticInfo {
	fn meta(&self) -> &ClassMeta {
		&self.meta
	}

	fn subcomponent_info(&self, id: &str) -> Option<Rc<dyn StaticInfo>> {
		if let Some(cached) = self.children.borrow().get(id) {
			return cached.clone();
		}
		let built = self.build_child(id);
		self.children
			.borrow_mut()
			.entry(Box::from(id))
			.or_insert_with(|| built.clone())
			.clone()
	}

	fn subcomponent_ids(&self) -> Vec<Box<str>> {
		self.registry.element_ids().map(Box::from).collect()
	}

	fn registry(&self) -> Option<&Arc<Registry>> {
		Some(&self.registry)
	}

	fn query_component(&self, component: &Rc<dyn Component>, interface: TypeId) -> Option<Box<dyn Any>> {
		let composite = query_concrete::<CompositeComponent>(component)?;
		composite.query_exported(interface)
	}

	fn create(&self, ctx: &Rc<ComponentContext>) -> Rc<dyn Component> {
		ComponentWrap::<CompositeComponent>::instantiate(ctx)
	}
}

impl core::fmt::Debug for CompositeStaticInfo {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("CompositeStaticInfo")
			.field("id", &self.meta.id())
			.field("elements", &self.registry.len())
			.finish()
	}
}

/// A component whose sub-components are built from a nested registry.
///
/// Interface queries are answered by the nested graph: the registry's
/// exported-interfaces table names the child (or dotted child path) that
/// provides each interface, and exported-components give named access from
/// the outside. Sub-components themselves are created through the context,
/// lazily and at most once per slot.
pub struct CompositeComponent {
	base: ComponentBase,
}

impl ComponentDescriptor for CompositeComponent {
	fn describe(_info: &mut ClassInfoBuilder<Self>) {}

	fn create(ctx: &Rc<ComponentContext>) -> Self {
		Self {
			base: ComponentBase::new(ctx),
		}
	}

	fn base(&self) -> &ComponentBase {
		&self.base
	}
}

impl CompositeComponent {
	fn ctx(&self) -> &Rc<ComponentContext> {
		self.base.context()
	}

	/// Returns the sub-component in the given slot, creating it on first
	/// access.
	pub fn subcomponent(&self, id: &str) -> Option<Rc<dyn Component>> {
		self.ctx().subcomponent(id)
	}

	/// Resolves an outward-facing component path through the
	/// exported-components table, descending into nested composites for
	/// dotted paths.
	pub fn exported_component(&self, path: &str) -> Option<Rc<dyn Component>> {
		let registry = self.ctx().registry()?;
		let (head, rest) = split_component_path(path);
		let element_id = registry.exported_component(head)?.to_string();
		let child = self.ctx().subcomponent(&element_id)?;
		if rest.is_empty() {
			return Some(child);
		}
		query_concrete::<CompositeComponent>(&child)?.exported_component(rest)
	}

	/// Instantiates every auto-init slot of the nested graph.
	pub fn ensure_auto_created(&self) {
		self.ctx().ensure_auto_created();
	}

	fn query_exported(&self, interface: TypeId) -> Option<Box<dyn Any>> {
		let env = self.ctx().env()?.clone();
		let registry = self.ctx().registry()?.clone();
		let name = env.interface_name(interface)?;
		let target = registry.exported_interface(name)?;

		let (head, rest) = split_component_path(target);
		let child = self.ctx().subcomponent(head)?;
		let provider = if rest.is_empty() {
			child
		} else {
			query_concrete::<CompositeComponent>(&child)?.exported_component(rest)?
		};
		provider.query_any(interface)
	}
}
