//! Find-existing reference proxies.

use std::cell::OnceCell;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

use armature_registry::AttrType;
use smallvec::SmallVec;

use super::{declared_attr, ref_target, ref_targets};
use crate::component::{Component, query_interface};
use crate::context::ComponentContext;
use crate::info::AttrDef;

/// Lazily-resolved handle to a named component in the surrounding graph.
///
/// The configured component id is captured at bind time; the live component
/// is looked up on first use in the **parent** of the context that owns the
/// binding, since a reference names a sibling or ancestor of the referencing
/// component, not one of its own children. A successful resolution is
/// memoized for the proxy's lifetime; a failed one is retried on the next
/// query and surfaces only as `is_valid() == false`.
pub struct RefPtr<I: ?Sized + 'static> {
	def: Arc<AttrDef>,
	target_id: Option<String>,
	real_context: Option<Rc<ComponentContext>>,
	cache: OnceCell<Rc<dyn Component>>,
	marker: PhantomData<fn() -> Rc<I>>,
}

impl<I: ?Sized + 'static> RefPtr<I> {
	/// Binds the proxy to the owning context's attribute `id`.
	pub fn bind(ctx: &Rc<ComponentContext>, id: &str) -> Self {
		let def = declared_attr(ctx, id, AttrType::Ref);
		let (target_id, real_context) = match ctx.attribute(id) {
			Some(resolved) => match ref_target(&resolved.value) {
				Some(target) => (Some(target.to_string()), Some(resolved.context)),
				None => {
					tracing::warn!(
						domain = "component",
						attribute = id,
						got = resolved.value.type_name(),
						"reference attribute holds a non-reference value",
					);
					(None, None)
				}
			},
			None => (None, None),
		};
		Self {
			def,
			target_id,
			real_context,
			cache: OnceCell::new(),
			marker: PhantomData,
		}
	}

	fn resolve(&self) -> Option<&Rc<dyn Component>> {
		if let Some(component) = self.cache.get() {
			return Some(component);
		}
		let target_id = self.target_id.as_deref()?;
		let parent = self.real_context.as_ref()?.parent()?;
		let component = parent.subcomponent(target_id)?;
		Some(self.cache.get_or_init(|| component))
	}

	/// Returns true if the reference resolves to a live component.
	pub fn is_valid(&self) -> bool {
		self.resolve().is_some()
	}

	/// Returns the resolved component handle.
	pub fn component(&self) -> Option<Rc<dyn Component>> {
		self.resolve().cloned()
	}

	/// Returns the resolved component as the interface `I`.
	pub fn get(&self) -> Option<Rc<I>> {
		query_interface::<I>(self.resolve()?)
	}

	/// Returns the configured target id.
	pub fn target_id(&self) -> Option<&str> {
		self.target_id.as_deref()
	}

	/// Returns the attribute descriptor.
	pub fn def(&self) -> &AttrDef {
		&self.def
	}
}

impl<I: ?Sized + 'static> core::fmt::Debug for RefPtr<I> {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("RefPtr")
			.field("id", &self.def.id())
			.field("target", &self.target_id)
			.field("resolved", &self.cache.get().is_some())
			.finish()
	}
}

/// Ordered list of lazily-resolved references.
///
/// Each entry resolves and memoizes independently, in the same parent scope
/// a single [`RefPtr`] would use.
pub struct MultiRefPtr<I: ?Sized + 'static> {
	def: Arc<AttrDef>,
	target_ids: SmallVec<[String; 4]>,
	real_context: Option<Rc<ComponentContext>>,
	cache: Vec<OnceCell<Rc<dyn Component>>>,
	marker: PhantomData<fn() -> Rc<I>>,
}

impl<I: ?Sized + 'static> MultiRefPtr<I> {
	/// Binds the proxy to the owning context's attribute `id`.
	pub fn bind(ctx: &Rc<ComponentContext>, id: &str) -> Self {
		let def = declared_attr(ctx, id, AttrType::RefList);
		let (target_ids, real_context) = match ctx.attribute(id) {
			Some(resolved) => match ref_targets(&resolved.value) {
				Some(targets) => (
					targets.iter().cloned().collect::<SmallVec<[String; 4]>>(),
					Some(resolved.context),
				),
				None => {
					tracing::warn!(
						domain = "component",
						attribute = id,
						got = resolved.value.type_name(),
						"reference-list attribute holds a non-reference value",
					);
					(SmallVec::new(), None)
				}
			},
			None => (SmallVec::new(), None),
		};
		let cache = (0..target_ids.len()).map(|_| OnceCell::new()).collect();
		Self {
			def,
			target_ids,
			real_context,
			cache,
			marker: PhantomData,
		}
	}

	/// Returns the number of configured references.
	pub fn len(&self) -> usize {
		self.target_ids.len()
	}

	/// Returns true if no references are configured.
	pub fn is_empty(&self) -> bool {
		self.target_ids.is_empty()
	}

	/// Returns the configured target ids.
	pub fn target_ids(&self) -> &[String] {
		&self.target_ids
	}

	fn resolve_at(&self, index: usize) -> Option<&Rc<dyn Component>> {
		let cell = self.cache.get(index)?;
		if let Some(component) = cell.get() {
			return Some(component);
		}
		let target_id = self.target_ids.get(index)?;
		let parent = self.real_context.as_ref()?.parent()?;
		let component = parent.subcomponent(target_id)?;
		Some(cell.get_or_init(|| component))
	}

	/// Returns the resolved component at `index`.
	pub fn component_at(&self, index: usize) -> Option<Rc<dyn Component>> {
		self.resolve_at(index).cloned()
	}

	/// Returns the resolved component at `index` as the interface `I`.
	pub fn get_at(&self, index: usize) -> Option<Rc<I>> {
		query_interface::<I>(self.resolve_at(index)?)
	}

	/// Returns true if every configured reference resolves.
	pub fn is_valid(&self) -> bool {
		(0..self.target_ids.len()).all(|index| self.resolve_at(index).is_some())
	}

	/// Returns the attribute descriptor.
	pub fn def(&self) -> &AttrDef {
		&self.def
	}
}

impl<I: ?Sized + 'static> core::fmt::Debug for MultiRefPtr<I> {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("MultiRefPtr")
			.field("id", &self.def.id())
			.field("targets", &self.target_ids)
			.finish()
	}
}
