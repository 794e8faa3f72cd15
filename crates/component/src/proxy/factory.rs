//! Create-on-demand factory proxies.

use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

use armature_registry::AttrType;

use super::{declared_attr, ref_target};
use crate::component::{Component, query_interface};
use crate::context::ComponentContext;
use crate::info::AttrDef;

/// Factory handle over a named slot in the surrounding graph.
///
/// Where [`crate::proxy::RefPtr`] finds the shared instance of its target,
/// a factory re-invokes creation: every [`create_instance`] call builds a
/// fresh component from the slot's configuration, and the memoized slot of
/// the enclosing composite is never touched.
///
/// [`create_instance`]: FactoryPtr::create_instance
pub struct FactoryPtr<I: ?Sized + 'static> {
	def: Arc<AttrDef>,
	target_id: Option<String>,
	real_context: Option<Rc<ComponentContext>>,
	marker: PhantomData<fn() -> Rc<I>>,
}

impl<I: ?Sized + 'static> FactoryPtr<I> {
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
						"factory attribute holds a non-reference value",
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
			marker: PhantomData,
		}
	}

	/// Returns true if a target slot is configured and reachable.
	pub fn is_valid(&self) -> bool {
		self.target_id.is_some()
			&& self.real_context.as_ref().is_some_and(|ctx| ctx.parent().is_some())
	}

	/// Builds a fresh component from the target slot's configuration.
	pub fn create_component(&self) -> Option<Rc<dyn Component>> {
		let target_id = self.target_id.as_deref()?;
		let parent = self.real_context.as_ref()?.parent()?;
		parent.create_subcomponent(target_id)
	}

	/// Builds a fresh component and returns it as the interface `I`.
	pub fn create_instance(&self) -> Option<Rc<I>> {
		query_interface::<I>(&self.create_component()?)
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

impl<I: ?Sized + 'static> core::fmt::Debug for FactoryPtr<I> {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("FactoryPtr")
			.field("id", &self.def.id())
			.field("target", &self.target_id)
			.finish()
	}
}
