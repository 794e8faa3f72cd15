//! The component trait, descriptors, and interface queries.
//!
//! A component class is an ordinary struct embedding a [`ComponentBase`]
//! and implementing [`ComponentDescriptor`]: `describe` registers its
//! attributes and interfaces, `create` builds an instance with its proxies
//! bound to the owning context. The object-safe [`Component`] trait is
//! blanket-implemented for every descriptor, so the runtime only ever deals
//! with `Rc<dyn Component>` handles.

use std::any::{Any, TypeId};
use std::rc::Rc;

use crate::context::ComponentContext;
use crate::info::ClassInfoBuilder;

/// Per-instance state every component carries: the bound context.
pub struct ComponentBase {
	ctx: Rc<ComponentContext>,
}

impl ComponentBase {
	/// Binds to the owning context.
	pub fn new(ctx: &Rc<ComponentContext>) -> Self {
		Self { ctx: ctx.clone() }
	}

	/// Returns the owning context.
	pub fn context(&self) -> &Rc<ComponentContext> {
		&self.ctx
	}
}

/// Implemented once per component class.
///
/// Registration is explicit: `describe` runs exactly once when the class's
/// static info is built, and its registration order is the order entries
/// appear in cascading views.
pub trait ComponentDescriptor: Any + Sized {
	/// Registers the class's attributes, interfaces, and slots.
	fn describe(info: &mut ClassInfoBuilder<Self>);

	/// Constructs an instance bound to the given context.
	fn create(ctx: &Rc<ComponentContext>) -> Self;

	/// Returns the embedded [`ComponentBase`].
	fn base(&self) -> &ComponentBase;

	/// Called once after the instance has been constructed and cached in
	/// its slot.
	fn on_created(&self) {}
}

/// Object-safe runtime view of a component instance.
pub trait Component: Any {
	/// Returns the owning context.
	fn context(&self) -> &Rc<ComponentContext>;

	/// Upcast for concrete downcasting.
	fn as_any(&self) -> &dyn Any;

	/// Shared-handle upcast for concrete downcasting.
	fn as_any_rc(self: Rc<Self>) -> Rc<dyn Any>;

	/// Type-erased interface query; the box holds an `Rc<I>` on success.
	///
	/// Use [`query_interface`] instead of calling this directly.
	fn query_any(self: Rc<Self>, interface: TypeId) -> Option<Box<dyn Any>>;

	/// Lifecycle notification dispatched by the assembly machinery.
	fn notify_created(&self) {}
}

impl<C: ComponentDescriptor> Component for C {
	fn context(&self) -> &Rc<ComponentContext> {
		self.base().context()
	}

	fn as_any(&self) -> &dyn Any {
		self
	}

	fn as_any_rc(self: Rc<Self>) -> Rc<dyn Any> {
		self
	}

	fn query_any(self: Rc<Self>, interface: TypeId) -> Option<Box<dyn Any>> {
		let info = self.context().static_info().clone();
		let component: Rc<dyn Component> = self;
		info.query_component(&component, interface)
	}

	fn notify_created(&self) {
		ComponentDescriptor::on_created(self);
	}
}

/// Queries a component for one of its registered interfaces.
///
/// `I` is the interface trait-object type (e.g. `dyn IPainter`). Returns
/// `None` if the component's class does not register the interface: a
/// capability miss, not an error.
pub fn query_interface<I: ?Sized + 'static>(component: &Rc<dyn Component>) -> Option<Rc<I>> {
	let boxed = component.clone().query_any(TypeId::of::<I>())?;
	boxed.downcast::<Rc<I>>().ok().map(|rc| *rc)
}

/// Downcasts a component handle to its concrete class.
pub fn query_concrete<C: Component>(component: &Rc<dyn Component>) -> Option<Rc<C>> {
	component.clone().as_any_rc().downcast::<C>().ok()
}

/// Generic factory endpoint: binds a concrete component class to its owning
/// context at construction time.
///
/// A concrete class's static info stores `ComponentWrap::<C>::instantiate`
/// as its factory; everything else in the runtime goes through that one
/// function pointer.
pub struct ComponentWrap<C: ComponentDescriptor> {
	marker: std::marker::PhantomData<fn() -> C>,
}

impl<C: ComponentDescriptor> ComponentWrap<C> {
	/// Creates an instance of `C` bound to `ctx`.
	pub fn instantiate(ctx: &Rc<ComponentContext>) -> Rc<dyn Component> {
		Rc::new(C::create(ctx))
	}
}
