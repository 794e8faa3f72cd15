//! Static component-class metadata and registration.
//!
//! Every component class is described once by a [`ClassStaticInfo`]: the
//! attributes it understands, the interfaces it can be cast to, and the
//! sub-component slots it declares. The three collections are cascading
//! maps, so a derived class wraps its base class's info and registers only
//! what is new; lookups fall back through the chain and local entries win.
//!
//! Concrete classes are described through [`ClassInfoBuilder`] by their
//! [`ComponentDescriptor`] impl; abstract bases (which can never be
//! instantiated) are assembled with the untyped [`BaseInfoBuilder`].

use std::any::{Any, TypeId};
use std::rc::Rc;
use std::sync::Arc;

use armature_registry::{AttrDefault, AttrType, CascadeMap, Registry};

use crate::component::{Component, ComponentDescriptor, ComponentWrap};
use crate::context::ComponentContext;

/// Common metadata carried by every component class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMeta {
	id: Box<str>,
	description: Box<str>,
	keywords: Box<str>,
}

impl ClassMeta {
	/// Creates metadata with all fields specified.
	pub fn new(
		id: impl Into<String>,
		description: impl Into<String>,
		keywords: impl Into<String>,
	) -> Self {
		Self {
			id: id.into().into_boxed_str(),
			description: description.into().into_boxed_str(),
			keywords: keywords.into().into_boxed_str(),
		}
	}

	/// Creates metadata with an id only.
	pub fn minimal(id: impl Into<String>) -> Self {
		Self::new(id, "", "")
	}

	/// Returns the class id.
	pub fn id(&self) -> &str {
		&self.id
	}

	/// Returns the description for UI and help text.
	pub fn description(&self) -> &str {
		&self.description
	}

	/// Returns the search keywords.
	pub fn keywords(&self) -> &str {
		&self.keywords
	}
}

/// Immutable descriptor of one attribute.
#[derive(Debug)]
pub struct AttrDef {
	id: Box<str>,
	description: Box<str>,
	obligatory: bool,
	default: AttrDefault,
}

impl AttrDef {
	fn new(id: &str, description: &str, default: AttrDefault) -> Self {
		Self {
			id: Box::from(id),
			description: Box::from(description),
			obligatory: false,
			default,
		}
	}

	/// Declares a boolean attribute.
	pub fn bool(id: &str, description: &str, default: fn() -> bool) -> Self {
		Self::new(id, description, AttrDefault::Bool(default))
	}

	/// Declares an integer attribute.
	pub fn int(id: &str, description: &str, default: fn() -> i64) -> Self {
		Self::new(id, description, AttrDefault::Int(default))
	}

	/// Declares a floating-point attribute.
	pub fn real(id: &str, description: &str, default: fn() -> f64) -> Self {
		Self::new(id, description, AttrDefault::Real(default))
	}

	/// Declares a string attribute.
	pub fn text(id: &str, description: &str, default: fn() -> String) -> Self {
		Self::new(id, description, AttrDefault::Text(default))
	}

	/// Declares a string-list attribute.
	pub fn text_list(id: &str, description: &str, default: fn() -> Vec<String>) -> Self {
		Self::new(id, description, AttrDefault::TextList(default))
	}

	/// Declares a component-reference attribute.
	pub fn reference(id: &str, description: &str) -> Self {
		Self::new(id, description, AttrDefault::Ref(String::new))
	}

	/// Declares a component-reference-list attribute.
	pub fn ref_list(id: &str, description: &str) -> Self {
		Self::new(id, description, AttrDefault::RefList(Vec::new))
	}

	/// Marks the attribute as obligatory: it must be configured, the
	/// default is never used as a substitute.
	pub fn obligatory(mut self) -> Self {
		self.obligatory = true;
		self
	}

	/// Returns the attribute id.
	pub fn id(&self) -> &str {
		&self.id
	}

	/// Returns the description.
	pub fn description(&self) -> &str {
		&self.description
	}

	/// Returns true if the attribute must be configured.
	pub fn is_obligatory(&self) -> bool {
		self.obligatory
	}

	/// Returns the default-value factory.
	pub fn default(&self) -> AttrDefault {
		self.default
	}

	/// Returns the declared value type.
	pub fn value_type(&self) -> AttrType {
		self.default.value_type()
	}
}

type ErasedCaster = Box<dyn Fn(&Rc<dyn Component>) -> Option<Box<dyn Any>>>;

/// A supported-interface record: a stable name for capability queries and
/// configuration-driven export lookup, plus a caster converting a component
/// handle into the interface trait object.
pub struct InterfaceDef {
	name: &'static str,
	type_id: TypeId,
	caster: ErasedCaster,
}

impl InterfaceDef {
	fn new<I: ?Sized + 'static>(name: &'static str, caster: ErasedCaster) -> Self {
		Self {
			name,
			type_id: TypeId::of::<I>(),
			caster,
		}
	}

	/// Creates a marker entry without a caster.
	///
	/// Abstract base classes use markers for static capability checks; a
	/// concrete class shadows the marker with a real caster.
	pub fn tag<I: ?Sized + 'static>(name: &'static str) -> Self {
		Self::new::<I>(name, Box::new(|_| None))
	}

	/// Returns the interface name.
	pub fn name(&self) -> &'static str {
		self.name
	}

	/// Returns the interface type id.
	pub fn type_id(&self) -> TypeId {
		self.type_id
	}

	pub(crate) fn cast_erased(&self, component: &Rc<dyn Component>) -> Option<Box<dyn Any>> {
		(self.caster)(component)
	}
}

impl core::fmt::Debug for InterfaceDef {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("InterfaceDef").field("name", &self.name).finish()
	}
}

/// Factory endpoint stored in a concrete class's static info.
pub type ComponentFactory = fn(&Rc<ComponentContext>) -> Rc<dyn Component>;

/// Static metadata of a component class.
///
/// Implemented by [`ClassStaticInfo`] for declared classes and by
/// [`crate::composite::CompositeStaticInfo`] for registry-driven composites.
/// All lookup methods are cascading and read-only; misses are `None`.
pub trait StaticInfo {
	/// Returns the class metadata.
	fn meta(&self) -> &ClassMeta;

	/// Looks up an attribute descriptor through the inheritance chain.
	fn attribute(&self, id: &str) -> Option<&Arc<AttrDef>> {
		let _ = id;
		None
	}

	/// Returns the visible attribute ids, local entries first.
	fn attribute_ids(&self) -> Vec<&str> {
		Vec::new()
	}

	/// Looks up a supported interface by name.
	fn interface(&self, name: &str) -> Option<&InterfaceDef> {
		let _ = name;
		None
	}

	/// Looks up a supported interface by type id.
	fn interface_by_type(&self, interface: TypeId) -> Option<&InterfaceDef> {
		let _ = interface;
		None
	}

	/// Returns the visible interface names and type ids.
	fn interface_ids(&self) -> Vec<(&'static str, TypeId)> {
		Vec::new()
	}

	/// Looks up the static info of a declared sub-component slot.
	///
	/// `None` means "this optional slot is not configured", not an error.
	fn subcomponent_info(&self, id: &str) -> Option<Rc<dyn StaticInfo>>;

	/// Returns the visible sub-component slot ids.
	fn subcomponent_ids(&self) -> Vec<Box<str>>;

	/// Returns the nested registry for composite classes.
	fn registry(&self) -> Option<&Arc<Registry>> {
		None
	}

	/// Answers an interface query for an instance of this class.
	///
	/// The default casts through the registered interface entry; composite
	/// classes override this to walk their exported-interfaces table.
	/// The box holds an `Rc<I>` of the queried interface on success.
	fn query_component(&self, component: &Rc<dyn Component>, interface: TypeId) -> Option<Box<dyn Any>> {
		self.interface_by_type(interface)?.cast_erased(component)
	}

	/// Instantiates a component bound to the given context.
	///
	/// # Panics
	///
	/// Panics when called on an abstract static info; instantiating an
	/// abstract class is a registration mistake, not a data problem.
	fn create(&self, ctx: &Rc<ComponentContext>) -> Rc<dyn Component>;
}

/// Standard static info for declared (non-composite) component classes.
pub struct ClassStaticInfo {
	meta: ClassMeta,
	attrs: Arc<CascadeMap<Box<str>, Arc<AttrDef>>>,
	ifaces: Arc<CascadeMap<Box<str>, InterfaceDef>>,
	subs: Arc<CascadeMap<Box<str>, Rc<dyn StaticInfo>>>,
	factory: Option<ComponentFactory>,
}

impl ClassStaticInfo {
	/// Builds the static info of a concrete class.
	pub fn of<C: ComponentDescriptor>(meta: ClassMeta) -> Rc<Self> {
		Self::build::<C>(meta, None)
	}

	/// Builds the static info of a concrete class deriving from a base.
	pub fn derived<C: ComponentDescriptor>(meta: ClassMeta, base: &Rc<ClassStaticInfo>) -> Rc<Self> {
		Self::build::<C>(meta, Some(base))
	}

	fn build<C: ComponentDescriptor>(meta: ClassMeta, base: Option<&Rc<ClassStaticInfo>>) -> Rc<Self> {
		let mut builder = ClassInfoBuilder::<C> {
			inner: BaseInfoBuilder::with_parents(meta, base),
			marker: std::marker::PhantomData,
		};
		C::describe(&mut builder);
		Rc::new(builder.inner.freeze(Some(ComponentWrap::<C>::instantiate)))
	}

	/// Returns true if this class can be instantiated.
	pub fn is_concrete(&self) -> bool {
		self.factory.is_some()
	}
}

impl StaticInfo for ClassStaticInfo {
	fn meta(&self) -> &ClassMeta {
		&self.meta
	}

	fn attribute(&self, id: &str) -> Option<&Arc<AttrDef>> {
		self.attrs.get(id)
	}

	fn attribute_ids(&self) -> Vec<&str> {
		self.attrs.keys().map(|id| &**id).collect()
	}

	fn interface(&self, name: &str) -> Option<&InterfaceDef> {
		self.ifaces.get(name)
	}

	fn interface_by_type(&self, interface: TypeId) -> Option<&InterfaceDef> {
		self.ifaces.iter().map(|(_, def)| def).find(|def| def.type_id == interface)
	}

	fn interface_ids(&self) -> Vec<(&'static str, TypeId)> {
		self.ifaces.iter().map(|(_, def)| (def.name, def.type_id)).collect()
	}

	fn subcomponent_info(&self, id: &str) -> Option<Rc<dyn StaticInfo>> {
		self.subs.get(id).cloned()
	}

	fn subcomponent_ids(&self) -> Vec<Box<str>> {
		self.subs.keys().cloned().collect()
	}

	fn create(&self, ctx: &Rc<ComponentContext>) -> Rc<dyn Component> {
		let Some(factory) = self.factory else {
			panic!("component class {:?} is abstract and cannot be instantiated", self.meta.id);
		};
		factory(ctx)
	}
}

impl core::fmt::Debug for ClassStaticInfo {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("ClassStaticInfo")
			.field("id", &self.meta.id)
			.field("concrete", &self.factory.is_some())
			.finish()
	}
}

/// Untyped registration surface shared by abstract and concrete builders.
///
/// Each `register` method inserts into the local layer of the corresponding
/// cascading map and returns `false` if the id is already taken locally;
/// duplicate registration is an authoring mistake, so the first
/// registration is kept and the mistake is caught early.
pub struct BaseInfoBuilder {
	meta: ClassMeta,
	attrs: CascadeMap<Box<str>, Arc<AttrDef>>,
	ifaces: CascadeMap<Box<str>, InterfaceDef>,
	subs: CascadeMap<Box<str>, Rc<dyn StaticInfo>>,
}

impl BaseInfoBuilder {
	/// Starts building a root static info.
	pub fn new(meta: ClassMeta) -> Self {
		Self::with_parents(meta, None)
	}

	/// Starts building a static info deriving from a base class.
	pub fn with_base(meta: ClassMeta, base: &Rc<ClassStaticInfo>) -> Self {
		Self::with_parents(meta, Some(base))
	}

	fn with_parents(meta: ClassMeta, base: Option<&Rc<ClassStaticInfo>>) -> Self {
		match base {
			None => Self {
				meta,
				attrs: CascadeMap::new(),
				ifaces: CascadeMap::new(),
				subs: CascadeMap::new(),
			},
			Some(base) => Self {
				meta,
				attrs: CascadeMap::with_parent(base.attrs.clone()),
				ifaces: CascadeMap::with_parent(base.ifaces.clone()),
				subs: CascadeMap::with_parent(base.subs.clone()),
			},
		}
	}

	/// Registers an attribute descriptor.
	pub fn attribute(&mut self, def: AttrDef) -> bool {
		let id = def.id().to_string();
		let inserted = self.attrs.insert_local(Box::from(&*id), Arc::new(def));
		if !inserted {
			tracing::warn!(
				domain = "component",
				class = &*self.meta.id,
				attribute = %id,
				"duplicate attribute registration ignored",
			);
		}
		inserted
	}

	/// Registers an interface marker for static capability checks.
	pub fn interface_tag<I: ?Sized + 'static>(&mut self, name: &'static str) -> bool {
		self.register_interface(InterfaceDef::tag::<I>(name))
	}

	/// Registers a sub-component slot.
	pub fn subcomponent(&mut self, id: &str, info: Rc<dyn StaticInfo>) -> bool {
		let inserted = self.subs.insert_local(Box::from(id), info);
		if !inserted {
			tracing::warn!(
				domain = "component",
				class = &*self.meta.id,
				slot = id,
				"duplicate sub-component registration ignored",
			);
		}
		inserted
	}

	/// Freezes into an abstract static info; [`StaticInfo::create`] panics.
	pub fn build(self) -> Rc<ClassStaticInfo> {
		Rc::new(self.freeze(None))
	}

	fn register_interface(&mut self, def: InterfaceDef) -> bool {
		let name = def.name;
		let inserted = self.ifaces.insert_local(Box::from(name), def);
		if !inserted {
			tracing::warn!(
				domain = "component",
				class = &*self.meta.id,
				interface = name,
				"duplicate interface registration ignored",
			);
		}
		inserted
	}

	fn freeze(self, factory: Option<ComponentFactory>) -> ClassStaticInfo {
		ClassStaticInfo {
			meta: self.meta,
			attrs: Arc::new(self.attrs),
			ifaces: Arc::new(self.ifaces),
			subs: Arc::new(self.subs),
			factory,
		}
	}
}

/// Typed registration surface driven by [`ComponentDescriptor::describe`].
pub struct ClassInfoBuilder<C: ComponentDescriptor> {
	inner: BaseInfoBuilder,
	marker: std::marker::PhantomData<fn() -> C>,
}

impl<C: ComponentDescriptor> ClassInfoBuilder<C> {
	/// Registers an attribute descriptor.
	pub fn attribute(&mut self, def: AttrDef) -> bool {
		self.inner.attribute(def)
	}

	/// Registers a supported interface with its caster.
	///
	/// The cast function is usually just `|c| c`, relying on the unsize
	/// coercion from the concrete class to the interface trait object.
	pub fn interface<I: ?Sized + 'static>(&mut self, name: &'static str, cast: fn(Rc<C>) -> Rc<I>) -> bool {
		let caster = move |component: &Rc<dyn Component>| -> Option<Box<dyn Any>> {
			let concrete = component.clone().as_any_rc().downcast::<C>().ok()?;
			Some(Box::new(cast(concrete)) as Box<dyn Any>)
		};
		self.inner.register_interface(InterfaceDef::new::<I>(name, Box::new(caster)))
	}

	/// Registers a sub-component slot.
	pub fn subcomponent(&mut self, id: &str, info: Rc<dyn StaticInfo>) -> bool {
		self.inner.subcomponent(id, info)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::component::{ComponentBase, ComponentDescriptor};
	use crate::context::ComponentContext;
	use crate::env::EnvBuilder;

	trait Labeled {}

	struct Widget {
		base: ComponentBase,
	}

	impl Labeled for Widget {}

	impl ComponentDescriptor for Widget {
		fn describe(info: &mut ClassInfoBuilder<Self>) {
			info.attribute(AttrDef::int("X", "Shadows the base attribute", || 10));
			info.attribute(AttrDef::text("Title", "Widget title", String::new));
			info.interface::<dyn Labeled>("Labeled", |c| c);
		}

		fn create(ctx: &Rc<ComponentContext>) -> Self {
			Self {
				base: ComponentBase::new(ctx),
			}
		}

		fn base(&self) -> &ComponentBase {
			&self.base
		}
	}

	fn base_info() -> Rc<ClassStaticInfo> {
		let mut builder = BaseInfoBuilder::new(ClassMeta::new("WidgetBase", "Abstract widget", ""));
		assert!(builder.attribute(AttrDef::int("X", "Base attribute", || 1)));
		assert!(builder.attribute(AttrDef::int("Y", "Base-only attribute", || 2)));
		assert!(builder.interface_tag::<dyn Labeled>("Labeled"));
		builder.build()
	}

	#[test]
	fn duplicate_attribute_registration_is_rejected() {
		let mut builder = BaseInfoBuilder::new(ClassMeta::minimal("Dup"));
		assert!(builder.attribute(AttrDef::int("X", "first", || 1)));
		assert!(!builder.attribute(AttrDef::int("X", "second", || 2)));

		// The first registration is kept.
		let info = builder.build();
		let def = info.attribute("X").unwrap();
		assert_eq!(def.description(), "first");
	}

	#[test]
	fn derived_class_shadows_base_attributes() {
		let base = base_info();
		let derived = ClassStaticInfo::derived::<Widget>(ClassMeta::minimal("Widget"), &base);

		// The derived registration wins for "X".
		let x = derived.attribute("X").unwrap();
		assert_eq!(x.default().instantiate().as_int(), Some(10));

		// The base-only attribute stays visible through the chain.
		let y = derived.attribute("Y").unwrap();
		assert_eq!(y.default().instantiate().as_int(), Some(2));

		// The base itself is untouched.
		assert_eq!(base.attribute("X").unwrap().default().instantiate().as_int(), Some(1));

		let ids = derived.attribute_ids();
		assert_eq!(ids, vec!["X", "Title", "Y"]);
	}

	#[test]
	fn interface_lookup_by_name_and_type() {
		let info = ClassStaticInfo::of::<Widget>(ClassMeta::minimal("Widget"));

		assert!(info.interface("Labeled").is_some());
		assert!(info.interface("Unknown").is_none());

		let def = info.interface_by_type(TypeId::of::<dyn Labeled>()).unwrap();
		assert_eq!(def.name(), "Labeled");
		assert!(info.interface_by_type(TypeId::of::<dyn Any>()).is_none());

		assert_eq!(info.interface_ids(), vec![("Labeled", TypeId::of::<dyn Labeled>())]);
	}

	#[test]
	fn derived_caster_shadows_base_marker() {
		let base = base_info();
		let derived = ClassStaticInfo::derived::<Widget>(ClassMeta::minimal("Widget"), &base);

		// Both layers declare the interface, but only one entry is visible.
		assert_eq!(derived.interface_ids().len(), 1);
		assert!(derived.interface("Labeled").is_some());
	}

	#[test]
	fn subcomponent_registration() {
		let widget = ClassStaticInfo::of::<Widget>(ClassMeta::minimal("Widget"));
		let mut builder = BaseInfoBuilder::new(ClassMeta::minimal("Panel"));
		assert!(builder.subcomponent("Child", widget.clone()));
		assert!(!builder.subcomponent("Child", widget));

		let info = builder.build();
		assert!(info.subcomponent_info("Child").is_some());
		assert!(info.subcomponent_info("Other").is_none());
		assert_eq!(info.subcomponent_ids(), vec![Box::from("Child")]);
	}

	#[test]
	#[should_panic(expected = "abstract and cannot be instantiated")]
	fn abstract_create_panics() {
		let base = base_info();
		assert!(!base.is_concrete());

		let env = EnvBuilder::new().build();
		let element = armature_registry::RegistryElement::builder("test.WidgetBase".parse().unwrap()).build();
		let ctx = ComponentContext::root(element, base.clone(), &env);
		let _ = base.create(&ctx);
	}
}
