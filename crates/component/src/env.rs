//! The component environment: explicit process-wide state.
//!
//! An [`Env`] owns everything needed to create components: the registered
//! component classes of real packages, the registries of composed packages,
//! and the interface name table used by composite exports. It is built once
//! at startup through [`EnvBuilder`] and injected into whatever assembles
//! object graphs; there is no global registry and no implicit first-use
//! initialization.

use std::any::TypeId;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use armature_registry::{
	ComponentAddress, PackageLoadReport, Registry, RegistryElement, load_package_dir,
};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::component::Component;
use crate::composite::CompositeStaticInfo;
use crate::context::ComponentContext;
use crate::error::EnvError;
use crate::info::{BaseInfoBuilder, ClassMeta, ClassStaticInfo, StaticInfo};

/// What kind of package an id denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
	/// Compiled-in component classes.
	Real,
	/// A directory of registry documents describing composites.
	Composed,
	/// Not registered.
	Unknown,
}

/// Builder for [`Env`].
pub struct EnvBuilder {
	packages: FxHashMap<Box<str>, BaseInfoBuilder>,
	registries: FxHashMap<ComponentAddress, Arc<Registry>>,
	composed: FxHashSet<Box<str>>,
	interface_names: FxHashMap<TypeId, &'static str>,
}

impl EnvBuilder {
	/// Creates an empty builder.
	pub fn new() -> Self {
		Self {
			packages: FxHashMap::default(),
			registries: FxHashMap::default(),
			composed: FxHashSet::default(),
			interface_names: FxHashMap::default(),
		}
	}

	/// Registers a component class in a real package.
	///
	/// The class id comes from the info's metadata. Registering the same
	/// address twice, or mixing real and composed registrations under one
	/// package id, is a configuration error.
	pub fn class(&mut self, package: &str, info: Rc<ClassStaticInfo>) -> Result<&mut Self, EnvError> {
		if self.composed.contains(package) {
			return Err(EnvError::PackageKindConflict(package.to_string()));
		}
		for (name, type_id) in info.interface_ids() {
			match self.interface_names.get(&type_id) {
				None => {
					self.interface_names.insert(type_id, name);
				}
				Some(existing) if *existing != name => {
					tracing::warn!(
						domain = "component",
						interface = name,
						existing = *existing,
						"interface type registered under two names; keeping the first",
					);
				}
				Some(_) => {}
			}
		}
		let package_info = self
			.packages
			.entry(Box::from(package))
			.or_insert_with(|| BaseInfoBuilder::new(ClassMeta::minimal(package)));
		let class_id = info.meta().id().to_string();
		if !package_info.subcomponent(&class_id, info) {
			return Err(EnvError::DuplicateClass(ComponentAddress::new(package, class_id)));
		}
		Ok(self)
	}

	/// Registers a composed registry under `package.id`.
	pub fn registry(
		&mut self,
		package: &str,
		id: &str,
		registry: Arc<Registry>,
	) -> Result<&mut Self, EnvError> {
		if self.packages.contains_key(package) {
			return Err(EnvError::PackageKindConflict(package.to_string()));
		}
		let address = ComponentAddress::new(package, id);
		if self.registries.contains_key(&address) {
			return Err(EnvError::DuplicateRegistry(address));
		}
		self.composed.insert(Box::from(package));
		self.registries.insert(address, registry);
		Ok(self)
	}

	/// Loads a composed package from a directory of registry documents.
	///
	/// File-level failures are soft and stay in the returned report; a
	/// duplicate registry address is a configuration error.
	pub fn load_composed_package(
		&mut self,
		package: &str,
		dir: &Path,
	) -> Result<PackageLoadReport, EnvError> {
		let report = load_package_dir(dir);
		for (id, registry) in &report.registries {
			self.registry(package, id, registry.clone())?;
		}
		tracing::info!(
			domain = "component",
			package,
			registries = report.registries.len(),
			failures = report.errors.len(),
			"composed package loaded",
		);
		Ok(report)
	}

	/// Freezes the environment.
	pub fn build(self) -> Rc<Env> {
		let packages = self
			.packages
			.into_iter()
			.map(|(id, builder)| (id, builder.build()))
			.collect();
		Rc::new(Env {
			packages,
			registries: self.registries,
			interface_names: self.interface_names,
			composites: RefCell::new(FxHashMap::default()),
		})
	}
}

impl Default for EnvBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Frozen component environment.
pub struct Env {
	packages: FxHashMap<Box<str>, Rc<ClassStaticInfo>>,
	registries: FxHashMap<ComponentAddress, Arc<Registry>>,
	interface_names: FxHashMap<TypeId, &'static str>,
	composites: RefCell<FxHashMap<ComponentAddress, Rc<dyn StaticInfo>>>,
}

impl Env {
	/// Returns the kind of the given package id.
	pub fn package_kind(&self, package: &str) -> PackageKind {
		if self.packages.contains_key(package) {
			return PackageKind::Real;
		}
		if self.registries.keys().any(|address| address.package() == package) {
			return PackageKind::Composed;
		}
		PackageKind::Unknown
	}

	/// Returns the package static info of a real package.
	pub fn package_info(&self, package: &str) -> Option<&Rc<ClassStaticInfo>> {
		self.packages.get(package)
	}

	/// Returns the registry registered under a composed address.
	pub fn registry(&self, address: &ComponentAddress) -> Option<&Arc<Registry>> {
		self.registries.get(address)
	}

	/// Returns the canonical name of a registered interface type.
	pub fn interface_name(&self, interface: TypeId) -> Option<&'static str> {
		self.interface_names.get(&interface).copied()
	}

	/// Resolves an address to the static info that can instantiate it.
	///
	/// Real addresses resolve to the registered class; composed addresses
	/// materialize (and cache) a composite static info over the registered
	/// registry. Unknown addresses are a soft `None`.
	pub fn static_info(self: &Rc<Self>, address: &ComponentAddress) -> Option<Rc<dyn StaticInfo>> {
		if let Some(package) = self.packages.get(address.package()) {
			return package.subcomponent_info(address.component());
		}
		if let Some(cached) = self.composites.borrow().get(address) {
			return Some(cached.clone());
		}
		let registry = self.registries.get(address)?.clone();
		let meta = ClassMeta::new(address.to_string(), registry.description(), registry.keywords());
		let info: Rc<dyn StaticInfo> = Rc::new(CompositeStaticInfo::new(meta, registry, self.clone()));
		self.composites.borrow_mut().insert(address.clone(), info.clone());
		Some(info)
	}

	/// Bootstraps an object graph: instantiates the component at `address`
	/// under a fresh root context.
	///
	/// The caller decides whether to follow up with an auto-init walk
	/// ([`CompositeComponent::ensure_auto_created`]).
	///
	/// [`CompositeComponent::ensure_auto_created`]: crate::composite::CompositeComponent::ensure_auto_created
	pub fn create_root(self: &Rc<Self>, address: &ComponentAddress) -> Option<Rc<dyn Component>> {
		let Some(info) = self.static_info(address) else {
			tracing::warn!(domain = "component", address = %address, "cannot bootstrap unknown address");
			return None;
		};
		let element = RegistryElement::builder(address.clone()).build();
		let ctx = ComponentContext::root(element, info.clone(), self);
		let component = info.create(&ctx);
		component.notify_created();
		Some(component)
	}
}

impl core::fmt::Debug for Env {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Env")
			.field("packages", &self.packages.len())
			.field("registries", &self.registries.len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::component::{ComponentBase, ComponentDescriptor, query_concrete};
	use crate::composite::CompositeComponent;
	use crate::info::ClassInfoBuilder;

	struct Dummy {
		base: ComponentBase,
	}

	impl ComponentDescriptor for Dummy {
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

	fn dummy_info(id: &str) -> Rc<ClassStaticInfo> {
		ClassStaticInfo::of::<Dummy>(ClassMeta::minimal(id))
	}

	#[test]
	fn duplicate_class_registration_is_an_error() {
		let mut builder = EnvBuilder::new();
		builder.class("base", dummy_info("Loader")).unwrap();
		let result = builder.class("base", dummy_info("Loader"));
		assert!(matches!(result, Err(EnvError::DuplicateClass(_))));
	}

	#[test]
	fn duplicate_registry_registration_is_an_error() {
		let mut builder = EnvBuilder::new();
		builder.registry("app", "Main", Arc::new(Registry::new())).unwrap();
		let result = builder.registry("app", "Main", Arc::new(Registry::new()));
		assert!(matches!(result, Err(EnvError::DuplicateRegistry(_))));
	}

	#[test]
	fn mixing_package_kinds_is_an_error() {
		let mut builder = EnvBuilder::new();
		builder.class("base", dummy_info("Loader")).unwrap();
		let result = builder.registry("base", "Main", Arc::new(Registry::new()));
		assert!(matches!(result, Err(EnvError::PackageKindConflict(_))));

		let mut builder = EnvBuilder::new();
		builder.registry("app", "Main", Arc::new(Registry::new())).unwrap();
		let result = builder.class("app", dummy_info("Loader"));
		assert!(matches!(result, Err(EnvError::PackageKindConflict(_))));
	}

	#[test]
	fn package_kinds_are_reported() {
		let mut builder = EnvBuilder::new();
		builder.class("base", dummy_info("Loader")).unwrap();
		builder.registry("app", "Main", Arc::new(Registry::new())).unwrap();
		let env = builder.build();

		assert_eq!(env.package_kind("base"), PackageKind::Real);
		assert_eq!(env.package_kind("app"), PackageKind::Composed);
		assert_eq!(env.package_kind("ghost"), PackageKind::Unknown);
	}

	#[test]
	fn static_info_resolution() {
		let mut builder = EnvBuilder::new();
		builder.class("base", dummy_info("Loader")).unwrap();
		builder.registry("app", "Main", Arc::new(Registry::new())).unwrap();
		let env = builder.build();

		let class = env.static_info(&ComponentAddress::new("base", "Loader")).unwrap();
		assert_eq!(class.meta().id(), "Loader");

		// Composite infos are materialized once and cached.
		let first = env.static_info(&ComponentAddress::new("app", "Main")).unwrap();
		let second = env.static_info(&ComponentAddress::new("app", "Main")).unwrap();
		assert!(Rc::ptr_eq(&first, &second));

		assert!(env.static_info(&ComponentAddress::new("ghost", "X")).is_none());
		assert!(env.static_info(&ComponentAddress::new("base", "X")).is_none());
	}

	#[test]
	fn create_root_for_class_and_composite() {
		let mut builder = EnvBuilder::new();
		builder.class("base", dummy_info("Loader")).unwrap();
		builder.registry("app", "Main", Arc::new(Registry::new())).unwrap();
		let env = builder.build();

		let leaf = env.create_root(&ComponentAddress::new("base", "Loader")).unwrap();
		assert!(query_concrete::<Dummy>(&leaf).is_some());

		let root = env.create_root(&ComponentAddress::new("app", "Main")).unwrap();
		assert!(query_concrete::<CompositeComponent>(&root).is_some());

		assert!(env.create_root(&ComponentAddress::new("ghost", "X")).is_none());
	}

	#[test]
	fn load_composed_package_from_directory() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(
			dir.path().join("Main.json"),
			r#"{"elements": {"Loader": {"class": "base.Loader"}}}"#,
		)
		.unwrap();
		std::fs::write(dir.path().join("broken.json"), "nope").unwrap();

		let mut builder = EnvBuilder::new();
		builder.class("base", dummy_info("Loader")).unwrap();
		let report = builder.load_composed_package("app", dir.path()).unwrap();
		assert_eq!(report.registries.len(), 1);
		assert_eq!(report.errors.len(), 1);
		let env = builder.build();

		assert_eq!(env.package_kind("app"), PackageKind::Composed);
		let root = env.create_root(&ComponentAddress::new("app", "Main")).unwrap();
		let composite = query_concrete::<CompositeComponent>(&root).unwrap();
		assert!(composite.subcomponent("Loader").is_some());
	}
}
