//! Component runtime: assemble object graphs from declarative registries.
//!
//! Component classes declare typed metadata (configurable attributes,
//! supported interfaces, sub-component slots) through a per-class
//! [`ComponentDescriptor`]. Registries (see `armature-registry`) describe
//! which classes to build and how to wire them; the runtime here turns that
//! configuration into live object graphs with lazy, memoized cross-component
//! references.
//!
//! The moving parts, bottom up:
//!
//! - [`info`]: static per-class metadata with single-parent inheritance
//! - [`component`]: the component trait, descriptors, interface queries
//! - [`context`]: element-to-code binding and attribute resolution
//! - [`proxy`]: typed lazily-bound attribute/reference/factory proxies
//! - [`composite`]: object graphs built from nested registries
//! - [`env`]: the explicit environment everything is created through
//!
//! Soft failures (missing attributes, unresolvable references, unconfigured
//! slots) surface as `None`/invalid results for the caller to branch on;
//! panics are reserved for registration mistakes in component code.

pub mod component;
pub mod composite;
pub mod context;
pub mod env;
pub mod error;
pub mod info;
pub mod proxy;

pub use component::{
	Component, ComponentBase, ComponentDescriptor, ComponentWrap, query_concrete, query_interface,
};
pub use composite::{CompositeComponent, CompositeStaticInfo};
pub use context::{ComponentContext, ResolvedAttr};
pub use env::{Env, EnvBuilder, PackageKind};
pub use error::EnvError;
pub use info::{
	AttrDef, BaseInfoBuilder, ClassInfoBuilder, ClassMeta, ClassStaticInfo, ComponentFactory,
	InterfaceDef, StaticInfo,
};
pub use proxy::{AttrPtr, FactoryPtr, FromAttrValue, MultiRefPtr, RefPtr};
