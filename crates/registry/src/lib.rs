//! Declarative component wiring.
//!
//! This crate holds the configuration side of the component runtime: typed
//! attribute values, cascading (layered) maps, component addresses, registry
//! elements, and registries, plus the JSON document loader. The runtime that
//! consumes this data lives in `armature-component`.

pub mod address;
pub mod cascade;
pub mod element;
pub mod error;
pub mod loader;
pub mod registry;
pub mod value;

pub use address::{ComponentAddress, split_component_path};
pub use cascade::CascadeMap;
pub use element::{AttrBinding, ElementFlags, RegistryElement, RegistryElementBuilder};
pub use error::{AddressParseError, LoadError};
pub use loader::{
	PackageLoadReport, RegistryDoc, load_package_dir, load_registry_file, parse_registry_str,
	registry_to_string,
};
pub use registry::Registry;
pub use value::{AttrDefault, AttrType, AttrValue};
