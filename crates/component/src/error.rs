//! Environment construction errors.

use armature_registry::ComponentAddress;
use thiserror::Error;

/// Errors raised while building a component environment.
///
/// These are configuration-phase failures; the assembled runtime itself
/// reports misses as `None`/invalid results instead of errors.
#[derive(Error, Debug)]
pub enum EnvError {
	/// A component class was registered twice under the same address.
	#[error("duplicate component class {0}")]
	DuplicateClass(ComponentAddress),
	/// A composed registry was registered twice under the same address.
	#[error("duplicate registry {0}")]
	DuplicateRegistry(ComponentAddress),
	/// A package id is used both as a real and as a composed package.
	#[error("package {0:?} is already registered with a different kind")]
	PackageKindConflict(String),
}
