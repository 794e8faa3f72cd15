//! Error types for configuration parsing and loading.

use thiserror::Error;

/// A component address string that is not of the form `"package.component"`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid component address {0:?}")]
pub struct AddressParseError(pub String);

/// Errors raised while loading registry documents.
#[derive(Error, Debug)]
pub enum LoadError {
	/// Reading the document failed.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
	/// The document is not valid JSON or does not match the schema.
	#[error("parse error: {0}")]
	Parse(#[from] serde_json::Error),
	/// An element names a malformed component class address.
	#[error(transparent)]
	Address(#[from] AddressParseError),
}
