//! Component addressing.

use std::str::FromStr;

use crate::error::AddressParseError;

/// Address of a component class: a package id plus a component id.
///
/// Rendered as `"package.component"`. The package id never contains a dot;
/// the component id may (composite exports use dotted sub-paths).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentAddress {
	package: String,
	component: String,
}

impl ComponentAddress {
	/// Creates an address from its parts.
	pub fn new(package: impl Into<String>, component: impl Into<String>) -> Self {
		Self {
			package: package.into(),
			component: component.into(),
		}
	}

	/// Returns the package id.
	pub fn package(&self) -> &str {
		&self.package
	}

	/// Returns the component id within the package.
	pub fn component(&self) -> &str {
		&self.component
	}
}

impl core::fmt::Display for ComponentAddress {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		write!(f, "{}.{}", self.package, self.component)
	}
}

impl FromStr for ComponentAddress {
	type Err = AddressParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.split_once('.') {
			Some((package, component)) if !package.is_empty() && !component.is_empty() => {
				Ok(Self::new(package, component))
			}
			_ => Err(AddressParseError(s.to_string())),
		}
	}
}

/// Splits a dotted component path into its head id and the remaining path.
///
/// `"Painter"` → `("Painter", "")`, `"Gui.StatusBar.Label"` →
/// `("Gui", "StatusBar.Label")`.
pub fn split_component_path(full: &str) -> (&str, &str) {
	match full.split_once('.') {
		Some((head, rest)) => (head, rest),
		None => (full, ""),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_and_display_round_trip() {
		let addr: ComponentAddress = "base.FileLoader".parse().unwrap();
		assert_eq!(addr.package(), "base");
		assert_eq!(addr.component(), "FileLoader");
		assert_eq!(addr.to_string(), "base.FileLoader");
	}

	#[test]
	fn component_id_keeps_trailing_dots() {
		let addr: ComponentAddress = "app.Gui.StatusBar".parse().unwrap();
		assert_eq!(addr.package(), "app");
		assert_eq!(addr.component(), "Gui.StatusBar");
	}

	#[test]
	fn rejects_malformed_addresses() {
		assert!("nodot".parse::<ComponentAddress>().is_err());
		assert!(".Component".parse::<ComponentAddress>().is_err());
		assert!("pkg.".parse::<ComponentAddress>().is_err());
	}

	#[test]
	fn path_splitting() {
		assert_eq!(split_component_path("Painter"), ("Painter", ""));
		assert_eq!(split_component_path("Gui.Status.Label"), ("Gui", "Status.Label"));
	}
}
