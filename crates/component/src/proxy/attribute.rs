//! Plain value proxies.

use std::ops::Deref;
use std::rc::Rc;
use std::sync::Arc;

use armature_registry::{AttrType, AttrValue};

use super::declared_attr;
use crate::context::ComponentContext;
use crate::info::AttrDef;

// Seal the FromAttrValue trait to the value types the runtime understands.
mod sealed {
	pub trait Sealed {}
	impl Sealed for bool {}
	impl Sealed for i64 {}
	impl Sealed for f64 {}
	impl Sealed for String {}
	impl Sealed for Vec<String> {}
}

/// Trait for Rust types that can back an [`AttrPtr`].
pub trait FromAttrValue: sealed::Sealed + Sized {
	/// Extracts the value, returning `None` on a variant mismatch.
	fn from_attr(value: &AttrValue) -> Option<Self>;

	/// Returns the [`AttrType`] corresponding to this Rust type.
	fn attr_type() -> AttrType;
}

impl FromAttrValue for bool {
	fn from_attr(value: &AttrValue) -> Option<Self> {
		value.as_bool()
	}

	fn attr_type() -> AttrType {
		AttrType::Bool
	}
}

impl FromAttrValue for i64 {
	fn from_attr(value: &AttrValue) -> Option<Self> {
		value.as_int()
	}

	fn attr_type() -> AttrType {
		AttrType::Int
	}
}

impl FromAttrValue for f64 {
	fn from_attr(value: &AttrValue) -> Option<Self> {
		value.as_real()
	}

	fn attr_type() -> AttrType {
		AttrType::Real
	}
}

impl FromAttrValue for String {
	fn from_attr(value: &AttrValue) -> Option<Self> {
		value.as_str().map(str::to_string)
	}

	fn attr_type() -> AttrType {
		AttrType::Text
	}
}

impl FromAttrValue for Vec<String> {
	fn from_attr(value: &AttrValue) -> Option<Self> {
		value.as_text_list().map(<[String]>::to_vec)
	}

	fn attr_type() -> AttrType {
		AttrType::TextList
	}
}

/// Typed proxy for a plain configured value.
///
/// Resolution happens at bind time: the configured value wins, a missing or
/// type-mismatched value falls back to the declared default, and an
/// obligatory attribute without a configured value leaves the proxy
/// invalid. Mismatches are logged, never raised.
pub struct AttrPtr<T> {
	def: Arc<AttrDef>,
	value: Option<T>,
}

impl<T: FromAttrValue> AttrPtr<T> {
	/// Binds the proxy to the owning context's attribute `id`.
	pub fn bind(ctx: &Rc<ComponentContext>, id: &str) -> Self {
		let def = declared_attr(ctx, id, T::attr_type());
		let value = match ctx.attribute(id) {
			Some(resolved) => match T::from_attr(&resolved.value) {
				Some(value) => Some(value),
				None => {
					tracing::warn!(
						domain = "component",
						attribute = id,
						expected = T::attr_type().name(),
						got = resolved.value.type_name(),
						"attribute type mismatch; falling back to default",
					);
					Self::fallback(&def)
				}
			},
			None => Self::fallback(&def),
		};
		if value.is_none() {
			tracing::debug!(domain = "component", attribute = id, "obligatory attribute not configured");
		}
		Self { def, value }
	}

	fn fallback(def: &AttrDef) -> Option<T> {
		if def.is_obligatory() {
			return None;
		}
		T::from_attr(&def.default().instantiate())
	}

	/// Returns true if a value is available.
	pub fn is_valid(&self) -> bool {
		self.value.is_some()
	}

	/// Returns the value, if available.
	pub fn get(&self) -> Option<&T> {
		self.value.as_ref()
	}

	/// Returns the attribute descriptor.
	pub fn def(&self) -> &AttrDef {
		&self.def
	}
}

impl<T: FromAttrValue> Deref for AttrPtr<T> {
	type Target = T;

	fn deref(&self) -> &T {
		match &self.value {
			Some(value) => value,
			None => panic!("obligatory attribute {:?} not configured", self.def.id()),
		}
	}
}

impl<T: FromAttrValue + core::fmt::Debug> core::fmt::Debug for AttrPtr<T> {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("AttrPtr")
			.field("id", &self.def.id())
			.field("value", &self.value)
			.finish()
	}
}
