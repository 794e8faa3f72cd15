//! Typed, lazily-bound proxies embedded in component instances.
//!
//! A component declares what it needs in `describe` and binds matching
//! proxies in `create`:
//!
//! - [`AttrPtr`]: a plain configured value, resolved at bind time with a
//!   fallback to the declared default
//! - [`RefPtr`] / [`MultiRefPtr`]: find-existing, shared-instance handles
//!   to named components in the surrounding graph, resolved lazily and
//!   memoized
//! - [`FactoryPtr`]: create-on-demand, every call builds a fresh instance
//!   from the named slot's configuration
//!
//! Binding a proxy against an attribute id the class never declared, or
//! with a mismatched declared type, is a registration mistake and panics.
//! Everything configuration-dependent is soft: unresolvable references and
//! missing optional values surface as `None`/invalid, never as errors.

mod attribute;
mod factory;
mod reference;

pub use attribute::{AttrPtr, FromAttrValue};
pub use factory::FactoryPtr;
pub use reference::{MultiRefPtr, RefPtr};

use std::rc::Rc;
use std::sync::Arc;

use armature_registry::{AttrType, AttrValue};

use crate::context::ComponentContext;
use crate::info::AttrDef;

/// Looks up the declared attribute descriptor for a proxy binding.
///
/// Panics on an undeclared id or a declared-type mismatch: the descriptor's
/// `describe` and `create` disagree, which cannot be fixed by configuration.
fn declared_attr(ctx: &Rc<ComponentContext>, id: &str, expected: AttrType) -> Arc<AttrDef> {
	let info = ctx.static_info();
	let Some(def) = info.attribute(id).cloned() else {
		panic!(
			"attribute {:?} is not declared on component class {:?}",
			id,
			info.meta().id()
		);
	};
	if def.value_type() != expected {
		panic!(
			"attribute {:?} on component class {:?} is declared as {} but bound as {}",
			id,
			info.meta().id(),
			def.value_type().name(),
			expected.name()
		);
	}
	def
}

/// Extracts a reference target id from a configured value.
///
/// `Text` is accepted alongside `Ref`: export fallbacks round-tripped
/// through documents carry reference ids as plain text.
fn ref_target(value: &AttrValue) -> Option<&str> {
	match value {
		AttrValue::Ref(id) | AttrValue::Text(id) => Some(id),
		_ => None,
	}
}

/// Extracts a reference target list from a configured value.
fn ref_targets(value: &AttrValue) -> Option<&[String]> {
	match value {
		AttrValue::RefList(ids) | AttrValue::TextList(ids) => Some(ids),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use std::rc::Rc;

	use armature_registry::RegistryElement;

	use super::*;
	use crate::component::{ComponentBase, ComponentDescriptor};
	use crate::env::EnvBuilder;
	use crate::info::{ClassInfoBuilder, ClassMeta, ClassStaticInfo};

	struct Sample {
		base: ComponentBase,
	}

	impl ComponentDescriptor for Sample {
		fn describe(info: &mut ClassInfoBuilder<Self>) {
			info.attribute(AttrDef::int("Count", "Sample count", || 4));
			info.attribute(AttrDef::text("Name", "Display name", || "unnamed".to_string()));
			info.attribute(AttrDef::bool("Flag", "Feature toggle", || true));
			info.attribute(AttrDef::int("Must", "Required value", || 0).obligatory());
			info.attribute(AttrDef::reference("Target", "Linked component"));
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

	fn sample_context(element: Arc<RegistryElement>) -> Rc<ComponentContext> {
		let env = EnvBuilder::new().build();
		let info = ClassStaticInfo::of::<Sample>(ClassMeta::minimal("Sample"));
		ComponentContext::root(element, info, &env)
	}

	fn element() -> armature_registry::RegistryElementBuilder {
		RegistryElement::builder("test.Sample".parse().unwrap())
	}

	#[test]
	fn configured_value_wins_over_default() {
		let ctx = sample_context(element().attr("Count", 9i64).build());
		let count = AttrPtr::<i64>::bind(&ctx, "Count");
		assert!(count.is_valid());
		assert_eq!(*count, 9);
	}

	#[test]
	fn unconfigured_attribute_falls_back_to_default() {
		let ctx = sample_context(element().build());

		let count = AttrPtr::<i64>::bind(&ctx, "Count");
		assert_eq!(*count, 4);

		let name = AttrPtr::<String>::bind(&ctx, "Name");
		assert_eq!(&*name, "unnamed");

		let flag = AttrPtr::<bool>::bind(&ctx, "Flag");
		assert!(*flag);
	}

	#[test]
	fn type_mismatch_falls_back_to_default() {
		// "Count" is declared as int but configured as text.
		let ctx = sample_context(element().attr("Count", "nine").build());
		let count = AttrPtr::<i64>::bind(&ctx, "Count");
		assert!(count.is_valid());
		assert_eq!(*count, 4);
	}

	#[test]
	fn obligatory_attribute_without_value_is_invalid() {
		let ctx = sample_context(element().build());
		let must = AttrPtr::<i64>::bind(&ctx, "Must");
		assert!(!must.is_valid());
		assert_eq!(must.get(), None);
	}

	#[test]
	fn obligatory_attribute_with_value_is_valid() {
		let ctx = sample_context(element().attr("Must", 5i64).build());
		let must = AttrPtr::<i64>::bind(&ctx, "Must");
		assert!(must.is_valid());
		assert_eq!(*must, 5);
	}

	#[test]
	#[should_panic(expected = "obligatory attribute")]
	fn deref_of_invalid_attr_panics() {
		let ctx = sample_context(element().build());
		let must = AttrPtr::<i64>::bind(&ctx, "Must");
		let _ = *must;
	}

	#[test]
	#[should_panic(expected = "is not declared")]
	fn binding_an_undeclared_attribute_panics() {
		let ctx = sample_context(element().build());
		let _ = AttrPtr::<i64>::bind(&ctx, "Nope");
	}

	#[test]
	#[should_panic(expected = "declared as int but bound as text")]
	fn binding_with_mismatched_declared_type_panics() {
		let ctx = sample_context(element().build());
		let _ = AttrPtr::<String>::bind(&ctx, "Count");
	}

	#[test]
	fn unresolvable_reference_is_soft() {
		struct NoIface;
		let ctx = sample_context(element().attr("Target", AttrValue::Ref("Gone".into())).build());
		let target = RefPtr::<NoIface>::bind(&ctx, "Target");

		// Configured but the root context has no parent graph to search.
		assert_eq!(target.target_id(), Some("Gone"));
		assert!(!target.is_valid());
		assert!(target.component().is_none());
	}

	#[test]
	fn unconfigured_reference_is_soft() {
		struct NoIface;
		let ctx = sample_context(element().build());
		let target = RefPtr::<NoIface>::bind(&ctx, "Target");
		assert_eq!(target.target_id(), None);
		assert!(!target.is_valid());
	}
}
