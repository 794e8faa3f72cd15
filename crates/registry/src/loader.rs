//! Registry document loading.
//!
//! The on-disk encoding of a registry is JSON. The document model below
//! mirrors the in-memory model one-to-one; [`parse_registry_str`] and
//! [`registry_to_string`] convert between the two, and [`load_package_dir`]
//! pulls a whole composed package (a directory of `*.json` registry files)
//! with per-file soft-failure collection.
//!
//! Prototype chains are an in-memory construct and are not expressed in
//! documents; a registry built by this loader always round-trips losslessly.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::address::ComponentAddress;
use crate::element::{AttrBinding, RegistryElement};
use crate::error::LoadError;
use crate::registry::Registry;
use crate::value::AttrValue;

/// Top-level registry document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryDoc {
	/// Human-readable registry description.
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub description: String,
	/// Search keywords.
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub keywords: String,
	/// Elements keyed by slot id, in document order.
	#[serde(default)]
	pub elements: IndexMap<String, ElementDoc>,
	/// Outward-facing component id → element id.
	#[serde(default, skip_serializing_if = "IndexMap::is_empty")]
	pub export_components: IndexMap<String, String>,
	/// Interface name → providing element path.
	#[serde(default, skip_serializing_if = "IndexMap::is_empty")]
	pub export_interfaces: IndexMap<String, String>,
}

/// One element record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementDoc {
	/// Component class address, `"package.component"`.
	pub class: String,
	/// Instantiate during the parent's auto-init walk.
	#[serde(default, skip_serializing_if = "core::ops::Not::not")]
	pub auto_init: bool,
	/// Attribute bindings.
	#[serde(default, skip_serializing_if = "IndexMap::is_empty")]
	pub attributes: IndexMap<String, AttrDoc>,
	/// Nested registry for composite elements.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub registry: Option<Box<RegistryDoc>>,
}

/// One attribute binding in a document.
///
/// Accepted forms, tried in order:
/// - `{"export": "AppColor"}` or `{"export": "AppColor", "value": "red"}`
/// - `{"ref": "Painter"}` / `{"refs": ["A", "B"]}`
/// - a plain scalar: `true`, `3`, `2.5`, `"red"`, `["a", "b"]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrDoc {
	/// Binding redirected to the enclosing scope, with optional fallback.
	Export {
		/// Id resolved against the enclosing context.
		export: String,
		/// Local fallback value.
		#[serde(default, skip_serializing_if = "Option::is_none")]
		value: Option<ScalarDoc>,
	},
	/// Reference to a sibling component.
	Ref {
		/// Referenced component id.
		#[serde(rename = "ref")]
		reference: String,
	},
	/// Ordered list of component references.
	Refs {
		/// Referenced component ids.
		refs: Vec<String>,
	},
	/// Plain local value.
	Value(ScalarDoc),
}

/// A scalar attribute value in a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarDoc {
	/// Boolean value.
	Bool(bool),
	/// Integer value.
	Int(i64),
	/// Floating-point value.
	Real(f64),
	/// String value.
	Text(String),
	/// List of strings.
	TextList(Vec<String>),
}

impl From<ScalarDoc> for AttrValue {
	fn from(doc: ScalarDoc) -> Self {
		match doc {
			ScalarDoc::Bool(v) => AttrValue::Bool(v),
			ScalarDoc::Int(v) => AttrValue::Int(v),
			ScalarDoc::Real(v) => AttrValue::Real(v),
			ScalarDoc::Text(v) => AttrValue::Text(v),
			ScalarDoc::TextList(v) => AttrValue::TextList(v),
		}
	}
}

impl AttrDoc {
	fn into_binding(self) -> AttrBinding {
		match self {
			AttrDoc::Export { export, value: Some(value) } => {
				AttrBinding::exported_value(value.into(), export)
			}
			AttrDoc::Export { export, value: None } => AttrBinding::export(export),
			AttrDoc::Ref { reference } => AttrBinding::value(AttrValue::Ref(reference)),
			AttrDoc::Refs { refs } => AttrBinding::value(AttrValue::RefList(refs)),
			AttrDoc::Value(value) => AttrBinding::value(value.into()),
		}
	}

	fn from_binding(binding: &AttrBinding) -> Option<Self> {
		let value = binding.local_value().map(|value| match value {
			AttrValue::Bool(v) => ScalarDoc::Bool(*v),
			AttrValue::Int(v) => ScalarDoc::Int(*v),
			AttrValue::Real(v) => ScalarDoc::Real(*v),
			AttrValue::Text(v) => ScalarDoc::Text(v.clone()),
			AttrValue::TextList(v) => ScalarDoc::TextList(v.clone()),
			AttrValue::Ref(v) => ScalarDoc::Text(v.clone()),
			AttrValue::RefList(v) => ScalarDoc::TextList(v.clone()),
		});
		match (binding.export_id(), binding.local_value()) {
			(Some(export), _) => Some(AttrDoc::Export {
				export: export.to_string(),
				value,
			}),
			(None, Some(AttrValue::Ref(id))) => Some(AttrDoc::Ref {
				reference: id.clone(),
			}),
			(None, Some(AttrValue::RefList(ids))) => Some(AttrDoc::Refs { refs: ids.clone() }),
			(None, Some(_)) => value.map(AttrDoc::Value),
			(None, None) => None,
		}
	}
}

impl RegistryDoc {
	/// Converts the document into a frozen [`Registry`].
	pub fn into_registry(self) -> Result<Registry, LoadError> {
		let mut registry = Registry::new();
		registry.set_description(self.description);
		registry.set_keywords(self.keywords);

		for (id, doc) in self.elements {
			let class: ComponentAddress = doc.class.parse()?;
			let mut builder = RegistryElement::builder(class);
			if doc.auto_init {
				builder = builder.auto_init();
			}
			for (attr_id, attr) in doc.attributes {
				builder = builder.binding(&attr_id, attr.into_binding());
			}
			if let Some(nested) = doc.registry {
				builder = builder.registry(Arc::new(nested.into_registry()?));
			}
			registry.insert_element(&id, builder.build());
		}

		for (export_id, element_id) in self.export_components {
			registry.set_component_exported(&export_id, &element_id);
		}
		for (interface, target) in self.export_interfaces {
			registry.set_interface_exported(&interface, &target);
		}

		Ok(registry)
	}

	/// Captures a registry as a document.
	///
	/// Only local attribute bindings are captured; prototype-inherited
	/// bindings belong to the prototype's own document.
	pub fn from_registry(registry: &Registry) -> Self {
		let mut doc = RegistryDoc {
			description: registry.description().to_string(),
			keywords: registry.keywords().to_string(),
			..Default::default()
		};
		for (id, element) in registry.elements() {
			let mut element_doc = ElementDoc {
				class: element.class().to_string(),
				auto_init: element.is_auto_init(),
				attributes: IndexMap::new(),
				registry: element
					.registry()
					.map(|nested| Box::new(RegistryDoc::from_registry(nested))),
			};
			for (attr_id, binding) in element.attributes().iter() {
				if let Some(attr_doc) = AttrDoc::from_binding(binding) {
					element_doc.attributes.insert(attr_id.to_string(), attr_doc);
				}
			}
			doc.elements.insert(id.to_string(), element_doc);
		}
		for (export_id, element_id) in registry.exported_components() {
			doc.export_components.insert(export_id.to_string(), element_id.to_string());
		}
		for (interface, target) in registry.exported_interfaces() {
			doc.export_interfaces.insert(interface.to_string(), target.to_string());
		}
		doc
	}
}

/// Parses a registry from its JSON document form.
pub fn parse_registry_str(content: &str) -> Result<Registry, LoadError> {
	let doc: RegistryDoc = serde_json::from_str(content)?;
	doc.into_registry()
}

/// Serializes a registry to its JSON document form.
pub fn registry_to_string(registry: &Registry) -> Result<String, LoadError> {
	Ok(serde_json::to_string_pretty(&RegistryDoc::from_registry(registry))?)
}

/// Loads a single registry file.
pub fn load_registry_file(path: &Path) -> Result<Registry, LoadError> {
	let content = std::fs::read_to_string(path)?;
	parse_registry_str(&content)
}

/// Aggregate result of loading a composed package directory.
#[derive(Debug, Default)]
pub struct PackageLoadReport {
	/// Successfully loaded registries, keyed by file stem, in name order.
	pub registries: Vec<(String, Arc<Registry>)>,
	/// File read or parse failures keyed by source file path.
	pub errors: Vec<(PathBuf, LoadError)>,
}

/// Loads every `*.json` registry file in a directory.
///
/// Files are visited in name order and each file's id is its stem. A
/// malformed file is recorded in the report and never aborts the walk.
pub fn load_package_dir(dir: &Path) -> PackageLoadReport {
	let mut report = PackageLoadReport::default();

	let entries = match std::fs::read_dir(dir) {
		Ok(entries) => entries,
		Err(error) => {
			report.errors.push((dir.to_path_buf(), error.into()));
			return report;
		}
	};

	let mut paths: Vec<PathBuf> = entries
		.filter_map(|entry| entry.ok().map(|e| e.path()))
		.filter(|path| path.extension().is_some_and(|ext| ext == "json"))
		.collect();
	paths.sort();

	for path in paths {
		let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
			continue;
		};
		match load_registry_file(&path) {
			Ok(registry) => {
				tracing::debug!(
					domain = "registry",
					id = stem,
					elements = registry.len(),
					"registry loaded",
				);
				report.registries.push((stem.to_string(), Arc::new(registry)));
			}
			Err(error) => {
				tracing::warn!(domain = "registry", path = %path.display(), error = %error, "registry load failed");
				report.errors.push((path, error));
			}
		}
	}

	report
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_minimal_document() {
		let registry = parse_registry_str(r#"{"elements": {}}"#).unwrap();
		assert!(registry.is_empty());
	}

	#[test]
	fn parse_attribute_forms() {
		let registry = parse_registry_str(
			r#"{
				"elements": {
					"Painter": {
						"class": "gfx.Painter",
						"attributes": {
							"Color": "red",
							"Width": 3,
							"Opacity": 0.5,
							"Enabled": true,
							"Tags": ["fill", "stroke"],
							"Backend": {"ref": "GlBackend"},
							"Layers": {"refs": ["Base", "Overlay"]},
							"Dpi": {"export": "AppDpi"},
							"Font": {"export": "AppFont", "value": "mono"}
						}
					}
				}
			}"#,
		)
		.unwrap();

		let element = registry.element("Painter").unwrap();
		let attr = |id: &str| element.attribute(id).unwrap();

		assert_eq!(attr("Color").local_value(), Some(&AttrValue::Text("red".into())));
		assert_eq!(attr("Width").local_value(), Some(&AttrValue::Int(3)));
		assert_eq!(attr("Opacity").local_value(), Some(&AttrValue::Real(0.5)));
		assert_eq!(attr("Enabled").local_value(), Some(&AttrValue::Bool(true)));
		assert_eq!(
			attr("Tags").local_value(),
			Some(&AttrValue::TextList(vec!["fill".into(), "stroke".into()]))
		);
		assert_eq!(attr("Backend").local_value(), Some(&AttrValue::Ref("GlBackend".into())));
		assert_eq!(
			attr("Layers").local_value(),
			Some(&AttrValue::RefList(vec!["Base".into(), "Overlay".into()]))
		);
		assert_eq!(attr("Dpi").export_id(), Some("AppDpi"));
		assert_eq!(attr("Dpi").local_value(), None);
		assert_eq!(attr("Font").export_id(), Some("AppFont"));
		assert_eq!(attr("Font").local_value(), Some(&AttrValue::Text("mono".into())));
	}

	#[test]
	fn parse_nested_registry_and_exports() {
		let registry = parse_registry_str(
			r#"{
				"description": "main window wiring",
				"elements": {
					"Gui": {
						"class": "app.MainGui",
						"auto_init": true,
						"registry": {
							"elements": {
								"StatusBar": {"class": "gui.StatusBar"}
							},
							"export_components": {"Status": "StatusBar"}
						}
					}
				},
				"export_interfaces": {"IGui": "Gui"}
			}"#,
		)
		.unwrap();

		assert_eq!(registry.description(), "main window wiring");
		let gui = registry.element("Gui").unwrap();
		assert!(gui.is_auto_init());
		let nested = gui.registry().unwrap();
		assert!(nested.element("StatusBar").is_some());
		assert_eq!(nested.exported_component("Status"), Some("StatusBar"));
		assert_eq!(registry.exported_interface("IGui"), Some("Gui"));
	}

	#[test]
	fn malformed_class_address_is_an_error() {
		let result = parse_registry_str(r#"{"elements": {"X": {"class": "nodot"}}}"#);
		assert!(matches!(result, Err(LoadError::Address(_))));
	}

	#[test]
	fn document_round_trip() {
		let source = r#"{
			"description": "demo",
			"elements": {
				"Painter": {
					"class": "gfx.Painter",
					"auto_init": true,
					"attributes": {
						"Color": {"export": "AppColor", "value": "red"},
						"Width": 3,
						"Backend": {"ref": "GlBackend"}
					},
					"registry": {
						"elements": {"Cache": {"class": "gfx.TileCache"}}
					}
				}
			},
			"export_components": {"Paint": "Painter"},
			"export_interfaces": {"IPainter": "Painter"}
		}"#;

		let registry = parse_registry_str(source).unwrap();
		let serialized = registry_to_string(&registry).unwrap();
		let reparsed = parse_registry_str(&serialized).unwrap();

		let element = reparsed.element("Painter").unwrap();
		assert!(element.is_auto_init());
		assert_eq!(element.attribute("Color").unwrap().export_id(), Some("AppColor"));
		assert_eq!(
			element.attribute("Color").unwrap().local_value(),
			Some(&AttrValue::Text("red".into()))
		);
		assert_eq!(
			element.attribute("Backend").unwrap().local_value(),
			Some(&AttrValue::Ref("GlBackend".into()))
		);
		assert!(element.registry().unwrap().element("Cache").is_some());
		assert_eq!(reparsed.exported_component("Paint"), Some("Painter"));
		assert_eq!(reparsed.exported_interface("IPainter"), Some("Painter"));
	}

	#[test]
	fn load_package_dir_collects_soft_failures() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(
			dir.path().join("main.json"),
			r#"{"elements": {"A": {"class": "pkg.A"}}}"#,
		)
		.unwrap();
		std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();
		std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

		let report = load_package_dir(dir.path());

		assert_eq!(report.registries.len(), 1);
		assert_eq!(report.registries[0].0, "main");
		assert!(report.registries[0].1.element("A").is_some());
		assert_eq!(report.errors.len(), 1);
		assert!(report.errors[0].0.ends_with("broken.json"));
	}

	#[test]
	fn load_package_dir_missing_dir_reports_io_error() {
		let dir = tempfile::tempdir().unwrap();
		let missing = dir.path().join("absent");
		let report = load_package_dir(&missing);
		assert!(report.registries.is_empty());
		assert_eq!(report.errors.len(), 1);
		assert!(matches!(report.errors[0].1, LoadError::Io(_)));
	}
}
