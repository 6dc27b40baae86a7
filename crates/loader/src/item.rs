//! Descriptor document shapes.
//!
//! A document is classified once, by its marker table, into a closed
//! [`LoadedItem`] variant:
//!
//! * `[script_template]`: legacy annotated template, regex over the file name
//! * `[script]`: structured descriptor, compound extension plus optional path regex
//!
//! Documents with neither marker, or with both, are malformed.

use serde::Deserialize;

/// Marker table of legacy annotated templates.
pub const LEGACY_MARKER: &str = "script_template";

/// Marker table of structured descriptors.
pub const DESCRIPTOR_MARKER: &str = "script";

/// Legacy annotated template.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LegacyTemplate {
	pub name: String,
	#[serde(default)]
	pub file_pattern: Option<String>,
	#[serde(default)]
	pub dependencies: Vec<String>,
}

/// Structured descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructuredDescriptor {
	pub name: String,
	#[serde(default)]
	pub file_extension: Option<String>,
	#[serde(default)]
	pub file_path_pattern: Option<String>,
	#[serde(default)]
	pub dependencies: Vec<String>,
}

/// A located document, classified by shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadedItem {
	LegacyTemplate(LegacyTemplate),
	StructuredDescriptor(StructuredDescriptor),
}

impl LoadedItem {
	/// Parses and classifies a descriptor document. The error is a
	/// human-readable reason.
	pub fn parse(document: &str) -> Result<Self, String> {
		let mut table: toml::Table = toml::from_str(document).map_err(|e| format!("invalid TOML: {e}"))?;

		match (table.remove(LEGACY_MARKER), table.remove(DESCRIPTOR_MARKER)) {
			(Some(legacy), None) => toml::Value::try_into::<LegacyTemplate>(legacy)
				.map(Self::LegacyTemplate)
				.map_err(|e| format!("invalid [{LEGACY_MARKER}] table: {e}")),
			(None, Some(desc)) => toml::Value::try_into::<StructuredDescriptor>(desc)
				.map(Self::StructuredDescriptor)
				.map_err(|e| format!("invalid [{DESCRIPTOR_MARKER}] table: {e}")),
			(Some(_), Some(_)) => Err(format!("both [{LEGACY_MARKER}] and [{DESCRIPTOR_MARKER}] present")),
			(None, None) => Err(format!("missing [{LEGACY_MARKER}] or [{DESCRIPTOR_MARKER}] marker")),
		}
	}

	pub fn name(&self) -> &str {
		match self {
			Self::LegacyTemplate(t) => &t.name,
			Self::StructuredDescriptor(d) => &d.name,
		}
	}

	pub fn dependencies(&self) -> &[String] {
		match self {
			Self::LegacyTemplate(t) => &t.dependencies,
			Self::StructuredDescriptor(d) => &d.dependencies,
		}
	}
}
