//! Declaration types for module descriptor and metadata files.
//!
//! Files are JSON documents deserialized with serde; this module is the
//! boundary between the external file formats and the kernel's
//! descriptor types.

use crate::catalog::{DefaultValue, EntityDescriptor, FieldDescriptor, FieldKind};
use crate::error::Error;
use crate::storage::Value;
use crate::ui::{ActionDef, MenuItemDecl};
use serde::{Deserialize, Serialize};

/// A module's descriptor file (`module.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleManifest {
    /// Module version string.
    pub version: String,
    /// Modules that must be initialized first, in declaration order.
    #[serde(default)]
    pub depends: Vec<String>,
    /// Metadata files, processed in listed order.
    #[serde(default)]
    pub data: Vec<String>,
}

/// A declared entity, as it appears in an entity file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDeclaration {
    /// Logical name, `<namespace>.<identifier>`.
    pub name: String,
    /// Fields, in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldDeclaration>,
}

/// A declared field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    /// Field name.
    pub name: String,
    /// Display label; the name is used when absent.
    #[serde(default)]
    pub label: Option<String>,
    /// Kind tag (`char`, `text`, `integer`, `float`, `boolean`,
    /// `datetime`, `reference`).
    pub kind: String,
    /// Referenced entity, for `reference` fields.
    #[serde(default)]
    pub target: Option<String>,
    /// Whether a value must be present on every row.
    #[serde(default)]
    pub required: bool,
    /// Default value. The string `"now"` on a `datetime` field means
    /// the write-time timestamp.
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

/// One record of a metadata file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record")]
pub enum MetadataRecord {
    /// A menu item declaration.
    #[serde(rename = "menuitem")]
    MenuItem(MenuItemDecl),
    /// A window action declaration.
    #[serde(rename = "action")]
    Action(ActionDef),
}

/// A parsed metadata file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetadataFile {
    /// Records, in file order.
    #[serde(default)]
    pub records: Vec<MetadataRecord>,
}

impl MetadataFile {
    /// Parse a metadata file from JSON text.
    pub fn parse(text: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(text)?)
    }
}

impl EntityDeclaration {
    /// Parse an entity file (a JSON array of declarations).
    pub fn parse_file(text: &str) -> Result<Vec<Self>, Error> {
        Ok(serde_json::from_str(text)?)
    }

    /// Convert the declaration into a descriptor.
    pub fn to_descriptor(&self) -> Result<EntityDescriptor, Error> {
        let mut descriptor = EntityDescriptor::new(&self.name);
        for field in &self.fields {
            descriptor = descriptor.with_field(self.field_descriptor(field)?);
        }
        descriptor.validate()?;
        Ok(descriptor)
    }

    fn field_descriptor(&self, decl: &FieldDeclaration) -> Result<FieldDescriptor, Error> {
        let kind = match decl.kind.as_str() {
            "reference" => {
                let target = decl.target.as_ref().ok_or_else(|| Error::InvalidDescriptor {
                    logical_name: self.name.clone(),
                    reason: format!("reference field '{}' has no target", decl.name),
                })?;
                FieldKind::reference(target)
            }
            tag => FieldKind::from_tag(tag)?,
        };

        let default = match &decl.default {
            Some(json) => Some(default_value(&kind, json).map_err(|reason| {
                Error::InvalidDescriptor {
                    logical_name: self.name.clone(),
                    reason: format!("field '{}': {reason}", decl.name),
                }
            })?),
            None => None,
        };

        let mut field = FieldDescriptor::new(&decl.name, kind);
        if let Some(label) = &decl.label {
            field = field.with_label(label);
        }
        if decl.required {
            field = field.required();
        }
        field.default = default;
        Ok(field)
    }
}

/// Interpret a JSON default against the declared kind.
fn default_value(kind: &FieldKind, json: &serde_json::Value) -> Result<DefaultValue, String> {
    use serde_json::Value as Json;

    let value = match (kind, json) {
        (FieldKind::DateTime, Json::String(s)) if s == "now" => return Ok(DefaultValue::Now),
        (_, Json::Null) => Value::Null,
        (FieldKind::Boolean, Json::Bool(b)) => Value::Bool(*b),
        (FieldKind::Integer, Json::Number(n)) => {
            Value::Int(n.as_i64().ok_or("integer default out of range")?)
        }
        (FieldKind::Reference { .. }, Json::Number(n)) => {
            Value::Int(n.as_i64().ok_or("reference default out of range")?)
        }
        (FieldKind::Float, Json::Number(n)) => {
            Value::Float(n.as_f64().ok_or("float default out of range")?)
        }
        (FieldKind::Char | FieldKind::Text, Json::String(s)) => Value::Text(s.clone()),
        (FieldKind::DateTime, Json::Number(n)) => {
            Value::Timestamp(n.as_i64().ok_or("timestamp default out of range")?)
        }
        (kind, json) => {
            return Err(format!(
                "default {json} does not fit kind '{}'",
                kind.tag()
            ))
        }
    };
    Ok(DefaultValue::Literal(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_manifest_parsing() {
        let manifest: ModuleManifest = serde_json::from_str(
            r#"{"version": "1.0", "depends": ["base"], "data": ["menus.json"]}"#,
        )
        .unwrap();
        assert_eq!(manifest.depends, vec!["base"]);
        assert_eq!(manifest.data, vec!["menus.json"]);

        let bare: ModuleManifest = serde_json::from_str(r#"{"version": "1.0"}"#).unwrap();
        assert!(bare.depends.is_empty());
    }

    #[test]
    fn test_entity_declaration_to_descriptor() {
        let decls = EntityDeclaration::parse_file(
            r#"[{
                "name": "library.book",
                "fields": [
                    {"name": "title", "label": "Title", "kind": "char", "required": true},
                    {"name": "isbn", "kind": "char"},
                    {"name": "available", "kind": "boolean", "default": true},
                    {"name": "shelved_at", "kind": "datetime", "default": "now"},
                    {"name": "author", "kind": "reference", "target": "library.author"}
                ]
            }]"#,
        )
        .unwrap();

        let descriptor = decls[0].to_descriptor().unwrap();
        assert_eq!(descriptor.table_name, "library_book");
        assert_eq!(descriptor.fields.len(), 5);
        assert_eq!(descriptor.get_field("title").unwrap().label, "Title");
        assert!(descriptor.get_field("title").unwrap().required);
        assert_eq!(
            descriptor.get_field("available").unwrap().default,
            Some(DefaultValue::Literal(Value::Bool(true)))
        );
        assert_eq!(
            descriptor.get_field("shelved_at").unwrap().default,
            Some(DefaultValue::Now)
        );
        assert_eq!(
            descriptor.get_field("author").unwrap().kind,
            FieldKind::reference("library.author")
        );
    }

    #[test]
    fn test_unknown_kind_tag_fails() {
        let decls = EntityDeclaration::parse_file(
            r#"[{"name": "library.book", "fields": [{"name": "pos", "kind": "geopoint"}]}]"#,
        )
        .unwrap();
        let err = decls[0].to_descriptor().unwrap_err();
        assert!(matches!(err, Error::UnsupportedFieldType { kind } if kind == "geopoint"));
    }

    #[test]
    fn test_reference_without_target_fails() {
        let decls = EntityDeclaration::parse_file(
            r#"[{"name": "library.book", "fields": [{"name": "author", "kind": "reference"}]}]"#,
        )
        .unwrap();
        assert!(decls[0].to_descriptor().is_err());
    }

    #[test]
    fn test_mismatched_default_fails() {
        let decls = EntityDeclaration::parse_file(
            r#"[{"name": "library.book",
                 "fields": [{"name": "title", "kind": "char", "default": 5}]}]"#,
        )
        .unwrap();
        assert!(decls[0].to_descriptor().is_err());
    }

    #[test]
    fn test_metadata_file_records() {
        let file = MetadataFile::parse(
            r#"{"records": [
                {"record": "action", "id": "act_library_window", "name": "Books",
                 "target_entity": "library.book"},
                {"record": "menuitem", "id": "menu_library", "name": "Library"},
                {"record": "menuitem", "id": "menu_books", "name": "Books",
                 "parent": "menu_library", "sequence": 20, "action": "act_library_window"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(file.records.len(), 3);
        match &file.records[2] {
            MetadataRecord::MenuItem(item) => {
                assert_eq!(item.parent.as_deref(), Some("menu_library"));
                assert_eq!(item.sequence, 20);
            }
            other => panic!("expected menuitem, got {other:?}"),
        }
    }
}
