//! Backend schema generation from field configuration.
//!
//! Every field of every searchable class contributes one schema field,
//! deduplicated by target name (first wins). Types come from the field's
//! explicit type, else from the host column type:
//!
//! | Storage type | Backend type |
//! |--------------|--------------|
//! | Boolean, String, Enum, MultiEnum | `string` |
//! | Date, Time, Datetime | `date` |
//! | Decimal, Float, Double | `float` |
//! | Int, Year, Percentage | `long` |
//! | Money, Currency | `currency` |
//! | Varchar, Text, HtmlText, HtmlVarchar | `text_en_splitting` |
//! | anything else | `text_ws` |
//!
//! The synthetic `body`, `LastEdited` and `Link` fields are always appended.

use serde::Serialize;

use crate::entity::{ObjectStore, StorageType};
use crate::fields::{BackendType, FieldConfig, FieldRegistry, CLASS_NAME_FIELD, OBJECT_ID_FIELD};

/// One `<field>` of the generated schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "Type")]
    pub field_type: BackendType,
    pub stored: bool,
    pub indexed: bool,
    pub multiple: bool,
}

/// The complete field list for the backend schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaDeclaration {
    pub fields: Vec<SchemaField>,
}

impl SchemaDeclaration {
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Render as the `<fields>` section of a `schema.xml`.
    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<fields>\n");
        for f in &self.fields {
            xml.push_str(&format!(
                "  <field name=\"{}\" type=\"{}\" indexed=\"{}\" stored=\"{}\" multiValued=\"{}\" />\n",
                quick_xml::escape::escape(f.name.as_str()),
                f.field_type,
                f.indexed,
                f.stored,
                f.multiple
            ));
        }
        xml.push_str("</fields>\n");
        xml
    }
}

/// Column type to backend type.
pub fn infer_type(storage: Option<StorageType>) -> BackendType {
    use StorageType::*;
    match storage {
        Some(Boolean | String | Enum | MultiEnum) => BackendType::String,
        Some(Date | Time | Datetime) => BackendType::Date,
        Some(Decimal | Float | Double) => BackendType::Float,
        Some(Int | Year | Percentage) => BackendType::Long,
        Some(Money | Currency) => BackendType::Currency,
        Some(Varchar | Text | HtmlText | HtmlVarchar) => BackendType::TextEnSplitting,
        Some(Unknown) | None => BackendType::TextWs,
    }
}

fn synthetic_fields() -> [SchemaField; 3] {
    [
        SchemaField {
            name: "body".to_string(),
            field_type: BackendType::TextEnSplitting,
            stored: true,
            indexed: true,
            multiple: false,
        },
        SchemaField {
            name: "LastEdited".to_string(),
            field_type: BackendType::Date,
            stored: true,
            indexed: true,
            multiple: false,
        },
        SchemaField {
            name: "Link".to_string(),
            field_type: BackendType::Url,
            stored: true,
            indexed: false,
            multiple: false,
        },
    ]
}

fn schema_field(class_name: &str, config: &FieldConfig, store: &dyn ObjectStore) -> SchemaField {
    let field_type = config
        .field_type
        .unwrap_or_else(|| infer_type(store.storage_type(class_name, &config.source)));
    let mut field = SchemaField {
        name: config.name.clone(),
        field_type,
        stored: config.is_stored(),
        indexed: config.is_indexed(),
        multiple: config.is_multiple(),
    };
    if field.name == OBJECT_ID_FIELD {
        field.stored = true;
        field.indexed = true;
    }
    if field.name == CLASS_NAME_FIELD {
        field.stored = true;
        field.indexed = true;
        field.field_type = BackendType::String;
    }
    field
}

/// Build the schema for every class in `registry`.
pub fn generate(registry: &FieldRegistry, store: &dyn ObjectStore) -> SchemaDeclaration {
    let synthetic = synthetic_fields();
    let mut fields: Vec<SchemaField> = Vec::new();
    for class_name in registry.classes() {
        for config in registry.configs(class_name) {
            if fields.iter().any(|f| f.name == config.name)
                || synthetic.iter().any(|s| s.name == config.name)
            {
                continue;
            }
            fields.push(schema_field(class_name, config, store));
        }
    }
    fields.extend(synthetic);
    SchemaDeclaration { fields }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FieldSpec, FieldType};
    use crate::testing::{blog_registry, blog_store};

    #[test]
    fn keyword_shorthand() {
        let store = blog_store();
        let mut registry = FieldRegistry::new();
        registry
            .register("Post", vec![FieldSpec::new("Code").typed(FieldType::Keyword)])
            .unwrap();
        let schema = generate(&registry, &store);
        assert_eq!(
            schema.field("Code"),
            Some(&SchemaField {
                name: "Code".to_string(),
                field_type: BackendType::String,
                stored: false,
                indexed: true,
                multiple: false,
            })
        );
    }

    #[test]
    fn id_becomes_stored_indexed_object_id() {
        let store = blog_store();
        let mut registry = FieldRegistry::new();
        registry
            .register("Post", vec![FieldSpec::new("ID").indexed(false)])
            .unwrap();
        let schema = generate(&registry, &store);
        let id = schema.field("ObjectID").unwrap();
        assert!(id.stored && id.indexed);
        let class = schema.field("ClassName").unwrap();
        assert_eq!(class.field_type, BackendType::String);
        assert!(class.stored && class.indexed);
    }

    #[test]
    fn types_inferred_from_storage() {
        let store = blog_store();
        let registry = blog_registry();
        let schema = generate(&registry, &store);
        assert_eq!(
            schema.field("Title").unwrap().field_type,
            BackendType::TextEnSplitting
        );
        assert_eq!(schema.field("Rating").unwrap().field_type, BackendType::Long);
        assert_eq!(schema.field("Price").unwrap().field_type, BackendType::Currency);
        assert_eq!(
            schema.field("AuthorName").unwrap().field_type,
            BackendType::TextWs,
            "dotted paths have no storage type"
        );
        assert!(schema.field("Keywords").unwrap().multiple);
    }

    #[test]
    fn synthetic_fields_last_and_deduplicated() {
        let store = blog_store();
        let registry = blog_registry();
        let schema = generate(&registry, &store);
        let names: Vec<&str> = schema.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(&names[names.len() - 3..], &["body", "LastEdited", "Link"]);
        assert_eq!(names.iter().filter(|n| **n == "LastEdited").count(), 1);
        assert_eq!(names.iter().filter(|n| **n == "Title").count(), 1);
        let link = schema.field("Link").unwrap();
        assert_eq!(link.field_type, BackendType::Url);
        assert!(link.stored && !link.indexed);
    }

    #[test]
    fn storage_table() {
        assert_eq!(infer_type(Some(StorageType::Boolean)), BackendType::String);
        assert_eq!(infer_type(Some(StorageType::Datetime)), BackendType::Date);
        assert_eq!(infer_type(Some(StorageType::Double)), BackendType::Float);
        assert_eq!(infer_type(Some(StorageType::Year)), BackendType::Long);
        assert_eq!(infer_type(Some(StorageType::HtmlText)), BackendType::TextEnSplitting);
        assert_eq!(infer_type(Some(StorageType::Unknown)), BackendType::TextWs);
        assert_eq!(infer_type(None), BackendType::TextWs);
    }

    #[test]
    fn json_and_xml_output() {
        let schema = SchemaDeclaration {
            fields: vec![SchemaField {
                name: "Title".to_string(),
                field_type: BackendType::TextEnSplitting,
                stored: true,
                indexed: true,
                multiple: false,
            }],
        };
        let json = serde_json::to_value(&schema.fields[0]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "Name": "Title",
                "Type": "text_en_splitting",
                "Stored": true,
                "Indexed": true,
                "Multiple": false
            })
        );
        assert!(schema.to_xml().contains(
            r#"<field name="Title" type="text_en_splitting" indexed="true" stored="true" multiValued="false" />"#
        ));
    }
}
