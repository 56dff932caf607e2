//! Per-class field configuration.
//!
//! Classes become searchable by registering a list of [`FieldSpec`]s with a
//! [`FieldRegistry`]. Registration resolves each spec into a [`FieldConfig`]:
//! the target name is fixed (`ID` always becomes `ObjectID`), shorthand types
//! are expanded, content filters are looked up, and duplicate target names are
//! dropped (first wins). The system fields `ID`, `ClassName` and `LastEdited`
//! are appended when a class does not declare them.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::filters::{self, ContentFilter};

/// Target name the `ID` source field is always indexed under.
pub const OBJECT_ID_FIELD: &str = "ObjectID";
pub const CLASS_NAME_FIELD: &str = "ClassName";

const IMPLICIT_FIELDS: &[&str] = &["ID", CLASS_NAME_FIELD, "LastEdited"];

/// Field type as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Text,
    Date,
    Long,
    Float,
    Currency,
    /// Shorthand for an unstored, indexed `string`.
    Keyword,
    /// Shorthand for an unstored, indexed `text_ws`.
    Unstored,
    /// Shorthand for a stored, unindexed `string`.
    Unindexed,
}

impl FieldType {
    /// Expand into `(backend type, stored, indexed)`. Only the shorthands fix
    /// the flags.
    pub fn expand(self) -> (BackendType, Option<bool>, Option<bool>) {
        match self {
            FieldType::String => (BackendType::String, None, None),
            FieldType::Text => (BackendType::TextEnSplitting, None, None),
            FieldType::Date => (BackendType::Date, None, None),
            FieldType::Long => (BackendType::Long, None, None),
            FieldType::Float => (BackendType::Float, None, None),
            FieldType::Currency => (BackendType::Currency, None, None),
            FieldType::Keyword => (BackendType::String, Some(false), Some(true)),
            FieldType::Unstored => (BackendType::TextWs, Some(false), Some(true)),
            FieldType::Unindexed => (BackendType::String, Some(true), Some(false)),
        }
    }
}

/// Field type names understood by the search backend's schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendType {
    String,
    Long,
    Float,
    Date,
    Currency,
    Url,
    TextWs,
    TextEnSplitting,
}

impl BackendType {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendType::String => "string",
            BackendType::Long => "long",
            BackendType::Float => "float",
            BackendType::Date => "date",
            BackendType::Currency => "currency",
            BackendType::Url => "url",
            BackendType::TextWs => "text_ws",
            BackendType::TextEnSplitting => "text_en_splitting",
        }
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field declaration as written by the integrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Attribute name or dotted relation path.
    pub source: String,
    /// Target field name; defaults to `source`.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub field_type: Option<FieldType>,
    #[serde(default)]
    pub stored: Option<bool>,
    #[serde(default)]
    pub indexed: Option<bool>,
    #[serde(default)]
    pub multiple: Option<bool>,
    /// Name of a built-in content filter.
    #[serde(default)]
    pub content_filter: Option<String>,
}

impl FieldSpec {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            ..Self::default()
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn typed(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn stored(mut self, stored: bool) -> Self {
        self.stored = Some(stored);
        self
    }

    pub fn indexed(mut self, indexed: bool) -> Self {
        self.indexed = Some(indexed);
        self
    }

    pub fn multiple(mut self, multiple: bool) -> Self {
        self.multiple = Some(multiple);
        self
    }

    pub fn filter(mut self, name: &str) -> Self {
        self.content_filter = Some(name.to_string());
        self
    }

    /// The name this spec is indexed under.
    pub fn target_name(&self) -> String {
        if self.source == "ID" {
            OBJECT_ID_FIELD.to_string()
        } else {
            self.name.clone().unwrap_or_else(|| self.source.clone())
        }
    }

    fn resolve(self) -> Result<FieldConfig> {
        let filter = match &self.content_filter {
            Some(name) => Some(filters::lookup(name).ok_or_else(|| {
                anyhow!(
                    "unknown content filter '{}' on field '{}' (available: {})",
                    name,
                    self.source,
                    filters::names().collect::<Vec<_>>().join(", ")
                )
            })?),
            None => None,
        };
        let name = self.target_name();
        let (field_type, stored, indexed) = match self.field_type {
            Some(t) => {
                let (backend, s, i) = t.expand();
                (Some(backend), s.or(self.stored), i.or(self.indexed))
            }
            None => (None, self.stored, self.indexed),
        };
        Ok(FieldConfig {
            source: self.source,
            name,
            field_type,
            stored,
            indexed,
            multiple: self.multiple,
            filter,
        })
    }
}

/// A resolved field projection rule.
///
/// Flags stay optional so schema generation can tell explicit settings from
/// defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldConfig {
    pub source: String,
    pub name: String,
    pub field_type: Option<BackendType>,
    pub stored: Option<bool>,
    pub indexed: Option<bool>,
    pub multiple: Option<bool>,
    pub filter: Option<ContentFilter>,
}

impl FieldConfig {
    pub fn is_stored(&self) -> bool {
        self.stored.unwrap_or(false)
    }

    pub fn is_indexed(&self) -> bool {
        self.indexed.unwrap_or(true)
    }

    pub fn is_multiple(&self) -> bool {
        self.multiple.unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
struct ClassFields {
    class_name: String,
    fields: Vec<FieldConfig>,
}

/// Registry of searchable classes and their resolved fields.
///
/// Registration order is the enumeration order used by schema generation
/// and bulk reindexing.
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    classes: Vec<ClassFields>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `class_name` searchable with the given fields. Registering a
    /// class again replaces its previous configuration in place.
    ///
    /// Fails only when a spec names an unknown content filter.
    pub fn register<I>(&mut self, class_name: &str, specs: I) -> Result<()>
    where
        I: IntoIterator<Item = FieldSpec>,
    {
        let mut fields: Vec<FieldConfig> = Vec::new();
        for spec in specs {
            let config = spec.resolve()?;
            if fields.iter().any(|f| f.name == config.name) {
                continue;
            }
            fields.push(config);
        }
        for implicit in IMPLICIT_FIELDS {
            let spec = FieldSpec::new(implicit);
            let target = spec.target_name();
            if fields.iter().any(|f| f.source == *implicit || f.name == target) {
                continue;
            }
            fields.push(spec.resolve()?);
        }

        let entry = ClassFields {
            class_name: class_name.to_string(),
            fields,
        };
        match self.classes.iter_mut().find(|c| c.class_name == class_name) {
            Some(existing) => *existing = entry,
            None => self.classes.push(entry),
        }
        Ok(())
    }

    /// Searchable classes, in registration order.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(|c| c.class_name.as_str())
    }

    pub fn is_searchable(&self, class_name: &str) -> bool {
        self.classes.iter().any(|c| c.class_name == class_name)
    }

    /// Target field names of `class_name`, in configuration order. Empty for
    /// classes that are not searchable.
    pub fn fields_for(&self, class_name: &str) -> Vec<&str> {
        self.configs(class_name)
            .iter()
            .map(|f| f.name.as_str())
            .collect()
    }

    pub fn config_for(&self, class_name: &str, field_name: &str) -> Option<&FieldConfig> {
        self.configs(class_name).iter().find(|f| f.name == field_name)
    }

    /// All resolved fields of `class_name`.
    pub fn configs(&self, class_name: &str) -> &[FieldConfig] {
        self.classes
            .iter()
            .find(|c| c.class_name == class_name)
            .map(|c| c.fields.as_slice())
            .unwrap_or(&[])
    }
}
