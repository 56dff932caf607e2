//! Capabilities the host object store exposes to the bridge.
//!
//! The bridge never introspects host objects. Everything it needs is asked
//! through [`Entity`] (per object) and [`ObjectStore`] (per class):
//!
//! | Capability | Method |
//! |------------|--------|
//! | attribute or computed member | [`Entity::get`] |
//! | relation traversal | [`Entity::relation`] |
//! | permalink | [`Entity::permalink`] |
//! | file content | [`Entity::file`] |
//! | lookup by id | [`ObjectStore::get_by_id`] |
//! | id-ordered paging | [`ObjectStore::page_after`] |
//! | column types for schema inference | [`ObjectStore::storage_type`] |

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Host object identifier. Identifiers are positive and ordered.
pub type ObjectId = u64;

/// An owned handle to a host object.
pub type EntityRef<'a> = Box<dyn Entity + 'a>;

/// The declared cardinality of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    #[serde(alias = "has_one")]
    OneToOne,
    #[serde(alias = "has_many")]
    OneToMany,
    #[serde(alias = "many_many")]
    ManyToMany,
}

/// The objects reached through a relation.
pub enum Relation<'a> {
    /// `None` when the relation is unset.
    OneToOne(Option<EntityRef<'a>>),
    OneToMany(Vec<EntityRef<'a>>),
    ManyToMany(Vec<EntityRef<'a>>),
}

impl Relation<'_> {
    pub fn kind(&self) -> RelationKind {
        match self {
            Relation::OneToOne(_) => RelationKind::OneToOne,
            Relation::OneToMany(_) => RelationKind::OneToMany,
            Relation::ManyToMany(_) => RelationKind::ManyToMany,
        }
    }
}

/// Where a file-like object's content lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Path of the content, relative to the assets root unless absolute.
    pub path: PathBuf,
    /// Folders and other pure containers have no content of their own.
    pub is_container: bool,
}

impl FileInfo {
    /// Lowercased extension, without the dot.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}

/// A single host object.
pub trait Entity {
    fn class_name(&self) -> &str;

    fn id(&self) -> ObjectId;

    /// Read an attribute or evaluate a zero-argument computed member.
    ///
    /// Returns `None` when the object has no such member.
    fn get(&self, name: &str) -> Option<Value>;

    /// Follow a named relation. `None` when `name` is not a relation.
    fn relation(&self, _name: &str) -> Option<Relation<'_>> {
        None
    }

    /// Canonical URL for the object, if the class produces one.
    fn permalink(&self) -> Option<String> {
        None
    }

    /// Content location, if the object is file-like.
    fn file(&self) -> Option<FileInfo> {
        None
    }
}

/// A `(class, id)` reference to a host object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ObjectRef {
    pub class_name: String,
    pub id: ObjectId,
}

impl ObjectRef {
    pub fn new(class_name: impl Into<String>, id: ObjectId) -> Self {
        Self {
            class_name: class_name.into(),
            id,
        }
    }

    /// The document key used by the index: `"<ClassName>:<ObjectID>"`.
    pub fn document_id(&self) -> String {
        format!("{}:{}", self.class_name, self.id)
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.class_name, self.id)
    }
}

/// Underlying column type of a stored attribute, used for schema inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageType {
    Boolean,
    #[serde(alias = "StringField")]
    String,
    Enum,
    MultiEnum,
    Date,
    Time,
    #[serde(alias = "SS_Datetime", alias = "DateTime")]
    Datetime,
    Decimal,
    Float,
    Double,
    #[serde(alias = "Integer", alias = "BigInt")]
    Int,
    Year,
    Percentage,
    Money,
    Currency,
    Varchar,
    Text,
    #[serde(alias = "HTMLText")]
    HtmlText,
    #[serde(alias = "HTMLVarchar")]
    HtmlVarchar,
    #[serde(other)]
    Unknown,
}

impl StorageType {
    /// Whether values of this column hold timestamps.
    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            StorageType::Date | StorageType::Time | StorageType::Datetime
        )
    }
}

/// Read access to the host object population.
pub trait ObjectStore {
    /// Look up a live object. `None` when it no longer exists.
    fn get_by_id(&self, class_name: &str, id: ObjectId) -> Option<EntityRef<'_>>;

    /// Up to `limit` objects of `class_name` with id greater than `after`,
    /// ordered by id ascending.
    fn page_after(&self, class_name: &str, after: ObjectId, limit: usize) -> Vec<EntityRef<'_>>;

    /// Number of objects of `class_name`.
    fn count(&self, class_name: &str) -> u64;

    /// Declared column type of `field` on `class_name`, if it is a stored
    /// attribute.
    fn storage_type(&self, class_name: &str, field: &str) -> Option<StorageType>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_id_format() {
        let r = ObjectRef::new("Page", 42);
        assert_eq!(r.document_id(), "Page:42");
        assert_eq!(r.to_string(), "Page:42");
    }

    #[test]
    fn file_extension_is_lowercased() {
        let f = FileInfo {
            path: PathBuf::from("assets/Report.PDF"),
            is_container: false,
        };
        assert_eq!(f.extension().as_deref(), Some("pdf"));
    }

    #[test]
    fn storage_type_accepts_host_names() {
        let t: StorageType = serde_json::from_str("\"SS_Datetime\"").unwrap();
        assert_eq!(t, StorageType::Datetime);
        let t: StorageType = serde_json::from_str("\"HTMLText\"").unwrap();
        assert_eq!(t, StorageType::HtmlText);
        let t: StorageType = serde_json::from_str("\"GeoPoint\"").unwrap();
        assert_eq!(t, StorageType::Unknown);
    }

    #[test]
    fn relation_kind_accepts_host_names() {
        let k: RelationKind = serde_json::from_str("\"many_many\"").unwrap();
        assert_eq!(k, RelationKind::ManyToMany);
        let k: RelationKind = serde_json::from_str("\"one_to_one\"").unwrap();
        assert_eq!(k, RelationKind::OneToOne);
    }
}
