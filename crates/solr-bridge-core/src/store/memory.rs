//! In-memory [`ObjectStore`] for tests and fixture-driven runs.
//!
//! Classes declare their column types, relations, permalink template, and
//! whether they are file-like. Rows are JSON objects keyed by `ID`. Relation
//! columns hold the related id (one-to-one) or an array of ids (to-many).
//!
//! ```json
//! {
//!   "classes": {
//!     "Page": {
//!       "fields": { "Title": "Varchar", "LastEdited": "SS_Datetime" },
//!       "relations": { "Author": { "kind": "has_one", "class": "Member" } },
//!       "link": "/{URLSegment}/"
//!     }
//!   },
//!   "objects": {
//!     "Page": [ { "ID": 1, "Title": "Home", "URLSegment": "home", "Author": 3 } ]
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::entity::{
    Entity, EntityRef, FileInfo, ObjectId, ObjectStore, Relation, RelationKind, StorageType,
};
use crate::value::{parse_datetime, Value};

/// Declaration of one class in the store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassDef {
    /// Stored attributes and their column types.
    #[serde(default)]
    pub fields: BTreeMap<String, StorageType>,
    #[serde(default)]
    pub relations: BTreeMap<String, RelationDef>,
    /// Permalink template; `{Name}` placeholders are replaced by attribute
    /// values.
    #[serde(default)]
    pub link: Option<String>,
    /// Present when objects of this class are file-like.
    #[serde(default)]
    pub file: Option<FileDef>,
}

impl ClassDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, storage: StorageType) -> Self {
        self.fields.insert(name.to_string(), storage);
        self
    }

    pub fn relation(mut self, name: &str, kind: RelationKind, class: &str) -> Self {
        self.relations.insert(
            name.to_string(),
            RelationDef {
                kind,
                class: class.to_string(),
            },
        );
        self
    }

    pub fn link(mut self, template: &str) -> Self {
        self.link = Some(template.to_string());
        self
    }

    pub fn file(mut self, path_field: &str, container: bool) -> Self {
        self.file = Some(FileDef {
            path_field: path_field.to_string(),
            container,
        });
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelationDef {
    pub kind: RelationKind,
    pub class: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileDef {
    /// Attribute holding the content path.
    #[serde(default = "default_path_field")]
    pub path_field: String,
    /// Folders: file-like but without content.
    #[serde(default)]
    pub container: bool,
}

fn default_path_field() -> String {
    "Filename".to_string()
}

#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    classes: BTreeMap<String, ClassDef>,
    #[serde(default)]
    objects: BTreeMap<String, Vec<JsonValue>>,
}

#[derive(Debug, Default)]
struct StoredClass {
    def: ClassDef,
    rows: BTreeMap<ObjectId, Map<String, JsonValue>>,
}

/// In-memory object graph.
#[derive(Debug, Default)]
pub struct MemoryStore {
    classes: BTreeMap<String, StoredClass>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a JSON fixture (see module docs).
    pub fn from_json(json: &str) -> Result<Self> {
        let fixture: Fixture =
            serde_json::from_str(json).context("Failed to parse object store fixture")?;
        let mut store = Self::new();
        for (name, def) in fixture.classes {
            store.define_class(&name, def);
        }
        for (class_name, rows) in fixture.objects {
            for row in rows {
                store
                    .insert(&class_name, row)
                    .with_context(|| format!("Invalid row for class '{}'", class_name))?;
            }
        }
        Ok(store)
    }

    /// Declare (or redeclare) a class. Existing rows are kept.
    pub fn define_class(&mut self, name: &str, def: ClassDef) {
        self.classes.entry(name.to_string()).or_default().def = def;
    }

    /// Insert or replace a row. The row must be a JSON object with a positive
    /// integer `ID`.
    pub fn insert(&mut self, class_name: &str, row: JsonValue) -> Result<ObjectId> {
        let JsonValue::Object(row) = row else {
            bail!("row must be a JSON object");
        };
        let id = row
            .get("ID")
            .and_then(json_id)
            .ok_or_else(|| anyhow!("row is missing a positive integer ID"))?;
        let class = self
            .classes
            .get_mut(class_name)
            .ok_or_else(|| anyhow!("class '{}' is not defined", class_name))?;
        class.rows.insert(id, row);
        Ok(id)
    }

    /// Remove a row. Returns whether it existed.
    pub fn remove(&mut self, class_name: &str, id: ObjectId) -> bool {
        self.classes
            .get_mut(class_name)
            .map(|c| c.rows.remove(&id).is_some())
            .unwrap_or(false)
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    fn entity<'a>(
        &'a self,
        class_name: &'a str,
        class: &'a StoredClass,
        id: ObjectId,
        row: &'a Map<String, JsonValue>,
    ) -> EntityRef<'a> {
        Box::new(MemoryEntity {
            store: self,
            class_name,
            class,
            id,
            row,
        })
    }
}

impl ObjectStore for MemoryStore {
    fn get_by_id(&self, class_name: &str, id: ObjectId) -> Option<EntityRef<'_>> {
        let (name, class) = self.classes.get_key_value(class_name)?;
        let row = class.rows.get(&id)?;
        Some(self.entity(name, class, id, row))
    }

    fn page_after(&self, class_name: &str, after: ObjectId, limit: usize) -> Vec<EntityRef<'_>> {
        let Some((name, class)) = self.classes.get_key_value(class_name) else {
            return Vec::new();
        };
        class
            .rows
            .range(after.saturating_add(1)..)
            .take(limit)
            .map(|(id, row)| self.entity(name, class, *id, row))
            .collect()
    }

    fn count(&self, class_name: &str) -> u64 {
        self.classes
            .get(class_name)
            .map(|c| c.rows.len() as u64)
            .unwrap_or(0)
    }

    fn storage_type(&self, class_name: &str, field: &str) -> Option<StorageType> {
        self.classes
            .get(class_name)
            .and_then(|c| c.def.fields.get(field))
            .copied()
    }
}

struct MemoryEntity<'a> {
    store: &'a MemoryStore,
    class_name: &'a str,
    class: &'a StoredClass,
    id: ObjectId,
    row: &'a Map<String, JsonValue>,
}

impl MemoryEntity<'_> {
    fn related(&self, class_name: &str, id: ObjectId) -> Option<EntityRef<'_>> {
        self.store.get_by_id(class_name, id)
    }
}

impl Entity for MemoryEntity<'_> {
    fn class_name(&self) -> &str {
        self.class_name
    }

    fn id(&self) -> ObjectId {
        self.id
    }

    fn get(&self, name: &str) -> Option<Value> {
        match name {
            "ID" => {
                return Some(
                    i64::try_from(self.id)
                        .map(Value::Int)
                        .unwrap_or_else(|_| Value::Text(self.id.to_string())),
                )
            }
            "ClassName" => return Some(Value::Text(self.class_name.to_string())),
            "Link" => return self.permalink().map(Value::Text),
            _ => {}
        }
        if self.class.def.relations.contains_key(name) {
            return None;
        }
        let raw = self.row.get(name)?;
        let temporal = self
            .class
            .def
            .fields
            .get(name)
            .is_some_and(|t| t.is_temporal());
        if temporal {
            if let Some(dt) = raw.as_str().and_then(parse_datetime) {
                return Some(Value::DateTime(dt));
            }
        }
        Some(Value::from_json(raw))
    }

    fn relation(&self, name: &str) -> Option<Relation<'_>> {
        let def = self.class.def.relations.get(name)?;
        let raw = self.row.get(name);
        match def.kind {
            RelationKind::OneToOne => {
                let target = raw.and_then(json_id).and_then(|id| self.related(&def.class, id));
                Some(Relation::OneToOne(target))
            }
            kind => {
                let targets: Vec<EntityRef<'_>> = raw
                    .and_then(JsonValue::as_array)
                    .map(|ids| {
                        ids.iter()
                            .filter_map(json_id)
                            .filter_map(|id| self.related(&def.class, id))
                            .collect()
                    })
                    .unwrap_or_default();
                if kind == RelationKind::OneToMany {
                    Some(Relation::OneToMany(targets))
                } else {
                    Some(Relation::ManyToMany(targets))
                }
            }
        }
    }

    fn permalink(&self) -> Option<String> {
        let template = self.class.def.link.as_deref()?;
        Some(expand_template(template, |name| {
            self.get(name).map(|v| v.to_text()).unwrap_or_default()
        }))
    }

    fn file(&self) -> Option<FileInfo> {
        let def = self.class.def.file.as_ref()?;
        let path = self.row.get(&def.path_field)?.as_str()?;
        Some(FileInfo {
            path: PathBuf::from(path),
            is_container: def.container,
        })
    }
}

fn json_id(v: &JsonValue) -> Option<ObjectId> {
    let id = match v {
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    (id > 0).then_some(id)
}

/// Replace `{Name}` placeholders using `lookup`. Unterminated braces are kept
/// literally.
fn expand_template(template: &str, lookup: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                out.push_str(&lookup(&after[..close]));
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
