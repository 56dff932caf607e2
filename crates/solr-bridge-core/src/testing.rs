//! Shared fixtures for unit tests.

use std::cell::RefCell;
use std::path::Path;

use serde_json::json;

use crate::backend::IndexBackend;
use crate::entity::StorageType;
use crate::extract::TextExtractor;
use crate::fields::{FieldRegistry, FieldSpec, FieldType};
use crate::store::memory::{ClassDef, MemoryStore};
use crate::wire::SelectParams;

/// Records every payload and serves one canned select body.
#[derive(Default)]
pub struct RecordingBackend {
    updates: RefCell<Vec<String>>,
    selects: RefCell<Vec<SelectParams>>,
    response: RefCell<Option<String>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_with(&self, body: &str) {
        *self.response.borrow_mut() = Some(body.to_string());
    }

    pub fn updates(&self) -> Vec<String> {
        self.updates.borrow().clone()
    }

    pub fn selects(&self) -> Vec<SelectParams> {
        self.selects.borrow().clone()
    }

    pub fn commits(&self) -> usize {
        self.updates
            .borrow()
            .iter()
            .filter(|u| *u == "<commit/>")
            .count()
    }

    /// Document ids of every `<add>` payload, in send order.
    pub fn added_ids(&self) -> Vec<String> {
        const PREFIX: &str = r#"<add overwrite="true"><doc><field name="id">"#;
        self.updates
            .borrow()
            .iter()
            .filter_map(|u| u.strip_prefix(PREFIX))
            .filter_map(|rest| rest.split_once("</field>").map(|(id, _)| id.to_string()))
            .collect()
    }
}

impl IndexBackend for RecordingBackend {
    fn update(&self, xml: &str) {
        self.updates.borrow_mut().push(xml.to_string());
    }

    fn select(&self, params: &SelectParams) -> Option<String> {
        self.selects.borrow_mut().push(params.clone());
        self.response.borrow().clone()
    }
}

/// Returns the same text for every file it handles.
pub struct StaticExtractor {
    extensions: &'static [&'static str],
    text: String,
}

impl StaticExtractor {
    pub fn new(extensions: &'static [&'static str], text: &str) -> Self {
        Self {
            extensions,
            text: text.to_string(),
        }
    }
}

impl TextExtractor for StaticExtractor {
    fn name(&self) -> &str {
        "static"
    }

    fn extensions(&self) -> &[&'static str] {
        self.extensions
    }

    fn priority(&self) -> i32 {
        100
    }

    fn extract(&self, _path: &Path) -> Option<String> {
        Some(self.text.clone())
    }
}

/// A small blog: posts with authors, tags and comments, products, files.
pub fn blog_store() -> MemoryStore {
    use crate::entity::RelationKind::*;

    let mut store = MemoryStore::new();
    store.define_class(
        "Post",
        ClassDef::new()
            .field("Title", StorageType::Varchar)
            .field("Content", StorageType::HtmlText)
            .field("LastEdited", StorageType::Datetime)
            .relation("Author", OneToOne, "Member")
            .relation("Tags", ManyToMany, "Tag")
            .relation("Comments", OneToMany, "Comment")
            .link("/posts/{URLSegment}/"),
    );
    store.define_class(
        "Member",
        ClassDef::new()
            .field("Name", StorageType::Varchar)
            .relation("Team", OneToOne, "Team"),
    );
    store.define_class("Team", ClassDef::new().field("Title", StorageType::Varchar));
    store.define_class("Tag", ClassDef::new().field("Title", StorageType::Varchar));
    store.define_class("Comment", ClassDef::new().field("Body", StorageType::Text));
    store.define_class(
        "Product",
        ClassDef::new()
            .field("Title", StorageType::Varchar)
            .field("Rating", StorageType::Int)
            .field("Price", StorageType::Money),
    );
    store.define_class("File", ClassDef::new().file("Filename", false));
    store.define_class("Folder", ClassDef::new().file("Filename", true));

    let rows = [
        (
            "Post",
            json!({
                "ID": 1, "Title": "Hello", "URLSegment": "hello",
                "Content": "<p>Hello world &amp; friends</p>",
                "Keywords": "alpha, beta,gamma",
                "LastEdited": "2024-05-01 10:00:00",
                "Author": 7, "Tags": [1, 2, 3], "Comments": [1, 2]
            }),
        ),
        ("Post", json!({ "ID": 2, "Title": "Draft", "URLSegment": "draft" })),
        ("Member", json!({ "ID": 7, "Name": "Ada", "Team": 1 })),
        ("Team", json!({ "ID": 1, "Title": "Core" })),
        ("Tag", json!({ "ID": 1, "Title": "rust" })),
        ("Tag", json!({ "ID": 2, "Title": "search" })),
        ("Tag", json!({ "ID": 3, "Title": "solr" })),
        ("Comment", json!({ "ID": 1, "Body": "first!" })),
        ("Comment", json!({ "ID": 2, "Body": "nice" })),
        ("Product", json!({ "ID": 1, "Title": "Widget", "Rating": 4, "Price": 9.5 })),
        ("File", json!({ "ID": 10, "Filename": "manual.pdf" })),
        ("Folder", json!({ "ID": 11, "Filename": "docs" })),
    ];
    for (class_name, row) in rows {
        store.insert(class_name, row).unwrap();
    }
    store
}

/// Fields for `Post` and `Product` as an integrator would declare them.
pub fn blog_registry() -> FieldRegistry {
    let mut registry = FieldRegistry::new();
    registry
        .register(
            "Post",
            vec![
                FieldSpec::new("Title").stored(true),
                FieldSpec::new("Content").filter("strip_html"),
                FieldSpec::new("Author.Name").named("AuthorName"),
                FieldSpec::new("Tags.Title").named("Tags"),
                FieldSpec::new("Keywords")
                    .typed(FieldType::Keyword)
                    .multiple(true)
                    .filter("split_commas"),
            ],
        )
        .unwrap();
    registry
        .register(
            "Product",
            vec![
                FieldSpec::new("Title"),
                FieldSpec::new("Rating"),
                FieldSpec::new("Price"),
            ],
        )
        .unwrap();
    registry
}

/// One class per entry with ids `1..=n`.
pub fn numbered_store(classes: &[(&str, u64)]) -> MemoryStore {
    let mut store = MemoryStore::new();
    for (class_name, n) in classes {
        store.define_class(class_name, ClassDef::new().field("Title", StorageType::Varchar));
        for id in 1..=*n {
            store
                .insert(class_name, json!({ "ID": id, "Title": format!("{} {}", class_name, id) }))
                .unwrap();
        }
    }
    store
}
