//! Projection of host objects into search documents.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::entity::{Entity, ObjectRef};
use crate::extract::ExtractorChain;
use crate::fields::FieldRegistry;
use crate::resolve::resolve;
use crate::value::Value;

/// Field holding text extracted from file content.
pub const TEXT_FIELD: &str = "text";
/// Field holding the object's permalink.
pub const LINK_FIELD: &str = "Link";

/// A search document ready to be sent to the backend.
///
/// `fields` is an ordered multimap: a name may repeat, once per value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexDocument {
    pub id: String,
    pub fields: Vec<(String, String)>,
}

impl IndexDocument {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Vec::new(),
        }
    }

    pub fn push(&mut self, name: &str, value: impl Into<String>) {
        self.fields.push((name.to_string(), value.into()));
    }

    /// All values recorded under `name`, in insertion order.
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn first(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (n, _) in &self.fields {
            if !names.contains(&n.as_str()) {
                names.push(n);
            }
        }
        names
    }
}

/// Builds [`IndexDocument`]s from host objects.
pub struct Projector<'a> {
    registry: &'a FieldRegistry,
    extractors: &'a ExtractorChain,
    assets_root: Option<PathBuf>,
}

impl<'a> Projector<'a> {
    pub fn new(registry: &'a FieldRegistry, extractors: &'a ExtractorChain) -> Self {
        Self {
            registry,
            extractors,
            assets_root: None,
        }
    }

    /// Resolve relative file paths against `root`.
    pub fn with_assets_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.assets_root = Some(root.into());
        self
    }

    pub fn registry(&self) -> &'a FieldRegistry {
        self.registry
    }

    /// Project one object.
    ///
    /// Field order is `text` (file content), then the configured fields, then
    /// `Link`. Anything that cannot be resolved is omitted.
    pub fn project(&self, entity: &dyn Entity) -> IndexDocument {
        let class_name = entity.class_name();
        let mut doc = IndexDocument::new(ObjectRef::new(class_name, entity.id()).document_id());

        if let Some(file) = entity.file() {
            if !file.is_container {
                let path = self.content_path(&file.path);
                if let Some(text) = self.extractors.extract(&path) {
                    doc.push(TEXT_FIELD, text);
                }
            }
        }

        let configs = self.registry.configs(class_name);
        for config in configs {
            let mut value = resolve(entity, &config.source);
            if let Some(filter) = &config.filter {
                value = filter.apply(value);
            }
            emit(&mut doc, &config.name, value);
        }

        let has_link = configs
            .iter()
            .any(|c| c.source == LINK_FIELD || c.name == LINK_FIELD);
        if !has_link {
            if let Some(link) = entity.permalink() {
                doc.push(LINK_FIELD, link);
            }
        }

        doc
    }

    fn content_path(&self, path: &Path) -> PathBuf {
        match &self.assets_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Lists emit one entry per element; empty scalars emit nothing.
fn emit(doc: &mut IndexDocument, name: &str, value: Value) {
    match value {
        Value::List(items) => {
            for item in items {
                doc.push(name, item.to_text());
            }
        }
        v if v.is_empty() => {}
        v => doc.push(name, v.to_text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ObjectStore;
    use crate::fields::FieldSpec;
    use crate::testing::{blog_registry, blog_store, StaticExtractor};

    #[test]
    fn id_is_class_and_object_id() {
        let store = blog_store();
        let registry = blog_registry();
        let chain = ExtractorChain::new();
        let projector = Projector::new(&registry, &chain);
        let post = store.get_by_id("Post", 2).unwrap();
        let doc = projector.project(post.as_ref());
        assert_eq!(doc.id, "Post:2");
        assert_eq!(doc.first("ObjectID"), Some("2"));
        assert_eq!(doc.first("ClassName"), Some("Post"));
    }

    #[test]
    fn declared_fields_in_order_and_link_last() {
        let store = blog_store();
        let registry = blog_registry();
        let chain = ExtractorChain::new();
        let projector = Projector::new(&registry, &chain);
        let post = store.get_by_id("Post", 1).unwrap();
        let doc = projector.project(post.as_ref());
        assert_eq!(
            doc.field_names(),
            vec![
                "Title",
                "Content",
                "AuthorName",
                "Tags",
                "Keywords",
                "ObjectID",
                "ClassName",
                "LastEdited",
                "Link"
            ]
        );
        assert_eq!(doc.first("Content"), Some("Hello world & friends"));
        assert_eq!(doc.first("Tags"), Some("rust\nsearch\nsolr"));
        assert_eq!(doc.first("LastEdited"), Some("2024-05-01T10:00:00Z"));
        assert_eq!(doc.first("Link"), Some("/posts/hello/"));
    }

    #[test]
    fn multi_valued_fields_emit_one_entry_per_value() {
        let store = blog_store();
        let registry = blog_registry();
        let chain = ExtractorChain::new();
        let projector = Projector::new(&registry, &chain);

        let post = store.get_by_id("Post", 1).unwrap();
        let doc = projector.project(post.as_ref());
        assert_eq!(doc.values("Keywords"), vec!["alpha", "beta", "gamma"]);

        let bare = store.get_by_id("Post", 2).unwrap();
        let doc = projector.project(bare.as_ref());
        assert!(doc.values("Keywords").is_empty());
        assert!(doc.values("AuthorName").is_empty());
    }

    #[test]
    fn explicit_link_field_suppresses_permalink() {
        let store = blog_store();
        let mut registry = FieldRegistry::new();
        registry
            .register("Post", vec![FieldSpec::new("Title").named("Link")])
            .unwrap();
        let chain = ExtractorChain::new();
        let projector = Projector::new(&registry, &chain);
        let post = store.get_by_id("Post", 1).unwrap();
        let doc = projector.project(post.as_ref());
        assert_eq!(doc.values("Link"), vec!["Hello"]);
    }

    #[test]
    fn renamed_link_source_is_not_appended_again() {
        let store = blog_store();
        let mut registry = FieldRegistry::new();
        registry
            .register("Post", vec![FieldSpec::new("Link").named("URL")])
            .unwrap();
        let chain = ExtractorChain::new();
        let projector = Projector::new(&registry, &chain);
        let post = store.get_by_id("Post", 1).unwrap();
        let doc = projector.project(post.as_ref());
        assert_eq!(doc.values("URL"), vec!["/posts/hello/"]);
        assert!(doc.values("Link").is_empty());
    }

    #[test]
    fn file_content_comes_first() {
        let store = blog_store();
        let registry = blog_registry();
        let mut chain = ExtractorChain::new();
        chain.register(Box::new(StaticExtractor::new(&["pdf"], "manual body")));
        let projector = Projector::new(&registry, &chain).with_assets_root("/srv/assets");

        let file = store.get_by_id("File", 10).unwrap();
        let doc = projector.project(file.as_ref());
        assert_eq!(doc.fields[0], ("text".to_string(), "manual body".to_string()));

        let folder = store.get_by_id("Folder", 11).unwrap();
        let doc = projector.project(folder.as_ref());
        assert!(doc.first("text").is_none());
    }

    #[test]
    fn relative_paths_join_assets_root() {
        let registry = FieldRegistry::new();
        let chain = ExtractorChain::new();
        let projector = Projector::new(&registry, &chain).with_assets_root("/srv");
        assert_eq!(
            projector.content_path(Path::new("a/b.pdf")),
            PathBuf::from("/srv/a/b.pdf")
        );
        assert_eq!(
            projector.content_path(Path::new("/abs/b.pdf")),
            PathBuf::from("/abs/b.pdf")
        );
    }
}
