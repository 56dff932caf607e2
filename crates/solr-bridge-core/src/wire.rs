//! Index mutation payloads and select parameters.
//!
//! Mutations are XML documents POSTed to the backend's update handler:
//!
//! ```text
//! <add overwrite="true"><doc><field name="id">Page:1</field><field name="Title"><![CDATA[Home]]></field></doc></add>
//! <delete><query>ObjectID:1 AND ClassName:Page</query></delete>
//! <delete><query>*:*</query></delete>
//! <commit/>
//! <optimize/>
//! ```

use quick_xml::escape::escape;

use crate::document::IndexDocument;
use crate::entity::ObjectRef;

pub const COMMIT: &str = "<commit/>";
pub const OPTIMIZE: &str = "<optimize/>";
pub const WIPE: &str = "<delete><query>*:*</query></delete>";

/// `<add>` payload replacing any document with the same id.
pub fn add(doc: &IndexDocument) -> String {
    let mut xml = String::from(r#"<add overwrite="true"><doc>"#);
    xml.push_str(r#"<field name="id">"#);
    xml.push_str(&escape(doc.id.as_str()));
    xml.push_str("</field>");
    for (name, value) in &doc.fields {
        xml.push_str(r#"<field name=""#);
        xml.push_str(&escape(name.as_str()));
        xml.push_str(r#"">"#);
        push_cdata(&mut xml, value);
        xml.push_str("</field>");
    }
    xml.push_str("</doc></add>");
    xml
}

/// `<delete>` payload matching exactly one object.
pub fn delete(object: &ObjectRef) -> String {
    format!(
        "<delete><query>ObjectID:{} AND ClassName:{}</query></delete>",
        object.id,
        escape(object.class_name.as_str())
    )
}

/// Wrap `text` in CDATA. A literal `]]>` is split across two sections.
fn push_cdata(out: &mut String, text: &str) {
    out.push_str("<![CDATA[");
    out.push_str(&text.replace("]]>", "]]]]><![CDATA[>"));
    out.push_str("]]>");
}

/// Parameters for a select request.
///
/// `pairs` are URL-encoded by the transport; `raw` entries are caller-supplied
/// `key=value` strings appended verbatim after them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectParams {
    pub pairs: Vec<(String, String)>,
    pub raw: Vec<String>,
}

impl SelectParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pair(mut self, key: &str, value: impl Into<String>) -> Self {
        self.pairs.push((key.to_string(), value.into()));
        self
    }

    pub fn raw(mut self, param: impl Into<String>) -> Self {
        self.raw.push(param.into());
        self
    }

    /// Effective value of `key`: the last raw entry naming it wins over the
    /// built-in pair.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.raw
            .iter()
            .rev()
            .find_map(|r| match r.split_once('=') {
                Some((k, v)) if k == key => Some(v),
                _ => None,
            })
            .or_else(|| {
                self.pairs
                    .iter()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.as_str())
            })
    }

    /// Parameters that only count documents.
    pub fn count() -> Self {
        Self::new()
            .pair("q", "*:*")
            .pair("rows", "0")
            .pair("wt", "json")
    }
}
