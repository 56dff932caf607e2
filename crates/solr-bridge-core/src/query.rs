//! Query building and response decoding.
//!
//! A [`QueryRequest`] becomes select parameters in a fixed order
//! (`q`, `version`, `start`, `rows`, `sort`, `wt`) followed by the caller's
//! raw extras. An extra naming one of the built-ins replaces it; `wt` is
//! always `json`.
//!
//! Decoding never fails. A response that is not JSON, not an object, or has
//! no `response.docs` array is an empty result. Hits whose object no longer
//! exists are dropped without touching the reported total.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::backend::IndexBackend;
use crate::entity::{ObjectId, ObjectRef, ObjectStore};
use crate::fields::{CLASS_NAME_FIELD, OBJECT_ID_FIELD};
use crate::wire::SelectParams;

pub const DEFAULT_QUERY: &str = "*:*";
pub const DEFAULT_ROWS: u64 = 25;
const QUERY_VERSION: &str = "2.2";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// A search as the caller describes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryRequest {
    pub text: String,
    /// `None` sorts by relevance, descending.
    pub sort: Option<(String, SortDirection)>,
    pub offset: u64,
    /// `None` uses the translator's configured page size.
    pub limit: Option<u64>,
    /// Raw `key=value` parameters appended to the request.
    pub extra_params: Vec<String>,
}

impl QueryRequest {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn sort(mut self, field: &str, direction: SortDirection) -> Self {
        self.sort = Some((field.to_string(), direction));
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn param(mut self, raw: impl Into<String>) -> Self {
        self.extra_params.push(raw.into());
        self
    }
}

/// Facet values and their counts, in backend order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetCounts(pub Vec<(String, u64)>);

impl FacetCounts {
    pub fn get(&self, value: &str) -> Option<u64> {
        self.0.iter().find(|(v, _)| v == value).map(|(_, c)| *c)
    }

    pub fn values(&self) -> Vec<&str> {
        self.0.iter().map(|(v, _)| v.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(v, c)| (v.as_str(), *c))
    }
}

impl Serialize for FacetCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (value, count) in &self.0 {
            map.serialize_entry(value, count)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryResult {
    pub hits: Vec<ObjectRef>,
    pub total_hits: u64,
    pub facets: BTreeMap<String, FacetCounts>,
}

/// Issues searches through a backend and maps hits back to live objects.
pub struct QueryTranslator<'a> {
    backend: &'a dyn IndexBackend,
    store: &'a dyn ObjectStore,
    default_query: String,
    rows: u64,
}

impl<'a> QueryTranslator<'a> {
    pub fn new(backend: &'a dyn IndexBackend, store: &'a dyn ObjectStore) -> Self {
        Self {
            backend,
            store,
            default_query: DEFAULT_QUERY.to_string(),
            rows: DEFAULT_ROWS,
        }
    }

    /// Query used when the request text is blank.
    pub fn with_default_query(mut self, query: &str) -> Self {
        self.default_query = query.to_string();
        self
    }

    /// Page size used when the request has no limit.
    pub fn with_rows(mut self, rows: u64) -> Self {
        self.rows = rows;
        self
    }

    /// Select parameters for `request`.
    pub fn params(&self, request: &QueryRequest) -> SelectParams {
        let overridden = |key: &str| {
            request
                .extra_params
                .iter()
                .any(|raw| param_key(raw) == key)
        };

        let text = request.text.trim();
        let q = if text.is_empty() {
            self.default_query.clone()
        } else {
            text.to_string()
        };
        let sort = match &request.sort {
            Some((field, dir)) => format!("{} {}", field, dir.as_str()),
            None => "score desc".to_string(),
        };
        let builtins = [
            ("q", q),
            ("version", QUERY_VERSION.to_string()),
            ("start", request.offset.to_string()),
            ("rows", request.limit.unwrap_or(self.rows).to_string()),
            ("sort", sort),
        ];

        let mut params = SelectParams::new();
        for (key, value) in builtins {
            if !overridden(key) {
                params = params.pair(key, value);
            }
        }
        params = params.pair("wt", "json");
        for raw in &request.extra_params {
            if param_key(raw) != "wt" {
                params = params.raw(raw.clone());
            }
        }
        params
    }

    pub fn search(&self, request: &QueryRequest) -> QueryResult {
        let Some(body) = self.backend.select(&self.params(request)) else {
            return QueryResult::default();
        };
        let mut result = decode(&body);
        result
            .hits
            .retain(|hit| self.store.get_by_id(&hit.class_name, hit.id).is_some());
        result
    }

    /// Search with default sort, offset, and page size.
    pub fn find(&self, text: &str) -> QueryResult {
        self.search(&QueryRequest::new(text))
    }
}

fn param_key(raw: &str) -> &str {
    raw.split_once('=').map(|(k, _)| k).unwrap_or(raw)
}

/// Decode a select response body. Hits are not checked for liveness.
pub fn decode(body: &str) -> QueryResult {
    let Ok(JsonValue::Object(root)) = serde_json::from_str::<JsonValue>(body) else {
        return QueryResult::default();
    };
    let Some(response) = root.get("response") else {
        return QueryResult::default();
    };
    let Some(docs) = response.get("docs").and_then(JsonValue::as_array) else {
        return QueryResult::default();
    };

    let hits = docs.iter().filter_map(decode_hit).collect();
    let total_hits = response
        .get("numFound")
        .and_then(JsonValue::as_u64)
        .unwrap_or(0);
    let facets = root
        .get("facet_counts")
        .and_then(|f| f.get("facet_fields"))
        .and_then(JsonValue::as_object)
        .map(|fields| {
            fields
                .iter()
                .filter_map(|(name, flat)| {
                    flat.as_array()
                        .map(|items| (name.clone(), decode_facet_pairs(items)))
                })
                .collect()
        })
        .unwrap_or_default();

    QueryResult {
        hits,
        total_hits,
        facets,
    }
}

/// `numFound` of a select response.
pub fn decode_num_found(body: &str) -> Option<u64> {
    let json: JsonValue = serde_json::from_str(body).ok()?;
    json.get("response")?.get("numFound")?.as_u64()
}

fn decode_hit(doc: &JsonValue) -> Option<ObjectRef> {
    let class_name = single(doc.get(CLASS_NAME_FIELD)?)?.as_str()?;
    let id = decode_id(single(doc.get(OBJECT_ID_FIELD)?)?)?;
    Some(ObjectRef::new(class_name, id))
}

/// Stored fields may come back as one-element arrays.
fn single(value: &JsonValue) -> Option<&JsonValue> {
    match value {
        JsonValue::Array(items) if items.len() == 1 => items.first(),
        JsonValue::Array(_) => None,
        other => Some(other),
    }
}

fn decode_id(value: &JsonValue) -> Option<ObjectId> {
    match value {
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `[value0, count0, value1, count1, ...]` into ordered pairs.
fn decode_facet_pairs(items: &[JsonValue]) -> FacetCounts {
    FacetCounts(
        items
            .chunks_exact(2)
            .filter_map(|pair| {
                let value = match &pair[0] {
                    JsonValue::String(s) => s.clone(),
                    other => other.to_string(),
                };
                pair[1].as_u64().map(|count| (value, count))
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{blog_store, RecordingBackend};

    #[test]
    fn empty_text_is_match_all_by_relevance() {
        let backend = RecordingBackend::new();
        let store = blog_store();
        let translator = QueryTranslator::new(&backend, &store).with_rows(10);
        let params = translator.params(&QueryRequest::new("   "));
        assert_eq!(
            params.pairs,
            vec![
                ("q".to_string(), "*:*".to_string()),
                ("version".to_string(), "2.2".to_string()),
                ("start".to_string(), "0".to_string()),
                ("rows".to_string(), "10".to_string()),
                ("sort".to_string(), "score desc".to_string()),
                ("wt".to_string(), "json".to_string()),
            ]
        );
        assert!(params.raw.is_empty());
    }

    #[test]
    fn explicit_sort_offset_limit() {
        let backend = RecordingBackend::new();
        let store = blog_store();
        let translator = QueryTranslator::new(&backend, &store);
        let request = QueryRequest::new("solr")
            .sort("LastEdited", SortDirection::Asc)
            .offset(20)
            .limit(10);
        let params = translator.params(&request);
        assert_eq!(params.get("q"), Some("solr"));
        assert_eq!(params.get("sort"), Some("LastEdited asc"));
        assert_eq!(params.get("start"), Some("20"));
        assert_eq!(params.get("rows"), Some("10"));
    }

    #[test]
    fn extra_rows_overrides_limit() {
        let backend = RecordingBackend::new();
        let store = blog_store();
        let translator = QueryTranslator::new(&backend, &store);
        let request = QueryRequest::new("x").limit(50).param("rows=5").param("wt=xml");
        let params = translator.params(&request);
        assert!(params.pairs.iter().all(|(k, _)| k != "rows"));
        assert_eq!(params.raw, vec!["rows=5".to_string()]);
        assert_eq!(params.get("rows"), Some("5"));
        assert_eq!(params.get("wt"), Some("json"));
    }

    #[test]
    fn facets_keep_backend_order() {
        let result = decode(
            r#"{"response":{"numFound":0,"docs":[]},
                "facet_counts":{"facet_fields":{"color":["red",3,"blue",7]}}}"#,
        );
        let color = &result.facets["color"];
        assert_eq!(color.values(), vec!["red", "blue"]);
        assert_eq!(color.get("red"), Some(3));
        assert_eq!(color.get("blue"), Some(7));
    }

    #[test]
    fn odd_and_malformed_facet_entries_are_dropped() {
        let result = decode(
            r#"{"response":{"numFound":0,"docs":[]},
                "facet_counts":{"facet_fields":{"year":[2024,5,"x","many","tail"]}}}"#,
        );
        assert_eq!(result.facets["year"].0, vec![("2024".to_string(), 5)]);
    }

    #[test]
    fn missing_docs_is_empty_result() {
        for body in [
            r#"{"response":{"numFound":9}}"#,
            r#"{"error":"boom"}"#,
            "[1,2,3]",
            "not json",
        ] {
            assert_eq!(decode(body), QueryResult::default(), "{}", body);
        }
    }

    #[test]
    fn hits_decode_scalar_string_and_array_ids() {
        let result = decode(
            r#"{"response":{"numFound":4,"docs":[
                {"ClassName":"Post","ObjectID":1},
                {"ClassName":["Post"],"ObjectID":["2"]},
                {"ClassName":"Post","ObjectID":"abc"},
                {"ObjectID":3}
            ]}}"#,
        );
        assert_eq!(
            result.hits,
            vec![ObjectRef::new("Post", 1), ObjectRef::new("Post", 2)]
        );
        assert_eq!(result.total_hits, 4);
    }

    #[test]
    fn stale_hits_are_dropped_but_total_is_kept() {
        let backend = RecordingBackend::new();
        backend.respond_with(
            r#"{"response":{"numFound":3,"docs":[
                {"ClassName":"Post","ObjectID":1},
                {"ClassName":"Post","ObjectID":999},
                {"ClassName":"Post","ObjectID":2}
            ]}}"#,
        );
        let store = blog_store();
        let translator = QueryTranslator::new(&backend, &store);
        let result = translator.find("hello");
        assert_eq!(
            result.hits,
            vec![ObjectRef::new("Post", 1), ObjectRef::new("Post", 2)]
        );
        assert_eq!(result.total_hits, 3);
    }

    #[test]
    fn unreachable_backend_is_empty_result() {
        let backend = RecordingBackend::new();
        let store = blog_store();
        let translator = QueryTranslator::new(&backend, &store);
        assert_eq!(translator.find(""), QueryResult::default());
    }

    #[test]
    fn facet_counts_serialize_as_ordered_object() {
        let counts = FacetCounts(vec![("z".into(), 1), ("a".into(), 2)]);
        assert_eq!(serde_json::to_string(&counts).unwrap(), r#"{"z":1,"a":2}"#);
    }
}
