use anyhow::Result;
use solr_bridge_core::entity::{Entity, ObjectStore};
use solr_bridge_core::query::{QueryRequest, QueryResult, SortDirection};

use super::Bridge;

/// Options for `solr-bridge search`.
#[derive(Debug, Default)]
pub struct SearchOptions {
    pub sort: Option<String>,
    pub desc: bool,
    pub start: u64,
    pub rows: Option<u64>,
    pub params: Vec<String>,
    pub json: bool,
}

impl SearchOptions {
    pub fn request(&self, text: &str) -> QueryRequest {
        let mut request = QueryRequest::new(text).offset(self.start);
        if let Some(field) = &self.sort {
            let direction = if self.desc {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            };
            request = request.sort(field, direction);
        }
        if let Some(rows) = self.rows {
            request = request.limit(rows);
        }
        for param in &self.params {
            request = request.param(param.clone());
        }
        request
    }
}

pub fn run_search(bridge: &Bridge, text: &str, options: &SearchOptions) -> Result<()> {
    let result = bridge.translator().search(&options.request(text));

    if options.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    print_result(bridge, &result);
    Ok(())
}

fn print_result(bridge: &Bridge, result: &QueryResult) {
    if result.hits.is_empty() {
        println!("No results.");
    }
    for (i, hit) in result.hits.iter().enumerate() {
        println!("{}. {}", i + 1, hit);
        if let Some(entity) = bridge.store.get_by_id(&hit.class_name, hit.id) {
            if let Some(title) = entity.get("Title") {
                println!("    title: {}", title.to_text());
            }
            if let Some(link) = entity.permalink() {
                println!("    link: {}", link);
            }
        }
    }
    println!();
    println!("total: {}", result.total_hits);

    for (field, counts) in &result.facets {
        println!();
        println!("facet {}:", field);
        for (value, count) in counts.iter() {
            println!("    {:<24} {}", value, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_build_request() {
        let options = SearchOptions {
            sort: Some("Title".to_string()),
            desc: true,
            start: 10,
            rows: Some(5),
            params: vec!["fq=ClassName:Page".to_string()],
            json: false,
        };
        let request = options.request("hello");
        assert_eq!(request.text, "hello");
        assert_eq!(request.sort, Some(("Title".to_string(), SortDirection::Desc)));
        assert_eq!(request.offset, 10);
        assert_eq!(request.limit, Some(5));
        assert_eq!(request.extra_params, vec!["fq=ClassName:Page".to_string()]);
    }

    #[test]
    fn defaults_leave_sort_and_limit_unset() {
        let request = SearchOptions::default().request("");
        assert_eq!(request.sort, None);
        assert_eq!(request.limit, None);
        assert_eq!(request.offset, 0);
    }
}
