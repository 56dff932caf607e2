//! Named content filters applied to resolved values before projection.
//!
//! Filters are plain functions looked up by name once, when a class's fields
//! are registered. An unknown name is a configuration error.

use crate::value::Value;

/// A named `Value -> Value` transformation.
#[derive(Clone, Copy)]
pub struct ContentFilter {
    pub name: &'static str,
    pub apply: fn(Value) -> Value,
}

impl ContentFilter {
    pub fn apply(&self, value: Value) -> Value {
        (self.apply)(value)
    }
}

impl std::fmt::Debug for ContentFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ContentFilter").field(&self.name).finish()
    }
}

impl PartialEq for ContentFilter {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

const BUILTIN: &[ContentFilter] = &[
    ContentFilter {
        name: "strip_html",
        apply: strip_html,
    },
    ContentFilter {
        name: "lowercase",
        apply: lowercase,
    },
    ContentFilter {
        name: "trim",
        apply: trim,
    },
    ContentFilter {
        name: "split_commas",
        apply: split_commas,
    },
    ContentFilter {
        name: "split_lines",
        apply: split_lines,
    },
];

/// Look up a built-in filter by name.
pub fn lookup(name: &str) -> Option<ContentFilter> {
    BUILTIN.iter().find(|f| f.name == name).copied()
}

/// Names of all built-in filters.
pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTIN.iter().map(|f| f.name)
}

/// Map text elements, leaving other scalars untouched.
fn map_text(value: Value, f: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Text(s) => Value::Text(f(&s)),
        Value::List(items) => Value::List(items.into_iter().map(|v| map_text(v, f)).collect()),
        other => other,
    }
}

/// Remove markup tags and decode the common entities.
pub fn strip_html(value: Value) -> Value {
    map_text(value, &|s| {
        let mut out = String::with_capacity(s.len());
        let mut in_tag = false;
        for c in s.chars() {
            match c {
                '<' => in_tag = true,
                '>' if in_tag => {
                    in_tag = false;
                    out.push(' ');
                }
                _ if !in_tag => out.push(c),
                _ => {}
            }
        }
        let decoded = out
            .replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&amp;", "&");
        decoded.split_whitespace().collect::<Vec<_>>().join(" ")
    })
}

pub fn lowercase(value: Value) -> Value {
    map_text(value, &|s| s.to_lowercase())
}

pub fn trim(value: Value) -> Value {
    map_text(value, &|s| s.trim().to_string())
}

fn split_on(value: Value, sep: char) -> Value {
    match value {
        Value::Text(s) => Value::List(
            s.split(sep)
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(Value::from)
                .collect(),
        ),
        other => other,
    }
}

/// Turn `"a, b,c"` into a list, one entry per non-empty item.
pub fn split_commas(value: Value) -> Value {
    split_on(value, ',')
}

pub fn split_lines(value: Value) -> Value {
    split_on(value, '\n')
}
