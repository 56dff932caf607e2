//! Dotted-path value resolution across relations.
//!
//! `resolve(entity, "Author.Name")` follows the `Author` relation and reads
//! `Name` on the related object. To-many relations resolve the rest of the
//! path against every related object and join the results with `"\n"`.
//! Resolution never fails: anything unresolvable yields [`Value::Null`].

use crate::entity::{Entity, Relation};
use crate::value::Value;

const RELATION_JOIN: &str = "\n";

/// Resolve `path` against `entity`.
pub fn resolve(entity: &dyn Entity, path: &str) -> Value {
    let Some((base, rest)) = path.split_once('.') else {
        return entity.get(path).unwrap_or_default();
    };

    match entity.relation(base) {
        Some(Relation::OneToOne(Some(related))) => resolve(related.as_ref(), rest),
        Some(Relation::OneToOne(None)) => Value::Null,
        Some(Relation::OneToMany(items)) | Some(Relation::ManyToMany(items)) => {
            let parts: Vec<String> = items
                .iter()
                .map(|item| resolve(item.as_ref(), rest).to_text())
                .collect();
            if parts.is_empty() {
                Value::Null
            } else {
                Value::Text(parts.join(RELATION_JOIN))
            }
        }
        None => Value::Text(String::new()),
    }
}
