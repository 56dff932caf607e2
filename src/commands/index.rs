//! Single-item and control operations.
//!
//! These are the host's "object saved / object deleted" hooks, so every
//! mutation commits immediately.

use anyhow::{bail, Result};
use solr_bridge_core::backend::CommitMode;
use solr_bridge_core::entity::{ObjectId, ObjectStore};
use solr_bridge_core::wire;

use super::Bridge;

/// Print the document an object projects to, and its add payload.
pub fn run_project(bridge: &Bridge, class_name: &str, id: ObjectId) -> Result<()> {
    let Some(entity) = bridge.store.get_by_id(class_name, id) else {
        bail!("No {} with ID {}", class_name, id);
    };
    if !bridge.registry.is_searchable(class_name) {
        eprintln!("Warning: class '{}' is not searchable; it would not be indexed", class_name);
    }
    let doc = bridge.projector().project(entity.as_ref());

    println!("--- Document ---");
    println!("id: {}", doc.id);
    for (name, value) in &doc.fields {
        println!("{}: {}", name, value.replace('\n', "\\n"));
    }
    println!();
    println!("--- Payload ---");
    println!("{}", wire::add(&doc));
    Ok(())
}

pub fn run_index(bridge: &Bridge, class_name: &str, id: ObjectId) -> Result<()> {
    let Some(entity) = bridge.store.get_by_id(class_name, id) else {
        bail!("No {} with ID {}", class_name, id);
    };
    if bridge.indexer().index(entity.as_ref(), CommitMode::Immediate) {
        println!("Indexed {}:{}", class_name, id);
    } else {
        println!("Skipped {}:{} (class is not searchable)", class_name, id);
    }
    Ok(())
}

/// Remove a document. The object itself does not need to exist any more.
pub fn run_delete(bridge: &Bridge, class_name: &str, id: ObjectId) -> Result<()> {
    bridge.indexer().remove(class_name, id, CommitMode::Immediate);
    println!("Deleted {}:{}", class_name, id);
    Ok(())
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Control {
    Commit,
    Optimize,
    Wipe,
    Count,
}

pub fn run_control(bridge: &Bridge, control: Control) -> Result<()> {
    let indexer = bridge.indexer();
    match control {
        Control::Commit => {
            indexer.commit();
            println!("Committed.");
        }
        Control::Optimize => {
            indexer.optimize();
            println!("Optimized.");
        }
        Control::Wipe => {
            indexer.wipe(CommitMode::Immediate);
            println!("Index wiped.");
        }
        Control::Count => println!("{}", indexer.count()),
    }
    Ok(())
}
