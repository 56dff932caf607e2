//! `solr-bridge reindex`: resumable bulk reindexing.
//!
//! The cursor file is the job: `start` creates it, each `step` advances and
//! rewrites it, and the final step deletes it. An external scheduler can call
//! `reindex step` repeatedly; `reindex run` loops in-process.

use anyhow::{bail, Result};
use solr_bridge_core::reindex::{ReindexCoordinator, ReindexCursor, StepOutcome};

use super::Bridge;
use crate::cursor::CursorFile;
use crate::progress::{format_number, ReindexProgressEvent, ReindexProgressReporter};

fn cursor_file(bridge: &Bridge) -> CursorFile {
    CursorFile::new(&bridge.config.reindex.cursor_path)
}

/// Wipe the index and persist a fresh cursor. Overwrites any job in progress.
pub fn run_reindex_start(bridge: &Bridge, reporter: &dyn ReindexProgressReporter) -> Result<()> {
    let cursor = start(bridge, reporter)?;
    println!(
        "Reindex started: {} classes, {} objects.",
        cursor.pending_classes.len(),
        format_number(cursor.steps_total)
    );
    Ok(())
}

fn start(bridge: &Bridge, reporter: &dyn ReindexProgressReporter) -> Result<ReindexCursor> {
    let indexer = bridge.indexer();
    let coordinator = ReindexCoordinator::new(&indexer, &bridge.store)
        .with_page_size(bridge.config.reindex.page_size);
    let cursor = coordinator.setup();
    cursor_file(bridge).save(&cursor)?;
    reporter.report(ReindexProgressEvent::Started {
        classes: cursor.pending_classes.len(),
        total: cursor.steps_total,
    });
    Ok(cursor)
}

/// Advance the persisted job by up to `steps` pages.
pub fn run_reindex_step(
    bridge: &Bridge,
    steps: usize,
    reporter: &dyn ReindexProgressReporter,
) -> Result<()> {
    let Some(record) = cursor_file(bridge).load()? else {
        bail!("No reindex in progress. Run `solr-bridge reindex start` first.");
    };
    let mut cursor = record.cursor;
    let done = advance(bridge, &mut cursor, Some(steps), reporter)?;
    print_summary(&cursor, done);
    Ok(())
}

/// Run a whole job, resuming an interrupted one if a cursor exists.
pub fn run_reindex_run(bridge: &Bridge, reporter: &dyn ReindexProgressReporter) -> Result<()> {
    let mut cursor = match cursor_file(bridge).load()? {
        Some(record) => {
            println!(
                "Resuming reindex at {} / {} objects.",
                format_number(record.cursor.steps_done),
                format_number(record.cursor.steps_total)
            );
            record.cursor
        }
        None => start(bridge, reporter)?,
    };
    let done = advance(bridge, &mut cursor, None, reporter)?;
    print_summary(&cursor, done);
    Ok(())
}

/// Process steps until the job is done or `limit` steps have run. Returns
/// whether the job finished.
fn advance(
    bridge: &Bridge,
    cursor: &mut ReindexCursor,
    limit: Option<usize>,
    reporter: &dyn ReindexProgressReporter,
) -> Result<bool> {
    let file = cursor_file(bridge);
    let indexer = bridge.indexer();
    let coordinator = ReindexCoordinator::new(&indexer, &bridge.store)
        .with_page_size(bridge.config.reindex.page_size);

    let mut taken = 0usize;
    while limit.map_or(true, |max| taken < max) {
        match coordinator.process(cursor) {
            StepOutcome::Indexed {
                class_name, count, ..
            } => {
                file.save(cursor)?;
                reporter.report(ReindexProgressEvent::Indexed {
                    class_name,
                    count,
                    done: cursor.steps_done,
                    total: cursor.steps_total,
                });
                taken += 1;
            }
            StepOutcome::Done => {
                file.clear()?;
                reporter.report(ReindexProgressEvent::Finished {
                    done: cursor.steps_done,
                });
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn print_summary(cursor: &ReindexCursor, done: bool) {
    if done {
        println!(
            "Reindex complete: {} objects indexed.",
            format_number(cursor.steps_done)
        );
    } else {
        println!(
            "Reindex in progress: {} / {} objects.",
            format_number(cursor.steps_done),
            format_number(cursor.steps_total)
        );
    }
}

pub fn run_reindex_status(bridge: &Bridge) -> Result<()> {
    let file = cursor_file(bridge);
    let Some(record) = file.load()? else {
        println!("No reindex in progress.");
        return Ok(());
    };
    let cursor = &record.cursor;
    println!("cursor:     {}", file.path().display());
    println!("updated_at: {}", record.updated_at.to_rfc3339());
    println!(
        "progress:   {} / {} objects",
        format_number(cursor.steps_done),
        format_number(cursor.steps_total)
    );
    println!(
        "current:    {}",
        match &cursor.current_class {
            Some(class_name) => format!("{} (after ID {})", class_name, cursor.last_seen_id),
            None => "-".to_string(),
        }
    );
    let pending: Vec<&str> = cursor.pending_classes.iter().rev().map(String::as_str).collect();
    println!(
        "pending:    {}",
        if pending.is_empty() {
            "-".to_string()
        } else {
            pending.join(", ")
        }
    );
    Ok(())
}

/// Abandon the job. The index keeps whatever was already committed.
pub fn run_reindex_reset(bridge: &Bridge) -> Result<()> {
    if cursor_file(bridge).clear()? {
        println!("Reindex cursor removed.");
    } else {
        println!("No reindex in progress.");
    }
    Ok(())
}
