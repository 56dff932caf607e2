//! Reindex progress reporting.
//!
//! Progress is emitted on **stderr** so stdout remains parseable for scripts.
//! `solr-bridge reindex run` reports one event per step; `reindex step`
//! reports the steps it was asked to take.

use std::io::Write;

/// A single progress event for a bulk reindex.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReindexProgressEvent {
    /// Index wiped and classes enumerated.
    Started { classes: usize, total: u64 },
    /// One page indexed: `done` objects out of `total` so far.
    Indexed {
        class_name: String,
        count: usize,
        done: u64,
        total: u64,
    },
    /// Every class exhausted.
    Finished { done: u64 },
}

/// Reports reindex progress. Implementations write to stderr (human or JSON).
pub trait ReindexProgressReporter: Send + Sync {
    fn report(&self, event: ReindexProgressEvent);
}

/// Human-friendly progress on stderr: "reindex Page  +127  1,234 / 5,000 objects".
pub struct StderrProgress;

impl ReindexProgressReporter for StderrProgress {
    fn report(&self, event: ReindexProgressEvent) {
        let line = match &event {
            ReindexProgressEvent::Started { classes, total } => format!(
                "reindex  started  {} classes, {} objects\n",
                classes,
                format_number(*total)
            ),
            ReindexProgressEvent::Indexed {
                class_name,
                count,
                done,
                total,
            } => format!(
                "reindex {}  +{}  {} / {} objects\n",
                class_name,
                count,
                format_number(*done),
                format_number(*total)
            ),
            ReindexProgressEvent::Finished { done } => {
                format!("reindex  done  {} objects\n", format_number(*done))
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ReindexProgressReporter for JsonProgress {
    fn report(&self, event: ReindexProgressEvent) {
        let obj = match &event {
            ReindexProgressEvent::Started { classes, total } => serde_json::json!({
                "event": "progress",
                "phase": "started",
                "classes": classes,
                "total": total
            }),
            ReindexProgressEvent::Indexed {
                class_name,
                count,
                done,
                total,
            } => serde_json::json!({
                "event": "progress",
                "phase": "indexing",
                "class": class_name,
                "count": count,
                "n": done,
                "total": total
            }),
            ReindexProgressEvent::Finished { done } => serde_json::json!({
                "event": "progress",
                "phase": "done",
                "n": done
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ReindexProgressReporter for NoProgress {
    fn report(&self, _event: ReindexProgressEvent) {}
}

pub(crate) fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ReindexProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
