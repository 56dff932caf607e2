//! Resumable, step-budgeted bulk reindexing.
//!
//! The coordinator is a state machine over a [`ReindexCursor`]:
//!
//! ```text
//! setup() ──► [pending: B, A]  current: -
//! process ──► pop A, index A(1..=127)          Indexed { A, 127 }
//! process ──► index A(128..=150)               Indexed { A, 23 }
//! process ──► A exhausted, pop B, index B(..)  Indexed { B, 110 }
//! process ──► B exhausted, stack empty         Done
//! ```
//!
//! Every call to [`ReindexCoordinator::process`] ends with a commit, so the
//! cursor a caller persists after a step is never ahead of the index. After
//! an interruption, resuming from that cursor redoes at most one page.

use serde::{Deserialize, Serialize};

use crate::backend::{CommitMode, Indexer};
use crate::entity::{ObjectId, ObjectStore};

pub const DEFAULT_PAGE_SIZE: usize = 127;

/// Persisted job state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReindexCursor {
    /// Classes not yet started; the next class is at the end.
    pub pending_classes: Vec<String>,
    pub current_class: Option<String>,
    pub last_seen_id: ObjectId,
    pub steps_done: u64,
    pub steps_total: u64,
}

impl ReindexCursor {
    pub fn is_done(&self) -> bool {
        self.pending_classes.is_empty() && self.current_class.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StepOutcome {
    /// One page of `class_name` was indexed and committed.
    Indexed {
        class_name: String,
        count: usize,
        last_seen_id: ObjectId,
    },
    /// Nothing left to index.
    Done,
}

/// Drives an [`Indexer`] over every searchable class of a store.
pub struct ReindexCoordinator<'a> {
    indexer: &'a Indexer<'a>,
    store: &'a dyn ObjectStore,
    page_size: usize,
}

impl<'a> ReindexCoordinator<'a> {
    pub fn new(indexer: &'a Indexer<'a>, store: &'a dyn ObjectStore) -> Self {
        Self {
            indexer,
            store,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Wipe the index and build a fresh cursor over every searchable class.
    pub fn setup(&self) -> ReindexCursor {
        self.indexer.wipe(CommitMode::Deferred);

        let classes: Vec<String> = self
            .indexer
            .projector()
            .registry()
            .classes()
            .map(str::to_string)
            .collect();
        let steps_total = classes.iter().map(|c| self.store.count(c)).sum();

        self.indexer.commit();
        ReindexCursor {
            pending_classes: classes.into_iter().rev().collect(),
            current_class: None,
            last_seen_id: 0,
            steps_done: 0,
            steps_total,
        }
    }

    /// Advance by at most one page.
    pub fn process(&self, cursor: &mut ReindexCursor) -> StepOutcome {
        loop {
            let class_name = match &cursor.current_class {
                Some(class_name) => class_name.clone(),
                None => match cursor.pending_classes.pop() {
                    Some(next) => {
                        cursor.current_class = Some(next.clone());
                        cursor.last_seen_id = 0;
                        next
                    }
                    None => {
                        self.indexer.commit();
                        return StepOutcome::Done;
                    }
                },
            };

            let page = self
                .store
                .page_after(&class_name, cursor.last_seen_id, self.page_size);
            if page.is_empty() {
                cursor.current_class = None;
                continue;
            }

            let count = page.len();
            for entity in page {
                self.indexer.index(entity.as_ref(), CommitMode::Deferred);
                cursor.last_seen_id = entity.id();
            }
            cursor.steps_done += count as u64;
            self.indexer.commit();

            return StepOutcome::Indexed {
                class_name,
                count,
                last_seen_id: cursor.last_seen_id,
            };
        }
    }
}
