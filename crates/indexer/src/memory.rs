use crate::{ChangeLockResolver, IndexError, LiveCellSource};
use async_trait::async_trait;
use datatypes::{Cell, Paginate, Script};
use std::sync::atomic::{AtomicUsize, Ordering};

const DEFAULT_PAGE_SIZE: usize = 10;

/// Live cell index held in memory.
///
/// Pages through its cells in insertion order with a numeric offset cursor
/// and, like the wallet's own listing, ignores the lock hint: every owner's
/// cells come back and filtering is left to the consumer.
#[derive(Debug)]
pub struct MemoryIndex {
    cells: Vec<Cell>,
    page_size: usize,
    change_locks: Vec<Script>,
    fail_from: Option<usize>,
    empty_final_cursor: bool,
    queries: AtomicUsize,
}

impl Default for MemoryIndex {
    fn default() -> Self {
        MemoryIndex {
            cells: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
            change_locks: Vec::new(),
            fail_from: None,
            empty_final_cursor: false,
            queries: AtomicUsize::new(0),
        }
    }
}

impl MemoryIndex {
    pub fn new(cells: Vec<Cell>) -> Self {
        MemoryIndex {
            cells,
            ..Default::default()
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_change_locks(mut self, locks: Vec<Script>) -> Self {
        self.change_locks = locks;
        self
    }

    /// Close the listing with an empty cursor on the page holding the last
    /// cell, instead of an extra empty page.
    pub fn with_empty_final_cursor(mut self) -> Self {
        self.empty_final_cursor = true;
        self
    }

    /// Every query from the `nth` (zero based) on fails.
    pub fn failing_from(mut self, nth: usize) -> Self {
        self.fail_from = Some(nth);
        self
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LiveCellSource for MemoryIndex {
    async fn query(
        &self,
        _lock: Option<&Script>,
        cursor: Option<&str>,
    ) -> Result<Paginate<Cell>, IndexError> {
        let nth = self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_from.is_some_and(|from| nth >= from) {
            return Err(IndexError::Rpc {
                code: -1,
                message: "index unavailable".to_string(),
            });
        }

        let offset = match cursor {
            None | Some("") => 0,
            Some(c) => c.parse::<usize>().map_err(|_| IndexError::Rpc {
                code: -32602,
                message: format!("invalid cursor: {}", c),
            })?,
        };
        let start = offset.min(self.cells.len());
        let end = (start + self.page_size).min(self.cells.len());
        let objects = self.cells[start..end].to_vec();
        let last_page = end == self.cells.len() && self.empty_final_cursor;
        let cursor = if objects.is_empty() || last_page {
            String::new()
        } else {
            end.to_string()
        };

        Ok(Paginate { objects, cursor })
    }
}

#[async_trait]
impl ChangeLockResolver for MemoryIndex {
    async fn internal_change_locks(&self) -> Result<Vec<Script>, IndexError> {
        Ok(self.change_locks.clone())
    }
}
