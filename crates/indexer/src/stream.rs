use crate::{IndexError, LiveCellSource};
use datatypes::{Cell, Script};
use std::collections::VecDeque;
use tracing::debug;

/// Lazy walk over the live cells owned by one lock, or over every cell when
/// no lock is given.
///
/// Pages are pulled from the source only when the buffered page runs dry, so
/// a consumer that stops early never pays for the rest of the index. Dropping
/// a pending [`CellStream::next`] leaves the stream as it was before the call.
pub struct CellStream<'a, S: ?Sized> {
    source: &'a S,
    lock: Option<Script>,
    cursor: Option<String>,
    buffered: VecDeque<Cell>,
    exhausted: bool,
    pages_fetched: usize,
}

impl<'a, S: LiveCellSource + ?Sized> CellStream<'a, S> {
    pub fn new(source: &'a S, lock: Option<Script>) -> Self {
        CellStream {
            source,
            lock,
            cursor: None,
            buffered: VecDeque::new(),
            exhausted: false,
            pages_fetched: 0,
        }
    }

    pub fn lock(&self) -> Option<&Script> {
        self.lock.as_ref()
    }

    /// False once the index reported its last page and every buffered cell
    /// has been handed out. True does not promise another cell: the pages
    /// left may hold no matching ones.
    pub fn has_more(&self) -> bool {
        !self.buffered.is_empty() || !self.exhausted
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    pub async fn next(&mut self) -> Result<Option<Cell>, IndexError> {
        loop {
            if let Some(cell) = self.buffered.pop_front() {
                return Ok(Some(cell));
            }
            if self.exhausted {
                return Ok(None);
            }
            self.fetch_page().await?;
        }
    }

    /// Drain the stream. Only for sources known to be small.
    pub async fn collect_remaining(mut self) -> Result<Vec<Cell>, IndexError> {
        let mut cells = Vec::new();
        while let Some(cell) = self.next().await? {
            cells.push(cell);
        }
        Ok(cells)
    }

    async fn fetch_page(&mut self) -> Result<(), IndexError> {
        let page = self
            .source
            .query(self.lock.as_ref(), self.cursor.as_deref())
            .await?;
        self.pages_fetched += 1;
        debug!(
            "fetched page {} with {} cells, next cursor {:?}",
            self.pages_fetched,
            page.objects.len(),
            page.cursor
        );

        if page.objects.is_empty() {
            self.exhausted = true;
            return Ok(());
        }
        // a page without a follow-up cursor is the last one
        if page.cursor.is_empty() {
            self.exhausted = true;
        } else {
            self.cursor = Some(page.cursor);
        }

        let lock = self.lock.as_ref();
        self.buffered.extend(
            page.objects
                .into_iter()
                .filter(|cell| lock.map_or(true, |l| cell.lock() == l)),
        );
        Ok(())
    }
}
