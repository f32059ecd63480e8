//! Range scans without server-side cursor state.
//!
//! Each page is an independent `[start, stop)` query. After a non-empty page
//! the next start is the closest row after the page's last key, so a scan can
//! continue on a fresh connection and never visits a row twice. The scan ends
//! on the first empty page.

use std::collections::VecDeque;

use log::debug;
use tonic::Status;

use crate::backend::Backend;
use crate::codec::closest_row_after;
use crate::error::{Error, Result};
use crate::proto::TScan;
use crate::session::{backend_error, Row, Session};

const CONTEXT: &str = "error GetScannerResults";

/// Where a scan starts, where it stops, and how many rows each page holds.
///
/// `start` is inclusive and `stop` exclusive. An empty `stop` leaves the range
/// open-ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanCursor {
    start: Vec<u8>,
    stop: Vec<u8>,
    page_size: i32,
}

impl ScanCursor {
    pub fn new(start: &[u8], stop: &[u8], page_size: i32) -> Result<Self> {
        if page_size <= 0 {
            return Err(Error::InvalidArgument(format!(
                "page size must be positive, got {}",
                page_size
            )));
        }
        Ok(ScanCursor {
            start: start.to_vec(),
            stop: stop.to_vec(),
            page_size,
        })
    }

    /// The same range, restarted just after `row`.
    pub fn resume_after(&self, row: &[u8]) -> Self {
        ScanCursor {
            start: closest_row_after(row),
            ..self.clone()
        }
    }

    pub fn start(&self) -> &[u8] {
        &self.start
    }

    pub fn stop(&self) -> &[u8] {
        &self.stop
    }

    pub fn page_size(&self) -> i32 {
        self.page_size
    }

    pub fn is_bounded(&self) -> bool {
        !self.stop.is_empty()
    }

    /// True when no key can fall in `[start, stop)`.
    pub fn is_empty(&self) -> bool {
        self.is_bounded() && self.start >= self.stop
    }

    fn to_scan(&self) -> TScan {
        TScan {
            start_row: Some(self.start.clone()),
            stop_row: self.is_bounded().then(|| self.stop.clone()),
            ..Default::default()
        }
    }
}

/// A lazy scan over one table. Obtain one with [`Session::scan`].
pub struct Scanner<'a, B> {
    session: &'a Session<B>,
    table: String,
    cursor: ScanCursor,
    buffered: VecDeque<Row>,
    pages: usize,
    done: bool,
}

impl<'a, B: Backend> Scanner<'a, B> {
    pub(crate) fn new(session: &'a Session<B>, table: &str, cursor: ScanCursor) -> Self {
        let done = cursor.is_empty();
        Scanner {
            session,
            table: table.to_string(),
            cursor,
            buffered: VecDeque::new(),
            pages: 0,
            done,
        }
    }

    /// The start key of the next page. A new scanner built from
    /// `ScanCursor::new(resume_key, stop, page_size)` picks up exactly here.
    pub fn resume_key(&self) -> &[u8] {
        self.cursor.start()
    }

    pub fn cursor(&self) -> &ScanCursor {
        &self.cursor
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages
    }

    pub fn is_done(&self) -> bool {
        self.done && self.buffered.is_empty()
    }

    /// Fetches the next page. Returns `None` once the range is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Row>>> {
        if self.done {
            return Ok(None);
        }

        let results = self
            .session
            .connection()
            .await?
            .scan_page(self.table.as_bytes(), self.cursor.to_scan(), self.cursor.page_size)
            .await
            .map_err(|status| backend_error(CONTEXT, status))?;
        self.pages += 1;

        if results.is_empty() {
            debug!("scan of {} finished after {} pages", self.table, self.pages);
            self.done = true;
            return Ok(None);
        }

        let mut rows = Vec::with_capacity(results.len());
        for result in results {
            let key = result
                .row
                .ok_or_else(|| backend_error(CONTEXT, Status::data_loss("scan returned a row without a key")))?;
            rows.push(Row {
                key,
                columns: result.column_values,
            });
        }

        // rows is non-empty here
        let last = &rows[rows.len() - 1].key;
        if last.as_slice() < self.cursor.start() {
            self.done = true;
            return Err(backend_error(
                CONTEXT,
                Status::internal("scan page did not advance past its start row"),
            ));
        }
        self.cursor = self.cursor.resume_after(last);
        debug!(
            "scan of {} fetched {} rows, next page starts at {:?}",
            self.table,
            rows.len(),
            String::from_utf8_lossy(self.cursor.start())
        );

        Ok(Some(rows))
    }

    /// Yields rows one at a time, fetching pages as needed.
    pub async fn next_row(&mut self) -> Result<Option<Row>> {
        loop {
            if let Some(row) = self.buffered.pop_front() {
                return Ok(Some(row));
            }
            match self.next_page().await? {
                Some(rows) => self.buffered.extend(rows),
                None => return Ok(None),
            }
        }
    }

    /// Drains the scan into a vector.
    pub async fn collect_rows(mut self) -> Result<Vec<Row>> {
        let mut rows: Vec<Row> = self.buffered.drain(..).collect();
        while let Some(page) = self.next_page().await? {
            rows.extend(page);
        }
        Ok(rows)
    }
}
