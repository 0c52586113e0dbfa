//! Pagination Controller
//!
//! Three ways to consume a cursor-paged query, all built on one fetch primitive
//! ([`PageSource::fetch_page`]):
//!
//! - [`Paginator::single`]: one page, cursor handed back to the caller.
//! - [`Paginator::all`]: every page, concatenated in memory. Memory grows with
//!   the result set; prefer the stream for large databases.
//! - [`Paginator::into_stream`]: a lazy, single-pass stream that fetches the next
//!   page only once the consumer has drained the current one. Dropping the
//!   stream stops all further fetching.
//!
//! Pages are always fetched sequentially, one request in flight at a time.

use crate::error::{ClientError, TransportError};
use crate::record::{PageRecord, RecordCodec};
use crate::transport::{Page, QueryRequest, Transport};
use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use serde_json::Value;
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, warn};

/// The single fetch primitive pagination is built on
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, cursor: Option<String>) -> Result<Page, TransportError>;
}

/// A fixed, already-translated query against one database
pub struct DatabaseQuery {
    transport: Arc<dyn Transport>,
    database_id: String,
    filter: Option<Value>,
    sorts: Vec<Value>,
    page_size: Option<u32>,
}

impl DatabaseQuery {
    pub fn new(
        transport: Arc<dyn Transport>,
        database_id: impl Into<String>,
        filter: Option<Value>,
        sorts: Vec<Value>,
        page_size: Option<u32>,
    ) -> Self {
        Self {
            transport,
            database_id: database_id.into(),
            filter,
            sorts,
            page_size,
        }
    }
}

#[async_trait]
impl PageSource for DatabaseQuery {
    async fn fetch_page(&self, cursor: Option<String>) -> Result<Page, TransportError> {
        let request = QueryRequest {
            filter: self.filter.clone(),
            sorts: self.sorts.clone(),
            start_cursor: cursor,
            page_size: self.page_size,
        };
        self.transport
            .query_database(&self.database_id, &request)
            .await
    }
}

/// One decoded page of results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub items: Vec<PageRecord>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

/// Lazily fetched, decoded query results
pub type RecordStream = Pin<Box<dyn Stream<Item = Result<PageRecord, ClientError>> + Send>>;

pub struct Paginator {
    source: Arc<dyn PageSource>,
    codec: RecordCodec,
}

impl Paginator {
    pub fn new(source: Arc<dyn PageSource>, codec: RecordCodec) -> Self {
        Self { source, codec }
    }

    /// Fetch and decode the page starting at `cursor`
    pub async fn single(&self, cursor: Option<String>) -> Result<QueryResult, ClientError> {
        let page = self.source.fetch_page(cursor.clone()).await?;
        debug!(
            database = self.codec.db_name(),
            cursor = cursor.as_deref(),
            items = page.results.len(),
            has_more = page.has_more,
            "Fetched page"
        );

        let items = page
            .results
            .iter()
            .map(|raw| self.codec.decode(raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(QueryResult {
            items,
            has_more: page.has_more,
            next_cursor: page.next_cursor,
        })
    }

    /// Follow cursors until the last page, collecting every item
    pub async fn all(&self) -> Result<Vec<PageRecord>, ClientError> {
        let mut items = Vec::new();
        let mut cursor = None;
        let mut pages = 0usize;

        loop {
            let page = self.single(cursor).await?;
            pages += 1;
            items.extend(page.items);
            match next_cursor(page.has_more, page.next_cursor) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        debug!(
            database = self.codec.db_name(),
            pages,
            items = items.len(),
            "Fetched all pages"
        );
        Ok(items)
    }

    /// Single-pass lazy stream over every item
    pub fn into_stream(self) -> RecordStream {
        let state = StreamState {
            paginator: self,
            buffer: VecDeque::new(),
            cursor: None,
            exhausted: false,
        };

        stream::try_unfold(state, next_item).boxed()
    }
}

struct StreamState {
    paginator: Paginator,
    buffer: VecDeque<PageRecord>,
    cursor: Option<String>,
    exhausted: bool,
}

async fn next_item(
    mut state: StreamState,
) -> Result<Option<(PageRecord, StreamState)>, ClientError> {
    loop {
        if let Some(item) = state.buffer.pop_front() {
            return Ok(Some((item, state)));
        }
        if state.exhausted {
            return Ok(None);
        }

        let page = state.paginator.single(state.cursor.take()).await?;
        state.buffer.extend(page.items);
        match next_cursor(page.has_more, page.next_cursor) {
            Some(next) => state.cursor = Some(next),
            None => state.exhausted = true,
        }
    }
}

/// Cursor for the following page, if there is one to fetch
fn next_cursor(has_more: bool, next_cursor: Option<String>) -> Option<String> {
    match (has_more, next_cursor) {
        (true, Some(cursor)) => Some(cursor),
        (true, None) => {
            warn!("Page reported more results without a cursor, stopping");
            None
        }
        (false, _) => None,
    }
}
