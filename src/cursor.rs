//! Lazy, batched iteration over query results.

use std::{fmt, vec};

use tracing::{trace, warn};

use crate::{
    connection::Connection,
    error::{Error, ErrorKind, Result},
    transport::Transport,
    wire::{GetMore, KillCursors, Query, QueryFlags, Reply},
    Document,
};

/// Where a [`Cursor`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// No query has been sent; parameters may still change.
    Unopened,
    /// The query was sent and batches are being consumed.
    Open,
    /// No more documents will be yielded.
    Exhausted,
}

/// The results of a query, fetched from the server in batches as they are consumed.
///
/// Query parameters can only be changed before the first call to [`next`](Iterator::next); after
/// that every setter fails with [`ErrorKind::CursorAlreadyStarted`]. Dropping the cursor frees any
/// server-side cursor it still holds.
///
/// ```no_run
/// # fn main() -> bson_wire::error::Result<()> {
/// use bson_wire::{doc, Connection, ConnectionOptions, Cursor};
///
/// let connection = Connection::connect(ConnectionOptions::default())?;
/// let mut cursor = Cursor::new(&connection, "shop.orders", doc! { "status": "open" });
/// cursor.sort(doc! { "created": -1 })?.limit(20)?;
/// for order in cursor {
///     println!("{}", order?);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Cursor<'c, T: Transport> {
    connection: &'c Connection<T>,
    namespace: String,
    spec: Document,
    projection: Option<Document>,
    skip: i32,
    limit: i32,
    batch_size: i32,
    sort: Option<Document>,
    hint: Option<Document>,
    snapshot: bool,
    explain: bool,
    flags: QueryFlags,

    state: CursorState,
    cursor_id: i64,
    batch: vec::IntoIter<Document>,
    received: usize,
    yielded: usize,
}

impl<'c, T: Transport> Cursor<'c, T> {
    /// Creates an unopened cursor over documents in `namespace` (`<database>.<collection>`)
    /// matching `spec`.
    pub fn new(connection: &'c Connection<T>, namespace: impl Into<String>, spec: Document) -> Self {
        Self {
            connection,
            namespace: namespace.into(),
            spec,
            projection: None,
            skip: 0,
            limit: 0,
            batch_size: 0,
            sort: None,
            hint: None,
            snapshot: false,
            explain: false,
            flags: QueryFlags::empty(),
            state: CursorState::Unopened,
            cursor_id: 0,
            batch: Vec::new().into_iter(),
            received: 0,
            yielded: 0,
        }
    }

    fn modify(&mut self, f: impl FnOnce(&mut Self)) -> Result<&mut Self> {
        if self.state != CursorState::Unopened {
            return Err(ErrorKind::CursorAlreadyStarted.into());
        }
        f(self);
        Ok(self)
    }

    /// Restricts the fields returned for each document.
    pub fn projection(&mut self, projection: Document) -> Result<&mut Self> {
        self.modify(|c| c.projection = Some(projection))
    }

    /// Has the server skip the first `skip` matching documents.
    ///
    /// Named apart from [`Iterator::skip`], which would fetch the skipped documents and drop them
    /// client-side.
    pub fn skip_documents(&mut self, skip: i32) -> Result<&mut Self> {
        self.modify(|c| c.skip = skip)
    }

    /// Yields at most `limit` documents; 0 means no limit. A negative limit yields at most
    /// `|limit|` documents from a single batch, after which the server closes the cursor.
    pub fn limit(&mut self, limit: i32) -> Result<&mut Self> {
        self.modify(|c| c.limit = limit)
    }

    /// Number of documents to request per batch; 0 lets the server decide.
    pub fn batch_size(&mut self, batch_size: i32) -> Result<&mut Self> {
        self.modify(|c| c.batch_size = batch_size)
    }

    pub fn sort(&mut self, sort: Document) -> Result<&mut Self> {
        self.modify(|c| c.sort = Some(sort))
    }

    /// Forces the server to use the given index.
    pub fn hint(&mut self, hint: Document) -> Result<&mut Self> {
        self.modify(|c| c.hint = Some(hint))
    }

    /// Ensures each document is returned at most once even if it moves during the query.
    pub fn snapshot(&mut self) -> Result<&mut Self> {
        self.modify(|c| c.snapshot = true)
    }

    pub fn flags(&mut self, flags: QueryFlags) -> Result<&mut Self> {
        self.modify(|c| c.flags = flags)
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    /// The server-side cursor id, or 0 if none is held.
    pub fn cursor_id(&self) -> i64 {
        self.cursor_id
    }

    /// Number of documents yielded so far.
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    /// Asks the server how it would run this query and returns its plan. The cursor itself is not
    /// opened.
    pub fn explain(&self) -> Result<Document> {
        let mut explain = Cursor {
            connection: self.connection,
            namespace: self.namespace.clone(),
            spec: self.spec.clone(),
            projection: self.projection.clone(),
            skip: self.skip,
            limit: -self.limit.saturating_abs(),
            batch_size: self.batch_size,
            sort: self.sort.clone(),
            hint: self.hint.clone(),
            snapshot: self.snapshot,
            explain: true,
            flags: self.flags,
            state: CursorState::Unopened,
            cursor_id: 0,
            batch: Vec::new().into_iter(),
            received: 0,
            yielded: 0,
        };

        let plan = explain
            .next()
            .unwrap_or_else(|| Err(Error::protocol_violation("explain returned no plan")));
        explain.close()?;
        plan
    }

    /// Frees the server-side cursor, if one is still held. Calling this more than once, or after
    /// the server already exhausted the cursor, sends nothing.
    pub fn close(&mut self) -> Result<()> {
        self.state = CursorState::Exhausted;
        self.batch = Vec::new().into_iter();

        let cursor_id = std::mem::replace(&mut self.cursor_id, 0);
        if cursor_id == 0 {
            return Ok(());
        }

        trace!(cursor_id, "killing cursor");
        self.connection.send(&KillCursors {
            cursor_ids: vec![cursor_id],
        })
    }

    /// The query document as sent: the bare spec, or the spec wrapped with its modifiers.
    pub(crate) fn query_document(&self) -> Document {
        if self.sort.is_none() && self.hint.is_none() && !self.snapshot && !self.explain {
            return self.spec.clone();
        }

        let mut query = doc! { "$query": self.spec.clone() };
        if let Some(sort) = &self.sort {
            query.insert("$orderby", sort.clone());
        }
        if let Some(hint) = &self.hint {
            query.insert("$hint", hint.clone());
        }
        if self.snapshot {
            query.insert("$snapshot", true);
        }
        if self.explain {
            query.insert("$explain", true);
        }
        query
    }

    fn number_to_return(&self) -> i32 {
        if self.limit < 0 {
            return self.limit;
        }
        if self.limit == 0 {
            return self.batch_size;
        }

        let remaining = (self.limit as usize).saturating_sub(self.received) as i32;
        if self.batch_size == 0 {
            remaining
        } else {
            remaining.min(self.batch_size)
        }
    }

    fn limit_reached(&self) -> bool {
        self.limit != 0 && self.yielded >= self.limit.unsigned_abs() as usize
    }

    fn open(&mut self) -> Result<()> {
        self.state = CursorState::Open;
        let query = Query {
            flags: self.flags,
            full_collection_name: self.namespace.clone(),
            number_to_skip: self.skip,
            number_to_return: self.number_to_return(),
            query: self.query_document(),
            return_fields_selector: self.projection.clone(),
        };

        let reply = self.connection.exchange(&query)?.check(0)?;
        self.accept(reply);
        Ok(())
    }

    fn get_more(&mut self) -> Result<()> {
        let get_more = GetMore {
            full_collection_name: self.namespace.clone(),
            number_to_return: self.number_to_return(),
            cursor_id: self.cursor_id,
        };

        let reply = self
            .connection
            .exchange(&get_more)
            .and_then(|reply| reply.check(get_more.cursor_id));
        match reply {
            Ok(reply) => {
                self.accept(reply);
                Ok(())
            }
            Err(e) => {
                // the server-side cursor is gone, or unreachable over a failed stream
                if matches!(
                    e.kind,
                    ErrorKind::CursorNotFound { .. } | ErrorKind::CommunicationFailure { .. }
                ) {
                    self.cursor_id = 0;
                }
                Err(e)
            }
        }
    }

    fn accept(&mut self, reply: Reply) {
        trace!(
            cursor_id = reply.cursor_id,
            starting_from = reply.starting_from,
            batch = reply.documents.len(),
            "received batch"
        );
        self.cursor_id = reply.cursor_id;
        self.received += reply.documents.len();
        self.batch = reply.documents.into_iter();
    }

    fn fail(&mut self, error: Error) -> Option<Result<Document>> {
        self.state = CursorState::Exhausted;
        self.batch = Vec::new().into_iter();
        Some(Err(error))
    }
}

impl<T: Transport> fmt::Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("namespace", &self.namespace)
            .field("spec", &self.spec)
            .field("skip", &self.skip)
            .field("limit", &self.limit)
            .field("batch_size", &self.batch_size)
            .field("flags", &self.flags)
            .field("state", &self.state)
            .field("cursor_id", &self.cursor_id)
            .field("yielded", &self.yielded)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Iterator for Cursor<'_, T> {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                CursorState::Exhausted => return None,
                CursorState::Unopened => {
                    if let Err(e) = self.open() {
                        return self.fail(e);
                    }
                }
                CursorState::Open => {
                    if self.limit_reached() {
                        trace!(cursor_id = self.cursor_id, "limit reached");
                        self.state = CursorState::Exhausted;
                        return None;
                    }
                    if let Some(doc) = self.batch.next() {
                        self.yielded += 1;
                        return Some(Ok(doc));
                    }
                    if self.cursor_id == 0 || self.limit < 0 {
                        self.state = CursorState::Exhausted;
                        return None;
                    }
                    if let Err(e) = self.get_more() {
                        return self.fail(e);
                    }
                }
            }
        }
    }
}

impl<T: Transport> Drop for Cursor<'_, T> {
    fn drop(&mut self) {
        let cursor_id = self.cursor_id;
        if let Err(e) = self.close() {
            warn!(cursor_id, error = %e, "failed to kill cursor");
        }
    }
}
