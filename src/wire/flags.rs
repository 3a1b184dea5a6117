use bitflags::bitflags;

bitflags! {
    /// Options of a query message.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct QueryFlags: i32 {
        /// Leave the cursor open after the last document is returned.
        const TAILABLE_CURSOR = 1 << 1;
        /// Allow the query to run on a secondary.
        const SLAVE_OK = 1 << 2;
        const OPLOG_REPLAY = 1 << 3;
        /// Do not time the cursor out after a period of inactivity.
        const NO_CURSOR_TIMEOUT = 1 << 4;
        /// With a tailable cursor, block for a while rather than return no data.
        const AWAIT_DATA = 1 << 5;
        const EXHAUST = 1 << 6;
        /// Return partial results if some shards are down.
        const PARTIAL = 1 << 7;
    }
}

bitflags! {
    /// Options of an update message.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UpdateFlags: i32 {
        /// Insert the update document if no document matches the selector.
        const UPSERT = 1 << 0;
        /// Update every matching document, not only the first.
        const MULTI_UPDATE = 1 << 1;
    }
}

bitflags! {
    /// Options of a delete message.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DeleteFlags: i32 {
        /// Remove only the first matching document.
        const SINGLE_REMOVE = 1 << 0;
    }
}

bitflags! {
    /// Status bits of a reply.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ResponseFlags: i32 {
        /// The cursor named in a get-more no longer exists on the server.
        const CURSOR_NOT_FOUND = 1 << 0;
        /// The query failed; the single returned document holds `$err`.
        const QUERY_FAILURE = 1 << 1;
        const SHARD_CONFIG_STALE = 1 << 2;
        const AWAIT_CAPABLE = 1 << 3;
    }
}
