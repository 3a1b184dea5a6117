use std::io;

use assert_matches::assert_matches;
use bson_wire::{
    doc,
    error::ErrorKind,
    wire::{OpCode, QueryFlags, ResponseFlags},
    Connection,
    Cursor,
    CursorState,
    Document,
};
use pretty_assertions::assert_eq;

use super::mock::MockServer;

fn numbered(range: std::ops::Range<i32>) -> Vec<Document> {
    range.map(|n| doc! { "n": n }).collect()
}

fn collect<I: Iterator<Item = bson_wire::error::Result<Document>>>(cursor: I) -> Vec<i32> {
    cursor
        .map(|doc| doc.unwrap().get_i32("n").unwrap())
        .collect()
}

#[test]
fn fetches_batches_until_the_server_is_done() {
    let server = MockServer::new();
    server.batch(42, numbered(0..3)).batch(0, numbered(3..5));
    let connection = Connection::new(server.clone(), MockServer::options());

    let mut cursor = Cursor::new(&connection, "db.items", doc! {});
    assert_eq!(cursor.state(), CursorState::Unopened);
    assert_eq!(collect(&mut cursor), vec![0, 1, 2, 3, 4]);
    assert_eq!(cursor.state(), CursorState::Exhausted);
    assert_eq!(cursor.cursor_id(), 0);
    assert_eq!(cursor.yielded(), 5);
    drop(cursor);

    assert_eq!(
        server.sent_op_codes(),
        vec![OpCode::Query, OpCode::GetMore]
    );
    let sent = server.sent();
    assert_eq!(sent[0].namespace(), "db.items");
    assert_eq!(sent[0].number_to_return(), 0);
    assert_eq!(sent[0].documents(), vec![doc! {}]);
    assert_eq!(sent[1].namespace(), "db.items");
    assert_eq!(sent[1].cursor_ids(), vec![42]);
}

#[test]
fn limit_caps_requests_and_kills_the_cursor_once() {
    let server = MockServer::new();
    server.batch(42, numbered(0..3)).batch(42, numbered(3..4));
    let connection = Connection::new(server.clone(), MockServer::options());

    let mut cursor = Cursor::new(&connection, "db.items", doc! { "n": { "$gte": 0 } });
    cursor.limit(4).unwrap();
    assert_eq!(collect(&mut cursor), vec![0, 1, 2, 3]);
    assert!(cursor.next().is_none());

    // the server still holds the cursor after the limit is reached
    assert_eq!(cursor.cursor_id(), 42);
    cursor.close().unwrap();
    cursor.close().unwrap();
    drop(cursor);

    let sent = server.sent();
    assert_eq!(sent[0].number_to_return(), 4);
    assert_eq!(sent[1].number_to_return(), 1);
    assert_eq!(server.count(OpCode::GetMore), 1);
    assert_eq!(server.count(OpCode::KillCursors), 1);
    assert_eq!(sent[2].cursor_ids(), vec![42]);
}

#[test]
fn batch_size_bounds_each_request() {
    let server = MockServer::new();
    server
        .batch(7, numbered(0..2))
        .batch(7, numbered(2..4))
        .batch(7, numbered(4..5));
    let connection = Connection::new(server.clone(), MockServer::options());

    let mut cursor = Cursor::new(&connection, "db.items", doc! {});
    cursor.limit(5).unwrap().batch_size(2).unwrap();
    assert_eq!(collect(&mut cursor), vec![0, 1, 2, 3, 4]);
    drop(cursor);

    let requested: Vec<i32> = server
        .sent()
        .iter()
        .filter(|sent| sent.header.op_code != OpCode::KillCursors)
        .map(|sent| sent.number_to_return())
        .collect();
    assert_eq!(requested, vec![2, 2, 1]);
    assert_eq!(server.count(OpCode::KillCursors), 1);
}

#[test]
fn negative_limit_is_a_single_batch() {
    let server = MockServer::new();
    server.batch(0, numbered(0..2));
    let connection = Connection::new(server.clone(), MockServer::options());

    let mut cursor = Cursor::new(&connection, "db.items", doc! {});
    cursor.limit(-2).unwrap();
    assert_eq!(collect(&mut cursor), vec![0, 1]);
    drop(cursor);

    let sent = server.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].number_to_return(), -2);
}

#[test]
fn modifiers_are_wrapped_on_the_wire() {
    let server = MockServer::new();
    server.batch(0, vec![]);
    let connection = Connection::new(server.clone(), MockServer::options());

    let mut cursor = Cursor::new(&connection, "db.items", doc! { "kind": "a" });
    cursor
        .sort(doc! { "n": -1 })
        .unwrap()
        .hint(doc! { "n": 1 })
        .unwrap()
        .skip_documents(10)
        .unwrap()
        .projection(doc! { "n": 1, "_id": 0 })
        .unwrap()
        .flags(QueryFlags::SLAVE_OK | QueryFlags::NO_CURSOR_TIMEOUT)
        .unwrap();
    assert!(cursor.next().is_none());
    drop(cursor);

    let sent = server.sent();
    assert_eq!(sent[0].number_to_skip(), 10);
    assert_eq!(sent[0].flags(), 4 | 16);
    assert_eq!(
        sent[0].documents(),
        vec![
            doc! {
                "$query": { "kind": "a" },
                "$orderby": { "n": -1 },
                "$hint": { "n": 1 },
            },
            doc! { "n": 1, "_id": 0 },
        ]
    );
}

#[test]
fn skip_is_sent_to_the_server() {
    let server = MockServer::new();
    server.batch(0, numbered(3..5));
    let connection = Connection::new(server.clone(), MockServer::options());

    let mut cursor = Cursor::new(&connection, "db.items", doc! {});
    cursor.skip_documents(3).unwrap();
    assert_eq!(collect(cursor), vec![3, 4]);

    let sent = server.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].number_to_skip(), 3);
}

#[test]
fn debug_shows_progress() {
    let server = MockServer::new();
    server.batch(42, numbered(0..2));
    let connection = Connection::new(server.clone(), MockServer::options());

    let mut cursor = Cursor::new(&connection, "db.items", doc! {});
    assert!(cursor.next().is_some());
    let debug = format!("{cursor:?}");
    assert!(debug.contains("db.items"));
    assert!(debug.contains("cursor_id: 42"));
    assert!(format!("{connection:?}").contains("mock:27017"));
}

#[test]
fn setters_fail_once_started() {
    let server = MockServer::new();
    server.batch(42, numbered(0..2));
    let connection = Connection::new(server.clone(), MockServer::options());

    let mut cursor = Cursor::new(&connection, "db.items", doc! {});
    cursor.snapshot().unwrap();
    assert!(cursor.next().is_some());
    assert_eq!(cursor.state(), CursorState::Open);

    assert_matches!(
        cursor.limit(1).unwrap_err().kind,
        ErrorKind::CursorAlreadyStarted
    );
    assert_matches!(
        cursor.sort(doc! {}).unwrap_err().kind,
        ErrorKind::CursorAlreadyStarted
    );
    assert_matches!(
        cursor.flags(QueryFlags::empty()).unwrap_err().kind,
        ErrorKind::CursorAlreadyStarted
    );
    drop(cursor);

    assert_eq!(
        server.sent()[0].documents(),
        vec![doc! { "$query": {}, "$snapshot": true }]
    );
}

#[test]
fn cursor_not_found_on_get_more() {
    let server = MockServer::new();
    server
        .batch(42, numbered(0..1))
        .flagged(ResponseFlags::CURSOR_NOT_FOUND.bits(), vec![]);
    let connection = Connection::new(server.clone(), MockServer::options());

    let mut cursor = Cursor::new(&connection, "db.items", doc! {});
    assert!(cursor.next().unwrap().is_ok());
    assert_matches!(
        cursor.next().unwrap().unwrap_err().kind,
        ErrorKind::CursorNotFound { cursor_id: 42, .. }
    );
    assert_eq!(cursor.cursor_id(), 0);
    assert_eq!(cursor.state(), CursorState::Exhausted);
    assert!(cursor.next().is_none());
    drop(cursor);

    assert_eq!(server.count(OpCode::KillCursors), 0);
}

#[test]
fn communication_failure_on_get_more() {
    let server = MockServer::new();
    server
        .batch(42, numbered(0..1))
        .fail(io::ErrorKind::ConnectionReset);
    let connection = Connection::new(server.clone(), MockServer::options());

    let mut cursor = Cursor::new(&connection, "db.items", doc! {});
    assert!(cursor.next().unwrap().is_ok());
    let err = cursor.next().unwrap().unwrap_err();
    assert!(err.is_communication_failure());
    assert_matches!(
        err.kind,
        ErrorKind::CommunicationFailure { ref address, .. } if address == "mock:27017"
    );
    assert_eq!(cursor.cursor_id(), 0);
    drop(cursor);

    assert_eq!(server.count(OpCode::KillCursors), 0);
}

#[test]
fn query_failure_on_open() {
    let server = MockServer::new();
    server.flagged(
        ResponseFlags::QUERY_FAILURE.bits(),
        vec![doc! { "$err": "unknown operator: $bogus", "code": 2 }],
    );
    let connection = Connection::new(server.clone(), MockServer::options());

    let mut cursor = Cursor::new(&connection, "db.items", doc! { "n": { "$bogus": 1 } });
    assert_matches!(
        cursor.next().unwrap().unwrap_err().kind,
        ErrorKind::Server { code: Some(2), ref message, .. } if message == "unknown operator: $bogus"
    );
    assert_eq!(cursor.state(), CursorState::Exhausted);
    assert!(cursor.next().is_none());
}

#[test]
fn explain_returns_the_plan() {
    let server = MockServer::new();
    server.batch(0, vec![doc! { "cursor": "BasicCursor", "n": 3 }]);
    let connection = Connection::new(server.clone(), MockServer::options());

    let mut cursor = Cursor::new(&connection, "db.items", doc! { "n": 1 });
    cursor.limit(5).unwrap();
    let plan = cursor.explain().unwrap();
    assert_eq!(plan.get_str("cursor").unwrap(), "BasicCursor");
    assert_eq!(cursor.state(), CursorState::Unopened);
    drop(cursor);

    let sent = server.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].number_to_return(), -5);
    assert_eq!(
        sent[0].documents(),
        vec![doc! { "$query": { "n": 1 }, "$explain": true }]
    );
}

#[test]
fn dropping_an_open_cursor_kills_it() {
    let server = MockServer::new();
    server.batch(99, numbered(0..3));
    let connection = Connection::new(server.clone(), MockServer::options());

    {
        let mut cursor = Cursor::new(&connection, "db.items", doc! {});
        assert!(cursor.next().is_some());
    }

    assert_eq!(server.sent_op_codes(), vec![OpCode::Query, OpCode::KillCursors]);
    assert_eq!(server.sent()[1].cursor_ids(), vec![99]);
}

#[test]
fn unopened_cursor_sends_nothing() {
    let server = MockServer::new();
    let connection = Connection::new(server.clone(), MockServer::options());

    let mut cursor = Cursor::new(&connection, "db.items", doc! {});
    cursor.close().unwrap();
    assert!(cursor.next().is_none());
    drop(cursor);

    assert!(server.sent().is_empty());
}
