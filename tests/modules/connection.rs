use std::io;

use assert_matches::assert_matches;
use bson_wire::{
    doc,
    error::ErrorKind,
    wire::{Delete, DeleteFlags, Insert, KillCursors, OpCode, Query, Update, UpdateFlags},
    Connection,
};
use pretty_assertions::assert_eq;

use super::mock::MockServer;

#[test]
fn checked_insert_reports_duplicate_keys() {
    let server = MockServer::new();
    server.batch(
        0,
        vec![doc! {
            "err": "E11000 duplicate key error index: db.users.$email_1",
            "code": 11000,
            "ok": 1.0,
        }],
    );
    let connection = Connection::new(server.clone(), MockServer::options());

    let insert = Insert {
        full_collection_name: "db.users".to_string(),
        documents: vec![doc! { "email": "a@example.com" }],
    };
    let err = connection.send_checked(&insert, "db").unwrap_err();
    assert!(err.is_duplicate_key());
    assert_matches!(
        err.kind,
        ErrorKind::DuplicateKey { ref key, .. } if key.starts_with("E11000")
    );

    let sent = server.sent();
    assert_eq!(
        server.sent_op_codes(),
        vec![OpCode::Insert, OpCode::Query]
    );
    assert_eq!(sent[0].namespace(), "db.users");
    assert_eq!(sent[0].documents(), vec![doc! { "email": "a@example.com" }]);
    assert_eq!(sent[1].namespace(), "db.$cmd");
    assert_eq!(sent[1].number_to_return(), -1);
    assert_eq!(sent[1].documents(), vec![doc! { "getlasterror": 1 }]);
}

#[test]
fn checked_update_succeeds() {
    let server = MockServer::new();
    server.batch(0, vec![doc! { "err": null, "n": 3, "ok": 1 }]);
    let connection = Connection::new(server.clone(), MockServer::options());

    let update = Update {
        full_collection_name: "db.users".to_string(),
        flags: UpdateFlags::MULTI_UPDATE,
        selector: doc! { "active": false },
        update: doc! { "$set": { "archived": true } },
    };
    let response = connection.send_checked(&update, "db").unwrap();
    assert_eq!(response.get_i32("n").unwrap(), 3);

    let sent = server.sent();
    assert_eq!(sent[0].header.op_code, OpCode::Update);
    assert_eq!(
        sent[0].documents(),
        vec![
            doc! { "active": false },
            doc! { "$set": { "archived": true } },
        ]
    );
}

#[test]
fn checked_delete_reports_other_errors() {
    let server = MockServer::new();
    server.batch(0, vec![doc! { "err": "not master", "code": 10058, "ok": 1 }]);
    let connection = Connection::new(server.clone(), MockServer::options());

    let delete = Delete {
        full_collection_name: "db.users".to_string(),
        flags: DeleteFlags::SINGLE_REMOVE,
        selector: doc! { "_id": 1 },
    };
    assert_matches!(
        connection.send_checked(&delete, "db").unwrap_err().kind,
        ErrorKind::Server { code: Some(10058), ref message, .. } if message == "not master"
    );
}

#[test]
fn unchecked_send_does_not_wait() {
    let server = MockServer::new();
    let connection = Connection::new(server.clone(), MockServer::options());

    let insert = Insert {
        full_collection_name: "db.logs".to_string(),
        documents: vec![doc! { "n": 1 }, doc! { "n": 2 }],
    };
    connection.send(&insert).unwrap();

    let sent = server.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].documents().len(), 2);
}

#[test]
fn run_command() {
    let server = MockServer::new();
    server
        .batch(0, vec![doc! { "ok": 1.0, "n": 12 }])
        .batch(0, vec![doc! { "ok": 0.0, "errmsg": "no such cmd: bogus", "code": 59 }]);
    let connection = Connection::new(server.clone(), MockServer::options());

    let response = connection
        .run_command("db", doc! { "count": "users" })
        .unwrap();
    assert_eq!(response.get_i32("n").unwrap(), 12);

    assert_matches!(
        connection.run_command("db", doc! { "bogus": 1 }).unwrap_err().kind,
        ErrorKind::Server { code: Some(59), ref message, .. } if message == "no such cmd: bogus"
    );

    let sent = server.sent();
    assert_eq!(sent[0].namespace(), "db.$cmd");
    assert_eq!(sent[0].number_to_return(), -1);
    assert_eq!(sent[0].documents(), vec![doc! { "count": "users" }]);
}

#[test]
fn misdirected_reply_is_a_protocol_violation() {
    let server = MockServer::new();
    server.misdirected(12345);
    let connection = Connection::new(server.clone(), MockServer::options());

    let err = connection
        .run_command("admin", doc! { "ping": 1 })
        .unwrap_err();
    assert!(err.is_protocol_violation());
}

#[test]
fn receive_failure_is_a_communication_failure() {
    let server = MockServer::new();
    server.fail(io::ErrorKind::TimedOut);
    let connection = Connection::new(server.clone(), MockServer::options());

    let err = connection
        .run_command("admin", doc! { "ping": 1 })
        .unwrap_err();
    assert!(err.is_communication_failure());
    connection.reconnect().unwrap();
}

#[test]
fn request_ids_increase() {
    let server = MockServer::new();
    server
        .batch(0, vec![doc! { "ok": 1 }])
        .batch(0, vec![doc! { "ok": 1 }]);
    let connection = Connection::new(server.clone(), MockServer::options());

    connection.run_command("admin", doc! { "ping": 1 }).unwrap();
    connection.run_command("admin", doc! { "ping": 1 }).unwrap();

    let ids: Vec<i32> = server
        .sent()
        .iter()
        .map(|sent| sent.header.request_id)
        .collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn oversized_documents_are_rejected_before_sending() {
    let server = MockServer::new();
    let connection = Connection::new(server.clone(), MockServer::options().max_document_size(32));

    let insert = Insert {
        full_collection_name: "db.blobs".to_string(),
        documents: vec![doc! { "n": 1 }, doc! { "blob": "x".repeat(64) }],
    };
    let err = connection.send(&insert).unwrap_err();
    assert_matches!(err.kind, ErrorKind::DocumentTooLarge { max: 32, .. });
    assert_eq!(err.index, Some(1));
    assert!(server.sent().is_empty());
}

#[test]
fn empty_insert_is_rejected() {
    let server = MockServer::new();
    let connection = Connection::new(server.clone(), MockServer::options());

    let insert = Insert {
        full_collection_name: "db.users".to_string(),
        documents: vec![],
    };
    assert!(connection.send(&insert).unwrap_err().is_protocol_violation());
    assert!(server.sent().is_empty());
}

#[test]
fn replies_go_through_exchange() {
    let server = MockServer::new();
    let connection = Connection::new(server.clone(), MockServer::options());

    let query = Query::new("db.items", doc! {});
    assert!(connection.send(&query).unwrap_err().is_protocol_violation());

    let kill = KillCursors {
        cursor_ids: vec![1],
    };
    assert!(connection.exchange(&kill).unwrap_err().is_protocol_violation());
    assert!(server.sent().is_empty());
}

#[test]
fn concurrent_senders_keep_ids_in_wire_order() {
    let server = MockServer::new();
    let connection = Connection::new(server.clone(), MockServer::options());

    std::thread::scope(|scope| {
        for thread in 0..8 {
            let connection = &connection;
            scope.spawn(move || {
                for n in 0..25 {
                    let insert = Insert {
                        full_collection_name: "db.logs".to_string(),
                        documents: vec![doc! { "thread": thread, "n": n }],
                    };
                    connection.send(&insert).unwrap();
                }
            });
        }
    });

    let ids: Vec<i32> = server
        .sent()
        .iter()
        .map(|sent| sent.header.request_id)
        .collect();
    assert_eq!(ids, (1..=200).collect::<Vec<i32>>());
}
