// The MIT License (MIT)

// Copyright (c) 2015 Y. T. Chung <zonyitoo@gmail.com>

// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:

// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! A BSON codec and a client for the legacy request/reply wire protocol of document databases.
//!
//! BSON is a binary format in which zero or more key/value pairs are stored as a single entity,
//! called a document. This crate supports version 1.0 of the
//! [BSON standard](http://bsonspec.org/spec.html) and layers the wire protocol messages and a
//! batched [`Cursor`] on top of it.
//!
//! ## Basic usage
//!
//! ```rust
//! # fn main() -> bson_wire::error::Result<()> {
//! use bson_wire::{doc, Bson, Document};
//!
//! let doc = doc! { "foo": "bar", "n": 3 };
//! let bytes = doc.to_vec()?;
//! assert_eq!(bytes.len(), doc.encoded_len());
//!
//! let decoded = Document::from_slice(&bytes)?;
//! assert_eq!(decoded.get("foo"), Some(&Bson::String("bar".to_owned())));
//! # Ok(())
//! # }
//! ```
//!
//! ## Querying
//!
//! A [`Connection`] serializes requests over a [`Transport`]; a [`Cursor`] sends the query on its
//! first iteration and fetches further batches with get-more messages as they are consumed.
//!
//! ```no_run
//! # fn main() -> bson_wire::error::Result<()> {
//! use bson_wire::{doc, Connection, ConnectionOptions, Cursor};
//!
//! let connection = Connection::connect(ConnectionOptions::default().host("127.0.0.1"))?;
//! let mut cursor = Cursor::new(&connection, "test.people", doc! { "age": { "$gt": 21 } });
//! cursor.batch_size(100)?;
//! for person in cursor {
//!     println!("{}", person?);
//! }
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub use self::{
    bson::{Array, Binary, Bson, DbPointer, JavaScriptCodeWithScope, Regex, Timestamp},
    connection::{Connection, ConnectionOptions},
    cursor::{Cursor, CursorState},
    datetime::DateTime,
    de::{decode_document, Decoder, DecoderOptions},
    document::Document,
    oid::{ObjectId, ObjectIdGenerator},
    ser::{Encoder, EncoderOptions},
    transport::{TcpTransport, Transport},
};

#[macro_use]
mod macros;
mod bson;
pub mod connection;
pub mod cursor;
mod datetime;
pub mod de;
pub mod document;
pub mod error;
pub mod oid;
pub mod ser;
pub mod spec;
pub mod transport;
pub mod wire;
