mod connection;
mod cursor;
mod document;
mod mock;
mod oid;
