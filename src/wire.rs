//! Messages of the legacy request/reply wire protocol.
//!
//! Every message is a 16 byte [`Header`] followed by an opcode-specific body. All integers are
//! little-endian. A message's total length is only written once its body has been measured, so
//! an oversized message is rejected before any bytes are produced.

mod flags;
mod header;
mod reply;
mod request;

pub use self::{
    flags::{DeleteFlags, QueryFlags, ResponseFlags, UpdateFlags},
    header::{Header, OpCode, HEADER_LEN},
    reply::Reply,
    request::{encode_message, Body, Delete, GetMore, Insert, KillCursors, Query, Request, Update},
};
pub(crate) use self::reply::server_code;

/// The default maximum size of a whole message, header included.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 48 * 1000 * 1000;
