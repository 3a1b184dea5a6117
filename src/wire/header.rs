use std::io::Write;

use crate::error::{Error, Result};

/// Length of a message header in bytes.
pub const HEADER_LEN: usize = 16;

/// Identifies the layout of a message body.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum OpCode {
    Reply = 1,
    Update = 2001,
    Insert = 2002,
    Query = 2004,
    GetMore = 2005,
    Delete = 2006,
    KillCursors = 2007,
}

impl OpCode {
    pub fn from_i32(code: i32) -> Option<OpCode> {
        Some(match code {
            1 => OpCode::Reply,
            2001 => OpCode::Update,
            2002 => OpCode::Insert,
            2004 => OpCode::Query,
            2005 => OpCode::GetMore,
            2006 => OpCode::Delete,
            2007 => OpCode::KillCursors,
            _ => return None,
        })
    }

    /// Whether the server answers this kind of message with a [`Reply`](super::Reply).
    pub fn expects_reply(self) -> bool {
        matches!(self, OpCode::Query | OpCode::GetMore)
    }
}

/// The fixed prefix of every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Total message length, header included.
    pub message_length: i32,
    pub request_id: i32,
    /// The request id this message answers, or 0 for requests.
    pub response_to: i32,
    pub op_code: OpCode,
}

impl Header {
    pub(crate) fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.message_length.to_le_bytes())?;
        writer.write_all(&self.request_id.to_le_bytes())?;
        writer.write_all(&self.response_to.to_le_bytes())?;
        writer.write_all(&(self.op_code as i32).to_le_bytes())?;
        Ok(())
    }

    /// Parses the header at the start of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Header> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::protocol_violation(format!(
                "message of {} bytes is shorter than a header",
                bytes.len()
            )));
        }

        let field = |i: usize| {
            let mut buf = [0; 4];
            buf.copy_from_slice(&bytes[i * 4..i * 4 + 4]);
            i32::from_le_bytes(buf)
        };

        let code = field(3);
        let op_code = OpCode::from_i32(code)
            .ok_or_else(|| Error::protocol_violation(format!("unknown opcode {code}")))?;

        Ok(Header {
            message_length: field(0),
            request_id: field(1),
            response_to: field(2),
            op_code,
        })
    }
}
