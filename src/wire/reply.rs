use super::{
    flags::ResponseFlags,
    header::{Header, OpCode, HEADER_LEN},
};
use crate::{
    de::{Decoder, DecoderOptions},
    error::{Error, ErrorKind, Result},
    Bson,
    Document,
};

/// Length of the fixed fields that follow the header of a reply.
const REPLY_FIELDS_LEN: usize = 4 + 8 + 4 + 4;

/// A server's answer to a query or get-more.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub header: Header,
    pub response_flags: ResponseFlags,
    /// The server-side cursor, or 0 if the result set is exhausted.
    pub cursor_id: i64,
    /// Position of the first returned document within the cursor.
    pub starting_from: i32,
    pub documents: Vec<Document>,
}

impl Reply {
    /// Decodes the complete message in `bytes` as the reply to `request_id`.
    ///
    /// Fails with [`ErrorKind::ProtocolViolation`] when the opcode is not a reply, the reply
    /// answers another request, or the declared lengths and document count disagree with the
    /// bytes received.
    pub fn decode(bytes: &[u8], request_id: i32, options: DecoderOptions) -> Result<Reply> {
        let header = Header::parse(bytes)?;
        if header.op_code != OpCode::Reply {
            return Err(Error::protocol_violation(format!(
                "expected a reply but received {:?}",
                header.op_code
            )));
        }
        if header.response_to != request_id {
            return Err(Error::protocol_violation(format!(
                "reply answers request {} but request {request_id} was sent",
                header.response_to
            )));
        }
        let declared = header.message_length as usize;
        if declared != bytes.len() || bytes.len() < HEADER_LEN + REPLY_FIELDS_LEN {
            return Err(Error::protocol_violation(format!(
                "reply declares {} bytes but {} were received",
                header.message_length,
                bytes.len()
            )));
        }

        let fields = &bytes[HEADER_LEN..HEADER_LEN + REPLY_FIELDS_LEN];
        let i32_at = |i: usize| {
            let mut buf = [0; 4];
            buf.copy_from_slice(&fields[i..i + 4]);
            i32::from_le_bytes(buf)
        };
        let mut cursor_id = [0; 8];
        cursor_id.copy_from_slice(&fields[4..12]);

        let response_flags = ResponseFlags::from_bits_retain(i32_at(0));
        let cursor_id = i64::from_le_bytes(cursor_id);
        let starting_from = i32_at(12);
        let number_returned = i32_at(16);
        if number_returned < 0 {
            return Err(Error::protocol_violation(format!(
                "negative document count {number_returned}"
            )));
        }

        let body = &bytes[HEADER_LEN + REPLY_FIELDS_LEN..];
        let mut decoder = Decoder::with_options(body, options);
        let mut documents = Vec::with_capacity((number_returned as usize).min(body.len() / 5));
        for index in 0..number_returned as usize {
            documents.push(decoder.decode_document().map_err(|e| e.with_index(index))?);
        }
        if decoder.position() != body.len() as u64 {
            return Err(Error::protocol_violation(format!(
                "{} trailing bytes after {number_returned} documents",
                body.len() as u64 - decoder.position()
            )));
        }

        Ok(Reply {
            header,
            response_flags,
            cursor_id,
            starting_from,
            documents,
        })
    }

    /// Number of documents in this reply.
    pub fn number_returned(&self) -> usize {
        self.documents.len()
    }

    /// Turns failure flags into errors. `requested_cursor` names the cursor a get-more asked for.
    pub fn check(self, requested_cursor: i64) -> Result<Reply> {
        if self.response_flags.contains(ResponseFlags::CURSOR_NOT_FOUND) {
            return Err(ErrorKind::CursorNotFound {
                cursor_id: requested_cursor,
            }
            .into());
        }

        let failed = self.response_flags.contains(ResponseFlags::QUERY_FAILURE)
            || self
                .documents
                .first()
                .is_some_and(|doc| doc.contains_key("$err"));
        if failed {
            let doc = self.documents.first();
            let message = doc
                .and_then(|doc| doc.get("$err"))
                .and_then(Bson::as_str)
                .unwrap_or("query failure")
                .to_string();
            let code = doc.and_then(|doc| doc.get("code")).and_then(server_code);
            return Err(ErrorKind::Server { code, message }.into());
        }

        Ok(self)
    }
}

/// Reads an error code, which servers send as any numeric type.
pub(crate) fn server_code(value: &Bson) -> Option<i32> {
    match value {
        Bson::Int32(v) => Some(*v),
        Bson::Int64(v) => i32::try_from(*v).ok(),
        Bson::Double(v) if v.fract() == 0.0 => Some(*v as i32),
        _ => None,
    }
}
