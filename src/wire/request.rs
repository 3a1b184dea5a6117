use std::io::Write;

use super::{
    flags::{DeleteFlags, QueryFlags, UpdateFlags},
    header::{Header, OpCode, HEADER_LEN},
};
use crate::{
    error::{Error, ErrorKind, Result},
    ser::{Encoder, MeasuredDocument},
    Document,
};

/// A message sent from client to server.
pub trait Request {
    fn op_code(&self) -> OpCode;

    /// Measures the body of the message. Documents are checked against the encoder's size limit.
    fn body<'a>(&'a self, encoder: &Encoder) -> Result<Body<'a>>;
}

/// A measured message body, ready to be written.
pub struct Body<'a> {
    parts: Vec<Part<'a>>,
}

enum Part<'a> {
    I32(i32),
    I64(i64),
    CString(&'a str),
    Document(MeasuredDocument<'a>),
}

impl<'a> Body<'a> {
    fn new() -> Self {
        Self { parts: Vec::new() }
    }

    fn i32(mut self, v: i32) -> Self {
        self.parts.push(Part::I32(v));
        self
    }

    fn i64(mut self, v: i64) -> Self {
        self.parts.push(Part::I64(v));
        self
    }

    /// Zeroed `int32` placeholder.
    fn reserved(self) -> Self {
        self.i32(0)
    }

    fn cstring(mut self, s: &'a str) -> Result<Self> {
        if s.contains('\0') {
            return Err(ErrorKind::InvalidCString {
                value: s.to_string(),
            }
            .into());
        }
        self.parts.push(Part::CString(s));
        Ok(self)
    }

    fn document(mut self, encoder: &Encoder, doc: &'a Document) -> Result<Self> {
        self.parts.push(Part::Document(encoder.measure(doc)?));
        Ok(self)
    }

    /// Number of bytes the body occupies.
    pub fn len(&self) -> usize {
        self.parts
            .iter()
            .map(|part| match part {
                Part::I32(_) => 4,
                Part::I64(_) => 8,
                Part::CString(s) => s.len() + 1,
                Part::Document(doc) => doc.len(),
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        for part in &self.parts {
            match part {
                Part::I32(v) => writer.write_all(&v.to_le_bytes())?,
                Part::I64(v) => writer.write_all(&v.to_le_bytes())?,
                Part::CString(s) => {
                    writer.write_all(s.as_bytes())?;
                    writer.write_all(&[0])?;
                }
                Part::Document(doc) => doc.write_to(&mut writer)?,
            }
        }
        Ok(())
    }
}

/// Frames `request` as a complete message with the given request id.
///
/// The body is measured before anything is written; a message longer than `max_message_size`
/// fails with [`ErrorKind::DocumentTooLarge`].
pub fn encode_message<R: Request + ?Sized>(
    request: &R,
    request_id: i32,
    encoder: &Encoder,
    max_message_size: usize,
) -> Result<Vec<u8>> {
    let body = request.body(encoder)?;
    let size = HEADER_LEN + body.len();
    let max = max_message_size.min(i32::MAX as usize);
    if size > max {
        return Err(ErrorKind::DocumentTooLarge { size, max }.into());
    }

    let header = Header {
        message_length: size as i32,
        request_id,
        response_to: 0,
        op_code: request.op_code(),
    };

    let mut bytes = Vec::with_capacity(size);
    header.write_to(&mut bytes)?;
    body.write_to(&mut bytes)?;
    Ok(bytes)
}

/// Retrieves documents matching `query`.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub flags: QueryFlags,
    /// `<database>.<collection>`
    pub full_collection_name: String,
    pub number_to_skip: i32,
    /// Batch size hint. Negative values ask the server to close the cursor after one batch.
    pub number_to_return: i32,
    pub query: Document,
    pub return_fields_selector: Option<Document>,
}

impl Query {
    pub fn new(full_collection_name: impl Into<String>, query: Document) -> Self {
        Self {
            flags: QueryFlags::empty(),
            full_collection_name: full_collection_name.into(),
            number_to_skip: 0,
            number_to_return: 0,
            query,
            return_fields_selector: None,
        }
    }
}

impl Request for Query {
    fn op_code(&self) -> OpCode {
        OpCode::Query
    }

    fn body<'a>(&'a self, encoder: &Encoder) -> Result<Body<'a>> {
        let mut body = Body::new()
            .i32(self.flags.bits())
            .cstring(&self.full_collection_name)?
            .i32(self.number_to_skip)
            .i32(self.number_to_return)
            .document(encoder, &self.query)?;
        if let Some(fields) = &self.return_fields_selector {
            body = body.document(encoder, fields)?;
        }
        Ok(body)
    }
}

/// Fetches the next batch of an open cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetMore {
    pub full_collection_name: String,
    pub number_to_return: i32,
    pub cursor_id: i64,
}

impl Request for GetMore {
    fn op_code(&self) -> OpCode {
        OpCode::GetMore
    }

    fn body<'a>(&'a self, _: &Encoder) -> Result<Body<'a>> {
        Ok(Body::new()
            .reserved()
            .cstring(&self.full_collection_name)?
            .i32(self.number_to_return)
            .i64(self.cursor_id))
    }
}

/// Inserts one or more documents.
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub full_collection_name: String,
    pub documents: Vec<Document>,
}

impl Request for Insert {
    fn op_code(&self) -> OpCode {
        OpCode::Insert
    }

    fn body<'a>(&'a self, encoder: &Encoder) -> Result<Body<'a>> {
        if self.documents.is_empty() {
            return Err(Error::protocol_violation(
                "an insert must carry at least one document",
            ));
        }

        let mut body = Body::new()
            .reserved()
            .cstring(&self.full_collection_name)?;
        for (index, doc) in self.documents.iter().enumerate() {
            body = body
                .document(encoder, doc)
                .map_err(|e| e.with_index(index))?;
        }
        Ok(body)
    }
}

/// Modifies documents matching `selector`.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub full_collection_name: String,
    pub flags: UpdateFlags,
    pub selector: Document,
    pub update: Document,
}

impl Request for Update {
    fn op_code(&self) -> OpCode {
        OpCode::Update
    }

    fn body<'a>(&'a self, encoder: &Encoder) -> Result<Body<'a>> {
        Body::new()
            .reserved()
            .cstring(&self.full_collection_name)?
            .i32(self.flags.bits())
            .document(encoder, &self.selector)?
            .document(encoder, &self.update)
    }
}

/// Removes documents matching `selector`.
#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub full_collection_name: String,
    pub flags: DeleteFlags,
    pub selector: Document,
}

impl Request for Delete {
    fn op_code(&self) -> OpCode {
        OpCode::Delete
    }

    fn body<'a>(&'a self, encoder: &Encoder) -> Result<Body<'a>> {
        Body::new()
            .reserved()
            .cstring(&self.full_collection_name)?
            .i32(self.flags.bits())
            .document(encoder, &self.selector)
    }
}

/// Frees server-side cursors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillCursors {
    pub cursor_ids: Vec<i64>,
}

impl Request for KillCursors {
    fn op_code(&self) -> OpCode {
        OpCode::KillCursors
    }

    fn body<'a>(&'a self, _: &Encoder) -> Result<Body<'a>> {
        if self.cursor_ids.is_empty() {
            return Err(Error::protocol_violation(
                "kill cursors must name at least one cursor",
            ));
        }

        let count = i32::try_from(self.cursor_ids.len())
            .map_err(|_| Error::protocol_violation("too many cursor ids"))?;
        Ok(self
            .cursor_ids
            .iter()
            .fold(Body::new().reserved().i32(count), |body, id| body.i64(*id)))
    }
}
