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

//! Encoder

mod len;

use std::io::Write;

pub(crate) use self::len::document_len;
use self::len::LenTable;
use crate::{
    bson::{Array, Bson},
    error::{ErrorKind, Result},
    spec::BinarySubtype,
    Document,
};

/// The default maximum size of a document, matching the server's limit.
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 16 * 1024 * 1024;

/// Options that control how BSON is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct EncoderOptions {
    /// Documents larger than this many bytes are rejected before anything is written.
    pub max_document_size: usize,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
        }
    }
}

impl EncoderOptions {
    pub fn max_document_size(mut self, max_document_size: usize) -> Self {
        self.max_document_size = max_document_size;
        self
    }
}

/// Encodes [`Document`]s into BSON bytes.
///
/// Every length is computed once, before writing starts, so a document is either rejected
/// up front or written in full with exactly [`Encoder::size_of`] bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Encoder {
    options: EncoderOptions,
}

impl Encoder {
    pub fn new(options: EncoderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    /// The number of bytes `value` occupies when written, excluding its type tag and key. For
    /// documents and arrays this includes the length prefix and terminator.
    pub fn size_of(&self, value: &Bson) -> Result<i32> {
        let (len, _) = LenTable::measure_value(value)?;
        self.check_size(len)
    }

    /// Measures `doc` and checks it against the maximum document size.
    pub(crate) fn measure<'a>(&self, doc: &'a Document) -> Result<MeasuredDocument<'a>> {
        let table = LenTable::measure(doc)?;
        self.check_size(table.root())?;
        Ok(MeasuredDocument { doc, table })
    }

    /// Writes `doc` to `writer`.
    pub fn encode_document<W: Write>(&self, writer: W, doc: &Document) -> Result<()> {
        self.measure(doc)?.write_to(writer)
    }

    /// Encodes `doc` into a buffer of exactly the right size.
    pub fn to_vec(&self, doc: &Document) -> Result<Vec<u8>> {
        let measured = self.measure(doc)?;
        let mut bytes = Vec::with_capacity(measured.len());
        measured.write_to(&mut bytes)?;
        Ok(bytes)
    }

    /// Writes the payload of `value` (no type tag or key) to `writer`.
    pub fn encode_value<W: Write>(&self, writer: W, value: &Bson) -> Result<()> {
        let (len, table) = LenTable::measure_value(value)?;
        self.check_size(len)?;
        ValueWriter::new(writer, table.lens()).value(value)
    }

    fn check_size(&self, size: usize) -> Result<i32> {
        let max = self.options.max_document_size.min(i32::MAX as usize);
        if size > max {
            return Err(ErrorKind::DocumentTooLarge { size, max }.into());
        }
        Ok(size as i32)
    }
}

/// A document whose encoded length is known and within limits.
pub(crate) struct MeasuredDocument<'a> {
    doc: &'a Document,
    table: LenTable,
}

impl MeasuredDocument<'_> {
    pub(crate) fn len(&self) -> usize {
        self.table.root()
    }

    pub(crate) fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        ValueWriter::new(writer, self.table.lens()).document(self.doc)
    }
}

/// Writes values using lengths precomputed by [`LenTable`], consuming them in visit order.
struct ValueWriter<'a, W> {
    writer: W,
    lens: &'a [usize],
    next: usize,
}

impl<'a, W: Write> ValueWriter<'a, W> {
    fn new(writer: W, lens: &'a [usize]) -> Self {
        Self {
            writer,
            lens,
            next: 0,
        }
    }

    fn next_len(&mut self) -> i32 {
        let len = self.lens.get(self.next).copied().unwrap_or_default();
        self.next += 1;
        len as i32
    }

    fn document(&mut self, doc: &Document) -> Result<()> {
        let len = self.next_len();
        self.i32(len)?;
        for (key, value) in doc {
            self.element(key, value)?;
        }
        self.writer.write_all(&[0])?;
        Ok(())
    }

    fn array(&mut self, array: &Array) -> Result<()> {
        let len = self.next_len();
        self.i32(len)?;
        for (index, value) in array.iter().enumerate() {
            self.element(&index.to_string(), value)?;
        }
        self.writer.write_all(&[0])?;
        Ok(())
    }

    fn element(&mut self, key: &str, value: &Bson) -> Result<()> {
        self.writer.write_all(&[value.element_type() as u8])?;
        self.cstring(key)?;
        self.value(value)
    }

    fn value(&mut self, value: &Bson) -> Result<()> {
        match value {
            Bson::Double(v) => self.writer.write_all(&v.to_le_bytes())?,
            Bson::String(s) | Bson::JavaScriptCode(s) | Bson::Symbol(s) => self.string(s)?,
            Bson::Document(doc) => self.document(doc)?,
            Bson::Array(array) => self.array(array)?,
            Bson::Binary(binary) => {
                let len = binary.bytes.len() as i32;
                if let BinarySubtype::BinaryOld = binary.subtype {
                    self.i32(len + 4)?;
                    self.writer.write_all(&[u8::from(binary.subtype)])?;
                    self.i32(len)?;
                } else {
                    self.i32(len)?;
                    self.writer.write_all(&[u8::from(binary.subtype)])?;
                }
                self.writer.write_all(&binary.bytes)?;
            }
            Bson::Undefined | Bson::Null | Bson::MinKey | Bson::MaxKey => {}
            Bson::ObjectId(id) => self.writer.write_all(&id.bytes())?,
            Bson::Boolean(b) => self.writer.write_all(&[u8::from(*b)])?,
            Bson::DateTime(dt) => self.writer.write_all(&dt.timestamp_millis().to_le_bytes())?,
            Bson::RegularExpression(regex) => {
                self.cstring(&regex.pattern)?;
                self.cstring(&regex.options)?;
            }
            Bson::DbPointer(pointer) => {
                self.string(&pointer.namespace)?;
                self.writer.write_all(&pointer.id.bytes())?;
            }
            Bson::JavaScriptCodeWithScope(code) => {
                let scope_len = self.lens.get(self.next).copied().unwrap_or_default();
                let total = 4 + 4 + code.code.len() + 1 + scope_len;
                self.i32(total as i32)?;
                self.string(&code.code)?;
                self.document(&code.scope)?;
            }
            Bson::Int32(v) => self.i32(*v)?,
            Bson::Timestamp(ts) => self.writer.write_all(&ts.to_le_bytes())?,
            Bson::Int64(v) => self.writer.write_all(&v.to_le_bytes())?,
        }
        Ok(())
    }

    fn i32(&mut self, v: i32) -> Result<()> {
        self.writer.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    fn cstring(&mut self, s: &str) -> Result<()> {
        self.writer.write_all(s.as_bytes())?;
        self.writer.write_all(&[0])?;
        Ok(())
    }

    fn string(&mut self, s: &str) -> Result<()> {
        self.i32(s.len() as i32 + 1)?;
        self.cstring(s)
    }
}
