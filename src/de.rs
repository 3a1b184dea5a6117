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

//! Decoder

mod reader;

use std::io::Read;

pub use self::reader::{BsonReader, DEFAULT_CHUNK_SIZE};
use crate::{
    bson::{Array, Binary, Bson, DbPointer, JavaScriptCodeWithScope, Regex, Timestamp},
    error::{Error, Result},
    oid::ObjectId,
    spec::{BinarySubtype, ElementType},
    DateTime,
    Document,
};

/// The smallest possible document: a length prefix and a terminator.
pub(crate) const MIN_DOCUMENT_LEN: i32 = 5;

/// Options that control how BSON is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct DecoderOptions {
    /// Size of the internal buffer used for string reads. Decoding results do not depend on it.
    pub chunk_size: usize,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl DecoderOptions {
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }
}

/// Decodes [`Document`]s from a byte stream.
///
/// Malformed input is never tolerated: a length prefix that disagrees with the bytes consumed, a
/// misplaced terminator or an unknown element type all fail with
/// [`ErrorKind::CorruptData`].
pub struct Decoder<R> {
    reader: BsonReader<R>,
}

impl<R: Read> Decoder<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, DecoderOptions::default())
    }

    pub fn with_options(reader: R, options: DecoderOptions) -> Self {
        Self {
            reader: BsonReader::with_chunk_size(reader, options.chunk_size),
        }
    }

    /// Number of bytes consumed from the underlying reader so far.
    pub fn position(&self) -> u64 {
        self.reader.position()
    }

    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    /// Decodes the next document from the stream.
    pub fn decode_document(&mut self) -> Result<Document> {
        self.decode_document_with_length().map(|(_, doc)| doc)
    }

    /// Decodes the next document, also returning the length it declared (and occupied).
    pub fn decode_document_with_length(&mut self) -> Result<(i32, Document)> {
        let mut doc = Document::new();
        let declared = self.read_document(|key, value| {
            if doc.contains_key(&key) {
                return Err(Error::corrupt_data(format!("duplicate key \"{key}\"")));
            }
            doc.insert(key, value);
            Ok(())
        })?;
        Ok((declared, doc))
    }

    fn decode_array(&mut self) -> Result<Array> {
        let mut array = Array::new();
        self.read_document(|_, value| {
            array.push(value);
            Ok(())
        })?;
        Ok(array)
    }

    /// Reads one length-prefixed element list, handing each element to `sink`, and returns the
    /// declared length after checking it against the bytes consumed.
    fn read_document<F>(&mut self, mut sink: F) -> Result<i32>
    where
        F: FnMut(String, Bson) -> Result<()>,
    {
        let start = self.reader.position();
        let declared = self.reader.read_i32()?;
        if declared < MIN_DOCUMENT_LEN {
            return Err(Error::corrupt_data(format!(
                "document length must be at least {MIN_DOCUMENT_LEN}, got {declared}"
            )));
        }

        self.read_elements(start, declared as u64, &mut sink)
            .map_err(|e| e.truncated_document(declared))?;
        Ok(declared)
    }

    fn read_elements<F>(&mut self, start: u64, declared: u64, sink: &mut F) -> Result<()>
    where
        F: FnMut(String, Bson) -> Result<()>,
    {
        let terminator_at = declared - 1;

        loop {
            let consumed = self.reader.position() - start;
            if consumed == terminator_at {
                break;
            }
            if consumed > terminator_at {
                return Err(Error::corrupt_data(format!(
                    "document overran its declared length of {declared} bytes"
                )));
            }

            let tag = self.reader.read_u8()?;
            if tag == 0 {
                return Err(Error::corrupt_data(format!(
                    "terminator at offset {consumed} but expected at offset {terminator_at}"
                )));
            }

            let key = self.reader.read_cstring()?;
            let value = match self.decode_element(tag) {
                Ok(value) => value,
                Err(e) if e.key.is_some() => return Err(e),
                Err(e) => return Err(e.with_key(key)),
            };
            sink(key, value)?;
        }

        match self.reader.read_u8()? {
            0 => Ok(()),
            other => Err(Error::corrupt_data(format!(
                "expected document terminator at offset {terminator_at}, found {other:#04x}"
            ))),
        }
    }

    fn decode_element(&mut self, tag: u8) -> Result<Bson> {
        let element_type = ElementType::from(tag).ok_or_else(|| {
            Error::corrupt_data(format!("unrecognized element type {tag:#04x}"))
        })?;

        let value = match element_type {
            ElementType::Double => Bson::Double(self.reader.read_f64()?),
            ElementType::String => Bson::String(self.reader.read_string()?),
            ElementType::EmbeddedDocument => Bson::Document(self.decode_document()?),
            ElementType::Array => Bson::Array(self.decode_array()?),
            ElementType::Binary => Bson::Binary(self.decode_binary()?),
            ElementType::Undefined => Bson::Undefined,
            ElementType::ObjectId => Bson::ObjectId(self.read_object_id()?),
            ElementType::Boolean => match self.reader.read_u8()? {
                0 => Bson::Boolean(false),
                1 => Bson::Boolean(true),
                other => {
                    return Err(Error::corrupt_data(format!(
                        "boolean must be 0 or 1, got {other}"
                    )));
                }
            },
            ElementType::DateTime => Bson::DateTime(DateTime::from_millis(self.reader.read_i64()?)),
            ElementType::Null => Bson::Null,
            ElementType::RegularExpression => {
                let pattern = self.reader.read_cstring()?;
                let options = self.reader.read_cstring()?;
                Bson::RegularExpression(Regex { pattern, options })
            }
            ElementType::DbPointer => {
                let namespace = self.reader.read_string()?;
                let id = self.read_object_id()?;
                Bson::DbPointer(DbPointer { namespace, id })
            }
            ElementType::JavaScriptCode => Bson::JavaScriptCode(self.reader.read_string()?),
            ElementType::Symbol => Bson::Symbol(self.reader.read_string()?),
            ElementType::JavaScriptCodeWithScope => {
                Bson::JavaScriptCodeWithScope(self.decode_code_with_scope()?)
            }
            ElementType::Int32 => Bson::Int32(self.reader.read_i32()?),
            ElementType::Timestamp => {
                let mut bytes = [0; 8];
                self.reader.read_exact(&mut bytes)?;
                Bson::Timestamp(Timestamp::from_le_bytes(bytes))
            }
            ElementType::Int64 => Bson::Int64(self.reader.read_i64()?),
            ElementType::MaxKey => Bson::MaxKey,
            ElementType::MinKey => Bson::MinKey,
        };

        Ok(value)
    }

    fn read_object_id(&mut self) -> Result<ObjectId> {
        let mut id = [0; 12];
        self.reader.read_exact(&mut id)?;
        Ok(ObjectId::from_bytes(id))
    }

    fn decode_binary(&mut self) -> Result<Binary> {
        let len = self.reader.read_i32()?;
        if len < 0 {
            return Err(Error::corrupt_data(format!("negative binary length {len}")));
        }
        let subtype = BinarySubtype::from(self.reader.read_u8()?);

        let len = if let BinarySubtype::BinaryOld = subtype {
            let inner = self.reader.read_i32()?;
            if inner < 0 || inner > len - 4 {
                return Err(Error::corrupt_data(format!(
                    "binary length {inner} does not fit in its outer length {len}"
                )));
            }
            inner
        } else {
            len
        };

        let bytes = self.reader.read_bytes(len as usize)?;
        Ok(Binary { subtype, bytes })
    }

    fn decode_code_with_scope(&mut self) -> Result<JavaScriptCodeWithScope> {
        let start = self.reader.position();
        let total = self.reader.read_i32()?;
        let code = self.reader.read_string()?;
        let scope = self.decode_document()?;

        let consumed = self.reader.position() - start;
        if consumed != total as u64 {
            return Err(Error::corrupt_data(format!(
                "code with scope declared {total} bytes but occupied {consumed}"
            )));
        }

        Ok(JavaScriptCodeWithScope { code, scope })
    }
}

/// Decodes a single document from `reader` using the default options.
pub fn decode_document<R: Read>(reader: R) -> Result<Document> {
    Decoder::new(reader).decode_document()
}
