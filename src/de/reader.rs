use std::io::Read;

use crate::error::{Error, ErrorKind, Result};

/// Size of the internal buffer used to read strings, in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 128;

/// A byte-counting reader over a BSON stream.
///
/// Strings are read through a fixed-size internal buffer. A multi-byte UTF-8 sequence split at the
/// end of a buffer fill is carried over to the next fill, so the decoded text does not depend on
/// the buffer size.
pub struct BsonReader<R> {
    inner: R,
    position: u64,
    chunk_size: usize,
    buffer: Vec<u8>,
}

impl<R: Read> BsonReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_chunk_size(inner, DEFAULT_CHUNK_SIZE)
    }

    /// Creates a reader whose string buffer holds `chunk_size` bytes (at least one).
    pub fn with_chunk_size(inner: R, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            inner,
            position: 0,
            chunk_size,
            buffer: Vec::with_capacity(chunk_size + 3),
        }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.inner.read_exact(buf)?;
        self.position += buf.len() as u64;
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let mut buf = [0; 4];
        self.read_exact(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        let mut buf = [0; 8];
        self.read_exact(&mut buf)?;
        Ok(i64::from_le_bytes(buf))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        let mut buf = [0; 8];
        self.read_exact(&mut buf)?;
        Ok(f64::from_le_bytes(buf))
    }

    /// Reads exactly `len` bytes without trusting `len` for the up-front allocation.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(len.min(self.chunk_size));
        let read = (&mut self.inner).take(len as u64).read_to_end(&mut bytes)?;
        self.position += read as u64;
        if read != len {
            return Err(ErrorKind::UnexpectedEndOfStream.into());
        }
        Ok(bytes)
    }

    /// Reads a null-terminated string.
    pub fn read_cstring(&mut self) -> Result<String> {
        let mut bytes = Vec::new();
        loop {
            match self.read_u8()? {
                0 => break,
                b => bytes.push(b),
            }
        }

        simdutf8::basic::from_utf8(&bytes)
            .map(str::to_owned)
            .map_err(|_| ErrorKind::Utf8Encoding.into())
    }

    /// Reads an `int32` length-prefixed, null-terminated string.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_i32()?;
        if len < 1 {
            return Err(Error::corrupt_data(format!(
                "string length must be at least 1, got {len}"
            )));
        }

        let mut remaining = (len - 1) as usize;
        let mut out = String::with_capacity(remaining.min(self.chunk_size));
        let mut carry = [0u8; 3];
        let mut carry_len = 0;

        while remaining > 0 {
            let take = remaining.min(self.chunk_size);

            self.buffer.clear();
            self.buffer.extend_from_slice(&carry[..carry_len]);
            let start = self.buffer.len();
            self.buffer.resize(start + take, 0);
            self.inner.read_exact(&mut self.buffer[start..])?;
            self.position += take as u64;
            remaining -= take;

            let complete = complete_prefix_len(&self.buffer);
            let text = simdutf8::basic::from_utf8(&self.buffer[..complete])
                .map_err(|_| Error::from(ErrorKind::Utf8Encoding))?;
            out.push_str(text);

            carry_len = self.buffer.len() - complete;
            carry[..carry_len].copy_from_slice(&self.buffer[complete..]);
        }

        if carry_len > 0 {
            // the string's byte count ended inside a multi-byte sequence
            return Err(ErrorKind::Utf8Encoding.into());
        }

        if self.read_u8()? != 0 {
            return Err(Error::corrupt_data("string is not null terminated"));
        }

        Ok(out)
    }
}

/// Number of bytes a UTF-8 sequence occupies, judged by its lead byte. Continuation and invalid
/// lead bytes count as one so that validation reports them.
fn sequence_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    }
}

fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

/// Length of the longest prefix of `bytes` that does not end in a truncated multi-byte sequence.
fn complete_prefix_len(bytes: &[u8]) -> usize {
    let len = bytes.len();
    let lookback = len.min(4);

    for offset in 1..=lookback {
        let index = len - offset;
        let byte = bytes[index];
        if !is_continuation(byte) {
            return if sequence_len(byte) > offset {
                index
            } else {
                len
            };
        }
    }

    len
}
