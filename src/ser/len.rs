use crate::{
    bson::{Array, Bson},
    error::{Error, ErrorKind, Result},
    spec::BinarySubtype,
    Document,
};

/// Encoded lengths of every document visited while measuring, in the order they will be written.
/// The root document's length is always at index zero.
#[derive(Debug, Default)]
pub(crate) struct LenTable {
    lens: Vec<usize>,

    /// Whether keys and regex parts are checked for interior nulls while measuring.
    strict: bool,
}

impl LenTable {
    /// Measures `doc`, failing if any cstring it would write contains a null byte.
    pub(crate) fn measure(doc: &Document) -> Result<Self> {
        let mut table = Self {
            lens: Vec::new(),
            strict: true,
        };
        table.document(doc)?;
        Ok(table)
    }

    /// Measures a lone value. The table holds the lengths of any documents nested inside it.
    pub(crate) fn measure_value(value: &Bson) -> Result<(usize, Self)> {
        let mut table = Self {
            lens: Vec::new(),
            strict: true,
        };
        let len = table.value(value)?;
        Ok((len, table))
    }

    pub(crate) fn root(&self) -> usize {
        self.lens.first().copied().unwrap_or(0)
    }

    pub(crate) fn lens(&self) -> &[usize] {
        &self.lens
    }

    fn document(&mut self, doc: &Document) -> Result<usize> {
        let index = self.enter_doc();
        let mut len = 0;
        for (key, value) in doc {
            self.cstring(key).map_err(|e| e.with_key(key.as_str()))?;
            len += element_len(key.len(), self.value(value).map_err(|e| keyed(e, key))?);
        }
        Ok(self.exit_doc(index, len))
    }

    fn array(&mut self, array: &Array) -> Result<usize> {
        let index = self.enter_doc();
        let mut len = 0;
        for (i, value) in array.iter().enumerate() {
            let value_len = self.value(value).map_err(|e| match e.index {
                Some(_) => e,
                None => e.with_index(i),
            })?;
            len += element_len(index_key_len(i), value_len);
        }
        Ok(self.exit_doc(index, len))
    }

    #[inline]
    fn enter_doc(&mut self) -> usize {
        let index = self.lens.len();
        self.lens.push(0);
        index
    }

    #[inline]
    fn exit_doc(&mut self, index: usize, elements_len: usize) -> usize {
        let len = elements_len + 4 + 1; // i32 doc len + null terminator.
        self.lens[index] = len;
        len
    }

    fn cstring(&self, s: &str) -> Result<usize> {
        if self.strict && s.contains('\0') {
            return Err(ErrorKind::InvalidCString {
                value: s.to_string(),
            }
            .into());
        }
        Ok(s.len() + 1)
    }

    /// The payload length of `value`, excluding its type tag and key.
    fn value(&mut self, value: &Bson) -> Result<usize> {
        let len = match value {
            Bson::Double(_) | Bson::Int64(_) | Bson::DateTime(_) | Bson::Timestamp(_) => 8,
            Bson::Int32(_) => 4,
            Bson::Boolean(_) => 1,
            Bson::ObjectId(_) => 12,
            Bson::Null | Bson::Undefined | Bson::MinKey | Bson::MaxKey => 0,
            Bson::String(s) | Bson::JavaScriptCode(s) | Bson::Symbol(s) => string_len(s),
            Bson::Document(doc) => self.document(doc)?,
            Bson::Array(array) => self.array(array)?,
            Bson::Binary(binary) => {
                let old = matches!(binary.subtype, BinarySubtype::BinaryOld);
                4 + 1 + if old { 4 } else { 0 } + binary.bytes.len()
            }
            Bson::RegularExpression(regex) => {
                self.cstring(&regex.pattern)? + self.cstring(&regex.options)?
            }
            Bson::JavaScriptCodeWithScope(code) => {
                4 + string_len(&code.code) + self.document(&code.scope)?
            }
            Bson::DbPointer(pointer) => string_len(&pointer.namespace) + 12,
        };
        Ok(len)
    }
}

fn keyed(error: Error, key: &str) -> Error {
    match error.key {
        Some(_) => error,
        None => error.with_key(key),
    }
}

/// Length of a tagged element whose key is `key_len` bytes long.
#[inline]
fn element_len(key_len: usize, value_len: usize) -> usize {
    1 + key_len + 1 + value_len
}

/// Length of an `int32` length-prefixed, null-terminated string.
#[inline]
fn string_len(s: &str) -> usize {
    4 + s.len() + 1
}

/// Number of decimal digits in `index`, i.e. the length of its array key.
pub(crate) fn index_key_len(index: usize) -> usize {
    index.checked_ilog10().map_or(1, |digits| digits as usize + 1)
}

/// Encoded length of `doc`. Interior nulls are not checked.
pub(crate) fn document_len(doc: &Document) -> usize {
    let mut table = LenTable {
        lens: Vec::new(),
        strict: false,
    };
    // only cstring checks can fail, and they are off
    table.document(doc).unwrap_or_default()
}
