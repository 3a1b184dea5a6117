//! A BSON document represented as an associative HashMap with insertion ordering.

use std::{
    fmt::{self, Debug, Display, Formatter},
    io::{Read, Write},
    iter::{Extend, FromIterator, IntoIterator},
};

use ahash::RandomState;
use indexmap::IndexMap;

use crate::{
    bson::{Array, Binary, Bson, Timestamp},
    de::Decoder,
    error::{Error, ErrorKind, Result},
    oid::ObjectId,
    ser::Encoder,
    spec::ElementType,
    DateTime,
};

/// A BSON document represented as an associative HashMap with insertion ordering.
///
/// Insertion order is preserved through encoding and decoding, since it affects both the
/// encoded bytes and the meaning of query modifiers.
#[derive(Clone, PartialEq)]
pub struct Document {
    inner: IndexMap<String, Bson, RandomState>,
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

impl Display for Document {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        fmt.write_str("{")?;

        let mut first = true;
        for (k, v) in self {
            if first {
                first = false;
                fmt.write_str(" ")?;
            } else {
                fmt.write_str(", ")?;
            }

            write!(fmt, "\"{}\": {}", k, v)?;
        }

        write!(fmt, "{}}}", if !first { " " } else { "" })
    }
}

impl Debug for Document {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        write!(fmt, "Document(")?;
        Debug::fmt(&self.inner, fmt)?;
        write!(fmt, ")")
    }
}

/// An owning iterator over Document entries.
pub struct IntoIter {
    inner: indexmap::map::IntoIter<String, Bson>,
}

/// An iterator over Document entries.
pub struct Iter<'a> {
    inner: indexmap::map::Iter<'a, String, Bson>,
}

/// An iterator over an Document's keys.
pub struct Keys<'a> {
    inner: indexmap::map::Keys<'a, String, Bson>,
}

/// An iterator over an Document's values.
pub struct Values<'a> {
    inner: indexmap::map::Values<'a, String, Bson>,
}

/// An owning iterator over a Document's values.
pub struct IntoValues {
    inner: indexmap::map::IntoValues<String, Bson>,
}

/// An iterator over a [`Document`]'s keys and mutable values.
pub struct IterMut<'a> {
    inner: indexmap::map::IterMut<'a, String, Bson>,
}

impl<'a> Iterator for Keys<'a> {
    type Item = &'a String;

    fn next(&mut self) -> Option<&'a String> {
        self.inner.next()
    }
}

impl<'a> Iterator for Values<'a> {
    type Item = &'a Bson;

    fn next(&mut self) -> Option<&'a Bson> {
        self.inner.next()
    }
}

impl Iterator for IntoValues {
    type Item = Bson;

    fn next(&mut self) -> Option<Bson> {
        self.inner.next()
    }
}

impl IntoIterator for Document {
    type Item = (String, Bson);
    type IntoIter = IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.inner.into_iter(),
        }
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Bson);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        Iter {
            inner: self.inner.iter(),
        }
    }
}

impl FromIterator<(String, Bson)> for Document {
    fn from_iter<T: IntoIterator<Item = (String, Bson)>>(iter: T) -> Self {
        let mut doc = Document::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

impl Iterator for IntoIter {
    type Item = (String, Bson);

    fn next(&mut self) -> Option<(String, Bson)> {
        self.inner.next()
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a String, &'a Bson);

    fn next(&mut self) -> Option<(&'a String, &'a Bson)> {
        self.inner.next()
    }
}

impl<'a> Iterator for IterMut<'a> {
    type Item = (&'a String, &'a mut Bson);

    fn next(&mut self) -> Option<(&'a String, &'a mut Bson)> {
        self.inner.next()
    }
}

macro_rules! typed_getter {
    ($(#[$doc:meta] $name:ident -> $ret:ty, $pattern:pat => $value:expr, $expected:ident;)*) => {
        $(
            #[$doc]
            pub fn $name(&self, key: impl AsRef<str>) -> Result<$ret> {
                let key = key.as_ref();
                match self.get(key) {
                    Some($pattern) => Ok($value),
                    Some(other) => Err(Error::value_access_unexpected_type(
                        other.element_type(),
                        ElementType::$expected,
                    )
                    .with_key(key)),
                    None => Err(Error::value_access_not_present().with_key(key)),
                }
            }
        )*
    };
}

impl Document {
    /// Creates a new empty Document.
    pub fn new() -> Document {
        Document {
            inner: IndexMap::default(),
        }
    }

    /// Gets an iterator over the entries of the map.
    pub fn iter(&self) -> Iter<'_> {
        self.into_iter()
    }

    /// Gets an iterator over pairs of keys and mutable values.
    pub fn iter_mut(&mut self) -> IterMut<'_> {
        IterMut {
            inner: self.inner.iter_mut(),
        }
    }

    /// Clears the document, removing all values.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Returns a reference to the Bson corresponding to the key.
    pub fn get(&self, key: impl AsRef<str>) -> Option<&Bson> {
        self.inner.get(key.as_ref())
    }

    /// Gets a mutable reference to the Bson corresponding to the key
    pub fn get_mut(&mut self, key: impl AsRef<str>) -> Option<&mut Bson> {
        self.inner.get_mut(key.as_ref())
    }

    typed_getter! {
        /// Get a floating point value for this key if it exists and has the correct type.
        get_f64 -> f64, Bson::Double(v) => *v, Double;
        /// Get a string slice this key if it exists and has the correct type.
        get_str -> &str, Bson::String(v) => v.as_str(), String;
        /// Get a reference to an array for this key if it exists and has the correct type.
        get_array -> &Array, Bson::Array(v) => v, Array;
        /// Get a reference to a document for this key if it exists and has the correct type.
        get_document -> &Document, Bson::Document(v) => v, EmbeddedDocument;
        /// Get a bool value for this key if it exists and has the correct type.
        get_bool -> bool, Bson::Boolean(v) => *v, Boolean;
        /// Get an i32 value for this key if it exists and has the correct type.
        get_i32 -> i32, Bson::Int32(v) => *v, Int32;
        /// Get an i64 value for this key if it exists and has the correct type.
        get_i64 -> i64, Bson::Int64(v) => *v, Int64;
        /// Get a time stamp value for this key if it exists and has the correct type.
        get_timestamp -> Timestamp, Bson::Timestamp(v) => *v, Timestamp;
        /// Get a reference to a binary value for this key if it exists and has the correct type.
        get_binary -> &Binary, Bson::Binary(v) => v, Binary;
        /// Get an object id value for this key if it exists and has the correct type.
        get_object_id -> ObjectId, Bson::ObjectId(v) => *v, ObjectId;
        /// Get a UTC datetime value for this key if it exists and has the correct type.
        get_datetime -> DateTime, Bson::DateTime(v) => *v, DateTime;
    }

    /// Returns whether this key has a null value
    pub fn is_null(&self, key: impl AsRef<str>) -> bool {
        self.get(key) == Some(&Bson::Null)
    }

    /// Returns true if the map contains a value for the specified key.
    pub fn contains_key(&self, key: impl AsRef<str>) -> bool {
        self.inner.contains_key(key.as_ref())
    }

    /// Gets a collection of all keys in the document.
    pub fn keys(&self) -> Keys<'_> {
        Keys {
            inner: self.inner.keys(),
        }
    }

    /// Gets a collection of all values in the document.
    pub fn values(&self) -> Values<'_> {
        Values {
            inner: self.inner.values(),
        }
    }

    /// Consumes the document, yielding its values in order.
    pub fn into_values(self) -> IntoValues {
        IntoValues {
            inner: self.inner.into_values(),
        }
    }

    /// Returns the number of elements in the document.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the document contains no elements
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Sets the value for `key`, returning the previous value.
    ///
    /// An existing key is updated in place and keeps its position; a new key is appended.
    pub fn insert<KT: Into<String>, BT: Into<Bson>>(&mut self, key: KT, val: BT) -> Option<Bson> {
        self.inner.insert(key.into(), val.into())
    }

    /// Appends a new key, failing with [`ErrorKind::DuplicateKey`] if it is already present.
    pub fn append<KT: Into<String>, BT: Into<Bson>>(&mut self, key: KT, val: BT) -> Result<()> {
        match self.inner.entry(key.into()) {
            indexmap::map::Entry::Occupied(o) => Err(ErrorKind::DuplicateKey {
                key: o.key().clone(),
            }
            .into()),
            indexmap::map::Entry::Vacant(v) => {
                v.insert(val.into());
                Ok(())
            }
        }
    }

    /// Takes the value of the entry out of the document, and returns it.
    /// Computes in **O(n)** time (average).
    pub fn remove(&mut self, key: impl AsRef<str>) -> Option<Bson> {
        self.inner.shift_remove(key.as_ref())
    }

    /// Whether the keys are exactly `"0"`, `"1"`, ... `"n-1"` in order, the shape of an encoded
    /// array. The element types play no part; an empty document is array-shaped.
    pub fn is_array_shaped(&self) -> bool {
        self.keys()
            .enumerate()
            .all(|(index, key)| is_index_key(key, index))
    }

    /// Converts an array-shaped document into an [`Array`], or gives the document back unchanged.
    pub fn into_array(self) -> std::result::Result<Array, Document> {
        if self.is_array_shaped() {
            Ok(self.into_values().collect())
        } else {
            Err(self)
        }
    }

    /// Builds the array-shaped document for `array`, keyed by decimal index.
    pub fn from_array(array: Array) -> Document {
        array
            .into_iter()
            .enumerate()
            .map(|(index, value)| (index.to_string(), value))
            .collect()
    }

    /// The number of bytes this document occupies when encoded, including its length prefix and
    /// terminator.
    pub fn encoded_len(&self) -> usize {
        crate::ser::document_len(self)
    }

    /// Attempts to encode the [`Document`] into a byte stream using the default
    /// [`Encoder`] options.
    ///
    /// ```
    /// # fn main() -> bson_wire::error::Result<()> {
    /// use bson_wire::doc;
    ///
    /// let mut v: Vec<u8> = Vec::new();
    /// let doc = doc! { "x": 1 };
    /// doc.to_writer(&mut v)?;
    /// assert_eq!(v.len(), doc.encoded_len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn to_writer<W: Write>(&self, mut writer: W) -> Result<()> {
        Encoder::default().encode_document(&mut writer, self)
    }

    /// Encodes the document into a freshly allocated buffer.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        Encoder::default().to_vec(self)
    }

    /// Attempts to decode a [`Document`] from a byte stream.
    ///
    /// ```
    /// # use std::error::Error;
    /// # fn main() -> std::result::Result<(), Box<dyn Error>> {
    /// use bson_wire::{doc, Document};
    /// use std::io::Cursor;
    ///
    /// let doc = doc! { "z": 1, "a": 2, "m": 3 };
    /// let bytes = doc.to_vec()?;
    ///
    /// let decoded = Document::from_reader(Cursor::new(bytes))?;
    /// assert_eq!(decoded.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_reader<R: Read>(reader: R) -> Result<Document> {
        Decoder::new(reader).decode_document()
    }

    /// Decodes a document from the start of `bytes`. Trailing bytes are ignored.
    pub fn from_slice(bytes: &[u8]) -> Result<Document> {
        Self::from_reader(bytes)
    }
}

fn is_index_key(key: &str, index: usize) -> bool {
    key == index.to_string()
}

impl Extend<(String, Bson)> for Document {
    fn extend<T: IntoIterator<Item = (String, Bson)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}
