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

//! BSON definition

use std::{
    cmp::Ordering,
    fmt::{self, Debug, Display},
};

use base64::Engine as _;

pub use crate::document::Document;
use crate::{
    error::{Error, Result},
    oid::ObjectId,
    spec::{BinarySubtype, ElementType},
    DateTime,
};

/// Possible BSON value types.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Bson {
    /// 64-bit binary floating point
    Double(f64),
    /// UTF-8 string
    String(String),
    /// Array
    Array(Array),
    /// Embedded document
    Document(Document),
    /// Boolean value
    Boolean(bool),
    /// Null value
    #[default]
    Null,
    /// Regular expression
    RegularExpression(Regex),
    /// JavaScript code
    JavaScriptCode(String),
    /// JavaScript code w/ scope
    JavaScriptCodeWithScope(JavaScriptCodeWithScope),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// Timestamp
    Timestamp(Timestamp),
    /// Binary data
    Binary(Binary),
    /// [ObjectId](http://dochub.mongodb.org/core/objectids)
    ObjectId(ObjectId),
    /// UTC datetime
    DateTime(DateTime),
    /// Symbol (Deprecated)
    Symbol(String),
    /// Undefined value (Deprecated)
    Undefined,
    /// Max key
    MaxKey,
    /// Min key
    MinKey,
    /// DBPointer (Deprecated)
    DbPointer(DbPointer),
}

/// Alias for `Vec<Bson>`.
pub type Array = Vec<Bson>;

impl Display for Bson {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Bson::Double(f) => write!(fmt, "{}", f),
            Bson::String(ref s) => write!(fmt, "\"{}\"", s),
            Bson::Array(ref vec) => {
                fmt.write_str("[")?;

                let mut first = true;
                for bson in vec {
                    if !first {
                        fmt.write_str(", ")?;
                    }

                    write!(fmt, "{}", bson)?;
                    first = false;
                }

                fmt.write_str("]")
            }
            Bson::Document(ref doc) => write!(fmt, "{}", doc),
            Bson::Boolean(b) => write!(fmt, "{}", b),
            Bson::Null => write!(fmt, "null"),
            Bson::RegularExpression(ref regex) => write!(fmt, "{}", regex),
            Bson::JavaScriptCode(ref code)
            | Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope { ref code, .. }) => {
                fmt.write_str(code)
            }
            Bson::Int32(i) => write!(fmt, "{}", i),
            Bson::Int64(i) => write!(fmt, "{}", i),
            Bson::Timestamp(Timestamp { time, increment }) => {
                write!(fmt, "Timestamp({}, {})", time, increment)
            }
            Bson::Binary(ref binary) => write!(fmt, "{}", binary),
            Bson::ObjectId(ref id) => write!(fmt, "ObjectId(\"{}\")", id),
            Bson::DateTime(date_time) => write!(fmt, "Date(\"{}\")", date_time),
            Bson::Symbol(ref sym) => write!(fmt, "Symbol(\"{}\")", sym),
            Bson::Undefined => write!(fmt, "undefined"),
            Bson::MinKey => write!(fmt, "MinKey"),
            Bson::MaxKey => write!(fmt, "MaxKey"),
            Bson::DbPointer(DbPointer {
                ref namespace,
                ref id,
            }) => write!(fmt, "DBPointer({}, {})", namespace, id),
        }
    }
}

impl From<f32> for Bson {
    fn from(a: f32) -> Bson {
        Bson::Double(a as f64)
    }
}

impl From<f64> for Bson {
    fn from(a: f64) -> Bson {
        Bson::Double(a)
    }
}

impl From<&str> for Bson {
    fn from(s: &str) -> Bson {
        Bson::String(s.to_owned())
    }
}

impl From<String> for Bson {
    fn from(a: String) -> Bson {
        Bson::String(a)
    }
}

impl From<Document> for Bson {
    fn from(a: Document) -> Bson {
        Bson::Document(a)
    }
}

impl From<bool> for Bson {
    fn from(a: bool) -> Bson {
        Bson::Boolean(a)
    }
}

impl From<Regex> for Bson {
    fn from(regex: Regex) -> Bson {
        Bson::RegularExpression(regex)
    }
}

impl From<JavaScriptCodeWithScope> for Bson {
    fn from(code_with_scope: JavaScriptCodeWithScope) -> Bson {
        Bson::JavaScriptCodeWithScope(code_with_scope)
    }
}

impl From<Binary> for Bson {
    fn from(binary: Binary) -> Bson {
        Bson::Binary(binary)
    }
}

impl From<Timestamp> for Bson {
    fn from(ts: Timestamp) -> Bson {
        Bson::Timestamp(ts)
    }
}

impl From<DbPointer> for Bson {
    fn from(pointer: DbPointer) -> Bson {
        Bson::DbPointer(pointer)
    }
}

impl<T> From<&T> for Bson
where
    T: Clone + Into<Bson>,
{
    fn from(t: &T) -> Bson {
        t.clone().into()
    }
}

impl<T> From<Vec<T>> for Bson
where
    T: Into<Bson>,
{
    fn from(v: Vec<T>) -> Bson {
        Bson::Array(v.into_iter().map(|val| val.into()).collect())
    }
}

impl<T> From<&[T]> for Bson
where
    T: Clone + Into<Bson>,
{
    fn from(s: &[T]) -> Bson {
        Bson::Array(s.iter().cloned().map(|val| val.into()).collect())
    }
}

impl<T> From<Option<T>> for Bson
where
    T: Into<Bson>,
{
    fn from(a: Option<T>) -> Bson {
        match a {
            None => Bson::Null,
            Some(t) => t.into(),
        }
    }
}

impl<T: Into<Bson>> ::std::iter::FromIterator<T> for Bson {
    /// # Examples
    ///
    /// ```
    /// use std::iter::FromIterator;
    /// use bson_wire::Bson;
    ///
    /// let x: Bson = Bson::from_iter(vec!["lorem", "ipsum", "dolor"]);
    /// // or
    /// let x: Bson = vec!["lorem", "ipsum", "dolor"].into_iter().collect();
    /// ```
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Bson::Array(iter.into_iter().map(Into::into).collect())
    }
}

// Enumerations and narrow integers are stored as their widened integral value.
macro_rules! widening_int {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Bson {
                fn from(a: $t) -> Bson {
                    Bson::$variant(a.into())
                }
            }
        )*
    };
}

widening_int! {
    i8 => Int32,
    u8 => Int32,
    i16 => Int32,
    u16 => Int32,
    i32 => Int32,
    u32 => Int64,
    i64 => Int64,
}

impl TryFrom<u64> for Bson {
    type Error = Error;

    fn try_from(a: u64) -> Result<Bson> {
        i64::try_from(a).map(Bson::Int64).map_err(|_| {
            Error::unsupported_type(format!("u64 {a} does not fit in a signed 64-bit integer"))
        })
    }
}

impl TryFrom<usize> for Bson {
    type Error = Error;

    fn try_from(a: usize) -> Result<Bson> {
        Bson::try_from(a as u64)
    }
}

impl From<[u8; 12]> for Bson {
    fn from(a: [u8; 12]) -> Bson {
        Bson::ObjectId(ObjectId::from_bytes(a))
    }
}

impl From<ObjectId> for Bson {
    fn from(a: ObjectId) -> Bson {
        Bson::ObjectId(a)
    }
}

impl From<DateTime> for Bson {
    fn from(a: DateTime) -> Bson {
        Bson::DateTime(a)
    }
}

impl From<std::time::SystemTime> for Bson {
    fn from(a: std::time::SystemTime) -> Bson {
        Bson::DateTime(a.into())
    }
}

impl Bson {
    /// Get the [`ElementType`] of this value.
    pub fn element_type(&self) -> ElementType {
        match *self {
            Bson::Double(..) => ElementType::Double,
            Bson::String(..) => ElementType::String,
            Bson::Array(..) => ElementType::Array,
            Bson::Document(..) => ElementType::EmbeddedDocument,
            Bson::Boolean(..) => ElementType::Boolean,
            Bson::Null => ElementType::Null,
            Bson::RegularExpression(..) => ElementType::RegularExpression,
            Bson::JavaScriptCode(..) => ElementType::JavaScriptCode,
            Bson::JavaScriptCodeWithScope(..) => ElementType::JavaScriptCodeWithScope,
            Bson::Int32(..) => ElementType::Int32,
            Bson::Int64(..) => ElementType::Int64,
            Bson::Timestamp(..) => ElementType::Timestamp,
            Bson::Binary(..) => ElementType::Binary,
            Bson::ObjectId(..) => ElementType::ObjectId,
            Bson::DateTime(..) => ElementType::DateTime,
            Bson::Symbol(..) => ElementType::Symbol,
            Bson::Undefined => ElementType::Undefined,
            Bson::MaxKey => ElementType::MaxKey,
            Bson::MinKey => ElementType::MinKey,
            Bson::DbPointer(..) => ElementType::DbPointer,
        }
    }

    /// Position of this value's type in the server's cross-type sort order. Numbers share a rank,
    /// as do strings and symbols.
    fn canonical_rank(&self) -> u8 {
        match *self {
            Bson::MinKey => 0,
            Bson::Null | Bson::Undefined => 1,
            Bson::Double(..) | Bson::Int32(..) | Bson::Int64(..) => 2,
            Bson::String(..) | Bson::Symbol(..) => 3,
            Bson::Document(..) => 4,
            Bson::Array(..) => 5,
            Bson::Binary(..) => 6,
            Bson::ObjectId(..) => 7,
            Bson::DbPointer(..) => 8,
            Bson::Boolean(..) => 9,
            Bson::DateTime(..) => 10,
            Bson::Timestamp(..) => 11,
            Bson::RegularExpression(..) => 12,
            Bson::JavaScriptCode(..) => 13,
            Bson::JavaScriptCodeWithScope(..) => 14,
            Bson::MaxKey => 15,
        }
    }

    /// Compares two values using the cross-type sort order: `MinKey` sorts before every other
    /// value and `MaxKey` after every other value. Numbers compare by numeric value regardless
    /// of their width, and documents and arrays compare element by element.
    ///
    /// ```
    /// use std::cmp::Ordering;
    /// use bson_wire::{Bson, oid::ObjectId};
    ///
    /// let id = Bson::ObjectId(ObjectId::from_bytes([0; 12]));
    /// assert_eq!(Bson::MinKey.compare(&id), Ordering::Less);
    /// assert_eq!(Bson::MaxKey.compare(&id), Ordering::Greater);
    /// assert_eq!(Bson::Int32(2).compare(&Bson::Double(2.0)), Ordering::Equal);
    /// ```
    pub fn compare(&self, other: &Bson) -> Ordering {
        let by_rank = self.canonical_rank().cmp(&other.canonical_rank());
        if by_rank != Ordering::Equal {
            return by_rank;
        }

        match (self, other) {
            (Bson::Int32(a), Bson::Int32(b)) => a.cmp(b),
            (Bson::Int64(a), Bson::Int64(b)) => a.cmp(b),
            (Bson::Int32(a), Bson::Int64(b)) => i64::from(*a).cmp(b),
            (Bson::Int64(a), Bson::Int32(b)) => a.cmp(&i64::from(*b)),
            (Bson::Double(a), Bson::Double(b)) => a.total_cmp(b),
            (Bson::Int32(a), Bson::Double(b)) => compare_integer_to_double(i64::from(*a), *b),
            (Bson::Int64(a), Bson::Double(b)) => compare_integer_to_double(*a, *b),
            (Bson::Double(a), Bson::Int32(b)) => {
                compare_integer_to_double(i64::from(*b), *a).reverse()
            }
            (Bson::Double(a), Bson::Int64(b)) => compare_integer_to_double(*b, *a).reverse(),
            (a, b) if a.canonical_rank() == 3 => a.string_value().cmp(b.string_value()),
            (Bson::Document(a), Bson::Document(b)) => compare_entries(a.iter(), b.iter()),
            (Bson::Array(a), Bson::Array(b)) => compare_values(a, b),
            (Bson::Binary(a), Bson::Binary(b)) => a
                .bytes
                .len()
                .cmp(&b.bytes.len())
                .then_with(|| u8::from(a.subtype).cmp(&u8::from(b.subtype)))
                .then_with(|| a.bytes.cmp(&b.bytes)),
            (Bson::ObjectId(a), Bson::ObjectId(b)) => a.cmp(b),
            (Bson::DbPointer(a), Bson::DbPointer(b)) => a
                .namespace
                .cmp(&b.namespace)
                .then_with(|| a.id.cmp(&b.id)),
            (Bson::Boolean(a), Bson::Boolean(b)) => a.cmp(b),
            (Bson::DateTime(a), Bson::DateTime(b)) => a.cmp(b),
            (Bson::Timestamp(a), Bson::Timestamp(b)) => a.cmp(b),
            (Bson::RegularExpression(a), Bson::RegularExpression(b)) => a
                .pattern
                .cmp(&b.pattern)
                .then_with(|| a.options.cmp(&b.options)),
            (Bson::JavaScriptCode(a), Bson::JavaScriptCode(b)) => a.cmp(b),
            (Bson::JavaScriptCodeWithScope(a), Bson::JavaScriptCodeWithScope(b)) => a
                .code
                .cmp(&b.code)
                .then_with(|| compare_entries(a.scope.iter(), b.scope.iter())),
            // MinKey, MaxKey, Null and Undefined are each equal to themselves
            _ => Ordering::Equal,
        }
    }

    fn string_value(&self) -> &str {
        match self {
            Bson::String(s) | Bson::Symbol(s) => s,
            _ => "",
        }
    }

    /// The single element type shared by every element of an array, or `None` when the value is
    /// not an array, the array is empty, or its elements have mixed types.
    pub fn homogeneous_type(&self) -> Option<ElementType> {
        let array = self.as_array()?;
        let first = array.first()?.element_type();
        array
            .iter()
            .all(|v| v.element_type() == first)
            .then_some(first)
    }

    /// Converts an array (or an array-shaped document) into a vector of a native type.
    ///
    /// ```
    /// use bson_wire::Bson;
    ///
    /// let values = Bson::from(vec![1, 2, 3]);
    /// let ints: Vec<i32> = values.try_into_vec().unwrap();
    /// assert_eq!(ints, vec![1, 2, 3]);
    /// ```
    pub fn try_into_vec<T>(self) -> Result<Vec<T>>
    where
        T: TryFrom<Bson, Error = Error>,
    {
        let array = match self {
            Bson::Array(array) => array,
            Bson::Document(doc) if doc.is_array_shaped() => doc.into_values().collect(),
            other => {
                return Err(Error::value_access_unexpected_type(
                    other.element_type(),
                    ElementType::Array,
                ));
            }
        };

        array
            .into_iter()
            .enumerate()
            .map(|(index, value)| T::try_from(value).map_err(|e| e.with_index(index)))
            .collect()
    }
}

/// Compares exactly, without rounding `integer` to the nearest double.
fn compare_integer_to_double(integer: i64, double: f64) -> Ordering {
    // 2^63, the first double past i64::MAX
    const I64_END: f64 = 9_223_372_036_854_775_808.0;

    if double.is_nan() {
        return (integer as f64).total_cmp(&double);
    }
    if double >= I64_END {
        return Ordering::Less;
    }
    if double < -I64_END {
        return Ordering::Greater;
    }

    let whole = double.trunc();
    integer.cmp(&(whole as i64)).then_with(|| {
        // same integral part; the fraction decides
        if double > whole {
            Ordering::Less
        } else if double < whole {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    })
}

fn compare_entries<'a>(
    mut a: impl Iterator<Item = (&'a String, &'a Bson)>,
    mut b: impl Iterator<Item = (&'a String, &'a Bson)>,
) -> Ordering {
    loop {
        match (a.next(), b.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some((ka, va)), Some((kb, vb))) => {
                let ord = va
                    .canonical_rank()
                    .cmp(&vb.canonical_rank())
                    .then_with(|| ka.cmp(kb))
                    .then_with(|| va.compare(vb));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn compare_values(a: &[Bson], b: &[Bson]) -> Ordering {
    for (va, vb) in a.iter().zip(b.iter()) {
        let ord = va.compare(vb);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

/// Value helpers
impl Bson {
    /// If `self` is [`Double`](Bson::Double), return its value. Returns `None` otherwise.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Bson::Double(v) => Some(v),
            _ => None,
        }
    }

    /// If `self` is [`String`](Bson::String), return its value as a `&str`. Returns `None`
    /// otherwise.
    pub fn as_str(&self) -> Option<&str> {
        match *self {
            Bson::String(ref s) => Some(s),
            _ => None,
        }
    }

    /// If `self` is [`Array`](Bson::Array), return its value. Returns `None` otherwise.
    pub fn as_array(&self) -> Option<&Array> {
        match *self {
            Bson::Array(ref v) => Some(v),
            _ => None,
        }
    }

    /// If `self` is [`Document`](Bson::Document), return its value. Returns `None` otherwise.
    pub fn as_document(&self) -> Option<&Document> {
        match *self {
            Bson::Document(ref v) => Some(v),
            _ => None,
        }
    }

    /// If `self` is [`Document`](Bson::Document), return a mutable reference to its value.
    /// Returns `None` otherwise.
    pub fn as_document_mut(&mut self) -> Option<&mut Document> {
        match *self {
            Bson::Document(ref mut v) => Some(v),
            _ => None,
        }
    }

    /// If `self` is [`Boolean`](Bson::Boolean), return its value. Returns `None` otherwise.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Bson::Boolean(v) => Some(v),
            _ => None,
        }
    }

    /// If `self` is [`Int32`](Bson::Int32), return its value. Returns `None` otherwise.
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Bson::Int32(v) => Some(v),
            _ => None,
        }
    }

    /// If `self` is [`Int64`](Bson::Int64), return its value. Returns `None` otherwise.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Bson::Int64(v) => Some(v),
            _ => None,
        }
    }

    /// If `self` is [`ObjectId`](Bson::ObjectId), return its value. Returns `None` otherwise.
    pub fn as_object_id(&self) -> Option<ObjectId> {
        match *self {
            Bson::ObjectId(v) => Some(v),
            _ => None,
        }
    }

    /// If `self` is [`DateTime`](Bson::DateTime), return its value. Returns `None` otherwise.
    pub fn as_datetime(&self) -> Option<DateTime> {
        match *self {
            Bson::DateTime(v) => Some(v),
            _ => None,
        }
    }

    /// If `self` is [`Timestamp`](Bson::Timestamp), return its value. Returns `None` otherwise.
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match *self {
            Bson::Timestamp(timestamp) => Some(timestamp),
            _ => None,
        }
    }

    /// If `self` is [`Null`](Bson::Null), return `()`. Returns `None` otherwise.
    pub fn as_null(&self) -> Option<()> {
        match *self {
            Bson::Null => Some(()),
            _ => None,
        }
    }
}

macro_rules! native_conversion {
    ($($t:ty => $pattern:pat => $value:expr, $expected:ident);* $(;)?) => {
        $(
            impl TryFrom<Bson> for $t {
                type Error = Error;

                fn try_from(bson: Bson) -> Result<$t> {
                    match bson {
                        $pattern => Ok($value),
                        other => Err(Error::value_access_unexpected_type(
                            other.element_type(),
                            ElementType::$expected,
                        )),
                    }
                }
            }
        )*
    };
}

native_conversion! {
    f64 => Bson::Double(v) => v, Double;
    String => Bson::String(v) => v, String;
    bool => Bson::Boolean(v) => v, Boolean;
    i32 => Bson::Int32(v) => v, Int32;
    i64 => Bson::Int64(v) => v, Int64;
    ObjectId => Bson::ObjectId(v) => v, ObjectId;
    DateTime => Bson::DateTime(v) => v, DateTime;
    Document => Bson::Document(v) => v, EmbeddedDocument;
    Binary => Bson::Binary(v) => v, Binary;
    Timestamp => Bson::Timestamp(v) => v, Timestamp;
}

/// Represents a BSON timestamp value.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash)]
pub struct Timestamp {
    /// The number of seconds since the Unix epoch.
    pub time: u32,

    /// An incrementing value to order timestamps with the same number of seconds in the `time`
    /// field.
    pub increment: u32,
}

impl Timestamp {
    pub(crate) fn to_le_bytes(self) -> [u8; 8] {
        let mut out = [0; 8];
        out[0..4].copy_from_slice(&self.increment.to_le_bytes());
        out[4..8].copy_from_slice(&self.time.to_le_bytes());
        out
    }

    pub(crate) fn from_le_bytes(bytes: [u8; 8]) -> Self {
        let mut inc_bytes = [0; 4];
        inc_bytes.copy_from_slice(&bytes[0..4]);
        let mut time_bytes = [0; 4];
        time_bytes.copy_from_slice(&bytes[4..8]);
        Self {
            increment: u32::from_le_bytes(inc_bytes),
            time: u32::from_le_bytes(time_bytes),
        }
    }
}

/// Represents a BSON regular expression value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Regex {
    /// The regex pattern to match.
    pub pattern: String,

    /// The options for the regex.
    ///
    /// Options are identified by characters, which must be stored in
    /// alphabetical order. Valid options are 'i' for case insensitive matching, 'm' for
    /// multiline matching, 'x' for verbose mode, 'l' to make \w, \W, etc. locale dependent,
    /// 's' for dotall mode ('.' matches everything), and 'u' to make \w, \W, etc. match
    /// unicode.
    pub options: String,
}

impl Regex {
    /// Creates a regex, sorting the option characters.
    pub fn new(pattern: impl AsRef<str>, options: impl AsRef<str>) -> Self {
        let mut chars: Vec<_> = options.as_ref().chars().collect();
        chars.sort_unstable();
        let options: String = chars.into_iter().collect();
        Self {
            pattern: pattern.as_ref().to_string(),
            options,
        }
    }
}

impl Display for Regex {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "/{}/{}", self.pattern, self.options)
    }
}

/// Represents a BSON code with scope value.
#[derive(Debug, Clone, PartialEq)]
pub struct JavaScriptCodeWithScope {
    pub code: String,
    pub scope: Document,
}

/// Represents a BSON binary value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binary {
    /// The subtype of the bytes.
    pub subtype: BinarySubtype,

    /// The binary bytes.
    pub bytes: Vec<u8>,
}

impl Binary {
    /// Creates a [`Binary`] of the [`BinarySubtype::Generic`] subtype.
    pub fn generic(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            subtype: BinarySubtype::Generic,
            bytes: bytes.into(),
        }
    }
}

impl Display for Binary {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "BinData({:#x}, {})",
            u8::from(self.subtype),
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// Represents a DBPointer. (Deprecated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DbPointer {
    pub namespace: String,
    pub id: ObjectId,
}
