/// Construct a BSON value
///
/// ```
/// use bson_wire::{bson, Bson};
///
/// let value = bson!([1, "two", { "three": 3.0 }, null, [true]]);
/// assert_eq!(value.as_array().map(|a| a.len()), Some(5));
/// assert_eq!(bson!(null), Bson::Null);
/// ```
#[macro_export]
macro_rules! bson {
    (null) => {
        $crate::Bson::Null
    };

    ([]) => {
        $crate::Bson::Array(::std::vec::Vec::new())
    };

    ([ $($tt:tt)+ ]) => {{
        let mut array: ::std::vec::Vec<$crate::Bson> = ::std::vec::Vec::new();
        $crate::bson_array_elements!(array; $($tt)+);
        $crate::Bson::Array(array)
    }};

    ({ $($tt:tt)* }) => {
        $crate::Bson::Document($crate::doc! { $($tt)* })
    };

    ($val:expr) => {
        <$crate::Bson as ::std::convert::From<_>>::from($val)
    };
}

/// Construct a BSON Document
///
/// Keys are string literals; values are expressions convertible into [`Bson`](crate::Bson),
/// nested `{ ... }` documents, `[ ... ]` arrays or `null`.
///
/// ```
/// use bson_wire::doc;
///
/// let query = doc! {
///     "name": "x",
///     "age": { "$gt": 21 },
///     "tags": ["a", "b"],
///     "deleted": null,
/// };
/// assert_eq!(query.keys().collect::<Vec<_>>(), vec!["name", "age", "tags", "deleted"]);
/// ```
#[macro_export]
macro_rules! doc {
    () => {{ $crate::Document::new() }};

    ( $($tt:tt)+ ) => {{
        let mut document = $crate::Document::new();
        $crate::doc_entries!(document; $($tt)+);
        document
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! doc_entries {
    ($doc:ident; ) => {};

    ($doc:ident; $key:literal : null $(, $($rest:tt)*)?) => {
        $doc.insert($key, $crate::Bson::Null);
        $crate::doc_entries!($doc; $($($rest)*)?);
    };

    ($doc:ident; $key:literal : { $($inner:tt)* } $(, $($rest:tt)*)?) => {
        $doc.insert($key, $crate::bson!({ $($inner)* }));
        $crate::doc_entries!($doc; $($($rest)*)?);
    };

    ($doc:ident; $key:literal : [ $($inner:tt)* ] $(, $($rest:tt)*)?) => {
        $doc.insert($key, $crate::bson!([ $($inner)* ]));
        $crate::doc_entries!($doc; $($($rest)*)?);
    };

    ($doc:ident; $key:literal : $val:expr $(, $($rest:tt)*)?) => {
        $doc.insert($key, $crate::bson!($val));
        $crate::doc_entries!($doc; $($($rest)*)?);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! bson_array_elements {
    ($array:ident; ) => {};

    ($array:ident; null $(, $($rest:tt)*)?) => {
        $array.push($crate::Bson::Null);
        $crate::bson_array_elements!($array; $($($rest)*)?);
    };

    ($array:ident; { $($inner:tt)* } $(, $($rest:tt)*)?) => {
        $array.push($crate::bson!({ $($inner)* }));
        $crate::bson_array_elements!($array; $($($rest)*)?);
    };

    ($array:ident; [ $($inner:tt)* ] $(, $($rest:tt)*)?) => {
        $array.push($crate::bson!([ $($inner)* ]));
        $crate::bson_array_elements!($array; $($($rest)*)?);
    };

    ($array:ident; $val:expr $(, $($rest:tt)*)?) => {
        $array.push($crate::bson!($val));
        $crate::bson_array_elements!($array; $($($rest)*)?);
    };
}
