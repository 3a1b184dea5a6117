use assert_matches::assert_matches;
use bson_wire::{
    doc,
    error::{ErrorKind, ValueAccessErrorKind},
    oid::ObjectId,
    spec::{BinarySubtype, ElementType},
    Binary,
    Bson,
    DateTime,
    Document,
    Timestamp,
};
use pretty_assertions::assert_eq;

#[test]
fn ordered_insert() {
    let mut doc = Document::new();
    doc.insert("first".to_owned(), Bson::Int32(1));
    doc.insert("second".to_owned(), Bson::String("foo".to_owned()));
    doc.insert("alphanumeric".to_owned(), Bson::String("bar".to_owned()));

    let expected_keys = vec![
        "first".to_owned(),
        "second".to_owned(),
        "alphanumeric".to_owned(),
    ];

    let keys: Vec<_> = doc.iter().map(|(key, _)| key.to_owned()).collect();
    assert_eq!(expected_keys, keys);
}

#[test]
fn ordered_insert_shorthand() {
    let mut doc = Document::new();
    doc.insert("first", 1i32);
    doc.insert("second", "foo");
    doc.insert("alphanumeric", "bar".to_owned());

    let keys: Vec<_> = doc.keys().cloned().collect();
    assert_eq!(vec!["first", "second", "alphanumeric"], keys);
}

#[test]
fn insert_replaces_in_place() {
    let mut doc = doc! { "a": 1, "b": 2 };
    assert_eq!(doc.insert("a", "one"), Some(Bson::Int32(1)));
    assert_eq!(doc, doc! { "a": "one", "b": 2 });
    assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["a", "b"]);
}

#[test]
fn append_rejects_duplicates() {
    let mut doc = Document::new();
    doc.append("a", 1).unwrap();
    doc.append("b", 2).unwrap();

    let err = doc.append("a", 3).unwrap_err();
    assert!(err.is_duplicate_key());
    assert_matches!(err.kind, ErrorKind::DuplicateKey { ref key, .. } if key == "a");
    assert_eq!(doc.get_i32("a").unwrap(), 1);
}

#[test]
fn test_getters() {
    let datetime = DateTime::from_millis(1_286_705_410_000);
    let binary = vec![0, 1, 2, 3, 4];
    let mut doc = doc! {
        "floating_point": 10.0,
        "string": "a value",
        "array": [10, 20, 30],
        "doc": { "key": 1 },
        "bool": true,
        "i32": 1i32,
        "i64": 1i64,
        "datetime": datetime,
        "binary": Binary::generic(binary.clone()),
    };

    assert_eq!(None, doc.get("nonsense"));
    assert_matches!(
        doc.get_str("nonsense").unwrap_err().kind,
        ErrorKind::ValueAccess { kind: ValueAccessErrorKind::NotPresent, .. }
    );
    let err = doc.get_str("floating_point").unwrap_err();
    assert_eq!(err.key.as_deref(), Some("floating_point"));
    assert_matches!(
        err.kind,
        ErrorKind::ValueAccess {
            kind: ValueAccessErrorKind::UnexpectedType {
                actual: ElementType::Double,
                expected: ElementType::String,
                ..
            },
            ..
        }
    );

    assert_eq!(Some(&Bson::Double(10.0)), doc.get("floating_point"));
    assert_eq!(10.0, doc.get_f64("floating_point").unwrap());

    assert_eq!(Some(&Bson::String("a value".to_string())), doc.get("string"));
    assert_eq!("a value", doc.get_str("string").unwrap());

    let array = vec![Bson::Int32(10), Bson::Int32(20), Bson::Int32(30)];
    assert_eq!(Some(&Bson::Array(array.clone())), doc.get("array"));
    assert_eq!(&array, doc.get_array("array").unwrap());

    let embedded = doc! { "key": 1 };
    assert_eq!(Some(&Bson::Document(embedded.clone())), doc.get("doc"));
    assert_eq!(&embedded, doc.get_document("doc").unwrap());

    assert_eq!(Some(&Bson::Boolean(true)), doc.get("bool"));
    assert!(doc.get_bool("bool").unwrap());

    doc.insert("null".to_string(), Bson::Null);
    assert_eq!(Some(&Bson::Null), doc.get("null"));
    assert!(doc.is_null("null"));
    assert!(!doc.is_null("array"));

    assert_eq!(Some(&Bson::Int32(1)), doc.get("i32"));
    assert_eq!(1i32, doc.get_i32("i32").unwrap());

    assert_eq!(Some(&Bson::Int64(1)), doc.get("i64"));
    assert_eq!(1i64, doc.get_i64("i64").unwrap());

    let timestamp = Timestamp {
        time: 100,
        increment: 1,
    };
    doc.insert("timestamp".to_string(), timestamp);
    assert_eq!(Some(&Bson::Timestamp(timestamp)), doc.get("timestamp"));
    assert_eq!(timestamp, doc.get_timestamp("timestamp").unwrap());

    assert_eq!(Some(&Bson::DateTime(datetime)), doc.get("datetime"));
    assert_eq!(datetime, doc.get_datetime("datetime").unwrap());

    let object_id = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
    doc.insert("_id".to_string(), object_id);
    assert_eq!(Some(&Bson::ObjectId(object_id)), doc.get("_id"));
    assert_eq!(object_id, doc.get_object_id("_id").unwrap());

    let bin = doc.get_binary("binary").unwrap();
    assert_eq!(bin.subtype, BinarySubtype::Generic);
    assert_eq!(bin.bytes, binary);
}

#[test]
fn remove() {
    let mut doc = Document::new();
    doc.insert("first", Bson::Int32(1));
    doc.insert("second", Bson::String("foo".to_owned()));
    doc.insert("alphanumeric", Bson::String("bar".to_owned()));

    assert!(doc.remove("second").is_some());
    assert!(doc.remove("none").is_none());

    let keys: Vec<_> = doc.iter().map(|(key, _)| key.to_owned()).collect();
    assert_eq!(vec!["first", "alphanumeric"], keys);
}

#[test]
fn array_shape() {
    assert!(Document::new().is_array_shaped());
    assert!(doc! { "0": 1, "1": "mixed", "2": null }.is_array_shaped());
    assert!(!doc! { "1": 1, "0": 2 }.is_array_shaped());
    assert!(!doc! { "0": 1, "01": 2 }.is_array_shaped());
    assert!(!doc! { "a": 1 }.is_array_shaped());

    let array = vec![Bson::Int32(1), Bson::String("x".to_string())];
    let doc = Document::from_array(array.clone());
    assert_eq!(doc, doc! { "0": 1, "1": "x" });
    assert_eq!(doc.into_array(), Ok(array));

    let not_an_array = doc! { "k": 1 };
    assert_eq!(not_an_array.clone().into_array(), Err(not_an_array));
}

#[test]
fn arrays_and_array_shaped_documents_encode_alike() {
    let as_array = doc! { "v": [1, 2] }.to_vec().unwrap();
    let as_document = doc! { "v": { "0": 1, "1": 2 } }.to_vec().unwrap();

    // only the element tag differs
    assert_eq!(as_array[4], ElementType::Array as u8);
    assert_eq!(as_document[4], ElementType::EmbeddedDocument as u8);
    assert_eq!(&as_array[5..], &as_document[5..]);
}

#[test]
fn element_type_compare() {
    use std::cmp::Ordering;

    assert_eq!(Bson::MinKey.compare(&Bson::Null), Ordering::Less);
    assert_eq!(Bson::Int32(2).compare(&Bson::Double(1.5)), Ordering::Greater);
    assert_eq!(
        Bson::String("a".into()).compare(&Bson::MaxKey),
        Ordering::Less
    );
}

#[test]
fn large_integers_compare_exactly_with_doubles() {
    use std::cmp::Ordering;

    let two_53 = 9_007_199_254_740_992_i64;
    assert_eq!(
        Bson::Int64(two_53 + 1).compare(&Bson::Double(two_53 as f64)),
        Ordering::Greater
    );
    assert_eq!(
        Bson::Double(two_53 as f64).compare(&Bson::Int64(two_53 + 1)),
        Ordering::Less
    );
    assert_eq!(
        Bson::Int64(two_53).compare(&Bson::Double(two_53 as f64)),
        Ordering::Equal
    );
    assert_eq!(
        Bson::Int64(i64::MAX).compare(&Bson::Double(9_223_372_036_854_775_808.0)),
        Ordering::Less
    );
    assert_eq!(
        Bson::Int64(i64::MIN).compare(&Bson::Double(f64::NEG_INFINITY)),
        Ordering::Greater
    );
    assert_eq!(Bson::Int32(-2).compare(&Bson::Double(-1.5)), Ordering::Less);
    assert_eq!(Bson::Int32(0).compare(&Bson::Double(-0.0)), Ordering::Equal);
}
