use std::{cmp::Ordering, collections::HashSet};

use assert_matches::assert_matches;
use bson_wire::{
    error::{ErrorKind, ObjectIdErrorKind},
    oid::ObjectId,
    Bson,
    ObjectIdGenerator,
};
use pretty_assertions::assert_eq;

#[test]
fn deserialize() {
    let bytes: [u8; 12] = [
        0xDEu8, 0xADu8, 0xBEu8, 0xEFu8, // timestamp is 3735928559
        0xEFu8, 0xCDu8, 0xABu8, // machine id
        0xFAu8, 0x29u8, // process id
        0x11u8, 0x22u8, 0x33u8, // increment is 1122867
    ];

    let oid = ObjectId::from_bytes(bytes);
    assert_eq!(3_735_928_559i64 * 1000, oid.timestamp().timestamp_millis());
    assert_eq!([0xEF, 0xCD, 0xAB], oid.machine_id());
    assert_eq!(0x29FA, oid.process_id());
    assert_eq!(1_122_867u32, oid.counter());
}

#[test]
fn timestamp() {
    let time: u32 = 2_000_000;
    let oid = ObjectId::from_timestamp(time);
    assert_eq!(i64::from(time) * 1000, oid.timestamp().timestamp_millis());
}

#[test]
fn timestamp_is_big_endian() {
    let time: u32 = 3_857_379;
    let oid = ObjectId::from_timestamp(time);
    assert_eq!(0x00u8, oid.bytes()[0]);
    assert_eq!(0x3Au8, oid.bytes()[1]);
    assert_eq!(0xDBu8, oid.bytes()[2]);
    assert_eq!(0xE3u8, oid.bytes()[3]);
}

#[test]
fn string_oid() {
    let s = "123456789012123456789012";
    let oid = ObjectId::parse_str(s).unwrap();
    assert_eq!(s.to_owned(), hex::encode(oid.bytes()));
}

#[test]
fn byte_string_oid() {
    let s = "541b1a00e8a23afa832b218e";
    let oid = ObjectId::parse_str(s).unwrap();
    let bytes: [u8; 12] = [
        0x54u8, 0x1Bu8, 0x1Au8, 0x00u8, 0xE8u8, 0xA2u8, 0x3Au8, 0xFAu8, 0x83u8, 0x2Bu8, 0x21u8,
        0x8Eu8,
    ];

    assert_eq!(bytes, oid.bytes());
    assert_eq!(s, oid.to_string());
    assert_eq!(oid, s.parse().unwrap());
}

#[test]
fn bad_strings() {
    assert_matches!(
        ObjectId::parse_str("541b1a00e8a23afa832b218").unwrap_err().kind,
        ErrorKind::ObjectId {
            kind: ObjectIdErrorKind::InvalidLength { length: 23 },
            ..
        }
    );
    assert_matches!(
        ObjectId::parse_str("541b1a00e8a23afa832b218e00").unwrap_err().kind,
        ErrorKind::ObjectId {
            kind: ObjectIdErrorKind::InvalidLength { length: 26 },
            ..
        }
    );
    assert_matches!(
        ObjectId::parse_str("541b1a00e8a23afa832b2z8e").unwrap_err().kind,
        ErrorKind::ObjectId {
            kind: ObjectIdErrorKind::InvalidCharacter { c: 'z', index: 21 },
            ..
        }
    );
    assert!(ObjectId::parse_str("").is_err());
}

#[test]
fn oid_not_equals() {
    let generator = ObjectIdGenerator::new();
    assert!(generator.generate() != generator.generate());
}

// check that the counter in generated ids is increasing
#[test]
fn counter_increasing() {
    let generator = ObjectIdGenerator::with_parts([1, 2, 3], 7, 10);
    let first = generator.generate_at(100);
    let second = generator.generate_at(100);
    assert_eq!(first.counter(), 10);
    assert_eq!(second.counter(), 11);
    assert_eq!(first.machine_id(), [1, 2, 3]);
    assert_eq!(first.process_id(), 7);
}

#[test]
fn counter_wraps_at_24_bits() {
    let generator = ObjectIdGenerator::with_parts([0; 3], 0, 0x00FF_FFFF);
    assert_eq!(generator.generate_at(0).counter(), 0x00FF_FFFF);
    assert_eq!(generator.generate_at(0).counter(), 0);
}

#[test]
fn machine_id_follows_the_host() {
    let a = ObjectIdGenerator::for_host("db-1.internal");
    let b = ObjectIdGenerator::for_host("db-1.internal");
    assert_eq!(a.machine_id(), b.machine_id());
}

#[test]
fn generated_ids_are_unique_across_threads() {
    let generator = ObjectIdGenerator::new();
    let ids: Vec<ObjectId> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| (0..1000).map(|_| generator.generate()).collect::<Vec<_>>()))
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect()
    });

    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len());
}

#[test]
fn ordering() {
    let a = ObjectId::parse_str("000000000000000000000001").unwrap();
    let b = ObjectId::parse_str("000000000000000000000002").unwrap();
    assert!(a < b);
    assert_eq!(Bson::ObjectId(a).compare(&Bson::ObjectId(b)), Ordering::Less);
    assert_eq!(Bson::MinKey.compare(&Bson::ObjectId(a)), Ordering::Less);
    assert_eq!(Bson::MaxKey.compare(&Bson::ObjectId(b)), Ordering::Greater);
}
