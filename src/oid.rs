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

//! ObjectId

use std::{
    fmt,
    str::FromStr,
    sync::atomic::{AtomicU32, Ordering},
};

use ahash::RandomState;

use crate::{
    error::{Error, Result},
    DateTime,
};

const TIMESTAMP_SIZE: usize = 4;
const MACHINE_ID_SIZE: usize = 3;
const PROCESS_ID_SIZE: usize = 2;

const TIMESTAMP_OFFSET: usize = 0;
const MACHINE_ID_OFFSET: usize = TIMESTAMP_OFFSET + TIMESTAMP_SIZE;
const PROCESS_ID_OFFSET: usize = MACHINE_ID_OFFSET + MACHINE_ID_SIZE;
const COUNTER_OFFSET: usize = PROCESS_ID_OFFSET + PROCESS_ID_SIZE;

const MAX_U24: u32 = 0xFF_FFFF;

// Fixed seeds keep the host hash stable for the lifetime of a machine.
const HOST_HASH_SEEDS: [u64; 4] = [
    0x243F_6A88_85A3_08D3,
    0x1319_8A2E_0370_7344,
    0xA409_3822_299F_31D0,
    0x082E_FA98_EC4E_6C89,
];

/// A wrapper around a raw 12-byte ObjectId.
///
/// Ordering is byte-lexicographic, which makes ids generated later by the same process sort after
/// earlier ones.
#[derive(Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct ObjectId {
    id: [u8; 12],
}

impl Default for ObjectId {
    fn default() -> Self {
        Self { id: [0; 12] }
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_str(s)
    }
}

impl From<[u8; 12]> for ObjectId {
    fn from(bytes: [u8; 12]) -> Self {
        Self { id: bytes }
    }
}

impl ObjectId {
    /// Constructs a new ObjectId wrapper around the raw byte representation.
    pub const fn from_bytes(bytes: [u8; 12]) -> ObjectId {
        ObjectId { id: bytes }
    }

    /// Parses the 24-character hex form, in either case.
    pub fn parse_str(s: impl AsRef<str>) -> Result<ObjectId> {
        let s = s.as_ref();
        let mut id = [0; 12];
        hex::decode_to_slice(s, &mut id).map_err(|e| Error::invalid_object_id(s, e))?;
        Ok(ObjectId { id })
    }

    /// Creates a dummy ObjectId with a specific generation time and all other bytes zeroed.
    /// Only useful for range queries on a field containing ObjectIds.
    pub fn from_timestamp(seconds_since_epoch: u32) -> ObjectId {
        let mut buf = [0; 12];
        buf[TIMESTAMP_OFFSET..MACHINE_ID_OFFSET].copy_from_slice(&seconds_since_epoch.to_be_bytes());
        ObjectId::from_bytes(buf)
    }

    /// Returns the raw byte representation of an ObjectId.
    pub const fn bytes(&self) -> [u8; 12] {
        self.id
    }

    /// Retrieves the creation time encoded in the leading four (big-endian) bytes.
    pub fn timestamp(&self) -> DateTime {
        let mut buf = [0; 4];
        buf.copy_from_slice(&self.id[TIMESTAMP_OFFSET..MACHINE_ID_OFFSET]);
        let seconds_since_epoch = u32::from_be_bytes(buf);

        DateTime::from_millis(i64::from(seconds_since_epoch) * 1000)
    }

    /// Retrieves the 3-byte host hash.
    pub fn machine_id(&self) -> [u8; 3] {
        let mut buf = [0; MACHINE_ID_SIZE];
        buf.copy_from_slice(&self.id[MACHINE_ID_OFFSET..PROCESS_ID_OFFSET]);
        buf
    }

    /// Retrieves the process id stored in the id.
    pub fn process_id(&self) -> u16 {
        u16::from_le_bytes([self.id[PROCESS_ID_OFFSET], self.id[PROCESS_ID_OFFSET + 1]])
    }

    /// Retrieves the increment counter.
    pub fn counter(&self) -> u32 {
        let mut buf = [0; 4];
        buf[1..].copy_from_slice(&self.id[COUNTER_OFFSET..]);
        u32::from_be_bytes(buf)
    }

    /// Convert this [`ObjectId`] to its hex string representation.
    pub fn to_hex(self) -> String {
        hex::encode(self.id)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("ObjectId").field(&self.to_hex()).finish()
    }
}

/// Generates new [`ObjectId`]s.
///
/// The host hash and process id are captured once at construction, and the 24-bit counter starts
/// at a random value. Construct one generator at startup and share it by reference; the counter is
/// atomic, so concurrent callers still receive distinct ids.
#[derive(Debug)]
pub struct ObjectIdGenerator {
    machine_id: [u8; MACHINE_ID_SIZE],
    process_id: [u8; PROCESS_ID_SIZE],
    counter: AtomicU32,
}

impl ObjectIdGenerator {
    /// Creates a generator for the current host and process.
    pub fn new() -> Self {
        Self::for_host(&local_hostname())
    }

    /// Creates a generator whose machine id is derived from `hostname`.
    pub fn for_host(hostname: &str) -> Self {
        let start = rand::random::<u32>() & MAX_U24;
        Self::with_parts(host_hash(hostname), std::process::id() as u16, start)
    }

    /// Creates a generator from explicit parts. The counter is truncated to 24 bits.
    pub fn with_parts(machine_id: [u8; 3], process_id: u16, counter_start: u32) -> Self {
        Self {
            machine_id,
            process_id: process_id.to_le_bytes(),
            counter: AtomicU32::new(counter_start & MAX_U24),
        }
    }

    /// The machine id stamped into every generated id.
    pub fn machine_id(&self) -> [u8; 3] {
        self.machine_id
    }

    /// Generates an id for the current time.
    pub fn generate(&self) -> ObjectId {
        let seconds = DateTime::now().timestamp_millis().div_euclid(1000);
        self.generate_at(seconds as u32)
    }

    /// Generates an id with an explicit creation time.
    pub fn generate_at(&self, seconds_since_epoch: u32) -> ObjectId {
        let mut buf = [0; 12];
        buf[TIMESTAMP_OFFSET..MACHINE_ID_OFFSET].copy_from_slice(&seconds_since_epoch.to_be_bytes());
        buf[MACHINE_ID_OFFSET..PROCESS_ID_OFFSET].copy_from_slice(&self.machine_id);
        buf[PROCESS_ID_OFFSET..COUNTER_OFFSET].copy_from_slice(&self.process_id);
        buf[COUNTER_OFFSET..].copy_from_slice(&self.next_count());
        ObjectId::from_bytes(buf)
    }

    // Big-endian 3-byte count, wrapping at 2^24.
    fn next_count(&self) -> [u8; 3] {
        let count = self.counter.fetch_add(1, Ordering::SeqCst) & MAX_U24;
        let bytes = count.to_be_bytes();
        [bytes[1], bytes[2], bytes[3]]
    }
}

impl Default for ObjectIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn host_hash(hostname: &str) -> [u8; 3] {
    let [k0, k1, k2, k3] = HOST_HASH_SEEDS;
    let hash = RandomState::with_seeds(k0, k1, k2, k3).hash_one(hostname);
    let bytes = hash.to_be_bytes();
    [bytes[0], bytes[1], bytes[2]]
}

fn local_hostname() -> String {
    ["HOSTNAME", "COMPUTERNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|name| !name.is_empty()))
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|name| name.trim().to_owned())
                .filter(|name| !name.is_empty())
        })
        .unwrap_or_else(|| "localhost".to_owned())
}
