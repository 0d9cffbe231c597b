//! Event records and the native `struct input_event` layout

use std::fmt;
use std::mem::size_of;
use std::time::{SystemTime, UNIX_EPOCH};

/// Width of the kernel's `long`, used for both timestamp fields.
const LONG: usize = size_of::<libc::c_long>();

/// Size of one native event record as read from an event device.
pub const RAW_EVENT_SIZE: usize = 2 * LONG + 8;

/// Event time as seconds plus microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Timestamp {
    pub sec: i64,
    pub usec: i64,
}

impl Timestamp {
    pub fn new(sec: i64, usec: i64) -> Self {
        Self { sec, usec }
    }

    /// Wall-clock time, for frames synthesized from devices that carry none.
    pub fn now() -> Self {
        let since = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self {
            sec: since.as_secs() as i64,
            usec: i64::from(since.subsec_micros()),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.sec, self.usec)
    }
}

/// One input event: class (`type`), code within the class, and value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRecord {
    pub time: Timestamp,
    pub class: u16,
    pub code: u16,
    pub value: i32,
}

impl EventRecord {
    pub fn new(time: Timestamp, class: u16, code: u16, value: i32) -> Self {
        Self {
            time,
            class,
            code,
            value,
        }
    }

    /// Decode a native record. Returns `None` unless `buf` is exactly
    /// [`RAW_EVENT_SIZE`] bytes.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() != RAW_EVENT_SIZE {
            return None;
        }
        let (sec, rest) = buf.split_at(LONG);
        let (usec, rest) = rest.split_at(LONG);
        Some(Self {
            time: Timestamp::new(read_long(sec), read_long(usec)),
            class: u16::from_ne_bytes([rest[0], rest[1]]),
            code: u16::from_ne_bytes([rest[2], rest[3]]),
            value: i32::from_ne_bytes([rest[4], rest[5], rest[6], rest[7]]),
        })
    }

    /// Native byte layout of this record.
    pub fn encode(&self) -> [u8; RAW_EVENT_SIZE] {
        let mut out = [0u8; RAW_EVENT_SIZE];
        out[..LONG].copy_from_slice(&(self.time.sec as libc::c_long).to_ne_bytes());
        out[LONG..2 * LONG].copy_from_slice(&(self.time.usec as libc::c_long).to_ne_bytes());
        let tail = &mut out[2 * LONG..];
        tail[0..2].copy_from_slice(&self.class.to_ne_bytes());
        tail[2..4].copy_from_slice(&self.code.to_ne_bytes());
        tail[4..8].copy_from_slice(&self.value.to_ne_bytes());
        out
    }
}

fn read_long(bytes: &[u8]) -> i64 {
    let mut raw = [0u8; LONG];
    raw.copy_from_slice(bytes);
    libc::c_long::from_ne_bytes(raw) as i64
}
