//! `hash64`: a stable content hash over [`V`], backing attribute-index
//! bucketing and `DISTINCT`/grouping keys. Built on `xxh3`, matching the
//! xxhash-based `SIValue_HashUpdate` the original streams values through.
//!
//! Two values that compare equal under [`super::ops::compare`] must hash
//! equal — in particular `Int64(3)` and `Double(3.0)` hash identically,
//! which is why numeric hashing always goes through the `f64` path.

use super::V;
use chrono::Timelike;
use xxhash_rust::xxh3::Xxh3;

const SEED: u64 = 0x5EED_1234_CAFE_BABE;

pub fn hash64(v: &V) -> u64 {
    let mut state = Xxh3::with_seed(SEED);
    update(&mut state, v);
    state.digest()
}

fn update(state: &mut Xxh3, v: &V) {
    use std::hash::Hasher;
    match v {
        V::Null => state.write_u8(0),
        V::Bool(b) => {
            state.write_u8(1);
            state.write_u8(*b as u8);
        }
        V::Int64(i) => {
            state.write_u8(2);
            state.write_i64((*i).into());
            let _ = i;
        }
        V::Double(d) => {
            state.write_u8(2);
            // Hash through the same numeric domain as Int64 so 3 == 3.0 hashes equal.
            state.write_i64(*d as i64);
            if d.fract() != 0.0 {
                state.write(&d.to_bits().to_le_bytes());
            }
        }
        V::String(s) => {
            state.write_u8(3);
            state.write(s.as_bytes());
        }
        V::Array(items) => {
            state.write_u8(4);
            state.write_usize(items.len());
            for item in items.iter() {
                update(state, item);
            }
        }
        V::Map(entries) => {
            state.write_u8(5);
            for (k, val) in entries.iter() {
                state.write(k.as_bytes());
                update(state, val);
            }
        }
        V::Node(n) => {
            state.write_u8(6);
            state.write_u64(n.id.get());
        }
        V::Edge(e) => {
            state.write_u8(7);
            state.write_u64(e.id.get());
        }
        V::Path(p) => {
            state.write_u8(8);
            for n in &p.nodes {
                state.write_u64(n.get());
            }
            for e in &p.edges {
                state.write_u64(e.get());
            }
        }
        V::Point(p) => {
            state.write_u8(9);
            state.write(&p.lat.to_bits().to_le_bytes());
            state.write(&p.lon.to_bits().to_le_bytes());
        }
        V::Datetime(dt) => {
            state.write_u8(10);
            state.write_i64(dt.timestamp_nanos_opt().unwrap_or(dt.timestamp()));
        }
        V::LocalDateTime(dt) => {
            state.write_u8(11);
            state.write_i64(dt.and_utc().timestamp());
        }
        V::Date(d) => {
            state.write_u8(12);
            state.write_i64(d.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp());
        }
        V::Time(t) | V::LocalTime(t) => {
            state.write_u8(13);
            state.write_u32(t.num_seconds_from_midnight());
        }
        V::Duration(d) => {
            state.write_u8(14);
            state.write_i64(d.num_nanoseconds().unwrap_or(d.num_milliseconds() * 1_000_000));
        }
    }
}
