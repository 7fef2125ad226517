//! Payload parsing vectors.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use mqttgauge_core::error::ErrorCode;
use mqttgauge_core::message::{parse_update, split_payload, Update};

struct Vector {
    payload: &'static [u8],
    expect: Result<(&'static str, f64), ErrorCode>,
}

const VECTORS: &[Vector] = &[
    Vector { payload: b"temp:21.5", expect: Ok(("temp", 21.5)) },
    Vector { payload: b"  humidity:40\n", expect: Ok(("humidity", 40.0)) },
    Vector { payload: b"room_temp:-3", expect: Ok(("roomtemp", -3.0)) },
    Vector { payload: b"cpu.load-avg:0.75", expect: Ok(("cpuloadavg", 0.75)) },
    Vector { payload: b"temp", expect: Err(ErrorCode::Malformed) },
    Vector { payload: b"temp:1:2", expect: Err(ErrorCode::Malformed) },
    Vector { payload: b"", expect: Err(ErrorCode::Malformed) },
    Vector { payload: b"\xff\xfe:1", expect: Err(ErrorCode::Malformed) },
    Vector { payload: b"temp:warm", expect: Err(ErrorCode::InvalidValue) },
    Vector { payload: b"temp:", expect: Err(ErrorCode::InvalidValue) },
    Vector { payload: b"temp:NaN", expect: Err(ErrorCode::InvalidValue) },
];

#[test]
fn payload_vectors() {
    for v in VECTORS {
        let got = parse_update(v.payload);
        match (&v.expect, got) {
            (Ok((name, value)), Ok(update)) => {
                assert_eq!(update, Update { name: name.to_string(), value: *value });
            }
            (Err(code), Err(err)) => assert_eq!(err.code(), *code, "{:?}", v.payload),
            (expect, got) => panic!("payload {:?}: expected {expect:?}, got {got:?}", v.payload),
        }
    }
}

#[test]
fn empty_name_survives_splitting() {
    let raw = split_payload(b":5").unwrap();
    assert_eq!(raw.name, "");
    assert_eq!(raw.value, "5");
}

#[test]
fn names_differing_only_in_punctuation_collide() {
    let a = parse_update(b"room_temp:1").unwrap();
    let b = parse_update(b"room.temp:2").unwrap();
    assert_eq!(a.name, b.name);
}
