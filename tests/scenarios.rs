//! End-to-end scenario tests covering the six named request sequences.

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};

use chrono::Utc;
use ledgerbook::prelude::*;
use ledgerbook::wal::FileWal;
use tempfile::TempDir;
use uuid::Uuid;

fn fresh_engine(dir: &TempDir) -> Engine<FileWal> {
    let wal = FileWal::open(dir.path()).unwrap();
    Engine::from_recovered(wal, Book::new(), 0, 0, EngineConfig::default())
}

fn insert(id: OrderId, side: Side, price: i64, qty: i64) -> IngressRequest {
    IngressRequest {
        request_id: RequestId(Uuid::new_v4()),
        ts: Utc::now(),
        op: RequestOp::Insert {
            id: Some(id),
            side,
            price_paise: price,
            qty,
        },
    }
}

fn assert_ok(ack: &EngineAck) {
    match ack {
        EngineAck::Ok { .. } => {}
        EngineAck::Rejected { reason, .. } => panic!("unexpected rejection: {reason}"),
    }
}

#[test]
fn scenario_1_no_cross() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = fresh_engine(&dir);

    let b1 = OrderId::new();
    assert_ok(&engine.process(insert(b1, Side::Buy, 10_000, 10)).unwrap());
    let s1 = OrderId::new();
    assert_ok(&engine.process(insert(s1, Side::Sell, 10_100, 5)).unwrap());

    assert!(engine.book().is_live(b1));
    assert!(engine.book().is_live(s1));
    assert_eq!(engine.book().best_price(Side::Buy), Some(10_000));
    assert_eq!(engine.book().best_price(Side::Sell), Some(10_100));
}

#[test]
fn scenario_2_exact_cross_full_fill() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = fresh_engine(&dir);

    let b1 = OrderId::new();
    engine.process(insert(b1, Side::Buy, 10_000, 10)).unwrap();
    let s1 = OrderId::new();
    engine.process(insert(s1, Side::Sell, 10_100, 5)).unwrap();

    let b2 = OrderId::new();
    assert_ok(&engine.process(insert(b2, Side::Buy, 10_100, 5)).unwrap());

    assert!(!engine.book().is_live(s1));
    assert!(!engine.book().is_live(b2));
    assert!(engine.book().is_live(b1));
    assert_eq!(engine.book().get(b1).unwrap().price, 10_000);
}

#[test]
fn scenario_3_partial_fill_aggressor_rests() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = fresh_engine(&dir);

    let s1 = OrderId::new();
    engine.process(insert(s1, Side::Sell, 10_000, 3)).unwrap();

    let b1 = OrderId::new();
    assert_ok(&engine.process(insert(b1, Side::Buy, 10_000, 10)).unwrap());

    assert!(!engine.book().is_live(s1));
    let resting = engine.book().get(b1).unwrap();
    assert_eq!(resting.status, OrderStatus::PartiallyFilled);
    assert_eq!(resting.remaining(), 7);
}

#[test]
fn scenario_4_price_time_priority() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = fresh_engine(&dir);

    let s1 = OrderId::new();
    engine.process(insert(s1, Side::Sell, 10_000, 4)).unwrap();
    let s2 = OrderId::new();
    engine.process(insert(s2, Side::Sell, 10_000, 4)).unwrap();

    let b1 = OrderId::new();
    assert_ok(&engine.process(insert(b1, Side::Buy, 10_000, 6)).unwrap());

    assert!(!engine.book().is_live(s1));
    assert!(!engine.book().is_live(b1));
    let s2_rest = engine.book().get(s2).unwrap();
    assert_eq!(s2_rest.status, OrderStatus::PartiallyFilled);
    assert_eq!(s2_rest.remaining(), 2);
}

#[test]
fn scenario_5_modify_forfeits_priority() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = fresh_engine(&dir);

    let s1 = OrderId::new();
    engine.process(insert(s1, Side::Sell, 10_000, 5)).unwrap();
    let s2 = OrderId::new();
    engine.process(insert(s2, Side::Sell, 10_000, 5)).unwrap();

    let modify = IngressRequest {
        request_id: RequestId(Uuid::new_v4()),
        ts: Utc::now(),
        op: RequestOp::Modify {
            id: s1,
            price_paise: 10_000,
        },
    };
    assert_ok(&engine.process(modify).unwrap());

    let b1 = OrderId::new();
    assert_ok(&engine.process(insert(b1, Side::Buy, 10_000, 5)).unwrap());

    // s2 now has the older arrival_seq and must be matched first.
    assert!(!engine.book().is_live(s2));
    assert!(engine.book().is_live(s1));
    assert_eq!(engine.book().get(s1).unwrap().remaining(), 5);
}

#[test]
fn scenario_6_crash_recovery() {
    let dir = tempfile::tempdir().unwrap();
    let wal_path = dir.path().join("wal.log");
    let b1_id = OrderId::new();
    let s1_id = OrderId::new();
    let s1_request_id = RequestId(Uuid::new_v4());

    {
        let mut engine = fresh_engine(&dir);
        assert_ok(&engine.process(insert(b1_id, Side::Buy, 9_900, 10)).unwrap());
    }

    let frame1_len = read_u32(&wal_path, 0);
    let frame1_total = 8 + frame1_len as u64;

    // Simulate a crash mid-flush of s1's records: write a frame header
    // whose payload never lands (the CRC stays zeroed, which cannot match
    // any payload), mirroring a torn write into the mmap'd tail.
    {
        let mut file = OpenOptions::new().write(true).open(&wal_path).unwrap();
        file.seek(SeekFrom::Start(frame1_total)).unwrap();
        file.write_all(&[0xFFu8; 40]).unwrap(); // bogus non-zero length + payload, zero CRC
    }

    {
        let wal = FileWal::open(dir.path()).unwrap();
        assert_eq!(wal.last_lsn(), 1, "torn tail must be truncated back to b1");
        let recovered = ledgerbook::recover(&wal).unwrap();
        assert!(recovered.book.is_live(b1_id));
        assert!(!recovered.book.is_live(s1_id));

        let mut engine =
            Engine::from_recovered(wal, recovered.book, recovered.lsn, recovered.arrival_seq, EngineConfig::default());

        let s1_req = IngressRequest {
            request_id: s1_request_id,
            ts: Utc::now(),
            op: RequestOp::Insert {
                id: Some(s1_id),
                side: Side::Sell,
                price_paise: 10_000,
                qty: 5,
            },
        };
        let first = engine.process(s1_req.clone()).unwrap();
        assert_ok(&first);
        let redelivered = engine.process(s1_req).unwrap();
        assert_ok(&redelivered);
        assert!(engine.book().is_live(s1_id));
        assert!(engine.book().is_live(b1_id));
    }
}

fn read_u32(path: &std::path::Path, offset: u64) -> u32 {
    let mut file = OpenOptions::new().read(true).open(path).unwrap();
    file.seek(SeekFrom::Start(offset)).unwrap();
    let mut buf = [0u8; 4];
    file.read_exact(&mut buf).unwrap();
    u32::from_le_bytes(buf)
}
