//! FFI smoke tests.
//!
//! These tests call the exported `extern "C"` functions directly (as an external consumer would),
//! to validate:
//! - ABI surface compiles and links
//! - allocation/free symmetry for returned buffers
//! - snapshot/restore round-trip works

use std::ptr;

use gesture_stabilizer_ffi::*;

fn s(s: &str) -> GstStr {
    GstStr {
        ptr: s.as_ptr(),
        len: s.len(),
    }
}

fn null_str() -> GstStr {
    GstStr { ptr: ptr::null(), len: 0 }
}

fn cfg() -> GstCfg {
    let mut c = gst_cfg_default();
    c.confirm_majority = 2;
    c
}

fn blank_tick() -> GstTick {
    GstTick {
        state: GstState::Loading,
        confidence: 0.0,
        label_index: -1,
        history_appended: 0,
        observed_index: -1,
        observed_confidence: 0.0,
    }
}

fn new_ab(no_gesture: GstStr) -> *mut GstStabilizer {
    let labels = [s("A"), s("B")];
    unsafe { gst_stabilizer_new(cfg(), labels.as_ptr(), labels.len(), no_gesture) }
}

#[test]
fn ffi_version_and_default_cfg() {
    assert_eq!(gst_ffi_version(), GST_FFI_VERSION);

    let c = gst_cfg_default();
    assert_eq!(c.window_capacity, 15);
    assert_eq!(c.confirm_majority, 10);
    assert!(c.confidence_threshold.is_finite());
    assert_eq!(c.retain_stable_label_on_reset, 0);
}

#[test]
fn ffi_rejects_bad_construction() {
    let labels = [s("A"), s("B")];
    let mut bad = cfg();
    bad.confirm_majority = 99;
    let h = unsafe { gst_stabilizer_new(bad, labels.as_ptr(), labels.len(), null_str()) };
    assert!(h.is_null());

    let h = unsafe { gst_stabilizer_new(cfg(), ptr::null(), 0, null_str()) };
    assert!(h.is_null());

    let h = unsafe { gst_stabilizer_new_from_metadata(cfg(), s(r#"{"labels": []}"#), null_str()) };
    assert!(h.is_null());
}

#[test]
fn ffi_ingest_detects_and_flags_history() {
    let h = new_ab(null_str());
    assert!(!h.is_null());

    let dists = [[0.9_f32, 0.1], [0.85, 0.15], [0.9, 0.1]];
    let mut ticks = Vec::new();
    for d in &dists {
        let mut out = blank_tick();
        let rc = unsafe { gst_stabilizer_ingest(h, d.as_ptr(), d.len(), &mut out) };
        assert_eq!(rc, GST_OK);
        ticks.push(out);
    }

    assert_eq!(ticks[0].state, GstState::InsufficientSignal);
    assert_eq!(ticks[0].observed_index, 0);
    assert_eq!(ticks[1].state, GstState::Detected);
    assert_eq!(ticks[1].label_index, 0);
    assert_eq!(ticks[1].confidence, 87.5);
    assert_eq!(ticks[1].history_appended, 1);
    assert_eq!(ticks[2].history_appended, 0);

    let label = unsafe { gst_stabilizer_label(h, ticks[1].label_index as usize) };
    let bytes = unsafe { std::slice::from_raw_parts(label.ptr, label.len) };
    assert_eq!(bytes, b"A");
    assert_eq!(unsafe { gst_stabilizer_label_count(h) }, 2);
    assert!(unsafe { gst_stabilizer_label(h, 7) }.ptr.is_null());

    unsafe { gst_stabilizer_free(h) };
}

#[test]
fn ffi_contract_violations_return_codes() {
    let h = new_ab(null_str());
    let mut out = blank_tick();

    let three = [0.2_f32, 0.3, 0.5];
    let rc = unsafe { gst_stabilizer_ingest(h, three.as_ptr(), three.len(), &mut out) };
    assert_eq!(rc, GST_ERR_LENGTH_MISMATCH);

    let nan = [f32::NAN, 0.3];
    let rc = unsafe { gst_stabilizer_ingest(h, nan.as_ptr(), nan.len(), &mut out) };
    assert_eq!(rc, GST_ERR_NON_FINITE);

    let rc = unsafe { gst_stabilizer_ingest(h, ptr::null(), 0, &mut out) };
    assert_eq!(rc, GST_ERR_EMPTY_DISTRIBUTION);

    let rc = unsafe { gst_stabilizer_ingest(h, three.as_ptr(), 2, ptr::null_mut()) };
    assert_eq!(rc, GST_ERR_NULL);

    assert_eq!(out.state, GstState::Loading);
    unsafe { gst_stabilizer_free(h) };
}

#[test]
fn ffi_no_gesture_from_metadata() {
    let h = unsafe {
        gst_stabilizer_new_from_metadata(cfg(), s(r#"{"labels": ["0", "No_Gesture"]}"#), s("NO_GESTURE"))
    };
    assert!(!h.is_null());

    let d = [0.05_f32, 0.95];
    let mut out = blank_tick();
    for _ in 0..2 {
        assert_eq!(unsafe { gst_stabilizer_ingest(h, d.as_ptr(), d.len(), &mut out) }, GST_OK);
    }
    assert_eq!(out.state, GstState::NoGesture);
    assert_eq!(out.label_index, -1);
    assert_eq!(out.observed_index, 1);
    assert_eq!(out.history_appended, 0);

    unsafe { gst_stabilizer_free(h) };
}

#[test]
fn ffi_snapshot_restore_roundtrip() {
    let h = new_ab(null_str());
    let d = [0.9_f32, 0.1];
    let mut out = blank_tick();
    for _ in 0..2 {
        unsafe { gst_stabilizer_ingest(h, d.as_ptr(), d.len(), &mut out) };
    }

    let snap = unsafe { gst_snapshot(h) };
    assert!(!snap.ptr.is_null());
    assert!(snap.len >= 13); // magic + version + count + stable flag

    // Fresh handle: restoring the confirmed label suppresses a duplicate history entry.
    let h2 = new_ab(null_str());
    let rc = unsafe { gst_restore(h2, snap.ptr as *const u8, snap.len) };
    assert_eq!(rc, 2);

    unsafe { gst_stabilizer_ingest(h2, d.as_ptr(), d.len(), &mut out) };
    assert_eq!(out.state, GstState::Detected);
    assert_eq!(out.history_appended, 0);

    // Corrupt magic and truncated buffers are rejected.
    let bytes = unsafe { std::slice::from_raw_parts(snap.ptr, snap.len) }.to_vec();
    let mut bad = bytes.clone();
    bad[0] ^= 0xff;
    assert_eq!(unsafe { gst_restore(h2, bad.as_ptr(), bad.len()) }, GST_ERR_BAD_MAGIC);
    assert_eq!(unsafe { gst_restore(h2, bytes.as_ptr(), bytes.len() - 1) }, GST_ERR_TRUNCATED);

    unsafe { gst_bytes_free(snap) };
    unsafe { gst_stabilizer_reset(h2) };
    unsafe { gst_stabilizer_free(h2) };
    unsafe { gst_stabilizer_free(h) };
}

fn snapshot_bytes(window: &[(&str, f32)], stable: Option<&str>) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(b"GST1");
    buf.extend_from_slice(&1u32.to_le_bytes());
    buf.extend_from_slice(&(window.len() as u32).to_le_bytes());
    for (label, conf) in window {
        buf.extend_from_slice(&(label.len() as u32).to_le_bytes());
        buf.extend_from_slice(label.as_bytes());
        buf.extend_from_slice(&conf.to_le_bytes());
    }
    match stable {
        Some(label) => {
            buf.push(1);
            buf.extend_from_slice(&(label.len() as u32).to_le_bytes());
            buf.extend_from_slice(label.as_bytes());
        }
        None => buf.push(0),
    }
    buf
}

#[test]
fn ffi_restore_rejects_invalid_observations() {
    let h = new_ab(null_str());

    for bytes in [
        snapshot_bytes(&[("A", 500.0)], None),
        snapshot_bytes(&[("A", f32::NAN)], None),
        snapshot_bytes(&[("ZZZ", 90.0)], None),
        snapshot_bytes(&[], Some("ZZZ")),
    ] {
        let rc = unsafe { gst_restore(h, bytes.as_ptr(), bytes.len()) };
        assert_eq!(rc, GST_ERR_INVALID_SNAPSHOT);
    }

    // Rejected snapshots leave the handle empty: one sample is not enough to confirm.
    let d = [0.9_f32, 0.1];
    let mut out = blank_tick();
    assert_eq!(unsafe { gst_stabilizer_ingest(h, d.as_ptr(), d.len(), &mut out) }, GST_OK);
    assert_eq!(out.state, GstState::InsufficientSignal);

    let ok = snapshot_bytes(&[("A", 90.0)], Some("A"));
    assert_eq!(unsafe { gst_restore(h, ok.as_ptr(), ok.len()) }, 1);

    unsafe { gst_stabilizer_free(h) };
}
