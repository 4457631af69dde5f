#![allow(clippy::missing_safety_doc)]

use std::ptr;

use gesture_stabilizer_core::{
    LabelCatalog, Observation, PresentationState, Stabilizer, StabilizerCfg, StabilizerError,
    StabilizerSnapshot,
};
use tracing::warn;

/// FFI ABI version for gesture_stabilizer_ffi.
///
/// Bump this when any `#[repr(C)]` struct layout or exported function signature changes.
pub const GST_FFI_VERSION: u32 = 1;

#[no_mangle]
pub extern "C" fn gst_ffi_version() -> u32 {
    GST_FFI_VERSION
}

// Snapshot wire format identification.
const SNAP_MAGIC: u32 = 0x3154_5347; // "GST1" little-endian
const SNAP_VERSION: u32 = 1;

pub const GST_OK: i32 = 0;
pub const GST_ERR_NULL: i32 = -1;
pub const GST_ERR_EMPTY_CATALOG: i32 = -2;
pub const GST_ERR_EMPTY_DISTRIBUTION: i32 = -3;
pub const GST_ERR_LENGTH_MISMATCH: i32 = -4;
pub const GST_ERR_NON_FINITE: i32 = -5;
pub const GST_ERR_INVALID_CONFIG: i32 = -6;
pub const GST_ERR_METADATA: i32 = -7;
pub const GST_ERR_BAD_MAGIC: i32 = -8;
pub const GST_ERR_BAD_VERSION: i32 = -9;
pub const GST_ERR_TRUNCATED: i32 = -10;
pub const GST_ERR_UTF8: i32 = -11;
pub const GST_ERR_INVALID_SNAPSHOT: i32 = -12;

/// Opaque handle exposed over FFI.
pub struct GstStabilizer {
    inner: Stabilizer,
    catalog: LabelCatalog,
}

/// FFI string view (UTF-8 bytes).
#[repr(C)]
#[derive(Clone, Copy)]
pub struct GstStr {
    pub ptr: *const u8,
    pub len: usize,
}

impl GstStr {
    const NULL: GstStr = GstStr { ptr: ptr::null(), len: 0 };

    fn as_str(&self) -> Option<&str> {
        if self.ptr.is_null() {
            return None;
        }
        let bytes = unsafe { std::slice::from_raw_parts(self.ptr, self.len) };
        std::str::from_utf8(bytes).ok()
    }

    fn borrowed(s: &str) -> Self {
        GstStr { ptr: s.as_ptr(), len: s.len() }
    }
}

/// Stabilizer cfg for FFI. The no-gesture label is passed separately as a string.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct GstCfg {
    pub window_capacity: u32,
    pub confidence_threshold: f32,
    pub unrecognized_threshold: f32,
    pub confirm_majority: u32,
    pub retain_stable_label_on_reset: u8,
}

#[no_mangle]
pub extern "C" fn gst_cfg_default() -> GstCfg {
    let d = StabilizerCfg::default();
    GstCfg {
        window_capacity: d.window_capacity as u32,
        confidence_threshold: d.confidence_threshold,
        unrecognized_threshold: d.unrecognized_threshold,
        confirm_majority: d.confirm_majority as u32,
        retain_stable_label_on_reset: d.retain_stable_label_on_reset as u8,
    }
}

fn cfg_from_ffi(c: GstCfg, no_gesture: GstStr) -> StabilizerCfg {
    StabilizerCfg {
        window_capacity: c.window_capacity as usize,
        confidence_threshold: c.confidence_threshold,
        unrecognized_threshold: c.unrecognized_threshold,
        confirm_majority: c.confirm_majority as usize,
        no_gesture_label: no_gesture.as_str().filter(|s| !s.is_empty()).map(str::to_string),
        retain_stable_label_on_reset: c.retain_stable_label_on_reset != 0,
    }
}

fn rc_for(e: &StabilizerError) -> i32 {
    match e {
        StabilizerError::EmptyCatalog => GST_ERR_EMPTY_CATALOG,
        StabilizerError::EmptyDistribution => GST_ERR_EMPTY_DISTRIBUTION,
        StabilizerError::LengthMismatch { .. } => GST_ERR_LENGTH_MISMATCH,
        StabilizerError::NonFiniteProbability { .. } => GST_ERR_NON_FINITE,
        StabilizerError::InvalidConfig(_) => GST_ERR_INVALID_CONFIG,
        StabilizerError::InvalidSnapshot(_) => GST_ERR_INVALID_SNAPSHOT,
        StabilizerError::Metadata(_) => GST_ERR_METADATA,
    }
}

/// Presentation state as a C-friendly enum.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GstState {
    Loading = 0,
    Started = 1,
    Detected = 2,
    NoGesture = 3,
    Unrecognized = 4,
    InsufficientSignal = 5,
    Stopped = 6,
}

/// Output of one ingest call.
///
/// Labels are reported as catalog indices; resolve them with `gst_stabilizer_label`.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct GstTick {
    pub state: GstState,
    /// Smoothed confidence for `Detected`/`NoGesture`, else 0.
    pub confidence: f32,
    /// Catalog index of the detected label, or -1.
    pub label_index: i32,
    /// 1 when this tick confirmed a new stable label.
    pub history_appended: u8,
    /// Raw arg-max observation for this tick.
    pub observed_index: i32,
    pub observed_confidence: f32,
}

fn index_of(catalog: &LabelCatalog, label: &str) -> i32 {
    catalog.position(label).map(|i| i as i32).unwrap_or(-1)
}

fn make_handle(cfg: StabilizerCfg, catalog: LabelCatalog) -> *mut GstStabilizer {
    match Stabilizer::new(cfg) {
        Ok(inner) => Box::into_raw(Box::new(GstStabilizer { inner, catalog })),
        Err(e) => {
            warn!(error = %e, "rejecting stabilizer config");
            ptr::null_mut()
        }
    }
}

/// Create a stabilizer from already-resolved label strings.
///
/// Returns null when the catalog is empty, a label is not UTF-8, or the cfg is invalid.
/// An empty or null `no_gesture` disables the no-gesture label.
#[no_mangle]
pub unsafe extern "C" fn gst_stabilizer_new(
    cfg: GstCfg,
    labels_ptr: *const GstStr,
    labels_len: usize,
    no_gesture: GstStr,
) -> *mut GstStabilizer {
    if labels_ptr.is_null() || labels_len == 0 {
        return ptr::null_mut();
    }
    let raw = std::slice::from_raw_parts(labels_ptr, labels_len);
    let labels: Option<Vec<&str>> = raw.iter().map(|s| s.as_str()).collect();
    let catalog = match labels.map(LabelCatalog::new) {
        Some(Ok(c)) => c,
        _ => return ptr::null_mut(),
    };
    make_handle(cfg_from_ffi(cfg, no_gesture), catalog)
}

/// Create a stabilizer from a model metadata JSON document (`{"labels": [...]}`).
#[no_mangle]
pub unsafe extern "C" fn gst_stabilizer_new_from_metadata(
    cfg: GstCfg,
    metadata_json: GstStr,
    no_gesture: GstStr,
) -> *mut GstStabilizer {
    let Some(json) = metadata_json.as_str() else {
        return ptr::null_mut();
    };
    match LabelCatalog::from_metadata_json(json) {
        Ok(catalog) => make_handle(cfg_from_ffi(cfg, no_gesture), catalog),
        Err(e) => {
            warn!(error = %e, "rejecting model metadata");
            ptr::null_mut()
        }
    }
}

#[no_mangle]
pub unsafe extern "C" fn gst_stabilizer_free(h: *mut GstStabilizer) {
    if !h.is_null() {
        drop(Box::from_raw(h));
    }
}

/// Number of labels in the handle's catalog (0 for a null handle).
#[no_mangle]
pub unsafe extern "C" fn gst_stabilizer_label_count(h: *const GstStabilizer) -> usize {
    if h.is_null() {
        return 0;
    }
    (*h).catalog.len()
}

/// Borrowed view of a catalog label. Valid until the handle is freed; null if out of range.
#[no_mangle]
pub unsafe extern "C" fn gst_stabilizer_label(h: *const GstStabilizer, index: usize) -> GstStr {
    if h.is_null() {
        return GstStr::NULL;
    }
    match (*h).catalog.get(index) {
        Some(s) => GstStr::borrowed(s),
        None => GstStr::NULL,
    }
}

/// Feed one probability vector. Writes the result to `out` and returns `GST_OK`,
/// or a negative code for a contract violation (in which case `out` is untouched).
#[no_mangle]
pub unsafe extern "C" fn gst_stabilizer_ingest(
    h: *mut GstStabilizer,
    dist_ptr: *const f32,
    dist_len: usize,
    out: *mut GstTick,
) -> i32 {
    if h.is_null() || out.is_null() {
        return GST_ERR_NULL;
    }
    let handle = &mut *h;
    let dist: &[f32] = if dist_ptr.is_null() || dist_len == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(dist_ptr, dist_len)
    };

    let tick = match handle.inner.ingest(dist, &handle.catalog) {
        Ok(t) => t,
        Err(e) => return rc_for(&e),
    };

    let (state, confidence, label_index) = match &tick.state {
        PresentationState::Loading => (GstState::Loading, 0.0, -1),
        PresentationState::Started => (GstState::Started, 0.0, -1),
        PresentationState::Detected { label, confidence } => {
            (GstState::Detected, *confidence, index_of(&handle.catalog, label))
        }
        PresentationState::NoGesture { confidence } => (GstState::NoGesture, *confidence, -1),
        PresentationState::Unrecognized => (GstState::Unrecognized, 0.0, -1),
        PresentationState::InsufficientSignal => (GstState::InsufficientSignal, 0.0, -1),
        PresentationState::Stopped => (GstState::Stopped, 0.0, -1),
    };

    *out = GstTick {
        state,
        confidence,
        label_index,
        history_appended: tick.history.is_some() as u8,
        observed_index: index_of(&handle.catalog, &tick.observation.label),
        observed_confidence: tick.observation.confidence,
    };
    GST_OK
}

#[no_mangle]
pub unsafe extern "C" fn gst_stabilizer_reset(h: *mut GstStabilizer) {
    if !h.is_null() {
        (*h).inner.reset();
    }
}

/// Owned byte buffer (for snapshot).
#[repr(C)]
pub struct GstBytes {
    pub ptr: *mut u8,
    pub len: usize,
}

fn put_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

/// Snapshot format (binary, little-endian):
/// [u32 magic = "GST1"][u32 version = 1][u32 count]
/// repeated count times, oldest first:
///   [u32 strlen][label bytes][f32 confidence]
/// [u8 has_stable] and, if 1: [u32 strlen][label bytes]
#[no_mangle]
pub unsafe extern "C" fn gst_snapshot(h: *const GstStabilizer) -> GstBytes {
    if h.is_null() {
        return GstBytes { ptr: ptr::null_mut(), len: 0 };
    }
    let snap = (*h).inner.snapshot();

    let mut buf: Vec<u8> = Vec::new();
    buf.extend_from_slice(&SNAP_MAGIC.to_le_bytes());
    buf.extend_from_slice(&SNAP_VERSION.to_le_bytes());
    buf.extend_from_slice(&(snap.window.len() as u32).to_le_bytes());

    for obs in &snap.window {
        put_str(&mut buf, &obs.label);
        buf.extend_from_slice(&obs.confidence.to_le_bytes());
    }

    match &snap.last_stable_label {
        Some(label) => {
            buf.push(1);
            put_str(&mut buf, label);
        }
        None => buf.push(0),
    }

    let mut boxed = buf.into_boxed_slice();
    let ptr = boxed.as_mut_ptr();
    let len = boxed.len();
    std::mem::forget(boxed);

    GstBytes { ptr, len }
}

#[no_mangle]
pub unsafe extern "C" fn gst_bytes_free(b: GstBytes) {
    if !b.ptr.is_null() {
        let slice_ptr = std::ptr::slice_from_raw_parts_mut(b.ptr, b.len);
        drop(Box::from_raw(slice_ptr));
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], i32> {
        let end = self.pos.checked_add(n).ok_or(GST_ERR_TRUNCATED)?;
        let out = self.data.get(self.pos..end).ok_or(GST_ERR_TRUNCATED)?;
        self.pos = end;
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, i32> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, i32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f32(&mut self) -> Result<f32, i32> {
        Ok(f32::from_bits(self.u32()?))
    }

    fn string(&mut self) -> Result<String, i32> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| GST_ERR_UTF8)
    }
}

fn decode_snapshot(data: &[u8]) -> Result<StabilizerSnapshot, i32> {
    let mut r = Reader { data, pos: 0 };
    if r.u32()? != SNAP_MAGIC {
        return Err(GST_ERR_BAD_MAGIC);
    }
    if r.u32()? != SNAP_VERSION {
        return Err(GST_ERR_BAD_VERSION);
    }

    let count = r.u32()? as usize;
    let mut window = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        let label = r.string()?;
        let confidence = r.f32()?;
        window.push(Observation { label, confidence });
    }

    let last_stable_label = match r.u8()? {
        0 => None,
        _ => Some(r.string()?),
    };

    Ok(StabilizerSnapshot { window, last_stable_label })
}

/// Replace the handle's state with a snapshot produced by `gst_snapshot`.
///
/// Returns the number of observations kept (>= 0), or a negative error code.
/// On error the handle is left unchanged.
#[no_mangle]
pub unsafe extern "C" fn gst_restore(h: *mut GstStabilizer, bytes: *const u8, len: usize) -> i32 {
    if h.is_null() || bytes.is_null() {
        return GST_ERR_NULL;
    }
    let data = std::slice::from_raw_parts(bytes, len);
    let snap = match decode_snapshot(data) {
        Ok(snap) => snap,
        Err(rc) => return rc,
    };
    let handle = &mut *h;
    match handle.inner.restore(snap, &handle.catalog) {
        Ok(stats) => stats.applied as i32,
        Err(e) => {
            warn!(error = %e, "rejecting snapshot");
            rc_for(&e)
        }
    }
}
