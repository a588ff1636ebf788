use std::cell::Cell;
use std::sync::Mutex;

use image::{GrayImage, Luma};
use ringsizer::core::db::{MeasurementDb, NewMeasurement};
use ringsizer::core::sink::MeasurementSink;
use ringsizer::detection::PixelSource;
use ringsizer::models::{landmarks, LANDMARK_COUNT};
use ringsizer::{FrameInput, HandLandmarks, Landmark};

pub const FRAME_SIZE: u32 = 400;

/// Ring MCP→PIP runs straight up the image center, 100 px long
pub const RING_CHAIN: [(f32, f32); 4] = [(0.5, 0.65), (0.5, 0.4), (0.5, 0.3), (0.5, 0.25)];

/// Ring chain only 40 px long from MCP to tip
pub const SHORT_RING_CHAIN: [(f32, f32); 4] = [(0.5, 0.6), (0.5, 0.5625), (0.5, 0.5375), (0.5, 0.5)];

/// Hand with the wrist→middle-tip length fixed at 360 px in a 400x400
/// frame (0.5 mm/px at the 180 mm reference), ring chain as given.
pub fn synthetic_hand(ring: [(f32, f32); 4]) -> HandLandmarks {
    let mut lms = [Landmark::new(0.3, 0.5); LANDMARK_COUNT];
    lms[landmarks::WRIST] = Landmark::new(0.5, 0.95);
    lms[landmarks::MIDDLE_FINGER_TIP] = Landmark::new(0.5, 0.05);
    let chain = [
        landmarks::RING_FINGER_MCP,
        landmarks::RING_FINGER_PIP,
        landmarks::RING_FINGER_DIP,
        landmarks::RING_FINGER_TIP,
    ];
    for (idx, (x, y)) in chain.into_iter().zip(ring) {
        lms[idx] = Landmark::new(x, y);
    }
    HandLandmarks::new(lms)
}

/// Ring MCP and PIP on the same spot
pub fn degenerate_hand() -> HandLandmarks {
    synthetic_hand([(0.5, 0.5), (0.5, 0.5), (0.5, 0.4), (0.5, 0.3)])
}

/// Bright vertical band `|x - 200| <= half_width` on a dark background
pub fn band_image(half_width: u32) -> GrayImage {
    let cx = FRAME_SIZE / 2;
    GrayImage::from_fn(FRAME_SIZE, FRAME_SIZE, |x, _| {
        if x.abs_diff(cx) <= half_width {
            Luma([200u8])
        } else {
            Luma([20u8])
        }
    })
}

pub fn flat_image() -> GrayImage {
    GrayImage::from_pixel(FRAME_SIZE, FRAME_SIZE, Luma([128u8]))
}

pub fn frame<'a>(hand: Option<&'a HandLandmarks>, timestamp: f64, pixels: &'a dyn PixelSource) -> FrameInput<'a> {
    FrameInput {
        landmarks: hand,
        timestamp,
        width: FRAME_SIZE,
        height: FRAME_SIZE,
        pixels,
    }
}

/// Pixel source that counts every read
pub struct CountingSource<'a> {
    pub inner: &'a GrayImage,
    pub reads: Cell<usize>,
}

impl<'a> CountingSource<'a> {
    pub fn new(inner: &'a GrayImage) -> Self {
        Self {
            inner,
            reads: Cell::new(0),
        }
    }
}

impl PixelSource for CountingSource<'_> {
    fn dimensions(&self) -> (u32, u32) {
        self.inner.dimensions()
    }

    fn gray(&self, x: u32, y: u32) -> f32 {
        self.reads.set(self.reads.get() + 1);
        self.inner.get_pixel(x, y)[0] as f32
    }
}

/// Sink that keeps every submitted record in memory
#[derive(Default)]
pub struct MemorySink {
    pub records: Mutex<Vec<NewMeasurement>>,
}

impl MeasurementSink for MemorySink {
    fn submit(&self, record: NewMeasurement) {
        self.records.lock().unwrap().push(record);
    }
}

/// Creates a MeasurementDb in a temporary directory.
/// Returns both the store and the temp directory (which must be kept alive).
pub async fn create_test_db() -> (MeasurementDb, tempfile::TempDir) {
    let dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let db = MeasurementDb::new(dir.path().join("measurements.db"))
        .await
        .expect("Failed to create test store");
    (db, dir)
}
