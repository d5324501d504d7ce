//! Point cloud frame storage shared between the capture side and the renderer

use crate::point::*;
use parking_lot::Mutex;
use std::ops::Index;

/// Default frame capacity: two VGA depth images worth of points.
pub const DEFAULT_FRAME_CAPACITY: usize = 640 * 480 * 2;

/// A fixed-capacity, timestamped point cloud
///
/// The backing storage is allocated once by [`PointCloudFrame::with_capacity`]
/// and then overwritten in place; it never grows or shrinks.
#[derive(Debug, Clone)]
pub struct PointCloudFrame {
    timestamp_ns: u64,
    count: usize,
    points: Vec<Point3f>,
}

impl PointCloudFrame {
    /// Create an empty frame able to hold `capacity` points
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            timestamp_ns: 0,
            count: 0,
            points: vec![Point3f::origin(); capacity],
        }
    }

    /// Maximum number of points this frame can hold
    pub fn capacity(&self) -> usize {
        self.points.len()
    }

    /// Number of valid points
    pub fn len(&self) -> usize {
        self.count
    }

    /// Check if the frame holds no points
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Capture timestamp of the current contents in nanoseconds
    pub fn timestamp_ns(&self) -> u64 {
        self.timestamp_ns
    }

    /// The valid points of the frame
    pub fn points(&self) -> &[Point3f] {
        &self.points[..self.count]
    }

    /// Get an iterator over the valid points
    pub fn iter(&self) -> std::slice::Iter<'_, Point3f> {
        self.points().iter()
    }

    /// Overwrite the frame with already converted points.
    ///
    /// `count` is clamped to the frame capacity and to the length of `points`;
    /// a negative count empties the frame. Returns the number of points kept.
    pub fn overwrite(&mut self, timestamp_ns: u64, points: &[Point3f], count: i32) -> usize {
        let count = clamp_count(count, points.len(), self.capacity());
        self.points[..count].copy_from_slice(&points[..count]);
        self.timestamp_ns = timestamp_ns;
        self.count = count;
        count
    }

    /// Overwrite the frame from flattened raw `x, y, z` sensor triplets.
    ///
    /// Depth values at or below `depth_min` become [`FAR_SENTINEL`].
    pub fn overwrite_raw(&mut self, timestamp_ns: u64, xyz: &[i16], count: i32, depth_min: i32) -> usize {
        let count = clamp_count(count, xyz.len() / 3, self.capacity());
        for (slot, raw) in self.points[..count].iter_mut().zip(xyz.chunks_exact(3)) {
            *slot = point_from_raw(raw[0], raw[1], raw[2], depth_min);
        }
        self.timestamp_ns = timestamp_ns;
        self.count = count;
        count
    }

    /// Drop all points without releasing storage
    pub fn clear(&mut self) {
        self.count = 0;
        self.timestamp_ns = 0;
    }
}

impl Default for PointCloudFrame {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_FRAME_CAPACITY)
    }
}

impl Index<usize> for PointCloudFrame {
    type Output = Point3f;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points()[index]
    }
}

impl<'a> IntoIterator for &'a PointCloudFrame {
    type Item = &'a Point3f;
    type IntoIter = std::slice::Iter<'a, Point3f>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn clamp_count(count: i32, available: usize, capacity: usize) -> usize {
    usize::try_from(count).unwrap_or(0).min(available).min(capacity)
}

/// Single-writer / single-reader frame slot
///
/// Writers copy into the frame under a short critical section, so the renderer
/// never observes a half-written frame.
#[derive(Debug)]
pub struct SharedFrame {
    inner: Mutex<PointCloudFrame>,
}

impl SharedFrame {
    /// Create a shared slot around an empty frame of the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(PointCloudFrame::with_capacity(capacity)),
        }
    }

    /// Capacity of the underlying frame
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    /// Replace the frame contents with converted points
    pub fn write(&self, timestamp_ns: u64, points: &[Point3f], count: i32) -> usize {
        self.inner.lock().overwrite(timestamp_ns, points, count)
    }

    /// Replace the frame contents with raw sensor triplets
    pub fn write_raw(&self, timestamp_ns: u64, xyz: &[i16], count: i32, depth_min: i32) -> usize {
        self.inner.lock().overwrite_raw(timestamp_ns, xyz, count, depth_min)
    }

    /// Run `f` against a consistent view of the current frame
    pub fn read<R>(&self, f: impl FnOnce(&PointCloudFrame) -> R) -> R {
        f(&self.inner.lock())
    }

    /// Empty the frame
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl Default for SharedFrame {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_FRAME_CAPACITY)
    }
}
