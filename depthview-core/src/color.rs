//! Rainbow depth-to-color lookup table
//!
//! Depth is mapped through six bands: white below the near limit, then
//! red → yellow → green → cyan → blue across the sensing range, and black at
//! and beyond the far limit.

use serde::{Deserialize, Serialize};

/// Number of entries in a color table: one per 16-bit depth value.
pub const TABLE_SIZE: usize = 1 << 16;

/// Default scaling reference used when building a table for a sensing range.
pub const DEFAULT_SPAN: u32 = 1000;

const WHITE: [u8; 3] = [255, 255, 255];
const BLACK: [u8; 3] = [0, 0, 0];

/// Parameters a [`ColorTable`] was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DepthRange {
    pub min: u32,
    pub max: u32,
    pub span: u32,
}

/// Three-channel lookup table indexed by 16-bit depth
#[derive(Clone)]
pub struct ColorTable {
    red: Box<[u8]>,
    green: Box<[u8]>,
    blue: Box<[u8]>,
    range: DepthRange,
}

impl ColorTable {
    /// Build the table for depths in `[range_min, range_max)`.
    ///
    /// `span` is the number of ramp steps the range is stretched over; with the
    /// default of 1000 the ramp runs from red to blue and never reaches black
    /// inside the range.
    pub fn build(range_min: u32, range_max: u32, span: u32) -> Self {
        let mut red = vec![0u8; TABLE_SIZE].into_boxed_slice();
        let mut green = vec![0u8; TABLE_SIZE].into_boxed_slice();
        let mut blue = vec![0u8; TABLE_SIZE].into_boxed_slice();

        let upper = (range_max as usize).min(TABLE_SIZE);
        let lower = (range_min as usize).min(upper);

        red[..lower].fill(255);
        green[..lower].fill(255);
        blue[..lower].fill(255);

        let width = f64::from(range_max) - f64::from(range_min);
        for i in lower..upper {
            let position = ramp_position(i as f64 - f64::from(range_min), width, span);
            let [r, g, b] = band_color(position);
            red[i] = r;
            green[i] = g;
            blue[i] = b;
        }

        tracing::debug!(range_min, range_max, span, "built depth color table");

        Self {
            red,
            green,
            blue,
            range: DepthRange {
                min: range_min,
                max: range_max,
                span,
            },
        }
    }

    /// The range this table was built for
    pub fn range(&self) -> DepthRange {
        self.range
    }

    /// Color for a depth index, clamped into the table bounds
    #[inline]
    pub fn lookup(&self, depth: i64) -> [u8; 3] {
        let index = depth.clamp(0, TABLE_SIZE as i64 - 1) as usize;
        [self.red[index], self.green[index], self.blue[index]]
    }

    /// Red channel
    pub fn red(&self) -> &[u8] {
        &self.red
    }

    /// Green channel
    pub fn green(&self) -> &[u8] {
        &self.green
    }

    /// Blue channel
    pub fn blue(&self) -> &[u8] {
        &self.blue
    }
}

impl Default for ColorTable {
    /// An all-black table, as seen before the sensing range is known
    fn default() -> Self {
        Self::build(0, 0, DEFAULT_SPAN)
    }
}

impl std::fmt::Debug for ColorTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorTable").field("range", &self.range).finish_non_exhaustive()
    }
}

/// Position on the ramp for an offset into the range; offset 0 lands on 255.
fn ramp_position(offset: f64, width: f64, span: u32) -> i64 {
    let span = f64::from(span);
    let scaled = offset / width * span;
    let clamped = if scaled > span + 512.0 { span + 512.0 } else { scaled };
    clamped as i64 + 255
}

fn band_color(ii: i64) -> [u8; 3] {
    match ii {
        i64::MIN..=254 => WHITE,
        255..=510 => [255, (ii - 255) as u8, 0],
        511..=765 => [(765 - ii) as u8, 255, 0],
        766..=1020 => [0, 255, (ii - 765) as u8],
        1021..=1275 => [0, (1275 - ii) as u8, 255],
        _ => BLACK,
    }
}
