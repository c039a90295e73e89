//! Row-major rasters and their 8-bit renderings.
//!
//! Row 0 is the top of the image. Normalized relief rasters hold values in
//! `[0, 1]` with `0` also marking pixels without data.

use nalgebra::Vector3;

/// A dense row-major 2D array.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Raster<T> {
    /// Create a raster filled with `T::default()`.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, T::default())
    }
}

impl<T: Clone> Raster<T> {
    /// Create a raster filled with `value`.
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }
}

impl<T> Raster<T> {
    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Whether the raster has no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    fn offset(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }

    /// Pixel at `(row, col)`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        self.offset(row, col).map(|i| &self.data[i])
    }

    /// Mutable pixel at `(row, col)`.
    #[inline]
    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut T> {
        self.offset(row, col).map(move |i| &mut self.data[i])
    }

    /// Overwrite a pixel. Returns false if `(row, col)` is outside.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: T) -> bool {
        match self.get_mut(row, col) {
            Some(px) => {
                *px = value;
                true
            }
            None => false,
        }
    }

    /// Pixels in row-major order.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Consume the raster, returning its row-major pixels.
    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    /// Iterate over rows from top to bottom.
    pub fn row_iter(&self) -> impl Iterator<Item = &[T]> {
        // chunks_exact panics on zero; an empty raster has no rows anyway.
        self.data.chunks_exact(self.cols.max(1)).take(self.rows)
    }

    /// Apply `f` to every pixel.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Raster<U> {
        Raster {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(f).collect(),
        }
    }
}

/// Convert a normalized value to an 8-bit intensity: `255·v`, clamped and
/// truncated.
#[inline]
pub fn to_gray(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    (255.0 * value).clamp(0.0, 255.0) as u8
}

/// 8-bit grayscale rendering of a normalized raster.
pub fn gray_image(normalized: &Raster<f64>) -> Raster<u8> {
    normalized.map(|&v| to_gray(v))
}

/// RGB rendering of a normalized raster through the jet color map.
///
/// Each pixel is first quantized to 8 bits like [`gray_image`], so equal
/// gray levels always get equal colors.
pub fn rgb_image(normalized: &Raster<f64>) -> Raster<[u8; 3]> {
    let jet = ColorMap::jet();
    normalized.map(|&v| jet.sample_rgb8(to_gray(v)))
}

/// A color map sampled at evenly spaced control points.
#[derive(Debug, Clone)]
pub struct ColorMap {
    /// Color map name.
    pub name: &'static str,
    /// RGB control points in `[0, 1]`, evenly spaced from 0 to 1.
    pub colors: Vec<Vector3<f64>>,
}

impl ColorMap {
    /// Dark blue through cyan, yellow and red to dark red.
    pub fn jet() -> Self {
        Self {
            name: "jet",
            colors: vec![
                Vector3::new(0.0, 0.0, 0.5),
                Vector3::new(0.0, 0.0, 1.0),
                Vector3::new(0.0, 0.5, 1.0),
                Vector3::new(0.0, 1.0, 1.0),
                Vector3::new(0.5, 1.0, 0.5),
                Vector3::new(1.0, 1.0, 0.0),
                Vector3::new(1.0, 0.5, 0.0),
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(0.5, 0.0, 0.0),
            ],
        }
    }

    /// Linearly interpolated color at `t`, clamped to `[0, 1]`.
    pub fn sample(&self, t: f64) -> Vector3<f64> {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self.colors.len() {
            0 => Vector3::zeros(),
            1 => self.colors[0],
            len => {
                let n = len - 1;
                let scaled = t * n as f64;
                let idx = (scaled.floor() as usize).min(n - 1);
                let frac = scaled - idx as f64;
                self.colors[idx].lerp(&self.colors[idx + 1], frac)
            }
        }
    }

    /// Color of an 8-bit level as RGB bytes.
    pub fn sample_rgb8(&self, level: u8) -> [u8; 3] {
        let c = self.sample(f64::from(level) / 255.0);
        [channel(c.x), channel(c.y), channel(c.z)]
    }
}

#[inline]
fn channel(v: f64) -> u8 {
    (255.0 * v).round().clamp(0.0, 255.0) as u8
}
