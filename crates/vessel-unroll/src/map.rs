//! Discretized height × angle map of an unrolled surface.
//!
//! Points are binned by an affine rescale of their height and angle into
//! `[0, bins - 1]`. Rows are stored top-down, so row 0 holds the highest
//! points. Each cell keeps the indices of the points that fell into it.
//!
//! Images are produced by aggregating relief values over `dF × dF` blocks of
//! cells. Cells whose column reaches the top or bottom edge through empty
//! cells are treated as lying outside the surface and left at zero.

use tracing::{debug, info};
use vessel_mesh::tracing_ext::OperationTimer;

use crate::cylindrical::CylindricalPoint;
use crate::error::{UnrollError, UnrollResult};
use crate::params::{Aggregate, UnrollParams};
use crate::raster::Raster;

/// Map `value` from `[min, max]` onto bins `0..bins`, rounding to nearest.
///
/// A zero-width range maps everything to bin 0.
fn rescale(value: f64, min: f64, max: f64, bins: usize) -> usize {
    let last = bins.saturating_sub(1) as f64;
    let span = max - min;
    if span <= 0.0 {
        return 0;
    }
    let pos = (last / span * (value - max) + last).round();
    pos.clamp(0.0, last) as usize
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// A height × angle grid of point indices with per-point relief values.
///
/// Read-only once built.
#[derive(Debug, Clone)]
pub struct UnrolledMap {
    points: Vec<CylindricalPoint>,
    relief: Vec<f64>,
    cells: Raster<Vec<usize>>,
    height_range: (f64, f64),
    angle_range: (f64, f64),
    relief_range: (f64, f64),
}

impl UnrolledMap {
    /// Bin `points` into a grid. `relief[k]` is the value carried by
    /// `points[k]`.
    ///
    /// The grid has `round(max height - min height)` rows and
    /// `round(2π · mean radius)` columns, each at least 1.
    ///
    /// # Errors
    ///
    /// Returns an error when there are no points, when `relief` has a
    /// different length, or when any coordinate or relief value is not
    /// finite.
    pub fn new(points: Vec<CylindricalPoint>, relief: Vec<f64>) -> UnrollResult<Self> {
        info!(points = points.len(), "Construct unrolled map");

        if points.is_empty() {
            return Err(UnrollError::EmptyPointCloud);
        }
        if points.len() != relief.len() {
            return Err(UnrollError::relief_length_mismatch(points.len(), relief.len()));
        }
        for (index, p) in points.iter().enumerate() {
            for (what, value) in [
                ("angle", p.angle),
                ("height", p.height),
                ("radius", p.radius),
            ] {
                if !value.is_finite() {
                    return Err(UnrollError::non_finite(index, what, value));
                }
            }
        }
        if let Some((index, &value)) = relief.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(UnrollError::non_finite(index, "relief", value));
        }

        let height_range = min_max(points.iter().map(|p| p.height));
        let angle_range = min_max(points.iter().map(|p| p.angle));
        let relief_range = min_max(relief.iter().copied());
        let mean_radius = points.iter().map(|p| p.radius).sum::<f64>() / points.len() as f64;

        let height_div = ((height_range.1 - height_range.0).round() as usize).max(1);
        let angle_div = ((std::f64::consts::TAU * mean_radius).round() as usize).max(1);
        info!(height_div, angle_div, "Discretisation");

        let mut map = Self {
            points,
            relief,
            cells: Raster::new(height_div, angle_div),
            height_range,
            angle_range,
            relief_range,
        };

        for index in 0..map.points.len() {
            let (row, col) = map.stored_cell(&map.points[index]);
            if let Some(cell) = map.cells.get_mut(row, col) {
                cell.push(index);
            }
        }

        let occupied = map.cells.data().iter().filter(|c| !c.is_empty()).count();
        debug!(occupied, total = height_div * angle_div, "Filled unrolled map");

        Ok(map)
    }

    /// Number of height rows.
    #[inline]
    pub fn height_div(&self) -> usize {
        self.cells.rows()
    }

    /// Number of angle columns.
    #[inline]
    pub fn angle_div(&self) -> usize {
        self.cells.cols()
    }

    /// `(height_div, angle_div)`.
    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        self.cells.dims()
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; construction rejects empty point clouds.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All points, in input order.
    pub fn points(&self) -> &[CylindricalPoint] {
        &self.points
    }

    /// Relief values, aligned with [`points`](Self::points).
    pub fn relief(&self) -> &[f64] {
        &self.relief
    }

    /// The point at `index`.
    pub fn cylindrical_point(&self, index: usize) -> UnrollResult<CylindricalPoint> {
        self.points
            .get(index)
            .copied()
            .ok_or_else(|| UnrollError::index_out_of_range(index, self.points.len()))
    }

    /// `(min, max)` relief over all points.
    pub fn relief_range(&self) -> (f64, f64) {
        self.relief_range
    }

    /// `(min, max)` height over all points.
    pub fn height_range(&self) -> (f64, f64) {
        self.height_range
    }

    /// `(min, max)` angle over all points.
    pub fn angle_range(&self) -> (f64, f64) {
        self.angle_range
    }

    /// Point indices stored in cell `(i, j)`, or `None` outside the grid.
    pub fn cell(&self, i: usize, j: usize) -> Option<&[usize]> {
        self.cells.get(i, j).map(Vec::as_slice)
    }

    /// Unflipped `(height bin, angle bin)` of a point.
    fn bins(&self, p: &CylindricalPoint) -> (usize, usize) {
        let (h_min, h_max) = self.height_range;
        let (a_min, a_max) = self.angle_range;
        (
            rescale(p.height, h_min, h_max, self.height_div()),
            rescale(p.angle, a_min, a_max, self.angle_div()),
        )
    }

    fn stored_cell(&self, p: &CylindricalPoint) -> (usize, usize) {
        let (pos_h, pos_a) = self.bins(p);
        (self.height_div() - pos_h - 1, pos_a)
    }

    /// `(row, column)` of the cell holding point `index`.
    pub fn cell_of(&self, index: usize) -> UnrollResult<(usize, usize)> {
        let p = self.cylindrical_point(index)?;
        Ok(self.stored_cell(&p))
    }

    fn is_empty_cell(&self, i: usize, j: usize) -> bool {
        self.cells.get(i, j).is_none_or(Vec::is_empty)
    }

    /// Whether cell `(i, j)` is enclosed by the surface along its column.
    ///
    /// Walks up and down from `(i, j)` through empty cells. Returns false if
    /// either walk reaches the first or last row without meeting a non-empty
    /// cell. A non-empty cell is always inside; an empty cell in the first
    /// or last row never is.
    pub fn detect_cells_in(&self, i: usize, j: usize) -> bool {
        let rows = self.height_div();
        if i >= rows || j >= self.angle_div() {
            return false;
        }

        let mut up = i;
        while self.is_empty_cell(up, j) && up > 0 {
            up -= 1;
        }
        let mut down = i;
        while self.is_empty_cell(down, j) && down < rows - 1 {
            down += 1;
        }

        let open_top = up == 0 && self.is_empty_cell(up, j);
        let open_bottom = down == rows - 1 && self.is_empty_cell(down, j);
        !(open_top || open_bottom)
    }

    fn block_indices(&self, i: usize, j: usize, decrease_factor: usize) -> Vec<usize> {
        let top = (i / decrease_factor) * decrease_factor;
        let left = (j / decrease_factor) * decrease_factor;
        let bottom = (top + decrease_factor).min(self.height_div());
        let right = (left + decrease_factor).min(self.angle_div());

        let mut out = Vec::new();
        for k in top..bottom {
            for l in left..right {
                if let Some(cell) = self.cells.get(k, l) {
                    out.extend_from_slice(cell);
                }
            }
        }
        out
    }

    /// Indices of every point in the `dF × dF` block containing `(i, j)`.
    ///
    /// The block starts at `(i / dF · dF, j / dF · dF)` and is clipped to the
    /// grid.
    pub fn indices_in_lower_resolution(
        &self,
        i: usize,
        j: usize,
        decrease_factor: usize,
    ) -> UnrollResult<Vec<usize>> {
        if decrease_factor == 0 {
            return Err(UnrollError::InvalidDecreaseFactor);
        }
        Ok(self.block_indices(i, j, decrease_factor))
    }

    fn block_aggregate(
        &self,
        kind: Aggregate,
        i: usize,
        j: usize,
        decrease_factor: usize,
    ) -> Option<f64> {
        let mut values: Vec<f64> = self
            .block_indices(i, j, decrease_factor)
            .into_iter()
            .map(|k| self.relief[k])
            .collect();
        kind.evaluate(&mut values)
    }

    /// Relief statistic over the `dF × dF` block containing `(i, j)`.
    ///
    /// `Ok(None)` means the block holds no points.
    pub fn aggregate(
        &self,
        kind: Aggregate,
        i: usize,
        j: usize,
        decrease_factor: usize,
    ) -> UnrollResult<Option<f64>> {
        if decrease_factor == 0 {
            return Err(UnrollError::InvalidDecreaseFactor);
        }
        Ok(self.block_aggregate(kind, i, j, decrease_factor))
    }

    /// Sum of relief over the block containing `(i, j)`.
    pub fn sum_relief(&self, i: usize, j: usize, decrease_factor: usize) -> UnrollResult<Option<f64>> {
        self.aggregate(Aggregate::Sum, i, j, decrease_factor)
    }

    /// Mean relief over the block containing `(i, j)`.
    pub fn mean_relief(&self, i: usize, j: usize, decrease_factor: usize) -> UnrollResult<Option<f64>> {
        self.aggregate(Aggregate::Mean, i, j, decrease_factor)
    }

    /// Largest relief in the block containing `(i, j)`.
    pub fn max_relief(&self, i: usize, j: usize, decrease_factor: usize) -> UnrollResult<Option<f64>> {
        self.aggregate(Aggregate::Max, i, j, decrease_factor)
    }

    /// Median relief in the block containing `(i, j)`.
    pub fn median_relief(
        &self,
        i: usize,
        j: usize,
        decrease_factor: usize,
    ) -> UnrollResult<Option<f64>> {
        self.aggregate(Aggregate::Median, i, j, decrease_factor)
    }

    /// Rescale a relief value so the map's minimum becomes 0 and its
    /// maximum 1. Returns 1 when all relief values are equal.
    pub fn normalize_relief(&self, value: f64) -> f64 {
        let (min, max) = self.relief_range;
        if max > min {
            (value - max) / (max - min) + 1.0
        } else {
            1.0
        }
    }

    /// Normalized relief image at `1 / dF` resolution.
    ///
    /// The raster has `height_div / dF` rows and `angle_div / dF` columns.
    /// Pixel `(i / dF, j / dF)` takes the `kind` statistic of its block when
    /// the block's top-left cell is enclosed and the block is not empty;
    /// other pixels stay 0.
    pub fn normalized_image(
        &self,
        decrease_factor: usize,
        kind: Aggregate,
    ) -> UnrollResult<Raster<f64>> {
        if decrease_factor == 0 {
            return Err(UnrollError::InvalidDecreaseFactor);
        }
        let (height_div, angle_div) = self.dims();
        let rows = height_div / decrease_factor;
        let cols = angle_div / decrease_factor;
        if rows == 0 || cols == 0 {
            return Err(UnrollError::EmptyRaster {
                factor: decrease_factor,
                height_div,
                angle_div,
            });
        }

        let _timer = OperationTimer::with_context("normalized_image", rows * cols);
        info!(decrease_factor, rows, cols, aggregate = %kind, "Compute normalized image");

        let mut image = Raster::new(rows, cols);
        let mut filled = 0usize;
        for i in (0..height_div).step_by(decrease_factor) {
            for j in (0..angle_div).step_by(decrease_factor) {
                if !self.detect_cells_in(i, j) {
                    continue;
                }
                if let Some(value) = self.block_aggregate(kind, i, j, decrease_factor) {
                    // Trailing partial blocks fall outside the raster.
                    if image.set(i / decrease_factor, j / decrease_factor, self.normalize_relief(value)) {
                        filled += 1;
                    }
                }
            }
        }

        debug!(filled, "Normalized image done");
        Ok(image)
    }

    /// Full-resolution normalized relief image with adaptive block size.
    ///
    /// Each enclosed cell takes the statistic of the smallest block from
    /// [`UnrollParams::scales`] that holds any points. Cells with no
    /// non-empty block stay 0.
    pub fn normalized_image_multiscale(&self, params: &UnrollParams) -> UnrollResult<Raster<f64>> {
        params.validate()?;
        let (height_div, angle_div) = self.dims();

        let _timer = OperationTimer::with_context("normalized_image_multiscale", height_div * angle_div);
        info!(
            min_scale = params.min_scale,
            max_scale = params.max_scale,
            aggregate = %params.aggregate,
            "Compute normalized image in multi scale"
        );

        let mut image = Raster::new(height_div, angle_div);
        let mut coarsest = 0usize;
        let mut unresolved = 0usize;
        for i in 0..height_div {
            for j in 0..angle_div {
                if !self.detect_cells_in(i, j) {
                    continue;
                }
                let found = params.scales().find_map(|scale| {
                    self.block_aggregate(params.aggregate, i, j, scale)
                        .map(|value| (scale, value))
                });
                match found {
                    Some((scale, value)) => {
                        coarsest = coarsest.max(scale);
                        image.set(i, j, self.normalize_relief(value));
                    }
                    None => unresolved += 1,
                }
            }
        }

        debug!(coarsest, unresolved, "Multi scale image done");
        Ok(image)
    }

    /// Normalized relief image as configured by `params`.
    pub fn relief_image(&self, params: &UnrollParams) -> UnrollResult<Raster<f64>> {
        params.validate()?;
        if params.multiscale {
            self.normalized_image_multiscale(params)
        } else {
            self.normalized_image(params.decrease_factor, params.aggregate)
        }
    }

    /// Mark the cells of the given points with 255 on a full-size raster.
    ///
    /// Pixels are addressed by unflipped `(height bin, angle bin)`.
    pub fn ground_truth_image(&self, ids: &[usize]) -> UnrollResult<Raster<u8>> {
        info!(count = ids.len(), "Create ground truth image");
        let mut image = Raster::new(self.height_div(), self.angle_div());
        for &id in ids {
            let p = self.cylindrical_point(id)?;
            let (pos_h, pos_a) = self.bins(&p);
            image.set(pos_h, pos_a, 255);
        }
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    /// Points at every integer height in `0..=h` and angle in `0..=a`, with
    /// radius chosen so the map has `a` columns. Relief equals height.
    fn grid_points(
        h: usize,
        a: usize,
        skip: impl Fn(usize, usize) -> bool,
    ) -> (Vec<CylindricalPoint>, Vec<f64>) {
        let radius = a as f64 / TAU;
        let mut points = Vec::new();
        let mut relief = Vec::new();
        for hh in 0..=h {
            for aa in 0..=a {
                if skip(hh, aa) {
                    continue;
                }
                points.push(CylindricalPoint::new(aa as f64, hh as f64, radius));
                relief.push(hh as f64);
            }
        }
        (points, relief)
    }

    fn dense_map() -> UnrolledMap {
        let (points, relief) = grid_points(10, 12, |_, _| false);
        UnrolledMap::new(points, relief).unwrap()
    }

    #[test]
    fn test_rescale_extremes() {
        assert_eq!(rescale(-2.0, -2.0, 3.0, 7), 0);
        assert_eq!(rescale(3.0, -2.0, 3.0, 7), 6);
        assert_eq!(rescale(0.5, -2.0, 3.0, 7), 3);
        assert_eq!(rescale(1.0, 1.0, 1.0, 5), 0);
        assert_eq!(rescale(1.0, 0.0, 1.0, 1), 0);
    }

    #[test]
    fn test_three_point_boundaries() {
        let points = vec![
            CylindricalPoint::new(-1.0, 0.0, 1.0),
            CylindricalPoint::new(1.0, 10.0, 1.0),
            CylindricalPoint::new(0.0, 5.0, 1.0),
        ];
        let map = UnrolledMap::new(points, vec![0.0, 1.0, 2.0]).unwrap();
        assert_eq!(map.dims(), (10, 6));

        // Lowest point lands in the last row, highest in the first.
        assert_eq!(map.cell_of(0).unwrap(), (9, 0));
        assert_eq!(map.cell_of(1).unwrap(), (0, 5));
        assert_eq!(map.cell(9, 0), Some(&[0][..]));
        assert!(map.cell_of(3).is_err());
    }

    #[test]
    fn test_construction_errors() {
        assert!(matches!(
            UnrolledMap::new(Vec::new(), Vec::new()),
            Err(UnrollError::EmptyPointCloud)
        ));
        let p = vec![CylindricalPoint::new(0.0, 0.0, 1.0)];
        assert!(matches!(
            UnrolledMap::new(p.clone(), vec![1.0, 2.0]),
            Err(UnrollError::ReliefLengthMismatch {
                points: 1,
                relief: 2
            })
        ));
        assert!(matches!(
            UnrolledMap::new(p, vec![f64::NAN]),
            Err(UnrollError::NonFiniteValue { what: "relief", .. })
        ));
        let bad = vec![CylindricalPoint::new(0.0, f64::INFINITY, 1.0)];
        assert!(matches!(
            UnrolledMap::new(bad, vec![0.0]),
            Err(UnrollError::NonFiniteValue {
                index: 0,
                what: "height",
                ..
            })
        ));
    }

    #[test]
    fn test_single_point_map() {
        let map = UnrolledMap::new(vec![CylindricalPoint::new(0.3, 2.0, 0.0)], vec![7.0]).unwrap();
        assert_eq!(map.dims(), (1, 1));
        assert_eq!(map.cell(0, 0), Some(&[0][..]));
        assert_eq!(map.normalize_relief(7.0), 1.0);
        assert!(map.detect_cells_in(0, 0));
    }

    #[test]
    fn test_median_over_cell() {
        let points = vec![CylindricalPoint::new(0.0, 0.0, 1.0); 4];
        let map = UnrolledMap::new(points, vec![4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(map.median_relief(0, 0, 1).unwrap(), Some(2.5));
        assert_eq!(map.sum_relief(0, 0, 1).unwrap(), Some(10.0));
        assert_eq!(map.max_relief(0, 0, 1).unwrap(), Some(4.0));
        assert_eq!(map.mean_relief(0, 0, 1).unwrap(), Some(2.5));
        // Remaining columns of the single row are empty.
        assert_eq!(map.mean_relief(0, 3, 1).unwrap(), None);
    }

    #[test]
    fn test_zero_decrease_factor() {
        let map = dense_map();
        assert!(matches!(
            map.indices_in_lower_resolution(0, 0, 0),
            Err(UnrollError::InvalidDecreaseFactor)
        ));
        assert!(map.sum_relief(0, 0, 0).is_err());
        assert!(map.normalized_image(0, Aggregate::Mean).is_err());
    }

    #[test]
    fn test_block_union() {
        let map = dense_map();
        assert_eq!(map.dims(), (10, 12));
        let block = map.indices_in_lower_resolution(3, 5, 2).unwrap();
        let mut expected: Vec<usize> = Vec::new();
        for k in 2..4 {
            for l in 4..6 {
                expected.extend_from_slice(map.cell(k, l).unwrap());
            }
        }
        assert_eq!(block, expected);

        // A block hanging over the grid edge is clipped.
        let edge = map.indices_in_lower_resolution(9, 11, 4).unwrap();
        assert!(!edge.is_empty());
        assert!(edge.iter().all(|&k| {
            let (r, c) = map.cell_of(k).unwrap();
            (8..10).contains(&r) && (8..12).contains(&c)
        }));
    }

    #[test]
    fn test_detect_cells_in() {
        // Empty first-row cell at column 0; hole in the middle of column 5.
        let (points, relief) =
            grid_points(10, 12, |h, a| (h == 10 && a == 0) || ((h == 5 || h == 6) && a == 5));
        let map = UnrolledMap::new(points, relief).unwrap();

        assert!(map.cell(0, 0).unwrap().is_empty());
        assert!(!map.detect_cells_in(0, 0));

        assert!(map.cell(4, 5).unwrap().is_empty());
        assert!(map.detect_cells_in(4, 5));
        assert!(map.detect_cells_in(3, 5));
        assert!(!map.detect_cells_in(10, 0));
    }

    #[test]
    fn test_normalized_image() {
        let map = dense_map();
        let image = map.normalized_image(1, Aggregate::Mean).unwrap();
        assert_eq!(image.dims(), (10, 12));
        assert!(image.data().iter().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(image.get(0, 4), Some(&1.0));
        assert_eq!(image.get(9, 4), Some(&0.0));

        let half = map.normalized_image(2, Aggregate::Max).unwrap();
        assert_eq!(half.dims(), (5, 6));
        assert!(half.data().iter().all(|&v| v > 0.0));

        assert!(matches!(
            map.normalized_image(11, Aggregate::Mean),
            Err(UnrollError::EmptyRaster { factor: 11, .. })
        ));
    }

    #[test]
    fn test_multiscale_fills_holes() {
        let (points, relief) = grid_points(10, 12, |h, a| (h == 5 || h == 6) && a == 5);
        let map = UnrolledMap::new(points, relief).unwrap();

        let fixed = map.normalized_image(1, Aggregate::Mean).unwrap();
        assert_eq!(fixed.get(4, 5), Some(&0.0));

        let multi = map.normalized_image_multiscale(&UnrollParams::default()).unwrap();
        assert_eq!(multi.dims(), map.dims());
        let filled = *multi.get(4, 5).unwrap();
        assert!(filled > 0.0 && filled < 1.0);

        let same = map.relief_image(&UnrollParams::default()).unwrap();
        assert_eq!(same, multi);
        let fixed_again = map.relief_image(&UnrollParams::fixed(1)).unwrap();
        assert_eq!(fixed_again, fixed);
    }

    #[test]
    fn test_ground_truth_image() {
        let map = dense_map();
        // Point 0 is at height 0 and angle 0.
        let gt = map.ground_truth_image(&[0]).unwrap();
        assert_eq!(gt.dims(), map.dims());
        assert_eq!(gt.get(0, 0), Some(&255));
        assert_eq!(gt.data().iter().filter(|&&v| v == 255).count(), 1);

        assert!(matches!(
            map.ground_truth_image(&[0, map.len()]),
            Err(UnrollError::PointIndexOutOfRange { .. })
        ));
    }
}
