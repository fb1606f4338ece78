//! # Perspective warping
//!
//! Rectifies camera-plane masks into the rover-aligned top-down plane using a fixed homography,
//! computed once from a pair of calibration quads.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Matrix3, MatrixN, Point2, Vector3, VectorN, U8};
use ndarray::Array2;

use super::{Mask, PerError};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Smallest triangle area (in square pixels) any three corners of a calibration quad may span.
const MIN_CORNER_AREA_PX2: f64 = 1e-6;

/// Largest allowed error when reprojecting the calibration corners through the solved homography.
const MAX_REPROJ_ERROR_PX: f64 = 1e-6;

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Four corners of a quadrilateral, each as `[x, y]` in pixels, x along image columns and y along
/// image rows.
pub type Quad = [[f64; 2]; 4];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Warps camera-plane masks into the top-down plane.
#[derive(Debug, Clone)]
pub struct PerspectiveWarper {
    /// Camera plane to top-down plane
    fwd: Matrix3<f64>,

    /// Top-down plane to camera plane, used for resampling
    inv: Matrix3<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PerspectiveWarper {
    /// Solve the homography which maps each `src` corner onto the matching `dst` corner.
    ///
    /// Fails if either quad is degenerate (three corners on a line) or the resulting transform
    /// cannot be inverted.
    pub fn from_quads(src: &Quad, dst: &Quad) -> Result<Self, PerError> {
        if is_degenerate(src) || is_degenerate(dst) {
            return Err(PerError::DegenerateCalibration);
        }

        // Each correspondence gives two rows of the 8x8 system A h = b, with h_33 fixed at 1.
        let mut a = MatrixN::<f64, U8>::zeros();
        let mut b = VectorN::<f64, U8>::zeros();

        for (i, (s, d)) in src.iter().zip(dst.iter()).enumerate() {
            let (x, y) = (s[0], s[1]);
            let (u, v) = (d[0], d[1]);

            let r = 2 * i;
            a[(r, 0)] = x;
            a[(r, 1)] = y;
            a[(r, 2)] = 1.0;
            a[(r, 6)] = -u * x;
            a[(r, 7)] = -u * y;
            b[r] = u;

            a[(r + 1, 3)] = x;
            a[(r + 1, 4)] = y;
            a[(r + 1, 5)] = 1.0;
            a[(r + 1, 6)] = -v * x;
            a[(r + 1, 7)] = -v * y;
            b[r + 1] = v;
        }

        let h = a.lu().solve(&b).ok_or(PerError::DegenerateCalibration)?;

        if h.iter().any(|v| !v.is_finite()) {
            return Err(PerError::DegenerateCalibration);
        }

        let fwd = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0);
        let inv = fwd.try_inverse().ok_or(PerError::DegenerateCalibration)?;

        let warper = Self { fwd, inv };

        // Numerically poor solutions show up as corners that don't land where they should
        for (s, d) in src.iter().zip(dst.iter()) {
            let tol = MAX_REPROJ_ERROR_PX * (1.0 + d[0].abs() + d[1].abs());
            match warper.project(&Point2::new(s[0], s[1])) {
                Some(p) if (p - Point2::new(d[0], d[1])).norm() < tol => (),
                _ => return Err(PerError::DegenerateCalibration),
            }
        }

        Ok(warper)
    }

    /// The camera-plane to top-down homography.
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.fwd
    }

    /// Project a camera-plane point into the top-down plane. Returns `None` for points on the
    /// horizon line, which have no finite projection.
    pub fn project(&self, point: &Point2<f64>) -> Option<Point2<f64>> {
        apply(&self.fwd, point)
    }

    /// Warp a camera-plane mask into the top-down plane, keeping the same dimensions.
    ///
    /// Each output pixel takes the value of the nearest input pixel under the inverse transform, so
    /// the result stays strictly binary. Output pixels which map outside the input are empty.
    pub fn warp(&self, mask: &Mask) -> Mask {
        let (rows, cols) = mask.dim();

        Array2::from_shape_fn((rows, cols), |(row, col)| {
            let src = match apply(&self.inv, &Point2::new(col as f64, row as f64)) {
                Some(p) => p,
                None => return false,
            };

            let (src_col, src_row) = (src.x.round(), src.y.round());

            if src_col < 0.0 || src_row < 0.0 || src_col >= cols as f64 || src_row >= rows as f64 {
                return false;
            }

            mask[[src_row as usize, src_col as usize]]
        })
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn apply(m: &Matrix3<f64>, point: &Point2<f64>) -> Option<Point2<f64>> {
    let p = m * Vector3::new(point.x, point.y, 1.0);

    if p.z.abs() < std::f64::EPSILON {
        return None;
    }

    Some(Point2::new(p.x / p.z, p.y / p.z))
}

/// True if any three corners of the quad are (nearly) collinear.
fn is_degenerate(quad: &Quad) -> bool {
    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];

    TRIPLES.iter().any(|t| {
        let (a, b, c) = (quad[t[0]], quad[t[1]], quad[t[2]]);
        let area = 0.5 * ((b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1])).abs();
        area < MIN_CORNER_AREA_PX2
    })
}

#[cfg(test)]
mod test {
    use super::*;

    const SRC: Quad = [[14.0, 140.0], [301.0, 140.0], [200.0, 96.0], [118.0, 96.0]];
    const DST: Quad = [[155.0, 160.0], [165.0, 160.0], [165.0, 150.0], [155.0, 150.0]];

    #[test]
    fn test_corners_map() {
        let warper = PerspectiveWarper::from_quads(&SRC, &DST).unwrap();

        for (s, d) in SRC.iter().zip(DST.iter()) {
            let p = warper.project(&Point2::new(s[0], s[1])).unwrap();
            assert!((p.x - d[0]).abs() < 1e-6);
            assert!((p.y - d[1]).abs() < 1e-6);
        }

        // Normalised so the last element is one, and the matrix alone maps the corners
        let h = warper.matrix();
        assert_eq!(h[(2, 2)], 1.0);

        for (s, d) in SRC.iter().zip(DST.iter()) {
            let p = h * Vector3::new(s[0], s[1], 1.0);
            assert!((p.x / p.z - d[0]).abs() < 1e-6);
            assert!((p.y / p.z - d[1]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_identity_warp() {
        let quad = [[0.0, 0.0], [9.0, 0.0], [9.0, 7.0], [0.0, 7.0]];
        let warper = PerspectiveWarper::from_quads(&quad, &quad).unwrap();

        let mut mask = Mask::from_elem((8, 10), false);
        mask[[2, 3]] = true;
        mask[[7, 9]] = true;
        mask[[0, 0]] = true;

        assert_eq!(warper.warp(&mask), mask);
    }

    #[test]
    fn test_translation_warp() {
        let src = [[0.0, 0.0], [9.0, 0.0], [9.0, 7.0], [0.0, 7.0]];
        let dst = [[2.0, 1.0], [11.0, 1.0], [11.0, 8.0], [2.0, 8.0]];
        let warper = PerspectiveWarper::from_quads(&src, &dst).unwrap();

        let mut mask = Mask::from_elem((10, 12), false);
        mask[[3, 4]] = true;
        mask[[9, 11]] = true;

        let warped = warper.warp(&mask);

        assert!(warped[[4, 6]]);
        assert_eq!(warped.iter().filter(|&&v| v).count(), 1);
    }

    #[test]
    fn test_degenerate() {
        let collinear = [[0.0, 0.0], [5.0, 0.0], [10.0, 0.0], [0.0, 10.0]];
        assert!(matches!(
            PerspectiveWarper::from_quads(&collinear, &DST),
            Err(PerError::DegenerateCalibration)
        ));

        let repeated = [[14.0, 140.0], [14.0, 140.0], [200.0, 96.0], [118.0, 96.0]];
        assert!(matches!(
            PerspectiveWarper::from_quads(&SRC, &repeated),
            Err(PerError::DegenerateCalibration)
        ));
    }
}
