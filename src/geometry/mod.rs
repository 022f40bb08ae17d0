//! Perspective transform derivation for keystone correction
//!
//! A job's four corner points are mapped onto the destination rectangle by a
//! 3x3 homography, solved once per job and reused for every frame.

pub mod warp;

use crate::domain::model::QuadPoints;
use crate::error::{KeyclipError, KeyclipResult};

/// Projective mapping between the source quad and the destination rectangle.
///
/// `forward` maps source points onto the rectangle, `inverse` maps
/// destination pixels back into the source for sampling.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveTransform {
    forward: [[f64; 3]; 3],
    inverse: [[f64; 3]; 3],
    dest_width: u32,
    dest_height: u32,
}

impl PerspectiveTransform {
    /// Derive the homography taking `quad` (TL, TR, BL, BR) onto the
    /// rectangle `(0,0)-(dest_width,dest_height)`.
    ///
    /// Fails with `DegenerateGeometry` when any three corners are collinear
    /// or the correspondence system is singular.
    pub fn from_quad(quad: &QuadPoints, dest_width: u32, dest_height: u32) -> KeyclipResult<Self> {
        if let Some(reason) = quad.degenerate_reason() {
            return Err(KeyclipError::DegenerateGeometry { message: reason });
        }

        let (w, h) = (f64::from(dest_width), f64::from(dest_height));
        let src = quad.as_array();
        let dst = [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)];

        // Eight equations in h11..h32 with h33 fixed at 1:
        //   u = (h11 x + h12 y + h13) / (h31 x + h32 y + 1)
        //   v = (h21 x + h22 y + h23) / (h31 x + h32 y + 1)
        let mut system = [[0.0f64; 9]; 8];
        for (i, (p, &(u, v))) in src.iter().zip(dst.iter()).enumerate() {
            system[2 * i] = [p.x, p.y, 1.0, 0.0, 0.0, 0.0, -u * p.x, -u * p.y, u];
            system[2 * i + 1] = [0.0, 0.0, 0.0, p.x, p.y, 1.0, -v * p.x, -v * p.y, v];
        }

        let coeffs = solve_linear_8(&mut system).ok_or_else(|| {
            KeyclipError::DegenerateGeometry {
                message: "corner correspondence system is singular".into(),
            }
        })?;

        let forward = [
            [coeffs[0], coeffs[1], coeffs[2]],
            [coeffs[3], coeffs[4], coeffs[5]],
            [coeffs[6], coeffs[7], 1.0],
        ];
        let inverse = invert_3x3(&forward).ok_or_else(|| KeyclipError::DegenerateGeometry {
            message: "perspective matrix is not invertible".into(),
        })?;

        Ok(Self {
            forward,
            inverse,
            dest_width,
            dest_height,
        })
    }

    pub fn dest_width(&self) -> u32 {
        self.dest_width
    }

    pub fn dest_height(&self) -> u32 {
        self.dest_height
    }

    /// Map a source point onto the destination rectangle
    pub fn project(&self, x: f64, y: f64) -> (f64, f64) {
        apply(&self.forward, x, y)
    }

    /// Map a destination pixel back to its source pre-image
    pub fn project_inverse(&self, x: f64, y: f64) -> (f64, f64) {
        apply(&self.inverse, x, y)
    }
}

fn apply(m: &[[f64; 3]; 3], x: f64, y: f64) -> (f64, f64) {
    let w = m[2][0] * x + m[2][1] * y + m[2][2];
    // Points at infinity project nowhere useful; collapse them far outside
    // any frame so sampling treats them as out of bounds.
    if w.abs() < 1e-12 {
        return (f64::MIN, f64::MIN);
    }
    (
        (m[0][0] * x + m[0][1] * y + m[0][2]) / w,
        (m[1][0] * x + m[1][1] * y + m[1][2]) / w,
    )
}

/// Gaussian elimination with partial pivoting over an 8x8 system with an
/// augmented column. Returns `None` when a pivot collapses.
fn solve_linear_8(system: &mut [[f64; 9]; 8]) -> Option<[f64; 8]> {
    for col in 0..8 {
        let pivot_row = (col..8).max_by(|&a, &b| {
            system[a][col]
                .abs()
                .partial_cmp(&system[b][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if system[pivot_row][col].abs() < 1e-10 {
            return None;
        }
        system.swap(col, pivot_row);

        let pivot = system[col][col];
        for row in 0..8 {
            if row == col {
                continue;
            }
            let factor = system[row][col] / pivot;
            if factor == 0.0 {
                continue;
            }
            for k in col..9 {
                system[row][k] -= factor * system[col][k];
            }
        }
    }

    let mut out = [0.0f64; 8];
    for i in 0..8 {
        out[i] = system[i][8] / system[i][i];
    }
    Some(out)
}

fn invert_3x3(m: &[[f64; 3]; 3]) -> Option<[[f64; 3]; 3]> {
    let det = m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0]);
    if det.abs() < 1e-12 {
        return None;
    }
    let inv_det = 1.0 / det;
    Some([
        [
            (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det,
            (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det,
            (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det,
        ],
        [
            (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det,
            (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det,
            (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det,
        ],
        [
            (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det,
            (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det,
            (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det,
        ],
    ])
}
