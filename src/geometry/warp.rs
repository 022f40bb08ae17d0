//! Per-frame application of a perspective transform
//!
//! Sampling is fixed to bilinear for reproducibility. Destination pixels
//! whose pre-image falls outside the source frame are filled with black.

use super::PerspectiveTransform;
use crate::frames::FrameBuffer;

/// Produce a corrected copy of `src`; the input frame is never mutated.
///
/// Every destination pixel `(x, y)` is mapped through the inverse transform
/// and the source is sampled bilinearly at the pre-image.
pub fn warp_frame(transform: &PerspectiveTransform, src: &FrameBuffer) -> FrameBuffer {
    let dest_w = transform.dest_width();
    let dest_h = transform.dest_height();
    let mut out = FrameBuffer::black(dest_w, dest_h);

    for y in 0..dest_h {
        for x in 0..dest_w {
            let (sx, sy) = transform.project_inverse(f64::from(x), f64::from(y));
            if let Some(rgb) = sample_bilinear(src, sx, sy) {
                out.put_pixel(x, y, rgb);
            }
        }
    }
    out
}

/// Bilinear sample at fractional source coordinates; `None` outside the
/// sampleable area `[0, w-1] x [0, h-1]`.
fn sample_bilinear(frame: &FrameBuffer, sx: f64, sy: f64) -> Option<[u8; 3]> {
    let max_x = f64::from(frame.width - 1);
    let max_y = f64::from(frame.height - 1);
    if !(0.0..=max_x).contains(&sx) || !(0.0..=max_y).contains(&sy) {
        return None;
    }

    let x0 = sx.floor() as u32;
    let y0 = sy.floor() as u32;
    let x1 = (x0 + 1).min(frame.width - 1);
    let y1 = (y0 + 1).min(frame.height - 1);
    let fx = sx - f64::from(x0);
    let fy = sy - f64::from(y0);

    let p00 = frame.pixel(x0, y0);
    let p10 = frame.pixel(x1, y0);
    let p01 = frame.pixel(x0, y1);
    let p11 = frame.pixel(x1, y1);

    let mut rgb = [0u8; 3];
    for c in 0..3 {
        let top = f64::from(p00[c]) * (1.0 - fx) + f64::from(p10[c]) * fx;
        let bottom = f64::from(p01[c]) * (1.0 - fx) + f64::from(p11[c]) * fx;
        rgb[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Some(rgb)
}
