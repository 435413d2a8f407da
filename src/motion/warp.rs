//! Affine frame warping with bilinear sampling and reflective borders.

use crate::error::Result;
use crate::motion::transform::Affine2x3;
use crate::video::Frame;

/// Warp `frame` by the forward transform `m`.
///
/// Inverse-mapped: every destination pixel samples the source at
/// `m⁻¹·(x, y)` with bilinear interpolation. Samples falling outside the
/// frame mirror edge content (edge-inclusive reflection), so small
/// displacements never pull in black borders and a uniform frame warps to
/// itself exactly.
pub fn warp_affine(frame: &Frame, m: &Affine2x3) -> Result<Frame> {
    let inv = m.invert()?;
    let width = frame.width();
    let height = frame.height();

    let mut out = Frame::new_black(width, height);
    for y in 0..height {
        for x in 0..width {
            let (sx, sy) = inv.apply(x as f64, y as f64);
            out.set_pixel(x, y, sample_bilinear(frame, sx, sy));
        }
    }
    Ok(out)
}

fn sample_bilinear(frame: &Frame, sx: f64, sy: f64) -> [u8; 3] {
    let w = frame.width() as i64;
    let h = frame.height() as i64;

    let x0 = sx.floor();
    let y0 = sy.floor();
    let fx = (sx - x0) as f32;
    let fy = (sy - y0) as f32;

    let x0 = x0 as i64;
    let y0 = y0 as i64;

    let p00 = frame.get_pixel(reflect(x0, w), reflect(y0, h));
    let p10 = frame.get_pixel(reflect(x0 + 1, w), reflect(y0, h));
    let p01 = frame.get_pixel(reflect(x0, w), reflect(y0 + 1, h));
    let p11 = frame.get_pixel(reflect(x0 + 1, w), reflect(y0 + 1, h));

    let mut out = [0u8; 3];
    for c in 0..3 {
        let top = p00[c] as f32 * (1.0 - fx) + p10[c] as f32 * fx;
        let bottom = p01[c] as f32 * (1.0 - fx) + p11[c] as f32 * fx;
        out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Edge-inclusive reflection of an index into `[0, n)`
fn reflect(i: i64, n: i64) -> u32 {
    if n == 1 {
        return 0;
    }
    let period = 2 * n;
    let mut i = i.rem_euclid(period);
    if i >= n {
        i = period - 1 - i;
    }
    i as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::transform::SwayTransform;

    #[test]
    fn test_identity_warp_preserves_frame() {
        let mut frame = Frame::new_black(16, 12);
        for y in 0..12 {
            for x in 0..16 {
                frame.set_pixel(x, y, [(x * 16) as u8, (y * 20) as u8, 77]);
            }
        }

        let warped = warp_affine(&frame, &Affine2x3::identity()).unwrap();
        assert_eq!(warped, frame);
    }

    #[test]
    fn test_uniform_frame_invariant_under_any_transform() {
        let frame = Frame::new_filled(20, 15, [42, 42, 42]);
        let sway = SwayTransform {
            dx: 3.7,
            dy: -2.1,
            angle_deg: 5.0,
            scale: 1.03,
        };
        let m = sway.to_affine((10.0, 13.2));

        let warped = warp_affine(&frame, &m).unwrap();
        assert_eq!(warped, frame);
    }

    #[test]
    fn test_integer_translation_shifts_pixels() {
        let mut frame = Frame::new_black(8, 8);
        frame.set_pixel(3, 3, [255, 0, 0]);

        // Forward shift of (+2, +1): the marked pixel lands at (5, 4)
        let m = Affine2x3 {
            m: [[1.0, 0.0, 2.0], [0.0, 1.0, 1.0]],
        };
        let warped = warp_affine(&frame, &m).unwrap();
        assert_eq!(warped.get_pixel(5, 4), [255, 0, 0]);
        assert_eq!(warped.get_pixel(3, 3), [0, 0, 0]);
    }

    #[test]
    fn test_border_reflects_edge_content() {
        let mut frame = Frame::new_black(4, 4);
        frame.set_pixel(0, 0, [100, 110, 120]);

        // Shift right by 1: destination column 0 samples source x = -1,
        // which reflects onto column 0
        let m = Affine2x3 {
            m: [[1.0, 0.0, 1.0], [0.0, 1.0, 0.0]],
        };
        let warped = warp_affine(&frame, &m).unwrap();
        assert_eq!(warped.get_pixel(0, 0), [100, 110, 120]);
        assert_eq!(warped.get_pixel(1, 0), [100, 110, 120]);
    }

    #[test]
    fn test_reflect_indexing() {
        assert_eq!(reflect(-1, 5), 0);
        assert_eq!(reflect(-2, 5), 1);
        assert_eq!(reflect(0, 5), 0);
        assert_eq!(reflect(4, 5), 4);
        assert_eq!(reflect(5, 5), 4);
        assert_eq!(reflect(6, 5), 3);
        assert_eq!(reflect(9, 1), 0);
    }
}
