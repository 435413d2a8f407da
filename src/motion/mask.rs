//! Static alpha mask confining the sway effect to the lower frame region.

use crate::motion::MotionConfig;
use crate::video::Frame;

/// Single-channel f32 mask, same dimensions as the video, values in [0, 1]
///
/// Built exactly once per compositing run and shared across all frames. Rows
/// above `height * start_ratio` start at 0, rows at/below start at 1; the
/// feather blur only softens the transition band, so every column stays
/// monotonically non-decreasing from top to bottom.
pub struct AlphaMask {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl AlphaMask {
    pub fn build(width: u32, height: u32, cfg: &MotionConfig) -> Self {
        let w = width as usize;
        let h = height as usize;

        let y_start = (height as f64 * cfg.start_ratio) as usize;
        let mut data = vec![0.0f32; w * h];
        for row in data.chunks_mut(w).skip(y_start.min(h)) {
            row.fill(1.0);
        }

        if cfg.feather_px > 0 {
            let radius = cfg.feather_px as usize;
            data = gaussian_blur(&data, w, h, radius);
            for v in &mut data {
                *v = v.clamp(0.0, 1.0);
            }
        }

        Self { width, height, data }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn value(&self, x: u32, y: u32) -> f32 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Blend `warped` over `original`: `warped*alpha + original*(1-alpha)`,
    /// broadcast across the color channels and clamped to 8-bit range.
    pub fn blend(&self, warped: &Frame, original: &Frame) -> Frame {
        debug_assert_eq!(warped.width(), self.width);
        debug_assert_eq!(warped.height(), self.height);

        let mut out = Frame::new_black(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let alpha = self.value(x, y);
                let w = warped.get_pixel(x, y);
                let o = original.get_pixel(x, y);

                let mut blended = [0u8; 3];
                for c in 0..3 {
                    let v = w[c] as f32 * alpha + o[c] as f32 * (1.0 - alpha);
                    blended[c] = v.round().clamp(0.0, 255.0) as u8;
                }
                out.set_pixel(x, y, blended);
            }
        }
        out
    }
}

/// Separable Gaussian blur over an f32 plane with reflect-101 borders.
///
/// Kernel size is `2*radius + 1`; sigma follows the usual convention for an
/// auto-derived sigma: `0.3*((ksize-1)*0.5 - 1) + 0.8`.
fn gaussian_blur(src: &[f32], width: usize, height: usize, radius: usize) -> Vec<f32> {
    let kernel = gaussian_kernel(radius);
    let r = radius as i64;

    // Horizontal pass
    let mut tmp = vec![0.0f32; src.len()];
    for y in 0..height {
        let row = &src[y * width..(y + 1) * width];
        let out = &mut tmp[y * width..(y + 1) * width];
        for x in 0..width {
            let mut acc = 0.0f32;
            for (k, &weight) in kernel.iter().enumerate() {
                let sx = reflect_101(x as i64 + k as i64 - r, width as i64);
                acc += weight * row[sx];
            }
            out[x] = acc;
        }
    }

    // Vertical pass
    let mut dst = vec![0.0f32; src.len()];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0f32;
            for (k, &weight) in kernel.iter().enumerate() {
                let sy = reflect_101(y as i64 + k as i64 - r, height as i64);
                acc += weight * tmp[sy * width + x];
            }
            dst[y * width + x] = acc;
        }
    }

    dst
}

fn gaussian_kernel(radius: usize) -> Vec<f32> {
    let ksize = 2 * radius + 1;
    let sigma = 0.3 * ((ksize as f64 - 1.0) * 0.5 - 1.0) + 0.8;
    let denom = 2.0 * sigma * sigma;

    let mut weights = Vec::with_capacity(ksize);
    let mut sum = 0.0f64;
    for i in 0..ksize {
        let x = i as f64 - radius as f64;
        let w = (-x * x / denom).exp();
        weights.push(w);
        sum += w;
    }

    weights.into_iter().map(|w| (w / sum) as f32).collect()
}

/// Reflect an index into `[0, n)` without repeating the edge sample
fn reflect_101(i: i64, n: i64) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n - 1);
    let mut i = i.rem_euclid(period);
    if i >= n {
        i = period - i;
    }
    i as usize
}
