//! Pixel buffer helpers
//!
//! A pixel buffer is a plain `[Color]` slice whose length is fixed for the
//! duration of a render pass.

use super::{Color, scalar_multiply};

/// Read a `size`-wide circular window starting at `offset` (wraps modulo N)
pub fn clone_spliced(pixels: &[Color], size: usize, offset: i64) -> Vec<Color> {
    let n = pixels.len();
    if n == 0 {
        return vec![Color::NONE; size];
    }
    (0..size)
        .map(|i| pixels[wrap(offset + i as i64, n)])
        .collect()
}

/// Write a window produced by [`clone_spliced`] back with wraparound
pub fn splice_back(pixels: &mut [Color], window: &[Color], offset: i64) {
    let n = pixels.len();
    if n == 0 {
        return;
    }
    for (i, color) in window.iter().enumerate() {
        pixels[wrap(offset + i as i64, n)] = *color;
    }
}

/// Nearest-neighbour resample to `size` samples across index range [0, N-1]
pub fn resize_clone(pixels: &[Color], size: usize) -> Vec<Color> {
    let n = pixels.len();
    if n == 0 {
        return vec![Color::NONE; size];
    }
    if size <= 1 {
        return pixels[..size.min(1)].to_vec();
    }
    let scale = (n - 1) as f64 / (size - 1) as f64;
    (0..size)
        .map(|i| pixels[((i as f64 * scale) as usize).min(n - 1)])
        .collect()
}

/// Set every pixel to `color`
pub fn fill(pixels: &mut [Color], color: Color) {
    pixels.iter_mut().for_each(|p| *p = color);
}

/// Scale every pixel (alpha included) by `scalar`
pub fn scale_fill(pixels: &mut [Color], scalar: f64) {
    for p in pixels.iter_mut() {
        *p = scalar_multiply(scalar, *p, true);
    }
}

/// Euclidean modulo of a signed index into [0, n)
#[inline]
pub fn wrap(index: i64, n: usize) -> usize {
    index.rem_euclid(n as i64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: u8) -> Vec<Color> {
        (0..n).map(|i| Color::rgb(i, 0, 0)).collect()
    }

    #[test]
    fn test_clone_spliced_wraps() {
        let pixels = ramp(5);
        let window = clone_spliced(&pixels, 4, 3);
        let reds: Vec<u8> = window.iter().map(|c| c.r).collect();
        assert_eq!(reds, vec![3, 4, 0, 1]);

        let window = clone_spliced(&pixels, 2, -1);
        assert_eq!(window[0].r, 4);
        assert_eq!(window[1].r, 0);
    }

    #[test]
    fn test_splice_back() {
        let mut pixels = ramp(5);
        splice_back(&mut pixels, &[Color::WHITE, Color::WHITE], 4);
        assert_eq!(pixels[4], Color::WHITE);
        assert_eq!(pixels[0], Color::WHITE);
        assert_eq!(pixels[1].r, 1);
    }

    #[test]
    fn test_resize_clone_endpoints() {
        let pixels = ramp(10);
        let small = resize_clone(&pixels, 4);
        let reds: Vec<u8> = small.iter().map(|c| c.r).collect();
        assert_eq!(reds, vec![0, 3, 6, 9]);

        let big = resize_clone(&ramp(2), 5);
        let reds: Vec<u8> = big.iter().map(|c| c.r).collect();
        assert_eq!(reds, vec![0, 0, 0, 0, 1]);

        assert_eq!(resize_clone(&pixels, 1).len(), 1);
        assert!(resize_clone(&pixels, 0).is_empty());
    }

    #[test]
    fn test_scale_fill() {
        let mut pixels = vec![Color::WHITE; 3];
        scale_fill(&mut pixels, 0.0);
        assert!(pixels.iter().all(|p| *p == Color::TRANSPARENT));
    }
}
