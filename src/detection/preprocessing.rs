use image::{DynamicImage, GrayImage, RgbImage};

/// Rec. 709 luma of an RGB pixel
pub fn luma(r: u8, g: u8, b: u8) -> f32 {
    0.2126 * r as f32 + 0.7152 * g as f32 + 0.0722 * b as f32
}

/// Read access to the current video frame as luma values.
///
/// The pipeline only ever reads through this trait, so any surface (a decoded
/// frame, a synthetic test image, a camera buffer) can back it.
pub trait PixelSource {
    fn dimensions(&self) -> (u32, u32);

    /// Luma at an in-bounds integer pixel
    fn gray(&self, x: u32, y: u32) -> f32;

    /// Mean luma of the `(2·half + 1)²` patch around the rounded position,
    /// with the patch shifted to stay inside the image.
    fn patch_gray(&self, x: f32, y: f32, half: u32) -> Option<f32> {
        let (w, h) = self.dimensions();
        let size = 2 * half + 1;
        if w < size || h < size || !x.is_finite() || !y.is_finite() {
            return None;
        }

        let xi = (x.round() as i64).clamp(0, w as i64 - 1);
        let yi = (y.round() as i64).clamp(0, h as i64 - 1);
        let x0 = (xi - half as i64).clamp(0, (w - size) as i64) as u32;
        let y0 = (yi - half as i64).clamp(0, (h - size) as i64) as u32;

        let mut sum = 0.0;
        for py in y0..y0 + size {
            for px in x0..x0 + size {
                sum += self.gray(px, py);
            }
        }
        Some(sum / (size * size) as f32)
    }
}

impl PixelSource for RgbImage {
    fn dimensions(&self) -> (u32, u32) {
        RgbImage::dimensions(self)
    }

    fn gray(&self, x: u32, y: u32) -> f32 {
        let p = self.get_pixel(x, y);
        luma(p[0], p[1], p[2])
    }
}

impl PixelSource for GrayImage {
    fn dimensions(&self) -> (u32, u32) {
        GrayImage::dimensions(self)
    }

    fn gray(&self, x: u32, y: u32) -> f32 {
        self.get_pixel(x, y)[0] as f32
    }
}

/// Convert a decoded frame into the RGB scratch buffer the pipeline samples
pub fn to_scratch(img: &DynamicImage) -> RgbImage {
    img.to_rgb8()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn luma_weights_sum_to_white() {
        assert!((luma(255, 255, 255) - 255.0).abs() < 1e-3);
        assert!(luma(0, 255, 0) > luma(255, 0, 0));
    }

    #[test]
    fn patch_is_clamped_at_borders() {
        let mut img = GrayImage::from_pixel(5, 5, Luma([0u8]));
        img.put_pixel(0, 0, Luma([90u8]));
        // Patch at the corner shifts to cover (0..3, 0..3)
        let v = img.patch_gray(-4.0, -4.0, 1).unwrap();
        assert!((v - 10.0).abs() < 1e-4);
    }

    #[test]
    fn rgb_source_uses_luma() {
        let img = RgbImage::from_pixel(4, 4, Rgb([255u8, 0, 0]));
        assert!((img.gray(1, 1) - 0.2126 * 255.0).abs() < 1e-3);
    }
}
