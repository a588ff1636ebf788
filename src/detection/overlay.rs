use std::path::Path;

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut, draw_line_segment_mut};

use crate::detection::preprocessing::PixelSource;
use crate::models::{MeasurementFrame, Point2, ThicknessSample};

const AXIS_COLOR: Rgb<u8> = Rgb([0, 160, 255]);
const CENTER_COLOR: Rgb<u8> = Rgb([255, 200, 0]);
const EDGE_COLOR: Rgb<u8> = Rgb([255, 40, 40]);

fn as_tuple(p: Point2) -> (f32, f32) {
    (p.x, p.y)
}

fn as_pixel(p: Point2) -> (i32, i32) {
    (p.x.round() as i32, p.y.round() as i32)
}

/// Grayscale copy of the source with the measurement frame drawn on top:
/// the MCP→PIP axis, the sampling center, and the detected edges if any.
pub fn render_overlay<P: PixelSource + ?Sized>(
    src: &P,
    frame: &MeasurementFrame,
    sample: Option<&ThicknessSample>,
) -> RgbImage {
    let (w, h) = src.dimensions();
    let mut canvas = RgbImage::from_fn(w, h, |x, y| {
        let v = src.gray(x, y).clamp(0.0, 255.0) as u8;
        Rgb([v, v, v])
    });

    draw_line_segment_mut(&mut canvas, as_tuple(frame.mcp), as_tuple(frame.pip), AXIS_COLOR);
    draw_hollow_circle_mut(&mut canvas, as_pixel(frame.center), 6, CENTER_COLOR);

    if let Some(sample) = sample {
        draw_line_segment_mut(
            &mut canvas,
            as_tuple(sample.edge_near),
            as_tuple(sample.edge_far),
            EDGE_COLOR,
        );
        draw_filled_circle_mut(&mut canvas, as_pixel(sample.edge_near), 3, EDGE_COLOR);
        draw_filled_circle_mut(&mut canvas, as_pixel(sample.edge_far), 3, EDGE_COLOR);
    }

    canvas
}

pub fn save_overlay<P: PixelSource + ?Sized>(
    path: &Path,
    src: &P,
    frame: &MeasurementFrame,
    sample: Option<&ThicknessSample>,
) -> anyhow::Result<()> {
    render_overlay(src, frame, sample)
        .save(path)
        .map_err(|e| anyhow::anyhow!("Failed to save debug overlay {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UnitVector2;
    use image::{GrayImage, Luma};

    #[test]
    fn overlay_marks_center_and_edges() {
        let img = GrayImage::from_pixel(60, 60, Luma([0u8]));
        let frame = MeasurementFrame {
            center: Point2::new(30.0, 30.0),
            normal: UnitVector2::normalize(1.0, 0.0).unwrap(),
            axis_length: 40.0,
            mcp: Point2::new(30.0, 50.0),
            pip: Point2::new(30.0, 10.0),
        };
        let sample = ThicknessSample {
            thickness_px: 20.0,
            edge_near: Point2::new(20.0, 30.0),
            edge_far: Point2::new(40.0, 30.0),
        };

        let canvas = render_overlay(&img, &frame, Some(&sample));
        assert_eq!(canvas.dimensions(), (60, 60));
        assert_eq!(*canvas.get_pixel(40, 30), EDGE_COLOR);
        assert_eq!(*canvas.get_pixel(30, 45), AXIS_COLOR);
        assert_eq!(*canvas.get_pixel(0, 0), Rgb([0, 0, 0]));
    }
}
