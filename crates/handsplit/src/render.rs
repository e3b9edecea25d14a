//! Drawing hand landmarks onto canvases.

use crate::canvas::Canvas;
use crate::image::Resolution;
use crate::landmark::{Detection, Landmark};
use crate::side::Side;

/// Default radius of the circle drawn at each landmark, in canvas pixels.
pub const DEFAULT_MARKER_RADIUS: f32 = 5.0;

/// Linearly maps a coordinate from an axis `from` pixels long onto one `to` pixels long.
///
/// Returns `value` unchanged if both lengths are equal, or if `from` is zero.
pub fn rescale(value: f32, from: u32, to: u32) -> f32 {
    if from == to || from == 0 {
        return value;
    }
    value / from as f32 * to as f32
}

/// Draws a side's hand as a set of filled circles.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    marker_radius: f32,
    rescale_to_surface: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            marker_radius: DEFAULT_MARKER_RADIUS,
            rescale_to_surface: true,
        }
    }
}

impl Renderer {
    /// Creates a renderer.
    ///
    /// If `rescale_to_surface` is `false`, landmark coordinates are drawn as-is, which only lines
    /// up when canvas and frame have the same size.
    pub fn new(marker_radius: f32, rescale_to_surface: bool) -> Self {
        Self {
            marker_radius,
            rescale_to_surface,
        }
    }

    /// Maps a landmark from frame pixels to surface pixels.
    pub fn to_surface(&self, landmark: Landmark, frame: Resolution, surface: Resolution) -> Landmark {
        if !self.rescale_to_surface {
            return landmark;
        }
        Landmark::new(
            rescale(landmark.x, frame.width(), surface.width()),
            rescale(landmark.y, frame.height(), surface.height()),
        )
    }

    /// Draws `detection` onto `canvas` in the color of `side`.
    ///
    /// `frame` is the resolution of the image the detection was estimated on. This does not
    /// clear the canvas.
    pub fn draw_hand<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
        side: Side,
        detection: &Detection,
        frame: Resolution,
    ) {
        let surface = canvas.resolution();
        canvas.set_fill_color(side.color());
        for &lm in detection.landmarks() {
            let pos = self.to_surface(lm, frame, surface);
            canvas.fill_circle(pos.x, pos.y, self.marker_radius);
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::image::Color;

    /// Records the primitives it is asked to draw.
    struct Recorder {
        res: Resolution,
        fill: Color,
        circles: Vec<(Color, f32, f32, f32)>,
    }

    impl Recorder {
        fn new(res: Resolution) -> Self {
            Self {
                res,
                fill: Color::NULL,
                circles: Vec::new(),
            }
        }
    }

    impl Canvas for Recorder {
        fn resolution(&self) -> Resolution {
            self.res
        }

        fn clear(&mut self) {
            self.circles.clear();
        }

        fn set_fill_color(&mut self, color: Color) {
            self.fill = color;
        }

        fn fill_circle(&mut self, x: f32, y: f32, radius: f32) {
            self.circles.push((self.fill, x, y, radius));
        }
    }

    #[test]
    fn rescale_identity() {
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..1000 {
            let extent = rng.u32(0..4000);
            let value = rng.f32() * 5000.0 - 500.0;
            assert_eq!(rescale(value, extent, extent), value);
        }
    }

    #[test]
    fn rescale_linear() {
        assert_relative_eq!(rescale(100.0, 320, 640), 200.0);
        assert_relative_eq!(rescale(100.0, 240, 480), 200.0);
        assert_relative_eq!(rescale(320.0, 320, 160), 160.0);
        assert_relative_eq!(rescale(0.0, 320, 640), 0.0);
        assert_eq!(rescale(42.0, 0, 640), 42.0);
    }

    #[test]
    fn draws_rescaled_markers() {
        let renderer = Renderer::default();
        let mut canvas = Recorder::new(Resolution::new(640, 480));
        let det = Detection::from_positions([[100.0, 100.0]]);

        renderer.draw_hand(&mut canvas, Side::Left, &det, Resolution::new(320, 240));

        assert_eq!(canvas.circles.len(), 1);
        let (color, x, y, radius) = canvas.circles[0];
        assert_eq!(color, Color::BLUE);
        assert_relative_eq!(x, 200.0);
        assert_relative_eq!(y, 200.0);
        assert_eq!(radius, DEFAULT_MARKER_RADIUS);
    }

    #[test]
    fn draws_raw_markers_without_rescale() {
        let renderer = Renderer::new(3.0, false);
        let mut canvas = Recorder::new(Resolution::new(640, 480));
        let det = Detection::from_positions([[100.0, 100.0], [10.0, 20.0]]);

        renderer.draw_hand(&mut canvas, Side::Right, &det, Resolution::new(320, 240));

        assert_eq!(
            canvas.circles,
            [
                (Color::RED, 100.0, 100.0, 3.0),
                (Color::RED, 10.0, 20.0, 3.0),
            ]
        );
    }
}
