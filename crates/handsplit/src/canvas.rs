//! Drawing surfaces that hand landmarks are rendered onto.

use crate::image::{draw, Color, Image, Resolution};

/// A 2D drawing surface with a fixed pixel size.
///
/// Coordinates passed to the drawing primitives are in pixels of this surface. Drawing outside
/// of the surface is allowed and gets clipped.
pub trait Canvas {
    /// Returns the size of the surface.
    fn resolution(&self) -> Resolution;

    /// Clears the whole surface.
    fn clear(&mut self);

    /// Sets the color used by subsequent [`Canvas::fill_circle`] calls.
    fn set_fill_color(&mut self, color: Color);

    /// Draws a filled circle centered at `(x, y)`.
    fn fill_circle(&mut self, x: f32, y: f32, radius: f32);

    /// Shows everything drawn since the last call.
    ///
    /// Off-screen surfaces don't need to do anything here.
    fn present(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Returns `false` once the surface has been closed and nothing drawn to it will be seen.
    fn is_open(&self) -> bool {
        true
    }
}

impl<C: Canvas + ?Sized> Canvas for &mut C {
    fn resolution(&self) -> Resolution {
        (**self).resolution()
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn set_fill_color(&mut self, color: Color) {
        (**self).set_fill_color(color)
    }

    fn fill_circle(&mut self, x: f32, y: f32, radius: f32) {
        (**self).fill_circle(x, y, radius)
    }

    fn present(&mut self) -> anyhow::Result<()> {
        (**self).present()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}

/// Circles are never drawn larger than this, in pixels.
const MAX_RADIUS: f32 = 4096.0;

/// An off-screen [`Canvas`] backed by an [`Image`].
///
/// Clearing makes every pixel fully transparent.
#[derive(Debug, Clone)]
pub struct ImageCanvas {
    image: Image,
    fill: Color,
}

impl ImageCanvas {
    pub fn new(res: Resolution) -> Self {
        Self {
            image: Image::new(res.width(), res.height()),
            fill: Color::BLACK,
        }
    }

    /// Returns the image everything is drawn onto.
    #[inline]
    pub fn image(&self) -> &Image {
        &self.image
    }

    /// Returns whether any pixel has been drawn since the last clear.
    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(|px| px == Color::NULL)
    }
}

impl Canvas for ImageCanvas {
    fn resolution(&self) -> Resolution {
        self.image.resolution()
    }

    fn clear(&mut self) {
        self.image.clear(Color::NULL);
    }

    fn set_fill_color(&mut self, color: Color) {
        self.fill = color;
    }

    fn fill_circle(&mut self, x: f32, y: f32, radius: f32) {
        if !(x.is_finite() && y.is_finite()) {
            log::trace!("skipping circle at non-finite position ({x}, {y})");
            return;
        }
        let radius = radius.clamp(0.0, MAX_RADIUS);
        let (width, height) = (self.image.width() as f32, self.image.height() as f32);
        if x + radius < 0.0 || y + radius < 0.0 || x - radius >= width || y - radius >= height {
            return;
        }
        // Both coordinates are now within `MAX_RADIUS` of the image, so they fit in an `i32`.
        let diameter = (radius * 2.0).round() as u32 + 1;
        draw::circle(&mut self.image, x.round() as i32, y.round() as i32, diameter)
            .filled()
            .color(self.fill);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_and_clear() {
        let mut canvas = ImageCanvas::new(Resolution::new(40, 30));
        assert_eq!(canvas.resolution(), Resolution::new(40, 30));
        assert!(canvas.is_blank());

        canvas.set_fill_color(Color::BLUE);
        canvas.fill_circle(10.0, 10.0, 5.0);
        canvas.set_fill_color(Color::RED);
        canvas.fill_circle(30.4, 20.6, 5.0);

        let image = canvas.image();
        assert_eq!(image.get(10, 10), Color::BLUE);
        assert_eq!(image.get(14, 10), Color::BLUE);
        assert_eq!(image.get(30, 21), Color::RED);
        assert_eq!(image.get(20, 15), Color::NULL);

        canvas.clear();
        assert!(canvas.is_blank());
    }

    #[test]
    fn marker_size() {
        let mut canvas = ImageCanvas::new(Resolution::new(30, 30));
        canvas.set_fill_color(Color::RED);
        canvas.fill_circle(15.0, 15.0, 5.0);

        let image = canvas.image();
        assert_eq!(image.get(20, 15), Color::RED);
        assert_eq!(image.get(15, 10), Color::RED);
        assert_eq!(image.get(22, 15), Color::NULL);
        assert_eq!(image.get(15, 8), Color::NULL);
    }

    #[test]
    fn non_finite_is_ignored() {
        let mut canvas = ImageCanvas::new(Resolution::new(8, 8));
        canvas.set_fill_color(Color::RED);
        canvas.fill_circle(f32::NAN, 4.0, 5.0);
        canvas.fill_circle(4.0, f32::INFINITY, 5.0);
        assert!(canvas.is_blank());
    }

    #[test]
    fn far_off_circles_are_culled() {
        let mut canvas = ImageCanvas::new(Resolution::new(640, 480));
        canvas.set_fill_color(Color::BLUE);
        canvas.fill_circle(-1.0e30, 10.0, 5.0);
        canvas.fill_circle(1.0e30, 10.0, 5.0);
        canvas.fill_circle(10.0, -1.0e30, 5.0);
        canvas.fill_circle(10.0, 1.0e30, 5.0);
        canvas.fill_circle(-6.0, 10.0, 5.0);
        canvas.fill_circle(646.0, 10.0, 5.0);
        assert!(canvas.is_blank());

        // Circles overlapping the edge are still drawn.
        canvas.fill_circle(-3.0, 10.0, 5.0);
        assert_eq!(canvas.image().get(0, 10), Color::BLUE);
    }

    #[test]
    fn huge_radius_is_capped() {
        let mut canvas = ImageCanvas::new(Resolution::new(16, 16));
        canvas.set_fill_color(Color::RED);
        canvas.fill_circle(1.0e30, 8.0, 1.0e31);
        canvas.fill_circle(8.0, 8.0, f32::INFINITY);
        assert_eq!(canvas.image().get(8, 8), Color::RED);
        assert_eq!(canvas.image().get(0, 0), Color::RED);
    }
}
