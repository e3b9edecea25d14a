//! Axis-aligned rectangles in pixel coordinates.

use std::fmt;

/// An axis-aligned rectangle with floating-point coordinates.
///
/// Rectangles may extend past the edges of the image they refer to. Zero width or height is
/// allowed, negative sizes are not.
#[derive(Clone, Copy, PartialEq)]
pub struct Rect {
    x_center: f32,
    y_center: f32,
    width: f32,
    height: f32,
}

impl Rect {
    /// Creates a rectangle extending outwards from a center point.
    #[inline]
    pub fn from_center(x_center: f32, y_center: f32, width: f32, height: f32) -> Self {
        Self {
            x_center,
            y_center,
            width,
            height,
        }
    }

    /// Creates a rectangle extending downwards and right from a point.
    #[inline]
    pub fn from_top_left(top_left_x: f32, top_left_y: f32, width: f32, height: f32) -> Self {
        Self::from_center(
            top_left_x + width * 0.5,
            top_left_y + height * 0.5,
            width,
            height,
        )
    }

    /// Grows this rectangle by adding a margin relative to width and height.
    ///
    /// `amount` is the relative amount of the rectangle's width and height to add to each side.
    #[must_use]
    pub fn grow_rel(&self, amount: f32) -> Self {
        Self {
            width: self.width * (1.0 + 2.0 * amount),
            height: self.height * (1.0 + 2.0 * amount),
            ..*self
        }
    }

    /// Symmetrically extends one dimension of `self` so that the result has the given
    /// width-to-height ratio.
    #[must_use]
    pub fn grow_to_fit_aspect(&self, aspect: f32) -> Self {
        let target_width = self.height * aspect;
        if target_width >= self.width {
            Self {
                width: target_width,
                ..*self
            }
        } else {
            Self {
                height: self.width / aspect,
                ..*self
            }
        }
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.x_center - self.width * 0.5
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.y_center - self.height * 0.5
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.height
    }

    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.x_center, self.y_center)
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Computes the overlapping area of `self` and `other`.
    ///
    /// Returns `None` if the rectangles don't overlap.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x_min = self.x().max(other.x());
        let y_min = self.y().max(other.y());
        let x_max = (self.x() + self.width).min(other.x() + other.width);
        let y_max = (self.y() + self.height).min(other.y() + other.height);
        if x_min > x_max || y_min > y_max {
            return None;
        }

        Some(Rect::from_top_left(x_min, y_min, x_max - x_min, y_max - y_min))
    }

    /// Computes the Intersection over Union (IOU) of `self` and `other`.
    pub fn iou(&self, other: &Rect) -> f32 {
        let intersection = self.intersection(other).map_or(0.0, |rect| rect.area());
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            return 0.0;
        }
        intersection / union
    }
}

impl fmt::Debug for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect @ ({:.1},{:.1})/{:.1}x{:.1}",
            self.x(),
            self.y(),
            self.width,
            self.height
        )
    }
}
