//! Mapping between frame regions and network inputs.

use crate::image::{Image, Rect, Resolution};

/// Samples the `roi` region of `image` into planar RGB data of size `res`, with channel values in
/// `0.0..=1.0`.
///
/// Parts of `roi` outside of `image` are filled with black.
pub(crate) fn crop_to_nchw(image: &Image, roi: Rect, res: Resolution) -> Vec<f32> {
    let (w, h) = (res.width() as usize, res.height() as usize);
    let mut data = vec![0.0; 3 * w * h];
    if image.resolution().is_empty() {
        return data;
    }

    let (plane_r, rest) = data.split_at_mut(w * h);
    let (plane_g, plane_b) = rest.split_at_mut(w * h);
    let sx = roi.width() / w as f32;
    let sy = roi.height() / h as f32;
    for y in 0..h {
        let src_y = (roi.y() + (y as f32 + 0.5) * sy).floor();
        if src_y < 0.0 || src_y >= image.height() as f32 {
            continue;
        }
        for x in 0..w {
            let src_x = (roi.x() + (x as f32 + 0.5) * sx).floor();
            if src_x < 0.0 || src_x >= image.width() as f32 {
                continue;
            }
            let color = image.get(src_x as u32, src_y as u32);
            let i = y * w + x;
            plane_r[i] = f32::from(color.r()) / 255.0;
            plane_g[i] = f32::from(color.g()) / 255.0;
            plane_b[i] = f32::from(color.b()) / 255.0;
        }
    }
    data
}

/// Maps a point from network input pixels back into the frame region `roi` was cropped from.
pub(crate) fn unproject(roi: &Rect, res: Resolution, x: f32, y: f32) -> (f32, f32) {
    (
        roi.x() + x * roi.width() / res.width() as f32,
        roi.y() + y * roi.height() / res.height() as f32,
    )
}

/// Returns the region of `image` passed to a network with input size `res`.
///
/// The whole image is used, padded on two sides to match the aspect ratio of `res`.
pub(crate) fn letterbox(image: &Image, res: Resolution) -> Rect {
    let full = Rect::from_top_left(0.0, 0.0, image.width() as f32, image.height() as f32);
    full.grow_to_fit_aspect(res.width() as f32 / res.height() as f32)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::image::Color;

    #[test]
    fn sample_full_image() {
        let mut image = Image::new(4, 2);
        image.set(0, 0, Color::RED);
        image.set(3, 1, Color::WHITE);

        let roi = Rect::from_top_left(0.0, 0.0, 4.0, 2.0);
        let data = crop_to_nchw(&image, roi, Resolution::new(2, 1));
        // Planes are R, G, B, each 2x1. The sampled pixels are (1, 1) and (3, 1).
        assert_eq!(data, [0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);

        let data = crop_to_nchw(&image, roi, Resolution::new(4, 2));
        assert_eq!(data[0], 1.0);
        assert_eq!(data[8], 0.0);
        assert_eq!(data[7], 1.0);
        assert_eq!(data[8 + 7], 1.0);
        assert_eq!(data[16 + 7], 1.0);
    }

    #[test]
    fn outside_is_black() {
        let mut image = Image::new(2, 2);
        image.clear(Color::WHITE);

        // The right half of the crop is past the image edge.
        let roi = Rect::from_top_left(0.0, 0.0, 4.0, 2.0);
        let data = crop_to_nchw(&image, roi, Resolution::new(2, 1));
        assert_eq!(data, [1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn letterbox_and_unproject() {
        let image = Image::new(320, 240);
        let roi = letterbox(&image, Resolution::new(192, 192));
        assert_relative_eq!(roi.x(), 0.0);
        assert_relative_eq!(roi.y(), -40.0);
        assert_relative_eq!(roi.width(), 320.0);
        assert_relative_eq!(roi.height(), 320.0);

        let (x, y) = unproject(&roi, Resolution::new(192, 192), 96.0, 96.0);
        assert_relative_eq!(x, 160.0);
        assert_relative_eq!(y, 120.0);
        let (x, y) = unproject(&roi, Resolution::new(192, 192), 0.0, 0.0);
        assert_relative_eq!(x, 0.0);
        assert_relative_eq!(y, -40.0);
    }
}
