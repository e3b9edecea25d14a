//! On-screen canvases.

use minifb::{Key, Window, WindowOptions};

use crate::canvas::{Canvas, ImageCanvas};
use crate::image::{Color, Resolution};

/// A [`Canvas`] shown in its own window.
///
/// Drawing happens off-screen; [`Canvas::present`] copies the result into the window. The canvas
/// counts as closed once the window is closed or Escape is pressed in it.
pub struct WindowCanvas {
    canvas: ImageCanvas,
    window: Window,
    buffer: Vec<u32>,
}

impl WindowCanvas {
    /// Opens a non-resizable window with a drawing area of `res`.
    pub fn open(title: &str, res: Resolution) -> anyhow::Result<Self> {
        let (width, height) = (res.width() as usize, res.height() as usize);
        let window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;
        log::debug!("opened window '{title}' ({res})");

        Ok(Self {
            canvas: ImageCanvas::new(res),
            window,
            buffer: vec![0; width * height],
        })
    }
}

impl Canvas for WindowCanvas {
    fn resolution(&self) -> Resolution {
        self.canvas.resolution()
    }

    fn clear(&mut self) {
        self.canvas.clear();
    }

    fn set_fill_color(&mut self, color: Color) {
        self.canvas.set_fill_color(color);
    }

    fn fill_circle(&mut self, x: f32, y: f32, radius: f32) {
        self.canvas.fill_circle(x, y, radius);
    }

    fn present(&mut self) -> anyhow::Result<()> {
        let res = self.canvas.resolution();
        for (dest, px) in self.buffer.iter_mut().zip(self.canvas.image().pixels()) {
            *dest = px.to_0rgb();
        }
        self.window.update_with_buffer(
            &self.buffer,
            res.width() as usize,
            res.height() as usize,
        )?;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(Key::Escape)
    }
}
