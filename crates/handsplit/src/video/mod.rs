//! Frame sources.

pub mod webcam;

use std::{collections::VecDeque, path::Path};

use anyhow::Context;

use crate::error::LoopError;
use crate::image::Image;
use crate::timer::Timer;

/// Something that produces a stream of camera frames.
pub trait FrameSource {
    /// Returns the most recent frame.
    ///
    /// May block until a frame is available. Finite sources return [`LoopError::EndOfStream`]
    /// once exhausted.
    fn read(&mut self) -> anyhow::Result<Image>;

    /// Returns the profiling timers of this source, for inclusion in FPS logs.
    fn timers(&self) -> Vec<&Timer> {
        Vec::new()
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read(&mut self) -> anyhow::Result<Image> {
        (**self).read()
    }

    fn timers(&self) -> Vec<&Timer> {
        (**self).timers()
    }
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn read(&mut self) -> anyhow::Result<Image> {
        (**self).read()
    }

    fn timers(&self) -> Vec<&Timer> {
        (**self).timers()
    }
}

/// Serves the same image as every frame.
pub struct StillImage {
    image: Image,
}

impl StillImage {
    pub fn new(image: Image) -> Self {
        Self { image }
    }

    /// Loads the image to serve from a `png` or `jpeg` file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let image = Image::load(path)
            .with_context(|| format!("failed to load input image '{}'", path.display()))?;
        log::info!("serving still image {} ({})", path.display(), image.resolution());
        Ok(Self::new(image))
    }
}

impl FrameSource for StillImage {
    fn read(&mut self) -> anyhow::Result<Image> {
        Ok(self.image.clone())
    }
}

/// Serves a fixed list of frames once, then reports [`LoopError::EndOfStream`].
pub struct FrameSequence {
    frames: VecDeque<Image>,
}

impl FrameSequence {
    pub fn new<I: IntoIterator<Item = Image>>(frames: I) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Returns the number of frames left.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for FrameSequence {
    fn read(&mut self) -> anyhow::Result<Image> {
        self.frames
            .pop_front()
            .ok_or_else(|| LoopError::EndOfStream.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn still_image_repeats() {
        let mut source = StillImage::new(Image::new(3, 2));
        for _ in 0..3 {
            assert_eq!(source.read().unwrap().width(), 3);
        }
    }

    #[test]
    fn sequence_ends() {
        let mut source = FrameSequence::new([Image::new(1, 1), Image::new(2, 2)]);
        assert_eq!(source.remaining(), 2);
        assert_eq!(source.read().unwrap().width(), 1);
        assert_eq!(source.read().unwrap().width(), 2);

        let err = source.read().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LoopError>(),
            Some(LoopError::EndOfStream)
        ));
    }

    #[test]
    fn missing_still_image() {
        assert!(StillImage::load("does/not/exist.png").is_err());
        assert!(StillImage::load("wrong-extension.gif").is_err());
    }
}
