use std::{path::Path, sync::Arc};

use anyhow::bail;
use tract_onnx::prelude::{tvec, TValue, Tensor};

use crate::error::LoopError;
use crate::image::{Image, Rect, Resolution};
use crate::landmark::{Detection, Landmark, NUM_LANDMARKS};
use crate::timer::Timer;

use super::crop::{crop_to_nchw, unproject};
use super::{CropLandmarker, Model};

/// Default minimum hand presence score for a hand to be reported.
pub const DEFAULT_PRESENCE_THRESHOLD: f32 = 0.5;

/// A MediaPipe-style hand landmark network.
///
/// The network must take a single `[1, 3, H, W]` RGB image with channel values in `0.0..=1.0`, and
/// produce (at least) a `[1, 63]` tensor of screen landmarks (X, Y, Z per landmark, in input
/// pixels) followed by a `[1, 1]` hand presence score.
///
/// The network expects a crop containing a single hand, so it is driven by a palm detector in a
/// [`HandPipeline`][super::HandPipeline].
pub struct LandmarkNetwork {
    model: Model,
    input_res: Resolution,
    presence_threshold: f32,
    t_infer: Timer,
}

impl LandmarkNetwork {
    /// Loads a network from an `.onnx` file.
    ///
    /// Failures are reported as [`LoopError::ModelLoad`].
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        Self::load_impl(path).map_err(|e| {
            LoopError::ModelLoad {
                path: path.to_path_buf(),
                reason: format!("{e:#}"),
            }
            .into()
        })
    }

    fn load_impl(path: &Path) -> anyhow::Result<Self> {
        let (model, input_res) = super::load_model(path, "hand landmark")?;
        log::debug!(
            "loaded hand landmark network from {} (input {})",
            path.display(),
            input_res,
        );

        Ok(Self {
            model,
            input_res,
            presence_threshold: DEFAULT_PRESENCE_THRESHOLD,
            t_infer: Timer::new("landmark infer"),
        })
    }

    /// Sets the minimum presence score a hand needs to be reported.
    pub fn presence_threshold(self, threshold: f32) -> Self {
        Self {
            presence_threshold: threshold,
            ..self
        }
    }
}

impl CropLandmarker for LandmarkNetwork {
    fn landmarks(&mut self, frame: &Image, roi: Rect) -> anyhow::Result<Option<Detection>> {
        let input = crop_to_nchw(frame, roi, self.input_res);
        let input = Tensor::from_shape(
            &[
                1,
                3,
                self.input_res.height() as usize,
                self.input_res.width() as usize,
            ],
            &input,
        )?;
        let outputs = self
            .t_infer
            .time(|| self.model.run(tvec![TValue::from_const(Arc::new(input))]))?;

        if outputs.len() < 2 {
            bail!(
                "hand landmark network has {} outputs, expected at least 2",
                outputs.len()
            );
        }
        let screen_landmarks = outputs[0].as_slice::<f32>()?;
        let presence = outputs[1].as_slice::<f32>()?;
        if screen_landmarks.len() != NUM_LANDMARKS * 3 || presence.len() != 1 {
            bail!(
                "unexpected hand landmark network output shapes {:?} and {:?}",
                outputs[0].shape(),
                outputs[1].shape(),
            );
        }

        let presence = presence[0];
        if presence < self.presence_threshold {
            log::trace!("no hand in {roi:?} (presence {presence:.2})");
            return Ok(None);
        }

        let landmarks = screen_landmarks.chunks_exact(3).map(|xyz| {
            let (x, y) = unproject(&roi, self.input_res, xyz[0], xyz[1]);
            Landmark::new(x, y)
        });
        Ok(Some(Detection::new(landmarks).with_confidence(presence)))
    }

    fn timers(&self) -> Vec<&Timer> {
        vec![&self.t_infer]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_errors() {
        for path in ["model.tflite", "does/not/exist.onnx"] {
            let err = LandmarkNetwork::load(path).err().unwrap();
            assert!(matches!(
                err.downcast_ref::<LoopError>(),
                Some(LoopError::ModelLoad { .. })
            ));
        }
    }
}
