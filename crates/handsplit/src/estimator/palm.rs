//! Palm detection.

use std::{path::Path, sync::Arc};

use anyhow::{bail, Context};
use tract_onnx::prelude::{tvec, TValue, Tensor};

use super::crop::{crop_to_nchw, letterbox, unproject};
use super::nms::NonMaxSuppression;
use super::{Model, PalmDetector};
use crate::error::LoopError;
use crate::image::{Image, Rect, Resolution};
use crate::timer::Timer;

/// Default minimum palm score for a palm to be reported.
pub const DEFAULT_PALM_THRESHOLD: f32 = 0.5;

/// Number of values per anchor in the box output: center, size, and 7 keypoints.
const BOX_PARAMS: usize = 18;

/// A detected palm, in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palm {
    /// Axis-aligned box around the palm (not the whole hand).
    pub rect: Rect,
    /// Detection score in `0.0..=1.0`.
    pub confidence: f32,
}

/// Center of an SSD anchor, relative to the network input (`0.0..=1.0`).
#[derive(Debug, Clone, Copy, PartialEq)]
struct Anchor {
    x_center: f32,
    y_center: f32,
}

/// Computes the anchors of a MediaPipe palm detection network.
///
/// The network has a stride 8 layer with 2 anchors per cell and a stride 16 layer with 6 anchors
/// per cell.
fn anchors(input_res: Resolution) -> Vec<Anchor> {
    let mut anchors = Vec::new();
    for (stride, boxes_per_cell) in [(8, 2), (16, 6)] {
        let width = input_res.width() / stride;
        let height = input_res.height() / stride;
        for y in 0..height {
            for x in 0..width {
                for _ in 0..boxes_per_cell {
                    anchors.push(Anchor {
                        x_center: (x as f32 + 0.5) / width as f32,
                        y_center: (y as f32 + 0.5) / height as f32,
                    });
                }
            }
        }
    }
    anchors
}

fn sigmoid(v: f32) -> f32 {
    1.0 / (1.0 + (-v).exp())
}

/// Decodes raw network outputs into palms, in network input coordinates.
fn extract(
    anchors: &[Anchor],
    input_res: Resolution,
    boxes: &[f32],
    scores: &[f32],
    threshold: f32,
) -> Vec<Palm> {
    let input_w = input_res.width() as f32;
    let input_h = input_res.height() as f32;
    anchors
        .iter()
        .zip(scores)
        .zip(boxes.chunks_exact(BOX_PARAMS))
        .filter_map(|((anchor, &score), params)| {
            let confidence = sigmoid(score);
            if !(confidence >= threshold) {
                return None;
            }
            let xc = params[0] + anchor.x_center * input_w;
            let yc = params[1] + anchor.y_center * input_h;
            Some(Palm {
                rect: Rect::from_center(xc, yc, params[2], params[3]),
                confidence,
            })
        })
        .collect()
}

/// A MediaPipe-style palm detection network.
///
/// The network must take a single `[1, 3, H, W]` RGB image with channel values in `0.0..=1.0`,
/// and output one `[1, N, 18]` tensor of box parameters and one `[1, N, 1]` tensor of raw scores,
/// where `N` is the anchor count for the input size (2016 for the usual 192x192 input).
pub struct PalmNetwork {
    model: Model,
    input_res: Resolution,
    anchors: Vec<Anchor>,
    threshold: f32,
    nms: NonMaxSuppression,
    t_infer: Timer,
    t_extract: Timer,
}

impl PalmNetwork {
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
        let (model, input_res) = super::load_model(path, "palm detection")?;
        let anchors = anchors(input_res);
        log::debug!(
            "loaded palm detection network from {} (input {}, {} anchors)",
            path.display(),
            input_res,
            anchors.len(),
        );

        Ok(Self {
            model,
            input_res,
            anchors,
            threshold: DEFAULT_PALM_THRESHOLD,
            nms: NonMaxSuppression::new(),
            t_infer: Timer::new("palm infer"),
            t_extract: Timer::new("palm extract"),
        })
    }

    /// Sets the minimum score a palm needs to be reported.
    pub fn threshold(self, threshold: f32) -> Self {
        Self { threshold, ..self }
    }
}

impl PalmDetector for PalmNetwork {
    fn detect(&mut self, frame: &Image) -> anyhow::Result<Vec<Palm>> {
        if frame.resolution().is_empty() {
            return Ok(Vec::new());
        }

        let roi = letterbox(frame, self.input_res);
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

        let output = |params: usize| {
            outputs
                .iter()
                .find(|t| t.shape() == [1, self.anchors.len(), params])
                .with_context(|| {
                    format!(
                        "palm detection network has no [1, {}, {}] output",
                        self.anchors.len(),
                        params,
                    )
                })
        };
        let boxes = output(BOX_PARAMS)?.as_slice::<f32>()?;
        let scores = output(1)?.as_slice::<f32>()?;

        let palms = self.t_extract.time(|| {
            let palms = extract(&self.anchors, self.input_res, boxes, scores, self.threshold);
            self.nms.process(palms)
        });
        if palms.len() > 8 {
            bail!(
                "palm detection produced {} palms, the network output is likely garbage",
                palms.len()
            );
        }

        Ok(palms
            .into_iter()
            .map(|palm| {
                let (x, y) = palm.rect.center();
                let (x, y) = unproject(&roi, self.input_res, x, y);
                let scale = roi.width() / self.input_res.width() as f32;
                Palm {
                    rect: Rect::from_center(
                        x,
                        y,
                        palm.rect.width() * scale,
                        palm.rect.height() * scale,
                    ),
                    confidence: palm.confidence,
                }
            })
            .collect())
    }

    fn timers(&self) -> Vec<&Timer> {
        vec![&self.t_infer, &self.t_extract]
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn anchor_layout() {
        let anchors = anchors(Resolution::new(192, 192));
        assert_eq!(anchors.len(), 2016);
        assert_eq!(
            anchors[0],
            Anchor {
                x_center: 0.5 / 24.0,
                y_center: 0.5 / 24.0,
            }
        );
        // Both anchors of a stride 8 cell share its center.
        assert_eq!(anchors[0], anchors[1]);
        assert_relative_eq!(anchors[2].x_center, 1.5 / 24.0);
        // The stride 16 layer starts after 24 * 24 * 2 anchors.
        assert_relative_eq!(anchors[1152].x_center, 0.5 / 12.0);
        assert_relative_eq!(anchors[2015].y_center, 11.5 / 12.0);
    }

    #[test]
    fn extract_boxes() {
        let res = Resolution::new(16, 16);
        let anchors = anchors(res);
        // 2x2 cells with 2 anchors, plus 1x1 cell with 6 anchors.
        assert_eq!(anchors.len(), 14);

        let mut boxes = vec![0.0; anchors.len() * BOX_PARAMS];
        let mut scores = vec![-10.0; anchors.len()];
        // Anchor 3 is the second one of cell (1, 0), centered at (12, 4).
        scores[3] = 10.0;
        boxes[3 * BOX_PARAMS..3 * BOX_PARAMS + 4].copy_from_slice(&[1.0, -2.0, 6.0, 4.0]);

        let palms = extract(&anchors, res, &boxes, &scores, 0.5);
        assert_eq!(palms.len(), 1);
        let palm = palms[0];
        assert!(palm.confidence > 0.99);
        assert_eq!(palm.rect.center(), (13.0, 2.0));
        assert_eq!(palm.rect.width(), 6.0);
        assert_eq!(palm.rect.height(), 4.0);

        // NaN scores never pass the threshold.
        scores[3] = f32::NAN;
        assert!(extract(&anchors, res, &boxes, &scores, 0.5).is_empty());
    }

    #[test]
    fn load_errors() {
        for path in ["palms.tflite", "does/not/exist.onnx"] {
            let err = PalmNetwork::load(path).err().unwrap();
            assert!(matches!(
                err.downcast_ref::<LoopError>(),
                Some(LoopError::ModelLoad { .. })
            ));
        }
    }
}
