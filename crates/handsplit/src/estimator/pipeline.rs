use crate::image::{Image, Rect};
use crate::landmark::Detection;
use crate::timer::Timer;

use super::{
    CropLandmarker, EstimateOptions, HandEstimator, LandmarkNetwork, Palm, PalmDetector,
    PalmNetwork,
};

/// Relative margin added around the palm box on each side, making the crop 2.6 times its size.
const HAND_MARGIN: f32 = 0.8;

/// How far the crop is moved towards the fingers, relative to the palm box height.
const FINGER_SHIFT: f32 = 0.5;

/// Two-stage hand estimator: palm detection on the whole frame, followed by landmark estimation
/// on a square crop around each palm.
///
/// Palms are not rotated, so the crop is extended upwards, assuming roughly upright hands.
pub struct HandPipeline<P = PalmNetwork, L = LandmarkNetwork> {
    palms: P,
    landmarker: L,
}

impl<P: PalmDetector, L: CropLandmarker> HandPipeline<P, L> {
    pub fn new(palms: P, landmarker: L) -> Self {
        Self { palms, landmarker }
    }
}

/// Computes the region the landmark network is run on for a detected palm.
fn hand_roi(palm: &Palm) -> Rect {
    let (x, y) = palm.rect.center();
    let height = palm.rect.height();
    Rect::from_center(x, y - height * FINGER_SHIFT, palm.rect.width(), height)
        .grow_rel(HAND_MARGIN)
        .grow_to_fit_aspect(1.0)
}

impl<P: PalmDetector, L: CropLandmarker> HandEstimator for HandPipeline<P, L> {
    fn estimate(
        &mut self,
        frame: &Image,
        options: EstimateOptions,
    ) -> anyhow::Result<Vec<Detection>> {
        if frame.resolution().is_empty() {
            return Ok(Vec::new());
        }

        let palms = self.palms.detect(frame)?;
        let mut detections = Vec::with_capacity(palms.len());
        for palm in &palms {
            let roi = hand_roi(palm);
            let Some(mut detection) = self.landmarker.landmarks(frame, roi)? else {
                continue;
            };
            if options.flip_horizontal {
                detection.flip_horizontal_in_place(frame.width() as f32);
            }
            detections.push(detection);
        }

        log::trace!("{} palms, {} hands", palms.len(), detections.len());
        Ok(detections)
    }

    fn timers(&self) -> Vec<&Timer> {
        let mut timers = self.palms.timers();
        timers.extend(self.landmarker.timers());
        timers
    }
}
