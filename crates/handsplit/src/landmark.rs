//! Hand landmarks and per-frame detections.

use nalgebra::Point2;

/// Number of landmarks the bundled hand landmark network outputs per hand.
pub const NUM_LANDMARKS: usize = 21;

/// One skeletal keypoint of a hand, in pixel coordinates of the frame it was estimated on.
pub type Landmark = Point2<f32>;

/// The landmarks of one hand, estimated on a single frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    landmarks: Vec<Landmark>,
    confidence: f32,
}

impl Detection {
    /// Creates a detection from a list of landmarks, with a confidence of `1.0`.
    pub fn new<I: IntoIterator<Item = Landmark>>(landmarks: I) -> Self {
        Self {
            landmarks: landmarks.into_iter().collect(),
            confidence: 1.0,
        }
    }

    /// Creates a detection from `[x, y]` pixel positions.
    pub fn from_positions<I: IntoIterator<Item = [f32; 2]>>(positions: I) -> Self {
        Self::new(positions.into_iter().map(|[x, y]| Landmark::new(x, y)))
    }

    /// Sets the confidence the estimator has in this detection.
    pub fn with_confidence(self, confidence: f32) -> Self {
        Self { confidence, ..self }
    }

    #[inline]
    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    /// Returns the estimator's confidence that this is actually a hand.
    #[inline]
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    /// Computes the mean X coordinate of all landmarks.
    ///
    /// Returns `None` if the detection contains no landmarks.
    pub fn centroid_x(&self) -> Option<f32> {
        if self.landmarks.is_empty() {
            return None;
        }

        let sum: f32 = self.landmarks.iter().map(|lm| lm.x).sum();
        Some(sum / self.landmarks.len() as f32)
    }

    /// Mirrors all landmarks along the vertical center line of an image `width` pixels wide.
    pub fn flip_horizontal_in_place(&mut self, width: f32) {
        self.map_positions(|lm| Landmark::new(width - lm.x, lm.y));
    }

    pub fn map_positions(&mut self, mut f: impl FnMut(Landmark) -> Landmark) {
        for lm in &mut self.landmarks {
            *lm = f(*lm);
        }
    }
}
