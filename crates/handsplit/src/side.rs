//! Sorting detected hands onto the left and right canvas.
//!
//! A hand belongs to the left side if the mean X coordinate of its landmarks lies in the left
//! half of the frame, and to the right side otherwise. Each side shows at most one hand per frame.

use std::{fmt, str::FromStr};

use crate::image::Color;
use crate::landmark::Detection;

/// One of the two canvases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Both sides, in drawing order.
    pub const ALL: [Side; 2] = [Side::Left, Side::Right];

    /// Returns the color markers on this side are drawn with.
    pub fn color(self) -> Color {
        match self {
            Side::Left => Color::BLUE,
            Side::Right => Color::RED,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Left => "left",
            Side::Right => "right",
        })
    }
}

/// Determines which side a detection belongs to, in a frame `frame_width` pixels wide.
///
/// Returns `None` for detections without any landmarks.
pub fn classify(detection: &Detection, frame_width: u32) -> Option<Side> {
    let center = detection.centroid_x()?;
    if center < frame_width as f32 / 2.0 {
        Some(Side::Left)
    } else {
        Some(Side::Right)
    }
}

/// Rule that picks a detection when several land on the same side in one frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TieBreak {
    /// Keep the detection with the highest confidence. If confidences are equal, the one that
    /// comes later in the estimator's output wins.
    #[default]
    HighestConfidence,
    /// Keep whichever detection comes last in the estimator's output.
    Last,
}

impl FromStr for TieBreak {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confidence" | "highest-confidence" => Ok(Self::HighestConfidence),
            "last" => Ok(Self::Last),
            _ => anyhow::bail!("unknown tie-break rule '{s}' (expected `confidence` or `last`)"),
        }
    }
}

/// The detections chosen for each side in a single frame.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SideAssignment {
    left: Option<Detection>,
    right: Option<Detection>,
}

impl SideAssignment {
    pub fn get(&self, side: Side) -> Option<&Detection> {
        match side {
            Side::Left => self.left.as_ref(),
            Side::Right => self.right.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    fn slot(&mut self, side: Side) -> &mut Option<Detection> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    fn take(&mut self, side: Side) -> Option<Detection> {
        self.slot(side).take()
    }
}

/// Assigns a frame's detections to sides.
#[derive(Debug, Default, Clone, Copy)]
pub struct SideClassifier {
    tie_break: TieBreak,
}

impl SideClassifier {
    pub fn new(tie_break: TieBreak) -> Self {
        Self { tie_break }
    }

    /// Picks at most one detection per side from `detections`.
    pub fn assign<I>(&self, detections: I, frame_width: u32) -> SideAssignment
    where
        I: IntoIterator<Item = Detection>,
    {
        let mut assignment = SideAssignment::default();
        for det in detections {
            let Some(side) = classify(&det, frame_width) else {
                log::trace!("ignoring detection without landmarks");
                continue;
            };

            let slot = assignment.slot(side);
            let replace = match (&*slot, self.tie_break) {
                (None, _) | (Some(_), TieBreak::Last) => true,
                (Some(prev), TieBreak::HighestConfidence) => {
                    rank(det.confidence()) >= rank(prev.confidence())
                }
            };
            if replace {
                *slot = Some(det);
            }
        }
        assignment
    }
}

/// Orders confidences with NaN below every other value.
fn rank(confidence: f32) -> f32 {
    if confidence.is_nan() {
        f32::NEG_INFINITY
    } else {
        confidence
    }
}

/// What happened to a side's state during [`SideStates::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideUpdate {
    /// A new detection replaced the previous one.
    Fresh,
    /// No new detection; the previous one is kept.
    Held,
    /// No new detection and nothing to show.
    Empty,
}

impl SideUpdate {
    /// Returns whether the side has a hand to draw.
    pub fn is_drawn(self) -> bool {
        self != SideUpdate::Empty
    }
}

/// The hand currently shown on each side.
#[derive(Debug, Default, Clone)]
pub struct SideStates {
    left: Option<Detection>,
    right: Option<Detection>,
}

impl SideStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, side: Side) -> Option<&Detection> {
        match side {
            Side::Left => self.left.as_ref(),
            Side::Right => self.right.as_ref(),
        }
    }

    /// Applies a frame's assignment.
    ///
    /// Sides without a new detection keep their previous one if `hold_last_pose` is set, and are
    /// emptied otherwise. Returns the resulting update for the left and right side.
    pub fn update(
        &mut self,
        mut assignment: SideAssignment,
        hold_last_pose: bool,
    ) -> [SideUpdate; 2] {
        Side::ALL.map(|side| {
            let state = match side {
                Side::Left => &mut self.left,
                Side::Right => &mut self.right,
            };
            match assignment.take(side) {
                Some(det) => {
                    *state = Some(det);
                    SideUpdate::Fresh
                }
                None if hold_last_pose && state.is_some() => SideUpdate::Held,
                None => {
                    *state = None;
                    SideUpdate::Empty
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hand(xs: &[f32]) -> Detection {
        Detection::from_positions(xs.iter().map(|&x| [x, 100.0]))
    }

    #[test]
    fn classify_by_centroid() {
        assert_eq!(classify(&hand(&[50.0, 60.0, 70.0]), 320), Some(Side::Left));
        assert_eq!(classify(&hand(&[190.0, 200.0, 210.0]), 320), Some(Side::Right));
        // The center line itself belongs to the right side.
        assert_eq!(classify(&hand(&[160.0]), 320), Some(Side::Right));
        assert_eq!(classify(&hand(&[159.9]), 320), Some(Side::Left));
        assert_eq!(classify(&hand(&[]), 320), None);
    }

    #[test]
    fn classify_random() {
        let mut rng = fastrand::Rng::with_seed(0x5eed);
        for _ in 0..1000 {
            let width = rng.u32(1..2000);
            let xs = (0..rng.usize(1..30))
                .map(|_| rng.f32() * width as f32 * 1.5 - width as f32 * 0.25)
                .collect::<Vec<_>>();
            let det = hand(&xs);
            let center = det.centroid_x().unwrap();

            let expected = if center < width as f32 / 2.0 {
                Side::Left
            } else {
                Side::Right
            };
            assert_eq!(classify(&det, width), Some(expected));
            // Classification does not depend on anything but its inputs.
            assert_eq!(classify(&det, width), Some(expected));
        }
    }

    #[test]
    fn assign_single() {
        let classifier = SideClassifier::default();
        let left = hand(&[50.0, 60.0, 70.0]);
        let a = classifier.assign([left.clone()], 320);
        assert_eq!(a.get(Side::Left), Some(&left));
        assert_eq!(a.get(Side::Right), None);

        let b = classifier.assign([left.clone()], 320);
        assert_eq!(a, b);

        assert!(classifier.assign([], 320).is_empty());
        assert!(classifier.assign([hand(&[])], 320).is_empty());
    }

    #[test]
    fn assign_both_sides() {
        let classifier = SideClassifier::default();
        let left = hand(&[10.0, 20.0]);
        let right = hand(&[300.0, 310.0]);
        let a = classifier.assign([right.clone(), left.clone()], 320);
        assert_eq!(a.get(Side::Left), Some(&left));
        assert_eq!(a.get(Side::Right), Some(&right));
    }

    #[test]
    fn tie_break() {
        let confident = hand(&[10.0]).with_confidence(0.9);
        let unsure = hand(&[20.0]).with_confidence(0.4);

        let by_confidence = SideClassifier::new(TieBreak::HighestConfidence);
        for dets in [
            [confident.clone(), unsure.clone()],
            [unsure.clone(), confident.clone()],
        ] {
            let a = by_confidence.assign(dets, 320);
            assert_eq!(a.get(Side::Left), Some(&confident));
        }

        let last = SideClassifier::new(TieBreak::Last);
        let a = last.assign([confident.clone(), unsure.clone()], 320);
        assert_eq!(a.get(Side::Left), Some(&unsure));

        // Equal confidence falls back to the later detection.
        let first = hand(&[10.0]);
        let second = hand(&[30.0]);
        let a = by_confidence.assign([first, second.clone()], 320);
        assert_eq!(a.get(Side::Left), Some(&second));
    }

    #[test]
    fn nan_confidence_ranks_lowest() {
        let broken = hand(&[10.0]).with_confidence(f32::NAN);
        let confident = hand(&[20.0]).with_confidence(0.9);

        let classifier = SideClassifier::new(TieBreak::HighestConfidence);
        for dets in [
            [broken.clone(), confident.clone()],
            [confident.clone(), broken.clone()],
        ] {
            let a = classifier.assign(dets, 320);
            assert_eq!(a.get(Side::Left), Some(&confident));
        }

        // With nothing better around, a NaN detection is still drawn.
        let a = classifier.assign([broken.clone(), hand(&[30.0]).with_confidence(f32::NAN)], 320);
        let picked = a.get(Side::Left).unwrap();
        assert!(picked.confidence().is_nan());
        assert_eq!(picked.landmarks(), hand(&[30.0]).landmarks());
    }

    #[test]
    fn parse_tie_break() {
        assert_eq!(
            "confidence".parse::<TieBreak>().unwrap(),
            TieBreak::HighestConfidence
        );
        assert_eq!("last".parse::<TieBreak>().unwrap(), TieBreak::Last);
        assert!("first".parse::<TieBreak>().is_err());
    }

    #[test]
    fn hold_last_pose() {
        let classifier = SideClassifier::default();
        let left = hand(&[50.0, 60.0, 70.0]);

        let mut states = SideStates::new();
        let updates = states.update(classifier.assign([left.clone()], 320), true);
        assert_eq!(updates, [SideUpdate::Fresh, SideUpdate::Empty]);

        let updates = states.update(classifier.assign([], 320), true);
        assert_eq!(updates, [SideUpdate::Held, SideUpdate::Empty]);
        assert_eq!(states.get(Side::Left), Some(&left));
        assert_eq!(states.get(Side::Right), None);

        let newer = hand(&[80.0]);
        states.update(classifier.assign([newer.clone()], 320), true);
        assert_eq!(states.get(Side::Left), Some(&newer));
    }

    #[test]
    fn drop_without_hold() {
        let classifier = SideClassifier::default();
        let mut states = SideStates::new();
        states.update(
            classifier.assign([hand(&[60.0]), hand(&[200.0])], 320),
            false,
        );
        assert!(states.get(Side::Left).is_some());
        assert!(states.get(Side::Right).is_some());

        let updates = states.update(classifier.assign([hand(&[250.0])], 320), false);
        assert_eq!(updates, [SideUpdate::Empty, SideUpdate::Fresh]);
        assert_eq!(states.get(Side::Left), None);

        let updates = states.update(SideAssignment::default(), false);
        assert_eq!(updates, [SideUpdate::Empty, SideUpdate::Empty]);
        assert_eq!(states.get(Side::Right), None);
    }
}
