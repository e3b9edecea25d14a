//! Non-Maximum Averaging of overlapping palm detections.
//!
//! The palm network reports every hand many times, once per anchor that fires. Detections that
//! overlap the most confident one by at least the IOU threshold are merged into a single
//! confidence-weighted average, which jitters less between frames than keeping only the best one.

use super::palm::Palm;
use crate::image::Rect;

pub(crate) struct NonMaxSuppression {
    iou_thresh: f32,
}

impl NonMaxSuppression {
    /// The default intersection-over-union threshold used to determine if two detections overlap.
    pub const DEFAULT_IOU_THRESH: f32 = 0.3;

    pub fn new() -> Self {
        Self {
            iou_thresh: Self::DEFAULT_IOU_THRESH,
        }
    }

    /// Merges overlapping detections, returning one palm per cluster, most confident first.
    pub fn process(&self, mut palms: Vec<Palm>) -> Vec<Palm> {
        // Ascending, so the most confident detection can be popped off the back.
        palms.sort_unstable_by(|a, b| a.confidence.total_cmp(&b.confidence));

        let mut out = Vec::new();
        while let Some(seed) = palms.pop() {
            let mut cluster = vec![seed];
            palms.retain(|other| {
                if seed.rect.iou(&other.rect) >= self.iou_thresh {
                    cluster.push(*other);
                    false
                } else {
                    true
                }
            });

            let divisor: f32 = cluster.iter().map(|p| p.confidence).sum();
            if divisor <= 0.0 {
                out.push(seed);
                continue;
            }
            let (mut xc, mut yc, mut w, mut h) = (0.0, 0.0, 0.0, 0.0);
            for palm in &cluster {
                let factor = palm.confidence / divisor;
                let (x, y) = palm.rect.center();
                xc += x * factor;
                yc += y * factor;
                w += palm.rect.width() * factor;
                h += palm.rect.height() * factor;
            }
            out.push(Palm {
                rect: Rect::from_center(xc, yc, w, h),
                confidence: seed.confidence,
            });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn palm(x: f32, y: f32, size: f32, confidence: f32) -> Palm {
        Palm {
            rect: Rect::from_center(x, y, size, size),
            confidence,
        }
    }

    #[test]
    fn averages_overlapping() {
        let nms = NonMaxSuppression::new();
        let out = nms.process(vec![
            palm(10.0, 10.0, 10.0, 0.5),
            palm(100.0, 100.0, 10.0, 0.6),
            palm(12.0, 10.0, 10.0, 1.0),
        ]);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].confidence, 1.0);
        let (x, y) = out[0].rect.center();
        assert_relative_eq!(x, (10.0 * 0.5 + 12.0 * 1.0) / 1.5);
        assert_relative_eq!(y, 10.0);
        assert_relative_eq!(out[0].rect.width(), 10.0);

        assert_eq!(out[1].confidence, 0.6);
        assert_eq!(out[1].rect.center(), (100.0, 100.0));
    }

    #[test]
    fn empty() {
        assert!(NonMaxSuppression::new().process(Vec::new()).is_empty());
    }
}
