//! Errors raised at the boundaries to the camera, the estimator and the frame stream.
//!
//! Everything fallible returns [`anyhow::Result`]. Conditions that callers may want to react to
//! are raised as a [`LoopError`] and can be recovered with [`anyhow::Error::downcast_ref`].

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LoopError {
    /// No capture device could be opened.
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    /// The hand landmark model could not be loaded.
    #[error("failed to load hand model '{}': {reason}", path.display())]
    ModelLoad { path: PathBuf, reason: String },

    /// The frame source produced an image without any pixels.
    #[error("frame source produced an empty frame")]
    EmptyFrame,

    /// A finite frame source has run out of frames.
    #[error("end of frame stream")]
    EndOfStream,

    /// The estimator's worker thread exited without answering.
    #[error("hand estimator worker has stopped")]
    EstimatorGone,
}
