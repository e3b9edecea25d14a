//! Hand tracking overlays split across two canvases.
//!
//! Every frame, the detected hands are sorted onto a *left* and a *right* canvas depending on
//! which half of the camera image they are in, and each landmark is drawn as a filled circle
//! (blue on the left canvas, red on the right one).
//!
//! The pieces fit together like this:
//!
//! * A [`FrameSource`] delivers camera images (see [`video`]).
//! * A [`HandEstimator`] turns an image into a list of [`Detection`]s (see [`estimator`]).
//! * The [`side`] module assigns detections to a side and remembers the last pose per side.
//! * The [`render`] module maps landmarks onto a [`Canvas`] and draws them.
//! * [`FrameLoop`] drives all of the above once per display refresh.
//!
//! # Coordinates
//!
//! All landmark coordinates are in pixels of the image they were estimated on, with X pointing
//! right and Y pointing down.
//!
//! # Environment Variables
//!
//! The `handsplit` binary is configured entirely through environment variables, see
//! [`config::Config::from_env`] for the full list. The most important ones are:
//!
//! * `HANDSPLIT_MODEL`: path to the hand landmark `.onnx` network. Required.
//! * `HANDSPLIT_PALM_MODEL`: path to the palm detection `.onnx` network that finds the hands the
//!   landmark network is run on. Required.
//! * `HANDSPLIT_INPUT`: path to a still image to use instead of the webcam.
//! * `HANDSPLIT_WEBCAM_NAME`: forces the device to use for [`Webcam`]s created without an
//!   explicit device name.
//!
//! [`FrameSource`]: video::FrameSource
//! [`HandEstimator`]: estimator::HandEstimator
//! [`Detection`]: landmark::Detection
//! [`Canvas`]: canvas::Canvas
//! [`FrameLoop`]: frame_loop::FrameLoop
//! [`Webcam`]: video::webcam::Webcam

use log::LevelFilter;

pub mod canvas;
pub mod config;
pub mod error;
pub mod estimator;
pub mod frame_loop;
pub mod gui;
pub mod image;
pub mod landmark;
pub mod render;
pub mod side;
pub mod timer;
pub mod video;

/// macro-use only, not part of public API.
#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    let log_level = if cfg!(debug_assertions) {
        LevelFilter::Trace
    } else {
        LevelFilter::Debug
    };
    env_logger::Builder::new()
        .filter(Some(calling_crate), log_level)
        .filter(Some(env!("CARGO_CRATE_NAME")), log_level)
        .filter(Some("tract_onnx"), LevelFilter::Warn)
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr*.
///
/// If `cfg!(debug_assertions)` is enabled, the calling crate and `handsplit` will log at *trace*
/// level. Otherwise, they will log at *debug* level. `RUST_LOG` can be used to override this.
///
/// If a global logger is already registered, this macro will do nothing.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}
