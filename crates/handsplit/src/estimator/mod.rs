//! Hand landmark estimation.
//!
//! A [`HandEstimator`] takes a camera frame and returns one [`Detection`] per hand it finds.
//! [`HandPipeline`] does this in two stages: a [`PalmDetector`] finds palms in the whole frame,
//! then a [`CropLandmarker`] computes the landmarks of each hand from a crop around its palm.
//! [`PalmNetwork`] and [`LandmarkNetwork`] implement those stages with ONNX models, and
//! [`EstimatorWorker`] moves any estimator onto a background thread.

mod crop;
mod network;
mod nms;
mod palm;
mod pipeline;
mod worker;

pub use network::{LandmarkNetwork, DEFAULT_PRESENCE_THRESHOLD};
pub use palm::{Palm, PalmNetwork, DEFAULT_PALM_THRESHOLD};
pub use pipeline::HandPipeline;
pub use worker::EstimatorWorker;

use std::path::Path;

use anyhow::{bail, Context};
use tract_onnx::prelude::{Framework, Graph, InferenceModelExt, SimplePlan, TypedFact, TypedOp};

use crate::image::{Image, Rect, Resolution};
use crate::landmark::Detection;
use crate::timer::Timer;

type Model = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Per-call estimation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EstimateOptions {
    /// Mirror the reported landmarks horizontally, as if the frame had been flipped first.
    ///
    /// Enabled by default, which matches a mirrored self-view of a front-facing webcam.
    pub flip_horizontal: bool,
}

impl Default for EstimateOptions {
    fn default() -> Self {
        Self {
            flip_horizontal: true,
        }
    }
}

/// Finds hands in camera frames.
pub trait HandEstimator {
    /// Estimates the landmarks of all hands visible in `frame`.
    ///
    /// Landmark coordinates are in pixels of `frame`. An empty list means no hand was found.
    fn estimate(
        &mut self,
        frame: &Image,
        options: EstimateOptions,
    ) -> anyhow::Result<Vec<Detection>>;

    /// Returns the profiling timers of this estimator, for inclusion in FPS logs.
    fn timers(&self) -> Vec<&Timer> {
        Vec::new()
    }
}

impl<E: HandEstimator + ?Sized> HandEstimator for Box<E> {
    fn estimate(
        &mut self,
        frame: &Image,
        options: EstimateOptions,
    ) -> anyhow::Result<Vec<Detection>> {
        (**self).estimate(frame, options)
    }

    fn timers(&self) -> Vec<&Timer> {
        (**self).timers()
    }
}

impl<E: HandEstimator + ?Sized> HandEstimator for &mut E {
    fn estimate(
        &mut self,
        frame: &Image,
        options: EstimateOptions,
    ) -> anyhow::Result<Vec<Detection>> {
        (**self).estimate(frame, options)
    }

    fn timers(&self) -> Vec<&Timer> {
        (**self).timers()
    }
}

/// First stage of a [`HandPipeline`]: finds palms in a whole frame.
pub trait PalmDetector {
    /// Returns all palms in `frame`, in pixels of `frame`.
    fn detect(&mut self, frame: &Image) -> anyhow::Result<Vec<Palm>>;

    fn timers(&self) -> Vec<&Timer> {
        Vec::new()
    }
}

/// Second stage of a [`HandPipeline`]: computes the landmarks of the hand inside a region.
pub trait CropLandmarker {
    /// Computes the landmarks of the hand in the `roi` region of `frame`.
    ///
    /// `roi` may extend past the edges of `frame`. Returns landmarks in pixels of `frame`, or
    /// `None` if there is no hand in the region.
    fn landmarks(&mut self, frame: &Image, roi: Rect) -> anyhow::Result<Option<Detection>>;

    fn timers(&self) -> Vec<&Timer> {
        Vec::new()
    }
}

/// Loads an ONNX network taking a single `[1, 3, H, W]` image.
///
/// `what` names the network in error messages.
fn load_model(path: &Path, what: &str) -> anyhow::Result<(Model, Resolution)> {
    match path.extension() {
        Some(ext) if ext == "onnx" => {}
        _ => bail!("neural network file must have `.onnx` extension"),
    }

    let model_data = std::fs::read(path)?;
    let graph = tract_onnx::onnx()
        .model_for_read(&mut &*model_data)?
        .into_optimized()?;

    if graph.inputs.len() != 1 {
        bail!(
            "{what} network has to take exactly 1 input, this one takes {}",
            graph.inputs.len(),
        );
    }
    let fact = graph.input_fact(0)?;
    let shape = fact
        .shape
        .as_concrete()
        .with_context(|| format!("{what} network has a symbolic input shape"))?;
    let input_res = match shape {
        [1, 3, h, w] => Resolution::new((*w).try_into()?, (*h).try_into()?),
        _ => bail!("invalid input shape for {what} network: {:?}", shape),
    };

    Ok((SimplePlan::new(graph)?, input_res))
}
