use std::io;

use pawawwewism::{promise, Promise, PromiseHandle, Worker};

use crate::error::LoopError;
use crate::image::Image;
use crate::landmark::Detection;
use crate::timer::FpsCounter;

use super::{EstimateOptions, HandEstimator};

type Estimation = anyhow::Result<Vec<Detection>>;

struct Job {
    frame: Image,
    options: EstimateOptions,
    result: Promise<Estimation>,
}

/// Runs a [`HandEstimator`] on a dedicated worker thread.
///
/// Frames are handed to the worker with [`EstimatorWorker::submit`], which returns a
/// [`PromiseHandle`] that resolves once the estimate is done. Using the worker as a
/// [`HandEstimator`] submits the frame and blocks until the result is in, so at most one frame is
/// in flight at a time.
///
/// The worker logs its own FPS, along with the timers of the estimator it runs.
pub struct EstimatorWorker {
    worker: Worker<Job>,
}

impl EstimatorWorker {
    /// Spawns a worker thread that takes ownership of `estimator`.
    pub fn spawn<E>(mut estimator: E) -> Result<Self, io::Error>
    where
        E: HandEstimator + Send + 'static,
    {
        let mut fps = FpsCounter::new("hand estimator");
        let worker = Worker::builder().name("hand estimator").spawn(
            move |Job {
                      frame,
                      options,
                      result,
                  }| {
                let estimation = estimator.estimate(&frame, options);
                fps.tick_with(estimator.timers());
                result.fulfill(estimation);
            },
        )?;

        Ok(Self { worker })
    }

    /// Queues `frame` for estimation.
    pub fn submit(&mut self, frame: Image, options: EstimateOptions) -> PromiseHandle<Estimation> {
        let (result, handle) = promise();
        self.worker.send(Job {
            frame,
            options,
            result,
        });
        handle
    }
}

impl HandEstimator for EstimatorWorker {
    fn estimate(
        &mut self,
        frame: &Image,
        options: EstimateOptions,
    ) -> anyhow::Result<Vec<Detection>> {
        self.submit(frame.clone(), options)
            .block()
            .map_err(|_dropped| LoopError::EstimatorGone)?
    }
}
