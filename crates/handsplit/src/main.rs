use anyhow::Context;

use handsplit::{
    config::{Config, ENV_MODEL, ENV_PALM_MODEL},
    estimator::{EstimatorWorker, HandPipeline, LandmarkNetwork, PalmNetwork},
    frame_loop::{FrameLoop, RefreshScheduler, StopSignal},
    gui::WindowCanvas,
    video::{
        webcam::{Webcam, WebcamOptions},
        FrameSource, StillImage,
    },
};

fn main() -> anyhow::Result<()> {
    handsplit::init_logger!();

    let config = Config::from_env()?;
    log::debug!("{config:?}");

    let model = config
        .model
        .as_ref()
        .with_context(|| format!("`{ENV_MODEL}` must be set to a hand landmark `.onnx` file"))?;
    let palm_model = config.palm_model.as_ref().with_context(|| {
        format!("`{ENV_PALM_MODEL}` must be set to a palm detection `.onnx` file")
    })?;
    let pipeline = HandPipeline::new(
        PalmNetwork::load(palm_model)?.threshold(config.palm_threshold),
        LandmarkNetwork::load(model)?.presence_threshold(config.presence_threshold),
    );
    let estimator = EstimatorWorker::spawn(pipeline)?;

    let left = WindowCanvas::open("left hand", config.surface)?;
    let right = WindowCanvas::open("right hand", config.surface)?;

    let source: Box<dyn FrameSource> = match &config.input {
        Some(path) => Box::new(StillImage::load(path)?),
        None => {
            let mut options = WebcamOptions::default();
            if let Some(name) = &config.webcam_name {
                options = options.name(name);
            }
            let webcam = Webcam::open(options)?;
            log::info!("webcam delivers {} frames", webcam.resolution());
            Box::new(webcam)
        }
    };

    let mut frame_loop = FrameLoop::new(source, estimator, left, right, config.loop_options);
    let mut scheduler = RefreshScheduler::new(config.refresh_hz);
    let stop = StopSignal::new();
    let frames = frame_loop.run(&mut scheduler, &stop)?;
    log::info!("rendered {frames} frames");

    Ok(())
}
