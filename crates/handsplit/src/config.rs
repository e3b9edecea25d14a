//! Configuration of the frame loop and of the `handsplit` binary.

use std::{
    env::{self, VarError},
    path::PathBuf,
};

use anyhow::bail;

use crate::estimator::EstimateOptions;
use crate::image::Resolution;
use crate::render::DEFAULT_MARKER_RADIUS;
use crate::side::TieBreak;

/// Behavior of the [`FrameLoop`](crate::frame_loop::FrameLoop).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopOptions {
    hold_last_pose: bool,
    rescale_to_surface: bool,
    tie_break: TieBreak,
    marker_radius: f32,
    flip_horizontal: bool,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            hold_last_pose: true,
            rescale_to_surface: true,
            tie_break: TieBreak::default(),
            marker_radius: DEFAULT_MARKER_RADIUS,
            flip_horizontal: true,
        }
    }
}

impl LoopOptions {
    /// Keeps drawing a side's last hand while no new hand is detected on that side.
    ///
    /// Enabled by default. When disabled, a side is blank in every frame without a hand on it.
    #[inline]
    pub fn hold_last_pose(mut self, hold: bool) -> Self {
        self.hold_last_pose = hold;
        self
    }

    /// Maps landmark coordinates from frame pixels to canvas pixels.
    ///
    /// Enabled by default. When disabled, frame coordinates are drawn as-is.
    #[inline]
    pub fn rescale_to_surface(mut self, rescale: bool) -> Self {
        self.rescale_to_surface = rescale;
        self
    }

    /// Sets the rule that picks a hand when several are found on the same side.
    #[inline]
    pub fn tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Sets the radius of the circle drawn at each landmark, in canvas pixels.
    #[inline]
    pub fn marker_radius(mut self, radius: f32) -> Self {
        self.marker_radius = radius;
        self
    }

    /// Asks the estimator to mirror landmarks horizontally.
    #[inline]
    pub fn flip_horizontal(mut self, flip: bool) -> Self {
        self.flip_horizontal = flip;
        self
    }

    pub fn is_holding_last_pose(&self) -> bool {
        self.hold_last_pose
    }

    pub fn is_rescaling_to_surface(&self) -> bool {
        self.rescale_to_surface
    }

    pub fn get_tie_break(&self) -> TieBreak {
        self.tie_break
    }

    pub fn get_marker_radius(&self) -> f32 {
        self.marker_radius
    }

    /// Returns the options passed to the estimator with every frame.
    pub fn estimate_options(&self) -> EstimateOptions {
        EstimateOptions {
            flip_horizontal: self.flip_horizontal,
        }
    }
}

pub const ENV_MODEL: &str = "HANDSPLIT_MODEL";
pub const ENV_PALM_MODEL: &str = "HANDSPLIT_PALM_MODEL";
pub const ENV_INPUT: &str = "HANDSPLIT_INPUT";
pub const ENV_WEBCAM_NAME: &str = crate::video::webcam::ENV_VAR_WEBCAM_NAME;
pub const ENV_HOLD_LAST_POSE: &str = "HANDSPLIT_HOLD_LAST_POSE";
pub const ENV_RESCALE: &str = "HANDSPLIT_RESCALE";
pub const ENV_TIE_BREAK: &str = "HANDSPLIT_TIE_BREAK";
pub const ENV_FLIP: &str = "HANDSPLIT_FLIP";
pub const ENV_SURFACE: &str = "HANDSPLIT_SURFACE";
pub const ENV_REFRESH_HZ: &str = "HANDSPLIT_REFRESH_HZ";
pub const ENV_PRESENCE_THRESHOLD: &str = "HANDSPLIT_PRESENCE_THRESHOLD";
pub const ENV_PALM_THRESHOLD: &str = "HANDSPLIT_PALM_THRESHOLD";

/// Full configuration of the `handsplit` binary.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Path to the hand landmark `.onnx` network.
    pub model: Option<PathBuf>,
    /// Path to the palm detection `.onnx` network.
    pub palm_model: Option<PathBuf>,
    /// Still image to use instead of the webcam.
    pub input: Option<PathBuf>,
    /// Name of the webcam device to open.
    pub webcam_name: Option<String>,
    /// Size of each of the two canvases.
    pub surface: Resolution,
    /// Display refresh rate the frame loop is paced to. 0 disables pacing.
    pub refresh_hz: u32,
    /// Minimum hand presence score reported by the landmark network.
    pub presence_threshold: f32,
    /// Minimum score of a palm reported by the palm detection network.
    pub palm_threshold: f32,
    pub loop_options: LoopOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: None,
            palm_model: None,
            input: None,
            webcam_name: None,
            surface: Resolution::RES_480P,
            refresh_hz: 60,
            presence_threshold: crate::estimator::DEFAULT_PRESENCE_THRESHOLD,
            palm_threshold: crate::estimator::DEFAULT_PALM_THRESHOLD,
            loop_options: LoopOptions::default(),
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// | Variable | Meaning | Default |
    /// |---|---|---|
    /// | `HANDSPLIT_MODEL` | path to the hand landmark `.onnx` network | none |
    /// | `HANDSPLIT_PALM_MODEL` | path to the palm detection `.onnx` network | none |
    /// | `HANDSPLIT_INPUT` | still image used instead of the webcam | none |
    /// | `HANDSPLIT_WEBCAM_NAME` | webcam device name | first usable device |
    /// | `HANDSPLIT_HOLD_LAST_POSE` | keep drawing a side's last hand | `true` |
    /// | `HANDSPLIT_RESCALE` | map frame pixels to canvas pixels | `true` |
    /// | `HANDSPLIT_TIE_BREAK` | `confidence` or `last` | `confidence` |
    /// | `HANDSPLIT_FLIP` | mirror landmarks horizontally | `true` |
    /// | `HANDSPLIT_SURFACE` | canvas size as `WIDTHxHEIGHT` | `640x480` |
    /// | `HANDSPLIT_REFRESH_HZ` | frame loop rate, `0` for unpaced | `60` |
    /// | `HANDSPLIT_PRESENCE_THRESHOLD` | minimum hand presence score | `0.5` |
    /// | `HANDSPLIT_PALM_THRESHOLD` | minimum palm detection score | `0.5` |
    ///
    /// Boolean variables accept `1`/`true`/`on`/`yes` and `0`/`false`/`off`/`no`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name))
    }

    /// Reads the configuration through `lookup`, which behaves like [`std::env::var`].
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let vars = Vars { lookup };
        let mut config = Self::default();
        config.model = vars.get(ENV_MODEL)?.map(PathBuf::from);
        config.palm_model = vars.get(ENV_PALM_MODEL)?.map(PathBuf::from);
        config.input = vars.get(ENV_INPUT)?.map(PathBuf::from);
        config.webcam_name = vars.get(ENV_WEBCAM_NAME)?;

        let mut opts = config.loop_options;
        if let Some(hold) = vars.parse(ENV_HOLD_LAST_POSE, parse_bool)? {
            opts = opts.hold_last_pose(hold);
        }
        if let Some(rescale) = vars.parse(ENV_RESCALE, parse_bool)? {
            opts = opts.rescale_to_surface(rescale);
        }
        if let Some(flip) = vars.parse(ENV_FLIP, parse_bool)? {
            opts = opts.flip_horizontal(flip);
        }
        if let Some(tie_break) = vars.parse(ENV_TIE_BREAK, |s| s.parse::<TieBreak>().ok())? {
            opts = opts.tie_break(tie_break);
        }
        config.loop_options = opts;

        if let Some(surface) = vars.parse(ENV_SURFACE, |s| {
            s.parse::<Resolution>().ok().filter(|res| !res.is_empty())
        })? {
            config.surface = surface;
        }
        if let Some(hz) = vars.parse(ENV_REFRESH_HZ, |s| s.parse::<u32>().ok())? {
            config.refresh_hz = hz;
        }
        if let Some(threshold) = vars.parse(ENV_PRESENCE_THRESHOLD, parse_score)? {
            config.presence_threshold = threshold;
        }
        if let Some(threshold) = vars.parse(ENV_PALM_THRESHOLD, parse_score)? {
            config.palm_threshold = threshold;
        }

        Ok(config)
    }
}

struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    fn get(&self, name: &str) -> anyhow::Result<Option<String>> {
        match (self.lookup)(name) {
            Ok(value) => Ok(Some(value)),
            Err(VarError::NotPresent) => Ok(None),
            Err(VarError::NotUnicode(s)) => bail!(
                "invalid value set for `{name}` variable: {}",
                s.to_string_lossy()
            ),
        }
    }

    fn parse<T>(
        &self,
        name: &str,
        parse: impl FnOnce(&str) -> Option<T>,
    ) -> anyhow::Result<Option<T>> {
        let Some(value) = self.get(name)? else {
            return Ok(None);
        };
        match parse(value.trim()) {
            Some(parsed) => Ok(Some(parsed)),
            None => bail!("invalid value set for `{name}` variable: '{value}'"),
        }
    }
}

fn parse_score(s: &str) -> Option<f32> {
    s.parse::<f32>().ok().filter(|t| (0.0..=1.0).contains(t))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
