use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest frame period a reader accepts: one frame per day.
pub const MAX_FRAME_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Pixel layout of the images a reader hands out.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// Planar Y, Cb, Cr with 4:2:2 chroma subsampling.
    I422,
}

impl PixelFormat {
    pub fn subsampling(&self) -> ChromaSubsampling {
        match self {
            PixelFormat::I422 => ChromaSubsampling::Ratio422,
        }
    }
}

/// Chroma sampling relative to luma.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChromaSubsampling {
    /// One chroma sample per two horizontal luma samples, full vertical resolution.
    Ratio422,
}

/// Requested geometry and pacing for one reader.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameConfig {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            frame_rate: 30.0,
        }
    }
}

impl FrameConfig {
    pub fn new(width: u32, height: u32, frame_rate: f32) -> Self {
        Self {
            width,
            height,
            frame_rate,
        }
    }

    /// Reject configurations that cannot produce a well-formed stream.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        // Chroma rows are width/2 samples wide; an odd width would push the
        // last chroma index past the end of the plane.
        if self.width % 2 != 0 {
            return Err(Error::InvalidConfig(format!(
                "width must be even, got {}",
                self.width
            )));
        }
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "frame rate must be a positive number, got {}",
                self.frame_rate
            )));
        }
        if self.period() > MAX_FRAME_PERIOD {
            return Err(Error::InvalidConfig(format!(
                "frame rate {} is too low to pace",
                self.frame_rate
            )));
        }
        if self.period().is_zero() {
            return Err(Error::InvalidConfig(format!(
                "frame rate {} is too high to pace",
                self.frame_rate
            )));
        }
        (self.width as usize)
            .checked_mul(self.height as usize)
            .ok_or_else(|| {
                Error::InvalidConfig(format!(
                    "{}x{} does not fit in memory",
                    self.width, self.height
                ))
            })?;
        Ok(())
    }

    /// Time between two ticks of the pacer. Saturates at [`Duration::MAX`]
    /// for rates too small to represent.
    pub fn period(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / f64::from(self.frame_rate)).unwrap_or(Duration::MAX)
    }
}

/// One entry of the capability list a hosting registry can query.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VideoProperties {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f32,
    pub pixel_format: PixelFormat,
}

impl VideoProperties {
    const fn preset(width: u32, height: u32, frame_rate: f32) -> Self {
        Self {
            width,
            height,
            frame_rate,
            pixel_format: PixelFormat::I422,
        }
    }

    pub fn matches(&self, config: &FrameConfig) -> bool {
        self.width == config.width
            && self.height == config.height
            && self.frame_rate == config.frame_rate
    }

    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig::new(self.width, self.height, self.frame_rate)
    }
}

const CAPABILITIES: [VideoProperties; 7] = [
    VideoProperties::preset(640, 480, 30.0),
    VideoProperties::preset(1280, 720, 30.0),
    VideoProperties::preset(1280, 720, 60.0),
    VideoProperties::preset(1920, 1080, 30.0),
    VideoProperties::preset(1920, 1080, 60.0),
    VideoProperties::preset(3840, 2160, 30.0),
    VideoProperties::preset(3840, 2160, 60.0),
];

/// Resolutions and frame rates the source declares.
pub fn capabilities() -> &'static [VideoProperties] {
    &CAPABILITIES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_smallest_preset() {
        let cfg = FrameConfig::default();
        assert!(cfg.validate().is_ok());
        assert!(capabilities()[0].matches(&cfg));
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert!(matches!(
            FrameConfig::new(0, 480, 30.0).validate(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            FrameConfig::new(640, 0, 30.0).validate(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_odd_width() {
        assert!(FrameConfig::new(641, 480, 30.0).validate().is_err());
        assert!(FrameConfig::new(642, 481, 30.0).validate().is_ok());
    }

    #[test]
    fn rejects_bad_frame_rates() {
        for rate in [0.0, -30.0, f32::NAN, f32::INFINITY, f32::MAX] {
            assert!(
                FrameConfig::new(640, 480, rate).validate().is_err(),
                "rate {rate} accepted"
            );
        }
    }

    #[test]
    fn rejects_rates_too_low_to_pace() {
        for rate in [1e-19, 1e-30] {
            match FrameConfig::new(640, 480, rate).validate() {
                Err(Error::InvalidConfig(msg)) => assert!(msg.contains("too low"), "{msg}"),
                other => panic!("rate {rate} gave {other:?}"),
            }
        }
        // One frame an hour is still accepted.
        assert!(FrameConfig::new(640, 480, 1.0 / 3600.0).validate().is_ok());
    }

    #[test]
    fn rejects_rates_too_high_to_pace() {
        match FrameConfig::new(640, 480, f32::MAX).validate() {
            Err(Error::InvalidConfig(msg)) => assert!(msg.contains("too high"), "{msg}"),
            other => panic!("got {other:?}"),
        }
    }

    #[test]
    fn period_is_reciprocal_of_rate() {
        let cfg = FrameConfig::new(640, 480, 50.0);
        assert_eq!(cfg.period(), Duration::from_millis(20));
    }

    #[test]
    fn capabilities_are_all_valid() {
        assert_eq!(capabilities().len(), 7);
        for caps in capabilities() {
            assert!(caps.frame_config().validate().is_ok());
            assert_eq!(caps.pixel_format, PixelFormat::I422);
        }
    }

    #[test]
    fn config_deserializes_from_json() {
        let cfg: FrameConfig =
            serde_json::from_str(r#"{"width":1280,"height":720,"frame_rate":60.0}"#).unwrap();
        assert_eq!(cfg, FrameConfig::new(1280, 720, 60.0));
    }
}
