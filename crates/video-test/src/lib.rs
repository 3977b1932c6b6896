//! video-test: synthetic color-bar video source with a live timestamp overlay
//!
//! The source stands in for a camera in pipelines that pull decoded images. A
//! session hands out readers; each reader renders a static color-bar/gradient
//! base once, then on every pull copies it into a working buffer, stamps the
//! current time into the luma plane and blocks until the next tick of a fixed
//! period pacer. Closing the session ends every stream it created.

mod types;
pub use types::{
    capabilities, ChromaSubsampling, FrameConfig, PixelFormat, VideoProperties, MAX_FRAME_PERIOD,
};

mod error;
pub use error::{Error, Result};

mod layout;
pub use layout::{PlaneLayout, Planes};

pub mod pattern;
pub use pattern::{render_base, Ycbcr, COLOR_BARS};

pub mod overlay;

mod cancel;
pub use cancel::CancelToken;

mod ticker;
pub use ticker::{Tick, Ticker};

mod traits;
pub use traits::VideoSource;

mod reader;
pub use reader::{Frame, Plane, Pull, ReaderState, VideoReader};

mod session;
pub use session::{CloseHandle, VideoTest};

mod registry;
pub use registry::{register, DeviceType, DriverInfo, DriverRegistry, DRIVER_LABEL};

mod config;
pub use config::load_frame_config;

mod metrics;
pub use metrics::SourceMetrics;
