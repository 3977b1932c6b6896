use crate::{FrameConfig, Pull, Result};

/// A pull-based image stream.
pub trait VideoSource {
    /// Configuration the stream was opened with.
    fn config(&self) -> &FrameConfig;

    /// Block until the next image is due, or report end-of-stream.
    fn read(&mut self) -> Result<Pull<'_>>;
}
