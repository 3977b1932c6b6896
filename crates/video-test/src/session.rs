use crate::{
    capabilities, CancelToken, FrameConfig, Result, SourceMetrics, Ticker, VideoProperties,
    VideoReader,
};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tracing::{debug, info, warn};

#[derive(Default)]
struct Shared {
    cancel: CancelToken,
    tickers: Mutex<Vec<Weak<Ticker>>>,
}

impl Shared {
    fn close(&self) {
        let tickers = std::mem::take(
            &mut *self.tickers.lock().unwrap_or_else(PoisonError::into_inner),
        );
        // Pacers go quiet before the stream is marked cancelled.
        let mut stopped = 0usize;
        for ticker in tickers.iter().filter_map(Weak::upgrade) {
            if ticker.stop() {
                stopped += 1;
            }
        }
        if self.cancel.cancel() {
            info!(stopped, "video test session closed");
        }
    }
}

/// A synthetic camera session.
///
/// Readers created from one session share its cancellation signal; closing the
/// session ends all of them.
pub struct VideoTest {
    shared: Arc<Shared>,
    metrics: Option<SourceMetrics>,
}

impl VideoTest {
    /// Open a session with a fresh cancellation signal.
    pub fn open() -> Self {
        debug!("video test session opened");
        Self {
            shared: Arc::new(Shared::default()),
            metrics: None,
        }
    }

    /// Attach counters that every subsequently created reader updates.
    pub fn with_metrics(mut self, metrics: SourceMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn metrics(&self) -> Option<&SourceMetrics> {
        self.metrics.as_ref()
    }

    /// Configurations this source declares.
    pub fn properties(&self) -> &'static [VideoProperties] {
        capabilities()
    }

    /// Create a reader for `config`.
    ///
    /// A reader created after [`close`](Self::close) reports end-of-stream on
    /// its first pull.
    pub fn video_record(&self, config: &FrameConfig) -> Result<VideoReader> {
        if !self.properties().iter().any(|p| p.matches(config)) {
            debug!(?config, "configuration is not one of the declared presets");
        }
        let reader = VideoReader::new(config, self.shared.cancel.clone(), self.metrics.clone())?;
        if self.is_closed() {
            warn!("reader created on a closed session");
            reader.ticker().stop();
        } else {
            let mut tickers = self
                .shared
                .tickers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            tickers.retain(|t| t.strong_count() > 0);
            tickers.push(Arc::downgrade(reader.ticker()));
        }
        info!(
            width = config.width,
            height = config.height,
            frame_rate = config.frame_rate,
            "video reader started"
        );
        Ok(reader)
    }

    /// Stop every pacer and signal cancellation. Safe to call repeatedly and
    /// from any thread.
    pub fn close(&self) {
        self.shared.close();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    /// A handle that can close this session from another thread.
    pub fn closer(&self) -> CloseHandle {
        CloseHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for VideoTest {
    fn drop(&mut self) {
        self.shared.close();
    }
}

/// Clonable close signal for a [`VideoTest`] session.
#[derive(Clone)]
pub struct CloseHandle {
    shared: Arc<Shared>,
}

impl CloseHandle {
    pub fn close(&self) {
        self.shared.close();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }
}
