use crate::overlay;
use crate::{
    render_base, CancelToken, ChromaSubsampling, FrameConfig, PlaneLayout, Planes, Result,
    SourceMetrics, Tick, Ticker, VideoSource,
};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, trace};

/// Lifecycle of a [`VideoReader`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReaderState {
    /// Constructed, pacer not yet started.
    Idle,
    /// Pacer running, serving pulls.
    Running,
    /// Terminal: every pull reports end-of-stream.
    Stopped,
}

/// A single plane of image data.
#[derive(Clone, Copy, Debug)]
pub struct Plane<'a> {
    pub data: &'a [u8],
    pub bytes_per_row: usize,
}

/// One composed image, borrowed from the reader's working buffer.
///
/// The reader cannot be pulled again until the frame is dropped or
/// [`released`](Frame::release).
#[derive(Debug)]
pub struct Frame<'a> {
    layout: PlaneLayout,
    planes: &'a Planes,
    sequence: u64,
    timestamp: OffsetDateTime,
}

impl<'a> Frame<'a> {
    pub fn width(&self) -> usize {
        self.layout.width()
    }

    pub fn height(&self) -> usize {
        self.layout.height()
    }

    pub fn layout(&self) -> &PlaneLayout {
        &self.layout
    }

    pub fn subsampling(&self) -> ChromaSubsampling {
        self.layout.subsampling()
    }

    pub fn y(&self) -> &'a [u8] {
        &self.planes.y
    }

    pub fn cb(&self) -> &'a [u8] {
        &self.planes.cb
    }

    pub fn cr(&self) -> &'a [u8] {
        &self.planes.cr
    }

    pub fn y_stride(&self) -> usize {
        self.layout.luma_stride()
    }

    pub fn c_stride(&self) -> usize {
        self.layout.chroma_stride()
    }

    /// Y, Cb and Cr in that order.
    pub fn planes(&self) -> [Plane<'a>; 3] {
        [
            Plane {
                data: &self.planes.y,
                bytes_per_row: self.layout.luma_stride(),
            },
            Plane {
                data: &self.planes.cb,
                bytes_per_row: self.layout.chroma_stride(),
            },
            Plane {
                data: &self.planes.cr,
                bytes_per_row: self.layout.chroma_stride(),
            },
        ]
    }

    pub fn luma_at(&self, x: usize, y: usize) -> u8 {
        self.planes.y[self.layout.luma_index(x, y)]
    }

    /// `(cb, cr)` sample covering pixel `(x, y)`.
    pub fn chroma_at(&self, x: usize, y: usize) -> (u8, u8) {
        let i = self.layout.chroma_index(x, y);
        (self.planes.cb[i], self.planes.cr[i])
    }

    /// Zero-based position of this frame in the stream.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Wall-clock time stamped into the image.
    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    /// Hand the working buffer back to the reader.
    pub fn release(self) {}
}

impl Drop for Frame<'_> {
    fn drop(&mut self) {
        trace!(sequence = self.sequence, "frame released");
    }
}

/// Result of a pull.
#[must_use]
#[derive(Debug)]
pub enum Pull<'a> {
    Frame(Frame<'a>),
    EndOfStream,
}

impl<'a> Pull<'a> {
    pub fn into_frame(self) -> Option<Frame<'a>> {
        match self {
            Pull::Frame(frame) => Some(frame),
            Pull::EndOfStream => None,
        }
    }

    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Pull::EndOfStream)
    }
}

/// Pull-based color-bar reader paced to the configured frame rate.
pub struct VideoReader {
    config: FrameConfig,
    layout: PlaneLayout,
    base: Planes,
    work: Planes,
    ticker: Arc<Ticker>,
    cancel: CancelToken,
    state: ReaderState,
    sequence: u64,
    metrics: Option<SourceMetrics>,
}

impl VideoReader {
    /// Validate `config`, render the base image and start the pacer.
    pub fn new(
        config: &FrameConfig,
        cancel: CancelToken,
        metrics: Option<SourceMetrics>,
    ) -> Result<Self> {
        let layout = PlaneLayout::new(config)?;
        let base = render_base(&layout);
        let work = Planes::new(&layout);
        let mut reader = Self {
            config: *config,
            layout,
            base,
            work,
            ticker: Arc::new(Ticker::start(config.period())),
            cancel,
            state: ReaderState::Idle,
            sequence: 0,
            metrics,
        };
        reader.transition(ReaderState::Running);
        if let Some(m) = &reader.metrics {
            m.readers_active.inc();
        }
        Ok(reader)
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    pub fn layout(&self) -> &PlaneLayout {
        &self.layout
    }

    /// The pattern every frame starts from.
    pub fn base(&self) -> &Planes {
        &self.base
    }

    pub(crate) fn ticker(&self) -> &Arc<Ticker> {
        &self.ticker
    }

    /// Produce the next frame.
    ///
    /// Cancellation is checked before waiting on the pacer. A session closed
    /// while this call is blocked stops the pacer, so the wait ends and the
    /// pull reports end-of-stream.
    pub fn read(&mut self) -> Result<Pull<'_>> {
        if self.state == ReaderState::Stopped {
            return Ok(self.end_of_stream());
        }
        if self.cancel.is_cancelled() {
            debug!("cancellation observed");
            self.transition(ReaderState::Stopped);
            return Ok(self.end_of_stream());
        }
        match self.ticker.wait()? {
            Tick::Stopped => {
                debug!("pacer stopped while waiting");
                self.transition(ReaderState::Stopped);
                return Ok(self.end_of_stream());
            }
            Tick::Fired { missed } if missed > 0 => {
                debug!(missed, "pull arrived late, ticks dropped");
                if let Some(m) = &self.metrics {
                    m.ticks_missed.inc_by(u64::from(missed));
                }
            }
            Tick::Fired { .. } => {}
        }

        self.work.refresh_from(&self.base);
        let timestamp = OffsetDateTime::now_utc();
        let digits = overlay::timestamp_digits(timestamp);
        overlay::stamp(&mut self.work.y, &self.layout, &digits);

        let sequence = self.sequence;
        self.sequence += 1;
        if let Some(m) = &self.metrics {
            m.frames_emitted.inc();
        }
        trace!(sequence, token = overlay::token_value(&digits), "frame composed");
        Ok(Pull::Frame(Frame {
            layout: self.layout,
            planes: &self.work,
            sequence,
            timestamp,
        }))
    }

    fn end_of_stream(&self) -> Pull<'static> {
        if let Some(m) = &self.metrics {
            m.end_of_stream.inc();
        }
        Pull::EndOfStream
    }

    fn transition(&mut self, next: ReaderState) {
        if self.state != next {
            debug!(
                from = ?self.state,
                to = ?next,
                width = self.config.width,
                height = self.config.height,
                "reader state change"
            );
            self.state = next;
        }
    }
}

impl VideoSource for VideoReader {
    fn config(&self) -> &FrameConfig {
        &self.config
    }

    fn read(&mut self) -> Result<Pull<'_>> {
        VideoReader::read(self)
    }
}

impl Drop for VideoReader {
    fn drop(&mut self) {
        self.ticker.stop();
        if let Some(m) = &self.metrics {
            m.readers_active.dec();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{plate_rect, read_digits, timestamp_digits};
    use crate::pattern::NEUTRAL_CHROMA;
    use crate::Error;
    use std::thread;
    use std::time::{Duration, Instant};

    fn reader(width: u32, height: u32, fps: f32) -> VideoReader {
        VideoReader::new(&FrameConfig::new(width, height, fps), CancelToken::new(), None).unwrap()
    }

    #[test]
    fn vga_first_frame() {
        let mut r = reader(640, 480, 30.0);
        assert_eq!(r.state(), ReaderState::Running);
        assert_eq!(r.ticker().period(), FrameConfig::new(640, 480, 30.0).period());
        let frame = r.read().unwrap().into_frame().unwrap();
        assert_eq!(frame.y().len(), 640 * 480);
        assert_eq!(frame.cb().len(), 640 * 480 / 2);
        assert_eq!(frame.cr().len(), 640 * 480 / 2);
        assert_eq!(frame.y_stride(), 640);
        assert_eq!(frame.c_stride(), 320);
        assert_eq!(frame.subsampling(), ChromaSubsampling::Ratio422);
        assert_eq!(frame.luma_at(0, 0), (235u16 * 75 / 100) as u8);
        assert_eq!(frame.luma_at(639, 479), (639 * 255 / 640) as u8);
        assert_eq!(frame.chroma_at(639, 479), (NEUTRAL_CHROMA, NEUTRAL_CHROMA));
        assert_eq!(frame.sequence(), 0);

        let planes = frame.planes();
        assert_eq!(planes[0].bytes_per_row, 640);
        assert_eq!(planes[1].data.len(), planes[2].data.len());
    }

    #[test]
    fn overlay_carries_the_frame_timestamp_and_spares_chroma() {
        let mut r = reader(640, 480, 60.0);
        let base = r.base().clone();
        let frame = r.read().unwrap().into_frame().unwrap();
        assert_eq!(
            read_digits(frame.y(), frame.layout()),
            Some(timestamp_digits(frame.timestamp()))
        );
        assert_eq!(frame.cb(), &base.cb[..]);
        assert_eq!(frame.cr(), &base.cr[..]);
    }

    #[test]
    fn overlay_does_not_accumulate() {
        let mut r = reader(640, 480, 100.0);
        let base = r.base().clone();
        let (px, py, pw, ph) = plate_rect();
        for _ in 0..3 {
            let frame = r.read().unwrap().into_frame().unwrap();
            for y in 0..frame.height() {
                if (py..py + ph).contains(&y) {
                    let row = frame.layout().luma_index(0, y);
                    assert_eq!(frame.y()[row..row + px], base.y[row..row + px]);
                    let tail = row + px + pw;
                    assert_eq!(frame.y()[tail..row + 640], base.y[tail..row + 640]);
                } else {
                    let row = frame.layout().luma_index(0, y);
                    assert_eq!(frame.y()[row..row + 640], base.y[row..row + 640]);
                }
            }
        }
    }

    #[test]
    fn pulls_are_paced() {
        let mut r = reader(640, 480, 20.0);
        r.read().unwrap().into_frame().unwrap().release();
        let t0 = Instant::now();
        let frame = r.read().unwrap().into_frame().unwrap();
        let gap = t0.elapsed();
        assert_eq!(frame.sequence(), 1);
        assert!(gap >= Duration::from_millis(40), "gap {gap:?}");
        assert!(gap < Duration::from_millis(500), "gap {gap:?}");
    }

    #[test]
    fn timestamps_increase() {
        let mut r = reader(640, 480, 100.0);
        let first = r.read().unwrap().into_frame().unwrap().timestamp();
        let second = r.read().unwrap().into_frame().unwrap().timestamp();
        assert!(second > first);
    }

    #[test]
    fn cancelled_before_first_pull() {
        let cancel = CancelToken::new();
        let mut r =
            VideoReader::new(&FrameConfig::new(640, 480, 1.0), cancel.clone(), None).unwrap();
        cancel.cancel();
        let t0 = Instant::now();
        assert!(r.read().unwrap().is_end_of_stream());
        assert!(t0.elapsed() < Duration::from_millis(500));
        assert_eq!(r.state(), ReaderState::Stopped);
        assert!(r.read().unwrap().is_end_of_stream());
    }

    #[test]
    fn stopped_pacer_ends_a_blocked_pull() {
        let mut r = reader(640, 480, 0.1);
        let ticker = Arc::clone(r.ticker());
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            ticker.stop();
        });
        assert!(r.read().unwrap().is_end_of_stream());
        assert_eq!(r.state(), ReaderState::Stopped);
        stopper.join().unwrap();
    }

    #[test]
    fn rejects_invalid_config() {
        for cfg in [
            FrameConfig::new(0, 480, 30.0),
            FrameConfig::new(640, 0, 30.0),
            FrameConfig::new(640, 480, 0.0),
            FrameConfig::new(639, 480, 30.0),
            FrameConfig::new(640, 480, 1e-19),
        ] {
            assert!(matches!(
                VideoReader::new(&cfg, CancelToken::new(), None),
                Err(Error::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn metrics_follow_the_stream() {
        let metrics = SourceMetrics::new().unwrap();
        let cancel = CancelToken::new();
        let mut r = VideoReader::new(
            &FrameConfig::new(64, 48, 200.0),
            cancel.clone(),
            Some(metrics.clone()),
        )
        .unwrap();
        assert_eq!(metrics.readers_active.get(), 1);
        r.read().unwrap().into_frame().unwrap();
        r.read().unwrap().into_frame().unwrap();
        cancel.cancel();
        assert!(r.read().unwrap().is_end_of_stream());
        assert_eq!(metrics.frames_emitted.get(), 2);
        assert_eq!(metrics.end_of_stream.get(), 1);
        drop(r);
        assert_eq!(metrics.readers_active.get(), 0);
    }

    #[test]
    fn usable_through_the_trait() {
        fn count_frames(source: &mut impl VideoSource, limit: usize) -> usize {
            let mut n = 0;
            while n < limit {
                match source.read().unwrap() {
                    Pull::Frame(_) => n += 1,
                    Pull::EndOfStream => break,
                }
            }
            n
        }
        let mut r = reader(64, 48, 200.0);
        assert_eq!(r.config().frame_rate, 200.0);
        assert_eq!(count_frames(&mut r, 3), 3);
    }
}
