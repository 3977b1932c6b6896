use crate::Result;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

/// Counters shared by every reader of a session.
#[derive(Clone)]
pub struct SourceMetrics {
    pub registry: Registry,
    pub frames_emitted: IntCounter,
    pub ticks_missed: IntCounter,
    pub end_of_stream: IntCounter,
    pub readers_active: IntGauge,
}

impl SourceMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let frames_emitted = IntCounter::new("vt_frames_emitted", "Total frames handed out")?;
        let ticks_missed = IntCounter::new(
            "vt_ticks_missed",
            "Pacer ticks dropped because a pull arrived late",
        )?;
        let end_of_stream =
            IntCounter::new("vt_end_of_stream", "Pulls answered with end-of-stream")?;
        let readers_active = IntGauge::new("vt_readers_active", "Readers currently alive")?;
        registry.register(Box::new(frames_emitted.clone()))?;
        registry.register(Box::new(ticks_missed.clone()))?;
        registry.register(Box::new(end_of_stream.clone()))?;
        registry.register(Box::new(readers_active.clone()))?;
        Ok(Self {
            registry,
            frames_emitted,
            ticks_missed,
            end_of_stream,
            readers_active,
        })
    }

    pub fn encode_text(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buf) {
            return format!("error encoding metrics: {e}");
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}
