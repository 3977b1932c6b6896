use crate::{capabilities, Error, Result, VideoProperties, VideoTest};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Label the synthetic source registers under.
pub const DRIVER_LABEL: &str = "VideoTest";

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Camera,
}

#[derive(Debug, Clone, Serialize)]
pub struct DriverInfo {
    pub label: String,
    pub device_type: DeviceType,
    pub capabilities: Vec<VideoProperties>,
}

type Factory = Box<dyn Fn() -> VideoTest + Send + Sync>;

struct Entry {
    info: DriverInfo,
    factory: Factory,
}

/// Registry of video drivers, built explicitly at startup and passed to
/// whoever needs to pick a source.
#[derive(Default)]
pub struct DriverRegistry {
    drivers: HashMap<String, Entry>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, info: DriverInfo, factory: F) -> Result<()>
    where
        F: Fn() -> VideoTest + Send + Sync + 'static,
    {
        if self.drivers.contains_key(&info.label) {
            return Err(Error::DuplicateDriver(info.label));
        }
        debug!(label = %info.label, modes = info.capabilities.len(), "driver registered");
        self.drivers.insert(
            info.label.clone(),
            Entry {
                info,
                factory: Box::new(factory),
            },
        );
        Ok(())
    }

    /// Registered drivers ordered by label.
    pub fn list(&self) -> Vec<&DriverInfo> {
        let mut infos: Vec<&DriverInfo> = self.drivers.values().map(|e| &e.info).collect();
        infos.sort_by(|a, b| a.label.cmp(&b.label));
        infos
    }

    pub fn get(&self, label: &str) -> Option<&DriverInfo> {
        self.drivers.get(label).map(|e| &e.info)
    }

    /// Open a new session on the driver registered as `label`.
    pub fn open(&self, label: &str) -> Result<VideoTest> {
        let entry = self
            .drivers
            .get(label)
            .ok_or_else(|| Error::DriverNotFound(label.to_string()))?;
        Ok((entry.factory)())
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

/// Register the synthetic color-bar source.
pub fn register(registry: &mut DriverRegistry) -> Result<()> {
    registry.register(
        DriverInfo {
            label: DRIVER_LABEL.to_string(),
            device_type: DeviceType::Camera,
            capabilities: capabilities().to_vec(),
        },
        VideoTest::open,
    )
}
