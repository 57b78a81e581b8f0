//! Fixed parameters of an acquisition run.

use std::path::PathBuf;
use std::time::Duration;

use crate::{Channel, PointsMode, SessionOptions};

#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionConfig {
    /// Substring an enumerated resource name must contain to be considered.
    pub resource_filter: String,
    /// Applies to every transfer on the instrument bus.
    pub timeout: Duration,
    /// Largest single transfer requested from the instrument, in bytes.
    pub chunk_size: usize,
    pub points_mode: PointsMode,
    pub channel: Channel,
    pub output_path: PathBuf,
}

impl AcquisitionConfig {
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            timeout: self.timeout,
            chunk_size: self.chunk_size,
        }
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            resource_filter: "USB".to_owned(),
            timeout: Duration::from_millis(20000),
            chunk_size: 1_024_000,
            points_mode: PointsMode::Raw,
            channel: Channel::CH1,
            output_path: PathBuf::from("channel1.wav"),
        }
    }
}
