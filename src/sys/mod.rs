use std::time::Duration;

use crate::Result;

mod resource;
mod framing;

pub use resource::ResourceName;

/// Access to an instrument bus, independent of any one device.
///
/// Dropping the value releases bus access.
pub trait Bus {
    type Session: Session;

    fn list_resources(&mut self) -> Result<Vec<String>>;
    fn open(&mut self, resource: &str, options: &SessionOptions) -> Result<Self::Session>;
}

/// A connection to one instrument.
pub trait Session {
    fn write(&mut self, data: &[u8]) -> Result<()>;
    /// Reads one complete message, up to and including the device's end-of-message marker.
    fn read(&mut self) -> Result<Vec<u8>>;
    fn close(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub timeout: Duration,
    pub chunk_size: usize,
}

#[cfg(feature = "hardware")]
pub mod usbtmc;

#[cfg(test)]
pub mod mock;
