mod sys;
mod config;
mod commands;
mod block;
mod scope;
mod waveform;
mod wav;
mod acquire;

use std::io;

#[derive(Debug)]
pub enum Error {
    Initialization(Box<dyn std::error::Error + Sync + Send + 'static>),
    AmbiguousDevice(Vec<String>),
    BusIo(io::Error),
    InvalidResponse { command: String, reply: String },
    Output(hound::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Initialization(error) =>
                write!(f, "cannot initialize instrument bus: {}", error),
            Self::AmbiguousDevice(candidates) =>
                write!(f, "bad instrument list or multiple USB devices found: {:?}", candidates),
            Self::BusIo(io_error) =>
                write!(f, "instrument bus I/O error: {}", io_error),
            Self::InvalidResponse { command, reply } =>
                write!(f, "unexpected reply to {:?}: {:?}", command, reply),
            Self::Output(wav_error) =>
                write!(f, "cannot write output file: {}", wav_error),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Initialization(error) => Some(error.as_ref()),
            Self::BusIo(io_error) => Some(io_error),
            Self::Output(wav_error) => Some(wav_error),
            _ => None
        }
    }
}

impl From<hound::Error> for Error {
    fn from(error: hound::Error) -> Self {
        Error::Output(error)
    }
}

impl Error {
    /// A bus-level failure that did not originate in an OS call, such as a malformed reply.
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Error::BusIo(io::Error::new(io::ErrorKind::InvalidData, message.into()))
    }
}

pub type Result<T> =
    core::result::Result<T, Error>;

pub use sys::{
    Bus,
    Session,
    SessionOptions,
    ResourceName,
};

#[cfg(feature = "hardware")]
pub use sys::usbtmc::{
    UsbtmcBus,
    UsbtmcSession,
};

pub use config::AcquisitionConfig;

pub use commands::{
    Channel,
    PointsMode,
};

pub use block::parse_ieee_block;

pub use scope::Scope;

pub use waveform::{
    Waveform,
    WaveformSummary,
};

pub use wav::{
    frame_rate,
    write_wav,
};

pub use acquire::{
    Acquisition,
    select_resource,
    acquire_and_save,
    run,
};
