//! The acquisition run: find the scope, pull one channel, save it.

use std::path::PathBuf;

use crate::{AcquisitionConfig, Error, Result};
use crate::sys::Bus;
use crate::scope::Scope;
use crate::wav::{frame_rate, write_wav};

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Acquisition {
    pub resource: String,
    pub sample_rate: f64,
    pub frame_rate: u32,
    pub frames: usize,
    pub output: PathBuf,
}

/// Picks the only resource whose name contains `filter`.
pub fn select_resource(resources: &[String], filter: &str) -> Result<String> {
    let mut candidates = resources.iter()
        .filter(|name| name.contains(filter))
        .cloned()
        .collect::<Vec<_>>();
    if candidates.len() != 1 {
        return Err(Error::AmbiguousDevice(candidates))
    }
    Ok(candidates.remove(0))
}

/// Acquires `config.channel` from the single matching instrument on `bus` and writes it to
/// `config.output_path`.
///
/// Bus access is released when this returns, whether or not the run succeeded. The output file
/// is only created once the whole acquisition has succeeded.
pub fn acquire_and_save<B: Bus>(mut bus: B, config: &AcquisitionConfig) -> Result<Acquisition> {
    let resources = bus.list_resources()?;
    log::info!("available resources: {:?}", resources);
    let resource = select_resource(&resources, &config.resource_filter)?;

    log::info!("connecting to {}", resource);
    let mut scope = Scope::new(bus.open(&resource, &config.session_options())?);
    log::debug!("session open");

    let sample_rate = scope.sample_rate()?;
    log::info!("acquisition sample rate: {} Sa/s", sample_rate);
    let frame_rate = frame_rate(sample_rate)?;

    scope.stop()?;
    scope.set_points_mode(config.points_mode)?;
    let waveform = scope.read_waveform(config.channel)?;
    log::info!("data size (bytes): {}", waveform.len());
    if let Some(summary) = waveform.summary() {
        log::debug!("samples range {:#04x}..={:#04x} (codes {:+}..={:+}) over {} samples",
                    summary.min, summary.max, summary.min_code, summary.max_code, summary.len);
    }

    scope.force_key()?;
    scope.close()?;
    log::debug!("session closed");

    write_wav(&config.output_path, frame_rate, waveform.as_bytes())?;
    log::info!("data saved to {}", config.output_path.display());

    Ok(Acquisition {
        resource,
        sample_rate,
        frame_rate,
        frames: waveform.len(),
        output: config.output_path.clone(),
    })
}

/// Initializes bus access with `connect` and performs one acquisition.
///
/// A failing `connect` is reported as [`Error::Initialization`] and nothing else is attempted.
pub fn run<B, F>(connect: F, config: &AcquisitionConfig) -> Result<Acquisition>
        where B: Bus, F: FnOnce() -> Result<B> {
    let bus = connect().map_err(|error| match error {
        Error::Initialization(_) => error,
        other => Error::Initialization(Box::new(other)),
    })?;
    log::debug!("bus ready");
    acquire_and_save(bus, config)
}
