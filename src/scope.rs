use crate::{Error, Result};
use crate::sys::Session;
use crate::commands::{self, Channel, PointsMode};
use crate::block::parse_ieee_block;
use crate::waveform::Waveform;

/// A Rigol oscilloscope reached through an instrument session.
///
/// The session is closed exactly once: by [`Scope::close`], or on drop if the scope is abandoned
/// part way through an acquisition.
#[derive(Debug)]
pub struct Scope<S: Session> {
    session: S,
    open: bool,
}

impl<S: Session> Scope<S> {
    pub fn new(session: S) -> Scope<S> {
        Scope { session, open: true }
    }

    pub fn write(&mut self, command: &str) -> Result<()> {
        log::debug!("write({:?})", command);
        let mut message = Vec::with_capacity(command.len() + 1);
        message.extend_from_slice(command.as_bytes());
        message.push(b'\n');
        self.session.write(&message)
    }

    pub fn query(&mut self, command: &str) -> Result<String> {
        self.write(command)?;
        let reply = self.session.read()?;
        let reply = String::from_utf8_lossy(&reply).trim().to_owned();
        log::debug!("query({:?}) = {:?}", command, reply);
        Ok(reply)
    }

    pub fn query_f64(&mut self, command: &str) -> Result<f64> {
        let reply = self.query(command)?;
        reply.parse().map_err(|_| Error::InvalidResponse { command: command.to_owned(), reply })
    }

    pub fn query_binary_block(&mut self, command: &str) -> Result<Vec<u8>> {
        self.write(command)?;
        let message = self.session.read()?;
        let payload = parse_ieee_block(&message)?;
        log::debug!("query_binary_block({:?}) = {} bytes", command, payload.len());
        Ok(payload.to_vec())
    }

    /// Current acquisition sample rate in samples per second.
    pub fn sample_rate(&mut self) -> Result<f64> {
        self.query_f64(commands::QUERY_SAMPLE_RATE)
    }

    pub fn stop(&mut self) -> Result<()> {
        self.write(commands::STOP)
    }

    pub fn set_points_mode(&mut self, mode: PointsMode) -> Result<()> {
        self.write(&commands::set_points_mode(mode))
    }

    pub fn read_waveform(&mut self, channel: Channel) -> Result<Waveform> {
        Ok(Waveform::new(self.query_binary_block(&commands::query_waveform_data(channel))?))
    }

    /// Presses the Force key, which also hands the front panel back after remote control.
    pub fn force_key(&mut self) -> Result<()> {
        self.write(commands::KEY_FORCE)
    }

    pub fn close(mut self) -> Result<()> {
        self.open = false;
        self.session.close()
    }
}

impl<S: Session> Drop for Scope<S> {
    fn drop(&mut self) {
        if self.open {
            log::debug!("closing instrument session after failure");
            if let Err(error) = self.session.close() {
                log::warn!("failed to close instrument session: {}", error);
            }
        }
    }
}
