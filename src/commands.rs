use std::fmt;

/// Analog input channel, numbered from 1 as on the front panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Channel(pub u8);

impl Channel {
    pub const CH1: Channel = Channel(1);
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CHAN{}", self.0)
    }
}

/// Which record `:WAV:DATA?` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointsMode {
    /// Points displayed on screen.
    Normal,
    /// Screen points while running, raw memory when stopped.
    Maximum,
    /// Full acquisition memory; the scope must be stopped.
    #[default]
    Raw,
}

impl PointsMode {
    pub(crate) fn scpi_name(self) -> &'static str {
        match self {
            Self::Normal  => "NORM",
            Self::Maximum => "MAX",
            Self::Raw     => "RAW",
        }
    }
}

impl fmt::Display for PointsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scpi_name())
    }
}

pub(crate) const QUERY_SAMPLE_RATE: &str = ":ACQ:SAMP?";
pub(crate) const STOP: &str = ":STOP";
pub(crate) const KEY_FORCE: &str = ":KEY:FORCE";

pub(crate) fn set_points_mode(mode: PointsMode) -> String {
    format!(":WAV:POIN:MODE {}", mode)
}

pub(crate) fn query_waveform_data(channel: Channel) -> String {
    format!(":WAV:DATA? {}", channel)
}
