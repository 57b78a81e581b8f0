/// Raw samples of one channel, exactly as the scope sent them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Waveform {
    data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveformSummary {
    pub len: usize,
    pub min: u8,
    pub max: u8,
    /// Range of the same samples read as two's complement codes.
    pub min_code: i8,
    pub max_code: i8,
}

impl Waveform {
    pub fn new(data: Vec<u8>) -> Waveform {
        Waveform { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..]
    }

    /// The same samples viewed as two's complement codes.
    pub fn codes(&self) -> &[i8] {
        bytemuck::cast_slice(&self.data[..])
    }

    pub fn summary(&self) -> Option<WaveformSummary> {
        let min = *self.data.iter().min()?;
        let max = *self.data.iter().max()?;
        let min_code = *self.codes().iter().min()?;
        let max_code = *self.codes().iter().max()?;
        Some(WaveformSummary { len: self.data.len(), min, max, min_code, max_code })
    }
}
