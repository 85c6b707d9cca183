use crate::channel::ChannelMap;
use crate::format::SampleFormat;

/// A fully-specified (or intentionally null) audio stream shape: format,
/// channel layout, sample rate.
///
/// `AudioConfig::default()` is the null sentinel `af.c` calls
/// `mp_audio_set_null_data`: `SampleFormat::Unknown`, empty channels, rate
/// zero. Sentinel filters (the chain's head/tail) carry this until
/// negotiation pins concrete values.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AudioConfig {
    pub format: SampleFormat,
    pub channels: ChannelMap,
    pub rate: u32,
}

impl AudioConfig {
    pub fn new(format: SampleFormat, channels: ChannelMap, rate: u32) -> Self {
        Self {
            format,
            channels,
            rate,
        }
    }

    /// The null sentinel: unset format, no channels, zero rate.
    pub fn null() -> Self {
        Self::default()
    }

    pub fn is_null(&self) -> bool {
        self.format == SampleFormat::Unknown && self.channels.is_empty() && self.rate == 0
    }

    /// Total validity predicate: a config is usable as a live stream shape
    /// only if every field is pinned to something concrete.
    pub fn is_valid(&self) -> bool {
        self.format.is_valid() && !self.channels.is_empty() && self.rate > 0
    }

    /// Copies any field that `other` has pinned and `self` still leaves
    /// null, without touching fields `self` has already pinned. Mirrors
    /// `af_copy_unset_fields`, used by sentinel controls and by
    /// `af_do_reinit`'s final output-field fixup.
    pub fn copy_unset_fields(&mut self, other: &Self) {
        if self.format == SampleFormat::Unknown {
            self.format = other.format;
        }
        if self.channels.is_empty() {
            self.channels = other.channels.clone();
        }
        if self.rate == 0 {
            self.rate = other.rate;
        }
    }

    /// Bytes needed to hold `samples` frames of interleaved PCM at this
    /// config. Meaningless (and left at the spdif byte count) for
    /// compressed formats, whose frame size is encoder-defined.
    pub fn bytes_for(&self, samples: u32) -> usize {
        samples as usize * self.channels.num_channels() * self.format.bytes_per_sample()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::channel::ChannelMap;

    #[test]
    fn default_is_null() {
        assert!(AudioConfig::default().is_null());
        assert!(!AudioConfig::default().is_valid());
    }

    #[test]
    fn valid_requires_every_field_pinned() {
        let mut cfg = AudioConfig::null();
        assert!(!cfg.is_valid());
        cfg.format = SampleFormat::S16;
        assert!(!cfg.is_valid());
        cfg.channels = ChannelMap::stereo();
        assert!(!cfg.is_valid());
        cfg.rate = 44_100;
        assert!(cfg.is_valid());
    }

    #[test]
    fn copy_unset_fields_only_fills_gaps() {
        let mut cfg = AudioConfig::new(SampleFormat::S16, ChannelMap::default(), 0);
        let full = AudioConfig::new(SampleFormat::Float32, ChannelMap::stereo(), 48_000);
        cfg.copy_unset_fields(&full);
        assert_eq!(cfg.format, SampleFormat::S16);
        assert_eq!(cfg.channels, ChannelMap::stereo());
        assert_eq!(cfg.rate, 48_000);
    }
}
