use core::fmt;

/// A sample format a [`crate::Frame`] may carry.
///
/// Distinguishes PCM variants, planar vs. interleaved storage, and the
/// compressed passthrough ("spdif") family that must never be touched by
/// DSP filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SampleFormat {
    /// No format has been negotiated yet. Never a valid format for a live
    /// [`crate::AudioConfig`].
    Unknown,
    U8,
    S16,
    S32,
    Float32,
    Float64,
    S16Planar,
    S32Planar,
    Float32Planar,
    Float64Planar,
    /// Compressed AC3 bitstream, wrapped for IEC 61937 passthrough.
    SpdifAc3,
    /// Compressed E-AC3 bitstream, wrapped for IEC 61937 passthrough.
    SpdifEac3,
    /// Compressed DTS bitstream, wrapped for IEC 61937 passthrough.
    SpdifDts,
    /// Compressed TrueHD bitstream, wrapped for IEC 61937 passthrough.
    SpdifTrueHd,
}

impl Default for SampleFormat {
    fn default() -> Self {
        Self::Unknown
    }
}

impl SampleFormat {
    /// `af_fmt_is_pcm` — total predicate: true for every uncompressed PCM
    /// variant, false for `Unknown` and every spdif variant.
    pub const fn is_pcm(self) -> bool {
        matches!(
            self,
            Self::U8
                | Self::S16
                | Self::S32
                | Self::Float32
                | Self::Float64
                | Self::S16Planar
                | Self::S32Planar
                | Self::Float32Planar
                | Self::Float64Planar
        )
    }

    /// `af_fmt_is_spdif` — total predicate: true for the compressed
    /// passthrough family that filters must never transform.
    pub const fn is_spdif(self) -> bool {
        matches!(
            self,
            Self::SpdifAc3 | Self::SpdifEac3 | Self::SpdifDts | Self::SpdifTrueHd
        )
    }

    pub const fn is_planar(self) -> bool {
        matches!(
            self,
            Self::S16Planar | Self::S32Planar | Self::Float32Planar | Self::Float64Planar
        )
    }

    pub const fn is_valid(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Size in bytes of a single sample in a single channel. Spdif formats
    /// are opaque byte streams framed by the encoder, so this returns `1`
    /// for them (callers must not interpret spdif payloads per-sample).
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::Unknown => 0,
            Self::U8 => 1,
            Self::S16 | Self::S16Planar => 2,
            Self::S32 | Self::S32Planar | Self::Float32 | Self::Float32Planar => 4,
            Self::Float64 | Self::Float64Planar => 8,
            Self::SpdifAc3 | Self::SpdifEac3 | Self::SpdifDts | Self::SpdifTrueHd => 1,
        }
    }

    /// `af_format_sample_alignment` — the number of samples an AO write
    /// must be a multiple of. PCM formats have no inherent alignment
    /// requirement beyond a single sample; spdif formats must be written
    /// in whole IEC 61937 burst units.
    pub const fn sample_alignment(self) -> u32 {
        match self {
            Self::SpdifAc3 => 1536,
            Self::SpdifEac3 => 6144,
            Self::SpdifDts => 2048,
            Self::SpdifTrueHd => 61440,
            _ => 1,
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "unknown",
            Self::U8 => "u8",
            Self::S16 => "s16",
            Self::S32 => "s32",
            Self::Float32 => "f32",
            Self::Float64 => "f64",
            Self::S16Planar => "s16p",
            Self::S32Planar => "s32p",
            Self::Float32Planar => "f32p",
            Self::Float64Planar => "f64p",
            Self::SpdifAc3 => "spdif-ac3",
            Self::SpdifEac3 => "spdif-eac3",
            Self::SpdifDts => "spdif-dts",
            Self::SpdifTrueHd => "spdif-truehd",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pcm_and_spdif_are_disjoint_and_total() {
        let all = [
            SampleFormat::Unknown,
            SampleFormat::U8,
            SampleFormat::S16,
            SampleFormat::S32,
            SampleFormat::Float32,
            SampleFormat::Float64,
            SampleFormat::S16Planar,
            SampleFormat::S32Planar,
            SampleFormat::Float32Planar,
            SampleFormat::Float64Planar,
            SampleFormat::SpdifAc3,
            SampleFormat::SpdifEac3,
            SampleFormat::SpdifDts,
            SampleFormat::SpdifTrueHd,
        ];
        for fmt in all {
            assert!(!(fmt.is_pcm() && fmt.is_spdif()));
        }
        assert!(!SampleFormat::Unknown.is_pcm());
        assert!(!SampleFormat::Unknown.is_spdif());
    }

    #[test]
    fn spdif_alignment_matches_burst_size() {
        assert_eq!(SampleFormat::SpdifAc3.sample_alignment(), 1536);
        assert_eq!(SampleFormat::S16.sample_alignment(), 1);
    }
}
